use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sqlx::{Row, SqlitePool};
use thiserror::Error;
use tokio::sync::{RwLock, broadcast};
use tracing::{info, warn};

use crate::dto::draft_dto::{ActionType, DraftSession, Team, TeamRosterSlot};
use crate::dto::sync_dto::SyncSnapshot;
use crate::services::idempotency::{IdempotencyWindow, SubmissionKey};
use crate::services::turn_resolver::{TurnResolver, identifiers_match};

/// Duplicate submissions with an identical key inside this window are
/// absorbed as no-op successes.
const IDEMPOTENCY_WINDOW: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum DraftError {
    #[error("draft session for match {0} was not found")]
    SessionNotFound(i64),
    #[error("draft session for match {0} is already completed")]
    SessionCompleted(i64),
    #[error("it is not {actor}'s turn at action {current_action}")]
    WrongTurn { actor: String, current_action: usize },
    #[error("action {current_action} expects a {expected:?}, got a {got:?}")]
    TypeMismatch {
        current_action: usize,
        expected: ActionType,
        got: ActionType,
    },
    #[error("champion {0} is already locked in this draft")]
    ChampionAlreadyUsed(i64),
    #[error("slot {slot_index} does not belong to {actor}")]
    NotSlotOwner { slot_index: usize, actor: String },
    #[error("slot {0} is a ban and cannot be edited")]
    EditNotAPick(usize),
    #[error("slot {0} is not locked yet")]
    SlotNotLocked(usize),
    #[error("slot index {0} is out of range")]
    InvalidSlot(usize),
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Boundary events consumed by match orchestration.
#[derive(Debug, Clone, PartialEq)]
pub enum DraftEvent {
    Completed {
        match_id: i64,
        blue_picks: Vec<i64>,
        red_picks: Vec<i64>,
    },
    Cancelled {
        match_id: i64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Committed,
    /// Same key seen inside the idempotency window; nothing changed.
    Duplicate,
}

/// Authoritative store for draft sessions plus the submission gateway that
/// validates every commit. Sessions live in memory and are upserted to
/// sqlite on each mutation so a restart resumes where it left off.
pub struct SessionStore {
    sessions: RwLock<HashMap<i64, DraftSession>>,
    idempotency: Mutex<IdempotencyWindow>,
    resolver: TurnResolver,
    events: broadcast::Sender<DraftEvent>,
    pool: SqlitePool,
}

pub type SharedStore = Arc<SessionStore>;

impl SessionStore {
    pub async fn new(pool: SqlitePool) -> Result<SharedStore, DraftError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS draft_sessions (
                match_id INTEGER PRIMARY KEY,
                data TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        let mut sessions = HashMap::new();
        let rows = sqlx::query("SELECT data FROM draft_sessions")
            .fetch_all(&pool)
            .await?;
        for row in rows {
            let data: String = row.get("data");
            match serde_json::from_str::<DraftSession>(&data) {
                Ok(session) => {
                    sessions.insert(session.match_id, session);
                }
                Err(e) => warn!("Skipping unreadable draft session row: {e}"),
            }
        }
        if !sessions.is_empty() {
            info!("Restored {} draft session(s) from the database.", sessions.len());
        }

        let (events, _) = broadcast::channel(32);
        Ok(Arc::new(Self {
            sessions: RwLock::new(sessions),
            idempotency: Mutex::new(IdempotencyWindow::new(IDEMPOTENCY_WINDOW)),
            resolver: TurnResolver::new(),
            events,
            pool,
        }))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DraftEvent> {
        self.events.subscribe()
    }

    async fn persist(&self, session: &DraftSession) -> Result<(), DraftError> {
        let data = serde_json::to_string(session)?;
        sqlx::query(
            r#"
            INSERT INTO draft_sessions (match_id, data, created_at)
            VALUES (?, ?, ?)
            ON CONFLICT(match_id) DO UPDATE SET data = excluded.data
            "#,
        )
        .bind(session.match_id)
        .bind(data)
        .bind(session.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Match orchestration boundary: called once when a formed match
    /// transitions into drafting.
    pub async fn create_session(
        &self,
        match_id: i64,
        team1: Vec<TeamRosterSlot>,
        team2: Vec<TeamRosterSlot>,
    ) -> Result<(), DraftError> {
        let session = DraftSession::new(match_id, team1, team2);
        self.persist(&session).await?;
        let mut sessions = self.sessions.write().await;
        if sessions.insert(match_id, session).is_some() {
            warn!("Draft session for match {match_id} was recreated.");
        }
        info!("Created draft session for match {match_id}.");
        Ok(())
    }

    /// Match orchestration boundary: cancellation/timeout removes the
    /// session entirely.
    pub async fn cancel_session(&self, match_id: i64) -> Result<(), DraftError> {
        let mut sessions = self.sessions.write().await;
        sessions
            .remove(&match_id)
            .ok_or(DraftError::SessionNotFound(match_id))?;
        drop(sessions);

        sqlx::query("DELETE FROM draft_sessions WHERE match_id = ?")
            .bind(match_id)
            .execute(&self.pool)
            .await?;
        info!("Cancelled draft session for match {match_id}.");
        let _ = self.events.send(DraftEvent::Cancelled { match_id });
        Ok(())
    }

    /// Validates and commits one action. For a given `current_action` the
    /// first valid submission wins the slot; everything later is rejected.
    pub async fn submit_action(
        &self,
        match_id: i64,
        actor_id: &str,
        champion_id: i64,
        action: ActionType,
    ) -> Result<SubmitOutcome, DraftError> {
        let key = SubmissionKey {
            match_id,
            actor_id: actor_id.to_string(),
            champion_id,
            action,
        };
        if self.idempotency.lock().unwrap().is_duplicate(&key) {
            info!("Absorbed duplicate submission from {actor_id} for match {match_id}.");
            return Ok(SubmitOutcome::Duplicate);
        }

        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(&match_id)
            .ok_or(DraftError::SessionNotFound(match_id))?;
        if session.is_completed() {
            return Err(DraftError::SessionCompleted(match_id));
        }

        let current = session.current_action;
        let roster_slot = session.assigned_participant(current).cloned();
        let slot = &session.slots[current];
        if !self.resolver.owns_slot(slot, roster_slot.as_ref(), actor_id) {
            return Err(DraftError::WrongTurn {
                actor: actor_id.to_string(),
                current_action: current,
            });
        }
        if slot.action != action {
            return Err(DraftError::TypeMismatch {
                current_action: current,
                expected: slot.action,
                got: action,
            });
        }
        if session.champion_used(champion_id) {
            return Err(DraftError::ChampionAlreadyUsed(champion_id));
        }

        let slot = &mut session.slots[current];
        slot.champion_id = Some(champion_id);
        slot.locked = true;
        slot.actor_id = Some(actor_id.to_string());
        session.current_action = current + 1;

        self.persist(session).await?;
        self.idempotency.lock().unwrap().record(key);
        info!(
            "Committed {action:?} of champion {champion_id} by {actor_id} at action {current} (match {match_id})."
        );

        if session.is_completed() {
            info!("Draft for match {match_id} is complete.");
            let _ = self.events.send(DraftEvent::Completed {
                match_id,
                blue_picks: session.team_picks(Team::Blue),
                red_picks: session.team_picks(Team::Red),
            });
        }
        Ok(SubmitOutcome::Committed)
    }

    /// The one sanctioned mutation outside normal progress: a pick's own
    /// actor may reopen it. The slot is cleared along with every slot locked
    /// after it, and `current_action` rewinds to the reopened index, so the
    /// "everything before current_action is locked" invariant still holds.
    pub async fn request_edit(
        &self,
        match_id: i64,
        actor_id: &str,
        slot_index: usize,
    ) -> Result<(), DraftError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(&match_id)
            .ok_or(DraftError::SessionNotFound(match_id))?;
        if slot_index >= session.slots.len() {
            return Err(DraftError::InvalidSlot(slot_index));
        }

        let roster_slot = session.assigned_participant(slot_index).cloned();
        let slot = &session.slots[slot_index];
        if slot.action != ActionType::Pick {
            return Err(DraftError::EditNotAPick(slot_index));
        }
        if !self.resolver.owns_slot(slot, roster_slot.as_ref(), actor_id) {
            return Err(DraftError::NotSlotOwner {
                slot_index,
                actor: actor_id.to_string(),
            });
        }
        if !slot.locked {
            return Err(DraftError::SlotNotLocked(slot_index));
        }

        for slot in session.slots[slot_index..].iter_mut() {
            slot.champion_id = None;
            slot.locked = false;
        }
        session.current_action = slot_index;
        self.persist(session).await?;
        // The rewound slots make previously committed submissions valid
        // again, so their keys must not absorb the resubmission.
        self.idempotency.lock().unwrap().evict_match(match_id);
        info!("Reopened pick slot {slot_index} for {actor_id} (match {match_id}).");
        Ok(())
    }

    /// Always reflects the last committed state; never blocks on pending
    /// submissions.
    pub async fn snapshot(&self, match_id: i64) -> Result<SyncSnapshot, DraftError> {
        let sessions = self.sessions.read().await;
        let session = sessions
            .get(&match_id)
            .ok_or(DraftError::SessionNotFound(match_id))?;
        Ok(SyncSnapshot::of(session))
    }

    /// Snapshot for whichever session the actor participates in.
    pub async fn snapshot_for_actor(
        &self,
        actor_id: &str,
    ) -> Option<(i64, SyncSnapshot)> {
        let sessions = self.sessions.read().await;
        sessions
            .values()
            .find(|session| {
                session
                    .blue_team
                    .iter()
                    .chain(session.red_team.iter())
                    .any(|p| {
                        p.player_id.as_deref() == Some(actor_id)
                            || identifiers_match(&p.name, actor_id)
                    })
            })
            .map(|session| (session.match_id, SyncSnapshot::of(session)))
    }
}
