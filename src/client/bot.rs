use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use rand::seq::IndexedRandom;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::client::api::{ApiError, DraftApi};
use crate::client::controller::DraftController;
use crate::dto::draft_dto::DraftSession;
use crate::services::champion_catalog::ChampionCatalog;

/// Humanized delay before a bot acts, in milliseconds.
pub const DEFAULT_BOT_DELAY_MS: RangeInclusive<u64> = 2000..=5000;

struct PendingAction {
    slot_index: usize,
    handle: JoinHandle<()>,
}

/// Schedules at most one deferred bot submission per controller instance.
/// Re-triggering for the slot already pending keeps the running task;
/// a different slot replaces it.
pub struct BotScheduler {
    delay_ms: RangeInclusive<u64>,
    pending: Option<PendingAction>,
}

impl BotScheduler {
    pub fn new(delay_ms: RangeInclusive<u64>) -> Self {
        Self {
            delay_ms,
            pending: None,
        }
    }

    pub fn pending_slot(&self) -> Option<usize> {
        self.pending
            .as_ref()
            .filter(|p| !p.handle.is_finished())
            .map(|p| p.slot_index)
    }

    pub fn schedule(
        &mut self,
        api: DraftApi,
        controller: Arc<Mutex<DraftController>>,
        catalog: Arc<ChampionCatalog>,
        slot_index: usize,
        actor_id: String,
    ) {
        if self.pending_slot() == Some(slot_index) {
            return;
        }
        self.cancel();

        let delay = {
            let mut rng = rand::rng();
            Duration::from_millis(rng.random_range(self.delay_ms.clone()))
        };
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let submission = {
                let mut ctrl = controller.lock().await;
                let mirror = ctrl.mirror();
                // Reconciliation may have resolved the slot through another
                // path while we were waiting.
                if mirror.current_action != slot_index
                    || mirror.slots.get(slot_index).is_none_or(|s| s.locked)
                {
                    return;
                }
                let match_id = mirror.match_id;
                let action = mirror.slots[slot_index].action;
                let locked = mirror.locked_champion_ids();
                let choice = {
                    let mut rng = rand::rng();
                    catalog.eligible(&locked).choose(&mut rng).map(|c| c.id)
                };
                let Some(champion_id) = choice else {
                    warn!("No eligible champion left for bot {actor_id}.");
                    return;
                };
                if !ctrl.begin_submission() {
                    return;
                }
                (match_id, action, champion_id)
            };

            let (match_id, action, champion_id) = submission;
            let result = api.submit_action(match_id, &actor_id, champion_id, action).await;
            let mut ctrl = controller.lock().await;
            ctrl.finish_submission();
            match result {
                Ok(_) => info!(
                    "Bot {actor_id} committed {action:?} of champion {champion_id} at slot {slot_index}."
                ),
                Err(ApiError::Rejected(message)) => {
                    // Lost the race for the slot; the next poll shows the
                    // committed truth.
                    info!("Bot {actor_id} submission rejected: {message}");
                }
                Err(e) => warn!("Bot {actor_id} submission failed: {e}"),
            }
        });
        self.pending = Some(PendingAction { slot_index, handle });
    }

    /// Cancels the pending task when its slot got locked through another
    /// path.
    pub fn cancel_if_locked(&mut self, mirror: &DraftSession) {
        if let Some(slot_index) = self.pending_slot()
            && mirror.slots.get(slot_index).is_some_and(|s| s.locked)
        {
            self.cancel();
        }
    }

    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.handle.abort();
        }
    }
}

impl Drop for BotScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::champion_dto::Champion;
    use crate::dto::draft_dto::{DraftSession, Team, TeamRosterSlot};
    use crate::dto::sync_dto::SyncSnapshot;

    fn bot_roster(team: Team) -> Vec<TeamRosterSlot> {
        let base = if matches!(team, Team::Blue) { 0 } else { 5 };
        (0..5)
            .map(|i| TeamRosterSlot {
                team_index: base + i,
                player_id: Some(format!("bot{}", base + i)),
                name: format!("Bot {}", base + i),
                lane: "top".to_string(),
                is_bot: true,
                is_autofill: false,
            })
            .collect()
    }

    fn fixtures() -> (Arc<Mutex<DraftController>>, Arc<ChampionCatalog>) {
        let session = DraftSession::new(1, bot_roster(Team::Blue), bot_roster(Team::Red));
        let snapshot = SyncSnapshot::of(&session);
        let controller = DraftController::from_snapshot("bot0", 1, &snapshot, Duration::from_secs(30));
        let catalog = ChampionCatalog::from_champions(vec![Champion {
            id: 1,
            name: "Aatrox".to_string(),
            tags: vec![],
        }])
        .unwrap();
        (Arc::new(Mutex::new(controller)), Arc::new(catalog))
    }

    #[tokio::test(start_paused = true)]
    async fn retrigger_for_the_same_slot_keeps_the_pending_task() {
        let (controller, catalog) = fixtures();
        let api = DraftApi::new("http://127.0.0.1:1");
        let mut scheduler = BotScheduler::new(2000..=5000);

        scheduler.schedule(api.clone(), controller.clone(), catalog.clone(), 0, "bot0".into());
        assert_eq!(scheduler.pending_slot(), Some(0));

        // Re-triggering must not stack a second task or reset the delay.
        scheduler.schedule(api.clone(), controller.clone(), catalog.clone(), 0, "bot0".into());
        assert_eq!(scheduler.pending_slot(), Some(0));

        // A different slot replaces the pending task.
        scheduler.schedule(api, controller, catalog, 1, "bot5".into());
        assert_eq!(scheduler.pending_slot(), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn pending_task_is_cancelled_when_the_slot_locks() {
        let (controller, catalog) = fixtures();
        let api = DraftApi::new("http://127.0.0.1:1");
        let mut scheduler = BotScheduler::new(2000..=5000);
        scheduler.schedule(api, controller.clone(), catalog, 0, "bot0".into());

        {
            let mut ctrl = controller.lock().await;
            let mut session = ctrl.mirror().clone();
            session.slots[0].champion_id = Some(1);
            session.slots[0].locked = true;
            session.current_action = 1;
            ctrl.apply_snapshot(&SyncSnapshot::of(&session));
        }

        let ctrl = controller.lock().await;
        scheduler.cancel_if_locked(ctrl.mirror());
        assert_eq!(scheduler.pending_slot(), None);
    }
}
