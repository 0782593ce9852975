use std::time::Duration;

use tracing::debug;

use crate::client::timer::SelectionTimer;
use crate::dto::draft_dto::{DraftSession, TOTAL_ACTIONS};
use crate::dto::sync_dto::{DraftActionRequest, SyncSnapshot};
use crate::services::turn_resolver::TurnResolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Snapshot merged; committed slots overwritten, currentAction adopted.
    Applied,
    /// Byte-for-byte identical content; nothing to do.
    Identical,
    /// Less progress than locally known; discarded entirely.
    Stale,
    /// A selection flow is open; the update is not applied this tick.
    Deferred,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnDirective {
    Wait,
    /// The local human participant owns the current slot.
    OpenSelection,
    /// The current slot's assigned participant is a bot; any controller may
    /// act for it, the gateway lets the first commit win.
    ScheduleBot { slot_index: usize, actor_id: String },
}

/// Per-participant mirror of one draft session. Single thread of control:
/// the poller, the bot scheduler and the (external) selection UI coordinate
/// through the two boolean guards, never through locks of their own.
pub struct DraftController {
    mirror: DraftSession,
    actor_id: String,
    resolver: TurnResolver,
    selection_open: bool,
    submission_in_flight: bool,
    timer: SelectionTimer,
    completed: bool,
}

impl DraftController {
    pub fn from_snapshot(
        actor_id: impl Into<String>,
        match_id: i64,
        snapshot: &SyncSnapshot,
        selection_time: Duration,
    ) -> Self {
        let mirror = DraftSession::new(match_id, snapshot.team1.clone(), snapshot.team2.clone());
        let mut controller = Self {
            mirror,
            actor_id: actor_id.into(),
            resolver: TurnResolver::new(),
            selection_open: false,
            submission_in_flight: false,
            timer: SelectionTimer::new(selection_time),
            completed: false,
        };
        controller.merge(snapshot);
        controller
    }

    pub fn mirror(&self) -> &DraftSession {
        &self.mirror
    }

    pub fn completed(&self) -> bool {
        self.completed
    }

    pub fn selection_open(&self) -> bool {
        self.selection_open
    }

    pub fn timer(&self) -> &SelectionTimer {
        &self.timer
    }

    /// Reconciliation entry point, one call per poll tick.
    pub fn apply_snapshot(&mut self, snapshot: &SyncSnapshot) -> MergeOutcome {
        if self.selection_open {
            // Never race a user's in-progress choice against a correction.
            return MergeOutcome::Deferred;
        }
        if snapshot.total_actions() < self.mirror.committed_count() {
            debug!(
                "Discarding stale snapshot: {} committed < {} known locally.",
                snapshot.total_actions(),
                self.mirror.committed_count()
            );
            return MergeOutcome::Stale;
        }
        if self.matches_mirror(snapshot) {
            return MergeOutcome::Identical;
        }
        self.merge(snapshot);
        MergeOutcome::Applied
    }

    fn matches_mirror(&self, snapshot: &SyncSnapshot) -> bool {
        snapshot.current_action == self.mirror.current_action
            && snapshot.total_actions() == self.mirror.committed_count()
            && snapshot.actions.iter().all(|a| {
                self.mirror
                    .slots
                    .get(a.slot_index)
                    .is_some_and(|s| s.locked && s.champion_id == Some(a.champion_id))
            })
    }

    fn merge(&mut self, snapshot: &SyncSnapshot) {
        // The snapshot is authoritative for already-committed slots.
        for action in &snapshot.actions {
            let Some(slot) = self.mirror.slots.get_mut(action.slot_index) else {
                continue;
            };
            slot.champion_id = Some(action.champion_id);
            slot.locked = true;
            if !action.actor_id.is_empty() {
                slot.actor_id = Some(action.actor_id.clone());
            }
        }

        let next = snapshot
            .actions
            .iter()
            .map(|a| a.slot_index + 1)
            .max()
            .unwrap_or(0);
        if next != self.mirror.current_action {
            self.mirror.current_action = next;
        }
        if next >= TOTAL_ACTIONS {
            self.completed = true;
            self.timer.clear();
        }
    }

    /// Rewinds the mirror after this participant's own accepted edit; the
    /// next snapshot confirms it.
    pub fn apply_local_edit(&mut self, slot_index: usize) {
        for slot in self.mirror.slots[slot_index..].iter_mut() {
            slot.champion_id = None;
            slot.locked = false;
        }
        self.mirror.current_action = slot_index;
        self.completed = false;
    }

    pub fn is_my_turn(&self) -> bool {
        if self.completed {
            return false;
        }
        let current = self.mirror.current_action;
        let Some(slot) = self.mirror.slots.get(current) else {
            return false;
        };
        if slot.locked {
            return false;
        }
        let roster_slot = self.mirror.assigned_participant(current);
        self.resolver.owns_slot(slot, roster_slot, &self.actor_id)
    }

    /// What this tick should do about the current slot.
    pub fn next_directive(&self) -> TurnDirective {
        if self.completed || self.submission_in_flight || self.selection_open {
            return TurnDirective::Wait;
        }
        let current = self.mirror.current_action;
        let Some(slot) = self.mirror.slots.get(current) else {
            return TurnDirective::Wait;
        };
        if slot.locked {
            return TurnDirective::Wait;
        }

        if let Some(participant) = self.mirror.assigned_participant(current)
            && participant.is_bot
        {
            let actor_id = participant
                .player_id
                .clone()
                .unwrap_or_else(|| participant.name.clone());
            return TurnDirective::ScheduleBot {
                slot_index: current,
                actor_id,
            };
        }
        if self.is_my_turn() {
            return TurnDirective::OpenSelection;
        }
        TurnDirective::Wait
    }

    /// Opens exactly one selection flow and arms the advisory timer.
    pub fn open_selection(&mut self) {
        self.selection_open = true;
        self.timer.start();
    }

    pub fn close_selection(&mut self) {
        self.selection_open = false;
        self.timer.clear();
    }

    /// Closes an expired selection flow. Returns true when it fired; the
    /// flow ends without submitting anything.
    pub fn selection_timed_out(&mut self) -> bool {
        if self.selection_open && self.timer.expired() {
            self.close_selection();
            return true;
        }
        false
    }

    /// Turns the user's single choice into a gateway request and closes the
    /// flow. The caller owns the in-flight guard around the actual send.
    pub fn confirm_selection(&mut self, champion_id: i64) -> Option<DraftActionRequest> {
        if !self.selection_open {
            return None;
        }
        let slot = self.mirror.slots.get(self.mirror.current_action)?;
        let request = DraftActionRequest {
            match_id: self.mirror.match_id,
            actor_id: self.actor_id.clone(),
            champion_id,
            action: slot.action,
        };
        self.close_selection();
        Some(request)
    }

    /// Claims the single in-flight submission guard.
    pub fn begin_submission(&mut self) -> bool {
        if self.submission_in_flight {
            return false;
        }
        self.submission_in_flight = true;
        true
    }

    pub fn finish_submission(&mut self) {
        self.submission_in_flight = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::draft_dto::{ActionType, DRAFT_ORDER, Team, TeamRosterSlot};

    fn roster(team: Team, bots_from: usize) -> Vec<TeamRosterSlot> {
        let base = if matches!(team, Team::Blue) { 0 } else { 5 };
        let lanes = ["top", "jungle", "mid", "adc", "support"];
        (0..5)
            .map(|i| TeamRosterSlot {
                team_index: base + i,
                player_id: Some(format!("p{}", base + i)),
                name: format!("Player{}", base + i),
                lane: lanes[i].to_string(),
                is_bot: base + i >= bots_from,
                is_autofill: false,
            })
            .collect()
    }

    /// Server-side session with the first `n` slots locked, as a snapshot.
    fn snapshot_with(n: usize) -> SyncSnapshot {
        let mut session = DraftSession::new(1, roster(Team::Blue, 10), roster(Team::Red, 10));
        for i in 0..n {
            session.slots[i].champion_id = Some(100 + i as i64);
            session.slots[i].locked = true;
        }
        session.current_action = n;
        SyncSnapshot::of(&session)
    }

    fn controller_for(actor: &str, snapshot: &SyncSnapshot) -> DraftController {
        DraftController::from_snapshot(actor, 1, snapshot, Duration::from_secs(30))
    }

    #[test]
    fn stale_snapshot_leaves_local_state_unchanged() {
        let mut controller = controller_for("p0", &snapshot_with(5));
        assert_eq!(controller.mirror().committed_count(), 5);

        let outcome = controller.apply_snapshot(&snapshot_with(3));
        assert_eq!(outcome, MergeOutcome::Stale);
        assert_eq!(controller.mirror().committed_count(), 5);
        assert_eq!(controller.mirror().current_action, 5);
    }

    #[test]
    fn identical_snapshot_is_ignored() {
        let snapshot = snapshot_with(5);
        let mut controller = controller_for("p0", &snapshot);
        assert_eq!(controller.apply_snapshot(&snapshot), MergeOutcome::Identical);
    }

    #[test]
    fn current_action_is_monotonic_across_polls() {
        let mut controller = controller_for("p0", &snapshot_with(0));
        let mut last = 0;
        for n in [2, 1, 4, 3, 4, 6] {
            controller.apply_snapshot(&snapshot_with(n));
            assert!(controller.mirror().current_action >= last);
            last = controller.mirror().current_action;
        }
        assert_eq!(last, 6);
    }

    #[test]
    fn merge_is_deferred_while_a_selection_flow_is_open() {
        let mut controller = controller_for("p0", &snapshot_with(0));
        controller.open_selection();
        assert_eq!(controller.apply_snapshot(&snapshot_with(2)), MergeOutcome::Deferred);
        assert_eq!(controller.mirror().committed_count(), 0);

        controller.close_selection();
        assert_eq!(controller.apply_snapshot(&snapshot_with(2)), MergeOutcome::Applied);
        assert_eq!(controller.mirror().committed_count(), 2);
    }

    #[test]
    fn completion_at_twenty_stops_the_timer() {
        let mut controller = controller_for("p0", &snapshot_with(0));
        controller.apply_snapshot(&snapshot_with(20));
        assert!(controller.completed());
        assert!(!controller.timer().running());
        assert_eq!(controller.next_directive(), TurnDirective::Wait);
    }

    #[test]
    fn directive_opens_selection_only_for_the_owning_human() {
        // Slot 0 belongs to blue player 0.
        let snapshot = snapshot_with(0);
        let controller = controller_for("p0", &snapshot);
        assert_eq!(controller.next_directive(), TurnDirective::OpenSelection);
        assert!(controller.is_my_turn());

        let controller = controller_for("p5", &snapshot);
        assert_eq!(controller.next_directive(), TurnDirective::Wait);
        assert!(!controller.is_my_turn());
    }

    #[test]
    fn directive_schedules_bots_regardless_of_ownership() {
        // Everyone from p5 up is a bot; slot 1 is red player 0 (= p5).
        let mut session = DraftSession::new(1, roster(Team::Blue, 5), roster(Team::Red, 5));
        session.slots[0].champion_id = Some(100);
        session.slots[0].locked = true;
        session.current_action = 1;
        let snapshot = SyncSnapshot::of(&session);

        let controller = controller_for("p0", &snapshot);
        assert_eq!(
            controller.next_directive(),
            TurnDirective::ScheduleBot {
                slot_index: 1,
                actor_id: "p5".to_string()
            }
        );
    }

    #[test]
    fn confirm_selection_builds_a_request_for_the_current_slot() {
        let mut controller = controller_for("p0", &snapshot_with(0));
        assert!(controller.confirm_selection(64).is_none());

        controller.open_selection();
        let request = controller.confirm_selection(64).unwrap();
        assert_eq!(request.action, ActionType::Ban);
        assert_eq!(request.champion_id, 64);
        assert_eq!(request.actor_id, "p0");
        assert!(!controller.selection_open());
    }

    #[test]
    fn submission_guard_is_exclusive() {
        let mut controller = controller_for("p0", &snapshot_with(0));
        assert!(controller.begin_submission());
        assert!(!controller.begin_submission());
        assert_eq!(controller.next_directive(), TurnDirective::Wait);
        controller.finish_submission();
        assert!(controller.begin_submission());
    }

    #[test]
    fn local_edit_rewinds_the_mirror() {
        let mut controller = controller_for("p0", &snapshot_with(8));
        controller.apply_local_edit(6);
        assert_eq!(controller.mirror().current_action, 6);
        assert_eq!(controller.mirror().committed_count(), 6);
        assert_eq!(DRAFT_ORDER[6].1, ActionType::Pick);
        assert!(controller.is_my_turn());
    }
}
