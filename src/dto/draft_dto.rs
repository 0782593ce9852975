use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Blue,
    Red,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Ban,
    Pick,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum DraftPhase {
    #[serde(rename = "bans-1")]
    Bans1,
    #[serde(rename = "picks-1")]
    Picks1,
    #[serde(rename = "bans-2")]
    Bans2,
    #[serde(rename = "picks-2")]
    Picks2,
    #[serde(rename = "completed")]
    Completed,
}

/// The fixed tournament draft order: (team, action, playerIndex within the
/// team's five-player roster). Slot actors are never configurable per
/// session.
pub const DRAFT_ORDER: [(Team, ActionType, usize); 20] = [
    // First ban phase (6 bans)
    (Team::Blue, ActionType::Ban, 0),
    (Team::Red, ActionType::Ban, 0),
    (Team::Blue, ActionType::Ban, 1),
    (Team::Red, ActionType::Ban, 1),
    (Team::Blue, ActionType::Ban, 2),
    (Team::Red, ActionType::Ban, 2),
    // First pick phase (6 picks)
    (Team::Blue, ActionType::Pick, 0),
    (Team::Red, ActionType::Pick, 0),
    (Team::Red, ActionType::Pick, 1),
    (Team::Blue, ActionType::Pick, 1),
    (Team::Blue, ActionType::Pick, 2),
    (Team::Red, ActionType::Pick, 2),
    // Second ban phase (4 bans)
    (Team::Red, ActionType::Ban, 3),
    (Team::Blue, ActionType::Ban, 3),
    (Team::Red, ActionType::Ban, 4),
    (Team::Blue, ActionType::Ban, 4),
    // Second pick phase (4 picks)
    (Team::Red, ActionType::Pick, 3),
    (Team::Blue, ActionType::Pick, 3),
    (Team::Blue, ActionType::Pick, 4),
    (Team::Red, ActionType::Pick, 4),
];

pub const TOTAL_ACTIONS: usize = DRAFT_ORDER.len();

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TeamRosterSlot {
    /// Global index across both teams: 0-4 blue, 5-9 red.
    pub team_index: usize,
    pub player_id: Option<String>,
    pub name: String,
    pub lane: String,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub is_autofill: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ActionSlot {
    pub team: Team,
    pub action: ActionType,
    pub actor_id: Option<String>,
    pub actor_name: Option<String>,
    pub player_index: usize,
    pub champion_id: Option<i64>,
    pub locked: bool,
}

impl ActionSlot {
    fn from_order(
        team: Team,
        action: ActionType,
        player_index: usize,
        roster: &[TeamRosterSlot],
    ) -> Self {
        // Roster metadata is not always fully populated at session creation;
        // the turn resolver falls back to the roster position in that case.
        let assigned = roster.get(player_index);
        Self {
            team,
            action,
            actor_id: assigned.and_then(|p| p.player_id.clone()),
            actor_name: assigned.map(|p| p.name.clone()),
            player_index,
            champion_id: None,
            locked: false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DraftSession {
    pub id: String,
    pub match_id: i64,
    pub slots: Vec<ActionSlot>,
    pub current_action: usize,
    pub blue_team: Vec<TeamRosterSlot>,
    pub red_team: Vec<TeamRosterSlot>,
    pub created_at: DateTime<Utc>,
}

impl DraftSession {
    pub fn new(
        match_id: i64,
        blue_team: Vec<TeamRosterSlot>,
        red_team: Vec<TeamRosterSlot>,
    ) -> Self {
        let slots = DRAFT_ORDER
            .iter()
            .map(|&(team, action, player_index)| {
                let roster = match team {
                    Team::Blue => &blue_team,
                    Team::Red => &red_team,
                };
                ActionSlot::from_order(team, action, player_index, roster)
            })
            .collect();

        Self {
            id: format!("draft-{match_id}"),
            match_id,
            slots,
            current_action: 0,
            blue_team,
            red_team,
            created_at: Utc::now(),
        }
    }

    pub fn phase(&self) -> DraftPhase {
        match self.current_action {
            0..=5 => DraftPhase::Bans1,
            6..=11 => DraftPhase::Picks1,
            12..=15 => DraftPhase::Bans2,
            16..=19 => DraftPhase::Picks2,
            _ => DraftPhase::Completed,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.current_action >= TOTAL_ACTIONS
    }

    pub fn champion_used(&self, champion_id: i64) -> bool {
        self.slots
            .iter()
            .any(|s| s.locked && s.champion_id == Some(champion_id))
    }

    pub fn locked_champion_ids(&self) -> Vec<i64> {
        self.slots
            .iter()
            .filter(|s| s.locked)
            .filter_map(|s| s.champion_id)
            .collect()
    }

    pub fn committed_count(&self) -> usize {
        self.slots.iter().filter(|s| s.locked).count()
    }

    pub fn roster(&self, team: Team) -> &[TeamRosterSlot] {
        match team {
            Team::Blue => &self.blue_team,
            Team::Red => &self.red_team,
        }
    }

    /// The roster participant assigned to a slot, when the roster has an
    /// entry at the slot's declared position.
    pub fn assigned_participant(&self, slot_index: usize) -> Option<&TeamRosterSlot> {
        let slot = self.slots.get(slot_index)?;
        self.roster(slot.team).get(slot.player_index)
    }

    /// Locked pick champion ids for one team, in draft order.
    pub fn team_picks(&self, team: Team) -> Vec<i64> {
        self.slots
            .iter()
            .filter(|s| s.team == team && s.action == ActionType::Pick && s.locked)
            .filter_map(|s| s.champion_id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster(team: Team) -> Vec<TeamRosterSlot> {
        let base = if matches!(team, Team::Blue) { 0 } else { 5 };
        let lanes = ["top", "jungle", "mid", "adc", "support"];
        (0..5)
            .map(|i| TeamRosterSlot {
                team_index: base + i,
                player_id: Some(format!("p{}", base + i)),
                name: format!("Player{}", base + i),
                lane: lanes[i].to_string(),
                is_bot: false,
                is_autofill: false,
            })
            .collect()
    }

    #[test]
    fn draft_order_has_ten_bans_and_ten_picks() {
        let bans = DRAFT_ORDER
            .iter()
            .filter(|(_, a, _)| *a == ActionType::Ban)
            .count();
        let picks = DRAFT_ORDER
            .iter()
            .filter(|(_, a, _)| *a == ActionType::Pick)
            .count();
        assert_eq!(bans, 10);
        assert_eq!(picks, 10);

        for team in [Team::Blue, Team::Red] {
            let team_picks = DRAFT_ORDER
                .iter()
                .filter(|(t, a, _)| *t == team && *a == ActionType::Pick)
                .count();
            assert_eq!(team_picks, 5);
        }
    }

    #[test]
    fn new_session_starts_at_action_zero_in_first_ban_phase() {
        let session = DraftSession::new(42, roster(Team::Blue), roster(Team::Red));
        assert_eq!(session.current_action, 0);
        assert_eq!(session.slots.len(), TOTAL_ACTIONS);
        assert_eq!(session.phase(), DraftPhase::Bans1);
        assert!(session.slots.iter().all(|s| !s.locked && s.champion_id.is_none()));
    }

    #[test]
    fn slots_carry_assigned_actor_from_roster() {
        let session = DraftSession::new(42, roster(Team::Blue), roster(Team::Red));
        // Slot 0 is the blue team's first ban, player index 0.
        assert_eq!(session.slots[0].actor_id.as_deref(), Some("p0"));
        // Slot 19 is the red team's last pick, player index 4.
        assert_eq!(session.slots[19].actor_id.as_deref(), Some("p9"));
        assert_eq!(session.slots[19].action, ActionType::Pick);
    }

    #[test]
    fn phase_follows_current_action() {
        let mut session = DraftSession::new(1, roster(Team::Blue), roster(Team::Red));
        session.current_action = 6;
        assert_eq!(session.phase(), DraftPhase::Picks1);
        session.current_action = 12;
        assert_eq!(session.phase(), DraftPhase::Bans2);
        session.current_action = 16;
        assert_eq!(session.phase(), DraftPhase::Picks2);
        session.current_action = 20;
        assert_eq!(session.phase(), DraftPhase::Completed);
        assert!(session.is_completed());
    }
}
