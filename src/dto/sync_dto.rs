use serde::{Deserialize, Serialize};

use crate::dto::draft_dto::{ActionType, DraftSession, Team, TeamRosterSlot};

/// One locked slot as reported by the authoritative store.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CommittedAction {
    pub slot_index: usize,
    pub champion_id: i64,
    pub actor_id: String,
    /// Global roster index: 0-4 blue, 5-9 red.
    pub team_index: usize,
    pub player_index: usize,
}

/// Read-only projection of a session. Reconciliation input only, never
/// primary storage.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SyncSnapshot {
    pub actions: Vec<CommittedAction>,
    pub team1: Vec<TeamRosterSlot>,
    pub team2: Vec<TeamRosterSlot>,
    pub current_action: usize,
}

impl SyncSnapshot {
    pub fn of(session: &DraftSession) -> Self {
        let actions = session
            .slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.locked)
            .filter_map(|(i, s)| {
                let champion_id = s.champion_id?;
                let team_index = match s.team {
                    Team::Blue => s.player_index,
                    Team::Red => 5 + s.player_index,
                };
                Some(CommittedAction {
                    slot_index: i,
                    champion_id,
                    actor_id: s
                        .actor_id
                        .clone()
                        .or_else(|| s.actor_name.clone())
                        .unwrap_or_default(),
                    team_index,
                    player_index: s.player_index,
                })
            })
            .collect();

        Self {
            actions,
            team1: session.blue_team.clone(),
            team2: session.red_team.clone(),
            current_action: session.current_action,
        }
    }

    pub fn total_actions(&self) -> usize {
        self.actions.len()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DraftActionRequest {
    pub match_id: i64,
    pub actor_id: String,
    pub champion_id: i64,
    pub action: ActionType,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DraftActionResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DraftEditRequest {
    pub match_id: i64,
    pub actor_id: String,
    pub slot_index: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateDraftRequest {
    pub match_id: i64,
    pub team1: Vec<TeamRosterSlot>,
    pub team2: Vec<TeamRosterSlot>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CancelDraftRequest {
    pub match_id: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatusResponse {
    pub status: String,
    pub match_id: i64,
    pub pick_ban_data: SyncSnapshot,
    pub total_actions: usize,
}
