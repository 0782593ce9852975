use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::client::api::{ApiError, DraftApi};
use crate::client::bot::{BotScheduler, DEFAULT_BOT_DELAY_MS};
use crate::client::controller::{DraftController, MergeOutcome, TurnDirective};
use crate::client::timer::DEFAULT_SELECTION_TIME;
use crate::services::champion_catalog::ChampionCatalog;

pub const DEFAULT_POLL_PERIOD: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub poll_period: Duration,
    pub bot_delay_ms: RangeInclusive<u64>,
    pub selection_time: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            poll_period: DEFAULT_POLL_PERIOD,
            bot_delay_ms: DEFAULT_BOT_DELAY_MS,
            selection_time: DEFAULT_SELECTION_TIME,
        }
    }
}

/// One participant's cooperative client: the reconciliation poller plus the
/// controller and bot scheduler it drives.
pub struct ClientRuntime {
    api: DraftApi,
    actor_id: String,
    controller: Arc<Mutex<DraftController>>,
    scheduler: BotScheduler,
    catalog: Arc<ChampionCatalog>,
    poll_period: Duration,
}

impl ClientRuntime {
    /// Fetches the first authoritative snapshot and builds the local
    /// mirror around it.
    pub async fn connect(
        api: DraftApi,
        catalog: Arc<ChampionCatalog>,
        actor_id: impl Into<String>,
        config: ClientConfig,
    ) -> Result<Self, ApiError> {
        let actor_id = actor_id.into();
        let status = api.sync_status(&actor_id).await?;
        info!(
            "Joined draft for match {} as {} ({} actions committed).",
            status.match_id, actor_id, status.total_actions
        );
        let controller = DraftController::from_snapshot(
            &actor_id,
            status.match_id,
            &status.pick_ban_data,
            config.selection_time,
        );
        Ok(Self {
            api,
            actor_id,
            controller: Arc::new(Mutex::new(controller)),
            scheduler: BotScheduler::new(config.bot_delay_ms),
            catalog,
            poll_period: config.poll_period,
        })
    }

    /// Shared handle for the selection UI (and tests) to drive choices
    /// through.
    pub fn controller(&self) -> Arc<Mutex<DraftController>> {
        self.controller.clone()
    }

    pub fn api(&self) -> DraftApi {
        self.api.clone()
    }

    /// Read-repair loop: fetch, merge under the non-regression rule, then
    /// hand the turn to the human flow or the bot scheduler. Runs until the
    /// draft completes.
    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.poll_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            // The fetch is the only blocking operation and is bounded by the
            // request timeout; on failure we just wait for the next tick.
            let status = match self.api.sync_status(&self.actor_id).await {
                Ok(status) => status,
                Err(e) => {
                    warn!("Sync poll failed for {}: {e}", self.actor_id);
                    continue;
                }
            };

            let mut ctrl = self.controller.lock().await;
            match ctrl.apply_snapshot(&status.pick_ban_data) {
                MergeOutcome::Stale => {
                    // Logged for diagnostics, never surfaced as an error.
                    continue;
                }
                MergeOutcome::Deferred | MergeOutcome::Identical | MergeOutcome::Applied => {}
            }

            if ctrl.selection_timed_out() {
                info!("Selection time ran out for {}; closing the flow.", self.actor_id);
            }

            self.scheduler.cancel_if_locked(ctrl.mirror());

            if ctrl.completed() {
                info!(
                    "Draft for match {} completed; stopping poller for {}.",
                    ctrl.mirror().match_id,
                    self.actor_id
                );
                break;
            }

            match ctrl.next_directive() {
                TurnDirective::OpenSelection => {
                    ctrl.open_selection();
                    info!("It is {}'s turn; selection flow opened.", self.actor_id);
                }
                TurnDirective::ScheduleBot {
                    slot_index,
                    actor_id,
                } => {
                    drop(ctrl);
                    self.scheduler.schedule(
                        self.api.clone(),
                        self.controller.clone(),
                        self.catalog.clone(),
                        slot_index,
                        actor_id,
                    );
                }
                TurnDirective::Wait => {}
            }
        }
        self.scheduler.cancel();
    }
}
