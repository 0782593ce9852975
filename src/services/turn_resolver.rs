use crate::dto::draft_dto::{ActionSlot, TeamRosterSlot};

/// A single rule in the ownership resolution chain. Returns `None` when the
/// data it needs is not populated, deferring to the next rule.
trait ResolveRule: Send + Sync {
    fn decide(
        &self,
        slot: &ActionSlot,
        roster_slot: Option<&TeamRosterSlot>,
        actor: &str,
    ) -> Option<bool>;
}

/// Compare two participant identifiers. Display names may carry a `#TAG`
/// suffix on one side only, so the bare game name also counts as a match.
pub fn identifiers_match(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    if a == b {
        return true;
    }
    fn game_name(s: &str) -> &str {
        s.split('#').next().unwrap_or(s)
    }
    game_name(a) == game_name(b)
}

struct ActorIdRule;

impl ResolveRule for ActorIdRule {
    fn decide(&self, slot: &ActionSlot, _: Option<&TeamRosterSlot>, actor: &str) -> Option<bool> {
        slot.actor_id.as_deref().map(|id| id == actor)
    }
}

struct ActorNameRule;

impl ResolveRule for ActorNameRule {
    fn decide(&self, slot: &ActionSlot, _: Option<&TeamRosterSlot>, actor: &str) -> Option<bool> {
        slot.actor_name
            .as_deref()
            .map(|name| identifiers_match(name, actor))
    }
}

struct RosterPositionRule;

impl ResolveRule for RosterPositionRule {
    fn decide(
        &self,
        _: &ActionSlot,
        roster_slot: Option<&TeamRosterSlot>,
        actor: &str,
    ) -> Option<bool> {
        roster_slot.map(|entry| {
            entry.player_id.as_deref() == Some(actor) || identifiers_match(&entry.name, actor)
        })
    }
}

/// Ordered ownership resolver: explicit actor id, then actor display name,
/// then the roster entry at the slot's declared position. Upstream roster
/// metadata is inconsistently populated, so the earlier rules may have
/// nothing to compare against.
pub struct TurnResolver {
    rules: Vec<Box<dyn ResolveRule>>,
}

impl TurnResolver {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(ActorIdRule),
                Box::new(ActorNameRule),
                Box::new(RosterPositionRule),
            ],
        }
    }

    /// Whether `actor` owns `slot`. `roster_slot` is the roster entry at the
    /// slot's team/playerIndex position, when one exists.
    pub fn owns_slot(
        &self,
        slot: &ActionSlot,
        roster_slot: Option<&TeamRosterSlot>,
        actor: &str,
    ) -> bool {
        for rule in &self.rules {
            if let Some(owns) = rule.decide(slot, roster_slot, actor) {
                return owns;
            }
        }
        false
    }
}

impl Default for TurnResolver {
    fn default() -> Self {
        Self::new()
    }
}
