use tracing::debug;

use crate::actor::{CombatantId, Position};
use crate::conditions::ConditionId;
use crate::config::RulesConfig;
use crate::encounter::Encounter;

/// Counts an action for the combatant whose turn it is. The count is
/// stored before the surge rule runs, so the second action itself is not
/// penalized. Returns true when this action was the second of the turn.
pub fn register_action(
    encounter: &mut Encounter,
    actor: &CombatantId,
    mut log: impl FnMut(String),
) -> bool {
    if !encounter.is_current(actor) {
        debug!(%actor, "action outside own turn ignored");
        return false;
    }
    let Some(c) = encounter.get_mut(actor) else {
        return false;
    };

    c.scratch.actions = c.scratch.actions.saturating_add(1);
    let count = c.scratch.actions;
    log(format!("[ACTION][{}] action #{} this turn", c.name, count));

    if count != 2 {
        return false;
    }
    if c.conditions.add(ConditionId::ActionSurge) {
        log(format!(
            "[COND][{}] gains {}",
            c.name,
            ConditionId::ActionSurge.label()
        ));
    }
    true
}

/// Tracks token movement during the combatant's turn. Moving farther than
/// the walk allowance costs one action, at most once per turn. Returns true
/// when this move registered that action.
pub fn record_movement(
    encounter: &mut Encounter,
    actor: &CombatantId,
    from: Position,
    to: Position,
    rules: &RulesConfig,
    mut log: impl FnMut(String),
) -> bool {
    if !encounter.is_current(actor) {
        return false;
    }
    let Some(c) = encounter.get_mut(actor) else {
        return false;
    };

    let start = c.scratch.last_position.unwrap_or(from);
    c.scratch.moved += start.distance_to(to);
    c.scratch.last_position = Some(to);

    let allowance = c.walk_allowance(rules);
    if c.scratch.movement_action_taken || c.scratch.moved <= allowance {
        return false;
    }
    c.scratch.movement_action_taken = true;
    log(format!(
        "[MOVE][{}] moved {:.1}m of {:.1}m walk allowance",
        c.name, c.scratch.moved, allowance
    ));
    register_action(encounter, actor, log);
    true
}
