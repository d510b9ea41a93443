use serde::Serialize;
use tracing::info;

use crate::actor::Combatant;
use crate::checks::{death_save, stun_save, SaveResult};
use crate::conditions::{ConditionId, WoundTier};
use crate::config::RulesConfig;
use crate::Roller;

/// Accumulator and wound state around one change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WoundChange {
    pub damage_before: u8,
    pub damage_after: u8,
    pub state_before: u8,
    pub state_after: u8,
}

impl WoundChange {
    pub fn became_mortal(&self, rules: &RulesConfig) -> bool {
        !rules.is_mortal(self.state_before) && rules.is_mortal(self.state_after)
    }
}

/// Keeps the wound-ladder condition in step with the accumulator.
pub fn sync_wound_tier(combatant: &mut Combatant, rules: &RulesConfig) {
    let tier = WoundTier::from_state(combatant.wound_state(rules));
    combatant.conditions.set_wound_tier(tier);
}

fn shift_damage(combatant: &mut Combatant, delta: i32, rules: &RulesConfig) -> WoundChange {
    let damage_before = combatant.damage;
    let state_before = combatant.wound_state(rules);
    combatant.damage = (damage_before as i32).saturating_add(delta).clamp(0, rules.max_damage as i32) as u8;
    sync_wound_tier(combatant, rules);
    WoundChange {
        damage_before,
        damage_after: combatant.damage,
        state_before,
        state_after: combatant.wound_state(rules),
    }
}

/// Adds wound points, clamped to [0, max_damage].
pub fn apply_wounds(
    combatant: &mut Combatant,
    amount: i32,
    rules: &RulesConfig,
    mut log: impl FnMut(String),
) -> WoundChange {
    let change = shift_damage(combatant, amount.max(0), rules);
    log(format!(
        "[DMG][{}] {} → {} (+{})",
        combatant.name, change.damage_before, change.damage_after, amount
    ));
    if change.state_after != change.state_before {
        let label = combatant
            .conditions
            .wound_tier()
            .map(|t| ConditionId::Wound(t).label())
            .unwrap_or("Uninjured");
        log(format!("[COND][{}] wound state is now {}", combatant.name, label));
    }
    change
}

pub fn heal(
    combatant: &mut Combatant,
    amount: i32,
    rules: &RulesConfig,
    mut log: impl FnMut(String),
) -> WoundChange {
    let change = shift_damage(combatant, -amount.max(0), rules);
    log(format!(
        "[HEAL][{}] {} → {} (−{})",
        combatant.name, change.damage_before, change.damage_after, amount
    ));
    change
}

/// Stabilized combatants skip death saves until they are hurt again.
pub fn stabilize(combatant: &mut Combatant, mut log: impl FnMut(String)) -> bool {
    if combatant.conditions.has(ConditionId::Dead) {
        return false;
    }
    let added = combatant.conditions.add(ConditionId::Stabilized);
    if added {
        log(format!("[STATE][{}] is stabilized", combatant.name));
    }
    added
}

/// Stun save; failure shocks.
pub fn roll_stun_save(
    combatant: &mut Combatant,
    roller: &mut dyn Roller,
    rules: &RulesConfig,
    mut log: impl FnMut(String),
) -> SaveResult {
    let save = stun_save(combatant, 0, roller, rules);
    log(format!("[SAVE][{}] {}", combatant.name, save));
    if !save.passed && combatant.conditions.add(ConditionId::Shocked) {
        info!(combatant = %combatant.name, "shocked");
        log(format!("[COND][{}] is Shocked", combatant.name));
    }
    save
}

/// Death save; failure kills.
pub fn roll_death_save(
    combatant: &mut Combatant,
    roller: &mut dyn Roller,
    rules: &RulesConfig,
    mut log: impl FnMut(String),
) -> SaveResult {
    let save = death_save(combatant, roller, rules);
    log(format!("[DEATHSAVE][{}] {}", combatant.name, save));
    if !save.passed && combatant.conditions.add(ConditionId::Dead) {
        info!(combatant = %combatant.name, "dead");
        log(format!("[STATE][{}] → DEAD", combatant.name));
    }
    save
}
