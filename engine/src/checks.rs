use std::fmt;

use serde::Serialize;

use crate::actor::Combatant;
use crate::config::RulesConfig;
use crate::Roller;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveKind {
    Stun,
    Death,
}

/// A roll-under check on the save die.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SaveResult {
    pub kind: SaveKind,
    pub roll: i32,
    pub target: i32,
    pub passed: bool,
}

impl fmt::Display for SaveResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} save roll={} target={} → {}",
            self.kind,
            self.roll,
            self.target,
            if self.passed { "SUCCESS" } else { "FAIL" }
        )
    }
}

/// Stun penalty grows by one per wound state past Light.
pub fn stun_penalty(wound_state: u8) -> i32 {
    wound_state.saturating_sub(1) as i32
}

/// Death penalty is the mortal level (Mortal 0 = 0).
pub fn death_penalty(wound_state: u8, rules: &RulesConfig) -> i32 {
    wound_state.saturating_sub(rules.mortal_state) as i32
}

fn roll_under(kind: SaveKind, target: i32, roller: &mut dyn Roller, rules: &RulesConfig) -> SaveResult {
    let roll = roller.roll(rules.save_die);
    SaveResult {
        kind,
        roll,
        target,
        passed: roll <= target,
    }
}

/// Stun (shock) save against BODY with an extra penalty on top.
pub fn stun_save(
    combatant: &Combatant,
    extra_penalty: i32,
    roller: &mut dyn Roller,
    rules: &RulesConfig,
) -> SaveResult {
    let state = combatant.wound_state(rules);
    let target = combatant.stats.body - stun_penalty(state) - extra_penalty;
    roll_under(SaveKind::Stun, target, roller, rules)
}

pub fn death_save(combatant: &Combatant, roller: &mut dyn Roller, rules: &RulesConfig) -> SaveResult {
    let state = combatant.wound_state(rules);
    let target = combatant.stats.body - death_penalty(state, rules);
    roll_under(SaveKind::Death, target, roller, rules)
}
