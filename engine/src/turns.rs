//! Turn-boundary rules.
//!
//! Each rule looks at one combatant and returns the changes it wants plus
//! the events it produced. Rules run in a fixed order and each rule's
//! changes are applied before the next rule runs.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::actor::Combatant;
use crate::armor::{ablate_location, has_armor_at};
use crate::checks::{death_save, stun_save, SaveResult};
use crate::conditions::ConditionId;
use crate::config::RulesConfig;
use crate::encounter::{Encounter, Role, TurnChange};
use crate::life::apply_wounds;
use crate::location::Location;
use crate::{DamageDice, Roller};

pub struct TurnContext<'a> {
    pub round: u32,
    pub rules: &'a RulesConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum Change {
    ResetActions,
    ResetMovement,
    Add { condition: ConditionId },
    Remove { condition: ConditionId },
    /// Counts a timed condition down; it drops off at zero.
    Decrement { condition: ConditionId },
    /// Wound points that skip armor and body modifier.
    Wound { amount: i32 },
    Ablate { location: Location, amount: i32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TurnEvent {
    Save(SaveResult),
    Burned { dice: DamageDice, rolled: i32 },
    Corroded {
        dice: DamageDice,
        rolled: i32,
        location: Location,
        armored: bool,
    },
}

impl fmt::Display for TurnEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnEvent::Save(save) => write!(f, "{save}"),
            TurnEvent::Burned { dice, rolled } => write!(f, "burns for {dice} = {rolled}"),
            TurnEvent::Corroded {
                dice,
                rolled,
                location,
                armored,
            } => write!(
                f,
                "acid eats {} {} for {dice} = {rolled}",
                location,
                if *armored { "armor" } else { "flesh" }
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleOutcome {
    pub changes: Vec<Change>,
    pub events: Vec<TurnEvent>,
}

impl RuleOutcome {
    fn none() -> Self {
        Self::default()
    }

    fn change(mut self, change: Change) -> Self {
        self.changes.push(change);
        self
    }

    fn event(mut self, event: TurnEvent) -> Self {
        self.events.push(event);
        self
    }
}

pub type TurnRule = fn(&Combatant, &TurnContext<'_>, &mut dyn Roller) -> RuleOutcome;

pub const TURN_START_RULES: &[(&str, TurnRule)] = &[
    ("reset-actions", reset_actions),
    ("reset-movement", reset_movement),
    ("shock-save", shock_save),
    ("death-save", mortal_death_save),
    ("burning", burning),
    ("acid", acid),
    ("timed-countdown", timed_countdown),
];

pub const TURN_END_RULES: &[(&str, TurnRule)] = &[("end-turn-boosts", clear_turn_boosts)];

pub fn reset_actions(_: &Combatant, _: &TurnContext<'_>, _: &mut dyn Roller) -> RuleOutcome {
    RuleOutcome::none().change(Change::ResetActions)
}

pub fn reset_movement(_: &Combatant, _: &TurnContext<'_>, _: &mut dyn Roller) -> RuleOutcome {
    RuleOutcome::none().change(Change::ResetMovement)
}

pub fn shock_save(c: &Combatant, ctx: &TurnContext<'_>, roller: &mut dyn Roller) -> RuleOutcome {
    if !c.conditions.has(ConditionId::Shocked) || c.conditions.has(ConditionId::Dead) {
        return RuleOutcome::none();
    }
    let save = stun_save(c, 0, roller, ctx.rules);
    let out = RuleOutcome::none().event(TurnEvent::Save(save));
    if save.passed {
        out.change(Change::Remove {
            condition: ConditionId::Shocked,
        })
    } else {
        out
    }
}

pub fn mortal_death_save(
    c: &Combatant,
    ctx: &TurnContext<'_>,
    roller: &mut dyn Roller,
) -> RuleOutcome {
    let mortal = ctx.rules.is_mortal(c.wound_state(ctx.rules));
    if !mortal || c.conditions.has(ConditionId::Stabilized) || c.conditions.has(ConditionId::Dead) {
        return RuleOutcome::none();
    }
    let save = death_save(c, roller, ctx.rules);
    let out = RuleOutcome::none().event(TurnEvent::Save(save));
    if save.passed {
        out
    } else {
        out.change(Change::Add {
            condition: ConditionId::Dead,
        })
    }
}

/// A lingering condition with no turns left on it just ends.
fn spent(condition: ConditionId) -> RuleOutcome {
    RuleOutcome::none().change(Change::Remove { condition })
}

pub fn burning(c: &Combatant, ctx: &TurnContext<'_>, roller: &mut dyn Roller) -> RuleOutcome {
    if !c.conditions.has(ConditionId::Burning) {
        return RuleOutcome::none();
    }
    let remaining = match c.conditions.remaining(ConditionId::Burning) {
        Some(n) if n > 0 => n,
        _ => return spent(ConditionId::Burning),
    };
    let Some(dice) = ctx.rules.burning_dice_for(remaining) else {
        return RuleOutcome::none();
    };
    let rolled = roller.roll(dice).max(0);
    RuleOutcome::none()
        .event(TurnEvent::Burned { dice, rolled })
        .change(Change::Wound { amount: rolled })
        .change(Change::Decrement {
            condition: ConditionId::Burning,
        })
}

pub fn acid(c: &Combatant, ctx: &TurnContext<'_>, roller: &mut dyn Roller) -> RuleOutcome {
    if !c.conditions.has(ConditionId::Acid) {
        return RuleOutcome::none();
    }
    match c.conditions.remaining(ConditionId::Acid) {
        Some(n) if n > 0 => {}
        _ => return spent(ConditionId::Acid),
    }
    let location = c.conditions.acid_location().unwrap_or(Location::Torso);
    let dice = ctx.rules.acid_dice;
    let rolled = roller.roll(dice).max(0);
    let armored = has_armor_at(c, location);
    let hit = if armored {
        Change::Ablate {
            location,
            amount: rolled,
        }
    } else {
        Change::Wound { amount: rolled }
    };
    RuleOutcome::none()
        .event(TurnEvent::Corroded {
            dice,
            rolled,
            location,
            armored,
        })
        .change(hit)
        .change(Change::Decrement {
            condition: ConditionId::Acid,
        })
}

pub fn timed_countdown(c: &Combatant, _: &TurnContext<'_>, _: &mut dyn Roller) -> RuleOutcome {
    [ConditionId::Blinded, ConditionId::Deafened, ConditionId::Microwaved]
        .into_iter()
        .filter(|id| c.conditions.has(*id))
        .fold(RuleOutcome::none(), |out, condition| {
            out.change(Change::Decrement { condition })
        })
}

pub fn clear_turn_boosts(c: &Combatant, _: &TurnContext<'_>, _: &mut dyn Roller) -> RuleOutcome {
    [ConditionId::FastDraw, ConditionId::ActionSurge]
        .into_iter()
        .filter(|id| c.conditions.has(*id))
        .fold(RuleOutcome::none(), |out, condition| {
            out.change(Change::Remove { condition })
        })
}

pub fn apply_changes(
    combatant: &mut Combatant,
    changes: &[Change],
    rules: &RulesConfig,
    mut log: impl FnMut(String),
) {
    for change in changes {
        match *change {
            Change::ResetActions => combatant.scratch.reset_actions(),
            Change::ResetMovement => combatant.scratch.reset_movement(),
            Change::Add { condition } => {
                if combatant.conditions.add(condition) {
                    log(format!("[COND][{}] gains {}", combatant.name, condition.label()));
                }
            }
            Change::Remove { condition } => {
                if combatant.conditions.remove(condition) {
                    log(format!(
                        "[COND][{}] is no longer {}",
                        combatant.name,
                        condition.label()
                    ));
                }
            }
            Change::Decrement { condition } => {
                if combatant.conditions.decrement(condition) == Some(0) {
                    log(format!("[COND][{}] {} ends", combatant.name, condition.label()));
                }
            }
            Change::Wound { amount } => {
                apply_wounds(combatant, amount, rules, &mut log);
            }
            Change::Ablate { location, amount } => {
                for ch in ablate_location(combatant, location, amount) {
                    log(format!(
                        "[ARMOR][{}] {} at {}: ablation {} → {}",
                        combatant.name, ch.item, ch.location, ch.before, ch.after
                    ));
                }
            }
        }
    }
}

fn run_rules(
    rules_list: &[(&str, TurnRule)],
    combatant: &mut Combatant,
    ctx: &TurnContext<'_>,
    roller: &mut dyn Roller,
    log: &mut impl FnMut(String),
) -> Vec<TurnEvent> {
    let mut events = Vec::new();
    for (name, rule) in rules_list {
        let outcome = rule(combatant, ctx, roller);
        if outcome.changes.is_empty() && outcome.events.is_empty() {
            continue;
        }
        debug!(rule = name, combatant = %combatant.name, changes = outcome.changes.len(), "turn rule");
        for ev in &outcome.events {
            log(format!("[TURN][{}] {}", combatant.name, ev));
        }
        apply_changes(combatant, &outcome.changes, ctx.rules, &mut *log);
        events.extend(outcome.events);
    }
    events
}

pub fn on_turn_start(
    combatant: &mut Combatant,
    ctx: &TurnContext<'_>,
    roller: &mut dyn Roller,
    mut log: impl FnMut(String),
) -> Vec<TurnEvent> {
    run_rules(TURN_START_RULES, combatant, ctx, roller, &mut log)
}

pub fn on_turn_end(
    combatant: &mut Combatant,
    ctx: &TurnContext<'_>,
    roller: &mut dyn Roller,
    mut log: impl FnMut(String),
) -> Vec<TurnEvent> {
    run_rules(TURN_END_RULES, combatant, ctx, roller, &mut log)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TurnReport {
    pub events: Vec<TurnEvent>,
    pub log: Vec<String>,
}

/// Reacts to a turn change: end-of-turn rules for the prior combatant, a
/// round reset of initiative, then start-of-turn rules for the new one.
/// Observers only watch.
pub fn on_turn_change(
    encounter: &mut Encounter,
    change: &TurnChange,
    role: Role,
    roller: &mut dyn Roller,
    rules: &RulesConfig,
) -> TurnReport {
    let mut report = TurnReport::default();
    if role != Role::Authority {
        return report;
    }
    let ctx = TurnContext {
        round: change.round,
        rules,
    };
    let mut log = Vec::new();

    if let Some(prior) = change.prior_combatant_id.as_ref() {
        if let Some(c) = encounter.get_mut(prior) {
            report
                .events
                .extend(on_turn_end(c, &ctx, roller, |m| log.push(m)));
        } else {
            debug!(%prior, "prior combatant not in encounter");
        }
    }

    if change.round > encounter.round && change.round > 1 {
        for c in encounter.combatants.values_mut() {
            c.initiative = None;
        }
        log.push(format!("[ROUND] {} → initiative reset", change.round));
    }
    encounter.active = true;
    encounter.round = change.round;
    encounter.current = Some(change.current_combatant_id.clone());

    if let Some(c) = encounter.get_mut(&change.current_combatant_id) {
        report
            .events
            .extend(on_turn_start(c, &ctx, roller, |m| log.push(m)));
    } else {
        debug!(current = %change.current_combatant_id, "current combatant not in encounter");
    }

    report.log = log;
    report
}
