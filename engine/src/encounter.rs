use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::actor::{Combatant, CombatantId};

/// Emitted by the initiative tracker whenever the active combatant changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnChange {
    #[serde(default)]
    pub prior_combatant_id: Option<CombatantId>,
    pub current_combatant_id: CombatantId,
    pub round: u32,
}

/// Which observer of a turn event gets to mutate state. Only one role may
/// run turn-driven effects, or they would be applied once per observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Authority,
    Observer,
}

/// The combatants in one fight. Iteration follows insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Encounter {
    pub active: bool,
    pub round: u32,
    pub current: Option<CombatantId>,
    pub combatants: IndexMap<CombatantId, Combatant>,
}

impl Encounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, combatant: Combatant) -> Self {
        self.add(combatant);
        self
    }

    pub fn add(&mut self, combatant: Combatant) {
        self.combatants.insert(combatant.id.clone(), combatant);
    }

    /// Marks the encounter active with `first` up in round 1.
    pub fn start(&mut self, first: &CombatantId) {
        self.active = true;
        self.round = 1;
        self.current = Some(first.clone());
    }

    pub fn get(&self, id: &CombatantId) -> Option<&Combatant> {
        self.combatants.get(id)
    }

    pub fn get_mut(&mut self, id: &CombatantId) -> Option<&mut Combatant> {
        self.combatants.get_mut(id)
    }

    pub fn is_current(&self, id: &CombatantId) -> bool {
        self.active && self.current.as_ref() == Some(id)
    }
}
