use std::collections::BTreeMap;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::armor::Armor;
use crate::conditions::{effective_stat, ConditionSet};
use crate::config::RulesConfig;
use crate::location::Location;
use crate::routing::Cyberlimb;

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CombatantId(pub String);

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

macro_rules! string_id {
    ($t:ty) => {
        impl From<&str> for $t {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl fmt::Display for $t {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(CombatantId);
string_id!(ItemId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stat {
    Int,
    Ref,
    Tech,
    Cool,
    Attr,
    Luck,
    Ma,
    Body,
    Emp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    #[serde(rename = "int")]
    pub int_: i32,
    #[serde(rename = "ref")]
    pub ref_: i32,
    pub tech: i32,
    pub cool: i32,
    pub attr: i32,
    pub luck: i32,
    pub ma: i32,
    pub body: i32,
    pub emp: i32,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            int_: 6,
            ref_: 6,
            tech: 6,
            cool: 6,
            attr: 6,
            luck: 6,
            ma: 6,
            body: 6,
            emp: 6,
        }
    }
}

impl Stats {
    pub fn get(&self, stat: Stat) -> i32 {
        match stat {
            Stat::Int => self.int_,
            Stat::Ref => self.ref_,
            Stat::Tech => self.tech,
            Stat::Cool => self.cool,
            Stat::Attr => self.attr,
            Stat::Luck => self.luck,
            Stat::Ma => self.ma,
            Stat::Body => self.body,
            Stat::Emp => self.emp,
        }
    }

    /// Body Type Modifier: wound points shaved off every hit.
    pub fn body_modifier(&self) -> i32 {
        match self.body {
            i32::MIN..=2 => 0,
            3..=4 => 1,
            5..=7 => 2,
            8..=9 => 3,
            10 => 4,
            _ => 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: Position) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Per-turn bookkeeping, reset when the combatant's turn starts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatScratch {
    pub actions: u8,
    pub last_position: Option<Position>,
    pub moved: f32,
    pub movement_action_taken: bool,
}

impl CombatScratch {
    pub fn reset_actions(&mut self) {
        self.actions = 0;
    }

    pub fn reset_movement(&mut self) {
        self.last_position = None;
        self.moved = 0.0;
        self.movement_action_taken = false;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemKind {
    Armor(Armor),
    Cyberlimb(Cyberlimb),
    Cyberware,
    Gear,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub kind: ItemKind,
    /// Parent item (e.g. cyberware mounted in a cyberlimb).
    #[serde(default)]
    pub attached_to: Option<ItemId>,
}

impl Item {
    pub fn new(id: &str, name: &str, kind: ItemKind) -> Self {
        Self {
            id: ItemId::from(id),
            name: name.to_string(),
            kind,
            attached_to: None,
        }
    }

    pub fn attached_to(mut self, parent: &str) -> Self {
        self.attached_to = Some(ItemId::from(parent));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combatant {
    pub id: CombatantId,
    pub name: String,
    #[serde(default)]
    pub stats: Stats,
    /// Wound accumulator, 0..=40.
    #[serde(default)]
    pub damage: u8,
    #[serde(default)]
    pub items: IndexMap<ItemId, Item>,
    /// Which locations are cyberlimbs, and the item that backs each one.
    #[serde(default)]
    pub cyberlimbs: BTreeMap<Location, ItemId>,
    #[serde(default)]
    pub conditions: ConditionSet,
    #[serde(default)]
    pub scratch: CombatScratch,
    #[serde(default)]
    pub initiative: Option<i32>,
}

impl Combatant {
    pub fn new(id: &str, name: &str, stats: Stats) -> Self {
        Self {
            id: CombatantId::from(id),
            name: name.to_string(),
            stats,
            damage: 0,
            items: IndexMap::new(),
            cyberlimbs: BTreeMap::new(),
            conditions: ConditionSet::default(),
            scratch: CombatScratch::default(),
            initiative: None,
        }
    }

    pub fn with_item(mut self, item: Item) -> Self {
        self.add_item(item);
        self
    }

    pub fn add_item(&mut self, item: Item) {
        if let ItemKind::Cyberlimb(limb) = &item.kind {
            self.cyberlimbs.insert(limb.location, item.id.clone());
        }
        self.items.insert(item.id.clone(), item);
    }

    /// Removes an item and everything attached to it, recursively.
    pub fn remove_item_tree(&mut self, id: &ItemId) -> Vec<Item> {
        let mut removed = Vec::new();
        let mut pending = vec![id.clone()];
        while let Some(next) = pending.pop() {
            if let Some(item) = self.items.shift_remove(&next) {
                pending.extend(
                    self.items
                        .values()
                        .filter(|i| i.attached_to.as_ref() == Some(&next))
                        .map(|i| i.id.clone()),
                );
                removed.push(item);
            }
        }
        self.cyberlimbs.retain(|_, item| item != id);
        removed
    }

    pub fn armor(&self) -> impl Iterator<Item = (&ItemId, &Armor)> {
        self.items.iter().filter_map(|(id, item)| match &item.kind {
            ItemKind::Armor(a) if a.equipped => Some((id, a)),
            _ => None,
        })
    }

    pub fn armor_mut(&mut self) -> impl Iterator<Item = (&ItemId, &mut Armor)> {
        self.items.iter_mut().filter_map(|(id, item)| match &mut item.kind {
            ItemKind::Armor(a) if a.equipped => Some((id, a)),
            _ => None,
        })
    }

    pub fn wound_state(&self, rules: &RulesConfig) -> u8 {
        rules.wound_state(self.damage)
    }

    pub fn effective_stat(&self, stat: Stat) -> i32 {
        effective_stat(self.stats.get(stat), stat, &self.conditions)
    }

    /// Meters this combatant may move in a turn before it costs an action.
    pub fn walk_allowance(&self, rules: &RulesConfig) -> f32 {
        self.effective_stat(Stat::Ma) as f32 * rules.walk_meters_per_ma
    }
}
