use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::actor::{Combatant, ItemId, ItemKind};
use crate::location::Location;
use crate::penetration::Hardness;

/// SP of one armor piece at one location. Invariant: 0 <= ablation <= sp_max.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArmorCoverage {
    pub sp_max: i32,
    #[serde(default)]
    pub ablation: i32,
}

impl ArmorCoverage {
    pub fn new(sp_max: i32) -> Self {
        Self { sp_max, ablation: 0 }
    }

    pub fn current(&self) -> i32 {
        (self.sp_max - self.ablation).max(0)
    }

    /// Adds ablation, capped at max SP. Returns the new ablation.
    pub fn ablate(&mut self, amount: i32) -> i32 {
        self.ablation = self.ablation.saturating_add(amount.max(0)).clamp(0, self.sp_max.max(0));
        self.ablation
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Armor {
    #[serde(default = "default_equipped")]
    pub equipped: bool,
    #[serde(default)]
    pub hardness: Hardness,
    pub coverage: BTreeMap<Location, ArmorCoverage>,
}

fn default_equipped() -> bool {
    true
}

impl Armor {
    pub fn new(hardness: Hardness, sp: i32, locations: &[Location]) -> Self {
        Self {
            equipped: true,
            hardness,
            coverage: locations
                .iter()
                .map(|loc| (*loc, ArmorCoverage::new(sp)))
                .collect(),
        }
    }

    pub fn covers(&self, location: Location) -> Option<&ArmorCoverage> {
        self.coverage.get(&location)
    }

    /// Clears ablation at one location, or everywhere.
    pub fn repair(&mut self, location: Option<Location>) {
        for (loc, cov) in self.coverage.iter_mut() {
            if location.is_none_or(|l| l == *loc) {
                cov.ablation = 0;
            }
        }
    }
}

/// Stopping power protecting a location: the equipped piece with the most
/// current SP decides both the value and the hardness.
pub fn location_sp(combatant: &Combatant, location: Location) -> Option<(i32, Hardness)> {
    combatant
        .armor()
        .filter_map(|(_, armor)| armor.covers(location).map(|c| (c.current(), armor.hardness)))
        .max_by_key(|(sp, hardness)| (*sp, *hardness == Hardness::Hard))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AblationChange {
    pub item: ItemId,
    pub location: Location,
    pub before: i32,
    pub after: i32,
}

/// Ablates every equipped armor piece covering `location` by `amount`.
pub fn ablate_location(
    combatant: &mut Combatant,
    location: Location,
    amount: i32,
) -> Vec<AblationChange> {
    if amount <= 0 {
        return Vec::new();
    }
    combatant
        .armor_mut()
        .filter_map(|(id, armor)| {
            let cov = armor.coverage.get_mut(&location)?;
            let before = cov.ablation;
            let after = cov.ablate(amount);
            Some(AblationChange {
                item: id.clone(),
                location,
                before,
                after,
            })
        })
        .collect()
}

/// True when any equipped armor covers the location.
pub fn has_armor_at(combatant: &Combatant, location: Location) -> bool {
    combatant.armor().any(|(_, a)| a.covers(location).is_some())
}

/// Resets ablation on one armor item. Returns false for unknown items.
pub fn repair_armor(combatant: &mut Combatant, item: &ItemId, location: Option<Location>) -> bool {
    match combatant.items.get_mut(item).map(|i| &mut i.kind) {
        Some(ItemKind::Armor(armor)) => {
            armor.repair(location);
            true
        }
        _ => false,
    }
}
