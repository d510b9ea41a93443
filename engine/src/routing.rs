//! Sends post-armor damage either to the wound pool or to a cyberlimb.

use serde::{Deserialize, Serialize};

use crate::actor::{Combatant, ItemId, ItemKind};
use crate::location::Location;

/// Structure pool of a cyberlimb.
/// Invariant: 0 <= structure <= structure_max.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cyberlimb {
    pub location: Location,
    pub structure: i32,
    pub structure_max: i32,
    /// The limb stops working at or below this structure.
    #[serde(default)]
    pub disables_at: i32,
}

impl Cyberlimb {
    pub fn new(location: Location, structure_max: i32) -> Self {
        Self {
            location,
            structure: structure_max,
            structure_max,
            disables_at: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.structure > 0
    }

    pub fn is_disabled(&self) -> bool {
        self.structure <= self.disables_at
    }

    /// Returns true when the limb is destroyed.
    pub fn take_damage(&mut self, amount: i32) -> bool {
        self.structure = self.structure.saturating_sub(amount.max(0)).clamp(0, self.structure_max);
        self.structure <= 0
    }
}

/// What backs a location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LimbSlot {
    Flesh,
    Cyber(ItemId),
    /// A slot points at an item that is gone or is not a cyberlimb.
    Missing(ItemId),
}

pub fn limb_slot(combatant: &Combatant, location: Location) -> LimbSlot {
    let Some(id) = combatant.cyberlimbs.get(&location) else {
        return LimbSlot::Flesh;
    };
    match combatant.items.get(id).map(|i| &i.kind) {
        Some(ItemKind::Cyberlimb(limb)) if limb.is_active() => LimbSlot::Cyber(id.clone()),
        Some(ItemKind::Cyberlimb(_)) => LimbSlot::Flesh,
        _ => LimbSlot::Missing(id.clone()),
    }
}

pub fn cyberlimb_mut<'a>(combatant: &'a mut Combatant, id: &ItemId) -> Option<&'a mut Cyberlimb> {
    match combatant.items.get_mut(id).map(|i| &mut i.kind) {
        Some(ItemKind::Cyberlimb(limb)) => Some(limb),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Routed {
    pub wound: i32,
    pub cyberlimb: i32,
}

/// Wound points for flesh: body modifier comes off, but anything that got
/// through armor does at least 1.
pub fn wound_damage(damage: i32, body_modifier: i32) -> i32 {
    if damage <= 0 {
        return 0;
    }
    damage.saturating_sub(body_modifier.max(0)).max(1)
}

pub fn route(damage: i32, slot: &LimbSlot, body_modifier: i32) -> Routed {
    match slot {
        LimbSlot::Cyber(_) | LimbSlot::Missing(_) => Routed {
            wound: 0,
            cyberlimb: damage.max(0),
        },
        LimbSlot::Flesh => Routed {
            wound: wound_damage(damage, body_modifier),
            cyberlimb: 0,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flesh_takes_at_least_one() {
        assert_eq!(wound_damage(10 - 3, 2), 5);
        assert_eq!(wound_damage(1, 4), 1);
        assert_eq!(wound_damage(0, 0), 0);
    }

    #[test]
    fn cyberlimb_ignores_body_modifier() {
        let slot = LimbSlot::Cyber(ItemId::from("arm"));
        assert_eq!(route(6, &slot, 3), Routed { wound: 0, cyberlimb: 6 });
        assert_eq!(route(0, &slot, 3), Routed { wound: 0, cyberlimb: 0 });
    }

    #[test]
    fn limb_destruction_and_disable() {
        let mut limb = Cyberlimb {
            disables_at: 5,
            ..Cyberlimb::new(Location::RightLeg, 20)
        };
        assert!(!limb.take_damage(15));
        assert!(limb.is_disabled());
        assert!(limb.take_damage(9));
        assert_eq!(limb.structure, 0);
    }
}
