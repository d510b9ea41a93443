//! Stopping-power and post-armor damage scaling.
//!
//! Every intermediate value is a non-negative integer; divisions floor and
//! multiplications saturate at `i32::MAX`.

use serde::{Deserialize, Serialize};

use crate::location::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeleeDamageType {
    #[default]
    None,
    Blunt,
    Edged,
    Spike,
    Monoblade,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmmoType {
    #[default]
    Standard,
    ArmorPiercing,
    HollowPoint,
    RubberSlug,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hardness {
    #[default]
    Soft,
    Hard,
}

/// What the attack brings against the armor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Penetration {
    #[serde(default)]
    pub melee: MeleeDamageType,
    #[serde(default)]
    pub ammo: AmmoType,
}

/// Outcome of a single hit against one location's armor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HitResolution {
    pub effective_sp: i32,
    /// Damage after armor, type scaling and head doubling.
    pub damage: i32,
    /// True when the raw damage got through the armor at all.
    pub penetrated: bool,
}

/// SP after melee-type and ammo scaling.
pub fn effective_sp(base_sp: i32, pen: Penetration, hardness: Hardness) -> i32 {
    let mut sp = base_sp.max(0);

    sp = match (pen.melee, hardness) {
        (MeleeDamageType::Edged, Hardness::Soft) => sp / 2,
        (MeleeDamageType::Edged, Hardness::Hard) => sp,
        (MeleeDamageType::Spike, _) => sp / 2,
        (MeleeDamageType::Monoblade, Hardness::Soft) => sp / 3,
        // SP / 1.5
        (MeleeDamageType::Monoblade, Hardness::Hard) => sp.saturating_mul(2) / 3,
        (MeleeDamageType::None | MeleeDamageType::Blunt, _) => sp,
    };

    sp = match pen.ammo {
        AmmoType::ArmorPiercing => sp / 2,
        AmmoType::HollowPoint => sp.saturating_mul(2),
        AmmoType::Standard | AmmoType::RubberSlug => sp,
    };

    sp.max(0)
}

/// Resolves one hit. `base_sp` is the location's current (ablated) SP.
pub fn resolve_hit(
    raw_damage: i32,
    base_sp: i32,
    hardness: Hardness,
    pen: Penetration,
    location: Location,
) -> HitResolution {
    let raw = raw_damage.max(0);
    let base = base_sp.max(0);

    if pen.ammo == AmmoType::RubberSlug {
        // Rubber never gets past hard armor and never does more than 1.
        let damage = match hardness {
            Hardness::Hard => 0,
            _ if raw > base => 1,
            _ => 0,
        };
        return HitResolution {
            effective_sp: base,
            damage,
            penetrated: damage > 0,
        };
    }

    let sp = effective_sp(base, pen, hardness);
    let through = raw.saturating_sub(sp).max(0);

    let mut damage = through;
    damage = match pen.ammo {
        AmmoType::ArmorPiercing => damage / 2,
        AmmoType::HollowPoint => damage.saturating_mul(3) / 2,
        AmmoType::Standard | AmmoType::RubberSlug => damage,
    };
    if pen.melee == MeleeDamageType::Spike {
        damage /= 2;
    }
    if location == Location::Head {
        damage = damage.saturating_mul(2);
    }

    HitResolution {
        effective_sp: sp,
        damage,
        penetrated: through > 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pen(melee: MeleeDamageType, ammo: AmmoType) -> Penetration {
        Penetration { melee, ammo }
    }

    #[test]
    fn monoblade_scaling() {
        let p = pen(MeleeDamageType::Monoblade, AmmoType::Standard);
        assert_eq!(effective_sp(20, p, Hardness::Soft), 6);
        assert_eq!(effective_sp(20, p, Hardness::Hard), 13);
    }

    #[test]
    fn edged_ignores_hard_armor_halving() {
        let p = pen(MeleeDamageType::Edged, AmmoType::Standard);
        assert_eq!(effective_sp(14, p, Hardness::Soft), 7);
        assert_eq!(effective_sp(14, p, Hardness::Hard), 14);
    }

    #[test]
    fn hollow_point_doubles_sp_then_amplifies_damage() {
        let p = pen(MeleeDamageType::None, AmmoType::HollowPoint);
        let r = resolve_hit(20, 5, Hardness::Soft, p, Location::Torso);
        assert_eq!(r.effective_sp, 10);
        assert_eq!(r.damage, 15);
    }

    #[test]
    fn armor_piercing_halves_twice() {
        let p = pen(MeleeDamageType::None, AmmoType::ArmorPiercing);
        let r = resolve_hit(21, 10, Hardness::Hard, p, Location::Torso);
        assert_eq!(r.effective_sp, 5);
        assert_eq!(r.damage, 8);
    }

    #[test]
    fn spike_is_penalized_on_both_sides() {
        let p = pen(MeleeDamageType::Spike, AmmoType::Standard);
        let r = resolve_hit(12, 8, Hardness::Hard, p, Location::Torso);
        assert_eq!(r.effective_sp, 4);
        assert_eq!(r.damage, 4);
    }

    #[test]
    fn huge_hits_saturate_instead_of_wrapping() {
        let hp = pen(MeleeDamageType::None, AmmoType::HollowPoint);
        let r = resolve_hit(1_000_000_000, 0, Hardness::Soft, hp, Location::Torso);
        assert_eq!(r.damage, i32::MAX / 2);
        assert_eq!(effective_sp(i32::MAX, hp, Hardness::Hard), i32::MAX);

        let r = resolve_hit(1_500_000_000, 0, Hardness::Soft, Penetration::default(), Location::Head);
        assert_eq!(r.damage, i32::MAX);
    }

    #[test]
    fn absorbed_hit_does_not_penetrate() {
        let r = resolve_hit(4, 10, Hardness::Soft, Penetration::default(), Location::Head);
        assert_eq!(r.damage, 0);
        assert!(!r.penetrated);
    }
}
