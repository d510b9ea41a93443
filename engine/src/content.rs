use std::collections::HashMap;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::conditions::ExoticEffect;
use crate::damage::AttackData;
use crate::encounter::Encounter;
use crate::penetration::{AmmoType, MeleeDamageType};

pub fn builtin_weapons() -> HashMap<&'static str, &'static str> {
    HashMap::from([(
        "exotic",
        include_str!("../content/weapons/exotic.json"),
    )])
}

pub fn builtin_encounters() -> HashMap<&'static str, &'static str> {
    HashMap::from([(
        "alley",
        include_str!("../content/encounters/alley.json"),
    )])
}

/// Weapon-level attack properties: what the ammo or blade does to armor
/// and any status effect it carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponPreset {
    pub name: String,
    #[serde(default)]
    pub ammo_type: AmmoType,
    #[serde(default)]
    pub melee_damage_type: MeleeDamageType,
    #[serde(default)]
    pub exotic_effect: Option<ExoticEffect>,
}

impl WeaponPreset {
    pub fn apply_to(&self, attack: &mut AttackData) {
        attack.ammo_type = self.ammo_type;
        attack.melee_damage_type = self.melee_damage_type;
        attack.exotic_effect = self.exotic_effect.clone();
    }
}

pub fn load_builtin_weapons(id: &str) -> Result<Vec<WeaponPreset>> {
    let text = builtin_weapons()
        .get(id)
        .copied()
        .with_context(|| format!("no built-in weapon list '{}'", id))?;
    serde_json::from_str(text).with_context(|| format!("failed to parse weapon list '{}'", id))
}

/// Looks a preset up by name across every built-in list.
pub fn find_weapon(name: &str) -> Result<WeaponPreset> {
    for id in builtin_weapons().keys() {
        if let Some(w) = load_builtin_weapons(id)?
            .into_iter()
            .find(|w| w.name.eq_ignore_ascii_case(name))
        {
            return Ok(w);
        }
    }
    anyhow::bail!("weapon '{}' not found", name)
}

pub fn load_builtin_encounter(id: &str) -> Result<Encounter> {
    let text = builtin_encounters()
        .get(id)
        .copied()
        .with_context(|| format!("no built-in encounter '{}'", id))?;
    serde_json::from_str(text).with_context(|| format!("failed to parse encounter '{}'", id))
}
