use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::DamageDice;
use crate::error::Result;

/// Numeric knobs of the damage and condition rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct RulesConfig {
    /// Upper bound of the wound accumulator.
    pub max_damage: u8,
    /// Damage points per wound state.
    pub wound_bucket: u8,
    /// First wound state that counts as mortal.
    pub mortal_state: u8,
    /// Wound damage to a single limb in one attack that severs it.
    pub lost_limb_threshold: i32,
    /// Walk allowance in meters per point of MA.
    pub walk_meters_per_ma: f32,
    /// Burning damage indexed by remaining turns (1, 2, 3).
    pub burning_dice: Vec<DamageDice>,
    pub acid_dice: DamageDice,
    pub save_die: DamageDice,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            max_damage: 40,
            wound_bucket: 4,
            mortal_state: 4,
            lost_limb_threshold: 8,
            walk_meters_per_ma: 2.0,
            burning_dice: vec![
                DamageDice::D6,
                DamageDice::D10,
                DamageDice::new(2, 10),
            ],
            acid_dice: DamageDice::D6,
            save_die: DamageDice::D10,
        }
    }
}

impl RulesConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Loads a config file, picking the format from the extension.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read rules config: {}", path.display()))?;
        let cfg = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&text),
            _ => Self::from_yaml_str(&text),
        }
        .with_context(|| format!("failed to parse rules config: {}", path.display()))?;
        Ok(cfg)
    }

    /// Burning dice for the given remaining-turn count. Counts above the
    /// table use its last entry.
    pub fn burning_dice_for(&self, remaining: u8) -> Option<DamageDice> {
        if remaining == 0 {
            return None;
        }
        let idx = (remaining as usize - 1).min(self.burning_dice.len().checked_sub(1)?);
        self.burning_dice.get(idx).copied()
    }

    /// Wound state 0..=10 for an accumulator value.
    pub fn wound_state(&self, damage: u8) -> u8 {
        let bucket = self.wound_bucket.max(1);
        damage.min(self.max_damage).div_ceil(bucket)
    }

    pub fn is_mortal(&self, wound_state: u8) -> bool {
        wound_state >= self.mortal_state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wound_state_buckets_of_four() {
        let cfg = RulesConfig::default();
        assert_eq!(cfg.wound_state(0), 0);
        assert_eq!(cfg.wound_state(1), 1);
        assert_eq!(cfg.wound_state(4), 1);
        assert_eq!(cfg.wound_state(5), 2);
        assert_eq!(cfg.wound_state(13), 4);
        assert_eq!(cfg.wound_state(40), 10);
    }

    #[test]
    fn burning_table_lookup() {
        let cfg = RulesConfig::default();
        assert_eq!(cfg.burning_dice_for(0), None);
        assert_eq!(cfg.burning_dice_for(1), Some(DamageDice::D6));
        assert_eq!(cfg.burning_dice_for(2), Some(DamageDice::D10));
        assert_eq!(cfg.burning_dice_for(3), Some(DamageDice::new(2, 10)));
        assert_eq!(cfg.burning_dice_for(7), Some(DamageDice::new(2, 10)));
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let cfg = RulesConfig::from_yaml_str("lost_limb_threshold: 9\nacid_dice: 2d6\n").unwrap();
        assert_eq!(cfg.lost_limb_threshold, 9);
        assert_eq!(cfg.acid_dice, DamageDice::new(2, 6));
        assert_eq!(cfg.max_damage, 40);
    }
}
