use std::fmt;
use std::str::FromStr;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

pub mod actor;
pub mod api;
pub mod armor;
pub mod checks;
pub mod combat;
pub mod conditions;
pub mod config;
pub mod content;
pub mod damage;
pub mod encounter;
pub mod error;
pub mod life;
pub mod location;
pub mod logging;
pub mod penetration;
pub mod routing;
pub mod turns;

pub use actor::{Combatant, CombatantId, Item, ItemId, ItemKind, Position, Stat, Stats};
pub use config::RulesConfig;
pub use encounter::{Encounter, TurnChange};
pub use error::{EngineError, Result};
pub use location::Location;

/// A dice formula of the form `XdY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DamageDice {
    pub count: u8,
    pub sides: u8,
}

impl DamageDice {
    pub const D6: DamageDice = DamageDice::new(1, 6);
    pub const D10: DamageDice = DamageDice::new(1, 10);

    pub const fn new(count: u8, sides: u8) -> Self {
        Self { count, sides }
    }

    pub fn min(self) -> i32 {
        self.count as i32
    }

    pub fn max(self) -> i32 {
        self.count as i32 * self.sides as i32
    }
}

impl fmt::Display for DamageDice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.sides)
    }
}

impl FromStr for DamageDice {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.trim().to_lowercase();
        let invalid = || EngineError::InvalidDice(s.to_string());
        let (count, sides) = lowered.split_once('d').ok_or_else(invalid)?;
        let count: u8 = if count.is_empty() {
            1
        } else {
            count.parse().map_err(|_| invalid())?
        };
        let sides: u8 = sides.parse().map_err(|_| invalid())?;
        if count == 0 || sides < 2 {
            return Err(invalid());
        }
        Ok(Self { count, sides })
    }
}

impl TryFrom<String> for DamageDice {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<DamageDice> for String {
    fn from(value: DamageDice) -> Self {
        value.to_string()
    }
}

/// Dice evaluation service. The rules only ever see totals.
pub trait Roller {
    fn roll(&mut self, dice: DamageDice) -> i32;
}

impl<F> Roller for F
where
    F: FnMut(DamageDice) -> i32,
{
    fn roll(&mut self, dice: DamageDice) -> i32 {
        self(dice)
    }
}

/// Seeded roller; the same seed always produces the same sequence.
pub struct Dice {
    rng: ChaCha8Rng,
}

impl Dice {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl Roller for Dice {
    fn roll(&mut self, dice: DamageDice) -> i32 {
        (0..dice.count)
            .map(|_| self.rng.gen_range(1..=dice.sides as i32))
            .sum()
    }
}
