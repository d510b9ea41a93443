use std::fmt;

use serde::{Deserialize, Serialize};

use crate::conditions::ConditionId;

/// Hit locations on a humanoid body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    Head,
    Torso,
    LeftArm,
    RightArm,
    LeftLeg,
    RightLeg,
}

impl Location {
    pub const ALL: [Location; 6] = [
        Location::Head,
        Location::Torso,
        Location::LeftArm,
        Location::RightArm,
        Location::LeftLeg,
        Location::RightLeg,
    ];

    pub fn is_limb(self) -> bool {
        !matches!(self, Location::Head | Location::Torso)
    }

    /// The condition applied when this limb is severed or destroyed.
    pub fn lost_limb_condition(self) -> Option<ConditionId> {
        match self {
            Location::LeftArm => Some(ConditionId::LostLeftArm),
            Location::RightArm => Some(ConditionId::LostRightArm),
            Location::LeftLeg => Some(ConditionId::LostLeftLeg),
            Location::RightLeg => Some(ConditionId::LostRightLeg),
            Location::Head | Location::Torso => None,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Location::Head => "head",
            Location::Torso => "torso",
            Location::LeftArm => "left arm",
            Location::RightArm => "right arm",
            Location::LeftLeg => "left leg",
            Location::RightLeg => "right leg",
        };
        f.write_str(s)
    }
}
