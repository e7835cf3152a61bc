//! Quarter-turn page rotation
//!
//! Rotation is kept as an integer enum so repeated rotations cannot drift.

use serde::{Deserialize, Serialize};

use crate::error::PdfKitError;

/// Absolute page rotation, clockwise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

/// Relative rotation applied on top of a page's current rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum RotationDelta {
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    fn quarter_turns(self) -> i64 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 1,
            Rotation::Deg180 => 2,
            Rotation::Deg270 => 3,
        }
    }

    fn from_quarter_turns(turns: i64) -> Self {
        match turns.rem_euclid(4) {
            0 => Rotation::Deg0,
            1 => Rotation::Deg90,
            2 => Rotation::Deg180,
            _ => Rotation::Deg270,
        }
    }

    /// Normalize an arbitrary `/Rotate` value: modulo 360 (negative values
    /// wrap), then to the nearest quarter turn
    pub fn normalize(degrees: i64) -> Self {
        let wrapped = degrees.rem_euclid(360);
        Self::from_quarter_turns((wrapped + 45) / 90)
    }

    pub fn degrees(self) -> i64 {
        self.quarter_turns() * 90
    }

    pub fn rotate(self, delta: RotationDelta) -> Self {
        Self::from_quarter_turns(self.quarter_turns() + delta.quarter_turns())
    }

    /// Whether the page's width and height swap on screen
    pub fn is_sideways(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }
}

impl RotationDelta {
    fn quarter_turns(self) -> i64 {
        match self {
            RotationDelta::Deg90 => 1,
            RotationDelta::Deg180 => 2,
            RotationDelta::Deg270 => 3,
        }
    }

    pub fn degrees(self) -> i64 {
        self.quarter_turns() * 90
    }
}

impl TryFrom<i64> for Rotation {
    type Error = PdfKitError;

    fn try_from(degrees: i64) -> Result<Self, Self::Error> {
        match degrees {
            0 => Ok(Rotation::Deg0),
            90 => Ok(Rotation::Deg90),
            180 => Ok(Rotation::Deg180),
            270 => Ok(Rotation::Deg270),
            other => Err(PdfKitError::InvalidParameter(format!(
                "Rotation must be 0, 90, 180 or 270, got {}",
                other
            ))),
        }
    }
}

impl TryFrom<i64> for RotationDelta {
    type Error = PdfKitError;

    fn try_from(degrees: i64) -> Result<Self, Self::Error> {
        match degrees {
            90 => Ok(RotationDelta::Deg90),
            180 => Ok(RotationDelta::Deg180),
            270 => Ok(RotationDelta::Deg270),
            other => Err(PdfKitError::InvalidParameter(format!(
                "Rotation delta must be 90, 180 or 270, got {}",
                other
            ))),
        }
    }
}

impl From<Rotation> for i64 {
    fn from(rotation: Rotation) -> Self {
        rotation.degrees()
    }
}

impl From<RotationDelta> for i64 {
    fn from(delta: RotationDelta) -> Self {
        delta.degrees()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_wraps_and_rounds() {
        assert_eq!(Rotation::normalize(0), Rotation::Deg0);
        assert_eq!(Rotation::normalize(450), Rotation::Deg90);
        assert_eq!(Rotation::normalize(-90), Rotation::Deg270);
        assert_eq!(Rotation::normalize(-360), Rotation::Deg0);
        assert_eq!(Rotation::normalize(100), Rotation::Deg90);
        assert_eq!(Rotation::normalize(350), Rotation::Deg0);
    }

    #[test]
    fn test_rotate_is_cumulative() {
        assert_eq!(Rotation::Deg90.rotate(RotationDelta::Deg90), Rotation::Deg180);
        assert_eq!(Rotation::Deg270.rotate(RotationDelta::Deg180), Rotation::Deg90);
        assert_eq!(Rotation::Deg180.rotate(RotationDelta::Deg180), Rotation::Deg0);
    }

    #[test]
    fn test_delta_rejects_other_angles() {
        assert!(RotationDelta::try_from(0).is_err());
        assert!(RotationDelta::try_from(45).is_err());
        assert_eq!(RotationDelta::try_from(270).unwrap(), RotationDelta::Deg270);
    }

    #[test]
    fn test_serde_uses_degrees() {
        let json = serde_json::to_string(&RotationDelta::Deg180).unwrap();
        assert_eq!(json, "180");
        let delta: RotationDelta = serde_json::from_str("90").unwrap();
        assert_eq!(delta, RotationDelta::Deg90);
        assert!(serde_json::from_str::<RotationDelta>("30").is_err());
    }
}
