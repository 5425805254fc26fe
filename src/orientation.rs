//! EXIF orientation codes and the rotate/mirror arithmetic on them.
//!
//! Every code from 1 to 8 is a combination of a clockwise rotation and a
//! horizontal mirror flag:
//!
//! | Code | Rotation | Mirrored |
//! |------|----------|----------|
//! | 1    | 0°       | no       |
//! | 2    | 0°       | yes      |
//! | 3    | 180°     | no       |
//! | 4    | 180°     | yes      |
//! | 5    | 90°      | yes      |
//! | 6    | 90°      | no       |
//! | 7    | 270°     | yes      |
//! | 8    | 270°     | no       |
//!
//! ```rust
//! use exif_edit::orientation::Orientation;
//!
//! let normal = Orientation::NORMAL;
//! assert_eq!(normal.rotated(90).unwrap().code(), 6);
//! assert_eq!(Orientation::from_code(6).unwrap().mirrored().code(), 5);
//! ```

use std::fmt;

use crate::error::{Error, Result};

/// A clockwise rotation in quarter turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rotation {
    Upright = 0,
    Quarter = 1,
    Half = 2,
    ThreeQuarters = 3,
}

impl Rotation {
    /// Reduce any number of quarter turns (negative is counter-clockwise).
    pub fn from_quarter_turns(turns: i64) -> Self {
        match turns.rem_euclid(4) {
            0 => Self::Upright,
            1 => Self::Quarter,
            2 => Self::Half,
            _ => Self::ThreeQuarters,
        }
    }

    pub fn quarter_turns(self) -> i64 {
        self as i64
    }

    /// Rotation in degrees, always in `[0, 360)`.
    pub fn degrees(self) -> u16 {
        (self as u16) * 90
    }
}

// Forward table, indexed by `code - 1`.
const TABLE: [(Rotation, bool); 8] = [
    (Rotation::Upright, false),
    (Rotation::Upright, true),
    (Rotation::Half, false),
    (Rotation::Half, true),
    (Rotation::Quarter, true),
    (Rotation::Quarter, false),
    (Rotation::ThreeQuarters, true),
    (Rotation::ThreeQuarters, false),
];

// Inverse table, indexed by `[rotation][mirrored]`.
const INVERSE: [[u8; 2]; 4] = invert(&TABLE);

const fn invert(table: &[(Rotation, bool); 8]) -> [[u8; 2]; 4] {
    let mut inverse = [[0u8; 2]; 4];
    let mut i = 0;
    while i < table.len() {
        let (rotation, mirrored) = table[i];
        inverse[rotation as usize][mirrored as usize] = (i + 1) as u8;
        i += 1;
    }
    inverse
}

/// An EXIF orientation code in `1..=8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Orientation(u8);

impl Orientation {
    /// Code 1: no rotation, not mirrored. Also what an image without the tag means.
    pub const NORMAL: Self = Self(1);

    pub fn from_code(code: u8) -> Option<Self> {
        (1..=8).contains(&code).then_some(Self(code))
    }

    /// Look up the code for a rotation/mirror combination.
    pub fn from_parts(rotation: Rotation, mirrored: bool) -> Self {
        Self(INVERSE[rotation as usize][mirrored as usize])
    }

    pub fn code(self) -> u8 {
        self.0
    }

    pub fn rotation(self) -> Rotation {
        TABLE[usize::from(self.0 - 1)].0
    }

    pub fn is_mirrored(self) -> bool {
        TABLE[usize::from(self.0 - 1)].1
    }

    /// Rotate by a signed number of degrees (positive is clockwise), keeping
    /// the mirror flag. `degrees` must be a multiple of 90.
    pub fn rotated(self, degrees: i64) -> Result<Self> {
        check_right_angle(degrees)?;
        let turns = self.rotation().quarter_turns() + degrees / 90;
        Ok(Self::from_parts(
            Rotation::from_quarter_turns(turns),
            self.is_mirrored(),
        ))
    }

    /// Flip the mirror flag, keeping the rotation.
    pub fn mirrored(self) -> Self {
        Self::from_parts(self.rotation(), !self.is_mirrored())
    }
}

/// Fail unless `degrees` is a multiple of 90.
pub fn check_right_angle(degrees: i64) -> Result<()> {
    if degrees % 90 != 0 {
        return Err(Error::InvalidArgument(format!(
            "Rotations must be multiples of 90 degrees, got {degrees}"
        )));
    }
    Ok(())
}

impl Default for Orientation {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
