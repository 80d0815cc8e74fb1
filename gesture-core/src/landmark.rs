// Hand landmark model: 21 indexed 3D points per detected hand.
// Invariants: a LandmarkSnapshot always holds exactly 21 finite points in the fixed index order.

use std::fmt;

pub const LANDMARK_COUNT: usize = 21;

pub const WRIST: usize = 0;
pub const THUMB_CMC: usize = 1;
pub const THUMB_MCP: usize = 2;
pub const THUMB_IP: usize = 3;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_PIP: usize = 6;
pub const INDEX_DIP: usize = 7;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_PIP: usize = 14;
pub const RING_DIP: usize = 15;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_PIP: usize = 18;
pub const PINKY_DIP: usize = 19;
pub const PINKY_TIP: usize = 20;

/// One landmark. `x`/`y` are normalized to the image frame (y grows downwards),
/// `z` is depth relative to the wrist, more negative meaning closer to the camera.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn of(self, landmark: &Landmark) -> f32 {
        match self {
            Axis::X => landmark.x,
            Axis::Y => landmark.y,
            Axis::Z => landmark.z,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum LandmarkError {
    Count { found: usize },
    NonFinite { index: usize },
    Malformed { index: usize },
    NotAHand,
}

impl fmt::Display for LandmarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LandmarkError::Count { found } => {
                write!(f, "expected {LANDMARK_COUNT} landmarks, found {found}")
            }
            LandmarkError::NonFinite { index } => {
                write!(f, "landmark {index} has a non-finite coordinate")
            }
            LandmarkError::Malformed { index } => write!(f, "landmark {index} is malformed"),
            LandmarkError::NotAHand => f.write_str("hand is not a list of landmarks"),
        }
    }
}

impl std::error::Error for LandmarkError {}

/// The landmarks of one hand in one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct LandmarkSnapshot {
    points: [Landmark; LANDMARK_COUNT],
}

impl LandmarkSnapshot {
    pub fn new(points: [Landmark; LANDMARK_COUNT]) -> Result<Self, LandmarkError> {
        if let Some(index) = points.iter().position(|point| !point.is_finite()) {
            return Err(LandmarkError::NonFinite { index });
        }
        Ok(Self { points })
    }

    pub fn from_points(points: &[Landmark]) -> Result<Self, LandmarkError> {
        let found = points.len();
        let points: [Landmark; LANDMARK_COUNT] = points
            .try_into()
            .map_err(|_| LandmarkError::Count { found })?;
        Self::new(points)
    }

    #[cfg(test)]
    pub(crate) fn unchecked(points: [Landmark; LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    pub fn get(&self, index: usize) -> &Landmark {
        &self.points[index]
    }

    pub fn coord(&self, axis: Axis, index: usize) -> f32 {
        axis.of(&self.points[index])
    }

    pub fn points(&self) -> &[Landmark; LANDMARK_COUNT] {
        &self.points
    }
}
