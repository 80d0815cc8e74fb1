// Pose frame wire model and parsing.
// Invariants: a frame decodes even if some hands are malformed; hands are validated one by one.

use std::fmt;

use serde::Deserialize;

use crate::landmark::{Landmark, LandmarkError, LandmarkSnapshot};

#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum RawLandmark {
    Triple([f32; 3]),
    Point {
        x: f32,
        y: f32,
        #[serde(default)]
        z: f32,
    },
    Malformed(serde_json::Value),
}

/// One detected hand: a bare landmark list or a `{"landmark": [...]}` object.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum RawHand {
    List(Vec<RawLandmark>),
    Object { landmark: Vec<RawLandmark> },
    Malformed(serde_json::Value),
}

/// Landmarks of every hand detected in one camera frame.
/// Carrying both `hands` and `multi_hand_landmarks` is a decode error.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PoseFrame {
    #[serde(default)]
    pub t_ms: Option<u64>,
    #[serde(default, alias = "multi_hand_landmarks")]
    pub hands: Vec<RawHand>,
}

impl PoseFrame {
    pub fn from_snapshots(snapshots: &[LandmarkSnapshot]) -> Self {
        let hands = snapshots
            .iter()
            .map(|snapshot| {
                RawHand::List(
                    snapshot
                        .points()
                        .iter()
                        .map(|point| RawLandmark::Triple([point.x, point.y, point.z]))
                        .collect(),
                )
            })
            .collect();
        Self { t_ms: None, hands }
    }

    /// Validates each hand independently, in detection order.
    pub fn snapshots(&self) -> impl Iterator<Item = Result<LandmarkSnapshot, LandmarkError>> + '_ {
        self.hands.iter().map(snapshot_from_raw)
    }
}

fn snapshot_from_raw(hand: &RawHand) -> Result<LandmarkSnapshot, LandmarkError> {
    let landmarks = match hand {
        RawHand::List(landmarks) | RawHand::Object { landmark: landmarks } => landmarks,
        RawHand::Malformed(_) => return Err(LandmarkError::NotAHand),
    };
    let points = landmarks
        .iter()
        .enumerate()
        .map(|(index, raw)| match raw {
            RawLandmark::Triple([x, y, z]) => Ok(Landmark::new(*x, *y, *z)),
            RawLandmark::Point { x, y, z } => Ok(Landmark::new(*x, *y, *z)),
            RawLandmark::Malformed(_) => Err(LandmarkError::Malformed { index }),
        })
        .collect::<Result<Vec<_>, _>>()?;
    LandmarkSnapshot::from_points(&points)
}

#[derive(Debug)]
pub struct FrameError(serde_json::Error);

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid pose frame: {}", self.0)
    }
}

impl std::error::Error for FrameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

pub fn parse_frame(payload: &[u8]) -> Result<PoseFrame, FrameError> {
    serde_json::from_slice(payload).map_err(FrameError)
}
