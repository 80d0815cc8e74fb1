// Shared hand landmark model, gesture classification and code table.

pub mod classifier;
pub mod codes;
pub mod frame;
pub mod gesture;
pub mod landmark;

pub use classifier::{classify, matching_rules, Rule, RULES};
pub use codes::{code_for, CodeTable, CodeTableError};
pub use frame::{parse_frame, FrameError, PoseFrame};
pub use gesture::GestureLabel;
pub use landmark::{Landmark, LandmarkError, LandmarkSnapshot};
