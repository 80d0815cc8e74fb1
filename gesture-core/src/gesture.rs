// Closed set of gesture labels produced by the classifier.

use serde::Serialize;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GestureLabel {
    ThumbsUp,
    ThumbsDown,
    KeepInTouch,
    Unity,
    FingerGunOrOffensive,
    Victory,
    ItsOkay,
    WeStandTogether,
    Palm,
    Unrecognized,
}

impl GestureLabel {
    pub fn as_str(&self) -> &'static str {
        (*self).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn names_round_trip_through_from_str() {
        for label in GestureLabel::iter() {
            assert_eq!(label.as_str().parse::<GestureLabel>(), Ok(label));
        }
        assert_eq!(GestureLabel::FingerGunOrOffensive.as_str(), "finger_gun_or_offensive");
        assert_eq!(GestureLabel::ItsOkay.to_string(), "its_okay");
        assert!("thumbs-up".parse::<GestureLabel>().is_err());
    }

    #[test]
    fn serializes_as_snake_case() {
        let json = serde_json::to_string(&GestureLabel::WeStandTogether).unwrap();
        assert_eq!(json, "\"we_stand_together\"");
    }
}
