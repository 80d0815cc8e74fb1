// Gesture classifier: an ordered decision table over landmark comparisons.
// Invariants: first matching rule wins; every comparison is strict with no tolerance,
// so a coordinate tie never satisfies a comparison.
//
// Known-imprecise rules kept as deployed:
// - victory has no bound on finger spread or angle and produces false positives.
// - the mirrored thumbs_down variant checks `ring_tip.x > wrist.x` twice and never
//   checks the pinky tip against the wrist.

use crate::gesture::GestureLabel;
use crate::landmark::Axis::{X, Y, Z};
use crate::landmark::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    Less,
    Greater,
}

/// `left.axis <op> right.axis`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Comparison {
    pub axis: Axis,
    pub left: usize,
    pub op: Op,
    pub right: usize,
}

impl Comparison {
    pub fn holds(&self, hand: &LandmarkSnapshot) -> bool {
        let left = hand.coord(self.axis, self.left);
        let right = hand.coord(self.axis, self.right);
        match self.op {
            Op::Less => left < right,
            Op::Greater => left > right,
        }
    }
}

const fn lt(axis: Axis, left: usize, right: usize) -> Comparison {
    Comparison {
        axis,
        left,
        op: Op::Less,
        right,
    }
}

const fn gt(axis: Axis, left: usize, right: usize) -> Comparison {
    Comparison {
        axis,
        left,
        op: Op::Greater,
        right,
    }
}

#[derive(Debug)]
pub struct Rule {
    pub name: &'static str,
    pub label: GestureLabel,
    pub comparisons: &'static [Comparison],
}

impl Rule {
    pub fn matches(&self, hand: &LandmarkSnapshot) -> bool {
        self.comparisons.iter().all(|cmp| cmp.holds(hand))
    }
}

pub static RULES: &[Rule] = &[
    Rule {
        name: "thumbs_up",
        label: GestureLabel::ThumbsUp,
        comparisons: &[
            lt(Y, THUMB_TIP, THUMB_IP),
            lt(Y, INDEX_MCP, MIDDLE_MCP),
            gt(X, INDEX_TIP, INDEX_DIP),
            gt(X, MIDDLE_TIP, MIDDLE_DIP),
            gt(X, RING_TIP, RING_DIP),
            gt(X, PINKY_TIP, PINKY_DIP),
            lt(X, INDEX_TIP, WRIST),
            lt(X, MIDDLE_TIP, WRIST),
            lt(X, RING_TIP, WRIST),
            lt(X, PINKY_TIP, WRIST),
        ],
    },
    Rule {
        name: "thumbs_up_mirrored",
        label: GestureLabel::ThumbsUp,
        comparisons: &[
            lt(Y, THUMB_TIP, THUMB_IP),
            lt(Y, INDEX_MCP, MIDDLE_MCP),
            lt(X, INDEX_TIP, INDEX_DIP),
            lt(X, MIDDLE_TIP, MIDDLE_DIP),
            lt(X, RING_TIP, RING_DIP),
            lt(X, PINKY_TIP, PINKY_DIP),
            gt(X, INDEX_TIP, WRIST),
            gt(X, MIDDLE_TIP, WRIST),
            gt(X, RING_TIP, WRIST),
            gt(X, PINKY_TIP, WRIST),
        ],
    },
    Rule {
        name: "thumbs_down",
        label: GestureLabel::ThumbsDown,
        comparisons: &[
            gt(Y, THUMB_TIP, THUMB_IP),
            gt(X, INDEX_TIP, INDEX_PIP),
            gt(X, MIDDLE_TIP, MIDDLE_PIP),
            gt(X, RING_TIP, RING_PIP),
            gt(X, PINKY_TIP, PINKY_PIP),
            lt(X, INDEX_TIP, WRIST),
            lt(X, MIDDLE_TIP, WRIST),
            lt(X, RING_TIP, WRIST),
            lt(X, PINKY_TIP, WRIST),
            gt(Y, INDEX_MCP, MIDDLE_MCP),
        ],
    },
    Rule {
        name: "thumbs_down_mirrored",
        label: GestureLabel::ThumbsDown,
        comparisons: &[
            gt(Y, THUMB_TIP, THUMB_IP),
            lt(X, INDEX_TIP, INDEX_PIP),
            lt(X, MIDDLE_TIP, MIDDLE_PIP),
            lt(X, RING_TIP, RING_PIP),
            lt(X, PINKY_TIP, PINKY_PIP),
            gt(X, INDEX_TIP, WRIST),
            gt(X, MIDDLE_TIP, WRIST),
            gt(X, RING_TIP, WRIST),
            gt(X, RING_TIP, WRIST),
            gt(Y, INDEX_MCP, MIDDLE_MCP),
        ],
    },
    Rule {
        name: "keep_in_touch",
        label: GestureLabel::KeepInTouch,
        comparisons: &[
            lt(Y, THUMB_TIP, THUMB_CMC),
            gt(X, INDEX_TIP, INDEX_DIP),
            gt(X, MIDDLE_TIP, MIDDLE_DIP),
            gt(X, RING_TIP, RING_DIP),
            lt(X, PINKY_TIP, PINKY_PIP),
            gt(X, WRIST, PINKY_MCP),
            lt(Z, INDEX_MCP, INDEX_DIP),
        ],
    },
    Rule {
        name: "keep_in_touch_mirrored",
        label: GestureLabel::KeepInTouch,
        comparisons: &[
            lt(Y, THUMB_TIP, THUMB_CMC),
            lt(X, INDEX_TIP, INDEX_DIP),
            lt(X, MIDDLE_TIP, MIDDLE_DIP),
            lt(X, RING_TIP, RING_DIP),
            gt(X, PINKY_TIP, PINKY_PIP),
            lt(X, WRIST, PINKY_MCP),
            lt(Z, INDEX_MCP, INDEX_DIP),
        ],
    },
    Rule {
        name: "unity",
        label: GestureLabel::Unity,
        comparisons: &[
            lt(Y, INDEX_TIP, INDEX_PIP),
            lt(Y, PINKY_TIP, PINKY_PIP),
            gt(Y, MIDDLE_TIP, MIDDLE_PIP),
            gt(Y, RING_TIP, RING_PIP),
            gt(Y, WRIST, THUMB_CMC),
        ],
    },
    Rule {
        name: "finger_gun_or_offensive",
        label: GestureLabel::FingerGunOrOffensive,
        comparisons: &[
            lt(Y, MIDDLE_TIP, MIDDLE_PIP),
            gt(Y, INDEX_TIP, INDEX_PIP),
            gt(Y, RING_TIP, RING_PIP),
            gt(Y, PINKY_TIP, PINKY_PIP),
        ],
    },
    Rule {
        name: "victory",
        label: GestureLabel::Victory,
        comparisons: &[
            lt(Y, INDEX_TIP, INDEX_MCP),
            lt(Y, MIDDLE_TIP, MIDDLE_MCP),
            gt(Y, RING_TIP, RING_PIP),
            gt(Y, PINKY_TIP, PINKY_PIP),
        ],
    },
    Rule {
        name: "its_okay",
        label: GestureLabel::ItsOkay,
        comparisons: &[
            gt(X, PINKY_TIP, RING_TIP),
            gt(X, RING_TIP, MIDDLE_TIP),
            gt(Y, INDEX_TIP, INDEX_PIP),
            gt(Y, WRIST, THUMB_CMC),
            lt(Y, MIDDLE_TIP, MIDDLE_DIP),
            lt(Y, RING_TIP, RING_DIP),
            lt(Y, PINKY_TIP, PINKY_DIP),
        ],
    },
    Rule {
        name: "its_okay_mirrored",
        label: GestureLabel::ItsOkay,
        comparisons: &[
            lt(X, PINKY_TIP, RING_TIP),
            lt(X, RING_TIP, MIDDLE_TIP),
            gt(Y, INDEX_TIP, INDEX_PIP),
            gt(Y, WRIST, THUMB_CMC),
            lt(Y, MIDDLE_TIP, MIDDLE_DIP),
            lt(Y, RING_TIP, RING_DIP),
            lt(Y, PINKY_TIP, PINKY_DIP),
        ],
    },
    Rule {
        name: "we_stand_together",
        label: GestureLabel::WeStandTogether,
        comparisons: &[
            lt(Y, INDEX_MCP, INDEX_DIP),
            lt(Y, MIDDLE_MCP, MIDDLE_DIP),
            lt(Y, RING_MCP, RING_DIP),
            lt(Y, PINKY_MCP, PINKY_DIP),
            lt(Y, INDEX_DIP, WRIST),
            lt(Y, MIDDLE_DIP, WRIST),
            lt(Y, RING_DIP, WRIST),
            lt(Y, PINKY_DIP, WRIST),
            gt(X, THUMB_TIP, INDEX_PIP),
            lt(Z, THUMB_TIP, INDEX_MCP),
        ],
    },
    Rule {
        name: "we_stand_together_mirrored",
        label: GestureLabel::WeStandTogether,
        comparisons: &[
            lt(Y, INDEX_MCP, INDEX_DIP),
            lt(Y, MIDDLE_MCP, MIDDLE_DIP),
            lt(Y, RING_MCP, RING_DIP),
            lt(Y, PINKY_MCP, PINKY_DIP),
            lt(Y, INDEX_DIP, WRIST),
            lt(Y, MIDDLE_DIP, WRIST),
            lt(Y, RING_DIP, WRIST),
            lt(Y, PINKY_DIP, WRIST),
            lt(X, THUMB_TIP, INDEX_PIP),
            lt(Z, THUMB_TIP, INDEX_MCP),
        ],
    },
    Rule {
        name: "palm",
        label: GestureLabel::Palm,
        comparisons: &[
            lt(Y, THUMB_TIP, THUMB_IP),
            lt(Y, MIDDLE_TIP, MIDDLE_DIP),
            lt(Y, RING_TIP, RING_DIP),
            lt(Y, PINKY_TIP, PINKY_DIP),
        ],
    },
];

pub fn classify(hand: &LandmarkSnapshot) -> GestureLabel {
    RULES
        .iter()
        .find(|rule| rule.matches(hand))
        .map(|rule| rule.label)
        .unwrap_or(GestureLabel::Unrecognized)
}

pub fn matching_rules<'a>(hand: &'a LandmarkSnapshot) -> impl Iterator<Item = &'static Rule> + 'a {
    RULES.iter().filter(move |rule| rule.matches(hand))
}
