use std::fmt;

use serde::{Serialize, Serializer};

pub const DASH_HIDDEN: f64 = 1000.0;

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum DashPattern {
    Solid,
    Dashed(f64, f64),
}

impl DashPattern {
    pub const DRAWING: DashPattern = DashPattern::Dashed(DASH_HIDDEN, DASH_HIDDEN);
}

impl fmt::Display for DashPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DashPattern::Solid => f.write_str("none"),
            DashPattern::Dashed(dash, gap) => write!(f, "{dash} {gap}"),
        }
    }
}

impl Serialize for DashPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationState {
    pub stroke_dasharray: DashPattern,
    pub stroke_dashoffset: f64,
    pub opacity: f64,
    pub is_visible: bool,
}

impl AnimationState {
    pub const IDLE: AnimationState = AnimationState {
        stroke_dasharray: DashPattern::Solid,
        stroke_dashoffset: 0.0,
        opacity: 0.0,
        is_visible: false,
    };

    pub const DRAWING: AnimationState = AnimationState {
        stroke_dasharray: DashPattern::DRAWING,
        stroke_dashoffset: DASH_HIDDEN,
        opacity: 0.8,
        is_visible: true,
    };

    pub const COMPLETE: AnimationState = AnimationState {
        stroke_dasharray: DashPattern::Solid,
        stroke_dashoffset: 0.0,
        opacity: 1.0,
        is_visible: true,
    };
}
