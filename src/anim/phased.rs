use serde::Serialize;
use tracing::debug;

use super::state::{AnimationState, DASH_HIDDEN, DashPattern};
use super::token::CancelToken;
use crate::error::{AnimationError, check_duration};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FinalLine {
    Pessimistic,
    Median,
    Optimistic,
}

impl FinalLine {
    pub const ALL: [FinalLine; 3] = [FinalLine::Pessimistic, FinalLine::Median, FinalLine::Optimistic];

    pub fn resting_dash(self) -> DashPattern {
        match self {
            FinalLine::Median => DashPattern::Solid,
            FinalLine::Pessimistic | FinalLine::Optimistic => DashPattern::Dashed(5.0, 5.0),
        }
    }

    pub fn resting_state(self) -> AnimationState {
        AnimationState {
            stroke_dasharray: self.resting_dash(),
            stroke_dashoffset: 0.0,
            opacity: 1.0,
            is_visible: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhasedConfig {
    pessimistic_start: f64,
    median_start: f64,
    optimistic_start: f64,
    line_duration: f64,
    total_duration: f64,
}

impl Default for PhasedConfig {
    fn default() -> Self {
        Self {
            pessimistic_start: 0.0,
            median_start: 500.0,
            optimistic_start: 1000.0,
            line_duration: 1000.0,
            total_duration: 3000.0,
        }
    }
}

impl PhasedConfig {
    pub fn new(
        pessimistic_start: f64,
        median_start: f64,
        optimistic_start: f64,
        line_duration: f64,
        total_duration: f64,
    ) -> Result<Self, AnimationError> {
        Ok(Self {
            pessimistic_start: check_duration("pessimistic_start", pessimistic_start)?,
            median_start: check_duration("median_start", median_start)?,
            optimistic_start: check_duration("optimistic_start", optimistic_start)?,
            line_duration: check_duration("line_duration", line_duration)?,
            total_duration: check_duration("total_duration", total_duration)?,
        })
    }

    pub fn start_of(&self, line: FinalLine) -> f64 {
        match line {
            FinalLine::Pessimistic => self.pessimistic_start,
            FinalLine::Median => self.median_start,
            FinalLine::Optimistic => self.optimistic_start,
        }
    }

    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }
}

pub struct PhasedReveal {
    config: PhasedConfig,
    origin: Option<f64>,
    elapsed: f64,
    frame: Option<CancelToken>,
    active: bool,
}

impl PhasedReveal {
    pub fn new(config: PhasedConfig) -> Self {
        Self {
            config,
            origin: None,
            elapsed: 0.0,
            frame: None,
            active: false,
        }
    }

    pub fn activate(&mut self) {
        self.deactivate();
        self.active = true;
        self.frame = Some(CancelToken::new());
        debug!(
            total_ms = self.config.total_duration(),
            "final lines reveal activated"
        );
    }

    pub fn deactivate(&mut self) {
        if let Some(token) = self.frame.take() {
            token.cancel();
        }
        self.active = false;
        self.origin = None;
        self.elapsed = 0.0;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn wants_frame(&self) -> bool {
        self.frame.as_ref().is_some_and(|t| !t.is_cancelled())
    }

    pub fn on_frame(&mut self, timestamp: f64) {
        if !self.wants_frame() {
            return;
        }
        let origin = *self.origin.get_or_insert(timestamp);
        self.elapsed = (timestamp - origin).max(0.0);
        if self.elapsed >= self.config.total_duration() {
            if let Some(token) = self.frame.take() {
                token.cancel();
            }
        }
    }

    /// Progress of `line` in `[0, 1]`; `None` before its start offset.
    pub fn line_progress(&self, line: FinalLine) -> Option<f64> {
        if !self.active {
            return Some(1.0);
        }
        let since_start = self.elapsed - self.config.start_of(line);
        if since_start < 0.0 {
            return None;
        }
        if self.config.line_duration <= 0.0 {
            return Some(1.0);
        }
        Some((since_start / self.config.line_duration).min(1.0))
    }

    pub fn line_state(&self, line: FinalLine) -> AnimationState {
        match self.line_progress(line) {
            None => AnimationState {
                stroke_dasharray: DashPattern::DRAWING,
                stroke_dashoffset: DASH_HIDDEN,
                opacity: 0.0,
                is_visible: false,
            },
            Some(p) if p >= 1.0 => line.resting_state(),
            Some(p) => AnimationState {
                stroke_dasharray: DashPattern::DRAWING,
                stroke_dashoffset: DASH_HIDDEN * (1.0 - p),
                opacity: 0.3 + 0.7 * p,
                is_visible: true,
            },
        }
    }

    pub fn is_animation_complete(&self) -> bool {
        !self.active || self.elapsed >= self.config.total_duration()
    }
}

impl Default for PhasedReveal {
    fn default() -> Self {
        Self::new(PhasedConfig::default())
    }
}
