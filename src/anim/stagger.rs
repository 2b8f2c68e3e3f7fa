use tracing::debug;

use super::state::AnimationState;
use super::timers::TimerQueue;
use super::token::CancelToken;
use crate::error::{AnimationError, check_duration};

pub const DEFAULT_TOTAL_LINES: usize = 50;
pub const DEFAULT_DRAWING_DURATION_MS: f64 = 2000.0;
pub const DEFAULT_STROKE_DURATION_MS: f64 = 1500.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaggerConfig {
    total_lines: usize,
    drawing_duration: f64,
    stroke_duration: f64,
}

impl Default for StaggerConfig {
    fn default() -> Self {
        Self {
            total_lines: DEFAULT_TOTAL_LINES,
            drawing_duration: DEFAULT_DRAWING_DURATION_MS,
            stroke_duration: DEFAULT_STROKE_DURATION_MS,
        }
    }
}

impl StaggerConfig {
    /// `drawing_duration` is the window across which line starts are spread;
    /// `stroke_duration` is how long each line takes to draw.
    pub fn new(
        total_lines: usize,
        drawing_duration: f64,
        stroke_duration: f64,
    ) -> Result<Self, AnimationError> {
        if total_lines == 0 {
            return Err(AnimationError::NoLines);
        }
        Ok(Self {
            total_lines,
            drawing_duration: check_duration("drawing_duration", drawing_duration)?,
            stroke_duration: check_duration("stroke_duration", stroke_duration)?,
        })
    }

    pub fn total_lines(&self) -> usize {
        self.total_lines
    }

    pub fn delay_between_lines(&self) -> f64 {
        self.drawing_duration / self.total_lines as f64
    }

    pub fn start_offset(&self, index: usize) -> f64 {
        index as f64 * self.delay_between_lines()
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LineStatus {
    Idle,
    Drawing,
    Complete,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum StaggerEvent {
    Start(usize),
    Finish(usize),
}

pub struct StaggeredReveal {
    config: StaggerConfig,
    lines: Vec<LineStatus>,
    timers: TimerQueue<StaggerEvent>,
    token: Option<CancelToken>,
}

impl StaggeredReveal {
    pub fn new(config: StaggerConfig) -> Self {
        Self {
            lines: vec![LineStatus::Idle; config.total_lines],
            config,
            timers: TimerQueue::new(),
            token: None,
        }
    }

    pub fn config(&self) -> &StaggerConfig {
        &self.config
    }

    pub fn is_active(&self) -> bool {
        self.token.is_some()
    }

    pub fn token(&self) -> Option<&CancelToken> {
        self.token.as_ref()
    }

    pub fn activate(&mut self, now: f64) {
        self.deactivate();
        let token = CancelToken::new();
        for index in 0..self.config.total_lines {
            self.timers
                .schedule(now + self.config.start_offset(index), &token, StaggerEvent::Start(index));
        }
        debug!(lines = self.config.total_lines, "staggered reveal activated");
        self.token = Some(token);
    }

    pub fn deactivate(&mut self) {
        if let Some(token) = self.token.take() {
            token.cancel();
            debug!("staggered reveal deactivated");
        }
        self.timers.cancel_all();
        self.lines.fill(LineStatus::Idle);
    }

    pub fn advance(&mut self, now: f64) {
        while let Some((due, event)) = self.timers.pop_due(now) {
            let Some(token) = self.token.as_ref() else {
                break;
            };
            if token.is_cancelled() {
                break;
            }
            match event {
                StaggerEvent::Start(index) => {
                    if let Some(line) = self.lines.get_mut(index) {
                        *line = LineStatus::Drawing;
                    }
                    let token = token.clone();
                    self.timers.schedule(
                        due + self.config.stroke_duration,
                        &token,
                        StaggerEvent::Finish(index),
                    );
                }
                StaggerEvent::Finish(index) => {
                    if let Some(line) = self.lines.get_mut(index) {
                        *line = LineStatus::Complete;
                    }
                }
            }
        }
    }

    pub fn status(&self, index: usize) -> LineStatus {
        self.lines.get(index).copied().unwrap_or(LineStatus::Idle)
    }

    pub fn line_state(&self, index: usize) -> AnimationState {
        match self.status(index) {
            LineStatus::Idle => AnimationState::IDLE,
            LineStatus::Drawing => AnimationState::DRAWING,
            LineStatus::Complete => AnimationState::COMPLETE,
        }
    }

    pub fn states(&self) -> Vec<AnimationState> {
        (0..self.lines.len()).map(|i| self.line_state(i)).collect()
    }

    pub fn drawing_count(&self) -> usize {
        self.count(LineStatus::Drawing)
    }

    pub fn complete_count(&self) -> usize {
        self.count(LineStatus::Complete)
    }

    pub fn is_animation_complete(&self) -> bool {
        self.complete_count() == self.config.total_lines
    }

    pub fn next_due(&self) -> Option<f64> {
        self.timers.next_due()
    }

    fn count(&self, status: LineStatus) -> usize {
        self.lines.iter().filter(|s| **s == status).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    fn five_lines() -> StaggeredReveal {
        StaggeredReveal::new(StaggerConfig::new(5, 1000.0, 1500.0).expect("valid config"))
    }

    #[test]
    fn five_lines_start_every_200ms() {
        let mut reveal = five_lines();
        reveal.activate(0.0);

        reveal.advance(0.0);
        assert_eq!(reveal.status(0), LineStatus::Drawing);
        assert_eq!(reveal.status(1), LineStatus::Idle);

        reveal.advance(799.0);
        assert_eq!(reveal.status(3), LineStatus::Drawing);
        assert_eq!(reveal.status(4), LineStatus::Idle);

        reveal.advance(800.0);
        assert_eq!(reveal.status(4), LineStatus::Drawing);
        assert_eq!(reveal.config().start_offset(4), 800.0);
    }

    #[test]
    fn lines_complete_after_stroke_duration() {
        let mut reveal = five_lines();
        reveal.activate(100.0);
        reveal.advance(1_599.0);
        assert_eq!(reveal.status(0), LineStatus::Drawing);
        reveal.advance(1_600.0);
        assert_eq!(reveal.status(0), LineStatus::Complete);
        assert_eq!(reveal.line_state(0), AnimationState::COMPLETE);
        assert!(!reveal.is_animation_complete());

        reveal.advance(100.0 + 800.0 + 1_500.0);
        assert!(reveal.is_animation_complete());
        assert_eq!(reveal.next_due(), None);
    }

    #[test]
    fn drawing_state_matches_stroke_attributes() {
        let mut reveal = five_lines();
        reveal.activate(0.0);
        reveal.advance(0.0);
        let state = reveal.line_state(0);
        assert_eq!(state.stroke_dasharray.to_string(), "1000 1000");
        assert_eq!(state.stroke_dashoffset, 1000.0);
        assert_eq!(state.opacity, 0.8);
        assert!(state.is_visible);
        assert_eq!(reveal.line_state(4), AnimationState::IDLE);
    }

    #[test]
    fn stale_timers_do_not_fire_after_deactivation() {
        let mut reveal = five_lines();
        reveal.activate(0.0);
        reveal.advance(300.0);
        let token = reveal.token().cloned().expect("active");

        reveal.deactivate();
        assert!(token.is_cancelled());
        reveal.advance(10_000.0);
        assert_eq!(reveal.complete_count(), 0);
        assert_eq!(reveal.drawing_count(), 0);
        assert!(reveal.states().iter().all(|s| *s == AnimationState::IDLE));
    }

    #[test]
    fn reactivation_restarts_from_zero() {
        let mut reveal = five_lines();
        reveal.activate(0.0);
        reveal.advance(5_000.0);
        assert!(reveal.is_animation_complete());

        reveal.activate(6_000.0);
        assert_eq!(reveal.complete_count(), 0);
        reveal.advance(6_000.0);
        assert_eq!(reveal.drawing_count(), 1);
        assert!(!reveal.token().expect("active").is_cancelled());
    }

    #[test]
    fn config_guards_reject_bad_inputs() {
        assert_eq!(
            StaggerConfig::new(0, 1000.0, 1500.0),
            Err(AnimationError::NoLines)
        );
        assert!(StaggerConfig::new(5, -1.0, 1500.0).is_err());
        assert!(StaggerConfig::new(5, 1000.0, f64::NAN).is_err());
        assert_eq!(StaggerConfig::default().total_lines(), 50);
        assert_eq!(StaggerConfig::default().delay_between_lines(), 40.0);
    }

    proptest! {
        #[test]
        fn deactivation_resets_every_line(
            lines in 1usize..60,
            window in 0.0f64..5_000.0,
            stroke in 0.0f64..3_000.0,
            elapsed in 0.0f64..10_000.0,
        ) {
            let config = StaggerConfig::new(lines, window, stroke).expect("valid config");
            let mut reveal = StaggeredReveal::new(config);
            reveal.activate(0.0);
            reveal.advance(elapsed);
            reveal.deactivate();
            reveal.advance(elapsed + 20_000.0);

            prop_assert!(!reveal.is_active());
            prop_assert_eq!(reveal.complete_count(), 0);
            prop_assert!(reveal.states().iter().all(|s| *s == AnimationState::IDLE));
        }
    }
}
