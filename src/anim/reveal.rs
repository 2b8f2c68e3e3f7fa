use tracing::debug;

use super::token::CancelToken;
use crate::error::{AnimationError, check_duration};

pub const DEFAULT_SYNC_DURATION_MS: f64 = 3999.0;

/// Frame-driven progress from 0 to 1. The first frame after activation is
/// the time origin; reaching 1 stops frame requests.
pub struct SynchronizedReveal {
    duration: f64,
    origin: Option<f64>,
    progress: f64,
    complete: bool,
    frame: Option<CancelToken>,
}

impl Default for SynchronizedReveal {
    fn default() -> Self {
        Self {
            duration: DEFAULT_SYNC_DURATION_MS,
            origin: None,
            progress: 0.0,
            complete: false,
            frame: None,
        }
    }
}

impl SynchronizedReveal {
    pub fn new(duration: f64) -> Result<Self, AnimationError> {
        Ok(Self {
            duration: check_duration("duration", duration)?,
            ..Self::default()
        })
    }

    pub fn activate(&mut self) {
        self.deactivate();
        self.frame = Some(CancelToken::new());
        debug!(duration_ms = self.duration, "synchronized reveal activated");
    }

    pub fn deactivate(&mut self) {
        if let Some(token) = self.frame.take() {
            token.cancel();
        }
        self.origin = None;
        self.progress = 0.0;
        self.complete = false;
    }

    pub fn wants_frame(&self) -> bool {
        self.frame.as_ref().is_some_and(|t| !t.is_cancelled())
    }

    pub fn on_frame(&mut self, timestamp: f64) {
        if !self.wants_frame() {
            return;
        }
        let origin = *self.origin.get_or_insert(timestamp);
        let elapsed = (timestamp - origin).max(0.0);
        self.progress = if self.duration > 0.0 {
            (elapsed / self.duration).min(1.0)
        } else {
            1.0
        };

        if self.progress >= 1.0 {
            self.complete = true;
            if let Some(token) = self.frame.take() {
                token.cancel();
            }
            debug!("synchronized reveal complete");
        }
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn is_animation_complete(&self) -> bool {
        self.complete
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    #[test]
    fn progress_runs_linearly_to_completion() {
        let mut reveal = SynchronizedReveal::default();
        reveal.activate();

        reveal.on_frame(10_000.0);
        assert_eq!(reveal.progress(), 0.0);
        assert!(!reveal.is_animation_complete());

        reveal.on_frame(10_000.0 + 3999.0 / 2.0);
        assert!((reveal.progress() - 0.5).abs() < 1e-12);

        reveal.on_frame(10_000.0 + 3999.0);
        assert_eq!(reveal.progress(), 1.0);
        assert!(reveal.is_animation_complete());
        assert!(!reveal.wants_frame());
    }

    #[test]
    fn late_frames_clamp_to_one() {
        let mut reveal = SynchronizedReveal::default();
        reveal.activate();
        reveal.on_frame(0.0);
        reveal.on_frame(60_000.0);
        assert_eq!(reveal.progress(), 1.0);
    }

    #[test]
    fn inactive_driver_ignores_frames() {
        let mut reveal = SynchronizedReveal::default();
        reveal.on_frame(0.0);
        reveal.on_frame(5_000.0);
        assert_eq!(reveal.progress(), 0.0);
        assert!(!reveal.wants_frame());
    }

    #[test]
    fn zero_duration_completes_on_first_frame() {
        let mut reveal = SynchronizedReveal::new(0.0).expect("valid duration");
        reveal.activate();
        reveal.on_frame(42.0);
        assert!(reveal.is_animation_complete());
        assert!(SynchronizedReveal::new(-5.0).is_err());
    }

    proptest! {
        #[test]
        fn deactivation_resets_progress(
            duration in 1.0f64..10_000.0,
            elapsed in 0.0f64..20_000.0,
        ) {
            let mut reveal = SynchronizedReveal::new(duration).expect("valid duration");
            reveal.activate();
            reveal.on_frame(0.0);
            reveal.on_frame(elapsed);
            prop_assert!((0.0..=1.0).contains(&reveal.progress()));

            reveal.deactivate();
            reveal.on_frame(elapsed + 1.0);
            prop_assert_eq!(reveal.progress(), 0.0);
            prop_assert!(!reveal.is_animation_complete());
            prop_assert!(!reveal.wants_frame());
        }
    }
}
