use serde::Serialize;
use tracing::{debug, info};

use super::choreography::{Choreography, ChoreographyTimings, RevealPhase};
use super::phased::{FinalLine, PhasedConfig, PhasedReveal};
use super::reveal::{DEFAULT_SYNC_DURATION_MS, SynchronizedReveal};
use super::stagger::{StaggerConfig, StaggeredReveal};
use super::state::AnimationState;
use crate::error::AnimationError;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SessionConfig {
    pub stagger: StaggerConfig,
    pub sync_duration: Option<f64>,
    pub phased: PhasedConfig,
    pub timings: ChoreographyTimings,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalLineStates {
    pub pessimistic: AnimationState,
    pub median: AnimationState,
    pub optimistic: AnimationState,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealFrame {
    pub timestamp: f64,
    pub phase: RevealPhase,
    pub progress: f64,
    pub lines_complete: bool,
    pub lines: Vec<AnimationState>,
    pub final_lines: FinalLineStates,
}

pub struct RevealSession {
    choreography: Choreography,
    stagger: StaggeredReveal,
    sync: SynchronizedReveal,
    phased: PhasedReveal,
    monte_carlo_enabled: bool,
    torn_down: bool,
}

impl RevealSession {
    pub fn new(config: SessionConfig) -> Result<Self, AnimationError> {
        let sync = match config.sync_duration {
            Some(duration) => SynchronizedReveal::new(duration)?,
            None => SynchronizedReveal::new(DEFAULT_SYNC_DURATION_MS)?,
        };
        Ok(Self {
            choreography: Choreography::new(config.timings)?,
            stagger: StaggeredReveal::new(config.stagger),
            sync,
            phased: PhasedReveal::new(config.phased),
            monte_carlo_enabled: true,
            torn_down: false,
        })
    }

    pub fn phase(&self) -> RevealPhase {
        self.choreography.phase()
    }

    pub fn is_running(&self) -> bool {
        self.choreography.is_running()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn set_monte_carlo_enabled(&mut self, enabled: bool) {
        if self.monte_carlo_enabled == enabled {
            return;
        }
        self.monte_carlo_enabled = enabled;
        if !enabled {
            info!("monte carlo disabled; resetting reveal");
            self.reset_all();
        }
    }

    pub fn start_calculation(&mut self, now: f64) {
        if self.torn_down || !self.monte_carlo_enabled {
            return;
        }
        if let Some(phase) = self.choreography.begin(now) {
            self.apply(phase, now);
        }
    }

    pub fn deliver_result(&mut self, now: f64) {
        if self.torn_down {
            return;
        }
        if let Some(phase) = self.choreography.deliver_result(now) {
            self.apply(phase, now);
        }
    }

    pub fn frame(&mut self, timestamp: f64) -> RevealFrame {
        if !self.torn_down {
            for (at, phase) in self.choreography.advance(timestamp) {
                self.apply(phase, at);
            }
            self.stagger.advance(timestamp);
            if self.sync.wants_frame() {
                self.sync.on_frame(timestamp);
            }
            if self.phased.wants_frame() {
                self.phased.on_frame(timestamp);
            }
        }
        self.snapshot(timestamp)
    }

    /// Cancels every timer and frame request. Safe to call more than once.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.reset_all();
        self.torn_down = true;
        debug!("reveal session torn down");
    }

    pub fn next_due(&self) -> Option<f64> {
        match (self.choreography.next_due(), self.stagger.next_due()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn apply(&mut self, phase: RevealPhase, at: f64) {
        match phase {
            RevealPhase::Projecting => {
                self.stagger.deactivate();
                self.sync.deactivate();
                self.phased.deactivate();
            }
            RevealPhase::Paths => {
                self.stagger.activate(at);
                self.sync.activate();
            }
            RevealPhase::Optimizing => {
                self.stagger.deactivate();
                self.sync.deactivate();
            }
            RevealPhase::DrawingFinal => self.phased.activate(),
            RevealPhase::Final => self.phased.deactivate(),
        }
    }

    fn reset_all(&mut self) {
        self.choreography.reset();
        self.stagger.deactivate();
        self.sync.deactivate();
        self.phased.deactivate();
    }

    fn snapshot(&self, timestamp: f64) -> RevealFrame {
        RevealFrame {
            timestamp,
            phase: self.choreography.phase(),
            progress: self.sync.progress(),
            lines_complete: self.stagger.is_animation_complete(),
            lines: self.stagger.states(),
            final_lines: FinalLineStates {
                pessimistic: self.phased.line_state(FinalLine::Pessimistic),
                median: self.phased.line_state(FinalLine::Median),
                optimistic: self.phased.line_state(FinalLine::Optimistic),
            },
        }
    }
}

impl Drop for RevealSession {
    fn drop(&mut self) {
        self.teardown();
    }
}
