use serde::Serialize;
use tracing::info;

use super::timers::TimerQueue;
use super::token::CancelToken;
use crate::error::{AnimationError, check_duration};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RevealPhase {
    Projecting,
    Paths,
    Optimizing,
    DrawingFinal,
    Final,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChoreographyTimings {
    pub projecting_min: f64,
    pub paths: f64,
    pub optimizing: f64,
    pub drawing_final: f64,
}

impl Default for ChoreographyTimings {
    fn default() -> Self {
        Self {
            projecting_min: 3000.0,
            paths: 6000.0,
            optimizing: 2000.0,
            drawing_final: 4000.0,
        }
    }
}

impl ChoreographyTimings {
    pub fn validate(self) -> Result<Self, AnimationError> {
        check_duration("projecting_min", self.projecting_min)?;
        check_duration("paths", self.paths)?;
        check_duration("optimizing", self.optimizing)?;
        check_duration("drawing_final", self.drawing_final)?;
        Ok(self)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Cue {
    MinimumElapsed,
    PhaseDone(RevealPhase),
}

/// Phase sequencing for the result reveal. Leaving `Projecting` needs both
/// the minimum display time and a delivered result; later phases are timed.
pub struct Choreography {
    timings: ChoreographyTimings,
    phase: RevealPhase,
    timers: TimerQueue<Cue>,
    token: Option<CancelToken>,
    minimum_elapsed: bool,
    result_ready: bool,
}

impl Choreography {
    pub fn new(timings: ChoreographyTimings) -> Result<Self, AnimationError> {
        Ok(Self {
            timings: timings.validate()?,
            phase: RevealPhase::Final,
            timers: TimerQueue::new(),
            token: None,
            minimum_elapsed: false,
            result_ready: false,
        })
    }

    pub fn phase(&self) -> RevealPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.token.is_some()
    }

    pub fn begin(&mut self, now: f64) -> Option<RevealPhase> {
        if self.is_running() {
            return None;
        }
        let token = CancelToken::new();
        self.timers
            .schedule(now + self.timings.projecting_min, &token, Cue::MinimumElapsed);
        self.token = Some(token);
        self.minimum_elapsed = false;
        self.result_ready = false;
        Some(self.enter(RevealPhase::Projecting))
    }

    pub fn deliver_result(&mut self, now: f64) -> Option<RevealPhase> {
        if self.phase != RevealPhase::Projecting {
            return None;
        }
        self.result_ready = true;
        self.try_leave_projecting(now)
    }

    pub fn advance(&mut self, now: f64) -> Vec<(f64, RevealPhase)> {
        let mut entered = Vec::new();
        while let Some((due, cue)) = self.timers.pop_due(now) {
            if !self.token.as_ref().is_some_and(|t| !t.is_cancelled()) {
                break;
            }
            let next = match cue {
                Cue::MinimumElapsed => {
                    self.minimum_elapsed = true;
                    self.try_leave_projecting(due)
                }
                Cue::PhaseDone(phase) if phase == self.phase => self.after(phase, due),
                Cue::PhaseDone(_) => None,
            };
            entered.extend(next.map(|phase| (due, phase)));
        }
        entered
    }

    pub fn reset(&mut self) {
        if let Some(token) = self.token.take() {
            token.cancel();
        }
        self.timers.cancel_all();
        self.minimum_elapsed = false;
        self.result_ready = false;
        if self.phase != RevealPhase::Final {
            info!(from = ?self.phase, "reveal reset");
        }
        self.phase = RevealPhase::Final;
    }

    pub fn next_due(&self) -> Option<f64> {
        self.timers.next_due()
    }

    fn try_leave_projecting(&mut self, at: f64) -> Option<RevealPhase> {
        if self.phase == RevealPhase::Projecting && self.minimum_elapsed && self.result_ready {
            self.schedule_done(RevealPhase::Paths, at + self.timings.paths);
            Some(self.enter(RevealPhase::Paths))
        } else {
            None
        }
    }

    fn after(&mut self, finished: RevealPhase, at: f64) -> Option<RevealPhase> {
        match finished {
            RevealPhase::Paths => {
                self.schedule_done(RevealPhase::Optimizing, at + self.timings.optimizing);
                Some(self.enter(RevealPhase::Optimizing))
            }
            RevealPhase::Optimizing => {
                self.schedule_done(RevealPhase::DrawingFinal, at + self.timings.drawing_final);
                Some(self.enter(RevealPhase::DrawingFinal))
            }
            RevealPhase::DrawingFinal => {
                let phase = self.enter(RevealPhase::Final);
                if let Some(token) = self.token.take() {
                    token.cancel();
                }
                Some(phase)
            }
            RevealPhase::Projecting | RevealPhase::Final => None,
        }
    }

    fn schedule_done(&mut self, phase: RevealPhase, due: f64) {
        if let Some(token) = self.token.as_ref() {
            self.timers.schedule(due, token, Cue::PhaseDone(phase));
        }
    }

    fn enter(&mut self, phase: RevealPhase) -> RevealPhase {
        info!(from = ?self.phase, to = ?phase, "reveal phase transition");
        self.phase = phase;
        phase
    }
}

impl Default for Choreography {
    fn default() -> Self {
        Self {
            timings: ChoreographyTimings::default(),
            phase: RevealPhase::Final,
            timers: TimerQueue::new(),
            token: None,
            minimum_elapsed: false,
            result_ready: false,
        }
    }
}
