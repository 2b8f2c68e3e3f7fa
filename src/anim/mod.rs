mod choreography;
mod phased;
mod reveal;
mod session;
mod stagger;
mod state;
mod timers;
mod token;

pub use choreography::{Choreography, ChoreographyTimings, RevealPhase};
pub use phased::{FinalLine, PhasedConfig, PhasedReveal};
pub use reveal::{DEFAULT_SYNC_DURATION_MS, SynchronizedReveal};
pub use session::{FinalLineStates, RevealFrame, RevealSession, SessionConfig};
pub use stagger::{
    DEFAULT_DRAWING_DURATION_MS, DEFAULT_STROKE_DURATION_MS, DEFAULT_TOTAL_LINES, LineStatus,
    StaggerConfig, StaggeredReveal,
};
pub use state::{AnimationState, DASH_HIDDEN, DashPattern};
pub use timers::TimerQueue;
pub use token::CancelToken;
