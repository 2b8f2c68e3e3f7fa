pub mod anim;
pub mod api;
pub mod chart;
pub mod core;
pub mod error;
pub mod telemetry;
