pub mod commands;
pub mod controller;
pub mod state;

pub use commands::{dispatch, PlaybackCommand};
pub use controller::{PlaybackController, PlaybackSnapshot};
pub use state::{
    Phase, PlaybackConfig, PlaybackEvent, PlaybackState, SummaryScope, ViewWindow, WindowPolicy,
};
