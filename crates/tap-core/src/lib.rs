//! tap-core: Play statistics engine for TGM2+ ("TAP")
//!
//! The game is observed through one [`Snapshot`] per tick. This crate turns
//! that polled signal into discrete events and keeps the derived records:
//! section splits for the game in progress, personal bests and gold sections
//! per game mode, and fixed-size histories of finished games and of inputs.
//!
//! Nothing here does I/O except loading and saving [`TrackerOptions`].
//! Anomalies in the observed state are logged through the `log` facade and
//! returned as events; they never stop the tick loop.

pub mod engine;
pub mod history;
pub mod options;
pub mod pb;
pub mod section;
pub mod snapshot;
pub mod tracker;

pub use engine::{GameEvent, GameRunState, StateAnomaly, TransitionEngine};
pub use history::{
    CarnivalWeights, DemoSignature, GameHistory, GameHistoryElement, HistoryError, InputHistory,
    InputHistoryElement, RingBuffer,
};
pub use options::{OptionsError, TrackerOptions};
pub use pb::{GameSummary, GoldRule, PbRecord, PbTable, PbUpdate};
pub use section::{Section, SectionTracker};
pub use snapshot::{GameMode, Grade, MasterRollFlags, PlayPhase, RawSnapshot, Snapshot};
pub use tracker::{GameOutcome, TickReport, Tracker};
