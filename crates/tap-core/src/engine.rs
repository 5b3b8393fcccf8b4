//! Edge detection over consecutive snapshots
//!
//! The observed game has no event stream of its own. The engine keeps the
//! previous and current snapshot and turns their differences into
//! [`GameEvent`]s once per tick.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::snapshot::{GameMode, PlayPhase, Snapshot};

/// Previous and current snapshot of the run being observed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GameRunState {
    pub previous: Snapshot,
    pub current: Snapshot,
}

/// Inconsistency between two consecutive snapshots. Reported, never fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateAnomaly {
    /// The level went down while a game was in progress
    LevelDecreased { previous: Snapshot, current: Snapshot },
}

/// Something that happened between two ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// A game began (previous tick was not playing, this one is)
    GameStart(Snapshot),
    Anomaly(StateAnomaly),
    /// The level rose during play
    LevelAdvance { from_level: i32, snapshot: Snapshot },
    /// A piece became controllable
    PlayActive { level: i32, tick: i32 },
    /// The game stopped; carries the last in-play snapshot
    GameEnd {
        final_snapshot: Snapshot,
        game_mode: GameMode,
    },
}

/// Owns the run state and turns snapshots into events
#[derive(Debug, Clone, Default)]
pub struct TransitionEngine {
    run: GameRunState,
}

impl TransitionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn run_state(&self) -> &GameRunState {
        &self.run
    }

    /// Feed the newest snapshot; call exactly once per tick.
    ///
    /// On game end the run state is zeroed after the events are built, so
    /// the returned events still carry the ended game's data.
    pub fn observe(&mut self, snapshot: Snapshot) -> Vec<GameEvent> {
        self.run.previous = self.run.current;
        self.run.current = snapshot;

        let GameRunState { previous, current } = self.run;
        let mut events = Vec::new();

        if !previous.is_playing() && current.is_playing() {
            debug!("game start in mode {} at level {}", current.game_mode, current.level);
            events.push(GameEvent::GameStart(current));
        }

        if current.is_playing() {
            if current.level < previous.level {
                warn!(
                    "internal state error: state {} -> {}, level {} -> {}, time {} -> {}",
                    previous.state,
                    current.state,
                    previous.level,
                    current.level,
                    previous.timer,
                    current.timer
                );
                events.push(GameEvent::Anomaly(StateAnomaly::LevelDecreased { previous, current }));
            } else if current.level > previous.level {
                events.push(GameEvent::LevelAdvance {
                    from_level: previous.level,
                    snapshot: current,
                });
            }
        }

        if previous.state != PlayPhase::Active && current.state == PlayPhase::Active {
            events.push(GameEvent::PlayActive {
                level: current.level,
                tick: current.timer,
            });
        }

        if previous.is_playing() && !current.is_playing() {
            debug!(
                "game end in mode {} at level {} (grade {})",
                previous.game_mode, previous.level, previous.grade
            );
            events.push(GameEvent::GameEnd {
                final_snapshot: previous,
                game_mode: previous.game_mode,
            });
            self.run = GameRunState::default();
        }

        events
    }
}
