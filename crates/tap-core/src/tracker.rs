//! Tracker: feeds each tick's events to the statistics components
//!
//! The [`TransitionEngine`] produces events; the section tracker, PB table
//! and both histories consume them. None of the consumers talk back to the
//! engine or to each other.

use log::debug;

use crate::engine::{GameEvent, StateAnomaly, TransitionEngine};
use crate::history::{GameHistory, GameHistoryElement, InputHistory};
use crate::options::TrackerOptions;
use crate::pb::{PbTable, PbUpdate};
use crate::section::{Section, SectionTracker};
use crate::snapshot::{GameMode, Snapshot};

/// What happened to a game that just ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameOutcome {
    pub final_snapshot: Snapshot,
    pub game_mode: GameMode,
    /// Closed sections of the game, in order
    pub sections: Vec<Section>,
    pub is_demo: bool,
    pub master_eligible: bool,
    /// `None` when the game was kept out of the statistics
    pub pb_update: Option<PbUpdate>,
}

/// Result of one tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub events: Vec<GameEvent>,
    pub outcome: Option<GameOutcome>,
}

impl TickReport {
    pub fn anomalies(&self) -> impl Iterator<Item = &StateAnomaly> + '_ {
        self.events.iter().filter_map(|event| match event {
            GameEvent::Anomaly(anomaly) => Some(anomaly),
            _ => None,
        })
    }
}

/// Owns every component and drives them from polled snapshots
#[derive(Debug, Clone)]
pub struct Tracker {
    options: TrackerOptions,
    engine: TransitionEngine,
    sections: SectionTracker,
    pb: PbTable,
    game_history: GameHistory,
    input_history: InputHistory,
}

impl Default for Tracker {
    fn default() -> Self {
        Self::new(TrackerOptions::default())
    }
}

impl Tracker {
    pub fn new(options: TrackerOptions) -> Self {
        Self {
            engine: TransitionEngine::new(),
            sections: SectionTracker::new(options.section_length, options.level_max),
            pb: PbTable::new(),
            game_history: GameHistory::new(options.game_history_capacity),
            input_history: InputHistory::new(options.input_history_capacity),
            options,
        }
    }

    /// Resume with statistics restored by the host
    pub fn with_records(options: TrackerOptions, pb: PbTable, game_history: GameHistory) -> Self {
        let mut tracker = Self::new(options);
        tracker.pb = pb;
        tracker.game_history = game_history;
        tracker
    }

    /// Process one polled snapshot
    pub fn tick(&mut self, snapshot: Snapshot) -> TickReport {
        let events = self.engine.observe(snapshot);
        let mut outcome = None;
        let mut started = false;

        for event in &events {
            match *event {
                GameEvent::GameStart(start) => {
                    started = true;
                    self.sections.start(&start);
                }
                // Already logged by the engine; the section stays untouched.
                GameEvent::Anomaly(_) => {}
                // Joining a game in progress jumps from the idle level; no clear happened.
                GameEvent::LevelAdvance { snapshot, .. } if started => {
                    self.sections.level_advance(snapshot.level, &snapshot)
                }
                GameEvent::LevelAdvance {
                    from_level,
                    snapshot,
                } => self.sections.level_advance(from_level, &snapshot),
                GameEvent::PlayActive { level, tick } => self.input_history.push(level, tick),
                GameEvent::GameEnd {
                    final_snapshot,
                    game_mode,
                } => outcome = Some(self.finish_game(final_snapshot, game_mode)),
            }
        }

        TickReport { events, outcome }
    }

    fn finish_game(&mut self, final_snapshot: Snapshot, game_mode: GameMode) -> GameOutcome {
        let is_demo = self
            .options
            .demo
            .as_ref()
            .is_some_and(|demo| demo.matches(&self.input_history));
        let sections = self.sections.finish(&final_snapshot);

        let pb_update = if is_demo && self.options.skip_demo_games {
            debug!("demo game in mode {} left out of statistics", game_mode);
            None
        } else {
            let update =
                self.pb
                    .record_game(game_mode, &final_snapshot, &sections, self.options.gold_rule);
            self.game_history.push(GameHistoryElement {
                state: final_snapshot,
                game_mode,
            });
            Some(update)
        };

        self.sections.reset();
        self.input_history.reset();

        GameOutcome {
            final_snapshot,
            game_mode,
            sections,
            is_demo,
            master_eligible: final_snapshot.is_master_eligible(),
            pb_update,
        }
    }

    pub fn options(&self) -> &TrackerOptions {
        &self.options
    }

    pub fn engine(&self) -> &TransitionEngine {
        &self.engine
    }

    /// Section bookkeeping of the game in progress
    pub fn sections(&self) -> &SectionTracker {
        &self.sections
    }

    pub fn pb_table(&self) -> &PbTable {
        &self.pb
    }

    pub fn game_history(&self) -> &GameHistory {
        &self.game_history
    }

    pub fn input_history(&self) -> &InputHistory {
        &self.input_history
    }

    /// Master-roll eligibility of the latest snapshot
    pub fn is_master_eligible(&self) -> bool {
        self.engine.run_state().current.is_master_eligible()
    }

    /// Carnival score of the live game history under the configured weights
    pub fn carnival_score(&self) -> u32 {
        self.game_history.carnival_score(&self.options.carnival)
    }
}
