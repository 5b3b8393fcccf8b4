//! Personal bests and gold sections per game mode

use hashbrown::HashMap;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::section::Section;
use crate::snapshot::{GameMode, Grade, Snapshot, format_ticks};

/// Rule deciding whether a section replaces the stored gold section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GoldRule {
    /// Strictly lower elapsed time wins
    #[default]
    Fastest,
    /// Like `Fastest`, but only sections with at least this many tetrises count
    MinTetrises(u32),
}

impl GoldRule {
    fn qualifies(&self, section: &Section) -> bool {
        if !section.complete || section.elapsed() <= 0 {
            return false;
        }
        match *self {
            GoldRule::Fastest => true,
            GoldRule::MinTetrises(min) => section.tetrises() >= min,
        }
    }

    fn beats(&self, candidate: &Section, stored: Option<&Section>) -> bool {
        self.qualifies(candidate) && stored.is_none_or(|gold| candidate.elapsed() < gold.elapsed())
    }
}

/// Outcome of one finished game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GameSummary {
    pub grade: Grade,
    pub level: i32,
    pub time: i32,
}

impl GameSummary {
    pub fn from_final(snapshot: &Snapshot) -> Self {
        Self {
            grade: snapshot.grade,
            level: snapshot.level,
            time: snapshot.timer,
        }
    }

    /// Higher grade wins; at equal grade, strictly lower time wins
    pub fn beats(&self, other: &GameSummary) -> bool {
        self.grade > other.grade || (self.grade == other.grade && self.time < other.time)
    }
}

/// What a finished game changed in its mode's record
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PbUpdate {
    pub new_best: bool,
    /// Section indices whose gold was replaced
    pub gold_sections: Vec<usize>,
}

impl PbUpdate {
    pub fn is_empty(&self) -> bool {
        !self.new_best && self.gold_sections.is_empty()
    }
}

/// Best game and gold sections of one game mode
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PbRecord {
    best: Option<GameSummary>,
    /// Sections of the best game
    best_splits: Vec<Section>,
    gold: Vec<Option<Section>>,
}

impl PbRecord {
    pub fn best(&self) -> Option<&GameSummary> {
        self.best.as_ref()
    }

    pub fn best_splits(&self) -> &[Section] {
        &self.best_splits
    }

    /// Gold section at `index`, if one has been recorded
    pub fn gold(&self, index: usize) -> Option<&Section> {
        self.gold.get(index).and_then(Option::as_ref)
    }

    pub fn gold_sections(&self) -> impl Iterator<Item = &Section> + '_ {
        self.gold.iter().flatten()
    }

    /// Sum of gold times, when every section up to the last known gold has
    /// one and the total fits in an `i32`
    pub fn sum_of_gold(&self) -> Option<i32> {
        if self.gold.is_empty() {
            return None;
        }
        self.gold.iter().try_fold(0i32, |total, gold| {
            gold.as_ref()
                .and_then(|section| total.checked_add(section.elapsed()))
        })
    }

    /// Fold a finished game into the record
    pub fn commit(&mut self, final_snapshot: &Snapshot, sections: &[Section], rule: GoldRule) -> PbUpdate {
        let mut update = PbUpdate::default();

        let summary = GameSummary::from_final(final_snapshot);
        if self.best.is_none_or(|best| summary.beats(&best)) {
            self.best = Some(summary);
            self.best_splits = sections.to_vec();
            update.new_best = true;
        }

        for section in sections {
            if !rule.beats(section, self.gold(section.index)) {
                continue;
            }
            if self.gold.len() <= section.index {
                self.gold.resize(section.index + 1, None);
            }
            self.gold[section.index] = Some(*section);
            update.gold_sections.push(section.index);
        }

        update
    }
}

/// Records of every game mode seen so far
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PbTable {
    records: HashMap<GameMode, PbRecord>,
}

impl PbTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record for `mode`; `None` until a game of that mode has finished
    pub fn get(&self, mode: GameMode) -> Option<&PbRecord> {
        self.records.get(&mode)
    }

    pub fn gold(&self, mode: GameMode, index: usize) -> Option<&Section> {
        self.get(mode).and_then(|record| record.gold(index))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Modes with a record, in ascending order
    pub fn modes(&self) -> Vec<GameMode> {
        let mut modes: Vec<_> = self.records.keys().copied().collect();
        modes.sort();
        modes
    }

    /// Commit a finished game of `mode`, creating its record if needed
    pub fn record_game(
        &mut self,
        mode: GameMode,
        final_snapshot: &Snapshot,
        sections: &[Section],
        rule: GoldRule,
    ) -> PbUpdate {
        let update = self
            .records
            .entry(mode)
            .or_default()
            .commit(final_snapshot, sections, rule);

        if update.new_best {
            debug!(
                "new best for mode {}: grade {} in {}",
                mode,
                final_snapshot.grade,
                format_ticks(final_snapshot.timer)
            );
        }
        for index in &update.gold_sections {
            debug!("new gold section {} for mode {}", index, mode);
        }
        update
    }
}
