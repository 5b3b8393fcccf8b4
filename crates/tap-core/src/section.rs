//! Section splits for the game in progress
//!
//! A section is a fixed span of levels (100 by default). Each one records
//! its start and end tick, the grade on entry and exit, and how many line
//! clears of each size happened inside it.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::snapshot::{Grade, PlayPhase, Snapshot, format_ticks};

/// Line-clear buckets: singles, doubles, triples, tetrises
pub const LINE_BUCKETS: usize = 4;

/// Bucket holding four-line clears
pub const TETRIS_INDEX: usize = 3;

/// Default levels per section
pub const DEFAULT_SECTION_LENGTH: i32 = 100;

/// Default final level of a completed game
pub const DEFAULT_LEVEL_MAX: i32 = 999;

/// One scoring segment of a game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Section {
    pub index: usize,
    pub start_time: i32,
    pub end_time: i32,
    pub start_level: i32,
    pub end_level: i32,
    pub lines: [u32; LINE_BUCKETS],
    pub entry_grade: Grade,
    pub exit_grade: Grade,
    /// Opened exactly on its first level (not joined mid-section)
    pub clean_start: bool,
    /// Played through from its first level to its last
    pub complete: bool,
}

impl Section {
    fn open(index: usize, snapshot: &Snapshot, clean_start: bool) -> Self {
        Self {
            index,
            start_time: snapshot.timer,
            end_time: snapshot.timer,
            start_level: snapshot.level,
            end_level: snapshot.level,
            lines: [0; LINE_BUCKETS],
            entry_grade: snapshot.grade,
            exit_grade: snapshot.grade,
            clean_start,
            complete: false,
        }
    }

    fn close(&mut self, snapshot: &Snapshot, complete: bool) {
        self.end_time = snapshot.timer;
        self.end_level = snapshot.level;
        self.exit_grade = snapshot.grade;
        self.complete = complete;
    }

    /// Ticks spent in the section
    pub fn elapsed(&self) -> i32 {
        self.end_time.saturating_sub(self.start_time)
    }

    pub fn tetrises(&self) -> u32 {
        self.lines[TETRIS_INDEX]
    }

    pub fn total_clears(&self) -> u32 {
        self.lines.iter().sum()
    }
}

/// Number of lines cleared by a level advance, if it was a clear at all.
///
/// Piece entry adds at most one level, so larger jumps are always clears;
/// a single-level jump only counts while the game shows the clear.
pub fn lines_cleared(from_level: i32, snapshot: &Snapshot) -> Option<usize> {
    let delta = snapshot.level.saturating_sub(from_level);
    if delta <= 0 {
        return None;
    }
    if snapshot.state == PlayPhase::LineClear || delta > 1 {
        usize::try_from(delta).ok().map(|n| n.min(LINE_BUCKETS))
    } else {
        None
    }
}

/// Section sequence of the game in progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionTracker {
    section_length: i32,
    level_max: i32,
    closed: Vec<Section>,
    current: Option<Section>,
}

impl Default for SectionTracker {
    fn default() -> Self {
        Self::new(DEFAULT_SECTION_LENGTH, DEFAULT_LEVEL_MAX)
    }
}

impl SectionTracker {
    /// A non-positive section length is treated as one level.
    pub fn new(section_length: i32, level_max: i32) -> Self {
        Self {
            section_length: section_length.max(1),
            level_max,
            closed: Vec::new(),
            current: None,
        }
    }

    pub fn section_length(&self) -> i32 {
        self.section_length
    }

    pub fn level_max(&self) -> i32 {
        self.level_max
    }

    fn unclamped_index(&self, level: i32) -> usize {
        usize::try_from(level.max(0) / self.section_length).unwrap_or(0)
    }

    /// Section index containing `level`. Levels past `level_max` belong to
    /// the last section.
    pub fn section_index(&self, level: i32) -> usize {
        self.unclamped_index(level).min(self.section_count() - 1)
    }

    /// Number of sections in a full game
    pub fn section_count(&self) -> usize {
        self.unclamped_index(self.level_max) + 1
    }

    /// Sections already closed in this game
    pub fn sections(&self) -> &[Section] {
        &self.closed
    }

    /// Section in progress
    pub fn current(&self) -> Option<&Section> {
        self.current.as_ref()
    }

    /// Begin tracking a new game at `snapshot`
    pub fn start(&mut self, snapshot: &Snapshot) {
        self.reset();
        self.open_at(snapshot);
    }

    fn open_at(&mut self, snapshot: &Snapshot) {
        let index = self.section_index(snapshot.level);
        let boundary = i32::try_from(index)
            .unwrap_or(i32::MAX)
            .saturating_mul(self.section_length);
        let clean_start = snapshot.level == boundary && snapshot.level <= self.level_max;
        self.current = Some(Section::open(index, snapshot, clean_start));
    }

    /// Account for the level rising from `from_level` to `snapshot.level`
    pub fn level_advance(&mut self, from_level: i32, snapshot: &Snapshot) {
        if self.current.is_none() {
            // Joined a game without seeing it start; nothing here is clean.
            let index = self.section_index(snapshot.level);
            self.current = Some(Section::open(index, snapshot, false));
            return;
        }

        let section_count = self.section_count();
        let section_length = self.section_length;
        let Some(section) = self.current.as_mut() else {
            return;
        };

        if let Some(lines) = lines_cleared(from_level, snapshot) {
            section.lines[lines - 1] += 1;
        }

        while section.index + 1 < section_count {
            let next = section.index + 1;
            let boundary = i32::try_from(next).unwrap_or(i32::MAX).saturating_mul(section_length);
            if snapshot.level < boundary {
                break;
            }
            let complete = section.clean_start;
            section.close(snapshot, complete);
            debug!(
                "section {} closed in {} ({} -> {})",
                section.index,
                format_ticks(section.elapsed()),
                section.entry_grade,
                section.exit_grade
            );
            self.closed.push(*section);
            *section = Section::open(next, snapshot, true);
        }
    }

    /// Close the section in progress and hand back the whole sequence
    pub fn finish(&mut self, final_snapshot: &Snapshot) -> Vec<Section> {
        if let Some(mut section) = self.current.take() {
            let complete = section.clean_start && final_snapshot.level >= self.level_max;
            section.close(final_snapshot, complete);
            self.closed.push(section);
        }
        std::mem::take(&mut self.closed)
    }

    /// Discard every section of the current game
    pub fn reset(&mut self) {
        self.closed.clear();
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(state: PlayPhase, level: i32, timer: i32) -> Snapshot {
        Snapshot {
            state,
            level,
            timer,
            ..Snapshot::default()
        }
    }

    #[test]
    fn test_lines_cleared() {
        assert_eq!(lines_cleared(10, &at(PlayPhase::Entry, 11, 0)), None);
        assert_eq!(lines_cleared(10, &at(PlayPhase::LineClear, 11, 0)), Some(1));
        assert_eq!(lines_cleared(10, &at(PlayPhase::Active, 13, 0)), Some(3));
        assert_eq!(lines_cleared(10, &at(PlayPhase::LineClear, 14, 0)), Some(4));
        assert_eq!(lines_cleared(10, &at(PlayPhase::LineClear, 17, 0)), Some(4));
        assert_eq!(lines_cleared(10, &at(PlayPhase::LineClear, 10, 0)), None);
        assert_eq!(lines_cleared(10, &at(PlayPhase::LineClear, 9, 0)), None);
    }

    #[test]
    fn test_start_opens_first_section() {
        let mut tracker = SectionTracker::default();
        tracker.start(&at(PlayPhase::Start, 0, 5));

        let current = tracker.current().unwrap();
        assert_eq!(current.index, 0);
        assert_eq!(current.start_time, 5);
        assert!(current.clean_start);
        assert!(tracker.sections().is_empty());
    }

    #[test]
    fn test_start_mid_section_is_not_clean() {
        let mut tracker = SectionTracker::default();
        tracker.start(&at(PlayPhase::Active, 250, 0));
        let current = tracker.current().unwrap();
        assert_eq!(current.index, 2);
        assert!(!current.clean_start);
    }

    #[test]
    fn test_boundary_crossing() {
        let mut tracker = SectionTracker::default();
        tracker.start(&at(PlayPhase::Start, 0, 0));
        tracker.level_advance(0, &at(PlayPhase::Entry, 1, 100));
        tracker.level_advance(98, &at(PlayPhase::LineClear, 101, 3000));

        let closed = tracker.sections();
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].elapsed(), 3000);
        assert_eq!(closed[0].end_level, 101);
        assert_eq!(closed[0].lines, [0, 0, 1, 0]);
        assert!(closed[0].complete);

        let current = tracker.current().unwrap();
        assert_eq!(current.index, 1);
        assert_eq!(current.start_time, 3000);
        assert_eq!(current.lines, [0; LINE_BUCKETS]);
        assert!(current.clean_start);
    }

    #[test]
    fn test_grades_on_entry_and_exit() {
        let mut tracker = SectionTracker::default();
        let mut start = at(PlayPhase::Start, 0, 0);
        start.grade = Grade(1);
        tracker.start(&start);

        let mut cross = at(PlayPhase::LineClear, 100, 2000);
        cross.grade = Grade(5);
        tracker.level_advance(96, &cross);

        assert_eq!(tracker.sections()[0].entry_grade, Grade(1));
        assert_eq!(tracker.sections()[0].exit_grade, Grade(5));
        assert_eq!(tracker.current().unwrap().entry_grade, Grade(5));
    }

    #[test]
    fn test_finish_returns_every_section() {
        let mut tracker = SectionTracker::default();
        tracker.start(&at(PlayPhase::Start, 0, 0));
        tracker.level_advance(99, &at(PlayPhase::Entry, 100, 1000));
        tracker.level_advance(199, &at(PlayPhase::Entry, 200, 2000));

        let sections = tracker.finish(&at(PlayPhase::GameOver, 250, 2500));
        assert_eq!(sections.len(), 3);
        assert!(sections[0].complete);
        assert!(sections[1].complete);
        // Died mid-section.
        assert!(!sections[2].complete);
        assert_eq!(sections[2].elapsed(), 500);
        assert!(tracker.sections().is_empty());
        assert!(tracker.current().is_none());
    }

    #[test]
    fn test_final_section_complete_at_level_max() {
        let mut tracker = SectionTracker::new(100, 999);
        tracker.start(&at(PlayPhase::Start, 0, 0));
        for index in 1..10 {
            let level = index * 100;
            tracker.level_advance(level - 1, &at(PlayPhase::Entry, level, level * 10));
        }
        assert_eq!(tracker.current().unwrap().index, 9);

        let sections = tracker.finish(&at(PlayPhase::Completion, 999, 9990));
        assert_eq!(sections.len(), 10);
        assert!(sections.iter().all(|s| s.complete));
    }

    #[test]
    fn test_no_sections_past_level_max() {
        let mut tracker = SectionTracker::new(100, 999);
        tracker.start(&at(PlayPhase::Start, 900, 0));
        tracker.level_advance(900, &at(PlayPhase::Entry, 5000, 10));
        assert_eq!(tracker.current().unwrap().index, 9);
        assert!(tracker.sections().is_empty());
    }

    #[test]
    fn test_glitched_start_level_stays_in_last_section() {
        let mut tracker = SectionTracker::new(100, 999);
        tracker.start(&at(PlayPhase::Start, 100_000_000, 0));
        assert_eq!(tracker.section_index(i32::MAX), 9);
        let current = tracker.current().unwrap();
        assert_eq!(current.index, 9);
        assert!(!current.clean_start);

        tracker.level_advance(100_000_000, &at(PlayPhase::Active, 100_000_001, 10));
        let sections = tracker.finish(&at(PlayPhase::GameOver, 100_000_001, 20));
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].index, 9);
        assert!(!sections[0].complete);
    }

    #[test]
    fn test_start_on_boundary_past_level_max_is_not_clean() {
        let mut tracker = SectionTracker::new(100, 999);
        tracker.start(&at(PlayPhase::Start, 1000, 0));
        assert!(!tracker.current().unwrap().clean_start);
    }

    #[test]
    fn test_glitched_timer_saturates() {
        let mut tracker = SectionTracker::default();
        tracker.start(&at(PlayPhase::Start, 0, i32::MIN));
        tracker.level_advance(0, &at(PlayPhase::Active, 100, i32::MAX));
        assert_eq!(tracker.sections()[0].elapsed(), i32::MAX);

        let reversed = Section {
            start_time: i32::MAX,
            end_time: i32::MIN,
            ..Section::default()
        };
        assert_eq!(reversed.elapsed(), i32::MIN);
        assert_eq!(lines_cleared(i32::MIN, &at(PlayPhase::LineClear, i32::MAX, 0)), Some(4));
    }

    #[test]
    fn test_advance_without_start() {
        let mut tracker = SectionTracker::default();
        tracker.level_advance(0, &at(PlayPhase::Active, 120, 40));
        let current = tracker.current().unwrap();
        assert_eq!(current.index, 1);
        assert!(!current.clean_start);
    }

    #[test]
    fn test_reset_discards_sections() {
        let mut tracker = SectionTracker::default();
        tracker.start(&at(PlayPhase::Start, 0, 0));
        tracker.level_advance(99, &at(PlayPhase::Entry, 100, 10));
        tracker.reset();
        assert!(tracker.sections().is_empty());
        assert!(tracker.current().is_none());
    }
}
