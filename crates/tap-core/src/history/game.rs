//! History of finished games

use serde::{Deserialize, Serialize};

use super::{HistoryError, InputHistory, InputHistoryElement, RingBuffer};
use crate::snapshot::{GameMode, Grade, MASTER_S9_GRADE, Snapshot};

/// Number of finished games kept
pub const MAX_GAME_HISTORY_COUNT: usize = 64;

/// Last in-play snapshot of a finished game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GameHistoryElement {
    pub state: Snapshot,
    pub game_mode: GameMode,
}

/// Scoring weights for [`GameHistory::carnival_score`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarnivalWeights {
    /// Final level that counts as a completed game
    pub completion_level: i32,
    /// Points for each completed game
    pub completion_points: u32,
    /// Minimum final grade of a master completion
    pub master_grade: Grade,
    /// Extra points when a completed game also reached `master_grade`
    pub master_points: u32,
}

impl Default for CarnivalWeights {
    fn default() -> Self {
        Self {
            completion_level: 999,
            completion_points: 1,
            master_grade: Grade(MASTER_S9_GRADE),
            master_points: 2,
        }
    }
}

impl CarnivalWeights {
    fn score(&self, element: &GameHistoryElement) -> u32 {
        if element.state.level < self.completion_level {
            return 0;
        }
        let mut points = self.completion_points;
        if element.state.grade >= self.master_grade {
            points += self.master_points;
        }
        points
    }
}

/// Known input signature of the attract-mode demo.
///
/// A demo run always ends the same way, so the last `window` entries of the
/// input history are compared against the last `window` entries of the
/// reference sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemoSignature {
    sequence: Vec<InputHistoryElement>,
    window: usize,
}

impl DemoSignature {
    pub fn new(sequence: Vec<InputHistoryElement>, window: usize) -> Result<Self, HistoryError> {
        if window == 0 || window > sequence.len() {
            return Err(HistoryError::InvalidDemoWindow {
                window,
                len: sequence.len(),
            });
        }
        Ok(Self { sequence, window })
    }

    pub fn sequence(&self) -> &[InputHistoryElement] {
        &self.sequence
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Whether the most recent inputs match the demo exactly
    pub fn matches(&self, inputs: &InputHistory) -> bool {
        if self.window == 0 || inputs.count() < self.window {
            return false;
        }
        match self.sequence.len().checked_sub(self.window) {
            Some(start) => inputs.recent(self.window) == &self.sequence[start..],
            None => false,
        }
    }
}

/// Ring buffer of finished games. Survives game resets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameHistory {
    buffer: RingBuffer<GameHistoryElement>,
}

impl Default for GameHistory {
    fn default() -> Self {
        Self::new(MAX_GAME_HISTORY_COUNT)
    }
}

impl GameHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: RingBuffer::new(capacity),
        }
    }

    pub fn push(&mut self, element: GameHistoryElement) {
        self.buffer.push(element);
    }

    /// Game at logical position `index`
    pub fn get(&self, index: usize) -> Result<&GameHistoryElement, HistoryError> {
        self.buffer.get(index)
    }

    /// Games currently held
    pub fn count(&self) -> usize {
        self.buffer.count()
    }

    /// Games ever pushed
    pub fn total_pushes(&self) -> usize {
        self.buffer.total_pushes()
    }

    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    pub fn oldest_index(&self) -> usize {
        self.buffer.oldest_index()
    }

    pub fn latest(&self) -> Option<&GameHistoryElement> {
        self.buffer.latest()
    }

    /// Live games, oldest first
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &GameHistoryElement> + '_ {
        self.buffer.iter()
    }

    /// Mean of `projection` over the live games; `None` when there are none
    pub fn average<F>(&self, projection: F) -> Option<f64>
    where
        F: Fn(&GameHistoryElement) -> f64,
    {
        self.average_where(|_| true, projection)
    }

    /// Mean of `projection` over the live games accepted by `filter`
    pub fn average_where<P, F>(&self, filter: P, projection: F) -> Option<f64>
    where
        P: Fn(&GameHistoryElement) -> bool,
        F: Fn(&GameHistoryElement) -> f64,
    {
        let (sum, n) = self
            .buffer
            .iter()
            .filter(|element| filter(element))
            .fold((0.0, 0usize), |(sum, n), element| (sum + projection(element), n + 1));
        (n > 0).then(|| sum / n as f64)
    }

    pub fn average_death_level(&self) -> Option<f64> {
        self.average(|element| f64::from(element.state.level))
    }

    pub fn average_final_grade(&self) -> Option<f64> {
        self.average(|element| f64::from(element.state.grade.0))
    }

    /// Average final grade of the live games played in `mode`
    pub fn average_final_grade_for(&self, mode: GameMode) -> Option<f64> {
        self.average_where(
            |element| element.game_mode == mode,
            |element| f64::from(element.state.grade.0),
        )
    }

    /// Weighted count of completions over the live games
    pub fn carnival_score(&self, weights: &CarnivalWeights) -> u32 {
        self.buffer.iter().map(|element| weights.score(element)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::PlayPhase;

    fn finished(level: i32, grade: i32, mode: u16) -> GameHistoryElement {
        GameHistoryElement {
            state: Snapshot {
                state: PlayPhase::GameOver,
                level,
                timer: level * 40,
                grade: Grade(grade),
                game_mode: GameMode(mode),
                ..Snapshot::default()
            },
            game_mode: GameMode(mode),
        }
    }

    #[test]
    fn test_default_capacity() {
        let history = GameHistory::default();
        assert_eq!(history.capacity(), MAX_GAME_HISTORY_COUNT);
        assert_eq!(history.count(), 0);
        assert!(history.latest().is_none());
    }

    #[test]
    fn test_eviction_keeps_total_count() {
        let mut history = GameHistory::default();
        for level in 0..70 {
            history.push(finished(level, 0, 0));
        }
        assert_eq!(history.count(), 64);
        assert_eq!(history.total_pushes(), 70);
        assert_eq!(history.oldest_index(), 6);
        assert!(history.get(5).is_err());
        assert_eq!(history.get(6).map(|e| e.state.level), Ok(6));
        assert_eq!(history.get(69).map(|e| e.state.level), Ok(69));
        assert!(history.get(70).is_err());
    }

    #[test]
    fn test_averages_use_live_window_only() {
        let mut history = GameHistory::new(2);
        assert_eq!(history.average_death_level(), None);

        history.push(finished(900, 0, 0));
        history.push(finished(100, 4, 0));
        history.push(finished(300, 8, 0));

        assert_eq!(history.average_death_level(), Some(200.0));
        assert_eq!(history.average_final_grade(), Some(6.0));
    }

    #[test]
    fn test_average_for_mode() {
        let mut history = GameHistory::default();
        history.push(finished(500, 10, 1));
        history.push(finished(500, 20, 2));
        history.push(finished(500, 30, 1));

        assert_eq!(history.average_final_grade_for(GameMode(1)), Some(20.0));
        assert_eq!(history.average_final_grade_for(GameMode(7)), None);
    }

    #[test]
    fn test_carnival_score() {
        let weights = CarnivalWeights::default();
        let mut history = GameHistory::default();
        history.push(finished(450, 31, 0)); // died early: 0
        history.push(finished(999, 20, 0)); // completion: 1
        history.push(finished(999, 31, 0)); // S9 completion: 3
        assert_eq!(history.carnival_score(&weights), 4);

        let flat = CarnivalWeights {
            master_points: 0,
            ..weights
        };
        assert_eq!(history.carnival_score(&flat), 2);
    }

    #[test]
    fn test_carnival_score_ignores_evicted_games() {
        let mut history = GameHistory::new(1);
        history.push(finished(999, 31, 0));
        history.push(finished(10, 0, 0));
        assert_eq!(history.carnival_score(&CarnivalWeights::default()), 0);
    }

    fn demo() -> DemoSignature {
        let sequence = (0..5)
            .map(|level| InputHistoryElement {
                level,
                tick: level * 50,
            })
            .collect();
        DemoSignature::new(sequence, 3).unwrap()
    }

    #[test]
    fn test_demo_signature_validation() {
        let one = vec![InputHistoryElement::default()];
        assert!(DemoSignature::new(one.clone(), 1).is_ok());
        assert!(matches!(
            DemoSignature::new(one.clone(), 0),
            Err(HistoryError::InvalidDemoWindow { window: 0, len: 1 })
        ));
        assert!(DemoSignature::new(one, 2).is_err());
        assert!(DemoSignature::new(Vec::new(), 1).is_err());
    }

    #[test]
    fn test_demo_exact_match() {
        let signature = demo();
        let mut inputs = InputHistory::new(16);
        // Unrelated inputs before the demo tail do not matter.
        inputs.push(40, 7);
        for level in 2..5 {
            inputs.push(level, level * 50);
        }
        assert!(signature.matches(&inputs));
    }

    #[test]
    fn test_demo_single_deviation() {
        let signature = demo();
        for deviate in 2..5 {
            let mut inputs = InputHistory::new(16);
            for level in 2..5 {
                let tick = if level == deviate { level * 50 + 1 } else { level * 50 };
                inputs.push(level, tick);
            }
            assert!(!signature.matches(&inputs), "deviation at level {deviate}");
        }
    }

    #[test]
    fn test_demo_needs_full_window() {
        let signature = demo();
        let mut inputs = InputHistory::new(16);
        inputs.push(3, 150);
        inputs.push(4, 200);
        assert!(!signature.matches(&inputs));
    }
}
