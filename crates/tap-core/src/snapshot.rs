//! Polled game state
//!
//! One [`Snapshot`] is captured per tick from the running game. The raw
//! record shared by the acquisition side is [`RawSnapshot`]; everything in
//! the engine works on the classified form.

use core::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// Ticks per second of the observed game (it polls once per video frame)
pub const TICKS_PER_SECOND: i32 = 60;

/// Number of entries in the grade display table
pub const GRADE_COUNT: usize = 32;

/// Internal grade value of S9, the highest non-GM grade
pub const MASTER_S9_GRADE: i32 = 31;

const DISPLAYED_GRADE: [&str; GRADE_COUNT] = [
    "9", "8", "7", "6", "5", "4-", "4+", "3-", "3+", "2-", "2", "2+", "1-", "1", "1+", "S1-",
    "S1", "S1+", "S2", "S3", "S4-", "S4", "S4+", "S5-", "S5+", "S6-", "S6+", "S7-", "S7+", "S8-",
    "S8+", "S9",
];

/// Play-state classification of the raw state code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter)]
pub enum PlayPhase {
    #[default]
    None,
    Start,
    Active,
    Locking,
    LineClear,
    Entry,
    GameOver,
    Idle,
    Fading,
    Completion,
    Startup,
    Unknown(u8),
}

impl PlayPhase {
    /// Classify a raw state code read from the game
    pub fn classify(code: u8) -> Self {
        match code {
            0 => PlayPhase::None,
            1 => PlayPhase::Start,
            2 => PlayPhase::Active,
            3 => PlayPhase::Locking,
            4 => PlayPhase::LineClear,
            5 => PlayPhase::Entry,
            7 => PlayPhase::GameOver,
            10 => PlayPhase::Idle,
            11 => PlayPhase::Fading,
            13 => PlayPhase::Completion,
            71 => PlayPhase::Startup,
            other => PlayPhase::Unknown(other),
        }
    }

    /// Raw state code for this phase
    pub fn code(self) -> u8 {
        match self {
            PlayPhase::None => 0,
            PlayPhase::Start => 1,
            PlayPhase::Active => 2,
            PlayPhase::Locking => 3,
            PlayPhase::LineClear => 4,
            PlayPhase::Entry => 5,
            PlayPhase::GameOver => 7,
            PlayPhase::Idle => 10,
            PlayPhase::Fading => 11,
            PlayPhase::Completion => 13,
            PlayPhase::Startup => 71,
            PlayPhase::Unknown(code) => code,
        }
    }

    /// Whether a game is in progress.
    ///
    /// Everything except `None`, `Idle` and `Startup` counts, including
    /// codes we do not recognise.
    pub fn is_playing(self) -> bool {
        !matches!(self, PlayPhase::None | PlayPhase::Idle | PlayPhase::Startup)
    }
}

/// Master-roll condition flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
pub enum MasterRollFlags {
    Neutral,
    Pass1,
    Pass2,
    Success,
    Failure,
    Unknown(u8),
}

/// Same as a zeroed raw code, which is not a recognised flag
impl Default for MasterRollFlags {
    fn default() -> Self {
        MasterRollFlags::Unknown(0)
    }
}

impl MasterRollFlags {
    pub fn from_code(code: u8) -> Self {
        match code {
            48 => MasterRollFlags::Neutral,
            49 => MasterRollFlags::Pass1,
            51 => MasterRollFlags::Pass2,
            127 => MasterRollFlags::Success,
            17 | 19 | 31 => MasterRollFlags::Failure,
            other => MasterRollFlags::Unknown(other),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            MasterRollFlags::Neutral => 48,
            MasterRollFlags::Pass1 => 49,
            MasterRollFlags::Pass2 => 51,
            MasterRollFlags::Success => 127,
            MasterRollFlags::Failure => 31,
            MasterRollFlags::Unknown(code) => code,
        }
    }
}

/// Internal grade value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Grade(pub i32);

impl Grade {
    /// Display label ("9" through "S9"), if the value is in the grade table
    pub fn label(self) -> Option<&'static str> {
        usize::try_from(self.0)
            .ok()
            .and_then(|i| DISPLAYED_GRADE.get(i).copied())
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.label() {
            Some(label) => f.write_str(label),
            None => write!(f, "{}", self.0),
        }
    }
}

/// Ruleset/variant identifier, used as the PB table key
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct GameMode(pub u16);

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

/// Fixed-layout record written by the process that reads the game's memory
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawSnapshot {
    pub state: u8,
    pub mroll_flags: u8,
    pub game_mode: u16,
    pub level: i32,
    pub timer: i32,
    pub grade: i32,
}

/// One polled observation of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub state: PlayPhase,
    pub level: i32,
    pub timer: i32,
    pub grade: Grade,
    pub mroll_flags: MasterRollFlags,
    pub game_mode: GameMode,
}

impl Snapshot {
    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    /// Master-roll eligibility.
    ///
    /// Only an explicit failure flag (or a code we cannot read) loses it;
    /// level and grade play no part.
    pub fn is_master_eligible(&self) -> bool {
        matches!(
            self.mroll_flags,
            MasterRollFlags::Neutral
                | MasterRollFlags::Pass1
                | MasterRollFlags::Pass2
                | MasterRollFlags::Success
        )
    }
}

impl From<RawSnapshot> for Snapshot {
    fn from(raw: RawSnapshot) -> Self {
        Self {
            state: PlayPhase::classify(raw.state),
            level: raw.level,
            timer: raw.timer,
            grade: Grade(raw.grade),
            mroll_flags: MasterRollFlags::from_code(raw.mroll_flags),
            game_mode: GameMode(raw.game_mode),
        }
    }
}

impl From<Snapshot> for RawSnapshot {
    fn from(snapshot: Snapshot) -> Self {
        Self {
            state: snapshot.state.code(),
            mroll_flags: snapshot.mroll_flags.code(),
            game_mode: snapshot.game_mode.0,
            level: snapshot.level,
            timer: snapshot.timer,
            grade: snapshot.grade.0,
        }
    }
}

/// Number of ticks in `seconds` of game time
pub fn ticks_from_seconds(seconds: i32) -> i32 {
    seconds.saturating_mul(TICKS_PER_SECOND)
}

/// Format a tick count as `m:ss:cc` (centiseconds)
pub fn format_ticks(ticks: i32) -> String {
    let sign = if ticks < 0 { "-" } else { "" };
    let ticks = ticks.unsigned_abs();
    let per_second = TICKS_PER_SECOND.unsigned_abs();
    let minutes = ticks / (per_second * 60);
    let seconds = (ticks / per_second) % 60;
    let centis = (ticks % per_second) * 100 / per_second;
    format!("{}{}:{:02}:{:02}", sign, minutes, seconds, centis)
}
