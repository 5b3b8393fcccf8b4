//! Tracker options and configuration file loading
//!
//! The configuration file is line based:
//!
//! ```text
//! # comments start with '#'
//! OPTIONS=section_length:100,level_max:999,!skip_demo_games
//! OPTIONS=gold_rule:tetris:2
//! DEMO=0@60,1@95,2@130
//! DEMO_WINDOW=2
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::history::{
    CarnivalWeights, DEFAULT_INPUT_HISTORY_CAPACITY, DemoSignature, InputHistoryElement,
    MAX_GAME_HISTORY_COUNT,
};
use crate::pb::GoldRule;
use crate::section::{DEFAULT_LEVEL_MAX, DEFAULT_SECTION_LENGTH};
use crate::snapshot::Grade;

/// Options parsing error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionsError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Unknown option: {0}")]
    UnknownOption(String),

    #[error("Invalid value '{1}' for option '{0}'")]
    InvalidValue(String, String),

    #[error("Missing value for option '{0}'")]
    MissingValue(String),

    #[error("Invalid demo signature: {0}")]
    InvalidDemo(String),
}

/// Everything a tracker can be tuned with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerOptions {
    /// Levels per section
    pub section_length: i32,
    /// Final level of a completed game
    pub level_max: i32,
    pub game_history_capacity: usize,
    pub input_history_capacity: usize,
    pub gold_rule: GoldRule,
    /// Keep recognised demo games out of the PB table and game history
    pub skip_demo_games: bool,
    /// Attract-mode signature; without one no game is treated as a demo
    pub demo: Option<DemoSignature>,
    pub carnival: CarnivalWeights,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            section_length: DEFAULT_SECTION_LENGTH,
            level_max: DEFAULT_LEVEL_MAX,
            game_history_capacity: MAX_GAME_HISTORY_COUNT,
            input_history_capacity: DEFAULT_INPUT_HISTORY_CAPACITY,
            gold_rule: GoldRule::Fastest,
            skip_demo_games: true,
            demo: None,
            carnival: CarnivalWeights::default(),
        }
    }
}

impl TrackerOptions {
    /// Load options from a file
    pub fn load_from_file(path: &Path) -> Result<Self, OptionsError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| OptionsError::Io(e.to_string()))?;

        Self::parse_config(&contents)
    }

    /// Save options to a file
    pub fn save_to_file(&self, path: &Path) -> Result<(), OptionsError> {
        std::fs::write(path, self.to_config_string()).map_err(|e| OptionsError::Io(e.to_string()))
    }

    /// Parse options from a config string
    pub fn parse_config(contents: &str) -> Result<Self, OptionsError> {
        let mut options = Self::default();
        let mut demo_sequence: Option<Vec<InputHistoryElement>> = None;
        let mut demo_window: Option<usize> = None;

        for line in contents.lines() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(opts) = line.strip_prefix("OPTIONS=") {
                for opt in opts.split(',') {
                    let opt = opt.trim();
                    if !opt.is_empty() {
                        options.parse_option(opt)?;
                    }
                }
            } else if let Some(demo) = line.strip_prefix("DEMO=") {
                demo_sequence = Some(parse_demo_sequence(demo)?);
            } else if let Some(window) = line.strip_prefix("DEMO_WINDOW=") {
                let window = window.trim();
                demo_window = Some(window.parse().map_err(|_| {
                    OptionsError::InvalidValue("DEMO_WINDOW".to_string(), window.to_string())
                })?);
            } else {
                return Err(OptionsError::UnknownOption(line.to_string()));
            }
        }

        match (demo_sequence, demo_window) {
            (Some(sequence), window) => {
                let window = window.unwrap_or(sequence.len());
                let signature = DemoSignature::new(sequence, window)
                    .map_err(|e| OptionsError::InvalidDemo(e.to_string()))?;
                options.demo = Some(signature);
            }
            (None, Some(_)) => {
                return Err(OptionsError::InvalidDemo(
                    "DEMO_WINDOW given without DEMO".to_string(),
                ));
            }
            (None, None) => {}
        }

        options.validate()?;
        Ok(options)
    }

    /// Check value ranges the parser cannot see on its own
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.section_length <= 0 {
            return Err(OptionsError::InvalidValue(
                "section_length".to_string(),
                self.section_length.to_string(),
            ));
        }
        if self.game_history_capacity == 0 {
            return Err(OptionsError::InvalidValue(
                "game_history".to_string(),
                "0".to_string(),
            ));
        }
        if self.input_history_capacity == 0 {
            return Err(OptionsError::InvalidValue(
                "input_history".to_string(),
                "0".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse a single option
    fn parse_option(&mut self, opt: &str) -> Result<(), OptionsError> {
        if let Some((key, value)) = opt.split_once(':') {
            return self.set_option(key.trim(), Some(value.trim()));
        }
        if let Some((key, value)) = opt.split_once('=') {
            return self.set_option(key.trim(), Some(value.trim()));
        }

        let (negated, name) = if let Some(name) = opt.strip_prefix('!') {
            (true, name)
        } else if let Some(name) = opt.strip_prefix("no") {
            (true, name)
        } else {
            (false, opt)
        };
        self.set_bool_option(name, !negated)
    }

    fn set_bool_option(&mut self, name: &str, value: bool) -> Result<(), OptionsError> {
        match name {
            "skip_demo_games" => self.skip_demo_games = value,
            _ => return Err(OptionsError::UnknownOption(name.to_string())),
        }
        Ok(())
    }

    fn set_option(&mut self, name: &str, value: Option<&str>) -> Result<(), OptionsError> {
        let value = value.ok_or_else(|| OptionsError::MissingValue(name.to_string()))?;
        if value.is_empty() {
            return Err(OptionsError::MissingValue(name.to_string()));
        }

        match name {
            "section_length" => self.section_length = parse_number(name, value)?,
            "level_max" => self.level_max = parse_number(name, value)?,
            "game_history" => self.game_history_capacity = parse_number(name, value)?,
            "input_history" => self.input_history_capacity = parse_number(name, value)?,
            "gold_rule" => {
                self.gold_rule = match value.to_lowercase().as_str() {
                    "fastest" => GoldRule::Fastest,
                    other => match other.strip_prefix("tetris:") {
                        Some(min) => GoldRule::MinTetrises(parse_number(name, min)?),
                        None => {
                            return Err(OptionsError::InvalidValue(
                                name.to_string(),
                                value.to_string(),
                            ));
                        }
                    },
                };
            }
            "skip_demo_games" => {
                self.skip_demo_games = match value.to_lowercase().as_str() {
                    "true" | "yes" | "1" => true,
                    "false" | "no" | "0" => false,
                    _ => {
                        return Err(OptionsError::InvalidValue(
                            name.to_string(),
                            value.to_string(),
                        ));
                    }
                };
            }
            "carnival_completion_level" => {
                self.carnival.completion_level = parse_number(name, value)?;
            }
            "carnival_completion_points" => {
                self.carnival.completion_points = parse_number(name, value)?;
            }
            "carnival_master_grade" => {
                self.carnival.master_grade = Grade(parse_number(name, value)?);
            }
            "carnival_master_points" => {
                self.carnival.master_points = parse_number(name, value)?;
            }
            _ => return Err(OptionsError::UnknownOption(name.to_string())),
        }
        Ok(())
    }

    /// Render the options in the format `parse_config` reads
    pub fn to_config_string(&self) -> String {
        let mut lines = Vec::new();
        lines.push("# tap tracker options".to_string());
        lines.push(format!(
            "OPTIONS=section_length:{},level_max:{},game_history:{},input_history:{}",
            self.section_length,
            self.level_max,
            self.game_history_capacity,
            self.input_history_capacity
        ));

        let gold_rule = match self.gold_rule {
            GoldRule::Fastest => "fastest".to_string(),
            GoldRule::MinTetrises(min) => format!("tetris:{}", min),
        };
        let demo_flag = if self.skip_demo_games {
            "skip_demo_games"
        } else {
            "!skip_demo_games"
        };
        lines.push(format!("OPTIONS=gold_rule:{},{}", gold_rule, demo_flag));

        lines.push(format!(
            "OPTIONS=carnival_completion_level:{},carnival_completion_points:{},carnival_master_grade:{},carnival_master_points:{}",
            self.carnival.completion_level,
            self.carnival.completion_points,
            self.carnival.master_grade.0,
            self.carnival.master_points
        ));

        if let Some(demo) = &self.demo {
            let sequence: Vec<String> = demo
                .sequence()
                .iter()
                .map(|e| format!("{}@{}", e.level, e.tick))
                .collect();
            lines.push(format!("DEMO={}", sequence.join(",")));
            lines.push(format!("DEMO_WINDOW={}", demo.window()));
        }

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}

fn parse_number<T: core::str::FromStr>(name: &str, value: &str) -> Result<T, OptionsError> {
    value
        .parse()
        .map_err(|_| OptionsError::InvalidValue(name.to_string(), value.to_string()))
}

/// Parse `level@tick` entries separated by commas
fn parse_demo_sequence(line: &str) -> Result<Vec<InputHistoryElement>, OptionsError> {
    line.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (level, tick) = entry
                .split_once('@')
                .ok_or_else(|| OptionsError::InvalidDemo(format!("expected level@tick, got '{}'", entry)))?;
            Ok(InputHistoryElement {
                level: parse_number("DEMO", level.trim())?,
                tick: parse_number("DEMO", tick.trim())?,
            })
        })
        .collect()
}
