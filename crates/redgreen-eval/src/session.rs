//! Game session state machine.
//!
//! A session moves through `red → green → refactor → complete` for each
//! level. Every transition takes the session by value and returns the next
//! one; nothing here touches the interpreter.

use serde::{Deserialize, Serialize};

use crate::coverage::CoverageReport;
use crate::test_runner::{all_pass, TestCase, TestVerdict};

/// Points for turning a level green.
pub const GREEN_POINTS: u32 = 100;
/// Bonus for a refactor that fits the line budget.
pub const REFACTOR_BONUS: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Red,
    Green,
    Refactor,
    Complete,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Red => "red",
            Self::Green => "green",
            Self::Refactor => "refactor",
            Self::Complete => "complete",
        };
        f.write_str(name)
    }
}

/// The parts of a level definition the state machine needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelRules {
    pub id: u32,
    /// Line budget of the refactor challenge, if the level has one.
    #[serde(default)]
    pub refactor_max_lines: Option<usize>,
}

impl LevelRules {
    pub fn has_refactor(&self) -> bool {
        self.refactor_max_lines.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSession {
    /// 1-based level number.
    pub level: u32,
    pub phase: Phase,
    pub score: u32,
    pub completed_levels: Vec<u32>,
    pub user_tests: Vec<TestCase>,
    pub last_results: Vec<TestVerdict>,
    pub coverage: Option<CoverageReport>,
    pub chaos_tested: bool,
}

impl Default for GameSession {
    fn default() -> Self {
        Self {
            level: 1,
            phase: Phase::Red,
            score: 0,
            completed_levels: Vec::new(),
            user_tests: Vec::new(),
            last_results: Vec::new(),
            coverage: None,
            chaos_tested: false,
        }
    }
}

impl GameSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Manual phase step: red → green, and green → refactor when the level
    /// has a refactor challenge. Other phases are unchanged.
    pub fn advance_phase(mut self, has_refactor: bool) -> Self {
        self.phase = match self.phase {
            Phase::Red => Phase::Green,
            Phase::Green if has_refactor => Phase::Refactor,
            other => other,
        };
        self
    }

    /// Store a test run and apply its scoring.
    ///
    /// `source` is the code the run was made against; the refactor bonus is
    /// judged on its non-blank line count.
    pub fn record_run(
        mut self,
        source: &str,
        results: Vec<TestVerdict>,
        coverage: CoverageReport,
        rules: &LevelRules,
    ) -> Self {
        let passing = !results.is_empty() && all_pass(&results);
        self.last_results = results;
        self.coverage = Some(coverage);
        if !passing {
            return self;
        }
        match self.phase {
            Phase::Green => {
                self.score += GREEN_POINTS;
                if rules.has_refactor() {
                    self.phase = Phase::Refactor;
                } else {
                    self.complete(rules.id);
                }
            }
            Phase::Refactor => {
                if rules
                    .refactor_max_lines
                    .is_some_and(|max| count_code_lines(source) <= max)
                {
                    self.score += REFACTOR_BONUS;
                }
                self.complete(rules.id);
            }
            Phase::Red | Phase::Complete => {}
        }
        self
    }

    fn complete(&mut self, level_id: u32) {
        self.phase = Phase::Complete;
        if !self.completed_levels.contains(&level_id) {
            self.completed_levels.push(level_id);
        }
    }

    /// Move to the next level unless this is the last of `total_levels`.
    pub fn next_level(mut self, total_levels: u32) -> Self {
        if self.level < total_levels {
            self.level += 1;
            self = self.reset_level();
        }
        self
    }

    /// Restart the current level from red, keeping score and progress.
    pub fn reset_level(mut self) -> Self {
        self.phase = Phase::Red;
        self.last_results.clear();
        self.coverage = None;
        self.user_tests.clear();
        self.chaos_tested = false;
        self
    }

    pub fn add_user_test(mut self, test: TestCase) -> Self {
        self.user_tests.push(test);
        self
    }

    pub fn mark_chaos_tested(mut self) -> Self {
        self.chaos_tested = true;
        self
    }

    /// The level's own tests followed by the learner's shield tests.
    pub fn all_tests(&self, level_tests: &[TestCase]) -> Vec<TestCase> {
        level_tests
            .iter()
            .chain(&self.user_tests)
            .cloned()
            .collect()
    }
}

/// Number of lines with any non-whitespace content.
pub fn count_code_lines(source: &str) -> usize {
    source.lines().filter(|l| !l.trim().is_empty()).count()
}
