//! Redgreen sandboxed evaluator and game engine.
//!
//! Learner source is parsed and run by a tree-walking interpreter that only
//! exposes an allow-listed standard library, under gas and call-depth
//! budgets. On top of it sit the test runner, the chaos tester, the coverage
//! estimator and the game session state machine.
//!
//! ```
//! use redgreen_eval::{run_all, TestCase, Value};
//!
//! let test = TestCase::shield("1-1", "calculateThrust", "5", "50").unwrap();
//! let verdicts = run_all("function calculateThrust(p) { return p * 10; }", &[test]);
//! assert!(verdicts[0].passed);
//! assert_eq!(verdicts[0].received, Value::Number(50.0));
//! ```

pub mod chaos;
pub mod config;
pub mod coverage;
pub mod env;
pub mod equality;
pub mod error;
pub mod evaluator;
pub mod invocation;
pub mod ops;
pub mod property;
pub mod sandbox;
pub mod session;
pub mod shield;
pub mod stdlib;
mod stmt;
pub mod test_runner;
pub mod value;

pub use chaos::{
    chaos_inputs, run_chaos_test, run_chaos_test_with_config, run_chaos_test_with_input,
    run_chaos_test_with_rng, ChaosOutcome, ChaosVerdict, CHAOS_TEST_ID,
};
pub use config::SandboxConfig;
pub use coverage::{estimate, CoverageReport, CoverageTier};
pub use equality::deep_equal;
pub use error::{EvalError, EvalResult};
pub use evaluator::Evaluator;
pub use invocation::{parse_invocation, ExtractedInvocation};
pub use sandbox::{compile_and_extract, compile_and_extract_with_config, CompiledFunction};
pub use session::{count_code_lines, GameSession, LevelRules, Phase};
pub use shield::function_name_of;
pub use test_runner::{
    all_pass, failing, format_result, generate_diff, run_all, run_all_with_config, run_test,
    Diff, DiffKind, TestCase, TestRunSummary, TestVerdict,
};
pub use value::Value;
