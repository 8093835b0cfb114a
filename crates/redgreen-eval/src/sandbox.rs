//! Compile learner source and extract a named function from it.

use redgreen_parser::parse_program;
use redgreen_types::SourceFile;
use tracing::{debug, trace};

use crate::config::SandboxConfig;
use crate::error::EvalResult;
use crate::evaluator::Evaluator;
use crate::value::Value;

/// File name used in diagnostics for learner source.
const SOURCE_NAME: &str = "solution.js";

/// A learner function together with the interpreter state it closes over.
pub struct CompiledFunction {
    evaluator: Evaluator,
    function: Value,
    name: String,
}

impl CompiledFunction {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Call the function with a fresh gas budget.
    pub fn call(&mut self, args: Vec<Value>) -> EvalResult<Value> {
        self.evaluator.reset_budget();
        let result = self
            .evaluator
            .call_function(&self.function, Value::Undefined, args);
        trace!(function = %self.name, gas_used = self.evaluator.gas, "call finished");
        result
    }

    /// Console output captured so far.
    pub fn log_output(&self) -> &[String] {
        &self.evaluator.log_output
    }
}

impl std::fmt::Debug for CompiledFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledFunction")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Compile `source` with the default budgets and return the global function
/// called `function_name`.
pub fn compile_and_extract(source: &str, function_name: &str) -> Option<CompiledFunction> {
    compile_and_extract_with_config(source, function_name, SandboxConfig::default())
}

/// Compile `source` and return the global function called `function_name`.
///
/// `None` when the source does not parse, when its top level throws or runs
/// out of budget, or when the name is not bound to a function.
pub fn compile_and_extract_with_config(
    source: &str,
    function_name: &str,
    config: SandboxConfig,
) -> Option<CompiledFunction> {
    let file = SourceFile::new(SOURCE_NAME, source);
    let parsed = parse_program(&file);
    if let Some(first) = parsed.errors.errors.first() {
        debug!(
            errors = parsed.errors.errors.len(),
            first = %first.message,
            "learner source failed to compile"
        );
        return None;
    }
    let program = parsed.program?;

    let mut evaluator = Evaluator::new(config);
    if let Err(err) = evaluator.run_program(&program) {
        debug!(error = %err, "learner top level failed");
        return None;
    }
    match evaluator.global_binding(function_name) {
        Some(function @ Value::Function(_)) => Some(CompiledFunction {
            evaluator,
            function,
            name: function_name.to_string(),
        }),
        _ => {
            debug!(function_name, "function not found in learner source");
            None
        }
    }
}
