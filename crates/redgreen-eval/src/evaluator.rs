//! Core expression evaluator and function calls.

use std::rc::Rc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use redgreen_types::ast::*;

use crate::config::SandboxConfig;
use crate::env::{AssignError, Env, ScopeKind};
use crate::error::{EvalError, EvalResult};
use crate::ops;
use crate::property::{get_property, has_property, set_property};
use crate::stdlib;
use crate::value::{Closure, FunctionKind, PropertyMap, Value};

/// Seed for `Math.random`, so that every run of the same program is
/// reproducible.
const RANDOM_SEED: u64 = 0x5EED_CAFE;

/// Maximum number of captured `console` lines.
const MAX_LOG_LINES: usize = 1_000;

/// The core evaluator: walks AST nodes and produces Values.
pub struct Evaluator {
    /// The global scope, holding the allow-listed globals and the learner's
    /// top-level declarations.
    pub global: Env,
    /// Current scope.
    pub(crate) env: Env,
    /// Current `this`.
    pub(crate) this: Value,
    /// Gas counter: limits total steps to prevent infinite loops.
    pub gas: u64,
    /// Budgets for this evaluator.
    pub config: SandboxConfig,
    /// Depth of learner function calls currently on the stack.
    call_depth: usize,
    /// Nested expression and statement evaluations currently on the stack.
    eval_depth: usize,
    /// Array elements and string chars allocated since the last reset.
    allocated: usize,
    /// Captured output from `console.log` and friends.
    pub log_output: Vec<String>,
    rng: StdRng,
}

/// Assignable location.
enum Place {
    Binding(String),
    Property(Value, String),
}

impl Evaluator {
    /// Create an evaluator whose global scope holds only the allow-listed
    /// globals.
    pub fn new(config: SandboxConfig) -> Self {
        let global = Env::new_global();
        stdlib::install(&global);
        Self {
            env: global.clone(),
            global,
            this: Value::Undefined,
            gas: 0,
            config,
            call_depth: 0,
            eval_depth: 0,
            allocated: 0,
            log_output: Vec::new(),
            rng: StdRng::seed_from_u64(RANDOM_SEED),
        }
    }

    /// Consume one unit of gas. Returns error if exhausted.
    pub(crate) fn tick(&mut self) -> EvalResult<()> {
        self.consume_gas(1)
    }

    /// Consume `units` of gas.
    pub fn consume_gas(&mut self, units: u64) -> EvalResult<()> {
        self.gas = self.gas.saturating_add(units);
        if self.gas > self.config.gas_limit {
            Err(EvalError::GasExhausted)
        } else {
            Ok(())
        }
    }

    /// Charge for a native operation that touches `elements` items.
    pub fn charge_bulk(&mut self, elements: usize) -> EvalResult<()> {
        self.consume_gas((elements / 64) as u64)
    }

    /// Charge for a freshly allocated array or string of `elements` items.
    pub fn charge_alloc(&mut self, elements: usize) -> EvalResult<()> {
        self.allocated = self.allocated.saturating_add(elements);
        if self.allocated > self.config.max_allocation {
            Err(EvalError::range_error("Memory budget exceeded"))
        } else {
            Ok(())
        }
    }

    /// Go one level deeper in the evaluator's recursion. Every successful
    /// call must be paired with [`Evaluator::ascend`].
    pub(crate) fn descend(&mut self) -> EvalResult<()> {
        if self.eval_depth >= self.config.max_eval_depth {
            return Err(EvalError::range_error("Maximum call stack size exceeded"));
        }
        self.eval_depth += 1;
        Ok(())
    }

    pub(crate) fn ascend(&mut self) {
        self.eval_depth -= 1;
    }

    /// Start a fresh budget for the next top-level call.
    pub fn reset_budget(&mut self) {
        self.gas = 0;
        self.call_depth = 0;
        self.eval_depth = 0;
        self.allocated = 0;
    }

    /// Next `Math.random()` value in `[0, 1)`.
    pub fn random(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// Record one line of learner console output.
    pub fn log(&mut self, line: String) {
        if self.log_output.len() < MAX_LOG_LINES {
            self.log_output.push(line);
        }
    }

    /// Look a global binding up by name.
    pub fn global_binding(&self, name: &str) -> Option<Value> {
        self.global.get(name)
    }

    /// Execute a whole program in the global scope.
    pub fn run_program(&mut self, program: &Program) -> EvalResult<()> {
        self.env = self.global.clone();
        self.hoist_declarations(&program.body);
        match self.exec_stmts(&program.body) {
            Ok(()) | Err(EvalError::Return(_)) => Ok(()),
            Err(EvalError::Break) => Err(EvalError::SyntaxError("Illegal break statement".into())),
            Err(EvalError::Continue) => Err(EvalError::SyntaxError(
                "Illegal continue statement".into(),
            )),
            Err(e) => Err(e),
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Expression evaluation
    // ══════════════════════════════════════════════════════════════════════

    /// Evaluate an expression to a Value.
    pub fn eval_expr(&mut self, expr: &Expr) -> EvalResult<Value> {
        self.tick()?;
        self.descend()?;
        let result = self.eval_expr_kind(expr);
        self.ascend();
        result
    }

    fn eval_expr_kind(&mut self, expr: &Expr) -> EvalResult<Value> {
        match &expr.kind {
            ExprKind::NumberLit(n) => Ok(Value::Number(*n)),
            ExprKind::StringLit(s) => Ok(Value::String(s.clone())),
            ExprKind::BoolLit(b) => Ok(Value::Bool(*b)),
            ExprKind::NullLit => Ok(Value::Null),
            ExprKind::TemplateLit(parts) => self.eval_template(parts),
            ExprKind::ArrayLit(elements) => self.eval_array_literal(elements),
            ExprKind::ObjectLit(entries) => self.eval_object_literal(entries),
            ExprKind::Function(decl) => Ok(self.eval_function_expr(decl)),

            ExprKind::Identifier(name) => self.lookup(name),
            ExprKind::This => Ok(self.this.clone()),

            ExprKind::Member {
                object,
                property,
                optional,
            } => self.eval_member(object, property, *optional),
            ExprKind::Call {
                callee,
                args,
                optional,
            } => self.eval_call(callee, args, *optional),
            ExprKind::New { callee, args } => self.eval_new(callee, args),
            ExprKind::OptionalChain(inner) => self.eval_optional_chain(inner),

            ExprKind::Unary { op, operand } => self.eval_unary(*op, operand),
            ExprKind::Update { op, prefix, target } => self.eval_update(*op, *prefix, target),
            ExprKind::Binary { left, op, right } => self.eval_binary(left, *op, right),
            ExprKind::Logical { left, op, right } => self.eval_logical(left, *op, right),
            ExprKind::Conditional {
                test,
                consequent,
                alternate,
            } => self.eval_conditional(test, consequent, alternate),
            ExprKind::Assign { target, op, value } => self.eval_assign(target, *op, value),
            ExprKind::Paren(inner) => self.eval_expr(inner),
        }
    }

    // ── Literals ──────────────────────────────────────────────────────────

    fn eval_template(&mut self, parts: &[TemplatePart]) -> EvalResult<Value> {
        let mut result = String::new();
        for part in parts {
            match part {
                TemplatePart::Literal(s) => result.push_str(s),
                TemplatePart::Expr(expr) => {
                    let val = self.eval_expr(expr)?;
                    result.push_str(&val.to_display_string());
                }
            }
            ops::check_string_len(&result)?;
        }
        self.charge_alloc(result.len())?;
        Ok(Value::String(result))
    }

    fn eval_array_literal(&mut self, elements: &[ArrayElement]) -> EvalResult<Value> {
        let mut values = Vec::with_capacity(elements.len());
        for element in elements {
            match element {
                ArrayElement::Expr(expr) => values.push(self.eval_expr(expr)?),
                ArrayElement::Spread(expr) => {
                    let spread = self.eval_expr(expr)?;
                    values.extend(self.iterate(&spread)?);
                }
            }
            ops::check_array_len(values.len())?;
        }
        self.charge_alloc(values.len())?;
        Ok(Value::array(values))
    }

    fn eval_object_literal(&mut self, entries: &[PropertyEntry]) -> EvalResult<Value> {
        let mut props = PropertyMap::new();
        for entry in entries {
            match entry {
                PropertyEntry::Field { key, value } => {
                    let val = self.eval_expr(value)?;
                    props.insert(key.clone(), val);
                }
                PropertyEntry::Spread(expr) => {
                    let source = self.eval_expr(expr)?;
                    for (key, val) in stdlib::object::own_entries(&source) {
                        props.insert(key, val);
                    }
                }
            }
        }
        Ok(Value::object(props))
    }

    fn eval_function_expr(&mut self, decl: &Rc<FunctionDecl>) -> Value {
        match (&decl.name, decl.is_arrow) {
            (Some(name), false) => {
                // A named function expression sees its own name.
                let scope = self.env.child(ScopeKind::Block);
                let closure = self.make_closure(decl, scope.clone());
                scope.define(&name.name, closure.clone(), false);
                closure
            }
            _ => self.make_closure(decl, self.env.clone()),
        }
    }

    pub(crate) fn make_closure(&self, decl: &Rc<FunctionDecl>, env: Env) -> Value {
        let this = decl.is_arrow.then(|| self.this.clone());
        Value::function(FunctionKind::Closure(Closure {
            decl: Rc::clone(decl),
            env,
            this,
        }))
    }

    // ── Identifiers & members ────────────────────────────────────────────

    fn lookup(&self, name: &str) -> EvalResult<Value> {
        self.env
            .get(name)
            .ok_or_else(|| EvalError::ReferenceError(format!("{name} is not defined")))
    }

    fn property_key(&mut self, property: &MemberProperty) -> EvalResult<String> {
        match property {
            MemberProperty::Named(ident) => Ok(ident.name.clone()),
            MemberProperty::Computed(expr) => Ok(self.eval_expr(expr)?.to_property_key()),
        }
    }

    fn eval_member(
        &mut self,
        object: &Expr,
        property: &MemberProperty,
        optional: bool,
    ) -> EvalResult<Value> {
        let obj = self.eval_expr(object)?;
        if optional && obj.is_nullish() {
            return Err(EvalError::ShortCircuit);
        }
        let key = self.property_key(property)?;
        get_property(&obj, &key)
    }

    fn eval_optional_chain(&mut self, inner: &Expr) -> EvalResult<Value> {
        match self.eval_expr(inner) {
            Err(EvalError::ShortCircuit) => Ok(Value::Undefined),
            other => other,
        }
    }

    // ── Calls ────────────────────────────────────────────────────────────

    fn eval_call(&mut self, callee: &Expr, args: &[Argument], optional: bool) -> EvalResult<Value> {
        let (func, this) = match &callee.kind {
            ExprKind::Member {
                object,
                property,
                optional: member_optional,
            } => {
                let obj = self.eval_expr(object)?;
                if *member_optional && obj.is_nullish() {
                    return Err(EvalError::ShortCircuit);
                }
                let key = self.property_key(property)?;
                (get_property(&obj, &key)?, obj)
            }
            _ => (self.eval_expr(callee)?, Value::Undefined),
        };
        if optional && func.is_nullish() {
            return Err(EvalError::ShortCircuit);
        }
        let args = self.eval_arguments(args)?;
        if !matches!(func, Value::Function(_)) {
            return Err(EvalError::type_error(format!(
                "{} is not a function",
                describe_callee(callee)
            )));
        }
        self.call_function(&func, this, args)
    }

    fn eval_new(&mut self, callee: &Expr, args: &[Argument]) -> EvalResult<Value> {
        let func = self.eval_expr(callee)?;
        let args = self.eval_arguments(args)?;
        match &func {
            Value::Function(f) if f.is_constructor() => self.construct(&func, args),
            _ => Err(EvalError::type_error(format!(
                "{} is not a constructor",
                describe_callee(callee)
            ))),
        }
    }

    pub(crate) fn eval_arguments(&mut self, args: &[Argument]) -> EvalResult<Vec<Value>> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            match arg {
                Argument::Expr(expr) => values.push(self.eval_expr(expr)?),
                Argument::Spread(expr) => {
                    let spread = self.eval_expr(expr)?;
                    values.extend(self.iterate(&spread)?);
                }
            }
        }
        Ok(values)
    }

    /// Items produced by `...value` or `for (x of value)`.
    pub fn iterate(&mut self, value: &Value) -> EvalResult<Vec<Value>> {
        let items: Vec<Value> = match value {
            Value::Array(items) => items.borrow().clone(),
            Value::String(s) => s.chars().map(|c| Value::String(c.to_string())).collect(),
            other => {
                return Err(EvalError::type_error(format!(
                    "{} is not iterable",
                    describe_value(other)
                )))
            }
        };
        self.charge_bulk(items.len())?;
        Ok(items)
    }

    /// Call any function value with an explicit `this`.
    pub fn call_function(
        &mut self,
        callee: &Value,
        this: Value,
        args: Vec<Value>,
    ) -> EvalResult<Value> {
        let Value::Function(func) = callee else {
            return Err(EvalError::type_error(format!(
                "{} is not a function",
                describe_value(callee)
            )));
        };
        self.tick()?;
        match &func.kind {
            FunctionKind::Native(native) => (native.call)(self, &this, &args),
            FunctionKind::Closure(closure) => self.call_closure(closure, this, args),
        }
    }

    /// `new callee(...args)`.
    pub fn construct(&mut self, callee: &Value, args: Vec<Value>) -> EvalResult<Value> {
        let Value::Function(func) = callee else {
            return Err(EvalError::type_error("value is not a constructor"));
        };
        match &func.kind {
            FunctionKind::Native(native) => (native.call)(self, &Value::Undefined, &args),
            FunctionKind::Closure(closure) => {
                let instance = Value::object(PropertyMap::new());
                let result = self.call_closure(closure, instance.clone(), args)?;
                match result {
                    Value::Object(_) | Value::Array(_) | Value::Function(_) => Ok(result),
                    _ => Ok(instance),
                }
            }
        }
    }

    fn call_closure(&mut self, closure: &Closure, this: Value, args: Vec<Value>) -> EvalResult<Value> {
        if self.call_depth >= self.config.max_call_depth {
            return Err(EvalError::range_error("Maximum call stack size exceeded"));
        }
        let scope = closure.env.child(ScopeKind::Function);
        let this = closure.this.clone().unwrap_or(this);
        let saved_env = std::mem::replace(&mut self.env, scope);
        let saved_this = std::mem::replace(&mut self.this, this);
        self.call_depth += 1;
        let result = self.run_function_body(&closure.decl, args);
        self.call_depth -= 1;
        self.env = saved_env;
        self.this = saved_this;
        result
    }

    fn run_function_body(&mut self, decl: &FunctionDecl, args: Vec<Value>) -> EvalResult<Value> {
        if !decl.is_arrow {
            self.env.define("arguments", Value::array(args.clone()), true);
        }
        self.bind_params(&decl.params, args)?;
        match &decl.body {
            FunctionBody::Expr(expr) => self.eval_expr(expr),
            FunctionBody::Block(block) => {
                self.hoist_declarations(&block.stmts);
                match self.exec_stmts(&block.stmts) {
                    Ok(()) => Ok(Value::Undefined),
                    Err(EvalError::Return(value)) => Ok(value),
                    Err(EvalError::Break | EvalError::Continue) => Err(EvalError::SyntaxError(
                        "Illegal break statement".into(),
                    )),
                    Err(e) => Err(e),
                }
            }
        }
    }

    fn bind_params(&mut self, params: &[Param], args: Vec<Value>) -> EvalResult<()> {
        let mut args = args.into_iter();
        for param in params {
            let value = if param.rest {
                Value::array(args.by_ref().collect())
            } else {
                match (args.next().unwrap_or_default(), &param.default) {
                    (Value::Undefined, Some(default)) => self.eval_expr(default)?,
                    (value, _) => value,
                }
            };
            self.env.define(&param.name.name, value, true);
        }
        Ok(())
    }

    // ── Operators ────────────────────────────────────────────────────────

    fn eval_unary(&mut self, op: UnaryOp, operand: &Expr) -> EvalResult<Value> {
        if op == UnaryOp::TypeOf {
            if let ExprKind::Identifier(name) = &operand.kind {
                // `typeof undeclared` is not an error.
                let value = self.env.get(name).unwrap_or_default();
                return Ok(Value::string(value.type_of()));
            }
        }
        let val = self.eval_expr(operand)?;
        Ok(match op {
            UnaryOp::Not => Value::Bool(!val.is_truthy()),
            UnaryOp::Neg => Value::Number(-val.to_number()),
            UnaryOp::Plus => Value::Number(val.to_number()),
            UnaryOp::TypeOf => Value::string(val.type_of()),
            UnaryOp::Void => Value::Undefined,
        })
    }

    fn eval_update(&mut self, op: UpdateOp, prefix: bool, target: &Expr) -> EvalResult<Value> {
        let place = self.resolve_place(target)?;
        let old = self.read_place(&place)?.to_number();
        let new = match op {
            UpdateOp::Increment => old + 1.0,
            UpdateOp::Decrement => old - 1.0,
        };
        self.write_place(&place, Value::Number(new))?;
        Ok(Value::Number(if prefix { new } else { old }))
    }

    fn eval_binary(&mut self, left: &Expr, op: BinOp, right: &Expr) -> EvalResult<Value> {
        let lv = self.eval_expr(left)?;
        let rv = self.eval_expr(right)?;
        self.apply_binary(op, &lv, &rv)
    }

    fn apply_binary(&mut self, op: BinOp, lv: &Value, rv: &Value) -> EvalResult<Value> {
        match op {
            BinOp::In => {
                let key = lv.to_property_key();
                Ok(Value::Bool(has_property(rv, &key)?))
            }
            BinOp::InstanceOf => Ok(Value::Bool(ops::instance_of(lv, rv)?)),
            _ => {
                let result = ops::binary(op, lv, rv)?;
                if let Value::String(s) = &result {
                    self.charge_alloc(s.len())?;
                }
                Ok(result)
            }
        }
    }

    fn eval_logical(&mut self, left: &Expr, op: LogicalOp, right: &Expr) -> EvalResult<Value> {
        let lv = self.eval_expr(left)?;
        let short_circuit = match op {
            LogicalOp::And => !lv.is_truthy(),
            LogicalOp::Or => lv.is_truthy(),
            LogicalOp::Nullish => !lv.is_nullish(),
        };
        if short_circuit {
            Ok(lv)
        } else {
            self.eval_expr(right)
        }
    }

    fn eval_conditional(&mut self, test: &Expr, consequent: &Expr, alternate: &Expr) -> EvalResult<Value> {
        if self.eval_expr(test)?.is_truthy() {
            self.eval_expr(consequent)
        } else {
            self.eval_expr(alternate)
        }
    }

    fn eval_assign(&mut self, target: &Expr, op: AssignOp, value: &Expr) -> EvalResult<Value> {
        let place = self.resolve_place(target)?;
        let new = match op.binary() {
            None => self.eval_expr(value)?,
            Some(bin) => {
                let old = self.read_place(&place)?;
                let rhs = self.eval_expr(value)?;
                self.apply_binary(bin, &old, &rhs)?
            }
        };
        self.write_place(&place, new.clone())?;
        Ok(new)
    }

    // ── Places ───────────────────────────────────────────────────────────

    fn resolve_place(&mut self, target: &Expr) -> EvalResult<Place> {
        match &target.kind {
            ExprKind::Identifier(name) => Ok(Place::Binding(name.clone())),
            ExprKind::Member {
                object, property, ..
            } => {
                let obj = self.eval_expr(object)?;
                let key = self.property_key(property)?;
                Ok(Place::Property(obj, key))
            }
            ExprKind::Paren(inner) => self.resolve_place(inner),
            _ => Err(EvalError::SyntaxError(
                "Invalid left-hand side in assignment".into(),
            )),
        }
    }

    fn read_place(&mut self, place: &Place) -> EvalResult<Value> {
        match place {
            Place::Binding(name) => self.lookup(name),
            Place::Property(obj, key) => get_property(obj, key),
        }
    }

    fn write_place(&mut self, place: &Place, value: Value) -> EvalResult<()> {
        match place {
            Place::Binding(name) => self.assign_binding(name, value),
            Place::Property(obj, key) => set_property(obj, key, value),
        }
    }

    pub(crate) fn assign_binding(&mut self, name: &str, value: Value) -> EvalResult<()> {
        self.env.assign(name, value).map_err(|err| match err {
            AssignError::Constant => EvalError::type_error("Assignment to constant variable."),
        })
    }
}

impl Drop for Evaluator {
    fn drop(&mut self) {
        self.global.clear();
    }
}

/// Short source-like description of a callee for error messages:
/// `calculateThrust`, `input.toUpperCase`.
fn describe_callee(expr: &Expr) -> String {
    match &expr.kind {
        ExprKind::Identifier(name) => name.clone(),
        ExprKind::This => "this".into(),
        ExprKind::Member {
            object, property, ..
        } => match property {
            MemberProperty::Named(ident) => format!("{}.{}", describe_callee(object), ident.name),
            MemberProperty::Computed(_) => format!("{}[...]", describe_callee(object)),
        },
        ExprKind::Call { callee, .. } => format!("{}(...)", describe_callee(callee)),
        ExprKind::Paren(inner) | ExprKind::OptionalChain(inner) => describe_callee(inner),
        _ => "expression".into(),
    }
}

/// Description of a value for error messages: primitives print themselves,
/// composites print their kind.
pub(crate) fn describe_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{s}\""),
        Value::Array(_) => "array".into(),
        Value::Object(_) => "object".into(),
        Value::Function(f) => format!("function {}", f.name()),
        other => other.to_display_string(),
    }
}
