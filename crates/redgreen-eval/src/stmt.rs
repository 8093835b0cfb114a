//! Statement execution, hoisting and scoping.

use redgreen_types::ast::*;

use crate::env::{Env, ScopeKind};
use crate::error::{EvalError, EvalResult};
use crate::evaluator::Evaluator;
use crate::ops;
use crate::property::array_index;
use crate::value::Value;

/// What a loop body asked for.
enum LoopFlow {
    Next,
    Exit,
}

impl Evaluator {
    // ══════════════════════════════════════════════════════════════════════
    // Hoisting
    // ══════════════════════════════════════════════════════════════════════

    /// Hoist the declarations of a program or function body: every `var`
    /// reachable without crossing a function boundary, and the function
    /// declarations of this statement list.
    pub(crate) fn hoist_declarations(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.hoist_vars(stmt);
        }
        self.hoist_functions(stmts);
    }

    fn hoist_functions(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            if let Stmt::Function(decl) = stmt {
                if let Some(name) = &decl.name {
                    let closure = self.make_closure(decl, self.env.clone());
                    self.env.define(&name.name, closure, true);
                }
            }
        }
    }

    fn hoist_vars(&self, stmt: &Stmt) {
        match stmt {
            Stmt::VarDecl(decl) if decl.kind == VarKind::Var => {
                for declarator in &decl.declarators {
                    self.env.declare_var(&declarator.name.name);
                }
            }
            Stmt::Block(block) => block.stmts.iter().for_each(|s| self.hoist_vars(s)),
            Stmt::If(s) => {
                self.hoist_vars(&s.then_branch);
                if let Some(else_branch) = &s.else_branch {
                    self.hoist_vars(else_branch);
                }
            }
            Stmt::While(s) | Stmt::DoWhile(s) => self.hoist_vars(&s.body),
            Stmt::For(s) => {
                if let Some(ForInit::VarDecl(decl)) = &s.init {
                    if decl.kind == VarKind::Var {
                        for declarator in &decl.declarators {
                            self.env.declare_var(&declarator.name.name);
                        }
                    }
                }
                self.hoist_vars(&s.body);
            }
            Stmt::ForOf(s) | Stmt::ForIn(s) => {
                if s.kind == Some(VarKind::Var) {
                    self.env.declare_var(&s.binding.name);
                }
                self.hoist_vars(&s.body);
            }
            Stmt::Switch(s) => {
                for case in &s.cases {
                    case.body.iter().for_each(|st| self.hoist_vars(st));
                }
            }
            Stmt::Try(s) => {
                s.block.stmts.iter().for_each(|st| self.hoist_vars(st));
                if let Some(handler) = &s.handler {
                    handler.body.stmts.iter().for_each(|st| self.hoist_vars(st));
                }
                if let Some(finalizer) = &s.finalizer {
                    finalizer.stmts.iter().for_each(|st| self.hoist_vars(st));
                }
            }
            _ => {}
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Statements
    // ══════════════════════════════════════════════════════════════════════

    pub(crate) fn exec_stmts(&mut self, stmts: &[Stmt]) -> EvalResult<()> {
        for stmt in stmts {
            self.exec_stmt(stmt)?;
        }
        Ok(())
    }

    /// Run `f` with `env` as the current scope, restoring the previous scope
    /// afterwards whatever `f` returns.
    fn in_scope<T>(
        &mut self,
        env: Env,
        f: impl FnOnce(&mut Self) -> EvalResult<T>,
    ) -> EvalResult<T> {
        let saved = std::mem::replace(&mut self.env, env);
        let result = f(self);
        self.env = saved;
        result
    }

    fn exec_stmt(&mut self, stmt: &Stmt) -> EvalResult<()> {
        self.tick()?;
        self.descend()?;
        let result = self.exec_stmt_kind(stmt);
        self.ascend();
        result
    }

    fn exec_stmt_kind(&mut self, stmt: &Stmt) -> EvalResult<()> {
        match stmt {
            // Hoisted with the enclosing statement list.
            Stmt::Function(_) | Stmt::Empty(_) => Ok(()),
            Stmt::VarDecl(decl) => self.exec_var_decl(decl),
            Stmt::Expr(s) => self.eval_expr(&s.expr).map(|_| ()),
            Stmt::Block(block) => self.exec_block(block),
            Stmt::If(s) => {
                if self.eval_expr(&s.condition)?.is_truthy() {
                    self.exec_stmt(&s.then_branch)
                } else if let Some(else_branch) = &s.else_branch {
                    self.exec_stmt(else_branch)
                } else {
                    Ok(())
                }
            }
            Stmt::While(s) => self.exec_while(s),
            Stmt::DoWhile(s) => self.exec_do_while(s),
            Stmt::For(s) => self.exec_for(s),
            Stmt::ForOf(s) => self.exec_for_of(s),
            Stmt::ForIn(s) => self.exec_for_in(s),
            Stmt::Switch(s) => self.exec_switch(s),
            Stmt::Break(_) => Err(EvalError::Break),
            Stmt::Continue(_) => Err(EvalError::Continue),
            Stmt::Return(s) => {
                let value = match &s.value {
                    Some(expr) => self.eval_expr(expr)?,
                    None => Value::Undefined,
                };
                Err(EvalError::Return(value))
            }
            Stmt::Throw(s) => {
                let value = self.eval_expr(&s.value)?;
                Err(EvalError::Thrown(value))
            }
            Stmt::Try(s) => self.exec_try(s),
        }
    }

    fn exec_block(&mut self, block: &Block) -> EvalResult<()> {
        let scope = self.env.child(ScopeKind::Block);
        self.in_scope(scope, |ev| {
            ev.hoist_functions(&block.stmts);
            ev.exec_stmts(&block.stmts)
        })
    }

    fn exec_var_decl(&mut self, decl: &VarDecl) -> EvalResult<()> {
        for declarator in &decl.declarators {
            let name = &declarator.name.name;
            match (decl.kind, &declarator.init) {
                // `var x;` leaves an existing value alone.
                (VarKind::Var, None) => self.env.declare_var(name),
                (VarKind::Var, Some(init)) => {
                    let value = self.eval_expr(init)?;
                    self.env.declare_var(name);
                    self.assign_binding(name, value)?;
                }
                (kind, init) => {
                    let value = match init {
                        Some(init) => self.eval_expr(init)?,
                        None => Value::Undefined,
                    };
                    self.env.define(name, value, kind != VarKind::Const);
                }
            }
        }
        Ok(())
    }

    // ── Loops ────────────────────────────────────────────────────────────

    /// Run one loop body and translate `break`/`continue`.
    fn loop_body(&mut self, body: &Stmt) -> EvalResult<LoopFlow> {
        match self.exec_stmt(body) {
            Ok(()) | Err(EvalError::Continue) => Ok(LoopFlow::Next),
            Err(EvalError::Break) => Ok(LoopFlow::Exit),
            Err(e) => Err(e),
        }
    }

    fn exec_while(&mut self, s: &WhileStmt) -> EvalResult<()> {
        loop {
            self.tick()?;
            if !self.eval_expr(&s.condition)?.is_truthy() {
                return Ok(());
            }
            if let LoopFlow::Exit = self.loop_body(&s.body)? {
                return Ok(());
            }
        }
    }

    fn exec_do_while(&mut self, s: &WhileStmt) -> EvalResult<()> {
        loop {
            self.tick()?;
            if let LoopFlow::Exit = self.loop_body(&s.body)? {
                return Ok(());
            }
            if !self.eval_expr(&s.condition)?.is_truthy() {
                return Ok(());
            }
        }
    }

    fn exec_for(&mut self, s: &ForStmt) -> EvalResult<()> {
        let outer = self.env.clone();
        // `let`/`const` loop variables get a fresh copy per iteration, so
        // closures created in the body see that iteration's value.
        let per_iteration: Vec<(String, bool)> = match &s.init {
            Some(ForInit::VarDecl(decl)) if decl.kind != VarKind::Var => decl
                .declarators
                .iter()
                .map(|d| (d.name.name.clone(), decl.kind != VarKind::Const))
                .collect(),
            _ => Vec::new(),
        };
        let init_scope = outer.child(ScopeKind::Block);
        self.in_scope(init_scope, |ev| {
            match &s.init {
                Some(ForInit::VarDecl(decl)) => ev.exec_var_decl(decl)?,
                Some(ForInit::Expr(expr)) => {
                    ev.eval_expr(expr)?;
                }
                None => {}
            }
            ev.next_iteration_scope(&outer, &per_iteration);
            loop {
                ev.tick()?;
                if let Some(test) = &s.test {
                    if !ev.eval_expr(test)?.is_truthy() {
                        return Ok(());
                    }
                }
                if let LoopFlow::Exit = ev.loop_body(&s.body)? {
                    return Ok(());
                }
                ev.next_iteration_scope(&outer, &per_iteration);
                if let Some(update) = &s.update {
                    ev.eval_expr(update)?;
                }
            }
        })
    }

    /// Replace the current loop scope with a copy holding the same values.
    fn next_iteration_scope(&mut self, outer: &Env, bindings: &[(String, bool)]) {
        if bindings.is_empty() {
            return;
        }
        let next = outer.child(ScopeKind::Block);
        for (name, mutable) in bindings {
            next.define(name, self.env.get(name).unwrap_or_default(), *mutable);
        }
        self.env = next;
    }

    /// Bind the loop variable of a `for-of`/`for-in` iteration.
    fn bind_each(&mut self, s: &ForEachStmt, value: Value) -> EvalResult<()> {
        let name = &s.binding.name;
        match s.kind {
            Some(VarKind::Let) => self.env.define(name, value, true),
            Some(VarKind::Const) => self.env.define(name, value, false),
            Some(VarKind::Var) => {
                self.env.declare_var(name);
                self.assign_binding(name, value)?;
            }
            None => self.assign_binding(name, value)?,
        }
        Ok(())
    }

    fn each_iteration(&mut self, s: &ForEachStmt, value: Value) -> EvalResult<LoopFlow> {
        self.tick()?;
        let scope = self.env.child(ScopeKind::Block);
        self.in_scope(scope, |ev| {
            ev.bind_each(s, value)?;
            ev.loop_body(&s.body)
        })
    }

    fn exec_for_of(&mut self, s: &ForEachStmt) -> EvalResult<()> {
        let iterable = self.eval_expr(&s.iterable)?;
        match &iterable {
            // Arrays are read live: elements pushed during the loop are visited.
            Value::Array(items) => {
                let mut index = 0;
                loop {
                    let item = match items.borrow().get(index) {
                        Some(item) => item.clone(),
                        None => return Ok(()),
                    };
                    if let LoopFlow::Exit = self.each_iteration(s, item)? {
                        return Ok(());
                    }
                    index += 1;
                }
            }
            _ => {
                for item in self.iterate(&iterable)? {
                    if let LoopFlow::Exit = self.each_iteration(s, item)? {
                        break;
                    }
                }
                Ok(())
            }
        }
    }

    fn exec_for_in(&mut self, s: &ForEachStmt) -> EvalResult<()> {
        let object = self.eval_expr(&s.iterable)?;
        let keys: Vec<String> = match &object {
            Value::Object(obj) => obj.borrow().props.keys().map(str::to_string).collect(),
            Value::Function(func) => func.props.borrow().keys().map(str::to_string).collect(),
            Value::Array(items) => (0..items.borrow().len()).map(|i| i.to_string()).collect(),
            Value::String(text) => (0..text.chars().count()).map(|i| i.to_string()).collect(),
            _ => Vec::new(),
        };
        self.charge_bulk(keys.len())?;
        for key in keys {
            // Keys deleted from an array during the loop are skipped.
            if let (Value::Array(items), Some(index)) = (&object, array_index(&key)) {
                if index >= items.borrow().len() {
                    continue;
                }
            }
            if let LoopFlow::Exit = self.each_iteration(s, Value::String(key))? {
                break;
            }
        }
        Ok(())
    }

    // ── Switch / try ─────────────────────────────────────────────────────

    fn exec_switch(&mut self, s: &SwitchStmt) -> EvalResult<()> {
        let discriminant = self.eval_expr(&s.discriminant)?;
        let scope = self.env.child(ScopeKind::Block);
        self.in_scope(scope, |ev| {
            for case in &s.cases {
                ev.hoist_functions(&case.body);
            }
            let mut start = None;
            for (index, case) in s.cases.iter().enumerate() {
                if let Some(test) = &case.test {
                    if ops::strict_equals(&discriminant, &ev.eval_expr(test)?) {
                        start = Some(index);
                        break;
                    }
                }
            }
            let start = start.or_else(|| s.cases.iter().position(|c| c.test.is_none()));
            let Some(start) = start else {
                return Ok(());
            };
            // Fall through every case after the first match.
            for case in &s.cases[start..] {
                match ev.exec_stmts(&case.body) {
                    Ok(()) => {}
                    Err(EvalError::Break) => return Ok(()),
                    Err(e) => return Err(e),
                }
            }
            Ok(())
        })
    }

    fn exec_try(&mut self, s: &TryStmt) -> EvalResult<()> {
        let result = match (self.exec_block(&s.block), &s.handler) {
            (Err(err), Some(handler)) if err.is_catchable() => {
                let scope = self.env.child(ScopeKind::Block);
                self.in_scope(scope, |ev| {
                    if let Some(param) = &handler.param {
                        ev.env.define(&param.name, err.to_thrown_value(), true);
                    }
                    ev.exec_block(&handler.body)
                })
            }
            (result, _) => result,
        };
        if let Some(finalizer) = &s.finalizer {
            // An abrupt `finally` replaces the pending completion.
            self.exec_block(finalizer)?;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use redgreen_parser::parse_program;
    use redgreen_types::SourceFile;

    use crate::config::SandboxConfig;
    use crate::evaluator::Evaluator;
    use crate::value::Value;

    /// Run `src` and return the global binding `result`.
    fn run(src: &str) -> Value {
        let source = SourceFile::new("test.js", src);
        let parsed = parse_program(&source);
        let program = parsed.program.expect("program should parse");
        let mut ev = Evaluator::new(SandboxConfig::default());
        ev.run_program(&program).expect("program should run");
        ev.global_binding("result").unwrap_or_default()
    }

    #[test]
    fn test_function_declarations_are_hoisted() {
        assert_eq!(run("var result = f(); function f() { return 7; }"), Value::Number(7.0));
    }

    #[test]
    fn test_var_is_function_scoped_and_let_is_block_scoped() {
        let src = "
            var result = [];
            { var a = 1; let b = 2; }
            result.push(typeof a, typeof b);
        ";
        assert_eq!(
            run(src),
            Value::array(vec![Value::string("number"), Value::string("undefined")])
        );
    }

    #[test]
    fn test_for_let_captures_each_iteration() {
        let src = "
            var fns = [];
            for (let i = 0; i < 3; i++) { fns.push(() => i); }
            var result = fns.map(f => f());
        ";
        assert_eq!(
            run(src),
            Value::array(vec![Value::Number(0.0), Value::Number(1.0), Value::Number(2.0)])
        );
    }

    #[test]
    fn test_break_and_continue() {
        let src = "
            var result = 0;
            for (var i = 0; i < 10; i++) {
                if (i % 2 === 0) continue;
                if (i > 7) break;
                result += i;
            }
        ";
        assert_eq!(run(src), Value::Number(16.0));
    }

    #[test]
    fn test_do_while_runs_once() {
        assert_eq!(run("var result = 0; do { result++; } while (false);"), Value::Number(1.0));
    }

    #[test]
    fn test_for_of_and_for_in() {
        let src = "
            var result = '';
            for (const c of 'ab') result += c;
            for (const x of [1, 2]) result += x;
            for (const k in { p: 1, q: 2 }) result += k;
            for (const i in [9, 9]) result += i;
            for (const k in null) result += 'never';
        ";
        assert_eq!(run(src), Value::string("ab12pq01"));
    }

    #[test]
    fn test_switch_falls_through_until_break() {
        let src = "
            function label(n) {
                var out = '';
                switch (n) {
                    case 1: out += 'one';
                    case 2: out += 'two'; break;
                    default: out += 'other';
                }
                return out;
            }
            var result = [label(1), label(2), label(3), label('1')];
        ";
        assert_eq!(
            run(src),
            Value::array(vec![
                Value::string("onetwo"),
                Value::string("two"),
                Value::string("other"),
                Value::string("other"),
            ])
        );
    }

    #[test]
    fn test_try_catch_finally() {
        let src = "
            var result = [];
            try { null.x; } catch (e) { result.push(e.message); } finally { result.push('done'); }
            try { throw new Error('boom'); } catch (e) { result.push(e.message); }
            try { throw 'raw'; } catch (e) { result.push(e); }
            try { result.push('ok'); } catch { result.push('never'); }
        ";
        assert_eq!(
            run(src),
            Value::array(vec![
                Value::string("Cannot read properties of null (reading 'x')"),
                Value::string("done"),
                Value::string("boom"),
                Value::string("raw"),
                Value::string("ok"),
            ])
        );
    }

    #[test]
    fn test_finally_runs_on_return() {
        let src = "
            var log = [];
            function f() { try { return 1; } finally { log.push('f'); } }
            var result = [f(), log.length];
        ";
        assert_eq!(run(src), Value::array(vec![Value::Number(1.0), Value::Number(1.0)]));
    }

    #[test]
    fn test_gas_exhaustion_is_not_catchable() {
        let source = SourceFile::new("test.js", "try { while (true) {} } catch (e) {}");
        let program = parse_program(&source).program.unwrap();
        let mut ev = Evaluator::new(SandboxConfig::default().with_gas_limit(10_000));
        let err = ev.run_program(&program).unwrap_err();
        assert!(matches!(err, crate::error::EvalError::GasExhausted));
    }
}
