//! Symbol table (§4.C)
//!
//! A tree of scopes: `Global -> Function -> Block*`. Unlike the original's
//! inheritance hierarchy (`STable` / `BlockTable` / `FuncTable`, design note
//! on polymorphic AST applies equally here), this is modeled as a single
//! `Scope` struct tagged by [`ScopeKind`], held in a `Vec` acting as an
//! explicit stack — entering/exiting a scope pushes/pops the vector, which
//! gives the scoped-acquisition guarantee of §5 for free via `Drop`-free,
//! caller-driven push/pop pairs (the analyzer calls `exit_*` on every exit
//! path, including error returns, via `?`-propagation after popping).

use crate::types::Type;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    Function,
    Block,
}

#[derive(Debug, Clone)]
pub struct SymbolInfo {
    pub ty: Type,
    pub has_definition: bool,
    pub linkage: Linkage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Linkage {
    External,
    Internal,
    None,
}

#[derive(Debug)]
struct Scope {
    kind: ScopeKind,
    symbols: HashMap<String, SymbolInfo>,
    in_loop: bool,
    in_switch: bool,
}

impl Scope {
    fn new(kind: ScopeKind, in_loop: bool, in_switch: bool) -> Self {
        Scope {
            kind,
            symbols: HashMap::new(),
            in_loop,
            in_switch,
        }
    }
}

/// Per-function state that does not nest with blocks: the declared return
/// type, label bookkeeping, and the switch-case stack.
#[derive(Debug, Default)]
struct FunctionState {
    return_type: Option<Type>,
    declared_labels: HashSet<String>,
    required_labels: HashSet<String>,
    switch_stack: Vec<SwitchCases>,
    loop_break_stack: Vec<String>,
    loop_continue_stack: Vec<String>,
}

/// The set of constant case values (plus an optional default marker)
/// collected during one switch body.
#[derive(Debug, Default, Clone)]
pub struct SwitchCases {
    pub values: HashSet<i128>,
    pub has_default: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolError(pub String);

impl std::fmt::Display for SymbolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::error::Error for SymbolError {}

/// The symbol table: a stack of scopes plus one [`FunctionState`] per
/// currently-open function.
#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    functions: Vec<FunctionState>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            scopes: vec![Scope::new(ScopeKind::Global, false, false)],
            functions: Vec::new(),
        }
    }

    fn current(&self) -> &Scope {
        self.scopes.last().expect("global scope always present")
    }

    fn current_mut(&mut self) -> &mut Scope {
        self.scopes.last_mut().expect("global scope always present")
    }

    fn current_function_mut(&mut self) -> &mut FunctionState {
        self.functions
            .last_mut()
            .expect("add_label/require_label/switch ops require an open function")
    }

    pub fn enter_scope(&mut self) {
        let parent_loop = self.current().in_loop;
        let parent_switch = false; // switch scoping is tracked via the explicit stack, not inherited
        self.scopes
            .push(Scope::new(ScopeKind::Block, parent_loop, parent_switch));
    }

    pub fn exit_scope(&mut self) {
        let popped = self.scopes.pop();
        debug_assert!(
            popped.is_some_and(|s| s.kind == ScopeKind::Block),
            "exit_scope called without a matching enter_scope"
        );
    }

    /// Enter a loop body scope: same as `enter_scope` but marks `in_loop`.
    pub fn enter_loop(&mut self, break_label: String, continue_label: String) {
        self.scopes.push(Scope::new(ScopeKind::Block, true, false));
        let f = self.current_function_mut();
        f.loop_break_stack.push(break_label);
        f.loop_continue_stack.push(continue_label);
    }

    pub fn exit_loop(&mut self) {
        self.exit_scope();
        let f = self.current_function_mut();
        f.loop_break_stack.pop();
        f.loop_continue_stack.pop();
    }

    pub fn enter_function(&mut self, return_type: Type) {
        self.scopes.push(Scope::new(ScopeKind::Function, false, false));
        self.functions.push(FunctionState {
            return_type: Some(return_type),
            ..Default::default()
        });
    }

    /// Pop the function scope, validating that every `goto` target was
    /// eventually declared as a label somewhere in the function.
    pub fn exit_function(&mut self) -> Result<(), SymbolError> {
        let f = self.functions.pop().expect("exit_function without enter_function");
        self.scopes.pop();
        let missing: Vec<&String> = f
            .required_labels
            .difference(&f.declared_labels)
            .collect();
        if let Some(name) = missing.into_iter().next() {
            return Err(SymbolError(format!("use of undeclared label '{}'", name)));
        }
        Ok(())
    }

    pub fn add_symbol(
        &mut self,
        name: &str,
        ty: Type,
        has_definition: bool,
    ) -> Result<(), SymbolError> {
        let linkage = if self.current().kind == ScopeKind::Global {
            Linkage::External
        } else {
            Linkage::None
        };
        if let Some(existing) = self.current().symbols.get(name) {
            if existing.ty != ty {
                return Err(SymbolError(format!(
                    "conflicting types for '{}': {} vs {}",
                    name, existing.ty, ty
                )));
            }
            if existing.has_definition && has_definition {
                return Err(SymbolError(format!("redefinition of '{}'", name)));
            }
        }
        let merged_def = has_definition
            || self
                .current()
                .symbols
                .get(name)
                .is_some_and(|s| s.has_definition);
        self.current_mut().symbols.insert(
            name.to_string(),
            SymbolInfo {
                ty,
                has_definition: merged_def,
                linkage,
            },
        );
        Ok(())
    }

    pub fn add_extern_decl(&mut self, name: &str, ty: Type) -> Result<(), SymbolError> {
        if let Some(existing) = self.global_symbol(name) {
            if existing.ty != ty {
                return Err(SymbolError(format!(
                    "conflicting types for extern '{}'",
                    name
                )));
            }
            return Ok(());
        }
        self.scopes[0].symbols.insert(
            name.to_string(),
            SymbolInfo {
                ty,
                has_definition: false,
                linkage: Linkage::External,
            },
        );
        Ok(())
    }

    fn global_symbol(&self, name: &str) -> Option<&SymbolInfo> {
        self.scopes[0].symbols.get(name)
    }

    pub fn has_symbol(&self, name: &str) -> bool {
        self.scopes.iter().rev().any(|s| s.symbols.contains_key(name))
    }

    pub fn symbol_type(&self, name: &str) -> Option<&Type> {
        self.scopes
            .iter()
            .rev()
            .find_map(|s| s.symbols.get(name))
            .map(|info| &info.ty)
    }

    pub fn symbol_info(&self, name: &str) -> Option<&SymbolInfo> {
        self.scopes.iter().rev().find_map(|s| s.symbols.get(name))
    }

    pub fn in_loop(&self) -> bool {
        self.current().in_loop
    }

    pub fn in_switch(&self) -> bool {
        self.functions
            .last()
            .is_some_and(|f| !f.switch_stack.is_empty())
    }

    pub fn in_function(&self) -> bool {
        !self.functions.is_empty()
    }

    pub fn return_type(&self) -> Option<&Type> {
        self.functions.last()?.return_type.as_ref()
    }

    pub fn push_switch(&mut self) {
        self.current_function_mut()
            .switch_stack
            .push(SwitchCases::default());
    }

    pub fn pop_switch(&mut self) -> SwitchCases {
        self.current_function_mut()
            .switch_stack
            .pop()
            .expect("pop_switch without matching push_switch")
    }

    /// Record a `case` value in the nearest enclosing switch. Returns an
    /// error if the value duplicates an earlier case in the same switch.
    pub fn add_case(&mut self, value: i128) -> Result<(), SymbolError> {
        let f = self.current_function_mut();
        let cases = f
            .switch_stack
            .last_mut()
            .expect("add_case requires an enclosing switch");
        if !cases.values.insert(value) {
            return Err(SymbolError(format!("duplicate case value {}", value)));
        }
        Ok(())
    }

    pub fn add_default(&mut self) -> Result<(), SymbolError> {
        let f = self.current_function_mut();
        let cases = f
            .switch_stack
            .last_mut()
            .expect("add_default requires an enclosing switch");
        if cases.has_default {
            return Err(SymbolError("multiple default labels in one switch".into()));
        }
        cases.has_default = true;
        Ok(())
    }

    /// A label is declared in any block of a function and is visible
    /// throughout that function.
    pub fn add_label(&mut self, name: &str) {
        self.current_function_mut().declared_labels.insert(name.to_string());
    }

    pub fn require_label(&mut self, name: &str) {
        self.current_function_mut().required_labels.insert(name.to_string());
    }

    pub fn break_target(&self) -> Option<&str> {
        self.functions
            .last()?
            .loop_break_stack
            .last()
            .map(|s| s.as_str())
    }

    pub fn continue_target(&self) -> Option<&str> {
        self.functions
            .last()?
            .loop_continue_stack
            .last()
            .map(|s| s.as_str())
    }

    /// Push a break target without entering a new lexical scope (used by
    /// `switch`, which is break-only, not continue-able).
    pub fn push_break_only(&mut self, break_label: String) {
        self.current_function_mut().loop_break_stack.push(break_label);
    }

    pub fn pop_break_only(&mut self) {
        self.current_function_mut().loop_break_stack.pop();
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Type;

    #[test]
    fn scope_round_trip_restores_visibility() {
        let mut t = SymbolTable::new();
        t.add_symbol("g", Type::int(), true).unwrap();
        t.enter_scope();
        t.add_symbol("local", Type::int(), true).unwrap();
        assert!(t.has_symbol("local"));
        t.exit_scope();
        assert!(!t.has_symbol("local"));
        assert!(t.has_symbol("g"));
    }

    #[test]
    fn redefinition_is_an_error() {
        let mut t = SymbolTable::new();
        t.add_symbol("f", Type::int(), true).unwrap();
        assert!(t.add_symbol("f", Type::int(), true).is_err());
    }

    #[test]
    fn duplicate_case_values_are_rejected() {
        let mut t = SymbolTable::new();
        t.enter_function(Type::int());
        t.push_switch();
        t.add_case(1).unwrap();
        assert!(t.add_case(1).is_err());
        t.pop_switch();
        t.exit_function().unwrap();
    }

    #[test]
    fn goto_to_undeclared_label_fails_at_function_exit() {
        let mut t = SymbolTable::new();
        t.enter_function(Type::int());
        t.require_label("done");
        assert!(t.exit_function().is_err());
    }

    #[test]
    fn in_loop_and_in_switch_predicates() {
        let mut t = SymbolTable::new();
        t.enter_function(Type::int());
        assert!(!t.in_loop());
        t.enter_loop("break.0".into(), "cont.0".into());
        assert!(t.in_loop());
        assert_eq!(t.break_target(), Some("break.0"));
        t.exit_loop();
        assert!(!t.in_loop());
    }
}
