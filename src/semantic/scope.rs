//! Scope management

use super::Type;
use std::collections::HashMap;

/// Variable information
#[derive(Debug, Clone, PartialEq)]
pub struct VarInfo {
    pub ty: Type,
}

/// Scope for variable tracking
#[derive(Debug, Clone, Default)]
pub struct Scope {
    variables: HashMap<String, VarInfo>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, name: &str, ty: Type) {
        self.variables.insert(name.to_string(), VarInfo { ty });
    }

    pub fn lookup(&self, name: &str) -> Option<&VarInfo> {
        self.variables.get(name)
    }
}

/// Stack of scopes for one function body.
///
/// Block scopes are discarded on `pop`: a name first assigned inside an `if` branch or a
/// `while` body is not visible after the block, matching the C++ block the code generator
/// emits for it. Inner scopes may shadow outer bindings.
#[derive(Debug)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeStack {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::new()], // Function scope
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len().saturating_sub(1)
    }

    pub fn push(&mut self) {
        self.scopes.push(Scope::new());
    }

    /// Pop the current block scope. The function scope is never popped.
    pub fn pop(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn define(&mut self, name: &str, ty: Type) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.define(name, ty);
        }
    }

    /// Nearest binding of `name`, innermost scope first
    pub fn lookup(&self, name: &str) -> Option<&VarInfo> {
        self.scopes.iter().rev().find_map(|scope| scope.lookup(name))
    }
}
