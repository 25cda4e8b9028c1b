//! Variable table shared by every program an engine compiles.
//!
//! Programs refer to variables by [`VarId`], resolved once at bind time, so
//! evaluation never hashes a name.

use std::collections::HashMap;

/// Index of a variable slot in a [`VarTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarId(pub(crate) usize);

/// Name → scalar slot mapping. Values are NaN-capable `f32`s.
#[derive(Debug, Clone, Default)]
pub struct VarTable {
    values: Vec<f32>,
    constant: Vec<bool>,
    names: HashMap<String, VarId>,
}

impl VarTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or overwrite a writable variable.
    pub fn define(&mut self, name: &str, value: f32) -> VarId {
        let id = self.intern(name);
        self.values[id.0] = value;
        id
    }

    /// Register a read-only constant. Scripts may read it but binding an
    /// assignment to it fails.
    pub fn define_constant(&mut self, name: &str, value: f32) -> VarId {
        let id = self.define(name, value);
        self.constant[id.0] = true;
        id
    }

    /// Look up a variable, creating it with value 0 if it does not exist.
    pub fn intern(&mut self, name: &str) -> VarId {
        if let Some(&id) = self.names.get(name) {
            return id;
        }
        let id = VarId(self.values.len());
        self.values.push(0.0);
        self.constant.push(false);
        self.names.insert(name.to_string(), id);
        id
    }

    pub fn lookup(&self, name: &str) -> Option<VarId> {
        self.names.get(name).copied()
    }

    pub fn is_constant(&self, id: VarId) -> bool {
        self.constant[id.0]
    }

    #[inline]
    pub fn get(&self, id: VarId) -> f32 {
        self.values[id.0]
    }

    #[inline]
    pub fn set(&mut self, id: VarId, value: f32) {
        self.values[id.0] = value;
    }

    /// Value of a variable by name, if it exists.
    pub fn value_of(&self, name: &str) -> Option<f32> {
        self.lookup(name).map(|id| self.get(id))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
