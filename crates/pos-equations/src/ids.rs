//! Dense integer ids for variables and equation rows.
//!
//! The engine never stores a variable name in a hot path: names are interned
//! once, on first appearance, into a [`VarId`]. Row ids are assigned in
//! submission order. Both are `u32` newtypes so they are cheap to use as
//! `indexmap`/`FixedBitSet` keys.

use indexmap::IndexMap;
use std::fmt;

/// Interned handle for a positioning variable.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(pub u32);

impl fmt::Debug for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl VarId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle for a base/combination row pair. Stable across edits to the row's
/// contents; only `remove_equation` retires one.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowId(pub u32);

impl fmt::Debug for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

impl RowId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Interns variable names into dense [`VarId`]s.
///
/// A variable is "born" the first time its name is seen (§3 Lifecycle) and is
/// never un-interned even if later removed from every equation — the id slot
/// is simply left unreferenced. Re-adding the same name later reuses the same
/// id, which keeps external bookkeeping (segment constraints, or-groups)
/// keyed consistently across solve passes.
#[derive(Default)]
pub struct VariableInterner {
    by_name: IndexMap<String, VarId>,
    names: Vec<String>,
}

impl VariableInterner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id for `name`, interning it if this is the first
    /// appearance. Returns whether the variable was newly born.
    pub fn intern(&mut self, name: &str) -> (VarId, bool) {
        if let Some(&id) = self.by_name.get(name) {
            return (id, false);
        }
        let id = VarId(self.names.len() as u32);
        self.names.push(name.to_string());
        self.by_name.insert(name.to_string(), id);
        (id, true)
    }

    pub fn lookup(&self, name: &str) -> Option<VarId> {
        self.by_name.get(name).copied()
    }

    pub fn name(&self, id: VarId) -> &str {
        &self.names[id.index()]
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// All ids ever interned, in birth order — used by the removed-variable
    /// purge pass (spec.md §4.4 step 2), which has no other way to learn a
    /// variable's name has stopped appearing in every equation.
    pub fn ids(&self) -> impl Iterator<Item = VarId> + '_ {
        (0..self.names.len() as u32).map(VarId)
    }
}
