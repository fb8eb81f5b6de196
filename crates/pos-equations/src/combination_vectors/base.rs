//! The base set B: rows exactly as submitted by the caller, indexed by
//! stable [`RowId`]s. Immutable between caller edits (spec.md §3).

use crate::equation::Row;
use crate::ids::RowId;
use indexmap::IndexMap;

#[derive(Default)]
pub struct BaseSet {
    rows: IndexMap<RowId, Row>,
    next_id: u32,
}

impl BaseSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, row: Row) -> RowId {
        let id = RowId(self.next_id);
        self.next_id += 1;
        self.rows.insert(id, row);
        id
    }

    pub fn set(&mut self, id: RowId, row: Row) {
        self.rows.insert(id, row);
    }

    pub fn remove(&mut self, id: RowId) -> Option<Row> {
        self.rows.shift_remove(id)
    }

    pub fn get(&self, id: RowId) -> Option<&Row> {
        self.rows.get(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = RowId> + '_ {
        self.rows.keys().copied()
    }

    pub fn contains(&self, id: RowId) -> bool {
        self.rows.contains_key(&id)
    }
}
