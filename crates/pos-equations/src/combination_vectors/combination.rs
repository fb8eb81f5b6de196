//! The combination set C: one row per base row, kept as a linear combination
//! of B in reduced form (spec.md §3, §4.1).

use crate::ids::RowId;
use indexmap::IndexMap;

/// A row's expression as a linear combination of base rows:
/// `sum(coeff * base[row_id])`. Kept separately from the row's expansion in
/// variable-space (`Row`) so [`super::CombinationVectors::repair_combinations`]
/// can reconstruct the latter from scratch when drift accumulates.
#[derive(Debug, Clone, Default)]
pub struct Combo {
    terms: Vec<(RowId, f64)>,
}

impl Combo {
    pub fn identity(row_id: RowId) -> Self {
        Combo { terms: vec![(row_id, 1.0)] }
    }

    pub fn coefficient(&self, row_id: RowId) -> f64 {
        self.terms
            .iter()
            .find(|&&(r, _)| r == row_id)
            .map(|&(_, c)| c)
            .unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (RowId, f64)> + '_ {
        self.terms.iter().copied()
    }

    pub fn add_scaled(&mut self, other: &Combo, scalar: f64) {
        for (row, coeff) in other.iter() {
            self.add(row, coeff * scalar);
        }
    }

    pub fn add(&mut self, row: RowId, delta: f64) {
        match self.terms.iter_mut().find(|(r, _)| *r == row) {
            Some((_, c)) => {
                *c += delta;
                if *c == 0.0 {
                    self.terms.retain(|(r, _)| *r != row);
                }
            }
            None if delta != 0.0 => self.terms.push((row, delta)),
            None => {}
        }
    }

    pub fn scale(&mut self, factor: f64) {
        for (_, c) in self.terms.iter_mut() {
            *c *= factor;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Per-row bookkeeping: the combination coefficients and the resulting
/// variable-space row.
#[derive(Debug, Clone, Default)]
pub struct CombinationRow {
    pub combo: Combo,
    pub row: crate::equation::Row,
}

pub type CombinationSet = IndexMap<RowId, CombinationRow>;
