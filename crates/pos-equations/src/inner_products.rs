//! Maintains `B·x` (really `C·x`, since feasibility only cares about the
//! combination set's rows) incrementally as `x` or the rows change
//! (spec.md §4.2).

use crate::ids::{RowId, VarId};
use crate::numeric::ratio_to_zero;
use indexmap::IndexMap;

/// The signed error of each row of C, `r · x`. Only nonzero entries are
/// stored.
#[derive(Default)]
pub struct InnerProductTracker {
    products: IndexMap<RowId, f64>,
}

impl InnerProductTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, row: RowId) -> f64 {
        self.products.get(&row).copied().unwrap_or(0.0)
    }

    fn store(&mut self, row: RowId, value: f64, zero_rounding: f64) {
        if value.abs() <= zero_rounding {
            self.products.shift_remove(&row);
        } else {
            self.products.insert(row, value);
        }
    }

    /// `innerProducts[row] += delta` for a single variable's coefficient
    /// contribution — used when exactly one component of `x` changes and the
    /// row's coefficient for that variable is known.
    pub fn add_to_products(&mut self, row: RowId, coeff: f64, delta: f64, zero_rounding: f64) {
        if coeff == 0.0 || delta == 0.0 {
            return;
        }
        let prev = self.get(row);
        let next = prev + coeff * delta;
        let magnitude = prev.abs().max((coeff * delta).abs());
        self.store(row, ratio_to_zero(next, magnitude, zero_rounding), zero_rounding);
    }

    /// Applies `add_to_products` for every row containing `column`, given a
    /// coefficient lookup. Mirrors the contract name `addDualToProducts` —
    /// "dual" is the changed variable, seen from every row it participates
    /// in.
    pub fn add_dual_to_products(
        &mut self,
        rows: impl IntoIterator<Item = (RowId, f64)>,
        delta: f64,
        zero_rounding: f64,
    ) {
        for (row, coeff) in rows {
            self.add_to_products(row, coeff, delta, zero_rounding);
        }
    }

    /// Recomputes a row's inner product from scratch given a full
    /// `row · x` value (used after structural changes where an incremental
    /// update isn't available, e.g. after `eliminate`).
    pub fn calc_inner_product(&mut self, row: RowId, value: f64, zero_rounding: f64) {
        self.store(row, value, zero_rounding);
    }

    /// `products[dst] += scalar * products[src]` — the row-combination rule
    /// used whenever `CombinationVectors::add_comb_to_comb_vector` (or
    /// `eliminate`) combines rows, so the tracker stays in lockstep without
    /// recomputing a dot product.
    pub fn add_vectors(&mut self, dst: RowId, src: RowId, scalar: f64, zero_rounding: f64) {
        if scalar == 0.0 {
            return;
        }
        let prev = self.get(dst);
        let src_val = self.get(src);
        let next = prev + scalar * src_val;
        let magnitude = prev.abs().max((scalar * src_val).abs());
        self.store(dst, ratio_to_zero(next, magnitude, zero_rounding), zero_rounding);
    }

    pub fn set_to_zero(&mut self, row: RowId) {
        self.products.shift_remove(&row);
    }

    pub fn nonzero_rows(&self) -> impl Iterator<Item = RowId> + '_ {
        self.products.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn remove(&mut self, row: RowId) {
        self.products.shift_remove(&row);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_to_products_flushes_tiny_results() {
        let mut t = InnerProductTracker::new();
        t.calc_inner_product(RowId(0), 1.0, 1e-9);
        t.add_to_products(RowId(0), 1.0, -1.0, 1e-9);
        assert_eq!(t.get(RowId(0)), 0.0);
        assert!(t.is_empty());
    }

    #[test]
    fn add_vectors_combines_rows() {
        let mut t = InnerProductTracker::new();
        t.calc_inner_product(RowId(0), 2.0, 1e-9);
        t.calc_inner_product(RowId(1), 3.0, 1e-9);
        t.add_vectors(RowId(0), RowId(1), -1.0, 1e-9);
        assert_eq!(t.get(RowId(0)), -1.0);
    }
}
