//! Gap-tolerant compressed-sparse-row matrix with in-place incremental
//! construction, sparsity-pattern reuse, and clipped mat-vec.

use crate::E;
use crate::error::SolverError;
use crate::sparse::learner::SparsityLearner;

const DEFAULT_MAX_SHIFTS: usize = 8;
const GROWTH_FACTOR: f64 = 1.5;

/// Sentinel column index carried by an uninitialized slot.
const FREE: isize = -1;

/// A CSR (or CSC, if `row_major` is false) matrix whose rows may contain
/// reserved-but-unwritten slots, enabling amortized-constant insertion when
/// entries arrive roughly in column order and the sparsity pattern is
/// stable across `Solve` calls.
#[derive(Debug, Clone)]
pub struct CsrMatrix {
    rows: usize,
    cols: usize,
    row_major: bool,

    lead_index: Vec<usize>,
    trail_index: Vec<isize>,
    values: Vec<E>,
    initialized: Vec<bool>,

    pattern_locked: bool,
    lock_broken: bool,
    max_shifts: usize,
}

impl CsrMatrix {
    pub fn new(rows: usize, cols: usize, row_major: bool) -> Self {
        let lead_dim = if row_major { rows } else { cols };
        Self {
            rows,
            cols,
            row_major,
            lead_index: vec![0; lead_dim + 1],
            trail_index: Vec::new(),
            values: Vec::new(),
            initialized: Vec::new(),
            pattern_locked: false,
            lock_broken: false,
            max_shifts: DEFAULT_MAX_SHIFTS,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn row_major(&self) -> bool {
        self.row_major
    }

    pub fn set_sparsity_pattern_lock(&mut self, lock: bool) {
        self.pattern_locked = lock;
        if lock {
            self.lock_broken = false;
        }
    }

    pub fn sparsity_pattern_locked(&self) -> bool {
        self.pattern_locked
    }

    fn lead_dim(&self) -> usize {
        if self.row_major { self.rows } else { self.cols }
    }

    fn trail_bound(&self) -> usize {
        if self.row_major { self.cols } else { self.rows }
    }

    fn lead_of(&self, r: usize, c: usize) -> usize {
        if self.row_major { r } else { c }
    }

    fn trail_of(&self, r: usize, c: usize) -> usize {
        if self.row_major { c } else { r }
    }

    fn check_bounds(&self, r: usize, c: usize) -> Result<(), SolverError> {
        if r >= self.rows || c >= self.cols {
            return Err(SolverError::OutOfBounds {
                row: r,
                col: c,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(())
    }

    /// Number of initialized (real, stored) entries.
    pub fn nnz(&self) -> usize {
        self.initialized.iter().filter(|i| **i).count()
    }

    /// Physical capacity currently reserved across all rows.
    pub fn capacity(&self) -> usize {
        self.values.len()
    }

    /// True once every reserved slot holds a real entry, i.e. there are no
    /// gaps left to compact.
    pub fn is_compressed(&self) -> bool {
        self.initialized.iter().all(|i| *i)
    }

    pub fn get_element(&self, r: usize, c: usize) -> Result<E, SolverError> {
        self.check_bounds(r, c)?;
        let lead = self.lead_of(r, c);
        let trail = self.trail_of(r, c) as isize;
        let (lo, hi) = (self.lead_index[lead], self.lead_index[lead + 1]);
        for k in lo..hi {
            if self.initialized[k] && self.trail_index[k] == trail {
                return Ok(self.values[k]);
            }
        }
        Ok(0.0)
    }

    pub fn set_element(
        &mut self,
        r: usize,
        c: usize,
        v: E,
        overwrite: bool,
    ) -> Result<(), SolverError> {
        let slot = self.element(r, c)?;
        if overwrite {
            *slot = v;
        } else {
            *slot += v;
        }
        Ok(())
    }

    /// Returns a mutable handle to the value at `(r, c)`, creating a slot for
    /// it if one does not already exist.
    pub fn element(&mut self, r: usize, c: usize) -> Result<&mut E, SolverError> {
        self.check_bounds(r, c)?;
        let lead = self.lead_of(r, c);
        let trail = self.trail_of(r, c) as isize;

        if let Some(existing) = self.find_initialized(lead, trail) {
            return Ok(&mut self.values[existing]);
        }

        let slot = self.insert_slot(lead, trail)?;
        Ok(&mut self.values[slot])
    }

    fn find_initialized(&self, lead: usize, trail: isize) -> Option<usize> {
        let (lo, hi) = (self.lead_index[lead], self.lead_index[lead + 1]);
        (lo..hi).find(|&k| self.initialized[k] && self.trail_index[k] == trail)
    }

    /// Implements the slot-creation policy: try a gap already bracketed by
    /// the row's sorted neighbors, then a shift from a nearby row, then a
    /// full reallocation.
    fn insert_slot(&mut self, lead: usize, trail: isize) -> Result<usize, SolverError> {
        if self.pattern_locked {
            self.lock_broken = true;
        }

        let (lo, hi) = (self.lead_index[lead], self.lead_index[lead + 1]);

        // target = first physical index in [lo, hi) holding an initialized
        // entry with a larger trail index; lo2 = one past the last
        // initialized entry with a smaller trail index. Everything strictly
        // between lo2 and target is, by construction, an uninitialized hole.
        let mut target = hi;
        let mut lo2 = lo;
        for k in lo..hi {
            if self.initialized[k] {
                if self.trail_index[k] > trail {
                    target = k;
                    break;
                }
                lo2 = k + 1;
            }
        }

        if lo2 < target {
            let slot = lo2;
            self.trail_index[slot] = trail;
            self.initialized[slot] = true;
            self.values[slot] = 0.0;
            return Ok(slot);
        }

        // No bracketed hole: look forward, across row boundaries, for a hole
        // to shift into place.
        if let Some(hole) = self.find_forward_hole(lead, target) {
            self.shift_right(target, hole);
            self.trail_index[target] = trail;
            self.initialized[target] = true;
            self.values[target] = 0.0;
            return Ok(target);
        }

        self.grow_and_redistribute()?;
        self.insert_slot(lead, trail)
    }

    /// Scans forward from `start` (inclusive) for the nearest uninitialized
    /// slot, crossing at most `max_shifts` row boundaries beyond `lead`.
    fn find_forward_hole(&self, lead: usize, start: usize) -> Option<usize> {
        let last_lead = (lead + self.max_shifts).min(self.lead_dim().saturating_sub(1));
        let hard_end = self.lead_index[last_lead + 1];
        (start..hard_end.max(start)).find(|&k| !self.initialized[k])
    }

    /// Moves the contiguous block `[from, hole)` one physical slot to the
    /// right, opening up `from`. Every lead boundary that falls inside
    /// `(from, hole]` is bumped by one so each row's window stays consistent.
    fn shift_right(&mut self, from: usize, hole: usize) {
        let mut k = hole;
        while k > from {
            self.trail_index[k] = self.trail_index[k - 1];
            self.values[k] = self.values[k - 1];
            self.initialized[k] = self.initialized[k - 1];
            k -= 1;
        }
        self.initialized[from] = false;
        self.trail_index[from] = FREE;

        for boundary in self.lead_index.iter_mut() {
            if *boundary > from && *boundary <= hole {
                *boundary += 1;
            }
        }
    }

    /// Reallocates storage with a larger capacity, redistributing the extra
    /// headroom evenly across rows (holes land at the end of each row's new
    /// window).
    fn grow_and_redistribute(&mut self) -> Result<(), SolverError> {
        let old_nnz = self.nnz();
        let old_capacity = self.values.len().max(1);
        let new_capacity = ((old_capacity as f64 * GROWTH_FACTOR) as usize)
            .max(old_capacity + self.lead_dim())
            .max(old_nnz + self.lead_dim());

        self.redistribute(new_capacity)
    }

    fn redistribute(&mut self, new_capacity: usize) -> Result<(), SolverError> {
        let lead_dim = self.lead_dim();
        let old_nnz = self.nnz();
        if new_capacity < old_nnz {
            return Err(SolverError::Alloc);
        }

        let mut new_lead_index = vec![0usize; lead_dim + 1];

        // Preserve each row's existing entry count and spread the new
        // headroom evenly across rows (remainder to the earliest rows).
        let gap_total = new_capacity.saturating_sub(old_nnz);
        let gap_per_row = gap_total / lead_dim.max(1);
        let mut extra_remainder = gap_total % lead_dim.max(1);

        let mut new_trail = vec![FREE; new_capacity];
        let mut new_values = vec![0.0; new_capacity];
        let mut new_initialized = vec![false; new_capacity];

        let mut write = 0usize;
        for lead in 0..lead_dim {
            new_lead_index[lead] = write;
            let (lo, hi) = (self.lead_index[lead], self.lead_index[lead + 1]);
            for k in lo..hi {
                if self.initialized[k] {
                    new_trail[write] = self.trail_index[k];
                    new_values[write] = self.values[k];
                    new_initialized[write] = true;
                    write += 1;
                }
            }
            let mut row_gap = gap_per_row;
            if extra_remainder > 0 {
                row_gap += 1;
                extra_remainder -= 1;
            }
            write += row_gap;
        }
        new_lead_index[lead_dim] = write.min(new_capacity);

        self.lead_index = new_lead_index;
        self.trail_index = new_trail;
        self.values = new_values;
        self.initialized = new_initialized;
        Ok(())
    }

    /// Reinitializes the matrix for a `rows x cols` problem with `hint`
    /// reserved non-zeros. If the sparsity pattern is locked and the shape is
    /// unchanged, values are zeroed in place and the existing pattern is
    /// preserved; otherwise storage is reallocated from scratch.
    pub fn reset(&mut self, rows: usize, cols: usize, hint: usize) {
        let shape_unchanged = self.rows == rows && self.cols == cols;
        if self.pattern_locked && shape_unchanged && !self.lock_broken {
            for v in self.values.iter_mut() {
                *v = 0.0;
            }
            return;
        }

        self.rows = rows;
        self.cols = cols;
        self.lock_broken = false;
        let lead_dim = self.lead_dim();
        self.lead_index = vec![0; lead_dim + 1];
        self.trail_index = vec![FREE; hint];
        self.values = vec![0.0; hint];
        self.initialized = vec![false; hint];
        if hint > 0 {
            distribute_integer_range_on_vector(&mut self.lead_index, 0, hint);
        }
    }

    /// Packs initialized entries to the front of each row, removing gaps.
    /// Returns `true` if the matrix was already compressed.
    pub fn compress(&mut self) -> bool {
        if self.is_compressed() {
            return true;
        }

        let lead_dim = self.lead_dim();
        let mut new_lead_index = vec![0usize; lead_dim + 1];
        let mut new_trail = Vec::with_capacity(self.nnz());
        let mut new_values = Vec::with_capacity(self.nnz());

        for lead in 0..lead_dim {
            new_lead_index[lead] = new_trail.len();
            let (lo, hi) = (self.lead_index[lead], self.lead_index[lead + 1]);
            for k in lo..hi {
                if self.initialized[k] {
                    new_trail.push(self.trail_index[k]);
                    new_values.push(self.values[k]);
                }
            }
        }
        new_lead_index[lead_dim] = new_trail.len();

        let n = new_trail.len();
        self.lead_index = new_lead_index;
        self.trail_index = new_trail;
        self.values = new_values;
        self.initialized = vec![true; n];
        false
    }

    /// Compresses, then removes any entry with `|v| <= threshold`.
    pub fn prune(&mut self, threshold: E) {
        self.compress();
        let lead_dim = self.lead_dim();
        let mut new_lead_index = vec![0usize; lead_dim + 1];
        let mut new_trail = Vec::with_capacity(self.trail_index.len());
        let mut new_values = Vec::with_capacity(self.values.len());

        for lead in 0..lead_dim {
            new_lead_index[lead] = new_trail.len();
            let (lo, hi) = (self.lead_index[lead], self.lead_index[lead + 1]);
            for k in lo..hi {
                if self.values[k].abs() > threshold {
                    new_trail.push(self.trail_index[k]);
                    new_values.push(self.values[k]);
                }
            }
        }
        new_lead_index[lead_dim] = new_trail.len();

        let n = new_trail.len();
        self.lead_index = new_lead_index;
        self.trail_index = new_trail;
        self.values = new_values;
        self.initialized = vec![true; n];
    }

    /// Shrinks physical storage to exactly the current length.
    pub fn trim(&mut self) {
        self.trail_index.shrink_to_fit();
        self.values.shrink_to_fit();
        self.initialized.shrink_to_fit();
    }

    /// Rebuilds the matrix from a learned sparsity pattern: `values` is
    /// zeroed, every slot is initialized, and the matrix is compressed.
    pub fn load_sparsity_pattern(&mut self, pattern: &crate::sparse::learner::SparsityPattern) {
        let lead_dim = self.lead_dim();
        assert_eq!(pattern.rows.len(), lead_dim);

        let mut lead_index = vec![0usize; lead_dim + 1];
        let mut trail_index = Vec::with_capacity(pattern.nnz);
        let mut values = Vec::with_capacity(pattern.nnz);

        for (lead, cols) in pattern.rows.iter().enumerate() {
            lead_index[lead] = trail_index.len();
            for &c in cols {
                trail_index.push(c as isize);
                values.push(0.0);
            }
        }
        lead_index[lead_dim] = trail_index.len();

        let n = trail_index.len();
        self.lead_index = lead_index;
        self.trail_index = trail_index;
        self.values = values;
        self.initialized = vec![true; n];
        self.lock_broken = false;
    }

    /// Seeds a [`SparsityLearner`] by replaying every stored `(row, col)` pair.
    pub fn record_into(&self, learner: &mut SparsityLearner) {
        for lead in 0..self.lead_dim() {
            let (lo, hi) = (self.lead_index[lead], self.lead_index[lead + 1]);
            for k in lo..hi {
                if self.initialized[k] {
                    learner.set_element(lead, self.trail_index[k] as usize);
                }
            }
        }
    }

    /// Full mat-vec: `y = A * x`, with `y` assumed pre-sized to `rows` and
    /// `x` to `cols` (col-major orientation swaps the roles).
    pub fn mat_multiply(&self, x: &[E], y: &mut [E]) {
        self.mat_multiply_clipped(x, y, 0, self.lead_dim(), 0, self.trail_bound(), 0, 0);
    }

    /// `y[y_offset + i] = sum over j in [col_start, col_end) of A[i, j] * x[x_offset + j - col_start]`
    /// for `i` in `[row_start, row_end)`. Entries outside the clipping window
    /// are skipped. Indices here are always in `(row, col)` terms regardless
    /// of storage orientation.
    pub fn mat_multiply_clipped(
        &self,
        x: &[E],
        y: &mut [E],
        row_start: usize,
        row_end: usize,
        col_start: usize,
        col_end: usize,
        x_offset: usize,
        y_offset: usize,
    ) {
        let (lead_start, lead_end, trail_start, trail_end) = if self.row_major {
            (row_start, row_end, col_start, col_end)
        } else {
            (col_start, col_end, row_start, row_end)
        };

        for lead in lead_start..lead_end.min(self.lead_dim()) {
            let (lo, hi) = (self.lead_index[lead], self.lead_index[lead + 1]);
            let mut acc = 0.0;
            for k in lo..hi {
                if !self.initialized[k] {
                    continue;
                }
                let trail = self.trail_index[k] as usize;
                if trail < trail_start || trail >= trail_end {
                    continue;
                }
                acc += self.values[k] * x[x_offset + trail - trail_start];
            }
            y[y_offset + lead - lead_start] += acc;
        }
    }

    /// Visits every initialized `(row, col, value)` triplet, in physical
    /// order, allowing `f` to update the value in place.
    pub fn for_each_existent_value(&mut self, mut f: impl FnMut(usize, usize, &mut E)) {
        let lead_dim = self.lead_dim();
        for lead in 0..lead_dim {
            let (lo, hi) = (self.lead_index[lead], self.lead_index[lead + 1]);
            for k in lo..hi {
                if self.initialized[k] {
                    let trail = self.trail_index[k] as usize;
                    let (r, c) = if self.row_major {
                        (lead, trail)
                    } else {
                        (trail, lead)
                    };
                    f(r, c, &mut self.values[k]);
                }
            }
        }
    }

    /// Same as [`Self::for_each_existent_value`], restricted to rows
    /// `[lead_start, lead_end)` in storage order.
    pub fn for_each_existent_value_in_range(
        &mut self,
        lead_start: usize,
        lead_end: usize,
        mut f: impl FnMut(usize, usize, &mut E),
    ) {
        for lead in lead_start..lead_end.min(self.lead_dim()) {
            let (lo, hi) = (self.lead_index[lead], self.lead_index[lead + 1]);
            for k in lo..hi {
                if self.initialized[k] {
                    let trail = self.trail_index[k] as usize;
                    let (r, c) = if self.row_major {
                        (lead, trail)
                    } else {
                        (trail, lead)
                    };
                    f(r, c, &mut self.values[k]);
                }
            }
        }
    }

    /// Visits every initialized `(row, col, value)` triplet that satisfies
    /// `predicate(row, col, value)`.
    pub fn for_each_existent_value_that_meets_requirement(
        &mut self,
        mut predicate: impl FnMut(usize, usize, E) -> bool,
        mut f: impl FnMut(usize, usize, &mut E),
    ) {
        let lead_dim = self.lead_dim();
        for lead in 0..lead_dim {
            let (lo, hi) = (self.lead_index[lead], self.lead_index[lead + 1]);
            for k in lo..hi {
                if self.initialized[k] {
                    let trail = self.trail_index[k] as usize;
                    let (r, c) = if self.row_major {
                        (lead, trail)
                    } else {
                        (trail, lead)
                    };
                    if predicate(r, c, self.values[k]) {
                        f(r, c, &mut self.values[k]);
                    }
                }
            }
        }
    }

    /// Row offsets (or column offsets in col-major mode), for debugging or
    /// bridging into a direct-solver-facing format.
    pub fn lead_index(&self) -> &[usize] {
        &self.lead_index
    }

    pub fn trail_index(&self) -> &[isize] {
        &self.trail_index
    }

    pub fn values(&self) -> &[E] {
        &self.values
    }
}

impl Default for CsrMatrix {
    fn default() -> Self {
        Self::new(0, 0, true)
    }
}

/// Fills `v[0..len]` with `len` equally spaced integers from `start` to `end`
/// (both endpoints included).
pub fn distribute_integer_range_on_vector(v: &mut [usize], start: usize, end: usize) {
    let len = v.len();
    if len == 0 {
        return;
    }
    if len == 1 {
        v[0] = start;
        return;
    }
    let span = end as f64 - start as f64;
    for (i, slot) in v.iter_mut().enumerate() {
        *slot = start + ((span * i as f64) / (len as f64 - 1.0)).round() as usize;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dense_from(mat: &CsrMatrix) -> Vec<Vec<E>> {
        let mut out = vec![vec![0.0; mat.cols()]; mat.rows()];
        for r in 0..mat.rows() {
            for c in 0..mat.cols() {
                out[r][c] = mat.get_element(r, c).unwrap();
            }
        }
        out
    }

    #[test]
    fn sparsity_pattern_reuse_scenario() {
        let learner_pattern = {
            let mut learner = SparsityLearner::new(3);
            for (r, c) in [(0, 0), (0, 2), (1, 1), (2, 0), (2, 2)] {
                learner.set_element(r, c);
            }
            learner.sparsity_pattern()
        };

        let mut mat = CsrMatrix::new(3, 3, true);
        mat.load_sparsity_pattern(&learner_pattern);

        assert_eq!(mat.lead_index(), &[0, 2, 3, 5]);
        assert_eq!(mat.trail_index(), &[0, 2, 1, 0, 2]);
        assert!(mat.is_compressed());

        mat.set_sparsity_pattern_lock(true);
        mat.reset(3, 3, 0);
        for (r, c, v) in [(0, 0, 1.0), (0, 2, 2.0), (1, 1, 3.0), (2, 0, 4.0), (2, 2, 5.0)] {
            mat.set_element(r, c, v, true).unwrap();
        }

        assert_eq!(mat.lead_index(), &[0, 2, 3, 5]);
        assert_eq!(mat.trail_index(), &[0, 2, 1, 0, 2]);
        assert!(mat.is_compressed());
        assert_eq!(mat.get_element(1, 1).unwrap(), 3.0);
    }

    #[test]
    fn prune_removes_negligible_entries() {
        let mut mat = CsrMatrix::new(2, 2, true);
        mat.set_element(0, 0, 1e-20, true).unwrap();
        mat.set_element(0, 1, 1.0, true).unwrap();
        mat.set_element(1, 0, -1.0, true).unwrap();
        mat.set_element(1, 1, 1e-20, true).unwrap();

        mat.prune(1e-10);

        assert!(mat.is_compressed());
        assert_eq!(mat.nnz(), 2);
        assert_eq!(mat.get_element(0, 1).unwrap(), 1.0);
        assert_eq!(mat.get_element(1, 0).unwrap(), -1.0);
        assert_eq!(mat.get_element(0, 0).unwrap(), 0.0);
        assert_eq!(mat.get_element(1, 1).unwrap(), 0.0);
    }

    #[test]
    fn round_trip_and_sorted_rows_out_of_order_inserts() {
        let mut mat = CsrMatrix::new(4, 4, true);
        let entries = [(2, 3, 1.0), (0, 1, 2.0), (2, 0, 3.0), (0, 3, 4.0), (2, 2, 5.0)];
        for (r, c, v) in entries {
            mat.set_element(r, c, v, true).unwrap();
        }

        for r in 0..mat.rows() {
            let (lo, hi) = (mat.lead_index()[r], mat.lead_index()[r + 1]);
            let mut last = None;
            for k in lo..hi {
                if !mat.initialized[k] {
                    continue;
                }
                let t = mat.trail_index()[k];
                if let Some(prev) = last {
                    assert!(prev < t);
                }
                last = Some(t);
            }
        }

        for (r, c, v) in entries {
            assert_eq!(mat.get_element(r, c).unwrap(), v);
        }
    }

    #[test]
    fn nnz_accounting_matches_initialized_count() {
        let mut mat = CsrMatrix::new(3, 3, true);
        mat.set_element(0, 0, 1.0, true).unwrap();
        mat.set_element(1, 1, 2.0, true).unwrap();
        assert_eq!(mat.nnz(), mat.initialized.iter().filter(|i| **i).count());

        mat.compress();
        assert_eq!(mat.nnz(), mat.lead_index()[mat.lead_index().len() - 1]);
    }

    #[test]
    fn mat_vec_matches_dense_reference() {
        let mut mat = CsrMatrix::new(3, 3, true);
        let dense_ref = [
            [1.0, 0.0, 2.0],
            [0.0, 3.0, 0.0],
            [4.0, 0.0, 5.0],
        ];
        for r in 0..3 {
            for c in 0..3 {
                if dense_ref[r][c] != 0.0 {
                    mat.set_element(r, c, dense_ref[r][c], true).unwrap();
                }
            }
        }

        let x = [1.0, 2.0, 3.0];
        let mut y = vec![0.0; 3];
        mat.mat_multiply(&x, &mut y);

        for r in 0..3 {
            let expected: E = (0..3).map(|c| dense_ref[r][c] * x[c]).sum();
            assert!((y[r] - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn clipped_full_range_matches_full_multiply_and_empty_range_is_zero() {
        let mut mat = CsrMatrix::new(2, 2, true);
        mat.set_element(0, 0, 1.0, true).unwrap();
        mat.set_element(0, 1, 2.0, true).unwrap();
        mat.set_element(1, 0, 3.0, true).unwrap();
        mat.set_element(1, 1, 4.0, true).unwrap();

        let x = [1.0, 1.0];
        let mut y_full = vec![0.0; 2];
        mat.mat_multiply(&x, &mut y_full);

        let mut y_clipped = vec![0.0; 2];
        mat.mat_multiply_clipped(&x, &mut y_clipped, 0, 2, 0, 2, 0, 0);
        assert_eq!(y_full, y_clipped);

        let mut y_empty = vec![0.0; 2];
        mat.mat_multiply_clipped(&x, &mut y_empty, 0, 0, 0, 0, 0, 0);
        assert_eq!(y_empty, vec![0.0, 0.0]);
    }

    #[test]
    fn grows_storage_when_row_has_no_available_hole() {
        let mut mat = CsrMatrix::new(2, 5, true);
        for c in 0..5 {
            mat.set_element(0, c, c as E, true).unwrap();
        }
        let _ = dense_from(&mat);
        assert_eq!(mat.get_element(0, 3).unwrap(), 3.0);
    }

    #[test]
    fn out_of_bounds_access_is_reported() {
        let mat = CsrMatrix::new(2, 2, true);
        assert!(matches!(
            mat.get_element(5, 0),
            Err(SolverError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn column_major_orientation_swaps_roles() {
        let mut mat = CsrMatrix::new(2, 3, false);
        mat.set_element(0, 2, 9.0, true).unwrap();
        assert_eq!(mat.get_element(0, 2).unwrap(), 9.0);
        assert_eq!(mat.get_element(1, 2).unwrap(), 0.0);
    }
}
