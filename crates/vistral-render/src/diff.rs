#![forbid(unsafe_code)]

//! Cell-level diff between two buffers of the same size.
//!
//! Changes are collected in row-major order and grouped into [`ChangeRun`]s so
//! the presenter positions the cursor once per run instead of once per cell.

use crate::buffer::Buffer;

/// Contiguous changed cells on one row, `x0..=x1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeRun {
    pub y: u16,
    pub x0: u16,
    pub x1: u16,
}

#[derive(Debug, Clone, Default)]
pub struct BufferDiff {
    changes: Vec<(u16, u16)>,
}

impl BufferDiff {
    /// Every cell of `new`; used for the first frame and after a resize.
    pub fn full(new: &Buffer) -> Self {
        let mut changes = Vec::with_capacity(new.cells().len());
        for y in 0..new.height() {
            for x in 0..new.width() {
                changes.push((x, y));
            }
        }
        Self { changes }
    }

    /// Cells that differ. Falls back to [`BufferDiff::full`] on a size mismatch.
    pub fn compute(old: &Buffer, new: &Buffer) -> Self {
        if old.width() != new.width() || old.height() != new.height() {
            return Self::full(new);
        }
        let mut changes = Vec::new();
        for (i, (a, b)) in old.cells().iter().zip(new.cells()).enumerate() {
            if a != b {
                let w = usize::from(new.width());
                changes.push(((i % w) as u16, (i / w) as u16));
            }
        }
        Self { changes }
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn changes(&self) -> &[(u16, u16)] {
        &self.changes
    }

    /// Coalesce horizontally adjacent changes.
    pub fn runs(&self) -> Vec<ChangeRun> {
        let mut runs: Vec<ChangeRun> = Vec::new();
        for &(x, y) in &self.changes {
            match runs.last_mut() {
                Some(run) if run.y == y && run.x1 + 1 == x => run.x1 = x,
                _ => runs.push(ChangeRun { y, x0: x, x1: x }),
            }
        }
        runs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;

    #[test]
    fn identical_buffers_have_no_diff() {
        let a = Buffer::new(10, 3);
        assert!(BufferDiff::compute(&a, &a.clone()).is_empty());
    }

    #[test]
    fn adjacent_changes_form_one_run() {
        let old = Buffer::new(10, 2);
        let mut new = old.clone();
        new.set(2, 1, Cell::from_char('a'));
        new.set(3, 1, Cell::from_char('b'));
        new.set(7, 1, Cell::from_char('c'));
        let diff = BufferDiff::compute(&old, &new);
        assert_eq!(diff.len(), 3);
        assert_eq!(
            diff.runs(),
            vec![
                ChangeRun { y: 1, x0: 2, x1: 3 },
                ChangeRun { y: 1, x0: 7, x1: 7 },
            ]
        );
    }

    #[test]
    fn size_mismatch_is_full_redraw() {
        let old = Buffer::new(2, 2);
        let new = Buffer::new(3, 1);
        assert_eq!(BufferDiff::compute(&old, &new).len(), 3);
    }
}
