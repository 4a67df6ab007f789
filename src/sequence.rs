//! Storage for sequences indexed by a signed recurrence index.

use std::ops::{Index, IndexMut};

/// A doubly-infinite sequence held as two growable arrays: index `r >= 0`
/// lives at `nonneg[r]` and `r < 0` at `neg[-r - 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Indexed<T> {
    nonneg: Vec<T>,
    neg: Vec<T>,
}

impl<T> Indexed<T> {
    pub fn new() -> Self {
        Indexed { nonneg: Vec::new(), neg: Vec::new() }
    }

    /// Builds a sequence from its two branches, the negative branch
    /// ordered `r = -1, -2, ...`.
    pub fn from_branches(nonneg: Vec<T>, neg: Vec<T>) -> Self {
        Indexed { nonneg, neg }
    }

    pub fn nonneg(&self) -> &[T] {
        &self.nonneg
    }

    pub fn neg(&self) -> &[T] {
        &self.neg
    }

    /// Number of stored entries with `r >= 0`.
    pub fn nonneg_len(&self) -> usize {
        self.nonneg.len()
    }

    /// Number of stored entries with `r < 0`.
    pub fn neg_len(&self) -> usize {
        self.neg.len()
    }

    pub fn contains(&self, r: i64) -> bool {
        if r >= 0 {
            (r as usize) < self.nonneg.len()
        } else {
            ((-r - 1) as usize) < self.neg.len()
        }
    }

    pub fn get(&self, r: i64) -> Option<&T> {
        if r >= 0 {
            self.nonneg.get(r as usize)
        } else {
            self.neg.get((-r - 1) as usize)
        }
    }

    /// Replaces the `r >= 0` branch, leaving the other untouched.
    pub fn replace_nonneg(&mut self, values: Vec<T>) {
        self.nonneg = values;
    }

    /// Replaces the `r < 0` branch, leaving the other untouched.
    pub fn replace_neg(&mut self, values: Vec<T>) {
        self.neg = values;
    }

    /// Splits the sequence into its two branches, as taken by
    /// [`from_branches`](Self::from_branches).
    pub fn into_branches(self) -> (Vec<T>, Vec<T>) {
        (self.nonneg, self.neg)
    }

    /// Keeps indices `0..len`.
    pub fn truncate_nonneg(&mut self, len: usize) {
        self.nonneg.truncate(len);
    }

    /// Keeps indices `-len..0`.
    pub fn truncate_neg(&mut self, len: usize) {
        self.neg.truncate(len);
    }
}

impl<T: Clone> Indexed<T> {
    /// Grows whichever branch holds `r` until `r` is addressable, filling
    /// new entries with `fill`.
    pub fn ensure_len(&mut self, r: i64, fill: &T) {
        if r >= 0 {
            let len = r as usize + 1;
            if self.nonneg.len() < len {
                self.nonneg.resize(len, fill.clone());
            }
        } else {
            let len = (-r) as usize;
            if self.neg.len() < len {
                self.neg.resize(len, fill.clone());
            }
        }
    }
}

impl<T> Default for Indexed<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<i64> for Indexed<T> {
    type Output = T;

    fn index(&self, r: i64) -> &T {
        if r >= 0 {
            &self.nonneg[r as usize]
        } else {
            &self.neg[(-r - 1) as usize]
        }
    }
}

impl<T> IndexMut<i64> for Indexed<T> {
    fn index_mut(&mut self, r: i64) -> &mut T {
        if r >= 0 {
            &mut self.nonneg[r as usize]
        } else {
            &mut self.neg[(-r - 1) as usize]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_indexing() {
        let mut seq: Indexed<i32> = Indexed::new();
        seq.ensure_len(3, &0);
        seq.ensure_len(-2, &0);
        assert_eq!(seq.nonneg_len(), 4);
        assert_eq!(seq.neg_len(), 2);

        seq[3] = 30;
        seq[-1] = -10;
        seq[-2] = -20;
        assert_eq!(seq.nonneg(), &[0, 0, 0, 30]);
        assert_eq!(seq.neg(), &[-10, -20]);
        assert_eq!(seq.get(-3), None);
        assert!(seq.contains(-2) && !seq.contains(4));

        seq.truncate_neg(1);
        assert_eq!(seq.get(-2), None);
        seq.replace_nonneg(vec![1]);
        assert_eq!(seq[0], 1);
        assert_eq!(seq[-1], -10);
    }
}
