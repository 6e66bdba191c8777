/////////////////////////////////////////////////////////////////////////////////////////////
//
// Wraps the `rstar` crate to build spatial R-trees for nearest neighbour lookups.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # spatial
//!
//! Wrapper module for the rstar crate.
//!
//! Bulk loads planar points tagged with their row index and answers
//! nearest neighbour queries with that index.

use rstar::RTree;
use rstar::primitives::GeomWithData;

/// A planar point carrying the row index it came from.
type IndexedPoint = GeomWithData<[f64; 2], usize>;

/// R-tree over 2D points.
#[derive(Debug, Clone)]
pub struct PointIndex {
    tree: RTree<IndexedPoint>,
}

impl PointIndex {
    /// Builds an index over the paired coordinate slices.
    pub fn new(x: &[f64], y: &[f64]) -> Self {
        let items = x
            .iter()
            .zip(y.iter())
            .enumerate()
            .map(|(i, (&px, &py))| GeomWithData::new([px, py], i))
            .collect::<Vec<_>>();
        Self {
            tree: RTree::bulk_load(items),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Index of the stored point closest to `(x, y)`, or `None` for an empty index.
    #[inline]
    pub fn nearest(&self, x: f64, y: f64) -> Option<usize> {
        self.tree.nearest_neighbor(&[x, y]).map(|item| item.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_returns_original_row() {
        let index = PointIndex::new(&[0.0, 10.0, 5.0], &[0.0, 0.0, 5.0]);
        assert_eq!(index.len(), 3);
        assert_eq!(index.nearest(9.0, 1.0), Some(1));
        assert_eq!(index.nearest(4.0, 6.0), Some(2));
        assert_eq!(index.nearest(-3.0, -3.0), Some(0));
    }

    #[test]
    fn empty_index_has_no_neighbour() {
        let index = PointIndex::new(&[], &[]);
        assert!(index.is_empty());
        assert_eq!(index.nearest(0.0, 0.0), None);
    }
}
