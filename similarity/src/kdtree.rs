//! An unbalanced k-d tree over fixed-dimension `f32` points.
//!
//! Nodes are owned, singly-rooted `Box` chains - there is no atomic or
//! epoch-based reclamation here, unlike the lock-free variant this crate
//! is descended from. Every mutation happens with the owning store's
//! mutex already held, so the tree itself has nothing left to synchronize.
//! Deletion is intentionally not supported: callers that need to drop a
//! point rebuild the tree from scratch via [`KdTree::insert`].

use crate::distance::squared_euclidean_distance;
use crate::error::Error;

#[derive(Debug, Clone)]
struct Node {
    point: Vec<f32>,
    index: usize,
    left: Option<Box<Node>>,
    right: Option<Box<Node>>,
}

/// A k-d tree indexing points of a fixed `dimension`.
///
/// Each stored point carries an external `index` - a weak reference into
/// whatever sequence owns the actual record. The tree never dereferences
/// that index; it is the caller's job to resolve it back into a record.
#[derive(Debug, Clone)]
pub struct KdTree {
    root: Option<Box<Node>>,
    dimension: usize,
    len: usize,
}

impl KdTree {
    /// Creates an empty tree over `dimension`-dimensional points.
    pub fn new(dimension: usize) -> Self {
        Self {
            root: None,
            dimension,
            len: 0,
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Inserts a copy of `point`, tagged with the caller's `index`.
    ///
    /// Axis at depth `h` is `h mod dimension`; a point goes left of a node
    /// when it is strictly less on that axis, right otherwise (so ties on
    /// the splitting axis go right - this also decides near-child order
    /// during [`KdTree::nearest`]).
    #[tracing::instrument(skip(self, point))]
    pub fn insert(&mut self, point: Vec<f32>, index: usize) -> Result<(), Error> {
        if point.len() != self.dimension {
            return Err(Error::DimensionMisMatch {
                expected: self.dimension,
                found: point.len(),
            });
        }
        Self::insert_recursive(&mut self.root, point, index, 0, self.dimension);
        self.len += 1;
        Ok(())
    }

    fn insert_recursive(
        slot: &mut Option<Box<Node>>,
        point: Vec<f32>,
        index: usize,
        depth: usize,
        dimension: usize,
    ) {
        match slot {
            None => {
                *slot = Some(Box::new(Node {
                    point,
                    index,
                    left: None,
                    right: None,
                }));
            }
            Some(node) => {
                let axis = depth % dimension;
                if point[axis] < node.point[axis] {
                    Self::insert_recursive(&mut node.left, point, index, depth + 1, dimension);
                } else {
                    Self::insert_recursive(&mut node.right, point, index, depth + 1, dimension);
                }
            }
        }
    }

    /// Returns the external index of the stored point nearest `query` in
    /// squared Euclidean distance, or `None` if the tree is empty.
    ///
    /// On exact ties the point encountered first along the near-child-first
    /// search path wins, which - because insertion never rebalances -
    /// coincides with whichever of the tied points was inserted earlier
    /// whenever both sit on the same root-to-leaf path.
    #[tracing::instrument(skip(self, query))]
    pub fn nearest(&self, query: &[f32]) -> Option<usize> {
        if query.len() != self.dimension {
            return None;
        }
        let root = self.root.as_deref()?;
        let mut best_index = root.index;
        let mut best_dist = squared_euclidean_distance(query, &root.point);
        Self::nearest_recursive(
            root,
            query,
            0,
            self.dimension,
            &mut best_index,
            &mut best_dist,
        );
        Some(best_index)
    }

    fn nearest_recursive(
        node: &Node,
        query: &[f32],
        depth: usize,
        dimension: usize,
        best_index: &mut usize,
        best_dist: &mut f32,
    ) {
        let dist = squared_euclidean_distance(query, &node.point);
        if dist < *best_dist {
            *best_dist = dist;
            *best_index = node.index;
        }

        let axis = depth % dimension;
        let delta = query[axis] - node.point[axis];
        let (near, far) = if delta < 0.0 {
            (&node.left, &node.right)
        } else {
            (&node.right, &node.left)
        };

        if let Some(near) = near.as_deref() {
            Self::nearest_recursive(near, query, depth + 1, dimension, best_index, best_dist);
        }
        if delta * delta < *best_dist {
            if let Some(far) = far.as_deref() {
                Self::nearest_recursive(far, query, depth + 1, dimension, best_index, best_dist);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_tree_has_no_nearest() {
        let tree = KdTree::new(3);
        assert_eq!(tree.nearest(&[0.0, 0.0, 0.0]), None);
    }

    #[test]
    fn single_point_is_its_own_nearest() {
        let mut tree = KdTree::new(2);
        tree.insert(vec![1.0, 2.0], 0).unwrap();
        assert_eq!(tree.nearest(&[5.0, 5.0]), Some(0));
    }

    #[test]
    fn nearest_matches_brute_force() {
        let points: Vec<(Vec<f32>, usize)> = vec![
            (vec![0.0, 0.0], 0),
            (vec![10.0, 10.0], 1),
            (vec![3.0, 4.0], 2),
        ];
        let mut tree = KdTree::new(2);
        for (p, i) in &points {
            tree.insert(p.clone(), *i).unwrap();
        }
        // closest to [2, 3] is [3, 4] at squared distance 2
        assert_eq!(tree.nearest(&[2.0, 3.0]), Some(2));
    }

    #[test]
    fn rejects_mismatched_dimension_on_insert() {
        let mut tree = KdTree::new(3);
        let err = tree.insert(vec![1.0, 2.0], 0).unwrap_err();
        assert!(matches!(
            err,
            Error::DimensionMisMatch {
                expected: 3,
                found: 2
            }
        ));
    }

    #[test]
    fn axis_invariant_holds_after_many_inserts() {
        let mut tree = KdTree::new(3);
        let mut points = Vec::new();
        for i in 0..200 {
            let point = vec![
                rand::random::<f32>() * 1000.0,
                rand::random::<f32>() * 1000.0,
                rand::random::<f32>() * 1000.0,
            ];
            tree.insert(point.clone(), i).unwrap();
            points.push(point);
        }
        assert_invariant(tree.root.as_deref(), 0, 3);

        // nearest must agree with brute force for a handful of queries
        for q in [[0.0, 0.0, 0.0], [500.0, 500.0, 500.0], [999.0, 1.0, 42.0]] {
            let got = tree.nearest(&q).unwrap();
            let expected = points
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| {
                    let da: f32 = a.iter().zip(&q).map(|(v, qv)| (v - qv).powi(2)).sum();
                    let db: f32 = b.iter().zip(&q).map(|(v, qv)| (v - qv).powi(2)).sum();
                    da.partial_cmp(&db).unwrap()
                })
                .map(|(i, _)| i)
                .unwrap();
            let got_dist: f32 = points[got]
                .iter()
                .zip(&q)
                .map(|(v, qv)| (v - qv).powi(2))
                .sum();
            let expected_dist: f32 = points[expected]
                .iter()
                .zip(&q)
                .map(|(v, qv)| (v - qv).powi(2))
                .sum();
            assert_eq!(got_dist, expected_dist);
        }
    }

    fn assert_invariant(node: Option<&Node>, depth: usize, dimension: usize) {
        let Some(node) = node else { return };
        let axis = depth % dimension;
        if let Some(left) = node.left.as_deref() {
            assert!(left.point[axis] < node.point[axis]);
            assert_invariant(Some(left), depth + 1, dimension);
        }
        if let Some(right) = node.right.as_deref() {
            assert!(right.point[axis] >= node.point[axis]);
            assert_invariant(Some(right), depth + 1, dimension);
        }
    }
}
