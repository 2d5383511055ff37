// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Parent-link resolution shared by layer and window snapshots.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::error::{Error, Result};

/// Parent id of nodes without a parent.
pub const NO_PARENT: i32 = -1;

/// Index-based topology of a flat node list.
#[derive(Debug)]
pub(crate) struct Hierarchy {
    pub(crate) parent: Vec<Option<usize>>,
    pub(crate) children: Vec<Vec<usize>>,
    pub(crate) roots: Vec<usize>,
}

impl Hierarchy {
    /// Resolves `(id, parent_id)` pairs into an acyclic forest.
    ///
    /// Children and roots are ordered by `key`.
    pub(crate) fn build<K: Ord>(
        nodes: &[(i32, i32)],
        key: impl Fn(usize) -> K,
    ) -> Result<Self> {
        let mut by_id = BTreeMap::new();
        for (i, &(id, _)) in nodes.iter().enumerate() {
            if by_id.insert(id, i).is_some() {
                return Err(Error::DuplicateNodeId(id));
            }
        }

        let mut parent = Vec::with_capacity(nodes.len());
        for &(id, parent_id) in nodes {
            if parent_id == NO_PARENT {
                parent.push(None);
            } else {
                let p = by_id.get(&parent_id).ok_or(Error::UnknownParent {
                    id,
                    parent: parent_id,
                })?;
                parent.push(Some(*p));
            }
        }

        for (i, &(id, _)) in nodes.iter().enumerate() {
            let mut cur = parent[i];
            let mut steps = 0;
            while let Some(p) = cur {
                steps += 1;
                if p == i || steps > nodes.len() {
                    return Err(Error::ParentCycle(id));
                }
                cur = parent[p];
            }
        }

        let mut children: Vec<Vec<usize>> = alloc::vec![Vec::new(); nodes.len()];
        let mut roots = Vec::new();
        for (i, p) in parent.iter().enumerate() {
            match p {
                Some(p) => children[*p].push(i),
                None => roots.push(i),
            }
        }
        roots.sort_by_key(|&i| key(i));
        for list in &mut children {
            list.sort_by_key(|&i| key(i));
        }
        Ok(Self {
            parent,
            children,
            roots,
        })
    }

    /// Node indices breadth-first from the roots.
    pub(crate) fn breadth_first(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.parent.len());
        order.extend_from_slice(&self.roots);
        let mut head = 0;
        while head < order.len() {
            let i = order[head];
            order.extend_from_slice(&self.children[i]);
            head += 1;
        }
        order
    }

    /// Node indices depth-first (pre-order) from the roots.
    pub(crate) fn depth_first(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.parent.len());
        let mut stack: Vec<usize> = self.roots.iter().rev().copied().collect();
        while let Some(i) = stack.pop() {
            order.push(i);
            stack.extend(self.children[i].iter().rev());
        }
        order
    }
}

/// Moves `items` into the given index order.
pub(crate) fn reorder<T>(items: Vec<T>, order: &[usize]) -> Vec<T> {
    let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
    order.iter().filter_map(|&i| slots[i].take()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_children_by_key() {
        let nodes = [(1, NO_PARENT), (2, 1), (3, 1), (4, 2)];
        let keys = [0, 5, 1, 0];
        let h = Hierarchy::build(&nodes, |i| keys[i]).unwrap();
        assert_eq!(h.children[0], [2, 1], "lower key first");
        assert_eq!(h.breadth_first(), [0, 2, 1, 3], "level order");
        assert_eq!(h.depth_first(), [0, 2, 1, 3], "pre-order");
    }

    #[test]
    fn self_parent_is_a_cycle() {
        let err = Hierarchy::build(&[(7, 7)], |_| 0).unwrap_err();
        assert_eq!(err, Error::ParentCycle(7), "self loop");
    }

    #[test]
    fn reorder_moves_items() {
        let v = alloc::vec!['a', 'b', 'c'];
        assert_eq!(reorder(v, &[2, 0, 1]), ['c', 'a', 'b'], "permuted");
    }
}
