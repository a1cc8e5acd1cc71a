//! Topological scheduling.
//!
//! [`kahn_sort`] works on dense indices so the engine (arena slots) and the
//! mixer router (track order) can share it. A [`Schedule`] is the engine's
//! cached result: execution order plus, for each step, the slots it sums.

use std::collections::VecDeque;

use super::NodeId;

/// Kahn's algorithm over a dense adjacency list.
///
/// `adjacency[i]` lists the successors of node `i`; indices out of range are
/// ignored. Zero in-degree nodes are seeded in index order and processed
/// FIFO, so the result is deterministic.
///
/// Returns the full order, or `Err(order)` holding the partial order when a
/// cycle prevents some nodes from being scheduled.
///
/// ```rust
/// use cadenza_core::graph::kahn_sort;
///
/// let order = kahn_sort(&[vec![1], vec![2], vec![]]);
/// assert_eq!(order, Ok(vec![0, 1, 2]));
///
/// let cyclic = kahn_sort(&[vec![1], vec![0]]);
/// assert_eq!(cyclic, Err(vec![]));
/// ```
pub fn kahn_sort(adjacency: &[Vec<usize>]) -> Result<Vec<usize>, Vec<usize>> {
    let n = adjacency.len();
    let mut in_degree = vec![0usize; n];
    for successors in adjacency {
        for &to in successors {
            if to < n {
                in_degree[to] += 1;
            }
        }
    }

    let mut queue: VecDeque<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(n);

    while let Some(idx) = queue.pop_front() {
        order.push(idx);
        for &to in &adjacency[idx] {
            if to < n {
                in_degree[to] -= 1;
                if in_degree[to] == 0 {
                    queue.push_back(to);
                }
            }
        }
    }

    if order.len() == n { Ok(order) } else { Err(order) }
}

/// A computed execution plan for the engine.
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    pub(crate) order: Vec<NodeId>,
    /// Arena slot indices feeding each step, parallel to `order`.
    pub(crate) upstream: Vec<Vec<usize>>,
}

impl Schedule {
    /// Nodes in processing order.
    pub fn order(&self) -> &[NodeId] {
        &self.order
    }

    /// Number of scheduled nodes.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true if nothing is scheduled.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diamond() {
        // 0 -> 1, 0 -> 2, 1 -> 3, 2 -> 3
        let order = kahn_sort(&[vec![1, 2], vec![3], vec![3], vec![]]).expect("acyclic");
        let pos = |i| order.iter().position(|&x| x == i).expect("scheduled");
        assert!(pos(0) < pos(1));
        assert!(pos(0) < pos(2));
        assert!(pos(1) < pos(3));
        assert!(pos(2) < pos(3));
    }

    #[test]
    fn test_partial_order_on_cycle() {
        // 0 -> 1 -> 2 -> 1
        let err = kahn_sort(&[vec![1], vec![2], vec![1]]).expect_err("cyclic");
        assert_eq!(err, vec![0]);
    }

    #[test]
    fn test_self_loop_is_cycle() {
        assert!(kahn_sort(&[vec![0]]).is_err());
    }

    #[test]
    fn test_empty() {
        assert_eq!(kahn_sort(&[]), Ok(vec![]));
    }
}
