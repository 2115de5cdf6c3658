use std::collections::{HashSet, VecDeque};

use super::{Graph, Node, NodeId};

impl Graph {
    /// BFS over out-edges. Big nodes other than `start` are reported but not
    /// explored through.
    pub fn reach_forward_with_threshold(&self, start: NodeId, threshold: usize) -> Vec<NodeId> {
        self.bfs(start, threshold, |n| n.next.iter().copied().collect())
    }

    /// BFS over edges in both directions, with the same big-node stopping rule.
    pub fn reach_local_with_threshold(&self, start: NodeId, threshold: usize) -> Vec<NodeId> {
        self.bfs(start, threshold, |n| n.next.iter().chain(n.prev.iter()).copied().collect())
    }

    /// 汇流盆地：沿入边 BFS，得到所有能到达 `target` 的节点（含 `target` 本身）。
    pub fn drainage_basin(&self, target: NodeId, threshold: usize) -> HashSet<NodeId> {
        self.bfs(target, threshold, |n| n.prev.iter().copied().collect())
            .into_iter()
            .collect()
    }

    fn bfs<F>(&self, start: NodeId, threshold: usize, neighbours: F) -> Vec<NodeId>
    where
        F: Fn(&Node) -> Vec<NodeId>,
    {
        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut order = Vec::new();
        let mut queue = VecDeque::new();
        visited.insert(start);
        queue.push_back(start);
        while let Some(id) = queue.pop_front() {
            order.push(id);
            let node = self.node(id);
            if id != start && node.is_big(threshold) {
                continue;
            }
            for next in neighbours(node) {
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        order
    }
}
