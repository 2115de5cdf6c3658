//! 双向 contig 图：每个节点都与其反向互补节点成对存放（下标 2i / 2i+1）。
//!
//! 节点由图以 arena 方式持有，外部只通过 [`NodeId`] 引用。

mod traverse;

use std::collections::HashSet;
use std::fmt::Write as _;

use crate::error::{GamlError, Result};

/// Index into the graph's node arena.
pub type NodeId = usize;

#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub seq: Vec<u8>,
    /// 反向互补节点
    pub rc: NodeId,
    /// 出边
    pub next: Vec<NodeId>,
    /// 入边
    pub prev: Vec<NodeId>,
}

impl Node {
    #[inline]
    pub fn len(&self) -> usize {
        self.seq.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }

    /// A node at or above `threshold` bases is treated as unambiguous.
    #[inline]
    pub fn is_big(&self, threshold: usize) -> bool {
        self.seq.len() >= threshold
    }
}

#[derive(Debug, Clone)]
pub struct Graph {
    nodes: Vec<Node>,
    k: usize,
}

impl Graph {
    pub fn new(k: usize) -> Self {
        Self { nodes: Vec::new(), k }
    }

    /// k-mer size the draft assembly was built with; consecutive contigs
    /// overlap by `k - 1` bases.
    #[inline]
    pub fn k(&self) -> usize {
        self.k
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    #[inline]
    pub fn rc(&self, id: NodeId) -> NodeId {
        self.nodes[id].rc
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Appends a contig and its reverse complement, returning `(forward, backward)`.
    pub fn add_node_pair(&mut self, forward: Vec<u8>, backward: Vec<u8>) -> (NodeId, NodeId) {
        let f = self.nodes.len();
        let b = f + 1;
        self.nodes.push(Node { id: f, seq: forward, rc: b, next: Vec::new(), prev: Vec::new() });
        self.nodes.push(Node { id: b, seq: backward, rc: f, next: Vec::new(), prev: Vec::new() });
        (f, b)
    }

    /// Adds `from -> to` together with its dual `rc(to) -> rc(from)`.
    pub fn add_arc(&mut self, from: NodeId, to: NodeId) -> Result<()> {
        let n = self.nodes.len();
        if from >= n || to >= n {
            return Err(GamlError::InvalidGraph(format!(
                "arc {} -> {} references a node outside 0..{}",
                from, to, n
            )));
        }
        self.link(from, to);
        let (rc_to, rc_from) = (self.rc(to), self.rc(from));
        self.link(rc_to, rc_from);
        Ok(())
    }

    fn link(&mut self, from: NodeId, to: NodeId) {
        if self.nodes[from].next.contains(&to) {
            return;
        }
        self.nodes[from].next.push(to);
        self.nodes[to].prev.push(from);
    }

    #[inline]
    pub fn has_edge(&self, from: NodeId, to: NodeId) -> bool {
        self.nodes[from].next.contains(&to)
    }

    /// Forward-strand contigs of at least `threshold` bases, used as seeds.
    pub fn big_nodes(&self, threshold: usize) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|n| n.id % 2 == 0 && n.is_big(threshold))
            .map(|n| n.id)
            .collect()
    }

    /// Graphviz rendering of the edges touching `nodes`, labelled `id(len)`.
    pub fn to_dot(&self, nodes: &[NodeId]) -> String {
        let label = |id: NodeId| format!("\"{}({})\"", id, self.nodes[id].len());
        let mut out = String::from("digraph G {\n");
        let mut seen: HashSet<(NodeId, NodeId)> = HashSet::new();
        for &n in nodes {
            for &next in &self.nodes[n].next {
                if seen.insert((n, next)) {
                    let _ = writeln!(out, "{} -> {}", label(n), label(next));
                }
            }
            for &into in &self.nodes[n].prev {
                if seen.insert((into, n)) {
                    let _ = writeln!(out, "{} -> {}", label(into), label(n));
                }
            }
        }
        out.push_str("}\n");
        out
    }
}

/// Velvet 的有符号节点编号：`x` -> `(x-1)*2`，`-x` -> `(x-1)*2+1`。
pub fn velvet_to_internal(x: i64) -> Option<NodeId> {
    match x {
        0 => None,
        x if x > 0 => Some(((x - 1) * 2) as NodeId),
        x => Some(((-x - 1) * 2 + 1) as NodeId),
    }
}

pub fn internal_to_velvet(id: NodeId) -> i64 {
    let base = (id / 2) as i64 + 1;
    if id % 2 == 0 {
        base
    } else {
        -base
    }
}
