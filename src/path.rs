//! Walks over the contig graph and the operations the moves are built from.

use std::collections::{HashMap, VecDeque};
use std::fmt::Write as _;
use std::ops::Index;

use rand::Rng;

use crate::graph::{Graph, NodeId};
use crate::util::dna;

/// One step of a walk: a graph contig, or a run of `N` of unresolved length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathNode {
    Contig(NodeId),
    Gap(usize),
}

impl PathNode {
    /// Gaps are their own complement.
    #[inline]
    pub fn rc(self, graph: &Graph) -> Self {
        match self {
            PathNode::Contig(id) => PathNode::Contig(graph.rc(id)),
            gap => gap,
        }
    }

    #[inline]
    pub fn is_gap(self) -> bool {
        matches!(self, PathNode::Gap(_))
    }

    #[inline]
    pub fn gap_length(self) -> usize {
        match self {
            PathNode::Gap(len) => len,
            PathNode::Contig(_) => 0,
        }
    }

    #[inline]
    pub fn contig(self) -> Option<NodeId> {
        match self {
            PathNode::Contig(id) => Some(id),
            PathNode::Gap(_) => None,
        }
    }

    /// Signed id used in debug output: the node id, or `-length` for gaps.
    pub fn debug_id(self) -> i64 {
        match self {
            PathNode::Contig(id) => id as i64,
            PathNode::Gap(len) => -(len as i64),
        }
    }

    #[inline]
    pub fn seq_len(self, graph: &Graph) -> usize {
        match self {
            PathNode::Contig(id) => graph.node(id).len(),
            PathNode::Gap(len) => len,
        }
    }

    /// Gaps are never big.
    #[inline]
    pub fn is_big(self, graph: &Graph, threshold: usize) -> bool {
        match self {
            PathNode::Contig(id) => graph.node(id).is_big(threshold),
            PathNode::Gap(_) => false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Path {
    nodes: Vec<PathNode>,
    /// Provenance tag for diagnostics only.
    history: String,
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes
    }
}

impl Eq for Path {}

impl Index<usize> for Path {
    type Output = PathNode;

    fn index(&self, i: usize) -> &PathNode {
        &self.nodes[i]
    }
}

impl Path {
    pub fn new(nodes: Vec<PathNode>) -> Self {
        Self { nodes, history: String::new() }
    }

    pub fn from_contigs(ids: &[NodeId]) -> Self {
        Self::new(ids.iter().map(|&id| PathNode::Contig(id)).collect())
    }

    pub fn from_node(id: NodeId) -> Self {
        Self::new(vec![PathNode::Contig(id)])
    }

    #[inline]
    pub fn nodes(&self) -> &[PathNode] {
        &self.nodes
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
    pub fn front(&self) -> Option<PathNode> {
        self.nodes.first().copied()
    }

    #[inline]
    pub fn back(&self) -> Option<PathNode> {
        self.nodes.last().copied()
    }

    pub fn history(&self) -> &str {
        &self.history
    }

    pub fn add_history(&mut self, tag: &str) {
        if !self.history.is_empty() {
            self.history.push(',');
        }
        self.history.push_str(tag);
    }

    /// The sub-walk `range`, with an empty history.
    pub fn slice(&self, range: std::ops::Range<usize>) -> Path {
        Path::new(self.nodes[range].to_vec())
    }

    /// Every consecutive pair not involving a gap must be a graph edge.
    pub fn check(&self, graph: &Graph) -> bool {
        self.nodes.windows(2).all(|w| match (w[0], w[1]) {
            (PathNode::Contig(a), PathNode::Contig(b)) => graph.has_edge(a, b),
            _ => true,
        })
    }

    pub fn append_path(&mut self, other: &Path) {
        self.nodes.extend_from_slice(&other.nodes);
    }

    pub fn append_path_with_gap(&mut self, other: &Path, gap_length: usize) {
        self.nodes.push(PathNode::Gap(gap_length));
        self.nodes.extend_from_slice(&other.nodes);
    }

    /// Glues `other` onto the end, sharing the node both walks have in common.
    ///
    /// Panics if `self.back() != other.front()`.
    pub fn merge_with(&mut self, other: &Path) {
        assert_eq!(self.back(), other.front(), "merged paths must share their junction node");
        self.nodes.extend_from_slice(&other.nodes[1..]);
    }

    /// In place: complements in reverse order.
    pub fn reverse(&mut self, graph: &Graph) {
        self.nodes.reverse();
        for n in self.nodes.iter_mut() {
            *n = n.rc(graph);
        }
    }

    pub fn reversed(&self, graph: &Graph) -> Path {
        Path {
            nodes: self.nodes.iter().rev().map(|n| n.rc(graph)).collect(),
            history: self.history.clone(),
        }
    }

    /// Literal identity of the walk; this is the alignment-cache key.
    #[inline]
    pub fn is_same_no_reverse(&self, other: &Path) -> bool {
        self.nodes == other.nodes
    }

    /// Identity up to reverse complement.
    pub fn is_same(&self, other: &Path, graph: &Graph) -> bool {
        if self.nodes.len() != other.nodes.len() {
            return false;
        }
        self.is_same_no_reverse(other)
            || self
                .nodes
                .iter()
                .zip(other.nodes.iter().rev())
                .all(|(&a, &b)| a == b.rc(graph))
    }

    /// Orientation-independent key: the smaller of the walk and its reverse.
    pub fn canonical_key(&self, graph: &Graph) -> Vec<PathNode> {
        let rev: Vec<PathNode> = self.nodes.iter().rev().map(|n| n.rc(graph)).collect();
        if rev < self.nodes {
            rev
        } else {
            self.nodes.clone()
        }
    }

    fn ending_len(&self, graph: &Graph) -> usize {
        match self.front() {
            Some(PathNode::Contig(id)) => graph.k().saturating_sub(1).min(graph.node(graph.rc(id)).len()),
            _ => 0,
        }
    }

    /// Flattens the walk. With `with_endings`, the `k-1` bases that precede the
    /// first contig are rebuilt from its reverse complement.
    pub fn to_seq(&self, graph: &Graph, with_endings: bool) -> Vec<u8> {
        debug_assert!(!self.nodes.is_empty(), "flattening an empty path");
        let mut out = Vec::with_capacity(self.seq_len(graph, with_endings));
        if with_endings {
            if let Some(PathNode::Contig(first)) = self.front() {
                let ending = dna::revcomp(&graph.node(graph.rc(first)).seq);
                out.extend_from_slice(&ending[..self.ending_len(graph)]);
            }
        }
        for &n in &self.nodes {
            match n {
                PathNode::Contig(id) => out.extend_from_slice(&graph.node(id).seq),
                PathNode::Gap(len) => out.extend(dna::gap_seq(len)),
            }
        }
        out
    }

    /// `to_seq(..).len()` without building the sequence.
    pub fn seq_len(&self, graph: &Graph, with_endings: bool) -> usize {
        let body: usize = self.nodes.iter().map(|n| n.seq_len(graph)).sum();
        if with_endings {
            body + self.ending_len(graph)
        } else {
            body
        }
    }

    /// 随机向后延伸：每步均匀选择末节点的一个后继。
    ///
    /// 返回 `false` 表示走到了没有后继的节点（此时路径恢复原状）；
    /// 接上大节点或用完步数/距离预算时返回 `true`。
    pub fn extend_randomly<R: Rng>(
        &mut self,
        graph: &Graph,
        rng: &mut R,
        big_threshold: usize,
        step_limit: usize,
        distance_limit: usize,
    ) -> bool {
        let original_len = self.nodes.len();
        let mut steps = 0usize;
        let mut distance = 0usize;
        loop {
            let last = match self.back() {
                Some(PathNode::Contig(id)) => id,
                _ => break,
            };
            let next = &graph.node(last).next;
            if next.is_empty() {
                break;
            }
            let chosen = next[rng.gen_range(0..next.len())];
            self.nodes.push(PathNode::Contig(chosen));
            if graph.node(chosen).is_big(big_threshold) {
                return true;
            }
            steps += 1;
            distance += graph.node(chosen).len();
            if steps >= step_limit || distance >= distance_limit {
                return true;
            }
        }
        self.nodes.truncate(original_len);
        false
    }

    /// Splits into `[0, pos)` (kept in `self`) and `[pos, end)` (returned), then
    /// trims small nodes off the two new open ends.
    pub fn cut_at(&mut self, pos: usize, graph: &Graph, big_threshold: usize) -> Path {
        let mut suffix = Path::new(self.nodes.split_off(pos));
        while self.back().is_some_and(|n| !n.is_big(graph, big_threshold)) {
            self.nodes.pop();
        }
        let keep_from = suffix
            .nodes
            .iter()
            .position(|n| n.is_big(graph, big_threshold))
            .unwrap_or(suffix.nodes.len());
        suffix.nodes.drain(..keep_from);
        suffix.history = self.history.clone();
        suffix
    }

    /// `(1,2,-50,3)`
    pub fn to_debug_string(&self) -> String {
        let mut out = String::from("(");
        for (i, n) in self.nodes.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            let _ = write!(out, "{}", n.debug_id());
        }
        out.push(')');
        out
    }
}

pub fn build_paths_from_single_nodes(nodes: &[NodeId]) -> Vec<Path> {
    nodes.iter().map(|&n| Path::from_node(n)).collect()
}

pub fn paths_to_debug_string(paths: &[Path]) -> String {
    let body: Vec<String> = paths.iter().map(Path::to_debug_string).collect();
    format!("{} paths:  {}", paths.len(), body.join("   "))
}

/// Total flattened length of a path set, endings included.
pub fn paths_length(paths: &[Path], graph: &Graph) -> usize {
    paths.iter().map(|p| p.seq_len(graph, true)).sum()
}

/// Result of [`diff_path_sets`].
#[derive(Debug, Clone, Default)]
pub struct PathSetDiff {
    /// `new` minus `old`
    pub added: Vec<Path>,
    /// `old` minus `new`
    pub removed: Vec<Path>,
    /// `new` in order, except that a path matched against `old` is replaced by
    /// the `old` instance, which keeps the orientation it was scored in.
    pub kept_orientation: Vec<Path>,
}

/// Multiset difference of two path sets, up to reverse complement.
pub fn diff_path_sets(old: &[Path], new: &[Path], graph: &Graph) -> PathSetDiff {
    let mut remaining: HashMap<Vec<PathNode>, VecDeque<usize>> = HashMap::new();
    for (i, p) in old.iter().enumerate() {
        remaining.entry(p.canonical_key(graph)).or_default().push_back(i);
    }
    let mut used = vec![false; old.len()];
    let mut diff = PathSetDiff::default();
    for p in new {
        match remaining.get_mut(&p.canonical_key(graph)).and_then(VecDeque::pop_front) {
            Some(i) => {
                used[i] = true;
                diff.kept_orientation.push(old[i].clone());
            }
            None => {
                diff.added.push(p.clone());
                diff.kept_orientation.push(p.clone());
            }
        }
    }
    diff.removed = old.iter().zip(used).filter(|&(_, u)| !u).map(|(p, _)| p.clone()).collect();
    diff
}

/// `(added, removed)` of [`diff_path_sets`].
pub fn compare_path_sets(old: &[Path], new: &[Path], graph: &Graph) -> (Vec<Path>, Vec<Path>) {
    let diff = diff_path_sets(old, new, graph);
    (diff.added, diff.removed)
}
