use std::sync::Arc;

use crate::path::Path;

/// 一次候选路径集合相对已提交状态的变化。
///
/// 由 `paths_probability` 产生，只有 `commit` 会把它写回计算器。
#[derive(Debug, Clone)]
pub struct ProbabilityChange<A> {
    pub new_paths: Vec<Path>,
    pub added_paths: Vec<Path>,
    pub removed_paths: Vec<Path>,
    pub added_alignments: Vec<Arc<Vec<A>>>,
    pub removed_alignments: Vec<Arc<Vec<A>>>,
    pub new_paths_length: usize,
    /// (read id, 概率和, 比对条数)，只含受影响的 read
    pub new_read_probs: Vec<(usize, f64, usize)>,
    pub new_total: f64,
}

impl<A> ProbabilityChange<A> {
    pub fn is_noop(&self) -> bool {
        self.added_paths.is_empty() && self.removed_paths.is_empty()
    }

    pub fn added_alignment_count(&self) -> usize {
        self.added_alignments.iter().map(|a| a.len()).sum()
    }

    pub fn removed_alignment_count(&self) -> usize {
        self.removed_alignments.iter().map(|a| a.len()).sum()
    }
}
