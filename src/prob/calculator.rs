use std::collections::BTreeMap;
use std::sync::Arc;

use log::debug;

use super::{AlignmentModel, ProbabilityChange, ScoringParams};
use crate::align::PathAligner;
use crate::graph::Graph;
use crate::path::{diff_path_sets, paths_length, Path};

/// Per-read accumulated state: summed alignment probability and alignment count.
#[derive(Debug, Clone, Copy, Default)]
struct ReadState {
    prob: f64,
    count: usize,
}

/// 增量对数似然计算器。
///
/// 每条 read 的贡献为 `max(ln(p_r) − ln(L), floor_r)`，`p_r` 是该 read 在全部
/// 路径上所有比对的概率和，`L` 是路径集合展开后的总长度（含 k−1 前缀）。
///
/// `paths_probability` 只比对新增与删除的路径并就地估算新总分；
/// 未受影响且高于下限的 read 按 `ln(L_old/L_new)` 平移。`commit` 写回并精确重算。
///
/// 已提交的路径保持其被比对时的方向：一条按反向互补匹配上的路径沿用旧实例，
/// 这样之后删除它时减去的正是当初加上的那组比对。
pub struct ReadProbabilityCalculator<M: AlignmentModel> {
    model: M,
    params: ScoringParams,
    aligner: PathAligner<M::Reads>,
    floors: Vec<f64>,
    reads: Vec<ReadState>,
    committed: Vec<Path>,
    paths_length: usize,
    total_log_prob: f64,
    above_floor: usize,
}

#[inline]
fn log_length(len: usize) -> f64 {
    (len.max(1) as f64).ln()
}

impl<M: AlignmentModel> ReadProbabilityCalculator<M> {
    pub fn new(model: M, params: ScoringParams, reads: Arc<M::Reads>, cache_size: usize) -> Self {
        let n = model.read_count(&reads);
        let floors: Vec<f64> = (0..n).map(|r| params.min_log_prob(model.read_length(&reads, r))).collect();
        let total_log_prob = floors.iter().sum();
        Self {
            model,
            params,
            aligner: PathAligner::new(reads, cache_size),
            floors,
            reads: vec![ReadState::default(); n],
            committed: Vec::new(),
            paths_length: 0,
            total_log_prob,
            above_floor: 0,
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn params(&self) -> &ScoringParams {
        &self.params
    }

    pub fn reads(&self) -> &M::Reads {
        self.aligner.source()
    }

    pub fn aligner(&self) -> &PathAligner<M::Reads> {
        &self.aligner
    }

    pub fn read_count(&self) -> usize {
        self.reads.len()
    }

    /// Log-likelihood of the committed path set.
    pub fn total_log_prob(&self) -> f64 {
        self.total_log_prob
    }

    pub fn committed_paths(&self) -> &[Path] {
        &self.committed
    }

    fn read_term(&self, read_id: usize, state: ReadState, log_len: f64) -> f64 {
        let floor = self.floors[read_id];
        if state.count == 0 || state.prob <= 0.0 {
            return floor;
        }
        (state.prob.ln() - log_len).max(floor)
    }

    /// 估算 `paths` 的对数似然，不修改已提交状态（比对缓存除外）。
    ///
    /// Unchanged reads sitting at their floor are not re-examined, so when `L`
    /// shrinks one of them may in fact rise above the floor. `new_total` is then a
    /// lower bound; `commit` computes the exact value.
    pub fn paths_probability(&mut self, paths: &[Path], graph: &Graph) -> ProbabilityChange<M::Alignment> {
        let diff = diff_path_sets(&self.committed, paths, graph);
        let new_len = paths_length(paths, graph);
        let added_alignments = self.aligner.alignments_for_paths(&diff.added, graph);
        let removed_alignments = self.aligner.alignments_for_paths(&diff.removed, graph);

        let mut changed: BTreeMap<usize, ReadState> = BTreeMap::new();
        {
            let reads = self.aligner.source();
            let mut fold = |alignments: &[Arc<Vec<M::Alignment>>], sign: f64| {
                for a in alignments.iter().flat_map(|set| set.iter()) {
                    let r = self.model.read_id(a);
                    let p = self.model.alignment_prob(&self.params, reads, a);
                    let s = changed.entry(r).or_insert(self.reads[r]);
                    s.prob += sign * p;
                    if sign > 0.0 {
                        s.count += 1;
                    } else {
                        s.count = s.count.saturating_sub(1);
                    }
                }
            };
            fold(&added_alignments, 1.0);
            fold(&removed_alignments, -1.0);
        }

        let old_log_len = log_length(self.paths_length);
        let new_log_len = log_length(new_len);
        let mut total = self.total_log_prob;
        let mut changed_above = 0usize;
        let mut new_read_probs = Vec::with_capacity(changed.len());
        for (&r, &state) in &changed {
            let state = if state.count == 0 { ReadState::default() } else { state };
            let old_term = self.read_term(r, self.reads[r], old_log_len);
            if old_term > self.floors[r] {
                changed_above += 1;
            }
            total += self.read_term(r, state, new_log_len) - old_term;
            new_read_probs.push((r, state.prob, state.count));
        }
        let unchanged_above = self.above_floor.saturating_sub(changed_above);
        total += unchanged_above as f64 * (old_log_len - new_log_len);

        ProbabilityChange {
            new_paths: diff.kept_orientation,
            added_paths: diff.added,
            removed_paths: diff.removed,
            added_alignments,
            removed_alignments,
            new_paths_length: new_len,
            new_read_probs,
            new_total: total,
        }
    }

    /// 接受一次变化，并精确重算总分。
    pub fn commit(&mut self, change: ProbabilityChange<M::Alignment>) {
        for (r, prob, count) in change.new_read_probs {
            self.reads[r] = if count == 0 { ReadState::default() } else { ReadState { prob: prob.max(0.0), count } };
        }
        self.committed = change.new_paths;
        self.paths_length = change.new_paths_length;

        let log_len = log_length(self.paths_length);
        let mut total = 0.0;
        let mut above = 0usize;
        for (r, &state) in self.reads.iter().enumerate() {
            let term = self.read_term(r, state, log_len);
            if term > self.floors[r] {
                above += 1;
            }
            total += term;
        }
        if (total - change.new_total).abs() > 1e-6 * total.abs().max(1.0) {
            debug!("committed log-probability {:.6} differs from estimate {:.6}", total, change.new_total);
        }
        self.total_log_prob = total;
        self.above_floor = above;
    }
}
