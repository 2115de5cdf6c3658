use std::sync::Arc;

use log::info;

use super::{PairedReadProbabilityCalculator, ProbabilityChange, SingleReadProbabilityCalculator};
use crate::align::{MateView, PairedReadAlignment, PathAligner, SingleReadAlignment};
use crate::graph::Graph;
use crate::path::Path;

struct SingleEntry {
    calc: SingleReadProbabilityCalculator,
    weight: f64,
}

struct PairedEntry {
    calc: PairedReadProbabilityCalculator,
    weight: f64,
    /// 作为 join 建议来源时的 mate 比对缓存
    mates: Option<PathAligner<MateView>>,
}

/// Changes of every read set for one proposal, plus their weighted total.
#[derive(Debug, Clone)]
pub struct ProbabilityChanges {
    pub single: Vec<ProbabilityChange<SingleReadAlignment>>,
    pub paired: Vec<ProbabilityChange<PairedReadAlignment>>,
    pub total: f64,
}

/// 建议用双端集合：打分器和未配对的 mate 比对。
pub struct AdviceSet<'a> {
    pub calc: &'a mut PairedReadProbabilityCalculator,
    pub mates: &'a mut PathAligner<MateView>,
}

/// 多个 read 集合的加权对数似然。
#[derive(Default)]
pub struct GlobalProbabilityCalculator {
    single: Vec<SingleEntry>,
    paired: Vec<PairedEntry>,
}

impl GlobalProbabilityCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_single(&mut self, calc: SingleReadProbabilityCalculator, weight: f64) {
        self.single.push(SingleEntry { calc, weight });
    }

    /// `use_as_advice` 的集合额外保留一份 mate 比对缓存供 join 使用。
    pub fn add_paired(&mut self, calc: PairedReadProbabilityCalculator, weight: f64, use_as_advice: bool, cache_size: usize) {
        let mates = use_as_advice.then(|| PathAligner::new(Arc::new(MateView(calc.aligner().source_arc())), cache_size));
        self.paired.push(PairedEntry { calc, weight, mates });
    }

    pub fn single_count(&self) -> usize {
        self.single.len()
    }

    pub fn paired_count(&self) -> usize {
        self.paired.len()
    }

    pub fn is_empty(&self) -> bool {
        self.single.is_empty() && self.paired.is_empty()
    }

    /// Indices (into the paired sets) usable by the join move.
    pub fn advice_sets(&self) -> Vec<usize> {
        self.paired.iter().enumerate().filter(|(_, e)| e.mates.is_some()).map(|(i, _)| i).collect()
    }

    pub fn advice(&mut self, index: usize) -> Option<AdviceSet<'_>> {
        let entry = self.paired.get_mut(index)?;
        let mates = entry.mates.as_mut()?;
        Some(AdviceSet { calc: &mut entry.calc, mates })
    }

    pub fn total_log_prob(&self) -> f64 {
        self.single.iter().map(|e| e.weight * e.calc.total_log_prob()).sum::<f64>()
            + self.paired.iter().map(|e| e.weight * e.calc.total_log_prob()).sum::<f64>()
    }

    pub fn paths_probability(&mut self, paths: &[Path], graph: &Graph) -> ProbabilityChanges {
        let mut total = 0.0;
        let single = self
            .single
            .iter_mut()
            .map(|e| {
                let c = e.calc.paths_probability(paths, graph);
                total += e.weight * c.new_total;
                c
            })
            .collect();
        let paired = self
            .paired
            .iter_mut()
            .map(|e| {
                let c = e.calc.paths_probability(paths, graph);
                total += e.weight * c.new_total;
                c
            })
            .collect();
        ProbabilityChanges { single, paired, total }
    }

    pub fn commit(&mut self, changes: ProbabilityChanges) {
        for (e, c) in self.single.iter_mut().zip(changes.single) {
            e.calc.commit(c);
        }
        for (e, c) in self.paired.iter_mut().zip(changes.paired) {
            e.calc.commit(c);
        }
    }

    pub fn log_summary(&self) {
        for (i, e) in self.single.iter().enumerate() {
            let s = e.calc.aligner().stats();
            info!(
                "single read set {}: {} reads, log-prob {:.4}, cache {} hits / {} misses / {} flushes",
                i,
                e.calc.read_count(),
                e.calc.total_log_prob(),
                s.hits,
                s.misses,
                s.flushes
            );
        }
        for (i, e) in self.paired.iter().enumerate() {
            let s = e.calc.aligner().stats();
            info!(
                "paired read set {}: {} pairs, log-prob {:.4}, cache {} hits / {} misses / {} flushes",
                i,
                e.calc.read_count(),
                e.calc.total_log_prob(),
                s.hits,
                s.misses,
                s.flushes
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::{Orientation, PairedReadSet, SingleReadSet};
    use crate::index::AnyReadIndex;
    use crate::io::graph::tests::{k41_graph, NODE1_FWD};
    use crate::prob::{PairedModel, ScoringParams};
    use crate::util::dna;

    fn global() -> GlobalProbabilityCalculator {
        let node = NODE1_FWD.as_bytes();
        let single = SingleReadSet::from_reads(vec![node.to_vec()], AnyReadIndex::standard(13));
        let first = SingleReadSet::from_reads(vec![node[0..30].to_vec()], AnyReadIndex::standard(13));
        let second = SingleReadSet::from_reads(vec![dna::revcomp(&node[80..110])], AnyReadIndex::standard(13));
        let pairs = PairedReadSet::new(first, second, Orientation::FR).unwrap();

        let mut g = GlobalProbabilityCalculator::new();
        g.add_single(SingleReadProbabilityCalculator::single(Arc::new(single), ScoringParams::default(), 16), 1.0);
        g.add_paired(
            PairedReadProbabilityCalculator::paired(
                Arc::new(pairs),
                PairedModel::new(110.0, 10.0),
                ScoringParams::default(),
                16,
            ),
            0.5,
            true,
            16,
        );
        g
    }

    #[test]
    fn weighted_sum_of_read_sets() {
        let graph = k41_graph();
        let mut g = global();
        let initial = g.total_log_prob();
        assert!((initial - (-94.7 + 0.5 * -52.0)).abs() < 1e-9);
        let changes = g.paths_probability(&[Path::from_node(0)], &graph);
        let expected = -6.297495003258137 + 0.5 * -8.905948142393267;
        assert!((changes.total - expected).abs() < 1e-6);
        g.commit(changes);
        assert!((g.total_log_prob() - expected).abs() < 1e-6);
    }

    #[test]
    fn advice_sets_expose_mate_alignments() {
        let graph = k41_graph();
        let mut g = global();
        assert_eq!(g.advice_sets(), vec![0]);
        let advice = g.advice(0).unwrap();
        let mates = advice.mates.alignments_for_path(&Path::from_node(0), &graph);
        assert_eq!(mates.first.len(), 1);
        assert_eq!(mates.second.len(), 1);
        assert!(g.advice(1).is_none());
    }
}
