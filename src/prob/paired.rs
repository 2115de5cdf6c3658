use std::f64::consts::PI;
use std::sync::Arc;

use super::{AlignmentModel, ReadProbabilityCalculator, ScoringParams};
use crate::align::{PairedReadAlignment, PairedReadSet};

/// 双端 read：两端比对概率之积，再乘以插入片段长度的高斯密度。
/// 方向与 read 集合配置不一致的配对概率为 0。
#[derive(Debug, Clone, Copy)]
pub struct PairedModel {
    pub mean_distance: f64,
    pub std_distance: f64,
}

impl PairedModel {
    pub fn new(mean_distance: f64, std_distance: f64) -> Self {
        Self { mean_distance, std_distance }
    }

    pub fn insert_density(&self, insert_length: i64) -> f64 {
        let z = (insert_length as f64 - self.mean_distance) / self.std_distance;
        (-0.5 * z * z).exp() / (self.std_distance * (2.0 * PI).sqrt())
    }
}

impl AlignmentModel for PairedModel {
    type Alignment = PairedReadAlignment;
    type Reads = PairedReadSet;

    fn read_count(&self, reads: &PairedReadSet) -> usize {
        reads.len()
    }

    fn read_length(&self, reads: &PairedReadSet, read_id: usize) -> usize {
        reads.first().read(read_id).len() + reads.second().read(read_id).len()
    }

    fn read_id(&self, alignment: &PairedReadAlignment) -> usize {
        alignment.read_id
    }

    fn alignment_prob(&self, params: &ScoringParams, reads: &PairedReadSet, a: &PairedReadAlignment) -> f64 {
        if a.orientation != reads.orientation() {
            return 0.0;
        }
        let len1 = reads.first().read(a.read_id).len();
        let len2 = reads.second().read(a.read_id).len();
        params.alignment_prob(a.dist1, len1) * params.alignment_prob(a.dist2, len2) * self.insert_density(a.insert_length)
    }
}

pub type PairedReadProbabilityCalculator = ReadProbabilityCalculator<PairedModel>;

impl PairedReadProbabilityCalculator {
    pub fn paired(reads: Arc<PairedReadSet>, model: PairedModel, params: ScoringParams, cache_size: usize) -> Self {
        Self::new(model, params, reads, cache_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::{Orientation, SingleReadSet};
    use crate::index::AnyReadIndex;
    use crate::io::graph::tests::{k41_graph, NODE1_FWD};
    use crate::path::Path;
    use crate::util::dna;

    fn mates(orientation: Orientation) -> Arc<PairedReadSet> {
        let node = NODE1_FWD.as_bytes();
        let first = SingleReadSet::from_reads(vec![node[0..30].to_vec()], AnyReadIndex::standard(13));
        let second = SingleReadSet::from_reads(vec![dna::revcomp(&node[80..110])], AnyReadIndex::standard(13));
        Arc::new(PairedReadSet::new(first, second, orientation).unwrap())
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-6, "{} != {}", a, b);
    }

    #[test]
    fn density_peaks_at_mean() {
        let m = PairedModel::new(300.0, 30.0);
        assert!(m.insert_density(300) > m.insert_density(330));
        assert_close(m.insert_density(330), m.insert_density(270));
    }

    #[test]
    fn consistent_pair_scores_above_floor() {
        let g = k41_graph();
        let mut calc =
            PairedReadProbabilityCalculator::paired(mates(Orientation::FR), PairedModel::new(110.0, 10.0), ScoringParams::default(), 16);
        let change = calc.paths_probability(&[Path::from_node(0)], &g);
        assert_eq!(change.added_alignment_count(), 1);
        // 60 · ln(0.99) + ln(N(110; 110, 10)) − ln(161)
        assert_close(change.new_total, -8.905948142393267);
    }

    #[test]
    fn reversed_path_scores_the_same() {
        let g = k41_graph();
        let mut calc =
            PairedReadProbabilityCalculator::paired(mates(Orientation::FR), PairedModel::new(110.0, 10.0), ScoringParams::default(), 16);
        let fwd = calc.paths_probability(&[Path::from_node(0)], &g).new_total;
        let mut calc =
            PairedReadProbabilityCalculator::paired(mates(Orientation::FR), PairedModel::new(110.0, 10.0), ScoringParams::default(), 16);
        let rev = calc.paths_probability(&[Path::from_node(1)], &g).new_total;
        assert_close(fwd, rev);
    }

    #[test]
    fn wrong_orientation_falls_to_floor() {
        let g = k41_graph();
        let mut calc =
            PairedReadProbabilityCalculator::paired(mates(Orientation::RF), PairedModel::new(110.0, 10.0), ScoringParams::default(), 16);
        let change = calc.paths_probability(&[Path::from_node(0)], &g);
        assert_eq!(change.added_alignment_count(), 0);
        assert_close(change.new_total, -10.0 - 0.7 * 60.0);
    }

    #[test]
    fn implausible_insert_falls_to_floor() {
        let g = k41_graph();
        let mut calc =
            PairedReadProbabilityCalculator::paired(mates(Orientation::FR), PairedModel::new(5000.0, 10.0), ScoringParams::default(), 16);
        let change = calc.paths_probability(&[Path::from_node(0)], &g);
        assert_close(change.new_total, -52.0);
    }

    #[test]
    fn commit_keeps_paired_state() {
        let g = k41_graph();
        let mut calc =
            PairedReadProbabilityCalculator::paired(mates(Orientation::FR), PairedModel::new(110.0, 10.0), ScoringParams::default(), 16);
        let change = calc.paths_probability(&[Path::from_node(0)], &g);
        calc.commit(change);
        assert_close(calc.total_log_prob(), -8.905948142393267);
        let change = calc.paths_probability(&[Path::from_node(2)], &g);
        assert_eq!(change.removed_alignment_count(), 1);
        calc.commit(change);
        assert_close(calc.total_log_prob(), -52.0);
    }
}
