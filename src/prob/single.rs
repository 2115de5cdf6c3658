use super::{AlignmentModel, ReadProbabilityCalculator, ScoringParams};
use crate::align::{SingleReadAlignment, SingleReadSet};

/// 单端 read：比对概率只取决于编辑距离与 read 长度。
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleModel;

impl AlignmentModel for SingleModel {
    type Alignment = SingleReadAlignment;
    type Reads = SingleReadSet;

    fn read_count(&self, reads: &SingleReadSet) -> usize {
        reads.len()
    }

    fn read_length(&self, reads: &SingleReadSet, read_id: usize) -> usize {
        reads.read(read_id).len()
    }

    fn read_id(&self, alignment: &SingleReadAlignment) -> usize {
        alignment.read_id
    }

    fn alignment_prob(&self, params: &ScoringParams, reads: &SingleReadSet, a: &SingleReadAlignment) -> f64 {
        params.alignment_prob(a.dist, reads.read(a.read_id).len())
    }
}

pub type SingleReadProbabilityCalculator = ReadProbabilityCalculator<SingleModel>;

impl SingleReadProbabilityCalculator {
    pub fn single(reads: std::sync::Arc<SingleReadSet>, params: ScoringParams, cache_size: usize) -> Self {
        Self::new(SingleModel, params, reads, cache_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;
    use crate::index::AnyReadIndex;
    use crate::io::graph::tests::{k41_graph, NODE1_FWD};
    use crate::path::Path;
    use std::sync::Arc;

    fn calculator(reads: &[&[u8]]) -> SingleReadProbabilityCalculator {
        let set = SingleReadSet::from_reads(reads.iter().map(|r| r.to_vec()).collect(), AnyReadIndex::standard(13));
        SingleReadProbabilityCalculator::single(Arc::new(set), ScoringParams::default(), 100)
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-6, "{} != {}", a, b);
    }

    #[test]
    fn exact_read_on_single_node() {
        let g = k41_graph();
        let mut calc = calculator(&[NODE1_FWD.as_bytes()]);
        let change = calc.paths_probability(&[Path::from_node(0)], &g);
        // 121 · ln(0.99) − ln(161)
        assert_close(change.new_total, -6.297495003258137);
        assert_eq!(change.new_paths_length, 161);
    }

    #[test]
    fn unaligned_read_stays_at_floor() {
        let g = k41_graph();
        let mut calc = calculator(&[&[b'A'; 121]]);
        let change = calc.paths_probability(&[Path::from_node(0)], &g);
        assert_close(change.new_total, -94.7);
    }

    #[test]
    fn exact_path_beats_mismatched_path() {
        let g = k41_graph();
        let mut read = NODE1_FWD.as_bytes().to_vec();
        for p in [20, 50, 80, 110] {
            read[p] = if read[p] == b'A' { b'C' } else { b'A' };
        }
        let mut exact = calculator(&[NODE1_FWD.as_bytes()]);
        let mut mismatched = calculator(&[&read]);
        let paths = [Path::from_node(0)];
        let good = exact.paths_probability(&paths, &g).new_total;
        let bad = mismatched.paths_probability(&paths, &g).new_total;
        assert!(good > bad);
        assert!(bad > -94.7);
    }

    #[test]
    fn repeated_occurrences_add_up() {
        // the read occurs twice in the node
        let part: &[u8] = b"GATTACAGGCTTAACCGTAGCATGCAATCGTACCGGTTAACGTAGCTAGC";
        let mut seq = part.to_vec();
        seq.extend(std::iter::repeat(b'C').take(40));
        seq.extend_from_slice(part);
        seq.extend(std::iter::repeat(b'A').take(40));
        // complement line chosen so the rebuilt ending is a poly-C run
        let mut g = Graph::new(41);
        g.add_node_pair(seq.clone(), vec![b'G'; seq.len()]);
        let mut calc = calculator(&[part]);
        let change = calc.paths_probability(&[Path::from_node(0)], &g);
        assert_eq!(change.new_paths_length, 220);
        assert_close(change.new_total, -5.202997158467489);
    }

    #[test]
    fn identical_reads_count_separately() {
        let g = k41_graph();
        let mut calc = calculator(&[NODE1_FWD.as_bytes(), NODE1_FWD.as_bytes()]);
        let change = calc.paths_probability(&[Path::from_node(0)], &g);
        assert_close(change.new_total, 2.0 * -6.297495003258137);
    }

    #[test]
    fn evaluation_does_not_mutate_until_commit() {
        let g = k41_graph();
        let mut calc = calculator(&[NODE1_FWD.as_bytes()]);
        let before = calc.total_log_prob();
        let change = calc.paths_probability(&[Path::from_node(0)], &g);
        assert_close(calc.total_log_prob(), before);
        assert!(calc.committed_paths().is_empty());
        let estimate = change.new_total;
        calc.commit(change);
        assert_close(calc.total_log_prob(), estimate);
        assert_eq!(calc.committed_paths().len(), 1);
    }

    #[test]
    fn unchanged_set_is_a_noop() {
        let g = k41_graph();
        let mut calc = calculator(&[NODE1_FWD.as_bytes()]);
        let paths = vec![Path::from_node(0)];
        let change = calc.paths_probability(&paths, &g);
        calc.commit(change);
        let again = calc.paths_probability(&paths, &g);
        assert!(again.is_noop());
        assert_close(again.new_total, calc.total_log_prob());
    }

    #[test]
    fn incremental_estimate_matches_commit() {
        let g = k41_graph();
        let mut calc = calculator(&[NODE1_FWD.as_bytes(), &NODE1_FWD.as_bytes()[30..90]]);
        let c = calc.paths_probability(&[Path::from_node(0)], &g);
        calc.commit(c);
        // adding a second path changes the length only; both reads stay above floor
        let c = calc.paths_probability(&[Path::from_node(0), Path::from_node(2)], &g);
        assert_eq!(c.added_paths.len(), 1);
        assert!(c.removed_paths.is_empty());
        let estimate = c.new_total;
        calc.commit(c);
        assert_close(calc.total_log_prob(), estimate);
        // and removing the aligned path drops both reads to their floors
        let c = calc.paths_probability(&[Path::from_node(2)], &g);
        let estimate = c.new_total;
        calc.commit(c);
        assert_close(calc.total_log_prob(), estimate);
        assert_close(estimate, -94.7 + (-10.0 - 0.7 * 60.0));
    }

    #[test]
    fn reversed_path_is_compared_up_to_orientation() {
        let g = k41_graph();
        let mut calc = calculator(&[NODE1_FWD.as_bytes()]);
        let c = calc.paths_probability(&[Path::from_node(0)], &g);
        calc.commit(c);
        let c = calc.paths_probability(&[Path::from_node(1)], &g);
        assert!(c.is_noop());
    }

    fn short_read_calculator(params: ScoringParams) -> SingleReadProbabilityCalculator {
        // aligns to the forward walk of node 0 only, never to its reverse
        let set = SingleReadSet::from_reads(vec![b"AACCAACC".to_vec()], AnyReadIndex::standard(5)).with_max_error(0);
        SingleReadProbabilityCalculator::single(Arc::new(set), params, 100)
    }

    #[test]
    fn removing_a_path_committed_in_reverse_drops_its_alignments() {
        let g = crate::graph::tests::two_node_graph();
        let mut calc = short_read_calculator(ScoringParams::default());
        let c = calc.paths_probability(&[Path::from_node(0)], &g);
        calc.commit(c);
        // 8 · ln(0.99) − ln(9)
        assert_close(calc.total_log_prob(), -2.2776272641642312);

        let c = calc.paths_probability(&[Path::from_node(1)], &g);
        assert!(c.is_noop());
        calc.commit(c);
        assert_eq!(calc.committed_paths()[0].nodes(), Path::from_node(0).nodes());

        let c = calc.paths_probability(&[Path::from_node(2)], &g);
        let estimate = c.new_total;
        calc.commit(c);
        let mut fresh = short_read_calculator(ScoringParams::default());
        let expected = fresh.paths_probability(&[Path::from_node(2)], &g).new_total;
        assert_close(expected, -10.0 - 0.7 * 8.0);
        assert_close(estimate, expected);
        assert_close(calc.total_log_prob(), expected);
    }

    #[test]
    fn floored_read_lifted_by_a_shorter_set_is_found_on_commit() {
        let g = crate::graph::tests::two_node_graph();
        let params = ScoringParams { mismatch_prob: 0.01, min_prob_start: -2.5, min_prob_per_base: 0.0 };
        let mut calc = short_read_calculator(params);
        // L = 18 puts the read just below its floor
        let c = calc.paths_probability(&[Path::from_node(0), Path::from_node(2)], &g);
        calc.commit(c);
        assert_close(calc.total_log_prob(), -2.5);

        let c = calc.paths_probability(&[Path::from_node(0)], &g);
        let estimate = c.new_total;
        calc.commit(c);
        assert_close(estimate, -2.5);
        assert!(estimate < calc.total_log_prob());
        assert_close(calc.total_log_prob(), -2.2776272641642312);
    }
}
