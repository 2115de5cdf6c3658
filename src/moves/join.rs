use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use log::trace;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use super::MoveConfig;
use crate::align::{MateAlignments, PairedReadSet, SingleReadAlignment};
use crate::graph::{Graph, NodeId};
use crate::path::{Path, PathNode};
use crate::prob::GlobalProbabilityCalculator;

fn read_ids(alignments: &[SingleReadAlignment]) -> HashSet<usize> {
    alignments.iter().map(|a| a.read_id).collect()
}

/// Pairs with one mate on `p` and the other mate on `q`.
fn bridging_reads(p: &MateAlignments, q: &MateAlignments) -> usize {
    let (p1, p2) = (read_ids(&p.first), read_ids(&p.second));
    let (q1, q2) = (read_ids(&q.first), read_ids(&q.second));
    let mut bridging: HashSet<usize> = p1.intersection(&q2).copied().collect();
    bridging.extend(p2.intersection(&q1));
    bridging.len()
}

/// 从 `from` 出发随机游走到 `target`，只经过汇流盆地中的小节点。
/// 返回不含 `from`、以 `target` 结尾的节点序列。
fn random_bridge<R: Rng>(
    graph: &Graph,
    from: NodeId,
    target: NodeId,
    basin: &HashSet<NodeId>,
    config: &MoveConfig,
    rng: &mut R,
) -> Option<Path> {
    let mut nodes = Vec::new();
    let mut cur = from;
    for _ in 0..config.join_step_limit {
        let next = &graph.node(cur).next;
        if next.contains(&target) {
            nodes.push(PathNode::Contig(target));
            return Some(Path::new(nodes));
        }
        let options: Vec<NodeId> = next
            .iter()
            .copied()
            .filter(|n| basin.contains(n) && !graph.node(*n).is_big(config.big_node_threshold))
            .collect();
        if options.is_empty() {
            return None;
        }
        cur = options[rng.gen_range(0..options.len())];
        nodes.push(PathNode::Contig(cur));
    }
    None
}

/// Gap length between `p` and `q` that puts the bridging pairs at the mean
/// insert length; median over all pairs, at least 1.
fn gap_estimate(
    p: &Path,
    p_mates: &MateAlignments,
    q: &Path,
    q_mates: &MateAlignments,
    reads: &PairedReadSet,
    mean: f64,
    graph: &Graph,
) -> Option<usize> {
    let len_p = p.seq_len(graph, true) as f64;
    let q_ending = (q.seq_len(graph, true) - q.seq_len(graph, false)) as f64;
    let mut estimates: Vec<f64> = Vec::new();
    let sides = [(&p_mates.first, &q_mates.second, reads.second()), (&p_mates.second, &q_mates.first, reads.first())];
    for (on_p, on_q, q_reads) in sides {
        let mut by_read: HashMap<usize, Vec<i64>> = HashMap::new();
        for b in on_q {
            by_read.entry(b.read_id).or_default().push(b.genome_pos);
        }
        for a in on_p {
            let Some(positions) = by_read.get(&a.read_id) else {
                continue;
            };
            let len_b = q_reads.read(a.read_id).len() as f64;
            for &pb in positions {
                estimates.push(mean - (len_p - a.genome_pos as f64) - (pb as f64 - q_ending + len_b));
            }
        }
    }
    if estimates.is_empty() {
        return None;
    }
    estimates.sort_by(f64::total_cmp);
    let median = estimates[estimates.len() / 2];
    Some(median.round().max(1.0) as usize)
}

fn push_unique(candidates: &mut Vec<Path>, path: Path) {
    if !candidates.iter().any(|c| c.is_same_no_reverse(&path)) {
        candidates.push(path);
    }
}

/// 借助双端 read 的建议连接两条路径。
///
/// 目标路径按跨越两条路径的 read 对数加权抽取；连接方式是汇流盆地中的随机游走
/// 或按插入片段长度估计的 gap，用建议集合自己的双端概率挑出最好的一个。
pub(super) fn join_with_advice<R: Rng>(
    paths: &[Path],
    graph: &Graph,
    config: &MoveConfig,
    calc: &mut GlobalProbabilityCalculator,
    rng: &mut R,
) -> Option<Vec<Path>> {
    if paths.len() < 2 {
        return None;
    }
    let sets = calc.advice_sets();
    if sets.is_empty() {
        return None;
    }
    let advice = calc.advice(sets[rng.gen_range(0..sets.len())])?;

    let pi = rng.gen_range(0..paths.len());
    let mut p = paths[pi].clone();
    if rng.gen_bool(0.5) {
        p.reverse(graph);
    }
    let p_mates = advice.mates.alignments_for_path(&p, graph);

    let others: Vec<usize> = (0..paths.len()).filter(|&i| i != pi).collect();
    let other_paths: Vec<Path> = others.iter().map(|&i| paths[i].clone()).collect();
    let scores: Vec<usize> = advice
        .mates
        .alignments_for_paths(&other_paths, graph)
        .iter()
        .map(|m| bridging_reads(&p_mates, m))
        .collect();
    // all-zero weights: no read pair points anywhere
    let chooser = WeightedIndex::new(&scores).ok()?;
    let qi = others[chooser.sample(rng)];

    let reads = Arc::clone(&advice.mates.source().0);
    let mean = advice.calc.model().mean_distance;
    let mut candidates: Vec<Path> = Vec::new();
    for q in [paths[qi].clone(), paths[qi].reversed(graph)] {
        if let (Some(PathNode::Contig(from)), Some(PathNode::Contig(to))) = (p.back(), q.front()) {
            if from == to {
                let mut joined = p.clone();
                joined.merge_with(&q);
                push_unique(&mut candidates, joined);
            } else {
                let basin = graph.drainage_basin(to, config.big_node_threshold);
                for _ in 0..config.join_samples {
                    if let Some(bridge) = random_bridge(graph, from, to, &basin, config, rng) {
                        let mut joined = p.clone();
                        joined.append_path(&bridge);
                        joined.merge_with(&q);
                        push_unique(&mut candidates, joined);
                    }
                }
            }
        }
        let q_mates = advice.mates.alignments_for_path(&q, graph);
        if let Some(gap) = gap_estimate(&p, &p_mates, &q, &q_mates, &reads, mean, graph) {
            let mut joined = p.clone();
            joined.append_path_with_gap(&q, gap);
            push_unique(&mut candidates, joined);
        }
    }

    let rest: Vec<Path> =
        paths.iter().enumerate().filter(|&(i, _)| i != pi && i != qi).map(|(_, p)| p.clone()).collect();
    let mut best: Option<(f64, Vec<Path>)> = None;
    for mut joined in candidates {
        joined.add_history("join");
        trace!("join candidate {}", joined.to_debug_string());
        let mut set = rest.clone();
        set.push(joined);
        let score = advice.calc.paths_probability(&set, graph).new_total;
        if best.as_ref().map_or(true, |(s, _)| score > *s) {
            best = Some((score, set));
        }
    }
    best.map(|(_, set)| set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::{Orientation, SingleReadSet};
    use crate::index::AnyReadIndex;
    use crate::prob::{PairedModel, PairedReadProbabilityCalculator, ScoringParams};
    use crate::util::dna;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const A: NodeId = 0;
    const S: NodeId = 2;
    const B: NodeId = 4;

    fn random_seq(rng: &mut StdRng, len: usize) -> Vec<u8> {
        (0..len).map(|_| b"ACGT"[rng.gen_range(0..4)]).collect()
    }

    /// big A (60) -> small S (10) -> big B (60), k = 5
    fn bridge_graph() -> (Graph, Vec<u8>, Vec<u8>) {
        let mut rng = StdRng::seed_from_u64(11);
        let a = random_seq(&mut rng, 60);
        let s = random_seq(&mut rng, 10);
        let b = random_seq(&mut rng, 60);
        let mut g = Graph::new(5);
        for seq in [&a, &s, &b] {
            g.add_node_pair(seq.clone(), dna::revcomp(seq));
        }
        g.add_arc(A, S).unwrap();
        g.add_arc(S, B).unwrap();
        (g, a, b)
    }

    fn advice_calc(a: &[u8], b: &[u8]) -> GlobalProbabilityCalculator {
        let first = SingleReadSet::from_reads(vec![a[10..40].to_vec()], AnyReadIndex::standard(13));
        let second = SingleReadSet::from_reads(vec![dna::revcomp(&b[20..50])], AnyReadIndex::standard(13));
        let pairs = PairedReadSet::new(first, second, Orientation::FR).unwrap();
        let paired = PairedReadProbabilityCalculator::paired(
            Arc::new(pairs),
            PairedModel::new(110.0, 15.0),
            ScoringParams::default(),
            64,
        );
        let mut calc = GlobalProbabilityCalculator::new();
        calc.add_paired(paired, 1.0, true, 64);
        calc
    }

    fn config() -> MoveConfig {
        MoveConfig { big_node_threshold: 20, ..MoveConfig::default() }
    }

    #[test]
    fn bridge_walks_through_small_nodes() {
        let (g, _, _) = bridge_graph();
        let basin = g.drainage_basin(B, 20);
        let mut rng = StdRng::seed_from_u64(0);
        let bridge = random_bridge(&g, A, B, &basin, &config(), &mut rng).unwrap();
        assert_eq!(bridge.nodes(), Path::from_contigs(&[S, B]).nodes());
        // B has no successors
        assert!(random_bridge(&g, B, A, &g.drainage_basin(A, 20), &config(), &mut rng).is_none());
    }

    #[test]
    fn gap_matches_the_skipped_node() {
        let (g, a, b) = bridge_graph();
        let mut calc = advice_calc(&a, &b);
        let advice = calc.advice(0).unwrap();
        let p = Path::from_node(A);
        let q = Path::from_node(B);
        let p_mates = advice.mates.alignments_for_path(&p, &g);
        let q_mates = advice.mates.alignments_for_path(&q, &g);
        assert_eq!(bridging_reads(&p_mates, &q_mates), 1);
        assert_eq!(bridging_reads(&p_mates, &p_mates), 0);
        let reads = Arc::clone(&advice.mates.source().0);
        assert_eq!(gap_estimate(&p, &p_mates, &q, &q_mates, &reads, 110.0, &g), Some(10));
    }

    #[test]
    fn joins_the_two_paths_the_mates_bridge() {
        let (g, a, b) = bridge_graph();
        let paths = vec![Path::from_node(A), Path::from_node(B)];
        for seed in 0..10 {
            let mut calc = advice_calc(&a, &b);
            let mut rng = StdRng::seed_from_u64(seed);
            let out = join_with_advice(&paths, &g, &config(), &mut calc, &mut rng).unwrap();
            assert_eq!(out.len(), 1);
            let joined = &out[0];
            assert!(joined.check(&g));
            let contigs: Vec<NodeId> = joined.nodes().iter().filter_map(|n| n.contig()).map(|id| id / 2 * 2).collect();
            assert!(contigs.contains(&A));
            assert!(contigs.contains(&B));
            assert!(joined.history().contains("join"));
        }
    }

    #[test]
    fn needs_advice_and_two_paths() {
        let (g, a, b) = bridge_graph();
        let mut rng = StdRng::seed_from_u64(1);
        let paths = vec![Path::from_node(A), Path::from_node(B)];
        let mut empty = GlobalProbabilityCalculator::new();
        assert!(join_with_advice(&paths, &g, &config(), &mut empty, &mut rng).is_none());
        let mut calc = advice_calc(&a, &b);
        assert!(join_with_advice(&paths[..1], &g, &config(), &mut calc, &mut rng).is_none());
    }
}
