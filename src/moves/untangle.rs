use std::collections::HashMap;

use log::trace;
use rand::Rng;

use crate::graph::{Graph, NodeId};
use crate::path::{Path, PathNode};
use crate::prob::GlobalProbabilityCalculator;

/// Position `ai` of path `a` and position `bi` of path `b` hold the same
/// contig, possibly on opposite strands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Crossing {
    a: usize,
    ai: usize,
    b: usize,
    bi: usize,
}

fn find_crossings(paths: &[Path], graph: &Graph) -> Vec<Crossing> {
    let mut first_seen: HashMap<NodeId, (usize, usize)> = HashMap::new();
    let mut crossings = Vec::new();
    for (pi, p) in paths.iter().enumerate() {
        for (i, n) in p.nodes().iter().enumerate() {
            let Some(id) = n.contig() else {
                continue;
            };
            let key = id.min(graph.rc(id));
            match first_seen.get(&key) {
                Some(&(a, ai)) if a != pi => crossings.push(Crossing { a, ai, b: pi, bi: i }),
                Some(_) => {}
                None => {
                    first_seen.insert(key, (pi, i));
                }
            }
        }
    }
    crossings
}

fn non_empty(parts: Vec<Path>) -> Vec<Path> {
    parts.into_iter().filter(|p| !p.is_empty()).collect()
}

fn joined(left: &Path, x: PathNode, right: &Path) -> Path {
    let mut nodes = left.nodes().to_vec();
    nodes.push(x);
    nodes.extend_from_slice(right.nodes());
    Path::new(nodes)
}

/// 交叉点的几种改接方式：互换后半段、只让一条路径穿过交叉点、
/// 或者由其中一条独占交叉节点。
fn reroutings(paths: &[Path], c: Crossing, graph: &Graph) -> Vec<Vec<Path>> {
    let a = &paths[c.a];
    let x = a[c.ai];
    let (b, bi) = if paths[c.b][c.bi] == x {
        (paths[c.b].clone(), c.bi)
    } else {
        (paths[c.b].reversed(graph), paths[c.b].len() - 1 - c.bi)
    };
    let a1 = a.slice(0..c.ai);
    let a2 = a.slice(c.ai + 1..a.len());
    let b1 = b.slice(0..bi);
    let b2 = b.slice(bi + 1..b.len());

    let options = vec![
        vec![joined(&a1, x, &b2), joined(&b1, x, &a2)],
        vec![joined(&a1, x, &b2), a2.clone(), b1.clone()],
        vec![joined(&b1, x, &a2), b2.clone(), a1.clone()],
        vec![a.clone(), b1, b2],
        vec![a1, a2, b],
    ];
    let rest: Vec<Path> =
        paths.iter().enumerate().filter(|&(i, _)| i != c.a && i != c.b).map(|(_, p)| p.clone()).collect();
    options
        .into_iter()
        .map(|parts| {
            let mut set = rest.clone();
            set.extend(non_empty(parts).into_iter().map(|mut p| {
                p.add_history("untangle");
                p
            }));
            set
        })
        .collect()
}

/// 选一个被两条路径共享的节点，在几种改接方式里取总概率最高的。
pub(super) fn untangle_paths<R: Rng>(
    paths: &[Path],
    graph: &Graph,
    calc: &mut GlobalProbabilityCalculator,
    rng: &mut R,
) -> Option<Vec<Path>> {
    let crossings = find_crossings(paths, graph);
    if crossings.is_empty() {
        return None;
    }
    let c = crossings[rng.gen_range(0..crossings.len())];
    let mut best: Option<(f64, Vec<Path>)> = None;
    for set in reroutings(paths, c, graph) {
        let score = calc.paths_probability(&set, graph).total;
        trace!("untangle option scored {:.4}", score);
        if best.as_ref().map_or(true, |(s, _)| score > *s) {
            best = Some((score, set));
        }
    }
    best.map(|(_, set)| set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::SingleReadSet;
    use crate::index::AnyReadIndex;
    use crate::prob::{ScoringParams, SingleReadProbabilityCalculator};
    use crate::util::dna;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    const A: NodeId = 0;
    const X: NodeId = 2;
    const C: NodeId = 4;
    const B: NodeId = 6;
    const D: NodeId = 8;

    /// A -> X -> C and B -> X -> D
    fn cross_graph() -> Graph {
        let mut g = Graph::new(3);
        for seq in [&b"AAAAC"[..], b"CCG", b"GGGTT", b"TTTAC", b"GAGAG"] {
            g.add_node_pair(seq.to_vec(), dna::revcomp(seq));
        }
        for (from, to) in [(A, X), (B, X), (X, C), (X, D)] {
            g.add_arc(from, to).unwrap();
        }
        g
    }

    #[test]
    fn crossings_between_different_paths_only() {
        let g = cross_graph();
        let paths = vec![Path::from_contigs(&[A, X, C]), Path::from_contigs(&[B, X, D])];
        assert_eq!(find_crossings(&paths, &g), vec![Crossing { a: 0, ai: 1, b: 1, bi: 1 }]);
        assert!(find_crossings(&paths[..1], &g).is_empty());
        let rev = vec![paths[0].clone(), paths[1].reversed(&g)];
        assert_eq!(find_crossings(&rev, &g), vec![Crossing { a: 0, ai: 1, b: 1, bi: 1 }]);
    }

    #[test]
    fn reroutings_are_valid_walks() {
        let g = cross_graph();
        let paths = vec![Path::from_contigs(&[A, X, C]), Path::from_contigs(&[B, X, D])];
        let c = find_crossings(&paths, &g)[0];
        let options = reroutings(&paths, c, &g);
        assert_eq!(options.len(), 5);
        for set in &options {
            assert!(set.iter().all(|p| !p.is_empty() && p.check(&g)));
        }
        assert_eq!(options[3].len(), 3);
        assert_eq!(options[4].len(), 3);
    }

    #[test]
    fn swap_wins_ties_and_handles_reversed_partner() {
        let g = cross_graph();
        let mut calc = GlobalProbabilityCalculator::new();
        let paths = vec![Path::from_contigs(&[A, X, C]), Path::from_contigs(&[B, X, D]).reversed(&g)];
        let mut rng = StdRng::seed_from_u64(5);
        let out = untangle_paths(&paths, &g, &mut calc, &mut rng).unwrap();
        assert_eq!(out.len(), 2);
        assert!(out[0].is_same(&Path::from_contigs(&[A, X, D]), &g));
        assert!(out[1].is_same(&Path::from_contigs(&[B, X, C]), &g));
    }

    #[test]
    fn reads_pick_the_rerouting_they_support() {
        let g = cross_graph();
        // spans A-X-C, which only option 3 keeps intact
        let set = SingleReadSet::from_reads(vec![b"AAACCCGGGG".to_vec()], AnyReadIndex::standard(5)).with_max_error(0);
        let mut calc = GlobalProbabilityCalculator::new();
        calc.add_single(SingleReadProbabilityCalculator::single(Arc::new(set), ScoringParams::default(), 64), 1.0);
        let paths = vec![Path::from_contigs(&[A, X, C]), Path::from_contigs(&[B, X, D])];
        let mut rng = StdRng::seed_from_u64(5);
        let out = untangle_paths(&paths, &g, &mut calc, &mut rng).unwrap();
        assert_eq!(out.len(), 3);
        assert!(out[0].is_same(&Path::from_contigs(&[A, X, C]), &g));
        assert!(out[1].is_same(&Path::from_node(B), &g));
        assert!(out[2].is_same(&Path::from_node(D), &g));
        // 10 · ln(0.99) − ln(29), well above every other option's floor of −17
        let best = calc.paths_probability(&out, &g).total;
        assert!((best - -3.4677991885214885).abs() < 1e-6, "{}", best);
    }

    #[test]
    fn nothing_shared_nothing_to_do() {
        let g = cross_graph();
        let mut calc = GlobalProbabilityCalculator::new();
        let mut rng = StdRng::seed_from_u64(5);
        let paths = vec![Path::from_contigs(&[A, X, C]), Path::from_node(D)];
        assert!(untangle_paths(&paths, &g, &mut calc, &mut rng).is_none());
    }
}
