use rand::Rng;

use super::MoveConfig;
use crate::graph::Graph;
use crate::path::Path;

/// Finds a path other than `pi` starting where `paths[pi]` ends, flipping it in
/// place when only its reverse complement matches.
fn find_path_with_same_ending(paths: &mut [Path], pi: usize, graph: &Graph) -> Option<usize> {
    let end = paths[pi].back()?;
    for i in 0..paths.len() {
        if i == pi {
            continue;
        }
        if paths[i].front() == Some(end) {
            return Some(i);
        }
        let rev = paths[i].reversed(graph);
        if rev.front() == Some(end) {
            paths[i] = rev;
            return Some(i);
        }
    }
    None
}

fn merge_paths(paths: &mut Vec<Path>, pi: usize, other: usize) {
    let tail = paths.swap_remove(other);
    // swap_remove moved the last path into `other`
    let pi = if pi == paths.len() { other } else { pi };
    paths[pi].merge_with(&tail);
}

/// 随机选一条路径（随机决定是否反向）向后随机延伸；
/// 新末端若恰好是另一条路径的起点就把两条合并。
pub(super) fn extend_paths_randomly<R: Rng>(
    paths: &[Path],
    graph: &Graph,
    config: &MoveConfig,
    rng: &mut R,
) -> Option<Vec<Path>> {
    let pi = rng.gen_range(0..paths.len());
    let mut out = paths.to_vec();
    if rng.gen_bool(0.5) {
        out[pi].reverse(graph);
    }
    if !out[pi].extend_randomly(
        graph,
        rng,
        config.big_node_threshold,
        config.rand_extend_step_threshold,
        config.rand_extend_distance_threshold,
    ) {
        return None;
    }
    out[pi].add_history("extend");
    if let Some(other) = find_path_with_same_ending(&mut out, pi, graph) {
        merge_paths(&mut out, pi, other);
    }
    Some(out)
}
