use rand::Rng;

use super::MoveConfig;
use crate::graph::Graph;
use crate::path::Path;

/// 在随机内部位置把一条路径断开；断开后两端的小节点被裁掉，空的一半丢弃。
pub(super) fn break_paths<R: Rng>(paths: &[Path], graph: &Graph, config: &MoveConfig, rng: &mut R) -> Option<Vec<Path>> {
    let pi = rng.gen_range(0..paths.len());
    if paths[pi].len() < 2 {
        return None;
    }
    let pos = 1 + rng.gen_range(0..paths[pi].len() - 1);
    let mut out = paths.to_vec();
    let mut suffix = out[pi].cut_at(pos, graph, config.big_node_threshold);
    out[pi].add_history("break");
    suffix.add_history("break");
    if !suffix.is_empty() {
        out.push(suffix);
    }
    if out[pi].is_empty() {
        out.swap_remove(pi);
    }
    if out.is_empty() {
        return None;
    }
    Some(out)
}
