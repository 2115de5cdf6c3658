use std::collections::VecDeque;

use crate::index::CandidateReadPosition;

/// 单次延伸允许的最大编辑距离
pub const DEFAULT_MAX_ERROR: u32 = 6;

/// (编辑距离, read 位置, 基因组位置)；位置可以为 -1。
type State = (u32, i32, i32);

/// 延伸搜索的工作区，由调用方持有并跨调用复用以减少分配。
///
/// `visited[dist * row_len + read_pos + 1]` 记录已访问过的基因组位置。
#[derive(Debug, Default)]
pub struct ExtendScratch {
    visited: Vec<Vec<i32>>,
    row_len: usize,
    frontier: VecDeque<State>,
}

impl ExtendScratch {
    pub fn new() -> Self {
        Self::default()
    }

    fn prepare(&mut self, max_error: u32, read_len: usize) {
        self.row_len = read_len + 2;
        let size = (max_error as usize + 2) * self.row_len;
        if self.visited.len() < size {
            self.visited.resize_with(size, Vec::new);
        }
        for v in &mut self.visited[..size] {
            v.clear();
        }
        self.frontier.clear();
    }

    /// Returns `false` if the state was already visited.
    #[inline]
    fn mark(&mut self, (dist, read_pos, genome_pos): State) -> bool {
        let slot = &mut self.visited[dist as usize * self.row_len + (read_pos + 1) as usize];
        if slot.contains(&genome_pos) {
            return false;
        }
        slot.push(genome_pos);
        true
    }
}

/// 从种子出发做有界编辑距离延伸。
///
/// 先从种子向 read 末端正向延伸，再以剩余预算从种子向 read 起点反向延伸。
/// 每个状态优先贪心匹配（距离不变，放到队首），其次是替换、基因组缺失、
/// 基因组插入（距离 +1，放到队尾）。超出 `max_error` 仍未到达 read 边界则
/// 返回 `None`。
///
/// 成功时返回 `(read 起点在基因组上的位置, 编辑距离)`。
pub fn extend_alignment(
    read: &[u8],
    genome: &[u8],
    candidate: &CandidateReadPosition,
    max_error: u32,
    scratch: &mut ExtendScratch,
) -> Option<(i64, u32)> {
    let read_len = read.len() as i32;
    let genome_len = genome.len() as i32;
    let read_pos = candidate.read_pos as i32;
    let genome_pos = candidate.genome_pos as i32;
    if read_pos >= read_len || genome_pos >= genome_len || read[read_pos as usize] != genome[genome_pos as usize] {
        return None;
    }

    scratch.prepare(max_error, read.len());

    // 正向：种子首个碱基已匹配，从下一位开始
    let mut forward_errors = None;
    scratch.frontier.push_back((0, read_pos + 1, genome_pos + 1));
    while let Some(state) = scratch.frontier.pop_front() {
        if !scratch.mark(state) {
            continue;
        }
        let (dist, r, g) = state;
        if dist > max_error {
            return None;
        }
        if r == read_len {
            forward_errors = Some(dist);
            break;
        }
        if g < genome_len {
            if genome[g as usize] == read[r as usize] {
                scratch.frontier.push_front((dist, r + 1, g + 1));
                continue;
            }
            // mismatch
            scratch.frontier.push_back((dist + 1, r + 1, g + 1));
            // delete from genome
            scratch.frontier.push_back((dist + 1, r, g + 1));
        }
        // insert to genome
        scratch.frontier.push_back((dist + 1, r + 1, g));
    }
    let forward_errors = forward_errors?;
    let budget = max_error - forward_errors;

    // 反向
    scratch.frontier.clear();
    scratch.frontier.push_back((0, read_pos, genome_pos));
    while let Some(state) = scratch.frontier.pop_front() {
        if !scratch.mark(state) {
            continue;
        }
        let (dist, r, g) = state;
        if dist > budget {
            return None;
        }
        if r == -1 {
            return Some((g as i64 + 1, forward_errors + dist));
        }
        if g >= 0 {
            if genome[g as usize] == read[r as usize] {
                scratch.frontier.push_front((dist, r - 1, g - 1));
                continue;
            }
            scratch.frontier.push_back((dist + 1, r - 1, g - 1));
            scratch.frontier.push_back((dist + 1, r, g - 1));
        }
        scratch.frontier.push_back((dist + 1, r - 1, g));
    }
    None
}
