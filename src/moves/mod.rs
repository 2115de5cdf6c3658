//! 路径集合上的结构性改动。
//!
//! 每次随机选择一种改动；前提不满足（没有可断开的路径、没有共享节点、
//! 没有建议用 read 集合……）时重新选择，最多尝试 `max_attempts` 次。

mod cut;
mod extend;
mod join;
mod untangle;

use std::fmt;

use log::trace;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::graph::Graph;
use crate::path::Path;
use crate::prob::GlobalProbabilityCalculator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveKind {
    Extend,
    Break,
    Join,
    Untangle,
}

impl MoveKind {
    pub const ALL: [MoveKind; 4] = [MoveKind::Extend, MoveKind::Break, MoveKind::Join, MoveKind::Untangle];

    /// Whether a proposal of this kind may be accepted with a lower score.
    pub fn accepts_regressions(self) -> bool {
        !matches!(self, MoveKind::Extend)
    }
}

impl fmt::Display for MoveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MoveKind::Extend => "extend",
            MoveKind::Break => "break",
            MoveKind::Join => "join",
            MoveKind::Untangle => "untangle",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoveConfig {
    /// 长度不小于此值的节点视为“大节点”
    pub big_node_threshold: usize,
    pub rand_extend_step_threshold: usize,
    pub rand_extend_distance_threshold: usize,
    /// join 时每个方向抽样的随机游走条数
    pub join_samples: usize,
    pub join_step_limit: usize,
    pub untangle_enabled: bool,
    pub extend_weight: f64,
    pub break_weight: f64,
    pub join_weight: f64,
    pub untangle_weight: f64,
    pub max_attempts: usize,
}

impl Default for MoveConfig {
    fn default() -> Self {
        Self {
            big_node_threshold: 500,
            rand_extend_step_threshold: 50,
            rand_extend_distance_threshold: 1000,
            join_samples: 20,
            join_step_limit: 30,
            untangle_enabled: true,
            extend_weight: 1.0,
            break_weight: 1.0,
            join_weight: 1.0,
            untangle_weight: 1.0,
            max_attempts: 1000,
        }
    }
}

impl MoveConfig {
    pub fn weight(&self, kind: MoveKind) -> f64 {
        match kind {
            MoveKind::Extend => self.extend_weight,
            MoveKind::Break => self.break_weight,
            MoveKind::Join => self.join_weight,
            MoveKind::Untangle if self.untangle_enabled => self.untangle_weight,
            MoveKind::Untangle => 0.0,
        }
    }
}

/// 一次候选改动
#[derive(Debug, Clone)]
pub struct Proposal {
    pub kind: MoveKind,
    pub paths: Vec<Path>,
}

/// 随机生成一个合法的候选路径集合；`max_attempts` 次都失败时返回 `None`。
///
/// join 与 untangle 需要用 `calc` 给候选打分，但不会提交任何变化。
pub fn make_move<R: Rng>(
    paths: &[Path],
    graph: &Graph,
    config: &MoveConfig,
    calc: &mut GlobalProbabilityCalculator,
    rng: &mut R,
) -> Option<Proposal> {
    if paths.is_empty() {
        return None;
    }
    let weights: Vec<f64> = MoveKind::ALL.iter().map(|&k| config.weight(k).max(0.0)).collect();
    let chooser = WeightedIndex::new(&weights).ok()?;
    for attempt in 0..config.max_attempts {
        let kind = MoveKind::ALL[chooser.sample(rng)];
        let out = match kind {
            MoveKind::Extend => extend::extend_paths_randomly(paths, graph, config, rng),
            MoveKind::Break => cut::break_paths(paths, graph, config, rng),
            MoveKind::Join => join::join_with_advice(paths, graph, config, calc, rng),
            MoveKind::Untangle => untangle::untangle_paths(paths, graph, calc, rng),
        };
        if let Some(paths) = out {
            trace!("{} proposal after {} attempts", kind, attempt + 1);
            return Some(Proposal { kind, paths });
        }
    }
    None
}
