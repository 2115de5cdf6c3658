//! 模拟退火主循环：提出改动、打分、按温度决定是否接受。
//!
//! 温度按迭代次数对数下降：`T(i) = T0 / (1 + ln(1 + i / cooling_divisor))`。
//! `T0 = 0` 时退化为纯贪心。

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::graph::Graph;
use crate::moves::{make_move, MoveConfig, MoveKind};
use crate::path::{paths_length, paths_to_debug_string, Path};
use crate::prob::GlobalProbabilityCalculator;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnealConfig {
    pub iterations: usize,
    pub initial_temperature: f64,
    pub cooling_divisor: f64,
    pub seed: u64,
    /// 每隔多少次迭代输出一次中间结果；0 表示只在结束时输出
    pub output_every: usize,
    pub time_limit_secs: Option<u64>,
}

impl Default for AnnealConfig {
    fn default() -> Self {
        Self {
            iterations: 1000,
            initial_temperature: 0.0,
            cooling_divisor: 1.0,
            seed: 47,
            output_every: 0,
            time_limit_secs: None,
        }
    }
}

pub fn temperature(config: &AnnealConfig, iteration: usize) -> f64 {
    if config.initial_temperature <= 0.0 {
        return 0.0;
    }
    let divisor = if config.cooling_divisor > 0.0 { config.cooling_divisor } else { 1.0 };
    config.initial_temperature / (1.0 + (1.0 + iteration as f64 / divisor).ln())
}

/// Strict improvements always pass; otherwise only moves that tolerate
/// regressions, with probability `exp(delta / T)`.
pub fn accept<R: Rng>(delta: f64, kind: MoveKind, temperature: f64, rng: &mut R) -> bool {
    if delta > 0.0 {
        return true;
    }
    if !kind.accepts_regressions() || temperature <= 0.0 {
        return false;
    }
    rng.gen::<f64>() < (delta / temperature).exp()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Iterations,
    TimeLimit,
    Signal,
    /// the move engine found no applicable move
    NoMoves,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StopReason::Iterations => "iteration limit reached",
            StopReason::TimeLimit => "time limit reached",
            StopReason::Signal => "stop requested",
            StopReason::NoMoves => "no applicable move",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedStep {
    pub iteration: usize,
    pub kind: MoveKind,
    /// 接受之前的总对数概率
    pub previous_log_prob: f64,
    pub log_prob: f64,
    pub previous_length: usize,
    pub length: usize,
}

#[derive(Debug, Clone)]
pub struct AnnealOutcome {
    pub paths: Vec<Path>,
    pub log_prob: f64,
    pub iterations: usize,
    pub accepted: usize,
    pub history: Vec<AcceptedStep>,
    pub stop_reason: StopReason,
}

pub struct Annealer<'g> {
    graph: &'g Graph,
    calc: GlobalProbabilityCalculator,
    moves: MoveConfig,
    config: AnnealConfig,
    rng: StdRng,
    stop: Arc<AtomicBool>,
}

impl<'g> Annealer<'g> {
    pub fn new(graph: &'g Graph, calc: GlobalProbabilityCalculator, moves: MoveConfig, config: AnnealConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self { graph, calc, moves, config, rng, stop: Arc::new(AtomicBool::new(false)) }
    }

    /// Setting the flag ends the run before the next iteration starts.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn calculator(&self) -> &GlobalProbabilityCalculator {
        &self.calc
    }

    /// 从 `initial` 出发运行退火；`checkpoint` 按 `output_every` 的节奏收到当前路径集合。
    pub fn run<F>(&mut self, initial: Vec<Path>, mut checkpoint: F) -> Result<AnnealOutcome>
    where
        F: FnMut(usize, &[Path]) -> Result<()>,
    {
        let graph = self.graph;
        let changes = self.calc.paths_probability(&initial, graph);
        self.calc.commit(changes);
        let mut current = initial;
        let mut log_prob = self.calc.total_log_prob();
        let mut length = paths_length(&current, graph);
        info!("initial log-prob {:.4}, length {}, {}", log_prob, length, paths_to_debug_string(&current));

        let started = Instant::now();
        let time_limit = self.config.time_limit_secs.map(Duration::from_secs);
        let mut history = Vec::new();
        let mut iterations = 0usize;
        let mut stop_reason = StopReason::Iterations;

        for it in 0..self.config.iterations {
            if self.stop.load(Ordering::Relaxed) {
                stop_reason = StopReason::Signal;
                break;
            }
            if time_limit.is_some_and(|limit| started.elapsed() >= limit) {
                stop_reason = StopReason::TimeLimit;
                break;
            }
            let t = temperature(&self.config, it);
            let Some(proposal) = make_move(&current, graph, &self.moves, &mut self.calc, &mut self.rng) else {
                stop_reason = StopReason::NoMoves;
                break;
            };
            iterations = it + 1;

            let changes = self.calc.paths_probability(&proposal.paths, graph);
            let delta = changes.total - log_prob;
            let accepted = accept(delta, proposal.kind, t, &mut self.rng);
            debug!(
                "iter {} {}: proposal {:.4} (delta {:.4}, T {:.4}) {}",
                it,
                proposal.kind,
                changes.total,
                delta,
                t,
                if accepted { "accepted" } else { "rejected" }
            );
            if accepted {
                self.calc.commit(changes);
                let new_log_prob = self.calc.total_log_prob();
                let new_length = paths_length(&proposal.paths, graph);
                history.push(AcceptedStep {
                    iteration: it,
                    kind: proposal.kind,
                    previous_log_prob: log_prob,
                    log_prob: new_log_prob,
                    previous_length: length,
                    length: new_length,
                });
                log_prob = new_log_prob;
                length = new_length;
                current = proposal.paths;
                info!("iter {} accepted {}: log-prob {:.4}, {}", it, proposal.kind, log_prob, paths_to_debug_string(&current));
            }

            if self.config.output_every > 0 && iterations % self.config.output_every == 0 {
                checkpoint(iterations, &current)?;
            }
        }

        info!("stopped after {} iterations: {}", iterations, stop_reason);
        self.calc.log_summary();
        Ok(AnnealOutcome {
            paths: current,
            log_prob,
            iterations,
            accepted: history.len(),
            history,
            stop_reason,
        })
    }
}
