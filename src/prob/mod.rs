//! 概率模型：把路径集合的比对结果折算成对数似然。
//!
//! - [`calculator`]：增量计算与提交（单端、双端共用）
//! - [`single`] / [`paired`]：两种 read 集合的比对概率
//! - [`global`]：多个 read 集合的加权和

pub mod calculator;
pub mod change;
pub mod global;
pub mod paired;
pub mod single;

pub use calculator::ReadProbabilityCalculator;
pub use change::ProbabilityChange;
pub use global::{AdviceSet, GlobalProbabilityCalculator, ProbabilityChanges};
pub use paired::{PairedModel, PairedReadProbabilityCalculator};
pub use single::{SingleModel, SingleReadProbabilityCalculator};

use crate::align::AlignmentSource;

/// Scoring parameters shared by every read set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringParams {
    /// 单个碱基出错的概率 ε
    pub mismatch_prob: f64,
    pub min_prob_start: f64,
    pub min_prob_per_base: f64,
}

impl ScoringParams {
    /// Floor for a read of this length that has no acceptable alignment.
    pub fn min_log_prob(&self, read_len: usize) -> f64 {
        self.min_prob_start + read_len as f64 * self.min_prob_per_base
    }

    /// `(ε/3)^d · (1−ε)^(len−d)`
    pub fn alignment_prob(&self, dist: u32, read_len: usize) -> f64 {
        let matched = read_len.saturating_sub(dist as usize);
        (self.mismatch_prob / 3.0).powi(dist as i32) * (1.0 - self.mismatch_prob).powi(matched as i32)
    }
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self { mismatch_prob: 0.01, min_prob_start: -10.0, min_prob_per_base: -0.7 }
    }
}

/// 一种 read 集合的打分方式：如何数 read、取 read 长度、算单条比对的概率。
pub trait AlignmentModel: Send + Sync {
    type Alignment: Send + Sync;
    type Reads: AlignmentSource<Output = Vec<Self::Alignment>>;

    fn read_count(&self, reads: &Self::Reads) -> usize;

    /// Length that enters the floor of read `read_id`.
    fn read_length(&self, reads: &Self::Reads, read_id: usize) -> usize;

    fn read_id(&self, alignment: &Self::Alignment) -> usize;

    fn alignment_prob(&self, params: &ScoringParams, reads: &Self::Reads, alignment: &Self::Alignment) -> f64;
}
