//! 读段 k-mer 索引。
//!
//! 查询时扫描基因组串的每个 k-mer 窗口，命中后按 `(read_id, ⌊对角线/5⌋)`
//! 去重，避免同一条对角线上产生大量冗余种子。

mod kmer;

pub use kmer::{SampledReadIndex, StandardReadIndex};

use serde::{Deserialize, Serialize};

pub const DEFAULT_K: usize = 13;

/// 种子命中：read 上的 `read_pos` 与基因组串上的 `genome_pos` 处 k-mer 相同。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CandidateReadPosition {
    pub read_id: usize,
    pub genome_pos: usize,
    pub read_pos: usize,
}

impl CandidateReadPosition {
    pub fn new(read_id: usize, genome_pos: usize, read_pos: usize) -> Self {
        Self { read_id, genome_pos, read_pos }
    }
}

/// Index capability: register reads, then seed candidates against a genome string.
pub trait ReadIndex {
    fn add_read(&mut self, id: usize, seq: &[u8]);

    fn candidates(&self, genome: &[u8]) -> Vec<CandidateReadPosition>;

    fn k(&self) -> usize;
}

/// Index strategy chosen at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AnyReadIndex {
    Standard(StandardReadIndex),
    Sampled(SampledReadIndex),
}

impl AnyReadIndex {
    pub fn standard(k: usize) -> Self {
        AnyReadIndex::Standard(StandardReadIndex::new(k))
    }

    pub fn sampled(k: usize, samples_per_read: usize, seed: u64) -> Self {
        AnyReadIndex::Sampled(SampledReadIndex::new(k, samples_per_read, seed))
    }
}

impl Default for AnyReadIndex {
    fn default() -> Self {
        AnyReadIndex::standard(DEFAULT_K)
    }
}

impl ReadIndex for AnyReadIndex {
    fn add_read(&mut self, id: usize, seq: &[u8]) {
        match self {
            AnyReadIndex::Standard(i) => i.add_read(id, seq),
            AnyReadIndex::Sampled(i) => i.add_read(id, seq),
        }
    }

    fn candidates(&self, genome: &[u8]) -> Vec<CandidateReadPosition> {
        match self {
            AnyReadIndex::Standard(i) => i.candidates(genome),
            AnyReadIndex::Sampled(i) => i.candidates(genome),
        }
    }

    fn k(&self) -> usize {
        match self {
            AnyReadIndex::Standard(i) => i.k(),
            AnyReadIndex::Sampled(i) => i.k(),
        }
    }
}
