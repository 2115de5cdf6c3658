use std::collections::{HashMap, HashSet};

use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::{CandidateReadPosition, ReadIndex};

/// 同一条对角线按此宽度分桶去重
const DIAGONAL_BUCKET: i64 = 5;

/// k-mer -> [(read_id, 在 read 中的偏移)]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct KmerTable {
    k: usize,
    table: HashMap<Vec<u8>, Vec<(u32, u32)>>,
}

impl KmerTable {
    fn new(k: usize) -> Self {
        assert!(k > 0, "k-mer size must be positive");
        Self { k, table: HashMap::new() }
    }

    fn insert(&mut self, read_id: usize, seq: &[u8], pos: usize) {
        let kmer = &seq[pos..pos + self.k];
        if !is_acgt(kmer) {
            return;
        }
        self.table.entry(kmer.to_vec()).or_default().push((read_id as u32, pos as u32));
    }

    fn candidates(&self, genome: &[u8]) -> Vec<CandidateReadPosition> {
        let mut found: HashSet<(u32, i64)> = HashSet::new();
        let mut out = Vec::new();
        if genome.len() < self.k {
            return out;
        }
        for i in 0..=genome.len() - self.k {
            let Some(hits) = self.table.get(&genome[i..i + self.k]) else {
                continue;
            };
            for &(read_id, read_pos) in hits {
                let diagonal = (i as i64 - read_pos as i64).div_euclid(DIAGONAL_BUCKET);
                if found.insert((read_id, diagonal)) {
                    out.push(CandidateReadPosition::new(read_id as usize, i, read_pos as usize));
                }
            }
        }
        out
    }
}

#[inline]
fn is_acgt(kmer: &[u8]) -> bool {
    kmer.iter().all(|&b| matches!(b, b'A' | b'C' | b'G' | b'T'))
}

/// 对每条 read 的所有 k-mer 建索引。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StandardReadIndex {
    table: KmerTable,
}

impl StandardReadIndex {
    pub fn new(k: usize) -> Self {
        Self { table: KmerTable::new(k) }
    }
}

impl ReadIndex for StandardReadIndex {
    fn add_read(&mut self, id: usize, seq: &[u8]) {
        let k = self.table.k;
        for pos in 0..(seq.len() + 1).saturating_sub(k) {
            self.table.insert(id, seq, pos);
        }
    }

    fn candidates(&self, genome: &[u8]) -> Vec<CandidateReadPosition> {
        self.table.candidates(genome)
    }

    fn k(&self) -> usize {
        self.table.k
    }
}

/// 每条 read 只随机抽取 `samples_per_read` 个 k-mer 建索引，内存更小，
/// 代价是错误较多的 read 可能漏检。抽样由 `seed` 与 read id 决定，可复现。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampledReadIndex {
    table: KmerTable,
    samples_per_read: usize,
    seed: u64,
}

impl SampledReadIndex {
    pub fn new(k: usize, samples_per_read: usize, seed: u64) -> Self {
        Self { table: KmerTable::new(k), samples_per_read: samples_per_read.max(1), seed }
    }
}

impl ReadIndex for SampledReadIndex {
    fn add_read(&mut self, id: usize, seq: &[u8]) {
        let windows = (seq.len() + 1).saturating_sub(self.table.k);
        if windows == 0 {
            return;
        }
        let mut rng = StdRng::seed_from_u64(self.seed ^ (id as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15));
        let amount = self.samples_per_read.min(windows);
        let mut picked = sample(&mut rng, windows, amount).into_vec();
        picked.sort_unstable();
        for pos in picked {
            self.table.insert(id, seq, pos);
        }
    }

    fn candidates(&self, genome: &[u8]) -> Vec<CandidateReadPosition> {
        self.table.candidates(genome)
    }

    fn k(&self) -> usize {
        self.table.k
    }
}
