//! 读段比对：k-mer 种子 + 有界编辑距离延伸，及按路径缓存的比对结果。
//!
//! - [`extend`]：种子两向延伸（BFS，按累计编辑距离排序）
//! - [`read_set`]：单端 / 双端 read 集合，正反两条链扫描
//! - [`cache`]：以路径本身为键的比对缓存

pub mod cache;
pub mod extend;
pub mod read_set;

pub use cache::{AlignmentSource, CacheStats, MateView, PathAligner, DEFAULT_CACHE_SIZE};
pub use extend::{extend_alignment, ExtendScratch, DEFAULT_MAX_ERROR};
pub use read_set::{IndexMeta, MateAlignments, PairedReadSet, SingleReadSet};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 单端比对结果。`genome_pos` 始终以正向基因组串坐标给出。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SingleReadAlignment {
    pub read_id: usize,
    pub genome_pos: i64,
    pub dist: u32,
    /// 是否比对在反向互补链上
    pub reversed: bool,
}

/// Relative orientation of two mates, taken left to right along the genome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    /// both mates on the same strand
    FF,
    /// left mate forward, right mate reverse
    FR,
    /// left mate reverse, right mate forward
    RF,
}

impl Orientation {
    pub fn of_pair(left_reversed: bool, right_reversed: bool) -> Self {
        match (left_reversed, right_reversed) {
            (a, b) if a == b => Orientation::FF,
            (false, true) => Orientation::FR,
            _ => Orientation::RF,
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Orientation::FF => "FF",
            Orientation::FR => "FR",
            Orientation::RF => "RF",
        };
        f.write_str(s)
    }
}

impl FromStr for Orientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "FF" => Ok(Orientation::FF),
            "FR" => Ok(Orientation::FR),
            "RF" => Ok(Orientation::RF),
            other => Err(format!("unknown orientation '{}'", other)),
        }
    }
}

/// 双端比对：两端各自的单端命中，加上相对方向与插入片段长度。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairedReadAlignment {
    pub read_id: usize,
    pub pos1: i64,
    pub dist1: u32,
    pub reversed1: bool,
    pub pos2: i64,
    pub dist2: u32,
    pub reversed2: bool,
    pub orientation: Orientation,
    pub insert_length: i64,
}

impl PairedReadAlignment {
    pub fn from_mates(a1: &SingleReadAlignment, len1: usize, a2: &SingleReadAlignment, len2: usize) -> Self {
        let (left, right) = if a1.genome_pos <= a2.genome_pos { (a1, a2) } else { (a2, a1) };
        let start = a1.genome_pos.min(a2.genome_pos);
        let end = (a1.genome_pos + len1 as i64).max(a2.genome_pos + len2 as i64);
        Self {
            read_id: a1.read_id,
            pos1: a1.genome_pos,
            dist1: a1.dist,
            reversed1: a1.reversed,
            pos2: a2.genome_pos,
            dist2: a2.dist,
            reversed2: a2.reversed,
            orientation: Orientation::of_pair(left.reversed, right.reversed),
            insert_length: end - start,
        }
    }
}
