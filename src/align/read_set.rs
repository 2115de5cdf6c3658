use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path as FsPath;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::extend::{extend_alignment, ExtendScratch, DEFAULT_MAX_ERROR};
use super::{Orientation, PairedReadAlignment, SingleReadAlignment};
use crate::error::{GamlError, Result};
use crate::index::{AnyReadIndex, ReadIndex};
use crate::io::fastq;
use crate::util::dna;

/// 索引文件的构建信息
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexMeta {
    pub reads_file: Option<String>,
    pub build_args: Option<String>,
    pub build_timestamp: Option<String>,
}

/// 单端 read 集合：read 序列 + k-mer 索引。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SingleReadSet {
    reads: Vec<Vec<u8>>,
    index: AnyReadIndex,
    max_error: u32,
    #[serde(default)]
    meta: IndexMeta,
}

impl SingleReadSet {
    pub fn new(index: AnyReadIndex) -> Self {
        Self { reads: Vec::new(), index, max_error: DEFAULT_MAX_ERROR, meta: IndexMeta::default() }
    }

    pub fn from_reads(reads: Vec<Vec<u8>>, index: AnyReadIndex) -> Self {
        let mut set = Self::new(index);
        for r in reads {
            set.add_read(r);
        }
        set
    }

    /// Loads every record of a FASTQ file and indexes it.
    pub fn from_fastq<P: AsRef<FsPath>>(path: P, index: AnyReadIndex) -> Result<Self> {
        let path = path.as_ref();
        let reads = fastq::load_reads_file(path)?;
        info!("loaded {} reads from {}", reads.len(), path.display());
        let mut set = Self::from_reads(reads, index);
        set.meta.reads_file = Some(path.display().to_string());
        Ok(set)
    }

    pub fn with_max_error(mut self, max_error: u32) -> Self {
        self.max_error = max_error;
        self
    }

    pub fn add_read(&mut self, seq: Vec<u8>) -> usize {
        let id = self.reads.len();
        self.index.add_read(id, &seq);
        self.reads.push(seq);
        id
    }

    pub fn len(&self) -> usize {
        self.reads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reads.is_empty()
    }

    pub fn read(&self, id: usize) -> &[u8] {
        &self.reads[id]
    }

    pub fn reads(&self) -> &[Vec<u8>] {
        &self.reads
    }

    pub fn max_error(&self) -> u32 {
        self.max_error
    }

    pub fn index(&self) -> &AnyReadIndex {
        &self.index
    }

    pub fn meta(&self) -> &IndexMeta {
        &self.meta
    }

    pub fn set_meta(&mut self, meta: IndexMeta) {
        self.meta = meta;
    }

    /// 在基因组串的两条链上比对所有 read。
    ///
    /// 反向链命中的位置换算回正向坐标：`len(genome) - pos - len(read)`。
    /// 同一 read 在同一链同一位置只保留编辑距离最小的一条。
    pub fn get_alignments(&self, genome: &[u8]) -> Vec<SingleReadAlignment> {
        let mut scratch = ExtendScratch::new();
        let mut out = Vec::new();
        self.align_strand(genome, false, &mut scratch, &mut out);
        let rc = dna::revcomp(genome);
        self.align_strand(&rc, true, &mut scratch, &mut out);
        out
    }

    fn align_strand(
        &self,
        genome: &[u8],
        reversed: bool,
        scratch: &mut ExtendScratch,
        out: &mut Vec<SingleReadAlignment>,
    ) {
        let mut candidates = self.index.candidates(genome);
        candidates.sort_unstable();

        let mut found: Vec<(i64, u32)> = Vec::new();
        for group in candidates.chunk_by(|a, b| a.read_id == b.read_id) {
            found.clear();
            let read_id = group[0].read_id;
            let read = &self.reads[read_id];
            for cand in group {
                let Some((pos, dist)) = extend_alignment(read, genome, cand, self.max_error, scratch) else {
                    continue;
                };
                match found.iter_mut().find(|(p, _)| *p == pos) {
                    Some(slot) => slot.1 = slot.1.min(dist),
                    None => found.push((pos, dist)),
                }
            }
            for &(pos, dist) in &found {
                let genome_pos = if reversed {
                    genome.len() as i64 - pos - read.len() as i64
                } else {
                    pos
                };
                out.push(SingleReadAlignment { read_id, genome_pos, dist, reversed });
            }
        }
    }

    pub fn save_to_file<P: AsRef<FsPath>>(&self, path: P) -> Result<()> {
        let f = BufWriter::new(File::create(path)?);
        bincode::serialize_into(f, self)?;
        Ok(())
    }

    pub fn load_from_file<P: AsRef<FsPath>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let f = BufReader::new(File::open(path)?);
        let set: Self = bincode::deserialize_from(f)
            .map_err(|e| GamlError::Index(format!("cannot read index '{}': {}", path.display(), e)))?;
        debug!(
            "loaded read index {} ({} reads, built {})",
            path.display(),
            set.len(),
            set.meta.build_timestamp.as_deref().unwrap_or("unknown")
        );
        Ok(set)
    }
}

/// 两端各自的单端命中
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MateAlignments {
    pub first: Vec<SingleReadAlignment>,
    pub second: Vec<SingleReadAlignment>,
}

/// 双端 read 集合：两个 mate 集合按下标一一配对。
#[derive(Debug, Clone)]
pub struct PairedReadSet {
    first: SingleReadSet,
    second: SingleReadSet,
    orientation: Orientation,
}

impl PairedReadSet {
    pub fn new(first: SingleReadSet, second: SingleReadSet, orientation: Orientation) -> Result<Self> {
        if first.len() != second.len() {
            return Err(GamlError::Index(format!(
                "mate files hold {} and {} reads",
                first.len(),
                second.len()
            )));
        }
        Ok(Self { first, second, orientation })
    }

    pub fn len(&self) -> usize {
        self.first.len()
    }

    pub fn is_empty(&self) -> bool {
        self.first.is_empty()
    }

    pub fn first(&self) -> &SingleReadSet {
        &self.first
    }

    pub fn second(&self) -> &SingleReadSet {
        &self.second
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn get_mate_alignments(&self, genome: &[u8]) -> MateAlignments {
        MateAlignments { first: self.first.get_alignments(genome), second: self.second.get_alignments(genome) }
    }

    /// 两端分别比对后按 read id 交叉配对，只保留方向与期望一致的组合。
    pub fn get_alignments(&self, genome: &[u8]) -> Vec<PairedReadAlignment> {
        let mates = self.get_mate_alignments(genome);
        self.pair_up(mates.first, mates.second)
    }

    fn pair_up(
        &self,
        mut first: Vec<SingleReadAlignment>,
        mut second: Vec<SingleReadAlignment>,
    ) -> Vec<PairedReadAlignment> {
        first.sort_unstable();
        second.sort_unstable();
        let mut out = Vec::new();
        let mut j = 0;
        for group in first.chunk_by(|a, b| a.read_id == b.read_id) {
            let read_id = group[0].read_id;
            while j < second.len() && second[j].read_id < read_id {
                j += 1;
            }
            let end = second[j..].iter().position(|a| a.read_id != read_id).map_or(second.len(), |n| j + n);
            let len1 = self.first.read(read_id).len();
            let len2 = self.second.read(read_id).len();
            for a1 in group {
                for a2 in &second[j..end] {
                    let pair = PairedReadAlignment::from_mates(a1, len1, a2, len2);
                    if pair.orientation == self.orientation {
                        out.push(pair);
                    }
                }
            }
            j = end;
        }
        out
    }
}
