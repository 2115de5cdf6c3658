use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use rayon::prelude::*;

use super::read_set::{MateAlignments, PairedReadSet, SingleReadSet};
use super::{PairedReadAlignment, SingleReadAlignment};
use crate::graph::Graph;
use crate::path::{Path, PathNode};

pub const DEFAULT_CACHE_SIZE: usize = 10_000;

/// 可以对一条展开后的基因组串给出比对结果的 read 集合。
pub trait AlignmentSource: Send + Sync {
    type Output: Send + Sync;

    fn align_genome(&self, genome: &[u8]) -> Self::Output;
}

impl AlignmentSource for SingleReadSet {
    type Output = Vec<SingleReadAlignment>;

    fn align_genome(&self, genome: &[u8]) -> Self::Output {
        self.get_alignments(genome)
    }
}

impl AlignmentSource for PairedReadSet {
    type Output = Vec<PairedReadAlignment>;

    fn align_genome(&self, genome: &[u8]) -> Self::Output {
        self.get_alignments(genome)
    }
}

/// Unpaired view of a paired set: both mates aligned, never cross-matched.
pub struct MateView(pub Arc<PairedReadSet>);

impl AlignmentSource for MateView {
    type Output = MateAlignments;

    fn align_genome(&self, genome: &[u8]) -> Self::Output {
        self.0.get_mate_alignments(genome)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub flushes: u64,
}

/// 路径比对缓存。
///
/// 键是路径的节点序列本身（不做反向互补归一），超过 `max_size` 条时整表清空。
pub struct PathAligner<S: AlignmentSource> {
    source: Arc<S>,
    cache: HashMap<Vec<PathNode>, Arc<S::Output>>,
    max_size: usize,
    stats: CacheStats,
}

impl<S: AlignmentSource> PathAligner<S> {
    pub fn new(source: Arc<S>, max_size: usize) -> Self {
        Self { source, cache: HashMap::new(), max_size: max_size.max(1), stats: CacheStats::default() }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_arc(&self) -> Arc<S> {
        Arc::clone(&self.source)
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn alignments_for_path(&mut self, path: &Path, graph: &Graph) -> Arc<S::Output> {
        self.alignments_for_paths(std::slice::from_ref(path), graph).remove(0)
    }

    /// 批量查询；未命中的路径并行比对，再串行写回缓存。
    pub fn alignments_for_paths(&mut self, paths: &[Path], graph: &Graph) -> Vec<Arc<S::Output>> {
        // hits are taken out before a possible flush below
        let mut found: Vec<Option<Arc<S::Output>>> = Vec::with_capacity(paths.len());
        let mut missing: Vec<&Path> = Vec::new();
        for p in paths {
            match self.cache.get(p.nodes()) {
                Some(hit) => {
                    self.stats.hits += 1;
                    found.push(Some(Arc::clone(hit)));
                }
                None => {
                    if !missing.iter().any(|m| m.is_same_no_reverse(p)) {
                        missing.push(p);
                    }
                    found.push(None);
                }
            }
        }

        if !missing.is_empty() {
            self.stats.misses += missing.len() as u64;
            let source = Arc::clone(&self.source);
            let computed: Vec<S::Output> =
                missing.par_iter().map(|p| source.align_genome(&p.to_seq(graph, true))).collect();

            if self.cache.len() + missing.len() > self.max_size {
                debug!("flushing path alignment cache ({} entries)", self.cache.len());
                self.cache.clear();
                self.stats.flushes += 1;
            }
            for (p, out) in missing.iter().zip(computed) {
                self.cache.insert(p.nodes().to_vec(), Arc::new(out));
            }
        }

        // misses were inserted after the flush, so they are all present
        paths
            .iter()
            .zip(found)
            .map(|(p, hit)| hit.unwrap_or_else(|| Arc::clone(&self.cache[p.nodes()])))
            .collect()
    }
}
