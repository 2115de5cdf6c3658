//! TOML 配置：起始图、输出文件、退火与改动参数，以及任意多个 read 集合。
//!
//! ```toml
//! starting_graph = "LastGraph"
//! output_file = "assembly.fasta"
//!
//! [anneal]
//! iterations = 5000
//! initial_temperature = 10.0
//!
//! [[single_short_reads]]
//! filename = "reads.fastq"
//!
//! [[paired_reads]]
//! filename1 = "left.fastq"
//! filename2 = "right.fastq"
//! orientation = "FR"
//! mean_distance = 300.0
//! std_distance = 30.0
//! use_as_advice = true
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::info;
use serde::{Deserialize, Serialize};

use crate::align::{Orientation, PairedReadSet, SingleReadSet, DEFAULT_CACHE_SIZE, DEFAULT_MAX_ERROR};
use crate::anneal::AnnealConfig;
use crate::error::{GamlError, Result};
use crate::index::{AnyReadIndex, DEFAULT_K};
use crate::moves::MoveConfig;
use crate::prob::{
    GlobalProbabilityCalculator, PairedModel, PairedReadProbabilityCalculator, ScoringParams,
    SingleReadProbabilityCalculator,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub starting_graph: PathBuf,

    #[serde(default = "default_output_file")]
    pub output_file: PathBuf,

    /// rayon 线程数；缺省时由 rayon 自行决定
    #[serde(default)]
    pub threads: Option<usize>,

    #[serde(default)]
    pub anneal: AnnealConfig,

    #[serde(default)]
    pub moves: MoveConfig,

    #[serde(default)]
    pub single_short_reads: Vec<SingleReadsConfig>,

    #[serde(default)]
    pub paired_reads: Vec<PairedReadsConfig>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    #[default]
    Standard,
    Sampled,
}

/// Keys shared by single and paired read sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadSetParams {
    #[serde(default = "default_mismatch_prob")]
    pub mismatch_prob: f64,

    #[serde(default = "default_min_prob_start")]
    pub min_prob_start: f64,

    #[serde(default = "default_min_prob_per_base")]
    pub min_prob_per_base: f64,

    /// 在全局对数似然中的权重
    #[serde(default = "default_weight")]
    pub weight: f64,

    #[serde(default)]
    pub index: IndexKind,

    #[serde(default = "default_k")]
    pub k: usize,

    /// Only read by the sampled index.
    #[serde(default = "default_samples_per_read")]
    pub samples_per_read: usize,

    #[serde(default = "default_max_error")]
    pub max_error: u32,

    #[serde(default = "default_cache_size")]
    pub cache_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SingleReadsConfig {
    #[serde(default)]
    pub filename: Option<PathBuf>,

    /// 由 `gaml index` 预先构建的索引文件
    #[serde(default)]
    pub index_file: Option<PathBuf>,

    #[serde(flatten)]
    pub params: ReadSetParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairedReadsConfig {
    pub filename1: PathBuf,
    pub filename2: PathBuf,

    #[serde(default = "default_orientation")]
    pub orientation: Orientation,

    pub mean_distance: f64,
    pub std_distance: f64,

    #[serde(default)]
    pub use_as_advice: bool,

    #[serde(flatten)]
    pub params: ReadSetParams,
}

fn default_output_file() -> PathBuf { PathBuf::from("output.fasta") }
fn default_mismatch_prob() -> f64 { 0.01 }
fn default_min_prob_start() -> f64 { -10.0 }
fn default_min_prob_per_base() -> f64 { -0.7 }
fn default_weight() -> f64 { 1.0 }
fn default_k() -> usize { DEFAULT_K }
fn default_samples_per_read() -> usize { 5 }
fn default_max_error() -> u32 { DEFAULT_MAX_ERROR }
fn default_cache_size() -> usize { DEFAULT_CACHE_SIZE }
fn default_orientation() -> Orientation { Orientation::FR }

fn in_open_unit(x: f64) -> bool {
    x > 0.0 && x < 1.0
}

impl Default for ReadSetParams {
    fn default() -> Self {
        Self {
            mismatch_prob: default_mismatch_prob(),
            min_prob_start: default_min_prob_start(),
            min_prob_per_base: default_min_prob_per_base(),
            weight: default_weight(),
            index: IndexKind::default(),
            k: default_k(),
            samples_per_read: default_samples_per_read(),
            max_error: default_max_error(),
            cache_size: default_cache_size(),
        }
    }
}

impl ReadSetParams {
    pub fn scoring(&self) -> ScoringParams {
        ScoringParams {
            mismatch_prob: self.mismatch_prob,
            min_prob_start: self.min_prob_start,
            min_prob_per_base: self.min_prob_per_base,
        }
    }

    pub fn build_index(&self, seed: u64) -> AnyReadIndex {
        match self.index {
            IndexKind::Standard => AnyReadIndex::standard(self.k),
            IndexKind::Sampled => AnyReadIndex::sampled(self.k, self.samples_per_read, seed),
        }
    }

    fn validate(&self, what: &str) -> Result<()> {
        if !in_open_unit(self.mismatch_prob) {
            return Err(GamlError::config(format!("{}: mismatch_prob must lie in (0, 1), got {}", what, self.mismatch_prob)));
        }
        if !self.weight.is_finite() || self.weight < 0.0 {
            return Err(GamlError::config(format!("{}: weight must be a non-negative number", what)));
        }
        if self.k == 0 {
            return Err(GamlError::config(format!("{}: k must be positive", what)));
        }
        if self.index == IndexKind::Sampled && self.samples_per_read == 0 {
            return Err(GamlError::config(format!("{}: samples_per_read must be positive", what)));
        }
        Ok(())
    }
}

impl SingleReadsConfig {
    fn load(&self, seed: u64) -> Result<SingleReadSet> {
        let set = match (&self.index_file, &self.filename) {
            (Some(index), _) => SingleReadSet::load_from_file(index)?,
            (None, Some(reads)) => SingleReadSet::from_fastq(reads, self.params.build_index(seed))?,
            (None, None) => return Err(GamlError::config("single read set needs filename or index_file")),
        };
        Ok(set.with_max_error(self.params.max_error))
    }
}

impl PairedReadsConfig {
    fn load(&self, seed: u64) -> Result<PairedReadSet> {
        let first = SingleReadSet::from_fastq(&self.filename1, self.params.build_index(seed))?
            .with_max_error(self.params.max_error);
        let second = SingleReadSet::from_fastq(&self.filename2, self.params.build_index(seed))?
            .with_max_error(self.params.max_error);
        PairedReadSet::new(first, second, self.orientation)
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("loading configuration from {}", path.display());
        let text = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        Ok(config.relative_to(path.parent().unwrap_or_else(|| Path::new(""))))
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Relative file names are taken relative to the configuration file.
    fn relative_to(mut self, dir: &Path) -> Self {
        let fix = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = dir.join(&*p);
            }
        };
        fix(&mut self.starting_graph);
        fix(&mut self.output_file);
        for s in &mut self.single_short_reads {
            for f in [&mut s.filename, &mut s.index_file].into_iter().flatten() {
                fix(f);
            }
        }
        for p in &mut self.paired_reads {
            fix(&mut p.filename1);
            fix(&mut p.filename2);
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.starting_graph.as_os_str().is_empty() {
            return Err(GamlError::config("starting_graph is empty"));
        }
        if self.single_short_reads.is_empty() && self.paired_reads.is_empty() {
            return Err(GamlError::config("at least one read set is required"));
        }
        if self.threads == Some(0) {
            return Err(GamlError::config("threads must be positive"));
        }
        for (i, s) in self.single_short_reads.iter().enumerate() {
            let what = format!("single_short_reads[{}]", i);
            if s.filename.is_none() && s.index_file.is_none() {
                return Err(GamlError::config(format!("{}: needs filename or index_file", what)));
            }
            s.params.validate(&what)?;
        }
        for (i, p) in self.paired_reads.iter().enumerate() {
            let what = format!("paired_reads[{}]", i);
            if p.std_distance.is_nan() || p.std_distance <= 0.0 {
                return Err(GamlError::config(format!("{}: std_distance must be positive", what)));
            }
            if p.mean_distance.is_nan() || p.mean_distance <= 0.0 {
                return Err(GamlError::config(format!("{}: mean_distance must be positive", what)));
            }
            p.params.validate(&what)?;
        }
        if self.anneal.cooling_divisor <= 0.0 {
            return Err(GamlError::config("anneal.cooling_divisor must be positive"));
        }
        Ok(())
    }

    /// 读入全部 read 集合并组装成全局打分器。
    pub fn build_calculator(&self) -> Result<GlobalProbabilityCalculator> {
        let seed = self.anneal.seed;
        let mut calc = GlobalProbabilityCalculator::new();
        for s in &self.single_short_reads {
            let set = s.load(seed)?;
            info!("single read set: {} reads, weight {}", set.len(), s.params.weight);
            let c = SingleReadProbabilityCalculator::single(Arc::new(set), s.params.scoring(), s.params.cache_size);
            calc.add_single(c, s.params.weight);
        }
        for p in &self.paired_reads {
            let set = p.load(seed)?;
            info!(
                "paired read set: {} pairs ({}, {} ± {}), weight {}{}",
                set.len(),
                p.orientation,
                p.mean_distance,
                p.std_distance,
                p.params.weight,
                if p.use_as_advice { ", advice" } else { "" }
            );
            let c = PairedReadProbabilityCalculator::paired(
                Arc::new(set),
                PairedModel::new(p.mean_distance, p.std_distance),
                p.params.scoring(),
                p.params.cache_size,
            );
            calc.add_paired(c, p.params.weight, p.use_as_advice, p.params.cache_size);
        }
        Ok(calc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const FULL: &str = r#"
starting_graph = "graph.txt"
output_file = "out.fasta"
threads = 2

[anneal]
iterations = 50
initial_temperature = 5.0

[moves]
big_node_threshold = 100
join_weight = 0.0

[[single_short_reads]]
filename = "reads.fastq"
mismatch_prob = 0.02
index = "sampled"
samples_per_read = 3

[[paired_reads]]
filename1 = "l.fastq"
filename2 = "r.fastq"
orientation = "RF"
mean_distance = 250.0
std_distance = 25.0
use_as_advice = true
weight = 0.5
"#;

    #[test]
    fn parses_all_sections() {
        let c = Config::from_toml_str(FULL).unwrap();
        assert_eq!(c.threads, Some(2));
        assert_eq!(c.anneal.iterations, 50);
        assert_eq!(c.anneal.seed, 47);
        assert_eq!(c.moves.big_node_threshold, 100);
        assert_eq!(c.moves.join_weight, 0.0);
        assert_eq!(c.moves.break_weight, 1.0);

        let s = &c.single_short_reads[0];
        assert_eq!(s.params.mismatch_prob, 0.02);
        assert_eq!(s.params.index, IndexKind::Sampled);
        assert_eq!(s.params.samples_per_read, 3);
        assert_eq!(s.params.k, 13);
        assert_eq!(s.params.max_error, 6);

        let p = &c.paired_reads[0];
        assert_eq!(p.orientation, Orientation::RF);
        assert!(p.use_as_advice);
        assert_eq!(p.params.weight, 0.5);
        assert_eq!(p.params.min_prob_per_base, -0.7);
    }

    #[test]
    fn defaults_for_minimal_file() {
        let c = Config::from_toml_str("starting_graph = \"g\"\n[[single_short_reads]]\nfilename = \"r.fq\"\n").unwrap();
        assert_eq!(c.output_file, PathBuf::from("output.fasta"));
        assert_eq!(c.anneal, AnnealConfig::default());
        assert_eq!(c.moves, MoveConfig::default());
        assert_eq!(c.single_short_reads[0].params, ReadSetParams::default());
        assert!(c.paired_reads.is_empty());
    }

    #[test]
    fn rejects_invalid_values() {
        let cases = [
            "starting_graph = \"g\"\n",
            "starting_graph = \"g\"\n[[single_short_reads]]\n",
            "starting_graph = \"g\"\n[[single_short_reads]]\nfilename = \"r\"\nmismatch_prob = 1.5\n",
            "starting_graph = \"g\"\n[[paired_reads]]\nfilename1 = \"a\"\nfilename2 = \"b\"\nmean_distance = 100.0\nstd_distance = 0.0\n",
        ];
        for text in cases {
            assert!(matches!(Config::from_toml_str(text), Err(GamlError::Config(_))), "accepted: {}", text);
        }
    }

    #[test]
    fn builds_calculator_from_files() {
        let mut reads = NamedTempFile::new().unwrap();
        write!(reads, "@r1\nACGTACGTACGTACGTACGT\n+\nIIIIIIIIIIIIIIIIIIII\n").unwrap();
        let text = format!(
            "starting_graph = \"g\"\n[[single_short_reads]]\nfilename = \"{}\"\nweight = 2.0\n",
            reads.path().display()
        );
        let c = Config::from_toml_str(&text).unwrap();
        let calc = c.build_calculator().unwrap();
        assert_eq!(calc.single_count(), 1);
        assert_eq!(calc.paired_count(), 0);
        // floor of one 20 bp read, doubled by the weight
        assert!((calc.total_log_prob() - 2.0 * (-10.0 - 14.0)).abs() < 1e-9);
    }

    #[test]
    fn file_names_resolve_next_to_the_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gaml.toml");
        std::fs::write(&path, "starting_graph = \"g\"\n[[single_short_reads]]\nfilename = \"r.fq\"\n").unwrap();
        let c = Config::from_file(&path).unwrap();
        assert_eq!(c.starting_graph, dir.path().join("g"));
        assert_eq!(c.single_short_reads[0].filename.as_deref(), Some(dir.path().join("r.fq").as_path()));
    }
}
