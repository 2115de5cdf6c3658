//! # gaml
//!
//! 基于最大似然的基因组组装优化（Genome Assembly by Maximum Likelihood）。
//!
//! 从 Velvet 风格的 contig 图出发，反复对路径集合做结构性改动（延伸、断开、
//! 借助双端 read 连接、解开交叉），用 read 重新比对到组装结果上的似然打分，
//! 再按模拟退火准则决定是否接受。
//!
//! ## 快速示例
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use gaml::align::SingleReadSet;
//! use gaml::anneal::{AnnealConfig, Annealer};
//! use gaml::index::AnyReadIndex;
//! use gaml::io::graph::load_graph_file;
//! use gaml::moves::MoveConfig;
//! use gaml::path::build_paths_from_single_nodes;
//! use gaml::prob::{GlobalProbabilityCalculator, ScoringParams, SingleReadProbabilityCalculator};
//!
//! let graph = load_graph_file("LastGraph")?;
//! let reads = SingleReadSet::from_fastq("reads.fastq", AnyReadIndex::standard(13))?;
//!
//! let mut calc = GlobalProbabilityCalculator::new();
//! calc.add_single(SingleReadProbabilityCalculator::single(Arc::new(reads), ScoringParams::default(), 10_000), 1.0);
//!
//! let moves = MoveConfig::default();
//! let start = build_paths_from_single_nodes(&graph.big_nodes(moves.big_node_threshold));
//! let mut annealer = Annealer::new(&graph, calc, moves, AnnealConfig::default());
//! let outcome = annealer.run(start, |_, _| Ok(()))?;
//! println!("log-prob {:.4} with {} paths", outcome.log_prob, outcome.paths.len());
//! # Ok::<(), gaml::error::GamlError>(())
//! ```
//!
//! ## 模块说明
//!
//! - [`graph`]：双向 contig 图与图遍历
//! - [`path`]：图上的路径（walk）及其代数运算
//! - [`index`]：read 的 k-mer 种子索引
//! - [`align`]：有界编辑距离延伸、read 集合、路径比对缓存
//! - [`prob`]：单端 / 双端 / 全局概率计算
//! - [`moves`]：四种路径集合改动
//! - [`anneal`]：模拟退火主循环
//! - [`config`]：TOML 配置
//! - [`io`]：图、FASTQ 读入与 FASTA 输出
//! - [`util`]：DNA 反向互补等工具函数

pub mod align;
pub mod anneal;
pub mod config;
pub mod error;
pub mod graph;
pub mod index;
pub mod io;
pub mod moves;
pub mod path;
pub mod prob;
pub mod util;
