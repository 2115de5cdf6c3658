pub mod fasta;
pub mod fastq;
pub mod graph;
