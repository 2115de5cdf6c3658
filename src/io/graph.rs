//! Loader for the Velvet `LastGraph` text format.
//!
//! ```text
//! <nodeCount>\t<seqCount>\t<k>\t<flag>
//! NODE\t<id>\t<len>\t...        (then forward and reverse-complement lines)
//! ARC\t<from>\t<to>\t<multiplicity>
//! ```

use std::io::BufRead;
use std::path::Path as FsPath;

use crate::error::{GamlError, Result};
use crate::graph::{velvet_to_internal, Graph, NodeId};
use crate::util::dna;

struct LineReader<R: BufRead> {
    reader: R,
    buf: String,
    line_no: usize,
    source: String,
}

impl<R: BufRead> LineReader<R> {
    fn next_line(&mut self) -> Result<Option<&str>> {
        self.buf.clear();
        let n = self.reader.read_line(&mut self.buf)?;
        if n == 0 {
            return Ok(None);
        }
        self.line_no += 1;
        Ok(Some(self.buf.trim_end_matches(['\n', '\r'])))
    }

    fn expect_line(&mut self, what: &str) -> Result<String> {
        let line_no = self.line_no + 1;
        match self.next_line()? {
            Some(l) => Ok(l.to_string()),
            None => Err(GamlError::truncated(self.source.clone(), line_no, format!("missing {}", what))),
        }
    }

    fn truncated(&self, reason: String) -> GamlError {
        GamlError::truncated(self.source.clone(), self.line_no, reason)
    }
}

pub fn load_graph_file<P: AsRef<FsPath>>(path: P) -> Result<Graph> {
    let path = path.as_ref();
    let fh = std::fs::File::open(path)?;
    load_graph(std::io::BufReader::new(fh), &path.display().to_string())
}

pub fn load_graph<R: BufRead>(reader: R, source: &str) -> Result<Graph> {
    let mut lr = LineReader { reader, buf: String::new(), line_no: 0, source: source.to_string() };

    let header = lr.expect_line("graph header")?;
    let fields: Vec<&str> = header.split('\t').collect();
    if fields.len() < 3 {
        return Err(lr.truncated(format!("graph header has {} fields, expected at least 3", fields.len())));
    }
    let node_count: usize = fields[0]
        .trim()
        .parse()
        .map_err(|_| lr.truncated(format!("bad node count '{}'", fields[0])))?;
    let k: usize = fields[2]
        .trim()
        .parse()
        .map_err(|_| lr.truncated(format!("bad k-mer size '{}'", fields[2])))?;

    let mut graph = Graph::new(k);
    for i in 0..node_count {
        let node_header = lr.expect_line("NODE header")?;
        let id = parse_node_header(&node_header).ok_or_else(|| lr.truncated(format!("bad NODE line '{}'", node_header)))?;
        if velvet_to_internal(id) != Some(2 * i) {
            return Err(GamlError::InvalidGraph(format!(
                "node {} found where node {} was expected (line {})",
                id,
                i + 1,
                lr.line_no
            )));
        }
        let forward = lr.expect_line("forward sequence")?;
        let backward = lr.expect_line("reverse-complement sequence")?;
        graph.add_node_pair(dna::normalize_seq(forward.trim().as_bytes()), dna::normalize_seq(backward.trim().as_bytes()));
    }

    let mut arcs = 0usize;
    loop {
        let line = match lr.next_line()? {
            Some(l) => l.to_string(),
            None => break,
        };
        if !line.starts_with("ARC") {
            log::debug!("{}: arc section ends at line {}", source, lr.line_no);
            break;
        }
        let (from, to) = parse_arc(&line).ok_or_else(|| lr.truncated(format!("bad ARC line '{}'", line)))?;
        graph.add_arc(from, to)?;
        arcs += 1;
    }

    log::info!("loaded graph {}: {} nodes ({} contigs), {} arcs, k={}", source, graph.len(), node_count, arcs, k);
    Ok(graph)
}

fn parse_node_header(line: &str) -> Option<i64> {
    let mut it = line.split('\t');
    if it.next()? != "NODE" {
        return None;
    }
    it.next()?.trim().parse().ok()
}

/// `ARC\t<from>\t<to>\t...` -> internal node ids.
pub fn parse_arc(line: &str) -> Option<(NodeId, NodeId)> {
    let mut it = line.split('\t');
    if it.next()? != "ARC" {
        return None;
    }
    let from: i64 = it.next()?.trim().parse().ok()?;
    let to: i64 = it.next()?.trim().parse().ok()?;
    Some((velvet_to_internal(from)?, velvet_to_internal(to)?))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Cursor;

    pub(crate) const NODE1_FWD: &str = "GTCAGCTTTTGGTGCTTGAGCATCATTTAGCTTTTTAGCTTCTGCTAAAAGGTTAGCGCTTTGGCTTGGGTCATCTTTTAGGCTTTGGATGAAACCATTGCGTTGTTCTTCGTTTAAGTTA";
    pub(crate) const NODE1_REV: &str = "CTAAAAGATGACCCAAGCCAAAGCGCTAACCTTTTAGCAGAAGCTAAAAAGCTAAATGATGCTCAAGCACCAAAAGCTGACAACAAATTCAACAAAGAACAACAAAATGCTTTCTATGAAA";

    pub(crate) fn k41_graph_text() -> String {
        format!(
            "2\t1000\t41\t1\nNODE\t1\t121\t0\t0\n{}\n{}\nNODE\t2\t4\t0\t0\nAGAC\nTGCC\nARC\t1\t-2\t44\n",
            NODE1_FWD, NODE1_REV
        )
    }

    pub(crate) fn k41_graph() -> Graph {
        load_graph(Cursor::new(k41_graph_text()), "test").unwrap()
    }

    #[test]
    fn parse_arc_line() {
        assert_eq!(parse_arc("ARC\t3\t-2\t47"), Some((4, 3)));
        assert_eq!(parse_arc("ARC\t1\t-2\t44"), Some((0, 3)));
        assert_eq!(parse_arc("NR\t1\t2"), None);
        assert_eq!(parse_arc("ARC\tx\t2"), None);
    }

    #[test]
    fn load_small_graph() {
        let g = k41_graph();
        assert_eq!(g.k(), 41);
        assert_eq!(g.len(), 4);
        assert_eq!(g.node(0).seq, NODE1_FWD.as_bytes());
        assert_eq!(g.node(1).seq, NODE1_REV.as_bytes());
        assert_eq!(g.node(2).seq, b"AGAC");
        assert_eq!(g.rc(0), 1);
        assert_eq!(g.rc(3), 2);
        assert!(g.has_edge(0, 3));
        assert!(g.has_edge(2, 1));
    }

    #[test]
    fn non_arc_lines_end_the_arc_section() {
        let text = format!("{}NR\t1\t1\nARC\t2\t1\t3\n", k41_graph_text());
        let g = load_graph(Cursor::new(text), "test").unwrap();
        assert!(!g.has_edge(2, 0));
    }

    #[test]
    fn missing_sequence_is_truncated_input() {
        let text = "1\t10\t5\t1\nNODE\t1\t5\t0\t0\nAACCG\n";
        match load_graph(Cursor::new(text), "short") {
            Err(GamlError::TruncatedInput { line, .. }) => assert_eq!(line, 4),
            other => panic!("expected truncated input, got {:?}", other.map(|g| g.len())),
        }
    }

    #[test]
    fn malformed_arc_is_truncated_input() {
        let text = "1\t10\t5\t1\nNODE\t1\t5\t0\t0\nAACCG\nCGGTT\nARC\t1\n";
        assert!(matches!(load_graph(Cursor::new(text), "t"), Err(GamlError::TruncatedInput { .. })));
    }

    #[test]
    fn arc_to_unknown_node_is_rejected() {
        let text = "1\t10\t5\t1\nNODE\t1\t5\t0\t0\nAACCG\nCGGTT\nARC\t1\t7\t1\n";
        assert!(matches!(load_graph(Cursor::new(text), "t"), Err(GamlError::InvalidGraph(_))));
    }
}
