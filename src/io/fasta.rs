use std::io::Write;
use std::path::Path as FsPath;

use crate::error::Result;
use crate::graph::Graph;
use crate::path::Path;

/// One record per path: `>(id,id,...)` followed by the flattened sequence,
/// endings included.
pub fn write_paths<W: Write>(paths: &[Path], graph: &Graph, out: &mut W) -> Result<()> {
    for p in paths {
        writeln!(out, ">{}", p.to_debug_string())?;
        out.write_all(&p.to_seq(graph, true))?;
        out.write_all(b"\n")?;
    }
    Ok(())
}

pub fn write_paths_file<P: AsRef<FsPath>>(paths: &[Path], graph: &Graph, path: P) -> Result<()> {
    let fh = std::fs::File::create(path.as_ref())?;
    let mut w = std::io::BufWriter::new(fh);
    write_paths(paths, graph, &mut w)?;
    w.flush()?;
    log::debug!("wrote {} paths to {}", paths.len(), path.as_ref().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::tests::two_node_graph;

    #[test]
    fn writes_one_record_per_path() {
        let g = two_node_graph();
        let paths = vec![Path::from_contigs(&[0, 2]), Path::from_node(3)];
        let mut buf = Vec::new();
        write_paths(&paths, &g, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], ">(0,2)");
        // ending rebuilt from rc(0) = CGGTT -> AACCG, first k-1 = AACC
        assert_eq!(lines[1], "AACCAACCGTTGCA");
        assert_eq!(lines[2], ">(3)");
        assert_eq!(lines[3].len(), 4 + 5);
    }

    #[test]
    fn writes_to_file() {
        let g = two_node_graph();
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.fasta");
        write_paths_file(&[Path::from_node(0)], &g, &out).unwrap();
        let text = std::fs::read_to_string(&out).unwrap();
        assert_eq!(text, ">(0)\nAACCAACCG\n");
    }
}
