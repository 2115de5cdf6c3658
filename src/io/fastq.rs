use std::io::BufRead;
use std::path::Path as FsPath;

use crate::error::{GamlError, Result};
use crate::util::dna;

#[derive(Debug, Clone)]
pub struct FastqRecord {
    pub id: String,
    pub seq: Vec<u8>,
}

pub struct FastqReader<R: BufRead> {
    reader: R,
    buf: String,
    done: bool,
    line_no: usize,
    source: String,
}

impl<R: BufRead> FastqReader<R> {
    pub fn new(reader: R, source: &str) -> Self {
        Self { reader, buf: String::new(), done: false, line_no: 0, source: source.to_string() }
    }

    fn read_line(&mut self, what: &str) -> Result<()> {
        self.buf.clear();
        let n = self.reader.read_line(&mut self.buf)?;
        if n == 0 {
            self.done = true;
            return Err(GamlError::truncated(self.source.clone(), self.line_no + 1, format!("missing {}", what)));
        }
        self.line_no += 1;
        Ok(())
    }

    pub fn next_record(&mut self) -> Result<Option<FastqRecord>> {
        if self.done { return Ok(None); }

        // header line starting with '@'; skip blank trailing lines
        let header = loop {
            self.buf.clear();
            let n = self.reader.read_line(&mut self.buf)?;
            if n == 0 { self.done = true; return Ok(None); }
            self.line_no += 1;
            let line = self.buf.trim_end();
            if !line.is_empty() { break line.to_string(); }
        };
        if !header.starts_with('@') {
            self.done = true;
            return Err(GamlError::truncated(self.source.clone(), self.line_no, "FASTQ header not starting with '@'"));
        }
        let id = header[1..].split_whitespace().next().unwrap_or("").to_string();

        self.read_line("sequence line")?;
        let seq = dna::normalize_seq(self.buf.trim_end().as_bytes());

        self.read_line("'+' line")?;
        if !self.buf.starts_with('+') {
            self.done = true;
            return Err(GamlError::truncated(self.source.clone(), self.line_no, "missing '+' line"));
        }

        // quality is not used by the likelihood model
        self.read_line("quality line")?;

        Ok(Some(FastqRecord { id, seq }))
    }
}

/// Reads every record, keeping only the sequences. Read ids are positional.
pub fn load_reads<R: BufRead>(reader: R, source: &str) -> Result<Vec<Vec<u8>>> {
    let mut r = FastqReader::new(reader, source);
    let mut reads = Vec::new();
    while let Some(rec) = r.next_record()? {
        reads.push(rec.seq);
    }
    log::info!("{}: loaded {} reads", source, reads.len());
    Ok(reads)
}

pub fn load_reads_file<P: AsRef<FsPath>>(path: P) -> Result<Vec<Vec<u8>>> {
    let path = path.as_ref();
    let fh = std::fs::File::open(path)?;
    load_reads(std::io::BufReader::new(fh), &path.display().to_string())
}
