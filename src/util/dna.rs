/// Bases outside `ACGT` (after upper-casing, with `U` read as `T`) become `N`.
pub fn normalize_seq(seq: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(seq.len());
    for &b in seq {
        let up = b.to_ascii_uppercase();
        let nb = match up {
            b'A' | b'C' | b'G' | b'T' | b'N' => up,
            b'U' => b'T',
            _ => b'N',
        };
        out.push(nb);
    }
    out
}

#[inline]
pub fn complement(base: u8) -> u8 {
    match base.to_ascii_uppercase() {
        b'A' => b'T',
        b'C' => b'G',
        b'G' => b'C',
        b'T' | b'U' => b'A',
        _ => b'N',
    }
}

pub fn revcomp(seq: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(seq.len());
    for &b in seq.iter().rev() {
        out.push(complement(b));
    }
    out
}

/// A gap of unknown sequence, rendered as a run of `N`.
pub fn gap_seq(len: usize) -> Vec<u8> {
    vec![b'N'; len]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revcomp_basic() {
        assert_eq!(revcomp(b"AACG"), b"CGTT");
        assert_eq!(revcomp(b"acgtn"), b"NACGT");
        assert!(revcomp(b"").is_empty());
    }

    #[test]
    fn revcomp_is_involution() {
        let s = b"GTCAGCTTTTGGTGCTTGAG";
        assert_eq!(revcomp(&revcomp(s)), s.to_vec());
    }

    #[test]
    fn normalize_maps_unknown_to_n() {
        assert_eq!(normalize_seq(b"acgUx-"), b"ACGTNN");
    }
}
