//! Fixed-length windows over a feature sequence.

/// Start indices of `seg`-frame windows over `n` frames, `hop` frames apart.
///
/// The last window always ends at frame `n`, so the tail is covered even
/// when `n - seg` is not a multiple of `hop`. Sequences no longer than one
/// window get a single window starting at 0; an empty sequence gets none.
pub fn segment_starts(n: usize, seg: usize, hop: usize) -> Vec<usize> {
    if n == 0 {
        return Vec::new();
    }
    if n <= seg {
        return vec![0];
    }

    let last = n - seg;
    let mut starts: Vec<usize> = (0..=last).step_by(hop.max(1)).collect();
    if starts.last() != Some(&last) {
        starts.push(last);
    }
    starts
}
