//! Inclusive range normalization shared by list, string and rank commands

/// Normalize an inclusive `[start, stop]` pair against `len`
///
/// Negative values count from the end. Returns `None` for an empty range.
pub fn inclusive_range(start: i64, stop: i64, len: usize) -> Option<(usize, usize)> {
    let n = len as i64;
    let mut start = if start < 0 { start + n } else { start };
    let mut stop = if stop < 0 { stop + n } else { stop };
    if start < 0 {
        start = 0;
    }
    if stop >= n {
        stop = n - 1;
    }
    if start > stop || start >= n || stop < 0 {
        return None;
    }
    Some((start as usize, stop as usize))
}
