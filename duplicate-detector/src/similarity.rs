//! Sequence similarity as a greedy longest-matching-block
//! decomposition: repeatedly find the longest common block, recurse on
//! the pieces to either side, and score 2·matched / (len_a + len_b).
//! Equivalent to Python's `difflib.SequenceMatcher.ratio()` without the
//! junk heuristic; the duplicate thresholds were tuned against exactly
//! this ratio.

use std::collections::HashMap;

/// Similarity of two strings in [0, 1]. Two empty strings are fully
/// similar; one empty string is fully dissimilar.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let matches = total_matched(&a, &b);
    2.0 * matches as f64 / (a.len() + b.len()) as f64
}

/// Total length of the matching blocks.
fn total_matched(a: &[char], b: &[char]) -> usize {
    // Positions of each element of b, in ascending order.
    let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
    for (j, &c) in b.iter().enumerate() {
        b2j.entry(c).or_default().push(j);
    }

    let mut total = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];
    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, size) = longest_match(a, &b2j, alo, ahi, blo, bhi);
        if size > 0 {
            total += size;
            if alo < i && blo < j {
                pending.push((alo, i, blo, j));
            }
            if i + size < ahi && j + size < bhi {
                pending.push((i + size, ahi, j + size, bhi));
            }
        }
    }
    total
}

/// Longest block with a[i..i+size] == b[j..j+size], alo<=i<i+size<=ahi
/// and blo<=j<j+size<=bhi. Among equally long blocks, the earliest in
/// `a` (then in `b`) wins.
fn longest_match(
    a: &[char],
    b2j: &HashMap<char, Vec<usize>>,
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let mut best_i = alo;
    let mut best_j = blo;
    let mut best_size = 0;

    // j2len[j] = length of the longest run ending at a[i], b[j].
    let mut j2len: HashMap<usize, usize> = HashMap::new();
    for (i, &c) in a.iter().enumerate().take(ahi).skip(alo) {
        let mut new_j2len = HashMap::new();
        if let Some(indices) = b2j.get(&c) {
            for &j in indices {
                if j < blo {
                    continue;
                }
                if j >= bhi {
                    break;
                }
                let size = if j > 0 {
                    j2len.get(&(j - 1)).copied().unwrap_or(0) + 1
                } else {
                    1
                };
                new_j2len.insert(j, size);
                if size > best_size {
                    best_i = i + 1 - size;
                    best_j = j + 1 - size;
                    best_size = size;
                }
            }
        }
        j2len = new_j2len;
    }

    (best_i, best_j, best_size)
}
