//! # String Similarity
//!
//! Edit distance and the normalized similarity score used for fuzzy product
//! matching. Both work on Unicode scalar values, not bytes.

/// Levenshtein edit distance between two strings
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    let len_a = a_chars.len();
    let len_b = b_chars.len();

    if len_a == 0 {
        return len_b;
    }
    if len_b == 0 {
        return len_a;
    }

    let mut matrix = vec![vec![0usize; len_b + 1]; len_a + 1];

    #[allow(clippy::needless_range_loop)]
    for i in 0..=len_a {
        matrix[i][0] = i;
    }
    for j in 0..=len_b {
        matrix[0][j] = j;
    }

    for i in 1..=len_a {
        for j in 1..=len_b {
            let cost = if a_chars[i - 1] == b_chars[j - 1] { 0 } else { 1 };

            matrix[i][j] = (matrix[i - 1][j] + 1)
                .min(matrix[i][j - 1] + 1)
                .min(matrix[i - 1][j - 1] + cost);
        }
    }

    matrix[len_a][len_b]
}

/// Similarity in `0.0..=1.0`: `1 - distance / max(len(a), len(b))`.
///
/// Strings shorter than `min_length` characters have similarity 0.
pub fn calculate_similarity(a: &str, b: &str, min_length: usize) -> f64 {
    let len_a = a.chars().count();
    let len_b = b.chars().count();

    if len_a < min_length || len_b < min_length {
        return 0.0;
    }

    let max_len = len_a.max(len_b);
    if max_len == 0 {
        // Both empty with min_length == 0
        return 1.0;
    }

    let distance = levenshtein_distance(a, b);
    1.0 - distance as f64 / max_len as f64
}
