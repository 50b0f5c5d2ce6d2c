//! Fixed-size chunking of text before translation.
//!
//! Windows are counted in Unicode scalar values and have no overlap. A
//! window boundary can fall in the middle of a word or sentence.

/// Split `text` into consecutive windows of at most `max_chars` characters.
///
/// Every window except the last holds exactly `max_chars` characters.
/// Empty input yields no windows; a `max_chars` of zero is treated as one.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<&str> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::with_capacity(text.len() / max_chars + 1);
    let mut start = 0;
    let mut count = 0;

    for (idx, _) in text.char_indices() {
        if count == max_chars {
            chunks.push(&text[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }

    if start < text.len() {
        chunks.push(&text[start..]);
    }

    chunks
}

/// Chunks made only of whitespace are never sent to the model.
pub fn is_blank(chunk: &str) -> bool {
    chunk.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_exact_windows() {
        assert_eq!(chunk_text("abcdef", 2), vec!["ab", "cd", "ef"]);
        assert_eq!(chunk_text("abcdef", 4), vec!["abcd", "ef"]);
        assert_eq!(chunk_text("abc", 10), vec!["abc"]);
    }

    #[test]
    fn test_chunk_empty() {
        assert!(chunk_text("", 500).is_empty());
    }

    #[test]
    fn test_chunk_counts_characters_not_bytes() {
        assert_eq!(chunk_text("ééé", 2), vec!["éé", "é"]);
        assert_eq!(chunk_text("認知科学", 3), vec!["認知科", "学"]);
    }

    #[test]
    fn test_chunk_splits_mid_word() {
        assert_eq!(chunk_text("neuron cell", 4), vec!["neur", "on c", "ell"]);
    }

    #[test]
    fn test_chunk_default_window() {
        let text = "a".repeat(1200);
        let sizes: Vec<_> = chunk_text(&text, 500).iter().map(|c| c.len()).collect();
        assert_eq!(sizes, vec![500, 500, 200]);
    }

    #[test]
    fn test_chunk_zero_is_one() {
        assert_eq!(chunk_text("ab", 0), vec!["a", "b"]);
    }

    #[test]
    fn test_chunks_concatenate_to_input() {
        let text = "Working memory holds information\n for brief periods.  ";
        assert_eq!(chunk_text(text, 7).concat(), text);
    }

    #[test]
    fn test_is_blank() {
        assert!(is_blank("  \n\t "));
        assert!(is_blank(""));
        assert!(!is_blank(" a "));
    }
}
