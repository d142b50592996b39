pub mod env;
pub mod openai;
pub mod telemetry;

/// Counts Unicode scalar values; review text is mostly Hangul so byte lengths are meaningless.
#[inline]
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Truncates `text` to at most `max` chars, ending with an ellipsis when anything was cut.
pub fn truncate_chars(text: &str, max: usize) -> String {
    if char_len(text) <= max {
        return text.to_string();
    }

    if max == 0 {
        return String::new();
    }

    let mut out: String = text.chars().take(max - 1).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_char_len_counts_hangul_once() {
        assert_eq!(char_len("분위기좋음"), 5);
        assert_eq!("분위기좋음".len(), 15);
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("가나다라마", 10), "가나다라마");
        assert_eq!(truncate_chars("가나다라마", 3), "가나…");
        assert_eq!(char_len(&truncate_chars("가나다라마", 3)), 3);
        assert_eq!(truncate_chars("abc", 0), "");
    }
}
