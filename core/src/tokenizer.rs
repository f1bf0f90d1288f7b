use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref RE: Regex = Regex::new(r"[\p{L}\p{N}]+").expect("valid regex");
}

/// Tokenize text into terms: NFKC normalization, lowercase, split on anything
/// that is not a letter or digit.
///
/// NFKC folds the ligatures PDF extraction tends to emit (`ﬁ`, `ﬂ`) into plain
/// letters. Punctuation is a separator, so `don't` yields `don` and `t`.
pub fn tokenize(text: &str) -> Vec<String> {
    let normalized = text.nfkc().collect::<String>().to_lowercase();
    RE.find_iter(&normalized).map(|m| m.as_str().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_tokenize() {
        let t = tokenize("Cat, dog; BIRD!");
        assert_eq!(t, vec!["cat", "dog", "bird"]);
    }

    #[test]
    fn whitespace_only_is_empty() {
        assert!(tokenize("").is_empty());
        assert!(tokenize(" \t\n\u{c} ").is_empty());
        assert!(tokenize("--- ... !!!").is_empty());
    }
}
