//! Deterministic slug and tag normalisation.
//!
//! Slugs are built by lowercasing the input, splitting it on a fixed set of
//! ASCII and CJK punctuation (plus whitespace and `-`), and joining the
//! surviving tokens with `-`. Non-delimiter characters, including CJK
//! ideographs, are preserved as-is so titles like “基线对齐” keep their
//! original script in the URL.

/// Characters that separate slug tokens. `-` is part of the set, which keeps
/// `slugify` idempotent.
const DELIMITERS: &[char] = &[
    '/', '\\', '.', ',', '_', '!', '\'', '"', ':', ';', '&', '`', '$', '#', '@', '(', ')', '=',
    '~', '。', '，', '！', '【', '】', '、', '·', '「', '」', '｜', '|', '%', '：', '；', '?',
    ' ', '-',
];

fn is_delimiter(ch: char) -> bool {
    ch.is_whitespace() || DELIMITERS.contains(&ch)
}

/// Derive a URL slug from human-readable text.
///
/// Returns an empty string when the input contains nothing but delimiters.
pub fn slugify(input: &str) -> String {
    input
        .to_lowercase()
        .split(is_delimiter)
        .filter(|token| !token.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Split a free-text tag list (for example `"rust, async / tokio"`) into its
/// individual tags. Case is preserved.
pub fn split_tags(input: &str) -> Vec<String> {
    input
        .split(is_delimiter)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_lowercases_and_joins_with_hyphens() {
        assert_eq!(slugify("A Title"), "a-title");
        assert_eq!(slugify("Second entry Luke 1:1-2"), "second-entry-luke-1-1-2");
    }

    #[test]
    fn slugify_collapses_runs_of_delimiters() {
        assert_eq!(slugify("  Hello,   World!! "), "hello-world");
        assert_eq!(slugify("one--two__three"), "one-two-three");
    }

    #[test]
    fn slugify_splits_on_cjk_punctuation() {
        assert_eq!(slugify("基线对齐。排版【指南】"), "基线对齐-排版-指南");
        assert_eq!(slugify("你好，世界！"), "你好-世界");
    }

    #[test]
    fn slugify_is_idempotent() {
        for title in [
            "A Title",
            "Rust: the (good) parts",
            "基线对齐。排版【指南】",
            "tabs\tand\nnewlines",
            "---",
        ] {
            let once = slugify(title);
            assert_eq!(slugify(&once), once, "re-slugifying `{title}`");
        }
    }

    #[test]
    fn slugify_output_has_no_delimiters_or_uppercase() {
        let slug = slugify("What's New in C# 12? (Preview) | Part #3");
        assert_eq!(slug, "what-s-new-in-c-12-preview-part-3");
        assert!(!slug.chars().any(|ch| ch != '-' && is_delimiter(ch)));
        assert_eq!(slug, slug.to_lowercase());
    }

    #[test]
    fn slugify_of_only_delimiters_is_empty() {
        assert_eq!(slugify("?!.,"), "");
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn split_tags_keeps_case() {
        assert_eq!(
            split_tags("Rust, Async / Tokio|web"),
            vec!["Rust", "Async", "Tokio", "web"]
        );
        assert!(split_tags(" , ").is_empty());
    }
}
