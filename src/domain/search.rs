//! Search-tag indexing and query tokenisation.

use std::collections::BTreeSet;

use crate::domain::entities::Entry;
use crate::domain::slug::slugify;

/// Maximum number of entries returned by a keyword search.
pub const SEARCH_LIMIT: usize = 50;

/// Prefix that marks an index token as an explicit tag rather than a keyword.
pub const TAG_PREFIX: &str = "tag:";

/// Index key for entries carrying `tag`.
pub fn tag_key(tag: &str) -> String {
    format!("{TAG_PREFIX}{}", slugify(tag))
}

/// Build the de-duplicated token set an entry is indexed under.
///
/// Title words are matched as plain keywords, each tag contributes both its
/// slug and its prefixed key, and the publication year and author names are
/// searchable too.
pub fn compute_search_tags(entry: &Entry) -> Vec<String> {
    let mut tokens = BTreeSet::new();

    for word in entry.title().split_whitespace() {
        tokens.insert(word.to_lowercase());
    }

    for tag in entry.tags() {
        let slug = slugify(tag);
        if slug.is_empty() {
            continue;
        }
        tokens.insert(format!("{TAG_PREFIX}{slug}"));
        tokens.insert(slug);
    }

    if let Some(date) = entry.date() {
        tokens.insert(format!("{:04}", date.year()));
    }

    if let Some(author) = entry.author() {
        for name in [&author.first_name, &author.last_name] {
            let name = name.trim();
            if !name.is_empty() {
                tokens.insert(name.to_lowercase());
            }
        }
    }

    tokens.into_iter().collect()
}

/// Tokenise a free-text query: lowercase whitespace-separated words, longest
/// first. Equal lengths keep their query order.
pub fn search_terms(query: &str) -> Vec<String> {
    let mut terms: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
    terms.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
    terms
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::domain::entities::Person;

    fn sample_entry() -> Entry {
        let mut entry = Entry::new();
        entry.set_title("Hello Rust World");
        entry.set_tags(["Async IO", "tokio"]);
        entry.set_date(Some(datetime!(2000-01-02 00:00 UTC)));
        entry.set_author(Some(Person::new("p-1", "Jane", "Li")));
        entry
    }

    #[test]
    fn search_tags_cover_every_source() {
        let tags = compute_search_tags(&sample_entry());
        for expected in [
            "hello",
            "rust",
            "world",
            "async-io",
            "tag:async-io",
            "tokio",
            "tag:tokio",
            "2000",
            "jane",
            "li",
        ] {
            assert!(tags.contains(&expected.to_string()), "missing `{expected}`");
        }
    }

    #[test]
    fn search_tags_are_deduplicated() {
        let mut entry = Entry::new();
        entry.set_title("rust Rust RUST");
        entry.set_tags(["Rust", "rust"]);
        let tags = compute_search_tags(&entry);
        assert_eq!(tags, vec!["rust".to_string(), "tag:rust".to_string()]);
    }

    #[test]
    fn search_tags_skip_missing_date_and_author() {
        let mut entry = Entry::new();
        entry.set_title("Plain");
        assert_eq!(compute_search_tags(&entry), vec!["plain".to_string()]);
    }

    #[test]
    fn search_terms_order_longest_first() {
        assert_eq!(search_terms("cat elephant"), vec!["elephant", "cat"]);
        assert_eq!(search_terms("Ab cd EFG"), vec!["efg", "ab", "cd"]);
        assert!(search_terms("   ").is_empty());
    }

    #[test]
    fn tag_key_prefixes_slug() {
        assert_eq!(tag_key("Async IO"), "tag:async-io");
        assert_eq!(tag_key("tokio"), "tag:tokio");
    }
}
