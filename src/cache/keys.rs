//! Cache key definitions. Every key carries its site so tenants never share
//! cached entries.

use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdKey {
    pub site: String,
    pub id: Uuid,
}

impl IdKey {
    pub fn new(site: &str, id: Uuid) -> Self {
        Self {
            site: site.to_string(),
            id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlugKey {
    pub site: String,
    pub slug: String,
}

impl SlugKey {
    pub fn new(site: &str, slug: &str) -> Self {
        Self {
            site: site.to_string(),
            slug: slug.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_differ_across_sites() {
        let id = Uuid::nil();
        assert_ne!(IdKey::new("a", id), IdKey::new("b", id));
        assert_ne!(SlugKey::new("a", "hello"), SlugKey::new("b", "hello"));
        assert_eq!(SlugKey::new("a", "hello"), SlugKey::new("a", "hello"));
    }
}
