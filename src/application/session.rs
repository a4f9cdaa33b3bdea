//! The caller context every store operation runs under.

/// Request context supplied by the access-control layer.
pub trait Session: Send + Sync {
    /// Tenant the request belongs to. Empty means no usable session.
    fn site(&self) -> &str;

    fn is_authenticated(&self) -> bool;

    fn person_id(&self) -> Option<&str>;

    fn display_name(&self) -> &str;
}

#[derive(Debug, Clone, Default)]
pub struct SiteSession {
    site: String,
    person: Option<(String, String)>,
}

impl SiteSession {
    pub fn anonymous(site: impl Into<String>) -> Self {
        Self {
            site: site.into(),
            person: None,
        }
    }

    pub fn authenticated(
        site: impl Into<String>,
        person_id: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            site: site.into(),
            person: Some((person_id.into(), display_name.into())),
        }
    }
}

impl Session for SiteSession {
    fn site(&self) -> &str {
        &self.site
    }

    fn is_authenticated(&self) -> bool {
        self.person.is_some()
    }

    fn person_id(&self) -> Option<&str> {
        self.person.as_ref().map(|(id, _)| id.as_str())
    }

    fn display_name(&self) -> &str {
        self.person
            .as_ref()
            .map(|(_, name)| name.as_str())
            .unwrap_or_default()
    }
}
