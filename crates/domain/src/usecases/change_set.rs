//! Change-set selection - which touched files are publishable documents

use crate::model::SiteConfig;

/// Ordered, de-duplicated document identifiers for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    ids: Vec<String>,
}

impl ChangeSet {
    /// Keep the managed documents among `paths`, in first-seen order
    pub fn select<I, S>(paths: I, site: &SiteConfig) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ids: Vec<String> = Vec::new();

        for path in paths {
            let path = path.as_ref().trim();
            let path = path.strip_prefix("./").unwrap_or(path);
            if !site.is_managed(path) {
                tracing::debug!(path = %path, "Ignoring unmanaged path");
                continue;
            }
            if ids.iter().any(|id| id == path) {
                continue;
            }
            ids.push(path.to_string());
        }

        Self { ids }
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}
