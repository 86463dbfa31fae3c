//! Filesystem document store
//!
//! Documents are markdown files with a YAML front-matter block:
//!
//! ```text
//! ---
//! title: My Post
//! ---
//! Body...
//! ```

use async_trait::async_trait;
use crosspost_domain::{Document, DocumentStore, StoreError};
use serde_yaml::Mapping;
use std::path::{Path, PathBuf};
use tokio::fs;

const DELIMITER: &str = "---";

/// Document store rooted at a repository checkout
pub struct FsDocumentStore {
    root: PathBuf,
}

impl FsDocumentStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.root.join(id)
    }
}

/// Split a file into front-matter and body.
///
/// A file without a front-matter block yields an empty mapping and the whole
/// content as body.
pub fn parse_document(id: &str, content: &str) -> Result<Document, StoreError> {
    let Some(rest) = content
        .strip_prefix(DELIMITER)
        .and_then(|rest| rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n')))
    else {
        return Ok(Document::new(id, Mapping::new(), content));
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == DELIMITER {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            let metadata = parse_front_matter(id, yaml)?;
            return Ok(Document::new(id, metadata, body));
        }
        offset += line.len();
    }

    Err(StoreError::Parse {
        path: id.to_string(),
        message: "Missing closing front-matter delimiter (---)".to_string(),
    })
}

fn parse_front_matter(id: &str, yaml: &str) -> Result<Mapping, StoreError> {
    if yaml.trim().is_empty() {
        return Ok(Mapping::new());
    }

    serde_yaml::from_str(yaml).map_err(|e| StoreError::Parse {
        path: id.to_string(),
        message: e.to_string(),
    })
}

/// Render a document back to file content; the body is written untouched
pub fn render_document(document: &Document) -> Result<String, StoreError> {
    let yaml = serde_yaml::to_string(&document.metadata)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;

    let mut content = String::with_capacity(yaml.len() + document.body.len() + 8);
    content.push_str(DELIMITER);
    content.push('\n');
    content.push_str(&yaml);
    if !yaml.ends_with('\n') {
        content.push('\n');
    }
    content.push_str(DELIMITER);
    content.push('\n');
    content.push_str(&document.body);

    Ok(content)
}

#[async_trait]
impl DocumentStore for FsDocumentStore {
    async fn load(&self, id: &str) -> Result<Document, StoreError> {
        let path = self.path_for(id);
        let content = fs::read_to_string(&path)
            .await
            .map_err(|source| StoreError::Io {
                path: path.display().to_string(),
                source,
            })?;

        parse_document(id, &content)
    }

    async fn save(&self, document: &Document) -> Result<(), StoreError> {
        let path = self.path_for(&document.id);
        let content = render_document(document)?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let temp_path = path.with_file_name(format!(".{}.tmp", file_name));

        let io_error = |source| StoreError::Io {
            path: path.display().to_string(),
            source,
        };

        // Write to temp file first, then rename over the original
        fs::write(&temp_path, content).await.map_err(io_error)?;
        fs::rename(&temp_path, &path).await.map_err(io_error)?;

        tracing::debug!(document = %document.id, path = %path.display(), "Saved document");
        Ok(())
    }
}
