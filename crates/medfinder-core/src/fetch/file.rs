//! File system fetcher for a static site root

use super::{DocumentFetcher, DocumentHead, FetchedDocument};
use crate::error::{MedfinderError, Result};
use chrono::{DateTime, Utc};
use std::path::{Component, Path, PathBuf};

/// Serves documents from a local directory the way a static web server would,
/// including an autoindex page for directories.
pub struct FileFetcher {
    root: PathBuf,
}

impl FileFetcher {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(MedfinderError::InvalidInput(format!(
                "Path escapes site root: {}",
                path
            )));
        }
        Ok(self.root.join(relative))
    }

    async fn listing(&self, dir: &Path) -> Result<String> {
        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let mut name = entry.file_name().to_string_lossy().to_string();
            if entry.file_type().await?.is_dir() {
                name.push('/');
            }
            names.push(name);
        }
        names.sort();

        let mut html = String::from("<html><head><title>Index</title></head><body><ul>\n");
        for name in names {
            html.push_str(&format!("<li><a href=\"{0}\">{0}</a></li>\n", name));
        }
        html.push_str("</ul></body></html>\n");
        Ok(html)
    }
}

fn not_found(path: &str, e: std::io::Error) -> MedfinderError {
    if e.kind() == std::io::ErrorKind::NotFound {
        MedfinderError::DocumentNotFound(path.to_string())
    } else {
        MedfinderError::Io(e)
    }
}

#[async_trait::async_trait]
impl DocumentFetcher for FileFetcher {
    fn fetcher_type(&self) -> &'static str {
        "file"
    }

    async fn head(&self, path: &str) -> Result<DocumentHead> {
        let full = self.resolve(path)?;
        let meta = tokio::fs::metadata(&full)
            .await
            .map_err(|e| not_found(path, e))?;
        Ok(DocumentHead {
            last_modified: meta.modified().ok().map(DateTime::<Utc>::from),
            content_length: meta.is_file().then_some(meta.len()),
        })
    }

    async fn get(&self, path: &str) -> Result<FetchedDocument> {
        let full = self.resolve(path)?;
        let meta = tokio::fs::metadata(&full)
            .await
            .map_err(|e| not_found(path, e))?;

        let body = if meta.is_dir() {
            self.listing(&full).await?
        } else {
            let bytes = tokio::fs::read(&full).await?;
            String::from_utf8_lossy(&bytes).into_owned()
        };

        Ok(FetchedDocument {
            path: path.to_string(),
            content_length: Some(body.len() as u64),
            last_modified: meta.modified().ok().map(DateTime::<Utc>::from),
            body,
        })
    }
}
