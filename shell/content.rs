/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Where routed pages get their markup from.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use futures_util::FutureExt;
use futures_util::future::{self, BoxFuture};
use log::debug;
use tokio_util::sync::CancellationToken;

use crate::shell::ViewError;
use crate::shell::navigation::Location;

pub trait ContentSource: Send + Sync {
    /// Fetches the markup at `url`. `url` may carry a query string.
    fn fetch<'a>(
        &'a self,
        url: &'a str,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<String, ViewError>>;
}

fn page_path(url: &str) -> String {
    Location::parse(url).path
}

fn content_error(url: &str, reason: impl std::fmt::Display) -> ViewError {
    ViewError::Content {
        url: url.to_string(),
        reason: reason.to_string(),
    }
}

/// Pages held in memory, keyed by content path.
#[derive(Debug, Clone, Default)]
pub struct StaticContentSource {
    pages: HashMap<String, String>,
}

impl StaticContentSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, path: impl Into<String>, markup: impl Into<String>) -> Self {
        self.insert(path, markup);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, markup: impl Into<String>) {
        self.pages.insert(path.into(), markup.into());
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    fn lookup(&self, url: &str, cancel: &CancellationToken) -> Result<String, ViewError> {
        if cancel.is_cancelled() {
            return Err(ViewError::Cancelled);
        }
        let path = page_path(url);
        self.pages
            .get(&path)
            .or_else(|| self.pages.get(path.trim_start_matches('/')))
            .cloned()
            .ok_or_else(|| content_error(url, "no such page"))
    }
}

impl ContentSource for StaticContentSource {
    fn fetch<'a>(
        &'a self,
        url: &'a str,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<String, ViewError>> {
        future::ready(self.lookup(url, cancel)).boxed()
    }
}

/// Page files under a root directory. Paths escaping the root are refused.
#[derive(Debug, Clone)]
pub struct DirectoryContentSource {
    root: PathBuf,
}

impl DirectoryContentSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, url: &str) -> Result<PathBuf, ViewError> {
        let path = page_path(url);
        let relative = Path::new(path.trim_start_matches('/'));
        if relative.as_os_str().is_empty() {
            return Err(content_error(url, "empty page path"));
        }
        if !relative
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
        {
            return Err(content_error(url, "path escapes the pages directory"));
        }
        Ok(self.root.join(relative))
    }
}

impl ContentSource for DirectoryContentSource {
    fn fetch<'a>(
        &'a self,
        url: &'a str,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<String, ViewError>> {
        async move {
            if cancel.is_cancelled() {
                return Err(ViewError::Cancelled);
            }
            let path = self.resolve(url)?;
            debug!("content: reading {}", path.display());
            let markup = tokio::task::spawn_blocking(move || std::fs::read_to_string(path))
                .await
                .map_err(|error| content_error(url, error))?
                .map_err(|error| content_error(url, error))?;
            if cancel.is_cancelled() {
                return Err(ViewError::Cancelled);
            }
            Ok(markup)
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_source_ignores_query_and_leading_slash() {
        let source = StaticContentSource::new().with_page("list.html", "<div>list</div>");
        let token = CancellationToken::new();

        assert_eq!(
            source.fetch("/list.html?parentId=3", &token).await,
            Ok("<div>list</div>".to_string())
        );
        assert_eq!(
            source.fetch("/list.html#top?x=1", &token).await,
            Ok("<div>list</div>".to_string())
        );
        assert!(matches!(
            source.fetch("missing.html", &token).await,
            Err(ViewError::Content { .. })
        ));
    }

    #[tokio::test]
    async fn cancelled_fetch_reports_cancelled() {
        let source = StaticContentSource::new().with_page("a.html", "");
        let token = CancellationToken::new();
        token.cancel();

        assert_eq!(source.fetch("a.html", &token).await, Err(ViewError::Cancelled));
    }

    #[tokio::test]
    async fn directory_source_reads_pages_and_refuses_escapes() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir(dir.path().join("dashboard")).expect("mkdir");
        std::fs::write(
            dir.path().join("dashboard/general.html"),
            r#"<div data-title="General"></div>"#,
        )
        .expect("write page");
        let source = DirectoryContentSource::new(dir.path());
        let token = CancellationToken::new();

        let markup = source
            .fetch("/dashboard/general.html?x=1", &token)
            .await
            .expect("page read");
        assert!(markup.contains("General"));

        for bad in ["../secret.html", "/dashboard/../../etc/passwd", ""] {
            assert!(
                matches!(source.fetch(bad, &token).await, Err(ViewError::Content { .. })),
                "{bad} should be refused"
            );
        }
        assert!(source.fetch("nothing.html", &token).await.is_err());
    }
}
