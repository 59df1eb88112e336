/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Per-navigation request descriptor.

use std::collections::HashMap;

use tokio_util::sync::CancellationToken;
use url::Url;

use crate::registries::ControllerFactory;
use crate::shell::lifecycle::ViewContext;
use crate::view::{FragmentId, PageMarkup};

/// Shell urls are host-relative; they are resolved against this origin.
const LOCATION_BASE: &str = "http://pageshell.invalid/";

/// Path and query of a shell url, split the way a browser splits them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Location {
    pub(crate) path: String,
    pub(crate) query: Option<String>,
}

impl Location {
    pub(crate) fn parse(raw: &str) -> Self {
        let resolved = Url::parse(LOCATION_BASE)
            .and_then(|base| Url::options().base_url(Some(&base)).parse(raw));
        match resolved {
            Ok(url) => Self {
                path: url.path().to_string(),
                query: url.query().filter(|query| !query.is_empty()).map(str::to_string),
            },
            Err(_) => Self {
                path: raw.to_string(),
                query: None,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RequestOptions {
    pub supports_theme_media: bool,
    pub enable_media_control: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            supports_theme_media: false,
            enable_media_control: true,
        }
    }
}

/// Page content carried by a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewSource {
    Markup(String),
    Prepared(PageMarkup),
}

impl Default for ViewSource {
    fn default() -> Self {
        Self::Markup(String::new())
    }
}

/// One navigation, created per `show`/`back` and consumed by the cache.
///
/// Clones share the cancellation token: cancelling any clone cancels them
/// all.
#[derive(Clone)]
pub struct NavigationRequest {
    pub url: String,
    pub view: ViewSource,
    pub page_type: Option<String>,
    pub fullscreen: bool,
    /// Append the query string when fetching the page content.
    pub preserve_query: bool,
    pub is_back: bool,
    pub state: Option<serde_json::Value>,
    pub options: RequestOptions,
    controller: Option<ControllerFactory>,
    cancel: CancellationToken,
}

impl NavigationRequest {
    pub fn new(url: impl Into<String>, view: ViewSource) -> Self {
        Self {
            url: url.into(),
            view,
            page_type: None,
            fullscreen: false,
            preserve_query: false,
            is_back: false,
            state: None,
            options: RequestOptions::default(),
            controller: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn from_markup(url: impl Into<String>, markup: impl Into<String>) -> Self {
        Self::new(url, ViewSource::Markup(markup.into()))
    }

    pub fn with_type(mut self, page_type: Option<String>) -> Self {
        self.page_type = page_type;
        self
    }

    pub fn with_fullscreen(mut self, fullscreen: bool) -> Self {
        self.fullscreen = fullscreen;
        self
    }

    pub fn preserving_query(mut self, preserve: bool) -> Self {
        self.preserve_query = preserve;
        self
    }

    pub fn with_back(mut self, is_back: bool) -> Self {
        self.is_back = is_back;
        self
    }

    pub fn with_state(mut self, state: serde_json::Value) -> Self {
        self.state = Some(state);
        self
    }

    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    /// Pre-resolved controller; skips resolution of the page's
    /// `data-controller` path.
    pub fn with_controller(mut self, factory: ControllerFactory) -> Self {
        self.controller = Some(factory);
        self
    }

    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn controller(&self) -> Option<&ControllerFactory> {
        self.controller.as_ref()
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// The url without query string or fragment.
    pub fn path(&self) -> String {
        Location::parse(&self.url).path
    }

    pub fn query(&self) -> Option<String> {
        Location::parse(&self.url).query
    }

    pub fn params(&self) -> HashMap<String, String> {
        self.query()
            .map(|query| url::form_urlencoded::parse(query.as_bytes()).into_owned().collect())
            .unwrap_or_default()
    }

    /// Where to fetch the page content from.
    pub fn content_url(&self, content_path: &str) -> String {
        match self.query() {
            Some(query) if self.preserve_query => format!("{content_path}?{query}"),
            _ => content_path.to_string(),
        }
    }

    /// Normalised page with the request's type and fullscreen flag applied.
    pub(crate) fn page(&self) -> PageMarkup {
        let mut page = match &self.view {
            ViewSource::Markup(raw) => PageMarkup::parse(raw),
            ViewSource::Prepared(page) => page.clone(),
        };
        page.apply_request_metadata(self.page_type.as_deref(), self.fullscreen);
        page
    }

    pub(crate) fn view_context(&self, fragment: FragmentId) -> ViewContext {
        ViewContext {
            fragment,
            url: self.url.clone(),
            params: self.params(),
        }
    }
}

impl std::fmt::Debug for NavigationRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavigationRequest")
            .field("url", &self.url)
            .field("page_type", &self.page_type)
            .field("fullscreen", &self.fullscreen)
            .field("preserve_query", &self.preserve_query)
            .field("is_back", &self.is_back)
            .field("has_controller", &self.controller.is_some())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
