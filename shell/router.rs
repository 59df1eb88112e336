/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Route table and navigation on top of the view manager.
//!
//! Each navigation supersedes the one before it: the previous request's
//! cancellation token is cancelled before the new request is built. Back
//! navigations try the view cache first and fall back to a fresh load when
//! the page is no longer cached; a cancelled restore does not fall back.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::diagnostics::{CHANNEL_ROUTE_NOT_FOUND, CHANNEL_ROUTE_SUPERSEDED, emit_message};
use crate::registries::ControllerResolver;
use crate::shell::ViewError;
use crate::shell::content::ContentSource;
use crate::shell::navigation::{Location, NavigationRequest, RequestOptions, ViewSource};
use crate::shell::view_container::ViewTransition;
use crate::shell::view_manager::ViewManager;
use crate::view::ViewTree;

/// Route types and page names that never offer a way back.
pub const START_PAGES: [&str; 3] = ["home", "login", "selectserver"];

const HOME_TYPE: &str = "home";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteDefinition {
    pub path: String,
    /// Content location when it differs from `path`.
    pub content_path: Option<String>,
    pub controller: Option<String>,
    #[serde(rename = "type")]
    pub page_type: Option<String>,
    pub fullscreen: bool,
    pub enable_content_query_string: bool,
    pub supports_theme_media: bool,
    pub enable_media_control: bool,
}

impl Default for RouteDefinition {
    fn default() -> Self {
        Self {
            path: String::new(),
            content_path: None,
            controller: None,
            page_type: None,
            fullscreen: false,
            enable_content_query_string: false,
            supports_theme_media: false,
            enable_media_control: true,
        }
    }
}

impl RouteDefinition {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_controller(mut self, controller: impl Into<String>) -> Self {
        self.controller = Some(controller.into());
        self
    }

    pub fn with_type(mut self, page_type: impl Into<String>) -> Self {
        self.page_type = Some(page_type.into());
        self
    }

    pub fn with_content_path(mut self, content_path: impl Into<String>) -> Self {
        self.content_path = Some(content_path.into());
        self
    }

    pub fn with_content_query_string(mut self) -> Self {
        self.enable_content_query_string = true;
        self
    }

    pub fn fullscreen(mut self) -> Self {
        self.fullscreen = true;
        self
    }

    fn options(&self) -> RequestOptions {
        RequestOptions {
            supports_theme_media: self.supports_theme_media,
            enable_media_control: self.enable_media_control,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    pub route: RouteDefinition,
    /// Path as navigated, query string included.
    pub path: String,
}

#[derive(Debug, Clone, PartialEq)]
struct HistoryEntry {
    path: String,
    state: Option<serde_json::Value>,
}

fn with_leading_slash(path: &str) -> String {
    if path.starts_with('/') || path.contains("://") {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

fn route_key(path: &str) -> String {
    Location::parse(path).path
}

/// Strips `base` from `path` only at a segment boundary.
fn strip_base<'a>(path: &'a str, base: &str) -> Option<&'a str> {
    if base.is_empty() {
        return None;
    }
    path.strip_prefix(base)
        .filter(|rest| rest.is_empty() || rest.starts_with(['/', '?', '#']))
}

pub struct Router<T: ViewTree> {
    manager: ViewManager<T>,
    resolver: Arc<dyn ControllerResolver>,
    content: Arc<dyn ContentSource>,
    routes: HashMap<String, RouteDefinition>,
    base_url: String,
    history: Vec<HistoryEntry>,
    current: Option<RouteInfo>,
    current_request: Option<CancellationToken>,
}

impl<T: ViewTree> Router<T> {
    pub fn new(
        manager: ViewManager<T>,
        resolver: Arc<dyn ControllerResolver>,
        content: Arc<dyn ContentSource>,
    ) -> Self {
        Self {
            manager,
            resolver,
            content,
            routes: HashMap::new(),
            base_url: String::new(),
            history: Vec::new(),
            current: None,
            current_request: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Adds a route, returning the definition it replaced.
    pub fn add_route(&mut self, mut route: RouteDefinition) -> Option<RouteDefinition> {
        route.path = with_leading_slash(&route.path);
        self.routes.insert(route.path.clone(), route)
    }

    pub fn add_routes(&mut self, routes: impl IntoIterator<Item = RouteDefinition>) {
        for route in routes {
            if let Some(replaced) = self.add_route(route) {
                warn!("router: route {} declared twice, last one wins", replaced.path);
            }
        }
    }

    pub fn route(&self, path: &str) -> Option<&RouteDefinition> {
        self.routes.get(&route_key(&with_leading_slash(path)))
    }

    pub fn manager(&self) -> &ViewManager<T> {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut ViewManager<T> {
        &mut self.manager
    }

    pub fn current_route(&self) -> Option<&RouteInfo> {
        self.current.as_ref()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Token of the navigation still in flight, if any.
    pub fn current_request_token(&self) -> Option<CancellationToken> {
        self.current_request.clone()
    }

    pub fn cancel_current_load_request(&mut self) {
        if let Some(token) = self.current_request.take()
            && !token.is_cancelled()
        {
            debug!("router: superseding in-flight navigation");
            emit_message(CHANNEL_ROUTE_SUPERSEDED, 0);
            token.cancel();
        }
    }

    pub fn can_go_back(&self) -> bool {
        let Some(current) = &self.current else {
            return false;
        };
        let on_start_page = current
            .route
            .page_type
            .as_deref()
            .is_some_and(|page_type| START_PAGES.contains(&page_type))
            || START_PAGES.contains(&page_name(&current.path).as_str());
        !on_start_page && self.history.len() > 1
    }

    /// Navigates to `path`. Showing the current path again does nothing,
    /// except on the home page.
    pub async fn show(&mut self, path: &str) -> Result<Option<ViewTransition>, ViewError> {
        self.show_entry(path, None).await
    }

    pub async fn show_with_state(
        &mut self,
        path: &str,
        state: serde_json::Value,
    ) -> Result<Option<ViewTransition>, ViewError> {
        self.show_entry(path, Some(state)).await
    }

    /// Returns to the previous history entry. `Ok(None)` when there is none.
    pub async fn back(&mut self) -> Result<Option<ViewTransition>, ViewError> {
        if self.history.len() < 2 {
            debug!("router: back requested with no history");
            return Ok(None);
        }
        let Some(left) = self.history.pop() else {
            return Ok(None);
        };
        let Some(target) = self.history.last().cloned() else {
            return Ok(None);
        };
        match self.navigate(&target.path, true, target.state).await {
            Ok(transition) => Ok(Some(transition)),
            Err(error) => {
                self.history.push(left);
                Err(error)
            }
        }
    }

    /// Routes `path` to the view manager without touching history.
    pub async fn navigate(
        &mut self,
        path: &str,
        is_back: bool,
        state: Option<serde_json::Value>,
    ) -> Result<ViewTransition, ViewError> {
        let outcome = self.navigate_inner(path, is_back, state).await;
        self.current_request = None;
        outcome
    }

    /// Destroys every cached view and forgets history.
    pub fn reset(&mut self) {
        self.cancel_current_load_request();
        self.manager.reset();
        self.history.clear();
        self.current = None;
    }

    fn normalize_path(&self, path: &str) -> String {
        let path = path.trim_start_matches('#').trim_start_matches('!');
        let path = with_leading_slash(path);
        match strip_base(&path, &self.base_url) {
            Some(rest) => with_leading_slash(rest),
            None => path,
        }
    }

    async fn show_entry(
        &mut self,
        path: &str,
        state: Option<serde_json::Value>,
    ) -> Result<Option<ViewTransition>, ViewError> {
        let path = self.normalize_path(path);
        if let Some(current) = &self.current
            && current.path == path
            && current.route.page_type.as_deref() != Some(HOME_TYPE)
        {
            debug!("router: already showing {path}");
            return Ok(None);
        }

        let transition = self.navigate(&path, false, state.clone()).await?;
        self.history.push(HistoryEntry { path, state });
        Ok(Some(transition))
    }

    async fn navigate_inner(
        &mut self,
        path: &str,
        is_back: bool,
        state: Option<serde_json::Value>,
    ) -> Result<ViewTransition, ViewError> {
        let Some(route) = self.routes.get(&route_key(path)).cloned() else {
            warn!("router: no route for {path}");
            emit_message(CHANNEL_ROUTE_NOT_FOUND, path.len());
            return Err(ViewError::RouteNotFound {
                path: path.to_string(),
            });
        };

        self.cancel_current_load_request();
        let token = CancellationToken::new();
        self.current_request = Some(token.clone());

        let factory = match &route.controller {
            Some(controller) => Some(self.resolver.resolve(controller).await?),
            None => None,
        };

        let mut request = NavigationRequest::new(
            format!("{}{path}", self.base_url),
            ViewSource::default(),
        )
        .with_type(route.page_type.clone())
        .with_fullscreen(route.fullscreen)
        .preserving_query(route.enable_content_query_string)
        .with_back(is_back)
        .with_options(route.options())
        .with_cancel_token(token.clone());
        if let Some(state) = state {
            request = request.with_state(state);
        }
        if let Some(factory) = factory {
            request = request.with_controller(factory);
        }

        if is_back {
            match self.manager.try_restore_view(&request).await {
                Ok(transition) => {
                    self.finish(route, path);
                    return Ok(transition);
                }
                Err(error) if error.is_cancelled() => return Err(error),
                Err(error) => debug!("router: restore of {path} failed ({error}), loading fresh"),
            }
        }

        let content_url = request.content_url(&self.content_location(&route));
        let markup = self.content.fetch(&content_url, &token).await?;
        request.view = ViewSource::Markup(markup);
        let transition = self.manager.load_view(&request).await?;
        self.finish(route, path);
        Ok(transition)
    }

    fn content_location(&self, route: &RouteDefinition) -> String {
        let location = route.content_path.as_deref().unwrap_or(&route.path);
        if location.contains("://") {
            return location.to_string();
        }
        format!("{}{}", self.base_url, with_leading_slash(location))
    }

    fn finish(&mut self, route: RouteDefinition, path: &str) {
        debug!("router: now showing {path}");
        self.current = Some(RouteInfo {
            route,
            path: path.to_string(),
        });
    }
}

/// `/home.html?tab=1` -> `home`.
fn page_name(path: &str) -> String {
    let path = route_key(path);
    let name = path.trim_start_matches('/');
    name.strip_suffix(".html").unwrap_or(name).to_string()
}
