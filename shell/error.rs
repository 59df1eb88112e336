/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

/// Failures surfaced by the view cache, manager and router.
///
/// None of these are fatal. `NotCached` and `Cancelled` are ordinary control
/// flow: the first tells the caller to fall back to a fresh load, the second
/// tells it to stop because a newer navigation took over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewError {
    MissingContainer,
    NotCached { url: String },
    Cancelled,
    ControllerNotFound { path: String },
    ControllerLoad { path: String, reason: String },
    RouteNotFound { path: String },
    Content { url: String, reason: String },
}

impl ViewError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    pub fn is_cache_miss(&self) -> bool {
        matches!(self, Self::NotCached { .. })
    }
}

impl std::fmt::Display for ViewError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingContainer => f.write_str("page container is not rendered"),
            Self::NotCached { url } => write!(f, "no cached view for {url}"),
            Self::Cancelled => f.write_str("navigation request was cancelled"),
            Self::ControllerNotFound { path } => {
                write!(f, "no controller registered for {path}")
            }
            Self::ControllerLoad { path, reason } => {
                write!(f, "controller {path} failed to load: {reason}")
            }
            Self::RouteNotFound { path } => write!(f, "no route registered for {path}"),
            Self::Content { url, reason } => {
                write!(f, "failed to load page content from {url}: {reason}")
            }
        }
    }
}

impl std::error::Error for ViewError {}
