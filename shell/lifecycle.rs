/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Page lifecycle events delivered to controllers and subscribers.

use std::collections::HashMap;

use crate::shell::navigation::{NavigationRequest, RequestOptions};
use crate::view::FragmentId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewEventKind {
    /// First time a fragment is shown. Sent once per mount.
    Init,
    BeforeShow,
    Show,
    BeforeHide,
    Hide,
    /// The fragment is being detached; its controller is dropped after this.
    Destroy,
}

impl ViewEventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Init => "viewinit",
            Self::BeforeShow => "viewbeforeshow",
            Self::Show => "viewshow",
            Self::BeforeHide => "viewbeforehide",
            Self::Hide => "viewhide",
            Self::Destroy => "viewdestroy",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewEventDetail {
    pub params: HashMap<String, String>,
    pub is_restored: bool,
    pub page_type: Option<String>,
    pub fullscreen: bool,
    pub state: Option<serde_json::Value>,
    pub options: RequestOptions,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewEvent {
    pub kind: ViewEventKind,
    pub fragment: FragmentId,
    pub url: String,
    pub detail: ViewEventDetail,
}

impl ViewEvent {
    /// Event without request detail, used for views leaving the screen.
    pub fn bare(kind: ViewEventKind, fragment: FragmentId, url: &str) -> Self {
        Self {
            kind,
            fragment,
            url: url.to_string(),
            detail: ViewEventDetail::default(),
        }
    }

    pub(crate) fn for_request(
        kind: ViewEventKind,
        fragment: FragmentId,
        request: &NavigationRequest,
        is_restored: bool,
    ) -> Self {
        Self {
            kind,
            fragment,
            url: request.url.clone(),
            detail: ViewEventDetail {
                params: request.params(),
                is_restored,
                page_type: request.page_type.clone(),
                fullscreen: request.fullscreen,
                state: request.state.clone(),
                options: request.options,
            },
        }
    }
}

/// What a controller factory gets to bind against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewContext {
    pub fragment: FragmentId,
    pub url: String,
    pub params: HashMap<String, String>,
}
