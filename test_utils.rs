/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Helpers shared by unit tests and the scenario suite.

use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use parking_lot::Mutex;

use crate::registries::{
    ControllerFactory, ControllerRegistry, ControllerResolver, PageController, controller_factory,
};
use crate::shell::{
    NavigationRequest, ViewContainer, ViewContext, ViewError, ViewEvent, ViewEventKind,
};
use crate::view::{FragmentId, HeadlessViewTree};

pub const RECORDING_CONTROLLER: &str = "tests/recording";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEvent {
    pub url: String,
    pub fragment: FragmentId,
    pub kind: ViewEventKind,
}

/// Shared log written by every [`RecordingController`] built from one factory.
#[derive(Debug, Clone, Default)]
pub struct ControllerLog {
    events: Arc<Mutex<Vec<RecordedEvent>>>,
    created: Arc<Mutex<Vec<String>>>,
}

impl ControllerLog {
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().clone()
    }

    pub fn kinds_for(&self, url: &str) -> Vec<ViewEventKind> {
        self.events
            .lock()
            .iter()
            .filter(|event| event.url == url)
            .map(|event| event.kind)
            .collect()
    }

    /// Urls whose controllers received `Destroy`, in order.
    pub fn destroyed(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter(|event| event.kind == ViewEventKind::Destroy)
            .map(|event| event.url.clone())
            .collect()
    }

    /// Urls a controller was instantiated for, in order.
    pub fn created(&self) -> Vec<String> {
        self.created.lock().clone()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
        self.created.lock().clear();
    }
}

pub struct RecordingController {
    url: String,
    log: ControllerLog,
}

impl PageController for RecordingController {
    fn on_view_event(&mut self, event: &ViewEvent) {
        self.log.events.lock().push(RecordedEvent {
            url: self.url.clone(),
            fragment: event.fragment,
            kind: event.kind,
        });
    }
}

pub fn recording_factory(log: &ControllerLog) -> ControllerFactory {
    let log = log.clone();
    controller_factory(move |ctx: &ViewContext| {
        log.created.lock().push(ctx.url.clone());
        Box::new(RecordingController {
            url: ctx.url.clone(),
            log: log.clone(),
        }) as Box<dyn PageController>
    })
}

/// Registry holding one recording controller under [`RECORDING_CONTROLLER`].
pub fn recording_registry(log: &ControllerLog) -> ControllerRegistry {
    let mut registry = ControllerRegistry::new();
    registry.register(RECORDING_CONTROLLER, recording_factory(log));
    registry
}

/// Resolver that yields `yields` times before answering, standing in for a
/// lazily loaded controller module.
pub struct YieldingResolver {
    inner: ControllerRegistry,
    yields: usize,
}

impl YieldingResolver {
    pub fn new(inner: ControllerRegistry, yields: usize) -> Self {
        Self { inner, yields }
    }
}

impl ControllerResolver for YieldingResolver {
    fn resolve<'a>(
        &'a self,
        path: &'a str,
    ) -> BoxFuture<'a, Result<ControllerFactory, ViewError>> {
        async move {
            for _ in 0..self.yields {
                tokio::task::yield_now().await;
            }
            self.inner.lookup(path)
        }
        .boxed()
    }
}

pub fn headless_container(
    resolver: Arc<dyn ControllerResolver>,
) -> ViewContainer<HeadlessViewTree> {
    ViewContainer::new(HeadlessViewTree::new(), resolver)
}

/// Request for a page whose root names `controller`, or no controller.
pub fn page_request(url: &str, controller: Option<&str>) -> NavigationRequest {
    let markup = match controller {
        Some(path) => format!(r#"<div data-controller="{path}" data-title="{url}"></div>"#),
        None => format!(r#"<div data-title="{url}"></div>"#),
    };
    NavigationRequest::from_markup(url, markup)
}
