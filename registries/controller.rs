/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Page controller registry.
//!
//! Pages name their controller with a `data-controller` path. Paths resolve
//! against two namespaces: native controllers collected at link time through
//! `inventory` (plus anything registered before the registry is shared), and
//! a plugin namespace addressed with the [`PLUGIN_PREFIX`] that can be filled
//! at runtime.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::{self, BoxFuture};
use log::{debug, warn};
use parking_lot::RwLock;

use crate::diagnostics::{CHANNEL_CONTROLLER_RESOLVE_FAILED, emit_message};
use crate::shell::ViewError;
use crate::shell::lifecycle::{ViewContext, ViewEvent};

pub const PLUGIN_PREFIX: &str = "__plugin/";

/// Per-page setup logic bound to one mounted fragment.
///
/// A controller lives as long as its fragment: it is created when the page is
/// first mounted (or re-attached on restore) and receives `destroy` when the
/// slot is reused, deduplicated or reset.
pub trait PageController: Send {
    fn on_view_event(&mut self, event: &ViewEvent);

    fn destroy(&mut self) {}
}

pub type ControllerFactory = Arc<dyn Fn(&ViewContext) -> Box<dyn PageController> + Send + Sync>;

pub fn controller_factory<F>(create: F) -> ControllerFactory
where
    F: Fn(&ViewContext) -> Box<dyn PageController> + Send + Sync + 'static,
{
    Arc::new(create)
}

/// Turns a controller path into a factory.
///
/// Resolution is asynchronous so hosts can back it with lazily loaded
/// modules; the static registry resolves immediately.
pub trait ControllerResolver: Send + Sync {
    fn resolve<'a>(&'a self, path: &'a str)
    -> BoxFuture<'a, Result<ControllerFactory, ViewError>>;
}

#[derive(Clone, Copy)]
pub struct NativeControllerRegistration {
    pub path: &'static str,
    pub create: fn(&ViewContext) -> Box<dyn PageController>,
}

inventory::collect!(NativeControllerRegistration);

pub fn discover_native_controllers() -> Vec<NativeControllerRegistration> {
    inventory::iter::<NativeControllerRegistration>
        .into_iter()
        .copied()
        .collect()
}

pub(crate) fn normalize_controller_path(path: &str) -> String {
    let trimmed = path.trim();
    let trimmed = trimmed.strip_prefix("./").unwrap_or(trimmed);
    let trimmed = trimmed.trim_start_matches('/');
    let trimmed = trimmed.strip_suffix(".js").unwrap_or(trimmed);
    trimmed.to_string()
}

#[derive(Default)]
pub struct ControllerRegistry {
    controllers: HashMap<String, ControllerFactory>,
    plugins: RwLock<HashMap<String, ControllerFactory>>,
}

impl ControllerRegistry {
    /// An empty registry. Link-time registrations are not included.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry seeded with every `inventory`-submitted native controller.
    pub fn with_native_controllers() -> Self {
        let mut registry = Self::new();
        for registration in discover_native_controllers() {
            let create = registration.create;
            if registry
                .register(registration.path, controller_factory(move |ctx| create(ctx)))
                .is_some()
            {
                warn!(
                    "controller registry: duplicate native controller path {}",
                    registration.path
                );
            }
        }
        debug!(
            "controller registry: {} native controllers discovered",
            registry.controllers.len()
        );
        registry
    }

    /// Registers a controller, returning the factory it replaced.
    pub fn register(
        &mut self,
        path: &str,
        factory: ControllerFactory,
    ) -> Option<ControllerFactory> {
        self.controllers
            .insert(normalize_controller_path(path), factory)
    }

    /// Registers a plugin controller. Callable while the registry is shared.
    pub fn register_plugin(&self, path: &str, factory: ControllerFactory) {
        let path = path.strip_prefix(PLUGIN_PREFIX).unwrap_or(path);
        self.plugins
            .write()
            .insert(normalize_controller_path(path), factory);
    }

    pub fn unregister_plugin(&self, path: &str) -> bool {
        let path = path.strip_prefix(PLUGIN_PREFIX).unwrap_or(path);
        self.plugins
            .write()
            .remove(&normalize_controller_path(path))
            .is_some()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.find(path).is_some()
    }

    pub fn len(&self) -> usize {
        self.controllers.len() + self.plugins.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn lookup(&self, path: &str) -> Result<ControllerFactory, ViewError> {
        self.find(path).ok_or_else(|| {
            warn!("controller registry: no controller for {path}");
            emit_message(CHANNEL_CONTROLLER_RESOLVE_FAILED, path.len());
            ViewError::ControllerNotFound {
                path: path.to_string(),
            }
        })
    }

    fn find(&self, path: &str) -> Option<ControllerFactory> {
        match path.trim().strip_prefix(PLUGIN_PREFIX) {
            Some(plugin_path) => self
                .plugins
                .read()
                .get(&normalize_controller_path(plugin_path))
                .cloned(),
            None => self
                .controllers
                .get(&normalize_controller_path(path))
                .cloned(),
        }
    }
}

impl ControllerResolver for ControllerRegistry {
    fn resolve<'a>(
        &'a self,
        path: &'a str,
    ) -> BoxFuture<'a, Result<ControllerFactory, ViewError>> {
        future::ready(self.lookup(path)).boxed()
    }
}

impl std::fmt::Debug for ControllerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut native: Vec<&String> = self.controllers.keys().collect();
        native.sort();
        let plugins = self.plugins.read();
        let mut plugin_paths: Vec<&String> = plugins.keys().collect();
        plugin_paths.sort();
        f.debug_struct("ControllerRegistry")
            .field("controllers", &native)
            .field("plugins", &plugin_paths)
            .finish()
    }
}
