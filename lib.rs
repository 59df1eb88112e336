/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Page hosting core for a single-container web shell.
//!
//! [`shell::ViewContainer`] keeps the last three pages mounted so back
//! navigation can bring one forward instead of rebuilding it.
//! [`shell::ViewManager`] dispatches page lifecycle events around those
//! transitions and [`shell::Router`] maps paths onto them.

pub mod diagnostics;
pub mod prefs;
pub mod registries;
pub mod shell;
pub mod view;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use prefs::{PrefsError, ShellPrefs};
pub use registries::{ControllerRegistry, ControllerResolver, PageController};
pub use shell::{NavigationRequest, Router, ViewContainer, ViewError, ViewManager};
pub use view::{FragmentId, HeadlessViewTree, ViewTree};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
