/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

pub mod controller;

pub use controller::{
    ControllerFactory, ControllerRegistry, ControllerResolver, NativeControllerRegistration,
    PLUGIN_PREFIX, PageController, controller_factory, discover_native_controllers,
};
