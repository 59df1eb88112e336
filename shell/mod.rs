/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

pub mod content;
pub mod error;
pub mod lifecycle;
pub mod navigation;
pub mod router;
pub mod view_container;
pub mod view_manager;

pub use content::{ContentSource, DirectoryContentSource, StaticContentSource};
pub use error::ViewError;
pub use lifecycle::{ViewContext, ViewEvent, ViewEventDetail, ViewEventKind};
pub use navigation::{NavigationRequest, RequestOptions, ViewSource};
pub use router::{RouteDefinition, RouteInfo, Router, START_PAGES};
pub use view_container::{
    BeforeChangeHook, EvictedView, PAGE_CONTAINER_COUNT, SlotSnapshot, SlotState, ViewContainer,
    ViewTransition,
};
pub use view_manager::{CurrentView, ViewManager};
