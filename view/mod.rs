/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! View-tree seam between the page cache and whatever renders pages.
//!
//! The cache never touches rendering directly. It drives a [`ViewTree`]
//! through five operations (`mount`, `show`, `hide`, `destroy`, `clear`) and
//! only keeps the [`FragmentId`]s the tree hands back.

pub mod headless;
pub mod markup;

pub use headless::{HeadlessFragment, HeadlessViewTree};
pub use markup::PageMarkup;

/// Opaque identity of a mounted page fragment.
///
/// Issued by the [`ViewTree`] on mount and stable until the fragment is
/// destroyed. Restoring a cached page hands back the same id.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct FragmentId(u64);

impl FragmentId {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for FragmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "fragment:{}", self.0)
    }
}

/// Rendering backend driven by the view cache.
///
/// Implementations own the page container. `has_container` reporting `false`
/// means the container is not rendered yet; the cache aborts without touching
/// any other method in that case.
pub trait ViewTree {
    fn has_container(&self) -> bool;

    /// Builds a fragment for `page` in container position `slot` and returns
    /// its identity. The fragment starts hidden.
    fn mount(&mut self, slot: usize, url: &str, page: &PageMarkup) -> FragmentId;

    fn show(&mut self, fragment: FragmentId);

    fn hide(&mut self, fragment: FragmentId);

    /// Detaches the fragment and releases it. Unknown ids are ignored.
    fn destroy(&mut self, fragment: FragmentId);

    /// Empties the container.
    fn clear(&mut self);
}
