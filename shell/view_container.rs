/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! View transition cache.
//!
//! A fixed ring of [`PAGE_CONTAINER_COUNT`] page slots keyed by URL. Fresh
//! navigations overwrite the slot after the cursor (round-robin, not LRU);
//! back navigations can bring a cached slot forward without remounting it.
//!
//! Slot lifecycle: Empty -> Mounted -> Hidden -> (reused: Mounted again, old
//! fragment destroyed) -> ... -> Empty again on [`ViewContainer::reset`].
//!
//! Every operation checks the request's cancellation token before it starts
//! and again after each await point. Slot and cursor state are only mutated
//! after the last check, in one synchronous step, so a request cancelled
//! while its controller was resolving leaves the ring untouched.

use std::sync::Arc;

use log::{debug, warn};

use crate::diagnostics::{
    CHANNEL_VIEW_CACHE_HIT, CHANNEL_VIEW_CACHE_MISS, CHANNEL_VIEW_CONTAINER_MISSING,
    CHANNEL_VIEW_DUPLICATE_EVICTED, CHANNEL_VIEW_LOAD_CANCELLED, CHANNEL_VIEW_LOAD_STARTED,
    CHANNEL_VIEW_LOAD_SUCCEEDED, CHANNEL_VIEW_RESET, CHANNEL_VIEW_SLOT_EVICTED, emit_message,
};
use crate::registries::{ControllerFactory, ControllerResolver, PageController};
use crate::shell::ViewError;
use crate::shell::lifecycle::{ViewEvent, ViewEventKind};
use crate::shell::navigation::NavigationRequest;
use crate::view::{FragmentId, ViewTree};

/// Number of page slots kept alive.
pub const PAGE_CONTAINER_COUNT: usize = 3;

/// Called with `(fragment, restored, request)` after the fragment is in place
/// and before visibility changes.
pub type BeforeChangeHook = Box<dyn FnMut(FragmentId, bool, &NavigationRequest)>;

#[derive(Default)]
struct PageSlot {
    fragment: Option<FragmentId>,
    url: Option<String>,
    controller_path: Option<String>,
    controller: Option<Box<dyn PageController>>,
    init_complete: bool,
}

impl PageSlot {
    fn is_empty(&self) -> bool {
        self.fragment.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Empty,
    /// Mounted and visible; only the slot under the cursor.
    Mounted,
    Hidden,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotSnapshot {
    pub index: usize,
    pub state: SlotState,
    pub url: Option<String>,
    pub fragment: Option<FragmentId>,
    pub has_controller: bool,
}

/// A view torn down to make room or to keep URLs unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvictedView {
    pub slot: usize,
    pub fragment: FragmentId,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewTransition {
    pub fragment: FragmentId,
    pub slot: usize,
    /// Slot that was visible before, if it still holds a view.
    pub previous_slot: Option<usize>,
    pub restored: bool,
    /// True the first time this fragment is shown.
    pub first_show: bool,
    pub evicted: Vec<EvictedView>,
}

pub struct ViewContainer<T: ViewTree> {
    tree: T,
    slots: [PageSlot; PAGE_CONTAINER_COUNT],
    selected: Option<usize>,
    resolver: Arc<dyn ControllerResolver>,
    on_before_change: Option<BeforeChangeHook>,
    settle_tick: bool,
}

impl<T: ViewTree> ViewContainer<T> {
    pub fn new(tree: T, resolver: Arc<dyn ControllerResolver>) -> Self {
        Self {
            tree,
            slots: std::array::from_fn(|_| PageSlot::default()),
            selected: None,
            resolver,
            on_before_change: None,
            settle_tick: true,
        }
    }

    /// Whether to yield once after controller resolution before touching the
    /// ring, giving freshly mounted content a turn to settle.
    pub fn with_settle_tick(mut self, enabled: bool) -> Self {
        self.settle_tick = enabled;
        self
    }

    pub fn set_on_before_change<F>(&mut self, hook: F)
    where
        F: FnMut(FragmentId, bool, &NavigationRequest) + 'static,
    {
        self.on_before_change = Some(Box::new(hook));
    }

    pub fn clear_on_before_change(&mut self) {
        self.on_before_change = None;
    }

    pub fn tree(&self) -> &T {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut T {
        &mut self.tree
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn current_fragment(&self) -> Option<FragmentId> {
        self.selected.and_then(|index| self.slots[index].fragment)
    }

    pub fn cached_index(&self, url: &str) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| !slot.is_empty() && slot.url.as_deref() == Some(url))
    }

    pub fn cached_urls(&self) -> Vec<String> {
        self.slots
            .iter()
            .filter(|slot| !slot.is_empty())
            .filter_map(|slot| slot.url.clone())
            .collect()
    }

    /// Fragment and url mounted in `index`, if any.
    pub fn slot_view(&self, index: usize) -> Option<(FragmentId, &str)> {
        let slot = self.slots.get(index)?;
        Some((slot.fragment?, slot.url.as_deref()?))
    }

    pub fn slot_snapshots(&self) -> Vec<SlotSnapshot> {
        self.slots
            .iter()
            .enumerate()
            .map(|(index, slot)| SlotSnapshot {
                index,
                state: if slot.is_empty() {
                    SlotState::Empty
                } else if self.selected == Some(index) {
                    SlotState::Mounted
                } else {
                    SlotState::Hidden
                },
                url: slot.url.clone(),
                fragment: slot.fragment,
                has_controller: slot.controller.is_some(),
            })
            .collect()
    }

    /// Delivers `event` to the controller living in `index`. Returns whether
    /// a controller received it.
    pub fn dispatch_to_slot(&mut self, index: usize, event: &ViewEvent) -> bool {
        match self
            .slots
            .get_mut(index)
            .and_then(|slot| slot.controller.as_mut())
        {
            Some(controller) => {
                controller.on_view_event(event);
                true
            }
            None => false,
        }
    }

    /// Mounts a fresh view for `request` in the slot after the cursor.
    pub async fn load_view(
        &mut self,
        request: &NavigationRequest,
    ) -> Result<ViewTransition, ViewError> {
        ensure_not_cancelled(request, "load")?;
        self.ensure_container(request, "load")?;
        emit_message(CHANNEL_VIEW_LOAD_STARTED, request.url.len());

        let page = request.page();
        let factory = self
            .resolve_controller(request, page.controller.as_deref())
            .await?;
        self.settle().await;
        ensure_not_cancelled(request, "load")?;
        self.ensure_container(request, "load")?;

        let previous = self.selected;
        let index = previous.map_or(0, |current| (current + 1) % PAGE_CONTAINER_COUNT);

        let mut evicted = self.evict_duplicates(&request.url, index);
        if let Some(view) = self.destroy_slot(index) {
            debug!(
                "view container: slot {index} reused, evicting {} ({})",
                view.url, view.fragment
            );
            emit_message(CHANNEL_VIEW_SLOT_EVICTED, view.url.len());
            evicted.push(view);
        }

        let fragment = self.tree.mount(index, &request.url, &page);
        let controller = factory.map(|create| create(&request.view_context(fragment)));
        self.slots[index] = PageSlot {
            fragment: Some(fragment),
            url: Some(request.url.clone()),
            controller_path: page.controller.clone(),
            controller,
            init_complete: false,
        };

        self.notify_before_change(fragment, false, request);
        self.reveal(index);
        self.selected = Some(index);
        let first_show = self.mark_shown(index);

        debug!(
            "view container: loaded {} into slot {index} as {fragment}",
            request.url
        );
        emit_message(CHANNEL_VIEW_LOAD_SUCCEEDED, request.url.len());

        Ok(ViewTransition {
            fragment,
            slot: index,
            previous_slot: self.live_previous(previous, index),
            restored: false,
            first_show,
            evicted,
        })
    }

    /// Brings the cached view for `request.url` forward without remounting.
    ///
    /// Fails with [`ViewError::NotCached`] when no slot holds the url; the
    /// caller is expected to fall back to [`Self::load_view`].
    pub async fn try_restore_view(
        &mut self,
        request: &NavigationRequest,
    ) -> Result<ViewTransition, ViewError> {
        ensure_not_cancelled(request, "restore")?;

        let cached = self
            .cached_index(&request.url)
            .and_then(|index| Some((index, self.slots[index].fragment?)));
        let Some((index, fragment)) = cached else {
            debug!("view container: no cached view for {}", request.url);
            emit_message(CHANNEL_VIEW_CACHE_MISS, request.url.len());
            return Err(ViewError::NotCached {
                url: request.url.clone(),
            });
        };
        self.ensure_container(request, "restore")?;

        let factory = if self.slots[index].controller.is_none() {
            let path = self.slots[index].controller_path.clone();
            self.resolve_controller(request, path.as_deref()).await?
        } else {
            None
        };
        self.settle().await;
        ensure_not_cancelled(request, "restore")?;
        self.ensure_container(request, "restore")?;

        if let Some(create) = factory {
            self.slots[index].controller = Some(create(&request.view_context(fragment)));
        }

        let previous = self.selected;
        self.notify_before_change(fragment, true, request);
        self.reveal(index);
        self.selected = Some(index);
        let first_show = self.mark_shown(index);

        debug!(
            "view container: restored {} from slot {index} ({fragment})",
            request.url
        );
        emit_message(CHANNEL_VIEW_CACHE_HIT, request.url.len());

        Ok(ViewTransition {
            fragment,
            slot: index,
            previous_slot: self.live_previous(previous, index),
            restored: true,
            first_show,
            evicted: Vec::new(),
        })
    }

    /// Destroys every slot, empties the container and clears the cursor.
    pub fn reset(&mut self) -> Vec<EvictedView> {
        let evicted: Vec<EvictedView> = (0..PAGE_CONTAINER_COUNT)
            .filter_map(|index| self.destroy_slot(index))
            .collect();
        self.tree.clear();
        self.selected = None;
        debug!("view container: reset, {} views released", evicted.len());
        let released: usize = evicted.iter().map(|view| view.url.len()).sum();
        emit_message(CHANNEL_VIEW_RESET, released);
        evicted
    }

    async fn resolve_controller(
        &self,
        request: &NavigationRequest,
        path: Option<&str>,
    ) -> Result<Option<ControllerFactory>, ViewError> {
        if let Some(factory) = request.controller() {
            return Ok(Some(Arc::clone(factory)));
        }
        let Some(path) = path else {
            return Ok(None);
        };
        match self.resolver.resolve(path).await {
            Ok(factory) => Ok(Some(factory)),
            Err(error) => {
                warn!(
                    "view container: controller {path} for {} failed: {error}",
                    request.url
                );
                Err(error)
            }
        }
    }

    async fn settle(&self) {
        if self.settle_tick {
            tokio::task::yield_now().await;
        }
    }

    fn ensure_container(
        &self,
        request: &NavigationRequest,
        operation: &str,
    ) -> Result<(), ViewError> {
        if self.tree.has_container() {
            return Ok(());
        }
        warn!(
            "view container: page container missing, {operation} of {} aborted",
            request.url
        );
        emit_message(CHANNEL_VIEW_CONTAINER_MISSING, request.url.len());
        Err(ViewError::MissingContainer)
    }

    /// Keeps at most one slot per url. `target` is skipped because it is
    /// about to be overwritten anyway.
    fn evict_duplicates(&mut self, url: &str, target: usize) -> Vec<EvictedView> {
        let duplicates: Vec<usize> = (0..PAGE_CONTAINER_COUNT)
            .filter(|index| *index != target)
            .filter(|index| self.slots[*index].url.as_deref() == Some(url))
            .collect();

        duplicates
            .into_iter()
            .filter_map(|index| {
                let view = self.destroy_slot(index)?;
                debug!("view container: {url} already mounted in slot {index}, destroying it");
                emit_message(CHANNEL_VIEW_DUPLICATE_EVICTED, url.len());
                Some(view)
            })
            .collect()
    }

    fn destroy_slot(&mut self, index: usize) -> Option<EvictedView> {
        let slot = std::mem::take(&mut self.slots[index]);
        let (Some(fragment), Some(url)) = (slot.fragment, slot.url) else {
            return None;
        };
        if let Some(mut controller) = slot.controller {
            controller.on_view_event(&ViewEvent::bare(ViewEventKind::Destroy, fragment, &url));
            controller.destroy();
        }
        self.tree.destroy(fragment);
        Some(EvictedView {
            slot: index,
            fragment,
            url,
        })
    }

    fn notify_before_change(
        &mut self,
        fragment: FragmentId,
        restored: bool,
        request: &NavigationRequest,
    ) {
        if let Some(hook) = self.on_before_change.as_mut() {
            hook(fragment, restored, request);
        }
    }

    fn reveal(&mut self, index: usize) {
        for (other, slot) in self.slots.iter().enumerate() {
            if other != index
                && let Some(fragment) = slot.fragment
            {
                self.tree.hide(fragment);
            }
        }
        if let Some(fragment) = self.slots[index].fragment {
            self.tree.show(fragment);
        }
    }

    fn mark_shown(&mut self, index: usize) -> bool {
        let slot = &mut self.slots[index];
        let first_show = !slot.init_complete;
        slot.init_complete = true;
        first_show
    }

    fn live_previous(&self, previous: Option<usize>, current: usize) -> Option<usize> {
        previous.filter(|index| *index != current && !self.slots[*index].is_empty())
    }
}

fn ensure_not_cancelled(request: &NavigationRequest, operation: &str) -> Result<(), ViewError> {
    if !request.is_cancelled() {
        return Ok(());
    }
    debug!("view container: {operation} of {} cancelled", request.url);
    emit_message(CHANNEL_VIEW_LOAD_CANCELLED, request.url.len());
    Err(ViewError::Cancelled)
}
