/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Page lifecycle dispatch around cache transitions.
//!
//! For every successful transition the manager sends, in order:
//! `BeforeHide` to the outgoing view, `Init` to the incoming view on its first
//! show, `BeforeShow`, `Hide` to the outgoing view, then `Show`. Views evicted
//! by the transition are announced with `Destroy`. Each event goes to the
//! controller of the fragment it concerns and to every subscriber.

use crossbeam_channel::{Receiver, Sender, unbounded};
use log::debug;

use crate::shell::ViewError;
use crate::shell::lifecycle::{ViewEvent, ViewEventKind};
use crate::shell::navigation::NavigationRequest;
use crate::shell::view_container::{EvictedView, ViewContainer, ViewTransition};
use crate::view::{FragmentId, ViewTree};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentView {
    pub url: String,
    pub fragment: FragmentId,
    pub slot: usize,
    pub page_type: Option<String>,
    pub fullscreen: bool,
}

pub struct ViewManager<T: ViewTree> {
    container: ViewContainer<T>,
    current: Option<CurrentView>,
    subscribers: Vec<Sender<ViewEvent>>,
}

impl<T: ViewTree> ViewManager<T> {
    pub fn new(container: ViewContainer<T>) -> Self {
        Self {
            container,
            current: None,
            subscribers: Vec::new(),
        }
    }

    /// Receives every lifecycle event from now on. Dropping the receiver
    /// unsubscribes.
    pub fn subscribe(&mut self) -> Receiver<ViewEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn current_view(&self) -> Option<&CurrentView> {
        self.current.as_ref()
    }

    pub fn container(&self) -> &ViewContainer<T> {
        &self.container
    }

    pub fn container_mut(&mut self) -> &mut ViewContainer<T> {
        &mut self.container
    }

    pub fn set_on_before_change<F>(&mut self, hook: F)
    where
        F: FnMut(FragmentId, bool, &NavigationRequest) + 'static,
    {
        self.container.set_on_before_change(hook);
    }

    pub async fn load_view(
        &mut self,
        request: &NavigationRequest,
    ) -> Result<ViewTransition, ViewError> {
        let transition = self.container.load_view(request).await?;
        self.complete_transition(&transition, request);
        Ok(transition)
    }

    pub async fn try_restore_view(
        &mut self,
        request: &NavigationRequest,
    ) -> Result<ViewTransition, ViewError> {
        let transition = self.container.try_restore_view(request).await?;
        self.complete_transition(&transition, request);
        Ok(transition)
    }

    pub fn reset(&mut self) {
        let evicted = self.container.reset();
        self.announce_destroyed(&evicted);
        self.current = None;
    }

    fn complete_transition(&mut self, transition: &ViewTransition, request: &NavigationRequest) {
        self.announce_destroyed(&transition.evicted);

        let outgoing = transition.previous_slot.and_then(|slot| {
            let (fragment, url) = self.container.slot_view(slot)?;
            Some((slot, fragment, url.to_string()))
        });
        let incoming = |kind| {
            ViewEvent::for_request(kind, transition.fragment, request, transition.restored)
        };

        if let Some((slot, fragment, url)) = &outgoing {
            self.dispatch(Some(*slot), ViewEvent::bare(ViewEventKind::BeforeHide, *fragment, url));
        }
        if transition.first_show {
            self.dispatch(Some(transition.slot), incoming(ViewEventKind::Init));
        }
        self.dispatch(Some(transition.slot), incoming(ViewEventKind::BeforeShow));
        if let Some((slot, fragment, url)) = &outgoing {
            self.dispatch(Some(*slot), ViewEvent::bare(ViewEventKind::Hide, *fragment, url));
        }
        self.dispatch(Some(transition.slot), incoming(ViewEventKind::Show));

        self.current = Some(CurrentView {
            url: request.url.clone(),
            fragment: transition.fragment,
            slot: transition.slot,
            page_type: request.page_type.clone(),
            fullscreen: request.fullscreen,
        });
    }

    /// Controllers of evicted views already got `Destroy` from the cache;
    /// only subscribers are told here.
    fn announce_destroyed(&mut self, evicted: &[EvictedView]) {
        for view in evicted {
            self.dispatch(
                None,
                ViewEvent::bare(ViewEventKind::Destroy, view.fragment, &view.url),
            );
        }
    }

    fn dispatch(&mut self, slot: Option<usize>, event: ViewEvent) {
        debug!(
            "view manager: {} for {} ({})",
            event.kind.as_str(),
            event.url,
            event.fragment
        );
        if let Some(slot) = slot {
            self.container.dispatch_to_slot(slot, &event);
        }
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;
    use crate::registries::{ControllerRegistry, PageController, controller_factory};
    use crate::shell::lifecycle::ViewContext;
    use crate::view::HeadlessViewTree;

    type Seen = Arc<Mutex<Vec<(String, ViewEventKind)>>>;

    struct Recorder {
        url: String,
        seen: Seen,
    }

    impl PageController for Recorder {
        fn on_view_event(&mut self, event: &ViewEvent) {
            assert_eq!(event.url, self.url, "controller got another view's event");
            self.seen.lock().push((self.url.clone(), event.kind));
        }
    }

    fn manager(seen: &Seen) -> ViewManager<HeadlessViewTree> {
        let mut registry = ControllerRegistry::new();
        let seen = Arc::clone(seen);
        registry.register(
            "pages/recorder",
            controller_factory(move |ctx: &ViewContext| {
                Box::new(Recorder {
                    url: ctx.url.clone(),
                    seen: Arc::clone(&seen),
                }) as Box<dyn PageController>
            }),
        );
        ViewManager::new(ViewContainer::new(HeadlessViewTree::new(), Arc::new(registry)))
    }

    fn page(url: &str) -> NavigationRequest {
        NavigationRequest::from_markup(url, r#"<div data-controller="pages/recorder"></div>"#)
    }

    fn kinds(rx: &Receiver<ViewEvent>) -> Vec<(String, ViewEventKind)> {
        rx.try_iter().map(|event| (event.url, event.kind)).collect()
    }

    fn entry(url: &str, kind: ViewEventKind) -> (String, ViewEventKind) {
        (url.to_string(), kind)
    }

    #[tokio::test]
    async fn first_load_sends_init_before_show() {
        let seen = Seen::default();
        let mut views = manager(&seen);
        let rx = views.subscribe();

        views.load_view(&page("/a")).await.expect("load");

        let expected = vec![
            entry("/a", ViewEventKind::Init),
            entry("/a", ViewEventKind::BeforeShow),
            entry("/a", ViewEventKind::Show),
        ];
        assert_eq!(kinds(&rx), expected);
        assert_eq!(*seen.lock(), expected);
        assert_eq!(views.current_view().map(|view| view.url.as_str()), Some("/a"));
    }

    #[tokio::test]
    async fn transition_orders_hide_and_show_events() {
        let seen = Seen::default();
        let mut views = manager(&seen);
        views.load_view(&page("/a")).await.expect("load a");
        let rx = views.subscribe();

        views.load_view(&page("/b")).await.expect("load b");

        assert_eq!(
            kinds(&rx),
            vec![
                entry("/a", ViewEventKind::BeforeHide),
                entry("/b", ViewEventKind::Init),
                entry("/b", ViewEventKind::BeforeShow),
                entry("/a", ViewEventKind::Hide),
                entry("/b", ViewEventKind::Show),
            ]
        );
    }

    #[tokio::test]
    async fn restore_skips_init_and_flags_restored() {
        let seen = Seen::default();
        let mut views = manager(&seen);
        views.load_view(&page("/a")).await.expect("load a");
        views.load_view(&page("/b")).await.expect("load b");
        let rx = views.subscribe();

        let transition = views
            .try_restore_view(&page("/a").with_back(true))
            .await
            .expect("restore a");

        let events: Vec<ViewEvent> = rx.try_iter().collect();
        assert!(transition.restored);
        assert!(events.iter().all(|event| event.kind != ViewEventKind::Init));
        let show = events
            .iter()
            .find(|event| event.kind == ViewEventKind::Show)
            .expect("show dispatched");
        assert!(show.detail.is_restored);
        assert_eq!(show.fragment, transition.fragment);
        assert_eq!(views.current_view().map(|view| view.slot), Some(0));
    }

    #[tokio::test]
    async fn eviction_and_reset_announce_destroy() {
        let seen = Seen::default();
        let mut views = manager(&seen);
        for url in ["/a", "/b", "/c"] {
            views.load_view(&page(url)).await.expect("load");
        }
        let rx = views.subscribe();

        views.load_view(&page("/d")).await.expect("load d");
        assert_eq!(kinds(&rx).first(), Some(&entry("/a", ViewEventKind::Destroy)));

        views.reset();
        let destroyed: Vec<String> = rx
            .try_iter()
            .filter(|event| event.kind == ViewEventKind::Destroy)
            .map(|event| event.url)
            .collect();
        assert_eq!(destroyed, vec!["/d", "/b", "/c"]);
        assert!(views.current_view().is_none());
    }

    #[tokio::test]
    async fn failed_load_dispatches_nothing() {
        let seen = Seen::default();
        let mut views = manager(&seen);
        let rx = views.subscribe();
        let request = page("/a");
        request.cancel();

        assert_eq!(views.load_view(&request).await, Err(ViewError::Cancelled));
        assert!(rx.try_recv().is_err());
        assert!(seen.lock().is_empty());
    }

    #[tokio::test]
    async fn dropped_subscribers_are_pruned() {
        let seen = Seen::default();
        let mut views = manager(&seen);
        let kept = views.subscribe();
        drop(views.subscribe());

        views.load_view(&page("/a")).await.expect("load");

        assert_eq!(views.subscriber_count(), 1);
        assert_eq!(kept.try_iter().count(), 3);
    }
}
