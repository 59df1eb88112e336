/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Named diagnostic channels for the page shell.
//!
//! Producers call [`emit_event`]; nothing is recorded until a host installs a
//! sender with [`install_global_sender`]. Under `cfg(test)` a thread-local
//! sender takes precedence so parallel tests do not observe each other.

use std::sync::OnceLock;

use crossbeam_channel::{Receiver, Sender, unbounded};

// `byte_len` is the length of the url a message concerns. A reset reports the
// summed length of the released urls; a superseded request carries no url and
// reports 0.
pub const CHANNEL_VIEW_CONTAINER_MISSING: &str = "view.container.missing";
pub const CHANNEL_VIEW_LOAD_STARTED: &str = "view.load.started";
pub const CHANNEL_VIEW_LOAD_SUCCEEDED: &str = "view.load.succeeded";
pub const CHANNEL_VIEW_LOAD_CANCELLED: &str = "view.load.cancelled";
pub const CHANNEL_VIEW_CACHE_HIT: &str = "view.cache.hit";
pub const CHANNEL_VIEW_CACHE_MISS: &str = "view.cache.miss";
pub const CHANNEL_VIEW_SLOT_EVICTED: &str = "view.slot.evicted";
pub const CHANNEL_VIEW_DUPLICATE_EVICTED: &str = "view.slot.duplicate_evicted";
pub const CHANNEL_VIEW_RESET: &str = "view.reset";
pub const CHANNEL_CONTROLLER_RESOLVE_FAILED: &str = "registry.controller.resolve_failed";
pub const CHANNEL_ROUTE_NOT_FOUND: &str = "router.route.not_found";
pub const CHANNEL_ROUTE_SUPERSEDED: &str = "router.request.superseded";

static GLOBAL_DIAGNOSTICS_TX: OnceLock<Sender<DiagnosticEvent>> = OnceLock::new();

#[cfg(test)]
thread_local! {
    static TEST_DIAGNOSTICS_TX: std::cell::RefCell<Option<Sender<DiagnosticEvent>>> =
        const { std::cell::RefCell::new(None) };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticEvent {
    MessageSent {
        channel_id: &'static str,
        byte_len: usize,
    },
}

impl DiagnosticEvent {
    pub fn channel_id(&self) -> &'static str {
        match self {
            Self::MessageSent { channel_id, .. } => channel_id,
        }
    }
}

/// Installs the process-wide sender. Later calls are ignored.
pub fn install_global_sender(sender: Sender<DiagnosticEvent>) {
    let _ = GLOBAL_DIAGNOSTICS_TX.set(sender);
}

/// Creates a channel and installs its sender, returning the receiving end.
pub fn install_global_channel() -> Receiver<DiagnosticEvent> {
    let (tx, rx) = unbounded();
    install_global_sender(tx);
    rx
}

pub fn emit_event(event: DiagnosticEvent) {
    #[cfg(test)]
    {
        let mut event = Some(event);
        let mut handled = false;
        TEST_DIAGNOSTICS_TX.with(|slot| {
            if let Some(tx) = slot.borrow().as_ref() {
                if let Some(payload) = event.take() {
                    let _ = tx.send(payload);
                }
                handled = true;
            }
        });
        if handled {
            return;
        }
        if let (Some(tx), Some(payload)) = (GLOBAL_DIAGNOSTICS_TX.get(), event.take()) {
            let _ = tx.send(payload);
        }
    }

    #[cfg(not(test))]
    {
        if let Some(tx) = GLOBAL_DIAGNOSTICS_TX.get() {
            let _ = tx.send(event);
        }
    }
}

pub(crate) fn emit_message(channel_id: &'static str, byte_len: usize) {
    emit_event(DiagnosticEvent::MessageSent {
        channel_id,
        byte_len,
    });
}

#[cfg(test)]
pub(crate) fn install_test_channel() -> Receiver<DiagnosticEvent> {
    let (tx, rx) = unbounded();
    TEST_DIAGNOSTICS_TX.with(|slot| {
        *slot.borrow_mut() = Some(tx);
    });
    rx
}

#[cfg(test)]
pub(crate) fn drained_channels(rx: &Receiver<DiagnosticEvent>) -> Vec<&'static str> {
    rx.try_iter().map(|event| event.channel_id()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_receives_emitted_messages() {
        let rx = install_test_channel();
        emit_message(CHANNEL_VIEW_CACHE_HIT, 4);
        emit_message(CHANNEL_VIEW_CACHE_MISS, 0);

        assert_eq!(
            drained_channels(&rx),
            vec![CHANNEL_VIEW_CACHE_HIT, CHANNEL_VIEW_CACHE_MISS]
        );
    }
}
