//! Display event reactor
//!
//! Waits for display events and offers each to the windows. An event no
//! window claims is dropped from the connection queue, otherwise it would
//! block every event behind it.

use pentimento_utils::Result;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::state::SharedState;

/// Process display events until cancelled or the connection is lost
pub async fn run(shared: SharedState, cancel: CancellationToken) -> Result<()> {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            ready = shared.display.wait_for_event() => ready?,
        }

        let claimed = {
            let mut state = shared.state.lock();
            let state = &mut *state;
            state.registry.process_event(&state.view)
        };

        if !claimed {
            if let Some(event) = shared.display.discard_event() {
                trace!(window = event.window, "Unclaimed event");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tmux::NoMultiplexer;
    use crate::windows::{Display, DisplayEvent, EventKind, HeadlessDisplay, ParentInfo};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn setup() -> (HeadlessDisplay, SharedState) {
        let display = HeadlessDisplay::new(800, 480);
        let (tx, _rx) = mpsc::channel(4);
        let shared = SharedState::new(Arc::new(display.clone()), Arc::new(NoMultiplexer), tx);
        (display, shared)
    }

    async fn settle(display: &HeadlessDisplay) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while display.pending_events() > 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_unclaimed_event_discarded_once() {
        let (display, shared) = setup();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run(shared, cancel.clone()));

        display.push_event(DisplayEvent {
            window: 4242,
            kind: EventKind::Expose,
        });
        settle(&display).await;

        cancel.cancel();
        task.await.unwrap().unwrap();

        let log = display.log();
        assert_eq!(log.discarded.len(), 1);
        assert_eq!(log.discarded[0].window, 4242);
        assert_eq!(log.repaints, 0);
    }

    #[tokio::test]
    async fn test_claimed_event_is_not_discarded() {
        let (display, shared) = setup();
        let parent = ParentInfo {
            id: 1,
            pid: 1,
            pty: None,
            width: 800,
            height: 480,
        };
        let windows = display.create_windows(&[parent]).unwrap();
        let window_id = windows[0].id();
        shared.state.lock().registry.extend(windows);

        let cancel = CancellationToken::new();
        let task = tokio::spawn(run(shared, cancel.clone()));

        display.push_event(DisplayEvent {
            window: window_id,
            kind: EventKind::Expose,
        });
        settle(&display).await;

        cancel.cancel();
        task.await.unwrap().unwrap();

        let log = display.log();
        assert!(log.discarded.is_empty());
        assert_eq!(log.repaints, 1);
    }

    #[tokio::test]
    async fn test_connection_loss_is_fatal() {
        let (display, shared) = setup();
        let task = tokio::spawn(run(shared, CancellationToken::new()));

        display.close();
        let err = task.await.unwrap().unwrap_err();
        assert!(err.is_fatal());
    }
}
