//! # Status Machine
//!
//! Holds the single transient notice. Every `notify` replaces the current
//! notice and arms a dismissal timer bound to that notice's id, so a timer
//! left over from a superseded notice can never clear a newer one.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

use crate::config::VaultConfig;
use crate::domain::{NoticePhase, StatusNotice};

/// Identity of one `notify` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NoticeId(u64);

#[derive(Debug)]
struct ActiveNotice {
    id: NoticeId,
    phase: NoticePhase,
    message: String,
}

#[derive(Debug, Default)]
struct NoticeSlot {
    current: Option<ActiveNotice>,
    next_id: u64,
}

/// Latest-wins notice holder with per-notice dismissal timers.
#[derive(Debug)]
pub struct StatusMachine {
    slot: Arc<Mutex<NoticeSlot>>,
    config: VaultConfig,
}

impl StatusMachine {
    /// Create a machine with no notice showing.
    pub fn new(config: VaultConfig) -> Self {
        Self {
            slot: Arc::new(Mutex::new(NoticeSlot::default())),
            config,
        }
    }

    /// Replace the current notice and arm its dismissal timer.
    ///
    /// Outside a tokio runtime no timer is armed and the notice stays until
    /// replaced or dismissed.
    pub fn notify(&self, phase: NoticePhase, message: impl Into<String>) -> NoticeId {
        let message = message.into();
        let id = {
            let mut slot = self.slot.lock();
            slot.next_id += 1;
            let id = NoticeId(slot.next_id);
            slot.current = Some(ActiveNotice {
                id,
                phase,
                message: message.clone(),
            });
            id
        };

        tracing::debug!(phase = ?phase, message = %message, "[veil] Notice shown");
        self.arm_timer(id, self.config.dismiss_after(phase));
        id
    }

    /// Clear the notice `id` if it is still the current one.
    pub fn dismiss(&self, id: NoticeId) -> bool {
        clear_if_current(&self.slot, id)
    }

    /// Currently visible notice, or the hidden state.
    pub fn current(&self) -> StatusNotice {
        match &self.slot.lock().current {
            Some(active) => StatusNotice {
                visible: true,
                phase: active.phase,
                message: active.message.clone(),
            },
            None => StatusNotice::hidden(),
        }
    }

    fn arm_timer(&self, id: NoticeId, delay: Duration) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let slot = Arc::clone(&self.slot);
        handle.spawn(async move {
            tokio::time::sleep(delay).await;
            clear_if_current(&slot, id);
        });
    }
}

fn clear_if_current(slot: &Mutex<NoticeSlot>, id: NoticeId) -> bool {
    let mut slot = slot.lock();
    match &slot.current {
        Some(active) if active.id == id => {
            slot.current = None;
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> StatusMachine {
        StatusMachine::new(VaultConfig::default())
    }

    #[test]
    fn test_initially_hidden() {
        assert_eq!(machine().current(), StatusNotice::hidden());
    }

    #[test]
    fn test_latest_notice_wins() {
        let status = machine();
        status.notify(NoticePhase::Pending, "X");
        status.notify(NoticePhase::Error, "Y");

        let notice = status.current();
        assert!(notice.visible);
        assert_eq!(notice.phase, NoticePhase::Error);
        assert_eq!(notice.message, "Y");
    }

    #[test]
    fn test_dismiss_stale_id_is_noop() {
        let status = machine();
        let first = status.notify(NoticePhase::Success, "first");
        let second = status.notify(NoticePhase::Success, "second");

        assert!(!status.dismiss(first));
        assert_eq!(status.current().message, "second");
        assert!(status.dismiss(second));
        assert!(!status.current().visible);
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_timer_does_not_clear_newer_notice() {
        let status = machine();
        status.notify(NoticePhase::Pending, "X");
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        status.notify(NoticePhase::Error, "Y");

        // X's timer fires at 2000ms.
        tokio::time::sleep(Duration::from_millis(1_000)).await;
        assert_eq!(status.current().message, "Y");

        // Y's timer fires at 1500 + 3000ms.
        tokio::time::sleep(Duration::from_millis(2_100)).await;
        assert!(!status.current().visible);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_dismissed_after_two_seconds() {
        let status = machine();
        status.notify(NoticePhase::Success, "done");

        tokio::time::sleep(Duration::from_millis(1_999)).await;
        assert!(status.current().visible);
        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(!status.current().visible);
    }
}
