//! Typed logout broadcast.
//!
//! A [`LogoutSignal`] is shared by the HTTP client of a surface and every
//! [`AuthSession`](crate::AuthSession) built over it. Raising it delivers a
//! [`LogoutNotice`] synchronously to each listener, in subscription order.

use crate::{Surface, TokenRejection};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Handle returned by [`LogoutSignal::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Why a session was invalidated from outside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogoutReason {
    /// The backend answered 401.
    Unauthorized { status: u16 },
    /// The stored token failed the claim check before a request.
    RejectedToken(TokenRejection),
    /// A 401 could not be recovered with the refresh token.
    RefreshFailed,
}

impl fmt::Display for LogoutReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogoutReason::Unauthorized { status } => write!(f, "unauthorized ({status})"),
            LogoutReason::RejectedToken(rejection) => write!(f, "{rejection}"),
            LogoutReason::RefreshFailed => f.write_str("token refresh failed"),
        }
    }
}

/// A single logout broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoutNotice {
    pub surface: Surface,
    pub reason: LogoutReason,
}

impl LogoutNotice {
    pub fn new(surface: Surface, reason: LogoutReason) -> Self {
        Self { surface, reason }
    }
}

type Listener = Arc<dyn Fn(&LogoutNotice) + Send + Sync>;

struct Inner {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
}

/// Observer list for logout notices. Cloning shares the list.
#[derive(Clone)]
pub struct LogoutSignal {
    inner: Arc<Inner>,
}

impl LogoutSignal {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                next_id: AtomicU64::new(1),
                listeners: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Register a listener. It stays registered until [`unsubscribe`](Self::unsubscribe).
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&LogoutNotice) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.inner.listeners.lock().push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.inner.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.lock().len()
    }

    /// Deliver `notice` to every listener registered at the time of the call.
    ///
    /// The listener list is not locked while callbacks run, so a listener may
    /// subscribe or unsubscribe. Returns the number of listeners notified.
    pub fn raise(&self, notice: LogoutNotice) -> usize {
        let snapshot: Vec<Listener> = self
            .inner
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        debug!(
            event = notice.surface.logout_event(),
            reason = %notice.reason,
            listeners = snapshot.len(),
            "Raising logout signal"
        );

        for listener in &snapshot {
            listener(&notice);
        }
        snapshot.len()
    }
}

impl Default for LogoutSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LogoutSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogoutSignal")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notice() -> LogoutNotice {
        LogoutNotice::new(Surface::Admin, LogoutReason::Unauthorized { status: 401 })
    }

    #[test]
    fn test_delivery_in_subscription_order() {
        let signal = LogoutSignal::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for n in 0..3 {
            let seen = Arc::clone(&seen);
            signal.subscribe(move |_| seen.lock().push(n));
        }

        assert_eq!(signal.raise(notice()), 3);
        assert_eq!(*seen.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn test_unsubscribed_listener_is_silent() {
        let signal = LogoutSignal::new();
        let hits = Arc::new(AtomicU64::new(0));

        let counter = Arc::clone(&hits);
        let id = signal.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(signal.unsubscribe(id));
        assert!(!signal.unsubscribe(id));
        assert_eq!(signal.raise(notice()), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_listener_can_unsubscribe_itself() {
        let signal = LogoutSignal::new();
        let hits = Arc::new(AtomicU64::new(0));
        let own_id = Arc::new(Mutex::new(None));

        let (sig, counter, slot) = (signal.clone(), Arc::clone(&hits), Arc::clone(&own_id));
        let id = signal.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            if let Some(id) = *slot.lock() {
                sig.unsubscribe(id);
            }
        });
        *own_id.lock() = Some(id);

        signal.raise(notice());
        signal.raise(notice());

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(signal.listener_count(), 0);
    }

    #[test]
    fn test_clones_share_listeners() {
        let signal = LogoutSignal::new();
        let other = signal.clone();
        other.subscribe(|_| {});
        assert_eq!(signal.listener_count(), 1);
    }

    #[test]
    fn test_notice_carries_reason() {
        let signal = LogoutSignal::new();
        let received = Arc::new(Mutex::new(None));

        let slot = Arc::clone(&received);
        signal.subscribe(move |n| *slot.lock() = Some(n.clone()));
        signal.raise(LogoutNotice::new(
            Surface::User,
            LogoutReason::RejectedToken(TokenRejection::Malformed("x".into())),
        ));

        let got = received.lock().clone().unwrap();
        assert_eq!(got.surface, Surface::User);
        assert!(matches!(got.reason, LogoutReason::RejectedToken(_)));
    }
}
