use parking_lot::ReentrantMutex;
use std::cell::RefCell;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;

use super::error::FeedError;

pub(crate) type Callback<O> = Box<dyn FnMut(Result<O, FeedError>) + Send>;

struct SlotState<O> {
    active: bool,
    callback: Option<Callback<O>>,
}

/// Holds a subscriber's callback.
///
/// Delivery and cancellation both take the lock, so once `cancel` returns no
/// callback is running or will run. The lock is reentrant so a callback may
/// cancel its own subscription.
pub(crate) struct Slot<O> {
    state: ReentrantMutex<RefCell<SlotState<O>>>,
}

impl<O> Slot<O> {
    pub(crate) fn new(callback: Callback<O>) -> Arc<Self> {
        Arc::new(Self {
            state: ReentrantMutex::new(RefCell::new(SlotState {
                active: true,
                callback: Some(callback),
            })),
        })
    }

    /// Runs the callback unless cancelled. Returns whether the slot is still active.
    pub(crate) fn deliver(&self, payload: Result<O, FeedError>) -> bool {
        let guard = self.state.lock();
        let taken = {
            let mut state = guard.borrow_mut();
            if !state.active {
                return false;
            }
            state.callback.take()
        };
        let Some(mut callback) = taken else {
            // Reentrant delivery from inside the callback
            return true;
        };

        callback(payload);

        let mut state = guard.borrow_mut();
        if state.active {
            state.callback = Some(callback);
        }
        state.active
    }
}

impl<O: Send> Slot<O> {
    /// Deactivates the slot, then hands the callback its terminal error.
    /// The subscription already reports inactive while the error is handled.
    pub(crate) fn fail(&self, error: FeedError) {
        let guard = self.state.lock();
        let taken = {
            let mut state = guard.borrow_mut();
            if !state.active {
                return;
            }
            state.active = false;
            state.callback.take()
        };
        if let Some(mut callback) = taken {
            callback(Err(error));
        }
    }
}

/// Type-erased view of a slot, so handles do not carry the payload type.
pub(crate) trait Cancel: Send + Sync {
    fn cancel(&self);
    fn is_active(&self) -> bool;
}

impl<O: Send> Cancel for Slot<O> {
    fn cancel(&self) {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        state.active = false;
        state.callback = None;
    }

    fn is_active(&self) -> bool {
        self.state.lock().borrow().active
    }
}

/// Handle to a live feed subscription.
///
/// Cancelling is synchronous: after [`Subscription::cancel`] returns, the
/// callback is never invoked again. Dropping the handle cancels it, so a
/// subscription cannot outlive the scope that owns it.
pub struct Subscription {
    slot: Arc<dyn Cancel>,
    pump: Option<JoinHandle<()>>,
}

impl Subscription {
    pub(crate) fn new(slot: Arc<dyn Cancel>, pump: JoinHandle<()>) -> Self {
        Self { slot, pump: Some(pump) }
    }

    /// Stops delivery and releases the pump task. Safe to call repeatedly.
    pub fn cancel(&mut self) {
        self.slot.cancel();
        if let Some(pump) = self.pump.take() {
            pump.abort();
            debug!("Subscription cancelled");
        }
    }

    /// False once cancelled, or once the feed has reported an error.
    pub fn is_active(&self) -> bool {
        self.slot.is_active()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_cancelled_slot_never_delivers() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let slot = Slot::new(Box::new(move |_: Result<u32, FeedError>| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        assert!(slot.deliver(Ok(1)));
        slot.cancel();
        slot.cancel();
        assert!(!slot.deliver(Ok(2)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!slot.is_active());
    }

    #[test]
    fn test_callback_may_cancel_itself() {
        let holder: Arc<parking_lot::Mutex<Option<Arc<Slot<u32>>>>> = Arc::new(parking_lot::Mutex::new(None));
        let inner = holder.clone();
        let slot = Slot::new(Box::new(move |value: Result<u32, FeedError>| {
            if value == Ok(2) {
                if let Some(me) = inner.lock().as_ref() {
                    me.cancel();
                }
            }
        }));
        *holder.lock() = Some(slot.clone());

        assert!(slot.deliver(Ok(1)));
        assert!(!slot.deliver(Ok(2)));
        assert!(!slot.deliver(Ok(3)));
        holder.lock().take();
    }

    #[test]
    fn test_failed_slot_is_inactive_when_error_arrives() {
        let holder: Arc<parking_lot::Mutex<Option<Arc<Slot<u32>>>>> = Arc::new(parking_lot::Mutex::new(None));
        let inner = holder.clone();
        let observed = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = observed.clone();
        let slot = Slot::new(Box::new(move |value: Result<u32, FeedError>| {
            let active = inner.lock().as_ref().map(|me| me.is_active());
            sink.lock().push((value.is_ok(), active));
        }));
        *holder.lock() = Some(slot.clone());

        assert!(slot.deliver(Ok(1)));
        slot.fail(FeedError::TransportFailure("gone".into()));
        slot.fail(FeedError::TransportFailure("again".into()));
        assert!(!slot.deliver(Ok(2)));

        assert_eq!(*observed.lock(), vec![(true, Some(true)), (false, Some(false))]);
        holder.lock().take();
    }
}
