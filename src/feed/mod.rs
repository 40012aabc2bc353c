//! Order change feed: live, full-snapshot views pushed to subscribers.
//!
//! A subscription takes a snapshot and a change receiver from the store in
//! one actor turn, renders the snapshot once, then a pump task applies
//! changes in commit order and re-renders. Every delivery is a complete view,
//! never a diff, and identical consecutive views are delivered once.

mod error;
mod orders;
mod subscription;

pub use error::*;
pub use orders::*;
pub use subscription::Subscription;

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::{debug, instrument, warn, Instrument};

use crate::actor_framework::{Change, Entity, Filter, FrameworkError, ResourceClient, Snapshot};
use subscription::Slot;

impl<E> From<FrameworkError<E>> for FeedError
where
    E: std::fmt::Display,
{
    fn from(e: FrameworkError<E>) -> Self {
        FeedError::TransportFailure(e.to_string())
    }
}

/// Subscriber-side copy of the matching records.
struct View<T: Entity> {
    filter: Filter<T>,
    revision: u64,
    items: HashMap<T::Id, T>,
}

impl<T: Entity> View<T> {
    fn new(filter: Filter<T>, revision: u64, items: Vec<T>) -> Self {
        let items = items.into_iter().map(|item| (item.id().clone(), item)).collect();
        Self {
            filter,
            revision,
            items,
        }
    }

    /// Applies one change. Returns true if the matching set changed.
    fn apply(&mut self, change: Change<T>) -> bool {
        if change.revision <= self.revision {
            return false;
        }
        self.revision = change.revision;
        if !self.filter.matches_change(&change) {
            return false;
        }
        match change.item {
            Some(item) if self.filter.matches(&item) => {
                self.items.insert(change.id, item);
            }
            _ => {
                self.items.remove(&change.id);
            }
        }
        true
    }

    fn reset(&mut self, snapshot_revision: u64, items: Vec<T>) {
        self.revision = snapshot_revision;
        self.items = items.into_iter().map(|item| (item.id().clone(), item)).collect();
    }
}

/// Generic live view over a resource actor.
pub struct ChangeFeed<T: Entity> {
    source: ResourceClient<T>,
}

impl<T: Entity> Clone for ChangeFeed<T> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
        }
    }
}

impl<T: Entity> ChangeFeed<T> {
    pub fn new(source: ResourceClient<T>) -> Self {
        Self { source }
    }

    /// Subscribes to the records matching `filter`.
    ///
    /// `render` turns the current matching set into the delivered value.
    /// `callback` receives the initial view before this returns, then every
    /// changed view, or a single `Err` if the store goes away.
    #[instrument(name = "feed_watch", skip_all, fields(kind = T::KIND))]
    pub async fn watch<O, R, C>(&self, filter: Filter<T>, render: R, callback: C) -> Result<Subscription, FeedError>
    where
        O: PartialEq + Clone + Send + 'static,
        R: Fn(&HashMap<T::Id, T>) -> O + Send + 'static,
        C: FnMut(Result<O, FeedError>) + Send + 'static,
    {
        let Snapshot {
            revision,
            items,
            changes,
        } = self.source.subscribe(filter.clone()).await?;

        let view = View::new(filter, revision, items);
        let initial = render(&view.items);
        let slot = Slot::new(Box::new(callback));
        slot.deliver(Ok(initial.clone()));
        debug!(revision, "Initial view delivered");

        let pump = Pump {
            source: self.source.clone(),
            view,
            changes,
            render,
            slot: slot.clone(),
            last: initial,
        };
        let handle = tokio::spawn(pump.run().in_current_span());
        Ok(Subscription::new(slot, handle))
    }
}

struct Pump<T: Entity, O, R> {
    source: ResourceClient<T>,
    view: View<T>,
    changes: broadcast::Receiver<Change<T>>,
    render: R,
    slot: Arc<Slot<O>>,
    last: O,
}

enum Batch {
    Applied { dirty: bool },
    Lagged(u64),
    Closed,
}

impl<T, O, R> Pump<T, O, R>
where
    T: Entity,
    O: PartialEq + Clone + Send + 'static,
    R: Fn(&HashMap<T::Id, T>) -> O + Send + 'static,
{
    async fn run(mut self) {
        loop {
            match self.next_batch().await {
                Batch::Applied { dirty } => {
                    if dirty && !self.publish() {
                        break;
                    }
                }
                Batch::Lagged(skipped) => {
                    warn!(skipped, "Feed lagged, resyncing from snapshot");
                    if let Err(e) = self.resync().await {
                        self.slot.fail(e);
                        break;
                    }
                    if !self.publish() {
                        break;
                    }
                }
                Batch::Closed => {
                    warn!("Store closed, ending feed");
                    self.slot
                        .fail(FeedError::TransportFailure("Change stream closed".to_string()));
                    break;
                }
            }
        }
        debug!(revision = self.view.revision, "Feed pump stopped");
    }

    /// Waits for one change, then drains whatever else is already queued so a
    /// burst is rendered once.
    async fn next_batch(&mut self) -> Batch {
        let first = match self.changes.recv().await {
            Ok(change) => change,
            Err(RecvError::Lagged(skipped)) => return Batch::Lagged(skipped),
            Err(RecvError::Closed) => return Batch::Closed,
        };
        let mut dirty = self.view.apply(first);
        loop {
            match self.changes.try_recv() {
                Ok(change) => dirty |= self.view.apply(change),
                Err(TryRecvError::Empty) => return Batch::Applied { dirty },
                Err(TryRecvError::Lagged(skipped)) => return Batch::Lagged(skipped),
                // Deliver what was applied; the next recv reports the close
                Err(TryRecvError::Closed) => return Batch::Applied { dirty },
            }
        }
    }

    async fn resync(&mut self) -> Result<(), FeedError> {
        let snapshot = self.source.subscribe(self.view.filter.clone()).await?;
        self.view.reset(snapshot.revision, snapshot.items);
        self.changes = snapshot.changes;
        Ok(())
    }

    /// Renders and delivers unless identical to the previous delivery.
    /// Returns false once the subscriber has cancelled.
    fn publish(&mut self) -> bool {
        let next = (self.render)(&self.view.items);
        if next == self.last {
            return true;
        }
        self.last = next.clone();
        self.slot.deliver(Ok(next))
    }
}
