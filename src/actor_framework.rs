use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::hash::Hash;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, instrument, warn};

use crate::clock::SharedClock;

// =============================================================================
// 1. THE ABSTRACTION (Traits with Hooks, Params, and Actions)
// =============================================================================

/// Trait that any record kept by a [`ResourceActor`] must implement.
///
/// Every hook receives the actor's commit time, so timestamps are always
/// assigned by the store and never by the caller.
pub trait Entity: Clone + Debug + Send + Sync + 'static {
    type Id: Eq + Hash + Clone + Send + Sync + Display + Debug;
    /// Partition key used for scoped listing and subscriptions.
    type Scope: Eq + Hash + Clone + Send + Sync + Display + Debug;
    type CreateParams: Send + Sync + Debug;
    type Patch: Send + Sync + Debug;
    type Action: Send + Sync + Debug;
    type ActionResult: Send + Sync + Debug;
    type Error: std::error::Error + Clone + Send + Sync + 'static;

    /// Short name used in logs.
    const KIND: &'static str;

    fn id(&self) -> &Self::Id;

    fn scope(&self) -> &Self::Scope;

    /// Construct the full record from its assigned ID and creation params.
    fn from_create_params(
        id: Self::Id,
        params: Self::CreateParams,
        now: DateTime<Utc>,
    ) -> Result<Self, Self::Error>;

    // --- Lifecycle Hooks ---

    fn on_update(&mut self, patch: Self::Patch, now: DateTime<Utc>) -> Result<(), Self::Error>;

    fn on_delete(&self) -> Result<(), Self::Error> {
        Ok(())
    }

    // --- Action Handler ---

    fn handle_action(
        &mut self,
        action: Self::Action,
        now: DateTime<Utc>,
    ) -> Result<Self::ActionResult, Self::Error>;
}

/// Errors raised by the actor plumbing, wrapping the entity's own error type.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FrameworkError<E> {
    #[error("Actor closed")]
    ActorClosed,
    #[error("Actor dropped")]
    ActorDropped,
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Item already exists: {0}")]
    AlreadyExists(String),
    #[error("{0}")]
    Domain(E),
}

pub type FrameworkResult<T, V> = Result<V, FrameworkError<<T as Entity>::Error>>;

// =============================================================================
// 2. CHANGES, FILTERS AND SNAPSHOTS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

/// One committed mutation. `revision` increases by one per commit, so it is
/// the store's commit order.
#[derive(Debug, Clone)]
pub struct Change<T: Entity> {
    pub revision: u64,
    pub kind: ChangeKind,
    pub id: T::Id,
    pub scope: T::Scope,
    /// State after the change; `None` for deletions.
    pub item: Option<T>,
}

#[derive(Debug, Clone)]
pub enum Filter<T: Entity> {
    All,
    Scope(T::Scope),
    Item(T::Id),
}

impl<T: Entity> Filter<T> {
    pub fn matches(&self, item: &T) -> bool {
        match self {
            Filter::All => true,
            Filter::Scope(scope) => item.scope() == scope,
            Filter::Item(id) => item.id() == id,
        }
    }

    pub fn matches_change(&self, change: &Change<T>) -> bool {
        match self {
            Filter::All => true,
            Filter::Scope(scope) => &change.scope == scope,
            Filter::Item(id) => &change.id == id,
        }
    }
}

/// Matching records at `revision`, plus a receiver that yields every change
/// committed after it. Both are taken in the same actor turn, so there is no
/// gap and no overlap between the two.
pub struct Snapshot<T: Entity> {
    pub revision: u64,
    pub items: Vec<T>,
    pub changes: broadcast::Receiver<Change<T>>,
}

// =============================================================================
// 3. THE GENERIC MESSAGES
// =============================================================================

pub type Response<T, V> = oneshot::Sender<FrameworkResult<T, V>>;

pub enum ResourceRequest<T: Entity> {
    Create {
        params: T::CreateParams,
        respond_to: Response<T, T>,
    },
    Get {
        id: T::Id,
        respond_to: Response<T, Option<T>>,
    },
    List {
        filter: Filter<T>,
        respond_to: Response<T, Vec<T>>,
    },
    Update {
        id: T::Id,
        patch: T::Patch,
        respond_to: Response<T, T>,
    },
    Delete {
        id: T::Id,
        respond_to: Response<T, ()>,
    },
    Action {
        id: T::Id,
        action: T::Action,
        respond_to: Response<T, T::ActionResult>,
    },
    Subscribe {
        filter: Filter<T>,
        respond_to: Response<T, Snapshot<T>>,
    },
}

// =============================================================================
// 4. THE GENERIC ACTOR SERVER
// =============================================================================

type IdFn<T> = Box<dyn Fn(&<T as Entity>::CreateParams) -> <T as Entity>::Id + Send + Sync>;

const DEFAULT_FEED_CAPACITY: usize = 1024;

pub struct ResourceActor<T: Entity> {
    receiver: mpsc::Receiver<ResourceRequest<T>>,
    store: HashMap<T::Id, T>,
    next_id_fn: IdFn<T>,
    clock: SharedClock,
    last_commit: Option<DateTime<Utc>>,
    revision: u64,
    changes: broadcast::Sender<Change<T>>,
}

impl<T: Entity> ResourceActor<T> {
    pub fn new(
        buffer_size: usize,
        clock: SharedClock,
        next_id_fn: impl Fn(&T::CreateParams) -> T::Id + Send + Sync + 'static,
    ) -> (Self, ResourceClient<T>) {
        Self::with_feed_capacity(buffer_size, DEFAULT_FEED_CAPACITY, clock, next_id_fn)
    }

    pub fn with_feed_capacity(
        buffer_size: usize,
        feed_capacity: usize,
        clock: SharedClock,
        next_id_fn: impl Fn(&T::CreateParams) -> T::Id + Send + Sync + 'static,
    ) -> (Self, ResourceClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let (changes, _) = broadcast::channel(feed_capacity);
        let actor = Self {
            receiver,
            store: HashMap::new(),
            next_id_fn: Box::new(next_id_fn),
            clock,
            last_commit: None,
            revision: 0,
            changes,
        };
        (actor, ResourceClient::new(sender))
    }

    #[instrument(name = "resource_actor", fields(kind = T::KIND), skip(self))]
    pub async fn run(mut self) {
        info!("Actor starting");
        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ResourceRequest::Create { params, respond_to } => {
                    let _ = respond_to.send(self.handle_create(params));
                }
                ResourceRequest::Get { id, respond_to } => {
                    let _ = respond_to.send(Ok(self.store.get(&id).cloned()));
                }
                ResourceRequest::List { filter, respond_to } => {
                    let _ = respond_to.send(Ok(self.select(&filter)));
                }
                ResourceRequest::Update { id, patch, respond_to } => {
                    let _ = respond_to.send(self.handle_update(id, patch));
                }
                ResourceRequest::Delete { id, respond_to } => {
                    let _ = respond_to.send(self.handle_delete(id));
                }
                ResourceRequest::Action { id, action, respond_to } => {
                    let _ = respond_to.send(self.handle_action(id, action));
                }
                ResourceRequest::Subscribe { filter, respond_to } => {
                    let snapshot = Snapshot {
                        revision: self.revision,
                        items: self.select(&filter),
                        changes: self.changes.subscribe(),
                    };
                    debug!(revision = self.revision, items = snapshot.items.len(), "Subscriber attached");
                    let _ = respond_to.send(Ok(snapshot));
                }
            }
        }
        info!(revision = self.revision, "Actor stopped");
    }

    /// Strictly increasing commit timestamp, even if the clock stalls or steps back.
    fn commit_time(&mut self) -> DateTime<Utc> {
        let now = self.clock.now();
        let at = match self.last_commit {
            Some(last) if now <= last => {
                if now < last {
                    warn!(%now, %last, "Clock behind last commit");
                }
                last + Duration::microseconds(1)
            }
            _ => now,
        };
        self.last_commit = Some(at);
        at
    }

    fn publish(&mut self, kind: ChangeKind, id: T::Id, scope: T::Scope, item: Option<T>) {
        self.revision += 1;
        let change = Change {
            revision: self.revision,
            kind,
            id,
            scope,
            item,
        };
        // Err only means there are no subscribers right now
        let _ = self.changes.send(change);
    }

    fn select(&self, filter: &Filter<T>) -> Vec<T> {
        match filter {
            Filter::Item(id) => self.store.get(id).cloned().into_iter().collect(),
            _ => self.store.values().filter(|item| filter.matches(item)).cloned().collect(),
        }
    }

    #[instrument(skip(self, params))]
    fn handle_create(&mut self, params: T::CreateParams) -> FrameworkResult<T, T> {
        let id = (self.next_id_fn)(&params);
        if self.store.contains_key(&id) {
            debug!(%id, "Duplicate id");
            return Err(FrameworkError::AlreadyExists(id.to_string()));
        }

        let now = self.commit_time();
        let item = T::from_create_params(id.clone(), params, now).map_err(FrameworkError::Domain)?;
        self.store.insert(id.clone(), item.clone());
        self.publish(ChangeKind::Created, id.clone(), item.scope().clone(), Some(item.clone()));

        debug!(%id, revision = self.revision, "Created");
        Ok(item)
    }

    #[instrument(fields(id = %id), skip(self, patch))]
    fn handle_update(&mut self, id: T::Id, patch: T::Patch) -> FrameworkResult<T, T> {
        let Some(current) = self.store.get(&id) else {
            return Err(FrameworkError::NotFound(id.to_string()));
        };

        // Hooks run on a copy so a rejected patch leaves the record untouched
        let mut next = current.clone();
        let now = self.commit_time();
        next.on_update(patch, now).map_err(FrameworkError::Domain)?;

        self.store.insert(id.clone(), next.clone());
        self.publish(ChangeKind::Updated, id, next.scope().clone(), Some(next.clone()));
        debug!(revision = self.revision, "Updated");
        Ok(next)
    }

    #[instrument(fields(id = %id), skip(self))]
    fn handle_delete(&mut self, id: T::Id) -> FrameworkResult<T, ()> {
        let Some(current) = self.store.get(&id) else {
            return Err(FrameworkError::NotFound(id.to_string()));
        };
        current.on_delete().map_err(FrameworkError::Domain)?;

        if let Some(removed) = self.store.remove(&id) {
            self.publish(ChangeKind::Deleted, id, removed.scope().clone(), None);
            debug!(revision = self.revision, "Deleted");
        }
        Ok(())
    }

    #[instrument(fields(id = %id), skip(self, action))]
    fn handle_action(&mut self, id: T::Id, action: T::Action) -> FrameworkResult<T, T::ActionResult> {
        let Some(current) = self.store.get(&id) else {
            return Err(FrameworkError::NotFound(id.to_string()));
        };

        let mut next = current.clone();
        let now = self.commit_time();
        let result = next.handle_action(action, now).map_err(FrameworkError::Domain)?;

        self.store.insert(id.clone(), next.clone());
        self.publish(ChangeKind::Updated, id, next.scope().clone(), Some(next));
        debug!(revision = self.revision, "Action applied");
        Ok(result)
    }
}

// =============================================================================
// 5. THE GENERIC CLIENT
// =============================================================================

pub struct ResourceClient<T: Entity> {
    sender: mpsc::Sender<ResourceRequest<T>>,
}

impl<T: Entity> Clone for ResourceClient<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T: Entity> ResourceClient<T> {
    pub(crate) fn new(sender: mpsc::Sender<ResourceRequest<T>>) -> Self {
        Self { sender }
    }

    async fn request<V>(
        &self,
        build: impl FnOnce(Response<T, V>) -> ResourceRequest<T>,
    ) -> FrameworkResult<T, V> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    pub async fn create(&self, params: T::CreateParams) -> FrameworkResult<T, T> {
        self.request(|respond_to| ResourceRequest::Create { params, respond_to }).await
    }

    pub async fn get(&self, id: T::Id) -> FrameworkResult<T, Option<T>> {
        self.request(|respond_to| ResourceRequest::Get { id, respond_to }).await
    }

    pub async fn list(&self, filter: Filter<T>) -> FrameworkResult<T, Vec<T>> {
        self.request(|respond_to| ResourceRequest::List { filter, respond_to }).await
    }

    pub async fn update(&self, id: T::Id, patch: T::Patch) -> FrameworkResult<T, T> {
        self.request(|respond_to| ResourceRequest::Update { id, patch, respond_to }).await
    }

    pub async fn delete(&self, id: T::Id) -> FrameworkResult<T, ()> {
        self.request(|respond_to| ResourceRequest::Delete { id, respond_to }).await
    }

    pub async fn perform_action(&self, id: T::Id, action: T::Action) -> FrameworkResult<T, T::ActionResult> {
        self.request(|respond_to| ResourceRequest::Action { id, action, respond_to }).await
    }

    pub async fn subscribe(&self, filter: Filter<T>) -> FrameworkResult<T, Snapshot<T>> {
        self.request(|respond_to| ResourceRequest::Subscribe { filter, respond_to }).await
    }
}

// =============================================================================
// 6. TEST ENTITY AND TESTS
// =============================================================================
