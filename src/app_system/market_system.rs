use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{seed_demo_stalls, SystemError};
use crate::actor_framework::ResourceActor;
use crate::clients::{AccessPolicy, OrderClient, StallClient};
use crate::clock::SharedClock;
use crate::config::AppConfig;
use crate::domain::{Order, Stall, StallRegistration};
use crate::feed::OrderFeed;
use crate::order_actor::AdmittedDraft;
use crate::sequencing::SequencingResolver;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// The application system that owns both store actors.
///
/// Starts the stall ledger and the order store, wires the access gate, the
/// change feed and the sequencing resolver on top of them, and stops it all
/// in [`MarketSystem::shutdown`].
pub struct MarketSystem {
    pub stall_client: StallClient,
    pub order_client: OrderClient,
    pub order_feed: OrderFeed,
    pub sequencing: SequencingResolver,
    config: AppConfig,
    handles: Vec<JoinHandle<()>>,
}

impl MarketSystem {
    pub async fn new(config: AppConfig, clock: SharedClock) -> Result<Self, SystemError> {
        // 1. Stall ledger, keyed by the onboarding id
        let (stall_actor, stall_resource_client) = ResourceActor::<Stall>::with_feed_capacity(
            config.actor_buffer,
            config.feed_capacity,
            clock.clone(),
            |registration: &StallRegistration| registration.id.clone(),
        );
        let stall_client = StallClient::new(stall_resource_client, clock.clone(), AccessPolicy::from(&config));
        let stall_handle = tokio::spawn(stall_actor.run());

        // 2. Order store, ids assigned by the store
        let (order_actor, order_resource_client) = ResourceActor::<Order>::with_feed_capacity(
            config.actor_buffer,
            config.feed_capacity,
            clock,
            |_: &AdmittedDraft| Uuid::new_v4().to_string(),
        );
        let order_client = OrderClient::new(order_resource_client, stall_client.clone(), config.strict_transitions);
        let order_handle = tokio::spawn(order_actor.run());

        // 3. Views on top of the order store
        let order_feed = OrderFeed::new(&order_client, config.display_base);
        let sequencing = SequencingResolver::new(order_client.clone(), config.display_base);

        let system = Self {
            stall_client,
            order_client,
            order_feed,
            sequencing,
            config,
            handles: vec![stall_handle, order_handle],
        };

        if system.config.seed_demo_stalls {
            seed_demo_stalls(&system.stall_client).await?;
        }

        info!(
            strict_transitions = system.config.strict_transitions,
            display_base = system.config.display_base,
            "Market system started"
        );
        Ok(system)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Drops the system's clients and waits for both actors to stop.
    ///
    /// Actors stop once every client handle is gone, so clones held
    /// elsewhere (including live subscriptions) must be dropped first or the
    /// actor is aborted after a grace period.
    pub async fn shutdown(self) -> Result<(), SystemError> {
        self.shutdown_with_grace(SHUTDOWN_GRACE).await
    }

    /// Like [`MarketSystem::shutdown`] with a custom grace period per actor.
    ///
    /// Every actor is stopped or aborted before this returns; the first
    /// failure is reported.
    pub async fn shutdown_with_grace(self, grace: Duration) -> Result<(), SystemError> {
        info!("Shutting down system...");

        let Self {
            stall_client,
            order_client,
            order_feed,
            sequencing,
            handles,
            ..
        } = self;

        // Drop clients to close the actor channels
        drop(order_feed);
        drop(sequencing);
        drop(order_client);
        drop(stall_client);

        let mut outcome = Ok(());
        for mut handle in handles {
            let failure = match tokio::time::timeout(grace, &mut handle).await {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => {
                    error!("Actor task failed: {:?}", e);
                    SystemError::ActorTask(e.to_string())
                }
                Err(_) => {
                    warn!(?grace, "Actor still referenced, aborting");
                    handle.abort();
                    // Cancelled is the expected outcome of the abort
                    let _ = handle.await;
                    SystemError::ShutdownTimeout(grace)
                }
            };
            if outcome.is_ok() {
                outcome = Err(failure);
            }
        }

        if outcome.is_ok() {
            info!("System shutdown complete.");
        }
        outcome
    }
}
