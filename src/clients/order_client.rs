use tracing::{debug, info, instrument, warn};

use crate::actor_framework::{Filter, ResourceClient};
use crate::clients::StallClient;
use crate::domain::{Order, OrderDraft, OrderStatus, UpdatedBy};
use crate::order_actor::{AccessGate, OrderError, StatusPatch};

/// Client for the order store.
///
/// Order creation is orchestrated here: the stall is looked up in the access
/// ledger and the draft must pass the [`AccessGate`] before anything is sent
/// to the order actor, which refuses it if the window has closed meanwhile.
#[derive(Clone)]
pub struct OrderClient {
    inner: ResourceClient<Order>,
    stall_client: StallClient,
    strict_transitions: bool,
}

impl_client_methods!(OrderClient, Order, OrderError, order);

impl OrderClient {
    pub fn new(inner: ResourceClient<Order>, stall_client: StallClient, strict_transitions: bool) -> Self {
        Self {
            inner,
            stall_client,
            strict_transitions,
        }
    }

    pub(crate) fn resource(&self) -> &ResourceClient<Order> {
        &self.inner
    }

    #[instrument(skip(self, draft), fields(stall_id = %draft.stall_id))]
    pub async fn create_order(&self, draft: OrderDraft) -> Result<Order, OrderError> {
        debug!("Processing create_order request");

        // Step 1: Look up the stall
        let stall = self.stall_client.require_stall(draft.stall_id.clone()).await?;

        // Step 2: Gate on access status and menu
        let admitted = match AccessGate::admit(&stall, draft, self.stall_client.now()) {
            Ok(admitted) => admitted,
            Err(e) => {
                warn!(error = %e, "Order rejected at gate");
                return Err(e);
            }
        };

        // Step 3: Persist; the store re-checks the window at commit time
        let order = self.inner.create(admitted).await?;
        info!(order_id = %order.id, total = %order.total_amount, "Order placed");
        Ok(order)
    }

    /// All orders of a stall, in no particular order.
    #[instrument(skip(self))]
    pub async fn list_by_stall(&self, stall_id: String) -> Result<Vec<Order>, OrderError> {
        debug!("Sending request");
        Ok(self.inner.list(Filter::Scope(stall_id)).await?)
    }

    #[instrument(skip(self))]
    pub async fn set_status(&self, order_id: String, status: OrderStatus) -> Result<Order, OrderError> {
        let patch = StatusPatch {
            status,
            updated_by: UpdatedBy::Vendor,
            enforce_transitions: self.strict_transitions,
        };
        let order = self.inner.update(order_id, patch).await?;
        info!(status = %order.status, "Order status set");
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor_framework::ResourceActor;
    use crate::clients::AccessPolicy;
    use crate::clock::ManualClock;
    use crate::domain::{MenuItem, OrderLine, Stall, StallRegistration};
    use crate::order_actor::AdmittedDraft;
    use chrono::Duration;
    use rust_decimal::Decimal;

    async fn spawn_store(clock: &ManualClock, strict: bool) -> OrderClient {
        spawn_split(clock, clock, strict).await
    }

    /// Ledger and order store on separate clocks.
    async fn spawn_split(ledger_clock: &ManualClock, store_clock: &ManualClock, strict: bool) -> OrderClient {
        let clock = ledger_clock;
        let (stall_actor, stall_inner) =
            ResourceActor::<Stall>::new(10, clock.shared(), |r: &StallRegistration| r.id.clone());
        tokio::spawn(stall_actor.run());
        let stalls = StallClient::new(stall_inner, clock.shared(), AccessPolicy::default());
        stalls
            .register_stall(StallRegistration::new(
                "chaat-101",
                "Royal Chaat",
                vec![MenuItem::new("m1", "Pani Puri", Decimal::from(40), true)],
            ))
            .await
            .unwrap();

        let (order_actor, order_inner) =
            ResourceActor::<Order>::new(10, store_clock.shared(), |_: &AdmittedDraft| uuid::Uuid::new_v4().to_string());
        tokio::spawn(order_actor.run());
        OrderClient::new(order_inner, stalls, strict)
    }

    fn pani_puri(quantity: u32) -> OrderDraft {
        OrderDraft::from_cart(
            "chaat-101",
            vec![OrderLine::new("m1", "Pani Puri", Decimal::from(40), quantity)],
        )
    }

    #[tokio::test]
    async fn test_inactive_stall_rejects_and_persists_nothing() {
        let clock = ManualClock::fixed();
        let orders = spawn_store(&clock, false).await;

        let err = orders.create_order(pani_puri(2)).await.unwrap_err();
        assert!(matches!(err, OrderError::StallUnavailable { .. }));
        assert!(orders.list_by_stall("chaat-101".into()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_stall() {
        let clock = ManualClock::fixed();
        let orders = spawn_store(&clock, false).await;

        let mut draft = pani_puri(1);
        draft.stall_id = "ghost".into();
        let err = orders.create_order(draft).await.unwrap_err();
        assert_eq!(err, OrderError::StallNotFound("ghost".into()));
    }

    #[tokio::test]
    async fn test_active_stall_accepts_and_round_trips() {
        let clock = ManualClock::fixed();
        let orders = spawn_store(&clock, false).await;
        orders.stall_client.activate("chaat-101".into(), "UTR1".into()).await.unwrap();

        let placed = orders.create_order(pani_puri(2)).await.unwrap();
        assert_eq!(placed.subtotal, Decimal::from(80));
        assert_eq!(placed.status, OrderStatus::Verified);

        let fetched = orders.require_order(placed.id.clone()).await.unwrap();
        assert_eq!(fetched, placed);
    }

    #[tokio::test]
    async fn test_suspended_stall_rejects() {
        let clock = ManualClock::fixed();
        let orders = spawn_store(&clock, false).await;
        orders.stall_client.activate("chaat-101".into(), "UTR1".into()).await.unwrap();

        clock.advance(Duration::hours(3) + Duration::seconds(1));
        let err = orders.create_order(pani_puri(1)).await.unwrap_err();
        assert!(matches!(err, OrderError::StallUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_window_closing_before_commit_rejects_order() {
        let ledger_clock = ManualClock::fixed();
        let store_clock = ManualClock::fixed();
        let orders = spawn_split(&ledger_clock, &store_clock, false).await;
        orders.stall_client.activate("chaat-101".into(), "UTR1".into()).await.unwrap();

        // The gate still sees an open stall, the store commits after expiry
        store_clock.advance(Duration::hours(3) + Duration::seconds(1));
        let err = orders.create_order(pani_puri(1)).await.unwrap_err();
        assert_eq!(
            err,
            OrderError::StallUnavailable {
                stall_id: "chaat-101".into(),
                status: crate::domain::StallStatus::Suspended
            }
        );
        assert!(orders.list_by_stall("chaat-101".into()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_status_lenient_and_strict() {
        let clock = ManualClock::fixed();
        let lenient = spawn_store(&clock, false).await;
        lenient.stall_client.activate("chaat-101".into(), "UTR1".into()).await.unwrap();
        let order = lenient.create_order(pani_puri(1)).await.unwrap();

        let done = lenient.set_status(order.id.clone(), OrderStatus::Completed).await.unwrap();
        assert_eq!(done.status, OrderStatus::Completed);
        assert_eq!(done.updated_by, UpdatedBy::Vendor);
        assert_eq!(done.created_at, order.created_at);
        let back = lenient.set_status(order.id.clone(), OrderStatus::Verified).await.unwrap();
        assert_eq!(back.status, OrderStatus::Verified);

        let err = lenient.set_status("missing".into(), OrderStatus::Completed).await.unwrap_err();
        assert_eq!(err, OrderError::NotFound("missing".into()));

        let strict = spawn_store(&clock, true).await;
        strict.stall_client.activate("chaat-101".into(), "UTR1".into()).await.unwrap();
        let order = strict.create_order(pani_puri(1)).await.unwrap();
        strict.set_status(order.id.clone(), OrderStatus::Completed).await.unwrap();
        let err = strict.set_status(order.id.clone(), OrderStatus::Verified).await.unwrap_err();
        assert!(matches!(err, OrderError::IllegalTransition { .. }));
    }
}
