use std::collections::HashMap;
use tracing::instrument;

use super::{ChangeFeed, FeedError, Subscription};
use crate::actor_framework::Filter;
use crate::clients::OrderClient;
use crate::domain::Order;
use crate::sequencing::{creation_order, display_number, DisplayNumber};

/// What a customer's receipt page shows for one order.
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    /// `None` until the order is visible in the stall's set
    pub order: Option<Order>,
    pub number: DisplayNumber,
}

/// Order-specific views over the order store's change feed.
#[derive(Clone)]
pub struct OrderFeed {
    feed: ChangeFeed<Order>,
    display_base: u64,
}

impl OrderFeed {
    pub fn new(orders: &OrderClient, display_base: u64) -> Self {
        Self {
            feed: ChangeFeed::new(orders.resource().clone()),
            display_base,
        }
    }

    /// Every order of the stall, newest first, on each change to any of them.
    #[instrument(skip(self, on_change))]
    pub async fn watch_stall<C>(&self, stall_id: String, on_change: C) -> Result<Subscription, FeedError>
    where
        C: FnMut(Result<Vec<Order>, FeedError>) + Send + 'static,
    {
        self.feed.watch(Filter::Scope(stall_id), newest_first, on_change).await
    }

    /// One order; `None` if it does not exist or has been deleted.
    #[instrument(skip(self, on_change))]
    pub async fn watch_order<C>(&self, order_id: String, on_change: C) -> Result<Subscription, FeedError>
    where
        C: FnMut(Result<Option<Order>, FeedError>) + Send + 'static,
    {
        let id = order_id.clone();
        self.feed
            .watch(Filter::Item(order_id), move |items: &HashMap<String, Order>| items.get(&id).cloned(), on_change)
            .await
    }

    /// The order and its display number from a single stall-wide
    /// subscription, delivered only when either of them changes.
    #[instrument(skip(self, on_change))]
    pub async fn watch_receipt<C>(&self, stall_id: String, order_id: String, on_change: C) -> Result<Subscription, FeedError>
    where
        C: FnMut(Result<Receipt, FeedError>) + Send + 'static,
    {
        let base = self.display_base;
        let render = move |items: &HashMap<String, Order>| {
            let orders: Vec<Order> = items.values().cloned().collect();
            Receipt {
                order: items.get(&order_id).cloned(),
                number: display_number(&orders, &order_id, base),
            }
        };
        self.feed.watch(Filter::Scope(stall_id), render, on_change).await
    }
}

fn newest_first(items: &HashMap<String, Order>) -> Vec<Order> {
    let mut orders: Vec<Order> = items.values().cloned().collect();
    orders.sort_by(|a, b| creation_order(b, a));
    orders
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor_framework::ResourceActor;
    use crate::clients::{AccessPolicy, StallClient};
    use crate::clock::ManualClock;
    use crate::domain::{MenuItem, OrderDraft, OrderLine, OrderStatus, Stall, StallRegistration};
    use crate::feed::test_support::Recorder;
    use crate::order_actor::AdmittedDraft;
    use rust_decimal::Decimal;

    async fn open_stall(clock: &ManualClock) -> OrderClient {
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
        stalls.activate("chaat-101".into(), "UTR1".into()).await.unwrap();

        let (order_actor, order_inner) =
            ResourceActor::<Order>::new(10, clock.shared(), |_: &AdmittedDraft| uuid::Uuid::new_v4().to_string());
        tokio::spawn(order_actor.run());
        OrderClient::new(order_inner, stalls, false)
    }

    fn draft(quantity: u32) -> OrderDraft {
        OrderDraft::from_cart(
            "chaat-101",
            vec![OrderLine::new("m1", "Pani Puri", Decimal::from(40), quantity)],
        )
    }

    fn status_of(receipt: &Result<Receipt, FeedError>) -> Option<OrderStatus> {
        receipt.as_ref().ok()?.order.as_ref().map(|o| o.status)
    }

    #[tokio::test]
    async fn test_watch_stall_sees_every_order_newest_first() {
        let clock = ManualClock::fixed();
        let orders = open_stall(&clock).await;
        let feed = OrderFeed::new(&orders, 100);

        let recorder = Recorder::<Vec<Order>>::new();
        let _sub = feed.watch_stall("chaat-101".into(), recorder.callback()).await.unwrap();

        let mut placed = Vec::new();
        for qty in 1..=5 {
            placed.push(orders.create_order(draft(qty)).await.unwrap());
        }
        recorder
            .wait_for(|seen| matches!(seen.last(), Some(Ok(latest)) if latest.len() == 5))
            .await;

        let Some(Ok(latest)) = recorder.last() else {
            panic!("expected a stall view");
        };
        let ids: Vec<&str> = latest.iter().map(|o| o.id.as_str()).collect();
        let expected: Vec<&str> = placed.iter().rev().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn test_watch_order_sees_completion_once() {
        let clock = ManualClock::fixed();
        let orders = open_stall(&clock).await;
        let feed = OrderFeed::new(&orders, 100);
        let order = orders.create_order(draft(2)).await.unwrap();

        let recorder = Recorder::<Option<Order>>::new();
        let _sub = feed.watch_order(order.id.clone(), recorder.callback()).await.unwrap();

        // Unrelated orders do not wake this subscriber
        orders.create_order(draft(1)).await.unwrap();
        orders.set_status(order.id.clone(), OrderStatus::Completed).await.unwrap();
        recorder
            .wait_for(|seen| matches!(seen.last(), Some(Ok(Some(o))) if o.status == OrderStatus::Completed))
            .await;

        let statuses: Vec<OrderStatus> = recorder
            .values()
            .into_iter()
            .filter_map(|v| v.ok().flatten().map(|o| o.status))
            .collect();
        assert_eq!(statuses, vec![OrderStatus::Verified, OrderStatus::Completed]);
    }

    #[tokio::test]
    async fn test_watch_unknown_order_delivers_none() {
        let clock = ManualClock::fixed();
        let orders = open_stall(&clock).await;
        let feed = OrderFeed::new(&orders, 100);

        let recorder = Recorder::<Option<Order>>::new();
        let _sub = feed.watch_order("nope".into(), recorder.callback()).await.unwrap();

        assert_eq!(recorder.values(), vec![Ok(None)]);
    }

    #[tokio::test]
    async fn test_receipt_tracks_number_and_status() {
        let clock = ManualClock::fixed();
        let orders = open_stall(&clock).await;
        let feed = OrderFeed::new(&orders, 100);
        orders.create_order(draft(1)).await.unwrap();
        let mine = orders.create_order(draft(2)).await.unwrap();

        let recorder = Recorder::<Receipt>::new();
        let _sub = feed
            .watch_receipt("chaat-101".into(), mine.id.clone(), recorder.callback())
            .await
            .unwrap();

        // A later order changes neither my order nor my number
        orders.create_order(draft(3)).await.unwrap();
        orders.set_status(mine.id.clone(), OrderStatus::Completed).await.unwrap();
        recorder
            .wait_for(|seen| seen.last().and_then(status_of) == Some(OrderStatus::Completed))
            .await;

        let seen = recorder.values();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].as_ref().map(|r| r.number), Ok(DisplayNumber::Resolved(101)));
        assert_eq!(seen[1].as_ref().map(|r| r.number), Ok(DisplayNumber::Resolved(101)));
    }

    #[tokio::test]
    async fn test_receipt_past_the_largest_number_stays_live() {
        let clock = ManualClock::fixed();
        let orders = open_stall(&clock).await;
        let feed = OrderFeed::new(&orders, u64::MAX);
        orders.create_order(draft(1)).await.unwrap();
        let mine = orders.create_order(draft(2)).await.unwrap();

        let recorder = Recorder::<Receipt>::new();
        let sub = feed
            .watch_receipt("chaat-101".into(), mine.id.clone(), recorder.callback())
            .await
            .unwrap();
        assert_eq!(
            recorder.last().map(|r| r.map(|r| r.number)),
            Some(Ok(DisplayNumber::Unresolved))
        );

        orders.set_status(mine.id.clone(), OrderStatus::Completed).await.unwrap();
        recorder
            .wait_for(|seen| seen.last().and_then(status_of) == Some(OrderStatus::Completed))
            .await;

        assert!(sub.is_active());
        assert_eq!(
            recorder.last().map(|r| r.map(|r| r.number)),
            Some(Ok(DisplayNumber::Unresolved))
        );
    }
}
