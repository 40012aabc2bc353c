use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tracing::{error, info, warn, Instrument};

use stall_market::app_system::performance_monitor;
use stall_market::clock::SystemClock;
use stall_market::dashboard::StallSummary;
use stall_market::domain::{OrderDraft, OrderLine, OrderStatus};
use stall_market::order_actor::OrderError;
use stall_market::sequencing::display_numbers;
use stall_market::{setup_tracing, AppConfig, MarketSystem, SystemError};

#[tokio::main]
async fn main() -> Result<(), SystemError> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();
    setup_tracing();

    let mut config = AppConfig::from_env()?;
    if std::env::var("SEED_DEMO_STALLS").is_err() {
        config.seed_demo_stalls = true;
    }

    info!("Starting market system");
    let system = MarketSystem::new(config, Arc::new(SystemClock)).await?;
    let monitor = tokio::spawn(performance_monitor(
        system.stall_client.clone(),
        Duration::from_secs(30),
    ));

    for stall in system.stall_client.list_stalls().await? {
        let countdown = system.stall_client.countdown(&stall);
        info!(
            stall_id = %stall.id,
            name = %stall.name,
            status = %system.stall_client.status(&stall),
            remaining = %countdown.label(),
            "Stall"
        );
    }

    // Vendor dashboard for the open stall
    let display_base = system.config().display_base;
    let mut dashboard = system
        .order_feed
        .watch_stall("chaat-101".to_string(), move |result| match result {
            Ok(orders) => {
                let summary = StallSummary::from_orders(&orders);
                let numbers = display_numbers(&orders, display_base);
                let newest = orders.first().and_then(|o| numbers.get(&o.id)).copied();
                info!(
                    orders = summary.total_orders,
                    revenue = %summary.total_revenue,
                    open = summary.open_orders,
                    newest = ?newest,
                    "Dashboard refreshed"
                );
            }
            Err(e) => error!(error = %e, "Dashboard feed failed"),
        })
        .await?;

    // Checkout is blocked before payment while a stall is inactive
    let burger = OrderDraft::from_cart(
        "burger-202",
        vec![OrderLine::new("b1", "Veggie Supreme", Decimal::from(90), 1)],
    );
    match system.order_client.create_order(burger.clone()).await {
        Err(OrderError::StallUnavailable { stall_id, status }) => {
            warn!(%stall_id, %status, "Checkout blocked")
        }
        Err(e) => return Err(e.into()),
        Ok(order) => warn!(order_id = %order.id, "Inactive stall accepted an order"),
    }

    let stall = system
        .stall_client
        .activate("burger-202".to_string(), "UTR-DEMO-1".to_string())
        .await?;
    info!(expires_at = ?stall.expiry_time(), "Burger & Bytes activated");
    system.order_client.create_order(burger).await?;

    // Customer order and receipt
    let span = tracing::info_span!("order_processing");
    let order = async {
        let draft = OrderDraft::from_cart(
            "chaat-101",
            vec![
                OrderLine::new("m1", "Pani Puri", Decimal::from(40), 2),
                OrderLine::new("m3", "Masala Chai", Decimal::from(20), 1),
            ],
        );
        system.order_client.create_order(draft).await
    }
    .instrument(span)
    .await?;

    let mut receipt = system
        .order_feed
        .watch_receipt(order.stall_id.clone(), order.id.clone(), |result| match result {
            Ok(receipt) => info!(
                number = %receipt.number,
                status = ?receipt.order.as_ref().map(|o| o.status),
                "Receipt updated"
            ),
            Err(e) => error!(error = %e, "Receipt feed failed"),
        })
        .await?;

    let number = system
        .sequencing
        .display_number(order.stall_id.clone(), order.id.clone())
        .await?;
    info!(order_id = %order.id, %number, "Order placed");

    let completed = system
        .order_client
        .set_status(order.id.clone(), OrderStatus::Completed)
        .await?;
    match serde_json::to_string_pretty(&completed) {
        Ok(json) => info!("Completed order:\n{}", json),
        Err(e) => warn!(error = %e, "Could not render order"),
    }

    // Let the feeds catch up before tearing down
    tokio::time::sleep(Duration::from_millis(100)).await;
    receipt.cancel();
    dashboard.cancel();
    monitor.abort();
    let _ = monitor.await;

    system.shutdown().await?;

    info!("Application completed successfully");
    Ok(())
}
