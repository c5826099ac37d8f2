//! End-to-end session tests against a local WebSocket server.

mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use common::{TEST_TIMEOUT, binance_ticker, drive_until, spawn_server, usdt_config};
use tickerboard::exchange::{Adapter, Binance, ConnectionState, Outcome};

const FAST_RECONNECT: Duration = Duration::from_millis(50);

fn binance_adapter(url: &str) -> (Adapter, mpsc::UnboundedReceiver<tickerboard::tui::Message>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let protocol = Arc::new(Binance::new(url.to_string(), "USDT".to_string()));
    let adapter = Adapter::new(protocol, tx).with_reconnect_delay(FAST_RECONNECT);
    (adapter, rx)
}

#[tokio::test]
async fn test_session_subscribes_and_standardizes_frames() {
    let frames = vec![
        r#"{"result":null,"id":1}"#.to_string(),
        "not json at all".to_string(),
        binance_ticker("BTCUSDT", "60000.00"),
        binance_ticker("BTCUSDT", "60500.00"),
    ];
    let mut server = spawn_server(frames, false).await;
    let (mut adapter, mut rx) = binance_adapter(&server.url);

    assert!(adapter.connect(&usdt_config()).expect("Failed to connect"));
    let mut updates = 0;
    drive_until(&mut adapter, &mut rx, |_, outcome| {
        if matches!(outcome, Outcome::Updated(_)) {
            updates += 1;
        }
        updates == 2
    })
    .await;

    let subscription = server.subscriptions.recv().await.expect("No subscription");
    let value: serde_json::Value =
        serde_json::from_str(&subscription).expect("Subscription is not JSON");
    assert_eq!(value["method"], "SUBSCRIBE");
    assert_eq!(value["params"][0], "btcusdt@ticker");
    assert_eq!(value["params"][1], "ethusdt@ticker");

    assert_eq!(adapter.state(), ConnectionState::Open);
    let snapshot = adapter.snapshot();
    let record = &snapshot["BTC_USDT"];
    assert_eq!(snapshot.len(), 1);
    assert_eq!(record.current_price, 60_500.0);
    assert_eq!(record.prev_comparison_price, Some(60_000.0));
    assert_eq!(record.average_purchase_price, Some(50_000.0));
    let profit_loss = record.profit_loss_rate_pct.expect("No P/L for configured coin");
    assert!((profit_loss - 21.0).abs() < 1e-9);
    assert_eq!(record.volume_power, None);
}

#[tokio::test]
async fn test_server_hang_up_triggers_reconnect() {
    let frames = vec![binance_ticker("ETHUSDT", "2500.5")];
    let mut server = spawn_server(frames, true).await;
    let (mut adapter, mut rx) = binance_adapter(&server.url);

    adapter.connect(&usdt_config()).expect("Failed to connect");
    let first_generation = adapter.generation();

    drive_until(&mut adapter, &mut rx, |adapter, _| {
        adapter.state() == ConnectionState::Backoff
    })
    .await;
    // The last good data survives the drop.
    assert!(adapter.snapshot().contains_key("ETH_USDT"));

    drive_until(&mut adapter, &mut rx, |adapter, _| {
        adapter.generation() > first_generation && adapter.state() == ConnectionState::Open
    })
    .await;

    for _ in 0..2 {
        tokio::time::timeout(TEST_TIMEOUT, server.subscriptions.recv())
            .await
            .expect("Timed out waiting for subscription")
            .expect("Server stopped");
    }
}

#[tokio::test]
async fn test_disconnect_closes_socket_without_reconnect() {
    let mut server = spawn_server(vec![binance_ticker("BTCUSDT", "1.0")], false).await;
    let (mut adapter, mut rx) = binance_adapter(&server.url);

    adapter.connect(&usdt_config()).expect("Failed to connect");
    drive_until(&mut adapter, &mut rx, |_, outcome| {
        matches!(outcome, Outcome::Updated(_))
    })
    .await;

    adapter.disconnect();
    assert!(adapter.snapshot().is_empty());

    tokio::time::timeout(TEST_TIMEOUT, server.closed.recv())
        .await
        .expect("Server never saw the socket close")
        .expect("Server stopped");

    // Nothing that arrives afterwards revives the adapter.
    tokio::time::sleep(FAST_RECONNECT * 4).await;
    while let Ok(message) = rx.try_recv() {
        if let tickerboard::tui::Message::Session {
            generation, event, ..
        } = message
        {
            assert_eq!(adapter.handle(generation, event), Outcome::Ignored);
        }
    }
    assert_eq!(adapter.state(), ConnectionState::Idle);
    assert!(adapter.snapshot().is_empty());
    assert!(server.subscriptions.try_recv().is_ok());
    assert!(server.subscriptions.try_recv().is_err());
}

#[tokio::test]
async fn test_unreachable_endpoint_backs_off() {
    // Bind then drop to get a port nobody listens on.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    let url = format!("ws://{}", listener.local_addr().expect("No address"));
    drop(listener);

    let (mut adapter, mut rx) = binance_adapter(&url);
    adapter.connect(&usdt_config()).expect("Failed to connect");

    drive_until(&mut adapter, &mut rx, |adapter, _| {
        adapter.state() == ConnectionState::Backoff
    })
    .await;
    assert!(adapter.snapshot().is_empty());
    adapter.disconnect();
}
