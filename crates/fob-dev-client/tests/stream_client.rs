mod common;

use common::{watch_run, FakeConnector, Script};
use fob_dev_client::{
    ChannelEvent, ConnectionState, DashboardClient, RetryPolicy, StreamSubscription,
};
use fob_dev_protocol::DashboardMessage;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

const URL: &str = "ws://localhost:8081/api/dashboard";

type Event = ChannelEvent<DashboardMessage>;

async fn collect(subscription: &mut StreamSubscription<DashboardMessage>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Some(event) = subscription.recv().await {
        events.push(event);
    }
    events
}

async fn next(subscription: &mut StreamSubscription<DashboardMessage>) -> Event {
    tokio::time::timeout(Duration::from_secs(30), subscription.recv())
        .await
        .expect("timed out waiting for an event")
        .expect("stream completed")
}

#[tokio::test(start_paused = true)]
async fn test_five_immediate_closes_exhaust_the_budget() {
    let connector = FakeConnector::new(Script::CloseImmediately);
    let client = DashboardClient::connect(URL, Arc::new(connector.clone()), RetryPolicy::default());
    let mut subscription = client.subscribe();

    let started = Instant::now();
    let events = collect(&mut subscription).await;

    let mut expected = Vec::new();
    for retries_left in (0..5).rev() {
        expected.push(ChannelEvent::Init { retries_left });
        expected.push(ChannelEvent::Open);
        expected.push(ChannelEvent::Close { retries_left });
    }
    assert_eq!(events, expected);

    // Four fixed delays between five attempts.
    assert!(started.elapsed() >= Duration::from_secs(20));
    assert!(started.elapsed() < Duration::from_secs(25));
    assert_eq!(connector.attempts(), 5);
    assert_eq!(client.state(), ConnectionState::Exhausted);

    // No further reconnection attempts.
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(connector.attempts(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_refused_connections_spend_the_budget() {
    let connector = FakeConnector::new(Script::Refuse);
    let policy = RetryPolicy {
        attempts: 3,
        delay: Duration::from_secs(1),
    };
    let client = DashboardClient::connect(URL, Arc::new(connector.clone()), policy);
    let mut subscription = client.subscribe();

    let events = collect(&mut subscription).await;
    assert_eq!(
        events,
        vec![
            ChannelEvent::Init { retries_left: 2 },
            ChannelEvent::Close { retries_left: 2 },
            ChannelEvent::Init { retries_left: 1 },
            ChannelEvent::Close { retries_left: 1 },
            ChannelEvent::Init { retries_left: 0 },
            ChannelEvent::Close { retries_left: 0 },
        ]
    );
    assert_eq!(connector.attempts(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_reconnects_after_server_close() {
    let connector = FakeConnector::new(Script::Live);
    let client = DashboardClient::connect(URL, Arc::new(connector.clone()), RetryPolicy::default());
    let mut subscription = client.subscribe();

    assert_eq!(next(&mut subscription).await, ChannelEvent::Init { retries_left: 4 });
    assert_eq!(next(&mut subscription).await, ChannelEvent::Open);
    assert_eq!(client.state(), ConnectionState::Open);

    connector.disconnect(URL);
    assert_eq!(next(&mut subscription).await, ChannelEvent::Close { retries_left: 4 });
    assert_eq!(client.retries_left(), 4);

    let closed_at = Instant::now();
    assert_eq!(next(&mut subscription).await, ChannelEvent::Init { retries_left: 3 });
    assert!(closed_at.elapsed() >= Duration::from_secs(5));
    assert_eq!(next(&mut subscription).await, ChannelEvent::Open);
    assert_eq!(connector.attempts(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_messages_are_decoded_in_order() {
    let connector = FakeConnector::new(Script::Live);
    let client = DashboardClient::connect(URL, Arc::new(connector.clone()), RetryPolicy::default());
    let mut subscription = client.subscribe();

    assert_eq!(next(&mut subscription).await, ChannelEvent::Init { retries_left: 4 });
    assert_eq!(next(&mut subscription).await, ChannelEvent::Open);

    assert!(connector.send(URL, &watch_run("ios", 8081)));
    assert!(connector.send(URL, "{ not json"));
    assert!(connector.send(URL, &watch_run("android", 8081)));

    let platforms: Vec<String> = [next(&mut subscription).await, next(&mut subscription).await]
        .into_iter()
        .map(|event| match event {
            ChannelEvent::Message(message) => message
                .build_started_platform()
                .map(|(platform, _)| platform.to_string())
                .unwrap(),
            other => panic!("unexpected event {other:?}"),
        })
        .collect();

    // The malformed message is dropped, not emitted.
    assert_eq!(platforms, vec!["ios", "android"]);
    assert!(subscription.try_recv().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_unsubscribing_one_observer_keeps_the_other() {
    let connector = FakeConnector::new(Script::Live);
    let client = DashboardClient::connect(URL, Arc::new(connector.clone()), RetryPolicy::default());
    let first = client.subscribe();
    let mut second = client.subscribe();
    assert_eq!(client.observer_count(), 2);

    assert_eq!(next(&mut second).await, ChannelEvent::Init { retries_left: 4 });
    assert_eq!(next(&mut second).await, ChannelEvent::Open);

    first.unsubscribe();
    assert_eq!(client.observer_count(), 1);

    assert!(connector.send(URL, &watch_run("ios", 8081)));
    assert!(matches!(next(&mut second).await, ChannelEvent::Message(_)));

    // The transport and the budget are untouched.
    assert!(!connector.client_closed(URL));
    assert_eq!(client.retries_left(), 5);
    assert_eq!(client.state(), ConnectionState::Open);
}

#[tokio::test(start_paused = true)]
async fn test_late_observer_gets_no_replay() {
    let connector = FakeConnector::new(Script::Live);
    let client = DashboardClient::connect(URL, Arc::new(connector.clone()), RetryPolicy::default());
    let mut early = client.subscribe();

    assert_eq!(next(&mut early).await, ChannelEvent::Init { retries_left: 4 });
    assert_eq!(next(&mut early).await, ChannelEvent::Open);

    let mut late = client.subscribe();
    assert!(late.try_recv().is_none());

    assert!(connector.send(URL, &watch_run("ios", 8081)));
    assert!(matches!(next(&mut late).await, ChannelEvent::Message(_)));
}

#[tokio::test(start_paused = true)]
async fn test_teardown_closes_transport_and_ends_streams() {
    let connector = FakeConnector::new(Script::Live);
    let client = DashboardClient::connect(URL, Arc::new(connector.clone()), RetryPolicy::default());
    let mut subscription = client.subscribe();

    assert_eq!(next(&mut subscription).await, ChannelEvent::Init { retries_left: 4 });
    assert_eq!(next(&mut subscription).await, ChannelEvent::Open);

    client.teardown();
    assert_eq!(subscription.recv().await, None);

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(connector.client_closed(URL));

    // Nothing reaches observers after teardown, and no reconnect happens.
    connector.send(URL, &watch_run("ios", 8081));
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(connector.attempts(), 1);
    assert!(client.subscribe().try_recv().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_observed_connect_sees_every_event() {
    let connector = FakeConnector::new(Script::Refuse);
    let policy = RetryPolicy {
        attempts: 1,
        delay: Duration::from_millis(1),
    };
    let (client, mut subscription) =
        DashboardClient::connect_observed(URL, Arc::new(connector.clone()), policy);

    let events = tokio::time::timeout(Duration::from_secs(5), collect(&mut subscription))
        .await
        .expect("stream never completed");
    assert_eq!(
        events,
        vec![
            ChannelEvent::Init { retries_left: 0 },
            ChannelEvent::Close { retries_left: 0 },
        ]
    );
    assert_eq!(client.state(), ConnectionState::Exhausted);
}

#[tokio::test(start_paused = true)]
async fn test_subscribing_after_exhaustion_completes_immediately() {
    let connector = FakeConnector::new(Script::Refuse);
    let policy = RetryPolicy {
        attempts: 1,
        delay: Duration::from_secs(1),
    };
    let client = DashboardClient::connect(URL, Arc::new(connector.clone()), policy);
    let mut first = client.subscribe();
    collect(&mut first).await;

    let mut late = client.subscribe();
    assert_eq!(late.recv().await, None);
}
