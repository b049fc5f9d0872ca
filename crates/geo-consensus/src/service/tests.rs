use super::*;
use crate::adapters::{FixedTimeSource, InMemoryChain, SimulatedLatencyProbe};
use crate::domain::ProximityEngine;
use std::time::Duration;

struct Harness {
    chain: GeoChain<InMemoryChain>,
    base: Arc<InMemoryChain>,
    clock: Arc<FixedTimeSource>,
}

fn schedule() -> TaskSchedule {
    TaskSchedule {
        network_refresh: Duration::from_secs(30),
        throughput_refresh: Duration::from_secs(10),
        aggregation: Duration::from_secs(30),
        shutdown_grace: Duration::from_secs(5),
    }
}

fn harness_with(config: GeoConfig) -> Harness {
    let base = Arc::new(InMemoryChain::new());
    let clock = Arc::new(FixedTimeSource::default());
    let chain = GeoChain::new(GeoChainDeps {
        chain_id: "test-channel".to_string(),
        base: Arc::clone(&base),
        config,
        schedule: schedule(),
        probe: Arc::new(SimulatedLatencyProbe::without_jitter()),
        time: clock.clone(),
        span: Span::none(),
    });
    Harness { chain, base, clock }
}

fn harness() -> Harness {
    harness_with(GeoConfig::default())
}

fn loc(lat: f64, lon: f64, region: &str, zone: &str) -> GeoLocation {
    GeoLocation::new(lat, lon, region, zone, "dc")
}

// === Registration ===

#[tokio::test]
async fn test_register_cross_region_pair() {
    let h = harness();
    h.chain
        .register_node(1, loc(37.7749, -122.4194, "us-west", "us-west-1a"))
        .unwrap();
    h.chain
        .register_node(2, loc(40.7128, -74.0060, "us-east", "us-east-1a"))
        .unwrap();

    let snapshot = h.chain.topology_snapshot();
    assert_eq!(snapshot.total_nodes, 2);

    let a = &snapshot.nodes[0].location;
    let b = &snapshot.nodes[1].location;
    let km = ProximityEngine::distance(a, b);
    assert!((km - 4130.0).abs() < 50.0, "distance {km}");

    let proximity = snapshot.proximity_matrix[&1][&2];
    assert!((proximity - 1.0 / (1.0 + km)).abs() < 1e-12);
    assert_eq!(snapshot.proximity_matrix[&2][&1], proximity);
}

#[tokio::test]
async fn test_register_same_zone_pair() {
    let h = harness();
    h.chain
        .register_node(3, loc(51.5074, -0.1278, "eu-west", "eu-west-1a"))
        .unwrap();
    h.chain
        .register_node(4, loc(51.5074, -0.1278, "eu-west", "eu-west-1a"))
        .unwrap();

    let snapshot = h.chain.topology_snapshot();
    assert_eq!(snapshot.proximity_matrix[&3][&4], 2.0 * 1.5);
}

#[tokio::test]
async fn test_register_rejects_invalid_input() {
    let h = harness();
    assert!(matches!(
        h.chain.register_node(0, loc(0.0, 0.0, "r", "z")),
        Err(crate::domain::GeoError::InvalidNodeId)
    ));
    assert!(matches!(
        h.chain.register_node(1, loc(0.0, f64::NAN, "r", "z")),
        Err(crate::domain::GeoError::InvalidCoordinates { .. })
    ));
    assert_eq!(h.chain.topology_snapshot().total_nodes, 0);
}

#[tokio::test]
async fn test_reregistration_refreshes_last_seen() {
    let h = harness();
    h.chain.register_node(1, loc(0.0, 0.0, "r", "z")).unwrap();
    let first = h.chain.topology_snapshot().nodes[0].last_seen;

    h.clock.advance(chrono::Duration::seconds(30));
    h.chain.register_node(1, loc(1.0, 1.0, "r", "z")).unwrap();

    let node = &h.chain.topology_snapshot().nodes[0];
    assert_eq!(node.last_seen, first + chrono::Duration::seconds(30));
    assert_eq!(node.location.latitude, 1.0);
}

// === Leader selection ===

#[tokio::test]
async fn test_selection_outcomes() {
    let h = harness();
    h.chain.register_node(1, loc(10.0, 10.0, "r", "z")).unwrap();

    assert_eq!(h.chain.select_optimal_leader(&[]), Election::NoCandidates);
    assert_eq!(h.chain.select_optimal_leader(&[9]), Election::Fallback(9));
    assert_eq!(h.chain.metrics_snapshot().leader_elections, 0);

    let election = h.chain.select_optimal_leader(&[1, 2]);
    assert_eq!(election.leader(), Some(1));
    assert!(election.is_elected());
    assert_eq!(h.chain.metrics_snapshot().leader_elections, 1);

    let snapshot = h.chain.topology_snapshot();
    assert!(snapshot.nodes[0].is_leader);
    assert_eq!(snapshot.region_leaders.get("r"), Some(&1));
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<parking_lot::Mutex<Vec<u8>>>);

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl CapturedLogs {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

#[tokio::test]
async fn test_selection_logs_inside_chain_span() {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::INFO)
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        let span = tracing::info_span!("geo_chain", chain_id = "logged");
        let chain = GeoChain::new(GeoChainDeps {
            chain_id: "logged".to_string(),
            base: Arc::new(InMemoryChain::new()),
            config: GeoConfig::default(),
            schedule: schedule(),
            probe: Arc::new(SimulatedLatencyProbe::without_jitter()),
            time: Arc::new(FixedTimeSource::default()),
            span,
        });
        chain.register_node(1, loc(0.0, 0.0, "r", "z")).unwrap();

        assert_eq!(chain.select_optimal_leader(&[42]), Election::Fallback(42));
        assert!(chain.select_optimal_leader(&[1]).is_elected());
    });

    let text = logs.text();
    let fallback = text
        .lines()
        .find(|line| line.contains("falling back to first"))
        .expect("fallback warning logged");
    assert!(fallback.contains("WARN"), "{fallback}");
    assert!(fallback.contains("fallback=42"), "{fallback}");
    assert!(fallback.contains("chain_id=\"logged\""), "{fallback}");

    let elected = text
        .lines()
        .find(|line| line.contains("Leader elected"))
        .expect("election logged");
    assert!(elected.contains("INFO") && elected.contains("leader=1"), "{elected}");
}

#[tokio::test]
async fn test_leader_flag_is_exclusive() {
    let h = harness();
    for id in 1..=5 {
        h.chain
            .register_node(id, loc(id as f64, 0.0, "r", "z"))
            .unwrap();
    }

    h.chain.select_optimal_leader(&[1, 2, 3]);
    h.chain.select_optimal_leader(&[4, 5]);

    let snapshot = h.chain.topology_snapshot();
    let leaders: Vec<_> = snapshot.nodes.iter().filter(|n| n.is_leader).collect();
    assert_eq!(leaders.len(), 1);
    assert!(leaders[0].node_id == 4 || leaders[0].node_id == 5);
}

#[tokio::test]
async fn test_stale_node_loses_to_fresh_peer() {
    let h = harness();
    h.chain.register_node(1, loc(0.0, 0.0, "r", "z")).unwrap();
    h.chain.register_node(2, loc(0.0, 0.0, "r", "z")).unwrap();

    // identical scores, lowest id wins
    assert_eq!(h.chain.select_optimal_leader(&[2, 1]).leader(), Some(1));

    h.clock.advance(chrono::Duration::minutes(2));
    h.chain.register_node(2, loc(0.0, 0.0, "r", "z")).unwrap();
    assert_eq!(h.chain.select_optimal_leader(&[1, 2]).leader(), Some(2));
}

#[tokio::test]
async fn test_staleness_ignored_without_load_balancing() {
    let h = harness_with(GeoConfig {
        load_balance_enabled: false,
        ..GeoConfig::default()
    });
    h.chain.register_node(1, loc(0.0, 0.0, "r", "z")).unwrap();
    h.chain.register_node(2, loc(0.0, 0.0, "r", "z")).unwrap();

    h.clock.advance(chrono::Duration::minutes(2));
    h.chain.register_node(2, loc(0.0, 0.0, "r", "z")).unwrap();
    assert_eq!(h.chain.select_optimal_leader(&[1, 2]).leader(), Some(1));
}

#[tokio::test]
async fn test_elect_leader_advises_base_chain() {
    let h = harness();
    h.base.start().await.unwrap();
    h.chain.register_node(7, loc(0.0, 0.0, "r", "z")).unwrap();

    let election = h.chain.elect_leader(&[7]).await.unwrap();
    assert_eq!(election.leader(), Some(7));
    assert_eq!(h.base.leader_hint(), Some(7));

    // fallback and empty results are not forwarded
    h.chain.elect_leader(&[99]).await.unwrap();
    h.chain.elect_leader(&[]).await.unwrap();
    assert_eq!(h.base.leader_hint(), Some(7));
}

#[tokio::test]
async fn test_elect_leader_surfaces_base_error() {
    let h = harness();
    h.chain.register_node(7, loc(0.0, 0.0, "r", "z")).unwrap();

    let result = h.chain.elect_leader(&[7]).await;
    assert_eq!(result, Err(ChainError::NotStarted));
    // the geo view is still updated
    assert!(h.chain.topology_snapshot().nodes[0].is_leader);
}

// === ReplicatedChain delegation ===

#[tokio::test]
async fn test_order_counts_successful_transactions() {
    let h = harness();
    assert_eq!(h.chain.order(vec![1]).await, Err(ChainError::NotStarted));
    assert_eq!(h.chain.metrics_snapshot().total_transactions, 0);

    h.chain.start().await.unwrap();
    for i in 0..3u8 {
        h.chain.order(vec![i]).await.unwrap();
    }
    h.chain.configure(vec![]).await.unwrap();
    h.chain.record_transactions(10);

    assert_eq!(h.base.ordered_count(), 3);
    assert_eq!(h.base.config_updates(), 1);
    assert_eq!(h.chain.metrics_snapshot().total_transactions, 13);
}

#[tokio::test]
async fn test_transfer_leadership_goes_through_selection() {
    let h = harness();
    h.chain.start().await.unwrap();
    h.chain.register_node(3, loc(0.0, 0.0, "r", "z")).unwrap();

    h.chain.transfer_leadership(42).await.unwrap();
    assert_eq!(h.base.leader_hint(), None);

    h.chain.transfer_leadership(3).await.unwrap();
    assert_eq!(h.base.leader_hint(), Some(3));
    assert_eq!(h.chain.metrics_snapshot().leader_elections, 1);
}

#[tokio::test]
async fn test_halt_stops_base_and_tasks() {
    let h = harness();
    h.chain.start().await.unwrap();
    h.chain.halt().await;

    assert!(h.chain.is_errored());
    assert!(h.chain.is_shut_down());
    assert_eq!(h.chain.order(vec![1]).await, Err(ChainError::Halted));
}

// === Periodic tasks ===

#[tokio::test(start_paused = true)]
async fn test_network_task_fills_latency_maps() {
    let h = harness();
    h.chain.register_node(1, loc(37.7749, -122.4194, "us-west", "a")).unwrap();
    h.chain.register_node(2, loc(40.7128, -74.0060, "us-east", "b")).unwrap();

    tokio::time::sleep(Duration::from_secs(29)).await;
    assert!(h.chain.metrics_snapshot().region_latencies.is_empty());

    tokio::time::sleep(Duration::from_secs(2)).await;
    let metrics = h.chain.metrics_snapshot();
    assert_eq!(metrics.cross_region_messages, 2);
    assert!(metrics.region_latencies.contains_key("us-west-us-east"));
    assert!(metrics.avg_latency > Duration::from_millis(400));

    let snapshot = h.chain.topology_snapshot();
    assert_eq!(snapshot.nodes[0].latency.len(), 1);
    assert_eq!(snapshot.nodes[1].latency.len(), 1);

    h.chain.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_zero_network_period_keeps_refreshing() {
    let chain = GeoChain::new(GeoChainDeps {
        chain_id: "zero-period".to_string(),
        base: Arc::new(InMemoryChain::new()),
        config: GeoConfig::default(),
        schedule: TaskSchedule {
            network_refresh: Duration::ZERO,
            ..schedule()
        },
        probe: Arc::new(SimulatedLatencyProbe::without_jitter()),
        time: Arc::new(FixedTimeSource::default()),
        span: Span::none(),
    });
    chain.register_node(1, loc(0.0, 0.0, "a", "a-1")).unwrap();
    chain.register_node(2, loc(0.0, 1.0, "b", "b-1")).unwrap();

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(chain.metrics_snapshot().cross_region_messages >= 2);
    chain.shutdown().await;
    assert!(chain.is_shut_down());
}

#[tokio::test(start_paused = true)]
async fn test_lone_node_stays_fresh_across_ticks() {
    let h = harness();
    h.chain.register_node(1, loc(0.0, 0.0, "r", "z")).unwrap();

    for _ in 0..10 {
        h.clock.advance(chrono::Duration::seconds(30));
        tokio::time::sleep(Duration::from_secs(30)).await;
    }
    let snapshot = h.chain.topology_snapshot();
    assert_eq!(snapshot.nodes[0].last_seen, h.clock.now());

    // a newcomer at the same spot ties, and the lowest id keeps winning
    h.chain.register_node(2, loc(0.0, 0.0, "r", "z")).unwrap();
    assert_eq!(h.chain.select_optimal_leader(&[2, 1]).leader(), Some(1));

    h.chain.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_throughput_task_baseline_then_rate() {
    let h = harness();
    h.chain.record_transactions(100);

    // first tick at 10s only sets the baseline
    tokio::time::sleep(Duration::from_secs(15)).await;
    assert_eq!(h.chain.metrics_snapshot().throughput_per_second, 0.0);

    h.chain.record_transactions(50);
    tokio::time::sleep(Duration::from_secs(10)).await;
    let tps = h.chain.metrics_snapshot().throughput_per_second;
    assert!((tps - 5.0).abs() < 1e-6, "tps {tps}");

    h.chain.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_no_ticks_after_shutdown() {
    let h = harness();
    h.chain.register_node(1, loc(0.0, 0.0, "a", "z")).unwrap();
    h.chain.register_node(2, loc(0.0, 1.0, "b", "z")).unwrap();

    h.chain.shutdown().await;
    h.chain.shutdown().await;
    assert!(h.chain.is_shut_down());

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(h.chain.metrics_snapshot().cross_region_messages, 0);
}

#[tokio::test]
async fn test_manual_network_refresh() {
    let h = harness();
    // p and q shared by both region pairings, no jitter
    h.chain.register_node(1, loc(10.0, 10.0, "r1", "z")).unwrap();
    h.chain.register_node(2, loc(20.0, 30.0, "r1", "z")).unwrap();
    h.chain.register_node(3, loc(10.0, 10.0, "r2", "z")).unwrap();
    h.chain.register_node(4, loc(20.0, 30.0, "r3", "z")).unwrap();

    let refresh = h.chain.refresh_network_metrics();
    assert_eq!(refresh.samples, 12);

    let metrics = h.chain.metrics_snapshot();
    assert_eq!(
        metrics.region_latencies["r1-r1"],
        metrics.region_latencies["r2-r3"] / 2
    );
}

#[tokio::test]
async fn test_snapshots_are_detached() {
    let h = harness();
    h.chain.register_node(1, loc(0.0, 0.0, "r", "z")).unwrap();
    let metrics = h.chain.metrics_snapshot();
    let topology = h.chain.topology_snapshot();

    h.chain.register_node(2, loc(0.0, 1.0, "r", "z")).unwrap();
    h.chain.record_transactions(5);
    h.chain.refresh_network_metrics();

    assert_eq!(metrics.total_transactions, 0);
    assert!(metrics.region_latencies.is_empty());
    assert_eq!(topology.total_nodes, 1);
    assert!(topology.nodes[0].latency.is_empty());
}
