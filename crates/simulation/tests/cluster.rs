//! Whole-cluster scenarios over the in-memory bus.

use netsim_messages::{encode, Enumerated};
use netsim_network::Transport;
use netsim_simulation::{Circuit, Cluster, Coordinator, CoordinatorConfig, CoordinatorError, DeviceSpec};
use netsim_test_helpers::circuits;
use netsim_types::{Moment, NetId, NodeName, Signal, UnitId};
use std::time::Duration;
use tracing_test::traced_test;

fn net(id: &str) -> NetId {
    NetId::new(id)
}

fn node(name: &str) -> NodeName {
    NodeName::new(name)
}

fn fast_config() -> CoordinatorConfig {
    CoordinatorConfig::default()
        .with_phase_timeout(Duration::from_millis(100))
        .with_max_retries(1)
        .with_discovery_timeout(Duration::from_millis(200))
}

async fn cluster_for(text: &str, nodes: usize) -> Cluster {
    let circuit = Circuit::from_toml(text).unwrap();
    Cluster::for_circuit(&circuit, nodes, fast_config())
        .await
        .unwrap()
}

#[tokio::test]
#[traced_test]
async fn test_and_gate_on_one_node() {
    let mut cluster = cluster_for(circuits::AND_GATE, 1).await;
    let report = cluster
        .coordinator_mut()
        .run_until(Moment(0))
        .await
        .unwrap();
    assert_eq!(report.moments, 1);

    let coordinator = cluster.coordinator();
    assert_eq!(coordinator.value(&net("C")), Signal::One);
    assert_eq!(
        coordinator.waveform().trace(&net("C")),
        &[(Moment(0), Signal::One)]
    );
    assert_eq!(coordinator.waveform().last_value(&net("A")), Signal::One);
    assert_eq!(coordinator.pending_events(), 0);
    assert!(logs_contain("Moment settled"));

    let nodes = cluster.shutdown().await.unwrap();
    assert_eq!(nodes.len(), 1);
}

#[tokio::test]
async fn test_split_chain_crosses_nodes() {
    let mut cluster = cluster_for(circuits::SPLIT_CHAIN, 2).await;
    assert_eq!(
        cluster.coordinator().placement(&UnitId::new("g2")),
        Some(&node("node-1"))
    );

    cluster
        .coordinator_mut()
        .run_until(Moment(10))
        .await
        .unwrap();
    let waveform = cluster.coordinator().waveform();
    assert_eq!(waveform.value_at(&net("C"), Moment(0)), Signal::One);
    assert_eq!(waveform.value_at(&net("D"), Moment(0)), Signal::Zero);
    assert_eq!(waveform.value_at(&net("C"), Moment(5)), Signal::Zero);
    assert_eq!(waveform.value_at(&net("D"), Moment(5)), Signal::One);

    // Fan-out of C from node-0 reached node-1 only.
    assert!(cluster.bus().stats().net_deliveries > 0);
    assert_eq!(
        cluster.bus().subscribers(&net("C")),
        [node("node-1")].into_iter().collect()
    );
}

#[tokio::test]
async fn test_half_adder_truth_table_across_nodes() {
    let mut cluster = cluster_for(circuits::HALF_ADDER, 2).await;
    assert_ne!(
        cluster.coordinator().placement(&UnitId::new("sum")),
        cluster.coordinator().placement(&UnitId::new("carry"))
    );
    cluster
        .coordinator_mut()
        .run_until(Moment(40))
        .await
        .unwrap();

    let waveform = cluster.coordinator().waveform();
    let expected = [
        (0, Signal::Zero, Signal::Zero),
        (10, Signal::One, Signal::Zero),
        (20, Signal::One, Signal::Zero),
        (30, Signal::Zero, Signal::One),
    ];
    for (at, sum, carry) in expected {
        assert_eq!(waveform.value_at(&net("S"), Moment(at)), sum, "S at {at}");
        assert_eq!(waveform.value_at(&net("C"), Moment(at)), carry, "C at {at}");
    }
}

#[tokio::test]
async fn test_wired_conflict_resolves_unknown() {
    let mut cluster = cluster_for(circuits::WIRED_CONFLICT, 2).await;
    cluster
        .coordinator_mut()
        .run_until(Moment(0))
        .await
        .unwrap();

    let coordinator = cluster.coordinator();
    let contributions = coordinator.contributions(&net("Y"));
    assert_eq!(contributions.get(&node("node-0")), Some(&Signal::One));
    assert_eq!(contributions.get(&node("node-1")), Some(&Signal::Zero));
    assert_eq!(coordinator.value(&net("Y")), Signal::Unknown);
    // node-0 sees the conflict through node-1's fan-out.
    assert_eq!(coordinator.value(&net("Z")), Signal::Unknown);
}

#[tokio::test]
async fn test_latch_follows_then_holds_then_clears() {
    let mut cluster = cluster_for(circuits::LATCH, 1).await;
    cluster
        .coordinator_mut()
        .run_until(Moment(30))
        .await
        .unwrap();

    let waveform = cluster.coordinator().waveform();
    assert_eq!(waveform.value_at(&net("Q"), Moment(0)), Signal::One);
    assert_eq!(waveform.value_at(&net("QN"), Moment(0)), Signal::Zero);
    assert_eq!(waveform.value_at(&net("Q"), Moment(10)), Signal::One);
    assert_eq!(waveform.value_at(&net("Q"), Moment(20)), Signal::One);
    assert_eq!(waveform.value_at(&net("Q"), Moment(30)), Signal::Zero);
    assert_eq!(waveform.value_at(&net("QN"), Moment(30)), Signal::One);
}

#[tokio::test]
#[traced_test]
async fn test_oscillation_hits_delta_limit() {
    // A NAND gate feeding itself oscillates once enabled.
    let text = r#"
        [[devices]]
        type = "nand2"
        unit = "ring"
        pins = { a = "EN", b = "R", q = "R" }

        [[stimulus]]
        at = 0
        net = "EN"
        value = "0"

        [[stimulus]]
        at = 5
        net = "EN"
        value = "1"
    "#;
    let circuit = Circuit::from_toml(text).unwrap();
    let mut cluster = Cluster::for_circuit(&circuit, 1, fast_config().with_max_delta_rounds(16))
        .await
        .unwrap();

    let err = cluster
        .coordinator_mut()
        .run_until(Moment(10))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        CoordinatorError::DeltaCycleLimit {
            moment: Moment(5),
            rounds: 16
        }
    );
    assert_eq!(
        cluster.coordinator().waveform().value_at(&net("R"), Moment(0)),
        Signal::One
    );
    assert!(logs_contain("Moment did not settle"));
}

#[tokio::test]
#[traced_test]
async fn test_silent_node_is_reported_unresponsive() {
    let bus = netsim_network::MemoryBus::new();
    let discovery = bus.subscribe_discovery();
    // Registered but never answers.
    let _ghost = bus.register_node(node("ghost")).unwrap();
    bus.announce(encode(&Enumerated::new(node("ghost"), 1)).unwrap());

    let catalog = netsim_models::builtin_catalog().unwrap();
    let mut coordinator = Coordinator::new(bus.clone(), discovery, catalog, fast_config());
    assert_eq!(coordinator.discover(Some(1)).await.unwrap(), vec![node("ghost")]);

    let device = DeviceSpec::new("not", UnitId::new("inv")).with_pin("a", "A");
    let err = coordinator.install(&device).await.unwrap_err();
    assert_eq!(
        err,
        CoordinatorError::NodeUnresponsive {
            node: node("ghost"),
            phase: "install_model",
            moment: None,
            attempts: 2,
        }
    );
    assert!(coordinator.placement(&UnitId::new("inv")).is_none());
    assert!(logs_contain("Request timed out"));
    assert_eq!(bus.stats().requests, 2);
}

#[tokio::test]
async fn test_aborted_node_fails_the_phase() {
    let mut cluster = cluster_for(circuits::SPLIT_CHAIN, 2).await;
    assert!(cluster.abort_node(&node("node-1")));
    tokio::time::sleep(Duration::from_millis(20)).await;

    let err = cluster
        .coordinator_mut()
        .run_until(Moment(0))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CoordinatorError::NodeUnresponsive { ref node, .. } if *node == NodeName::new("node-1")
    ));

    let nodes = cluster.shutdown().await.unwrap();
    assert_eq!(nodes.len(), 1);
}

#[tokio::test]
async fn test_install_validation_happens_before_sending() {
    let mut cluster = Cluster::with_nodes(2, fast_config()).await.unwrap();
    let coordinator = cluster.coordinator_mut();

    let unknown = DeviceSpec::new("tachyon", UnitId::new("t"));
    assert!(matches!(
        coordinator.install(&unknown).await,
        Err(CoordinatorError::Netlist(_))
    ));

    let bad_pin = DeviceSpec::new("and2", UnitId::new("g")).with_pin("z", "Z");
    assert!(matches!(
        coordinator.install(&bad_pin).await,
        Err(CoordinatorError::Netlist(_))
    ));

    let misplaced = DeviceSpec::new("and2", UnitId::new("g")).with_node(node("node-9"));
    assert_eq!(
        coordinator.install(&misplaced).await,
        Err(CoordinatorError::UnknownNode(node("node-9")))
    );

    let good = DeviceSpec::new("and2", UnitId::new("g")).with_pin("a", "A");
    assert_eq!(coordinator.install(&good).await.unwrap(), node("node-0"));
    assert_eq!(
        coordinator.install(&good).await,
        Err(CoordinatorError::DuplicateUnit(UnitId::new("g")))
    );
    assert_eq!(cluster.bus().stats().requests, 1);
}

#[tokio::test]
async fn test_reset_replays_and_clear_allows_reinstall() {
    let circuit = Circuit::from_toml(circuits::SPLIT_CHAIN).unwrap();
    let mut cluster = Cluster::for_circuit(&circuit, 2, fast_config())
        .await
        .unwrap();
    let coordinator = cluster.coordinator_mut();
    coordinator.run_until(Moment(10)).await.unwrap();
    assert_eq!(coordinator.value(&net("D")), Signal::One);

    coordinator.reset().unwrap();
    assert!(coordinator.waveform().is_empty());
    assert_eq!(coordinator.current_moment(), None);
    coordinator.initialise().await.unwrap();
    coordinator.run_until(Moment(0)).await.unwrap();
    assert_eq!(coordinator.value(&net("D")), Signal::Zero);

    coordinator.clear().unwrap();
    coordinator.load(&circuit).await.unwrap();
    coordinator.initialise().await.unwrap();
    coordinator.run_until(Moment(10)).await.unwrap();
    assert_eq!(coordinator.waveform().value_at(&net("D"), Moment(5)), Signal::One);

    let nodes = cluster.shutdown().await.unwrap();
    let devices: usize = nodes.iter().map(|n| n.driver().devices().count()).sum();
    assert_eq!(devices, 2);
}
