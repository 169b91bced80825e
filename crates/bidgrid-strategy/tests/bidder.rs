//! End-to-end bidding from a node config.

use std::sync::Arc;
use std::time::Duration;

use bidgrid_core::{InputSource, Job, NetworkMode, NodeConfig, ResourceUsage};
use bidgrid_strategy::{
    BidError, BidRequest, Collaborators, LocalCapacityTracker, build_bidder,
};

const NODE_TOML: &str = r#"
[node]
id = "node-1"

[selection]
locality = "local"
accept_networked_jobs = false
local_sources = [{ storage_type = "ipfs", source = "QmLocal" }]

[timeouts]
min_job_execution_timeout = "1s"
max_job_execution_timeout = "1h"

[capacity.total]
cpu = 4.0
memory = 8192

[capacity.job]
cpu = 2.0
memory = 4096

[capacity.job_defaults]
cpu = 0.5
memory = 256

[providers]
engines = ["docker"]
storages = ["ipfs"]
publishers = ["ipfs"]
"#;

fn config() -> NodeConfig {
    NodeConfig::from_toml_str(NODE_TOML).unwrap()
}

fn job(id: &str) -> Job {
    let mut job = Job {
        id: id.to_string(),
        ..Default::default()
    };
    job.task.engine = "docker".to_string();
    job.task.publisher = "ipfs".to_string();
    job.task.timeout_secs = 600;
    job.task.inputs = vec![InputSource {
        storage_type: "ipfs".to_string(),
        source: "QmLocal".to_string(),
        target: "/inputs".to_string(),
    }];
    job.task.resources = ResourceUsage::new(1.0, 0, 0, 0);
    job
}

#[tokio::test]
async fn eligible_job_gets_a_bid_with_usage() {
    let config = config();
    let bidder = build_bidder(&config, Collaborators::from_config(&config)).unwrap();

    let outcome = bidder
        .run_bidding(&BidRequest::new("node-1", job("job-1")))
        .await
        .unwrap();

    assert!(outcome.response.should_bid);
    assert!(!outcome.response.should_wait);
    assert_eq!(outcome.usage, Some(ResourceUsage::new(1.0, 256, 0, 0)));
}

#[tokio::test]
async fn semantic_rejections() {
    let config = config();
    let bidder = build_bidder(&config, Collaborators::from_config(&config)).unwrap();

    let mut networked = job("job-net");
    networked.task.network = NetworkMode::Http;
    let mut wrong_engine = job("job-wasm");
    wrong_engine.task.engine = "wasm".to_string();
    let mut remote = job("job-remote");
    remote.task.inputs[0].source = "QmRemote".to_string();
    let mut too_long = job("job-long");
    too_long.task.timeout_secs = 7200;

    for job in [networked, wrong_engine, remote, too_long] {
        let id = job.id.clone();
        let outcome = bidder
            .run_bidding(&BidRequest::new("node-1", job))
            .await
            .unwrap();
        assert!(!outcome.response.should_bid, "{id} should be declined");
        assert!(!outcome.response.reason.is_empty(), "{id} needs a reason");
        assert!(outcome.usage.is_none());
    }
}

#[tokio::test]
async fn resource_rejections() {
    let config = config();
    let running = Arc::new(LocalCapacityTracker::new(config.capacity.total));
    let collaborators = Collaborators {
        running: running.clone(),
        ..Collaborators::from_config(&config)
    };
    let bidder = build_bidder(&config, collaborators).unwrap();

    let mut greedy = job("job-greedy");
    greedy.task.resources = ResourceUsage::new(3.0, 0, 0, 0);
    let outcome = bidder
        .run_bidding(&BidRequest::new("node-1", greedy))
        .await
        .unwrap();
    assert!(!outcome.response.should_bid);
    assert!(outcome.response.reason.contains("per-job limit"));

    running.set_available(ResourceUsage::new(0.5, 8192, 0, 0));
    let outcome = bidder
        .run_bidding(&BidRequest::new("node-1", job("job-busy")))
        .await
        .unwrap();
    assert!(!outcome.response.should_bid);
    assert!(outcome.response.reason.contains("available capacity"));
}

#[tokio::test]
async fn waiting_on_no_bid_defers_rejections() {
    let mut config = config();
    config.waiting.wait_on_no_bid = true;
    let bidder = build_bidder(&config, Collaborators::from_config(&config)).unwrap();

    let mut networked = job("job-net");
    networked.task.network = NetworkMode::Full;
    let outcome = bidder
        .run_bidding(&BidRequest::new("node-1", networked))
        .await
        .unwrap();

    assert!(!outcome.response.should_bid);
    assert!(outcome.response.should_wait);

    let outcome = bidder
        .run_bidding(&BidRequest::new("node-1", job("job-ok")))
        .await
        .unwrap();
    assert!(outcome.response.should_bid);
    assert!(!outcome.response.should_wait);
}

#[cfg(unix)]
#[tokio::test]
async fn exec_probe_participates_in_the_chain() {
    let mut config = config();
    config.selection.probe_exec = "echo 'maintenance window' >&2; exit 1".to_string();
    let bidder = build_bidder(&config, Collaborators::from_config(&config)).unwrap();

    let outcome = bidder
        .run_bidding(&BidRequest::new("node-1", job("job-1")))
        .await
        .unwrap();

    assert!(!outcome.response.should_bid);
    assert_eq!(outcome.response.reason, "maintenance window");
}

#[tokio::test]
async fn distance_delay_honours_the_offer_deadline() {
    let mut config = config();
    config.distance.enabled = true;
    config.distance.network_size = 2;
    let bidder = build_bidder(&config, Collaborators::from_config(&config)).unwrap();

    // A job id one chunk away from node-1 on a two-node ring.
    let job_id = (0..10_000)
        .map(|i| format!("job-{i}"))
        .find(|id| {
            let p = bidgrid_strategy::semantic::DistanceDelay::compute("node-1", id, 1, 2);
            !p.delay.is_zero() && !p.too_far()
        })
        .expect("some job lands one chunk away");

    let err = bidder
        .run_bidding_within(
            &BidRequest::new("node-1", job(&job_id)),
            Duration::from_millis(50),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, BidError::DeadlineExceeded { .. }));
}
