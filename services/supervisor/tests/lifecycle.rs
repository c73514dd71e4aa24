use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use supervisor::config::{GlobalConfig, NodeConfig, ProgramSpec, SupervisorConfig};
use supervisor::Supervisor;

fn sleeper(secs: &str) -> ProgramSpec {
    ProgramSpec {
        program: "sleep".to_owned(),
        args: vec![secs.to_owned()],
    }
}

#[tokio::test]
async fn shuts_down_all_children_when_duration_expires() {
    let mut nodes = std::collections::BTreeMap::new();
    nodes.insert(
        "node-a".to_owned(),
        NodeConfig {
            forwarder: sleeper("30"),
            file_logger: Some(sleeper("30")),
        },
    );
    let config = SupervisorConfig {
        global: GlobalConfig {
            stream_writer: sleeper("30"),
            aggregator: sleeper("30"),
            data_source: None,
            duration_secs: None,
        },
        nodes,
    };

    let supervisor = Supervisor::start(&config).await.unwrap();
    let shutdown = Arc::new(AtomicBool::new(false));
    let results = tokio::time::timeout(Duration::from_secs(10), supervisor.run(shutdown, Some(Duration::from_millis(50))))
        .await
        .expect("supervisor should shut down promptly once the duration expires");

    assert_eq!(results.len(), 4);
    for (_program, status) in results {
        assert_ne!(status, Some(0), "a SIGTERM-killed sleep should not report a clean exit code");
    }
}

#[tokio::test]
async fn a_child_exiting_early_ends_supervision() {
    let config = SupervisorConfig {
        global: GlobalConfig {
            stream_writer: sleeper("30"),
            aggregator: sleeper("30"),
            data_source: Some(ProgramSpec {
                program: "true".to_owned(),
                args: vec![],
            }),
            duration_secs: None,
        },
        nodes: std::collections::BTreeMap::new(),
    };

    let supervisor = Supervisor::start(&config).await.unwrap();
    let shutdown = Arc::new(AtomicBool::new(false));
    let results = tokio::time::timeout(Duration::from_secs(10), supervisor.run(shutdown, None))
        .await
        .expect("the first poll tick fires immediately, so a dead child is noticed right away");

    assert_eq!(results.len(), 2);
}
