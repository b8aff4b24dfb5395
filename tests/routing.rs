//! Sticky routing between the admin router, the broker and DNS nodes

mod common;

use common::{free_port, spawn_broker, spawn_node};
use std::fs;
use zonemesh::client::Command;
use zonemesh::common::{BrokerConfig, BrokerPolicy};
use zonemesh::{Error, Router};

fn cmd(line: &str) -> Command {
    Command::parse(line).unwrap()
}

#[tokio::test]
async fn test_domain_stays_on_first_node() {
    let r1 = spawn_node("DNS1", 0, 2).await;
    let r2 = spawn_node("DNS2", 1, 2).await;
    let broker = spawn_broker(
        vec![r1.identity.clone(), r2.identity.clone()],
        BrokerPolicy::RoundRobin,
    )
    .await;

    let mut router = Router::connect(&broker.config).await.unwrap();

    // Round robin: first unseen domain lands on DNS1, second on DNS2.
    let clock = router.execute(&cmd("create a.example.com 1.2.3.4")).await.unwrap();
    assert_eq!(clock.as_slice(), &[1, 0]);
    assert_eq!(router.route("example.com").unwrap().port, r1.identity.port);

    let clock = router.execute(&cmd("create b.other 10.0.0.1")).await.unwrap();
    assert_eq!(clock.as_slice(), &[0, 1]);
    assert_eq!(router.route("other").unwrap().port, r2.identity.port);

    // The broker would now hand out DNS1; the cached route wins.
    let clock = router.execute(&cmd("update b.other ip 10.0.0.2")).await.unwrap();
    assert_eq!(clock.as_slice(), &[0, 2]);
    let clock = router.execute(&cmd("delete b.other")).await.unwrap();
    assert_eq!(clock.as_slice(), &[0, 3]);

    assert!(r1.store.snapshot("other").is_none());
    assert_eq!(r2.store.snapshot("other").unwrap().clock.as_slice(), &[0, 3]);
    assert_eq!(router.route("other").unwrap().clock.as_slice(), &[0, 3]);

    let clock = router.execute(&cmd("update a.example.com ip 5.6.7.8")).await.unwrap();
    assert_eq!(clock.as_slice(), &[2, 0]);
    assert!(r2.store.snapshot("example.com").is_none());
}

#[tokio::test]
async fn test_zone_files_over_the_wire() {
    let r1 = spawn_node("DNS1", 0, 1).await;
    let broker = spawn_broker(vec![r1.identity.clone()], BrokerPolicy::Random).await;
    let mut router = Router::connect(&broker.config).await.unwrap();

    router.execute(&cmd("create a.example.com 1.2.3.4")).await.unwrap();
    router.execute(&cmd("update a.example.com ip 5.6.7.8")).await.unwrap();
    let clock = router.execute(&cmd("delete a.example.com")).await.unwrap();
    assert_eq!(clock.as_slice(), &[3]);

    let snap = r1.store.snapshot("example.com").unwrap();
    assert_eq!(fs::read_to_string(&snap.zone_path).unwrap(), "");
    assert_eq!(
        fs::read_to_string(&snap.log_path).unwrap(),
        "create a.example.com 1.2.3.4\nupdate a.example.com 5.6.7.8\ndelete a.example.com"
    );
    assert_eq!(snap.line_count, 1);
    assert!(snap.name_to_line.is_empty());
}

#[tokio::test]
async fn test_registry_errors_leave_route_untouched() {
    let r1 = spawn_node("DNS1", 0, 1).await;
    let broker = spawn_broker(vec![r1.identity.clone()], BrokerPolicy::Random).await;
    let mut router = Router::connect(&broker.config).await.unwrap();

    router.execute(&cmd("create a.example 10.0.0.1")).await.unwrap();
    let before = router.route("example").cloned().unwrap();

    let err = router.execute(&cmd("update x.example ip 10.0.0.2")).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    assert!(!err.is_fatal());
    assert_eq!(router.route("example"), Some(&before));

    router.execute(&cmd("delete a.example")).await.unwrap();
    let err = router.execute(&cmd("update a.example ip 10.0.0.3")).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    let err = router.execute(&cmd("delete a.example")).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    assert_eq!(router.route("example").unwrap().clock.as_slice(), &[2]);

    let err = router
        .execute(&cmd("create b.example not-an-ip"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
}

#[tokio::test]
async fn test_failed_first_operation_records_no_route() {
    let r1 = spawn_node("DNS1", 0, 1).await;
    let broker = spawn_broker(vec![r1.identity.clone()], BrokerPolicy::Random).await;
    let mut router = Router::connect(&broker.config).await.unwrap();

    let err = router.execute(&cmd("delete a.nowhere")).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    assert!(router.route("nowhere").is_none());
    assert!(router.routes().is_empty());
}

#[tokio::test]
async fn test_unreachable_broker_is_fatal() {
    let config = BrokerConfig {
        id: "broker".into(),
        ip: "127.0.0.1".parse().unwrap(),
        port: free_port(),
    };

    let err = match Router::connect(&config).await {
        Ok(_) => panic!("connected to a broker that is not running"),
        Err(e) => e,
    };
    assert!(matches!(err, Error::ConnectionFailed(_)));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_broker_without_live_nodes() {
    let dead = common::identity("DNS1", free_port());
    let broker = spawn_broker(vec![dead], BrokerPolicy::RoundRobin).await;
    let mut router = Router::connect(&broker.config).await.unwrap();

    let err = router.execute(&cmd("create a.example 10.0.0.1")).await.unwrap_err();
    assert!(matches!(err, Error::NoLiveReplica));
    assert!(router.route("example").is_none());
}
