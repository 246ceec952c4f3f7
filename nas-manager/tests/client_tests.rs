//! TrueNAS client against a mock API server.

use chrono::{TimeDelta, Utc};
use nas_manager::config::TrueNasConfig;
use nas_manager::models::{CreateDatasetRequest, JobHandle, TaskState, UpdateDatasetRequest};
use nas_manager::services::retention::{apply_retention, RetentionPolicy};
use nas_manager::services::retry::{RetryController, RetryPolicy};
use nas_manager::{NasError, TrueNasClient};
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API: &str = "/api/v2.0";

fn client_for(server: &MockServer) -> TrueNasClient {
    TrueNasClient::new(&TrueNasConfig {
        host: server.uri(),
        api_key: "test-key".to_string(),
        ..Default::default()
    })
    .unwrap()
}

fn snapshot_json(id: &str, age: TimeDelta, used: u64) -> Value {
    let created = Utc::now() - age;
    json!({
        "id": id,
        "name": id,
        "properties": {
            "creation": {"parsed": {"$date": created.timestamp_millis()}},
            "used": {"parsed": used}
        }
    })
}

fn replication_json(id: u64, name: &str, state: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "enabled": true,
        "source_datasets": ["tank/data"],
        "target_dataset": "backup/data",
        "state": {"state": state, "datetime": {"$date": 1_700_000_000_000i64}}
    })
}

#[tokio::test]
async fn test_snapshots_sends_bearer_and_filters_dataset() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/zfs/snapshot", API)))
        .and(header("Authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            snapshot_json("tank/data@a", TimeDelta::minutes(5), 1024),
            snapshot_json("tank/other@b", TimeDelta::minutes(5), 0),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let snaps = client_for(&server).snapshots(Some("tank/data")).await.unwrap();

    assert_eq!(snaps.len(), 1);
    assert_eq!(snaps[0].id, "tank/data@a");
    assert_eq!(snaps[0].name, "a");
    assert_eq!(snaps[0].used_bytes, 1024);
    assert!(snaps[0].created_at.is_some());
}

#[tokio::test]
async fn test_delete_snapshot_encodes_id() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(format!("{}/zfs/snapshot/id/tank%2Fdata%40old", API)))
        .and(query_param("defer", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(true))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .delete_snapshot("tank/data@old", true)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_rollback_sends_force_flag() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{}/zfs/snapshot/id/tank%2Fdata%40a/rollback", API)))
        .and(body_json(json!({"force": true})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .rollback_snapshot("tank/data@a", true)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_run_replication_returns_job_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{}/replication/id/4/run", API)))
        .respond_with(ResponseTemplate::new(200).set_body_json(1234))
        .mount(&server)
        .await;

    let job = client_for(&server).run_replication(4).await.unwrap();

    assert_eq!(job, JobHandle(1234));
}

#[tokio::test]
async fn test_replication_task_parses_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/replication/id/2", API)))
        .respond_with(ResponseTemplate::new(200).set_body_json(replication_json(2, "offsite", "ERROR")))
        .mount(&server)
        .await;

    let task = client_for(&server).replication_task(2).await.unwrap();

    assert_eq!(task.name, "offsite");
    assert_eq!(task.state, TaskState::Error);
    assert_eq!(task.last_run_at.unwrap().timestamp(), 1_700_000_000);
    assert_eq!(task.target_dataset.as_deref(), Some("backup/data"));
}

#[tokio::test]
async fn test_bandwidth_limit_puts_speed_limit() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(format!("{}/replication/id/3", API)))
        .and(body_json(json!({"speed_limit": null})))
        .respond_with(ResponseTemplate::new(200).set_body_json(replication_json(3, "t", "SUCCESS")))
        .expect(1)
        .mount(&server)
        .await;

    let task = client_for(&server).set_bandwidth_limit(3, None).await.unwrap();

    assert_eq!(task.id, 3);
    assert_eq!(task.speed_limit, None);
}

#[tokio::test]
async fn test_error_status_maps_to_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/replication", API)))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "middleware down"})))
        .mount(&server)
        .await;

    let err = client_for(&server).replication_tasks().await.unwrap_err();

    match err {
        NasError::Api { status, endpoint, message } => {
            assert_eq!(status, 500);
            assert_eq!(endpoint, "replication");
            assert_eq!(message, "middleware down");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_resource_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/replication/id/99", API)))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client_for(&server).replication_task(99).await.unwrap_err();

    assert!(matches!(err, NasError::NotFound(_)));
    assert!(err.is_remote());
}

#[tokio::test]
async fn test_garbage_body_is_serialization_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/pool", API)))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = client_for(&server).pools().await.unwrap_err();

    assert!(matches!(err, NasError::Serialization(_)));
}

#[tokio::test]
async fn test_retention_deletes_through_client() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/zfs/snapshot", API)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            snapshot_json("tank/data@new", TimeDelta::minutes(10), 0),
            snapshot_json("tank/data@mid", TimeDelta::minutes(30), 0),
            snapshot_json("tank/data@old", TimeDelta::days(3), 0),
        ])))
        .mount(&server)
        .await;
    for (id, calls) in [("new", 0), ("mid", 1), ("old", 1)] {
        Mock::given(method("DELETE"))
            .and(path(format!("{}/zfs/snapshot/id/tank%2Fdata%40{}", API, id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(true))
            .expect(calls)
            .mount(&server)
            .await;
    }

    let client = client_for(&server);
    let policy = RetentionPolicy {
        hourly: Some(1),
        ..Default::default()
    };
    let report = apply_retention(&client, "tank/data", &policy, Utc::now(), false)
        .await
        .unwrap();

    assert_eq!(report.decision.kept.len(), 1);
    assert_eq!(report.decision.kept[0].name, "new");
    assert_eq!(report.deleted_count(), 2);
    assert_eq!(report.message(), "Deleted 2 snapshots, kept 1");
}

#[tokio::test]
async fn test_retry_failed_through_client() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/replication", API)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            replication_json(1, "nightly", "ERROR"),
            replication_json(2, "hourly", "SUCCESS"),
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{}/replication/id/1/run", API)))
        .respond_with(ResponseTemplate::new(200).set_body_json(77))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/replication/id/1", API)))
        .respond_with(ResponseTemplate::new(200).set_body_json(replication_json(1, "nightly", "SUCCESS")))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let policy = RetryPolicy {
        max_retries: 2,
        retry_delay: Duration::from_millis(10),
        poll_interval: Duration::from_millis(10),
        wait_timeout: Duration::from_secs(5),
        concurrency: 1,
    };
    let outcome = RetryController::new(&client, policy)
        .unwrap()
        .retry_failed()
        .await
        .unwrap();

    assert_eq!(outcome.total_failed, 1);
    assert_eq!(outcome.succeeded, vec!["nightly".to_string()]);
    assert!(outcome.still_failed.is_empty());
    assert_eq!(outcome.reports[0].attempts, 1);
}

fn dataset_json(name: &str, used: u64) -> Value {
    json!({
        "id": name,
        "name": name,
        "pool": name.split('/').next().unwrap(),
        "type": "FILESYSTEM",
        "used": {"parsed": used, "rawvalue": used.to_string()},
        "available": {"parsed": 1u64 << 30},
        "compression": {"value": "LZ4"}
    })
}

#[tokio::test]
async fn test_datasets_filtered_by_pool() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/pool/dataset", API)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            dataset_json("tank", 0),
            dataset_json("tank/media", 2048),
            dataset_json("tank2/media", 10),
        ])))
        .mount(&server)
        .await;

    let datasets = client_for(&server).datasets(Some("tank")).await.unwrap();

    let names: Vec<&str> = datasets.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, ["tank", "tank/media"]);
    assert_eq!(datasets[1].used_bytes, 2048);
    assert_eq!(datasets[1].compression.as_deref(), Some("LZ4"));
}

#[tokio::test]
async fn test_create_dataset_posts_properties() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{}/pool/dataset", API)))
        .and(body_json(json!({"name": "tank/new", "compression": "zstd", "quota": 1u64 << 30})))
        .respond_with(ResponseTemplate::new(200).set_body_json(dataset_json("tank/new", 0)))
        .expect(1)
        .mount(&server)
        .await;

    let ds = client_for(&server)
        .create_dataset(&CreateDatasetRequest {
            name: "tank/new".to_string(),
            compression: Some("zstd".to_string()),
            quota: Some(1 << 30),
        })
        .await
        .unwrap();

    assert_eq!(ds.name, "tank/new");
    assert_eq!(ds.pool, "tank");
}

#[tokio::test]
async fn test_delete_dataset_recursive() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(format!("{}/pool/dataset/id/tank%2Fold", API)))
        .and(query_param("recursive", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(true))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server).delete_dataset("tank/old", true).await.unwrap();
}

#[tokio::test]
async fn test_update_dataset_sends_only_changes() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(format!("{}/pool/dataset/id/tank%2Fmedia", API)))
        .and(body_json(json!({"compression": "ZSTD"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(dataset_json("tank/media", 0)))
        .expect(1)
        .mount(&server)
        .await;

    let changes = UpdateDatasetRequest {
        compression: Some("ZSTD".to_string()),
        ..Default::default()
    };
    client_for(&server).update_dataset("tank/media", &changes).await.unwrap();
}

#[tokio::test]
async fn test_pool_status_by_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/pool", API)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "tank", "status": "ONLINE", "size": 1000, "allocated": 900, "healthy": true},
            {"name": "fast", "status": "DEGRADED", "size": 100, "allocated": 10, "healthy": false}
        ])))
        .mount(&server)
        .await;
    let client = client_for(&server);

    let pool = client.pool("fast").await.unwrap();
    assert_eq!(pool.status, "DEGRADED");
    assert!(!pool.healthy);

    let err = client.pool("missing").await.unwrap_err();
    assert!(matches!(err, NasError::NotFound(_)));
}

#[tokio::test]
async fn test_health_endpoints() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/alert/list", API)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"level": "WARNING", "klass": "SMART", "formatted": "sda: 8 reallocated sectors", "dismissed": false}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/service", API)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "service": "ssh", "state": "RUNNING", "enable": true},
            {"id": 2, "service": "nfs", "state": "STOPPED", "enable": false}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/disk", API)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "sda", "model": "WDC WD40", "serial": "WD-1", "size": 4_000_787_030_016u64, "type": "HDD"}
        ])))
        .mount(&server)
        .await;
    let client = client_for(&server);

    let alerts = client.alerts().await.unwrap();
    assert_eq!(alerts[0].klass, "SMART");

    let services = client.services().await.unwrap();
    assert!(services[0].is_running());
    assert!(!services[1].is_running());
    assert!(!services[1].enable);

    let disks = client.disks().await.unwrap();
    assert_eq!(disks[0].kind.as_deref(), Some("HDD"));
    assert_eq!(disks[0].size, 4_000_787_030_016);
}
