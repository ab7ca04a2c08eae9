//! Route-level tests against a scripted toolchain.

use std::time::Duration;

use axum_test::TestServer;
use serde_json::{Value, json};
use tempfile::TempDir;

use mintforge_server::config::{Config, ServerConfig, ToolchainConfig};
use mintforge_server::routes::create_router;
use mintforge_server::state::build_state;

const SENTINEL_SCRIPT: &str = r#"printf '%s' '{
    "address": "0xabc",
    "tx_hash": "0xdef",
    "deployer_address": "0x123",
    "network": "sepolia"
}' > "$MINTFORGE_OUTPUT_FILE""#;

fn fixture() -> (TestServer, TempDir) {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("ERC20__burnable_pausable.json"),
        serde_json::to_vec(&json!({ "abi": [], "bytecode": "0x6001" })).unwrap(),
    )
    .unwrap();

    let config = Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        artifacts_dir: dir.path().to_path_buf(),
        toolchain: ToolchainConfig {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), SENTINEL_SCRIPT.to_string()],
            timeout: Duration::from_secs(10),
        },
        default_network: "sepolia".to_string(),
        registrar: None,
    };

    let server = TestServer::new(create_router(build_state(&config))).unwrap();
    (server, dir)
}

#[tokio::test]
async fn health_is_ok() {
    let (server, _dir) = fixture();
    let response = server.get("/health").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn unknown_token_kind_is_rejected() {
    let (server, _dir) = fixture();
    let response = server
        .post("/api/deployments")
        .json(&json!({ "kind": "ERC4626", "modules": [] }))
        .await;
    response.assert_status_bad_request();
}

#[tokio::test]
async fn incompatible_modules_are_rejected_before_artifact_lookup() {
    let (server, _dir) = fixture();
    let response = server
        .post("/api/deployments")
        .json(&json!({ "kind": "ERC721", "modules": ["capped"] }))
        .await;
    response.assert_status_bad_request();
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("capped"));
}

#[tokio::test]
async fn missing_prebuilt_artifact_is_not_found() {
    let (server, _dir) = fixture();
    // Valid combination, but no build output exists for it on disk.
    let response = server
        .post("/api/deployments")
        .json(&json!({ "kind": "ERC20", "modules": ["mintable"] }))
        .await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn verification_without_registrar_is_rejected() {
    let (server, _dir) = fixture();
    let response = server
        .post("/api/verifications")
        .json(&json!({ "address": "0xabc", "artifact_key": "ERC20__burnable_pausable" }))
        .await;
    response.assert_status_bad_request();
}

#[tokio::test]
async fn deployment_flows_from_accepted_to_succeeded() {
    let (server, _dir) = fixture();

    let created = server
        .post("/api/deployments")
        .json(&json!({
            "kind": "erc20",
            "modules": ["Pausable", " burnable "],
            "constructor_args": ["Forge", "FRG"],
        }))
        .await;
    created.assert_status(axum::http::StatusCode::ACCEPTED);

    let record: Value = created.json();
    assert_eq!(record["status"], "queued");
    assert_eq!(
        record["spec"]["artifact_key"],
        "ERC20__burnable_pausable"
    );
    let id = record["id"].as_str().unwrap().to_string();

    let done = server
        .get(&format!("/api/jobs/{id}/wait"))
        .add_query_param("timeout_ms", 10_000u64)
        .add_query_param("poll_ms", 20u64)
        .await;
    done.assert_status_ok();
    let done: Value = done.json();
    assert_eq!(done["status"], "succeeded");
    assert_eq!(done["result"]["address"], "0xabc");
    assert_eq!(done["result"]["network"], "sepolia");
    assert!(done["error"].is_null());

    let listed: Value = server.get("/api/jobs").await.json();
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["id"].as_str().unwrap(), id);
}

#[tokio::test]
async fn unknown_job_id_is_not_found() {
    let (server, _dir) = fixture();
    let response = server
        .get("/api/jobs/00000000-0000-7000-8000-000000000000")
        .await;
    response.assert_status_not_found();
}
