//! Scenario: `fops transition` end to end against a mocked backend.
//!
//! GREEN when:
//! - stage details are fetched under the status-resolved menu and their line
//!   items fill an order that arrived without any,
//! - feedback definitions are fetched because the form selects feedback,
//! - `--attach` uploads first and the returned URL lands in the submission,
//! - the receipt (`from=`/`to=`/`backend_status=`/record) is printed,
//! - a 401 on the first call is reported as AUTH_EXPIRED and not retried.

use assert_cmd::prelude::*;
use httpmock::prelude::*;
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use std::path::Path;
use std::process::Command;

fn write(dir: &Path, name: &str, body: &str) -> String {
    let p = dir.join(name);
    fs::write(&p, body).unwrap();
    p.to_string_lossy().into_owned()
}

fn config(dir: &Path, base_url: &str, token_env: &str) -> String {
    write(
        dir,
        "base.yaml",
        &format!(
            "client:\n  base_url: \"{base_url}\"\n  base_delay_ms: 10\nauth:\n  token_env: {token_env}\n"
        ),
    )
}

const PICKUP_WITHOUT_LINES: &str = r#"{
  "kind": "pickup",
  "id": 1001,
  "documentNo": "PU-1001",
  "status": "OPEN",
  "lineItems": []
}"#;

const SIGNED_HAPPY_FORM: &str = r#"{"signature": "iVBORw0KGgo=", "feedback": "happy"}"#;

#[test]
fn transition_fetches_uploads_submits_and_prints_receipt() -> anyhow::Result<()> {
    let server = MockServer::start();
    let token = "tok-cli-happy";

    let details = server.mock(|when, then| {
        when.method(GET)
            .path("/api/stage/details")
            .query_param("orderId", "1001")
            .query_param("stageType", "PICKUP_ORDER")
            .query_param("menuName", "Pickup Order")
            .header("authorization", format!("Bearer {token}"));
        then.status(200).json_body(json!({
            "success": true,
            "data": {
                "definition": {"definitionId": 77, "detailId": 7701, "fileUploadMandatory": true},
                "lineItems": [
                    {"id": 11, "lineNo": 10, "itemCode": "A", "orderedQty": 3, "openQty": 3},
                    {"id": 12, "lineNo": 20, "itemCode": "B", "orderedQty": 1, "openQty": 1}
                ]
            }
        }));
    });
    let feedback = server.mock(|when, then| {
        when.method(GET).path("/api/feedback/definitions");
        then.status(200).json_body(json!({
            "success": true,
            "data": [{"id": 1, "name": "Courtesy"}, {"id": 2, "name": "Timeliness"}]
        }));
    });
    let upload = server.mock(|when, then| {
        when.method(POST)
            .path("/api/files/upload")
            .body_contains("proof.jpg")
            .body_contains("JPEGDATA");
        then.status(200)
            .json_body(json!({"success": true, "data": {"url": "https://files.example.test/u/1.jpg"}}));
    });
    let submit = server.mock(|when, then| {
        when.method(POST)
            .path("/api/stage/submit")
            .header("authorization", format!("Bearer {token}"))
            .body_contains(r#""fileUploadUrl":"https://files.example.test/u/1.jpg""#)
            .body_contains(r#""isFileUploadMandatory":true"#)
            .body_contains(r#""lineId":11"#)
            .body_contains(r#""lineId":12"#)
            .body_contains(r#""feedbackDefinitionId":2"#);
        then.status(200)
            .json_body(json!({"success": true, "data": {"recordId": 991}}));
    });

    let dir = tempfile::tempdir()?;
    let cfg = config(dir.path(), &server.base_url(), "FOPS_CLI_TEST_TOKEN_HAPPY");
    let order = write(dir.path(), "order.json", PICKUP_WITHOUT_LINES);
    let form = write(dir.path(), "form.json", SIGNED_HAPPY_FORM);
    let attach = write(dir.path(), "proof.jpg", "JPEGDATA");

    Command::cargo_bin("fops")?
        .env("FOPS_CLI_TEST_TOKEN_HAPPY", token)
        .args(["transition", "--config", &cfg])
        .args(["--order", &order, "--stage", "picked", "--form", &form])
        .args(["--user", "15", "--vehicle", "8"])
        .args(["--attach", &attach, "--content-type", "image/jpeg"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "file_upload_url=https://files.example.test/u/1.jpg",
        ))
        .stdout(predicate::str::contains("order_id=1001"))
        .stdout(predicate::str::contains("from=picked to=completed"))
        .stdout(predicate::str::contains("menu_name=Pickup Order"))
        .stdout(predicate::str::contains("was_defaulted=false"))
        .stdout(predicate::str::contains("attempts=1"))
        .stdout(predicate::str::contains("backend_status=CLOSED"))
        .stdout(predicate::str::contains("\"recordId\": 991"));

    details.assert_hits(1);
    feedback.assert_hits(1);
    upload.assert_hits(1);
    submit.assert_hits(1);
    Ok(())
}

#[test]
fn rejected_token_reports_auth_expired_without_retry() -> anyhow::Result<()> {
    let server = MockServer::start();
    let details = server.mock(|when, then| {
        when.method(GET).path("/api/stage/details");
        then.status(401).body("token expired");
    });
    let submit = server.mock(|when, then| {
        when.method(POST).path("/api/stage/submit");
        then.status(200).json_body(json!({"success": true}));
    });

    let dir = tempfile::tempdir()?;
    let cfg = config(dir.path(), &server.base_url(), "FOPS_CLI_TEST_TOKEN_STALE");
    let order = write(dir.path(), "order.json", PICKUP_WITHOUT_LINES);
    let form = write(dir.path(), "form.json", SIGNED_HAPPY_FORM);

    Command::cargo_bin("fops")?
        .env("FOPS_CLI_TEST_TOKEN_STALE", "tok-cli-stale")
        .args(["transition", "--config", &cfg])
        .args(["--order", &order, "--stage", "picked", "--form", &form])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: AUTH_EXPIRED"))
        .stderr(predicate::str::contains("TRANSITION_FAILED").not());

    details.assert_hits(1);
    submit.assert_hits(0);
    Ok(())
}
