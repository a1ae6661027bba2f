//! HTTP API tests against mock ports

use std::time::Duration;

use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use serde_json::{json, Value};

use domain_import::ports::mock::MockPorts;
use domain_member::SourceRole;
use interface_api::{config::ApiConfig, create_router};
use test_utils::{CatalogFixtures, FileFixtures, TestWizardBuilder, MEMBER_NUMBER};

fn server_with(builder: TestWizardBuilder) -> (TestServer, MockPorts) {
    let (mocks, import_config) = builder.build_ports();
    let app = create_router(mocks.ports(), import_config, ApiConfig::default());
    (TestServer::new(app).unwrap(), mocks)
}

fn server() -> (TestServer, MockPorts) {
    server_with(TestWizardBuilder::new())
}

fn pdf_form(name: &str) -> MultipartForm {
    MultipartForm::new().add_part(
        "file",
        Part::bytes(FileFixtures::pdf_bytes())
            .file_name(name)
            .mime_type("application/pdf"),
    )
}

async fn create_session(server: &TestServer) -> String {
    let response = server.post("/api/v1/imports").await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["currentStep"], 1);
    body["id"].as_str().unwrap().to_string()
}

/// Uploads both fixture PDFs and waits for the merge
async fn merged_session(server: &TestServer) -> String {
    let id = create_session(server).await;
    for role in SourceRole::ALL {
        server
            .put(&format!("/api/v1/imports/{}/slots/{}", id, role))
            .multipart(pdf_form(&format!("{}.pdf", role)))
            .await
            .assert_status(StatusCode::ACCEPTED);
    }
    let body: Value = server
        .get(&format!("/api/v1/imports/{}", id))
        .add_query_param("wait", true)
        .await
        .json();
    assert_eq!(body["currentStep"], 3, "{}", body);
    id
}

mod health_tests {
    use super::*;

    #[tokio::test]
    async fn test_liveness() {
        let (server, _) = server();
        let body: Value = server.get("/health").await.json();
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_readiness_reports_every_port() {
        let (server, _) = server();
        let response = server.get("/health/ready").await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "ready");
        assert_eq!(body["checks"].as_array().unwrap().len(), 4);
    }
}

mod wizard_flow_tests {
    use super::*;

    #[tokio::test]
    async fn test_full_import_over_http() {
        let (server, mocks) = server();
        let id = merged_session(&server).await;
        let base = format!("/api/v1/imports/{}", id);

        let session: Value = server.get(&base).await.json();
        let canonical = &session["canonicalRecord"];
        assert_eq!(canonical["matchFlag"], true);
        assert_eq!(canonical["record"]["memberNumber"], MEMBER_NUMBER);
        assert_eq!(canonical["record"]["contractTariff"], "Premium");
        assert_eq!(canonical["ibanSource"], "membership_document");

        let session: Value = server.post(&format!("{}/advance", base)).await.json();
        assert_eq!(session["currentStep"], 4);

        let view: Value = server.get(&format!("{}/calendar", base)).await.json();
        assert_eq!(view["isPreview"], true);
        assert_eq!(view["calendar"]["kind"], "projected");
        assert_eq!(view["calendar"]["periods"].as_array().unwrap().len(), 12);
        assert_eq!(view["calendar"]["periods"][0]["dueDate"], "2024-03-01");
        assert_eq!(view["balance"]["standing"], "arrears");

        let session: Value = server.post(&format!("{}/advance", base)).await.json();
        assert_eq!(session["currentStep"], 5);

        let offers: Value = server.get(&format!("{}/memberships", base)).await.json();
        let offers = offers.as_array().unwrap();
        assert_eq!(offers.len(), 3);
        assert_eq!(offers[0]["origin"], "extracted");
        assert_eq!(offers[0]["name"], "Premium");

        let selection: Value = server
            .post(&format!("{}/membership", base))
            .json(&json!({ "source": "extracted" }))
            .await
            .json();
        assert_eq!(selection["selected"]["name"], "Premium");
        assert_eq!(selection["session"]["currentStep"], 6);

        let groups: Value = server.get(&format!("{}/payment-groups", base)).await.json();
        let first_of_month = CatalogFixtures::first_of_month();
        assert_eq!(groups["groups"].as_array().unwrap().len(), 2);
        assert_eq!(groups["suggested"], json!(first_of_month.id));

        let selection: Value = server
            .post(&format!("{}/payment-group", base))
            .json(&json!({ "paymentGroupId": first_of_month.id }))
            .await
            .json();
        assert_eq!(selection["session"]["currentStep"], 7);

        let response = server.post(&format!("{}/commit", base)).await;
        response.assert_status(StatusCode::CREATED);
        let receipt: Value = response.json();
        assert_eq!(receipt["sessionId"], json!(id));
        assert_eq!(receipt["billingEntries"], 12);
        assert_eq!(receipt["documents"], 2);
        assert_eq!(mocks.sink.persisted().await.len(), 1);

        assert_eq!(mocks.sink.persisted().await.len(), 1);
    }

    #[tokio::test]
    async fn test_committed_session_is_released() {
        let (server, mocks) = server();
        let id = merged_session(&server).await;
        let base = format!("/api/v1/imports/{}", id);

        server.post(&format!("{}/advance", base)).await;
        server.post(&format!("{}/advance", base)).await;
        server
            .post(&format!("{}/membership", base))
            .json(&json!({ "source": "extracted" }))
            .await
            .assert_status_ok();
        server
            .post(&format!("{}/payment-group", base))
            .json(&json!({ "paymentGroupId": CatalogFixtures::mid_month().id }))
            .await
            .assert_status_ok();
        server
            .post(&format!("{}/commit", base))
            .await
            .assert_status(StatusCode::CREATED);

        server.get(&base).expect_failure().await.assert_status_not_found();
        server
            .post(&format!("{}/commit", base))
            .expect_failure()
            .await
            .assert_status_not_found();
        assert_eq!(mocks.sink.persisted().await.len(), 1);
    }

    #[tokio::test]
    async fn test_waiting_read_does_not_block_slot_removal() {
        let (server, _) = server_with(
            TestWizardBuilder::new().with_delay(SourceRole::Statement, Duration::from_secs(5)),
        );
        let id = create_session(&server).await;
        let base = format!("/api/v1/imports/{}", id);
        for role in SourceRole::ALL {
            server
                .put(&format!("{}/slots/{}", base, role))
                .multipart(pdf_form("doc.pdf"))
                .await
                .assert_status(StatusCode::ACCEPTED);
        }

        let started = std::time::Instant::now();
        let waiting = async {
            server
                .get(&base)
                .add_query_param("wait", true)
                .await
                .json::<Value>()
        };
        let removal = async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            server
                .delete(&format!("{}/slots/statement", base))
                .await
                .assert_status_ok();
        };
        let (session, _) = tokio::join!(waiting, removal);

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(session["currentStep"], 1);
        assert_eq!(session["slots"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_removing_a_slot_resets_to_upload() {
        let (server, _) = server();
        let id = merged_session(&server).await;
        let base = format!("/api/v1/imports/{}", id);
        server.post(&format!("{}/advance", base)).await;

        let session: Value = server
            .delete(&format!("{}/slots/statement", base))
            .await
            .json();
        assert_eq!(session["currentStep"], 1);
        assert!(session["canonicalRecord"].is_null());
        assert_eq!(session["slots"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_go_back_to_source_review() {
        let (server, _) = server();
        let id = merged_session(&server).await;

        let session: Value = server
            .post(&format!("/api/v1/imports/{}/back", id))
            .json(&json!({ "step": 2 }))
            .await
            .json();
        assert_eq!(session["currentStep"], 2);

        server
            .post(&format!("/api/v1/imports/{}/back", id))
            .json(&json!({ "step": 9 }))
            .expect_failure()
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_manual_iban_override() {
        let (server, _) = server();
        let id = merged_session(&server).await;
        let path = format!("/api/v1/imports/{}/iban", id);

        server
            .put(&path)
            .json(&json!({ "iban": "DE00 1234" }))
            .expect_failure()
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        let session: Value = server
            .put(&path)
            .json(&json!({ "iban": "GB82 WEST 1234 5698 7654 32", "accountHolder": "Max Mustermann" }))
            .await
            .json();
        let canonical = &session["canonicalRecord"];
        assert_eq!(canonical["iban"], "GB82WEST12345698765432");
        assert_eq!(canonical["ibanSource"], "manual_override");
        assert_eq!(canonical["accountHolder"], "Max Mustermann");

        let session: Value = server.put(&path).json(&json!({ "iban": "" })).await.json();
        assert_eq!(session["canonicalRecord"]["ibanSource"], "membership_document");
    }
}

mod error_tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_session_is_404() {
        let (server, _) = server();
        server
            .get("/api/v1/imports/IMP-0190a3d2-7c4e-7000-8000-000000000000")
            .expect_failure()
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn test_malformed_session_id_is_400() {
        let (server, _) = server();
        server
            .get("/api/v1/imports/not-an-id")
            .expect_failure()
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_slot_is_404() {
        let (server, _) = server();
        let id = create_session(&server).await;
        server
            .put(&format!("/api/v1/imports/{}/slots/invoice", id))
            .multipart(pdf_form("invoice.pdf"))
            .expect_failure()
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn test_non_pdf_upload_is_rejected() {
        let (server, mocks) = server();
        let id = create_session(&server).await;

        let response = server
            .put(&format!("/api/v1/imports/{}/slots/membership", id))
            .multipart(MultipartForm::new().add_part(
                "file",
                Part::bytes(b"\x89PNG\r\n\x1a\n".to_vec())
                    .file_name("scan.png")
                    .mime_type("image/png"),
            ))
            .expect_failure()
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = response.json();
        assert_eq!(body["error"], "validation_error");
        assert_eq!(mocks.extraction.calls(), 0);
    }

    #[tokio::test]
    async fn test_advance_without_documents_conflicts() {
        let (server, _) = server();
        let id = create_session(&server).await;
        server
            .post(&format!("/api/v1/imports/{}/advance", id))
            .expect_failure()
            .await
            .assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_commit_before_final_step_conflicts() {
        let (server, mocks) = server();
        let id = merged_session(&server).await;
        server
            .post(&format!("/api/v1/imports/{}/commit", id))
            .expect_failure()
            .await
            .assert_status(StatusCode::CONFLICT);
        assert!(mocks.sink.persisted().await.is_empty());
    }

    #[tokio::test]
    async fn test_extraction_failure_is_slot_local() {
        let (server, _) = server_with(
            TestWizardBuilder::new().with_failure(SourceRole::Statement, "unreadable scan"),
        );
        let id = create_session(&server).await;
        for role in SourceRole::ALL {
            server
                .put(&format!("/api/v1/imports/{}/slots/{}", id, role))
                .multipart(pdf_form("doc.pdf"))
                .await;
        }

        let session: Value = server
            .get(&format!("/api/v1/imports/{}", id))
            .add_query_param("wait", true)
            .await
            .json();
        assert_eq!(session["currentStep"], 1);
        let slots = session["slots"].as_array().unwrap();
        let statement = slots.iter().find(|s| s["role"] == "statement").unwrap();
        let membership = slots.iter().find(|s| s["role"] == "membership").unwrap();
        assert_eq!(statement["status"], "error");
        assert!(statement["error"].as_str().unwrap().contains("unreadable scan"));
        assert_eq!(membership["status"], "extracted");
    }

    #[tokio::test]
    async fn test_deleted_session_is_gone() {
        let (server, _) = server();
        let id = create_session(&server).await;
        server
            .delete(&format!("/api/v1/imports/{}", id))
            .await
            .assert_status(StatusCode::NO_CONTENT);
        server
            .get(&format!("/api/v1/imports/{}", id))
            .expect_failure()
            .await
            .assert_status_not_found();
    }
}
