//! Tests the first trip voucher route against mocked Voucherify and Mailchimp APIs.

use anyhow::Result;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde_json::{json, Value};
use wiremock::{
    matchers::{any, body_json, body_partial_json, header, method, path},
    Mock, ResponseTemplate,
};

use crate::helpers::{TestApp, TEST_APP_ID, TEST_APP_TOKEN, TEST_CAMPAIGN_ID, TEST_LIST_ID};

/// md5("user@example.com")
const USER_HASH: &str = "b58996c504c5638798eb6b511e6f49af";
/// base64("anystring:test-api-key-us21")
const BASIC_AUTH: &str = "Basic YW55c3RyaW5nOnRlc3QtYXBpLWtleS11czIx";

fn member_path(hash: &str) -> String {
    format!("/3.0/lists/{TEST_LIST_ID}/members/{hash}")
}

async fn mount_voucher_created(app: &TestApp, code: &str, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/v1/vouchers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "v_123",
            "code": code,
            "campaign": TEST_CAMPAIGN_ID,
        })))
        .expect(expected_calls)
        .mount(&app.voucher_server)
        .await;
}

async fn mount_no_calls(app: &TestApp) {
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.voucher_server)
        .await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.registry_server)
        .await;
}

#[tokio::test]
async fn first_trip_issues_voucher_and_updates_subscriber() -> Result<()> {
    let app = TestApp::spawn().await?;

    Mock::given(method("POST"))
        .and(path("/v1/vouchers"))
        .and(header("X-App-Id", TEST_APP_ID))
        .and(header("X-App-Token", TEST_APP_TOKEN))
        .and(body_partial_json(json!({
            "campaign": TEST_CAMPAIGN_ID,
            "customer": { "email": "user@example.com" },
            "metadata": {
                "source": "mailchimp",
                "audience": "AMPIDtest",
                "offer": "first_trip_free"
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "code": "ABC123" })))
        .expect(1)
        .mount(&app.voucher_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path(member_path(USER_HASH)))
        .and(header("Authorization", BASIC_AUTH))
        .and(body_json(json!({
            "merge_fields": { "ADDRESS": "", "FIRSTFREE": "ABC123" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": USER_HASH })))
        .expect(1)
        .mount(&app.registry_server)
        .await;

    let res = app
        .post_first_trip(&json!({ "email": "User@Example.com" }))
        .await?;

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body, json!({ "code": "ABC123" }));

    Ok(())
}

#[tokio::test]
async fn first_trip_voucher_expires_in_ten_days() -> Result<()> {
    let app = TestApp::spawn().await?;
    mount_voucher_created(&app, "ABC123", 1).await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&app.registry_server)
        .await;

    let before = Utc::now();
    let res = app
        .post_first_trip(&json!({ "email": "user@example.com" }))
        .await?;
    let after = Utc::now();
    assert_eq!(res.status(), StatusCode::OK);

    let requests = app
        .voucher_server
        .received_requests()
        .await
        .unwrap_or_default();
    let body: Value = serde_json::from_slice(&requests[0].body)?;
    let expiration_date = body["expiration_date"]
        .as_str()
        .map(DateTime::parse_from_rfc3339)
        .transpose()?
        .map(|dt| dt.with_timezone(&Utc));

    let Some(expires_at) = expiration_date else {
        panic!("Missing expiration_date in: {body}");
    };
    let ten_days = chrono::Duration::days(10);
    // Millisecond precision on the wire.
    let slack = chrono::Duration::milliseconds(1);
    assert!(
        expires_at >= before + ten_days - slack && expires_at <= after + ten_days,
        "Unexpected expiry: {expires_at}"
    );

    Ok(())
}

#[tokio::test]
async fn first_trip_missing_email_is_rejected() -> Result<()> {
    let app = TestApp::spawn().await?;
    mount_no_calls(&app).await;

    let tests = [
        (json!({}), "Empty json"),
        (json!({ "email": "" }), "Empty email"),
        (json!({ "email": "   " }), "Blank email"),
        (json!({ "email": null }), "Null email"),
        (json!({ "name": "Ursula" }), "No email field"),
    ];

    for (json_request, params) in tests {
        let res = app.post_first_trip(&json_request).await?;
        assert_eq!(
            res.status(),
            StatusCode::BAD_REQUEST,
            "Wrong response: ({}), Expected: ({}); for request with: {params}",
            res.status(),
            StatusCode::BAD_REQUEST
        );
        let body: Value = res.json().await?;
        assert_eq!(body["error"], "Missing email", "for request with: {params}");
    }

    let res = app.post_first_trip_raw("").await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST, "Empty body");
    let body: Value = res.json().await?;
    assert_eq!(body["error"], "Missing email");

    Ok(())
}

#[tokio::test]
async fn first_trip_unparseable_body_is_a_server_error() -> Result<()> {
    let app = TestApp::spawn().await?;
    mount_no_calls(&app).await;

    let tests = [
        ("{\"email\": ", "Truncated json"),
        ("email=user@example.com", "Form data"),
        ("{\"email\": 42}", "Numeric email"),
    ];

    for (body, params) in tests {
        let res = app.post_first_trip_raw(body).await?;
        assert_eq!(
            res.status(),
            StatusCode::INTERNAL_SERVER_ERROR,
            "Wrong response for request with: {params}"
        );
        let body: Value = res.json().await?;
        let error = body["error"].as_str().unwrap_or_default();
        assert!(
            error.starts_with("Invalid request body"),
            "Unexpected error: {error}; for request with: {params}"
        );
    }

    Ok(())
}

#[tokio::test]
async fn first_trip_non_object_body_has_no_email() -> Result<()> {
    let app = TestApp::spawn().await?;
    mount_no_calls(&app).await;

    let tests = [
        (json!(["user@example.com"]), "Array"),
        (json!("user@example.com"), "String"),
        (json!(42), "Number"),
    ];

    for (json_request, params) in tests {
        let res = app.post_first_trip(&json_request).await?;
        assert_eq!(
            res.status(),
            StatusCode::BAD_REQUEST,
            "Wrong response for request with: {params}"
        );
        let body: Value = res.json().await?;
        assert_eq!(body["error"], "Missing email", "for request with: {params}");
    }

    Ok(())
}

#[tokio::test]
async fn first_trip_other_methods_not_allowed() -> Result<()> {
    let app = TestApp::spawn().await?;
    mount_no_calls(&app).await;

    for method in [reqwest::Method::GET, reqwest::Method::PUT, reqwest::Method::DELETE] {
        let res = app
            .http_client
            .request(method.clone(), app.first_trip_url())
            .send()
            .await?;

        assert_eq!(
            res.status(),
            StatusCode::METHOD_NOT_ALLOWED,
            "Wrong response for {method}"
        );
        let body: Value = res.json().await?;
        assert_eq!(body["error"], "Method Not Allowed");
    }

    Ok(())
}

#[tokio::test]
async fn first_trip_provider_error_is_passed_through() -> Result<()> {
    let app = TestApp::spawn().await?;

    let provider_error = json!({
        "code": 422,
        "key": "invalid_campaign",
        "message": "Campaign not found"
    });
    Mock::given(method("POST"))
        .and(path("/v1/vouchers"))
        .respond_with(ResponseTemplate::new(422).set_body_json(provider_error.clone()))
        .expect(1)
        .mount(&app.voucher_server)
        .await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.registry_server)
        .await;

    let res = app
        .post_first_trip(&json!({ "email": "user@example.com" }))
        .await?;

    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = res.json().await?;
    assert_eq!(body["error"], "Voucherify error");
    assert_eq!(body["details"], provider_error);

    Ok(())
}

#[tokio::test]
async fn first_trip_registry_failure_keeps_the_voucher() -> Result<()> {
    let app = TestApp::spawn().await?;
    mount_voucher_created(&app, "ABC123", 1).await;

    Mock::given(method("PATCH"))
        .and(path(member_path(USER_HASH)))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "title": "API Key Invalid",
            "status": 401
        })))
        .expect(1)
        .mount(&app.registry_server)
        .await;

    let res = app
        .post_first_trip(&json!({ "email": "user@example.com" }))
        .await?;

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await?;
    let error = body["error"].as_str().unwrap_or_default();
    assert!(
        error.starts_with("Mailchimp update failed (401)"),
        "Unexpected error: {error}"
    );
    assert!(error.contains("API Key Invalid"), "Unexpected error: {error}");

    Ok(())
}

#[tokio::test]
async fn first_trip_without_vendor_settings_fails_before_any_call() -> Result<()> {
    let app = TestApp::spawn_with(|config| {
        config.mailchimp.api_key = None;
    })
    .await?;
    mount_no_calls(&app).await;

    let res = app
        .post_first_trip(&json!({ "email": "user@example.com" }))
        .await?;

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await?;
    let error = body["error"].as_str().unwrap_or_default();
    assert!(error.contains("MAILCHIMP_API_KEY"), "Unexpected error: {error}");

    // Validation still comes first.
    let res = app.post_first_trip(&json!({})).await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn first_trip_email_is_normalized() -> Result<()> {
    let app = TestApp::spawn().await?;

    Mock::given(method("POST"))
        .and(path("/v1/vouchers"))
        .and(body_partial_json(json!({
            "customer": { "email": "user@example.com" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "code": "ABC123" })))
        .expect(3)
        .mount(&app.voucher_server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(member_path(USER_HASH)))
        .respond_with(ResponseTemplate::new(200))
        .expect(3)
        .mount(&app.registry_server)
        .await;

    for email in ["user@example.com", "  USER@example.COM ", "User@Example.com\n"] {
        let res = app.post_first_trip(&json!({ "email": email })).await?;
        assert_eq!(res.status(), StatusCode::OK, "for email: {email:?}");
    }

    Ok(())
}

#[tokio::test]
async fn first_trip_uses_configured_merge_fields() -> Result<()> {
    let app = TestApp::spawn_with(|config| {
        config.mailchimp.code_merge_field = "VOUCHER".to_string();
        config.mailchimp.clear_merge_fields = Vec::new();
    })
    .await?;
    mount_voucher_created(&app, "XYZ789", 1).await;

    Mock::given(method("PATCH"))
        .and(path(member_path(USER_HASH)))
        .and(body_json(json!({ "merge_fields": { "VOUCHER": "XYZ789" } })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.registry_server)
        .await;

    let res = app
        .post_first_trip(&json!({ "email": "user@example.com" }))
        .await?;

    assert_eq!(res.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn first_trip_error_carries_request_id() -> Result<()> {
    let app = TestApp::spawn().await?;
    mount_no_calls(&app).await;

    let res = app
        .http_client
        .post(app.first_trip_url())
        .header("x-request-id", "req-42")
        .json(&json!({}))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let header_id = res
        .headers()
        .get("x-request-id")
        .and_then(|id| id.to_str().ok())
        .map(str::to_string);
    assert_eq!(header_id.as_deref(), Some("req-42"));

    let body: Value = res.json().await?;
    assert_eq!(body["req_id"], "req-42");

    Ok(())
}
