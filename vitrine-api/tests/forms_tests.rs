//! Form intake through the full router: validation, persistence,
//! newsletter lifecycle and per-IP rate limiting.

mod support;

use axum::http::{Method, StatusCode};
use serde_json::json;
use support::{admin, get, json, send, test_app, test_app_with};
use vitrine_api::ApiConfig;
use vitrine_core::{NewsletterSubscription, PublishStatus, Query, RowKey, Table};
use vitrine_test_utils::assertions::{assert_error_code, assert_success, error_fields};
use vitrine_test_utils::fixtures;

// ============================================================================
// CONTACT
// ============================================================================

#[tokio::test]
async fn contact_with_bad_email_and_short_message_is_rejected() -> Result<(), String> {
    let app = test_app().map_err(|e| e.to_string())?;
    let body = json!({ "name": "A", "email": "bad", "message": "short", "services": [] });

    let (status, body) = send(&app, json(Method::POST, "/api/contact", &body)?).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_code(&body, "VALIDATION_FAILED");
    let fields = error_fields(&body);
    assert!(fields.contains(&"email".to_string()), "fields: {:?}", fields);
    assert!(fields.contains(&"message".to_string()), "fields: {:?}", fields);
    assert!(!fields.contains(&"name".to_string()));
    Ok(())
}

#[tokio::test]
async fn contact_submission_is_stored_and_visible_to_admins() -> Result<(), String> {
    let app = test_app().map_err(|e| e.to_string())?;
    let contact = serde_json::to_value(fixtures::valid_contact()).map_err(|e| e.to_string())?;

    let (status, body) = send(&app, json(Method::POST, "/api/contact", &contact)?).await?;
    assert_eq!(status, StatusCode::CREATED);
    let id = assert_success(&body)["id"].clone();
    assert!(id.is_string());

    let (status, body) = send(&app, admin(Method::GET, "/api/admin/contact", None)?).await?;
    assert_eq!(status, StatusCode::OK);
    let items = assert_success(&body)["items"]
        .as_array()
        .cloned()
        .unwrap_or_default();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], id);
    assert_eq!(items[0]["status"], "new");
    Ok(())
}

#[tokio::test]
async fn malformed_json_is_invalid_input() -> Result<(), String> {
    let app = test_app().map_err(|e| e.to_string())?;
    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/api/contact")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .map_err(|e| e.to_string())?;

    let (status, body) = send(&app, request).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_code(&body, "INVALID_INPUT");
    Ok(())
}

// ============================================================================
// NEWSLETTER
// ============================================================================

#[tokio::test]
async fn resubscribing_reactivates_the_existing_subscription() -> Result<(), String> {
    let app = test_app().map_err(|e| e.to_string())?;
    let existing = app
        .state
        .db
        .insert(&fixtures::inactive_subscription("reader@example.com"))
        .await
        .map_err(|e| e.to_string())?;

    let request = json(
        Method::POST,
        "/api/newsletter",
        &json!({ "email": "Reader@Example.com" }),
    )?;
    let (status, body) = send(&app, request).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(assert_success(&body)["id"], json!(existing.id));

    let stored = app
        .state
        .db
        .get::<NewsletterSubscription>(&RowKey::Id(existing.id))
        .await
        .map_err(|e| e.to_string())?
        .ok_or("subscription vanished")?;
    assert!(stored.is_active);
    assert!(stored.unsubscribed_at.is_none());
    assert_eq!(stored.unsubscribe_token, existing.unsubscribe_token);

    let again = json(Method::POST, "/api/newsletter", &json!({ "email": "reader@example.com" }))?;
    let (status, body) = send(&app, again).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_error_code(&body, "EMAIL_ALREADY_SUBSCRIBED");
    Ok(())
}

#[tokio::test]
async fn new_subscription_is_created() -> Result<(), String> {
    let app = test_app().map_err(|e| e.to_string())?;
    let request = json(
        Method::POST,
        "/api/newsletter",
        &json!({ "email": "fresh@example.com", "source": "footer" }),
    )?;

    let (status, body) = send(&app, request).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_success(&body);

    let count = app
        .state
        .db
        .count(&Query::table(Table::NewsletterSubscriptions).eq_bool("is_active", true))
        .await
        .map_err(|e| e.to_string())?;
    assert_eq!(count, 1);
    Ok(())
}

#[tokio::test]
async fn unsubscribe_by_token_is_idempotent() -> Result<(), String> {
    let app = test_app().map_err(|e| e.to_string())?;
    let mut active = fixtures::inactive_subscription("leaving@example.com");
    active.is_active = true;
    active.unsubscribed_at = None;
    let active = app.state.db.insert(&active).await.map_err(|e| e.to_string())?;

    let uri = format!("/api/newsletter?token={}", active.unsubscribe_token);
    for _ in 0..2 {
        let request = axum::http::Request::builder()
            .method(Method::DELETE)
            .uri(&uri)
            .body(axum::body::Body::empty())
            .map_err(|e| e.to_string())?;
        let (status, body) = send(&app, request).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(assert_success(&body)["id"], json!(active.id));
    }

    let stored = app
        .state
        .db
        .get::<NewsletterSubscription>(&RowKey::Id(active.id))
        .await
        .map_err(|e| e.to_string())?
        .ok_or("subscription vanished")?;
    assert!(!stored.is_active);
    assert!(stored.unsubscribed_at.is_some());
    Ok(())
}

#[tokio::test]
async fn unsubscribe_with_unknown_token_is_not_found() -> Result<(), String> {
    let app = test_app().map_err(|e| e.to_string())?;
    let request = axum::http::Request::builder()
        .method(Method::DELETE)
        .uri("/api/newsletter?token=nope")
        .body(axum::body::Body::empty())
        .map_err(|e| e.to_string())?;

    let (status, body) = send(&app, request).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_error_code(&body, "ENTITY_NOT_FOUND");
    Ok(())
}

// ============================================================================
// CONSULTATION, CAREERS, COMMENTS
// ============================================================================

#[tokio::test]
async fn consultation_for_unknown_service_is_rejected() -> Result<(), String> {
    let app = test_app().map_err(|e| e.to_string())?;
    let body = json!({
        "name": "Grace Hopper",
        "email": "grace@example.com",
        "service_id": uuid::Uuid::now_v7(),
        "project_details": "A compiler for our marketing copy, roughly speaking."
    });

    let (status, body) = send(&app, json(Method::POST, "/api/consultation", &body)?).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_fields(&body), vec!["service_id".to_string()]);
    Ok(())
}

#[tokio::test]
async fn consultation_for_known_service_is_stored() -> Result<(), String> {
    let app = test_app().map_err(|e| e.to_string())?;
    let service = app
        .state
        .db
        .insert(&fixtures::service("Brand Audit", false))
        .await
        .map_err(|e| e.to_string())?;
    let body = json!({
        "name": "Grace Hopper",
        "email": "grace@example.com",
        "service_id": service.id,
        "project_details": "We need a brand audit before the spring launch."
    });

    let (status, body) = send(&app, json(Method::POST, "/api/consultation", &body)?).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_success(&body);
    Ok(())
}

#[tokio::test]
async fn applications_require_an_open_position() -> Result<(), String> {
    let app = test_app().map_err(|e| e.to_string())?;
    let mut closed = fixtures::open_job("Backend Engineer");
    closed.closes_at = Some(vitrine_core::now() - chrono::Duration::days(1));
    let closed = app.state.db.insert(&closed).await.map_err(|e| e.to_string())?;
    let open = app
        .state
        .db
        .insert(&fixtures::open_job("Designer"))
        .await
        .map_err(|e| e.to_string())?;

    let application = json!({
        "full_name": "Alan Turing",
        "email": "alan@example.com",
        "resume_url": "https://example.com/alan.pdf"
    });

    let uri = format!("/api/careers/{}/apply", closed.slug);
    let (status, _) = send(&app, json(Method::POST, &uri, &application)?).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let uri = format!("/api/careers/{}/apply", open.id);
    let (status, body) = send(&app, json(Method::POST, &uri, &application)?).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_success(&body);

    let (status, _) =
        send(&app, json(Method::POST, "/api/careers/no-such-job/apply", &application)?).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn comments_are_moderated_before_they_appear() -> Result<(), String> {
    let app = test_app().map_err(|e| e.to_string())?;
    let post = app
        .state
        .db
        .insert(&fixtures::published_post("Shipping Faster"))
        .await
        .map_err(|e| e.to_string())?;
    let comments_uri = format!("/api/blog/{}/comments", post.slug);

    let comment = json!({
        "author_name": "Reader",
        "author_email": "reader@example.com",
        "content": "Great write-up, thanks!"
    });
    let (status, body) = send(&app, json(Method::POST, &comments_uri, &comment)?).await?;
    assert_eq!(status, StatusCode::CREATED);
    let comment_id = assert_success(&body)["id"]
        .as_str()
        .ok_or("missing comment id")?
        .to_string();

    let (status, body) = send(&app, get(&comments_uri)?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(assert_success(&body).as_array().map(Vec::len), Some(0));

    let approve = json!({ "status": "approved" });
    let uri = format!("/api/admin/comments/{}", comment_id);
    let (status, _) = send(&app, admin(Method::PUT, &uri, Some(&approve))?).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, get(&comments_uri)?).await?;
    assert_eq!(status, StatusCode::OK);
    let thread = assert_success(&body).as_array().cloned().unwrap_or_default();
    assert_eq!(thread.len(), 1);
    assert_eq!(thread[0]["id"], json!(comment_id));
    Ok(())
}

#[tokio::test]
async fn reply_to_a_comment_on_another_post_is_rejected() -> Result<(), String> {
    let app = test_app().map_err(|e| e.to_string())?;
    let first = app
        .state
        .db
        .insert(&fixtures::published_post("First Post"))
        .await
        .map_err(|e| e.to_string())?;
    let second = app
        .state
        .db
        .insert(&fixtures::published_post("Second Post"))
        .await
        .map_err(|e| e.to_string())?;

    let comment = json!({
        "author_name": "Reader",
        "author_email": "reader@example.com",
        "content": "On the first post"
    });
    let uri = format!("/api/blog/{}/comments", first.slug);
    let (_, body) = send(&app, json(Method::POST, &uri, &comment)?).await?;
    let parent_id = assert_success(&body)["id"].clone();

    let reply = json!({
        "author_name": "Reader",
        "author_email": "reader@example.com",
        "content": "Replying across posts",
        "parent_id": parent_id
    });
    let uri = format!("/api/blog/{}/comments", second.slug);
    let (status, body) = send(&app, json(Method::POST, &uri, &reply)?).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_fields(&body), vec!["parent_id".to_string()]);
    Ok(())
}

#[tokio::test]
async fn comments_on_drafts_are_not_found() -> Result<(), String> {
    let app = test_app().map_err(|e| e.to_string())?;
    let mut draft = fixtures::published_post("Unreleased");
    draft.status = PublishStatus::Draft;
    let draft = app.state.db.insert(&draft).await.map_err(|e| e.to_string())?;

    let comment = json!({
        "author_name": "Reader",
        "author_email": "reader@example.com",
        "content": "Early bird"
    });
    let uri = format!("/api/blog/{}/comments", draft.slug);
    let (status, _) = send(&app, json(Method::POST, &uri, &comment)?).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

// ============================================================================
// ANALYTICS
// ============================================================================

#[tokio::test]
async fn page_views_are_recorded_and_summarized() -> Result<(), String> {
    let app = test_app().map_err(|e| e.to_string())?;
    for path in ["/", "/services"] {
        let request = json(Method::POST, "/api/analytics/pageview", &json!({ "path": path }))?;
        let (status, _) = send(&app, request).await?;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) =
        send(&app, admin(Method::GET, "/api/admin/analytics/summary", None)?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(assert_success(&body)["page_views"], 2);
    Ok(())
}

// ============================================================================
// RATE LIMITING
// ============================================================================

#[tokio::test]
async fn form_routes_are_rate_limited_per_client() -> Result<(), String> {
    let app = test_app_with(ApiConfig {
        rate_limit_enabled: true,
        rate_limit_per_minute: 1,
        rate_limit_burst: 1,
        ..ApiConfig::default()
    })
    .map_err(|e| e.to_string())?;
    let body = json!({ "name": "A", "email": "bad", "message": "short" });

    let (first, _) = send(&app, json(Method::POST, "/api/contact", &body)?).await?;
    assert_eq!(first, StatusCode::BAD_REQUEST);

    let (second, body) = send(&app, json(Method::POST, "/api/contact", &body)?).await?;
    assert_eq!(second, StatusCode::TOO_MANY_REQUESTS);
    assert_error_code(&body, "TOO_MANY_REQUESTS");

    // Public reads are not limited.
    let (status, _) = send(&app, get("/api/services")?).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}
