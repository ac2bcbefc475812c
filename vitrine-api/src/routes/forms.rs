//! Form Intake Routes
//!
//! Every submission is stored first; notifications go out afterwards on a
//! background task and never change the response. The router built here is
//! wrapped in the per-IP rate limiter by [`super::create_app`].

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use serde_json::{Map, Value};
use vitrine_core::{
    normalize_email, BlogPost, BookConsultationRequest, ClientInfo, Comment, ContactRequest,
    ContactSubmission, ConsultationRequest, CreateCommentRequest, CreateJobApplicationRequest,
    EngagementEvent, FormAnalytics, Job, JobApplication, NewsletterSubscription, PageView,
    Query as StoreQuery, Record, RowKey, Service, SubscribeRequest, Table, TrackEventRequest,
    TrackFormRequest, TrackPageViewRequest, UnsubscribeRequest, Validate,
};

use crate::envelope::{ApiResponse, Created};
use crate::error::{ApiError, ApiResult};
use crate::extractors::{PathKey, ValidatedJson};
use crate::notify::NotificationJob;
use crate::state::AppState;
use crate::telemetry::with_metrics;

use super::blog::published_post;
use super::common::{header_value, unsubscribe_token};

/// Headers CDNs use to pass the visitor's country.
const COUNTRY_HEADERS: &[&str] = &["cf-ipcountry", "x-vercel-ip-country", "x-country-code"];

fn submitted(form: &str) {
    with_metrics(|m| m.record_form_submission(form));
}

// ============================================================================
// CONTACT
// ============================================================================

/// POST /api/contact - Submit the contact form
#[utoipa::path(
    post,
    path = "/api/contact",
    tag = "Forms",
    request_body = ContactRequest,
    responses(
        (status = 201, description = "Submission stored", body = Created),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 429, description = "Rate limited", body = ApiError),
    ),
)]
pub async fn submit_contact(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ContactRequest>,
) -> ApiResult<ApiResponse<Created>> {
    let contact = state
        .db
        .insert(&ContactSubmission::from_request(req, vitrine_core::now()))
        .await?;

    submitted("contact");
    tracing::info!(id = %contact.id, "Contact form submitted");
    state.notifier.spawn(NotificationJob::contact_submitted(
        state.notifier.config(),
        &contact,
    ));

    Ok(ApiResponse::created(Created { id: contact.id })
        .with_message("Thank you for your message. We'll be in touch soon."))
}

// ============================================================================
// NEWSLETTER
// ============================================================================

/// POST /api/newsletter - Subscribe to the newsletter
///
/// A previously unsubscribed address is reactivated in place and keeps its id.
#[utoipa::path(
    post,
    path = "/api/newsletter",
    tag = "Forms",
    request_body = SubscribeRequest,
    responses(
        (status = 201, description = "Subscribed", body = Created),
        (status = 200, description = "Subscription reactivated", body = Created),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 409, description = "Already subscribed", body = ApiError),
    ),
)]
pub async fn subscribe(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<SubscribeRequest>,
) -> ApiResult<ApiResponse<Created>> {
    let email = normalize_email(&req.email);
    let existing = state
        .db
        .find_one::<NewsletterSubscription>(
            StoreQuery::table(Table::NewsletterSubscriptions).eq_text("email", email.clone()),
        )
        .await?;

    let (subscription, response) = match existing {
        Some(sub) if sub.is_active => return Err(ApiError::already_subscribed()),
        Some(sub) => {
            let now = vitrine_core::now();
            let mut patch = Map::new();
            patch.insert("is_active".into(), Value::Bool(true));
            patch.insert("unsubscribed_at".into(), Value::Null);
            patch.insert("subscribed_at".into(), serde_json::to_value(now)?);
            if let Some(name) = req.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
                patch.insert("name".into(), Value::from(name));
            }
            if sub.unsubscribe_token.is_empty() {
                patch.insert("unsubscribe_token".into(), Value::from(unsubscribe_token()));
            }
            let reactivated = state
                .db
                .update::<NewsletterSubscription>(&RowKey::Id(sub.id), patch)
                .await?
                .ok_or_else(|| ApiError::entity_not_found(NewsletterSubscription::ENTITY_NAME, sub.id))?;
            tracing::info!(id = %reactivated.id, "Newsletter subscription reactivated");
            let response = ApiResponse::ok(Created { id: reactivated.id })
                .with_message("Welcome back! Your subscription has been reactivated.");
            (reactivated, response)
        }
        None => {
            let fresh = NewsletterSubscription::from_request(
                req,
                unsubscribe_token(),
                vitrine_core::now(),
            );
            let stored = state.db.insert(&fresh).await?;
            tracing::info!(id = %stored.id, "Newsletter subscription created");
            let response = ApiResponse::created(Created { id: stored.id })
                .with_message("Thanks for subscribing!");
            (stored, response)
        }
    };

    submitted("newsletter");
    state.notifier.spawn(NotificationJob::newsletter_subscribed(
        state.notifier.config(),
        &subscription,
    ));
    Ok(response)
}

/// DELETE /api/newsletter - Unsubscribe by token or email
///
/// The token comes from the query string (footer links); a JSON body with
/// `email` is accepted as well. Unsubscribing twice is not an error.
#[utoipa::path(
    delete,
    path = "/api/newsletter",
    tag = "Forms",
    params(UnsubscribeRequest),
    responses(
        (status = 200, description = "Unsubscribed", body = Created),
        (status = 400, description = "Neither token nor email given", body = ApiError),
        (status = 404, description = "Unknown subscription", body = ApiError),
    ),
)]
pub async fn unsubscribe(
    State(state): State<AppState>,
    Query(query): Query<UnsubscribeRequest>,
    body: Option<Json<UnsubscribeRequest>>,
) -> ApiResult<ApiResponse<Created>> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let req = UnsubscribeRequest {
        token: query.token.or(body.token),
        email: query.email.or(body.email),
    };
    req.validate()?;

    let base = StoreQuery::table(Table::NewsletterSubscriptions);
    let lookup = match req.token.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        Some(token) => base.eq_text("unsubscribe_token", token),
        None => base.eq_text("email", normalize_email(req.email.as_deref().unwrap_or_default())),
    };
    let subscription = state
        .db
        .find_one::<NewsletterSubscription>(lookup)
        .await?
        .ok_or_else(|| ApiError::not_found("Subscription not found"))?;

    if subscription.is_active {
        let mut patch = Map::new();
        patch.insert("is_active".into(), Value::Bool(false));
        patch.insert(
            "unsubscribed_at".into(),
            serde_json::to_value(vitrine_core::now())?,
        );
        state
            .db
            .update::<NewsletterSubscription>(&RowKey::Id(subscription.id), patch)
            .await?;
        tracing::info!(id = %subscription.id, "Newsletter subscription cancelled");
        state
            .notifier
            .spawn(NotificationJob::newsletter_unsubscribed(&subscription));
    }

    Ok(ApiResponse::ok(Created { id: subscription.id })
        .with_message("You have been unsubscribed."))
}

// ============================================================================
// CONSULTATION
// ============================================================================

/// POST /api/consultation - Book a consultation
#[utoipa::path(
    post,
    path = "/api/consultation",
    tag = "Forms",
    request_body = BookConsultationRequest,
    responses(
        (status = 201, description = "Request stored", body = Created),
        (status = 400, description = "Validation failed or unknown service", body = ApiError),
    ),
)]
pub async fn book_consultation(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<BookConsultationRequest>,
) -> ApiResult<ApiResponse<Created>> {
    let service = match req.service_id {
        Some(id) => Some(
            state
                .db
                .get::<Service>(&RowKey::Id(id))
                .await?
                .ok_or_else(|| ApiError::field("service_id", "Unknown service"))?,
        ),
        None => None,
    };

    let consultation = state
        .db
        .insert(&ConsultationRequest::from_request(req, vitrine_core::now()))
        .await?;

    submitted("consultation");
    tracing::info!(id = %consultation.id, "Consultation requested");
    state.notifier.spawn(NotificationJob::consultation_requested(
        state.notifier.config(),
        &consultation,
        service.as_ref().map(|s| s.title.as_str()),
    ));

    Ok(ApiResponse::created(Created { id: consultation.id })
        .with_message("Thanks! We'll confirm your consultation shortly."))
}

// ============================================================================
// JOB APPLICATIONS
// ============================================================================

/// POST /api/careers/{slug_or_id}/apply - Apply for an open position
#[utoipa::path(
    post,
    path = "/api/careers/{slug_or_id}/apply",
    tag = "Forms",
    params(("slug_or_id" = String, Path, description = "Position slug or UUID")),
    request_body = CreateJobApplicationRequest,
    responses(
        (status = 201, description = "Application stored", body = Created),
        (status = 400, description = "Validation failed or position closed", body = ApiError),
        (status = 404, description = "Position not found", body = ApiError),
    ),
)]
pub async fn apply(
    State(state): State<AppState>,
    PathKey(key): PathKey,
    ValidatedJson(req): ValidatedJson<CreateJobApplicationRequest>,
) -> ApiResult<ApiResponse<Created>> {
    let job = state
        .db
        .get::<Job>(&key)
        .await?
        .filter(|job| job.is_active)
        .ok_or_else(|| ApiError::entity_not_found(Job::ENTITY_NAME, &key))?;

    let now = vitrine_core::now();
    if !job.accepts_applications(now) {
        return Err(ApiError::invalid_input(
            "This position is no longer accepting applications",
        ));
    }

    let application = state
        .db
        .insert(&JobApplication::from_request(req, job.id, now))
        .await?;

    submitted("application");
    tracing::info!(id = %application.id, job_id = %job.id, "Job application submitted");
    state.notifier.spawn(NotificationJob::application_submitted(
        state.notifier.config(),
        &job,
        &application,
    ));

    Ok(ApiResponse::created(Created { id: application.id })
        .with_message("Thank you for applying. We'll review your application soon."))
}

// ============================================================================
// COMMENTS
// ============================================================================

/// POST /api/blog/{slug}/comments - Submit a comment for moderation
#[utoipa::path(
    post,
    path = "/api/blog/{slug}/comments",
    tag = "Forms",
    params(("slug" = String, Path, description = "Post slug or UUID")),
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment awaiting moderation", body = Created),
        (status = 400, description = "Validation failed or foreign parent", body = ApiError),
        (status = 404, description = "Post not found", body = ApiError),
    ),
)]
pub async fn submit_comment(
    State(state): State<AppState>,
    PathKey(key): PathKey,
    ValidatedJson(req): ValidatedJson<CreateCommentRequest>,
) -> ApiResult<ApiResponse<Created>> {
    let post: BlogPost = published_post(&state, &key).await?;

    if let Some(parent_id) = req.parent_id {
        let parent = state.db.get::<Comment>(&RowKey::Id(parent_id)).await?;
        if parent.map_or(true, |p| p.post_id != post.id) {
            return Err(ApiError::field(
                "parent_id",
                "Parent comment does not belong to this post",
            ));
        }
    }

    let comment = state
        .db
        .insert(&Comment::from_request(req, post.id, vitrine_core::now()))
        .await?;

    submitted("comment");
    tracing::info!(id = %comment.id, post_id = %post.id, "Comment submitted");
    state.notifier.spawn(NotificationJob::comment_created(
        state.notifier.config(),
        &post,
        &comment,
    ));

    Ok(ApiResponse::created(Created { id: comment.id })
        .with_message("Thanks! Your comment will appear once approved."))
}

// ============================================================================
// ANALYTICS TRACKING
// ============================================================================

fn client_info(headers: &HeaderMap) -> ClientInfo {
    ClientInfo {
        user_agent: header_value(headers, "user-agent")
            .map(|ua| ua.chars().take(512).collect()),
        country: COUNTRY_HEADERS
            .iter()
            .find_map(|name| header_value(headers, name))
            .filter(|c| c.len() == 2 && c.chars().all(|ch| ch.is_ascii_alphabetic()))
            .map(|c| c.to_ascii_uppercase()),
    }
}

/// POST /api/analytics/pageview - Record a page view
#[utoipa::path(
    post,
    path = "/api/analytics/pageview",
    tag = "Analytics",
    request_body = TrackPageViewRequest,
    responses(
        (status = 201, description = "Recorded", body = Created),
        (status = 400, description = "Validation failed", body = ApiError),
    ),
)]
pub async fn track_pageview(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidatedJson(req): ValidatedJson<TrackPageViewRequest>,
) -> ApiResult<ApiResponse<Created>> {
    let view = PageView::from_request(req, client_info(&headers), vitrine_core::now());
    let stored = state.db.insert(&view).await?;
    Ok(ApiResponse::created(Created { id: stored.id }))
}

/// POST /api/analytics/event - Record an engagement event
#[utoipa::path(
    post,
    path = "/api/analytics/event",
    tag = "Analytics",
    request_body = TrackEventRequest,
    responses(
        (status = 201, description = "Recorded", body = Created),
        (status = 400, description = "Validation failed", body = ApiError),
    ),
)]
pub async fn track_event(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<TrackEventRequest>,
) -> ApiResult<ApiResponse<Created>> {
    let event = EngagementEvent::from_request(req, vitrine_core::now());
    let stored = state.db.insert(&event).await?;
    Ok(ApiResponse::created(Created { id: stored.id }))
}

/// POST /api/analytics/form - Record a form funnel step
#[utoipa::path(
    post,
    path = "/api/analytics/form",
    tag = "Analytics",
    request_body = TrackFormRequest,
    responses(
        (status = 201, description = "Recorded", body = Created),
        (status = 400, description = "Validation failed", body = ApiError),
    ),
)]
pub async fn track_form(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<TrackFormRequest>,
) -> ApiResult<ApiResponse<Created>> {
    let event = FormAnalytics::from_request(req, vitrine_core::now());
    let stored = state.db.insert(&event).await?;
    Ok(ApiResponse::created(Created { id: stored.id }))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/contact", post(submit_contact))
        .route("/newsletter", post(subscribe).delete(unsubscribe))
        .route("/consultation", post(book_consultation))
        .route("/careers/:key/apply", post(apply))
        .route("/blog/:key/comments", post(submit_comment))
        .route("/analytics/pageview", post(track_pageview))
        .route("/analytics/event", post(track_event))
        .route("/analytics/form", post(track_form))
}
