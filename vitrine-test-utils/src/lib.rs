//! Vitrine Test Utilities
//!
//! Shared test infrastructure for the Vitrine workspace:
//! - Proptest generators for rows, slugs, emails and query parameters
//! - Fixtures for common content and submissions
//! - Assertions over JSON response envelopes

pub use vitrine_core::{
    BlogPost, CaseStudy, Category, Comment, CommentStatus, ContactRequest, EmploymentType,
    EntityId, Job, ListParams, NewsletterSubscription, PublishStatus, Service, SubscribeRequest,
    TeamMember, Testimonial, Timestamp,
};

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for Vitrine domain values.

    use super::*;
    use proptest::prelude::*;

    /// Generate a random UUID.
    pub fn arb_uuid() -> impl Strategy<Value = Uuid> {
        any::<[u8; 16]>().prop_map(Uuid::from_bytes)
    }

    /// Generate a Timestamp within 2020-2030 at whole seconds.
    pub fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
        (1577836800i64..1893456000i64).prop_map(|secs| {
            chrono::DateTime::from_timestamp(secs, 0).unwrap_or_else(Utc::now)
        })
    }

    /// Generate a valid slug such as `web-design-2`.
    pub fn arb_slug() -> impl Strategy<Value = String> {
        prop::collection::vec("[a-z0-9]{1,8}", 1..4).prop_map(|parts| parts.join("-"))
    }

    /// Generate a syntactically valid email address.
    pub fn arb_email() -> impl Strategy<Value = String> {
        ("[a-z][a-z0-9.]{0,10}[a-z0-9]", "[a-z]{2,10}", "(com|org|io|dev)")
            .prop_map(|(user, domain, tld)| format!("{}@{}.{}", user, domain, tld))
    }

    pub fn arb_publish_status() -> impl Strategy<Value = PublishStatus> {
        prop_oneof![
            Just(PublishStatus::Draft),
            Just(PublishStatus::Published),
            Just(PublishStatus::Archived),
        ]
    }

    /// Raw text a client might put in a numeric query parameter.
    pub fn arb_numeric_param() -> impl Strategy<Value = String> {
        prop_oneof![
            any::<i64>().prop_map(|n| n.to_string()),
            (0u32..500).prop_map(|n| n.to_string()),
            "[a-z]{0,6}",
            Just(String::new()),
            Just("1.5".to_string()),
            Just(" 7 ".to_string()),
        ]
    }

    /// Arbitrary parameter maps including allow-listed and unknown keys.
    pub fn arb_list_params() -> impl Strategy<Value = ListParams> {
        let key = prop_oneof![
            Just("page".to_string()),
            Just("limit".to_string()),
            Just("sort_by".to_string()),
            Just("sort_order".to_string()),
            Just("search".to_string()),
            Just("featured".to_string()),
            Just("category".to_string()),
            "[a-z_]{1,12}",
        ];
        prop::collection::vec((key, ".{0,20}"), 0..8).prop_map(ListParams::from_pairs)
    }

    /// A published-or-not service row.
    pub fn arb_service() -> impl Strategy<Value = Service> {
        (
            arb_uuid(),
            arb_slug(),
            "[A-Za-z ]{2,40}",
            "[A-Za-z ]{1,120}",
            any::<bool>(),
            arb_publish_status(),
            0i32..100,
            arb_timestamp(),
        )
            .prop_map(
                |(id, slug, title, description, featured, status, display_order, created_at)| {
                    Service {
                        id,
                        slug,
                        title,
                        short_description: None,
                        description,
                        icon: None,
                        features: vec![],
                        price_from: None,
                        category: None,
                        featured,
                        status,
                        display_order,
                        created_at,
                        updated_at: created_at,
                    }
                },
            )
    }

    /// JSON bodies for webhook signing tests.
    pub fn arb_json_body() -> impl Strategy<Value = Vec<u8>> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            any::<i64>().prop_map(Value::from),
            ".{0,30}".prop_map(Value::from),
        ];
        leaf.prop_recursive(3, 24, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                prop::collection::btree_map("[a-z_]{1,10}", inner, 0..6)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
        .prop_map(|value| serde_json::to_vec(&value).unwrap_or_default())
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built rows and requests for common scenarios.

    use super::*;
    use vitrine_core::{new_entity_id, now, slugify};

    pub fn service(title: &str, featured: bool) -> Service {
        let at = now();
        Service {
            id: new_entity_id(),
            slug: slugify(title),
            title: title.to_string(),
            short_description: Some(format!("{} in brief", title)),
            description: format!("Everything about {}", title),
            icon: None,
            features: vec!["Discovery".to_string()],
            price_from: Some(1_500.0),
            category: Some("engineering".to_string()),
            featured,
            status: PublishStatus::Published,
            display_order: 0,
            created_at: at,
            updated_at: at,
        }
    }

    pub fn published_post(title: &str) -> BlogPost {
        let at = now();
        BlogPost {
            id: new_entity_id(),
            slug: slugify(title),
            title: title.to_string(),
            excerpt: None,
            content: format!("{} body text", title),
            cover_image: None,
            author_name: "Staff Writer".to_string(),
            category_id: None,
            tags: vec!["news".to_string()],
            featured: false,
            status: PublishStatus::Published,
            view_count: 0,
            reading_time_minutes: 1,
            published_at: Some(at),
            created_at: at,
            updated_at: at,
        }
    }

    pub fn open_job(title: &str) -> Job {
        let at = now();
        Job {
            id: new_entity_id(),
            slug: slugify(title),
            title: title.to_string(),
            department: Some("Engineering".to_string()),
            location: Some("Remote".to_string()),
            employment_type: EmploymentType::FullTime,
            remote: true,
            description: format!("Join us as a {}", title),
            requirements: vec![],
            salary_range: None,
            is_active: true,
            closes_at: None,
            created_at: at,
            updated_at: at,
        }
    }

    pub fn inactive_subscription(email: &str) -> NewsletterSubscription {
        let at = now();
        NewsletterSubscription {
            id: new_entity_id(),
            email: email.to_string(),
            name: None,
            is_active: false,
            source: Some("footer".to_string()),
            unsubscribe_token: "fixture-token".to_string(),
            subscribed_at: at,
            unsubscribed_at: Some(at),
            created_at: at,
            updated_at: at,
        }
    }

    pub fn valid_contact() -> ContactRequest {
        ContactRequest {
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            message: "We would like a quote for a new marketing site.".to_string(),
            services: vec!["web-design".to_string()],
            ..Default::default()
        }
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Checks over decoded JSON response envelopes.

    use super::*;

    /// Assert a success envelope and return its `data` member.
    pub fn assert_success(body: &Value) -> &Value {
        assert_eq!(body["success"], Value::Bool(true), "expected success envelope: {body}");
        &body["data"]
    }

    /// Assert a failure envelope with the given error code.
    pub fn assert_error_code(body: &Value, code: &str) {
        assert_eq!(body["success"], Value::Bool(false), "expected error envelope: {body}");
        assert_eq!(body["error"]["code"], code, "unexpected error: {body}");
    }

    /// Fields named in a validation error's `details.fields`.
    pub fn error_fields(body: &Value) -> Vec<String> {
        body["error"]["details"]["fields"]
            .as_object()
            .map(|fields| fields.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use vitrine_core::validation::{is_valid_email, is_valid_slug};

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_generated_slugs_are_valid(slug in generators::arb_slug()) {
            prop_assert!(is_valid_slug(&slug));
        }

        #[test]
        fn prop_generated_emails_are_valid(email in generators::arb_email()) {
            prop_assert!(is_valid_email(&email));
        }

        #[test]
        fn prop_generated_bodies_are_json(body in generators::arb_json_body()) {
            prop_assert!(serde_json::from_slice::<Value>(&body).is_ok());
        }
    }

    #[test]
    fn test_fixtures_are_consistent() {
        let service = fixtures::service("Brand Strategy", true);
        assert_eq!(service.slug, "brand-strategy");
        assert!(fixtures::open_job("Designer").is_active);
        assert!(!fixtures::inactive_subscription("x@example.com").is_active);
    }
}
