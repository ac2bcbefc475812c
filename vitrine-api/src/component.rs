//! Admin-managed content components.
//!
//! Services, case studies, blog posts, testimonials, team members and job
//! openings share one create/update/delete lifecycle in the admin API. Each
//! implements [`Component`], and [`crate::routes::generic::crud_routes`]
//! serves all of them with the same five handlers.

use serde::de::DeserializeOwned;
use vitrine_core::{
    BlogPost, CaseStudy, CreateBlogPostRequest, CreateCaseStudyRequest, CreateJobRequest,
    CreateServiceRequest, CreateTeamMemberRequest, CreateTestimonialRequest, EntityId, HasUpdates,
    Job, ListConfig, PublishStatus, Record, Service, TeamMember, Testimonial, Timestamp,
    UpdateBlogPostRequest, UpdateCaseStudyRequest, UpdateJobRequest, UpdateServiceRequest,
    UpdateTeamMemberRequest, UpdateTestimonialRequest, Validate,
};

// ============================================================================
// COMPONENT TRAIT
// ============================================================================

/// A content row the admin API can create, update, list and delete.
pub trait Component: Record + Clone {
    /// Body of the create endpoint.
    type Create: DeserializeOwned + Validate + Send + 'static;

    /// Body of the update endpoint; absent fields stay untouched.
    type Update: DeserializeOwned + Validate + HasUpdates + Send + 'static;

    /// Filters, sorting and search of the admin list (drafts included).
    const ADMIN: ListConfig;

    /// Whether rows carry a `published_at` that publishing fills in.
    const STAMPS_PUBLICATION: bool = false;

    /// Build a new row from a validated create request.
    fn build(req: Self::Create, now: Timestamp) -> Self;

    fn entity_id(&self) -> EntityId;

    fn slug(&self) -> Option<&str>;

    /// Whether the public site shows this row.
    fn is_live(&self) -> bool;

    fn published_at(&self) -> Option<Timestamp> {
        None
    }
}

/// Implement [`Component`] for a content record.
///
/// ```ignore
/// impl_component!(Service {
///     create: CreateServiceRequest,
///     update: UpdateServiceRequest,
///     slug: |s| Some(s.slug.as_str()),
///     live: |s| s.status == PublishStatus::Published,
/// });
/// ```
#[macro_export]
macro_rules! impl_component {
    (
        $record:ty {
            create: $create:ty,
            update: $update:ty,
            slug: |$slug_self:ident| $slug_expr:expr,
            live: |$live_self:ident| $live_expr:expr,
            $(published_at: |$pub_self:ident| $pub_expr:expr,)?
        }
    ) => {
        impl $crate::component::Component for $record {
            type Create = $create;
            type Update = $update;

            const ADMIN: vitrine_core::ListConfig = <$record>::ADMIN_LIST;

            fn build(req: Self::Create, now: vitrine_core::Timestamp) -> Self {
                <$record>::from_request(req, now)
            }

            fn entity_id(&self) -> vitrine_core::EntityId {
                self.id
            }

            fn slug(&self) -> Option<&str> {
                let $slug_self = self;
                $slug_expr
            }

            fn is_live(&self) -> bool {
                let $live_self = self;
                $live_expr
            }

            $(
                const STAMPS_PUBLICATION: bool = true;

                fn published_at(&self) -> Option<vitrine_core::Timestamp> {
                    let $pub_self = self;
                    $pub_expr
                }
            )?
        }
    };
}

// ============================================================================
// CONTENT COMPONENTS
// ============================================================================

impl_component!(Service {
    create: CreateServiceRequest,
    update: UpdateServiceRequest,
    slug: |s| Some(s.slug.as_str()),
    live: |s| s.status == PublishStatus::Published,
});

impl_component!(CaseStudy {
    create: CreateCaseStudyRequest,
    update: UpdateCaseStudyRequest,
    slug: |s| Some(s.slug.as_str()),
    live: |s| s.status == PublishStatus::Published,
    published_at: |s| s.published_at,
});

impl_component!(BlogPost {
    create: CreateBlogPostRequest,
    update: UpdateBlogPostRequest,
    slug: |p| Some(p.slug.as_str()),
    live: |p| p.status == PublishStatus::Published,
    published_at: |p| p.published_at,
});

impl_component!(Testimonial {
    create: CreateTestimonialRequest,
    update: UpdateTestimonialRequest,
    slug: |_t| None,
    live: |t| t.status == PublishStatus::Published,
});

impl_component!(TeamMember {
    create: CreateTeamMemberRequest,
    update: UpdateTeamMemberRequest,
    slug: |m| Some(m.slug.as_str()),
    live: |m| m.is_active,
});

impl_component!(Job {
    create: CreateJobRequest,
    update: UpdateJobRequest,
    slug: |j| Some(j.slug.as_str()),
    live: |j| j.is_active,
});

#[cfg(test)]
mod tests {
    use super::*;
    use vitrine_test_utils::fixtures;

    #[test]
    fn test_publication_stamping_is_limited_to_dated_content() {
        assert!(BlogPost::STAMPS_PUBLICATION);
        assert!(CaseStudy::STAMPS_PUBLICATION);
        assert!(!Service::STAMPS_PUBLICATION);
        assert!(!Job::STAMPS_PUBLICATION);
    }

    #[test]
    fn test_service_component_accessors() {
        let service = fixtures::service("Brand Strategy", true);
        assert_eq!(service.entity_id(), service.id);
        assert_eq!(Component::slug(&service), Some(service.slug.as_str()));
        assert!(service.is_live());
        assert_eq!(service.published_at(), None);
    }
}
