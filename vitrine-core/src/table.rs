//! Store tables and the typed-row contract

use serde::{de::DeserializeOwned, Serialize};
use std::fmt;

/// Every table the site backend reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    Services,
    CaseStudies,
    BlogPosts,
    BlogCategories,
    BlogTags,
    Comments,
    Testimonials,
    TeamMembers,
    Jobs,
    JobApplications,
    ContactSubmissions,
    ConsultationRequests,
    NewsletterSubscriptions,
    PageViews,
    EngagementEvents,
    FormAnalytics,
    SearchAnalytics,
    SeoSettings,
    MediaItems,
}

impl Table {
    pub const ALL: &'static [Table] = &[
        Table::Services,
        Table::CaseStudies,
        Table::BlogPosts,
        Table::BlogCategories,
        Table::BlogTags,
        Table::Comments,
        Table::Testimonials,
        Table::TeamMembers,
        Table::Jobs,
        Table::JobApplications,
        Table::ContactSubmissions,
        Table::ConsultationRequests,
        Table::NewsletterSubscriptions,
        Table::PageViews,
        Table::EngagementEvents,
        Table::FormAnalytics,
        Table::SearchAnalytics,
        Table::SeoSettings,
        Table::MediaItems,
    ];

    /// Table name in the store.
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Services => "services",
            Table::CaseStudies => "case_studies",
            Table::BlogPosts => "blog_posts",
            Table::BlogCategories => "blog_categories",
            Table::BlogTags => "blog_tags",
            Table::Comments => "comments",
            Table::Testimonials => "testimonials",
            Table::TeamMembers => "team_members",
            Table::Jobs => "jobs",
            Table::JobApplications => "job_applications",
            Table::ContactSubmissions => "contact_submissions",
            Table::ConsultationRequests => "consultation_requests",
            Table::NewsletterSubscriptions => "newsletter_subscriptions",
            Table::PageViews => "page_views",
            Table::EngagementEvents => "engagement_events",
            Table::FormAnalytics => "form_analytics",
            Table::SearchAnalytics => "search_analytics",
            Table::SeoSettings => "seo_settings",
            Table::MediaItems => "media_items",
        }
    }

    /// Whether rows carry a `slug` column usable for lookups.
    pub fn has_slug(&self) -> bool {
        matches!(
            self,
            Table::Services
                | Table::CaseStudies
                | Table::BlogPosts
                | Table::BlogCategories
                | Table::BlogTags
                | Table::TeamMembers
                | Table::Jobs
        )
    }

    /// Whether rows carry an `updated_at` column maintained on update.
    pub fn has_updated_at(&self) -> bool {
        !matches!(
            self,
            Table::PageViews
                | Table::EngagementEvents
                | Table::FormAnalytics
                | Table::SearchAnalytics
                | Table::BlogTags
        )
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row type stored in one table.
///
/// Rows travel to and from the store as JSON objects whose keys are column
/// names, so the serde shape of an implementor is its column layout.
pub trait Record: Serialize + DeserializeOwned + Send + Sync + 'static {
    const TABLE: Table;
    /// Human-readable name used in error messages ("Service", "Blog post").
    const ENTITY_NAME: &'static str;
}
