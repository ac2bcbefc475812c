//! Notification jobs for each kind of stored row

use serde::Serialize;
use serde_json::{json, Value};
use vitrine_core::{
    BlogPost, Comment, ConsultationRequest, ContactSubmission, EntityId, Job, JobApplication,
    NewsletterSubscription, Table,
};

use super::{templates, ChatMessage, EventName, NotificationJob, NotifyConfig, WebhookEvent};

fn payload<T: Serialize>(row: &T) -> Value {
    serde_json::to_value(row).unwrap_or_default()
}

fn admin_link(config: &NotifyConfig, section: &str) -> String {
    format!("{}/admin/{}", config.site_url.trim_end_matches('/'), section)
}

impl NotificationJob {
    pub fn contact_submitted(config: &NotifyConfig, contact: &ContactSubmission) -> Self {
        let mut emails = vec![templates::contact_auto_reply(contact)];
        if let Some(admin) = &config.admin_email {
            emails.insert(0, templates::contact_admin(admin, contact));
        }

        Self {
            event: Some(WebhookEvent::new(EventName::ContactSubmitted, payload(contact))),
            chat: Some(
                ChatMessage::new("New contact form submission")
                    .field("Name", contact.name.as_str())
                    .field("Email", contact.email.as_str())
                    .optional_field("Company", contact.company.as_deref())
                    .optional_field("Budget", contact.budget.as_deref())
                    .field("Services", contact.services.join(", "))
                    .field("Message", contact.message.as_str())
                    .link(admin_link(config, "contact")),
            ),
            emails,
        }
    }

    pub fn consultation_requested(
        config: &NotifyConfig,
        consultation: &ConsultationRequest,
        service_title: Option<&str>,
    ) -> Self {
        let mut emails = vec![templates::consultation_confirmation(consultation)];
        if let Some(admin) = &config.admin_email {
            emails.insert(
                0,
                templates::consultation_admin(admin, consultation, service_title),
            );
        }

        let date = consultation.preferred_date.map(|d| d.to_string());
        Self {
            event: Some(WebhookEvent::new(
                EventName::ConsultationRequested,
                payload(consultation),
            )),
            chat: Some(
                ChatMessage::new("New consultation request")
                    .field("Name", consultation.name.as_str())
                    .field("Email", consultation.email.as_str())
                    .optional_field("Service", service_title)
                    .optional_field("Preferred date", date.as_deref())
                    .optional_field("Preferred time", consultation.preferred_time.as_deref())
                    .link(admin_link(config, "consultations")),
            ),
            emails,
        }
    }

    pub fn application_submitted(
        config: &NotifyConfig,
        job: &Job,
        application: &JobApplication,
    ) -> Self {
        let mut emails = vec![templates::application_confirmation(job, application)];
        if let Some(hr) = config.hr_recipient() {
            emails.insert(0, templates::application_hr(hr, job, application));
        }

        let mut event_payload = payload(application);
        event_payload["job_title"] = Value::String(job.title.clone());

        Self {
            event: Some(WebhookEvent::new(EventName::ApplicationSubmitted, event_payload)),
            chat: Some(
                ChatMessage::new(format!("New application: {}", job.title))
                    .field("Name", application.full_name.as_str())
                    .field("Email", application.email.as_str())
                    .field("Resume", application.resume_url.as_str())
                    .optional_field("LinkedIn", application.linkedin_url.as_deref())
                    .link(admin_link(config, "applications")),
            ),
            emails,
        }
    }

    /// Welcome email plus event. The unsubscribe token stays out of the
    /// webhook payload.
    pub fn newsletter_subscribed(
        config: &NotifyConfig,
        subscription: &NewsletterSubscription,
    ) -> Self {
        Self {
            event: Some(WebhookEvent::new(
                EventName::NewsletterSubscribed,
                json!({
                    "id": subscription.id,
                    "email": subscription.email,
                    "name": subscription.name,
                    "source": subscription.source,
                }),
            )),
            chat: None,
            emails: vec![templates::newsletter_welcome(&config.site_url, subscription)],
        }
    }

    pub fn newsletter_unsubscribed(subscription: &NewsletterSubscription) -> Self {
        Self {
            event: Some(WebhookEvent::new(
                EventName::NewsletterUnsubscribed,
                json!({ "id": subscription.id, "email": subscription.email }),
            )),
            ..Self::default()
        }
    }

    pub fn comment_created(config: &NotifyConfig, post: &BlogPost, comment: &Comment) -> Self {
        let mut event_payload = payload(comment);
        event_payload["post_slug"] = Value::String(post.slug.clone());

        Self {
            event: Some(WebhookEvent::new(EventName::CommentCreated, event_payload)),
            chat: Some(
                ChatMessage::new(format!("New comment on \"{}\"", post.title))
                    .field("Author", comment.author_name.as_str())
                    .field("Comment", comment.content.as_str())
                    .link(admin_link(config, "comments")),
            ),
            emails: config
                .admin_email
                .as_deref()
                .map(|admin| templates::comment_moderation(admin, &config.site_url, post, comment))
                .into_iter()
                .collect(),
        }
    }

    /// Admin content changes: webhook only.
    pub fn content_changed(event: EventName, table: Table, id: EntityId, slug: Option<&str>) -> Self {
        Self {
            event: Some(WebhookEvent::new(
                event,
                json!({ "table": table.as_str(), "id": id, "slug": slug }),
            )),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitrine_core::{ContactRequest, SubscribeRequest};

    fn contact() -> ContactSubmission {
        ContactSubmission::from_request(
            ContactRequest {
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                message: "We need a new website".to_string(),
                ..Default::default()
            },
            vitrine_core::now(),
        )
    }

    #[test]
    fn test_contact_job_without_admin_only_auto_replies() {
        let job = NotificationJob::contact_submitted(&NotifyConfig::default(), &contact());
        assert_eq!(job.emails.len(), 1);
        assert_eq!(job.emails[0].to, vec!["ada@example.com".to_string()]);
        assert_eq!(
            job.event.as_ref().map(|e| e.event),
            Some(EventName::ContactSubmitted)
        );
    }

    #[test]
    fn test_contact_job_with_admin_notifies_admin_first() {
        let config = NotifyConfig {
            admin_email: Some("admin@agency.example".to_string()),
            ..NotifyConfig::default()
        };
        let job = NotificationJob::contact_submitted(&config, &contact());
        assert_eq!(job.emails.len(), 2);
        assert_eq!(job.emails[0].to, vec!["admin@agency.example".to_string()]);
        assert_eq!(
            job.chat.as_ref().and_then(|c| c.link.as_deref()),
            Some("http://localhost:3000/admin/contact")
        );
    }

    #[test]
    fn test_newsletter_event_hides_token() {
        let subscription = NewsletterSubscription::from_request(
            SubscribeRequest {
                email: "reader@example.com".to_string(),
                name: None,
                source: Some("footer".to_string()),
            },
            "tok_secret".to_string(),
            vitrine_core::now(),
        );
        let job = NotificationJob::newsletter_subscribed(&NotifyConfig::default(), &subscription);
        let event = job.event.map(|e| e.payload).unwrap_or_default();
        assert!(!event.to_string().contains("tok_secret"));
        assert!(job.emails[0].text.contains("token=tok_secret"));
    }
}
