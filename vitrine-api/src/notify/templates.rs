//! Email bodies for form notifications
//!
//! Every template returns both an HTML and a plain-text body. User input is
//! HTML-escaped before it reaches markup.

use vitrine_core::{
    BlogPost, Comment, ConsultationRequest, ContactSubmission, Job, JobApplication,
    NewsletterSubscription,
};

use super::email::EmailMessage;

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape and keep line breaks.
fn paragraph(input: &str) -> String {
    escape_html(input).replace('\n', "<br>")
}

fn layout(heading: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html><html><body style=\"font-family:Arial,sans-serif;color:#1f2937;\
         max-width:600px;margin:0 auto;padding:24px\"><h2 style=\"color:#4f46e5\">{}</h2>{}\
         </body></html>",
        escape_html(heading),
        body
    )
}

/// Two-column table of label/value pairs; empty values are left out.
fn details_table(rows: &[(&str, Option<&str>)]) -> String {
    let mut html = String::from("<table style=\"border-collapse:collapse;width:100%\">");
    for (label, value) in rows {
        if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
            html.push_str(&format!(
                "<tr><td style=\"padding:6px 12px 6px 0;font-weight:bold;vertical-align:top\">{}</td>\
                 <td style=\"padding:6px 0\">{}</td></tr>",
                escape_html(label),
                paragraph(value)
            ));
        }
    }
    html.push_str("</table>");
    html
}

fn details_text(rows: &[(&str, Option<&str>)]) -> String {
    rows.iter()
        .filter_map(|(label, value)| {
            value
                .filter(|v| !v.trim().is_empty())
                .map(|v| format!("{}: {}", label, v))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn message(to: &str, subject: String, html: String, text: String) -> EmailMessage {
    EmailMessage {
        to: vec![to.to_string()],
        subject,
        html,
        text,
        reply_to: None,
    }
}

// ============================================================================
// CONTACT
// ============================================================================

pub fn contact_admin(admin: &str, contact: &ContactSubmission) -> EmailMessage {
    let services = contact.services.join(", ");
    let rows = [
        ("Name", Some(contact.name.as_str())),
        ("Email", Some(contact.email.as_str())),
        ("Phone", contact.phone.as_deref()),
        ("Company", contact.company.as_deref()),
        ("Subject", contact.subject.as_deref()),
        ("Services", Some(services.as_str())),
        ("Budget", contact.budget.as_deref()),
        ("Source", contact.source.as_deref()),
        ("Message", Some(contact.message.as_str())),
    ];
    let mut email = message(
        admin,
        format!("New contact form submission from {}", contact.name),
        layout("New contact form submission", &details_table(&rows)),
        details_text(&rows),
    );
    email.reply_to = Some(contact.email.clone());
    email
}

pub fn contact_auto_reply(contact: &ContactSubmission) -> EmailMessage {
    let body = format!(
        "<p>Hi {},</p><p>Thanks for getting in touch. We have received your message \
         and will get back to you within one business day.</p><p>The team</p>",
        escape_html(&contact.name)
    );
    message(
        &contact.email,
        "Thanks for reaching out".to_string(),
        layout("We received your message", &body),
        format!(
            "Hi {},\n\nThanks for getting in touch. We have received your message and \
             will get back to you within one business day.\n\nThe team",
            contact.name
        ),
    )
}

// ============================================================================
// CONSULTATION
// ============================================================================

pub fn consultation_admin(
    admin: &str,
    consultation: &ConsultationRequest,
    service_title: Option<&str>,
) -> EmailMessage {
    let date = consultation.preferred_date.map(|d| d.to_string());
    let rows = [
        ("Name", Some(consultation.name.as_str())),
        ("Email", Some(consultation.email.as_str())),
        ("Phone", consultation.phone.as_deref()),
        ("Company", consultation.company.as_deref()),
        ("Service", service_title),
        ("Preferred date", date.as_deref()),
        ("Preferred time", consultation.preferred_time.as_deref()),
        ("Timezone", consultation.timezone.as_deref()),
        ("Budget", consultation.budget.as_deref()),
        ("Project details", Some(consultation.project_details.as_str())),
    ];
    let mut email = message(
        admin,
        format!("New consultation request from {}", consultation.name),
        layout("New consultation request", &details_table(&rows)),
        details_text(&rows),
    );
    email.reply_to = Some(consultation.email.clone());
    email
}

pub fn consultation_confirmation(consultation: &ConsultationRequest) -> EmailMessage {
    let when = match (consultation.preferred_date, consultation.preferred_time.as_deref()) {
        (Some(date), Some(time)) => format!(" for {} at {}", date, time),
        (Some(date), None) => format!(" for {}", date),
        _ => String::new(),
    };
    let body = format!(
        "<p>Hi {},</p><p>Your consultation request{} has been received. We will \
         confirm a time with you shortly.</p><p>The team</p>",
        escape_html(&consultation.name),
        escape_html(&when)
    );
    message(
        &consultation.email,
        "Your consultation request".to_string(),
        layout("Consultation request received", &body),
        format!(
            "Hi {},\n\nYour consultation request{} has been received. We will confirm a \
             time with you shortly.\n\nThe team",
            consultation.name, when
        ),
    )
}

// ============================================================================
// CAREERS
// ============================================================================

pub fn application_hr(hr: &str, job: &Job, application: &JobApplication) -> EmailMessage {
    let rows = [
        ("Position", Some(job.title.as_str())),
        ("Name", Some(application.full_name.as_str())),
        ("Email", Some(application.email.as_str())),
        ("Phone", application.phone.as_deref()),
        ("Resume", Some(application.resume_url.as_str())),
        ("Portfolio", application.portfolio_url.as_deref()),
        ("LinkedIn", application.linkedin_url.as_deref()),
        ("Cover letter", application.cover_letter.as_deref()),
    ];
    let mut email = message(
        hr,
        format!("New application for {}: {}", job.title, application.full_name),
        layout("New job application", &details_table(&rows)),
        details_text(&rows),
    );
    email.reply_to = Some(application.email.clone());
    email
}

pub fn application_confirmation(job: &Job, application: &JobApplication) -> EmailMessage {
    let body = format!(
        "<p>Hi {},</p><p>Thank you for applying for the <strong>{}</strong> position. \
         Our team will review your application and contact you if there is a fit.</p>\
         <p>The team</p>",
        escape_html(&application.full_name),
        escape_html(&job.title)
    );
    message(
        &application.email,
        format!("Application received: {}", job.title),
        layout("Application received", &body),
        format!(
            "Hi {},\n\nThank you for applying for the {} position. Our team will review \
             your application and contact you if there is a fit.\n\nThe team",
            application.full_name, job.title
        ),
    )
}

// ============================================================================
// NEWSLETTER
// ============================================================================

pub fn unsubscribe_link(site_url: &str, token: &str) -> String {
    format!(
        "{}/newsletter/unsubscribe?token={}",
        site_url.trim_end_matches('/'),
        token
    )
}

pub fn newsletter_welcome(site_url: &str, subscription: &NewsletterSubscription) -> EmailMessage {
    let greeting = subscription
        .name
        .as_deref()
        .map(|n| format!("Hi {},", n))
        .unwrap_or_else(|| "Hi,".to_string());
    let link = unsubscribe_link(site_url, &subscription.unsubscribe_token);
    let body = format!(
        "<p>{}</p><p>Welcome to our newsletter. You will hear from us about new work, \
         articles and events.</p><p style=\"font-size:12px;color:#6b7280\">\
         <a href=\"{}\">Unsubscribe</a></p>",
        escape_html(&greeting),
        escape_html(&link)
    );
    message(
        &subscription.email,
        "Welcome to our newsletter".to_string(),
        layout("You're subscribed", &body),
        format!(
            "{}\n\nWelcome to our newsletter. You will hear from us about new work, \
             articles and events.\n\nUnsubscribe: {}",
            greeting, link
        ),
    )
}

// ============================================================================
// COMMENTS
// ============================================================================

pub fn comment_moderation(
    admin: &str,
    site_url: &str,
    post: &BlogPost,
    comment: &Comment,
) -> EmailMessage {
    let post_url = format!("{}/blog/{}", site_url.trim_end_matches('/'), post.slug);
    let rows = [
        ("Post", Some(post.title.as_str())),
        ("Author", Some(comment.author_name.as_str())),
        ("Email", Some(comment.author_email.as_str())),
        ("Comment", Some(comment.content.as_str())),
        ("Link", Some(post_url.as_str())),
    ];
    message(
        admin,
        format!("New comment awaiting moderation on \"{}\"", post.title),
        layout("New comment awaiting moderation", &details_table(&rows)),
        details_text(&rows),
    )
}
