use crate::control::{InputData, Response};
use crate::notify::{LeadMessage, Notifier};
use actix_web::web::Data;
use actix_web::{post, Either, HttpResponse};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct LeadResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

fn into_inner<T>(input: InputData<T>) -> T {
    match input {
        Either::Left(form) => form.into_inner(),
        Either::Right(json) => json.into_inner(),
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .is_none()
}

/// Partial delivery failure is deliberately silent towards the visitor: one
/// healthy channel means the lead reached someone, the rest is logged.
async fn deliver(notifier: &Notifier, message: &LeadMessage) -> Response {
    let report = notifier.dispatch(message).await;
    if report.any_delivered() {
        if report.delivered < report.attempted {
            log::warn!(
                "Lead \"{}\" reached only {} of {} channels",
                message.subject,
                report.delivered,
                report.attempted
            );
        }
        return Ok(HttpResponse::Ok().json(LeadResponse {
            success: true,
            message: "Request submitted".to_string(),
            details: None,
        }));
    }
    Ok(HttpResponse::InternalServerError().json(LeadResponse {
        success: false,
        message: "Failed to deliver request".to_string(),
        details: Some("No notification channel accepted the message".to_string()),
    }))
}

#[post("/api/contact")]
pub async fn contact(
    input: InputData<HashMap<String, String>>,
    notifier: Data<Arc<Notifier>>,
) -> Response {
    let fields = into_inner(input);
    let email_present = fields
        .get("email")
        .map(|email| !email.trim().is_empty())
        .unwrap_or(false);
    if !email_present {
        return Ok(HttpResponse::BadRequest().json(LeadResponse {
            success: false,
            message: "Email is required".to_string(),
            details: None,
        }));
    }

    // arbitrary form payload; sort keys so the forwarded text is stable
    let mut entries: Vec<(String, String)> = fields.into_iter().collect();
    entries.sort();
    let mut message = LeadMessage::new("New contact request");
    for (label, value) in &entries {
        message = message.line(label, value);
    }
    deliver(&notifier, &message).await
}

#[derive(Debug, Default, Deserialize)]
pub struct VinRequestForm {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub vin: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

#[post("/api/vin-request")]
pub async fn vin_request(
    input: InputData<VinRequestForm>,
    notifier: Data<Arc<Notifier>>,
) -> Response {
    let form = into_inner(input);
    let mut missing = vec![];
    for (field, value) in [
        ("name", &form.name),
        ("phone", &form.phone),
        ("email", &form.email),
        ("vin", &form.vin),
    ] {
        if is_blank(value) {
            missing.push(field);
        }
    }
    if !missing.is_empty() {
        let listed = missing.join(", ");
        return Ok(HttpResponse::BadRequest().json(LeadResponse {
            success: false,
            message: format!("Missing required fields: {listed}"),
            details: Some(listed),
        }));
    }

    let mut message = LeadMessage::new("New VIN request")
        .line("Name", form.name.as_deref().unwrap_or_default())
        .line("Phone", form.phone.as_deref().unwrap_or_default())
        .line("Email", form.email.as_deref().unwrap_or_default())
        .line("VIN", form.vin.as_deref().unwrap_or_default());
    if let Some(comment) = form.comment.as_deref().filter(|c| !c.trim().is_empty()) {
        message = message.line("Comment", comment);
    }
    deliver(&notifier, &message).await
}
