use std::time::Duration;

use actix_web::{http::StatusCode, web, HttpResponse, Responder};
use log::{error, info, warn};
use serde_json::json;

use journal_core::proxy::{AssistantProxy, MISSING_QUESTION};

use crate::web::models::{AnswerResponse, ErrorResponse, QuestionRequest};

const INTERNAL_ERROR: &str = "Internal Server Error";
pub const BODY_TOO_LARGE: &str = "Request body is too large";

/// Per-request settings shared with the handlers
#[derive(Debug, Clone, Copy)]
pub struct RequestLimits {
    pub timeout_ms: u64,
}

// Health check endpoint
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

/// Non-blank question from a raw request body, if there is one.
fn parse_question(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<QuestionRequest>(body)
        .ok()
        .and_then(|req| req.question)
        .filter(|q| !q.trim().is_empty())
}

// Assistant proxy endpoint
pub async fn new_ai(
    proxy: web::Data<AssistantProxy>,
    limits: web::Data<RequestLimits>,
    body: Result<web::Bytes, actix_web::Error>,
) -> HttpResponse {
    let body = match body {
        Ok(body) => body,
        Err(e) => {
            warn!("Unreadable request body: {}", e);
            let message = if e.as_response_error().status_code() == StatusCode::PAYLOAD_TOO_LARGE {
                BODY_TOO_LARGE
            } else {
                MISSING_QUESTION
            };
            return HttpResponse::BadRequest().json(ErrorResponse::new(message));
        }
    };

    let Some(question) = parse_question(&body) else {
        return HttpResponse::BadRequest().json(ErrorResponse::new(MISSING_QUESTION));
    };

    info!("Assistant request ({} chars)", question.chars().count());

    let answer = tokio::time::timeout(
        Duration::from_millis(limits.timeout_ms),
        proxy.answer(&question),
    )
    .await;

    match answer {
        Ok(Ok(response)) => HttpResponse::Ok().json(AnswerResponse { response }),
        Ok(Err(e)) if e.http_status() == 400 => {
            HttpResponse::BadRequest().json(ErrorResponse::new(MISSING_QUESTION))
        }
        Ok(Err(e)) => {
            error!("Assistant request failed: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse::new(INTERNAL_ERROR))
        }
        Err(_) => {
            error!("Assistant request exceeded {}ms", limits.timeout_ms);
            HttpResponse::InternalServerError().json(ErrorResponse::new(INTERNAL_ERROR))
        }
    }
}
