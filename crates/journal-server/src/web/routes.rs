use actix_web::web;
use crate::web::handlers;

/// Largest accepted request body. Pasted notes and PDFs read as text fit
/// comfortably; anything above is answered with a JSON 400.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::PayloadConfig::new(MAX_BODY_BYTES))
        .service(
            web::scope("/api")
                .route("/newAI", web::post().to(handlers::new_ai))
        )
        .route("/health", web::get().to(handlers::health_check));
}
