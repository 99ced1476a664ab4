mod config;
mod openai;
mod sleep;
mod web;


use std::rc::Rc;

use actix_web::{App, HttpServer, web::Data};
use dotenv::dotenv;
use log::{error, info};

use journal_core::proxy::AssistantProxy;

use config::ServerConfig;
use openai::OpenAiAssistants;
use sleep::TokioSleep;
use web::handlers::RequestLimits;
use web::routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize environment
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Starting assistant proxy on {} (assistant {}, {} checks every {}ms, budget {}ms)",
        config.bind_addr,
        config.assistant.assistant_id,
        config.assistant.max_poll_attempts,
        config.assistant.poll_interval_ms,
        config.assistant.max_duration_ms
    );

    let limits = Data::new(RequestLimits {
        timeout_ms: config.request_timeout_ms,
    });
    let assistant = config.assistant.clone();

    // The proxy is single-threaded; every worker builds its own.
    HttpServer::new(move || {
        let proxy = AssistantProxy::new(
            Rc::new(OpenAiAssistants::new(&assistant)),
            Rc::new(TokioSleep),
            assistant.clone(),
        );
        App::new()
            .app_data(Data::new(proxy))
            .app_data(limits.clone())
            .configure(routes::configure)
    })
    .bind(config.bind_addr.as_str())?
    .run()
    .await
}
