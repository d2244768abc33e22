//! Prometheus scrape endpoint

use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use prometheus::{Encoder, Registry, TextEncoder};
use std::sync::Arc;

/// Render every metric in `registry` in the text exposition format
pub fn render(registry: &Registry) -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&registry.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

async fn prometheus_metrics(registry: web::Data<Arc<Registry>>) -> impl Responder {
    match render(&registry) {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(body),
        Err(e) => HttpResponse::InternalServerError().body(format!("Failed to encode metrics: {}", e)),
    }
}

async fn health() -> impl Responder {
    HttpResponse::Ok().body("ok")
}

/// Bind the scrape server. Signal handling is left to the caller.
pub fn serve(addr: &str, registry: Arc<Registry>) -> std::io::Result<actix_web::dev::Server> {
    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(registry.clone()))
            .route("/metrics", web::get().to(prometheus_metrics))
            .route("/health", web::get().to(health))
    })
    .workers(1)
    .disable_signals()
    .bind(addr)?
    .run();
    Ok(server)
}
