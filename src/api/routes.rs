// API route configuration

use crate::api::handlers;
use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg
        // Health check (no password required)
        .route("/health", web::get().to(handlers::health_check))
        .route("/", web::get().to(handlers::health_check))
        // The sync endpoint checks the shared password itself
        .service(web::scope("/api/v1").route("/sync", web::post().to(handlers::run_sync)));
}
