//! Route configuration

pub mod admin;
pub mod chat;
pub mod health;

use crate::server::middleware::auth;
use actix_cors::Cors;
use actix_web::middleware::from_fn;
use actix_web::web;

/// Wire every route group into the app
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health::health));

    cfg.service(
        web::scope("/v1")
            .wrap(from_fn(auth::require_token))
            .route("/chat/completions", web::post().to(chat::chat_completions))
            .route("/messages", web::post().to(chat::messages))
            .route("/models", web::get().to(chat::list_models)),
    );

    cfg.service(
        web::scope("/api")
            .wrap(from_fn(auth::require_token))
            .wrap(Cors::permissive())
            .route("/providers", web::get().to(admin::list_providers))
            .route("/providers", web::post().to(admin::create_provider))
            .route("/providers/{id}", web::put().to(admin::update_provider))
            .route("/providers/{id}", web::delete().to(admin::delete_provider))
            .route("/models", web::get().to(admin::list_models))
            .route("/models", web::post().to(admin::create_model))
            .route("/models/{id}", web::put().to(admin::update_model))
            .route("/models/{id}", web::delete().to(admin::delete_model))
            .route("/mappings", web::get().to(admin::list_mappings))
            .route("/mappings", web::post().to(admin::create_mapping))
            .route("/mappings/{id}", web::put().to(admin::update_mapping))
            .route("/mappings/{id}", web::delete().to(admin::delete_mapping))
            .route("/logs", web::get().to(admin::list_logs)),
    );
}
