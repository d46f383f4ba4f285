//! API router — mounts all endpoints under /api/v1.

use crate::handlers::{self, AppState};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the API router. The caller assembles the state so every
/// collaborator (store, transport, generator) is injected explicitly.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        // Leads
        .route("/api/v1/leads", get(handlers::list_leads).post(handlers::create_lead))
        .route("/api/v1/leads/import", post(handlers::import_leads))
        .route(
            "/api/v1/leads/:id",
            get(handlers::get_lead).put(handlers::update_lead).delete(handlers::delete_lead),
        )
        // Templates & variations
        .route("/api/v1/templates", get(handlers::list_templates).post(handlers::create_template))
        .route(
            "/api/v1/templates/:id",
            get(handlers::get_template)
                .put(handlers::update_template)
                .delete(handlers::delete_template),
        )
        .route("/api/v1/templates/:id/variations", get(handlers::list_variations).post(handlers::generate_variations))
        .route("/api/v1/templates/:id/variations/:variation_id", axum::routing::patch(handlers::set_variation_active))
        // Campaigns
        .route("/api/v1/campaigns", get(handlers::list_campaigns).post(handlers::create_campaign))
        .route("/api/v1/campaigns/:id", get(handlers::get_campaign).delete(handlers::delete_campaign))
        .route("/api/v1/campaigns/:id/launch", post(handlers::launch_campaign))
        .route("/api/v1/campaigns/:id/pause", post(handlers::pause_campaign))
        .route("/api/v1/campaigns/:id/resume", post(handlers::resume_campaign))
        .route("/api/v1/campaigns/:id/cancel", post(handlers::cancel_campaign))
        .route("/api/v1/campaigns/:id/emails", get(handlers::campaign_emails))
        // Emails
        .route("/api/v1/emails/:id/reply", post(handlers::mark_replied))
        // Unsubscribes
        .route("/api/v1/unsubscribes", get(handlers::list_unsubscribes).post(handlers::create_unsubscribe))
        .route("/api/v1/unsubscribes/:email", axum::routing::delete(handlers::delete_unsubscribe))
        // Provider webhook
        .route("/api/v1/webhooks/email", get(handlers::webhook_status).post(handlers::handle_webhook))
        // Cron triggers
        .route("/api/v1/cron/dispatch", post(handlers::trigger_dispatch))
        .route("/api/v1/cron/performance", post(handlers::trigger_performance))
        // Operational
        .route("/health", get(handlers::health_check))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
