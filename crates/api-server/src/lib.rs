//! REST API: CRUD over leads/templates/campaigns, campaign lifecycle,
//! the inbound provider webhook, and on-demand cron triggers.

pub mod handlers;
pub mod models;
pub mod router;

pub use handlers::AppState;
pub use router::api_router;
