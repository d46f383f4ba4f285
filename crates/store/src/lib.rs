//! In-memory persistence gateway backed by DashMap.
//!
//! Production: replace with PostgreSQL (sqlx) or similar ACID store.
//! This provides the same API surface for development and testing:
//! every multi-row mutation runs under a single write lock, so a status
//! change and the counter increments that accompany it are one atomic
//! transaction.

pub mod dispatch_ops;
pub mod engagement;
pub mod lifecycle;
pub mod seed;
pub mod store;

pub use lifecycle::{NewCampaign, SenderIdentity};
pub use store::{
    ImportReport, LeadImportRow, LeadUpdate, NewLead, NewTemplate, NewVariation, OutreachStore,
    TemplateUpdate,
};
