use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A prospective customer business record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: Uuid,
    pub user_id: Uuid,
    pub business_name: String,
    pub contact_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub industry: Option<String>,
    pub tags: Vec<String>,
    pub status: LeadStatus,
    pub notes: Option<String>,
    pub source: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    New,
    Contacted,
    Responded,
    Qualified,
    Won,
    Lost,
}

/// Master subject/body pair owning AI-generated variations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub subject: String,
    pub body: String,
    pub tone: String,
    pub target_industry: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One concrete subject/body alternative under a template, tracked for
/// A/B performance. Counters count unique emails, not raw event volume;
/// rates stay `None` until the variation has at least one send and are
/// recomputed wholesale by the performance evaluator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailVariation {
    pub id: Uuid,
    pub template_id: Uuid,
    pub name: String,
    pub subject: String,
    pub body_html: String,
    pub body_text: String,
    pub framework: String,
    pub times_sent: u64,
    pub times_opened: u64,
    pub times_clicked: u64,
    pub times_replied: u64,
    pub open_rate: Option<f64>,
    pub click_rate: Option<f64>,
    pub reply_rate: Option<f64>,
    pub is_active: bool,
    pub is_winner: bool,
    pub created_at: DateTime<Utc>,
}

/// How queued leads are distributed across variations at launch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SendingStrategy {
    #[default]
    Balanced,
    WinnerFocused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Draft,
    Scheduled,
    Active,
    Paused,
    Completed,
    Cancelled,
}

/// A scheduled bulk-send run over a fixed lead set using one template.
///
/// Invariant: `send_window_end > send_window_start` (hours 0-23), enforced
/// at creation. Aggregate counters mirror per-email terminal states;
/// `emails_sent` never exceeds `total_leads`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: Uuid,
    pub user_id: Uuid,
    pub template_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: CampaignStatus,
    pub strategy: SendingStrategy,
    pub emails_per_hour: u32,
    pub emails_per_day: u32,
    pub send_window_start: u32,
    pub send_window_end: u32,
    pub send_weekdays_only: bool,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub emails_sent: u64,
    pub emails_opened: u64,
    pub emails_clicked: u64,
    pub emails_replied: u64,
    pub emails_bounced: u64,
    pub total_leads: u64,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Snapshot of campaign membership, unique per (campaign, lead).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignLead {
    pub campaign_id: Uuid,
    pub lead_id: Uuid,
}

/// Email lifecycle. `Sending` is the claim state: dequeue atomically
/// moves Queued emails here before the transport call so an overlapping
/// dispatch run cannot pick up the same row twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailStatus {
    Queued,
    Sending,
    Sent,
    Delivered,
    Opened,
    Clicked,
    Replied,
    Bounced,
    Failed,
    Unsubscribed,
}

impl EmailStatus {
    /// Statuses that count against the campaign's hourly/daily quota.
    pub fn counts_as_sent(&self) -> bool {
        matches!(
            self,
            EmailStatus::Sent
                | EmailStatus::Delivered
                | EmailStatus::Opened
                | EmailStatus::Clicked
                | EmailStatus::Replied
        )
    }
}

/// One concrete message instance bound to one lead, one variation, one
/// campaign. Content is rendered once at launch, never at send time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Email {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub lead_id: Uuid,
    pub variation_id: Uuid,
    pub subject: String,
    pub body_html: String,
    pub body_text: String,
    pub status: EmailStatus,
    /// FIFO dequeue key, stamped at creation.
    pub queue_seq: u64,
    pub sent_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub opened_at: Option<DateTime<Utc>>,
    pub clicked_at: Option<DateTime<Utc>>,
    pub replied_at: Option<DateTime<Utc>>,
    pub bounced_at: Option<DateTime<Utc>>,
    /// Provider message id; unique system-wide once set, join key for
    /// asynchronous provider events.
    pub provider_id: Option<String>,
    pub error_message: Option<String>,
    pub retry_count: u32,
    pub created_at: DateTime<Utc>,
}

/// Global suppression entry. Keyed by lowercased address; once present,
/// the address never receives mail from any campaign.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unsubscribe {
    pub email: String,
    pub reason: Option<String>,
    pub unsubscribed_at: DateTime<Utc>,
}
