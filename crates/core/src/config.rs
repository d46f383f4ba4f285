use serde::Deserialize;

/// Root application configuration. Loaded from environment variables
/// with the prefix `OUTREACH__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub sender: SenderConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub ai: AiConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

/// Identity stamped on every outbound message and its compliance footer.
#[derive(Debug, Clone, Deserialize)]
pub struct SenderConfig {
    #[serde(default = "default_sender_email")]
    pub email: String,
    #[serde(default = "default_sender_name")]
    pub name: String,
    /// Base URL used to build unsubscribe links.
    #[serde(default = "default_public_url")]
    pub public_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Dispatch loop period. Tunable, not a correctness requirement.
    #[serde(default = "default_dispatch_interval_secs")]
    pub dispatch_interval_secs: u64,
    /// Performance evaluation period (daily in production).
    #[serde(default = "default_performance_interval_secs")]
    pub performance_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransportConfig {
    /// Bound on a single send; a hung provider call must not stall the
    /// whole batch.
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,
    /// Resend API key.
    #[serde(default)]
    pub api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// Anthropic API key.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_ai_model")]
    pub model: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_http_port() -> u16 {
    8080
}
fn default_metrics_port() -> u16 {
    9091
}
fn default_sender_email() -> String {
    "noreply@outreach.local".to_string()
}
fn default_sender_name() -> String {
    "Outreach Engine".to_string()
}
fn default_public_url() -> String {
    "http://localhost:8080".to_string()
}
fn default_dispatch_interval_secs() -> u64 {
    300
}
fn default_performance_interval_secs() -> u64 {
    86_400
}
fn default_send_timeout_ms() -> u64 {
    10_000
}
fn default_ai_model() -> String {
    "claude-3-5-haiku-20241022".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
            metrics_port: default_metrics_port(),
        }
    }
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            email: default_sender_email(),
            name: default_sender_name(),
            public_url: default_public_url(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            dispatch_interval_secs: default_dispatch_interval_secs(),
            performance_interval_secs: default_performance_interval_secs(),
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            send_timeout_ms: default_send_timeout_ms(),
            api_key: String::new(),
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_ai_model(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            sender: SenderConfig::default(),
            scheduler: SchedulerConfig::default(),
            transport: TransportConfig::default(),
            ai: AiConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("OUTREACH")
                .separator("__")
                .try_parsing(true)
                .list_separator(","),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
