use std::env;
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub identity_seed: String,
    pub server_port: u16,
    pub slot_interval_minutes: u32,
    pub cancellation_notice_hours: i64,
    pub default_timezone: String,
    pub notification_max_retries: u32,
    pub notification_retry_backoff_ms: u64,
    pub notification_webhook_url: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            identity_seed: env::var("IDENTITY_SEED").unwrap_or_default(),
            server_port: parse_or("SERVER_PORT", 3000),
            slot_interval_minutes: parse_or("SLOT_INTERVAL_MINUTES", 30),
            cancellation_notice_hours: parse_or("CANCELLATION_NOTICE_HOURS", 24),
            default_timezone: env::var("DEFAULT_TIMEZONE")
                .unwrap_or_else(|_| "UTC".to_string()),
            notification_max_retries: parse_or("NOTIFICATION_MAX_RETRIES", 3),
            notification_retry_backoff_ms: parse_or("NOTIFICATION_RETRY_BACKOFF_MS", 200),
            notification_webhook_url: env::var("NOTIFICATION_WEBHOOK_URL")
                .ok()
                .filter(|url| !url.is_empty()),
        };

        if !config.is_supabase_configured() {
            warn!("Supabase not configured - identities resolve from IDENTITY_SEED");
        }

        config
    }

    pub fn is_supabase_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_anon_key.is_empty()
    }

    pub fn scheduling_rules(&self) -> SchedulingRules {
        SchedulingRules {
            slot_interval_minutes: self.slot_interval_minutes,
            cancellation_notice_hours: self.cancellation_notice_hours,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            identity_seed: String::new(),
            server_port: 3000,
            slot_interval_minutes: 30,
            cancellation_notice_hours: 24,
            default_timezone: "UTC".to_string(),
            notification_max_retries: 3,
            notification_retry_backoff_ms: 200,
            notification_webhook_url: None,
        }
    }
}

/// Business rules shared by the booking engine, lifecycle and slot listing.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SchedulingRules {
    pub slot_interval_minutes: u32,
    pub cancellation_notice_hours: i64,
}

impl Default for SchedulingRules {
    fn default() -> Self {
        Self {
            slot_interval_minutes: 30,
            cancellation_notice_hours: 24, // cancel or delete only with a day's notice
        }
    }
}

fn parse_or<T: FromStr + Copy + std::fmt::Display>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}
