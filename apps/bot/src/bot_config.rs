use std::collections::HashSet;
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use chrono::TimeDelta;
use floodgate_application::ModerationConfig;
use floodgate_core::{AppError, AppResult, UserId};
use floodgate_domain::{EscalationPolicy, FloodPolicy, LinkClassifier, SettingsDefaults};
use tracing_subscriber::EnvFilter;

/// Where strike counters are persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrikeStoreConfig {
    Postgres,
    Redis { url: String },
}

/// Immutable runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub bot_token: String,
    pub bot_username: Option<String>,
    pub public_url: String,
    pub webhook_secret: String,
    pub admin_ids: HashSet<UserId>,
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub strike_store: StrikeStoreConfig,
    pub moderation: ModerationConfig,
    pub settings_defaults: SettingsDefaults,
}

impl BotConfig {
    pub fn load() -> AppResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let source = Source { lookup: &lookup };

        let bot_token = source.required("BOT_TOKEN")?;
        let public_url = source
            .required("PUBLIC_URL")?
            .trim_end_matches('/')
            .to_owned();
        let webhook_secret = source
            .optional("WEBHOOK_SECRET")
            .unwrap_or_else(|| bot_token.clone());
        let bot_username = source
            .optional("BOT_USERNAME")
            .map(|name| name.trim_start_matches('@').to_owned());
        let admin_ids = source
            .optional("ADMIN_IDS")
            .map(|value| parse_admin_ids(value.as_str()))
            .unwrap_or_default();

        let host = source
            .optional("BOT_HOST")
            .unwrap_or_else(|| "0.0.0.0".to_owned());
        let port = source.parse_or("PORT", 8080_u16)?;
        let database_url = source.required("DATABASE_URL")?;

        let strike_store = match source
            .optional("STRIKE_STORE")
            .unwrap_or_else(|| "postgres".to_owned())
            .to_lowercase()
            .as_str()
        {
            "postgres" => StrikeStoreConfig::Postgres,
            "redis" => StrikeStoreConfig::Redis {
                url: source.required("REDIS_URL")?,
            },
            other => {
                return Err(AppError::Configuration(format!(
                    "STRIKE_STORE must be either 'postgres' or 'redis', got '{other}'"
                )));
            }
        };

        let flood_policy = FloodPolicy::new(
            source.parse_or("FLOOD_WINDOW_SEC", 8_i64)?,
            source.parse_or("FLOOD_MAX_MSG", 6_usize)?,
            source.parse_or("REPEAT_MAX", 3_usize)?,
        )
        .map_err(|error| AppError::Configuration(error.to_string()))?;

        let link_spam_enabled = source
            .optional("LINK_SPAM_ENABLED")
            .is_none_or(|value| is_truthy(value.as_str()));
        let allow_list = source
            .optional("LINK_ALLOWLIST")
            .map(|value| split_list(value.as_str()))
            .unwrap_or_default();
        let link_classifier = LinkClassifier::new(link_spam_enabled).with_allow_list(allow_list);

        let mute_seconds = source.parse_or("MUTE_DURATION_SEC", 0_i64)?;
        let mute_duration = match mute_seconds {
            0 => None,
            seconds if seconds > 0 => Some(seconds_delta("MUTE_DURATION_SEC", seconds)?),
            _ => {
                return Err(AppError::Configuration(
                    "MUTE_DURATION_SEC must not be negative".to_owned(),
                ));
            }
        };

        let platform_timeout_ms = source.parse_or("PLATFORM_TIMEOUT_MS", 5_000_u64)?;
        if platform_timeout_ms == 0 {
            return Err(AppError::Configuration(
                "PLATFORM_TIMEOUT_MS must be greater than zero".to_owned(),
            ));
        }

        let idle_eviction_seconds = source.parse_or("RATE_IDLE_EVICT_SEC", 3_600_i64)?;
        if idle_eviction_seconds <= 0 {
            return Err(AppError::Configuration(
                "RATE_IDLE_EVICT_SEC must be greater than zero".to_owned(),
            ));
        }

        let defaults = SettingsDefaults::default();
        let settings_defaults = SettingsDefaults {
            welcome_text: source
                .optional("DEFAULT_WELCOME")
                .unwrap_or(defaults.welcome_text),
            rules_text: source
                .optional("DEFAULT_RULES")
                .unwrap_or(defaults.rules_text),
        };

        Ok(Self {
            bot_token,
            bot_username,
            public_url,
            webhook_secret,
            admin_ids,
            host,
            port,
            database_url,
            strike_store,
            moderation: ModerationConfig {
                flood_policy,
                link_classifier,
                escalation: EscalationPolicy::default(),
                mute_duration,
                platform_timeout: Duration::from_millis(platform_timeout_ms),
                idle_eviction: seconds_delta("RATE_IDLE_EVICT_SEC", idle_eviction_seconds)?,
            },
            settings_defaults,
        })
    }

    pub fn webhook_url(&self) -> String {
        format!("{}/webhook/{}", self.public_url, self.webhook_secret)
    }

    pub fn socket_address(&self) -> AppResult<SocketAddr> {
        let host = IpAddr::from_str(&self.host).map_err(|error| {
            AppError::Configuration(format!("invalid BOT_HOST '{}': {error}", self.host))
        })?;
        Ok(SocketAddr::from((host, self.port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

struct Source<'a, F: Fn(&str) -> Option<String>> {
    lookup: &'a F,
}

impl<F: Fn(&str) -> Option<String>> Source<'_, F> {
    fn optional(&self, name: &str) -> Option<String> {
        (self.lookup)(name)
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
    }

    fn required(&self, name: &str) -> AppResult<String> {
        self.optional(name)
            .ok_or_else(|| AppError::Configuration(format!("{name} is required")))
    }

    fn parse_or<T>(&self, name: &str, default: T) -> AppResult<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.optional(name) {
            Some(value) => value.parse::<T>().map_err(|error| {
                AppError::Configuration(format!("invalid {name} value '{value}': {error}"))
            }),
            None => Ok(default),
        }
    }
}

fn parse_admin_ids(value: &str) -> HashSet<UserId> {
    split_list(value)
        .into_iter()
        .filter_map(|item| item.parse::<i64>().ok())
        .map(UserId::new)
        .collect()
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_owned)
        .collect()
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn seconds_delta(name: &str, seconds: i64) -> AppResult<TimeDelta> {
    TimeDelta::try_seconds(seconds)
        .ok_or_else(|| AppError::Configuration(format!("{name} value {seconds} is out of range")))
}
