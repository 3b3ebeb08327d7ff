use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// 邮件通知配置 (可选，host 留空则只记录历史不发信)
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub dir: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: "data/logs".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MailConfig {
    /// SMTP server host (empty disables mail delivery)
    #[serde(default)]
    pub host: String,
    /// SMTP port, STARTTLS (default: 587)
    #[serde(default = "default_mail_port")]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Sender address (falls back to username when empty)
    #[serde(default)]
    pub from: String,
    /// Subject line for notification mails
    #[serde(default = "default_mail_subject")]
    pub subject: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_mail_port(),
            username: String::new(),
            password: String::new(),
            from: String::new(),
            subject: default_mail_subject(),
        }
    }
}

impl MailConfig {
    pub fn is_configured(&self) -> bool {
        !self.host.is_empty()
    }

    pub fn sender(&self) -> &str {
        if self.from.is_empty() {
            &self.username
        } else {
            &self.from
        }
    }
}

fn default_mail_port() -> u16 {
    587
}

fn default_mail_subject() -> String {
    "红包问题通知".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    /// HTTP request timeout in seconds (default: 30)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct SchedulerConfig {
    /// Red-packet poll schedule, 6-field cron (default: "00 * * * * *")
    #[serde(default = "default_question_cron")]
    pub question_cron: String,
    /// Publisher watch schedule (default: "30 * * * * *")
    /// Offsets are staggered so the three watch kinds never fire together
    #[serde(default = "default_publisher_cron")]
    pub publisher_cron: String,
    /// Answer watch schedule (default: "55 * * * * *")
    #[serde(default = "default_answer_cron")]
    pub answer_cron: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            question_cron: default_question_cron(),
            publisher_cron: default_publisher_cron(),
            answer_cron: default_answer_cron(),
        }
    }
}

fn default_question_cron() -> String {
    "00 * * * * *".to_string()
}

fn default_publisher_cron() -> String {
    "30 * * * * *".to_string()
}

fn default_answer_cron() -> String {
    "55 * * * * *".to_string()
}

impl Config {
    pub fn load() -> Result<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("config.toml").required(false))
            .add_source(config::Environment::with_prefix("RW").separator("__"));

        builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    pub fn log_level(&self) -> tracing::Level {
        match self.logging.level.to_lowercase().as_str() {
            "error" => tracing::Level::ERROR,
            "warn" => tracing::Level::WARN,
            "info" => tracing::Level::INFO,
            "debug" => tracing::Level::DEBUG,
            "trace" => tracing::Level::TRACE,
            _ => tracing::Level::INFO,
        }
    }
}
