//! Process configuration structures
//!
//! Keys are kebab-case so existing `config.toml` files keep working. The
//! flat `github-username` / `jira-baseurl` style keys are still accepted and
//! folded into the `[github]` and `[jira]` sections by
//! [`Config::apply_legacy_keys`].

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CORRELATION_ATTEMPTS, DEFAULT_CORRELATION_INITIAL_DELAY_MS,
    DEFAULT_CORRELATION_MAX_DELAY_MS, DEFAULT_DISPLAY_TIMEZONE, DEFAULT_GITHUB_BASE_URL,
    DEFAULT_ISSUE_CONCURRENCY, DEFAULT_LISTEN_PORT, DEFAULT_MARKDOWN_TIMEOUT_SECS,
    DEFAULT_WATERMARK_PATH,
};
use crate::errors::{Result, SyncError};

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
    #[serde(default = "default_true")]
    pub do_presync: bool,
    #[serde(default, alias = "use-lastsynctimefile")]
    pub use_watermark: bool,
    #[serde(default = "default_watermark_path")]
    pub watermark_path: PathBuf,
    #[serde(default)]
    pub github_sincetime: Option<DateTime<Utc>>,
    #[serde(default = "default_display_timezone")]
    pub display_timezone: String,
    #[serde(default)]
    pub reconcile_interval_secs: u64,

    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub jira: JiraConfig,
    #[serde(default)]
    pub markdown: MarkdownConfig,
    #[serde(default)]
    pub sync: SyncSettings,

    /// Source repository name to target project binding
    #[serde(default, rename = "repo")]
    pub repos: BTreeMap<String, RepositorySyncConfig>,
    /// Target project key to fix versions
    #[serde(default)]
    pub fix_versions: HashMap<String, Vec<String>>,
    /// Target project key to affects versions
    #[serde(default)]
    pub affects_versions: HashMap<String, Vec<String>>,
    /// Source login to target user name
    #[serde(default)]
    pub assignee: HashMap<String, String>,

    #[serde(default, skip_serializing)]
    pub github_username: Option<String>,
    #[serde(default, skip_serializing)]
    pub github_password: Option<String>,
    #[serde(default, skip_serializing)]
    pub jira_username: Option<String>,
    #[serde(default, skip_serializing)]
    pub jira_password: Option<String>,
    #[serde(default, skip_serializing)]
    pub jira_baseurl: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Source forge credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GithubConfig {
    #[serde(default = "default_github_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self { base_url: default_github_base_url(), username: String::new(), password: String::new() }
    }
}

/// Target tracker credentials
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct JiraConfig {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// External markdown converter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MarkdownConfig {
    /// Absent means bodies are passed through unchanged
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_markdown_timeout")]
    pub timeout_secs: u64,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self { command: None, args: Vec::new(), timeout_secs: default_markdown_timeout() }
    }
}

/// Tuning for correlation retries and reconciliation fan-out
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SyncSettings {
    #[serde(default = "default_correlation_attempts")]
    pub correlation_attempts: u32,
    #[serde(default = "default_correlation_initial_delay_ms")]
    pub correlation_initial_delay_ms: u64,
    #[serde(default = "default_correlation_max_delay_ms")]
    pub correlation_max_delay_ms: u64,
    #[serde(default = "default_issue_concurrency")]
    pub issue_concurrency: usize,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            correlation_attempts: default_correlation_attempts(),
            correlation_initial_delay_ms: default_correlation_initial_delay_ms(),
            correlation_max_delay_ms: default_correlation_max_delay_ms(),
            issue_concurrency: default_issue_concurrency(),
        }
    }
}

/// Binds one source repository to one target project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RepositorySyncConfig {
    #[serde(default)]
    pub github_owner: String,
    #[serde(default)]
    pub jira_project: String,
    #[serde(default)]
    pub jira_components: Vec<String>,
    #[serde(default)]
    pub jira_issuetype: String,
    /// Also store the source issue URL in the "GitHub URL" field
    #[serde(default)]
    pub carry_source_url: bool,
    #[serde(default)]
    pub issuetype_label_map: HashMap<String, String>,
    #[serde(default)]
    pub component_label_map: HashMap<String, String>,
    /// Transition name ("Done", "To Do") to transition ids, applied in order
    #[serde(default)]
    pub transition_map: HashMap<String, Vec<String>>,
}

impl RepositorySyncConfig {
    /// Transition ids for a workflow name; empty when unmapped.
    pub fn transitions(&self, name: &str) -> &[String] {
        self.transition_map.get(name).map_or(&[], Vec::as_slice)
    }
}

impl Config {
    /// Copy flat legacy credential keys into their sections when the section
    /// value is still empty.
    pub fn apply_legacy_keys(&mut self) {
        fill(&mut self.github.username, self.github_username.take());
        fill(&mut self.github.password, self.github_password.take());
        fill(&mut self.jira.username, self.jira_username.take());
        fill(&mut self.jira.password, self.jira_password.take());
        fill(&mut self.jira.base_url, self.jira_baseurl.take());
    }

    /// Check the settings that must be present before the process starts.
    pub fn validate(&self) -> Result<()> {
        if self.jira.base_url.trim().is_empty() {
            return Err(SyncError::Config("JIRA base URL should be given".into()));
        }
        if self.jira.username.is_empty() {
            return Err(SyncError::Config("JIRA username should be given".into()));
        }
        if self.jira.password.is_empty() {
            return Err(SyncError::Config("JIRA password should be given".into()));
        }
        for (name, repo) in &self.repos {
            if repo.jira_project.trim().is_empty() {
                return Err(SyncError::Config(format!("repo '{name}' has no jira-project")));
            }
            if repo.github_owner.trim().is_empty() {
                return Err(SyncError::Config(format!("repo '{name}' has no github-owner")));
            }
        }
        if self.sync.issue_concurrency == 0 {
            return Err(SyncError::Config("sync.issue-concurrency must be at least 1".into()));
        }
        self.timezone()?;
        Ok(())
    }

    /// Display timezone used for attribution timestamps.
    pub fn timezone(&self) -> Result<Tz> {
        self.display_timezone.parse::<Tz>().map_err(|e| {
            SyncError::Config(format!("Invalid display timezone '{}': {e}", self.display_timezone))
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            listen_port: default_listen_port(),
            do_presync: true,
            use_watermark: false,
            watermark_path: default_watermark_path(),
            github_sincetime: None,
            display_timezone: default_display_timezone(),
            reconcile_interval_secs: 0,
            github: GithubConfig::default(),
            jira: JiraConfig::default(),
            markdown: MarkdownConfig::default(),
            sync: SyncSettings::default(),
            repos: BTreeMap::new(),
            fix_versions: HashMap::new(),
            affects_versions: HashMap::new(),
            assignee: HashMap::new(),
            github_username: None,
            github_password: None,
            jira_username: None,
            jira_password: None,
            jira_baseurl: None,
        }
    }
}

fn fill(slot: &mut String, value: Option<String>) {
    if slot.is_empty() {
        if let Some(value) = value {
            *slot = value;
        }
    }
}

fn default_log_level() -> String {
    "debug".to_string()
}

fn default_listen_port() -> u16 {
    DEFAULT_LISTEN_PORT
}

fn default_true() -> bool {
    true
}

fn default_watermark_path() -> PathBuf {
    PathBuf::from(DEFAULT_WATERMARK_PATH)
}

fn default_display_timezone() -> String {
    DEFAULT_DISPLAY_TIMEZONE.to_string()
}

fn default_github_base_url() -> String {
    DEFAULT_GITHUB_BASE_URL.to_string()
}

fn default_markdown_timeout() -> u64 {
    DEFAULT_MARKDOWN_TIMEOUT_SECS
}

fn default_correlation_attempts() -> u32 {
    DEFAULT_CORRELATION_ATTEMPTS
}

fn default_correlation_initial_delay_ms() -> u64 {
    DEFAULT_CORRELATION_INITIAL_DELAY_MS
}

fn default_correlation_max_delay_ms() -> u64 {
    DEFAULT_CORRELATION_MAX_DELAY_MS
}

fn default_issue_concurrency() -> usize {
    DEFAULT_ISSUE_CONCURRENCY
}
