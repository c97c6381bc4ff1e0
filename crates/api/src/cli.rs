//! Command-line interface

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use issuesync_domain::Config;

/// Keeps a ticket tracker in step with code forge issues
#[derive(Parser, Debug, Default)]
#[command(name = "issuesync", version, about)]
pub struct Cli {
    /// Path to the TOML or JSON config file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log level: debug, info, warn, error
    #[arg(short = 'L', long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Port used to listen for webhooks
    #[arg(long)]
    pub listen_port: Option<u16>,

    /// Run one reconciliation pass before serving
    #[arg(long, value_name = "BOOL", action = ArgAction::Set)]
    pub do_presync: Option<bool>,

    /// Narrow the first query window with the stored watermark
    #[arg(long, alias = "use-lastsynctimefile")]
    pub use_watermark: bool,

    /// Code forge user name
    #[arg(long, value_name = "USER")]
    pub github_username: Option<String>,

    /// Code forge password or token
    #[arg(long, value_name = "TOKEN")]
    pub github_password: Option<String>,

    /// Ticket tracker endpoint URL
    #[arg(long = "jira-baseurl", value_name = "URL")]
    pub jira_base_url: Option<String>,

    /// Ticket tracker user name
    #[arg(long, value_name = "USER")]
    pub jira_username: Option<String>,

    /// Ticket tracker password
    #[arg(long, value_name = "PASSWORD")]
    pub jira_password: Option<String>,
}

impl Cli {
    /// Flags given on the command line win over file and environment values
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(level) = &self.log_level {
            config.log_level.clone_from(level);
        }
        if let Some(port) = self.listen_port {
            config.listen_port = port;
        }
        if let Some(presync) = self.do_presync {
            config.do_presync = presync;
        }
        if self.use_watermark {
            config.use_watermark = true;
        }

        let credentials = [
            (&self.github_username, &mut config.github.username),
            (&self.github_password, &mut config.github.password),
            (&self.jira_base_url, &mut config.jira.base_url),
            (&self.jira_username, &mut config.jira.username),
            (&self.jira_password, &mut config.jira.password),
        ];
        for (flag, slot) in credentials {
            if let Some(value) = flag.as_ref().filter(|v| !v.is_empty()) {
                slot.clone_from(value);
            }
        }
    }
}
