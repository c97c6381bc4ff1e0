//! Correlation index
//!
//! Source issues are joined to target issues through the "GitHub ID" custom
//! field. Source comments are joined to target comments through the token at
//! the start of every synchronized comment body, e.g.
//! `Comment [(ID 123)|https://...]`.

use std::sync::Arc;
use std::time::Duration;

use issuesync_domain::{
    CustomFieldKey, FieldIds, Result, SyncError, SyncSettings, TargetComment, TargetIssue,
};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::ports::TargetTracker;

static COMMENT_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Comment \[\(ID (\d+)\)\|").expect("COMMENT_TOKEN should compile - this is a bug")
});

/// Source comment id encoded at the start of a target comment body
pub fn parse_comment_token(body: &str) -> Option<u64> {
    COMMENT_TOKEN.captures(body).and_then(|caps| caps.get(1)).and_then(|m| m.as_str().parse().ok())
}

pub fn has_comment_token(body: &str) -> bool {
    COMMENT_TOKEN.is_match(body)
}

/// First comment whose token carries `source_comment_id`
pub fn match_comment(comments: &[TargetComment], source_comment_id: u64) -> Option<&TargetComment> {
    comments.iter().find(|c| parse_comment_token(&c.body) == Some(source_comment_id))
}

/// Bounded exponential backoff for lookups that may race a concurrent create
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_settings(settings: &SyncSettings) -> Self {
        Self {
            attempts: settings.correlation_attempts.max(1),
            initial_delay: Duration::from_millis(settings.correlation_initial_delay_ms),
            max_delay: Duration::from_millis(settings.correlation_max_delay_ms),
        }
    }

    /// Single attempt, no waiting
    pub fn none() -> Self {
        Self { attempts: 1, initial_delay: Duration::ZERO, max_delay: Duration::ZERO }
    }

    /// Delay before retry number `retry` (1-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        let delay = self.initial_delay.saturating_mul(1u32 << exponent);
        delay.min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&SyncSettings::default())
    }
}

/// Lookup of target issues and comments by their source identity
pub struct CorrelationIndex {
    target: Arc<dyn TargetTracker>,
    field_ids: FieldIds,
    retry: RetryPolicy,
}

impl CorrelationIndex {
    pub fn new(target: Arc<dyn TargetTracker>, field_ids: FieldIds, retry: RetryPolicy) -> Self {
        Self { target, field_ids, retry }
    }

    /// Resolved custom field ids used in correlation queries
    pub fn field_ids(&self) -> &FieldIds {
        &self.field_ids
    }

    /// Query selecting the target issue of one source issue
    pub fn issue_query(&self, project_key: &str, source_issue_id: u64) -> Result<String> {
        let clause = self.field_ids.clause_id(CustomFieldKey::GithubId)?;
        Ok(format!("project='{project_key}' AND cf[{clause}] = {source_issue_id}"))
    }

    /// Locate the target issue of a source issue.
    ///
    /// Zero matches is [`SyncError::NotFound`]; more than one is
    /// [`SyncError::AmbiguousCorrelation`].
    pub async fn find_issue(&self, project_key: &str, source_issue_id: u64) -> Result<TargetIssue> {
        let query = self.issue_query(project_key, source_issue_id)?;
        let mut found = self.target.search_issues(&query).await?;
        match found.len() {
            0 => Err(SyncError::NotFound(format!("Issue not exists: {query}"))),
            1 => Ok(found.remove(0)),
            matches => Err(SyncError::AmbiguousCorrelation { query, matches }),
        }
    }

    /// Like [`find_issue`](Self::find_issue), but retries a miss with backoff
    /// so an event racing the creating event can still find its issue.
    pub async fn await_issue(&self, project_key: &str, source_issue_id: u64) -> Result<TargetIssue> {
        let mut attempt = 1;
        loop {
            match self.find_issue(project_key, source_issue_id).await {
                Err(err) if err.is_not_found() && attempt < self.retry.attempts => {
                    let delay = self.retry.delay_for(attempt);
                    debug!(
                        project_key,
                        source_issue_id,
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "target issue not visible yet, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    /// Locate the target comment carrying `source_comment_id`
    pub async fn find_comment(
        &self,
        target_issue_id: &str,
        source_comment_id: u64,
    ) -> Result<TargetComment> {
        let comments = self.target.list_comments(target_issue_id).await?;
        match_comment(&comments, source_comment_id).cloned().ok_or_else(|| {
            SyncError::NotFound(format!(
                "Corresponded comment {source_comment_id} not exists on {target_issue_id}"
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(id: &str, body: &str) -> TargetComment {
        TargetComment { id: id.to_string(), body: body.to_string() }
    }

    #[test]
    fn parses_token_at_start_of_body() {
        let body = "Comment [(ID 4711)|https://github.com/o/r/issues/1#c] from GitHub user [a|b] at 10:00 AM";
        assert_eq!(parse_comment_token(body), Some(4711));
        assert!(has_comment_token(body));
    }

    #[test]
    fn ignores_token_not_at_start() {
        assert_eq!(parse_comment_token("note: Comment [(ID 1)|x]"), None);
        assert_eq!(parse_comment_token("manual comment"), None);
        assert!(!has_comment_token(""));
    }

    #[test]
    fn matches_exact_id_only() {
        let comments = vec![
            comment("1", "manual"),
            comment("2", "Comment [(ID 12)|u] from GitHub user"),
            comment("3", "Comment [(ID 123)|u] from GitHub user"),
        ];
        assert_eq!(match_comment(&comments, 123).map(|c| c.id.as_str()), Some("3"));
        assert_eq!(match_comment(&comments, 12).map(|c| c.id.as_str()), Some("2"));
        assert!(match_comment(&comments, 1).is_none());
    }

    #[test]
    fn backoff_doubles_up_to_cap() {
        let policy = RetryPolicy {
            attempts: 5,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(350),
        };
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(350));
        assert_eq!(policy.delay_for(40), Duration::from_millis(350));
    }
}
