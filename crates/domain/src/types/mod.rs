//! Domain types shared by the engine and its adapters
//!
//! - [`source`]: issues and comments as the code forge reports them
//! - [`target`]: the tracker-side view plus the projections pushed to it
//! - [`events`]: webhook payloads

pub mod events;
pub mod source;
pub mod target;

pub use events::{CommentAction, IssueCommentEvent, IssuesAction, IssuesEvent, WebhookEvent};
pub use source::{IssueState, SourceComment, SourceIssue, SourceLabel, SourceRepository, SourceUser};
pub use target::{FieldDefinition, IssueProjection, IssueUpdate, TargetComment, TargetIssue};
