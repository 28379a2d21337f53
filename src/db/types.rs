use diesel_derive_enum::DbEnum;
use serde::{Deserialize, Serialize};

use std::{fmt, str::FromStr};

/// Kind of a content item.
///
/// Kinds differ in payload and metadata only; the publication workflow is
/// identical for all of them.
#[derive(Clone, Copy, DbEnum, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[DieselType = "Content_kind"]
#[serde(rename_all = "kebab-case")]
pub enum ContentKind {
    /// A long-form insight article.
    Article,
    /// A review of a published book.
    BookReview,
    /// An archived photograph, video, document, or artifact record.
    MediaAsset,
}

impl fmt::Display for ContentKind {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(match *self {
            ContentKind::Article => "article",
            ContentKind::BookReview => "book-review",
            ContentKind::MediaAsset => "media-asset",
        })
    }
}

impl FromStr for ContentKind {
    type Err = ParseContentKindError;

    fn from_str(s: &str) -> Result<ContentKind, ParseContentKindError> {
        match s {
            "article" => Ok(ContentKind::Article),
            "book-review" => Ok(ContentKind::BookReview),
            "media-asset" => Ok(ContentKind::MediaAsset),
            _ => Err(ParseContentKindError(s.to_string())),
        }
    }
}

#[derive(Debug, Fail)]
#[fail(display = "Unknown content kind: {}", _0)]
pub struct ParseContentKindError(String);

/// Publication state of a content item.
///
/// A rejected item returns to `Draft` with its `rejection_reason` retained,
/// so exactly one of these states holds at any time.
#[derive(Clone, Copy, DbEnum, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[DieselType = "Workflow_state"]
#[serde(rename_all = "kebab-case")]
pub enum WorkflowState {
    /// Editable by its author, not publicly visible.
    Draft,
    /// Submitted and awaiting a moderator's decision.
    PendingApproval,
    /// Approved and publicly visible.
    Published,
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(match *self {
            WorkflowState::Draft => "draft",
            WorkflowState::PendingApproval => "pending-approval",
            WorkflowState::Published => "published",
        })
    }
}

/// Decision made on an edit suggestion.
///
/// Transitions only from `Pending` to either final value, never back.
#[derive(Clone, Copy, DbEnum, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[DieselType = "Suggestion_decision"]
#[serde(rename_all = "kebab-case")]
pub enum SuggestionDecision {
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for SuggestionDecision {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(match *self {
            SuggestionDecision::Pending => "pending",
            SuggestionDecision::Approved => "approved",
            SuggestionDecision::Rejected => "rejected",
        })
    }
}
