//! Content publication state machine.
//!
//! This module holds the pure transition logic: given the workflow-relevant
//! fields of a content item and an action, it computes the resulting fields
//! or rejects the action with a typed error. Persistence and concurrency are
//! handled by [`crate::models::ContentItem`], which applies a computed
//! transition with a state-guarded conditional update.

use chrono::NaiveDateTime;

use crate::error::{ErrorKind, WorkflowError};

pub use crate::db::types::WorkflowState;

use std::fmt;

/// Workflow-relevant fields of a content item.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Status {
    pub state: WorkflowState,
    pub submitted_at: Option<NaiveDateTime>,
    pub published_at: Option<NaiveDateTime>,
    pub rejection_reason: Option<String>,
}

impl Status {
    /// Status of a freshly created item.
    pub fn new() -> Status {
        Status {
            state: WorkflowState::Draft,
            submitted_at: None,
            published_at: None,
            rejection_reason: None,
        }
    }
}

impl Default for Status {
    fn default() -> Status {
        Status::new()
    }
}

/// Submit a draft for moderation.
///
/// Any previous rejection reason is cleared; whether the draft was rejected
/// before has no bearing on whether it can be submitted again.
pub fn submit(status: &Status, now: NaiveDateTime)
-> Result<Status, TransitionError> {
    match status.state {
        WorkflowState::Draft => Ok(Status {
            state: WorkflowState::PendingApproval,
            submitted_at: Some(now),
            published_at: status.published_at,
            rejection_reason: None,
        }),
        from => Err(TransitionError { from, action: Action::Submit }),
    }
}

/// Publish a submitted item.
///
/// The publication date is set on first publication only; re-approving an
/// item which has been published before keeps the original date.
pub fn approve(status: &Status, now: NaiveDateTime)
-> Result<Status, TransitionError> {
    match status.state {
        WorkflowState::PendingApproval => Ok(Status {
            state: WorkflowState::Published,
            submitted_at: status.submitted_at,
            published_at: status.published_at.or(Some(now)),
            rejection_reason: None,
        }),
        from => Err(TransitionError { from, action: Action::Approve }),
    }
}

/// Send a submitted item back to its author.
///
/// The item returns to [`WorkflowState::Draft`] with the moderator's reason
/// retained, so the author can see why it was declined when revising.
pub fn reject(status: &Status, reason: &str)
-> Result<Status, TransitionError> {
    match status.state {
        WorkflowState::PendingApproval => Ok(Status {
            state: WorkflowState::Draft,
            submitted_at: status.submitted_at,
            published_at: status.published_at,
            rejection_reason: Some(reason.to_string()),
        }),
        from => Err(TransitionError { from, action: Action::Reject }),
    }
}

/// Move a published item back into moderation after a grant-based edit.
///
/// This is the single reverse edge of the state machine. The publication
/// date is not cleared: having been published is permanent history.
pub fn resubmit(status: &Status, now: NaiveDateTime)
-> Result<Status, TransitionError> {
    match status.state {
        WorkflowState::Published => Ok(Status {
            state: WorkflowState::PendingApproval,
            submitted_at: Some(now),
            published_at: status.published_at,
            rejection_reason: None,
        }),
        from => Err(TransitionError { from, action: Action::Resubmit }),
    }
}

/// How an actor may modify a content item's payload.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EditAccess {
    /// The author editing their own draft.
    Author,
    /// A one-shot capability grant on a published item. The edit consumes
    /// the grant and sends the item back to moderation.
    Grant,
}

/// Decide whether an edit to an item's payload is allowed.
///
/// Published items are immutable except through a capability grant; even the
/// author has to go through the suggestion path to change one.
pub fn edit_access(state: WorkflowState, is_author: bool, has_grant: bool)
-> Result<EditAccess, EditAccessError> {
    match state {
        WorkflowState::Draft if is_author => Ok(EditAccess::Author),
        WorkflowState::Draft => Err(EditAccessError::NotAuthor),
        WorkflowState::Published if has_grant => Ok(EditAccess::Grant),
        WorkflowState::Published if is_author =>
            Err(EditAccessError::InvalidState(state)),
        WorkflowState::Published => Err(EditAccessError::NotGranted),
        WorkflowState::PendingApproval =>
            Err(EditAccessError::InvalidState(state)),
    }
}

/// Action that was attempted on a content item.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Action {
    Submit,
    Approve,
    Reject,
    Resubmit,
}

impl fmt::Display for Action {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(match *self {
            Action::Submit => "submit",
            Action::Approve => "approve",
            Action::Reject => "reject",
            Action::Resubmit => "resubmit",
        })
    }
}

#[derive(Debug, Fail)]
#[fail(display = "Cannot {} {} content", action, from)]
pub struct TransitionError {
    pub from: WorkflowState,
    pub action: Action,
}

impl WorkflowError for TransitionError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidState
    }

    fn code(&self) -> Option<&str> {
        Some(match self.action {
            Action::Submit => "item:submit:invalid-state",
            Action::Approve => "item:approve:invalid-state",
            Action::Reject => "item:reject:invalid-state",
            Action::Resubmit => "item:resubmit:invalid-state",
        })
    }
}

#[derive(Debug, Fail)]
pub enum EditAccessError {
    /// Only the author may edit a draft.
    #[fail(display = "Only the author may edit this item")]
    NotAuthor,
    /// Editing a published item requires an unused edit grant.
    #[fail(display = "No edit grant for this published item")]
    NotGranted,
    /// The item's payload cannot be edited directly in this state.
    #[fail(display = "Content cannot be edited while {}", _0)]
    InvalidState(WorkflowState),
}

impl WorkflowError for EditAccessError {
    fn kind(&self) -> ErrorKind {
        match *self {
            EditAccessError::NotAuthor
                | EditAccessError::NotGranted => ErrorKind::Forbidden,
            EditAccessError::InvalidState(_) => ErrorKind::InvalidState,
        }
    }

    fn code(&self) -> Option<&str> {
        Some(match *self {
            EditAccessError::NotAuthor => "item:edit:not-author",
            EditAccessError::NotGranted => "item:edit:not-granted",
            EditAccessError::InvalidState(_) => "item:edit:invalid-state",
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn at(day: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd(2019, 3, day).and_hms(12, 0, 0)
    }

    #[test]
    fn draft_submit_approve_publishes() {
        let draft = Status::new();

        let pending = submit(&draft, at(1)).unwrap();
        assert_eq!(pending.state, WorkflowState::PendingApproval);
        assert_eq!(pending.submitted_at, Some(at(1)));
        assert_eq!(pending.published_at, None);

        let published = approve(&pending, at(2)).unwrap();
        assert_eq!(published.state, WorkflowState::Published);
        assert_eq!(published.published_at, Some(at(2)));
    }

    #[test]
    fn submit_is_draft_only() {
        let mut status = Status::new();
        status.state = WorkflowState::PendingApproval;
        assert!(submit(&status, at(1)).is_err());

        status.state = WorkflowState::Published;
        let err = submit(&status, at(1)).unwrap_err();
        assert_eq!(err.from, WorkflowState::Published);
        assert_eq!(err.action, Action::Submit);
    }

    #[test]
    fn double_approve_fails() {
        let pending = submit(&Status::new(), at(1)).unwrap();
        let published = approve(&pending, at(2)).unwrap();

        let err = approve(&published, at(3)).unwrap_err();
        assert_eq!(err.from, WorkflowState::Published);
        assert_eq!(err.action, Action::Approve);
    }

    #[test]
    fn reject_then_resubmit_clears_reason() {
        let pending = submit(&Status::new(), at(1)).unwrap();

        let rejected = reject(&pending, "needs sources").unwrap();
        assert_eq!(rejected.state, WorkflowState::Draft);
        assert_eq!(rejected.rejection_reason.as_deref(), Some("needs sources"));

        let pending = submit(&rejected, at(3)).unwrap();
        assert_eq!(pending.rejection_reason, None);
        assert_eq!(pending.submitted_at, Some(at(3)));

        let published = approve(&pending, at(4)).unwrap();
        assert_eq!(published.state, WorkflowState::Published);
        assert!(published.published_at.is_some());
    }

    #[test]
    fn reject_requires_pending_approval() {
        assert!(reject(&Status::new(), "no").is_err());

        let published = approve(&submit(&Status::new(), at(1)).unwrap(), at(2))
            .unwrap();
        assert!(reject(&published, "no").is_err());
    }

    #[test]
    fn publication_date_is_monotonic() {
        let published = approve(&submit(&Status::new(), at(1)).unwrap(), at(2))
            .unwrap();

        // A grant-based edit sends the item back through moderation.
        let pending = resubmit(&published, at(5)).unwrap();
        assert_eq!(pending.state, WorkflowState::PendingApproval);
        assert_eq!(pending.published_at, Some(at(2)));
        assert_eq!(pending.submitted_at, Some(at(5)));

        let republished = approve(&pending, at(6)).unwrap();
        assert_eq!(republished.published_at, Some(at(2)));
    }

    #[test]
    fn resubmit_is_published_only() {
        assert!(resubmit(&Status::new(), at(1)).is_err());

        let pending = submit(&Status::new(), at(1)).unwrap();
        assert!(resubmit(&pending, at(2)).is_err());
    }

    #[test]
    fn rejected_published_item_keeps_publication_date() {
        let published = approve(&submit(&Status::new(), at(1)).unwrap(), at(2))
            .unwrap();
        let pending = resubmit(&published, at(3)).unwrap();

        let rejected = reject(&pending, "regression").unwrap();
        assert_eq!(rejected.state, WorkflowState::Draft);
        assert_eq!(rejected.published_at, Some(at(2)));
    }

    #[test]
    fn author_edits_own_draft_only() {
        assert_eq!(
            edit_access(WorkflowState::Draft, true, false).unwrap(),
            EditAccess::Author,
        );
        assert!(match edit_access(WorkflowState::Draft, false, false) {
            Err(EditAccessError::NotAuthor) => true,
            _ => false,
        });
    }

    #[test]
    fn published_edits_require_a_grant() {
        assert_eq!(
            edit_access(WorkflowState::Published, false, true).unwrap(),
            EditAccess::Grant,
        );
        // Without a grant a non-author is simply not allowed ...
        assert!(match edit_access(WorkflowState::Published, false, false) {
            Err(EditAccessError::NotGranted) => true,
            _ => false,
        });
        // ... while the author is sent through the suggestion path.
        assert!(match edit_access(WorkflowState::Published, true, false) {
            Err(EditAccessError::InvalidState(WorkflowState::Published)) => true,
            _ => false,
        });
    }

    #[test]
    fn no_edits_while_pending() {
        for &(is_author, has_grant) in
            &[(true, false), (false, false), (true, true), (false, true)]
        {
            assert!(edit_access(
                WorkflowState::PendingApproval,
                is_author,
                has_grant,
            ).is_err());
        }
    }
}
