use chrono::Utc;
use diesel::{
    Connection as _Connection,
    prelude::*,
    result::Error as DbError,
};

use crate::{
    audit,
    db::{
        Connection,
        models as db,
        schema::{content_items, edit_suggestions},
        types::{SuggestionDecision, WorkflowState},
    },
    error::{ErrorKind, WorkflowError},
    events::Notification,
    permissions::Actor,
};
use super::{ContentItem, EditGrant};

/// A proposed edit to a published content item.
///
/// Suggestions carry prose ("fix the typo in the second paragraph"), not
/// patches; an approved suggestion hands its author a one-shot
/// [`EditGrant`](super::EditGrant) with which they make the edit themselves.
#[derive(Debug)]
pub struct EditSuggestion {
    data: db::EditSuggestion,
    item: db::ContentItem,
}

impl EditSuggestion {
    /// Propose an edit to a published item.
    ///
    /// `suggested_by` is `None` for anonymous suggesters. Returns the
    /// suggestion together with the notification to the item's author, which
    /// is suppressed for self-suggestions.
    pub fn create(
        dbconn: &Connection,
        item: &ContentItem,
        suggested_by: Option<i32>,
        text: &str,
    ) -> Result<(EditSuggestion, Option<Notification>), CreateSuggestionError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(CreateSuggestionError::Empty);
        }

        ensure_published(item.state)?;

        let data = dbconn.transaction::<_, CreateSuggestionError, _>(|| {
            let data = diesel::insert_into(edit_suggestions::table)
                .values(&db::NewEditSuggestion {
                    item: item.id,
                    suggested_by,
                    suggestion_text: text,
                    created_at: Utc::now().naive_utc(),
                })
                .get_result::<db::EditSuggestion>(dbconn)?;

            let actor = suggested_by
                .map_or(audit::Actor::System, audit::Actor::User);
            audit::log_db(
                dbconn, actor, "edit-suggestions", data.id, "create", ());

            Ok(data)
        })?;

        let notification = Notification::edit_suggested(
            item.author, suggested_by, item.id, data.id);

        Ok((
            EditSuggestion { data, item: (**item).clone() },
            notification,
        ))
    }

    /// Find a suggestion by ID.
    pub fn by_id(dbconn: &Connection, id: i32)
    -> Result<EditSuggestion, FindSuggestionError> {
        edit_suggestions::table
            .filter(edit_suggestions::id.eq(id))
            .inner_join(content_items::table)
            .get_result::<(db::EditSuggestion, db::ContentItem)>(dbconn)
            .optional()?
            .ok_or(FindSuggestionError::NotFound)
            .map(|(data, item)| EditSuggestion { data, item })
    }

    /// Get all suggestions made for an item, newest first.
    pub fn all_of(dbconn: &Connection, item: &ContentItem)
    -> Result<Vec<EditSuggestion>, DbError> {
        edit_suggestions::table
            .filter(edit_suggestions::item.eq(item.id))
            .order(edit_suggestions::created_at.desc())
            .get_results::<db::EditSuggestion>(dbconn)
            .map(|v| {
                v.into_iter()
                    .map(|data| EditSuggestion {
                        data,
                        item: (**item).clone(),
                    })
                    .collect()
            })
    }

    /// Accept this suggestion, granting its author a one-shot edit
    /// capability on the item.
    ///
    /// Returns the notification to the suggester, or `None` for anonymous
    /// suggesters. For those the approval is a terminal state with nothing
    /// left to do, since there is nobody to hand the grant to.
    pub fn approve(&mut self, dbconn: &Connection, actor: &Actor)
    -> Result<Option<Notification>, DecideSuggestionError> {
        if actor.id != self.item.author {
            return Err(DecideSuggestionError::NotAuthor);
        }

        let data = dbconn.transaction::<_, DecideSuggestionError, _>(|| {
            let updated = diesel::update(edit_suggestions::table
                .filter(edit_suggestions::id.eq(self.data.id)
                    .and(edit_suggestions::decision
                        .eq(SuggestionDecision::Pending))))
                .set(edit_suggestions::decision
                    .eq(SuggestionDecision::Approved))
                .get_result::<db::EditSuggestion>(dbconn)
                .optional()?;

            let data = match updated {
                Some(data) => data,
                None => return Err(DecideSuggestionError::AlreadyDecided(
                    current_decision(dbconn, self.data.id)?)),
            };

            if let Some(user) = data.suggested_by {
                EditGrant::create(dbconn, data.item, user, data.id)?;
            }

            audit::log_db(
                dbconn, actor.id, "edit-suggestions", data.id, "approve", ());

            Ok(data)
        })?;

        self.data = data;

        Ok(Notification::suggestion_approved(
            self.data.suggested_by, self.data.item, self.data.id))
    }

    /// Decline this suggestion.
    pub fn reject(
        &mut self,
        dbconn: &Connection,
        actor: &Actor,
        reason: &str,
    ) -> Result<Option<Notification>, DecideSuggestionError> {
        if actor.id != self.item.author {
            return Err(DecideSuggestionError::NotAuthor);
        }

        let data = dbconn.transaction::<_, DecideSuggestionError, _>(|| {
            let updated = diesel::update(edit_suggestions::table
                .filter(edit_suggestions::id.eq(self.data.id)
                    .and(edit_suggestions::decision
                        .eq(SuggestionDecision::Pending))))
                .set((
                    edit_suggestions::decision
                        .eq(SuggestionDecision::Rejected),
                    edit_suggestions::rejection_reason.eq(reason),
                ))
                .get_result::<db::EditSuggestion>(dbconn)
                .optional()?;

            let data = match updated {
                Some(data) => data,
                None => return Err(DecideSuggestionError::AlreadyDecided(
                    current_decision(dbconn, self.data.id)?)),
            };

            audit::log_db(
                dbconn, actor.id, "edit-suggestions", data.id, "reject",
                LogRejection { reason });

            Ok(data)
        })?;

        self.data = data;

        Ok(Notification::suggestion_rejected(
            self.data.suggested_by, self.data.item, self.data.id, reason))
    }
}

impl std::ops::Deref for EditSuggestion {
    type Target = db::EditSuggestion;

    fn deref(&self) -> &db::EditSuggestion {
        &self.data
    }
}

/// Edits can only be suggested on published items.
fn ensure_published(state: WorkflowState)
-> Result<(), CreateSuggestionError> {
    match state {
        WorkflowState::Published => Ok(()),
        state => Err(CreateSuggestionError::NotPublished(state)),
    }
}

/// Read a suggestion's current decision, for error reporting after a
/// conditional update matched no rows.
fn current_decision(dbconn: &Connection, id: i32)
-> Result<SuggestionDecision, DbError> {
    edit_suggestions::table
        .filter(edit_suggestions::id.eq(id))
        .select(edit_suggestions::decision)
        .get_result(dbconn)
}

#[derive(Debug, Fail)]
pub enum CreateSuggestionError {
    /// Database error.
    #[fail(display = "Database error: {}", _0)]
    Database(#[cause] DbError),
    /// The suggestion text was empty.
    #[fail(display = "Suggestion text must not be empty")]
    Empty,
    /// Edits can only be suggested on published items.
    #[fail(display = "Cannot suggest edits to {} content", _0)]
    NotPublished(WorkflowState),
}

impl_from! { for CreateSuggestionError ;
    DbError => |e| CreateSuggestionError::Database(e),
}

impl WorkflowError for CreateSuggestionError {
    fn kind(&self) -> ErrorKind {
        match *self {
            CreateSuggestionError::Database(_) => ErrorKind::Internal,
            CreateSuggestionError::Empty => ErrorKind::ValidationFailed,
            CreateSuggestionError::NotPublished(_) => ErrorKind::InvalidState,
        }
    }

    fn code(&self) -> Option<&str> {
        match *self {
            CreateSuggestionError::Database(_) => None,
            CreateSuggestionError::Empty => Some("suggestion:create:empty"),
            CreateSuggestionError::NotPublished(_) =>
                Some("suggestion:create:not-published"),
        }
    }
}

#[derive(Debug, Fail)]
pub enum FindSuggestionError {
    /// Database error.
    #[fail(display = "Database error: {}", _0)]
    Database(#[cause] DbError),
    /// No suggestion found matching given criteria.
    #[fail(display = "No such suggestion")]
    NotFound,
}

impl_from! { for FindSuggestionError ;
    DbError => |e| FindSuggestionError::Database(e),
}

impl WorkflowError for FindSuggestionError {
    fn kind(&self) -> ErrorKind {
        match *self {
            FindSuggestionError::Database(_) => ErrorKind::Internal,
            FindSuggestionError::NotFound => ErrorKind::NotFound,
        }
    }

    fn code(&self) -> Option<&str> {
        match *self {
            FindSuggestionError::Database(_) => None,
            FindSuggestionError::NotFound => Some("suggestion:not-found"),
        }
    }
}

#[derive(Debug, Fail)]
pub enum DecideSuggestionError {
    /// Database error.
    #[fail(display = "Database error: {}", _0)]
    Database(#[cause] DbError),
    /// Only the item's author may decide its suggestions.
    #[fail(display = "Only the item's author may decide this suggestion")]
    NotAuthor,
    /// The suggestion has already been decided.
    #[fail(display = "Suggestion was already {}", _0)]
    AlreadyDecided(SuggestionDecision),
}

impl_from! { for DecideSuggestionError ;
    DbError => |e| DecideSuggestionError::Database(e),
}

impl WorkflowError for DecideSuggestionError {
    fn kind(&self) -> ErrorKind {
        match *self {
            DecideSuggestionError::Database(_) => ErrorKind::Internal,
            DecideSuggestionError::NotAuthor => ErrorKind::Forbidden,
            DecideSuggestionError::AlreadyDecided(_) => ErrorKind::InvalidState,
        }
    }

    fn code(&self) -> Option<&str> {
        match *self {
            DecideSuggestionError::Database(_) => None,
            DecideSuggestionError::NotAuthor =>
                Some("suggestion:decide:not-author"),
            DecideSuggestionError::AlreadyDecided(_) =>
                Some("suggestion:decide:already-decided"),
        }
    }
}

#[derive(Serialize)]
struct LogRejection<'a> {
    reason: &'a str,
}

#[cfg(test)]
mod tests {
    use crate::error::{ErrorKind, WorkflowError};

    use super::*;

    #[test]
    fn suggestions_target_published_items_only() {
        ensure_published(WorkflowState::Published).unwrap();

        for &state in &[WorkflowState::Draft, WorkflowState::PendingApproval] {
            let err = ensure_published(state).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidState);
            assert_eq!(err.code(), Some("suggestion:create:not-published"));
        }
    }

    #[test]
    fn decision_errors_classify_for_callers() {
        assert_eq!(
            DecideSuggestionError::NotAuthor.kind(),
            ErrorKind::Forbidden,
        );

        let err = DecideSuggestionError::AlreadyDecided(
            SuggestionDecision::Approved);
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(err.code(), Some("suggestion:decide:already-decided"));
    }
}
