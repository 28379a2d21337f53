use chrono::Utc;
use diesel::{
    Connection as _Connection,
    prelude::*,
    result::Error as DbError,
};
use uuid::Uuid;

use crate::{
    audit,
    db::{
        Connection,
        models as db,
        schema::content_items,
        types::{ContentKind, WorkflowState},
    },
    error::{ErrorKind, WorkflowError},
    events::Notification,
    permissions::{Actor, PermissionBits, RequirePermissionsError},
    workflow::{
        self,
        EditAccess,
        EditAccessError,
        Status,
        TransitionError,
    },
};
use super::{
    EditGrant,
    payload::{Payload, ValidateError, validate},
};

/// A single unit of user-authored, moderated content.
#[derive(Debug)]
pub struct ContentItem {
    data: db::ContentItem,
}

impl ContentItem {
    /// Construct `ContentItem` from its database counterpart.
    pub(crate) fn from_db(data: db::ContentItem) -> ContentItem {
        ContentItem { data }
    }

    /// Create a new content item in state [`WorkflowState::Draft`].
    pub fn create(dbconn: &Connection, author: &Actor, payload: &Payload)
    -> Result<ContentItem, CreateItemError> {
        validate(payload)?;

        let value = serde_json::to_value(payload)
            .map_err(CreateItemError::Serialize)?;
        let now = Utc::now().naive_utc();

        let data = dbconn.transaction::<_, CreateItemError, _>(|| {
            let data = diesel::insert_into(content_items::table)
                .values(&db::NewContentItem {
                    id: Uuid::new_v4(),
                    kind: payload.kind(),
                    author: author.id,
                    payload: value,
                    state: WorkflowState::Draft,
                    created_at: now,
                    updated_at: now,
                })
                .get_result::<db::ContentItem>(dbconn)?;

            audit::log_db(
                dbconn, author.id, "content-items", data.id, "create",
                LogNewItem { kind: data.kind });

            Ok(data)
        })?;

        Ok(ContentItem::from_db(data))
    }

    /// Find an item by ID.
    pub fn by_id(dbconn: &Connection, id: Uuid)
    -> Result<ContentItem, FindItemError> {
        content_items::table
            .filter(content_items::id.eq(id))
            .get_result::<db::ContentItem>(dbconn)
            .optional()?
            .ok_or(FindItemError::NotFound)
            .map(ContentItem::from_db)
    }

    /// Get all items authored by a user.
    pub fn all_of(dbconn: &Connection, author: i32)
    -> Result<Vec<ContentItem>, DbError> {
        content_items::table
            .filter(content_items::author.eq(author))
            .order(content_items::created_at.desc())
            .get_results::<db::ContentItem>(dbconn)
            .map(|v| v.into_iter().map(ContentItem::from_db).collect())
    }

    /// Get all items awaiting a moderator's decision, oldest submission
    /// first.
    pub fn pending(dbconn: &Connection, kind: Option<ContentKind>)
    -> Result<Vec<ContentItem>, DbError> {
        let mut query = content_items::table
            .filter(content_items::state.eq(WorkflowState::PendingApproval))
            .order(content_items::submitted_at.asc())
            .into_boxed();

        if let Some(kind) = kind {
            query = query.filter(content_items::kind.eq(kind));
        }

        query
            .get_results::<db::ContentItem>(dbconn)
            .map(|v| v.into_iter().map(ContentItem::from_db).collect())
    }

    /// Unpack database data.
    pub fn into_db(self) -> db::ContentItem {
        self.data
    }

    /// Deserialize this item's payload.
    pub fn payload(&self) -> serde_json::Result<Payload> {
        serde_json::from_value(self.data.payload.clone())
    }

    /// Update this item's payload.
    ///
    /// While an item is a draft its author may save it freely. Once
    /// published, the payload can only be changed through a one-shot edit
    /// grant obtained from an approved suggestion; such an edit consumes the
    /// grant and sends the item back into moderation.
    pub fn save(&mut self, dbconn: &Connection, actor: &Actor, payload: &Payload)
    -> Result<(), SaveItemError> {
        validate(payload)?;

        if payload.kind() != self.data.kind {
            return Err(SaveItemError::KindMismatch {
                expected: self.data.kind,
                actual: payload.kind(),
            });
        }

        let value = serde_json::to_value(payload)
            .map_err(SaveItemError::Serialize)?;
        let is_author = actor.id == self.data.author;
        let now = Utc::now().naive_utc();

        let data = dbconn.transaction::<_, SaveItemError, _>(|| {
            // A grant can only be used once: consume it inside the
            // transaction, before deciding access, so two concurrent edits
            // cannot both succeed on its strength.
            let has_grant = match self.data.state {
                WorkflowState::Published =>
                    EditGrant::consume(dbconn, self.data.id, actor.id)?,
                _ => false,
            };

            let updated = match workflow::edit_access(
                self.data.state, is_author, has_grant)?
            {
                EditAccess::Author => {
                    diesel::update(content_items::table
                        .filter(content_items::id.eq(self.data.id)
                            .and(content_items::state
                                .eq(WorkflowState::Draft))))
                        .set((
                            content_items::payload.eq(value),
                            content_items::updated_at.eq(now),
                        ))
                        .get_result::<db::ContentItem>(dbconn)
                        .optional()?
                }
                EditAccess::Grant => {
                    let status = workflow::resubmit(&self.status(), now)?;

                    diesel::update(content_items::table
                        .filter(content_items::id.eq(self.data.id)
                            .and(content_items::state
                                .eq(WorkflowState::Published))))
                        .set((
                            content_items::payload.eq(value),
                            content_items::state.eq(status.state),
                            content_items::submitted_at.eq(status.submitted_at),
                            content_items::rejection_reason
                                .eq(status.rejection_reason),
                            content_items::updated_at.eq(now),
                        ))
                        .get_result::<db::ContentItem>(dbconn)
                        .optional()?
                }
            };

            let data = match updated {
                Some(data) => data,
                None => return Err(EditAccessError::InvalidState(
                    current_state(dbconn, self.data.id)?).into()),
            };

            audit::log_db(
                dbconn, actor.id, "content-items", data.id, "save",
                LogSave { state: data.state });

            Ok(data)
        })?;

        self.data = data;

        Ok(())
    }

    /// Submit this draft for moderation.
    ///
    /// Submission is silent: moderators poll the queue, so no notification
    /// is produced.
    pub fn submit(&mut self, dbconn: &Connection, actor: &Actor)
    -> Result<(), SubmitItemError> {
        if actor.id != self.data.author {
            return Err(SubmitItemError::NotAuthor);
        }

        let now = Utc::now().naive_utc();
        let status = workflow::submit(&self.status(), now)?;

        let data = dbconn.transaction::<_, SubmitItemError, _>(|| {
            let updated = diesel::update(content_items::table
                .filter(content_items::id.eq(self.data.id)
                    .and(content_items::state.eq(WorkflowState::Draft))))
                .set((
                    content_items::state.eq(status.state),
                    content_items::submitted_at.eq(status.submitted_at),
                    content_items::rejection_reason
                        .eq(status.rejection_reason),
                    content_items::updated_at.eq(now),
                ))
                .get_result::<db::ContentItem>(dbconn)
                .optional()?;

            let data = match updated {
                Some(data) => data,
                None => return Err(TransitionError {
                    from: current_state(dbconn, self.data.id)?,
                    action: workflow::Action::Submit,
                }.into()),
            };

            audit::log_db(
                dbconn, actor.id, "content-items", data.id, "submit", ());

            Ok(data)
        })?;

        self.data = data;

        Ok(())
    }

    /// Publish this submission.
    ///
    /// Returns the notification to the author; the caller dispatches it
    /// after this call returns, so delivery problems cannot affect the
    /// transition.
    pub fn approve(&mut self, dbconn: &Connection, moderator: &Actor)
    -> Result<Notification, ApproveItemError> {
        moderator.permissions.require(PermissionBits::MODERATE_CONTENT)?;

        let now = Utc::now().naive_utc();
        let status = workflow::approve(&self.status(), now)?;

        let data = dbconn.transaction::<_, ApproveItemError, _>(|| {
            let updated = diesel::update(content_items::table
                .filter(content_items::id.eq(self.data.id)
                    .and(content_items::state
                        .eq(WorkflowState::PendingApproval))))
                .set((
                    content_items::state.eq(status.state),
                    content_items::published_at.eq(status.published_at),
                    content_items::rejection_reason
                        .eq(status.rejection_reason),
                    content_items::updated_at.eq(now),
                ))
                .get_result::<db::ContentItem>(dbconn)
                .optional()?;

            let data = match updated {
                Some(data) => data,
                None => return Err(TransitionError {
                    from: current_state(dbconn, self.data.id)?,
                    action: workflow::Action::Approve,
                }.into()),
            };

            audit::log_db(
                dbconn, moderator.id, "content-items", data.id, "approve", ());

            Ok(data)
        })?;

        self.data = data;

        Ok(Notification::post_approved(self.data.author, self.data.id))
    }

    /// Send this submission back to its author.
    pub fn reject(
        &mut self,
        dbconn: &Connection,
        moderator: &Actor,
        reason: &str,
    ) -> Result<Notification, RejectItemError> {
        moderator.permissions.require(PermissionBits::MODERATE_CONTENT)?;

        let now = Utc::now().naive_utc();
        let status = workflow::reject(&self.status(), reason)?;

        let data = dbconn.transaction::<_, RejectItemError, _>(|| {
            let updated = diesel::update(content_items::table
                .filter(content_items::id.eq(self.data.id)
                    .and(content_items::state
                        .eq(WorkflowState::PendingApproval))))
                .set((
                    content_items::state.eq(status.state),
                    content_items::rejection_reason
                        .eq(status.rejection_reason),
                    content_items::updated_at.eq(now),
                ))
                .get_result::<db::ContentItem>(dbconn)
                .optional()?;

            let data = match updated {
                Some(data) => data,
                None => return Err(TransitionError {
                    from: current_state(dbconn, self.data.id)?,
                    action: workflow::Action::Reject,
                }.into()),
            };

            audit::log_db(
                dbconn, moderator.id, "content-items", data.id, "reject",
                LogRejection { reason });

            Ok(data)
        })?;

        self.data = data;

        Ok(Notification::post_rejected(
            self.data.author, self.data.id, reason))
    }

    /// Delete drafts which have not been touched for `days` days.
    ///
    /// This is an administrative action, not part of the workflow proper:
    /// the workflow itself never deletes content. Items awaiting moderation
    /// or published are never affected.
    pub fn purge_stale_drafts(dbconn: &Connection, actor: &Actor, days: u32)
    -> Result<usize, PurgeDraftsError> {
        actor.permissions.require(PermissionBits::DELETE_CONTENT)?;

        let cutoff = Utc::now().naive_utc()
            - chrono::Duration::days(i64::from(days));

        let count = dbconn.transaction::<_, PurgeDraftsError, _>(|| {
            let count = diesel::delete(content_items::table
                .filter(content_items::state.eq(WorkflowState::Draft)
                    .and(content_items::updated_at.lt(cutoff))))
                .execute(dbconn)?;

            audit::log_db(
                dbconn, actor.id, "content-items", audit::ContextId::Global,
                "purge-stale-drafts", LogPurge { days, count });

            Ok(count)
        })?;

        Ok(count)
    }

    fn status(&self) -> Status {
        Status {
            state: self.data.state,
            submitted_at: self.data.submitted_at,
            published_at: self.data.published_at,
            rejection_reason: self.data.rejection_reason.clone(),
        }
    }
}

impl std::ops::Deref for ContentItem {
    type Target = db::ContentItem;

    fn deref(&self) -> &db::ContentItem {
        &self.data
    }
}

/// Read an item's current state, for error reporting after a conditional
/// update matched no rows.
fn current_state(dbconn: &Connection, id: Uuid)
-> Result<WorkflowState, DbError> {
    content_items::table
        .filter(content_items::id.eq(id))
        .select(content_items::state)
        .get_result(dbconn)
}

#[derive(Debug, Fail)]
pub enum CreateItemError {
    /// Database error.
    #[fail(display = "Database error: {}", _0)]
    Database(#[cause] DbError),
    /// Payload was rejected by its validator.
    #[fail(display = "{}", _0)]
    Invalid(#[cause] ValidateError),
    #[fail(display = "Could not serialize payload: {}", _0)]
    Serialize(#[cause] serde_json::Error),
}

impl_from! { for CreateItemError ;
    DbError => |e| CreateItemError::Database(e),
    ValidateError => |e| CreateItemError::Invalid(e),
}

impl WorkflowError for CreateItemError {
    fn kind(&self) -> ErrorKind {
        match *self {
            CreateItemError::Database(_)
                | CreateItemError::Serialize(_) => ErrorKind::Internal,
            CreateItemError::Invalid(ref e) => e.kind(),
        }
    }

    fn code(&self) -> Option<&str> {
        match *self {
            CreateItemError::Database(_)
                | CreateItemError::Serialize(_) => None,
            CreateItemError::Invalid(ref e) => e.code(),
        }
    }
}

#[derive(Debug, Fail)]
pub enum FindItemError {
    /// Database error.
    #[fail(display = "Database error: {}", _0)]
    Database(#[cause] DbError),
    /// No item found matching given criteria.
    #[fail(display = "No such content item")]
    NotFound,
}

impl_from! { for FindItemError ;
    DbError => |e| FindItemError::Database(e),
}

impl WorkflowError for FindItemError {
    fn kind(&self) -> ErrorKind {
        match *self {
            FindItemError::Database(_) => ErrorKind::Internal,
            FindItemError::NotFound => ErrorKind::NotFound,
        }
    }

    fn code(&self) -> Option<&str> {
        match *self {
            FindItemError::Database(_) => None,
            FindItemError::NotFound => Some("item:not-found"),
        }
    }
}

#[derive(Debug, Fail)]
pub enum SaveItemError {
    /// Database error.
    #[fail(display = "Database error: {}", _0)]
    Database(#[cause] DbError),
    /// Payload was rejected by its validator.
    #[fail(display = "{}", _0)]
    Invalid(#[cause] ValidateError),
    #[fail(display = "Could not serialize payload: {}", _0)]
    Serialize(#[cause] serde_json::Error),
    /// The new payload is of a different kind than the item.
    #[fail(display = "Payload kind {} does not match item kind {}",
           actual, expected)]
    KindMismatch {
        expected: ContentKind,
        actual: ContentKind,
    },
    /// The actor may not edit this item.
    #[fail(display = "{}", _0)]
    Access(#[cause] EditAccessError),
    /// The item is not in a state this edit path allows.
    #[fail(display = "{}", _0)]
    Transition(#[cause] TransitionError),
}

impl_from! { for SaveItemError ;
    DbError => |e| SaveItemError::Database(e),
    ValidateError => |e| SaveItemError::Invalid(e),
    EditAccessError => |e| SaveItemError::Access(e),
    TransitionError => |e| SaveItemError::Transition(e),
}

impl WorkflowError for SaveItemError {
    fn kind(&self) -> ErrorKind {
        match *self {
            SaveItemError::Database(_)
                | SaveItemError::Serialize(_) => ErrorKind::Internal,
            SaveItemError::Invalid(ref e) => e.kind(),
            SaveItemError::KindMismatch { .. } => ErrorKind::ValidationFailed,
            SaveItemError::Access(ref e) => e.kind(),
            SaveItemError::Transition(ref e) => e.kind(),
        }
    }

    fn code(&self) -> Option<&str> {
        match *self {
            SaveItemError::Database(_)
                | SaveItemError::Serialize(_) => None,
            SaveItemError::Invalid(ref e) => e.code(),
            SaveItemError::KindMismatch { .. } =>
                Some("item:save:kind-mismatch"),
            SaveItemError::Access(ref e) => e.code(),
            SaveItemError::Transition(ref e) => e.code(),
        }
    }
}

#[derive(Debug, Fail)]
pub enum SubmitItemError {
    /// Database error.
    #[fail(display = "Database error: {}", _0)]
    Database(#[cause] DbError),
    /// Only the author may submit an item.
    #[fail(display = "Only the author may submit this item")]
    NotAuthor,
    /// The item is not in a submittable state.
    #[fail(display = "{}", _0)]
    Transition(#[cause] TransitionError),
}

impl_from! { for SubmitItemError ;
    DbError => |e| SubmitItemError::Database(e),
    TransitionError => |e| SubmitItemError::Transition(e),
}

impl WorkflowError for SubmitItemError {
    fn kind(&self) -> ErrorKind {
        match *self {
            SubmitItemError::Database(_) => ErrorKind::Internal,
            SubmitItemError::NotAuthor => ErrorKind::Forbidden,
            SubmitItemError::Transition(ref e) => e.kind(),
        }
    }

    fn code(&self) -> Option<&str> {
        match *self {
            SubmitItemError::Database(_) => None,
            SubmitItemError::NotAuthor => Some("item:submit:not-author"),
            SubmitItemError::Transition(ref e) => e.code(),
        }
    }
}

#[derive(Debug, Fail)]
pub enum ApproveItemError {
    /// Database error.
    #[fail(display = "Database error: {}", _0)]
    Database(#[cause] DbError),
    /// The actor lacks moderation permissions.
    #[fail(display = "{}", _0)]
    Permissions(#[cause] RequirePermissionsError),
    /// The item is not awaiting approval.
    #[fail(display = "{}", _0)]
    Transition(#[cause] TransitionError),
}

impl_from! { for ApproveItemError ;
    DbError => |e| ApproveItemError::Database(e),
    RequirePermissionsError => |e| ApproveItemError::Permissions(e),
    TransitionError => |e| ApproveItemError::Transition(e),
}

impl WorkflowError for ApproveItemError {
    fn kind(&self) -> ErrorKind {
        match *self {
            ApproveItemError::Database(_) => ErrorKind::Internal,
            ApproveItemError::Permissions(ref e) => e.kind(),
            ApproveItemError::Transition(ref e) => e.kind(),
        }
    }

    fn code(&self) -> Option<&str> {
        match *self {
            ApproveItemError::Database(_) => None,
            ApproveItemError::Permissions(ref e) => e.code(),
            ApproveItemError::Transition(ref e) => e.code(),
        }
    }
}

#[derive(Debug, Fail)]
pub enum RejectItemError {
    /// Database error.
    #[fail(display = "Database error: {}", _0)]
    Database(#[cause] DbError),
    /// The actor lacks moderation permissions.
    #[fail(display = "{}", _0)]
    Permissions(#[cause] RequirePermissionsError),
    /// The item is not awaiting approval.
    #[fail(display = "{}", _0)]
    Transition(#[cause] TransitionError),
}

impl_from! { for RejectItemError ;
    DbError => |e| RejectItemError::Database(e),
    RequirePermissionsError => |e| RejectItemError::Permissions(e),
    TransitionError => |e| RejectItemError::Transition(e),
}

impl WorkflowError for RejectItemError {
    fn kind(&self) -> ErrorKind {
        match *self {
            RejectItemError::Database(_) => ErrorKind::Internal,
            RejectItemError::Permissions(ref e) => e.kind(),
            RejectItemError::Transition(ref e) => e.kind(),
        }
    }

    fn code(&self) -> Option<&str> {
        match *self {
            RejectItemError::Database(_) => None,
            RejectItemError::Permissions(ref e) => e.code(),
            RejectItemError::Transition(ref e) => e.code(),
        }
    }
}

#[derive(Debug, Fail)]
pub enum PurgeDraftsError {
    /// Database error.
    #[fail(display = "Database error: {}", _0)]
    Database(#[cause] DbError),
    /// The actor lacks deletion permissions.
    #[fail(display = "{}", _0)]
    Permissions(#[cause] RequirePermissionsError),
}

impl_from! { for PurgeDraftsError ;
    DbError => |e| PurgeDraftsError::Database(e),
    RequirePermissionsError => |e| PurgeDraftsError::Permissions(e),
}

impl WorkflowError for PurgeDraftsError {
    fn kind(&self) -> ErrorKind {
        match *self {
            PurgeDraftsError::Database(_) => ErrorKind::Internal,
            PurgeDraftsError::Permissions(ref e) => e.kind(),
        }
    }

    fn code(&self) -> Option<&str> {
        match *self {
            PurgeDraftsError::Database(_) => None,
            PurgeDraftsError::Permissions(ref e) => e.code(),
        }
    }
}

#[derive(Serialize)]
struct LogNewItem {
    kind: ContentKind,
}

#[derive(Serialize)]
struct LogSave {
    state: WorkflowState,
}

#[derive(Serialize)]
struct LogRejection<'a> {
    reason: &'a str,
}

#[derive(Serialize)]
struct LogPurge {
    days: u32,
    count: usize,
}
