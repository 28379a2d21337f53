use chrono::NaiveDateTime;
use serde_json::Value;
use uuid::Uuid;

use super::{schema::*, types::*};

#[derive(Clone, Debug, Identifiable, Queryable)]
pub struct ContentItem {
    pub id: Uuid,
    pub kind: ContentKind,
    /// ID of the user who authored this item. Identity is managed by the
    /// host application; only the numeric ID is stored here.
    pub author: i32,
    /// Kind-specific payload. Opaque to the workflow.
    pub payload: Value,
    pub state: WorkflowState,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    /// Date this item was last submitted for approval.
    pub submitted_at: Option<NaiveDateTime>,
    /// Date of first publication. Set once, never cleared afterwards.
    pub published_at: Option<NaiveDateTime>,
    /// Reason given by the moderator who rejected the last submission.
    /// Cleared when the item is submitted again.
    pub rejection_reason: Option<String>,
}

#[derive(Clone, Debug, Insertable)]
#[table_name = "content_items"]
pub struct NewContentItem {
    pub id: Uuid,
    pub kind: ContentKind,
    pub author: i32,
    pub payload: Value,
    pub state: WorkflowState,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Clone, Debug, Identifiable, Queryable)]
pub struct EditSuggestion {
    pub id: i32,
    /// ID of the content item this suggestion concerns.
    pub item: Uuid,
    /// ID of the suggesting user. `None` for anonymous suggesters.
    pub suggested_by: Option<i32>,
    pub suggestion_text: String,
    pub created_at: NaiveDateTime,
    pub decision: SuggestionDecision,
    /// Reason given by the author when declining this suggestion.
    pub rejection_reason: Option<String>,
}

#[derive(Clone, Debug, Insertable)]
#[table_name = "edit_suggestions"]
pub struct NewEditSuggestion<'a> {
    pub item: Uuid,
    pub suggested_by: Option<i32>,
    pub suggestion_text: &'a str,
    pub created_at: NaiveDateTime,
}

#[derive(Clone, Copy, Debug, Identifiable, Queryable)]
#[primary_key(item, user)]
pub struct EditGrant {
    /// Item this grant allows editing.
    pub item: Uuid,
    /// User the capability was granted to.
    pub user: i32,
    /// Suggestion whose approval produced this grant.
    pub suggestion: i32,
    pub granted_at: NaiveDateTime,
}

#[derive(Clone, Copy, Debug, Insertable)]
#[table_name = "edit_grants"]
pub struct NewEditGrant {
    pub item: Uuid,
    pub user: i32,
    pub suggestion: i32,
    pub granted_at: NaiveDateTime,
}

#[derive(Clone, Copy, Debug, Insertable)]
#[table_name = "audit_log"]
pub struct NewAuditEntry<'a> {
    pub timestamp: NaiveDateTime,
    pub actor: Option<i32>,
    pub context: &'a str,
    pub context_id: Option<i32>,
    pub context_uuid: Option<Uuid>,
    pub kind: &'a str,
    pub data: &'a [u8],
}
