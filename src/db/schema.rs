table! {
    audit_log (id) {
        id -> Int4,
        timestamp -> Timestamp,
        actor -> Nullable<Int4>,
        context -> Varchar,
        context_id -> Nullable<Int4>,
        context_uuid -> Nullable<Uuid>,
        kind -> Varchar,
        data -> Bytea,
    }
}

table! {
    content_items (id) {
        id -> Uuid,
        kind -> crate::db::types::Content_kind,
        author -> Int4,
        payload -> Jsonb,
        state -> crate::db::types::Workflow_state,
        created_at -> Timestamp,
        updated_at -> Timestamp,
        submitted_at -> Nullable<Timestamp>,
        published_at -> Nullable<Timestamp>,
        rejection_reason -> Nullable<Text>,
    }
}

table! {
    edit_grants (item, user) {
        item -> Uuid,
        user -> Int4,
        suggestion -> Int4,
        granted_at -> Timestamp,
    }
}

table! {
    edit_suggestions (id) {
        id -> Int4,
        item -> Uuid,
        suggested_by -> Nullable<Int4>,
        suggestion_text -> Text,
        created_at -> Timestamp,
        decision -> crate::db::types::Suggestion_decision,
        rejection_reason -> Nullable<Text>,
    }
}

joinable!(edit_grants -> content_items (item));
joinable!(edit_grants -> edit_suggestions (suggestion));
joinable!(edit_suggestions -> content_items (item));

allow_tables_to_appear_in_same_query!(
    audit_log,
    content_items,
    edit_grants,
    edit_suggestions,
);
