//! Audit log of workflow actions.
//!
//! Every mutation of a content item or suggestion records who did what to
//! which record. Entries are written with the same connection as the change
//! they describe, so an aborted transaction leaves no trace.

use chrono::Utc;
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::db::{
    Connection,
    models as db,
    schema::audit_log,
};

/// Entity responsible for an action.
#[derive(Clone, Copy, Debug)]
pub enum Actor {
    /// System. This actor is used for actions carried automatically by the
    /// system, and actions invoked from the CLI.
    System,
    /// A user.
    User(i32),
}

impl Actor {
    fn as_db(&self) -> Option<i32> {
        match *self {
            Actor::System => None,
            Actor::User(id) => Some(id),
        }
    }
}

impl From<i32> for Actor {
    fn from(id: i32) -> Self {
        Actor::User(id)
    }
}

/// Reference to the record an audit entry concerns.
pub enum ContextId {
    Integer(i32),
    Uuid(Uuid),
    /// The entry concerns the context as a whole, not a single record.
    Global,
}

impl ContextId {
    fn into_db(self) -> (Option<i32>, Option<Uuid>) {
        match self {
            ContextId::Integer(id) => (Some(id), None),
            ContextId::Uuid(id) => (None, Some(id)),
            ContextId::Global => (None, None),
        }
    }
}

impl_from! { for ContextId ;
    i32 => |id| ContextId::Integer(id),
    Uuid => |id| ContextId::Uuid(id),
}

/// Store an event in the audit log.
///
/// This function takes an explicit database connection and can safely be
/// used inside an existing transaction, only adding the entry when the
/// transaction is committed.
pub fn log_db<A, I, D>(
    db: &Connection,
    actor: A,
    context: &str,
    context_id: I,
    kind: &str,
    data: D,
)
where
    Actor: From<A>,
    ContextId: From<I>,
    D: Serialize,
{
    let actor = Actor::from(actor).as_db();
    let (context_id, context_uuid) = ContextId::from(context_id).into_db();

    let data = rmps::to_vec_named(&data).expect("invalid audit log data");

    diesel::insert_into(audit_log::table)
        .values(&db::NewAuditEntry {
            timestamp: Utc::now().naive_utc(),
            actor,
            context,
            context_id,
            context_uuid,
            kind,
            data: &data,
        })
        .execute(db)
        .expect("could not save audit log entry");
}
