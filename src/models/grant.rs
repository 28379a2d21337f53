use chrono::Utc;
use diesel::{prelude::*, result::Error as DbError};
use uuid::Uuid;

use crate::db::{
    Connection,
    models as db,
    schema::edit_grants,
};

/// A one-shot capability allowing a non-author to edit a published item.
///
/// Grants are produced by approving an edit suggestion and consumed by the
/// first successful edit; there is never more than one per (item, user)
/// pair.
#[derive(Debug)]
pub struct EditGrant {
    data: db::EditGrant,
}

impl EditGrant {
    /// Record a grant for a user on an item.
    ///
    /// Approving several suggestions from the same user collapses into a
    /// single grant.
    pub(crate) fn create(
        dbconn: &Connection,
        item: Uuid,
        user: i32,
        suggestion: i32,
    ) -> Result<(), DbError> {
        diesel::insert_into(edit_grants::table)
            .values(&db::NewEditGrant {
                item,
                user,
                suggestion,
                granted_at: Utc::now().naive_utc(),
            })
            .on_conflict_do_nothing()
            .execute(dbconn)?;

        Ok(())
    }

    /// Find the grant a user holds on an item, if any.
    pub fn find(dbconn: &Connection, item: Uuid, user: i32)
    -> Result<Option<EditGrant>, DbError> {
        edit_grants::table
            .filter(edit_grants::item.eq(item)
                .and(edit_grants::user.eq(user)))
            .get_result::<db::EditGrant>(dbconn)
            .optional()
            .map(|data| data.map(|data| EditGrant { data }))
    }

    /// Use up a user's grant on an item.
    ///
    /// Returns whether a grant existed. Deleting and checking the row count
    /// in one statement keeps concurrent edits from sharing a grant.
    pub(crate) fn consume(dbconn: &Connection, item: Uuid, user: i32)
    -> Result<bool, DbError> {
        let deleted = diesel::delete(edit_grants::table
            .filter(edit_grants::item.eq(item)
                .and(edit_grants::user.eq(user))))
            .execute(dbconn)?;

        Ok(deleted == 1)
    }
}

impl std::ops::Deref for EditGrant {
    type Target = db::EditGrant;

    fn deref(&self) -> &db::EditGrant {
        &self.data
    }
}
