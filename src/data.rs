use crate::error::RosterResult;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, Pool, Postgres};

pub mod memory;
pub mod student;

/// CRUD contract for a persisted record type.
pub trait DataType: Sized {
    type Id;
    type Draft;

    async fn get_from_db_by_id(id: Self::Id, conn: &mut PgConnection)
    -> RosterResult<Option<Self>>;
    async fn get_all(pool: &Pool<Postgres>) -> RosterResult<Vec<Self>>;
    /// `created_at` is threaded in from the caller's clock, never taken from
    /// the draft.
    async fn insert_into_database(
        draft: Self::Draft,
        created_at: DateTime<Utc>,
        conn: &mut PgConnection,
    ) -> RosterResult<Self::Id>;
    /// Replaces the mutable fields only. `id` and `created_at` stay put.
    async fn update_in_database(
        id: Self::Id,
        draft: Self::Draft,
        conn: &mut PgConnection,
    ) -> RosterResult<()>;
    async fn remove_from_database(id: Self::Id, conn: &mut PgConnection) -> RosterResult<()>;
}
