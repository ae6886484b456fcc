use crate::{
    clock::{Clock, SystemClock},
    config::RuntimeConfiguration,
    data::{
        DataType,
        student::{GenderCount, Student, StudentDraft},
    },
    error::{GetDatabaseConnectionSnafu, OpenDatabaseSnafu, RosterResult},
    schema,
};
use chrono::{DateTime, Utc};
use snafu::ResultExt;
use sqlx::{Pool, Postgres, Transaction, pool::PoolConnection, postgres::PgPoolOptions};
use std::{ops::Deref, sync::Arc};

/// Central handle: connection pool, configuration, and the clock every
/// creation timestamp flows from.
#[derive(Clone)]
pub struct RosterState {
    pool: Pool<Postgres>,
    config: RuntimeConfiguration,
    clock: Arc<dyn Clock>,
}

impl RosterState {
    pub async fn new(config: RuntimeConfiguration) -> RosterResult<Self> {
        Self::with_clock(config, SystemClock).await
    }

    /// Connects, ensures the schema registry is applied, and pins the clock.
    pub async fn with_clock(
        config: RuntimeConfiguration,
        clock: impl Clock + 'static,
    ) -> RosterResult<Self> {
        let db_config = config.db_config();
        let pool = PgPoolOptions::new()
            .max_connections(db_config.max_connections())
            .connect(&db_config.connection_url())
            .await
            .context(OpenDatabaseSnafu)?;

        let mut conn = pool.acquire().await.context(GetDatabaseConnectionSnafu)?;
        schema::ensure_schema(&mut conn).await?;
        drop(conn);

        info!("roster state online");

        Ok(Self {
            pool,
            config,
            clock: Arc::new(clock),
        })
    }

    pub async fn get_connection(&self) -> RosterResult<PoolConnection<Postgres>> {
        self.pool
            .acquire()
            .await
            .context(GetDatabaseConnectionSnafu)
    }

    pub async fn get_transaction(&self) -> RosterResult<Transaction<'_, Postgres>> {
        self.pool.begin().await.context(GetDatabaseConnectionSnafu)
    }

    #[must_use]
    pub const fn config(&self) -> &RuntimeConfiguration {
        &self.config
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub async fn add_student(&self, draft: StudentDraft) -> RosterResult<i32> {
        let mut conn = self.get_connection().await?;
        let id = Student::insert_into_database(draft, self.now(), &mut conn).await?;
        debug!(id, "student added");
        Ok(id)
    }

    pub async fn student(&self, id: i32) -> RosterResult<Option<Student>> {
        let mut conn = self.get_connection().await?;
        Student::get_from_db_by_id(id, &mut conn).await
    }

    pub async fn all_students(&self) -> RosterResult<Vec<Student>> {
        Student::get_all(&self.pool).await
    }

    pub async fn update_student(&self, id: i32, draft: StudentDraft) -> RosterResult<()> {
        let mut conn = self.get_connection().await?;
        Student::update_in_database(id, draft, &mut conn).await
    }

    pub async fn remove_student(&self, id: i32) -> RosterResult<()> {
        let mut conn = self.get_connection().await?;
        Student::remove_from_database(id, &mut conn).await?;
        debug!(id, "student removed");
        Ok(())
    }

    pub async fn gender_breakdown(&self) -> RosterResult<Vec<GenderCount>> {
        Student::gender_breakdown(&self.pool).await
    }
}

impl Deref for RosterState {
    type Target = Pool<Postgres>;

    fn deref(&self) -> &Self::Target {
        &self.pool
    }
}
