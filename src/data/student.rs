use crate::{
    data::DataType,
    error::{EmailSnafu, FieldTooLongSnafu, MakeQuerySnafu, MissingStudentSnafu, RosterResult},
};
use chrono::{DateTime, Utc};
use email_address::EmailAddress;
use futures::{StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use snafu::{ResultExt, ensure};
use sqlx::{FromRow, PgConnection, Pool, Postgres};
use std::{fmt, str::FromStr};

pub const NAME_MAX_CHARS: usize = 100;
pub const GENDER_MAX_CHARS: usize = 10;

/// One roster record. `id` and `created_at` are assigned on insert and never
/// change afterwards.
#[derive(Debug, Clone)]
pub struct Student {
    pub id: i32,
    pub name: String,
    pub age: i32,
    pub gender: String,
    pub email: EmailAddress,
    pub created_at: DateTime<Utc>,
}

/// The caller-supplied fields of a record. Note the absence of `id` and
/// `created_at` - those belong to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentDraft {
    pub name: String,
    pub age: i32,
    pub gender: String,
    pub email: EmailAddress,
}

impl StudentDraft {
    /// Length checks the persistence layer would otherwise surface as opaque
    /// column violations. Email shape and integer age are already enforced by
    /// the field types at the deserialization boundary.
    pub fn validate(&self) -> RosterResult<()> {
        let name_len = self.name.chars().count();
        ensure!(
            name_len <= NAME_MAX_CHARS,
            FieldTooLongSnafu {
                field: "name",
                len: name_len,
                max: NAME_MAX_CHARS,
            }
        );

        let gender_len = self.gender.chars().count();
        ensure!(
            gender_len <= GENDER_MAX_CHARS,
            FieldTooLongSnafu {
                field: "gender",
                len: gender_len,
                max: GENDER_MAX_CHARS,
            }
        );

        Ok(())
    }
}

//the human-readable label for a record is its name, nothing more
impl fmt::Display for Student {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(FromRow)]
struct StudentRow {
    id: i32,
    name: String,
    age: i32,
    gender: String,
    email: String,
    created_at: DateTime<Utc>,
}

impl StudentRow {
    fn into_student(self) -> RosterResult<Student> {
        let email = EmailAddress::from_str(&self.email).context(EmailSnafu)?;

        Ok(Student {
            id: self.id,
            name: self.name,
            age: self.age,
            gender: self.gender,
            email,
            created_at: self.created_at,
        })
    }
}

impl DataType for Student {
    type Id = i32;
    type Draft = StudentDraft;

    async fn get_from_db_by_id(
        id: Self::Id,
        conn: &mut PgConnection,
    ) -> RosterResult<Option<Self>> {
        let Some(row) = sqlx::query_as::<_, StudentRow>(
            "SELECT id, name, age, gender, email, created_at FROM students WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(conn)
        .await
        .context(MakeQuerySnafu)?
        else {
            return Ok(None);
        };

        row.into_student().map(Some)
    }

    async fn get_all(pool: &Pool<Postgres>) -> RosterResult<Vec<Self>> {
        sqlx::query_as::<_, StudentRow>(
            "SELECT id, name, age, gender, email, created_at FROM students ORDER BY id",
        )
        .fetch(pool)
        .map(|row| row.context(MakeQuerySnafu).and_then(StudentRow::into_student))
        .try_collect()
        .await
    }

    async fn insert_into_database(
        draft: Self::Draft,
        created_at: DateTime<Utc>,
        conn: &mut PgConnection,
    ) -> RosterResult<Self::Id> {
        draft.validate()?;
        let StudentDraft {
            name,
            age,
            gender,
            email,
        } = draft;

        sqlx::query_scalar::<_, i32>(
            "INSERT INTO students (name, age, gender, email, created_at) VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(name)
        .bind(age)
        .bind(gender)
        .bind(email.as_str())
        .bind(created_at)
        .fetch_one(conn)
        .await
        .context(MakeQuerySnafu)
    }

    async fn update_in_database(
        id: Self::Id,
        draft: Self::Draft,
        conn: &mut PgConnection,
    ) -> RosterResult<()> {
        draft.validate()?;
        let StudentDraft {
            name,
            age,
            gender,
            email,
        } = draft;

        let rows_affected = sqlx::query(
            "UPDATE students SET name = $2, age = $3, gender = $4, email = $5 WHERE id = $1",
        )
        .bind(id)
        .bind(name)
        .bind(age)
        .bind(gender)
        .bind(email.as_str())
        .execute(conn)
        .await
        .context(MakeQuerySnafu)?
        .rows_affected();

        ensure!(rows_affected > 0, MissingStudentSnafu { id });
        Ok(())
    }

    async fn remove_from_database(id: Self::Id, conn: &mut PgConnection) -> RosterResult<()> {
        let rows_affected = sqlx::query("DELETE FROM students WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await
            .context(MakeQuerySnafu)?
            .rows_affected();

        ensure!(rows_affected > 0, MissingStudentSnafu { id });
        Ok(())
    }
}

/// How many records share each `gender` value.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct GenderCount {
    pub gender: String,
    pub count: i64,
}

impl Student {
    pub async fn gender_breakdown(pool: &Pool<Postgres>) -> RosterResult<Vec<GenderCount>> {
        sqlx::query_as::<_, GenderCount>(
            "SELECT gender, COUNT(*) AS count FROM students GROUP BY gender ORDER BY count DESC, gender",
        )
        .fetch_all(pool)
        .await
        .context(MakeQuerySnafu)
    }
}
