use crate::error::{ApplySchemaSnafu, RosterResult};
use snafu::ResultExt;
use sqlx::PgConnection;
use std::{fmt::Write as _, sync::LazyLock};

/// One column of a persisted table.
#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
    pub name: &'static str,
    pub sql_type: &'static str,
    pub constraints: &'static str,
}

/// Declarative description of a persisted table. These are the source of
/// truth for the storage layout; nothing else in the crate issues DDL.
#[derive(Debug, Clone, Copy)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [ColumnDef],
}

impl TableDef {
    #[must_use]
    pub fn create_sql(&self) -> String {
        let mut sql = format!("CREATE TABLE IF NOT EXISTS {} (", self.name);
        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            let _ = write!(sql, "{} {}", column.name, column.sql_type);
            if !column.constraints.is_empty() {
                let _ = write!(sql, " {}", column.constraints);
            }
        }
        sql.push(')');
        sql
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&'static ColumnDef> {
        self.columns.iter().find(|column| column.name == name)
    }
}

pub static STUDENTS: TableDef = TableDef {
    name: "students",
    columns: &[
        ColumnDef {
            name: "id",
            sql_type: "SERIAL",
            constraints: "PRIMARY KEY",
        },
        ColumnDef {
            name: "name",
            sql_type: "VARCHAR(100)",
            constraints: "NOT NULL",
        },
        ColumnDef {
            name: "age",
            sql_type: "INTEGER",
            constraints: "NOT NULL",
        },
        ColumnDef {
            name: "gender",
            sql_type: "VARCHAR(10)",
            constraints: "NOT NULL",
        },
        ColumnDef {
            name: "email",
            sql_type: "TEXT",
            constraints: "NOT NULL",
        },
        ColumnDef {
            name: "created_at",
            sql_type: "TIMESTAMPTZ",
            constraints: "NOT NULL",
        },
    ],
};

/// Every table this crate owns, registered once and never mutated at runtime.
pub static REGISTRY: LazyLock<Vec<&'static TableDef>> = LazyLock::new(|| vec![&STUDENTS]);

/// Idempotently applies the registry. Called once when a state is built.
pub async fn ensure_schema(conn: &mut PgConnection) -> RosterResult<()> {
    for table in REGISTRY.iter() {
        sqlx::query(&table.create_sql())
            .execute(&mut *conn)
            .await
            .context(ApplySchemaSnafu { table: table.name })?;
        debug!(table = table.name, "table ensured");
    }
    Ok(())
}
