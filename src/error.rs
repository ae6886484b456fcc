use snafu::Snafu;
use std::num::ParseIntError;

pub type RosterResult<T> = Result<T, RosterError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum RosterError {
    #[snafu(display("Error opening database"))]
    OpenDatabase { source: sqlx::Error },
    #[snafu(display("Error getting db connection"))]
    GetDatabaseConnection { source: sqlx::Error },
    #[snafu(display("Error making SQL query"))]
    MakeQuery { source: sqlx::Error },
    #[snafu(display("Error committing SQL transaction"))]
    CommitTransaction { source: sqlx::Error },
    #[snafu(display("Error applying schema for table {:?}", table))]
    ApplySchema {
        source: sqlx::Error,
        table: &'static str,
    },
    #[snafu(display("Unable to retrieve env var `{}`", name))]
    BadEnvVar {
        source: dotenvy::Error,
        name: &'static str,
    },
    #[snafu(display("Unable to parse DB port"))]
    ParsePort { source: ParseIntError },
    #[snafu(display("Unable to parse DB pool size"))]
    ParsePoolSize { source: ParseIntError },
    #[snafu(display("Error parsing email address"))]
    Email { source: email_address::Error },
    #[snafu(display("Field {} is {} characters long, max is {}", field, len, max))]
    FieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },
    #[snafu(display("Unable to find student with id: {}", id))]
    MissingStudent { id: i32 },
    #[snafu(display("Error with CSVs"))]
    Csv { source: csv::Error },
    #[snafu(display("Error flushing CSV output"))]
    CsvFlush { source: std::io::Error },
}
