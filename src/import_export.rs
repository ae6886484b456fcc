use crate::{
    data::{
        DataType,
        student::{Student, StudentDraft},
    },
    error::{CommitTransactionSnafu, CsvFlushSnafu, CsvSnafu, RosterError, RosterResult},
    state::RosterState,
};
use email_address::EmailAddress;
use serde::{Deserialize, Serialize};
use snafu::ResultExt;
use std::io::{Read, Write};

/// Row shape for student CSVs, in export header order.
#[derive(Serialize, Deserialize)]
struct CsvStudent {
    name: String,
    age: i32,
    gender: String,
    email: EmailAddress,
}

pub struct ImportOutcome {
    /// Ids assigned to the rows that made it in, in file order.
    pub added: Vec<i32>,
    /// Per-row parse failures; these rows were skipped, not fatal.
    pub syntax_errors: Vec<RosterError>,
}

/// Parses drafts out of a students CSV. Malformed rows are collected rather
/// than abandoning the rest of the file.
pub fn read_students_csv(reader: impl Read) -> (Vec<StudentDraft>, Vec<RosterError>) {
    let mut drafts = vec![];
    let mut syntax_errors = vec![];

    let mut rdr = csv::Reader::from_reader(reader);
    for record in rdr.deserialize::<CsvStudent>() {
        let CsvStudent {
            name,
            age,
            gender,
            email,
        } = match record {
            Ok(x) => x,
            Err(source) => {
                syntax_errors.push(RosterError::Csv { source });
                continue;
            }
        };

        drafts.push(StudentDraft {
            name,
            age,
            gender,
            email,
        });
    }

    (drafts, syntax_errors)
}

pub fn write_students_csv(students: &[Student], writer: impl Write) -> RosterResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for student in students {
        wtr.serialize(CsvStudent {
            name: student.name.clone(),
            age: student.age,
            gender: student.gender.clone(),
            email: student.email.clone(),
        })
        .context(CsvSnafu)?;
    }
    wtr.flush().context(CsvFlushSnafu)
}

/// Inserts every parseable row inside one transaction. A draft that fails
/// validation aborts and rolls back the whole batch; rows the CSV layer could
/// not parse are only reported.
pub async fn import_students(
    state: &RosterState,
    reader: impl Read,
) -> RosterResult<ImportOutcome> {
    let (drafts, syntax_errors) = read_students_csv(reader);

    let mut transaction = state.get_transaction().await?;
    let mut added = Vec::with_capacity(drafts.len());
    for draft in drafts {
        //an early return here drops the transaction, rolling the batch back
        added.push(Student::insert_into_database(draft, state.now(), &mut transaction).await?);
    }
    transaction.commit().await.context(CommitTransactionSnafu)?;

    info!(
        added = added.len(),
        skipped = syntax_errors.len(),
        "students imported"
    );
    Ok(ImportOutcome {
        added,
        syntax_errors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::str::FromStr;

    const GOOD_AND_BAD: &str = "\
name,age,gender,email
Ava Chen,21,female,ava@example.com
Bo Li,abc,male,bo@example.com
Cy Park,19,male,cy@example.com
";

    #[test]
    fn bad_rows_are_collected_not_fatal() {
        let (drafts, syntax_errors) = read_students_csv(GOOD_AND_BAD.as_bytes());

        assert_eq!(syntax_errors.len(), 1);
        assert_eq!(
            drafts
                .iter()
                .map(|draft| draft.name.as_str())
                .collect::<Vec<_>>(),
            ["Ava Chen", "Cy Park"]
        );
    }

    #[test]
    fn export_is_readable_by_the_importer() {
        let students = vec![Student {
            id: 1,
            name: "Ava Chen".to_string(),
            age: 21,
            gender: "female".to_string(),
            email: EmailAddress::from_str("ava@example.com").expect("valid email"),
            created_at: Utc.with_ymd_and_hms(2026, 8, 6, 9, 0, 0).unwrap(),
        }];

        let mut out = vec![];
        write_students_csv(&students, &mut out).expect("write to vec");

        let text = String::from_utf8(out).expect("utf8");
        assert!(text.starts_with("name,age,gender,email\n"));

        let (drafts, syntax_errors) = read_students_csv(text.as_bytes());
        assert!(syntax_errors.is_empty());
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].name, "Ava Chen");
        assert_eq!(drafts[0].age, 21);
    }

    #[test]
    fn oversized_fields_survive_parsing_and_fail_at_validation() {
        //the csv layer only cares about shape; lengths are the store's call
        let long_name = "a".repeat(101);
        let file = format!("name,age,gender,email\n{long_name},21,female,ava@example.com\n");

        let (drafts, syntax_errors) = read_students_csv(file.as_bytes());
        assert!(syntax_errors.is_empty());
        assert_eq!(drafts.len(), 1);
        assert!(drafts[0].validate().is_err());
    }
}
