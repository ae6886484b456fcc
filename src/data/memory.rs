use crate::{
    clock::{Clock, SystemClock},
    data::student::{GenderCount, Student, StudentDraft},
    error::{MissingStudentSnafu, RosterResult},
};
use snafu::ensure;
use std::collections::BTreeMap;

/// In-memory roster with the same semantics as the Postgres store, for tests
/// and for embedding without a database.
///
/// The id sequence is explicit and never reused within the roster's lifetime,
/// matching the database sequence. `created_at` always comes from the
/// injected clock.
#[derive(Debug)]
pub struct MemoryRoster<C = SystemClock> {
    clock: C,
    next_id: i32,
    rows: BTreeMap<i32, Student>,
}

impl Default for MemoryRoster {
    fn default() -> Self {
        Self::new(SystemClock)
    }
}

impl<C: Clock> MemoryRoster<C> {
    pub const fn new(clock: C) -> Self {
        Self {
            clock,
            next_id: 1,
            rows: BTreeMap::new(),
        }
    }

    pub fn add(&mut self, draft: StudentDraft) -> RosterResult<i32> {
        draft.validate()?;
        let StudentDraft {
            name,
            age,
            gender,
            email,
        } = draft;

        let id = self.next_id;
        self.next_id += 1;

        self.rows.insert(
            id,
            Student {
                id,
                name,
                age,
                gender,
                email,
                created_at: self.clock.now(),
            },
        );
        Ok(id)
    }

    #[must_use]
    pub fn get(&self, id: i32) -> Option<&Student> {
        self.rows.get(&id)
    }

    /// All records in id order.
    pub fn all(&self) -> impl Iterator<Item = &Student> {
        self.rows.values()
    }

    pub fn update(&mut self, id: i32, draft: StudentDraft) -> RosterResult<()> {
        draft.validate()?;
        let Some(existing) = self.rows.get_mut(&id) else {
            return MissingStudentSnafu { id }.fail();
        };

        let StudentDraft {
            name,
            age,
            gender,
            email,
        } = draft;

        //id and created_at deliberately untouched
        existing.name = name;
        existing.age = age;
        existing.gender = gender;
        existing.email = email;
        Ok(())
    }

    pub fn remove(&mut self, id: i32) -> RosterResult<()> {
        ensure!(self.rows.remove(&id).is_some(), MissingStudentSnafu { id });
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Same ordering as the SQL aggregate: count descending, then gender.
    #[must_use]
    pub fn gender_breakdown(&self) -> Vec<GenderCount> {
        let mut counts: BTreeMap<&str, i64> = BTreeMap::new();
        for student in self.rows.values() {
            *counts.entry(student.gender.as_str()).or_default() += 1;
        }

        let mut breakdown: Vec<GenderCount> = counts
            .into_iter()
            .map(|(gender, count)| GenderCount {
                gender: gender.to_string(),
                count,
            })
            .collect();
        breakdown.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.gender.cmp(&b.gender)));
        breakdown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{clock::FixedClock, error::RosterError};
    use chrono::{TimeZone, Utc};
    use email_address::EmailAddress;
    use std::str::FromStr;

    fn fixed_clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2026, 8, 6, 9, 0, 0).unwrap())
    }

    fn ava() -> StudentDraft {
        StudentDraft {
            name: "Ava Chen".to_string(),
            age: 21,
            gender: "female".to_string(),
            email: EmailAddress::from_str("ava@example.com").expect("valid email"),
        }
    }

    #[test]
    fn create_assigns_id_and_timestamp_and_label_matches() {
        let clock = fixed_clock();
        let mut roster = MemoryRoster::new(clock);

        let id = roster.add(ava()).expect("valid draft");
        let student = roster.get(id).expect("just added");

        assert_eq!(student.to_string(), "Ava Chen");
        assert_eq!(student.id, id);
        assert_eq!(student.created_at, clock.0);
    }

    #[test]
    fn every_record_gets_a_distinct_id() {
        let mut roster = MemoryRoster::new(fixed_clock());

        let ids: Vec<i32> = (0..5)
            .map(|_| roster.add(ava()).expect("valid draft"))
            .collect();

        let mut deduped = ids.clone();
        deduped.dedup();
        assert_eq!(ids, deduped);
        assert_eq!(roster.len(), 5);
    }

    #[test]
    fn identical_drafts_both_succeed_with_distinct_ids() {
        let mut roster = MemoryRoster::new(fixed_clock());

        let first = roster.add(ava()).expect("valid draft");
        let second = roster.add(ava()).expect("no uniqueness constraint on fields");
        assert_ne!(first, second);
    }

    #[test]
    fn update_preserves_id_and_created_at() {
        let mut roster = MemoryRoster::new(fixed_clock());
        let id = roster.add(ava()).expect("valid draft");
        let created_at = roster.get(id).expect("present").created_at;

        let mut older = ava();
        older.age = 22;
        roster.update(id, older).expect("record exists");

        let student = roster.get(id).expect("still present");
        assert_eq!(student.age, 22);
        assert_eq!(student.id, id);
        assert_eq!(student.created_at, created_at);
    }

    #[test]
    fn ids_are_not_reused_after_removal() {
        let mut roster = MemoryRoster::new(fixed_clock());
        let first = roster.add(ava()).expect("valid draft");
        roster.remove(first).expect("present");

        let second = roster.add(ava()).expect("valid draft");
        assert_ne!(first, second);
    }

    #[test]
    fn touching_a_missing_record_errors() {
        let mut roster = MemoryRoster::new(fixed_clock());

        assert!(matches!(
            roster.remove(42),
            Err(RosterError::MissingStudent { id: 42 })
        ));
        assert!(matches!(
            roster.update(42, ava()),
            Err(RosterError::MissingStudent { id: 42 })
        ));
        assert!(roster.get(42).is_none());
    }

    #[test]
    fn oversized_draft_is_rejected_before_any_state_changes() {
        let mut roster = MemoryRoster::new(fixed_clock());

        let mut bad = ava();
        bad.name = "a".repeat(101);
        assert!(roster.add(bad).is_err());
        assert!(roster.is_empty());
    }

    #[test]
    fn gender_breakdown_counts_and_orders() {
        let mut roster = MemoryRoster::new(fixed_clock());
        for gender in ["Male", "Female", "Male", "Other", "Male"] {
            let mut draft = ava();
            draft.gender = gender.to_string();
            roster.add(draft).expect("valid draft");
        }

        let breakdown = roster.gender_breakdown();
        assert_eq!(
            breakdown,
            vec![
                GenderCount {
                    gender: "Male".to_string(),
                    count: 3,
                },
                GenderCount {
                    gender: "Female".to_string(),
                    count: 1,
                },
                GenderCount {
                    gender: "Other".to_string(),
                    count: 1,
                },
            ]
        );
    }
}
