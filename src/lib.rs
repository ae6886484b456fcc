#![warn(clippy::pedantic, clippy::all, clippy::nursery)]
#![allow(clippy::single_match_else)]

//! Student roster records: the persisted `Student` type, its validation rules,
//! and its access pattern against Postgres (plus a deterministic in-memory
//! twin). The surrounding web layer is expected to live in the embedding
//! application.

#[macro_use]
extern crate tracing;

pub mod clock;
pub mod config;
pub mod data;
pub mod error;
pub mod import_export;
pub mod schema;
pub mod state;

pub use clock::{Clock, FixedClock, SystemClock};
pub use data::memory::MemoryRoster;
pub use data::student::{GenderCount, Student, StudentDraft};
pub use email_address::EmailAddress;
pub use error::{RosterError, RosterResult};
pub use state::RosterState;
