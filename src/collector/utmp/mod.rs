//! Direct decoding of the Linux login database (`/var/run/utmp`).
//!
//! Used on hosts where the C library's `getutxent` family is not usable.
//! The database is an array of fixed-size records; see [`layout`] for the
//! per-architecture field tables.

pub mod layout;
pub mod reader;
pub mod record;

pub use layout::{DEFAULT_UTMP_PATH, RecordLayout};
pub use reader::{RecordScan, SessionStoreReader, decode_records};
pub use record::{DecodeError, LoginRecord, RecordType, TimeVal, decode_record, fixed_text};
