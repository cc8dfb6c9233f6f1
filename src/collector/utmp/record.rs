//! Decoding of a single login record.
//!
//! [`decode_record`] is a pure function over a byte slice and a
//! [`RecordLayout`]. It never reads outside the slice and performs no
//! validation of field values: records of types the dashboard does not care
//! about may hold arbitrary bytes and are filtered out by the caller.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::layout::{Decode, Field, FieldSpec, RecordLayout, TimeEncoding, USER_PROCESS};

/// Error returned when a buffer cannot be decoded as a login record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The buffer is shorter than one record.
    TooShort { len: usize, need: usize },
    /// A field lies (partly) outside the buffer.
    OutOfBounds {
        field: &'static str,
        offset: usize,
        width: usize,
    },
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::TooShort { len, need } => {
                write!(f, "record too short: {} bytes, need {}", len, need)
            }
            DecodeError::OutOfBounds {
                field,
                offset,
                width,
            } => write!(
                f,
                "field {} at {}..{} is out of bounds",
                field,
                offset,
                offset + width
            ),
        }
    }
}

impl std::error::Error for DecodeError {}

/// `ut_type` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecordType {
    Empty,
    RunLevel,
    BootTime,
    NewTime,
    OldTime,
    InitProcess,
    LoginProcess,
    UserProcess,
    DeadProcess,
    Accounting,
    Unknown(i16),
}

impl RecordType {
    pub fn from_raw(raw: i16) -> Self {
        match raw {
            0 => RecordType::Empty,
            1 => RecordType::RunLevel,
            2 => RecordType::BootTime,
            3 => RecordType::NewTime,
            4 => RecordType::OldTime,
            5 => RecordType::InitProcess,
            6 => RecordType::LoginProcess,
            USER_PROCESS => RecordType::UserProcess,
            8 => RecordType::DeadProcess,
            9 => RecordType::Accounting,
            other => RecordType::Unknown(other),
        }
    }

    pub fn raw(self) -> i16 {
        match self {
            RecordType::Empty => 0,
            RecordType::RunLevel => 1,
            RecordType::BootTime => 2,
            RecordType::NewTime => 3,
            RecordType::OldTime => 4,
            RecordType::InitProcess => 5,
            RecordType::LoginProcess => 6,
            RecordType::UserProcess => USER_PROCESS,
            RecordType::DeadProcess => 8,
            RecordType::Accounting => 9,
            RecordType::Unknown(raw) => raw,
        }
    }
}

/// Seconds and microseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TimeVal {
    pub sec: i64,
    pub usec: i64,
}

impl TimeVal {
    /// `None` for the all-zero value written into unused slots.
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        if self.sec == 0 && self.usec == 0 {
            return None;
        }
        let nanos = u32::try_from(self.usec.clamp(0, 999_999) * 1_000).ok()?;
        DateTime::from_timestamp(self.sec, nanos)
    }
}

/// One decoded slot of the login database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginRecord {
    pub record_type: RecordType,
    pub pid: i32,
    pub line: String,
    pub id: String,
    pub user: String,
    pub host: String,
    pub termination: i16,
    pub exit: i16,
    pub session: i32,
    pub time: TimeVal,
    pub address: [u32; 4],
}

impl LoginRecord {
    /// Whether this record describes a logged-in user process.
    pub fn is_active(&self) -> bool {
        self.record_type == RecordType::UserProcess
    }

    /// `user@host line`, the form shown in the Users panel.
    pub fn session_line(&self) -> String {
        format!("{}@{} {}", self.user, self.host, self.line)
    }

    /// Remote address, if one was recorded.
    ///
    /// A record with only the first word set carries IPv4.
    pub fn ip_addr(&self) -> Option<IpAddr> {
        match self.address {
            [0, 0, 0, 0] => None,
            [v4, 0, 0, 0] => Some(IpAddr::V4(Ipv4Addr::from(v4.to_le_bytes()))),
            words => {
                let mut octets = [0u8; 16];
                for (chunk, word) in octets.chunks_exact_mut(4).zip(words) {
                    chunk.copy_from_slice(&word.to_le_bytes());
                }
                Some(IpAddr::V6(Ipv6Addr::from(octets)))
            }
        }
    }
}

/// Decodes text from a fixed-width, zero-padded buffer.
///
/// Everything before the first zero byte; the whole buffer if there is none.
/// Invalid UTF-8 is replaced rather than rejected.
pub fn fixed_text(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

fn field_bytes<'a>(buf: &'a [u8], spec: &FieldSpec) -> Result<&'a [u8], DecodeError> {
    buf.get(spec.offset..spec.end())
        .ok_or(DecodeError::OutOfBounds {
            field: spec.field.name(),
            offset: spec.offset,
            width: spec.width,
        })
}

fn read_u32(bytes: &[u8], at: usize, spec: &FieldSpec) -> Result<u32, DecodeError> {
    bytes
        .get(at..at + 4)
        .and_then(|b| b.try_into().ok())
        .map(u32::from_le_bytes)
        .ok_or(DecodeError::OutOfBounds {
            field: spec.field.name(),
            offset: spec.offset + at,
            width: 4,
        })
}

fn read_integer(bytes: &[u8], spec: &FieldSpec) -> Result<i32, DecodeError> {
    match *bytes {
        [a, b] => Ok(i16::from_le_bytes([a, b]) as i32),
        [a, b, c, d] => Ok(i32::from_le_bytes([a, b, c, d])),
        _ => Err(DecodeError::OutOfBounds {
            field: spec.field.name(),
            offset: spec.offset,
            width: spec.width,
        }),
    }
}

fn read_time(bytes: &[u8], encoding: TimeEncoding, spec: &FieldSpec) -> Result<TimeVal, DecodeError> {
    let (sec_at, usec_at) = encoding.word_offsets();
    Ok(TimeVal {
        sec: read_u32(bytes, sec_at, spec)? as i64,
        usec: read_u32(bytes, usec_at, spec)? as i64,
    })
}

fn read_address(bytes: &[u8], spec: &FieldSpec) -> Result<[u32; 4], DecodeError> {
    let mut words = [0u32; 4];
    for (i, word) in words.iter_mut().enumerate() {
        *word = read_u32(bytes, i * 4, spec)?;
    }
    Ok(words)
}

/// Decodes one record from the start of `buf`.
///
/// Bytes past `layout.size` are ignored.
pub fn decode_record(buf: &[u8], layout: &RecordLayout) -> Result<LoginRecord, DecodeError> {
    if buf.len() < layout.size {
        return Err(DecodeError::TooShort {
            len: buf.len(),
            need: layout.size,
        });
    }
    let buf = &buf[..layout.size];

    let mut record = LoginRecord {
        record_type: RecordType::Empty,
        pid: 0,
        line: String::new(),
        id: String::new(),
        user: String::new(),
        host: String::new(),
        termination: 0,
        exit: 0,
        session: 0,
        time: TimeVal::default(),
        address: [0; 4],
    };

    for spec in layout.fields {
        let bytes = field_bytes(buf, spec)?;
        match (spec.field, spec.decode) {
            (_, Decode::Reserved) => {}
            (Field::Type, Decode::Integer) => {
                record.record_type = RecordType::from_raw(read_integer(bytes, spec)? as i16)
            }
            (Field::Pid, Decode::Integer) => record.pid = read_integer(bytes, spec)?,
            (Field::Termination, Decode::Integer) => {
                record.termination = read_integer(bytes, spec)? as i16
            }
            (Field::Exit, Decode::Integer) => record.exit = read_integer(bytes, spec)? as i16,
            (Field::Session, Decode::Integer) => record.session = read_integer(bytes, spec)?,
            (Field::Line, Decode::Text) => record.line = fixed_text(bytes),
            (Field::Id, Decode::Text) => record.id = fixed_text(bytes),
            (Field::User, Decode::Text) => record.user = fixed_text(bytes),
            (Field::Host, Decode::Text) => record.host = fixed_text(bytes),
            (Field::Time, Decode::Timestamp(encoding)) => {
                record.time = read_time(bytes, encoding, spec)?
            }
            (Field::Address, Decode::Address) => record.address = read_address(bytes, spec)?,
            _ => {}
        }
    }

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::encode_slot as encode;
    use crate::collector::utmp::layout::{LINUX_AARCH64, LINUX_X86_64};

    #[test]
    fn test_decode_user_process() {
        let buf = encode(&LINUX_AARCH64, 7, "alice", "h", "tty1", 1_700_000_000);
        let record = decode_record(&buf, &LINUX_AARCH64).unwrap();

        assert_eq!(record.record_type, RecordType::UserProcess);
        assert!(record.is_active());
        assert_eq!(record.pid, 4242);
        assert_eq!(record.user, "alice");
        assert_eq!(record.host, "h");
        assert_eq!(record.line, "tty1");
        assert_eq!(record.time.sec, 1_700_000_000);
        assert_eq!(record.session_line(), "alice@h tty1");
    }

    #[test]
    fn test_decode_too_short() {
        for len in [0, 1, 2, 399] {
            let buf = vec![0u8; len];
            assert_eq!(
                decode_record(&buf, &LINUX_AARCH64),
                Err(DecodeError::TooShort { len, need: 400 })
            );
        }
    }

    #[test]
    fn test_decode_ignores_trailing_bytes() {
        let mut buf = encode(&LINUX_X86_64, 7, "bob", "", "pts/0", 0);
        buf.extend_from_slice(&[0xAA; 10]);
        let record = decode_record(&buf, &LINUX_X86_64).unwrap();
        assert_eq!(record.user, "bob");
        assert_eq!(record.line, "pts/0");
    }

    #[test]
    fn test_padded_time_words() {
        let mut buf = vec![0u8; LINUX_AARCH64.size];
        buf[340..344].copy_from_slice(&0xDEADu32.to_le_bytes()); // padding
        buf[344..348].copy_from_slice(&1_234_567u32.to_le_bytes());
        buf[348..352].copy_from_slice(&0xBEEFu32.to_le_bytes()); // padding
        buf[352..356].copy_from_slice(&250_000u32.to_le_bytes());

        let record = decode_record(&buf, &LINUX_AARCH64).unwrap();
        assert_eq!(record.time, TimeVal { sec: 1_234_567, usec: 250_000 });
        let dt = record.time.to_datetime().unwrap();
        assert_eq!(dt.timestamp(), 1_234_567);
        assert_eq!(dt.timestamp_subsec_micros(), 250_000);
    }

    #[test]
    fn test_packed_time_words() {
        let mut buf = vec![0u8; LINUX_X86_64.size];
        buf[340..344].copy_from_slice(&99u32.to_le_bytes());
        buf[344..348].copy_from_slice(&7u32.to_le_bytes());
        let record = decode_record(&buf, &LINUX_X86_64).unwrap();
        assert_eq!(record.time, TimeVal { sec: 99, usec: 7 });
    }

    #[test]
    fn test_zero_time_has_no_datetime() {
        assert!(TimeVal::default().to_datetime().is_none());
    }

    #[test]
    fn test_fixed_text() {
        assert_eq!(fixed_text(b"tty1\0\0\0\0"), "tty1");
        assert_eq!(fixed_text(b"ab\0cd\0"), "ab");
        assert_eq!(fixed_text(b"\0garbage"), "");
        assert_eq!(fixed_text(b""), "");
    }

    #[test]
    fn test_fixed_text_without_terminator() {
        assert_eq!(fixed_text(b"abcd"), "abcd");

        let user = "u".repeat(32);
        let buf = encode(&LINUX_AARCH64, 7, &user, "h", "tty1", 0);
        let record = decode_record(&buf, &LINUX_AARCH64).unwrap();
        assert_eq!(record.user, user);
    }

    #[test]
    fn test_garbage_record_decodes() {
        let buf = vec![0xFFu8; LINUX_AARCH64.size];
        let record = decode_record(&buf, &LINUX_AARCH64).unwrap();
        assert_eq!(record.record_type, RecordType::Unknown(-1));
        assert!(!record.is_active());
    }

    #[test]
    fn test_record_type_round_trip() {
        for raw in -1i16..=10 {
            assert_eq!(RecordType::from_raw(raw).raw(), raw);
        }
        assert_eq!(RecordType::from_raw(2), RecordType::BootTime);
        assert_eq!(RecordType::from_raw(8), RecordType::DeadProcess);
    }

    #[test]
    fn test_ip_addr() {
        let mut buf = encode(&LINUX_AARCH64, 7, "alice", "10.0.0.5", "pts/1", 0);
        buf[360..364].copy_from_slice(&[10, 0, 0, 5]);
        let record = decode_record(&buf, &LINUX_AARCH64).unwrap();
        assert_eq!(record.ip_addr(), Some("10.0.0.5".parse().unwrap()));

        let mut buf = encode(&LINUX_AARCH64, 7, "alice", "", "pts/1", 0);
        let v6: Ipv6Addr = "fe80::1".parse().unwrap();
        buf[360..376].copy_from_slice(&v6.octets());
        let record = decode_record(&buf, &LINUX_AARCH64).unwrap();
        assert_eq!(record.ip_addr(), Some(IpAddr::V6(v6)));

        let buf = encode(&LINUX_AARCH64, 7, "alice", "", "pts/1", 0);
        assert_eq!(decode_record(&buf, &LINUX_AARCH64).unwrap().ip_addr(), None);
    }
}
