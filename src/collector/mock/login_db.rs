//! Builders for binary login database fixtures.

use crate::collector::utmp::layout::{Decode, Field, RecordLayout};

/// Process id written into every fixture record.
pub const FIXTURE_PID: i32 = 4242;

fn put_text(dst: &mut [u8], text: &str) {
    let n = text.len().min(dst.len());
    dst[..n].copy_from_slice(&text.as_bytes()[..n]);
}

/// Encodes one record into a zeroed slot of `layout.size` bytes.
///
/// Text longer than its field is cut at the field width, leaving no
/// terminator, which is what a full-width name looks like on disk.
pub fn encode_slot(
    layout: &RecordLayout,
    record_type: i16,
    user: &str,
    host: &str,
    line: &str,
    sec: u32,
) -> Vec<u8> {
    let mut buf = vec![0u8; layout.size];
    for spec in layout.fields {
        let dst = &mut buf[spec.offset..spec.end()];
        match spec.field {
            Field::Type => dst.copy_from_slice(&record_type.to_le_bytes()),
            Field::Pid => dst.copy_from_slice(&FIXTURE_PID.to_le_bytes()),
            Field::User => put_text(dst, user),
            Field::Host => put_text(dst, host),
            Field::Line => put_text(dst, line),
            Field::Time => {
                if let Decode::Timestamp(encoding) = spec.decode {
                    let (sec_at, _) = encoding.word_offsets();
                    dst[sec_at..sec_at + 4].copy_from_slice(&sec.to_le_bytes());
                }
            }
            _ => {}
        }
    }
    buf
}

/// Accumulates records into a database image.
pub struct LoginDbBuilder {
    layout: &'static RecordLayout,
    data: Vec<u8>,
}

impl LoginDbBuilder {
    pub fn new(layout: &'static RecordLayout) -> Self {
        Self {
            layout,
            data: Vec::new(),
        }
    }

    /// Appends a boot record (type 2).
    pub fn boot(self, sec: u32) -> Self {
        self.record(2, "reboot", "", "~", sec)
    }

    /// Appends a logged-in user (type 7).
    pub fn user(self, user: &str, host: &str, line: &str, sec: u32) -> Self {
        self.record(7, user, host, line, sec)
    }

    /// Appends a record of any type.
    pub fn record(mut self, record_type: i16, user: &str, host: &str, line: &str, sec: u32) -> Self {
        self.data
            .extend(encode_slot(self.layout, record_type, user, host, line, sec));
        self
    }

    /// Appends arbitrary bytes: a corrupt slot or a partial trailing record.
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.data.extend_from_slice(bytes);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.data
    }
}
