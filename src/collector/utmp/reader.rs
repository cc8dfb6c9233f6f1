//! Reading the login database from disk.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, trace, warn};

use super::layout::RecordLayout;
use super::record::{LoginRecord, decode_record};
use crate::collector::traits::FileSystem;

/// Result of decoding a whole database image.
#[derive(Debug, Clone, Default)]
pub struct RecordScan {
    /// Records in file order, all types.
    pub records: Vec<LoginRecord>,
    /// Slots that failed to decode.
    pub skipped: usize,
    /// Bytes after the last whole record.
    pub trailing_bytes: usize,
}

impl RecordScan {
    /// Iterates over records of logged-in user processes.
    pub fn active(&self) -> impl Iterator<Item = &LoginRecord> {
        self.records.iter().filter(|r| r.is_active())
    }
}

/// Splits `data` into fixed-size slots and decodes each one.
///
/// A slot that fails to decode is counted and skipped; it never stops the
/// scan. A partial record at the end is left undecoded.
pub fn decode_records(data: &[u8], layout: &RecordLayout) -> RecordScan {
    let mut scan = RecordScan {
        records: Vec::with_capacity(layout.record_count(data.len())),
        skipped: 0,
        trailing_bytes: data.len() % layout.size,
    };

    for (index, chunk) in data.chunks_exact(layout.size).enumerate() {
        match decode_record(chunk, layout) {
            Ok(record) => scan.records.push(record),
            Err(e) => {
                trace!(index, error = %e, "skipping login record");
                scan.skipped += 1;
            }
        }
    }

    scan
}

/// Reads active sessions from a login database file.
///
/// The file is read in one call and no handle is kept between reads.
pub struct SessionStoreReader<F: FileSystem> {
    fs: F,
    path: PathBuf,
    layout: &'static RecordLayout,
}

impl<F: FileSystem> SessionStoreReader<F> {
    pub fn new(fs: F, path: impl Into<PathBuf>, layout: &'static RecordLayout) -> Self {
        Self {
            fs,
            path: path.into(),
            layout,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn layout(&self) -> &'static RecordLayout {
        self.layout
    }

    /// Reads and decodes every record in the file.
    pub fn scan(&self) -> io::Result<RecordScan> {
        let data = self.fs.read(&self.path)?;
        let scan = decode_records(&data, self.layout);
        debug!(
            path = %self.path.display(),
            records = scan.records.len(),
            skipped = scan.skipped,
            trailing = scan.trailing_bytes,
            "scanned login database"
        );
        Ok(scan)
    }

    /// Active sessions in file order.
    ///
    /// A missing or unreadable database yields an empty list.
    pub fn active_records(&self) -> Vec<LoginRecord> {
        match self.scan() {
            Ok(scan) => scan.records.into_iter().filter(|r| r.is_active()).collect(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "login database unavailable");
                Vec::new()
            }
        }
    }

    /// Active sessions formatted as `user@host line`.
    pub fn session_lines(&self) -> Vec<String> {
        self.active_records()
            .iter()
            .map(LoginRecord::session_line)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::{MockFs, encode_slot as encode};
    use crate::collector::traits::RealFs;
    use crate::collector::utmp::layout::{LINUX_AARCH64, LINUX_X86_64};
    use std::io::Write;

    fn database(records: &[Vec<u8>]) -> Vec<u8> {
        records.concat()
    }

    #[test]
    fn test_single_session() {
        let data = database(&[encode(&LINUX_AARCH64, 7, "alice", "h", "tty1", 0)]);
        let mut fs = MockFs::new();
        fs.add_file("/var/run/utmp", data);

        let reader = SessionStoreReader::new(fs, "/var/run/utmp", &LINUX_AARCH64);
        assert_eq!(reader.session_lines(), vec!["alice@h tty1".to_string()]);
    }

    #[test]
    fn test_filters_non_user_records() {
        let data = database(&[
            encode(&LINUX_AARCH64, 2, "reboot", "", "~", 1_700_000_000),
            encode(&LINUX_AARCH64, 1, "runlevel", "", "~", 1_700_000_001),
            encode(&LINUX_AARCH64, 6, "LOGIN", "", "tty1", 0),
            encode(&LINUX_AARCH64, 7, "pi", "192.168.1.20", "pts/0", 1_700_000_100),
            encode(&LINUX_AARCH64, 8, "", "", "pts/1", 0),
            encode(&LINUX_AARCH64, 7, "root", "", "tty2", 1_700_000_200),
        ]);
        let scan = decode_records(&data, &LINUX_AARCH64);
        assert_eq!(scan.records.len(), 6);

        let lines: Vec<String> = scan.active().map(LoginRecord::session_line).collect();
        assert_eq!(lines, vec!["pi@192.168.1.20 pts/0", "root@ tty2"]);
    }

    #[test]
    fn test_partial_trailing_record() {
        let mut data = database(&[
            encode(&LINUX_AARCH64, 7, "a", "h", "tty1", 0),
            encode(&LINUX_AARCH64, 7, "b", "h", "tty2", 0),
        ]);
        let partial = encode(&LINUX_AARCH64, 7, "c", "h", "tty3", 0);
        data.extend_from_slice(&partial[..123]);

        let scan = decode_records(&data, &LINUX_AARCH64);
        assert_eq!(scan.records.len(), 2);
        assert_eq!(scan.skipped, 0);
        assert_eq!(scan.trailing_bytes, 123);
    }

    #[test]
    fn test_corrupt_record_among_valid() {
        let n = 5;
        let mut records: Vec<Vec<u8>> = (0..n)
            .map(|i| encode(&LINUX_AARCH64, 7, &format!("user{}", i), "h", "pts/0", 0))
            .collect();
        records.insert(2, vec![0xFF; LINUX_AARCH64.size]);

        let scan = decode_records(&database(&records), &LINUX_AARCH64);
        assert_eq!(scan.active().count(), n);
    }

    #[test]
    fn test_empty_file() {
        let scan = decode_records(&[], &LINUX_X86_64);
        assert!(scan.records.is_empty());
        assert_eq!(scan.trailing_bytes, 0);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let reader = SessionStoreReader::new(MockFs::new(), "/var/run/utmp", &LINUX_AARCH64);
        assert!(reader.scan().is_err());
        assert!(reader.active_records().is_empty());
        assert!(reader.session_lines().is_empty());
    }

    #[test]
    fn test_layout_mismatch_degrades() {
        // An x86_64 database read with the aarch64 table: sizes differ, so
        // slots straddle records. Nothing may panic.
        let data = database(&[
            encode(&LINUX_X86_64, 7, "a", "h", "tty1", 0),
            encode(&LINUX_X86_64, 7, "b", "h", "tty2", 0),
            encode(&LINUX_X86_64, 7, "c", "h", "tty3", 0),
        ]);
        let scan = decode_records(&data, &LINUX_AARCH64);
        assert_eq!(scan.records.len(), (384 * 3) / 400);
        assert_eq!(scan.trailing_bytes, (384 * 3) % 400);
    }

    #[test]
    fn test_real_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&encode(&LINUX_X86_64, 7, "carol", "remote", "pts/3", 0))
            .unwrap();
        file.write_all(&[0u8; 7]).unwrap();
        file.flush().unwrap();

        let reader = SessionStoreReader::new(RealFs::new(), file.path(), &LINUX_X86_64);
        let scan = reader.scan().unwrap();
        assert_eq!(scan.trailing_bytes, 7);
        assert_eq!(reader.session_lines(), vec!["carol@remote pts/3"]);
    }
}
