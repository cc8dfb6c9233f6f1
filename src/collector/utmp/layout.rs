//! Field-offset tables for the Linux login database (`utmp`).
//!
//! A record is a fixed-size C struct written in host byte order. Its size and
//! the placement of the session and time fields differ per architecture, so
//! each supported architecture gets a [`RecordLayout`]: the record size plus
//! one [`FieldSpec`] per field.
//!
//! ```text
//! aarch64 (400 bytes)                      x86_64 (384 bytes)
//! ut_type      @  0   2                    ut_type      @  0   2
//! ut_pid       @  4   4                    ut_pid       @  4   4
//! ut_line      @  8  32                    ut_line      @  8  32
//! ut_id        @ 40   4                    ut_id        @ 40   4
//! ut_user      @ 44  32                    ut_user      @ 44  32
//! ut_host      @ 76 256                    ut_host      @ 76 256
//! ut_exit      @332   4                    ut_exit      @332   4
//! ut_session   @336   4 (+4 high word)     ut_session   @336   4
//! ut_tv        @340  16 (pad,sec,pad,usec) ut_tv        @340   8 (sec,usec)
//! ut_addr_v6   @360  16                    ut_addr_v6   @348  16
//! reserved     @376  20 (+4 tail pad)      reserved     @364  20
//! ```
//!
//! On aarch64 the time field is read as four 32-bit words starting right after
//! the low half of `ut_session`: the first word is the session's high half,
//! the second the low half of `tv_sec`, the third the high half of `tv_sec`,
//! the fourth the low half of `tv_usec`. Only the second and fourth words
//! carry the timestamp.

/// How the bytes of one field are turned into a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decode {
    /// Little-endian signed integer, 2 or 4 bytes wide.
    Integer,
    /// Zero-terminated text in a fixed-width buffer.
    Text,
    /// Seconds and microseconds since the epoch.
    Timestamp(TimeEncoding),
    /// Four little-endian 32-bit words holding an IPv4 or IPv6 address.
    Address,
    /// Never decoded.
    Reserved,
}

/// Word arrangement of the time field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeEncoding {
    /// `[sec, usec]`, 8 bytes.
    Packed32,
    /// `[pad, sec, pad, usec]`, 16 bytes. Each value is preceded by a padding
    /// word.
    PaddedPairs,
}

impl TimeEncoding {
    /// Byte offsets of the seconds and microseconds words inside the field.
    pub const fn word_offsets(self) -> (usize, usize) {
        match self {
            TimeEncoding::Packed32 => (0, 4),
            TimeEncoding::PaddedPairs => (4, 12),
        }
    }

    /// Width of the whole time field.
    pub const fn width(self) -> usize {
        match self {
            TimeEncoding::Packed32 => 8,
            TimeEncoding::PaddedPairs => 16,
        }
    }
}

/// Record fields the decoder knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Type,
    Pid,
    Line,
    Id,
    User,
    Host,
    Termination,
    Exit,
    Session,
    Time,
    Address,
    Reserved,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::Type => "ut_type",
            Field::Pid => "ut_pid",
            Field::Line => "ut_line",
            Field::Id => "ut_id",
            Field::User => "ut_user",
            Field::Host => "ut_host",
            Field::Termination => "e_termination",
            Field::Exit => "e_exit",
            Field::Session => "ut_session",
            Field::Time => "ut_tv",
            Field::Address => "ut_addr_v6",
            Field::Reserved => "__glibc_reserved",
        }
    }
}

/// Placement of one field inside a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub field: Field,
    pub offset: usize,
    pub width: usize,
    pub decode: Decode,
}

impl FieldSpec {
    const fn new(field: Field, offset: usize, width: usize, decode: Decode) -> Self {
        Self {
            field,
            offset,
            width,
            decode,
        }
    }

    /// One past the last byte of the field.
    pub const fn end(&self) -> usize {
        self.offset + self.width
    }
}

/// Size and field table of a login record on one architecture.
#[derive(Debug, PartialEq, Eq)]
pub struct RecordLayout {
    /// Architecture name as reported by `uname -m`.
    pub arch: &'static str,
    /// Size of one record in bytes.
    pub size: usize,
    pub fields: &'static [FieldSpec],
}

/// Value of `ut_type` marking a logged-in user process.
pub const USER_PROCESS: i16 = 7;

/// Default location of the login database.
pub const DEFAULT_UTMP_PATH: &str = "/var/run/utmp";

pub static LINUX_AARCH64: RecordLayout = RecordLayout {
    arch: "aarch64",
    size: 400,
    fields: &[
        FieldSpec::new(Field::Type, 0, 2, Decode::Integer),
        FieldSpec::new(Field::Pid, 4, 4, Decode::Integer),
        FieldSpec::new(Field::Line, 8, 32, Decode::Text),
        FieldSpec::new(Field::Id, 40, 4, Decode::Text),
        FieldSpec::new(Field::User, 44, 32, Decode::Text),
        FieldSpec::new(Field::Host, 76, 256, Decode::Text),
        FieldSpec::new(Field::Termination, 332, 2, Decode::Integer),
        FieldSpec::new(Field::Exit, 334, 2, Decode::Integer),
        FieldSpec::new(Field::Session, 336, 4, Decode::Integer),
        FieldSpec::new(
            Field::Time,
            340,
            TimeEncoding::PaddedPairs.width(),
            Decode::Timestamp(TimeEncoding::PaddedPairs),
        ),
        FieldSpec::new(Field::Address, 360, 16, Decode::Address),
        FieldSpec::new(Field::Reserved, 376, 20, Decode::Reserved),
    ],
};

pub static LINUX_X86_64: RecordLayout = RecordLayout {
    arch: "x86_64",
    size: 384,
    fields: &[
        FieldSpec::new(Field::Type, 0, 2, Decode::Integer),
        FieldSpec::new(Field::Pid, 4, 4, Decode::Integer),
        FieldSpec::new(Field::Line, 8, 32, Decode::Text),
        FieldSpec::new(Field::Id, 40, 4, Decode::Text),
        FieldSpec::new(Field::User, 44, 32, Decode::Text),
        FieldSpec::new(Field::Host, 76, 256, Decode::Text),
        FieldSpec::new(Field::Termination, 332, 2, Decode::Integer),
        FieldSpec::new(Field::Exit, 334, 2, Decode::Integer),
        FieldSpec::new(Field::Session, 336, 4, Decode::Integer),
        FieldSpec::new(
            Field::Time,
            340,
            TimeEncoding::Packed32.width(),
            Decode::Timestamp(TimeEncoding::Packed32),
        ),
        FieldSpec::new(Field::Address, 348, 16, Decode::Address),
        FieldSpec::new(Field::Reserved, 364, 20, Decode::Reserved),
    ],
};

static LAYOUTS: [&RecordLayout; 2] = [&LINUX_AARCH64, &LINUX_X86_64];

impl RecordLayout {
    /// Returns the layout for an architecture name (`uname -m` spelling).
    pub fn for_arch(arch: &str) -> Option<&'static RecordLayout> {
        let arch = match arch {
            "arm64" => "aarch64",
            "amd64" => "x86_64",
            other => other,
        };
        LAYOUTS.iter().copied().find(|layout| layout.arch == arch)
    }

    /// Layout for the architecture this binary was built for.
    pub fn native() -> Option<&'static RecordLayout> {
        Self::for_arch(std::env::consts::ARCH)
    }

    /// Looks up the placement of a field.
    pub fn field(&self, field: Field) -> Option<&FieldSpec> {
        self.fields.iter().find(|spec| spec.field == field)
    }

    /// Number of whole records in a database of `len` bytes.
    pub fn record_count(&self, len: usize) -> usize {
        len / self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_consistent(layout: &RecordLayout) {
        let mut fields: Vec<&FieldSpec> = layout.fields.iter().collect();
        fields.sort_by_key(|f| f.offset);

        for pair in fields.windows(2) {
            assert!(
                pair[0].end() <= pair[1].offset,
                "{} overlaps {} in {}",
                pair[0].field.name(),
                pair[1].field.name(),
                layout.arch
            );
        }
        for spec in layout.fields {
            assert!(spec.end() <= layout.size, "{} past end", spec.field.name());
            if spec.decode == Decode::Integer {
                assert!(spec.width == 2 || spec.width == 4);
            }
        }
    }

    #[test]
    fn test_layouts_consistent() {
        assert_consistent(&LINUX_AARCH64);
        assert_consistent(&LINUX_X86_64);
    }

    #[test]
    fn test_aarch64_time_words() {
        let time = LINUX_AARCH64.field(Field::Time).unwrap();
        assert_eq!(time.offset, 340);
        assert_eq!(time.width, 16);
        let Decode::Timestamp(encoding) = time.decode else {
            panic!("time field must decode as a timestamp");
        };
        // True seconds live at 344, true microseconds at 352.
        let (sec, usec) = encoding.word_offsets();
        assert_eq!(time.offset + sec, 344);
        assert_eq!(time.offset + usec, 352);
    }

    #[test]
    fn test_for_arch() {
        assert_eq!(RecordLayout::for_arch("aarch64").unwrap().size, 400);
        assert_eq!(RecordLayout::for_arch("arm64").unwrap().size, 400);
        assert_eq!(RecordLayout::for_arch("x86_64").unwrap().size, 384);
        assert!(RecordLayout::for_arch("riscv64").is_none());
    }

    #[test]
    fn test_record_count_ignores_remainder() {
        assert_eq!(LINUX_AARCH64.record_count(0), 0);
        assert_eq!(LINUX_AARCH64.record_count(399), 0);
        assert_eq!(LINUX_AARCH64.record_count(400 * 3 + 17), 3);
    }
}
