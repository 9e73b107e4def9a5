//! String interning over a bit buffer.
//!
//! A `StringTable` replaces strings that both peers already know with a
//! 16-bit id. The host is the only side that mints ids; clients learn them
//! from the definition frames the host writes and can then refer to them too.
//!
//! # Frame Format
//!
//! ```text
//! Reference:   1 | id (16)                         value known to the writer
//! Definition:  0 | 1 | id (16) | string            host introduces a new id
//! Literal:     0 | 0 | string                      value sent as-is, not cached
//! ```
//!
//! `string` is the bit buffer's length-prefixed UTF-8 encoding.
//!
//! # Synchronization
//!
//! Every client must process every host definition before it meets a
//! reference to that id. A reference to an id the reader never saw fails with
//! [`StringTableError::UnknownId`]; the tables are then out of sync and there
//! is no way to repair them from the stream.

use std::borrow::Cow;
use std::collections::HashMap;

use crate::bitio::{BitBuffer, MAX_STRING_BYTES};
use crate::error::{Result, StringTableError};

/// Width of an id on the wire.
pub const ID_BITS: usize = 16;

/// Id that is never assigned and never resolves.
pub const RESERVED_ID: u16 = 0;

/// Which side of the protocol a table plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Mints ids and announces them with definition frames
    Host,
    /// Adopts ids from the host's definitions, never mints
    Client,
}

/// How names are matched against the table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CaseSensitivity {
    /// Exact byte-for-byte matching
    Sensitive,
    /// Match on the Unicode lowercase fold; the first spelling seen is kept
    #[default]
    Insensitive,
}

/// Which layout [`StringTable::write_string`] emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameShape {
    /// `1 | id`
    Reference,
    /// `0 | 1 | id | string`
    Definition,
    /// `0 | 0 | string`
    Literal,
}

/// Bidirectional string ↔ id table with a fixed protocol role.
///
/// # Invariants
/// - `by_name` and `by_id` always hold exactly the same pairs
/// - only a `Host` table advances `last_id`
#[derive(Debug)]
pub struct StringTable {
    role: Role,
    case: CaseSensitivity,
    /// Match key (see `CaseSensitivity`) to id
    by_name: HashMap<String, u16>,
    /// Id to the spelling that defined it
    by_id: HashMap<u16, String>,
    /// Last id minted by this host, `RESERVED_ID` before the first
    last_id: u16,
}

impl StringTable {
    /// Create a case-insensitive table for `role`.
    pub fn new(role: Role) -> Self {
        Self::with_case(role, CaseSensitivity::default())
    }

    /// Create a table for `role` with an explicit matching policy.
    pub fn with_case(role: Role, case: CaseSensitivity) -> Self {
        Self {
            role,
            case,
            by_name: HashMap::new(),
            by_id: HashMap::new(),
            last_id: RESERVED_ID,
        }
    }

    /// The role this table was created with.
    pub fn role(&self) -> Role {
        self.role
    }

    /// The matching policy this table was created with.
    pub fn case_sensitivity(&self) -> CaseSensitivity {
        self.case
    }

    /// Number of interned strings.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// True when nothing has been interned.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    fn key<'a>(&self, value: &'a str) -> Cow<'a, str> {
        match self.case {
            CaseSensitivity::Sensitive => Cow::Borrowed(value),
            CaseSensitivity::Insensitive => Cow::Owned(value.to_lowercase()),
        }
    }

    /// Id of `value`, if this table knows it.
    pub fn id_of(&self, value: &str) -> Option<u16> {
        self.by_name.get(self.key(value).as_ref()).copied()
    }

    /// String registered under `id`.
    pub fn name_of(&self, id: u16) -> Option<&str> {
        self.by_id.get(&id).map(String::as_str)
    }

    /// Id of `value`, minting one if this is a host and the value is new.
    ///
    /// A client only returns ids it has already adopted. A host returns `None`
    /// once every id has been handed out, or for strings too long to encode.
    pub fn intern(&mut self, value: &str) -> Option<u16> {
        if let Some(id) = self.id_of(value) {
            return Some(id);
        }
        match self.role {
            Role::Host => self.mint(value),
            Role::Client => None,
        }
    }

    fn mint(&mut self, value: &str) -> Option<u16> {
        if value.len() > MAX_STRING_BYTES {
            return None;
        }
        let Some(id) = self.last_id.checked_add(1) else {
            tracing::warn!(len = self.len(), "string id space exhausted, sending literal");
            return None;
        };

        self.last_id = id;
        self.insert(id, value);
        tracing::debug!(id, value, "minted string id");
        Some(id)
    }

    /// Register `id` ↔ `value`, dropping any pair either side replaces.
    fn insert(&mut self, id: u16, value: &str) {
        let key = self.key(value).into_owned();

        if let Some(previous) = self.by_id.insert(id, value.to_owned()) {
            let previous_key = self.key(&previous).into_owned();
            if previous_key != key {
                self.by_name.remove(&previous_key);
            }
        }
        if let Some(previous_id) = self.by_name.insert(key, id) {
            if previous_id != id {
                self.by_id.remove(&previous_id);
            }
        }
    }

    /// Encode `value` into `buffer` using the most compact frame available.
    pub fn write_string(&mut self, value: &str, buffer: &mut BitBuffer) -> FrameShape {
        if let Some(id) = self.id_of(value) {
            buffer.write_bit(true).write_ushort(id);
            return FrameShape::Reference;
        }

        if self.role == Role::Host {
            if let Some(id) = self.mint(value) {
                buffer
                    .write_bit(false)
                    .write_bit(true)
                    .write_ushort(id)
                    .write_string(value);
                return FrameShape::Definition;
            }
        }

        buffer.write_bit(false).write_bit(false).write_string(value);
        FrameShape::Literal
    }

    /// Decode one frame written by the peer table.
    ///
    /// On failure the buffer cursor is put back at the start of the frame.
    ///
    /// # Errors
    /// - `StringTableError::UnknownId` for a reference this table cannot resolve
    /// - `BitIoError` variants when the frame is cut short or not UTF-8
    pub fn read_string(&mut self, buffer: &mut BitBuffer) -> Result<String> {
        let start = buffer.position();
        let result = self.read_frame(buffer);
        if result.is_err() {
            buffer.rewind(start);
        }
        result
    }

    fn read_frame(&mut self, buffer: &mut BitBuffer) -> Result<String> {
        let already_defined = buffer.try_read_bit()?;
        if already_defined {
            let id = buffer.try_read_ushort()?;
            return match self.by_id.get(&id) {
                Some(value) => Ok(value.clone()),
                None => {
                    tracing::warn!(id, role = ?self.role, "reference to unknown string id");
                    Err(StringTableError::UnknownId(id).into())
                }
            };
        }

        let defines_entry = buffer.try_read_bit()?;
        if !defines_entry {
            return buffer.try_read_string();
        }

        let id = buffer.try_read_ushort()?;
        let value = buffer.try_read_string()?;
        match self.role {
            Role::Client if id != RESERVED_ID => {
                self.insert(id, &value);
                tracing::debug!(id, value = %value, "adopted string id");
            }
            Role::Client => {
                tracing::warn!("definition uses the reserved id, not adopting");
            }
            Role::Host => {
                tracing::warn!(id, "host received a string definition, not adopting");
            }
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitio::SeekMode;
    use crate::error::{BitIoError, Error};
    use test_case::test_case;

    fn frame_bits(buffer: &BitBuffer, before: usize) -> usize {
        buffer.high_water_mark() - before
    }

    #[test]
    fn test_host_defines_then_references() {
        let mut host = StringTable::new(Role::Host);
        let mut buffer = BitBuffer::new();

        assert_eq!(host.write_string("player", &mut buffer), FrameShape::Definition);
        assert_eq!(frame_bits(&buffer, 0), 2 + ID_BITS + 16 + 6 * 8);

        let before = buffer.high_water_mark();
        assert_eq!(host.write_string("player", &mut buffer), FrameShape::Reference);
        assert_eq!(frame_bits(&buffer, before), 1 + ID_BITS);

        assert_eq!(host.id_of("player"), Some(1));
        assert_eq!(host.name_of(1), Some("player"));
        assert_eq!(host.len(), 1);
    }

    #[test]
    fn test_client_adopts_host_definitions() {
        let mut host = StringTable::new(Role::Host);
        let mut client = StringTable::new(Role::Client);
        let mut buffer = BitBuffer::new();

        host.write_string("alpha", &mut buffer);
        host.write_string("alpha", &mut buffer);
        host.write_string("beta", &mut buffer);

        assert!(buffer.seek_bits(0, SeekMode::Begin));
        assert_eq!(client.read_string(&mut buffer).unwrap(), "alpha");
        assert_eq!(client.read_string(&mut buffer).unwrap(), "alpha");
        assert_eq!(client.read_string(&mut buffer).unwrap(), "beta");
        assert_eq!(buffer.bits_remaining(), 0);

        assert_eq!(client.id_of("alpha"), Some(1));
        assert_eq!(client.id_of("beta"), Some(2));

        let mut reply = BitBuffer::new();
        assert_eq!(client.write_string("beta", &mut reply), FrameShape::Reference);
        assert_eq!(reply.high_water_mark(), 17);

        assert!(reply.seek_bits(0, SeekMode::Begin));
        assert_eq!(host.read_string(&mut reply).unwrap(), "beta");
    }

    #[test]
    fn test_client_novel_string_is_literal() {
        let mut host = StringTable::new(Role::Host);
        let mut client = StringTable::new(Role::Client);
        let mut buffer = BitBuffer::new();

        assert_eq!(client.write_string("hello", &mut buffer), FrameShape::Literal);
        assert_eq!(client.write_string("hello", &mut buffer), FrameShape::Literal);
        assert!(client.is_empty());
        assert_eq!(client.intern("hello"), None);

        assert!(buffer.seek_bits(0, SeekMode::Begin));
        assert_eq!(host.read_string(&mut buffer).unwrap(), "hello");
        assert_eq!(host.read_string(&mut buffer).unwrap(), "hello");
        assert!(host.is_empty());
        assert_eq!(host.intern("other"), Some(1));
    }

    #[test]
    fn test_unknown_id_is_desync() {
        let mut host = StringTable::new(Role::Host);
        let mut late_client = StringTable::new(Role::Client);
        let mut missed = BitBuffer::new();
        let mut buffer = BitBuffer::new();

        host.write_string("lost", &mut missed);
        host.write_string("lost", &mut buffer);

        assert!(buffer.seek_bits(0, SeekMode::Begin));
        assert_eq!(
            late_client.read_string(&mut buffer).unwrap_err(),
            Error::StringTable(StringTableError::UnknownId(1))
        );
        assert_eq!(buffer.position(), 0);
    }

    #[test]
    fn test_reserved_id_never_resolves() {
        let mut client = StringTable::new(Role::Client);
        let mut buffer = BitBuffer::new();
        buffer.write_bit(true).write_ushort(RESERVED_ID);

        assert!(buffer.seek_bits(0, SeekMode::Begin));
        assert_eq!(
            client.read_string(&mut buffer).unwrap_err(),
            Error::StringTable(StringTableError::UnknownId(RESERVED_ID))
        );
    }

    #[test]
    fn test_truncated_frame_rewinds() {
        let mut host = StringTable::new(Role::Host);
        let mut source = BitBuffer::new();
        source.write_byte(0xAB);
        host.write_string("cut short", &mut source);

        let bytes = source.as_bytes();
        let mut buffer = BitBuffer::from_slice(&bytes[..bytes.len() - 2]);
        assert_eq!(buffer.try_read_byte().unwrap(), 0xAB);

        let mut client = StringTable::new(Role::Client);
        let err = client.read_string(&mut buffer).unwrap_err();
        assert!(matches!(
            err,
            Error::BitIo(BitIoError::InsufficientBits { .. })
        ));
        assert_eq!(buffer.position(), 8);
        assert!(client.is_empty());
    }

    #[test_case(CaseSensitivity::Insensitive, FrameShape::Reference, 1; "insensitive folds")]
    #[test_case(CaseSensitivity::Sensitive, FrameShape::Definition, 2; "sensitive keeps apart")]
    fn test_case_policy(case: CaseSensitivity, second: FrameShape, entries: usize) {
        let mut host = StringTable::with_case(Role::Host, case);
        let mut client = StringTable::with_case(Role::Client, case);
        let mut buffer = BitBuffer::new();

        assert_eq!(host.write_string("Hello", &mut buffer), FrameShape::Definition);
        assert_eq!(host.write_string("HELLO", &mut buffer), second);
        assert_eq!(host.len(), entries);

        assert!(buffer.seek_bits(0, SeekMode::Begin));
        assert_eq!(client.read_string(&mut buffer).unwrap(), "Hello");
        let expected = match case {
            CaseSensitivity::Insensitive => "Hello",
            CaseSensitivity::Sensitive => "HELLO",
        };
        assert_eq!(client.read_string(&mut buffer).unwrap(), expected);
    }

    #[test]
    fn test_default_is_case_insensitive() {
        let table = StringTable::new(Role::Client);
        assert_eq!(table.case_sensitivity(), CaseSensitivity::Insensitive);
        assert_eq!(table.role(), Role::Client);
    }

    #[test]
    fn test_host_does_not_adopt_definitions() {
        let mut other_host = StringTable::new(Role::Host);
        let mut host = StringTable::new(Role::Host);
        let mut buffer = BitBuffer::new();
        other_host.write_string("x", &mut buffer);
        other_host.write_string("y", &mut buffer);

        assert!(buffer.seek_bits(0, SeekMode::Begin));
        assert_eq!(host.read_string(&mut buffer).unwrap(), "x");
        assert_eq!(host.read_string(&mut buffer).unwrap(), "y");
        assert!(host.is_empty());
        assert_eq!(host.intern("z"), Some(1));
    }

    #[test]
    fn test_client_ignores_reserved_definition() {
        let mut client = StringTable::new(Role::Client);
        let mut buffer = BitBuffer::new();
        buffer
            .write_bit(false)
            .write_bit(true)
            .write_ushort(RESERVED_ID)
            .write_string("zero");

        assert!(buffer.seek_bits(0, SeekMode::Begin));
        assert_eq!(client.read_string(&mut buffer).unwrap(), "zero");
        assert!(client.is_empty());
    }

    #[test]
    fn test_intern_mints_monotonically() {
        let mut host = StringTable::new(Role::Host);
        assert_eq!(host.intern("a"), Some(1));
        assert_eq!(host.intern("b"), Some(2));
        assert_eq!(host.intern("a"), Some(1));
        assert_eq!(host.intern("c"), Some(3));
    }

    #[test]
    fn test_exhausted_host_falls_back_to_literal() {
        let mut host = StringTable::new(Role::Host);
        host.last_id = u16::MAX;
        let mut buffer = BitBuffer::new();

        assert_eq!(host.write_string("late", &mut buffer), FrameShape::Literal);
        assert_eq!(host.intern("late"), None);
        assert!(host.is_empty());
    }

    #[test]
    fn test_oversized_string_is_not_interned() {
        let mut host = StringTable::new(Role::Host);
        let value = "x".repeat(MAX_STRING_BYTES + 1);
        let mut buffer = BitBuffer::new();

        assert_eq!(host.write_string(&value, &mut buffer), FrameShape::Literal);
        assert!(host.is_empty());
    }

    #[test]
    fn test_redefinition_keeps_maps_paired() {
        let mut client = StringTable::with_case(Role::Client, CaseSensitivity::Sensitive);
        client.insert(1, "old");
        client.insert(2, "moved");
        client.insert(1, "new");
        client.insert(3, "moved");

        assert_eq!(client.id_of("old"), None);
        assert_eq!(client.name_of(1), Some("new"));
        assert_eq!(client.name_of(2), None);
        assert_eq!(client.id_of("moved"), Some(3));
        assert_eq!(client.by_name.len(), client.by_id.len());
    }
}
