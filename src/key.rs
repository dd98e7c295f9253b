//! Key Codec: builds and parses the composite index keys `ctx^t0^t1^t2^`
//! used by the three quad indexes, for any rotation of (S, P, O).

use crate::error::{CorruptionError, StorageError};
use std::fmt;

/// The `^` (0x5E) field separator. Cannot appear inside a decimal-ASCII id,
/// which guarantees unambiguous parsing of `^`-joined fields.
pub const SEPARATOR: u8 = b'^';

/// A term id: the dictionary's compact, monotonically-assigned integer,
/// rendered on the wire as its decimal ASCII representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TermId(pub u64);

impl fmt::Display for TermId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TermId {
    fn write_ascii(self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.0.to_string().as_bytes());
    }

    fn parse_ascii(field: &[u8]) -> Result<Self, StorageError> {
        let text = std::str::from_utf8(field).map_err(|e| {
            StorageError::Corruption(CorruptionError::new(e))
        })?;
        text.parse::<u64>()
            .map(TermId)
            .map_err(|_| {
                StorageError::Corruption(CorruptionError::MalformedKey(format!(
                    "non-decimal id field {text:?}"
                )))
            })
    }
}

/// Which of the three quad indexes a key belongs to. The rotation is the
/// position in `[s, p, o]` the index's key starts reading from after the
/// context field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    /// `c ^ s ^ p ^ o ^`
    Cspo,
    /// `c ^ p ^ o ^ s ^`
    Cpos,
    /// `c ^ o ^ s ^ p ^`
    Cosp,
}

impl IndexKind {
    pub const ALL: [Self; 3] = [Self::Cspo, Self::Cpos, Self::Cosp];

    /// The rotation index `r` used throughout spec.md §4.3/§4.4: `0` starts
    /// at S, `1` at P, `2` at O.
    pub fn rotation(self) -> usize {
        match self {
            Self::Cspo => 0,
            Self::Cpos => 1,
            Self::Cosp => 2,
        }
    }

    pub fn from_rotation(r: usize) -> Self {
        match r % 3 {
            0 => Self::Cspo,
            1 => Self::Cpos,
            _ => Self::Cosp,
        }
    }

    /// The literal on-disk partition name, matching spec.md §6 exactly.
    pub fn partition_name(self) -> &'static str {
        match self {
            Self::Cspo => "c^s^p^o^",
            Self::Cpos => "c^p^o^s^",
            Self::Cosp => "c^o^s^p^",
        }
    }
}

/// Rotates `[s, p, o]` so that position `r` comes first, keeping the cyclic
/// order: `r=0` -> `[s,p,o]`, `r=1` -> `[p,o,s]`, `r=2` -> `[o,s,p]`.
pub fn rotate(spo: [TermId; 3], r: usize) -> [TermId; 3] {
    [spo[r % 3], spo[(r + 1) % 3], spo[(r + 2) % 3]]
}

/// Undoes [`rotate`]: given the rotated triple read off a key, returns it
/// back in `(s, p, o)` order.
pub fn unrotate(rotated: [TermId; 3], r: usize) -> [TermId; 3] {
    let mut spo = [rotated[0]; 3];
    for (offset, value) in rotated.into_iter().enumerate() {
        spo[(r + offset) % 3] = value;
    }
    spo
}

/// Builds the full index key `c ^ t0 ^ t1 ^ t2 ^` for the given index kind.
/// `context` of `None` encodes the conjunctive row (empty context field).
pub fn to_key(index: IndexKind, spo: [TermId; 3], context: Option<TermId>) -> Vec<u8> {
    let rotated = rotate(spo, index.rotation());
    let mut buf = Vec::with_capacity(32);
    write_context_field(&mut buf, context);
    for id in rotated {
        id.write_ascii(&mut buf);
        buf.push(SEPARATOR);
    }
    buf
}

fn write_context_field(buf: &mut Vec<u8>, context: Option<TermId>) {
    if let Some(id) = context {
        id.write_ascii(buf);
    }
    buf.push(SEPARATOR);
}

/// Builds a scan prefix covering the first `bound_len` rotated term
/// positions (0, 1, 2 or 3 of them), as constructed by the Pattern Planner.
pub fn to_prefix(
    index: IndexKind,
    bound: &[TermId],
    context: Option<TermId>,
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(32);
    write_context_field(&mut buf, context);
    for id in bound {
        id.write_ascii(&mut buf);
        buf.push(SEPARATOR);
    }
    buf
}

/// Parses a key produced by [`to_key`] back into `(context, s, p, o)`.
pub fn from_key(index: IndexKind, key: &[u8]) -> Result<(Option<TermId>, [TermId; 3]), StorageError> {
    let mut fields = key.split(|&b| b == SEPARATOR);
    let context_field = fields
        .next()
        .ok_or_else(|| StorageError::Corruption(CorruptionError::MalformedKey("empty key".to_owned())))?;
    let context = if context_field.is_empty() {
        None
    } else {
        Some(TermId::parse_ascii(context_field)?)
    };
    let mut rotated = [TermId(0); 3];
    for slot in rotated.iter_mut() {
        let field = fields.next().ok_or_else(|| {
            StorageError::Corruption(CorruptionError::MalformedKey(
                "key has fewer than 4 fields".to_owned(),
            ))
        })?;
        *slot = TermId::parse_ascii(field)?;
    }
    let spo = unrotate(rotated, index.rotation());
    Ok((context, spo))
}
