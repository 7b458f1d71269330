use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Minimum number of digits in a rendered sequence (`MS0001`).
pub const SEQUENCE_WIDTH: usize = 4;

/// Whether a member id is provisional or final
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum IdKind {
    Temporary,
    Permanent,
}

impl IdKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdKind::Temporary => "temporary",
            IdKind::Permanent => "permanent",
        }
    }
}

impl fmt::Display for IdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for IdKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "temporary" => Ok(IdKind::Temporary),
            "permanent" => Ok(IdKind::Permanent),
            _ => Err(anyhow::anyhow!("Invalid member id kind: {}", s)),
        }
    }
}

/// Human-readable member identifier: prefix + zero-padded per-prefix sequence.
///
/// The kind is carried explicitly rather than inferred from the prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberId {
    prefix: String,
    sequence: u32,
    kind: IdKind,
}

impl MemberId {
    pub fn new(prefix: impl Into<String>, sequence: u32, kind: IdKind) -> Self {
        Self {
            prefix: prefix.into(),
            sequence,
            kind,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    pub fn kind(&self) -> IdKind {
        self.kind
    }

    pub fn is_permanent(&self) -> bool {
        self.kind == IdKind::Permanent
    }

    /// Rendered form, e.g. `LGBTQ0001`.
    pub fn value(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:0width$}",
            self.prefix,
            self.sequence,
            width = SEQUENCE_WIDTH
        )
    }
}

/// Wire form: `{"value": "MS0001", "prefix": "MS", "sequence": 1, "kind": "temporary"}`
#[derive(Serialize, Deserialize)]
struct MemberIdRepr {
    value: String,
    prefix: String,
    sequence: u32,
    kind: IdKind,
}

impl Serialize for MemberId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        MemberIdRepr {
            value: self.value(),
            prefix: self.prefix.clone(),
            sequence: self.sequence,
            kind: self.kind,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MemberId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = MemberIdRepr::deserialize(deserializer)?;
        Ok(Self::new(repr.prefix, repr.sequence, repr.kind))
    }
}
