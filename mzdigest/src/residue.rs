use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// A single position in a cleavage motif.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum MotifResidue {
    /// A literal residue (upper case ASCII), the ambiguous residues `B`, `J`, and `Z` match all
    /// residues they stand for (and the other way around).
    Literal(u8),
    /// The wildcard `X`, matching any residue except the listed ones.
    Any(Vec<u8>),
}

impl MotifResidue {
    /// The wildcard without any exclusions
    pub const ANY: Self = Self::Any(Vec::new());

    /// Check if the given residue from a sequence fits this position.
    pub fn matches(&self, residue: u8) -> bool {
        let residue = residue.to_ascii_uppercase();
        match self {
            Self::Literal(literal) => canonical_identical(*literal, residue),
            Self::Any(excluded) => !excluded.contains(&residue),
        }
    }
}

/// Two residues are identical if they are the same or one is an ambiguous residue covering the other.
const fn canonical_identical(a: u8, b: u8) -> bool {
    matches!(
        (a, b),
        (b'B', b'D' | b'N')
            | (b'D' | b'N', b'B')
            | (b'J', b'I' | b'L')
            | (b'I' | b'L', b'J')
            | (b'Z', b'E' | b'Q')
            | (b'E' | b'Q', b'Z')
    ) || a == b
}

impl Display for MotifResidue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Literal(residue) => write!(f, "{}", *residue as char),
            Self::Any(excluded) if excluded.is_empty() => write!(f, "X"),
            Self::Any(excluded) => {
                write!(f, "X{{")?;
                for residue in excluded {
                    write!(f, "{}", *residue as char)?;
                }
                write!(f, "}}")
            }
        }
    }
}
