use std::{fmt::Display, ops::Range};

use context_error::*;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{DigestionErrorKind, MotifResidue};

/// A single cleavage rule of a protease. It is made up of an inducing pattern that has to be
/// present in the sequence, the place within that pattern where the cut is made, and optionally a
/// set of residues that blocks the cut when found directly next to it.
///
/// Motifs are written in a small text format, see [`DigestionMotif::parse_list`]:
/// * `K|` cuts C terminal of K
/// * `|D` cuts N terminal of D
/// * `K[P]|` (or `K|[P]`) cuts C terminal of K unless followed by P
/// * `[P]|D` cuts N terminal of D unless preceded by P
/// * `RX{P}|` cuts after R and any residue except P
/// * `GPX|GPX` cuts in the middle of a longer pattern
///
/// ```rust
/// use mzdigest::DigestionMotif;
/// let motifs = DigestionMotif::parse_list("F[P]|,W[P]|,Y[P]|").unwrap();
/// assert_eq!(motifs.len(), 3);
/// assert_eq!(motifs[0].to_string(), "F[P]|");
/// assert!(DigestionMotif::parse_list("X[Y,P]").is_err());
/// ```
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct DigestionMotif {
    inducing: Vec<MotifResidue>,
    preventing: Option<Vec<MotifResidue>>,
    cut_index: usize,
}

impl DigestionMotif {
    /// Create a new motif.
    /// # Errors
    /// When the inducing pattern is empty, the cut index is outside of the pattern, or a
    /// preventing set is given while the cut is not on the edge of the pattern (so it is unclear
    /// which side of the cut the set guards).
    pub fn new(
        inducing: Vec<MotifResidue>,
        preventing: Option<Vec<MotifResidue>>,
        cut_index: usize,
    ) -> Result<Self, BoxedError<'static, DigestionErrorKind>> {
        if inducing.is_empty() {
            return Err(BoxedError::new(
                DigestionErrorKind::Syntax,
                "Empty motif",
                "A cleavage motif needs at least one inducing residue",
                Context::none(),
            ));
        }
        if cut_index > inducing.len() {
            return Err(BoxedError::new(
                DigestionErrorKind::Syntax,
                "Invalid cut index",
                format!(
                    "The cut index {cut_index} lies outside of the inducing pattern of length {}",
                    inducing.len()
                ),
                Context::none(),
            ));
        }
        if preventing.is_some() && cut_index != 0 && cut_index != inducing.len() {
            return Err(BoxedError::new(
                DigestionErrorKind::Syntax,
                "Ambiguous preventing residues",
                "Preventing residues can only be used when the cut is at the start or end of the inducing pattern",
                Context::none(),
            ));
        }
        if preventing.as_ref().is_some_and(Vec::is_empty) {
            return Err(BoxedError::new(
                DigestionErrorKind::Syntax,
                "Empty preventing residues",
                "A set of preventing residues cannot be empty",
                Context::none(),
            ));
        }
        Ok(Self {
            inducing,
            preventing,
            cut_index,
        })
    }

    /// The pattern that has to be present for this motif to cut
    pub fn inducing(&self) -> &[MotifResidue] {
        &self.inducing
    }

    /// The residues that block the cut when found directly next to it
    pub fn preventing(&self) -> Option<&[MotifResidue]> {
        self.preventing.as_deref()
    }

    /// The offset in the inducing pattern where the cut is placed
    pub const fn cut_index(&self) -> usize {
        self.cut_index
    }

    /// Test if this motif fits at the given start position in the sequence. If it does the
    /// position of the cut is returned, together with a flag that is set if the preventing
    /// residues block this cut.
    pub(crate) fn fits(&self, sequence: &[u8], start: usize) -> Option<(usize, bool)> {
        let window = sequence.get(start..start + self.inducing.len())?;
        if !self
            .inducing
            .iter()
            .zip(window)
            .all(|(pattern, residue)| pattern.matches(*residue))
        {
            return None;
        }
        let cut = start + self.cut_index;
        let prevented = self.preventing.as_ref().is_some_and(|set| {
            let adjacent = if self.cut_index == 0 {
                cut.checked_sub(1).and_then(|index| sequence.get(index))
            } else {
                sequence.get(cut)
            };
            adjacent.is_some_and(|residue| set.iter().any(|pattern| pattern.matches(*residue)))
        });
        Some((cut, prevented))
    }

    /// Parse a comma separated list of motifs, see [`DigestionMotif`] for the format. Whitespace
    /// and double quotes are ignored.
    /// # Errors
    /// If any of the motifs is not valid, or a comma is used inside brackets.
    pub fn parse_list(text: &str) -> Result<Vec<Self>, BoxedError<'_, DigestionErrorKind>> {
        let mut ranges = Vec::new();
        let mut open: Option<(u8, usize)> = None;
        let mut start = 0;
        for (index, c) in text.bytes().enumerate() {
            match (c, open) {
                (b'[' | b'{', Some((_, outer))) => {
                    return Err(BoxedError::new(
                        DigestionErrorKind::Syntax,
                        "Nested brackets",
                        "Brackets cannot be nested in a cleavage motif",
                        Context::line(None, text, outer, index + 1 - outer),
                    ));
                }
                (b'[' | b'{', None) => open = Some((c, index)),
                (b']', Some((b'[', _))) | (b'}', Some((b'{', _))) => open = None,
                (b']' | b'}', _) => {
                    return Err(BoxedError::new(
                        DigestionErrorKind::Syntax,
                        "Unbalanced brackets",
                        "This closing bracket does not close an opening bracket",
                        Context::line(None, text, index, 1),
                    ));
                }
                (b',', Some((_, outer))) => {
                    return Err(BoxedError::new(
                        DigestionErrorKind::Syntax,
                        "Separator inside brackets",
                        "Multiple residues in brackets are written without commas, like `K[PG]|`",
                        Context::line(None, text, outer, index + 1 - outer),
                    ));
                }
                (b',', None) => {
                    ranges.push(start..index);
                    start = index + 1;
                }
                _ => (),
            }
        }
        if let Some((_, outer)) = open {
            return Err(BoxedError::new(
                DigestionErrorKind::Syntax,
                "Unbalanced brackets",
                "This bracket is never closed",
                Context::line(None, text, outer, 1),
            ));
        }
        ranges.push(start..text.len());

        ranges
            .into_iter()
            .map(|range| Self::parse_inner(text, range))
            .collect()
    }

    /// Parse a single motif, see [`DigestionMotif`] for the format.
    /// # Errors
    /// If the motif is not valid.
    pub fn parse(text: &str) -> Result<Self, BoxedError<'_, DigestionErrorKind>> {
        let mut motifs = Self::parse_list(text)?;
        if motifs.len() == 1 {
            Ok(motifs.remove(0))
        } else {
            Err(BoxedError::new(
                DigestionErrorKind::Syntax,
                "Multiple motifs",
                "A single cleavage motif was expected but a list was found",
                Context::line(None, text, 0, text.len()),
            ))
        }
    }

    fn parse_inner(
        text: &str,
        range: Range<usize>,
    ) -> Result<Self, BoxedError<'_, DigestionErrorKind>> {
        let error = |short: &'static str, long: &'static str, offset: usize, length: usize| {
            BoxedError::new(
                DigestionErrorKind::Syntax,
                short,
                long,
                Context::line(None, text, offset, length),
            )
        };
        let bytes = text.as_bytes();
        let mut inducing = Vec::new();
        let mut cut_index = None;
        let mut preventing_before = None;
        let mut preventing_after = None;
        let mut last_was_wildcard = false;
        let mut index = range.start;

        while index < range.end {
            let c = bytes[index];
            match c {
                b' ' | b'\t' | b'\n' | b'\r' | b'"' => (),
                b'|' => {
                    if cut_index.is_some() {
                        return Err(error(
                            "Multiple cut markers",
                            "A cleavage motif needs exactly one cut marker `|`",
                            index,
                            1,
                        ));
                    }
                    cut_index = Some(inducing.len());
                    last_was_wildcard = false;
                }
                b'[' | b'{' => {
                    let close = if c == b'[' { b']' } else { b'}' };
                    let end = bytes[index..range.end]
                        .iter()
                        .position(|b| *b == close)
                        .map(|offset| index + offset)
                        .ok_or_else(|| {
                            error(
                                "Unbalanced brackets",
                                "This bracket is never closed",
                                index,
                                1,
                            )
                        })?;
                    let residues = Self::parse_residues(text, index + 1..end)?;
                    if residues.is_empty() {
                        return Err(error(
                            "Empty brackets",
                            "Brackets in a cleavage motif need at least one residue",
                            index,
                            end + 1 - index,
                        ));
                    }
                    if c == b'{' {
                        if !last_was_wildcard {
                            return Err(error(
                                "Misplaced wildcard exclusion",
                                "Wildcard exclusions `{...}` have to directly follow a wildcard `X`",
                                index,
                                end + 1 - index,
                            ));
                        }
                        let mut excluded = Vec::with_capacity(residues.len());
                        for residue in residues {
                            match residue {
                                MotifResidue::Literal(r) => excluded.push(r),
                                MotifResidue::Any(_) => {
                                    return Err(error(
                                        "Wildcard in wildcard exclusion",
                                        "A wildcard exclusion `{...}` can only list residues, excluding `X` would leave nothing to match",
                                        index,
                                        end + 1 - index,
                                    ));
                                }
                            }
                        }
                        if let Some(last) = inducing.last_mut() {
                            *last = MotifResidue::Any(excluded);
                        }
                    } else if inducing.is_empty() && preventing_before.is_none() {
                        preventing_before = Some((residues, index..end + 1));
                    } else if !inducing.is_empty() && preventing_after.is_none() {
                        preventing_after = Some((residues, index..end + 1));
                    } else {
                        return Err(error(
                            "Multiple preventing sets",
                            "A cleavage motif can have only one set of preventing residues",
                            index,
                            end + 1 - index,
                        ));
                    }
                    last_was_wildcard = false;
                    index = end;
                }
                b'a'..=b'z' | b'A'..=b'Z' => {
                    if preventing_after.is_some() {
                        return Err(error(
                            "Residues after preventing set",
                            "The preventing residues have to be placed at the start or end of the motif",
                            index,
                            1,
                        ));
                    }
                    let residue = c.to_ascii_uppercase();
                    if residue == b'X' {
                        inducing.push(MotifResidue::ANY);
                        last_was_wildcard = true;
                    } else {
                        inducing.push(MotifResidue::Literal(residue));
                        last_was_wildcard = false;
                    }
                }
                b']' | b'}' => {
                    return Err(error(
                        "Unbalanced brackets",
                        "This closing bracket does not close an opening bracket",
                        index,
                        1,
                    ));
                }
                _ => {
                    return Err(error(
                        "Invalid character",
                        "Only residues, `|`, `[...]`, and `{...}` can be used in a cleavage motif",
                        index,
                        text[index..].chars().next().map_or(1, char::len_utf8),
                    ));
                }
            }
            index += 1;
        }

        let whole = || (range.start, range.end.saturating_sub(range.start).max(1));
        if inducing.is_empty() {
            let (offset, length) = whole();
            return Err(error(
                "Empty motif",
                "A cleavage motif needs at least one inducing residue",
                offset,
                length,
            ));
        }
        let Some(cut_index) = cut_index else {
            let (offset, length) = whole();
            return Err(error(
                "Missing cut marker",
                "A cleavage motif needs exactly one cut marker `|`",
                offset,
                length,
            ));
        };
        let preventing = match (preventing_before, preventing_after) {
            (Some(_), Some((_, range))) => {
                return Err(error(
                    "Multiple preventing sets",
                    "A cleavage motif can have only one set of preventing residues",
                    range.start,
                    range.len(),
                ));
            }
            (Some((_, range)), None) if cut_index != 0 => {
                return Err(error(
                    "Ambiguous preventing residues",
                    "Preventing residues before the motif can only be used when cutting N terminal of the motif, like `[P]|D`",
                    range.start,
                    range.len(),
                ));
            }
            (None, Some((_, range))) if cut_index != inducing.len() => {
                return Err(error(
                    "Ambiguous preventing residues",
                    "Preventing residues after the motif can only be used when cutting C terminal of the motif, like `K[P]|`",
                    range.start,
                    range.len(),
                ));
            }
            (Some((set, _)), None) | (None, Some((set, _))) => Some(set),
            (None, None) => None,
        };

        Ok(Self {
            inducing,
            preventing,
            cut_index,
        })
    }

    /// Parse the residues within brackets, only letters (and whitespace) are allowed.
    fn parse_residues(
        text: &str,
        range: Range<usize>,
    ) -> Result<Vec<MotifResidue>, BoxedError<'_, DigestionErrorKind>> {
        let mut residues = Vec::new();
        for (index, c) in text[range.clone()].char_indices() {
            match c {
                ' ' | '\t' | '"' => (),
                'x' | 'X' => residues.push(MotifResidue::ANY),
                c if c.is_ascii_alphabetic() => {
                    residues.push(MotifResidue::Literal(c.to_ascii_uppercase() as u8));
                }
                c => {
                    return Err(BoxedError::new(
                        DigestionErrorKind::Syntax,
                        "Invalid character",
                        "Only residues can be used within brackets in a cleavage motif",
                        Context::line(None, text, range.start + index, c.len_utf8()),
                    ));
                }
            }
        }
        Ok(residues)
    }

    /// Write a list of motifs in the same format as accepted by [`Self::parse_list`].
    pub fn display_list(motifs: &[Self]) -> String {
        motifs.iter().join(",")
    }
}

impl Display for DigestionMotif {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let write_set = |f: &mut std::fmt::Formatter<'_>| -> std::fmt::Result {
            if let Some(set) = &self.preventing {
                write!(f, "[{}]", set.iter().join(""))?;
            }
            Ok(())
        };
        if self.cut_index == 0 {
            write_set(f)?;
            write!(f, "|{}", self.inducing.iter().join(""))
        } else {
            write!(f, "{}", self.inducing[..self.cut_index].iter().join(""))?;
            if self.cut_index == self.inducing.len() {
                write_set(f)?;
            }
            write!(f, "|{}", self.inducing[self.cut_index..].iter().join(""))
        }
    }
}
