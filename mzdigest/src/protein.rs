use context_error::*;
use serde::{Deserialize, Serialize};

use crate::{DigestionErrorKind, InitiatorMethionine};

/// A named region of a protein, for example a signal peptide or a chain, or a product generated
/// by [`Protein::add_truncation_products`] or [`Protein::cleave_once_between_products`].
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct ProteolysisProduct {
    /// The first residue (1-based, inclusive)
    pub begin: usize,
    /// The last residue (1-based, inclusive)
    pub end: usize,
    /// A description of this product
    pub label: String,
}

impl ProteolysisProduct {
    /// Create a new product
    pub fn new(begin: usize, end: usize, label: impl Into<String>) -> Self {
        Self {
            begin,
            end,
            label: label.into(),
        }
    }

    /// The number of residues covered
    pub const fn len(&self) -> usize {
        (self.end + 1).saturating_sub(self.begin)
    }

    /// Check if no residues are covered
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The settings for [`Protein::add_truncation_products`].
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct TruncationParameters {
    /// The region (1-based, inclusive) to truncate, the whole protein if not set
    pub region: Option<(usize, usize)>,
    /// Truncate the N terminus
    pub n_terminal: bool,
    /// Truncate the C terminus
    pub c_terminal: bool,
    /// How to handle an initiator methionine if the region starts at the first residue
    pub initiator_methionine: InitiatorMethionine,
    /// The minimal length of a product (inclusive)
    pub min_length: usize,
    /// The number of residues that are removed one by one from a terminus
    pub truncation_length: usize,
    /// The label given to all products
    pub label: String,
}

impl Default for TruncationParameters {
    fn default() -> Self {
        Self {
            region: None,
            n_terminal: true,
            c_terminal: true,
            initiator_methionine: InitiatorMethionine::Variable,
            min_length: 7,
            truncation_length: 5,
            label: "biomarker".to_string(),
        }
    }
}

/// A protein, the subject of a digestion. Deserialising goes through [`Protein::new`] so the
/// sequence is validated and stored in upper case.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(try_from = "UncheckedProtein")]
pub struct Protein {
    accession: String,
    sequence: String,
    proteolysis_products: Vec<ProteolysisProduct>,
}

#[derive(Deserialize)]
struct UncheckedProtein {
    accession: String,
    sequence: String,
    #[serde(default)]
    proteolysis_products: Vec<ProteolysisProduct>,
}

impl TryFrom<UncheckedProtein> for Protein {
    type Error = BoxedError<'static, DigestionErrorKind>;
    fn try_from(value: UncheckedProtein) -> Result<Self, Self::Error> {
        Ok(Self::new(value.accession, value.sequence)?
            .with_proteolysis_products(value.proteolysis_products))
    }
}

impl Protein {
    /// Create a new protein, the sequence is stored in upper case.
    /// # Errors
    /// If the sequence contains anything except ASCII letters.
    pub fn new(
        accession: impl Into<String>,
        sequence: impl Into<String>,
    ) -> Result<Self, BoxedError<'static, DigestionErrorKind>> {
        let mut sequence = sequence.into();
        if let Some((index, c)) = sequence
            .char_indices()
            .find(|(_, c)| !c.is_ascii_alphabetic())
        {
            return Err(BoxedError::new(
                DigestionErrorKind::InvalidSequence,
                "Invalid protein sequence",
                "A protein sequence can only contain residues, written as single letters",
                Context::line(None, sequence.as_str(), index, c.len_utf8()).to_owned(),
            ));
        }
        sequence.make_ascii_uppercase();
        Ok(Self {
            accession: accession.into(),
            sequence,
            proteolysis_products: Vec::new(),
        })
    }

    /// Add pre annotated regions, like chains or signal peptides, to this protein.
    #[must_use]
    pub fn with_proteolysis_products(
        mut self,
        products: impl IntoIterator<Item = ProteolysisProduct>,
    ) -> Self {
        for product in products {
            self.add_proteolysis_product(product);
        }
        self
    }

    /// Add a product, if a product with the same span already exists nothing is added and false
    /// is returned.
    pub fn add_proteolysis_product(&mut self, product: ProteolysisProduct) -> bool {
        if self.has_product(product.begin, product.end) {
            false
        } else {
            self.proteolysis_products.push(product);
            true
        }
    }

    fn has_product(&self, begin: usize, end: usize) -> bool {
        self.proteolysis_products
            .iter()
            .any(|p| p.begin == begin && p.end == end)
    }

    /// The accession
    pub fn accession(&self) -> &str {
        &self.accession
    }

    /// The sequence
    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    /// All proteolysis products, in the order they were added
    pub fn proteolysis_products(&self) -> &[ProteolysisProduct] {
        &self.proteolysis_products
    }

    /// The length of the sequence
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    /// Check if the sequence is empty
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Check if the protein starts with an initiator methionine
    pub fn has_initiator_methionine(&self) -> bool {
        self.sequence.as_bytes().first() == Some(&b'M')
    }

    /// The sequence of a 1-based inclusive span, if it is within the protein
    pub fn subsequence(&self, begin: usize, end: usize) -> Option<&str> {
        if begin == 0 || begin > end + 1 {
            None
        } else {
            self.sequence.get(begin - 1..end)
        }
    }

    /// Add products for a protein (region) that is truncated one residue at a time from the N
    /// and/or C terminus. For an N terminal truncation the products start 1 up to
    /// `truncation_length` residues after the region start, for a C terminal truncation they end
    /// 1 up to `truncation_length` before the region end. With both termini set both series are
    /// generated. If the region starts at the first residue and the protein starts with a
    /// methionine the region start is handled according to the initiator methionine setting. Only
    /// products that are at least `min_length` long and do not exist yet are added.
    ///
    /// ```rust
    /// use mzdigest::*;
    /// let mut protein = Protein::new("P12345", "MPEPTIDE").unwrap();
    /// let added = protein.add_truncation_products(&TruncationParameters {
    ///     n_terminal: true,
    ///     c_terminal: false,
    ///     initiator_methionine: InitiatorMethionine::Retain,
    ///     min_length: 2,
    ///     truncation_length: 3,
    ///     ..Default::default()
    /// });
    /// assert_eq!(added, 3);
    /// assert_eq!(protein.subsequence(2, 8), Some("PEPTIDE"));
    /// ```
    ///
    /// Returns the number of added products.
    pub fn add_truncation_products(&mut self, parameters: &TruncationParameters) -> usize {
        let (begin, end) = parameters.region.unwrap_or((1, self.len()));
        if begin == 0 || begin > end || end > self.len() {
            tracing::warn!(
                accession = self.accession.as_str(),
                begin,
                end,
                length = self.len(),
                "truncation region outside of the protein"
            );
            return 0;
        }
        let begins: &[usize] = if begin == 1 && self.has_initiator_methionine() {
            match parameters.initiator_methionine {
                InitiatorMethionine::Retain => &[1],
                InitiatorMethionine::Cleave => &[2],
                InitiatorMethionine::Variable => &[1, 2],
            }
        } else {
            &[begin]
        };

        let mut added = 0;
        for &start in begins {
            if parameters.n_terminal {
                for step in 1..=parameters.truncation_length {
                    let new_begin = start + step;
                    if new_begin > end {
                        break;
                    }
                    added += usize::from(self.add_truncation(new_begin, end, parameters));
                }
            }
            if parameters.c_terminal {
                for step in 1..=parameters.truncation_length {
                    let Some(new_end) = end.checked_sub(step).filter(|e| *e >= start) else {
                        break;
                    };
                    added += usize::from(self.add_truncation(start, new_end, parameters));
                }
            }
        }
        added
    }

    fn add_truncation(&mut self, begin: usize, end: usize, parameters: &TruncationParameters) -> bool {
        end + 1 - begin >= parameters.min_length
            && self.add_proteolysis_product(ProteolysisProduct::new(
                begin,
                end,
                parameters.label.clone(),
            ))
    }

    /// Add the products of a single cut between the existing products. Every end position of an
    /// existing product (except the protein end) is a boundary. For each boundary the N terminal
    /// part (from the first residue up to the boundary) and the C terminal part (from the boundary
    /// up to the last residue) are added if they are at least `min_length` long and do not exist
    /// yet. A minimal length of 7 is common.
    ///
    /// Returns the number of added products.
    pub fn cleave_once_between_products(&mut self, min_length: usize) -> usize {
        let length = self.len();
        let mut boundaries: Vec<usize> = self
            .proteolysis_products
            .iter()
            .map(|p| p.end)
            .filter(|end| *end > 0 && *end < length)
            .collect();
        boundaries.sort_unstable();
        boundaries.dedup();

        let mut added = 0;
        for boundary in boundaries {
            if boundary >= min_length {
                added += usize::from(self.add_proteolysis_product(ProteolysisProduct::new(
                    1,
                    boundary,
                    format!("N-terminal Portion of Singly Cleaved Protein(1-{boundary})"),
                )));
            }
            if length - boundary >= min_length {
                added += usize::from(self.add_proteolysis_product(ProteolysisProduct::new(
                    boundary + 1,
                    length,
                    format!(
                        "C-terminal Portion of Singly Cleaved Protein({}-{length})",
                        boundary + 1
                    ),
                )));
            }
        }
        added
    }
}
