use std::{fmt::Display, str::FromStr};

use context_error::*;
use serde::{Deserialize, Serialize};

use crate::{DigestionErrorKind, DigestionMotif};

/// How strictly the termini of a peptide coincide with the cleavage sites of a protease. This is
/// used as metadata of a [`Protease`] as well as the observed specificity of a digested peptide.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub enum CleavageSpecificity {
    /// Both termini are on a cleavage site
    #[default]
    Full,
    /// One of the termini is on a cleavage site
    Semi,
    /// Neither of the termini has to be on a cleavage site
    NonSpecific,
}

impl Display for CleavageSpecificity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Full => "full",
                Self::Semi => "semi",
                Self::NonSpecific => "none",
            }
        )
    }
}

impl FromStr for CleavageSpecificity {
    type Err = BoxedError<'static, DigestionErrorKind>;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "semi" => Ok(Self::Semi),
            "none" | "nonspecific" | "non-specific" => Ok(Self::NonSpecific),
            _ => Err(BoxedError::new(
                DigestionErrorKind::Syntax,
                "Invalid cleavage specificity",
                "The cleavage specificity has to be one of `full`, `semi`, or `none`",
                Context::line(None, s, 0, s.len()).to_owned(),
            )),
        }
    }
}

/// A protease defined by a set of cleavage motifs, see [`DigestionMotif`]. A position in a
/// sequence is cut if any of the motifs fits there, unless a motif fitting at the same position
/// is blocked by its preventing residues.
///
/// A standard set of proteases can be found in [`crate::ProteaseRegistry::default`].
///
/// # Examples
///
/// ## Finding cut sites in a sequence
/// ```rust
/// # use mzdigest::*;
/// let trypsin = STATIC_PROTEASES.get("trypsin").unwrap();
///
/// // Get all locations where trypsin would cut, the ends of the sequence are always included
/// let cut_sites = trypsin.cleavage_sites(b"SIADIRGRKM");
///
/// assert_eq!(cut_sites, vec![0, 6, 8, 9, 10]);
/// ```
///
/// ## Creating a custom protease
/// ```rust
/// # use mzdigest::*;
/// // Define a custom protease that cuts after Histidine (H)
/// let his_protease = Protease::from_motifs("his", CleavageSpecificity::Full, "H|").unwrap();
///
/// assert_eq!(his_protease.cleavage_sites(b"AAHFGHKLM"), vec![0, 3, 6, 9]);
/// ```
///
/// ## A protease with a longer motif
/// ```rust
/// # use mzdigest::*;
/// // Cuts after two phenylalanines and any residue, when followed by histidine or tryptophan
/// let custom_protease = Protease::from_motifs(
///     "custom",
///     CleavageSpecificity::Full,
///     "FFX|H,FFX|W",
/// )
/// .unwrap();
///
/// let cut_sites = custom_protease.cleavage_sites(b"SLDARETFFMHKDGFFGWHPDTFFAPHPHYFFTSWNVPG");
/// assert_eq!(cut_sites, vec![0, 10, 17, 39]);
/// ```
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Protease {
    name: String,
    specificity: CleavageSpecificity,
    motifs: Vec<DigestionMotif>,
    site: Option<String>,
    psi_ms_accession: Option<String>,
    psi_ms_name: Option<String>,
}

impl Protease {
    /// Create a new protease from already parsed motifs.
    pub fn new(
        name: impl Into<String>,
        specificity: CleavageSpecificity,
        motifs: Vec<DigestionMotif>,
    ) -> Self {
        Self {
            name: name.into(),
            specificity,
            motifs,
            site: None,
            psi_ms_accession: None,
            psi_ms_name: None,
        }
    }

    /// Create a new protease from a list of motifs in text form, see [`DigestionMotif::parse_list`].
    /// An empty (or whitespace only) motif text gives a protease without motifs, which only cuts
    /// at the ends of a sequence.
    /// # Errors
    /// If the motifs are not valid.
    pub fn from_motifs<'a>(
        name: impl Into<String>,
        specificity: CleavageSpecificity,
        motifs: &'a str,
    ) -> Result<Self, BoxedError<'a, DigestionErrorKind>> {
        let motifs = if motifs.trim().is_empty() {
            Vec::new()
        } else {
            DigestionMotif::parse_list(motifs)?
        };
        Ok(Self::new(name, specificity, motifs))
    }

    /// Add a description of the cleavage site.
    #[must_use]
    pub fn with_site(self, site: impl Into<String>) -> Self {
        Self {
            site: Some(site.into()),
            ..self
        }
    }

    /// Add the PSI-MS accession and name.
    #[must_use]
    pub fn with_psi_ms(self, accession: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            psi_ms_accession: Some(accession.into()),
            psi_ms_name: Some(name.into()),
            ..self
        }
    }

    /// The unique name of this protease
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The specificity of this protease
    pub const fn specificity(&self) -> CleavageSpecificity {
        self.specificity
    }

    /// The cleavage motifs of this protease
    pub fn motifs(&self) -> &[DigestionMotif] {
        &self.motifs
    }

    /// The description of the cleavage site, if known
    pub fn site(&self) -> Option<&str> {
        self.site.as_deref()
    }

    /// The PSI-MS accession, if known
    pub fn psi_ms_accession(&self) -> Option<&str> {
        self.psi_ms_accession.as_deref()
    }

    /// The PSI-MS name, if known
    pub fn psi_ms_name(&self) -> Option<&str> {
        self.psi_ms_name.as_deref()
    }

    /// All locations in the given sequence where this protease cuts. A location is the index
    /// between two residues, so 0 is before the first residue and `sequence.len()` after the last.
    /// The ends of the sequence are always included, the result is sorted and contains no
    /// duplicates. A non specific protease cuts at every location.
    pub fn cleavage_sites(&self, sequence: &[u8]) -> Vec<usize> {
        if self.specificity == CleavageSpecificity::NonSpecific {
            return (0..=sequence.len()).collect();
        }
        let mut sites = vec![0];
        let mut window = Vec::new();
        for start in 0..sequence.len() {
            let mut prevented = false;
            window.clear();
            for motif in &self.motifs {
                if let Some((cut, blocked)) = motif.fits(sequence, start) {
                    prevented |= blocked;
                    window.push(cut);
                }
            }
            if !prevented {
                sites.extend_from_slice(&window);
            }
        }
        sites.push(sequence.len());
        sites.sort_unstable();
        sites.dedup();
        sites
    }
}

impl Display for Protease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}) {}",
            self.name,
            self.specificity,
            DigestionMotif::display_list(&self.motifs)
        )
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use std::sync::Arc;

    use crate::{Digestion, DigestionParameters, Protein, STATIC_PROTEASES};

    use super::*;

    struct ProteaseTestCase {
        sequence: &'static str,
        expected_cut_sites: Vec<usize>,
        expected_peptides: Vec<&'static str>,
    }

    /// Generic test function for all proteases
    fn test_protease(protease: &str, test_case: &ProteaseTestCase) {
        let protease = STATIC_PROTEASES.get(protease).unwrap();
        // Test cut sites
        let cut_sites = protease.cleavage_sites(test_case.sequence.as_bytes());

        assert_eq!(
            cut_sites, test_case.expected_cut_sites,
            "Incorrect cut sites: found '{cut_sites:?}' expected '{:?}'",
            test_case.expected_cut_sites
        );

        // Test peptides
        let digestion = Digestion::new(
            Arc::clone(&protease),
            DigestionParameters::new(protease.name())
                .with_max_missed_cleavages(0)
                .with_length(4, 40),
        )
        .unwrap();
        let peptides = digestion.digest(&Protein::new("test", test_case.sequence).unwrap());

        if peptides.len() != test_case.expected_peptides.len() {
            for peptide in &peptides {
                println!("{peptide}");
            }
            panic!("Incorrect number of peptides")
        }

        for (peptide, expected) in peptides.iter().zip(&test_case.expected_peptides) {
            assert_eq!(
                peptide.sequence(),
                *expected,
                "Peptides don't match: found '{peptide}' expected '{expected}'",
            );
        }
    }

    #[test]
    fn trypsin() {
        let test_cases = vec![
            ProteaseTestCase {
                sequence: "AKRPGKR",
                expected_cut_sites: vec![0, 2, 6, 7],
                expected_peptides: vec!["RPGK"],
            },
            ProteaseTestCase {
                sequence: "ARAKGCVLRPKDGR",
                expected_cut_sites: vec![0, 2, 4, 11, 14],
                expected_peptides: vec!["GCVLRPK"],
            },
        ];

        for test_case in test_cases {
            test_protease("trypsin", &test_case);
        }
    }

    #[test]
    fn chymotrypsin() {
        let test_cases = vec![
            ProteaseTestCase {
                sequence: "AFWYPLGF",
                expected_cut_sites: vec![0, 2, 3, 8],
                expected_peptides: vec!["YPLGF"],
            },
            ProteaseTestCase {
                sequence: "AVFUDGWTYPMSR",
                expected_cut_sites: vec![0, 3, 7, 13],
                expected_peptides: vec!["UDGW", "TYPMSR"],
            },
        ];

        for test_case in test_cases {
            test_protease(
                "chymotrypsin (don't cleave before proline)",
                &test_case,
            );
        }
    }

    #[test]
    fn pepsin() {
        let test_cases = vec![
            ProteaseTestCase {
                sequence: "AACVFLPAKLURF",
                expected_cut_sites: vec![0, 5, 6, 10, 13],
                expected_peptides: vec!["AACVF", "PAKL"],
            },
            ProteaseTestCase {
                sequence: "GFLPKDLVMSRG",
                expected_cut_sites: vec![0, 2, 3, 7, 12],
                expected_peptides: vec!["PKDL", "VMSRG"],
            },
        ];

        for test_case in test_cases {
            test_protease("pepsin", &test_case);
        }
    }

    #[test]
    fn aspn() {
        let test_cases = vec![
            ProteaseTestCase {
                sequence: "FARDKPGLFD",
                expected_cut_sites: vec![0, 3, 9, 10],
                expected_peptides: vec!["DKPGLF"],
            },
            ProteaseTestCase {
                sequence: "PFKDLTMSR",
                expected_cut_sites: vec![0, 3, 9],
                expected_peptides: vec!["DLTMSR"],
            },
        ];

        for test_case in test_cases {
            test_protease("Asp-N", &test_case);
        }
    }

    #[test]
    fn gluc() {
        let test_cases = vec![
            ProteaseTestCase {
                sequence: "FAREDKPGLF",
                expected_cut_sites: vec![0, 4, 10],
                expected_peptides: vec!["FARE", "DKPGLF"],
            },
            ProteaseTestCase {
                sequence: "PFKELGTMSR",
                expected_cut_sites: vec![0, 4, 10],
                expected_peptides: vec!["PFKE", "LGTMSR"],
            },
        ];

        for test_case in test_cases {
            test_protease("Glu-C", &test_case);
        }
    }

    #[test]
    fn lysc() {
        let test_cases = vec![
            ProteaseTestCase {
                sequence: "FARKDPGLF",
                expected_cut_sites: vec![0, 4, 9],
                expected_peptides: vec!["FARK", "DPGLF"],
            },
            ProteaseTestCase {
                sequence: "PFKDLTKMSR",
                expected_cut_sites: vec![0, 3, 7, 10],
                expected_peptides: vec!["DLTK"],
            },
        ];

        for test_case in test_cases {
            test_protease("Lys-C (cleave before proline)", &test_case);
        }
    }

    #[test]
    fn argc() {
        let test_cases = vec![
            ProteaseTestCase {
                sequence: "FARKDPGLF",
                expected_cut_sites: vec![0, 3, 9],
                expected_peptides: vec!["KDPGLF"],
            },
            ProteaseTestCase {
                sequence: "PFKDLRTMSR",
                expected_cut_sites: vec![0, 6, 10],
                expected_peptides: vec!["PFKDLR", "TMSR"],
            },
        ];

        for test_case in test_cases {
            test_protease("Arg-C", &test_case);
        }
    }

    #[test]
    fn ends_are_always_sites() {
        for name in STATIC_PROTEASES.names() {
            let protease = STATIC_PROTEASES.get(&name).unwrap();
            for sequence in ["", "A", "KKKK", "PROTEIN", "MKPKPKPMKA", "GPXGPXGPX"] {
                let sites = protease.cleavage_sites(sequence.as_bytes());
                assert_eq!(sites.first(), Some(&0), "{name} on '{sequence}'");
                assert_eq!(sites.last(), Some(&sequence.len()), "{name} on '{sequence}'");
                assert!(sites.windows(2).all(|w| w[0] < w[1]), "{name} on '{sequence}'");
            }
        }
    }

    #[test]
    fn one_motif_multiple_preventing() {
        let protease = Protease::from_motifs(
            "multiple preventing",
            CleavageSpecificity::Full,
            "N[M]|,N[C]|,N[A]|",
        )
        .unwrap();
        assert_eq!(protease.cleavage_sites(b"PRONFNMMHFHAA"), vec![0, 4, 13]);
        assert_eq!(protease.cleavage_sites(b"NANCNMNG"), vec![0, 7, 8]);
    }

    #[test]
    fn wildcard_exclusion() {
        let protease =
            Protease::from_motifs("wildcard", CleavageSpecificity::Full, "RX{P}|").unwrap();
        assert_eq!(protease.cleavage_sites(b"PROPRPPM"), vec![0, 3, 8]);
    }

    #[test]
    fn n_terminal_multi_letter() {
        let protease = Protease::from_motifs("triple A", CleavageSpecificity::Full, "|AAA").unwrap();
        assert_eq!(protease.cleavage_sites(b"FAAAMAAM"), vec![0, 1, 8]);
    }

    #[test]
    fn n_terminal_preventing() {
        let protease =
            Protease::from_motifs("not after P", CleavageSpecificity::Full, "[P]|D").unwrap();
        assert_eq!(protease.cleavage_sites(b"ADPDD"), vec![0, 1, 4, 5]);
    }

    #[test]
    fn ambiguous_residues_in_sequence() {
        let trypsin = STATIC_PROTEASES.get("trypsin").unwrap();
        let aspn = STATIC_PROTEASES.get("Asp-N").unwrap();
        assert_eq!(aspn.cleavage_sites(b"AABAA"), vec![0, 2, 5]);
        assert_eq!(trypsin.cleavage_sites(b"akaa"), vec![0, 2, 4]);
    }

    #[test]
    fn non_specific_cuts_everywhere() {
        let protease = STATIC_PROTEASES.get("non-specific").unwrap();
        assert_eq!(protease.cleavage_sites(b"PRO"), vec![0, 1, 2, 3]);
        assert_eq!(protease.cleavage_sites(b""), vec![0]);
    }

    #[test]
    fn specificity_text() {
        for specificity in [
            CleavageSpecificity::Full,
            CleavageSpecificity::Semi,
            CleavageSpecificity::NonSpecific,
        ] {
            assert_eq!(
                specificity.to_string().parse::<CleavageSpecificity>().unwrap(),
                specificity
            );
        }
        assert_eq!(
            "Non-Specific".parse::<CleavageSpecificity>().unwrap(),
            CleavageSpecificity::NonSpecific
        );
        assert!("half".parse::<CleavageSpecificity>().is_err());
    }
}
