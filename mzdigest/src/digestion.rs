use std::{collections::HashSet, fmt::Display, sync::Arc};

use context_error::*;
#[cfg(feature = "rayon")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    CleavageSpecificity, DigestionErrorKind, DigestionMode, DigestionParameters,
    InitiatorMethionine, Protease, Protein, SemiTerminus,
};


/// The rule that generated a peptide
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum PeptideOrigin {
    /// Between two cleavage sites of the protein
    Full,
    /// Between two cleavage sites, starting right after a removed initiator methionine
    InitiatorCleaved,
    /// Between two cleavage sites of a pre annotated region of the protein
    ProteolysisProduct,
    /// The given terminus is on a cleavage site, the other is free
    SemiSpecific(SemiTerminus),
    /// Any substring
    NonSpecific,
}

/// A peptide generated by a [`Digestion`]. Two peptides are the same if they come from the same
/// protein and span the same residues.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DigestedPeptide {
    accession: String,
    start: usize,
    end: usize,
    sequence: String,
    missed_cleavages: usize,
    specificity: CleavageSpecificity,
    origin: PeptideOrigin,
}

impl DigestedPeptide {
    /// The accession of the protein this peptide comes from
    pub fn accession(&self) -> &str {
        &self.accession
    }

    /// The first residue in the protein (1-based, inclusive)
    pub const fn start(&self) -> usize {
        self.start
    }

    /// The last residue in the protein (1-based, inclusive)
    pub const fn end(&self) -> usize {
        self.end
    }

    /// The sequence
    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    /// The length
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    /// Check if the sequence is empty, which is never the case for a generated peptide
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// The number of cleavage sites of the protease within this peptide
    pub const fn missed_cleavages(&self) -> usize {
        self.missed_cleavages
    }

    /// The observed specificity, the number of termini that are on a cleavage site
    pub const fn specificity(&self) -> CleavageSpecificity {
        self.specificity
    }

    /// The rule that generated this peptide
    pub const fn origin(&self) -> PeptideOrigin {
        self.origin
    }
}

impl PartialEq for DigestedPeptide {
    fn eq(&self, other: &Self) -> bool {
        self.accession == other.accession && self.start == other.start && self.end == other.end
    }
}

impl Eq for DigestedPeptide {}

impl std::hash::Hash for DigestedPeptide {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.accession.hash(state);
        self.start.hash(state);
        self.end.hash(state);
    }
}

impl Display for DigestedPeptide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.sequence)
    }
}

/// A protease with validated parameters, ready to digest proteins. Get one from
/// [`crate::ProteaseRegistry::resolve`] or [`Self::new`].
///
/// ```rust
/// use mzdigest::*;
/// let digestion = STATIC_PROTEASES
///     .resolve(&DigestionParameters::new("trypsin").with_max_missed_cleavages(0).with_length(1, 50))
///     .unwrap();
/// let protein = Protein::new("P12345", "PROTEIN").unwrap();
/// let peptides = digestion.digest(&protein);
/// assert_eq!(peptides.len(), 2);
/// assert_eq!(peptides[0].sequence(), "PR");
/// assert_eq!(peptides[1].sequence(), "OTEIN");
/// ```
#[derive(Clone, Debug)]
pub struct Digestion {
    protease: Arc<Protease>,
    parameters: DigestionParameters,
}

impl Digestion {
    /// Combine a protease with parameters, the protease name in the parameters is set to the name
    /// of the given protease.
    /// # Errors
    /// If the parameters are not valid, see [`DigestionParameters::validate`].
    pub fn new(
        protease: Arc<Protease>,
        parameters: DigestionParameters,
    ) -> Result<Self, BoxedError<'static, DigestionErrorKind>> {
        let parameters = parameters.with_protease(protease.name());
        parameters.validate()?;
        tracing::debug!(
            protease = protease.name(),
            specificity = %protease.specificity(),
            parameters = %parameters,
            "resolved digestion"
        );
        Ok(Self {
            protease,
            parameters,
        })
    }

    /// The protease
    pub fn protease(&self) -> &Protease {
        &self.protease
    }

    /// The parameters
    pub const fn parameters(&self) -> &DigestionParameters {
        &self.parameters
    }

    /// Digest a protein. The result contains every span only once, ordered by the rule that
    /// generated it: first the whole protein, then every pre annotated region.
    pub fn digest(&self, protein: &Protein) -> Vec<DigestedPeptide> {
        let sequence = protein.sequence().as_bytes();
        let sites = self.protease.cleavage_sites(sequence);
        let regions = self.regions(protein);
        let cleave_initiator = protein.has_initiator_methionine()
            && self.parameters.initiator_methionine != InitiatorMethionine::Retain;

        let mut boundaries = Vec::with_capacity(regions.len() * 2 + 1);
        if cleave_initiator {
            boundaries.push(1);
        }
        boundaries.extend(regions.iter().flat_map(|(begin, end)| [*begin, *end]));
        boundaries.sort_unstable();
        boundaries.dedup();

        let mut collector = Collector {
            protein,
            sites: &sites,
            boundaries: &boundaries,
            min_length: self.parameters.min_length,
            max_length: self.parameters.max_length,
            seen: HashSet::new(),
            peptides: Vec::new(),
        };

        match (self.protease.specificity(), self.parameters.mode) {
            (_, DigestionMode::NonSpecific) => {
                self.non_specific(&mut collector, protein);
            }
            (CleavageSpecificity::Semi, DigestionMode::Full) => {
                self.semi(&mut collector, protein, &regions, SemiTerminus::N);
                self.semi(&mut collector, protein, &regions, SemiTerminus::C);
            }
            (_, DigestionMode::Semi(terminus)) => {
                self.semi(&mut collector, protein, &regions, terminus);
            }
            (_, DigestionMode::Full) => {
                self.full(
                    &mut collector,
                    &sites,
                    self.initiator_starts(protein, false),
                    PeptideOrigin::Full,
                );
                for (begin, end) in &regions {
                    let list = local_sites(&sites, *begin, *end);
                    self.full(
                        &mut collector,
                        &list,
                        self.initiator_starts(protein, true),
                        PeptideOrigin::ProteolysisProduct,
                    );
                }
            }
        }

        tracing::trace!(
            accession = protein.accession(),
            sites = sites.len(),
            peptides = collector.peptides.len(),
            "digested protein"
        );
        collector.peptides
    }

    /// Digest multiple proteins one after the other
    pub fn digest_all<'a>(
        &'a self,
        proteins: impl IntoIterator<Item = &'a Protein> + 'a,
    ) -> impl Iterator<Item = Vec<DigestedPeptide>> + 'a {
        proteins.into_iter().map(|protein| self.digest(protein))
    }

    #[cfg(feature = "rayon")]
    /// Digest multiple proteins in parallel, the order of the results is the same as the order of
    /// the proteins
    pub fn par_digest<'a>(
        &'a self,
        proteins: &'a [Protein],
    ) -> impl IndexedParallelIterator<Item = Vec<DigestedPeptide>> + 'a {
        proteins.par_iter().map(|protein| self.digest(protein))
    }

    /// The pre annotated regions as 0-based half open spans, without the regions spanning the
    /// whole protein or lying outside of it
    fn regions(&self, protein: &Protein) -> Vec<(usize, usize)> {
        let mut regions = Vec::new();
        for product in protein.proteolysis_products() {
            if product.begin == 0 || product.begin > product.end || product.end > protein.len() {
                tracing::warn!(
                    accession = protein.accession(),
                    begin = product.begin,
                    end = product.end,
                    label = product.label.as_str(),
                    length = protein.len(),
                    "skipping proteolysis product outside of the protein"
                );
                continue;
            }
            let region = (product.begin - 1, product.end);
            if region != (0, protein.len()) && !regions.contains(&region) {
                regions.push(region);
            }
        }
        regions
    }

    /// The start positions to use instead of a peptide start at 0. A region starting at the first
    /// residue loses the methionine when it is always cleaved, if it is only optionally cleaved the
    /// cleaved variants are left to the digestion of the whole protein.
    fn initiator_starts(
        &self,
        protein: &Protein,
        region: bool,
    ) -> &'static [(usize, Option<PeptideOrigin>)] {
        if !protein.has_initiator_methionine() {
            return &[(0, None)];
        }
        match self.parameters.initiator_methionine {
            InitiatorMethionine::Retain => &[(0, None)],
            InitiatorMethionine::Cleave => &[(1, Some(PeptideOrigin::InitiatorCleaved))],
            InitiatorMethionine::Variable if region => &[(0, None)],
            InitiatorMethionine::Variable => &[
                (0, None),
                (1, Some(PeptideOrigin::InitiatorCleaved)),
            ],
        }
    }

    /// All spans between two sites with at most the maximal number of missed cleavages in between,
    /// generated with all spans without missed cleavages first. A span starting at 0 starts at
    /// the given initiator starts instead.
    fn full(
        &self,
        collector: &mut Collector<'_>,
        sites: &[usize],
        initiator_starts: &[(usize, Option<PeptideOrigin>)],
        origin: PeptideOrigin,
    ) {
        for missed in 0..=self.parameters.max_missed_cleavages {
            for (index, end) in sites.iter().enumerate().skip(missed + 1) {
                let start = sites[index - missed - 1];
                if start == 0 {
                    for (start, override_origin) in initiator_starts {
                        collector.push(*start, *end, override_origin.unwrap_or(origin));
                    }
                } else {
                    collector.push(start, *end, origin);
                }
            }
        }
    }

    /// Semi specific peptides, for the whole protein and all regions
    fn semi(
        &self,
        collector: &mut Collector<'_>,
        protein: &Protein,
        regions: &[(usize, usize)],
        terminus: SemiTerminus,
    ) {
        let sites = collector.sites;
        self.semi_on(
            collector,
            sites,
            self.initiator_starts(protein, false),
            terminus,
        );
        for (begin, end) in regions {
            let list = local_sites(sites, *begin, *end);
            self.semi_on(
                collector,
                &list,
                self.initiator_starts(protein, true),
                terminus,
            );
        }
    }

    /// Semi specific peptides for a single list of sites. The fixed terminus is on a site, the
    /// free terminus takes all positions that keep the length within bounds and do not cross more
    /// than the maximal number of missed cleavages.
    fn semi_on(
        &self,
        collector: &mut Collector<'_>,
        sites: &[usize],
        initiator_starts: &[(usize, Option<PeptideOrigin>)],
        terminus: SemiTerminus,
    ) {
        let Some(last) = sites.len().checked_sub(1) else {
            return;
        };
        let missed = self.parameters.max_missed_cleavages;
        let (min, max) = (self.parameters.min_length, self.parameters.max_length);
        let origin = PeptideOrigin::SemiSpecific(terminus);
        match terminus {
            SemiTerminus::N => {
                for index in 0..last {
                    let bound = sites[(index + missed + 1).min(last)];
                    let starts: &[(usize, Option<PeptideOrigin>)] = if sites[index] == 0 {
                        initiator_starts
                    } else {
                        &[(sites[index], None)]
                    };
                    for (start, _) in starts {
                        for end in (start + min)..=start.saturating_add(max).min(bound) {
                            collector.push(*start, end, origin);
                        }
                    }
                }
            }
            SemiTerminus::C => {
                let lowest = initiator_starts
                    .iter()
                    .map(|(start, _)| *start)
                    .min()
                    .unwrap_or_default();
                for index in 1..=last {
                    let end = sites[index];
                    let bound = sites[index.saturating_sub(missed + 1)];
                    let first = end.saturating_sub(max).max(bound).max(lowest);
                    let Some(latest) = end.checked_sub(min) else {
                        continue;
                    };
                    for start in first..=latest {
                        collector.push(start, end, origin);
                    }
                }
            }
        }
    }

    /// All substrings within the length bounds
    fn non_specific(&self, collector: &mut Collector<'_>, protein: &Protein) {
        let length = protein.len();
        let lowest = usize::from(
            protein.has_initiator_methionine()
                && self.parameters.initiator_methionine == InitiatorMethionine::Cleave,
        );
        for start in lowest..length {
            let first = start + self.parameters.min_length;
            let last = start.saturating_add(self.parameters.max_length).min(length);
            for end in first..=last {
                collector.push(start, end, PeptideOrigin::NonSpecific);
            }
        }
    }
}

/// The sites for a region: its begin, all sites strictly within, and its end
fn local_sites(sites: &[usize], begin: usize, end: usize) -> Vec<usize> {
    let from = sites.partition_point(|site| *site <= begin);
    let to = sites.partition_point(|site| *site < end);
    let mut list = Vec::with_capacity(to.saturating_sub(from) + 2);
    list.push(begin);
    list.extend_from_slice(&sites[from..to.max(from)]);
    list.push(end);
    list
}

/// Gathers the peptides for one protein, filters on length, and removes duplicate spans. All
/// positions are 0-based half open.
struct Collector<'a> {
    protein: &'a Protein,
    sites: &'a [usize],
    boundaries: &'a [usize],
    min_length: usize,
    max_length: usize,
    seen: HashSet<(usize, usize)>,
    peptides: Vec<DigestedPeptide>,
}

impl Collector<'_> {
    fn push(&mut self, start: usize, end: usize, origin: PeptideOrigin) {
        if end <= start || end > self.protein.len() {
            return;
        }
        let length = end - start;
        if length < self.min_length || length > self.max_length || !self.seen.insert((start, end))
        {
            return;
        }
        let missed_cleavages = self
            .sites
            .partition_point(|site| *site < end)
            .saturating_sub(self.sites.partition_point(|site| *site <= start));
        let specificity = match usize::from(self.is_site(start)) + usize::from(self.is_site(end)) {
            2 => CleavageSpecificity::Full,
            1 => CleavageSpecificity::Semi,
            _ => CleavageSpecificity::NonSpecific,
        };
        self.peptides.push(DigestedPeptide {
            accession: self.protein.accession().to_string(),
            start: start + 1,
            end,
            sequence: self.protein.sequence()[start..end].to_string(),
            missed_cleavages,
            specificity,
            origin,
        });
    }

    fn is_site(&self, position: usize) -> bool {
        self.sites.binary_search(&position).is_ok()
            || self.boundaries.binary_search(&position).is_ok()
    }
}
