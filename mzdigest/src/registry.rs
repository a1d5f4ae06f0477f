//! The registry of all known proteases

use std::{
    collections::HashMap,
    sync::{Arc, LazyLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use context_error::*;
use itertools::Itertools;

use crate::{CleavageSpecificity, Digestion, DigestionErrorKind, DigestionParameters, Protease};

/// A single shared static registry with all built-in proteases, for cases where no custom
/// proteases are needed (like tests). Proteases registered here are visible to all users of the
/// static.
pub static STATIC_PROTEASES: LazyLock<ProteaseRegistry> = LazyLock::new(ProteaseRegistry::default);

/// The built-in proteases: name, motifs, specificity, PSI-MS accession and name, site description.
const BUILT_IN: &[(
    &str,
    &str,
    CleavageSpecificity,
    Option<(&str, &str)>,
    &str,
)] = &[
    (
        "trypsin",
        "K[P]|,R[P]|",
        CleavageSpecificity::Full,
        Some(("MS:1001251", "Trypsin")),
        "after K or R, not before P",
    ),
    (
        "trypsin|P",
        "K|,R|",
        CleavageSpecificity::Full,
        Some(("MS:1001313", "Trypsin/P")),
        "after K or R",
    ),
    (
        "Arg-C",
        "R|",
        CleavageSpecificity::Full,
        Some(("MS:1001303", "Arg-C")),
        "after R",
    ),
    (
        "Asp-N",
        "|D",
        CleavageSpecificity::Full,
        Some(("MS:1001304", "Asp-N")),
        "before D",
    ),
    (
        "Lys-C (don't cleave before proline)",
        "K[P]|",
        CleavageSpecificity::Full,
        Some(("MS:1001309", "Lys-C")),
        "after K, not before P",
    ),
    (
        "Lys-C (cleave before proline)",
        "K|",
        CleavageSpecificity::Full,
        Some(("MS:1001310", "Lys-C/P")),
        "after K",
    ),
    (
        "Lys-N",
        "|K",
        CleavageSpecificity::Full,
        None,
        "before K",
    ),
    (
        "chymotrypsin (don't cleave before proline)",
        "F[P]|,W[P]|,Y[P]|",
        CleavageSpecificity::Full,
        Some(("MS:1001306", "Chymotrypsin")),
        "after F, W, or Y, not before P",
    ),
    (
        "chymotrypsin (cleave before proline)",
        "F|,W|,Y|",
        CleavageSpecificity::Full,
        None,
        "after F, W, or Y",
    ),
    (
        "Glu-C",
        "E|",
        CleavageSpecificity::Full,
        Some(("MS:1001917", "glutamyl endopeptidase")),
        "after E",
    ),
    (
        "Glu-C (with asp)",
        "E|,D|",
        CleavageSpecificity::Full,
        None,
        "after E or D",
    ),
    (
        "CNBr",
        "M|",
        CleavageSpecificity::Full,
        Some(("MS:1001307", "CNBr")),
        "after M",
    ),
    (
        "elastase",
        "A|,V|,S|,G|,L|,I|",
        CleavageSpecificity::Full,
        None,
        "after A, V, S, G, L, or I",
    ),
    (
        "pepsin",
        "F|,W|,Y|,L|",
        CleavageSpecificity::Full,
        Some(("MS:1001311", "PepsinA")),
        "after F, W, Y, or L",
    ),
    (
        "collagenase",
        "GPX|GPX",
        CleavageSpecificity::Full,
        None,
        "between two GPX repeats",
    ),
    (
        "top-down",
        "",
        CleavageSpecificity::Full,
        None,
        "no cleavage, whole protein",
    ),
    (
        "non-specific",
        "",
        CleavageSpecificity::NonSpecific,
        Some(("MS:1001956", "unspecific cleavage")),
        "any position",
    ),
];

/// A named collection of proteases. Lookups can happen concurrently, registration takes an
/// exclusive lock for the duration of the insertion only. The proteases themselves are shared as
/// [`Arc`]s so a resolved [`Digestion`] does not keep the registry locked.
///
/// Get one via [`Self::default`] (with all built-in proteases), [`Self::empty`], or use the shared
/// [`STATIC_PROTEASES`].
///
/// ```rust
/// use mzdigest::*;
/// let registry = ProteaseRegistry::default();
/// let trypsin = registry.get("trypsin").unwrap();
/// assert_eq!(trypsin.cleavage_sites(b"PEPTIDEKAR"), vec![0, 8, 10]);
///
/// // Add a custom protease
/// registry
///     .register_motifs("Lys-Arg", CleavageSpecificity::Full, "KR|")
///     .unwrap();
/// assert!(registry.contains("Lys-Arg"));
/// assert!(registry.get("Arg-Lys").is_err());
/// ```
pub struct ProteaseRegistry {
    proteases: RwLock<HashMap<String, Arc<Protease>>>,
}

impl std::fmt::Debug for ProteaseRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProteaseRegistry")
            .field("proteases", &self.len())
            .finish()
    }
}

impl Default for ProteaseRegistry {
    /// A registry containing all built-in proteases
    fn default() -> Self {
        let registry = Self::empty();
        for (name, motifs, specificity, psi_ms, site) in BUILT_IN {
            match Protease::from_motifs(*name, *specificity, motifs) {
                Ok(protease) => {
                    let protease = protease.with_site(*site);
                    registry.register(if let Some((accession, psi_name)) = psi_ms {
                        protease.with_psi_ms(*accession, *psi_name)
                    } else {
                        protease
                    });
                }
                Err(error) => tracing::error!(protease = name, %error, "invalid built-in protease"),
            }
        }
        registry
    }
}

impl ProteaseRegistry {
    /// A registry without any proteases
    pub fn empty() -> Self {
        Self {
            proteases: RwLock::new(HashMap::new()),
        }
    }

    /// A poisoned lock only means another thread panicked while holding it, the map itself is
    /// always in a consistent state as it is only changed with single inserts.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<Protease>>> {
        self.proteases.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<Protease>>> {
        self.proteases
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a protease under its name. If a protease with this name already exists it is
    /// overwritten and the previous one returned.
    pub fn register(&self, protease: Protease) -> Option<Arc<Protease>> {
        tracing::debug!(
            protease = protease.name(),
            motifs = protease.motifs().len(),
            "registering protease"
        );
        self.write()
            .insert(protease.name().to_string(), Arc::new(protease))
    }

    /// Parse the motifs and register the resulting protease, see [`Protease::from_motifs`].
    /// # Errors
    /// If the motifs are not valid, in that case nothing is registered.
    pub fn register_motifs<'a>(
        &self,
        name: impl Into<String>,
        specificity: CleavageSpecificity,
        motifs: &'a str,
    ) -> Result<Arc<Protease>, BoxedError<'a, DigestionErrorKind>> {
        let protease = Arc::new(Protease::from_motifs(name, specificity, motifs)?);
        tracing::debug!(
            protease = protease.name(),
            motifs = protease.motifs().len(),
            "registering protease"
        );
        self.write()
            .insert(protease.name().to_string(), Arc::clone(&protease));
        Ok(protease)
    }

    /// Get the protease with exactly this name.
    /// # Errors
    /// If no protease with this name is registered.
    pub fn get(&self, name: &str) -> Result<Arc<Protease>, BoxedError<'static, DigestionErrorKind>> {
        let proteases = self.read();
        proteases.get(name).cloned().ok_or_else(|| {
            let close = proteases
                .keys()
                .filter(|key| key.to_ascii_lowercase().contains(&name.to_ascii_lowercase()))
                .sorted()
                .join("`, `");
            BoxedError::new(
                DigestionErrorKind::UnknownProtease,
                "Unknown protease",
                if close.is_empty() {
                    "There is no protease registered with this name".to_string()
                } else {
                    format!(
                        "There is no protease registered with this name, did you mean any of: `{close}`"
                    )
                },
                Context::show(name.to_string()),
            )
        })
    }

    /// Check if a protease with exactly this name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    /// The names of all registered proteases, sorted
    pub fn names(&self) -> Vec<String> {
        self.read().keys().cloned().sorted().collect()
    }

    /// The number of registered proteases
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Check if there are no registered proteases
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Validate the parameters and look up the protease they name, this gives a [`Digestion`]
    /// that can be used to digest any number of proteins.
    /// # Errors
    /// If the parameters are not valid or the protease is not registered.
    pub fn resolve(
        &self,
        parameters: &DigestionParameters,
    ) -> Result<Digestion, BoxedError<'static, DigestionErrorKind>> {
        parameters.validate()?;
        let protease = self.get(&parameters.protease)?;
        Digestion::new(protease, parameters.clone())
    }

    /// Register all proteases from a tab separated table. The columns are `Name`, `Motif`,
    /// `Specificity`, `PSI-MS Accession`, `PSI-MS Name`, and `Site`, only the first three are
    /// required. Empty lines, lines starting with `#`, and a header line starting with `Name` are
    /// skipped. All lines are validated before any protease is registered.
    ///
    /// ```rust
    /// use mzdigest::*;
    /// let registry = ProteaseRegistry::empty();
    /// let added = registry
    ///     .extend_from_tsv("Name\tMotif\tSpecificity\nLys-Arg\tK|,R|\tfull\nthermolysin\t|L,|F\tsemi")
    ///     .unwrap();
    /// assert_eq!(added, 2);
    /// assert_eq!(
    ///     registry.get("thermolysin").unwrap().specificity(),
    ///     CleavageSpecificity::Semi
    /// );
    /// ```
    /// # Errors
    /// All lines that could not be parsed, in that case nothing is registered.
    pub fn extend_from_tsv<'a>(
        &self,
        text: &'a str,
    ) -> Result<usize, Vec<BoxedError<'a, DigestionErrorKind>>> {
        let mut proteases = Vec::new();
        let mut errors = Vec::new();
        for (line_index, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("Name\t") {
                continue;
            }
            match Self::parse_tsv_line(line_index as u32, line) {
                Ok(protease) => proteases.push(protease),
                Err(error) => errors.push(error),
            }
        }
        if errors.is_empty() {
            let added = proteases.len();
            for protease in proteases {
                self.register(protease);
            }
            Ok(added)
        } else {
            Err(errors)
        }
    }

    fn parse_tsv_line(
        line_index: u32,
        line: &str,
    ) -> Result<Protease, BoxedError<'_, DigestionErrorKind>> {
        let mut offset = 0;
        let cells = line
            .split('\t')
            .map(|cell| {
                let start = offset;
                offset += cell.len() + 1;
                (start, cell)
            })
            .collect_vec();
        if cells.len() < 3 {
            return Err(BoxedError::new(
                DigestionErrorKind::Syntax,
                "Invalid protease line",
                "A protease line needs at least a name, motif, and specificity column separated by tabs",
                Context::full_line(line_index, line),
            ));
        }
        let cell = |index: usize| {
            cells
                .get(index)
                .map(|(_, cell)| cell.trim())
                .filter(|cell| !cell.is_empty())
        };
        let name = cells[0].1.trim();
        if name.is_empty() {
            return Err(BoxedError::new(
                DigestionErrorKind::Syntax,
                "Missing protease name",
                "The name of a protease cannot be empty",
                Context::line(Some(line_index), line, 0, cells[0].1.len().max(1)),
            ));
        }
        let specificity = cells[2].1.parse::<CleavageSpecificity>().map_err(|error| {
            error.replace_context(Context::line(
                Some(line_index),
                line,
                cells[2].0,
                cells[2].1.len().max(1),
            ))
        })?;
        let protease = Protease::from_motifs(name, specificity, cells[1].1).map_err(|error| {
            error.replace_context(Context::line(
                Some(line_index),
                line,
                cells[1].0,
                cells[1].1.len().max(1),
            ))
        })?;
        let protease = match (cell(3), cell(4)) {
            (Some(accession), Some(psi_name)) => protease.with_psi_ms(accession, psi_name),
            _ => protease,
        };
        Ok(match cell(5) {
            Some(site) => protease.with_site(site),
            None => protease,
        })
    }
}
