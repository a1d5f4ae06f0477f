use std::{fmt::Display, str::FromStr};

use context_error::*;
use serde::{Deserialize, Serialize};

use crate::DigestionErrorKind;

/// What to do with an initiator methionine at the start of a protein
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub enum InitiatorMethionine {
    /// Always keep the methionine
    Retain,
    /// Always remove the methionine
    Cleave,
    /// Generate peptides both with and without the methionine
    #[default]
    Variable,
}

impl Display for InitiatorMethionine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Retain => "Retain",
                Self::Cleave => "Cleave",
                Self::Variable => "Variable",
            }
        )
    }
}

impl FromStr for InitiatorMethionine {
    type Err = BoxedError<'static, DigestionErrorKind>;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "retain" => Ok(Self::Retain),
            "cleave" => Ok(Self::Cleave),
            "variable" => Ok(Self::Variable),
            _ => Err(BoxedError::new(
                DigestionErrorKind::Syntax,
                "Invalid initiator methionine behaviour",
                "Use one of `Retain`, `Cleave`, or `Variable`",
                Context::line(None, s, 0, s.len()).to_owned(),
            )),
        }
    }
}

/// The terminus of a semi specific peptide that is still fixed on a cleavage site
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum SemiTerminus {
    /// The N terminus is on a cleavage site, the C terminus is free
    N,
    /// The C terminus is on a cleavage site, the N terminus is free
    C,
}

/// How peptides are generated from the cleavage sites
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub enum DigestionMode {
    /// Both termini on a cleavage site
    #[default]
    Full,
    /// Only the given terminus on a cleavage site
    Semi(SemiTerminus),
    /// Any substring of the protein
    NonSpecific,
}

impl Display for DigestionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Full => write!(f, "Full"),
            Self::Semi(SemiTerminus::N) => write!(f, "Semi:N"),
            Self::Semi(SemiTerminus::C) => write!(f, "Semi:C"),
            Self::NonSpecific => write!(f, "None"),
        }
    }
}

impl FromStr for DigestionMode {
    type Err = BoxedError<'static, DigestionErrorKind>;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "semi:n" => Ok(Self::Semi(SemiTerminus::N)),
            "semi:c" => Ok(Self::Semi(SemiTerminus::C)),
            "none" | "nonspecific" | "non-specific" => Ok(Self::NonSpecific),
            "semi" => Err(BoxedError::new(
                DigestionErrorKind::InvalidConfiguration,
                "Missing semi specific terminus",
                "A semi specific digestion needs the terminus that stays on a cleavage site, use `Semi:N` or `Semi:C`",
                Context::line(None, s, 0, s.len()).to_owned(),
            )),
            _ => Err(BoxedError::new(
                DigestionErrorKind::Syntax,
                "Invalid digestion mode",
                "Use one of `Full`, `Semi:N`, `Semi:C`, or `None`",
                Context::line(None, s, 0, s.len()).to_owned(),
            )),
        }
    }
}

/// All settings for a digestion. The protease is stored by name and resolved with
/// [`crate::ProteaseRegistry::resolve`]. This way the name survives (de)serialisation and stays
/// available when the mode is set to a lower specificity than the protease itself has.
///
/// The text format is `max_missed,initiator,min,max,mode,protease`:
/// ```rust
/// use mzdigest::*;
/// let parameters: DigestionParameters = "2,Variable,7,50,Semi:N,trypsin".parse().unwrap();
/// assert_eq!(parameters.mode, DigestionMode::Semi(SemiTerminus::N));
/// assert_eq!(parameters.protease, "trypsin");
/// assert_eq!(parameters.to_string(), "2,Variable,7,50,Semi:N,trypsin");
/// ```
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct DigestionParameters {
    /// The name of the protease
    pub protease: String,
    /// The maximal number of cleavage sites within a single peptide
    pub max_missed_cleavages: usize,
    /// The minimal length of a peptide (inclusive)
    pub min_length: usize,
    /// The maximal length of a peptide (inclusive)
    pub max_length: usize,
    /// How to handle an initiator methionine
    pub initiator_methionine: InitiatorMethionine,
    /// How to generate peptides
    pub mode: DigestionMode,
}

impl Default for DigestionParameters {
    /// Trypsin, two missed cleavages, length 7 to 50, variable initiator methionine, and full
    /// specificity
    fn default() -> Self {
        Self::new("trypsin")
    }
}

impl DigestionParameters {
    /// Default parameters with the given protease
    pub fn new(protease: impl Into<String>) -> Self {
        Self {
            protease: protease.into(),
            max_missed_cleavages: 2,
            min_length: 7,
            max_length: 50,
            initiator_methionine: InitiatorMethionine::Variable,
            mode: DigestionMode::Full,
        }
    }

    /// Set the protease
    #[must_use]
    pub fn with_protease(self, protease: impl Into<String>) -> Self {
        Self {
            protease: protease.into(),
            ..self
        }
    }

    /// Set the maximal number of missed cleavages
    #[must_use]
    pub fn with_max_missed_cleavages(self, max_missed_cleavages: usize) -> Self {
        Self {
            max_missed_cleavages,
            ..self
        }
    }

    /// Set the minimal and maximal length (both inclusive)
    #[must_use]
    pub fn with_length(self, min_length: usize, max_length: usize) -> Self {
        Self {
            min_length,
            max_length,
            ..self
        }
    }

    /// Set the initiator methionine behaviour
    #[must_use]
    pub fn with_initiator_methionine(self, initiator_methionine: InitiatorMethionine) -> Self {
        Self {
            initiator_methionine,
            ..self
        }
    }

    /// Set the mode
    #[must_use]
    pub fn with_mode(self, mode: DigestionMode) -> Self {
        Self { mode, ..self }
    }

    /// Check that these parameters are consistent.
    /// # Errors
    /// If the protease name is empty, the minimal length is zero, or the minimal length is above
    /// the maximal length.
    pub fn validate(&self) -> Result<(), BoxedError<'static, DigestionErrorKind>> {
        if self.protease.trim().is_empty() {
            Err(BoxedError::new(
                DigestionErrorKind::InvalidConfiguration,
                "Missing protease",
                "The name of the protease cannot be empty",
                Context::show(self.to_string()),
            ))
        } else if self.min_length == 0 {
            Err(BoxedError::new(
                DigestionErrorKind::InvalidConfiguration,
                "Invalid minimal length",
                "The minimal peptide length has to be at least 1",
                Context::show(self.to_string()),
            ))
        } else if self.min_length > self.max_length {
            Err(BoxedError::new(
                DigestionErrorKind::InvalidConfiguration,
                "Invalid length range",
                format!(
                    "The minimal length ({}) is bigger than the maximal length ({})",
                    self.min_length, self.max_length
                ),
                Context::show(self.to_string()),
            ))
        } else {
            Ok(())
        }
    }
}

impl Display for DigestionParameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{},{},{},{},{},{}",
            self.max_missed_cleavages,
            self.initiator_methionine,
            self.min_length,
            self.max_length,
            self.mode,
            self.protease
        )
    }
}

impl FromStr for DigestionParameters {
    type Err = BoxedError<'static, DigestionErrorKind>;
    /// Parse the parameters from the text format, the protease is the last field so its name can
    /// contain commas. The result is validated.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut offset = 0;
        let fields = s
            .splitn(6, ',')
            .map(|field| {
                let start = offset;
                offset += field.len() + 1;
                (start, field)
            })
            .collect::<Vec<_>>();
        if fields.len() != 6 {
            return Err(BoxedError::new(
                DigestionErrorKind::Syntax,
                "Invalid digestion parameters",
                "The parameters should be six comma separated fields: `max_missed,initiator,min,max,mode,protease`",
                Context::line(None, s, 0, s.len()).to_owned(),
            ));
        }
        let number = |index: usize| {
            let (start, field) = fields[index];
            field.trim().parse::<usize>().map_err(|error| {
                BoxedError::new(
                    DigestionErrorKind::Syntax,
                    "Invalid digestion parameters",
                    format!("This field should be a non negative number: {error}"),
                    Context::line(None, s, start, field.len()).to_owned(),
                )
            })
        };
        let in_context = |index: usize, error: Self::Err| {
            let (start, field) = fields[index];
            error.replace_context(Context::line(None, s, start, field.len()).to_owned())
        };
        let parameters = Self {
            max_missed_cleavages: number(0)?,
            initiator_methionine: fields[1].1.parse().map_err(|e| in_context(1, e))?,
            min_length: number(2)?,
            max_length: number(3)?,
            mode: fields[4].1.parse().map_err(|e| in_context(4, e))?,
            protease: fields[5].1.trim().to_string(),
        };
        parameters.validate()?;
        Ok(parameters)
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let parameters = DigestionParameters::default();
        assert_eq!(parameters.protease, "trypsin");
        assert_eq!(parameters.max_missed_cleavages, 2);
        assert_eq!((parameters.min_length, parameters.max_length), (7, 50));
        assert_eq!(
            parameters.initiator_methionine,
            InitiatorMethionine::Variable
        );
        assert_eq!(parameters.mode, DigestionMode::Full);
        assert!(parameters.validate().is_ok());
        assert_eq!(parameters.to_string(), "2,Variable,7,50,Full,trypsin");
    }

    #[test]
    fn protease_name_survives_lower_specificity() {
        for mode in [
            DigestionMode::Semi(SemiTerminus::N),
            DigestionMode::Semi(SemiTerminus::C),
            DigestionMode::NonSpecific,
        ] {
            let parameters = DigestionParameters::new("Lys-C (don't cleave before proline)")
                .with_mode(mode)
                .with_max_missed_cleavages(3)
                .with_length(5, 30)
                .with_initiator_methionine(InitiatorMethionine::Cleave);
            let text = parameters.to_string();
            let parsed: DigestionParameters = text.parse().unwrap();
            assert_eq!(parsed, parameters, "{text}");
            assert_eq!(parsed.protease, "Lys-C (don't cleave before proline)");
        }
    }

    #[test]
    fn protease_name_with_commas() {
        let parsed: DigestionParameters = "1,Retain,1,10,None,weird, protease".parse().unwrap();
        assert_eq!(parsed.protease, "weird, protease");
        assert_eq!(parsed.mode, DigestionMode::NonSpecific);
        assert_eq!(parsed.to_string(), "1,Retain,1,10,None,weird, protease");
    }

    #[test]
    fn semi_without_terminus() {
        let error = "2,Variable,7,50,Semi,trypsin"
            .parse::<DigestionParameters>()
            .unwrap_err();
        assert!(matches!(
            error.get_kind(),
            DigestionErrorKind::InvalidConfiguration
        ));
    }

    #[test]
    fn invalid_text() {
        for case in [
            "",
            "2,Variable,7,50,Full",
            "-1,Variable,7,50,Full,trypsin",
            "2,Sometimes,7,50,Full,trypsin",
            "2,Variable,seven,50,Full,trypsin",
            "2,Variable,7,50,Half,trypsin",
        ] {
            let error = case.parse::<DigestionParameters>().unwrap_err();
            assert!(
                matches!(error.get_kind(), DigestionErrorKind::Syntax),
                "{case}"
            );
        }
        for case in [
            "2,Variable,50,7,Full,trypsin",
            "2,Variable,0,7,Full,trypsin",
            "2,Variable,7,50,Full, ",
        ] {
            let error = case.parse::<DigestionParameters>().unwrap_err();
            assert!(
                matches!(error.get_kind(), DigestionErrorKind::InvalidConfiguration),
                "{case}"
            );
        }
    }

    #[test]
    fn json() {
        let parameters = DigestionParameters::new("Asp-N")
            .with_mode(DigestionMode::Semi(SemiTerminus::C))
            .with_length(4, 12);
        let json = serde_json::to_string(&parameters).unwrap();
        assert!(json.contains("\"Asp-N\""));
        let back: DigestionParameters = serde_json::from_str(&json).unwrap();
        assert_eq!(back, parameters);
    }
}
