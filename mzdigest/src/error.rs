//! The [`DigestionErrorKind`] which makes it easy for downstream users of the error type to match on the exact error.

use context_error::ErrorKind;

/// All errors that can be raised by this crate, all of them are caused by input given by the caller
/// and none of them are worth retrying without changing that input.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum DigestionErrorKind {
    /// A cleavage motif definition (or protease table) could not be parsed
    #[default]
    Syntax,
    /// A protease name was used that is not present in the registry
    UnknownProtease,
    /// The digestion parameters are inconsistent, for example a minimal length above the maximal length
    InvalidConfiguration,
    /// A protein sequence contained characters that are not residues
    InvalidSequence,
}

impl ErrorKind for DigestionErrorKind {
    type Settings = ();
    fn descriptor(&self) -> &'static str {
        "error"
    }
    fn ignored(&self, _settings: Self::Settings) -> bool {
        false
    }
    fn is_error(&self, _settings: Self::Settings) -> bool {
        true
    }
}
