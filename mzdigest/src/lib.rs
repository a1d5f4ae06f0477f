#![doc = include_str!("../README.md")]

mod digestion;
mod error;
mod motif;
mod parameters;
mod protease;
mod protein;
mod registry;
mod residue;

pub use digestion::*;
pub use error::*;
pub use motif::*;
pub use parameters::*;
pub use protease::*;
pub use protein::*;
pub use registry::*;
pub use residue::*;

/// The most used types, to be imported with a glob import
pub mod prelude {
    pub use crate::{
        CleavageSpecificity, DigestedPeptide, Digestion, DigestionMode, DigestionParameters,
        InitiatorMethionine, Protease, ProteaseRegistry, Protein, ProteolysisProduct,
        STATIC_PROTEASES, SemiTerminus,
    };
}
