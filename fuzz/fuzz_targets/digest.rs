//! Fuzz target for digesting arbitrary protein sequences
use afl::*;
use mzdigest::prelude::*;

fn main() {
    let digestions = [
        DigestionMode::Full,
        DigestionMode::Semi(SemiTerminus::N),
        DigestionMode::Semi(SemiTerminus::C),
    ]
    .map(|mode| {
        STATIC_PROTEASES
            .resolve(
                &DigestionParameters::new("trypsin")
                    .with_length(1, 30)
                    .with_mode(mode),
            )
            .unwrap()
    });
    fuzz!(|data: &[u8]| {
        if let Ok(s) = std::str::from_utf8(data)
            && let Ok(protein) = Protein::new("fuzz", s)
        {
            for digestion in &digestions {
                for peptide in digestion.digest(&protein) {
                    assert!((1..=30).contains(&peptide.len()));
                    assert_eq!(
                        protein.subsequence(peptide.start(), peptide.end()),
                        Some(peptide.sequence())
                    );
                }
            }
        }
    });
}
