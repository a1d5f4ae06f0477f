//! Fuzz target for parsing cleavage motif lists
use afl::*;

fn main() {
    fuzz!(|data: &[u8]| {
        if let Ok(s) = std::str::from_utf8(data)
            && let Ok(motifs) = mzdigest::DigestionMotif::parse_list(s)
        {
            // The display of parsed motifs has to parse back to the same motifs
            let shown = mzdigest::DigestionMotif::display_list(&motifs);
            assert_eq!(mzdigest::DigestionMotif::parse_list(&shown).unwrap(), motifs);
            let protease =
                mzdigest::Protease::new("fuzz", mzdigest::CleavageSpecificity::Full, motifs);
            let sites = protease.cleavage_sites(b"MKPRDEGPAGPAKKRPWFYLDNMAQ");
            assert!(sites.windows(2).all(|w| w[0] < w[1]));
        }
    });
}
