//! Fuzz target for parsing digestion parameters
use afl::*;

fn main() {
    fuzz!(|data: &[u8]| {
        if let Ok(s) = std::str::from_utf8(data)
            && let Ok(parameters) = s.parse::<mzdigest::DigestionParameters>()
        {
            let back = parameters
                .to_string()
                .parse::<mzdigest::DigestionParameters>()
                .unwrap();
            assert_eq!(back.max_missed_cleavages, parameters.max_missed_cleavages);
            assert_eq!(back.min_length, parameters.min_length);
            assert_eq!(back.max_length, parameters.max_length);
            assert_eq!(back.mode, parameters.mode);
            assert_eq!(back.initiator_methionine, parameters.initiator_methionine);
        }
    });
}
