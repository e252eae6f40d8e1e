//! DNA input normalisation for the command-line front end.
//!
//! The aligner itself accepts any symbols; this layer is where the
//! A/T/G/C restriction lives.

use crate::{AlignerError, Sequence};

pub const DNA_ALPHABET: &[u8] = b"ATGC";

/// Trims, upper-cases and checks a raw DNA sequence.
pub fn parse_dna(raw: &str) -> Result<Sequence, AlignerError> {
    let normalized = raw.trim().to_ascii_uppercase();
    if normalized.is_empty() {
        return Err(AlignerError::InvalidInput("sequence is empty".to_string()));
    }
    if let Some((offset, symbol)) = normalized
        .char_indices()
        .find(|(_, c)| !c.is_ascii() || !DNA_ALPHABET.contains(&(*c as u8)))
    {
        return Err(AlignerError::InvalidInput(format!(
            "invalid DNA symbol {symbol:?} at offset {offset} (A, T, G, C only)"
        )));
    }
    Ok(Sequence::new(normalized.as_bytes()))
}
