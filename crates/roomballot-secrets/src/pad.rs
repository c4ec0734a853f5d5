//! Name padding and one-time pads.
//!
//! ```text
//! padded_name = name ++ PAD_FILLER * (width - len(name))
//! secret      = padded_name XOR pad
//! padded_name = secret XOR pad
//! ```
//!
//! Pads are alphanumeric so they can be handed out as plain text.

use rand::{CryptoRng, Rng, distributions::Alphanumeric};
use roomballot_types::{BallotError, Result, constants::PAD_FILLER};

/// Right-pad `name` to `width` bytes.
///
/// `participant` only labels the error.
///
/// # Errors
/// Returns `NameTooLong` if `name` is longer than `width` bytes. Names are
/// never truncated.
pub fn pad_name(participant: usize, name: &str, width: usize) -> Result<Vec<u8>> {
    let len = name.len();
    if len > width {
        return Err(BallotError::NameTooLong {
            participant,
            len,
            max: width,
        });
    }
    let mut padded = Vec::with_capacity(width);
    padded.extend_from_slice(name.as_bytes());
    padded.resize(width, PAD_FILLER);
    Ok(padded)
}

/// Byte-wise XOR of two equal-length slices.
#[must_use]
pub fn xor(a: &[u8], b: &[u8]) -> Vec<u8> {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).map(|(x, y)| x ^ y).collect()
}

/// Uniformly random alphanumeric pad of `width` characters.
///
/// Only accepts cryptographically secure generators.
pub fn generate_pad<R: Rng + CryptoRng>(rng: &mut R, width: usize) -> String {
    (0..width).map(|_| char::from(rng.sample(Alphanumeric))).collect()
}

/// Secret material for one participant, derived exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretRecord {
    pub padded_name: Vec<u8>,
    pub pad: String,
    pub secret: Vec<u8>,
}

impl SecretRecord {
    /// Draw a fresh pad for an already padded name.
    pub fn new<R: Rng + CryptoRng>(padded_name: Vec<u8>, rng: &mut R) -> Self {
        let pad = generate_pad(rng, padded_name.len());
        let secret = xor(&padded_name, pad.as_bytes());
        Self {
            padded_name,
            pad,
            secret,
        }
    }

    /// Hex form of the secret identity, as published.
    #[must_use]
    pub fn secret_hex(&self) -> String {
        hex::encode(&self.secret)
    }
}
