//! Wallet management and transaction signing.
//!
//! # Security
//! - The mnemonic is supplied per request by the caller
//! - Keys are never logged or serialized
//! - `Debug` shows the address only

use bip39::Language;
use ed25519_dalek::{Signer, SigningKey};
use rand::RngCore;
use sha2::{Digest, Sha512_256};

use crate::blockchain::types::{Address, BlockchainError, BlockchainResult};

/// Number of words in an account mnemonic.
pub const MNEMONIC_WORDS: usize = 25;

const BITS_PER_WORD: u32 = 11;
const WORD_MASK: u32 = 0x7ff;

/// Signing account reconstructed from a mnemonic.
#[derive(Clone)]
pub struct Wallet {
    signing_key: SigningKey,
    address: Address,
}

impl Wallet {
    /// Create a wallet from a 32-byte Ed25519 seed.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(&seed);
        let address = Address::from_public_key(signing_key.verifying_key().to_bytes());
        Self {
            signing_key,
            address,
        }
    }

    /// Create a wallet from a 25-word mnemonic.
    ///
    /// Whitespace is normalised and words are matched case-insensitively.
    pub fn from_mnemonic(phrase: &str) -> BlockchainResult<Self> {
        let seed = seed_from_mnemonic(phrase)?;
        Ok(Self::from_seed(seed))
    }

    /// Generate a wallet from fresh OS randomness.
    pub fn generate() -> Self {
        let mut seed = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut seed);
        Self::from_seed(seed)
    }

    /// The wallet's address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Export the seed back to its mnemonic.
    pub fn to_mnemonic(&self) -> String {
        mnemonic_from_seed(&self.signing_key.to_bytes())
    }

    /// Sign raw bytes. Callers add any domain prefix themselves.
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Encode a seed as 24 data words plus one checksum word.
pub fn mnemonic_from_seed(seed: &[u8; 32]) -> String {
    let words = Language::English.word_list();
    let mut indices = to_11_bit(seed);
    indices.push(checksum_index(seed));
    indices
        .iter()
        .map(|&i| words[i as usize])
        .collect::<Vec<_>>()
        .join(" ")
}

/// Decode a mnemonic back into its seed, verifying the checksum word.
pub fn seed_from_mnemonic(phrase: &str) -> BlockchainResult<[u8; 32]> {
    let normalized = phrase.trim().to_lowercase();
    let words: Vec<&str> = normalized.split_whitespace().collect();
    if words.len() != MNEMONIC_WORDS {
        return Err(BlockchainError::Wallet(format!(
            "Invalid mnemonic length: expected {} words, got {}",
            MNEMONIC_WORDS,
            words.len()
        )));
    }

    let mut indices = Vec::with_capacity(MNEMONIC_WORDS);
    for word in &words {
        let index = Language::English
            .find_word(word)
            .ok_or_else(|| BlockchainError::Wallet("Mnemonic contains an unknown word".to_string()))?;
        indices.push(index);
    }

    let bytes = from_11_bit(&indices[..MNEMONIC_WORDS - 1]);
    // 24 words carry 264 bits: 32 seed bytes plus a zero padding byte.
    if bytes.len() != 33 || bytes[32] != 0 {
        return Err(BlockchainError::Wallet("Mnemonic does not encode a valid key".to_string()));
    }

    let mut seed = [0u8; 32];
    seed.copy_from_slice(&bytes[..32]);

    if checksum_index(&seed) != indices[MNEMONIC_WORDS - 1] {
        return Err(BlockchainError::Wallet("Mnemonic checksum mismatch".to_string()));
    }
    Ok(seed)
}

fn checksum_index(seed: &[u8; 32]) -> u16 {
    let digest = Sha512_256::digest(seed);
    to_11_bit(&digest[..2])[0]
}

/// Little-endian split into 11-bit groups; a partial tail group is kept.
fn to_11_bit(bytes: &[u8]) -> Vec<u16> {
    let mut out = Vec::with_capacity(bytes.len() * 8 / BITS_PER_WORD as usize + 1);
    let mut buffer: u32 = 0;
    let mut bits: u32 = 0;
    for &byte in bytes {
        buffer |= u32::from(byte) << bits;
        bits += 8;
        if bits >= BITS_PER_WORD {
            out.push((buffer & WORD_MASK) as u16);
            buffer >>= BITS_PER_WORD;
            bits -= BITS_PER_WORD;
        }
    }
    if bits > 0 {
        out.push((buffer & WORD_MASK) as u16);
    }
    out
}

fn from_11_bit(groups: &[u16]) -> Vec<u8> {
    let mut out = Vec::with_capacity(groups.len() * BITS_PER_WORD as usize / 8 + 1);
    let mut buffer: u32 = 0;
    let mut bits: u32 = 0;
    for &group in groups {
        buffer |= u32::from(group) << bits;
        bits += BITS_PER_WORD;
        while bits >= 8 {
            out.push((buffer & 0xff) as u8);
            buffer >>= 8;
            bits -= 8;
        }
    }
    if bits > 0 {
        out.push((buffer & 0xff) as u8);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signature, Verifier, VerifyingKey};

    // Seed 0x00..0x1f. Publicly known, never fund it.
    const TEST_MNEMONIC: &str = "cactus amount account expect army achieve embark anxiety lift crouch mandate abstract captain setup party bench tissue gate arrive random deal mansion wedding abandon curtain";
    const TEST_ADDRESS: &str = "AOQQPP7TZYIL4HLQ3UMOOS6ATFT6JVRQTOSQ2XY53SDGIESVGG4MPFYUMQ";

    fn test_seed() -> [u8; 32] {
        let mut seed = [0u8; 32];
        for (i, b) in seed.iter_mut().enumerate() {
            *b = i as u8;
        }
        seed
    }

    #[test]
    fn test_mnemonic_from_known_seed() {
        assert_eq!(mnemonic_from_seed(&test_seed()), TEST_MNEMONIC);
        assert_eq!(
            mnemonic_from_seed(&[7u8; 32]),
            "thought bright logic idea asthma scrub deal alpha thought bright logic idea asthma scrub deal alpha thought bright logic idea asthma scrub deal abandon crisp"
        );
    }

    #[test]
    fn test_wallet_from_mnemonic() {
        let wallet = Wallet::from_mnemonic(TEST_MNEMONIC).unwrap();
        assert_eq!(wallet.address().to_string(), TEST_ADDRESS);
        assert_eq!(wallet.to_mnemonic(), TEST_MNEMONIC);
    }

    #[test]
    fn test_mnemonic_whitespace_and_case() {
        let messy = format!("  {}  ", TEST_MNEMONIC.to_uppercase().replace(' ', "   \n"));
        let wallet = Wallet::from_mnemonic(&messy).unwrap();
        assert_eq!(wallet.address().to_string(), TEST_ADDRESS);
    }

    #[test]
    fn test_mnemonic_wrong_length() {
        let short = TEST_MNEMONIC.split(' ').take(24).collect::<Vec<_>>().join(" ");
        let err = Wallet::from_mnemonic(&short).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Wallet error: Invalid mnemonic length: expected 25 words, got 24"
        );
    }

    #[test]
    fn test_mnemonic_bad_checksum() {
        let mut words: Vec<&str> = TEST_MNEMONIC.split(' ').collect();
        words[24] = "abandon";
        let err = Wallet::from_mnemonic(&words.join(" ")).unwrap_err();
        assert!(err.to_string().contains("checksum"));
    }

    #[test]
    fn test_mnemonic_unknown_word() {
        let mut words: Vec<&str> = TEST_MNEMONIC.split(' ').collect();
        words[3] = "algorand";
        assert!(Wallet::from_mnemonic(&words.join(" ")).is_err());
    }

    #[test]
    fn test_generated_wallet_round_trips() {
        let wallet = Wallet::generate();
        let restored = Wallet::from_mnemonic(&wallet.to_mnemonic()).unwrap();
        assert_eq!(wallet.address(), restored.address());
    }

    #[test]
    fn test_signature_verifies() {
        let wallet = Wallet::from_seed(test_seed());
        let signature = wallet.sign(b"TXpayload");
        let key = VerifyingKey::from_bytes(wallet.address().as_bytes()).unwrap();
        assert!(key
            .verify(b"TXpayload", &Signature::from_bytes(&signature))
            .is_ok());
    }

    #[test]
    fn test_debug_hides_key() {
        let wallet = Wallet::from_seed(test_seed());
        let debug = format!("{:?}", wallet);
        assert!(debug.contains(TEST_ADDRESS));
        assert!(!debug.contains("signing_key"));
    }
}
