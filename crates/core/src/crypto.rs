//! Wallet identities: ed25519 keys, addresses and signature verification.
//!
//! A wallet address is derived from an ed25519 public key. Because a bare
//! ed25519 signature does not let a verifier recover the signer's key, the
//! wallet signature carried in submissions bundles the public key with the
//! signature (see [`WalletSignature`]).

use crate::hash::hash;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub type AddressBytes = [u8; 20];

/// Length of an encoded wallet signature: public key followed by signature.
pub const WALLET_SIGNATURE_LEN: usize = 32 + 64;

/// A wallet address: the first 20 bytes of the BLAKE3 hash of a public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(pub AddressBytes);

impl Address {
    pub const ZERO: Self = Self([0u8; 20]);

    pub fn from_bytes(bytes: AddressBytes) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &AddressBytes {
        &self.0
    }

    /// Hex with a `0x` prefix. This is the form embedded in challenges.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parse from hex, with or without the `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let mut arr = [0u8; 20];
        hex::decode_to_slice(s, &mut arr).map_err(|_| CryptoError::InvalidAddress)?;
        Ok(Self(arr))
    }
}

impl FromStr for Address {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Errors from key handling and signature decoding.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid address format")]
    InvalidAddress,
    #[error("invalid public key")]
    InvalidPublicKey,
    #[error("invalid signature encoding: {0}")]
    InvalidSignatureEncoding(String),
    #[error("signature verification failed")]
    VerificationFailed,
}

/// An ed25519 public key.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey(pub VerifyingKey);

impl PublicKey {
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, CryptoError> {
        VerifyingKey::from_bytes(bytes)
            .map(Self)
            .map_err(|_| CryptoError::InvalidPublicKey)
    }

    pub fn as_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    pub fn to_address(&self) -> Address {
        let digest = hash(self.0.as_bytes());
        let mut addr = [0u8; 20];
        addr.copy_from_slice(&digest.0[..20]);
        Address(addr)
    }

    pub fn verify(&self, message: &[u8], signature: &[u8; 64]) -> Result<(), CryptoError> {
        let sig = Signature::from_bytes(signature);
        self.0
            .verify(message, &sig)
            .map_err(|_| CryptoError::VerificationFailed)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", hex::encode(&self.0.as_bytes()[..8]))
    }
}

/// The signature a wallet hands back for a challenge message.
///
/// Encoded as hex of `public_key (32 bytes) || signature (64 bytes)`.
#[derive(Clone, PartialEq, Eq)]
pub struct WalletSignature {
    pub public_key: PublicKey,
    pub signature: [u8; 64],
}

impl WalletSignature {
    pub fn encode(&self) -> String {
        let mut raw = Vec::with_capacity(WALLET_SIGNATURE_LEN);
        raw.extend_from_slice(&self.public_key.as_bytes());
        raw.extend_from_slice(&self.signature);
        hex::encode(raw)
    }

    pub fn decode(s: &str) -> Result<Self, CryptoError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let raw =
            hex::decode(s).map_err(|e| CryptoError::InvalidSignatureEncoding(e.to_string()))?;
        if raw.len() != WALLET_SIGNATURE_LEN {
            return Err(CryptoError::InvalidSignatureEncoding(format!(
                "expected {} bytes, got {}",
                WALLET_SIGNATURE_LEN,
                raw.len()
            )));
        }

        let mut key = [0u8; 32];
        key.copy_from_slice(&raw[..32]);
        let mut signature = [0u8; 64];
        signature.copy_from_slice(&raw[32..]);

        Ok(Self {
            public_key: PublicKey::from_bytes(&key)?,
            signature,
        })
    }

    /// Check that this signature was made by the key behind `address` over `message`.
    pub fn verify(&self, message: &[u8], address: &Address) -> Result<(), CryptoError> {
        if self.public_key.to_address() != *address {
            return Err(CryptoError::VerificationFailed);
        }
        self.public_key.verify(message, &self.signature)
    }
}

impl fmt::Debug for WalletSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletSignature")
            .field("signer", &self.public_key.to_address())
            .finish()
    }
}

impl fmt::Display for WalletSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Decides whether `signature` proves that `address` signed `message`.
///
/// Implementations must return `false` for malformed input rather than
/// panicking.
pub trait SignatureVerifier: Send + Sync {
    fn verify(&self, message: &str, address: &Address, signature: &str) -> bool;
}

/// Verifies [`WalletSignature`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Verifier;

impl SignatureVerifier for Ed25519Verifier {
    fn verify(&self, message: &str, address: &Address, signature: &str) -> bool {
        match WalletSignature::decode(signature) {
            Ok(sig) => sig.verify(message.as_bytes(), address).is_ok(),
            Err(_) => false,
        }
    }
}

/// An ed25519 keypair. Stands in for wallet software in tests and tooling.
pub struct Keypair {
    signing_key: SigningKey,
    pub public_key: PublicKey,
}

impl Keypair {
    pub fn generate() -> Self {
        Self::from_signing_key(SigningKey::generate(&mut OsRng))
    }

    pub fn from_private_key(bytes: &[u8; 32]) -> Self {
        Self::from_signing_key(SigningKey::from_bytes(bytes))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let public_key = PublicKey(signing_key.verifying_key());
        Self {
            signing_key,
            public_key,
        }
    }

    pub fn private_key(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    pub fn address(&self) -> Address {
        self.public_key.to_address()
    }

    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }

    /// Sign a text message the way a wallet would answer a challenge.
    pub fn sign_message(&self, message: &str) -> WalletSignature {
        WalletSignature {
            public_key: self.public_key.clone(),
            signature: self.sign(message.as_bytes()),
        }
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("address", &self.address())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_hex_roundtrip() {
        let addr = Keypair::generate().address();
        assert_eq!(Address::from_hex(&addr.to_hex()).unwrap(), addr);
        assert_eq!(Address::from_hex(&hex::encode(addr.0)).unwrap(), addr);
        assert_eq!(addr.to_string().parse::<Address>().unwrap(), addr);
    }

    #[test]
    fn test_address_rejects_bad_hex() {
        assert_eq!(Address::from_hex("0x1234"), Err(CryptoError::InvalidAddress));
        assert_eq!(Address::from_hex("not an address"), Err(CryptoError::InvalidAddress));
    }

    #[test]
    fn test_private_key_determines_address() {
        let kp = Keypair::generate();
        let restored = Keypair::from_private_key(&kp.private_key());
        assert_eq!(kp.address(), restored.address());
    }

    #[test]
    fn test_wallet_signature_verifies() {
        let kp = Keypair::generate();
        let sig = kp.sign_message("hello");
        let encoded = sig.encode();

        assert_eq!(encoded.len(), WALLET_SIGNATURE_LEN * 2);
        assert!(Ed25519Verifier.verify("hello", &kp.address(), &encoded));
    }

    #[test]
    fn test_wrong_message_fails() {
        let kp = Keypair::generate();
        let sig = kp.sign_message("hello").encode();
        assert!(!Ed25519Verifier.verify("goodbye", &kp.address(), &sig));
    }

    #[test]
    fn test_signature_from_other_wallet_fails() {
        let owner = Keypair::generate();
        let thief = Keypair::generate();
        let sig = thief.sign_message("claim").encode();
        assert!(!Ed25519Verifier.verify("claim", &owner.address(), &sig));
    }

    #[test]
    fn test_malformed_signature_is_false() {
        let kp = Keypair::generate();
        let addr = kp.address();
        assert!(!Ed25519Verifier.verify("m", &addr, ""));
        assert!(!Ed25519Verifier.verify("m", &addr, "zzzz"));
        assert!(!Ed25519Verifier.verify("m", &addr, &"ab".repeat(10)));
        assert!(matches!(
            WalletSignature::decode("abcd"),
            Err(CryptoError::InvalidSignatureEncoding(_))
        ));
    }

    #[test]
    fn test_decode_roundtrip_preserves_signer() {
        let kp = Keypair::generate();
        let sig = kp.sign_message("x");
        let decoded = WalletSignature::decode(&sig.to_string()).unwrap();
        assert_eq!(decoded, sig);
        assert_eq!(decoded.public_key.to_address(), kp.address());
    }
}
