//! HMAC-SHA256 signature chain.

use std::fmt;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::Zeroize;

use super::{Caveat, MacaroonError};

type HmacSha256 = Hmac<Sha256>;

const KEY_GENERATOR: &[u8] = b"macaroons-key-generator";

/// Root secret used to mint and verify SKU tokens.
#[derive(Clone)]
pub struct RootKey {
    bytes: Vec<u8>,
}

impl RootKey {
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl From<&str> for RootKey {
    fn from(value: &str) -> Self {
        Self::new(value.as_bytes().to_vec())
    }
}

impl fmt::Debug for RootKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RootKey(**redacted**)")
    }
}

impl Drop for RootKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

fn keyed_hash(key: &[u8], data: &[u8]) -> Result<Vec<u8>, MacaroonError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_length| MacaroonError::InvalidKey)?;
    mac.update(data);

    Ok(mac.finalize().into_bytes().to_vec())
}

pub(super) fn sign(
    root_key: &RootKey,
    identifier: &[u8],
    caveats: &[Caveat],
) -> Result<Vec<u8>, MacaroonError> {
    let key = keyed_hash(KEY_GENERATOR, root_key.as_bytes())?;
    let mut signature = keyed_hash(&key, identifier)?;

    for caveat in caveats {
        if caveat.verification_id.is_some() {
            return Err(MacaroonError::Malformed("third-party caveats are not supported"));
        }

        signature = keyed_hash(&signature, &caveat.id)?;
    }

    Ok(signature)
}

/// Recomputes the chain and compares the final link in constant time.
pub(super) fn verify(
    root_key: &RootKey,
    identifier: &[u8],
    caveats: &[Caveat],
    expected: &[u8],
) -> bool {
    if caveats.iter().any(|c| c.verification_id.is_some()) {
        return false;
    }

    let messages: Vec<&[u8]> = std::iter::once(identifier)
        .chain(caveats.iter().map(|c| c.id.as_slice()))
        .collect();

    let Some((last, chain)) = messages.split_last() else {
        return false;
    };

    let Ok(mut key) = keyed_hash(KEY_GENERATOR, root_key.as_bytes()) else {
        return false;
    };

    for message in chain {
        match keyed_hash(&key, message) {
            Ok(next) => key = next,
            Err(_) => return false,
        }
    }

    let Ok(mut mac) = HmacSha256::new_from_slice(&key) else {
        return false;
    };

    mac.update(last);
    mac.verify_slice(expected).is_ok()
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn verify_accepts_own_signature() -> TestResult {
        let key = RootKey::from("root");
        let caveats = vec![Caveat::first_party("sku=vpn")];

        let signature = sign(&key, b"id", &caveats)?;

        assert!(verify(&key, b"id", &caveats, &signature));

        Ok(())
    }

    #[test]
    fn verify_detects_tampered_caveat() -> TestResult {
        let key = RootKey::from("root");
        let signature = sign(&key, b"id", &[Caveat::first_party("price=1")])?;

        assert!(!verify(
            &key,
            b"id",
            &[Caveat::first_party("price=0")],
            &signature
        ));

        Ok(())
    }

    #[test]
    fn verify_rejects_third_party_caveats() -> TestResult {
        let key = RootKey::from("root");
        let signature = sign(&key, b"id", &[])?;
        let caveat = Caveat {
            id: b"tp".to_vec(),
            verification_id: Some(b"vid".to_vec()),
            location: Some("elsewhere".to_string()),
        };

        assert!(!verify(&key, b"id", &[caveat], &signature));

        Ok(())
    }

    #[test]
    fn root_key_debug_is_redacted() {
        assert_eq!(format!("{:?}", RootKey::from("s3cr3t")), "RootKey(**redacted**)");
    }
}
