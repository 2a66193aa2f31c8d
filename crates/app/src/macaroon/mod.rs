//! Macaroon bearer tokens
//!
//! SKU tokens are macaroons whose first-party caveats carry `key=value`
//! entitlement parameters. Both the binary V2 and the legacy V1 text
//! serialisations are accepted, wrapped in standard or URL-safe base64.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use thiserror::Error;

mod binary;
mod signature;
mod text;
mod validation;

pub use signature::RootKey;
pub use validation::TokenValidator;

#[derive(Debug, Error)]
pub enum MacaroonError {
    #[error("token is empty")]
    Empty,

    #[error("token is not valid base64")]
    Base64(#[from] base64::DecodeError),

    #[error("unsupported macaroon serialisation")]
    UnsupportedFormat,

    #[error("malformed macaroon: {0}")]
    Malformed(&'static str),

    #[error("invalid signing key")]
    InvalidKey,

    #[error("token is not trusted")]
    Untrusted,
}

/// A caveat attached to a macaroon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caveat {
    pub id: Vec<u8>,
    pub verification_id: Option<Vec<u8>>,
    pub location: Option<String>,
}

impl Caveat {
    #[must_use]
    pub fn first_party(id: impl Into<Vec<u8>>) -> Self {
        Self {
            id: id.into(),
            verification_id: None,
            location: None,
        }
    }

    /// Splits a first-party caveat into a trimmed `(key, value)` pair on the
    /// first `=`. Values may contain further `=` characters.
    #[must_use]
    pub fn key_value(&self) -> Option<(&str, &str)> {
        let text = std::str::from_utf8(&self.id).ok()?;
        let (key, value) = text.split_once('=').unwrap_or((text, ""));

        Some((key.trim(), value.trim()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Macaroon {
    location: Option<String>,
    identifier: Vec<u8>,
    caveats: Vec<Caveat>,
    signature: Vec<u8>,
}

impl Macaroon {
    /// Mint a macaroon signed with `root_key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key cannot be used for signing.
    pub fn mint(
        root_key: &RootKey,
        location: Option<String>,
        identifier: impl Into<Vec<u8>>,
        caveats: Vec<Caveat>,
    ) -> Result<Self, MacaroonError> {
        let identifier = identifier.into();
        let signature = signature::sign(root_key, &identifier, &caveats)?;

        Ok(Self {
            location,
            identifier,
            caveats,
            signature,
        })
    }

    /// Decode a base64 encoded token in either serialisation.
    ///
    /// # Errors
    ///
    /// Returns an error when the token is not base64 or not a macaroon.
    pub fn decode(token: &str) -> Result<Self, MacaroonError> {
        let normalised: String = token
            .trim()
            .trim_end_matches('=')
            .chars()
            .map(|c| match c {
                '+' => '-',
                '/' => '_',
                other => other,
            })
            .collect();

        if normalised.is_empty() {
            return Err(MacaroonError::Empty);
        }

        let bytes = URL_SAFE_NO_PAD.decode(normalised.as_bytes())?;

        match bytes.first() {
            Some(&binary::VERSION) => binary::decode(&bytes),
            Some(_) if text::looks_like_v1(&bytes) => text::decode(&bytes),
            Some(_) => Err(MacaroonError::UnsupportedFormat),
            None => Err(MacaroonError::Empty),
        }
    }

    /// Serialise as binary V2 wrapped in unpadded URL-safe base64.
    #[must_use]
    pub fn encode(&self) -> String {
        URL_SAFE_NO_PAD.encode(binary::encode(self))
    }

    /// Whether the signature chain verifies against `root_key`. Third-party
    /// caveats are never satisfied.
    #[must_use]
    pub fn verify(&self, root_key: &RootKey) -> bool {
        signature::verify(root_key, &self.identifier, &self.caveats, &self.signature)
    }

    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    #[must_use]
    pub fn identifier(&self) -> &[u8] {
        &self.identifier
    }

    #[must_use]
    pub fn caveats(&self) -> &[Caveat] {
        &self.caveats
    }

    #[must_use]
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }
}
