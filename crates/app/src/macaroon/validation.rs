//! Trust checks performed before a SKU token is parsed.

use rustc_hash::FxHashSet;

use super::{Macaroon, MacaroonError, RootKey};

/// Decides whether a SKU token may be used to create order items.
///
/// A token is trusted when it appears verbatim in the allow-list, or when a
/// root key is configured and the token's signature chain verifies.
#[derive(Debug, Clone, Default)]
pub struct TokenValidator {
    allowed: FxHashSet<String>,
    root_key: Option<RootKey>,
}

impl TokenValidator {
    #[must_use]
    pub fn new(allowed: impl IntoIterator<Item = String>, root_key: Option<RootKey>) -> Self {
        Self {
            allowed: allowed
                .into_iter()
                .map(|token| token.trim().to_string())
                .filter(|token| !token.is_empty())
                .collect(),
            root_key,
        }
    }

    /// Check trust and decode the token.
    ///
    /// # Errors
    ///
    /// Returns [`MacaroonError::Untrusted`] when the token is neither
    /// allow-listed nor verifiable, or a decode error when it is malformed.
    pub fn validate(&self, token: &str) -> Result<Macaroon, MacaroonError> {
        let token = token.trim();

        if self.allowed.contains(token) {
            return Macaroon::decode(token);
        }

        let Some(root_key) = &self.root_key else {
            return Err(MacaroonError::Untrusted);
        };

        let macaroon = Macaroon::decode(token)?;

        if macaroon.verify(root_key) {
            Ok(macaroon)
        } else {
            Err(MacaroonError::Untrusted)
        }
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::macaroon::Caveat;

    use super::*;

    fn mint(key: &str) -> Result<String, MacaroonError> {
        Macaroon::mint(
            &RootKey::from(key),
            Some("brave.com".to_string()),
            "id",
            vec![Caveat::first_party("sku=vpn")],
        )
        .map(|m| m.encode())
    }

    #[test]
    fn allow_listed_token_is_accepted_without_key() -> TestResult {
        let token = mint("unknown")?;
        let validator = TokenValidator::new([token.clone()], None);

        assert!(validator.validate(&token).is_ok());

        Ok(())
    }

    #[test]
    fn signed_token_is_accepted_with_root_key() -> TestResult {
        let token = mint("root")?;
        let validator = TokenValidator::new([], Some(RootKey::from("root")));

        assert!(validator.validate(&token).is_ok());

        Ok(())
    }

    #[test]
    fn foreign_token_is_untrusted() -> TestResult {
        let token = mint("other")?;
        let validator = TokenValidator::new([], Some(RootKey::from("root")));

        let result = validator.validate(&token);

        assert!(
            matches!(result, Err(MacaroonError::Untrusted)),
            "expected Untrusted, got {result:?}"
        );

        Ok(())
    }

    #[test]
    fn no_key_and_not_listed_is_untrusted() -> TestResult {
        let result = TokenValidator::default().validate(&mint("root")?);

        assert!(
            matches!(result, Err(MacaroonError::Untrusted)),
            "expected Untrusted, got {result:?}"
        );

        Ok(())
    }
}
