//! Response header helpers.

use std::fmt::Display;

use salvo::{
    http::header::HeaderName,
    prelude::{Response, StatusError},
};
use tracing::error;

pub(crate) trait HeadersExt {
    /// Set `name`, replacing any earlier value. An unencodable value is a 500.
    fn put_header(
        &mut self,
        name: HeaderName,
        value: impl Display,
    ) -> Result<&mut Self, StatusError>;
}

impl HeadersExt for Response {
    fn put_header(
        &mut self,
        name: HeaderName,
        value: impl Display,
    ) -> Result<&mut Self, StatusError> {
        let value = value.to_string();

        self.add_header(&name, value.as_str(), true).map_err(|header_error| {
            error!(
                header = %name,
                value = %value,
                error = %header_error,
                "failed to set response header"
            );

            StatusError::internal_server_error()
        })
    }
}

#[cfg(test)]
mod tests {
    use salvo::http::header::{LOCATION, RETRY_AFTER};
    use testresult::TestResult;

    use super::*;

    #[test]
    fn replaces_existing_value() -> TestResult {
        let mut res = Response::new();

        res.put_header(RETRY_AFTER, 1)?.put_header(RETRY_AFTER, 7)?;

        assert_eq!(res.headers().get_all(RETRY_AFTER).iter().count(), 1);
        assert_eq!(res.headers().get(RETRY_AFTER).map(|value| value.as_bytes()), Some(&b"7"[..]));

        Ok(())
    }

    #[test]
    fn control_characters_are_rejected() {
        let mut res = Response::new();

        let result = res.put_header(LOCATION, "/v1/orders/\n");

        assert!(result.is_err());
    }
}
