//! Credential extraction from request headers.

use base64ct::{Base64, Base64Url, Encoding};

use super::AuthError;

/// Name and password carried by a Basic `Authorization` header.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct BasicCredentials {
    pub name: String,
    pub password: String,
}

impl std::fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("name", &self.name)
            .field("password", &"***")
            .finish()
    }
}

/// Parse `Basic <base64(name:password)>`.
///
/// A missing or empty header yields empty credentials; the caller decides
/// whether that is acceptable. The payload may use the standard or URL-safe
/// alphabet, and the password may itself contain `:`.
///
/// # Errors
///
/// Returns [`AuthError::BadRequest`] for a non-Basic scheme, undecodable
/// payload, or a payload without a `:` separator.
pub fn parse_basic_auth(header: Option<&str>) -> Result<BasicCredentials, AuthError> {
    let Some(header) = header.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(BasicCredentials::default());
    };

    let (scheme, payload) = header
        .split_once(' ')
        .ok_or(AuthError::BadRequest("malformed authorization header"))?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return Err(AuthError::BadRequest("unsupported authorization scheme"));
    }

    let payload = payload.trim();
    let decoded = Base64::decode_vec(payload)
        .or_else(|_| Base64Url::decode_vec(payload))
        .map_err(|_| AuthError::BadRequest("invalid base64 credentials"))?;
    let decoded =
        String::from_utf8(decoded).map_err(|_| AuthError::BadRequest("invalid credentials"))?;

    let (name, password) = decoded
        .split_once(':')
        .ok_or(AuthError::BadRequest("invalid credentials"))?;

    Ok(BasicCredentials {
        name: name.to_string(),
        password: password.to_string(),
    })
}

/// Constant-time byte comparison.
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic(raw: &str) -> String {
        format!("Basic {}", Base64::encode_string(raw.as_bytes()))
    }

    #[test]
    fn missing_header_yields_empty_credentials() -> Result<(), AuthError> {
        assert_eq!(parse_basic_auth(None)?, BasicCredentials::default());
        assert_eq!(parse_basic_auth(Some("  "))?, BasicCredentials::default());
        Ok(())
    }

    #[test]
    fn parses_name_and_password() -> Result<(), AuthError> {
        let credentials = parse_basic_auth(Some(&basic("alice:secret")))?;
        assert_eq!(credentials.name, "alice");
        assert_eq!(credentials.password, "secret");
        Ok(())
    }

    #[test]
    fn password_may_contain_colons() -> Result<(), AuthError> {
        let credentials = parse_basic_auth(Some(&basic("alice:se:cr:et")))?;
        assert_eq!(credentials.password, "se:cr:et");
        Ok(())
    }

    #[test]
    fn accepts_url_safe_alphabet() -> Result<(), AuthError> {
        // "bob:??>" encodes with '/' in the standard alphabet and '_' in the URL-safe one.
        let header = format!("Basic {}", Base64Url::encode_string(b"bob:??>"));
        assert!(header.contains('_'));
        let credentials = parse_basic_auth(Some(&header))?;
        assert_eq!(credentials.name, "bob");
        assert_eq!(credentials.password, "??>");
        Ok(())
    }

    #[test]
    fn empty_parts_are_returned_for_the_caller_to_reject() -> Result<(), AuthError> {
        let credentials = parse_basic_auth(Some(&basic("alice:")))?;
        assert_eq!(credentials.name, "alice");
        assert!(credentials.password.is_empty());
        Ok(())
    }

    #[test]
    fn rejects_malformed_headers() {
        for header in [
            "Basic",
            "Bearer abc",
            "Basic !!!notbase64",
            basic("no-separator").as_str(),
        ] {
            assert!(
                matches!(parse_basic_auth(Some(header)), Err(AuthError::BadRequest(_))),
                "{header}"
            );
        }
    }

    #[test]
    fn debug_redacts_password() {
        let credentials = BasicCredentials {
            name: "alice".to_string(),
            password: "secret".to_string(),
        };
        assert!(!format!("{credentials:?}").contains("secret"));
    }

    #[test]
    fn constant_time_eq_works() {
        assert!(constant_time_eq(b"hello", b"hello"));
        assert!(!constant_time_eq(b"hello", b"world"));
        assert!(!constant_time_eq(b"hello", b"hell"));
        assert!(constant_time_eq(b"", b""));
    }
}
