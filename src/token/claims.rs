use serde::{Deserialize, Serialize};

/// Wire encoding of the server flag (`"yes"` / `"no"`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ServerFlag {
    Yes,
    No,
}

impl From<bool> for ServerFlag {
    fn from(is_server: bool) -> Self {
        if is_server { Self::Yes } else { Self::No }
    }
}

impl ServerFlag {
    #[must_use]
    pub fn is_server(self) -> bool {
        self == Self::Yes
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenHeader {
    pub alg: String,
    pub typ: String,
}

impl TokenHeader {
    pub(super) fn hs256() -> Self {
        Self {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        }
    }
}

/// Signed claims. Every field is required when decoding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    pub svr: ServerFlag,
    pub usr: String,
    pub dur: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
    pub iam: i64,
    pub sub: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn claims_json() -> serde_json::Value {
        json!({
            "svr": "no",
            "usr": "alice-id",
            "dur": 3600,
            "exp": 1_700_003_600,
            "iss": "localhost",
            "aud": "localhost",
            "iam": 1_700_000_000,
            "sub": "alice-id"
        })
    }

    #[test]
    fn claims_decode_from_wire_names() -> Result<(), serde_json::Error> {
        let claims: SessionClaims = serde_json::from_value(claims_json())?;
        assert_eq!(claims.svr, ServerFlag::No);
        assert_eq!(claims.dur, 3600);
        assert!(!claims.svr.is_server());
        Ok(())
    }

    #[test]
    fn claims_reject_missing_field() {
        let mut value = claims_json();
        if let Some(map) = value.as_object_mut() {
            map.remove("exp");
        }
        assert!(serde_json::from_value::<SessionClaims>(value).is_err());
    }

    #[test]
    fn claims_reject_type_mismatch() {
        let mut value = claims_json();
        value["dur"] = json!("3600");
        assert!(serde_json::from_value::<SessionClaims>(value).is_err());

        let mut value = claims_json();
        value["svr"] = json!(true);
        assert!(serde_json::from_value::<SessionClaims>(value).is_err());
    }
}
