use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::{
    Error, SessionToken, TokenConfig, TokenData,
    claims::{ServerFlag, SessionClaims, TokenHeader},
};

type HmacSha256 = Hmac<Sha256>;

fn b64e_json<T: Serialize>(value: &T) -> Result<String, Error> {
    let json = serde_json::to_vec(value)?;
    Ok(Base64UrlUnpadded::encode_string(&json))
}

fn b64d_json<T: for<'de> Deserialize<'de>>(s: &str, what: &'static str) -> Result<T, Error> {
    let bytes = Base64UrlUnpadded::decode_vec(s).map_err(|_| Error::Malformed(what))?;
    serde_json::from_slice(&bytes).map_err(|_| Error::Malformed(what))
}

fn mac(secret: &[u8], signing_input: &str) -> Result<HmacSha256, Error> {
    let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| Error::InvalidKey)?;
    mac.update(signing_input.as_bytes());
    Ok(mac)
}

pub(super) fn sign_claims(secret: &[u8], claims: &SessionClaims) -> Result<String, Error> {
    let header_b64 = b64e_json(&TokenHeader::hs256())?;
    let claims_b64 = b64e_json(claims)?;
    let signing_input = format!("{header_b64}.{claims_b64}");

    let signature = mac(secret, &signing_input)?.finalize().into_bytes();
    let signature_b64 = Base64UrlUnpadded::encode_string(&signature);

    Ok(format!("{signing_input}.{signature_b64}"))
}

/// Mint a signed session token for `data` at time `now_unix_seconds`.
///
/// # Errors
///
/// Returns [`Error::MissingPrincipal`] if `data.user_id` is empty,
/// [`Error::LifetimeOutOfRange`] if the lifetime is not positive or the expiry
/// overflows, or an encoding error if the claims cannot be serialized.
pub fn create_token(
    data: &TokenData,
    secret: &[u8],
    config: &TokenConfig,
    now_unix_seconds: i64,
) -> Result<SessionToken, Error> {
    if data.user_id.is_empty() {
        return Err(Error::MissingPrincipal);
    }

    let duration_secs = config.effective_duration(data);
    if duration_secs <= 0 {
        return Err(Error::LifetimeOutOfRange);
    }
    let created_at = now_unix_seconds;
    let expires_at = created_at
        .checked_add(duration_secs)
        .ok_or(Error::LifetimeOutOfRange)?;

    let claims = SessionClaims {
        svr: ServerFlag::from(data.is_server),
        usr: data.user_id.clone(),
        dur: duration_secs,
        exp: expires_at,
        iss: config.issuer().to_string(),
        aud: config.audience().to_string(),
        iam: created_at,
        sub: data.user_id.clone(),
    };

    let token = sign_claims(secret, &claims)?;

    Ok(SessionToken {
        token,
        is_server: data.is_server,
        principal_id: data.user_id.clone(),
        duration_secs,
        created_at,
        expires_at,
    })
}

/// Verify `token` against each candidate secret in order and return its claims.
///
/// # Errors
///
/// - [`Error::Malformed`] if the token cannot be parsed or its claims are
///   missing or mistyped,
/// - [`Error::InvalidSignature`] if no candidate secret validates it,
/// - [`Error::Expired`] if `now_unix_seconds` is at or past the claimed expiry.
pub fn verify_token<S: AsRef<[u8]>>(
    token: &str,
    candidate_secrets: &[S],
    now_unix_seconds: i64,
) -> Result<TokenData, Error> {
    if token.is_empty() {
        return Err(Error::Malformed("empty token"));
    }

    let mut parts = token.split('.');
    let header_b64 = parts.next().ok_or(Error::Malformed("token format"))?;
    let claims_b64 = parts.next().ok_or(Error::Malformed("token format"))?;
    let sig_b64 = parts.next().ok_or(Error::Malformed("token format"))?;
    if parts.next().is_some() {
        return Err(Error::Malformed("token format"));
    }

    let header: TokenHeader = b64d_json(header_b64, "token header")?;
    if header.alg != "HS256" {
        return Err(Error::Malformed("unsupported algorithm"));
    }

    let signature =
        Base64UrlUnpadded::decode_vec(sig_b64).map_err(|_| Error::Malformed("signature"))?;
    let signing_input = format!("{header_b64}.{claims_b64}");

    let mut verified = false;
    for secret in candidate_secrets {
        if mac(secret.as_ref(), &signing_input)?
            .verify_slice(&signature)
            .is_ok()
        {
            verified = true;
            break;
        }
    }
    if !verified {
        return Err(Error::InvalidSignature);
    }

    let claims: SessionClaims = b64d_json(claims_b64, "token claims")?;
    if claims.usr.is_empty() {
        return Err(Error::Malformed("token principal"));
    }
    if now_unix_seconds >= claims.exp {
        return Err(Error::Expired);
    }

    Ok(TokenData {
        is_server: claims.svr.is_server(),
        user_id: claims.usr,
        duration_secs: claims.dur,
    })
}
