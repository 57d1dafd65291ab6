use utoipa::{
    Modify, OpenApi,
    openapi::{
        Contact, InfoBuilder, License,
        security::{ApiKey, ApiKeyValue, Http, HttpAuthScheme, SecurityScheme},
    },
};

use super::handlers::{SESSION_TOKEN_HEADER, health, login, private, session, users};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        login::login,
        login::login_long_term,
        login::server_login,
        session::refresh,
        session::logout,
        session::check_token,
        session::server_check_token,
        private::anonymous_pair,
        private::get_pair,
        private::regenerate_pair,
        private::delete_pair,
        users::get_user,
        users::delete_user,
    ),
    components(schemas(
        health::Health,
        crate::hash::IdHashPair,
        crate::store::UserResponse,
        crate::token::TokenData,
    )),
    modifiers(&SecuritySchemes),
    tags(
        (name = "health", description = "Service liveness"),
        (name = "session", description = "Login, refresh and logout"),
        (name = "server", description = "Privileged lookups for trusted servers"),
        (name = "private", description = "Anonymous correlation id hash pairs")
    )
)]
struct ApiDoc;

struct SecuritySchemes;

impl Modify for SecuritySchemes {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "basic_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Basic)),
            );
            components.add_security_scheme(
                "server_token",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(SESSION_TOKEN_HEADER))),
            );
        }
    }
}

/// OpenAPI document for every served route, with info taken from Cargo metadata.
#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();

    let mut info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(optional_str(env!("CARGO_PKG_DESCRIPTION")))
        .build();
    info.contact = cargo_contact();
    info.license = optional_str(env!("CARGO_PKG_LICENSE")).map(|identifier| {
        let mut license = License::new(identifier);
        license.identifier = Some(identifier.to_string());
        license
    });
    doc.info = info;

    doc
}

fn cargo_contact() -> Option<Contact> {
    // Cargo authors are `;` separated and may include "Name <email>".
    let primary = env!("CARGO_PKG_AUTHORS").split(';').next().map(str::trim)?;
    let (name, email) = match primary.split_once('<') {
        Some((name, email)) => (name.trim(), email.trim_end_matches('>').trim()),
        None => (primary, ""),
    };
    if name.is_empty() && email.is_empty() {
        return None;
    }

    let mut contact = Contact::new();
    contact.name = Some(name.to_string()).filter(|value| !value.is_empty());
    contact.email = Some(email.to_string()).filter(|value| !value.is_empty());
    Some(contact)
}

fn optional_str(value: &'static str) -> Option<&'static str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}
