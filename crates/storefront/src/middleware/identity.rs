//! The client-held identity token.
//!
//! Identity travels as three independent, unsigned cookies - `user_id`,
//! `username`, `is_admin` - decoded fresh on every request and trusted
//! without verification. There is no server-side session store, no
//! signing, and no integrity binding between the three fields: whatever
//! combination the client presents is accepted as truth. That weak
//! trust model is the contract this lab reproduces.
//!
//! The extractor keeps the raw `user_id` claim as a string. A
//! non-numeric claim still counts as "present" (it gates cart access)
//! but resolves to no account wherever the ledger is consulted.

use axum::{
    extract::FromRequestParts,
    http::{
        HeaderMap, HeaderValue,
        header::{HeaderName, SET_COOKIE},
        request::Parts,
    },
};

use cardstock_core::{Cart, UserId};

use crate::models::Account;

/// Cookie carrying the claimed account id.
pub const USER_ID_COOKIE: &str = "user_id";
/// Cookie carrying the claimed username.
pub const USERNAME_COOKIE: &str = "username";
/// Cookie carrying the claimed admin flag ("0" or "1").
pub const IS_ADMIN_COOKIE: &str = "is_admin";
/// Cookie carrying the serialized cart mapping.
pub const CART_COOKIE: &str = "cart";

const EPOCH: &str = "Expires=Thu, 01 Jan 1970 00:00:00 GMT";

/// Decoded identity claims, exactly as the client presented them.
#[derive(Debug, Clone, Default)]
pub struct Identity {
    user_id: Option<String>,
    username: Option<String>,
    is_admin: bool,
}

impl Identity {
    /// Decode the identity cookies from a request's headers.
    ///
    /// Absent and empty cookies are both treated as missing claims.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            user_id: parse_cookie(headers, USER_ID_COOKIE),
            username: parse_cookie(headers, USERNAME_COOKIE),
            is_admin: parse_cookie(headers, IS_ADMIN_COOKIE).as_deref() == Some("1"),
        }
    }

    /// The raw claimed user id, if any claim is present.
    #[must_use]
    pub fn user_id_claim(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// The claimed user id parsed to an account key.
    ///
    /// `None` either when no claim is present or when the claim is not
    /// numeric; callers that only need presence use
    /// [`Self::is_present`].
    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
            .as_deref()
            .and_then(|raw| raw.parse::<i32>().ok())
            .map(UserId::new)
    }

    /// The claimed username, if present.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// The claimed admin flag, trusted as-is.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.is_admin
    }

    /// Whether any user-id claim is present (gates cart routes).
    #[must_use]
    pub const fn is_present(&self) -> bool {
        self.user_id.is_some()
    }
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

/// Pull a single cookie value out of the `Cookie` header.
fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let header = headers.get("cookie")?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let pair = pair.trim();
        if let Some((key, val)) = pair.split_once('=')
            && key == name
            && !val.is_empty()
        {
            return Some(val.to_owned());
        }
    }
    None
}

fn set_cookie(name: &str, value: &str) -> (HeaderName, HeaderValue) {
    let header = HeaderValue::try_from(format!("{name}={value}; Path=/"))
        .unwrap_or_else(|_| HeaderValue::from_static(""));
    (SET_COOKIE, header)
}

fn expire_cookie(name: &str, value: &str) -> (HeaderName, HeaderValue) {
    let header = HeaderValue::try_from(format!("{name}={value}; {EPOCH}; Path=/"))
        .unwrap_or_else(|_| HeaderValue::from_static(""));
    (SET_COOKIE, header)
}

/// Build the `Set-Cookie` headers issuing an identity.
///
/// The three fields are independently client-visible values; no signing
/// and no expiry beyond what the transport sets.
#[must_use]
pub fn issue_identity(account: &Account, granted_admin: bool) -> Vec<(HeaderName, HeaderValue)> {
    vec![
        set_cookie(IS_ADMIN_COOKIE, if granted_admin { "1" } else { "0" }),
        set_cookie(USER_ID_COOKIE, &account.id.to_string()),
        set_cookie(USERNAME_COOKIE, &account.username),
    ]
}

/// Build the `Set-Cookie` headers expiring an identity immediately.
#[must_use]
pub fn clear_identity() -> Vec<(HeaderName, HeaderValue)> {
    vec![
        expire_cookie(IS_ADMIN_COOKIE, "0"),
        expire_cookie(USER_ID_COOKIE, ""),
        expire_cookie(USERNAME_COOKIE, ""),
    ]
}

/// Build the `Set-Cookie` header carrying a cart back to the client.
#[must_use]
pub fn cart_cookie(cart: &Cart) -> (HeaderName, HeaderValue) {
    set_cookie(CART_COOKIE, &cart.encode())
}

/// Build the `Set-Cookie` header resetting the cart to empty.
#[must_use]
pub fn clear_cart_cookie() -> (HeaderName, HeaderValue) {
    set_cookie(CART_COOKIE, "{}")
}

/// Decode the cart cookie from a request's headers, failing open.
#[must_use]
pub fn cart_from_headers(headers: &HeaderMap) -> Cart {
    let token = parse_cookie(headers, CART_COOKIE).unwrap_or_else(|| "{}".to_owned());
    Cart::decode(&token).into_cart()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;

    use cardstock_core::Role;

    fn headers_with_cookie(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("cookie", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn decodes_whatever_the_client_presents() {
        let headers = headers_with_cookie("user_id=999; username=nobody; is_admin=1");
        let identity = Identity::from_headers(&headers);
        assert_eq!(identity.user_id_claim(), Some("999"));
        assert_eq!(identity.username(), Some("nobody"));
        assert!(identity.is_admin());
    }

    #[test]
    fn empty_cookie_value_means_absent() {
        let headers = headers_with_cookie("user_id=; username=ghost");
        let identity = Identity::from_headers(&headers);
        assert!(!identity.is_present());
        assert_eq!(identity.username(), Some("ghost"));
    }

    #[test]
    fn non_numeric_claim_is_present_but_resolves_to_no_account() {
        let headers = headers_with_cookie("user_id=abc");
        let identity = Identity::from_headers(&headers);
        assert!(identity.is_present());
        assert_eq!(identity.user_id(), None);
    }

    #[test]
    fn admin_flag_is_only_the_literal_one() {
        for (value, expected) in [("1", true), ("0", false), ("true", false), ("11", false)] {
            let headers = headers_with_cookie(&format!("is_admin={value}"));
            assert_eq!(Identity::from_headers(&headers).is_admin(), expected);
        }
    }

    #[test]
    fn missing_cookie_header_yields_anonymous_identity() {
        let identity = Identity::from_headers(&HeaderMap::new());
        assert!(!identity.is_present());
        assert!(!identity.is_admin());
        assert_eq!(identity.username(), None);
    }

    #[test]
    fn issued_cookies_are_unsigned_plain_values() {
        let account = Account {
            id: cardstock_core::UserId::new(3),
            username: "nancy".to_owned(),
            password: Some("password".to_owned()),
            role: Role::User,
            credits: 0.0,
            created_at: Utc::now(),
        };
        let cookies = issue_identity(&account, true);
        let values: Vec<&str> = cookies.iter().map(|(_, v)| v.to_str().unwrap()).collect();
        assert_eq!(values[0], "is_admin=1; Path=/");
        assert_eq!(values[1], "user_id=3; Path=/");
        assert_eq!(values[2], "username=nancy; Path=/");
    }

    #[test]
    fn cleared_cookies_expire_immediately() {
        for (_, value) in clear_identity() {
            assert!(value.to_str().unwrap().contains(EPOCH));
        }
    }

    #[test]
    fn malformed_cart_cookie_fails_open_to_empty() {
        let headers = headers_with_cookie("cart=this-is-not-json");
        assert!(cart_from_headers(&headers).is_empty());
    }
}
