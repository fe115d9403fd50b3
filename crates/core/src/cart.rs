//! The client-held shopping cart.
//!
//! The cart never lives on the server: it travels in a cookie as a JSON
//! object mapping string-encoded card ids to signed integer quantities,
//! and is reconstructed from the inbound request on every call.
//!
//! Two properties of this representation are contractual and must not be
//! "fixed":
//!
//! - Decoding a malformed token fails **open** to an empty cart. The
//!   recovery is a visible [`DecodedCart`] branch, not a swallowed error.
//! - Keys are kept as strings. A key that does not parse as an integer
//!   stays in the cart and is silently skipped wherever prices are
//!   computed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Mapping from card id (string-encoded) to signed quantity.
///
/// Quantities may legally be negative; an entry is removed when its
/// quantity reaches exactly zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart(BTreeMap<String, i64>);

/// Result of decoding a cart token.
///
/// A parse failure is not an error: the shop recovers with an empty
/// cart. The branch is explicit so callers (and tests) can observe that
/// recovery happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedCart {
    /// The token parsed as a quantity mapping.
    Parsed(Cart),
    /// The token was malformed; recovered to the empty default.
    RecoveredEmpty,
}

impl DecodedCart {
    /// Unwrap to a usable cart, empty if recovery occurred.
    #[must_use]
    pub fn into_cart(self) -> Cart {
        match self {
            Self::Parsed(cart) => cart,
            Self::RecoveredEmpty => Cart::default(),
        }
    }

    /// Whether the decoder fell back to the empty default.
    #[must_use]
    pub const fn recovered(&self) -> bool {
        matches!(self, Self::RecoveredEmpty)
    }
}

impl Cart {
    /// Decode a client-supplied token.
    #[must_use]
    pub fn decode(token: &str) -> DecodedCart {
        match serde_json::from_str(token) {
            Ok(cart) => DecodedCart::Parsed(cart),
            Err(_) => DecodedCart::RecoveredEmpty,
        }
    }

    /// Serialize back to the client-held form (compact JSON object).
    #[must_use]
    pub fn encode(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_owned())
    }

    /// Add `delta` to the quantity for `card_id`.
    ///
    /// A resulting quantity of exactly zero removes the entry. A zero
    /// delta on an absent key is a no-op; any other delta inserts it,
    /// negative quantities included.
    pub fn add_or_adjust(&mut self, card_id: &str, delta: i64) {
        if let Some(current) = self.0.get(card_id).copied() {
            let updated = current + delta;
            if updated == 0 {
                self.0.remove(card_id);
            } else {
                self.0.insert(card_id.to_owned(), updated);
            }
        } else if delta != 0 {
            self.0.insert(card_id.to_owned(), delta);
        }
    }

    /// Overwrite quantities from the supplied pairs.
    ///
    /// A quantity of zero removes the key; keys not supplied are left
    /// untouched.
    pub fn bulk_set<I>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (String, i64)>,
    {
        for (card_id, quantity) in pairs {
            if quantity == 0 {
                self.0.remove(&card_id);
            } else {
                self.0.insert(card_id, quantity);
            }
        }
    }

    /// Unconditionally delete a key; no-op if absent.
    pub fn remove(&mut self, card_id: &str) {
        self.0.remove(card_id);
    }

    /// Iterate over `(card_id, quantity)` entries.
    pub fn entries(&self) -> impl Iterator<Item = (&str, i64)> {
        self.0.iter().map(|(id, qty)| (id.as_str(), *qty))
    }

    /// Quantity for a key, if present.
    #[must_use]
    pub fn quantity(&self, card_id: &str) -> Option<i64> {
        self.0.get(card_id).copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn cart(pairs: &[(&str, i64)]) -> Cart {
        let mut c = Cart::default();
        c.bulk_set(pairs.iter().map(|(k, v)| ((*k).to_owned(), *v)));
        c
    }

    #[test]
    fn decode_encode_round_trip() {
        let original = cart(&[("1", 2), ("7", -3), ("not-a-number", 5)]);
        let decoded = Cart::decode(&original.encode());
        assert_eq!(decoded, DecodedCart::Parsed(original));
    }

    #[test]
    fn decode_malformed_token_recovers_empty() {
        for token in ["", "not json", "[1,2]", "{\"3\": \"two\"}", "{\"3\": 1.5}"] {
            let decoded = Cart::decode(token);
            assert!(decoded.recovered(), "token {token:?} should fail open");
            assert!(decoded.into_cart().is_empty());
        }
    }

    #[test]
    fn decode_valid_empty_object_is_parsed_not_recovered() {
        let decoded = Cart::decode("{}");
        assert!(!decoded.recovered());
        assert!(decoded.into_cart().is_empty());
    }

    #[test]
    fn zero_delta_on_absent_key_is_a_no_op() {
        let mut c = cart(&[("1", 2)]);
        let before = c.clone();
        c.add_or_adjust("9", 0);
        assert_eq!(c, before);
    }

    #[test]
    fn add_then_negated_add_restores_original() {
        let original = cart(&[("1", 2), ("4", -1)]);

        // Adjust an existing key and a fresh key, then undo both.
        let mut c = original.clone();
        c.add_or_adjust("1", 3);
        c.add_or_adjust("8", 5);
        c.add_or_adjust("1", -3);
        c.add_or_adjust("8", -5);
        assert_eq!(c, original);
    }

    #[test]
    fn adjustment_to_exactly_zero_removes_the_entry() {
        let mut c = cart(&[("2", 4)]);
        c.add_or_adjust("2", -4);
        assert_eq!(c.quantity("2"), None);
        assert!(c.is_empty());
    }

    #[test]
    fn negative_quantities_are_accepted() {
        let mut c = Cart::default();
        c.add_or_adjust("3", -2);
        assert_eq!(c.quantity("3"), Some(-2));
        c.add_or_adjust("3", -1);
        assert_eq!(c.quantity("3"), Some(-3));
    }

    #[test]
    fn bulk_set_overwrites_and_removes_only_supplied_keys() {
        let mut c = cart(&[("1", 2), ("2", 3), ("3", 4)]);
        c.bulk_set([("2".to_owned(), 0), ("3".to_owned(), 9), ("5".to_owned(), 1)]);
        assert_eq!(c.quantity("1"), Some(2));
        assert_eq!(c.quantity("2"), None);
        assert_eq!(c.quantity("3"), Some(9));
        assert_eq!(c.quantity("5"), Some(1));
    }

    #[test]
    fn remove_is_unconditional() {
        let mut c = cart(&[("1", 2)]);
        c.remove("1");
        c.remove("1");
        assert!(c.is_empty());
    }

    #[test]
    fn non_integer_keys_survive_merges() {
        let mut c = Cart::default();
        c.add_or_adjust("mystery", 2);
        c.add_or_adjust("mystery", 1);
        assert_eq!(c.quantity("mystery"), Some(3));
        let round = Cart::decode(&c.encode()).into_cart();
        assert_eq!(round.quantity("mystery"), Some(3));
    }
}
