//! Key layout for orders in the key-value store.

/// Name of the set indexing every stored order key.
pub const ORDER_INDEX: &str = "orders";

const ORDER_KEY_PREFIX: &str = "order:";

/// Returns the store key for an order id.
pub fn order_key(id: u64) -> String {
    format!("{ORDER_KEY_PREFIX}{id}")
}

/// Recovers the order id from a key produced by [`order_key`].
pub fn parse_order_key(key: &str) -> Option<u64> {
    parse_order_id(key.strip_prefix(ORDER_KEY_PREFIX)?)
}

/// Parses an order id written in plain decimal digits.
pub fn parse_order_id(raw: &str) -> Option<u64> {
    // u64's parser accepts a leading '+', which order_key never emits.
    if raw.starts_with('+') {
        return None;
    }
    raw.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_order_key_format() {
        assert_eq!(order_key(0), "order:0");
        assert_eq!(order_key(u64::MAX), "order:18446744073709551615");
    }

    #[test]
    fn test_parse_rejects_foreign_keys() {
        assert_eq!(parse_order_key("orders"), None);
        assert_eq!(parse_order_key("order:"), None);
        assert_eq!(parse_order_key("order:+5"), None);
        assert_eq!(parse_order_key("order:-1"), None);
        assert_eq!(parse_order_key("customer:5"), None);
    }

    #[test]
    fn test_parse_order_id_digits_only() {
        assert_eq!(parse_order_id("42"), Some(42));
        assert_eq!(parse_order_id("+42"), None);
        assert_eq!(parse_order_id(" 42"), None);
        assert_eq!(parse_order_id(""), None);
    }

    proptest! {
        #[test]
        fn order_key_round_trips(id in any::<u64>()) {
            prop_assert_eq!(parse_order_key(&order_key(id)), Some(id));
        }

        #[test]
        fn distinct_ids_give_distinct_keys(a in any::<u64>(), b in any::<u64>()) {
            prop_assume!(a != b);
            prop_assert_ne!(order_key(a), order_key(b));
        }
    }
}
