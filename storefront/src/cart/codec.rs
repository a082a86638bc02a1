//! JSON snapshot format of a cart in the client-side store.

use super::CartItem;

/// Encode the cart as a JSON array (`"[]"` when empty).
pub fn serialize(items: &[CartItem]) -> String {
    serde_json::to_string(items).unwrap_or_else(|err| {
        tracing::error!(error = %err, "Failed to encode cart snapshot");
        "[]".to_string()
    })
}

/// Decode a stored snapshot. Empty, corrupt or non-array input yields an
/// empty cart; this never fails.
pub fn deserialize(data: &str) -> Vec<CartItem> {
    if data.trim().is_empty() {
        return Vec::new();
    }

    match serde_json::from_str::<Vec<CartItem>>(data) {
        Ok(items) => items,
        Err(err) => {
            tracing::warn!(error = %err, "Discarding unreadable cart snapshot");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::tests::book;

    #[test]
    fn empty_cart_is_an_empty_array() {
        assert_eq!(serialize(&[]), "[]");
    }

    #[test]
    fn snapshot_survives_a_round_trip() {
        let items = vec![
            CartItem {
                book: book("1", 5900),
                quantity: 2,
            },
            CartItem {
                book: book("8", 29900),
                quantity: 1,
            },
        ];
        assert_eq!(deserialize(&serialize(&items)), items);
    }

    #[test]
    fn unreadable_input_becomes_an_empty_cart() {
        for input in ["", "   ", "not json", "{", r#"{"key":"value"}"#, "42", "null"] {
            assert!(deserialize(input).is_empty(), "input: {:?}", input);
        }
    }

    #[test]
    fn array_of_foreign_values_becomes_an_empty_cart() {
        assert!(deserialize(r#"[1, 2, 3]"#).is_empty());
    }
}
