//! Model-state key helpers.
//!
//! Keys follow the `prefix.Property` / `prefix[index]` shape used for both
//! binding and validation, so errors recorded while binding line up with
//! errors recorded while validating.

/// Joins a prefix and a property name: `("order", "Total")` → `order.Total`.
#[must_use]
pub fn property(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else if name.is_empty() {
        prefix.to_string()
    } else if name.starts_with('[') {
        format!("{prefix}{name}")
    } else {
        format!("{prefix}.{name}")
    }
}

/// Appends an element index: `("lines", 2)` → `lines[2]`.
#[must_use]
pub fn index(prefix: &str, index: usize) -> String {
    format!("{prefix}[{index}]")
}

/// Returns `true` if `key` equals `prefix` or is nested under it.
///
/// The empty prefix matches every key.
#[must_use]
pub fn is_prefix_of(prefix: &str, key: &str) -> bool {
    if prefix.is_empty() {
        return true;
    }
    if key.len() < prefix.len() || !key.is_char_boundary(prefix.len()) {
        return false;
    }
    let (head, rest) = key.split_at(prefix.len());
    if !head.eq_ignore_ascii_case(prefix) {
        return false;
    }
    rest.is_empty() || rest.starts_with('.') || rest.starts_with('[')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_key() {
        assert_eq!(property("", "Name"), "Name");
        assert_eq!(property("customer", "Name"), "customer.Name");
        assert_eq!(property("customer", ""), "customer");
        assert_eq!(property("lines", "[0]"), "lines[0]");
    }

    #[test]
    fn test_index_key() {
        assert_eq!(index("lines", 3), "lines[3]");
        assert_eq!(index("", 0), "[0]");
    }

    #[test]
    fn test_prefix_matching() {
        assert!(is_prefix_of("", "anything"));
        assert!(is_prefix_of("order", "order"));
        assert!(is_prefix_of("order", "Order.Total"));
        assert!(is_prefix_of("order", "order[1]"));
        assert!(!is_prefix_of("order", "orders"));
        assert!(!is_prefix_of("order.Total", "order"));
    }
}
