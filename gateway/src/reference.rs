//! Merchant reference encoding.
//!
//! Sessions are created with the order id encoded as `wc_<id>`; webhooks echo
//! it back as the only link between a provider event and an order.

use booking_core::types::OrderId;

const PREFIX: &str = "wc_";

/// Formats the merchant reference for an order.
#[must_use]
pub fn format_reference(order_id: OrderId) -> String {
    format!("{PREFIX}{}", order_id.value())
}

/// Extracts an order id from a merchant reference.
///
/// Accepts the `wc_<digits>` pattern anywhere inside the reference, since
/// some provider payloads prepend their own identifiers. Occurrences of the
/// prefix without digits are skipped in favor of a later match. `None` means
/// the event cannot be associated with any order.
#[must_use]
pub fn parse_reference(reference: &str) -> Option<OrderId> {
    let mut haystack = reference;
    while let Some(at) = haystack.find(PREFIX) {
        haystack = &haystack[at + PREFIX.len()..];
        let digits: String = haystack.chars().take_while(char::is_ascii_digit).collect();
        if digits.is_empty() {
            continue;
        }
        return digits.parse::<i64>().ok().map(OrderId::new);
    }
    None
}
