//! Barcode content classification
//!
//! Delivery orders carry two barcode kinds and the decoded text itself is
//! usually enough to tell them apart: delivery numbers start with the `DO`
//! prefix or a digit, customer codes start with a letter. Texts that match
//! neither signature are inconclusive and fall back to the position hint
//! (left column is the customer slot, right column the delivery slot).

use crate::decoder::PositionHint;

/// The semantic role a decoded barcode plays on a delivery-order page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarcodeRole {
    /// Short customer code, printed on the left of the page.
    CustomerName,
    /// Delivery-order identifier, printed on the right of the page.
    DeliveryNumber,
}

/// Classify a decoded text by content alone.
///
/// Returns `None` when the content heuristics are inconclusive; callers then
/// fall back to [`resolve_role`] with the hit's position hint. Total over any
/// input string.
pub fn classify(text: &str) -> Option<BarcodeRole> {
    let trimmed = text.trim();
    let first = trimmed.chars().next()?;

    let upper = trimmed.to_uppercase();
    if upper.starts_with("DO") || first.is_ascii_digit() {
        return Some(BarcodeRole::DeliveryNumber);
    }
    if first.is_ascii_alphabetic() {
        return Some(BarcodeRole::CustomerName);
    }
    None
}

/// Full role resolution: content heuristics first, position hint as the
/// deterministic tie-break. `None` only when both are inconclusive (unknown
/// position and unrecognizable content).
pub fn resolve_role(text: &str, position: PositionHint) -> Option<BarcodeRole> {
    classify(text).or(match position {
        PositionHint::Left => Some(BarcodeRole::CustomerName),
        PositionHint::Right => Some(BarcodeRole::DeliveryNumber),
        PositionHint::Unknown => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn do_prefix_is_delivery_number() {
        for text in ["DO123456", "do123456", "Do123456", "dO123456"] {
            assert_eq!(classify(text), Some(BarcodeRole::DeliveryNumber), "{text}");
        }
    }

    #[test]
    fn digit_prefix_is_delivery_number() {
        for text in ["123456", "7890", "0123"] {
            assert_eq!(classify(text), Some(BarcodeRole::DeliveryNumber), "{text}");
        }
    }

    #[test]
    fn alphabetic_prefix_is_customer_name() {
        for text in ["ACME Corp", "Customer Name", "XYZ Company"] {
            assert_eq!(classify(text), Some(BarcodeRole::CustomerName), "{text}");
        }
    }

    #[test]
    fn empty_and_symbol_texts_are_inconclusive() {
        assert_eq!(classify(""), None);
        assert_eq!(classify("   "), None);
        assert_eq!(classify("--**--"), None);
    }

    #[test]
    fn position_hint_breaks_ties() {
        assert_eq!(
            resolve_role("--**--", PositionHint::Left),
            Some(BarcodeRole::CustomerName)
        );
        assert_eq!(
            resolve_role("--**--", PositionHint::Right),
            Some(BarcodeRole::DeliveryNumber)
        );
        assert_eq!(resolve_role("--**--", PositionHint::Unknown), None);
    }

    #[test]
    fn content_wins_over_position() {
        // A delivery-number text scanned on the left is still a delivery
        // number.
        assert_eq!(
            resolve_role("DO555", PositionHint::Left),
            Some(BarcodeRole::DeliveryNumber)
        );
    }
}
