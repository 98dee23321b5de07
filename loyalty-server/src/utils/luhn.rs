//! Order number validation
//!
//! Order numbers are digit strings carrying a Luhn (mod-10) checksum.
//! Validation is pure and is applied on every inbound number before any
//! storage or upstream lookup happens.

/// Validate an order number: non-empty, digits only, Luhn checksum passes.
///
/// Standard mod-10: walking right to left, every second digit is doubled;
/// doubled values above 9 have 9 subtracted; the total must be divisible
/// by 10.
pub fn validate_order_number(number: &str) -> bool {
    if number.is_empty() {
        return false;
    }

    let mut sum = 0u32;
    let mut double = false;

    for b in number.bytes().rev() {
        if !b.is_ascii_digit() {
            return false;
        }
        let mut digit = (b - b'0') as u32;
        if double {
            digit *= 2;
            if digit > 9 {
                digit -= 9;
            }
        }
        sum += digit;
        double = !double;
    }

    sum % 10 == 0
}
