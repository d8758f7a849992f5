//! Field-element encoding
//!
//! Converts the heterogeneous inputs of a signing request (hex keys and
//! addresses, decimal quantities, signed integer amounts, flags, short
//! string tags) into STARK field elements. Everything that reaches the hash
//! chain passes through one of these functions first, so range errors are
//! raised here and never inside the hashing code.

use std::str::FromStr;

use num_bigint::BigUint;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use starknet_core::types::Felt;
use starknet_core::utils::cairo_short_string_to_felt;

use super::errors::{SignatureError, SignatureResult};

/// Fixed-point scale applied to decimal quantities and prices (micro-units)
pub const AMOUNT_SCALE: i64 = 1_000_000;

/// Maximum number of significant hex digits of a value below the STARK prime
const MAX_FELT_HEX_DIGITS: usize = 63;

fn strip_hex_prefix(value: &str) -> &str {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value)
}

/// Parse a hex string (with or without `0x`, any number of leading zeros)
/// into a field element.
///
/// Rejects empty input, non-hex characters and values `>= P`.
pub fn parse_hex_felt(field: &str, value: &str) -> SignatureResult<Felt> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SignatureError::missing(field));
    }

    let digits = strip_hex_prefix(trimmed);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(SignatureError::invalid(
            field,
            format!("'{}' is not a hex string", value),
        ));
    }

    let significant = digits.trim_start_matches('0');
    if significant.len() > MAX_FELT_HEX_DIGITS {
        return Err(SignatureError::invalid(
            field,
            "value does not fit in the STARK field",
        ));
    }

    let canonical = if significant.is_empty() { "0" } else { significant };
    let value = BigUint::parse_bytes(canonical.as_bytes(), 16)
        .ok_or_else(|| SignatureError::invalid(field, "value is not a hex integer"))?;
    felt_from_biguint(field, &value)
}

/// Parse either a `0x`-prefixed hex string or a plain decimal integer string.
pub fn parse_felt(field: &str, value: &str) -> SignatureResult<Felt> {
    let trimmed = value.trim();
    if trimmed.starts_with("0x") || trimmed.starts_with("0X") {
        return parse_hex_felt(field, trimmed);
    }
    if trimmed.is_empty() {
        return Err(SignatureError::missing(field));
    }
    if !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(SignatureError::invalid(
            field,
            format!("'{}' is not an unsigned integer", value),
        ));
    }
    let value = BigUint::parse_bytes(trimmed.as_bytes(), 10)
        .ok_or_else(|| SignatureError::invalid(field, "value is not a decimal integer"))?;
    felt_from_biguint(field, &value)
}

/// STARK prime `P = 2^251 + 17 * 2^192 + 1`
fn stark_prime() -> BigUint {
    (BigUint::from(1u8) << 251u32) + (BigUint::from(17u8) << 192u32) + BigUint::from(1u8)
}

/// Field element from an unsigned integer, rejecting values `>= P`
/// instead of reducing them.
pub fn felt_from_biguint(field: &str, value: &BigUint) -> SignatureResult<Felt> {
    if *value >= stark_prime() {
        return Err(SignatureError::invalid(
            field,
            "value is not below the STARK prime",
        ));
    }
    let bytes = value.to_bytes_be();
    let mut buffer = [0u8; 32];
    buffer[32 - bytes.len()..].copy_from_slice(&bytes);
    Ok(Felt::from_bytes_be(&buffer))
}

/// Render a field element as `0x`-prefixed minimal hex
pub fn felt_to_hex(value: &Felt) -> String {
    value.to_hex_string()
}

/// Canonical hex rendering of any hex input: strip the prefix, parse,
/// re-render without leading zeros.
pub fn normalize_hex(field: &str, value: &str) -> SignatureResult<String> {
    parse_hex_felt(field, value).map(|felt| felt_to_hex(&felt))
}

/// Normalize a STARK public key so the same logical key always serializes
/// identically.
pub fn normalize_public_key(public_key: &str) -> SignatureResult<String> {
    normalize_hex("stark_public_key", public_key)
}

/// Signed protocol integer as a field element (`P - |x|` for negatives)
pub fn felt_from_i64(value: i64) -> Felt {
    let magnitude = Felt::from(value.unsigned_abs());
    if value < 0 {
        Felt::ZERO - magnitude
    } else {
        magnitude
    }
}

pub fn felt_from_bool(flag: bool) -> Felt {
    if flag {
        Felt::ONE
    } else {
        Felt::ZERO
    }
}

/// Encode an ASCII string of at most 31 bytes as a Cairo short string
pub fn short_string(field: &str, value: &str) -> SignatureResult<Felt> {
    cairo_short_string_to_felt(value).map_err(|e| {
        SignatureError::invalid(field, format!("'{}' is not a Cairo short string: {}", value, e))
    })
}

/// Parse a decimal string such as `"0.001"` or `"95000.5"`
pub fn parse_decimal(field: &str, value: &str) -> SignatureResult<Decimal> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SignatureError::missing(field));
    }
    Decimal::from_str(trimmed)
        .map_err(|e| SignatureError::invalid(field, format!("'{}' is not a decimal: {}", value, e)))
}

/// Scale a non-negative decimal to micro-units, truncating toward zero.
pub fn to_micro_units(field: &str, value: Decimal) -> SignatureResult<i64> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(SignatureError::invalid(field, "must not be negative"));
    }
    value
        .checked_mul(Decimal::from(AMOUNT_SCALE))
        .and_then(|scaled| scaled.trunc().to_i64())
        .ok_or_else(|| SignatureError::invalid(field, "amount overflows a signed 64-bit integer"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const STARK_PRIME_HEX: &str =
        "0x800000000000011000000000000000000000000000000000000000000000001";

    #[test]
    fn test_parse_hex_with_and_without_prefix() {
        let a = parse_hex_felt("key", "0x1234abcd").unwrap();
        let b = parse_hex_felt("key", "1234abcd").unwrap();
        let c = parse_hex_felt("key", "0X1234ABCD").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn test_parse_hex_leading_zeros_beyond_64_digits() {
        let padded = format!("0x{}{}", "0".repeat(70), "24e50fe6");
        let felt = parse_hex_felt("key", &padded).unwrap();
        assert_eq!(felt_to_hex(&felt), "0x24e50fe6");
    }

    #[test]
    fn test_parse_hex_rejects_prime() {
        let err = parse_hex_felt("asset_id", STARK_PRIME_HEX).unwrap_err();
        assert!(matches!(err, SignatureError::Validation(_)));
    }

    #[test]
    fn test_parse_hex_accepts_prime_minus_one() {
        let felt = parse_hex_felt(
            "asset_id",
            "0x800000000000011000000000000000000000000000000000000000000000000",
        )
        .unwrap();
        assert_eq!(felt + Felt::ONE, Felt::ZERO);
    }

    #[test]
    fn test_parse_hex_rejects_garbage() {
        assert!(parse_hex_felt("key", "0xnothex").is_err());
        assert!(parse_hex_felt("key", "0x").is_err());
        assert!(parse_hex_felt("key", "").is_err());
        assert!(parse_hex_felt("key", &format!("0x1{}", "0".repeat(63))).is_err());
    }

    #[test]
    fn test_parse_felt_decimal_and_hex() {
        assert_eq!(parse_felt("id", "10002").unwrap(), Felt::from(10002u64));
        assert_eq!(parse_felt("id", "0x2712").unwrap(), Felt::from(10002u64));
        assert!(parse_felt("id", "-5").is_err());
        assert!(parse_felt("id", "12a").is_err());
    }

    #[test]
    fn test_parse_felt_decimal_rejects_prime() {
        let prime = stark_prime().to_str_radix(10);
        assert!(parse_felt("id", &prime).is_err());
        let below = (stark_prime() - BigUint::from(1u8)).to_str_radix(10);
        assert_eq!(parse_felt("id", &below).unwrap() + Felt::ONE, Felt::ZERO);
    }

    #[test]
    fn test_normalize_public_key_variants_agree() {
        let expected = "0x24e50fe6d5247d20fedc23889c012c556eee175a398c355903b742b9c545f7f";
        assert_eq!(normalize_public_key(expected).unwrap(), expected);
        assert_eq!(
            normalize_public_key("24e50fe6d5247d20fedc23889c012c556eee175a398c355903b742b9c545f7f")
                .unwrap(),
            expected
        );
        assert_eq!(
            normalize_public_key(
                "0x00024e50fe6d5247d20fedc23889c012c556eee175a398c355903b742b9c545f7f"
            )
            .unwrap(),
            expected
        );
    }

    #[test]
    fn test_normalize_zero() {
        assert_eq!(normalize_hex("key", "0x0000").unwrap(), "0x0");
    }

    #[test]
    fn test_felt_from_negative_i64_wraps_around_prime() {
        let minus_one = felt_from_i64(-1);
        assert_eq!(minus_one + Felt::ONE, Felt::ZERO);

        let minus_156 = felt_from_i64(-156);
        assert_eq!(minus_156 + Felt::from(156u64), Felt::ZERO);
        assert_eq!(felt_from_i64(156), Felt::from(156u64));
    }

    #[test]
    fn test_short_string_encoding() {
        let felt = short_string("name", "Perpetuals").unwrap();
        assert_eq!(felt_to_hex(&felt), "0x50657270657475616c73");

        let chain = short_string("chain_id", "SN_SEPOLIA").unwrap();
        assert_eq!(felt_to_hex(&chain), "0x534e5f5345504f4c4941");

        assert_eq!(short_string("empty", "").unwrap(), Felt::ZERO);
    }

    #[test]
    fn test_short_string_rejects_long_and_non_ascii() {
        assert!(short_string("tag", &"a".repeat(32)).is_err());
        assert!(short_string("tag", &"a".repeat(31)).is_ok());
        assert!(short_string("tag", "prix€").is_err());
    }

    #[test]
    fn test_to_micro_units_truncates() {
        let qty = parse_decimal("qty", "0.001").unwrap();
        assert_eq!(to_micro_units("qty", qty).unwrap(), 1000);

        let odd = parse_decimal("qty", "0.0000019").unwrap();
        assert_eq!(to_micro_units("qty", odd).unwrap(), 1);

        let notional = parse_decimal("notional", "43.4451175").unwrap();
        assert_eq!(to_micro_units("notional", notional).unwrap(), 43_445_117);
    }

    #[test]
    fn test_to_micro_units_rejects_negative_and_overflow() {
        let negative = parse_decimal("price", "-1").unwrap();
        assert!(to_micro_units("price", negative).is_err());

        let huge = parse_decimal("qty", "99999999999999999").unwrap();
        assert!(to_micro_units("qty", huge).is_err());
    }

    #[test]
    fn test_parse_decimal_rejects_garbage() {
        assert!(parse_decimal("price", "abc").is_err());
        assert!(matches!(
            parse_decimal("price", " ").unwrap_err(),
            SignatureError::Validation(_)
        ));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn normalization_ignores_prefix_and_padding(value in any::<u128>(), zeros in 0usize..40) {
                let plain = format!("{:x}", value);
                let padded = format!("0x{}{}", "0".repeat(zeros), plain);
                let a = normalize_public_key(&plain).unwrap();
                let b = normalize_public_key(&padded).unwrap();
                prop_assert_eq!(&a, &b);
                prop_assert_eq!(normalize_public_key(&a).unwrap(), a);
            }

            #[test]
            fn signed_amounts_cancel(value in any::<i64>()) {
                let felt = felt_from_i64(value);
                let opposite = if value == i64::MIN {
                    Felt::from(value.unsigned_abs())
                } else {
                    felt_from_i64(-value)
                };
                prop_assert_eq!(felt + opposite, Felt::ZERO);
            }
        }
    }
}
