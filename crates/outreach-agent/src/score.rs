//! Score and rationale normalization for producer payloads.

use serde_json::Value;

/// Coerce a producer-provided score into the allowed integer range [1, 10].
///
/// Integers pass through, floats truncate toward zero, numeric strings are
/// parsed; anything else defaults to 1 before the clamp.
pub fn normalize_score(value: &Value) -> i64 {
    let coerced = match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|f| f as i64)),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    };
    coerced.map_or(1, |score| score.clamp(1, 10))
}

/// Ensure a rationale is always stored as a plain string.
///
/// Lists and objects are serialized to JSON rather than dropped; scalar
/// values render without surrounding quotes.
pub fn normalize_rationale(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integers_clamp_into_range() {
        assert_eq!(normalize_score(&json!(7)), 7);
        assert_eq!(normalize_score(&json!(0)), 1);
        assert_eq!(normalize_score(&json!(-3)), 1);
        assert_eq!(normalize_score(&json!(15)), 10);
        assert_eq!(normalize_score(&json!(1)), 1);
        assert_eq!(normalize_score(&json!(10)), 10);
    }

    #[test]
    fn floats_truncate_then_clamp() {
        assert_eq!(normalize_score(&json!(7.9)), 7);
        assert_eq!(normalize_score(&json!(10.4)), 10);
        assert_eq!(normalize_score(&json!(0.9)), 1);
    }

    #[test]
    fn numeric_strings_parse() {
        assert_eq!(normalize_score(&json!("8")), 8);
        assert_eq!(normalize_score(&json!(" 4 ")), 4);
    }

    #[test]
    fn non_coercible_values_default_to_one() {
        assert_eq!(normalize_score(&json!("strong")), 1);
        assert_eq!(normalize_score(&json!(null)), 1);
        assert_eq!(normalize_score(&json!(true)), 1);
        assert_eq!(normalize_score(&json!([8])), 1);
        assert_eq!(normalize_score(&json!({"score": 8})), 1);
        assert_eq!(normalize_score(&json!("8.5")), 1);
    }

    #[test]
    fn string_rationale_passes_through() {
        assert_eq!(normalize_rationale(&json!("clear CTA")), "clear CTA");
    }

    #[test]
    fn structured_rationale_is_serialized_not_dropped() {
        assert_eq!(
            normalize_rationale(&json!(["good tone", "weak CTA"])),
            r#"["good tone","weak CTA"]"#
        );
        assert_eq!(
            normalize_rationale(&json!({"tone": "good"})),
            r#"{"tone":"good"}"#
        );
    }

    #[test]
    fn scalar_rationale_is_stringified() {
        assert_eq!(normalize_rationale(&json!(7)), "7");
        assert_eq!(normalize_rationale(&json!(null)), "null");
    }
}
