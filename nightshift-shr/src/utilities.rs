//  UTILITIES.rs
//    by Lut99
//
//  Created:
//    06 Feb 2023, 10:47:19
//  Last edited:
//    21 Mar 2023, 09:35:40
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines small conversion helpers for the loosely-typed values that
//!   appear in experiment descriptors.
//

use serde_json::Value as JValue;


/***** TESTS *****/
#[cfg(test)]
mod tests {
    use serde_json::json;
    use super::*;


    #[test]
    fn test_coerce_bool() {
        // Real booleans pass through
        assert!(coerce_bool(&json!(true)));
        assert!(!coerce_bool(&json!(false)));

        // Positive integers are true
        assert!(coerce_bool(&json!(1)));
        assert!(coerce_bool(&json!(42)));
        assert!(!coerce_bool(&json!(0)));
        assert!(!coerce_bool(&json!(-1)));

        // A small set of strings is recognized, case-insensitively
        assert!(coerce_bool(&json!("true")));
        assert!(coerce_bool(&json!("Yes")));
        assert!(coerce_bool(&json!("1")));
        assert!(!coerce_bool(&json!("false")));
        assert!(!coerce_bool(&json!("no")));
        assert!(!coerce_bool(&json!("0")));

        // Everything else is false
        assert!(!coerce_bool(&json!("maybe")));
        assert!(!coerce_bool(&json!(null)));
        assert!(!coerce_bool(&json!([true])));
    }

    #[test]
    fn test_json_to_string() {
        assert_eq!(json_to_string(&json!("hello")), "hello");
        assert_eq!(json_to_string(&json!(42)), "42");
        assert_eq!(json_to_string(&json!(true)), "true");
    }
}





/***** LIBRARY *****/
/// Coerces a loosely-typed descriptor value into a boolean.
///
/// Booleans pass through; integers are true when positive; the strings `true`/`yes`/`1` (any case) are true and `false`/`no`/`0` are false. Anything else is false.
///
/// # Arguments
/// - `value`: The JSON value to coerce.
///
/// # Returns
/// The boolean interpretation of the given value.
pub fn coerce_bool(value: &JValue) -> bool {
    match value {
        JValue::Bool(b)   => *b,
        JValue::Number(n) => n.as_i64().map(|v| v > 0).unwrap_or(false),
        JValue::String(s) => matches!(s.to_lowercase().as_str(), "true" | "yes" | "1"),
        _                 => false,
    }
}



/// Renders a descriptor value as the string it will be substituted as.
///
/// Strings are taken as-is (unquoted); every other value uses its JSON rendering.
///
/// # Arguments
/// - `value`: The JSON value to render.
///
/// # Returns
/// The string form of the given value.
pub fn json_to_string(value: &JValue) -> String {
    match value {
        JValue::String(s) => s.clone(),
        other             => other.to_string(),
    }
}
