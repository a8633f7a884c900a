use serde_json::Value;

/// Status assigned to a mirrored record when the source document never set
/// one, or set a falsy value.
pub const DEFAULT_STATUS: &str = "off";

/// Resolve the status to mirror for a document.
///
/// Default-value policy: the source treated any falsy status as unset, so
/// an absent field, `null`, `""`, `false`, and `0` all default to
/// [`DEFAULT_STATUS`]. Non-empty strings are mirrored verbatim. Other truthy
/// non-string values are mirrored as their JSON text.
pub fn effective_status(status: Option<&Value>) -> String {
    match status {
        None | Some(Value::Null) => DEFAULT_STATUS.to_string(),
        Some(Value::String(s)) if s.is_empty() => DEFAULT_STATUS.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(false)) => DEFAULT_STATUS.to_string(),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => DEFAULT_STATUS.to_string(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_status_is_mirrored_verbatim() {
        assert_eq!(effective_status(Some(&json!("on"))), "on");
        assert_eq!(effective_status(Some(&json!("dimmed"))), "dimmed");
    }

    #[test]
    fn test_absent_status_defaults_to_off() {
        assert_eq!(effective_status(None), "off");
    }

    #[test]
    fn test_falsy_values_default_to_off() {
        assert_eq!(effective_status(Some(&json!(null))), "off");
        assert_eq!(effective_status(Some(&json!(""))), "off");
        assert_eq!(effective_status(Some(&json!(false))), "off");
        assert_eq!(effective_status(Some(&json!(0))), "off");
        assert_eq!(effective_status(Some(&json!(0.0))), "off");
    }

    #[test]
    fn test_truthy_non_strings_keep_their_json_text() {
        assert_eq!(effective_status(Some(&json!(true))), "true");
        assert_eq!(effective_status(Some(&json!(42))), "42");
    }
}
