//! Config redaction: produce safe-to-log config snapshots by masking secrets.

use serde_json::Value;

static SECRET_KEYS: &[&str] = &[
    "appSecret",
    "app_secret",
    "pageAccessToken",
    "page_access_token",
    "validationToken",
    "validation_token",
    "accessToken",
    "access_token",
    "token",
    "secret",
    "password",
];

/// Redact a config JSON value, masking every secret-bearing field.
pub fn redact(value: &Value) -> Value {
    redact_recursive(value, "")
}

fn is_sensitive_key(key: &str) -> bool {
    SECRET_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

fn redact_string(s: &str, key: &str) -> Value {
    if !is_sensitive_key(key) || s.is_empty() {
        return Value::String(s.to_string());
    }
    // First 4 chars as a hint.
    let hint = if s.chars().count() > 4 {
        format!("{}***", s.chars().take(4).collect::<String>())
    } else {
        "***".to_string()
    };
    Value::String(hint)
}

fn redact_recursive(value: &Value, key: &str) -> Value {
    match value {
        Value::String(s) => redact_string(s, key),
        Value::Array(arr) => Value::Array(arr.iter().map(|v| redact_recursive(v, key)).collect()),
        Value::Object(map) => {
            let mut result = serde_json::Map::new();
            for (k, v) in map {
                result.insert(k.clone(), redact_recursive(v, k));
            }
            Value::Object(result)
        }
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn redacts_credentials() {
        let v = json!({
            "appSecret": "0123456789abcdef",
            "pageAccessToken": "EAAGm0PX4ZCpsBA",
            "validationToken": "abc"
        });
        let redacted = redact(&v);
        assert_eq!(redacted["appSecret"], "0123***");
        assert_eq!(redacted["pageAccessToken"], "EAAG***");
        assert_eq!(redacted["validationToken"], "***");
    }

    #[test]
    fn passthrough_non_sensitive() {
        let v = json!({ "serverUrl": "https://bot.example", "logging": { "level": "debug" } });
        let redacted = redact(&v);
        assert_eq!(redacted, v);
    }
}
