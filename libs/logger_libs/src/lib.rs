use std::fmt::Debug;

use lazy_static::lazy_static;
use log::{debug, error, info, warn};
use regex::Regex;
use serde::Serialize;
use serde_json::{from_str, json, Map, Value};

lazy_static! {
    static ref BYTES_MESSAGE: Regex = Regex::new(r#"Bytes\((b?"(.*)")\)"#).unwrap();
}

/// Serializes `data` into a JSON object with sensitive fields masked.
/// Non-object values are wrapped as `{"value": ...}`.
pub fn json_converter<T>(data: &T) -> Map<String, Value>
where
    T: Serialize,
{
    let value = serde_json::to_value(data).unwrap_or(json!({}));

    let mut object = match value {
        Value::Object(object) => object,
        other => {
            let mut wrapped = Map::new();
            wrapped.insert("value".to_string(), other);
            wrapped
        }
    };

    for (key, value) in object.iter_mut() {
        let masked = match key.as_str() {
            "password" | "token" | "access_token" | "refresh_token" => Some(password_mask()),
            "username" => Some(username_mask(value.as_str().unwrap_or(""))),
            "email" => Some(email_mask(value.as_str().unwrap_or(""))),
            _ => None,
        };
        if let Some(masked) = masked {
            *value = Value::String(masked);
        }
    }

    object
}

pub fn debug_logger<T, B>(log_id: &str, handler: &str, method: &str, request: &T, response: &B)
where
    T: Serialize + Debug,
    B: Serialize + Debug,
{
    debug!(
        "[ {} ] {}.{} Request: {} | Response: {}",
        log_id,
        handler,
        method,
        Value::Object(json_converter(request)),
        Value::Object(json_converter(response))
    );
}

pub fn info_logger(log_id: &str, handler: &str, method: &str) {
    info!("[ {} ] {}.{}", log_id, handler, method)
}

pub fn warning_logger(log_id: &str, handler: &str, method: &str, message: &str) {
    warn!(
        "[ {} ] {}.{} warning: {}",
        log_id,
        handler,
        method,
        clean_message(message)
    );
}

pub fn error_logger(method: &str, message: &str) {
    error!("{}, error: {}", method, message)
}

/// Unwraps `Bytes("...")` debug output and re-renders embedded JSON compactly.
pub fn clean_message(message: &str) -> String {
    let extracted = BYTES_MESSAGE
        .captures(message)
        .and_then(|caps| caps.get(1))
        .map_or(message, |m| m.as_str());

    let cleaned = extracted
        .trim_start_matches("b\"")
        .trim_start_matches('"')
        .trim_end_matches('"');

    let unescaped: String = from_str(cleaned).unwrap_or_else(|_| cleaned.to_string());

    match from_str::<Value>(&unescaped) {
        Ok(json) => json.to_string(),
        Err(_) => unescaped,
    }
}

pub fn password_mask() -> String {
    String::from("***")
}

pub fn username_mask(username: &str) -> String {
    username
        .split(' ')
        .map(|word| {
            let prefix: String = word.chars().take(3).collect();
            format!("{}***", prefix)
        })
        .collect::<Vec<String>>()
        .join(" ")
}

pub fn email_mask(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => format!("{}@{}", username_mask(local), domain),
        None => password_mask(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Debug)]
    struct Login {
        username: String,
        email: String,
        password: String,
        content: String,
    }

    #[test]
    fn masks_sensitive_fields() {
        let masked = json_converter(&Login {
            username: "reihan putra".into(),
            email: "reihan@example.com".into(),
            password: "hunter22".into(),
            content: "hello".into(),
        });

        assert_eq!(masked["username"], "rei*** put***");
        assert_eq!(masked["email"], "rei***@example.com");
        assert_eq!(masked["password"], "***");
        assert_eq!(masked["content"], "hello");
    }

    #[test]
    fn wraps_non_object_values() {
        let masked = json_converter(&vec![1, 2]);
        assert_eq!(masked["value"], json!([1, 2]));
    }

    #[test]
    fn username_mask_handles_multibyte() {
        assert_eq!(username_mask("ñandú"), "ñan***");
        assert_eq!(username_mask("ab"), "ab***");
    }

    #[test]
    fn clean_message_extracts_bytes_payload() {
        let message = r#"Bytes(b"{"a": 1}")"#;
        assert_eq!(clean_message(message), r#"{"a":1}"#);
        assert_eq!(clean_message("plain text"), "plain text");
    }
}
