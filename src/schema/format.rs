//! `format` keyword checks.

use std::net::{Ipv4Addr, Ipv6Addr};

use bigdecimal::BigDecimal;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::value::{decimal_from_number, is_integral};

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid"));

static UUID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("uuid pattern is valid")
});

static BASE64: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[A-Za-z0-9+/]{4})*(?:[A-Za-z0-9+/]{2}==|[A-Za-z0-9+/]{3}=)?$")
        .expect("base64 pattern is valid")
});

static HOSTNAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$",
    )
    .expect("hostname pattern is valid")
});

/// Known formats. Anything else is kept by name and reported as a warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Format {
    Int32,
    Int64,
    Float,
    Double,
    Byte,
    Binary,
    Password,
    Date,
    DateTime,
    Email,
    Uuid,
    Hostname,
    Uri,
    Ipv4,
    Ipv6,
    Unknown(String),
}

/// Outcome of checking a value against a format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FormatCheck {
    Valid,
    /// The format does not apply to this instance type.
    NotApplicable,
    Invalid,
    Unknown,
}

impl Format {
    pub(crate) fn parse(name: &str) -> Self {
        match name {
            "int32" => Format::Int32,
            "int64" => Format::Int64,
            "float" => Format::Float,
            "double" => Format::Double,
            "byte" => Format::Byte,
            "binary" => Format::Binary,
            "password" => Format::Password,
            "date" => Format::Date,
            "date-time" => Format::DateTime,
            "email" => Format::Email,
            "uuid" => Format::Uuid,
            "hostname" => Format::Hostname,
            "uri" => Format::Uri,
            "ipv4" => Format::Ipv4,
            "ipv6" => Format::Ipv6,
            other => Format::Unknown(other.to_string()),
        }
    }

    pub(crate) fn name(&self) -> &str {
        match self {
            Format::Int32 => "int32",
            Format::Int64 => "int64",
            Format::Float => "float",
            Format::Double => "double",
            Format::Byte => "byte",
            Format::Binary => "binary",
            Format::Password => "password",
            Format::Date => "date",
            Format::DateTime => "date-time",
            Format::Email => "email",
            Format::Uuid => "uuid",
            Format::Hostname => "hostname",
            Format::Uri => "uri",
            Format::Ipv4 => "ipv4",
            Format::Ipv6 => "ipv6",
            Format::Unknown(name) => name,
        }
    }

    pub(crate) fn check(&self, value: &Value) -> FormatCheck {
        let valid = match (self, value) {
            (Format::Unknown(_), _) => return FormatCheck::Unknown,
            (Format::Int32, Value::Number(n)) => {
                !is_integral(n) || in_range(n, i32::MIN as i64, i32::MAX as i64)
            }
            (Format::Int64, Value::Number(n)) => !is_integral(n) || in_range(n, i64::MIN, i64::MAX),
            (Format::Float, Value::Number(n)) => n
                .as_f64()
                .map_or(false, |f| f.is_finite() && f.abs() <= f32::MAX as f64),
            (Format::Double, Value::Number(n)) => n.as_f64().map_or(false, f64::is_finite),
            (Format::Byte, Value::String(s)) => BASE64.is_match(s),
            (Format::Binary | Format::Password, Value::String(_)) => true,
            (Format::Date, Value::String(s)) => {
                chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
            }
            (Format::DateTime, Value::String(s)) => chrono::DateTime::parse_from_rfc3339(s).is_ok(),
            (Format::Email, Value::String(s)) => EMAIL.is_match(s),
            (Format::Uuid, Value::String(s)) => UUID.is_match(s),
            (Format::Hostname, Value::String(s)) => s.len() <= 253 && HOSTNAME.is_match(s),
            (Format::Uri, Value::String(s)) => url::Url::parse(s).is_ok(),
            (Format::Ipv4, Value::String(s)) => s.parse::<Ipv4Addr>().is_ok(),
            (Format::Ipv6, Value::String(s)) => s.parse::<Ipv6Addr>().is_ok(),
            _ => return FormatCheck::NotApplicable,
        };
        if valid {
            FormatCheck::Valid
        } else {
            FormatCheck::Invalid
        }
    }
}

fn in_range(number: &serde_json::Number, min: i64, max: i64) -> bool {
    match decimal_from_number(number) {
        Some(decimal) => decimal >= BigDecimal::from(min) && decimal <= BigDecimal::from(max),
        None => false,
    }
}
