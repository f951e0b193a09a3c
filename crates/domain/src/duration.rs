//! k6 形式の期間文字列（`"1m"`, `"30s"`, `"1m30s"`, `"500ms"`）の解析と整形

use crate::errors::DomainError;
use std::time::Duration;

/// 期間文字列を解析
///
/// 数値と単位（`h`, `m`, `s`, `ms`）の組を連結したものを受け付ける。
pub fn parse_duration(input: &str) -> Result<Duration, DomainError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(DomainError::InvalidDuration("empty duration".to_string()));
    }

    let mut total = Duration::ZERO;
    let mut rest = s;

    while !rest.is_empty() {
        let digits_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if digits_end == 0 {
            return Err(DomainError::InvalidDuration(format!(
                "expected a number in '{input}'"
            )));
        }

        let value: u64 = rest[..digits_end]
            .parse()
            .map_err(|_| DomainError::InvalidDuration(format!("number too large in '{input}'")))?;
        rest = &rest[digits_end..];

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(rest.len());
        let unit = &rest[..unit_end];
        rest = &rest[unit_end..];

        let part = match unit {
            "ms" => Duration::from_millis(value),
            "s" => Duration::from_secs(value),
            "m" => Duration::from_secs(value.saturating_mul(60)),
            "h" => Duration::from_secs(value.saturating_mul(3600)),
            "" => {
                return Err(DomainError::InvalidDuration(format!(
                    "missing unit in '{input}'"
                )))
            }
            other => {
                return Err(DomainError::InvalidDuration(format!(
                    "unknown unit '{other}' in '{input}'"
                )))
            }
        };
        total = total
            .checked_add(part)
            .ok_or_else(|| DomainError::InvalidDuration(format!("overflow in '{input}'")))?;
    }

    Ok(total)
}

/// 期間を最短の k6 形式文字列に整形
pub fn format_duration(duration: Duration) -> String {
    if duration.is_zero() {
        return "0s".to_string();
    }

    let total_ms = duration.as_millis();
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let seconds = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{hours}h"));
    }
    if minutes > 0 {
        out.push_str(&format!("{minutes}m"));
    }
    if seconds > 0 {
        out.push_str(&format!("{seconds}s"));
    }
    if millis > 0 {
        out.push_str(&format!("{millis}ms"));
    }
    out
}

/// `#[serde(with = "crate::duration::serde_str")]` 用
pub mod serde_str {
    use super::{format_duration, parse_duration};
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_duration(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}
