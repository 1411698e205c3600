//! Candidate extraction from free-form model text
//!
//! Models wrap answers in prose and Markdown. These helpers locate the part of
//! the text that can hold a value of a given kind; they never interpret it.

use regex::Regex;

lazy_static::lazy_static! {
    /// A number not glued to a preceding word character. Digits are ASCII only.
    static ref NUMBER: Regex = Regex::new(
        r"(?:^|[^A-Za-z0-9_.])([-+]?(?:[0-9]+(?:\.[0-9]+)?(?:[eE][-+]?[0-9]+)?|\.[0-9]+))"
    )
    .expect("number pattern");
    static ref FLOAT_SPECIAL: Regex =
        Regex::new(r"(?i)(?:^|[^A-Za-z0-9_])([-+]?(?:infinity|inf|nan))\b")
            .expect("float special pattern");
    static ref BOOL: Regex = Regex::new(r"(?i)\b(true|false)\b").expect("bool pattern");
    static ref WORD: Regex = Regex::new(r"[A-Za-z_][A-Za-z0-9_]*").expect("word pattern");
    // A sign or digit before the year would change its meaning, so neither may
    // precede a date.
    static ref DATE: Regex = Regex::new(
        r"(?:^|[^A-Za-z0-9_+-])([0-9]{4}-[0-9]{2}-[0-9]{2})(?:[^0-9]|$)"
    )
    .expect("date pattern");
    static ref TIME: Regex =
        Regex::new(r"(?:^|[^0-9:])([0-9]{2}:[0-9]{2}:[0-9]{2}(?:\.[0-9]+)?)")
            .expect("time pattern");
    static ref DATE_TIME: Regex = Regex::new(
        r"(?:^|[^A-Za-z0-9_+-])([0-9]{4}-[0-9]{2}-[0-9]{2})[T ]([0-9]{2}:[0-9]{2}:[0-9]{2}(?:\.[0-9]+)?)"
    )
    .expect("date-time pattern");
    static ref TIMESTAMP: Regex = Regex::new(
        r"(?:^|[^A-Za-z0-9_+-])([0-9]{4}-[0-9]{2}-[0-9]{2})[Tt ]([0-9]{2}:[0-9]{2}:[0-9]{2}(?:\.[0-9]+)?)([Zz]|[+-][0-9]{2}:[0-9]{2})"
    )
    .expect("timestamp pattern");
    static ref DURATION: Regex = Regex::new(
        r"\bP(?:([0-9]+)D)?(?:T(?:([0-9]+)H)?(?:([0-9]+)M)?(?:([0-9]+(?:\.[0-9]+)?)S)?)?\b"
    )
    .expect("duration pattern");
    static ref PLAIN_TOKEN: Regex =
        Regex::new(r"^[A-Za-z0-9_.+-]+$").expect("plain token pattern");
    static ref IDENTIFIER: Regex =
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern");
}

/// Words that stand for an absent optional value.
pub(crate) const NULL_TOKENS: [&str; 4] = ["NULL", "null", "None", "nil"];

/// Remove a surrounding Markdown code fence and whitespace.
///
/// A fence opener line such as "```json" is dropped along with the closing
/// fence. Text without fences is only trimmed.
pub(crate) fn strip_fences(text: &str) -> &str {
    let mut s = text.trim();
    if let Some(rest) = s.strip_prefix("```") {
        s = match rest.find('\n') {
            Some(pos) => &rest[pos + 1..],
            None => rest,
        };
        if let Some(idx) = s.rfind("```") {
            s = &s[..idx];
        }
    }
    s.trim()
}

/// First numeric token.
pub(crate) fn first_number(text: &str) -> Option<&str> {
    NUMBER
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// First float token, including `inf` and `NaN` spellings.
pub(crate) fn first_float(text: &str) -> Option<&str> {
    let number = NUMBER.captures(text).and_then(|c| c.get(1));
    let special = FLOAT_SPECIAL.captures(text).and_then(|c| c.get(1));
    match (number, special) {
        (Some(n), Some(s)) => Some(if s.start() < n.start() { s } else { n }.as_str()),
        (n, s) => n.or(s).map(|m| m.as_str()),
    }
}

pub(crate) fn first_bool(text: &str) -> Option<bool> {
    BOOL.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().eq_ignore_ascii_case("true"))
}

/// All identifier-like words in order of appearance.
pub(crate) fn words(text: &str) -> impl Iterator<Item = &str> {
    WORD.find_iter(text).map(|m| m.as_str())
}

/// Whether the whole text names an absent value.
pub(crate) fn is_null_token(text: &str) -> bool {
    let t = text.trim().trim_end_matches('.');
    NULL_TOKENS.contains(&t)
}

pub(crate) fn first_date(text: &str) -> Option<&str> {
    DATE.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str())
}

pub(crate) fn first_time(text: &str) -> Option<&str> {
    TIME.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str())
}

/// First date-time as its (date, time) parts.
pub(crate) fn first_date_time(text: &str) -> Option<(&str, &str)> {
    let caps = DATE_TIME.captures(text)?;
    Some((caps.get(1)?.as_str(), caps.get(2)?.as_str()))
}

/// First RFC 3339 style timestamp as its (date, time, offset) parts.
pub(crate) fn first_timestamp(text: &str) -> Option<(&str, &str, &str)> {
    let caps = TIMESTAMP.captures(text)?;
    Some((caps.get(1)?.as_str(), caps.get(2)?.as_str(), caps.get(3)?.as_str()))
}

/// Components of an ISO-8601 duration: days, hours, minutes, seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DurationParts<'a> {
    pub days: Option<&'a str>,
    pub hours: Option<&'a str>,
    pub minutes: Option<&'a str>,
    pub seconds: Option<&'a str>,
}

/// First ISO-8601 duration with at least one component.
pub(crate) fn first_duration(text: &str) -> Option<DurationParts<'_>> {
    DURATION.captures_iter(text).find_map(|caps| {
        let parts = DurationParts {
            days: caps.get(1).map(|m| m.as_str()),
            hours: caps.get(2).map(|m| m.as_str()),
            minutes: caps.get(3).map(|m| m.as_str()),
            seconds: caps.get(4).map(|m| m.as_str()),
        };
        let any = parts.days.is_some()
            || parts.hours.is_some()
            || parts.minutes.is_some()
            || parts.seconds.is_some();
        any.then_some(parts)
    })
}

/// Tokens that can appear unquoted inside labeled notation.
pub(crate) fn is_plain_token(text: &str) -> bool {
    PLAIN_TOKEN.is_match(text)
}

pub(crate) fn is_identifier(text: &str) -> bool {
    IDENTIFIER.is_match(text)
}

/// Extract the first balanced slice that opens with `open` (`[` or `{`).
///
/// Brackets and braces inside string literals are ignored. A closing bracket
/// without a matching opener abandons the current candidate and scanning
/// continues.
pub(crate) fn extract_balanced_slice(text: &str, open: u8) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut start = None;
    let mut brace: i32 = 0;
    let mut bracket: i32 = 0;
    let mut in_str = false;
    let mut escape = false;
    for (i, &c) in bytes.iter().enumerate() {
        let Some(s) = start else {
            if c == open {
                start = Some(i);
                if c == b'{' {
                    brace = 1;
                } else {
                    bracket = 1;
                }
            }
            continue;
        };
        if in_str {
            if escape {
                escape = false;
            } else if c == b'\\' {
                escape = true;
            } else if c == b'"' {
                in_str = false;
            }
            continue;
        }
        match c {
            b'"' => in_str = true,
            b'{' => brace += 1,
            b'}' => brace -= 1,
            b'[' => bracket += 1,
            b']' => bracket -= 1,
            _ => {}
        }
        if brace < 0 || bracket < 0 {
            start = None;
            brace = 0;
            bracket = 0;
        } else if brace == 0 && bracket == 0 {
            return text.get(s..=i);
        }
    }
    None
}
