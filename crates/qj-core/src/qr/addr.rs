//! E-mail address helpers used by the QR grammar.

use once_cell::sync::Lazy;
use regex::Regex;

/// Loose plausibility check: `local@domain.tld`, no whitespace.
static ADDR_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s.]+$").unwrap());

/// Trims and strips a leading `mailto:`.
pub fn normalize_addr(addr: &str) -> String {
    let trimmed = addr.trim();
    let without_scheme = match trimmed.get(..7) {
        Some(prefix) if prefix.eq_ignore_ascii_case("mailto:") => &trimmed[7..],
        _ => trimmed,
    };
    without_scheme.trim().to_string()
}

pub fn may_be_valid_addr(addr: &str) -> bool {
    ADDR_REGEX.is_match(addr)
}

/// Addresses compare case-insensitively.
pub fn addr_equals(a: &str, b: &str) -> bool {
    normalize_addr(a).eq_ignore_ascii_case(&normalize_addr(b))
}

/// Normalises a display name.
///
/// Surrounding quotes are removed and `Last, First` becomes `First Last`.
pub fn normalize_name(name: &str) -> String {
    let trimmed = name
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim();
    let reordered = match trimmed.split_once(',') {
        Some((last, first)) if !first.trim().is_empty() => {
            format!("{} {}", first.trim(), last.trim())
        }
        Some((last, _)) => last.trim().to_string(),
        None => trimmed.to_string(),
    };
    reordered.split_whitespace().collect::<Vec<_>>().join(" ")
}
