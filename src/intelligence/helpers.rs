use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use super::types::Token;

static RE_WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Normalise a label for comparison: trim, collapse whitespace, lowercase.
/// "  CT   Scan " and "ct scan" compare equal.
pub fn normalize_label(label: &str) -> String {
    RE_WHITESPACE
        .replace_all(label.trim(), " ")
        .to_lowercase()
}

/// Display form of a label: trimmed with whitespace collapsed, case kept.
pub fn display_label(label: &str) -> String {
    RE_WHITESPACE.replace_all(label.trim(), " ").into_owned()
}

/// Exact Jaccard similarity |A ∩ B| / |A ∪ B|. Two empty sets score 0.
pub fn jaccard(a: &BTreeSet<Token>, b: &BTreeSet<Token>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Round to two decimals for reporting. Never yields negative zero.
pub fn round2(value: f64) -> f64 {
    let r = (value * 100.0).round() / 100.0;
    if r == 0.0 {
        0.0
    } else {
        r
    }
}

/// Relative change of `current` against `prior`, in percent of `prior`.
/// Falls back to absolute points when the prior is zero.
pub fn relative_change_pct(current: f64, prior: f64) -> f64 {
    if prior.abs() > f64::EPSILON {
        (current - prior) / prior * 100.0
    } else {
        (current - prior) * 100.0
    }
}

/// Calendar duration for a span of days: whole months, else weeks, else days.
pub fn format_calendar_duration(days: i64) -> String {
    fn plural(n: i64, unit: &str) -> String {
        if n == 1 {
            format!("1 {unit}")
        } else {
            format!("{n} {unit}s")
        }
    }

    if days >= 30 && days % 30 == 0 {
        plural(days / 30, "Month")
    } else if days >= 14 {
        plural(days / 7, "Week")
    } else {
        plural(days.max(0), "Day")
    }
}

/// Join display labels for a rendered list: "a, b and c".
pub fn join_natural(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [one] => one.clone(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}
