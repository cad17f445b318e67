//! Metric normalizer: turns free-text view counts ("2.3M views", "892K")
//! into a numeric magnitude.
//!
//! The suffix must be a whole token ("3 bananas" is not 3B).
//! Fail-open: anything without a recognized `k`/`m`/`b` suffix, or with no
//! leading number at all, is `0.0`. Ranking must always produce an order even
//! with dirty data, so there is no error path here.

use once_cell::sync::OnceCell;
use regex::Regex;

/// Parse a view-count string into a non-negative magnitude.
pub fn normalize_views(raw: Option<&str>) -> f64 {
    let Some(s) = raw else {
        return 0.0;
    };

    static RE_METRIC: OnceCell<Regex> = OnceCell::new();
    let re = RE_METRIC.get_or_init(|| {
        Regex::new(r"(?i)^\s*(\d+(?:\.\d+)?|\.\d+)\s*([kmb])\b").expect("static metric regex")
    });

    let Some(caps) = re.captures(s) else {
        return 0.0;
    };

    let Ok(num) = caps[1].parse::<f64>() else {
        return 0.0;
    };

    let mult = match caps[2].as_bytes()[0].to_ascii_lowercase() {
        b'k' => 1_000.0,
        b'm' => 1_000_000.0,
        b'b' => 1_000_000_000.0,
        _ => return 0.0,
    };

    let out = num * mult;
    if out.is_finite() && out >= 0.0 {
        out
    } else {
        0.0
    }
}
