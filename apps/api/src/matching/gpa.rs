//! GPA Normalizer — parses free-text GPA expressions into a canonical
//! (4.0-scale, 100-scale) pair.
//!
//! Source data mixes Chinese 100-point and international 4.0-point transcripts
//! with no declared scale, so the only viable heuristic for an unlabelled
//! number is magnitude: values ≤ 4 are read as 4.0-scale, anything larger as
//! 100-scale. That inference is an accepted source of noise.

use std::sync::LazyLock;

use regex::Regex;

static FRACTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+\.?\d*)\s*/\s*(\d+\.?\d*)").unwrap());
static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+\.?\d*").unwrap());

/// Parses a raw GPA string into `(gpa_4, gpa_100)`.
///
/// Returns `None` for empty or unparseable input — both scales are present or
/// neither is. Results are always clamped to [0, 4.0] and [0, 100].
pub fn parse_gpa(raw: &str) -> Option<(f64, f64)> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Some(caps) = FRACTION_RE.captures(raw) {
        let numerator: f64 = caps[1].parse().ok()?;
        let denominator: f64 = caps[2].parse().ok()?;
        return Some(if denominator == 4.0 {
            from_scale_4(numerator)
        } else if denominator == 100.0 {
            from_scale_100(numerator)
        } else {
            // Unrecognized denominator: fall back to magnitude inference.
            infer_by_magnitude(numerator)
        });
    }

    let value: f64 = NUMBER_RE.find(raw)?.as_str().parse().ok()?;
    Some(infer_by_magnitude(value))
}

fn infer_by_magnitude(value: f64) -> (f64, f64) {
    if value <= 4.0 {
        from_scale_4(value)
    } else {
        from_scale_100(value)
    }
}

fn from_scale_4(value: f64) -> (f64, f64) {
    (value.clamp(0.0, 4.0), (value * 25.0).clamp(0.0, 100.0))
}

fn from_scale_100(value: f64) -> (f64, f64) {
    ((value / 25.0).clamp(0.0, 4.0), value.clamp(0.0, 100.0))
}
