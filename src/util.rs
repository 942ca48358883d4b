// Utility helpers for parsing and basic statistics.
//
// All tolerant CSV value handling lives here so the rest of the crate can
// work with typed, nullable values.
use num_format::{Locale, ToFormattedString};

/// Parse a string-like value into `f64`, returning `None` for anything that
/// is not a number.
///
/// - Trims whitespace; empty text is null.
/// - Accepts decimal and scientific notation (`"12.5"`, `"1e3"`).
/// - Accepts comma thousands separators only in proper groups of three
///   (`"1,234.5"`); `"12,5"` and `"1,2,3"` are null.
/// - Rejects non-finite results (`"inf"`, `"NaN"`).
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(v) = s.parse::<f64>() {
        return Some(v).filter(|v| v.is_finite());
    }
    if !is_grouped_thousands(s) {
        return None;
    }
    s.replace(',', "").parse::<f64>().ok().filter(|v| v.is_finite())
}

/// `-?\d{1,3}(,\d{3})+(\.\d+)?`
fn is_grouped_thousands(s: &str) -> bool {
    let s = s.strip_prefix('-').unwrap_or(s);
    let (int, frac) = match s.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (s, None),
    };
    if let Some(frac) = frac {
        if frac.is_empty() || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
    }
    let mut groups = int.split(',');
    let lead = groups.next().unwrap_or("");
    if lead.is_empty() || lead.len() > 3 || !lead.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let mut rest = 0;
    for g in groups {
        if g.len() != 3 || !g.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
        rest += 1;
    }
    rest > 0
}

/// Years are integers, but spreadsheet exports often write them as
/// `2015.0`. Integral floats are accepted; fractional years are null.
pub fn parse_year(s: Option<&str>) -> Option<i32> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(y) = s.parse::<i32>() {
        return Some(y);
    }
    let v = parse_f64_safe(Some(s))?;
    if v.fract() != 0.0 || v < i32::MIN as f64 || v > i32::MAX as f64 {
        return None;
    }
    Some(v as i32)
}

/// Trimmed text, `None` when blank.
pub fn clean_text(s: Option<&str>) -> Option<String> {
    let s = s?.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(v: &[f64]) -> Option<f64> {
    if v.is_empty() {
        return None;
    }
    let sum: f64 = v.iter().copied().sum();
    Some(sum / v.len() as f64)
}

/// Linear-interpolated quantile of an ascending slice.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

pub fn median(mut v: Vec<f64>) -> Option<f64> {
    v.sort_by(f64::total_cmp);
    quantile_sorted(&v, 0.5)
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus `1,234,567.89` style grouping of the integer part.
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: u64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

/// Compact magnitude suffixes: `1.5K`, `2.3M`, `4.1B`.
pub fn format_large_number(n: f64) -> String {
    let abs = n.abs();
    if abs >= 1e9 {
        format!("{:.1}B", n / 1e9)
    } else if abs >= 1e6 {
        format!("{:.1}M", n / 1e6)
    } else if abs >= 1e3 {
        format!("{:.1}K", n / 1e3)
    } else {
        format!("{:.0}", n)
    }
}

pub fn format_percent(v: f64) -> String {
    format!("{:.1}%", v)
}

pub fn format_billions(v: f64) -> String {
    format!("${}B", format_number(v, 2))
}

/// `"n/a"` for missing values, as shown in tables and summaries.
pub fn format_optional(v: Option<f64>, f: impl Fn(f64) -> String) -> String {
    v.map(f).unwrap_or_else(|| "n/a".to_string())
}

// `tabled` display adapters.

pub fn display_count(n: &usize) -> String {
    format_int(*n)
}

pub fn display_pct(v: &f64) -> String {
    format_percent(*v)
}

pub fn display_opt_pct(v: &Option<f64>) -> String {
    format_optional(*v, format_percent)
}

pub fn display_billions(v: &f64) -> String {
    format_billions(*v)
}

pub fn display_opt_billions(v: &Option<f64>) -> String {
    format_optional(*v, format_billions)
}
