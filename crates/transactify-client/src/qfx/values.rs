use std::sync::LazyLock;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use regex::Regex;

static TIMEZONE_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[(?P<tz>[-+]?\d+\.?\d*)(?::\w*)?\]$").expect("timezone suffix regex")
});

const EMPTY_DATE: &str = "00000000";

/// Parses an OFX timestamp `YYYYMMDD[HHMMSS[.XXX]][[±H[:TZ]]]` into UTC.
///
/// Returns `None` for the all-zero placeholder date and for anything that is
/// not a date at all.
pub fn parse_ofx_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    let offset_hours = timezone_offset_hours(raw);

    let local = match raw.get(..14).unwrap_or(raw) {
        full if full.len() == 14 => NaiveDateTime::parse_from_str(full, "%Y%m%d%H%M%S").ok(),
        _ => None,
    };
    let local = match local {
        Some(value) => value,
        None => {
            let day = raw.get(..8)?;
            if day == EMPTY_DATE {
                return None;
            }
            NaiveDate::parse_from_str(day, "%Y%m%d")
                .ok()?
                .and_hms_opt(0, 0, 0)?
        }
    };

    let offset = Duration::milliseconds((offset_hours * 3_600_000.0).round() as i64);
    local.checked_sub_signed(offset)
}

fn timezone_offset_hours(raw: &str) -> f64 {
    TIMEZONE_SUFFIX
        .captures(raw)
        .and_then(|captures| captures.name("tz"))
        .and_then(|tz| tz.as_str().parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// Parses an OFX amount. `10,000.50`, `10.000,50`, `10000,50`, `+5` and
/// `1 025,53` are all accepted.
pub fn parse_ofx_amount(raw: &str) -> Option<f64> {
    let mut value = raw.trim().to_string();
    if let Some(comma) = value.rfind(',')
        && value[..comma].contains('.')
    {
        value = value.replace('.', "");
    }
    if let Some(dot) = value.rfind('.')
        && value[..dot].contains(',')
    {
        value = value.replace(',', "");
    }
    if !value.contains('.') {
        value = value.replace(',', ".");
    }
    let value = value.replace([' ', '+'], "");

    if value.is_empty() || !value.chars().any(|character| character.is_ascii_digit()) {
        return None;
    }
    value.parse::<f64>().ok().filter(|number| number.is_finite())
}

/// Trims a payee and collapses internal whitespace runs to one space.
pub fn normalize_payee(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<&str>>().join(" ")
}
