//! Field parsing for the textual cells the SET pages publish.

use crate::error::ScrapeError;

/// Reorder a `DD/MM/YYYY` date into `YYYY/MM/DD`.
///
/// A time component separated by whitespace (`05/03/2021 17:32`) is kept
/// after the reordered date. The year is passed through untouched, so Thai
/// Buddhist-era years stay as published.
pub fn reorder_date(text: &str) -> Result<String, ScrapeError> {
    let trimmed = text.trim();
    let (date_part, time_part) = match trimmed.split_once(char::is_whitespace) {
        Some((date, time)) => (date, time.trim()),
        None => (trimmed, ""),
    };

    let parts: Vec<&str> = date_part.split('/').collect();
    let [day, month, year] = parts[..] else {
        return Err(ScrapeError::MalformedRecord(format!(
            "expected DD/MM/YYYY date, got {text:?}"
        )));
    };

    let all_digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    if !(all_digits(day) && all_digits(month) && all_digits(year)) {
        return Err(ScrapeError::MalformedRecord(format!(
            "non-numeric date component in {text:?}"
        )));
    }

    let mut reordered = format!("{year}/{month}/{day}");
    if !time_part.is_empty() {
        reordered.push(' ');
        reordered.push_str(time_part);
    }
    Ok(reordered)
}

/// Parse a numeric cell, stripping `,` thousands separators.
///
/// Empty cells, placeholders such as `-` and non-finite values are malformed.
pub fn parse_number(field: &str, text: &str) -> Result<f64, ScrapeError> {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();

    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ScrapeError::MalformedRecord(format!(
            "{field} is not a number: {text:?}"
        ))),
    }
}

/// Require a non-blank text cell, returning it trimmed.
pub fn required_text(field: &str, text: Option<&str>) -> Result<String, ScrapeError> {
    match text.map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(ScrapeError::MalformedRecord(format!("{field} is missing"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reorders_day_month_year() {
        assert_eq!(reorder_date("05/03/2021").unwrap(), "2021/03/05");
    }

    #[test]
    fn reorder_trims_and_keeps_time() {
        assert_eq!(reorder_date("  05/03/2564 17:32 ").unwrap(), "2564/03/05 17:32");
    }

    #[test]
    fn reorder_rejects_wrong_shape() {
        assert!(reorder_date("2021-03-05").unwrap_err().is_malformed());
        assert!(reorder_date("").unwrap_err().is_malformed());
        assert!(reorder_date("05/03").unwrap_err().is_malformed());
        assert!(reorder_date("aa/03/2021").unwrap_err().is_malformed());
    }

    #[test]
    fn strips_thousands_separators() {
        assert_eq!(parse_number("value", "1,234.50").unwrap(), 1234.50);
        assert_eq!(parse_number("volume", "12,345,678").unwrap(), 12_345_678.0);
    }

    #[test]
    fn keeps_signs() {
        assert_eq!(parse_number("change", "-0.25").unwrap(), -0.25);
        assert_eq!(parse_number("change", "+1.50").unwrap(), 1.5);
    }

    #[test]
    fn garbage_is_malformed_not_zero() {
        assert!(parse_number("open", "abc").unwrap_err().is_malformed());
        assert!(parse_number("open", "").unwrap_err().is_malformed());
        assert!(parse_number("open", "-").unwrap_err().is_malformed());
        assert!(parse_number("open", "NaN").unwrap_err().is_malformed());
    }

    #[test]
    fn required_text_rejects_blank() {
        assert_eq!(required_text("link", Some(" /a ")).unwrap(), "/a");
        assert!(required_text("link", Some("   ")).is_err());
        assert!(required_text("link", None).is_err());
    }
}
