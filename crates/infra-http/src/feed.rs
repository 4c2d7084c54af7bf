// Wait-info feed parsing
//
// The feed body is three `|`-separated fields: an unused leading field, the
// current ticket number and the waiting count. Either number may be
// placeholder text, which maps to `None` here and never leaves this crate as text.

use ticketwatch_core::domain::QueueStatus;
use ticketwatch_core::port::FetchError;

const FIELD_SEPARATOR: char = '|';
const EXPECTED_FIELDS: usize = 3;

/// Parse a raw feed body into a [`QueueStatus`]
///
/// # Errors
/// - FetchError::Malformed if the body does not have exactly three fields
pub fn parse_feed(body: &str) -> Result<QueueStatus, FetchError> {
    let parts: Vec<&str> = body.trim().split(FIELD_SEPARATOR).collect();
    if parts.len() != EXPECTED_FIELDS {
        return Err(FetchError::Malformed(format!(
            "expected {} parts, got {}",
            EXPECTED_FIELDS,
            parts.len()
        )));
    }

    Ok(QueueStatus::new(
        parse_number(parts[1]),
        parse_number(parts[2]),
    ))
}

fn parse_number(field: &str) -> Option<i64> {
    field.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numeric_fields() {
        let status = parse_feed("x|95|12").unwrap();
        assert_eq!(status.current_number(), Some(95));
        assert_eq!(status.waiting_count(), Some(12));
    }

    #[test]
    fn test_placeholder_current_number() {
        let status = parse_feed("x|----|7").unwrap();
        assert_eq!(status.current_number(), None);
        assert_eq!(status.waiting_count(), Some(7));
    }

    #[test]
    fn test_both_fields_placeholder() {
        let status = parse_feed("|----|----\r\n").unwrap();
        assert_eq!(status, QueueStatus::new(None, None));
    }

    #[test]
    fn test_whitespace_is_tolerated() {
        let status = parse_feed("  a| 103 | 4 \n").unwrap();
        assert_eq!(status.current_number(), Some(103));
        assert_eq!(status.waiting_count(), Some(4));
    }

    #[test]
    fn test_wrong_field_count() {
        assert_eq!(
            parse_feed("95|12"),
            Err(FetchError::Malformed("expected 3 parts, got 2".to_string()))
        );
        assert!(matches!(parse_feed("a|1|2|3"), Err(FetchError::Malformed(_))));
        assert!(matches!(parse_feed(""), Err(FetchError::Malformed(_))));
    }
}
