//! Track data parser.
//!
//! This module decodes the text the reader driver produced from a swipe into
//! a [`CardRecord`].
//!
//! # Track Format
//!
//! Only the leading part of track 1 is read:
//!
//! ```text
//! %B<PAN>^<LAST>/<FIRST>^<YYMM>...
//! ```
//!
//! Where:
//! - `%B`: Start sentinel and format code
//! - `PAN`: Primary account number, one or more ASCII digits
//! - `^`: Field separator
//! - `LAST/FIRST`: Cardholder name; surrounding whitespace is trimmed
//! - `YYMM`: Four-digit expiry, year first
//!
//! Anything after the expiry (service code, discretionary data, end
//! sentinel, track 2) is ignored.
//!
//! # Noisy Input
//!
//! Audio-jack readers often deliver garbage ahead of the real track. The
//! whole payload is scanned and the **last** match wins, so leading noise
//! that happens to look like a track is overridden by the real one.
//!
//! # Examples
//!
//! ```
//! use magswipe_protocol::TrackParser;
//!
//! let record = TrackParser::parse(b"%B4111111111111111^DOE/JOHN^2505123").unwrap();
//!
//! assert_eq!(record.card_number(), "4111111111111111");
//! assert_eq!(record.last_name(), "DOE");
//! assert_eq!(record.first_name(), "JOHN");
//! assert_eq!(record.expiry_month(), "05");
//! assert_eq!(record.expiry_year(), "25");
//!
//! assert!(TrackParser::parse(b"no track here").is_err());
//! ```

use crate::record::CardRecord;
use regex::Regex;
use std::sync::LazyLock;

/// `%B`, PAN, `^`, name, `^`, expiry. Digits are ASCII only.
static TRACK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"%B([0-9]+)\^([^\^]+)\^([0-9]{4})").expect("track pattern is a valid regex")
});

/// Track data did not contain a complete cardholder record.
///
/// The cause is deliberately not classified further.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("track data did not match the expected format")]
pub struct DecodeError;

/// Stateless decoder for swiped track data.
pub struct TrackParser;

impl TrackParser {
    /// Decode raw payload bytes from the driver.
    ///
    /// Bytes that are not valid UTF-8 are replaced before matching; they can
    /// only ever be noise around the track.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if no occurrence of the track pattern is found
    /// or if the last occurrence has an empty account number, last name,
    /// first name or expiry.
    pub fn parse(payload: &[u8]) -> Result<CardRecord, DecodeError> {
        Self::parse_str(&String::from_utf8_lossy(payload))
    }

    /// Decode a payload that is already text.
    ///
    /// # Errors
    ///
    /// Same as [`parse`](Self::parse).
    ///
    /// # Examples
    ///
    /// ```
    /// use magswipe_protocol::TrackParser;
    ///
    /// // Leading garbage that looks like a track is overridden by the last match
    /// let record = TrackParser::parse_str("%B1^A/B^9901 noise %B5500^SMITH/ANN^3012").unwrap();
    /// assert_eq!(record.card_number(), "5500");
    /// assert_eq!(record.first_name(), "ANN");
    /// ```
    pub fn parse_str(data: &str) -> Result<CardRecord, DecodeError> {
        let captures = TRACK_PATTERN
            .captures_iter(data)
            .last()
            .ok_or(DecodeError)?;

        let card_number = captures.get(1).map_or("", |m| m.as_str());
        let name = captures.get(2).map_or("", |m| m.as_str());
        let expiry = captures.get(3).map_or("", |m| m.as_str());

        let mut name_parts = name.split('/');
        let last_name = name_parts.next().unwrap_or("").trim();
        let first_name = name_parts.next().unwrap_or("").trim();

        if card_number.is_empty()
            || last_name.is_empty()
            || first_name.is_empty()
            || expiry.len() != 4
        {
            return Err(DecodeError);
        }

        Ok(CardRecord::new(
            card_number.to_string(),
            last_name.to_string(),
            first_name.to_string(),
            expiry,
            normalize(data),
        ))
    }
}

/// Remove every whitespace character.
fn normalize(data: &str) -> String {
    data.chars().filter(|c| !c.is_whitespace()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_parse_reference_track() {
        let record = TrackParser::parse_str("%B4111111111111111^DOE/JOHN^2505123").unwrap();

        assert_eq!(record.card_number(), "4111111111111111");
        assert_eq!(record.last_name(), "DOE");
        assert_eq!(record.first_name(), "JOHN");
        assert_eq!(record.expiry_month(), "05");
        assert_eq!(record.expiry_year(), "25");
        assert_eq!(record.raw_normalized(), "%B4111111111111111^DOE/JOHN^2505123");
    }

    #[test]
    fn test_parse_full_track_with_sentinels() {
        let payload =
            "%B5454545454545454^SMITH/JANE M     ^2812101000000000000000000?;5454545454545454=28121010000000000000?";
        let record = TrackParser::parse_str(payload).unwrap();

        assert_eq!(record.card_number(), "5454545454545454");
        assert_eq!(record.last_name(), "SMITH");
        assert_eq!(record.first_name(), "JANE M");
        assert_eq!(record.expiry_year(), "28");
        assert_eq!(record.expiry_month(), "12");
    }

    #[test]
    fn test_parse_trims_name_components() {
        let record = TrackParser::parse_str("%B123^  DOE  /  JOHN  ^2505").unwrap();
        assert_eq!(record.last_name(), "DOE");
        assert_eq!(record.first_name(), "JOHN");
    }

    #[test]
    fn test_parse_last_match_wins() {
        let payload = "%B1111^FIRST/MATCH^2001 junk %B2222^SECOND/MATCH^3002";
        let record = TrackParser::parse_str(payload).unwrap();

        assert_eq!(record.card_number(), "2222");
        assert_eq!(record.last_name(), "SECOND");
        assert_eq!(record.expiry_year(), "30");
        assert_eq!(record.expiry_month(), "02");
    }

    #[test]
    fn test_parse_tolerates_leading_noise() {
        let record = TrackParser::parse_str("\u{1}\u{7f}%%BB??%B4000^ROE/RICHARD^2711").unwrap();
        assert_eq!(record.card_number(), "4000");
    }

    #[test]
    fn test_parse_invalid_utf8_noise() {
        let mut payload = vec![0xFF, 0xFE, 0x00];
        payload.extend_from_slice(b"%B4000^ROE/RICHARD^2711");

        let record = TrackParser::parse(&payload).unwrap();
        assert_eq!(record.card_number(), "4000");
    }

    #[test]
    fn test_parse_normalizes_whitespace() {
        let record = TrackParser::parse_str(" %B4000^ROE/RICHARD^2711 \r\n\t;4000=2711? ").unwrap();
        assert_eq!(record.raw_normalized(), "%B4000^ROE/RICHARD^2711;4000=2711?");
    }

    #[test]
    fn test_parse_extra_name_separators_use_first_two() {
        let record = TrackParser::parse_str("%B4000^ROE/RICHARD/III^2711").unwrap();
        assert_eq!(record.last_name(), "ROE");
        assert_eq!(record.first_name(), "RICHARD");
    }

    #[rstest]
    #[case::empty("")]
    #[case::no_sentinel("4111111111111111^DOE/JOHN^2505")]
    #[case::empty_pan("garbage%B^X/Y^0000")]
    #[case::non_digit_pan("%B41A1^DOE/JOHN^2505")]
    #[case::short_expiry("%B4111^DOE/JOHN^255")]
    #[case::missing_first_name("%B4111^DOE^2505")]
    #[case::empty_first_name("%B4111^DOE/^2505")]
    #[case::blank_first_name("%B4111^DOE/   ^2505")]
    #[case::empty_last_name("%B4111^/JOHN^2505")]
    #[case::empty_name("%B4111^^2505")]
    #[case::track_two_only(";4111111111111111=25051010000000000000?")]
    fn test_parse_rejects(#[case] payload: &str) {
        assert_eq!(TrackParser::parse_str(payload), Err(DecodeError));
    }

    #[test]
    fn test_parse_last_occurrence_decides_failure() {
        // A valid first match does not rescue an invalid last one
        let payload = "%B4111^DOE/JOHN^2505 %B4222^NOBODY^2505";
        assert_eq!(TrackParser::parse_str(payload), Err(DecodeError));
    }

    #[test]
    fn test_parse_unicode_digits_rejected() {
        assert!(TrackParser::parse_str("%B٤١١١^DOE/JOHN^2505").is_err());
    }
}
