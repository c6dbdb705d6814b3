//! Decoded card record.

use serde::Serialize;
use std::fmt;

/// Cardholder fields decoded from one swipe.
///
/// Records are only built by [`TrackParser`](crate::TrackParser) and are
/// immutable afterwards; all fields are exposed through accessors.
///
/// # Serialization
///
/// The record serializes to the JSON object delivered with the
/// `swipe_success` event:
///
/// ```text
/// {"card_number":"4111111111111111","expiry_month":"05","expiry_year":"25",
///  "first_name":"JOHN","last_name":"DOE","trimmedUnimagData":"%B4111..."}
/// ```
///
/// # Debug output
///
/// `Debug` masks the account number so records can be logged without
/// exposing it.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct CardRecord {
    card_number: String,
    expiry_month: String,
    expiry_year: String,
    first_name: String,
    last_name: String,
    #[serde(rename = "trimmedUnimagData")]
    raw_normalized: String,
}

impl CardRecord {
    pub(crate) fn new(
        card_number: String,
        last_name: String,
        first_name: String,
        expiry: &str,
        raw_normalized: String,
    ) -> Self {
        Self {
            card_number,
            expiry_month: expiry[2..4].to_string(),
            expiry_year: expiry[0..2].to_string(),
            first_name,
            last_name,
            raw_normalized,
        }
    }

    /// Primary account number (digits only).
    pub fn card_number(&self) -> &str {
        &self.card_number
    }

    /// Cardholder first name, trimmed.
    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    /// Cardholder last name, trimmed.
    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    /// Two-digit expiry month (`MM`).
    pub fn expiry_month(&self) -> &str {
        &self.expiry_month
    }

    /// Two-digit expiry year (`YY`).
    pub fn expiry_year(&self) -> &str {
        &self.expiry_year
    }

    /// Original payload with every whitespace character removed.
    pub fn raw_normalized(&self) -> &str {
        &self.raw_normalized
    }

    /// Account number with all but the first six and last four digits masked.
    ///
    /// Numbers of ten digits or fewer are masked entirely.
    ///
    /// # Examples
    ///
    /// ```
    /// use magswipe_protocol::TrackParser;
    ///
    /// let record = TrackParser::parse_str("%B4111111111111111^DOE/JOHN^2505").unwrap();
    /// assert_eq!(record.masked_card_number(), "411111******1111");
    /// ```
    pub fn masked_card_number(&self) -> String {
        let len = self.card_number.len();
        if len <= 10 {
            return "*".repeat(len);
        }
        format!(
            "{}{}{}",
            &self.card_number[..6],
            "*".repeat(len - 10),
            &self.card_number[len - 4..]
        )
    }

    /// Serialize the record as the JSON payload of a `swipe_success` event.
    ///
    /// # Errors
    /// Returns an error only if serialization itself fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl fmt::Debug for CardRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardRecord")
            .field("card_number", &self.masked_card_number())
            .field("expiry_month", &self.expiry_month)
            .field("expiry_year", &self.expiry_year)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .finish_non_exhaustive()
    }
}
