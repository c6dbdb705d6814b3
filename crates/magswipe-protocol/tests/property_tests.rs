//! Property-based tests for track data decoding.
//!
//! These tests use proptest to generate well-formed and malformed tracks and
//! verify that the decoder's contract holds for all of them.

use magswipe_protocol::{DecodeError, TrackParser};
use proptest::prelude::*;

/// Strategy for account numbers (1-19 ASCII digits).
fn card_number() -> impl Strategy<Value = String> {
    prop::string::string_regex("[0-9]{1,19}").expect("Failed to create card number strategy")
}

/// Strategy for name components without separators or surrounding whitespace.
fn name_component() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Z][A-Z .'-]{0,12}[A-Z]|[A-Z]")
        .expect("Failed to create name strategy")
}

/// Strategy for four-digit expiry fields.
fn expiry() -> impl Strategy<Value = String> {
    prop::string::string_regex("[0-9]{4}").expect("Failed to create expiry strategy")
}

/// Strategy for noise that can never contain a start sentinel.
fn noise() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z0-9 ;=?\\t]{0,40}").expect("Failed to create noise strategy")
}

proptest! {
    /// Property: every well-formed track decodes to exactly its captured groups.
    #[test]
    fn prop_well_formed_track_decodes(
        pan in card_number(),
        last in name_component(),
        first in name_component(),
        exp in expiry(),
        prefix in noise(),
        suffix in noise(),
    ) {
        let payload = format!("{prefix}%B{pan}^{last}/{first}^{exp}{suffix}");
        let record = TrackParser::parse_str(&payload).unwrap();

        prop_assert_eq!(record.card_number(), pan.as_str());
        prop_assert_eq!(record.last_name(), last.as_str());
        prop_assert_eq!(record.first_name(), first.as_str());
        prop_assert_eq!(record.expiry_year(), &exp[0..2]);
        prop_assert_eq!(record.expiry_month(), &exp[2..4]);

        let normalized: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        prop_assert_eq!(record.raw_normalized(), normalized.as_str());
    }

    /// Property: with two tracks in one payload, only the last one is used.
    #[test]
    fn prop_last_occurrence_wins(
        first_pan in card_number(),
        second_pan in card_number(),
        second_last in name_component(),
        second_first in name_component(),
        first_exp in expiry(),
        second_exp in expiry(),
        gap in noise(),
    ) {
        let payload = format!(
            "%B{first_pan}^NOISE/NOISE^{first_exp}{gap}%B{second_pan}^{second_last}/{second_first}^{second_exp}"
        );
        let record = TrackParser::parse_str(&payload).unwrap();

        prop_assert_eq!(record.card_number(), second_pan.as_str());
        prop_assert_eq!(record.last_name(), second_last.as_str());
        prop_assert_eq!(record.first_name(), second_first.as_str());
        prop_assert_eq!(record.expiry_year(), &second_exp[0..2]);
    }

    /// Property: payloads without a start sentinel never decode.
    #[test]
    fn prop_no_sentinel_fails(payload in noise()) {
        prop_assert_eq!(TrackParser::parse_str(&payload), Err(DecodeError));
    }

    /// Property: an empty name component always fails.
    #[test]
    fn prop_empty_first_name_fails(
        pan in card_number(),
        last in name_component(),
        exp in expiry(),
    ) {
        let payload = format!("%B{pan}^{last}/^{exp}");
        prop_assert_eq!(TrackParser::parse_str(&payload), Err(DecodeError));
    }

    /// Property: arbitrary bytes never panic the decoder.
    #[test]
    fn prop_arbitrary_bytes_never_panic(payload in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = TrackParser::parse(&payload);
    }
}
