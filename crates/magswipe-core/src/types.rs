use crate::{
    Result,
    constants::{PROFILE_KEYS, PROFILE_PRESENCE_KEY},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Hardware family hint handed to the driver when it is (re)opened.
///
/// The hint narrows the driver's device detection. It never implies that a
/// reader is connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReaderKind {
    /// UniMag (original model).
    #[serde(rename = "UM")]
    UniMag,

    /// UniMag Pro.
    #[serde(rename = "UM_PRO")]
    UniMagPro,

    /// UniMag II.
    #[serde(rename = "UM_II")]
    UniMagII,

    /// Shuttle.
    #[serde(rename = "SHUTTLE")]
    Shuttle,
}

impl ReaderKind {
    /// All supported reader kinds.
    pub const ALL: [ReaderKind; 4] = [
        ReaderKind::UniMag,
        ReaderKind::UniMagPro,
        ReaderKind::UniMagII,
        ReaderKind::Shuttle,
    ];

    /// Vendor enumeration name for this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ReaderKind::UniMag => "UM",
            ReaderKind::UniMagPro => "UM_PRO",
            ReaderKind::UniMagII => "UM_II",
            ReaderKind::Shuttle => "SHUTTLE",
        }
    }

    fn alias(&self) -> &'static str {
        match self {
            ReaderKind::UniMag => "unimag",
            ReaderKind::UniMagPro => "unimag_pro",
            ReaderKind::UniMagII => "unimag_ii",
            ReaderKind::Shuttle => "shuttle",
        }
    }
}

impl fmt::Display for ReaderKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReaderKind {
    type Err = Error;

    /// Parse a vendor name (`UM_PRO`) or its lowercase alias (`unimag_pro`).
    ///
    /// # Errors
    /// Returns `Error::InvalidReaderKind` for anything else.
    fn from_str(s: &str) -> Result<Self> {
        ReaderKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s || kind.alias() == s)
            .ok_or_else(|| Error::InvalidReaderKind(s.to_string()))
    }
}

/// Tuning parameters discovered by the driver's auto-config routine.
///
/// The values are opaque to this crate: they are produced by the driver,
/// persisted verbatim and handed back to the driver when opening a reader
/// on an otherwise unsupported phone.
///
/// # Persisted form
///
/// A profile is persisted as sixteen integer key/value pairs (see
/// [`PROFILE_KEYS`]). A profile is considered present only when
/// [`PROFILE_PRESENCE_KEY`] holds a non-zero value; see
/// [`ConfigProfile::from_parameters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigProfile {
    pub direction_output_wave: i16,
    pub input_frequency: i32,
    pub output_frequency: i32,
    pub record_buffer_size: i32,
    pub record_read_buffer_size: i32,
    pub wave_direction: i32,
    pub high_threshold: i16,
    pub low_threshold: i16,
    pub min_level: i16,
    pub max_level: i16,
    pub baud_rate: i32,
    pub preamble_factor: i16,
    pub shuttle_channel: u8,
    pub force_headset_plug: i16,
    pub use_voice_recognition: i16,
    pub volume_level_adjust: i16,
}

impl ConfigProfile {
    /// Flatten the profile into its persisted key/value pairs.
    ///
    /// Keys follow [`PROFILE_KEYS`] order.
    ///
    /// # Examples
    ///
    /// ```
    /// use magswipe_core::ConfigProfile;
    ///
    /// let profile = ConfigProfile { input_frequency: 4800, ..Default::default() };
    /// let params = profile.to_parameters();
    /// assert_eq!(params[1], ("frequence_input", 4800));
    /// ```
    #[must_use]
    pub fn to_parameters(&self) -> [(&'static str, i64); 16] {
        let values = [
            i64::from(self.direction_output_wave),
            i64::from(self.input_frequency),
            i64::from(self.output_frequency),
            i64::from(self.record_buffer_size),
            i64::from(self.record_read_buffer_size),
            i64::from(self.wave_direction),
            i64::from(self.high_threshold),
            i64::from(self.low_threshold),
            i64::from(self.min_level),
            i64::from(self.max_level),
            i64::from(self.baud_rate),
            i64::from(self.preamble_factor),
            i64::from(self.shuttle_channel),
            i64::from(self.force_headset_plug),
            i64::from(self.use_voice_recognition),
            i64::from(self.volume_level_adjust),
        ];

        let mut params = [("", 0_i64); 16];
        for (slot, (key, value)) in params.iter_mut().zip(PROFILE_KEYS.into_iter().zip(values)) {
            *slot = (key, value);
        }
        params
    }

    /// Rebuild a profile from persisted key/value pairs.
    ///
    /// `lookup` returns the stored value of a key, if any. Every missing key
    /// falls back to zero independently. Returns `None` when the presence key
    /// is missing or zero, which also covers a corrupted store whose sentinel
    /// reads back as zero.
    ///
    /// Values are narrowed to their field width the same way they were
    /// widened by [`to_parameters`](Self::to_parameters), so a saved profile
    /// reads back unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use magswipe_core::ConfigProfile;
    /// use std::collections::HashMap;
    ///
    /// let stored: HashMap<&str, i64> = HashMap::from([("frequence_input", 4800), ("baud_rate", 9600)]);
    /// let profile = ConfigProfile::from_parameters(|key| stored.get(key).copied()).unwrap();
    /// assert_eq!(profile.baud_rate, 9600);
    /// assert_eq!(profile.min_level, 0);
    ///
    /// assert!(ConfigProfile::from_parameters(|_| None).is_none());
    /// ```
    pub fn from_parameters<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<i64>,
    {
        let get = |key: &str| lookup(key).unwrap_or(0);

        if get(PROFILE_PRESENCE_KEY) == 0 {
            return None;
        }

        Some(Self {
            direction_output_wave: get("direction_output_wave") as i16,
            input_frequency: get("frequence_input") as i32,
            output_frequency: get("frequence_output") as i32,
            record_buffer_size: get("record_buffer_size") as i32,
            record_read_buffer_size: get("record_read_buffer_size") as i32,
            wave_direction: get("wave_direction") as i32,
            high_threshold: get("high_threshold") as i16,
            low_threshold: get("low_threshold") as i16,
            min_level: get("min") as i16,
            max_level: get("max") as i16,
            baud_rate: get("baud_rate") as i32,
            preamble_factor: get("pre_amble_factor") as i16,
            shuttle_channel: get("shuttle_channel") as u8,
            force_headset_plug: get("force_headset_plug") as i16,
            use_voice_recognition: get("use_voice_recognition") as i16,
            volume_level_adjust: get("volume_level_adjust") as i16,
        })
    }

    /// Whether this profile would be recognized as present once persisted.
    #[must_use]
    pub fn is_persistable(&self) -> bool {
        self.input_frequency != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;
    use std::str::FromStr;

    fn sample_profile() -> ConfigProfile {
        ConfigProfile {
            direction_output_wave: -1,
            input_frequency: 4800,
            output_frequency: 48000,
            record_buffer_size: 4096,
            record_read_buffer_size: 2048,
            wave_direction: 1,
            high_threshold: 210,
            low_threshold: -210,
            min_level: 60,
            max_level: 20,
            baud_rate: 9600,
            preamble_factor: 2,
            shuttle_channel: 0xF1,
            force_headset_plug: 1,
            use_voice_recognition: 0,
            volume_level_adjust: -3,
        }
    }

    #[rstest]
    #[case("UM", ReaderKind::UniMag)]
    #[case("UM_PRO", ReaderKind::UniMagPro)]
    #[case("UM_II", ReaderKind::UniMagII)]
    #[case("SHUTTLE", ReaderKind::Shuttle)]
    #[case("unimag", ReaderKind::UniMag)]
    #[case("unimag_pro", ReaderKind::UniMagPro)]
    #[case("unimag_ii", ReaderKind::UniMagII)]
    #[case("shuttle", ReaderKind::Shuttle)]
    fn test_reader_kind_parse(#[case] input: &str, #[case] expected: ReaderKind) {
        assert_eq!(ReaderKind::from_str(input).unwrap(), expected);
    }

    #[rstest]
    #[case("bogus")]
    #[case("")]
    #[case("um")]
    #[case(" UM")]
    fn test_reader_kind_rejects_unknown(#[case] input: &str) {
        let err = ReaderKind::from_str(input).unwrap_err();
        assert_eq!(err, Error::InvalidReaderKind(input.to_string()));
    }

    #[test]
    fn test_reader_kind_display_matches_vendor_name() {
        for kind in ReaderKind::ALL {
            assert_eq!(kind.to_string(), kind.as_str());
            assert_eq!(ReaderKind::from_str(&kind.to_string()).unwrap(), kind);
        }
    }

    #[test]
    fn test_reader_kind_serialization() {
        let json = serde_json::to_string(&ReaderKind::UniMagPro).unwrap();
        assert_eq!(json, "\"UM_PRO\"");
    }

    #[test]
    fn test_profile_parameters_roundtrip() {
        let profile = sample_profile();
        let stored: HashMap<&str, i64> = profile.to_parameters().into_iter().collect();

        let restored = ConfigProfile::from_parameters(|key| stored.get(key).copied()).unwrap();
        assert_eq!(restored, profile);
    }

    #[test]
    fn test_profile_shuttle_channel_stored_unsigned() {
        let params = sample_profile().to_parameters();
        let (key, value) = params[12];
        assert_eq!(key, "shuttle_channel");
        assert_eq!(value, 0xF1);
    }

    #[test]
    fn test_profile_zero_sentinel_reads_as_absent() {
        let mut stored: HashMap<&str, i64> = sample_profile().to_parameters().into_iter().collect();
        stored.insert(PROFILE_PRESENCE_KEY, 0);

        assert!(ConfigProfile::from_parameters(|key| stored.get(key).copied()).is_none());
    }

    #[test]
    fn test_profile_missing_fields_default_to_zero() {
        let stored: HashMap<&str, i64> = HashMap::from([(PROFILE_PRESENCE_KEY, 1)]);
        let profile = ConfigProfile::from_parameters(|key| stored.get(key).copied()).unwrap();

        assert_eq!(
            profile,
            ConfigProfile {
                input_frequency: 1,
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_profile_is_persistable() {
        assert!(sample_profile().is_persistable());
        assert!(!ConfigProfile::default().is_persistable());
    }
}
