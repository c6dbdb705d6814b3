//! Shared constants for the magswipe reader stack.
//!
//! This module centralizes the values that several crates must agree on:
//! the fixed swipe timeout handed to the driver, the name of the vendor
//! configuration file, the event names reported to the application, and
//! the persisted keys of an auto-config profile.
//!
//! # Usage
//!
//! ```
//! use magswipe_core::constants::*;
//! use std::time::Duration;
//!
//! let timeout = Duration::from_secs(u64::from(SWIPE_TIMEOUT_SECS));
//! assert_eq!(timeout.as_secs(), 30);
//! assert_eq!(PROFILE_PRESENCE_KEY, "frequence_input");
//! ```

// ============================================================================
// Driver
// ============================================================================

/// Seconds the driver waits for a card after a swipe is armed.
///
/// The value is fixed; the driver enforces it and reports expiry through a
/// timeout notification.
pub const SWIPE_TIMEOUT_SECS: u16 = 30;

/// File name of the vendor device-configuration file.
pub const CONFIG_FILE_NAME: &str = "IDT_uniMagCfg.xml";

// ============================================================================
// Event names
// ============================================================================

/// Driver started powering up the reader.
pub const EVENT_CONNECTING: &str = "connecting";

/// Reader link is up; swipes may be requested.
pub const EVENT_CONNECTED: &str = "connected";

/// Reader link went down (reported or synthesized).
pub const EVENT_DISCONNECTED: &str = "disconnected";

/// Driver detected signal after a swipe was armed.
pub const EVENT_SWIPE_PROCESSING: &str = "swipe_processing";

/// Track data was decoded into a card record.
pub const EVENT_SWIPE_SUCCESS: &str = "swipe_success";

/// Track data could not be decoded.
pub const EVENT_SWIPE_ERROR: &str = "swipe_error";

/// Driver wait expired outside of auto-config.
pub const EVENT_TIMEOUT: &str = "timeout";

/// Auto-config produced a profile that was saved.
pub const EVENT_AUTOCONFIG_COMPLETED: &str = "autoconfig_completed";

/// Auto-config timed out or its profile could not be saved.
pub const EVENT_AUTOCONFIG_ERROR: &str = "autoconfig_error";

/// Driver could not load or fetch its configuration.
pub const EVENT_XML_ERROR: &str = "xml_error";

// ============================================================================
// Fixed messages
// ============================================================================

/// Reported with `autoconfig_error` when the discovered profile was not saved.
pub const MSG_PROFILE_SAVE_FAILED: &str = "Failed to save profile.";

// ============================================================================
// Profile persistence keys
// ============================================================================

/// Key whose non-zero value marks a persisted profile as present.
pub const PROFILE_PRESENCE_KEY: &str = "frequence_input";

/// Persisted keys of every profile parameter, in storage order.
///
/// These names are part of the persisted format and must not change.
pub const PROFILE_KEYS: [&str; 16] = [
    "direction_output_wave",
    "frequence_input",
    "frequence_output",
    "record_buffer_size",
    "record_read_buffer_size",
    "wave_direction",
    "high_threshold",
    "low_threshold",
    "min",
    "max",
    "baud_rate",
    "pre_amble_factor",
    "shuttle_channel",
    "force_headset_plug",
    "use_voice_recognition",
    "volume_level_adjust",
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_profile_keys_unique() {
        let keys: HashSet<_> = PROFILE_KEYS.iter().collect();
        assert_eq!(keys.len(), PROFILE_KEYS.len());
    }

    #[test]
    fn test_presence_key_is_profile_key() {
        assert!(PROFILE_KEYS.contains(&PROFILE_PRESENCE_KEY));
    }
}
