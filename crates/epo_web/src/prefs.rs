//! Decoding of the persisted preference record.

use epo::config::Preferences;
use tracing::warn;

pub use epo::config::PREFERENCES_STORAGE_KEY;

/// Preferences from a stored JSON string. Missing or malformed records give
/// the defaults.
pub fn parse_preferences(raw: Option<&str>) -> Preferences {
    let Some(raw) = raw else {
        return Preferences::default();
    };
    Preferences::from_json(raw).unwrap_or_else(|e| {
        warn!("ignoring stored preferences: {e}");
        Preferences::default()
    })
}

pub fn encode_preferences(prefs: &Preferences) -> Option<String> {
    prefs.to_json().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use epo::config::PerformanceProfile;

    #[test]
    fn stored_record_round_trips_and_tolerates_garbage() {
        let prefs = Preferences::default()
            .with_performance(PerformanceProfile::Low)
            .with_reduced_motion(true);
        let raw = encode_preferences(&prefs).expect("encodes");
        assert_eq!(parse_preferences(Some(&raw)), prefs);
        assert_eq!(parse_preferences(Some("{not json")), Preferences::default());
        assert_eq!(parse_preferences(None), Preferences::default());
        assert_eq!(PREFERENCES_STORAGE_KEY, "epo-user-preferences");
    }
}
