use epo::config::Preferences;

use crate::prefs::{encode_preferences, parse_preferences, PREFERENCES_STORAGE_KEY};

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window().and_then(|w| w.local_storage().ok().flatten())
}

pub(super) fn local_storage_get_string(key: &str) -> Option<String> {
    local_storage().and_then(|s| s.get_item(key).ok().flatten())
}

pub(super) fn local_storage_set_string(key: &str, value: &str) {
    if let Some(s) = local_storage() {
        let _ = s.set_item(key, value);
    }
}

pub(super) fn load_preferences() -> Preferences {
    parse_preferences(local_storage_get_string(PREFERENCES_STORAGE_KEY).as_deref())
}

pub(super) fn save_preferences(prefs: &Preferences) {
    if let Some(raw) = encode_preferences(prefs) {
        local_storage_set_string(PREFERENCES_STORAGE_KEY, &raw);
    }
}
