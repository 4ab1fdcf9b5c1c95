// ABOUTME: Loader for the built-in poedb extraction profile embedded as JSON.
// ABOUTME: Provides load_builtin_profile() used as the default for extractors and binaries.

use crate::extractors::profile::PopupProfile;

/// Embedded JSON describing the poedb item popup layout.
const BUILTIN_PROFILE_JSON: &str = include_str!("../../data/poedb_popup.json");

/// Loads the built-in poedb profile.
///
/// # Panics
///
/// Panics if the embedded JSON is malformed.
pub fn load_builtin_profile() -> PopupProfile {
    PopupProfile::from_json_str(BUILTIN_PROFILE_JSON).expect("failed to parse builtin profile")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::popup::PopupExtractor;

    #[test]
    fn builtin_profile_loads() {
        let profile = load_builtin_profile();
        assert_eq!(profile.name, "poedb");
        assert_eq!(
            profile.popup,
            vec!["div.newItemPopup.currencyPopup", "div.newItemPopup"]
        );
        assert_eq!(profile.image_search_depth, 6);
        assert_eq!(profile.expected_property_fields, Some(3));
    }

    #[test]
    fn builtin_profile_compiles() {
        assert!(PopupExtractor::new(load_builtin_profile()).is_ok());
    }
}
