//! Sanitization boundary for imported profiles.
//!
//! `RawProfile` declares only the allow-listed fields, so everything else in
//! the provider response (email, positions, headline, ...) is discarded while
//! decoding and can never reach storage.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawProfile {
    pub id: String,
    #[serde(rename = "firstName", default)]
    pub first_name: Option<LocalizedString>,
    #[serde(rename = "lastName", default)]
    pub last_name: Option<LocalizedString>,
    #[serde(rename = "profilePicture", default)]
    pub profile_picture: Option<RawProfilePicture>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocalizedString {
    #[serde(default)]
    pub localized: HashMap<String, String>,
    #[serde(rename = "preferredLocale", default)]
    pub preferred_locale: Option<Locale>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Locale {
    pub language: String,
    pub country: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawProfilePicture {
    #[serde(rename = "displayImage", default)]
    pub display_image: Option<String>,
}

impl LocalizedString {
    /// `en_US` first, then the member's preferred locale, then any value.
    pub fn best(&self) -> Option<&str> {
        let preferred = self
            .preferred_locale
            .as_ref()
            .map(|l| format!("{}_{}", l.language, l.country));

        self.localized
            .get("en_US")
            .or_else(|| preferred.and_then(|key| self.localized.get(&key)))
            .or_else(|| {
                let mut keys: Vec<&String> = self.localized.keys().collect();
                keys.sort();
                keys.first().and_then(|k| self.localized.get(*k))
            })
            .map(String::as_str)
    }
}

/// The only profile shape that is persisted or returned to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SanitizedProfile {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub profile_picture: Option<String>,
}

impl From<RawProfile> for SanitizedProfile {
    fn from(raw: RawProfile) -> Self {
        let name = |field: &Option<LocalizedString>| {
            field
                .as_ref()
                .and_then(LocalizedString::best)
                .unwrap_or_default()
                .to_string()
        };

        Self {
            first_name: name(&raw.first_name),
            last_name: name(&raw.last_name),
            profile_picture: raw.profile_picture.and_then(|p| p.display_image),
            id: raw.id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn provider_response() -> serde_json::Value {
        json!({
            "id": "abc123",
            "firstName": {
                "localized": {"en_US": "Ana", "fr_FR": "Anne"},
                "preferredLocale": {"country": "US", "language": "en"}
            },
            "lastName": {
                "localized": {"en_US": "Silva"},
                "preferredLocale": {"country": "US", "language": "en"}
            },
            "profilePicture": {
                "displayImage": "urn:li:digitalmediaAsset:C4D03AQ",
                "displayImage~": {"elements": [{"identifiers": [{"identifier": "https://media"}]}]}
            },
            "emailAddress": "ana@example.com",
            "positions": {"values": [{"title": "CTO", "company": {"name": "Acme"}}]},
            "headline": "Engineering leader"
        })
    }

    #[test]
    fn test_sanitized_profile_keeps_only_allow_listed_fields() {
        let raw: RawProfile = serde_json::from_value(provider_response()).unwrap();
        let sanitized = SanitizedProfile::from(raw);

        let stored = serde_json::to_value(&sanitized).unwrap();
        let keys: Vec<&String> = stored.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 4);
        for key in ["id", "firstName", "lastName", "profilePicture"] {
            assert!(stored.get(key).is_some(), "missing {key}");
        }
        assert!(!stored.to_string().contains("ana@example.com"));
        assert!(!stored.to_string().contains("Acme"));

        assert_eq!(sanitized.first_name, "Ana");
        assert_eq!(sanitized.last_name, "Silva");
        assert_eq!(
            sanitized.profile_picture.as_deref(),
            Some("urn:li:digitalmediaAsset:C4D03AQ")
        );
    }

    #[test]
    fn test_missing_names_become_empty_strings() {
        let raw: RawProfile = serde_json::from_value(json!({"id": "x"})).unwrap();
        let sanitized = SanitizedProfile::from(raw);
        assert_eq!(sanitized.first_name, "");
        assert_eq!(sanitized.last_name, "");
        assert!(sanitized.profile_picture.is_none());
    }

    #[test]
    fn test_preferred_locale_used_without_en_us() {
        let raw: RawProfile = serde_json::from_value(json!({
            "id": "x",
            "firstName": {
                "localized": {"de_DE": "Jürgen", "fr_FR": "Georges"},
                "preferredLocale": {"country": "FR", "language": "fr"}
            }
        }))
        .unwrap();
        assert_eq!(SanitizedProfile::from(raw).first_name, "Georges");
    }

    #[test]
    fn test_any_locale_used_as_last_resort() {
        let raw: RawProfile = serde_json::from_value(json!({
            "id": "x",
            "lastName": {"localized": {"es_ES": "García"}}
        }))
        .unwrap();
        assert_eq!(SanitizedProfile::from(raw).last_name, "García");
    }
}
