use serde::{Deserialize, Serialize};

/// Sentinel used wherever the visitor's IP has not been resolved.
pub const UNKNOWN_IP: &str = "unknown";

/// Result of the IP-geolocation lookup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoInfo {
    pub ip: String,
    #[serde(default)]
    pub country_name: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
}

/// One entry of the location autosuggest dropdown.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceSuggestion {
    #[serde(alias = "name")]
    pub display_name: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub hierarchy: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::{GeoInfo, PlaceSuggestion};

    #[test]
    fn geo_info_tolerates_missing_country_fields() {
        let geo: GeoInfo = serde_json::from_str(r#"{"ip":"203.0.113.9","city":"Pune"}"#)
            .expect("decode geo payload");
        assert_eq!(geo.ip, "203.0.113.9");
        assert_eq!(geo.country_code, None);
    }

    #[test]
    fn suggestion_accepts_name_alias_and_type_tag() {
        let place: PlaceSuggestion = serde_json::from_str(
            r#"{"name":"Jaipur","type":"city","hierarchy":"Rajasthan, India","id":"in-jai"}"#,
        )
        .expect("decode place");
        assert_eq!(place.display_name, "Jaipur");
        assert_eq!(place.kind.as_deref(), Some("city"));
        assert_eq!(place.hierarchy.as_deref(), Some("Rajasthan, India"));
    }
}
