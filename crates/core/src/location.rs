//! Location normalization and coordinate validation.
//!
//! Locations are deduplicated on their normalized `city, state, country`
//! name, so "Portland , OR" and "portland, or" resolve to the same row.

/// Maximum length of each location name component.
pub const MAX_COMPONENT_LENGTH: usize = 100;

/// Build the dedup key for a location.
///
/// Components are trimmed, inner whitespace collapsed, and lowercased.
/// Empty optional components are skipped.
pub fn normalize_location(city: &str, state: Option<&str>, country: Option<&str>) -> String {
    [Some(city), state, country]
        .into_iter()
        .flatten()
        .map(collapse_whitespace)
        .filter(|part| !part.is_empty())
        .map(|part| part.to_lowercase())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Validate the name components of a location.
pub fn validate_names(
    city: &str,
    state: Option<&str>,
    country: Option<&str>,
) -> Result<(), String> {
    if city.trim().is_empty() {
        return Err("City can't be blank".into());
    }
    for (field, value) in [("city", Some(city)), ("state_province", state), ("country", country)] {
        if let Some(v) = value {
            if v.trim().chars().count() > MAX_COMPONENT_LENGTH {
                return Err(format!(
                    "{field} is too long (maximum is {MAX_COMPONENT_LENGTH} characters)"
                ));
            }
        }
    }
    Ok(())
}

/// Validate an optional latitude/longitude pair.
///
/// Both must be present together, latitude in `[-90, 90]`, longitude in
/// `[-180, 180]`.
pub fn validate_coordinates(latitude: Option<f64>, longitude: Option<f64>) -> Result<(), String> {
    match (latitude, longitude) {
        (None, None) => Ok(()),
        (Some(lat), Some(lon)) => {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(format!("latitude must be between -90 and 90, got {lat}"));
            }
            if !(-180.0..=180.0).contains(&lon) {
                return Err(format!("longitude must be between -180 and 180, got {lon}"));
            }
            Ok(())
        }
        _ => Err("latitude and longitude must be provided together".into()),
    }
}

/// Title-case a display component ("new  york" -> "New York").
pub fn display_case(value: &str) -> String {
    collapse_whitespace(value)
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_ignores_case_and_spacing() {
        let a = normalize_location("Portland ", Some(" OR"), None);
        let b = normalize_location("portland", Some("or"), Some(""));
        assert_eq!(a, "portland, or");
        assert_eq!(a, b);
    }

    #[test]
    fn normalization_includes_country() {
        assert_eq!(
            normalize_location("Saint  Paul", Some("MN"), Some("USA")),
            "saint paul, mn, usa"
        );
    }

    #[test]
    fn blank_city_is_rejected() {
        assert!(validate_names("  ", Some("OR"), None).is_err());
        assert!(validate_names("Salem", None, None).is_ok());
    }

    #[test]
    fn coordinates_must_be_paired_and_in_range() {
        assert!(validate_coordinates(None, None).is_ok());
        assert!(validate_coordinates(Some(45.5), Some(-122.6)).is_ok());
        assert!(validate_coordinates(Some(45.5), None).is_err());
        assert!(validate_coordinates(Some(91.0), Some(0.0)).is_err());
        assert!(validate_coordinates(Some(0.0), Some(-181.0)).is_err());
    }

    #[test]
    fn display_case_capitalizes_words() {
        assert_eq!(display_case("new   york"), "New York");
    }
}
