use crate::CatalogError;
use crate::location::Location;

// (id, display name, lat, lng, description)
const DEFAULT_SEED: [(&str, &str, f64, f64, &str); 6] = [
    ("delhi", "Delhi", 28.6139, 77.209, "Capital of India"),
    ("mumbai", "Mumbai", 19.076, 72.8777, "Financial hub of India"),
    ("bengaluru", "Bengaluru", 12.9716, 77.5946, "Tech capital of India"),
    ("hyderabad", "Hyderabad", 17.385, 78.4867, "Pearl city of India"),
    ("goa", "Goa", 15.2993, 73.8243, "Beach paradise"),
    ("jaipur", "Jaipur", 26.9124, 75.7873, "Pink city of India"),
];

/// The six locations the widget starts with.
pub fn default_locations() -> Vec<Location> {
    DEFAULT_SEED
        .iter()
        .map(|&(id, name, lat, lng, info)| Location {
            id: id.into(),
            display_name: name.to_string(),
            lat,
            lng,
            description: info.to_string(),
        })
        .collect()
}

/// Parses a JSON array of locations (the `--seed` file format of the CLI).
pub fn locations_from_json(raw: &str) -> Result<Vec<Location>, CatalogError> {
    serde_json::from_str(raw).map_err(|e| CatalogError::Corrupt(e.to_string()))
}
