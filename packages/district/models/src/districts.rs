//! Static administrative district table.
//!
//! The 25 districts of Sri Lanka with a representative coordinate for
//! each. Table order is the canonical display and result order.

use serde::{Deserialize, Serialize};

/// `(name, latitude, longitude)` for every district, in canonical order.
const SRI_LANKA_DISTRICTS: &[(&str, f64, f64)] = &[
    ("Colombo", 6.9271, 79.8612),
    ("Gampaha", 7.0928, 79.9989),
    ("Kalutara", 6.5854, 80.0601),
    ("Kandy", 7.2906, 80.6337),
    ("Matale", 7.4675, 80.6234),
    ("Nuwara Eliya", 6.9687, 80.7839),
    ("Galle", 6.0535, 80.2210),
    ("Matara", 5.9545, 80.5568),
    ("Hambantota", 6.1245, 81.1185),
    ("Jaffna", 9.6615, 80.0255),
    ("Kilinochchi", 9.3828, 80.3996),
    ("Mannar", 8.9804, 79.9056),
    ("Vavuniya", 8.7513, 80.4984),
    ("Mullaitivu", 9.2678, 80.8143),
    ("Batticaloa", 7.7299, 81.6924),
    ("Ampara", 7.2922, 81.6749),
    ("Trincomalee", 8.5874, 81.2152),
    ("Kurunegala", 7.485, 80.3607),
    ("Puttalam", 8.0333, 79.8333),
    ("Anuradhapura", 8.3114, 80.4037),
    ("Polonnaruwa", 7.9403, 81.0188),
    ("Badulla", 6.9934, 81.0550),
    ("Moneragala", 6.873, 81.343),
    ("Ratnapura", 6.705, 80.3842),
    ("Kegalle", 7.251, 80.3464),
];

/// An administrative district and its representative coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct District {
    /// Unique, human-readable district name.
    pub name: String,
    /// Latitude (WGS84).
    pub lat: f64,
    /// Longitude (WGS84).
    pub lng: f64,
}

impl District {
    /// Creates a district entry.
    #[must_use]
    pub fn new(name: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            name: name.into(),
            lat,
            lng,
        }
    }
}

/// Returns the full district table in canonical order.
#[must_use]
pub fn sri_lanka_districts() -> Vec<District> {
    SRI_LANKA_DISTRICTS
        .iter()
        .map(|&(name, lat, lng)| District::new(name, lat, lng))
        .collect()
}

/// Looks up a district by exact name.
#[must_use]
pub fn find_district<'a>(districts: &'a [District], name: &str) -> Option<&'a District> {
    districts.iter().find(|d| d.name == name)
}
