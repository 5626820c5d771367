//! Local catalog of waste collection centers.
//!
//! Centers carry a precomputed `distance_km` (as published in the catalog)
//! and coordinates; [`CollectionCenter::distance_from`] recomputes the
//! great-circle distance from an arbitrary location.

use crate::models::CenterSettings;
use serde::Serialize;

const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoLocation {
    pub lat: f64,
    pub lng: f64,
}

impl GeoLocation {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Haversine distance in kilometres.
    pub fn distance_km(&self, other: &GeoLocation) -> f64 {
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lng = (other.lng - self.lng).to_radians();
        let a = (d_lat / 2.0).sin().powi(2)
            + self.lat.to_radians().cos() * other.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
    }
}

impl From<&CenterSettings> for GeoLocation {
    fn from(settings: &CenterSettings) -> Self {
        Self::new(settings.default_latitude, settings.default_longitude)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionCenter {
    pub id: &'static str,
    pub name: &'static str,
    pub address: &'static str,
    pub distance_km: f64,
    pub rating: f64,
    pub phone: &'static str,
    pub hours: &'static str,
    pub types: &'static [&'static str],
    pub location: GeoLocation,
}

impl CollectionCenter {
    pub fn accepts(&self, category: &str) -> bool {
        let category = category.trim();
        self.types.iter().any(|t| t.eq_ignore_ascii_case(category))
    }

    pub fn distance_from(&self, origin: &GeoLocation) -> f64 {
        origin.distance_km(&self.location)
    }

    /// Google Maps directions link to this center.
    pub fn directions_url(&self) -> String {
        format!(
            "https://www.google.com/maps/dir/?api=1&destination={},{}",
            self.location.lat, self.location.lng
        )
    }
}

static CENTERS: &[CollectionCenter] = &[
    CollectionCenter {
        id: "1",
        name: "EcoGreen Recycling Center",
        address: "123 Green Street, Eco City, EC 12345",
        distance_km: 1.2,
        rating: 4.8,
        phone: "+1 (555) 123-4567",
        hours: "Mon-Fri: 8AM-6PM, Sat: 9AM-4PM",
        types: &["Plastic", "Paper", "Metal", "Glass"],
        location: GeoLocation {
            lat: 40.7589,
            lng: -73.9851,
        },
    },
    CollectionCenter {
        id: "2",
        name: "City Waste Management",
        address: "456 Recycle Ave, Green Town, GT 67890",
        distance_km: 2.8,
        rating: 4.5,
        phone: "+1 (555) 987-6543",
        hours: "Mon-Sat: 7AM-7PM, Sun: 10AM-3PM",
        types: &["Electronics", "Batteries", "Textiles"],
        location: GeoLocation {
            lat: 40.7505,
            lng: -73.9934,
        },
    },
    CollectionCenter {
        id: "3",
        name: "Organic Waste Solutions",
        address: "789 Compost Blvd, Nature Park, NP 13579",
        distance_km: 3.5,
        rating: 4.9,
        phone: "+1 (555) 246-8135",
        hours: "Daily: 6AM-8PM",
        types: &["Organic", "Compost", "Garden Waste"],
        location: GeoLocation {
            lat: 40.7614,
            lng: -73.9776,
        },
    },
    CollectionCenter {
        id: "4",
        name: "Tech Recycle Hub",
        address: "321 Digital Drive, Tech Valley, TV 24680",
        distance_km: 4.1,
        rating: 4.6,
        phone: "+1 (555) 135-7924",
        hours: "Tue-Sun: 10AM-6PM",
        types: &["Electronics", "Computers", "Phones"],
        location: GeoLocation {
            lat: 40.7282,
            lng: -73.9942,
        },
    },
];

/// Every center in the catalog.
pub fn all() -> &'static [CollectionCenter] {
    CENTERS
}

/// Centers whose catalog distance is within `radius_km`.
pub fn within_radius(radius_km: f64) -> Vec<&'static CollectionCenter> {
    CENTERS.iter().filter(|c| c.distance_km <= radius_km).collect()
}

/// Centers within `radius_km` that take the given material, nearest first.
pub fn accepting(category: &str, radius_km: f64) -> Vec<&'static CollectionCenter> {
    let mut matches: Vec<_> = within_radius(radius_km)
        .into_iter()
        .filter(|c| c.accepts(category))
        .collect();
    matches.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    matches
}

/// Centers that take the given material within `radius_km` of `origin`,
/// measured by great-circle distance. Nearest first, paired with that distance.
pub fn accepting_near(
    category: &str,
    origin: &GeoLocation,
    radius_km: f64,
) -> Vec<(&'static CollectionCenter, f64)> {
    nearest_to(origin)
        .into_iter()
        .filter(|(c, d)| *d <= radius_km && c.accepts(category))
        .collect()
}

/// Centers sorted by great-circle distance from `origin`.
pub fn nearest_to(origin: &GeoLocation) -> Vec<(&'static CollectionCenter, f64)> {
    let mut ranked: Vec<_> = CENTERS.iter().map(|c| (c, c.distance_from(origin))).collect();
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_radius_includes_all() {
        assert_eq!(within_radius(5.0).len(), 4);
    }

    #[test]
    fn test_radius_filter() {
        let ids: Vec<_> = within_radius(3.0).iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert!(within_radius(1.0).is_empty());
    }

    #[test]
    fn test_accepting_category() {
        let organic = accepting("organic", 5.0);
        assert_eq!(organic.len(), 1);
        assert_eq!(organic[0].name, "Organic Waste Solutions");

        let electronics = accepting("Electronics", 5.0);
        let ids: Vec<_> = electronics.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["2", "4"]);
    }

    #[test]
    fn test_directions_url() {
        let url = all()[0].directions_url();
        assert_eq!(
            url,
            "https://www.google.com/maps/dir/?api=1&destination=40.7589,-73.9851"
        );
    }

    #[test]
    fn test_haversine_zero_and_known_distance() {
        let a = GeoLocation::new(40.7589, -73.9851);
        assert!(a.distance_km(&a).abs() < 1e-9);

        // Times Square to Penn Station area, roughly 1.1 km
        let b = GeoLocation::new(40.7505, -73.9934);
        let d = a.distance_km(&b);
        assert!(d > 1.0 && d < 1.3, "unexpected distance {}", d);
    }

    #[test]
    fn test_nearest_to_default_location() {
        let origin = GeoLocation::from(&CenterSettings::default());
        let ranked = nearest_to(&origin);

        assert_eq!(ranked[0].0.id, "1");
        assert!(ranked.windows(2).all(|w| w[0].1 <= w[1].1));
    }

    #[test]
    fn test_accepting_near_uses_measured_distance() {
        let origin = GeoLocation::from(&CenterSettings::default());

        // Organic Waste Solutions is about 0.7 km from the default location
        let organic = accepting_near("Organic", &origin, 1.0);
        assert_eq!(organic.len(), 1);
        assert_eq!(organic[0].0.id, "3");
        assert!(accepting_near("Organic", &origin, 0.5).is_empty());

        // Center 4 is listed at 4.1 km but sits about 3.5 km away
        let electronics = accepting_near("electronics", &origin, 2.0);
        let ids: Vec<_> = electronics.iter().map(|(c, _)| c.id).collect();
        assert_eq!(ids, vec!["2"]);

        for (center, distance) in accepting_near("Electronics", &origin, 5.0) {
            assert!(distance <= 5.0);
            assert_eq!(distance, center.distance_from(&origin));
        }
    }
}
