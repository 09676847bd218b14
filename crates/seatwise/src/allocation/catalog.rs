use super::seat::Zone;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Zone assumed for destinations missing from the catalog.
pub const DEFAULT_ZONE: Zone = Zone::Middle;

/// Distance assumed for destinations missing from the catalog.
pub const DEFAULT_DISTANCE: u32 = 5;

/// A served destination and where its riders prefer to sit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    #[serde(rename = "Destination")]
    pub destination: String,
    #[serde(rename = "DistanceFromCollege")]
    pub distance: u32,
    #[serde(rename = "SeatZone")]
    pub zone: Zone,
}

/// Result of a catalog lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteZone {
    pub zone: Zone,
    pub distance: u32,
    /// Set when the destination was unknown and the defaults were used.
    pub defaulted: bool,
}

/// Read-only destination lookup.
#[derive(Debug, Clone, Default)]
pub struct RouteZoneCatalog {
    routes: HashMap<String, Route>,
}

impl RouteZoneCatalog {
    pub fn new(routes: impl IntoIterator<Item = Route>) -> Self {
        let routes = routes
            .into_iter()
            .map(|route| (route.destination.trim().to_string(), route))
            .collect();
        Self { routes }
    }

    /// Never fails: unknown destinations resolve to `middle` at distance 5.
    pub fn lookup(&self, destination: &str) -> RouteZone {
        match self.routes.get(destination.trim()) {
            Some(route) => RouteZone {
                zone: route.zone,
                distance: route.distance,
                defaulted: false,
            },
            None => RouteZone {
                zone: DEFAULT_ZONE,
                distance: DEFAULT_DISTANCE,
                defaulted: true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> RouteZoneCatalog {
        RouteZoneCatalog::new(vec![
            Route {
                destination: "Rajpur Road".to_string(),
                distance: 3,
                zone: Zone::Front,
            },
            Route {
                destination: "Clement Town".to_string(),
                distance: 12,
                zone: Zone::Back,
            },
        ])
    }

    #[test]
    fn known_destination_resolves_to_its_zone() {
        let found = catalog().lookup("Clement Town");
        assert_eq!(found.zone, Zone::Back);
        assert_eq!(found.distance, 12);
        assert!(!found.defaulted);
    }

    #[test]
    fn unknown_destination_defaults_to_middle() {
        let found = catalog().lookup("Mussoorie");
        assert_eq!(found.zone, Zone::Middle);
        assert_eq!(found.distance, 5);
        assert!(found.defaulted);
    }

    #[test]
    fn lookup_ignores_surrounding_whitespace() {
        assert_eq!(catalog().lookup(" Rajpur Road ").zone, Zone::Front);
    }
}
