//! Great-circle distance and nearest-facility selection.
//!
//! Pure functions; no I/O. Distances are meters rounded to one decimal place.

use serde::{Deserialize, Serialize};

use crate::types::CustomerRecord;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Distance reported when the origin is unknown and the default facility is
/// handed out instead of a ranked one.
pub const DEFAULT_FACILITY_DISTANCE_M: f64 = 50.0;

/// WGS84 latitude/longitude in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self { Self { lat, lon } }

    /// Build from nullable columns; both halves must be present.
    pub fn from_parts(lat: Option<f64>, lon: Option<f64>) -> Option<Self> {
        match (lat, lon) {
            (Some(lat), Some(lon)) => Some(Self { lat, lon }),
            _ => None,
        }
    }
}

/// A store location. Immutable reference data for a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    pub id: i64,
    pub name: String,
    pub location: Option<Coordinate>,
    pub address: String,
    pub open_time: String,
    pub close_time: String,
}

/// A facility with its transient distance from some origin. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedFacility {
    pub facility: Facility,
    pub distance_m: f64,
    /// `false` when the origin was unknown and `distance_m` is the sentinel.
    pub measured: bool,
}

/// Haversine distance in meters, rounded to one decimal.
pub fn distance(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    round1(EARTH_RADIUS_M * c)
}

fn round1(x: f64) -> f64 { (x * 10.0).round() / 10.0 }

/// Pick the closest facility to `origin`.
///
/// Linear scan with strict `<`, so the first of several equally distant
/// facilities wins. Facilities without a coordinate are skipped. When the
/// origin is unknown, or no candidate can be measured, the first facility is
/// returned with [`DEFAULT_FACILITY_DISTANCE_M`]. An empty candidate list
/// yields `None`.
pub fn nearest(origin: Option<Coordinate>, candidates: &[Facility]) -> Option<RankedFacility> {
    let default = candidates.first()?;
    let Some(origin) = origin else {
        tracing::warn!("origin coordinate unknown; using default facility {}", default.id);
        return Some(fallback(default));
    };

    let mut best: Option<RankedFacility> = None;
    for facility in candidates {
        let Some(loc) = facility.location else { continue };
        let d = distance(origin, loc);
        let closer = best.as_ref().map_or(true, |b| d < b.distance_m);
        if closer {
            best = Some(RankedFacility { facility: facility.clone(), distance_m: d, measured: true });
        }
    }
    best.or_else(|| {
        tracing::warn!("no facility has a known coordinate; using default facility {}", default.id);
        Some(fallback(default))
    })
}

/// [`nearest`] with the customer's stored coordinate as origin.
pub fn nearest_for_customer(customer: &CustomerRecord, facilities: &[Facility]) -> Option<RankedFacility> {
    nearest(customer.location, facilities)
}

fn fallback(facility: &Facility) -> RankedFacility {
    RankedFacility { facility: facility.clone(), distance_m: DEFAULT_FACILITY_DISTANCE_M, measured: false }
}

/// Human-readable distance: `"1.23 km"` from 1000 m up, whole meters below.
pub fn format_distance(meters: f64) -> String {
    if meters >= 1000.0 {
        format!("{:.2} km", meters / 1000.0)
    } else {
        // Truncation, not rounding: 149.9 m reads as "149 m".
        format!("{} m", meters.trunc() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_switches_to_km() {
        assert_eq!(format_distance(148.5), "148 m");
        assert_eq!(format_distance(3132.1), "3.13 km");
        assert_eq!(format_distance(1000.0), "1.00 km");
    }

    #[test]
    fn round_to_one_decimal() {
        assert_eq!(round1(148.54), 148.5);
        assert_eq!(round1(148.56), 148.6);
    }
}
