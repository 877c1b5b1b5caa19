use super::error::EngineError;
use crate::config::OfficeLocation;

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two coordinates in meters (haversine).
pub fn distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (lat1, lon1, lat2, lon2) = (
        lat1.to_radians(),
        lon1.to_radians(),
        lat2.to_radians(),
        lon2.to_radians(),
    );
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * a.sqrt().asin() * EARTH_RADIUS_M
}

/// Office-mode clock events must fall inside some office's radius. On
/// failure the error carries the distance to the nearest office so the
/// caller can render it.
pub fn check(offices: &[OfficeLocation], lat: f64, lon: f64) -> Result<&OfficeLocation, EngineError> {
    let mut nearest = f64::INFINITY;
    for office in offices {
        let d = distance_m(lat, lon, office.latitude, office.longitude);
        if d <= office.radius_m {
            return Ok(office);
        }
        if d < nearest {
            nearest = d;
        }
    }
    Err(EngineError::OutsideGeofence {
        distance_m: nearest,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn office(lat: f64, lon: f64, radius_m: f64) -> OfficeLocation {
        OfficeLocation {
            id: "office-main".into(),
            name: "Head Office".into(),
            latitude: lat,
            longitude: lon,
            radius_m,
            is_default: true,
        }
    }

    #[test]
    fn same_point_is_inside() {
        let offices = [office(-6.1617, 106.8751, 100.0)];
        assert!(check(&offices, -6.1617, 106.8751).is_ok());
    }

    #[test]
    fn two_kilometers_away_is_outside_a_100m_fence() {
        let offices = [office(-6.1617, 106.8751, 100.0)];
        // ~0.018 degrees of latitude is ~2 km.
        let err = check(&offices, -6.1797, 106.8751).unwrap_err();
        match err {
            EngineError::OutsideGeofence { distance_m } => {
                assert!(distance_m > 1_900.0 && distance_m < 2_100.0);
            }
            other => panic!("expected OutsideGeofence, got {other:?}"),
        }
    }

    #[test]
    fn any_office_in_range_passes() {
        let offices = [
            office(-6.1617, 106.8751, 100.0),
            office(-6.2000, 106.8167, 150.0),
        ];
        assert!(check(&offices, -6.2001, 106.8168).is_ok());
    }
}
