use serde::{Deserialize, Serialize};

const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// Great-circle distance plus a pre-formatted display string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distance {
    pub km: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelTime {
    pub minutes: u32,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    Driving,
    Transit,
    Walking,
}

impl TravelMode {
    /// Average speed used for the linear travel-time estimate. This is a
    /// deliberately crude model, not routing.
    pub fn speed_kmh(self) -> f64 {
        match self {
            TravelMode::Driving => 40.0,
            TravelMode::Transit => 25.0,
            TravelMode::Walking => 5.0,
        }
    }
}

pub fn haversine_distance(a: LatLng, b: LatLng) -> Distance {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    let km = (EARTH_RADIUS_KM * c * 100.0).round() / 100.0;
    Distance {
        km,
        text: format!("{km:.2} km"),
    }
}

pub fn estimate_travel_time(distance_km: f64, mode: TravelMode) -> TravelTime {
    let minutes = (distance_km / mode.speed_kmh() * 60.0).round() as u32;
    let text = if minutes < 60 {
        format!("{minutes} min")
    } else {
        format!("{}h {}min", minutes / 60, minutes % 60)
    };
    TravelTime { minutes, text }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance() {
        let p = LatLng {
            lat: 38.8462,
            lng: -77.3064,
        };
        let d = haversine_distance(p, p);
        assert_eq!(d.km, 0.0);
        assert_eq!(d.text, "0.00 km");
    }

    #[test]
    fn new_york_to_boston() {
        let nyc = LatLng {
            lat: 40.7128,
            lng: -74.0060,
        };
        let bos = LatLng {
            lat: 42.3601,
            lng: -71.0589,
        };
        let d = haversine_distance(nyc, bos);
        assert!(d.km > 290.0 && d.km < 320.0, "got {}", d.km);
    }

    #[test]
    fn travel_time_driving_crosses_an_hour() {
        let t = estimate_travel_time(40.0, TravelMode::Driving);
        assert_eq!(t.minutes, 60);
        assert_eq!(t.text, "1h 0min");
    }

    #[test]
    fn travel_time_walking_short() {
        let t = estimate_travel_time(2.0, TravelMode::Walking);
        assert_eq!(t.minutes, 24);
        assert_eq!(t.text, "24 min");
    }

    #[test]
    fn transit_slower_than_driving() {
        let drive = estimate_travel_time(10.0, TravelMode::Driving);
        let transit = estimate_travel_time(10.0, TravelMode::Transit);
        assert!(transit.minutes > drive.minutes);
    }
}
