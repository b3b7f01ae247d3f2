//! Geographic and planar coordinate types.
//!
//! `GeoPoint` is what devices report (WGS-84 degrees).  `PlanarPoint` is
//! what the motion model walks on: metres in a projected coordinate system
//! (see [`crate::projection`]), where plain Euclidean distance is valid.

use crate::units::round_dp;

/// A WGS-84 geographic coordinate.
///
/// Double precision: reported positions carry six decimals (~0.1 m), which
/// single-precision floats cannot hold at city longitudes.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    #[inline]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Haversine great-circle distance in metres.
    pub fn distance_m(self, other: GeoPoint) -> f64 {
        const R: f64 = 6_371_000.0; // mean Earth radius, metres

        let d_lat = (other.lat - self.lat).to_radians();
        let d_lon = (other.lon - self.lon).to_radians();

        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();

        let a = (d_lat * 0.5).sin().powi(2)
            + lat1.cos() * lat2.cos() * (d_lon * 0.5).sin().powi(2);

        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        R * c
    }

    /// Approximate bounding-box check.
    #[inline]
    pub fn within_bbox(self, center: GeoPoint, half_deg: f64) -> bool {
        (self.lat - center.lat).abs() <= half_deg
            && (self.lon - center.lon).abs() <= half_deg
    }

    /// Both coordinates rounded to `decimals` places.
    #[inline]
    pub fn rounded(self, decimals: i32) -> GeoPoint {
        GeoPoint::new(round_dp(self.lat, decimals), round_dp(self.lon, decimals))
    }

    /// Clamp to the valid latitude/longitude ranges.
    #[inline]
    pub fn clamped(self) -> GeoPoint {
        GeoPoint::new(self.lat.clamp(-90.0, 90.0), self.lon.clamp(-180.0, 180.0))
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

/// A point in a projected, locally flat coordinate system (metres).
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlanarPoint {
    /// Easting.
    pub x: f64,
    /// Northing.
    pub y: f64,
}

impl PlanarPoint {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance in metres.
    #[inline]
    pub fn distance_to(self, other: PlanarPoint) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Linear interpolation: `t = 0` is `self`, `t = 1` is `other`.
    #[inline]
    pub fn lerp(self, other: PlanarPoint, t: f64) -> PlanarPoint {
        PlanarPoint::new(
            self.x + t * (other.x - self.x),
            self.y + t * (other.y - self.y),
        )
    }
}

/// Total length of a polyline in metres.
pub fn path_length_m(points: &[PlanarPoint]) -> f64 {
    points.windows(2).map(|w| w[0].distance_to(w[1])).sum()
}
