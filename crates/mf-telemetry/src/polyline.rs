//! Trajectory ⇄ Google encoded polyline (precision 5).

use geo_types::Coord;

use mf_core::GeoPoint;

use crate::{TelemetryError, TelemetryResult};

pub const PRECISION: u32 = 5;

/// Encode a trajectory.  No points encode to the empty string; a single
/// point encodes to one coordinate pair.
pub fn encode_trajectory(points: &[GeoPoint]) -> TelemetryResult<String> {
    if points.is_empty() {
        return Ok(String::new());
    }
    polyline::encode_coordinates(points.iter().map(|p| Coord { x: p.lon, y: p.lat }), PRECISION)
        .map_err(|e| TelemetryError::Encode(e.to_string()))
}

/// Inverse of [`encode_trajectory`], at polyline precision.
pub fn decode_trajectory(encoded: &str) -> TelemetryResult<Vec<GeoPoint>> {
    if encoded.is_empty() {
        return Ok(Vec::new());
    }
    let line = polyline::decode_polyline(encoded, PRECISION)
        .map_err(|e| TelemetryError::Encode(e.to_string()))?;
    Ok(line.coords().map(|c| GeoPoint::new(c.y, c.x)).collect())
}
