//! Universal Transverse Mercator projection on the WGS-84 ellipsoid.
//!
//! The street network is held in UTM metres so route walking can use plain
//! Euclidean distance; device positions are converted back to latitude and
//! longitude only for reporting.  The zone is fixed once per network (the
//! zone of its centroid), so points slightly outside that zone still project
//! consistently; distortion grows slowly and is irrelevant at city scale.
//!
//! Formulas: Snyder, *Map Projections: A Working Manual* (USGS 1395),
//! §8, series truncated at the sixth power.  Round-trip error is below
//! 1e-7° (about a centimetre) within ±3° of the central meridian.
//!
//! The Norway/Svalbard zone exceptions are not applied.

use crate::{GeoPoint, PlanarPoint};

const A: f64 = 6_378_137.0; // semi-major axis, metres
const F: f64 = 1.0 / 298.257_223_563; // flattening
const K0: f64 = 0.9996; // central-meridian scale factor
const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// A fixed UTM zone and hemisphere.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UtmProjection {
    /// Zone number, 1..=60.
    pub zone: u8,
    /// `true` for the southern hemisphere (10 000 km false northing).
    pub south: bool,
}

impl UtmProjection {
    /// The zone and hemisphere containing `p`.
    pub fn for_point(p: GeoPoint) -> Self {
        let zone = (((p.lon + 180.0) / 6.0).floor() as i64 + 1).clamp(1, 60) as u8;
        Self { zone, south: p.lat < 0.0 }
    }

    /// Longitude of the zone's central meridian, degrees.
    #[inline]
    pub fn central_meridian(&self) -> f64 {
        f64::from(self.zone) * 6.0 - 183.0
    }

    /// Geographic → planar metres (easting, northing).
    pub fn project(&self, p: GeoPoint) -> PlanarPoint {
        let e2 = F * (2.0 - F);
        let ep2 = e2 / (1.0 - e2);

        let phi = p.lat.to_radians();
        let lambda = (p.lon - self.central_meridian()).to_radians();

        let (sin_phi, cos_phi) = phi.sin_cos();
        let tan_phi = phi.tan();

        let n = A / (1.0 - e2 * sin_phi * sin_phi).sqrt();
        let t = tan_phi * tan_phi;
        let c = ep2 * cos_phi * cos_phi;
        let a = cos_phi * lambda;
        let m = meridian_arc(phi, e2);

        let a2 = a * a;
        let a3 = a2 * a;
        let a4 = a3 * a;
        let a5 = a4 * a;
        let a6 = a5 * a;

        let x = K0
            * n
            * (a + (1.0 - t + c) * a3 / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * a5 / 120.0)
            + FALSE_EASTING;

        let mut y = K0
            * (m + n
                * tan_phi
                * (a2 / 2.0
                    + (5.0 - t + 9.0 * c + 4.0 * c * c) * a4 / 24.0
                    + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * a6 / 720.0));
        if self.south {
            y += FALSE_NORTHING_SOUTH;
        }

        PlanarPoint::new(x, y)
    }

    /// Planar metres → geographic.
    pub fn unproject(&self, p: PlanarPoint) -> GeoPoint {
        let e2 = F * (2.0 - F);
        let ep2 = e2 / (1.0 - e2);
        let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());

        let x = p.x - FALSE_EASTING;
        let y = if self.south { p.y - FALSE_NORTHING_SOUTH } else { p.y };

        let m = y / K0;
        let mu = m / (A * (1.0 - e2 / 4.0 - 3.0 * e2 * e2 / 64.0 - 5.0 * e2 * e2 * e2 / 256.0));

        let phi1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

        let (sin1, cos1) = phi1.sin_cos();
        let tan1 = phi1.tan();
        let w = 1.0 - e2 * sin1 * sin1;

        let n1 = A / w.sqrt();
        let t1 = tan1 * tan1;
        let c1 = ep2 * cos1 * cos1;
        let r1 = A * (1.0 - e2) / w.powf(1.5);
        let d = x / (n1 * K0);

        let d2 = d * d;
        let d3 = d2 * d;
        let d4 = d3 * d;
        let d5 = d4 * d;
        let d6 = d5 * d;

        let phi = phi1
            - (n1 * tan1 / r1)
                * (d2 / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d4 / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1 - 252.0 * ep2 - 3.0 * c1 * c1)
                        * d6
                        / 720.0);

        let lambda = (d - (1.0 + 2.0 * t1 + c1) * d3 / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1) * d5 / 120.0)
            / cos1;

        GeoPoint::new(phi.to_degrees(), self.central_meridian() + lambda.to_degrees())
    }
}

/// Distance along the meridian from the equator to latitude `phi` (radians).
fn meridian_arc(phi: f64, e2: f64) -> f64 {
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    A * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
        - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
        + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
        - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
}
