//! # Geographic Utilities
//!
//! Geometry helpers shared by tracks, comparators and restrictors.
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`haversine_distance`] | Great-circle distance between two points, in meters |
//! | [`haversine_km`] | Same, in kilometers |
//! | [`polyline_length_km`] | Total length of a sequence of points |
//! | [`meters_to_degrees`] | Convert meters to approximate degrees at a latitude |
//! | [`square_bounds`] | Bounds of a square of a given side, centered on a point |
//! | [`bounds_overlap`] | Classify how two bounding boxes overlap |
//! | [`crossing_ratio`] | How far along a segment a crossing point lies |
//! | [`heading_delta`] / [`interpolate_heading`] | Shortest-arc heading arithmetic |
//!
//! ## Coordinate System
//!
//! All functions expect WGS84 latitude/longitude in degrees. Planar tests
//! (box containment, segment crossings) treat longitude as x and latitude as y,
//! which is adequate for regions of a few hundred kilometers that do not
//! cross the antimeridian.

use geo::{Coord, Distance, Haversine, Point};
use crate::{Bounds, GpsPoint, OverlapOutcome};

/// Meters per degree of latitude (and of longitude at the equator).
pub const METERS_PER_DEGREE: f64 = 111_320.0;

// =============================================================================
// Distance Functions
// =============================================================================

/// Great-circle distance between two points using the Haversine formula, in meters.
///
/// # Arguments
///
/// * `p1` - First GPS point
/// * `p2` - Second GPS point
///
/// # Returns
///
/// Distance in meters along the surface of a spherical Earth.
///
/// # Example
///
/// ```rust
/// use flight_track::{GpsPoint, geo_utils};
///
/// let sfo = GpsPoint::new(37.6188, -122.3750);
/// let sjc = GpsPoint::new(37.3639, -121.9289);
/// let distance = geo_utils::haversine_distance(&sfo, &sjc);
/// assert!((distance - 48_000.0).abs() < 2_000.0);
/// ```
#[inline]
pub fn haversine_distance(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    let point1 = Point::new(p1.longitude, p1.latitude);
    let point2 = Point::new(p2.longitude, p2.latitude);
    Haversine::distance(point1, point2)
}

/// [`haversine_distance`] in kilometers, the unit used for box sides and
/// track lengths.
#[inline]
pub fn haversine_km(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    haversine_distance(p1, p2) / 1000.0
}

/// Sum of the great-circle distances between consecutive points, in km.
/// Empty or single-point input returns 0.0.
pub fn polyline_length_km(points: &[GpsPoint]) -> f64 {
    points
        .windows(2)
        .map(|w| haversine_km(&w[0], &w[1]))
        .sum()
}

/// Convert meters to approximate degrees of longitude at a given latitude.
///
/// Uses a conservative (larger) value near the poles, where longitude degrees
/// shrink towards zero width.
///
/// # Arguments
///
/// * `meters` - Ground distance to convert
/// * `latitude` - Latitude at which the distance is measured, in degrees
///
/// # Returns
///
/// Degrees of longitude covering `meters` at `latitude`. At the equator this
/// is also the latitude equivalent.
#[inline]
pub fn meters_to_degrees(meters: f64, latitude: f64) -> f64 {
    let lat_rad = latitude.to_radians();
    let meters_per_degree = METERS_PER_DEGREE * lat_rad.cos().max(0.1);
    meters / meters_per_degree
}

// =============================================================================
// Bounding Box Functions
// =============================================================================

/// Bounds of a square with sides of `side_km`, centered on `center`.
///
/// The latitude extent is exact for a sphere; the longitude extent is widened
/// by the latitude of the center so that the square covers the same ground
/// distance east-west as north-south.
///
/// # Arguments
///
/// * `center` - Center of the square
/// * `side_km` - Length of each side, in kilometers
///
/// # Example
///
/// ```rust
/// use flight_track::{GpsPoint, geo_utils};
///
/// let b = geo_utils::square_bounds(&GpsPoint::new(0.0, 0.0), 2000.0);
/// assert!((b.max_lat - 8.98).abs() < 0.01);
/// assert!((b.min_lng + 8.98).abs() < 0.01);
/// ```
pub fn square_bounds(center: &GpsPoint, side_km: f64) -> Bounds {
    let half_m = side_km * 1000.0 / 2.0;
    let half_lat = half_m / METERS_PER_DEGREE;
    let half_lng = meters_to_degrees(half_m, center.latitude);

    Bounds {
        min_lat: center.latitude - half_lat,
        max_lat: center.latitude + half_lat,
        min_lng: center.longitude - half_lng,
        max_lng: center.longitude + half_lng,
    }
}

/// Classify how bounding box `b` overlaps bounding box `a`, and return the
/// fraction of the smaller box's area covered by the overlap.
///
/// Containment is reported precisely (`IsContained` when `b` lies within `a`,
/// `Contains` when `b` covers `a`; identical boxes are `Contains`). Partial
/// overlaps are `StraddlesStart` when `b` reaches further west (or south, for
/// equal western edges) than `a`, otherwise `StraddlesEnd`. Disjoint boxes are
/// `DisjointBefore` when `b` lies entirely west or south of `a`, otherwise
/// `DisjointAfter`.
///
/// Zero-area boxes (a single point, or points along a line) that touch the
/// other box count as a full overlap.
///
/// # Returns
///
/// `(outcome, fraction)` where `fraction` is in `[0.0, 1.0]` and is `0.0` for
/// disjoint boxes.
pub fn bounds_overlap(a: &Bounds, b: &Bounds) -> (OverlapOutcome, f64) {
    if b.max_lng < a.min_lng || b.max_lat < a.min_lat {
        return (OverlapOutcome::DisjointBefore, 0.0);
    }
    if b.min_lng > a.max_lng || b.min_lat > a.max_lat {
        return (OverlapOutcome::DisjointAfter, 0.0);
    }

    let inter = Bounds {
        min_lat: a.min_lat.max(b.min_lat),
        max_lat: a.max_lat.min(b.max_lat),
        min_lng: a.min_lng.max(b.min_lng),
        max_lng: a.max_lng.min(b.max_lng),
    };
    let smaller = a.area().min(b.area());
    let fraction = if smaller > 0.0 {
        (inter.area() / smaller).clamp(0.0, 1.0)
    } else {
        1.0
    };

    let b_covers_a = b.min_lat <= a.min_lat
        && b.max_lat >= a.max_lat
        && b.min_lng <= a.min_lng
        && b.max_lng >= a.max_lng;
    let a_covers_b = a.min_lat <= b.min_lat
        && a.max_lat >= b.max_lat
        && a.min_lng <= b.min_lng
        && a.max_lng >= b.max_lng;

    let outcome = if b_covers_a {
        OverlapOutcome::Contains
    } else if a_covers_b {
        OverlapOutcome::IsContained
    } else if b.min_lng < a.min_lng || (b.min_lng == a.min_lng && b.min_lat < a.min_lat) {
        OverlapOutcome::StraddlesStart
    } else {
        OverlapOutcome::StraddlesEnd
    };

    (outcome, fraction)
}

// =============================================================================
// Segment Functions
// =============================================================================

/// Fraction of the way from `from` to `to` at which `at` lies, assuming `at`
/// is on the segment. Uses whichever axis has the larger extent, so vertical
/// and horizontal segments both work. Degenerate segments return 0.0.
///
/// # Returns
///
/// Ratio clamped to `[0.0, 1.0]`, suitable for [`crate::Segment::altitude_at`].
pub fn crossing_ratio(from: Coord, to: Coord, at: Coord) -> f64 {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let ratio = if dx.abs() >= dy.abs() {
        if dx == 0.0 { return 0.0; }
        (at.x - from.x) / dx
    } else {
        (at.y - from.y) / dy
    };
    ratio.clamp(0.0, 1.0)
}

// =============================================================================
// Heading Functions
// =============================================================================

/// Signed shortest turn from heading `h1` to heading `h2`, in (-180, 180].
pub fn heading_delta(h1: f64, h2: f64) -> f64 {
    let mut delta = (h2 - h1) % 360.0;
    if delta > 180.0 {
        delta -= 360.0;
    } else if delta <= -180.0 {
        delta += 360.0;
    }
    delta
}

/// Interpolate between two headings along the shortest arc, result in [0, 360).
pub fn interpolate_heading(from: f64, to: f64, ratio: f64) -> f64 {
    (from + heading_delta(from, to) * ratio).rem_euclid(360.0)
}

// =============================================================================
// Unit Tests
// =============================================================================
