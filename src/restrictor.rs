//! # Restrictors
//!
//! A [`Restrictor`] is a named, optionally altitude-bounded region that a track
//! may pass through. Three shapes are supported:
//!
//! | Shape | Can contain a point | Satisfied by |
//! |-------|---------------------|--------------|
//! | [`BoxRestrictor`] | yes | any span of the track inside the box |
//! | [`PolygonRestrictor`] | yes | any span of the track inside the polygon |
//! | [`VerticalPlaneRestrictor`] | no | the track crossing the "wall" |
//!
//! The core query is [`Restrictor::overlaps_line`], which classifies a track
//! segment against the shape (see [`OverlapOutcome`] for the meaning of each
//! outcome). Altitude bands are an extra filter on top of the planar test.
//!
//! An exclusion restrictor is satisfied by tracks that do *not* pass through
//! it; the geometry is unchanged, only the final verdict is inverted.

use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::{Coord, Intersects, LineString, Polygon};

use crate::error::{FlightTrackError, Result};
use crate::{geo_utils, Bounds, GpsPoint, OverlapOutcome, Segment};

// ============================================================================
// Altitude Band
// ============================================================================

/// Inclusive altitude limits in feet. `None` means unbounded on that side.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AltitudeBand {
    pub floor: Option<f64>,
    pub ceiling: Option<f64>,
}

impl AltitudeBand {
    /// No altitude limits.
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn between(floor: f64, ceiling: f64) -> Self {
        Self { floor: Some(floor), ceiling: Some(ceiling) }
    }

    pub fn above(floor: f64) -> Self {
        Self { floor: Some(floor), ceiling: None }
    }

    pub fn below(ceiling: f64) -> Self {
        Self { floor: None, ceiling: Some(ceiling) }
    }

    pub fn is_unbounded(&self) -> bool {
        self.floor.is_none() && self.ceiling.is_none()
    }

    pub fn contains(&self, altitude: f64) -> bool {
        self.floor.map_or(true, |f| altitude >= f) && self.ceiling.map_or(true, |c| altitude <= c)
    }

    /// Does any altitude within `[lo, hi]` fall inside the band?
    pub fn overlaps_span(&self, lo: f64, hi: f64) -> bool {
        let (lo, hi) = if hi < lo { (hi, lo) } else { (lo, hi) };
        self.floor.map_or(true, |f| hi >= f) && self.ceiling.map_or(true, |c| lo <= c)
    }

    fn validate(&self) -> Result<()> {
        for limit in [self.floor, self.ceiling].into_iter().flatten() {
            if !limit.is_finite() {
                return Err(FlightTrackError::InvalidRestrictor(format!("altitude limit {} is not finite", limit)));
            }
        }
        if let (Some(floor), Some(ceiling)) = (self.floor, self.ceiling) {
            if floor > ceiling {
                return Err(FlightTrackError::InvalidRestrictor(format!(
                    "altitude floor {:.0}ft is above ceiling {:.0}ft",
                    floor, ceiling
                )));
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for AltitudeBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.floor, self.ceiling) {
            (None, None) => f.write_str("any altitude"),
            (Some(lo), None) => write!(f, "above {:.0}ft", lo),
            (None, Some(hi)) => write!(f, "below {:.0}ft", hi),
            (Some(lo), Some(hi)) => write!(f, "{:.0}-{:.0}ft", lo, hi),
        }
    }
}

// ============================================================================
// Shapes
// ============================================================================

/// A square box of `side_km` per side, centered on `center`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoxRestrictor {
    pub name: String,
    pub center: GpsPoint,
    pub side_km: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub altitude: AltitudeBand,
    #[cfg_attr(feature = "serde", serde(default))]
    pub exclusion: bool,
}

impl BoxRestrictor {
    pub fn bounds(&self) -> Bounds {
        geo_utils::square_bounds(&self.center, self.side_km)
    }
}

/// A vertical "wall" between two points, limited by an altitude band.
/// Tracks can only cross it, never be inside it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VerticalPlaneRestrictor {
    pub name: String,
    pub start: GpsPoint,
    pub end: GpsPoint,
    #[cfg_attr(feature = "serde", serde(default))]
    pub altitude: AltitudeBand,
    #[cfg_attr(feature = "serde", serde(default))]
    pub exclusion: bool,
}

impl VerticalPlaneRestrictor {
    /// Where `segment` crosses the wall in plan view, with the interpolated
    /// altitude there. Touching an end of the wall counts; running along it
    /// (collinear overlap) does not.
    pub fn crossing(&self, segment: &Segment) -> Option<(GpsPoint, f64)> {
        if segment.is_degenerate() {
            return None;
        }
        let wall = geo::Line::new(self.start.to_coord(), self.end.to_coord());
        match line_intersection(segment.to_line(), wall)? {
            LineIntersection::SinglePoint { intersection, .. } => {
                let ratio = geo_utils::crossing_ratio(segment.from.to_coord(), segment.to.to_coord(), intersection);
                Some((GpsPoint::new(intersection.y, intersection.x), segment.altitude_at(ratio)))
            }
            LineIntersection::Collinear { .. } => None,
        }
    }
}

/// A closed polygon. Points on the boundary are inside.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PolygonRestrictor {
    pub name: String,
    pub vertices: Vec<GpsPoint>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub altitude: AltitudeBand,
    #[cfg_attr(feature = "serde", serde(default))]
    pub exclusion: bool,
}

impl PolygonRestrictor {
    pub fn to_polygon(&self) -> Polygon {
        let ring: Vec<Coord> = self.vertices.iter().map(GpsPoint::to_coord).collect();
        Polygon::new(LineString::from(ring), vec![])
    }

    pub fn bounds(&self) -> Bounds {
        let empty = Bounds {
            min_lat: f64::INFINITY,
            max_lat: f64::NEG_INFINITY,
            min_lng: f64::INFINITY,
            max_lng: f64::NEG_INFINITY,
        };
        self.vertices.iter().fold(empty, |mut b, p| {
            b.enclose(p);
            b
        })
    }
}

/// Plan-view area of a box or polygon, built once per query.
enum Region {
    Rect(Bounds),
    Polygon(Polygon),
}

impl Region {
    fn contains(&self, position: &GpsPoint) -> bool {
        match self {
            Region::Rect(b) => b.contains(position),
            Region::Polygon(p) => p.intersects(&position.to_coord()),
        }
    }

    fn intersects(&self, segment: &Segment) -> bool {
        let line = segment.to_line();
        match self {
            Region::Rect(b) => b.to_rect().intersects(&line),
            Region::Polygon(p) => p.intersects(&line),
        }
    }
}

// ============================================================================
// Restrictor
// ============================================================================

/// A named region a track may be required to pass through (or avoid).
///
/// # Example
/// ```
/// use flight_track::{AltitudeBand, GpsPoint, Restrictor};
///
/// let r = Restrictor::square_box("SFO", GpsPoint::new(37.6188, -122.3750), 10.0)
///     .unwrap()
///     .with_altitude(AltitudeBand::below(5000.0))
///     .unwrap();
/// assert!(r.can_contain());
/// assert!(r.contains_point(&GpsPoint::new(37.62, -122.38), 3000.0));
/// assert!(!r.contains_point(&GpsPoint::new(37.62, -122.38), 8000.0));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum Restrictor {
    Box(BoxRestrictor),
    Plane(VerticalPlaneRestrictor),
    Polygon(PolygonRestrictor),
}

impl Restrictor {
    /// A square box, `side_km` per side, with no altitude limits.
    pub fn square_box(name: &str, center: GpsPoint, side_km: f64) -> Result<Self> {
        let r = Restrictor::Box(BoxRestrictor {
            name: name.to_string(),
            center,
            side_km,
            altitude: AltitudeBand::unbounded(),
            exclusion: false,
        });
        r.validate()?;
        Ok(r)
    }

    /// A vertical wall from `start` to `end`, with no altitude limits.
    pub fn vertical_plane(name: &str, start: GpsPoint, end: GpsPoint) -> Result<Self> {
        let r = Restrictor::Plane(VerticalPlaneRestrictor {
            name: name.to_string(),
            start,
            end,
            altitude: AltitudeBand::unbounded(),
            exclusion: false,
        });
        r.validate()?;
        Ok(r)
    }

    /// A polygon through `vertices` (at least three; the ring is closed automatically).
    pub fn polygon(name: &str, vertices: Vec<GpsPoint>) -> Result<Self> {
        let r = Restrictor::Polygon(PolygonRestrictor {
            name: name.to_string(),
            vertices,
            altitude: AltitudeBand::unbounded(),
            exclusion: false,
        });
        r.validate()?;
        Ok(r)
    }

    pub fn with_altitude(mut self, band: AltitudeBand) -> Result<Self> {
        band.validate()?;
        match &mut self {
            Restrictor::Box(r) => r.altitude = band,
            Restrictor::Plane(r) => r.altitude = band,
            Restrictor::Polygon(r) => r.altitude = band,
        }
        Ok(self)
    }

    /// Turn this into an exclusion: satisfied only by tracks that avoid it.
    pub fn excluding(mut self) -> Self {
        match &mut self {
            Restrictor::Box(r) => r.exclusion = true,
            Restrictor::Plane(r) => r.exclusion = true,
            Restrictor::Polygon(r) => r.exclusion = true,
        }
        self
    }

    /// Check the geometry is usable. Restrictors built through the
    /// constructors are always valid; deserialized ones may not be.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(FlightTrackError::InvalidRestrictor(format!("{}: {}", self.name(), msg)));

        match self {
            Restrictor::Box(r) => {
                if !r.center.is_valid() {
                    return invalid(format!("invalid center {}", r.center));
                }
                if !(r.side_km.is_finite() && r.side_km > 0.0) {
                    return invalid(format!("box side must be positive, got {}", r.side_km));
                }
            }
            Restrictor::Plane(r) => {
                if !r.start.is_valid() || !r.end.is_valid() {
                    return invalid(format!("invalid endpoint {} - {}", r.start, r.end));
                }
                if r.start == r.end {
                    return invalid(format!("plane endpoints coincide at {}", r.start));
                }
            }
            Restrictor::Polygon(r) => {
                if r.vertices.len() < 3 {
                    return invalid(format!("polygon needs at least 3 vertices, got {}", r.vertices.len()));
                }
                if let Some(bad) = r.vertices.iter().find(|p| !p.is_valid()) {
                    return invalid(format!("invalid vertex {}", bad));
                }
            }
        }
        self.altitude().validate()
    }

    pub fn name(&self) -> &str {
        match self {
            Restrictor::Box(r) => &r.name,
            Restrictor::Plane(r) => &r.name,
            Restrictor::Polygon(r) => &r.name,
        }
    }

    /// Whether a single point can lie inside this shape. False for planes,
    /// which can only be crossed.
    pub fn can_contain(&self) -> bool {
        !matches!(self, Restrictor::Plane(_))
    }

    pub fn is_exclusion(&self) -> bool {
        match self {
            Restrictor::Box(r) => r.exclusion,
            Restrictor::Plane(r) => r.exclusion,
            Restrictor::Polygon(r) => r.exclusion,
        }
    }

    pub fn altitude(&self) -> &AltitudeBand {
        match self {
            Restrictor::Box(r) => &r.altitude,
            Restrictor::Plane(r) => &r.altitude,
            Restrictor::Polygon(r) => &r.altitude,
        }
    }

    pub fn altitude_in_band(&self, altitude: f64) -> bool {
        self.altitude().contains(altitude)
    }

    /// Plan-view bounding box of the shape.
    pub fn bounding_box(&self) -> Bounds {
        match self {
            Restrictor::Box(r) => r.bounds(),
            Restrictor::Plane(r) => {
                let mut b = Bounds::from_point(&r.start);
                b.enclose(&r.end);
                b
            }
            Restrictor::Polygon(r) => r.bounds(),
        }
    }

    /// Plan-view region of a box or polygon. `None` for planes.
    fn region(&self) -> Option<Region> {
        match self {
            Restrictor::Box(r) => Some(Region::Rect(r.bounds())),
            Restrictor::Plane(_) => None,
            Restrictor::Polygon(r) => Some(Region::Polygon(r.to_polygon())),
        }
    }

    /// Is the point inside the shape, altitude band included? Always false
    /// for planes.
    pub fn contains_point(&self, position: &GpsPoint, altitude: f64) -> bool {
        self.region().is_some_and(|region| region.contains(position)) && self.altitude_in_band(altitude)
    }

    /// Classify a track segment against this restrictor.
    ///
    /// For boxes and polygons the endpoints decide: both inside is
    /// `IsContained`, outside-to-inside `StraddlesStart`, inside-to-outside
    /// `StraddlesEnd`. A segment with both ends outside is `Contains` when it
    /// cuts across the shape (neither end inside in plan view, and its
    /// altitude range meets the band), otherwise disjoint.
    ///
    /// For planes, a crossing whose interpolated altitude is inside the band
    /// is `StraddlesStart`: the segment's second point is the first one on
    /// the far side.
    ///
    /// Disjoint results are always `DisjointAfter`.
    pub fn overlaps_line(&self, segment: &Segment) -> OverlapOutcome {
        if let Restrictor::Plane(r) = self {
            return match r.crossing(segment) {
                Some((_, altitude)) if r.altitude.contains(altitude) => OverlapOutcome::StraddlesStart,
                _ => OverlapOutcome::DisjointAfter,
            };
        }

        let Some(region) = self.region() else {
            return OverlapOutcome::DisjointAfter;
        };
        let band = self.altitude();
        let from_planar = region.contains(&segment.from);
        let to_planar = region.contains(&segment.to);
        let from_inside = from_planar && band.contains(segment.from_altitude);
        let to_inside = to_planar && band.contains(segment.to_altitude);

        match (from_inside, to_inside) {
            (true, true) => OverlapOutcome::IsContained,
            (false, true) => OverlapOutcome::StraddlesStart,
            (true, false) => OverlapOutcome::StraddlesEnd,
            (false, false) => {
                let cuts_across = !from_planar
                    && !to_planar
                    && region.intersects(segment)
                    && band.overlaps_span(segment.from_altitude, segment.to_altitude);
                if cuts_across {
                    OverlapOutcome::Contains
                } else {
                    OverlapOutcome::DisjointAfter
                }
            }
        }
    }

    /// One-line human-readable description.
    pub fn describe(&self) -> String {
        let shape = match self {
            Restrictor::Box(r) => format!("{:.1}km box at {}", r.side_km, r.center),
            Restrictor::Plane(r) => format!("window {} to {}", r.start, r.end),
            Restrictor::Polygon(r) => format!("{}-sided polygon", r.vertices.len()),
        };
        let exclusion = if self.is_exclusion() { ", excluding" } else { "" };
        format!("{}: {}, {}{}", self.name(), shape, self.altitude(), exclusion)
    }
}

impl std::fmt::Display for Restrictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.describe())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(from: (f64, f64, f64), to: (f64, f64, f64)) -> Segment {
        Segment {
            from: GpsPoint::new(from.0, from.1),
            to: GpsPoint::new(to.0, to.1),
            from_altitude: from.2,
            to_altitude: to.2,
            i: 0,
            j: 1,
        }
    }

    fn origin_box() -> Restrictor {
        Restrictor::square_box("ORIGIN", GpsPoint::new(0.0, 0.0), 2000.0).unwrap()
    }

    fn wall() -> Restrictor {
        Restrictor::vertical_plane("WALL", GpsPoint::new(10.0, -100.0), GpsPoint::new(10.0, 100.0)).unwrap()
    }

    fn square_polygon() -> Restrictor {
        Restrictor::polygon(
            "SQUARE",
            vec![
                GpsPoint::new(-6.0, -6.0),
                GpsPoint::new(6.0, -6.0),
                GpsPoint::new(6.0, 6.0),
                GpsPoint::new(-6.0, 6.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_altitude_band() {
        let band = AltitudeBand::between(10.0, 20.0);
        assert!(band.contains(10.0));
        assert!(band.contains(20.0));
        assert!(!band.contains(20.1));
        assert!(band.overlaps_span(4.0, 24.0));
        assert!(band.overlaps_span(24.0, 15.0));
        assert!(!band.overlaps_span(21.0, 30.0));
        assert!(AltitudeBand::unbounded().contains(-500.0));
        assert!(AltitudeBand::above(5000.0).contains(40000.0));
        assert!(!AltitudeBand::below(5000.0).contains(5001.0));
        assert_eq!(AltitudeBand::between(0.0, 5000.0).to_string(), "0-5000ft");
        assert_eq!(AltitudeBand::unbounded().to_string(), "any altitude");
    }

    #[test]
    fn test_box_overlaps_line() {
        let b = origin_box();
        assert_eq!(b.overlaps_line(&seg((-5.0, 0.0, 0.0), (5.0, 0.0, 0.0))), OverlapOutcome::IsContained);
        assert_eq!(b.overlaps_line(&seg((-10.0, 0.0, 0.0), (-5.0, 0.0, 0.0))), OverlapOutcome::StraddlesStart);
        assert_eq!(b.overlaps_line(&seg((5.0, 0.0, 0.0), (10.0, 0.0, 0.0))), OverlapOutcome::StraddlesEnd);
        assert_eq!(b.overlaps_line(&seg((-10.0, 0.0, 0.0), (10.0, 0.0, 0.0))), OverlapOutcome::Contains);
        assert_eq!(b.overlaps_line(&seg((-20.0, 0.0, 0.0), (-10.0, 0.0, 0.0))), OverlapOutcome::DisjointAfter);
        assert_eq!(b.overlaps_line(&seg((50.0, 0.0, 0.0), (60.0, 0.0, 0.0))), OverlapOutcome::DisjointAfter);
    }

    #[test]
    fn test_box_altitude_filters_endpoints() {
        let b = origin_box().with_altitude(AltitudeBand::between(10.0, 20.0)).unwrap();

        // Planar inside, below the floor
        assert!(b.overlaps_line(&seg((-2.0, 0.0, 4.0), (2.0, 0.0, 4.0))).is_disjoint());
        // Climbs into the band
        assert_eq!(b.overlaps_line(&seg((-2.0, 0.0, 4.0), (2.0, 0.0, 14.0))), OverlapOutcome::StraddlesStart);
        // Climbs out of it
        assert_eq!(b.overlaps_line(&seg((-2.0, 0.0, 14.0), (2.0, 0.0, 24.0))), OverlapOutcome::StraddlesEnd);
        // Crosses the box, altitude span meets the band
        assert_eq!(b.overlaps_line(&seg((-10.0, 0.0, 0.0), (10.0, 0.0, 30.0))), OverlapOutcome::Contains);
        // Crosses the box entirely above the band
        assert!(b.overlaps_line(&seg((-10.0, 0.0, 30.0), (10.0, 0.0, 40.0))).is_disjoint());
    }

    #[test]
    fn test_box_bounds_scale_with_side() {
        let bounds = origin_box().bounding_box();
        assert!((bounds.max_lat - 8.983).abs() < 0.001);
        assert!((bounds.min_lat + 8.983).abs() < 0.001);
    }

    #[test]
    fn test_plane_crossing() {
        let w = wall();
        assert!(!w.can_contain());
        assert!(!w.contains_point(&GpsPoint::new(10.0, 0.0), 0.0));
        assert_eq!(w.overlaps_line(&seg((8.0, 0.0, 0.0), (16.0, 0.0, 0.0))), OverlapOutcome::StraddlesStart);
        assert_eq!(w.overlaps_line(&seg((16.0, 0.0, 0.0), (8.0, 0.0, 0.0))), OverlapOutcome::StraddlesStart);
        assert!(w.overlaps_line(&seg((2.0, 0.0, 0.0), (8.0, 0.0, 0.0))).is_disjoint());
        // Beyond the end of the wall
        assert!(w.overlaps_line(&seg((8.0, 150.0, 0.0), (16.0, 150.0, 0.0))).is_disjoint());
    }

    #[test]
    fn test_plane_interpolates_altitude() {
        let w = wall().with_altitude(AltitudeBand::between(5.0, 20.0)).unwrap();
        // Crosses lat 10 a quarter of the way along: altitude 0 + 0.25 * 40 = 10
        assert_eq!(w.overlaps_line(&seg((8.0, 0.0, 0.0), (16.0, 0.0, 40.0))), OverlapOutcome::StraddlesStart);
        // Same geometry, altitude at the crossing is 25
        assert!(w.overlaps_line(&seg((8.0, 0.0, 15.0), (16.0, 0.0, 55.0))).is_disjoint());

        let (point, altitude) = match &w {
            Restrictor::Plane(p) => p.crossing(&seg((8.0, 0.0, 0.0), (16.0, 0.0, 40.0))).unwrap(),
            _ => unreachable!(),
        };
        assert!((point.latitude - 10.0).abs() < 1e-9);
        assert!((altitude - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_plane_collinear_is_not_crossing() {
        let w = wall();
        assert!(w.overlaps_line(&seg((10.0, -5.0, 0.0), (10.0, 5.0, 0.0))).is_disjoint());
    }

    #[test]
    fn test_polygon_overlaps_line() {
        let p = square_polygon();
        assert!(p.contains_point(&GpsPoint::new(0.0, 0.0), 0.0));
        assert!(p.contains_point(&GpsPoint::new(6.0, 0.0), 0.0));
        assert!(!p.contains_point(&GpsPoint::new(7.0, 0.0), 0.0));

        assert_eq!(p.overlaps_line(&seg((-10.0, 0.0, 0.0), (-5.0, 0.0, 0.0))), OverlapOutcome::StraddlesStart);
        assert_eq!(p.overlaps_line(&seg((-10.0, 0.0, 0.0), (10.0, 0.0, 0.0))), OverlapOutcome::Contains);
        assert!(p.overlaps_line(&seg((-10.0, 10.0, 0.0), (10.0, 10.0, 0.0))).is_disjoint());

        let b = p.bounding_box();
        assert_eq!((b.min_lat, b.max_lat, b.min_lng, b.max_lng), (-6.0, 6.0, -6.0, 6.0));
    }

    #[test]
    fn test_polygon_altitude_band_outcomes() {
        let p = square_polygon().with_altitude(AltitudeBand::between(1000.0, 3000.0)).unwrap();

        assert_eq!(p.overlaps_line(&seg((0.0, 0.0, 2000.0), (1.0, 1.0, 2000.0))), OverlapOutcome::IsContained);
        assert_eq!(p.overlaps_line(&seg((-10.0, 0.0, 2000.0), (0.0, 0.0, 2000.0))), OverlapOutcome::StraddlesStart);
        assert_eq!(p.overlaps_line(&seg((0.0, 0.0, 2000.0), (10.0, 0.0, 2000.0))), OverlapOutcome::StraddlesEnd);
        assert_eq!(p.overlaps_line(&seg((-10.0, 0.0, 500.0), (10.0, 0.0, 4000.0))), OverlapOutcome::Contains);

        // Ends inside in plan view but below the band
        assert!(p.overlaps_line(&seg((-10.0, 0.0, 500.0), (0.0, 0.0, 500.0))).is_disjoint());
        // Cuts across entirely above the band
        assert!(p.overlaps_line(&seg((-10.0, 0.0, 4000.0), (10.0, 0.0, 5000.0))).is_disjoint());

        assert!(!wall().contains_point(&GpsPoint::new(10.0, 0.0), 15.0));
    }

    #[test]
    fn test_constructor_validation() {
        let origin = GpsPoint::new(0.0, 0.0);
        assert!(matches!(
            Restrictor::square_box("X", origin, 0.0),
            Err(FlightTrackError::InvalidRestrictor(_))
        ));
        assert!(Restrictor::square_box("X", GpsPoint::new(95.0, 0.0), 10.0).is_err());
        assert!(Restrictor::vertical_plane("X", origin, origin).is_err());
        assert!(Restrictor::polygon("X", vec![origin, GpsPoint::new(1.0, 1.0)]).is_err());
        assert!(origin_box().with_altitude(AltitudeBand::between(20.0, 10.0)).is_err());
    }

    #[test]
    fn test_exclusion_and_describe() {
        let r = origin_box().with_altitude(AltitudeBand::below(5000.0)).unwrap().excluding();
        assert!(r.is_exclusion());
        assert_eq!(r.name(), "ORIGIN");
        assert_eq!(r.to_string(), "ORIGIN: 2000.0km box at (0.00000,0.00000), below 5000ft, excluding");
        assert!(!wall().is_exclusion());
        assert!(square_polygon().describe().contains("4-sided polygon"));
    }
}
