//! # Flight Track
//!
//! Splicing and geo-restriction analysis for aircraft position tracks.
//!
//! This library provides:
//! - A time-ordered [`Track`] of [`Trackpoint`]s, fed by any number of sources
//! - A [`TrackComparator`] that decides whether a new fragment plausibly
//!   extends an existing track, or belongs to a new logical flight
//! - [`Restrictor`]s (boxes, polygons and vertical "walls", all optionally
//!   altitude-bounded) combined into [`RestrictorSet`]s with ALL/ANY logic
//! - An [`IntersectableTrack`] that finds, at trackpoint precision, the span of
//!   a track that satisfies a restrictor
//!
//! ## Features
//!
//! - **`serde`** - Derive `Serialize`/`Deserialize` on the data model and configs
//! - **`parallel`** - Evaluate restrictor sets across many tracks with rayon
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::{Duration, TimeZone, Utc};
//! use flight_track::{
//!     GpsPoint, IntersectConfig, IntersectableTrack, Restrictor, Track, Trackpoint,
//! };
//!
//! let t0 = Utc.with_ymd_and_hms(2016, 1, 1, 21, 0, 0).unwrap();
//! let points: Vec<Trackpoint> = [-20.0, -10.0, -5.0, 5.0, 10.0, 20.0]
//!     .iter()
//!     .enumerate()
//!     .map(|(i, lat)| {
//!         Trackpoint::new("ADSB", t0 + Duration::minutes(i as i64), GpsPoint::new(*lat, 0.0), 5000.0)
//!     })
//!     .collect();
//!
//! let track = IntersectableTrack::new(Track::new(points), &IntersectConfig::default()).unwrap();
//! let area = Restrictor::square_box("ORIGIN", GpsPoint::new(0.0, 0.0), 2000.0).unwrap();
//!
//! let outcome = track.satisfies_restrictor(&area);
//! assert!(outcome.satisfied);
//! let span = outcome.intersection.unwrap();
//! assert_eq!((span.i, span.j), (2, 3));
//! ```

use geo::{Coord, Line, Rect};

pub mod error;
pub use error::{FlightTrackError, Result};

pub mod geo_utils;

pub mod track;
pub use track::{Track, Trackpoint};

pub mod compare;
pub use compare::{CompareConfig, CompareOutcome, TrackComparator};

pub mod restrictor;
pub use restrictor::{AltitudeBand, BoxRestrictor, PolygonRestrictor, Restrictor, VerticalPlaneRestrictor};

pub mod restrictor_set;
pub use restrictor_set::{CombinationLogic, RestrictorSet};

pub mod intersect;
pub use intersect::{
    AnalysisDisplay, IntersectConfig, IntersectableTrack, PointAnnotation,
    RestrictorIntersectOutcome, RestrictorSetIntersectOutcome, TrackAnnotations,
    TrackIntersection, evaluate_tracks,
};

#[cfg(feature = "parallel")]
pub use intersect::evaluate_tracks_parallel;

// ============================================================================
// Core Types
// ============================================================================

/// A position with latitude and longitude, in degrees.
///
/// # Example
/// ```
/// use flight_track::GpsPoint;
/// let sfo = GpsPoint::new(37.6188, -122.3750);
/// assert!(sfo.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }

    /// The point as a `geo` coordinate (x = longitude, y = latitude).
    pub fn to_coord(&self) -> Coord {
        Coord { x: self.longitude, y: self.latitude }
    }
}

impl std::fmt::Display for GpsPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.5},{:.5})", self.latitude, self.longitude)
    }
}

/// Axis-aligned lat/long bounding box. Bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Create bounds from GPS points. `None` for empty input.
    pub fn from_points(points: &[GpsPoint]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut bounds = Self::from_point(first);
        for p in rest {
            bounds.enclose(p);
        }
        Some(bounds)
    }

    /// Zero-area bounds around a single point.
    pub fn from_point(p: &GpsPoint) -> Self {
        Self {
            min_lat: p.latitude,
            max_lat: p.latitude,
            min_lng: p.longitude,
            max_lng: p.longitude,
        }
    }

    /// Grow the bounds to include `p`.
    pub fn enclose(&mut self, p: &GpsPoint) {
        self.min_lat = self.min_lat.min(p.latitude);
        self.max_lat = self.max_lat.max(p.latitude);
        self.min_lng = self.min_lng.min(p.longitude);
        self.max_lng = self.max_lng.max(p.longitude);
    }

    /// Get the center point of the bounds.
    pub fn center(&self) -> GpsPoint {
        GpsPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }

    /// Is `p` inside the bounds? Points on an edge are inside.
    pub fn contains(&self, p: &GpsPoint) -> bool {
        p.latitude >= self.min_lat
            && p.latitude <= self.max_lat
            && p.longitude >= self.min_lng
            && p.longitude <= self.max_lng
    }

    /// Area in square degrees; only meaningful for comparing boxes with each other.
    pub fn area(&self) -> f64 {
        (self.max_lat - self.min_lat) * (self.max_lng - self.min_lng)
    }

    /// Classify how `other` overlaps these bounds, plus the overlap fraction.
    /// See [`geo_utils::bounds_overlap`].
    pub fn overlaps_with(&self, other: &Bounds) -> (OverlapOutcome, f64) {
        geo_utils::bounds_overlap(self, other)
    }

    /// The bounds as a `geo` rectangle (x = longitude, y = latitude).
    pub fn to_rect(&self) -> Rect {
        Rect::new(
            Coord { x: self.min_lng, y: self.min_lat },
            Coord { x: self.max_lng, y: self.max_lat },
        )
    }
}

/// How a second range (R2) relates to a first range (R1).
///
/// Used for time ranges (R1 = one track's span, R2 = the other's), for
/// bounding boxes, and for a line segment (R2) against a restrictor (R1):
///
/// | Outcome | Time ranges | Segment vs restrictor |
/// |---------|-------------|-----------------------|
/// | `DisjointBefore` | R2 ends before R1 starts | no overlap |
/// | `DisjointAfter` | R2 starts after R1 ends | no overlap |
/// | `Contains` | R2 covers all of R1 | segment crosses the region, both ends outside |
/// | `IsContained` | R2 lies within R1 | both ends inside |
/// | `StraddlesStart` | R2 starts earlier, ends within | starts outside, ends inside |
/// | `StraddlesEnd` | R2 starts within, ends later | starts inside, ends outside |
///
/// Spatial comparisons have no natural "before"; they report disjointness as
/// `DisjointAfter`, so only [`OverlapOutcome::is_disjoint`] is meaningful there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OverlapOutcome {
    DisjointBefore,
    DisjointAfter,
    Contains,
    IsContained,
    StraddlesStart,
    StraddlesEnd,
}

impl OverlapOutcome {
    /// True for either disjoint variant.
    pub fn is_disjoint(&self) -> bool {
        matches!(self, OverlapOutcome::DisjointBefore | OverlapOutcome::DisjointAfter)
    }
}

impl std::fmt::Display for OverlapOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OverlapOutcome::DisjointBefore => "disjoint-before",
            OverlapOutcome::DisjointAfter => "disjoint-after",
            OverlapOutcome::Contains => "contains",
            OverlapOutcome::IsContained => "is-contained",
            OverlapOutcome::StraddlesStart => "straddles-start",
            OverlapOutcome::StraddlesEnd => "straddles-end",
        };
        f.write_str(s)
    }
}

/// Classify closed range `r2` relative to closed range `r1`.
///
/// Identical ranges are `Contains`, which keeps the relation total. Ranges
/// that only touch at an endpoint overlap (for zero duration).
///
/// # Example
/// ```
/// use flight_track::{range_overlap, OverlapOutcome};
/// assert_eq!(range_overlap((0, 10), (12, 20)), OverlapOutcome::DisjointAfter);
/// assert_eq!(range_overlap((0, 10), (0, 10)), OverlapOutcome::Contains);
/// assert_eq!(range_overlap((0, 10), (5, 20)), OverlapOutcome::StraddlesEnd);
/// ```
pub fn range_overlap<T: PartialOrd>(r1: (T, T), r2: (T, T)) -> OverlapOutcome {
    let (s1, e1) = r1;
    let (s2, e2) = r2;

    if e2 < s1 {
        OverlapOutcome::DisjointBefore
    } else if s2 > e1 {
        OverlapOutcome::DisjointAfter
    } else if s2 <= s1 && e2 >= e1 {
        OverlapOutcome::Contains
    } else if s2 >= s1 && e2 <= e1 {
        OverlapOutcome::IsContained
    } else if s2 < s1 {
        OverlapOutcome::StraddlesStart
    } else {
        OverlapOutcome::StraddlesEnd
    }
}

/// A line segment between two trackpoints, remembering their track indices.
///
/// A coarse segment may skip over intermediate trackpoints, so `j - i` can be
/// larger than one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub from: GpsPoint,
    pub to: GpsPoint,
    /// Pressure altitude at `from`, in feet
    pub from_altitude: f64,
    /// Pressure altitude at `to`, in feet
    pub to_altitude: f64,
    /// Track index of `from`
    pub i: usize,
    /// Track index of `to`
    pub j: usize,
}

impl Segment {
    /// Both endpoints at the same position; carries no direction information.
    pub fn is_degenerate(&self) -> bool {
        self.from == self.to
    }

    /// Number of real track spans covered by this segment.
    pub fn span(&self) -> usize {
        self.j.saturating_sub(self.i)
    }

    /// The segment as a `geo` line in plan view, ignoring altitude.
    pub fn to_line(&self) -> Line {
        Line::new(self.from.to_coord(), self.to.to_coord())
    }

    /// Plan-view bounding box of both endpoints.
    pub fn bounds(&self) -> Bounds {
        let mut b = Bounds::from_point(&self.from);
        b.enclose(&self.to);
        b
    }

    /// Altitude at `ratio` (0.0 = `from`, 1.0 = `to`) along the segment.
    pub fn altitude_at(&self, ratio: f64) -> f64 {
        self.from_altitude + (self.to_altitude - self.from_altitude) * ratio
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{},{}] {}@{:.0}ft -> {}@{:.0}ft",
            self.i, self.j, self.from, self.from_altitude, self.to, self.to_altitude
        )
    }
}

/// (De)serialize a `chrono::Duration` as whole seconds.
#[cfg(feature = "serde")]
pub(crate) mod duration_secs {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_i64(d.num_seconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Duration, D::Error> {
        Ok(Duration::seconds(i64::deserialize(d)?))
    }
}

/// Seconds with millisecond precision, for trace output.
pub(crate) fn fmt_secs(d: chrono::Duration) -> String {
    format!("{:.3}s", d.num_milliseconds() as f64 / 1000.0)
}

// ============================================================================
// Tests
// ============================================================================


#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;

    #[test]
    fn test_restrictor_set_round_trip() {
        let set = RestrictorSet::new("mixed", CombinationLogic::Any)
            .with_user("ops")
            .with_tag("sfo")
            .with_restrictor(
                Restrictor::square_box("BOX", GpsPoint::new(37.5, -122.25), 10.0)
                    .and_then(|r| r.with_altitude(AltitudeBand::below(5000.0)))
                    .unwrap(),
            )
            .with_restrictor(
                Restrictor::vertical_plane("WALL", GpsPoint::new(37.0, -122.0), GpsPoint::new(37.5, -121.5))
                    .unwrap()
                    .excluding(),
            )
            .with_restrictor(
                Restrictor::polygon(
                    "TRI",
                    vec![GpsPoint::new(0.0, 0.0), GpsPoint::new(1.0, 0.0), GpsPoint::new(0.0, 1.0)],
                )
                .unwrap(),
            );

        let json = serde_json::to_string(&set).unwrap();
        assert!(json.contains(r#""type":"box""#));
        assert!(json.contains(r#""type":"plane""#));
        assert!(json.contains(r#""type":"polygon""#));
        assert!(json.contains(r#""logic":"any""#));

        let back: RestrictorSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }

    #[test]
    fn test_restrictor_defaults_when_fields_missing() {
        let json = r#"{"type":"box","name":"B","center":{"latitude":1.0,"longitude":2.0},"side_km":5.0}"#;
        let r: Restrictor = serde_json::from_str(json).unwrap();
        assert!(r.altitude().is_unbounded());
        assert!(!r.is_exclusion());
        assert!(r.validate().is_ok());
    }

    #[test]
    fn test_config_durations_as_seconds() {
        let config = CompareConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains(r#""max_gap":600"#));
        assert!(json.contains(r#""max_overlap":60"#));
        assert_eq!(serde_json::from_str::<CompareConfig>(&json).unwrap(), config);

        let intersect: IntersectConfig = serde_json::from_str(r#"{"sample_interval":5}"#).unwrap();
        assert_eq!(intersect.sample_interval, chrono::Duration::seconds(5));
    }

    #[test]
    fn test_track_deserializes_sorted() {
        let json = r#"[
            {"source":"ADSB","timestamp":"2016-01-01T21:02:00Z","position":{"latitude":2.0,"longitude":0.0},"altitude":5000.0},
            {"source":"FA","timestamp":"2016-01-01T21:00:00Z","position":{"latitude":0.0,"longitude":0.0},"altitude":4000.0},
            {"source":"ADSB","timestamp":"2016-01-01T21:01:00Z","position":{"latitude":1.0,"longitude":0.0},"altitude":4500.0}
        ]"#;
        let track: Track = serde_json::from_str(json).unwrap();
        let lats: Vec<f64> = track.iter().map(|p| p.position.latitude).collect();
        assert_eq!(lats, vec![0.0, 1.0, 2.0]);
        assert_eq!(track.points()[0].receiver, None);

        let again: Track = serde_json::from_str(&serde_json::to_string(&track).unwrap()).unwrap();
        assert_eq!(again, track);
    }
}
