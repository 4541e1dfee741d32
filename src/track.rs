//! # Tracks
//!
//! A [`Track`] is a time-ordered sequence of [`Trackpoint`]s for one physical
//! flight. Points may come from several sources (local receivers, third-party
//! feeds, radar extracts) and arrive out of order; the track keeps them sorted
//! by timestamp, and sorting is stable so duplicates stay in arrival order.
//!
//! Sampling is irregular. Spatial queries work on the coarse line segments
//! produced by [`Track::lines_sampled_every`], which always remember the real
//! track indices of their endpoints.

use chrono::{DateTime, Duration, Utc};

use crate::error::{FlightTrackError, Result};
use crate::{geo_utils, Bounds, GpsPoint, Segment};

/// Feet per kilometer, for mixing altitude with ground distance.
const FEET_PER_KM: f64 = 3280.84;

/// One positional sample of an aircraft.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Trackpoint {
    /// Data source identifier (e.g. "ADSB", "FA", "RG-FOIA")
    pub source: String,
    /// Name of the receiver that produced the sample, if known
    #[cfg_attr(feature = "serde", serde(default))]
    pub receiver: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub position: GpsPoint,
    /// Pressure altitude in feet
    pub altitude: f64,
    /// Ground speed in knots
    #[cfg_attr(feature = "serde", serde(default))]
    pub ground_speed: f64,
    /// Heading in degrees
    #[cfg_attr(feature = "serde", serde(default))]
    pub heading: f64,
    /// Reported vertical rate in feet per minute
    #[cfg_attr(feature = "serde", serde(default))]
    pub vertical_rate: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub squawk: Option<String>,

    // Derived by Track::post_process
    #[cfg_attr(feature = "serde", serde(default))]
    pub distance_travelled_km: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub vertical_speed_fpm: f64,
    /// Knots per second
    #[cfg_attr(feature = "serde", serde(default))]
    pub ground_acceleration_kps: f64,
    /// Climb (positive) or descent angle, in degrees
    #[cfg_attr(feature = "serde", serde(default))]
    pub angle_of_inclination: f64,
}

impl Trackpoint {
    /// Create a trackpoint with position and altitude; all other fields zero/empty.
    pub fn new(source: &str, timestamp: DateTime<Utc>, position: GpsPoint, altitude: f64) -> Self {
        Self {
            source: source.to_string(),
            receiver: None,
            timestamp,
            position,
            altitude,
            ground_speed: 0.0,
            heading: 0.0,
            vertical_rate: 0.0,
            squawk: None,
            distance_travelled_km: 0.0,
            vertical_speed_fpm: 0.0,
            ground_acceleration_kps: 0.0,
            angle_of_inclination: 0.0,
        }
    }

    pub fn with_velocity(mut self, ground_speed: f64, heading: f64, vertical_rate: f64) -> Self {
        self.ground_speed = ground_speed;
        self.heading = heading;
        self.vertical_rate = vertical_rate;
        self
    }

    pub fn with_receiver(mut self, receiver: &str) -> Self {
        self.receiver = Some(receiver.to_string());
        self
    }

    pub fn with_squawk(mut self, squawk: &str) -> Self {
        self.squawk = Some(squawk.to_string());
        self
    }

    /// Line segment from this point to `to`, tagged with their track indices.
    pub fn segment_to(&self, to: &Trackpoint, i: usize, j: usize) -> Segment {
        Segment {
            from: self.position,
            to: to.position,
            from_altitude: self.altitude,
            to_altitude: to.altitude,
            i,
            j,
        }
    }

    /// A synthetic point `ratio` of the way from `self` to `to`.
    ///
    /// Position is interpolated linearly in lat/long, heading along the
    /// shortest arc, and the timestamp is truncated to whole milliseconds.
    /// Identity fields (source, receiver, squawk) are taken from `self`.
    pub fn interpolate_to(&self, to: &Trackpoint, ratio: f64) -> Trackpoint {
        let lerp = |a: f64, b: f64| a + (b - a) * ratio;
        let elapsed_ms = (to.timestamp - self.timestamp).num_milliseconds() as f64;

        Trackpoint {
            source: self.source.clone(),
            receiver: self.receiver.clone(),
            timestamp: self.timestamp + Duration::milliseconds((elapsed_ms * ratio) as i64),
            position: GpsPoint::new(
                lerp(self.position.latitude, to.position.latitude),
                lerp(self.position.longitude, to.position.longitude),
            ),
            altitude: lerp(self.altitude, to.altitude),
            ground_speed: lerp(self.ground_speed, to.ground_speed),
            heading: geo_utils::interpolate_heading(self.heading, to.heading, ratio),
            vertical_rate: lerp(self.vertical_rate, to.vertical_rate),
            squawk: self.squawk.clone(),
            distance_travelled_km: lerp(self.distance_travelled_km, to.distance_travelled_km),
            vertical_speed_fpm: lerp(self.vertical_speed_fpm, to.vertical_speed_fpm),
            ground_acceleration_kps: lerp(self.ground_acceleration_kps, to.ground_acceleration_kps),
            angle_of_inclination: lerp(self.angle_of_inclination, to.angle_of_inclination),
        }
    }
}

impl std::fmt::Display for Trackpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {} {} {:.0}ft {:.0}kt {:.0}deg",
            self.source,
            self.timestamp.format("%H:%M:%S%.3f"),
            self.position,
            self.altitude,
            self.ground_speed,
            self.heading
        )?;
        if let Some(squawk) = &self.squawk {
            write!(f, " sq{}", squawk)?;
        }
        Ok(())
    }
}

/// A time-ordered sequence of trackpoints.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "Vec<Trackpoint>", into = "Vec<Trackpoint>"))]
pub struct Track {
    points: Vec<Trackpoint>,
}

impl From<Vec<Trackpoint>> for Track {
    fn from(points: Vec<Trackpoint>) -> Self {
        Track::new(points)
    }
}

impl From<Track> for Vec<Trackpoint> {
    fn from(track: Track) -> Self {
        track.points
    }
}

impl Track {
    /// Build a track, sorting the points by timestamp (stable).
    pub fn new(mut points: Vec<Trackpoint>) -> Self {
        points.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Self { points }
    }

    pub fn points(&self) -> &[Trackpoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Trackpoint> {
        self.points.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Trackpoint> {
        self.points.iter()
    }

    fn require_points(&self, what: &str) -> Result<(&Trackpoint, &Trackpoint)> {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => Ok((first, last)),
            _ => Err(FlightTrackError::EmptyTrack(what.to_string())),
        }
    }

    pub fn start(&self) -> Result<DateTime<Utc>> {
        Ok(self.require_points("start time")?.0.timestamp)
    }

    pub fn end(&self) -> Result<DateTime<Utc>> {
        Ok(self.require_points("end time")?.1.timestamp)
    }

    /// `(start, end)` timestamps.
    pub fn time_range(&self) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        let (first, last) = self.require_points("time range")?;
        Ok((first.timestamp, last.timestamp))
    }

    pub fn duration(&self) -> Result<Duration> {
        let (start, end) = self.time_range()?;
        Ok(end - start)
    }

    /// Bounding box of every point in the track.
    pub fn full_bounds(&self) -> Option<Bounds> {
        let positions: Vec<GpsPoint> = self.points.iter().map(|p| p.position).collect();
        Bounds::from_points(&positions)
    }

    /// Bounding box of just the first and last points.
    pub fn start_end_bounds(&self) -> Option<Bounds> {
        let (first, last) = self.require_points("bounds").ok()?;
        let mut bounds = Bounds::from_point(&first.position);
        bounds.enclose(&last.position);
        Some(bounds)
    }

    /// Great-circle length along the track, in km.
    pub fn length_km(&self) -> f64 {
        let positions: Vec<GpsPoint> = self.points.iter().map(|p| p.position).collect();
        geo_utils::polyline_length_km(&positions)
    }

    /// Distinct data sources, in order of first appearance.
    pub fn sources(&self) -> Vec<&str> {
        let mut sources: Vec<&str> = Vec::new();
        for p in &self.points {
            if !sources.contains(&p.source.as_str()) {
                sources.push(&p.source);
            }
        }
        sources
    }

    /// Append all of `other`'s points and restore timestamp order.
    ///
    /// Duplicate points are kept; when timestamps tie, existing points stay
    /// ahead of the merged ones.
    pub fn merge(&mut self, other: &Track) {
        self.points.extend(other.points.iter().cloned());
        self.points.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    }

    /// Points within `[s, e]` (inclusive).
    pub fn trim_to_times(&self, s: DateTime<Utc>, e: DateTime<Utc>) -> Track {
        self.padded_trim_to_times(s, e, 0)
    }

    /// Points within `[s, e]` (inclusive), plus up to `padding` neighboring
    /// points on either side.
    ///
    /// If the interval falls entirely between two consecutive points, those
    /// two bracketing points are returned. An interval that lies completely
    /// before or after the track gives an empty track.
    pub fn padded_trim_to_times(&self, s: DateTime<Utc>, e: DateTime<Utc>, padding: usize) -> Track {
        let n = self.points.len();
        if n == 0 || e < s {
            return Track::default();
        }

        // lo: first point at or after s; hi: one past the last point at or before e
        let lo = self.points.partition_point(|p| p.timestamp < s);
        let hi = self.points.partition_point(|p| p.timestamp <= e);
        if lo == n || hi == 0 {
            return Track::default();
        }

        let pad = if lo < hi { padding } else { padding.max(1) };
        let from = lo.saturating_sub(pad);
        let to = (hi + pad).min(n);

        Track { points: self.points[from..to].to_vec() }
    }

    /// Index of the last point whose timestamp is not after `tm`.
    /// `None` if `tm` is outside the track's time range.
    pub fn index_at_time(&self, tm: DateTime<Utc>) -> Option<usize> {
        let (start, end) = self.time_range().ok()?;
        if tm < start || tm > end {
            return None;
        }
        let after = self.points.partition_point(|p| p.timestamp <= tm);
        Some(after.saturating_sub(1))
    }

    /// Copies of the points within the time range; the bounds may be given
    /// in either order.
    pub fn clip_to(&self, s: DateTime<Utc>, e: DateTime<Utc>) -> Vec<Trackpoint> {
        let (s, e) = if e < s { (e, s) } else { (s, e) };
        self.points
            .iter()
            .filter(|p| p.timestamp >= s && p.timestamp <= e)
            .cloned()
            .collect()
    }

    /// A thinned copy with roughly one point per `interval`: each kept point
    /// is more than `interval` after the previously kept one.
    pub fn sample_every(&self, interval: Duration) -> Track {
        let mut kept: Vec<Trackpoint> = Vec::new();
        for p in &self.points {
            match kept.last() {
                Some(last) if p.timestamp - last.timestamp <= interval => {}
                _ => kept.push(p.clone()),
            }
        }
        Track { points: kept }
    }

    /// Coarse line segments, each spanning just over `interval` of flight.
    ///
    /// A segment is closed as soon as a point lies more than `interval` after
    /// the segment's first point, so densely sampled stretches collapse into
    /// one segment covering several real points. A final segment always runs
    /// to the last point. Tracks with fewer than two points give no segments.
    pub fn lines_sampled_every(&self, interval: Duration) -> Vec<Segment> {
        let mut lines = Vec::new();
        if self.points.len() < 2 {
            return lines;
        }

        let mut last = 0;
        for i in 1..self.points.len() {
            if self.points[i].timestamp - self.points[last].timestamp > interval {
                lines.push(self.points[last].segment_to(&self.points[i], last, i));
                last = i;
            }
        }

        let tail = self.points.len() - 1;
        if last < tail {
            lines.push(self.points[last].segment_to(&self.points[tail], last, tail));
        }

        lines
    }

    /// Fill in the derived fields on every point from its predecessor:
    /// cumulative distance, vertical speed, ground acceleration and angle of
    /// inclination. The first point keeps zeroes.
    ///
    /// Rates between points with identical timestamps are left at zero.
    /// Dense ADS-B data gives jerky vertical figures; run this on a
    /// [`Track::sample_every`] copy for smoother values.
    pub fn post_process(&mut self) {
        if let Some(first) = self.points.first_mut() {
            first.distance_travelled_km = 0.0;
        }

        for i in 1..self.points.len() {
            let (head, tail) = self.points.split_at_mut(i);
            let prev = &head[i - 1];
            let curr = &mut tail[0];

            let dist_km = geo_utils::haversine_km(&prev.position, &curr.position);
            let secs = (curr.timestamp - prev.timestamp).num_milliseconds() as f64 / 1000.0;
            let climb_ft = curr.altitude - prev.altitude;

            curr.distance_travelled_km = prev.distance_travelled_km + dist_km;
            curr.angle_of_inclination = (climb_ft / FEET_PER_KM).atan2(dist_km).to_degrees();

            if secs > 0.0 {
                curr.vertical_speed_fpm = climb_ft / (secs / 60.0);
                curr.ground_acceleration_kps = (curr.ground_speed - prev.ground_speed) / secs;
            } else {
                curr.vertical_speed_fpm = 0.0;
                curr.ground_acceleration_kps = 0.0;
            }
        }
    }
}

impl<'a> IntoIterator for &'a Track {
    type Item = &'a Trackpoint;
    type IntoIter = std::slice::Iter<'a, Trackpoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

impl std::fmt::Display for Track {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => write!(
                f,
                "Track[{} pts, {} - {}, {}]",
                self.points.len(),
                first.timestamp.format("%Y-%m-%d %H:%M:%S"),
                last.timestamp.format("%H:%M:%S"),
                self.sources().join("+")
            ),
            _ => f.write_str("Track[empty]"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
