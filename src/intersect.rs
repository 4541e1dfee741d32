//! # Track/Restrictor Intersection
//!
//! Finds, at trackpoint precision, the span of a track that satisfies a
//! [`Restrictor`], and combines results across a [`RestrictorSet`].
//!
//! ## Algorithm
//!
//! An [`IntersectableTrack`] is built once per track. It samples the track
//! into coarse line segments (one per `sample_interval` of flight, each
//! remembering the real indices of its endpoints) and bulk-loads their
//! envelopes into an R-tree.
//!
//! 1. **Entry**: scan the coarse segments that can touch the restrictor's
//!    bounding box, in track order, for the first non-disjoint one; then walk
//!    its real sub-segments to find the first point inside.
//! 2. **Exit** (shapes that can contain a point): from the entry segment
//!    onward, find the first coarse segment that is not fully contained; walk
//!    its sub-segments backward for the last point inside.
//! 3. Annotate the span in a [`TrackAnnotations`] side table and, for
//!    exclusions, invert the verdict.
//!
//! When a restrictor is small enough to fit between two trackpoints, no
//! point lies inside it. The span then covers the points just outside and is
//! flagged [`TrackIntersection::approximate`].

use std::collections::BTreeMap;
use std::time::Instant;

use chrono::Duration;
use log::{debug, info};
use rstar::{RTree, RTreeObject, AABB};

use crate::error::{FlightTrackError, Result};
use crate::{
    fmt_secs, geo_utils, CombinationLogic, OverlapOutcome, Restrictor, RestrictorSet, Segment, Track,
    Trackpoint,
};

/// Push a line onto a trace buffer and mirror it to `log::debug!`.
macro_rules! note {
    ($buf:expr, $($arg:tt)*) => {{
        let line = format!($($arg)*);
        debug!("{}", line);
        $buf.push_str(&line);
        $buf.push('\n');
    }};
}

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for building an [`IntersectableTrack`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IntersectConfig {
    /// Time spanned by each coarse segment. Shorter intervals mean more
    /// segments but less sub-segment refinement.
    /// Default: 2 seconds
    #[cfg_attr(feature = "serde", serde(with = "crate::duration_secs"))]
    pub sample_interval: Duration,
}

impl Default for IntersectConfig {
    fn default() -> Self {
        Self {
            sample_interval: Duration::seconds(2),
        }
    }
}

impl IntersectConfig {
    pub fn validate(&self) -> Result<()> {
        if self.sample_interval <= Duration::zero() {
            return Err(FlightTrackError::InvalidConfig(format!(
                "sample_interval must be positive, got {}",
                fmt_secs(self.sample_interval)
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Results
// ============================================================================

/// The span of a track that satisfied a restrictor.
///
/// `i <= j` always; for restrictors that cannot contain a point (planes)
/// `i == j`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrackIntersection {
    pub i: usize,
    pub j: usize,
    pub start: Trackpoint,
    pub end: Trackpoint,
    /// Set when no trackpoint lies inside the restrictor and the span is the
    /// points just outside it.
    pub approximate: bool,
}

impl TrackIntersection {
    pub fn is_point_intersection(&self) -> bool {
        self.i == self.j
    }

    pub fn duration(&self) -> Duration {
        self.end.timestamp - self.start.timestamp
    }

    pub fn altitude_delta(&self) -> f64 {
        self.end.altitude - self.start.altitude
    }

    /// Synthetic point halfway between start and end.
    pub fn midpoint(&self) -> Trackpoint {
        self.start.interpolate_to(&self.end, 0.5)
    }

    /// Great-circle distance from start to end, in km.
    pub fn length_km(&self) -> f64 {
        geo_utils::haversine_km(&self.start.position, &self.end.position)
    }
}

impl std::fmt::Display for TrackIntersection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mid = self.midpoint();
        write!(
            f,
            "[{},{}]{} {:.1}km({}), alt(avg={:.0},delta={:.0}), groundspeed(avg={:.0},delta={:.0})",
            self.i,
            self.j,
            if self.approximate { "~" } else { "" },
            self.length_km(),
            fmt_secs(self.duration()),
            mid.altitude,
            self.altitude_delta(),
            mid.ground_speed,
            self.end.ground_speed - self.start.ground_speed
        )
    }
}

/// How a trackpoint should be drawn in analysis views.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AnalysisDisplay {
    #[default]
    Default,
    Omit,
    Highlight,
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PointAnnotation {
    pub display: AnalysisDisplay,
    pub notes: Vec<String>,
}

/// Per-trackpoint analysis notes, keyed by track index. Kept apart from the
/// track so that evaluating restrictors never mutates it.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrackAnnotations {
    points: BTreeMap<usize, PointAnnotation>,
}

impl TrackAnnotations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, index: usize) -> Option<&PointAnnotation> {
        self.points.get(&index)
    }

    pub fn note(&mut self, index: usize, note: impl Into<String>) {
        self.points.entry(index).or_default().notes.push(note.into());
    }

    pub fn highlight(&mut self, index: usize) {
        self.points.entry(index).or_default().display = AnalysisDisplay::Highlight;
    }

    /// Fold `other` into this table. Notes are appended; a highlight wins
    /// over any other display mode.
    pub fn merge(&mut self, other: &TrackAnnotations) {
        for (index, annotation) in &other.points {
            let entry = self.points.entry(*index).or_default();
            entry.notes.extend(annotation.notes.iter().cloned());
            if annotation.display == AnalysisDisplay::Highlight || entry.display == AnalysisDisplay::Default {
                entry.display = annotation.display;
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &PointAnnotation)> {
        self.points.iter().map(|(i, a)| (*i, a))
    }

    /// Indices of highlighted points, ascending.
    pub fn highlighted(&self) -> Vec<usize> {
        self.iter()
            .filter(|(_, a)| a.display == AnalysisDisplay::Highlight)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Result of intersecting a track with one restrictor.
#[derive(Debug, Clone, Default)]
pub struct RestrictorIntersectOutcome {
    /// The span that passed through the restrictor, if any. Present even for
    /// exclusions, whose `satisfied` is then false.
    pub intersection: Option<TrackIntersection>,
    pub satisfied: bool,
    pub debug: String,
    pub annotations: TrackAnnotations,
}

/// Result of intersecting a track with a whole restrictor set.
#[derive(Debug, Clone)]
pub struct RestrictorSetIntersectOutcome {
    /// One outcome per restrictor, in set order.
    pub outcomes: Vec<RestrictorIntersectOutcome>,
    pub logic: CombinationLogic,
    pub satisfied: bool,
}

impl RestrictorSetIntersectOutcome {
    /// Explain which restrictor the track failed.
    pub fn blame_string(&self, set: &RestrictorSet) -> String {
        if self.satisfied {
            return format!("Satisfied {}", set.name);
        }
        if set.is_empty() {
            return format!("No restrictors in {}", set.name);
        }
        if set.len() == 1 {
            return format!("Did not satisfy {}", set.restrictors[0]);
        }

        match self.logic {
            CombinationLogic::All => self
                .outcomes
                .iter()
                .zip(set.iter())
                .find(|(outcome, _)| !outcome.satisfied)
                .map(|(_, r)| format!("Did not satisfy {}", r))
                .unwrap_or_else(|| "cannot assign blame".to_string()),
            CombinationLogic::Any => format!("Did not satisfy any restriction in {}", set.name),
        }
    }

    /// Every per-restrictor trace, concatenated.
    pub fn debug(&self) -> String {
        self.outcomes
            .iter()
            .enumerate()
            .map(|(i, o)| format!("----/ outcome {:02} /----\n{}\n", i, o.debug))
            .collect()
    }

    /// Annotations from every restrictor, merged.
    pub fn annotations(&self) -> TrackAnnotations {
        let mut merged = TrackAnnotations::new();
        for outcome in &self.outcomes {
            merged.merge(&outcome.annotations);
        }
        merged
    }
}

// ============================================================================
// Intersectable Track
// ============================================================================

/// Envelope of one coarse segment, for the R-tree.
#[derive(Debug, Clone, Copy)]
struct IndexedLine {
    line: usize,
    min_lat: f64,
    max_lat: f64,
    min_lng: f64,
    max_lng: f64,
}

impl RTreeObject for IndexedLine {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners([self.min_lng, self.min_lat], [self.max_lng, self.max_lat])
    }
}

/// Where a track was found to enter a restrictor.
#[derive(Debug, Clone, Copy)]
struct Entry {
    /// Index into the coarse lines
    line: usize,
    /// Outcome of the coarse line that contained the entry
    outcome: OverlapOutcome,
    index: usize,
    approximate: bool,
}

/// A track plus its coarse line segments and their spatial index.
///
/// Build once per track and reuse for any number of restrictors; every query
/// takes `&self`.
pub struct IntersectableTrack {
    track: Track,
    lines: Vec<Segment>,
    index: RTree<IndexedLine>,
}

impl IntersectableTrack {
    /// # Errors
    /// [`FlightTrackError::EmptyTrack`] for a track with no points, and
    /// [`FlightTrackError::InvalidConfig`] for a non-positive sample interval.
    pub fn new(track: Track, config: &IntersectConfig) -> Result<Self> {
        config.validate()?;
        if track.is_empty() {
            return Err(FlightTrackError::EmptyTrack("cannot intersect an empty track".to_string()));
        }

        let lines = track.lines_sampled_every(config.sample_interval);
        let indexed: Vec<IndexedLine> = lines
            .iter()
            .enumerate()
            .map(|(line, seg)| {
                let b = seg.bounds();
                IndexedLine {
                    line,
                    min_lat: b.min_lat,
                    max_lat: b.max_lat,
                    min_lng: b.min_lng,
                    max_lng: b.max_lng,
                }
            })
            .collect();
        let index = RTree::bulk_load(indexed);

        debug!(
            "IntersectableTrack: {} points -> {} coarse lines (every {})",
            track.len(),
            lines.len(),
            fmt_secs(config.sample_interval)
        );

        Ok(Self { track, lines, index })
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn lines(&self) -> &[Segment] {
        &self.lines
    }

    pub fn into_track(self) -> Track {
        self.track
    }

    /// Find the span of the track that passes through `restrictor`.
    pub fn satisfies_restrictor(&self, restrictor: &Restrictor) -> RestrictorIntersectOutcome {
        let mut debug = String::new();
        note!(debug, "** {}", self.track);
        note!(debug, "** Geo   {}", restrictor);

        let span = if self.track.len() == 1 {
            self.single_point_span(restrictor, &mut debug)
        } else {
            self.find_span(restrictor, &mut debug)
        };

        let mut annotations = TrackAnnotations::new();
        let intersection = span.map(|(i, j, approximate)| {
            annotate(&mut annotations, restrictor, i, j);
            self.intersection(i, j, approximate)
        });

        let satisfied = intersection.is_some() != restrictor.is_exclusion();
        match &intersection {
            Some(ti) => note!(debug, "**** Final outcome: {}=[{},{}]", satisfied, ti.i, ti.j),
            None => note!(debug, "**** Final outcome: {}, no intersection", satisfied),
        }

        RestrictorIntersectOutcome {
            intersection,
            satisfied,
            debug,
            annotations,
        }
    }

    /// Evaluate every restrictor in the set and combine with the set's logic.
    pub fn satisfies_restrictor_set(&self, set: &RestrictorSet) -> RestrictorSetIntersectOutcome {
        let outcomes: Vec<RestrictorIntersectOutcome> =
            set.iter().map(|r| self.satisfies_restrictor(r)).collect();
        let verdicts: Vec<bool> = outcomes.iter().map(|o| o.satisfied).collect();
        let satisfied = set.combine(&verdicts);

        debug!("restrictor set '{}' ({}): {:?} -> {}", set.name, set.logic, verdicts, satisfied);

        RestrictorSetIntersectOutcome {
            outcomes,
            logic: set.logic,
            satisfied,
        }
    }

    fn intersection(&self, i: usize, j: usize, approximate: bool) -> TrackIntersection {
        let points = self.track.points();
        TrackIntersection {
            i,
            j,
            start: points[i].clone(),
            end: points[j].clone(),
            approximate,
        }
    }

    fn sub_segment(&self, i: usize, j: usize) -> Segment {
        let points = self.track.points();
        points[i].segment_to(&points[j], i, j)
    }

    fn single_point_span(&self, restrictor: &Restrictor, debug: &mut String) -> Option<(usize, usize, bool)> {
        let p = &self.track.points()[0];
        if restrictor.can_contain() && restrictor.contains_point(&p.position, p.altitude) {
            note!(debug, "* single-point track is inside");
            Some((0, 0, false))
        } else {
            note!(debug, "* single-point track is not inside");
            None
        }
    }

    /// Coarse lines whose envelope touches the restrictor's bounding box, in track order.
    fn candidate_lines(&self, restrictor: &Restrictor) -> Vec<usize> {
        let b = restrictor.bounding_box();
        let search = AABB::from_corners([b.min_lng, b.min_lat], [b.max_lng, b.max_lat]);
        let mut candidates: Vec<usize> = self
            .index
            .locate_in_envelope_intersecting(&search)
            .map(|l| l.line)
            .collect();
        candidates.sort_unstable();
        candidates
    }

    fn find_span(&self, restrictor: &Restrictor, debug: &mut String) -> Option<(usize, usize, bool)> {
        let Some(entry) = self.find_entry(restrictor, debug) else {
            note!(debug, "* no entry point found");
            return None;
        };

        if !restrictor.can_contain() {
            note!(debug, "* restrictor can't contain, so [{}] is the sole point", entry.index);
            return Some((entry.index, entry.index, entry.approximate));
        }

        let (exit, exit_approximate) = match self.find_exit(restrictor, &entry, debug) {
            Some(found) => found,
            None => {
                note!(debug, "* no exit found; taking the final point of the track");
                (self.track.len() - 1, false)
            }
        };

        Some((entry.index, exit.max(entry.index), entry.approximate || exit_approximate))
    }

    fn find_entry(&self, restrictor: &Restrictor, debug: &mut String) -> Option<Entry> {
        let candidates = self.candidate_lines(restrictor);
        note!(debug, "* {} of {} coarse lines near the restrictor", candidates.len(), self.lines.len());

        for line_idx in candidates {
            let line = &self.lines[line_idx];
            if line.is_degenerate() {
                continue;
            }
            let outcome = restrictor.overlaps_line(line);
            if outcome.is_disjoint() {
                continue;
            }
            note!(debug, "* line[{},{}] is first non-disjoint line ({})", line.i, line.j, outcome);

            match self.refine_entry(restrictor, line, outcome, debug) {
                Some((index, approximate)) => {
                    return Some(Entry {
                        line: line_idx,
                        outcome,
                        index,
                        approximate,
                    })
                }
                None => note!(debug, "* no sub-segment confirms line[{},{}]; moving on", line.i, line.j),
            }
        }
        None
    }

    /// The first point inside the restrictor, somewhere in `line`.
    fn refine_entry(
        &self,
        restrictor: &Restrictor,
        line: &Segment,
        outcome: OverlapOutcome,
        debug: &mut String,
    ) -> Option<(usize, bool)> {
        if matches!(outcome, OverlapOutcome::IsContained | OverlapOutcome::StraddlesEnd) {
            note!(debug, "* start point is contained, entry is [{}]", line.i);
            return Some((line.i, false));
        }

        if line.span() > 1 {
            let mut crossing = None;
            for k in line.i + 1..=line.j {
                let sub = self.sub_segment(k - 1, k);
                if sub.is_degenerate() {
                    continue;
                }
                match restrictor.overlaps_line(&sub) {
                    OverlapOutcome::StraddlesStart => {
                        note!(debug, "- sub-segment [{},{}] straddles, entry is [{}]", k - 1, k, k);
                        return Some((k, false));
                    }
                    OverlapOutcome::Contains if crossing.is_none() => crossing = Some(k - 1),
                    _ => {}
                }
            }

            if let Some(k) = crossing {
                note!(debug, "- sub-segment [{},{}] crosses with no point inside, entry ~[{}]", k, k + 1, k);
                return Some((k, true));
            }
            // The chord crossed but the real track went around the shape
            return match outcome {
                OverlapOutcome::StraddlesStart if restrictor.can_contain() => Some((line.j, false)),
                _ => None,
            };
        }

        match outcome {
            OverlapOutcome::StraddlesStart => {
                note!(debug, "* line straddles, entry is [{}]", line.j);
                Some((line.j, false))
            }
            _ => {
                note!(debug, "* line crosses with no point inside, entry ~[{}]", line.i);
                Some((line.i, true))
            }
        }
    }

    fn find_exit(&self, restrictor: &Restrictor, entry: &Entry, debug: &mut String) -> Option<(usize, bool)> {
        // The entry line is also the exit line when its far end is outside
        let first = match entry.outcome {
            OverlapOutcome::Contains | OverlapOutcome::StraddlesEnd => entry.line,
            _ => entry.line + 1,
        };

        for line in self.lines.iter().skip(first) {
            if line.is_degenerate() {
                continue;
            }
            let outcome = restrictor.overlaps_line(line);
            if outcome == OverlapOutcome::IsContained {
                continue;
            }
            note!(debug, "* line[{},{}] is first non-contained line ({})", line.i, line.j, outcome);
            return Some(self.refine_exit(restrictor, line, outcome, debug));
        }
        None
    }

    /// The last point inside the restrictor, somewhere in `line`.
    fn refine_exit(
        &self,
        restrictor: &Restrictor,
        line: &Segment,
        outcome: OverlapOutcome,
        debug: &mut String,
    ) -> (usize, bool) {
        if matches!(outcome, OverlapOutcome::IsContained | OverlapOutcome::StraddlesStart) {
            note!(debug, "* end point is contained, exit is [{}]", line.j);
            return (line.j, false);
        }
        if outcome.is_disjoint() {
            note!(debug, "* line is outside, exit is [{}]", line.i);
            return (line.i, false);
        }

        if line.span() > 1 {
            let mut crossing = None;
            for k in (line.i + 1..=line.j).rev() {
                let sub = self.sub_segment(k - 1, k);
                if sub.is_degenerate() {
                    continue;
                }
                match restrictor.overlaps_line(&sub) {
                    OverlapOutcome::StraddlesEnd => {
                        note!(debug, "- sub-segment [{},{}] straddles, exit is [{}]", k - 1, k, k - 1);
                        return (k - 1, false);
                    }
                    OverlapOutcome::Contains if crossing.is_none() => crossing = Some(k),
                    _ => {}
                }
            }

            if let Some(k) = crossing {
                note!(debug, "- sub-segment [{},{}] crosses with no point inside, exit ~[{}]", k - 1, k, k);
                return (k, true);
            }
            note!(debug, "- no sub-segment leaves the restrictor, exit is [{}]", line.i);
            return (line.i, false);
        }

        match outcome {
            OverlapOutcome::StraddlesEnd => {
                note!(debug, "* line straddles, exit is [{}]", line.i);
                (line.i, false)
            }
            _ => {
                note!(debug, "* line crosses with no point inside, exit ~[{}]", line.j);
                (line.j, true)
            }
        }
    }
}

impl std::fmt::Debug for IntersectableTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntersectableTrack")
            .field("track", &self.track.to_string())
            .field("lines", &self.lines.len())
            .finish()
    }
}

fn annotate(annotations: &mut TrackAnnotations, restrictor: &Restrictor, i: usize, j: usize) {
    for k in i..=j {
        annotations.note(k, format!("Point satisfied restrictor {}", restrictor.name()));
    }
    if i == j {
        annotations.note(i, "Sole point to satisfy");
    } else {
        annotations.note(i, "First point to satisfy");
        annotations.note(j, "Last point to satisfy");
    }
    annotations.highlight(i);
    annotations.highlight(j);
}

// ============================================================================
// Batch Evaluation
// ============================================================================

fn evaluate_one(track: Track, set: &RestrictorSet, config: &IntersectConfig) -> Result<RestrictorSetIntersectOutcome> {
    IntersectableTrack::new(track, config).map(|it| it.satisfies_restrictor_set(set))
}

fn log_batch(mode: &str, set: &RestrictorSet, results: &[Result<RestrictorSetIntersectOutcome>], started: Instant) {
    let satisfied = results.iter().filter(|r| matches!(r, Ok(o) if o.satisfied)).count();
    let failed = results.iter().filter(|r| r.is_err()).count();
    info!(
        "[FlightTrack] {} evaluation of '{}': {} tracks, {} satisfied, {} skipped, in {:?}",
        mode,
        set.name,
        results.len(),
        satisfied,
        failed,
        started.elapsed()
    );
}

/// Evaluate one restrictor set against many tracks.
///
/// Results are in input order. A track that cannot be analysed (e.g. empty)
/// yields an `Err` in its slot; the others are unaffected.
pub fn evaluate_tracks(
    tracks: Vec<Track>,
    set: &RestrictorSet,
    config: &IntersectConfig,
) -> Vec<Result<RestrictorSetIntersectOutcome>> {
    let started = Instant::now();
    let results: Vec<_> = tracks.into_iter().map(|t| evaluate_one(t, set, config)).collect();
    log_batch("sequential", set, &results, started);
    results
}

/// Parallel version of [`evaluate_tracks`], one track per rayon task.
#[cfg(feature = "parallel")]
pub fn evaluate_tracks_parallel(
    tracks: Vec<Track>,
    set: &RestrictorSet,
    config: &IntersectConfig,
) -> Vec<Result<RestrictorSetIntersectOutcome>> {
    use rayon::prelude::*;

    let started = Instant::now();
    let results: Vec<_> = tracks.into_par_iter().map(|t| evaluate_one(t, set, config)).collect();
    log_batch("parallel", set, &results, started);
    results
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AltitudeBand, GpsPoint};
    use chrono::{TimeZone, Utc};

    /// Points along lng 0 at the given latitudes, all at 5000ft.
    fn make_track(lats: &[f64], interval_secs: i64) -> Track {
        let alts = vec![5000.0; lats.len()];
        make_track_with_alts(lats, &alts, interval_secs)
    }

    fn make_track_with_alts(lats: &[f64], alts: &[f64], interval_secs: i64) -> Track {
        let t0 = Utc.with_ymd_and_hms(2016, 1, 1, 21, 0, 0).unwrap();
        Track::new(
            lats.iter()
                .zip(alts)
                .enumerate()
                .map(|(i, (lat, alt))| {
                    Trackpoint::new(
                        "ADSB",
                        t0 + Duration::seconds(i as i64 * interval_secs),
                        GpsPoint::new(*lat, 0.0),
                        *alt,
                    )
                })
                .collect(),
        )
    }

    fn intersectable(track: Track) -> IntersectableTrack {
        IntersectableTrack::new(track, &IntersectConfig::default()).unwrap()
    }

    fn origin_box() -> Restrictor {
        Restrictor::square_box("ORIGIN", GpsPoint::new(0.0, 0.0), 2000.0).unwrap()
    }

    fn wall_at(lat: f64) -> Restrictor {
        Restrictor::vertical_plane("WALL", GpsPoint::new(lat, -100.0), GpsPoint::new(lat, 100.0)).unwrap()
    }

    fn span(outcome: &RestrictorIntersectOutcome) -> Option<(usize, usize)> {
        outcome.intersection.as_ref().map(|ti| (ti.i, ti.j))
    }

    fn box_span(lats: &[f64]) -> RestrictorIntersectOutcome {
        intersectable(make_track(lats, 60)).satisfies_restrictor(&origin_box())
    }

    #[test]
    fn test_box_track_entirely_outside() {
        let outcome = box_span(&[50.0, 60.0, 70.0, 80.0]);
        assert!(!outcome.satisfied);
        assert!(outcome.intersection.is_none());
        assert!(outcome.annotations.is_empty());
        assert!(outcome.debug.contains("no entry point found"));
    }

    #[test]
    fn test_box_enter_and_exit() {
        let outcome = box_span(&[-20.0, -10.0, -5.0, 5.0, 10.0, 20.0]);
        assert!(outcome.satisfied);
        assert_eq!(span(&outcome), Some((2, 3)));
        let ti = outcome.intersection.unwrap();
        assert!(!ti.approximate);
        assert_eq!(ti.start.position.latitude, -5.0);
        assert_eq!(ti.end.position.latitude, 5.0);
    }

    #[test]
    fn test_box_track_entirely_inside() {
        assert_eq!(span(&box_span(&[-5.0, 5.0])), Some((0, 1)));
        assert_eq!(span(&box_span(&[0.0, 1.0, 2.0])), Some((0, 2)));
    }

    #[test]
    fn test_box_single_point_inside() {
        let outcome = box_span(&[-10.0, 0.0, 10.0, 20.0]);
        assert_eq!(span(&outcome), Some((1, 1)));
        let ti = outcome.intersection.unwrap();
        assert!(ti.is_point_intersection());
        assert!(!ti.approximate);
    }

    #[test]
    fn test_box_smaller_than_sampling_is_approximate() {
        let outcome = box_span(&[-20.0, -10.0, 10.0, 20.0]);
        assert!(outcome.satisfied);
        assert_eq!(span(&outcome), Some((1, 2)));
        assert!(outcome.intersection.unwrap().approximate);
    }

    fn make_route(positions: &[(f64, f64)], interval_secs: i64) -> Track {
        let t0 = Utc.with_ymd_and_hms(2016, 1, 1, 21, 0, 0).unwrap();
        Track::new(
            positions
                .iter()
                .enumerate()
                .map(|(i, (lat, lng))| {
                    Trackpoint::new(
                        "ADSB",
                        t0 + Duration::seconds(i as i64 * interval_secs),
                        GpsPoint::new(*lat, *lng),
                        5000.0,
                    )
                })
                .collect(),
        )
    }

    #[test]
    fn test_box_detour_around_shape_is_not_a_hit() {
        // One coarse line whose chord cuts the box; the real track goes round it
        let it = intersectable(make_route(&[(-20.0, 0.0), (0.0, 20.0), (20.0, 0.0)], 1));
        assert_eq!(it.lines().len(), 1);
        assert_eq!(it.lines()[0].span(), 2);

        let outcome = it.satisfies_restrictor(&origin_box());
        assert!(!outcome.satisfied);
        assert!(outcome.intersection.is_none());
        assert!(outcome.debug.contains("no sub-segment confirms"));
    }

    #[test]
    fn test_box_detour_then_real_entry() {
        let route = [
            (-20.0, 0.0),
            (0.0, 20.0),
            (20.0, 0.0),
            (20.0, -1.0),
            (10.0, 0.0),
            (0.0, 0.0),
            (-10.0, 0.0),
        ];
        let it = intersectable(make_route(&route, 1));
        assert_eq!(it.lines().iter().map(|l| (l.i, l.j)).collect::<Vec<_>>(), vec![(0, 3), (3, 6)]);

        let outcome = it.satisfies_restrictor(&origin_box());
        assert!(outcome.satisfied);
        assert_eq!(span(&outcome), Some((5, 5)));
        assert!(!outcome.intersection.unwrap().approximate);
    }

    #[test]
    fn test_box_refines_within_coarse_lines() {
        let lats: Vec<f64> = (0..20).map(|k| -20.0 + 2.0 * k as f64).collect();
        let config = IntersectConfig { sample_interval: Duration::seconds(10) };
        let it = IntersectableTrack::new(make_track(&lats, 3), &config).unwrap();
        assert!(it.lines().iter().any(|l| l.span() > 1));

        let outcome = it.satisfies_restrictor(&origin_box());
        assert_eq!(span(&outcome), Some((6, 14)));
        assert!(!outcome.intersection.unwrap().approximate);
    }

    #[test]
    fn test_box_altitude_band() {
        let lats: Vec<f64> = (0..11).map(|k| -10.0 + 2.0 * k as f64).collect();
        let alts = [4.0, 4.0, 4.0, 14.0, 14.0, 14.0, 24.0, 24.0, 24.0, 24.0, 24.0];
        let track = make_track_with_alts(&lats, &alts, 60);
        let r = origin_box().with_altitude(AltitudeBand::between(10.0, 20.0)).unwrap();

        let outcome = intersectable(track).satisfies_restrictor(&r);
        assert_eq!(span(&outcome), Some((3, 5)));
    }

    #[test]
    fn test_exclusion_inverts_only_verdict() {
        let lats = [-20.0, -10.0, -5.0, 5.0, 10.0, 20.0];
        let it = intersectable(make_track(&lats, 60));

        let outcome = it.satisfies_restrictor(&origin_box().excluding());
        assert!(!outcome.satisfied);
        assert_eq!(span(&outcome), Some((2, 3)));

        let far = intersectable(make_track(&[50.0, 60.0], 60));
        let outcome = far.satisfies_restrictor(&origin_box().excluding());
        assert!(outcome.satisfied);
        assert!(outcome.intersection.is_none());
    }

    #[test]
    fn test_annotations_side_table() {
        let outcome = box_span(&[-20.0, -10.0, -5.0, 0.0, 5.0, 10.0, 20.0]);
        assert_eq!(span(&outcome), Some((2, 4)));

        let ann = &outcome.annotations;
        assert_eq!(ann.len(), 3);
        assert_eq!(ann.highlighted(), vec![2, 4]);
        assert!(ann.get(2).unwrap().notes.iter().any(|n| n == "First point to satisfy"));
        assert!(ann.get(4).unwrap().notes.iter().any(|n| n == "Last point to satisfy"));
        assert_eq!(ann.get(3).unwrap().display, AnalysisDisplay::Default);
        assert!(ann.get(1).is_none());
    }

    #[test]
    fn test_plane_single_span_crossing() {
        let it = intersectable(make_track(&[2.0, 8.0, 16.0, 20.0], 60));
        let outcome = it.satisfies_restrictor(&wall_at(10.0));
        assert!(outcome.satisfied);
        assert_eq!(span(&outcome), Some((2, 2)));
        assert!(outcome.annotations.get(2).unwrap().notes.iter().any(|n| n == "Sole point to satisfy"));
    }

    #[test]
    fn test_plane_refines_within_coarse_line() {
        let lats: Vec<f64> = (0..15).map(f64::from).collect();
        let config = IntersectConfig { sample_interval: Duration::seconds(10) };
        let it = IntersectableTrack::new(make_track(&lats, 3), &config).unwrap();

        let outcome = it.satisfies_restrictor(&wall_at(9.5));
        assert_eq!(span(&outcome), Some((10, 10)));
    }

    #[test]
    fn test_plane_coarse_hit_without_confirming_sub_segment() {
        let lats: Vec<f64> = (0..15).map(f64::from).collect();
        let mut alts = vec![15.0; 15];
        alts[9] = 25.0;
        alts[10] = 25.0;
        let config = IntersectConfig { sample_interval: Duration::seconds(10) };
        let it = IntersectableTrack::new(make_track_with_alts(&lats, &alts, 3), &config).unwrap();
        let wall = wall_at(9.5).with_altitude(AltitudeBand::between(10.0, 20.0)).unwrap();

        // The coarse line [8,12] crosses at 15ft, but the real crossing is at 25ft
        let outcome = it.satisfies_restrictor(&wall);
        assert!(!outcome.satisfied);
        assert!(outcome.debug.contains("no sub-segment confirms"));
    }

    #[test]
    fn test_plane_altitude_at_crossing() {
        let alts = [5000.0, 5000.0, 9000.0, 9000.0];
        let track = make_track_with_alts(&[2.0, 8.0, 16.0, 20.0], &alts, 60);
        let it = intersectable(track);

        // Crossing lat 10 a quarter of the way from 5000ft to 9000ft: 6000ft
        let low = wall_at(10.0).with_altitude(AltitudeBand::between(5500.0, 6500.0)).unwrap();
        assert_eq!(span(&it.satisfies_restrictor(&low)), Some((2, 2)));

        let high = wall_at(10.0).with_altitude(AltitudeBand::above(8000.0)).unwrap();
        assert!(!it.satisfies_restrictor(&high).satisfied);
    }

    #[test]
    fn test_plane_collinear_track_does_not_cross() {
        let t0 = Utc.with_ymd_and_hms(2016, 1, 1, 21, 0, 0).unwrap();
        let points = [-5.0, 0.0, 5.0]
            .iter()
            .enumerate()
            .map(|(i, lng)| Trackpoint::new("ADSB", t0 + Duration::minutes(i as i64), GpsPoint::new(10.0, *lng), 5000.0))
            .collect();
        let it = intersectable(Track::new(points));
        assert!(!it.satisfies_restrictor(&wall_at(10.0)).satisfied);
    }

    #[test]
    fn test_polygon_span() {
        let square = Restrictor::polygon(
            "SQUARE",
            vec![
                GpsPoint::new(-6.0, -6.0),
                GpsPoint::new(6.0, -6.0),
                GpsPoint::new(6.0, 6.0),
                GpsPoint::new(-6.0, 6.0),
            ],
        )
        .unwrap();
        let lats: Vec<f64> = (0..9).map(|k| -20.0 + 5.0 * k as f64).collect();
        let outcome = intersectable(make_track(&lats, 60)).satisfies_restrictor(&square);
        assert_eq!(span(&outcome), Some((3, 5)));
    }

    #[test]
    fn test_single_point_track() {
        let inside = intersectable(make_track(&[1.0], 60));
        assert_eq!(span(&inside.satisfies_restrictor(&origin_box())), Some((0, 0)));
        assert!(!inside.satisfies_restrictor(&wall_at(1.0)).satisfied);

        let outside = intersectable(make_track(&[45.0], 60));
        assert!(!outside.satisfies_restrictor(&origin_box()).satisfied);
    }

    #[test]
    fn test_degenerate_lines_are_skipped() {
        let lats = [-20.0, -20.0, -5.0, -5.0, 5.0, 20.0];
        let outcome = box_span(&lats);
        assert_eq!(span(&outcome), Some((2, 4)));
    }

    #[test]
    fn test_restrictor_set_logic() {
        let track = make_track(&[-20.0, -10.0, -5.0, 5.0, 10.0, 20.0], 60);
        let it = intersectable(track);
        let far = Restrictor::square_box("FAR", GpsPoint::new(45.0, 45.0), 100.0).unwrap();

        let all = RestrictorSet::new("both", CombinationLogic::All)
            .with_restrictor(origin_box())
            .with_restrictor(far.clone());
        let outcome = it.satisfies_restrictor_set(&all);
        assert!(!outcome.satisfied);
        assert_eq!(outcome.outcomes.len(), 2);
        assert!(outcome.outcomes[0].satisfied);
        assert!(outcome.blame_string(&all).starts_with("Did not satisfy FAR"));

        let any = RestrictorSet::new("either", CombinationLogic::Any)
            .with_restrictor(origin_box())
            .with_restrictor(far);
        let outcome = it.satisfies_restrictor_set(&any);
        assert!(outcome.satisfied);
        assert_eq!(outcome.annotations().highlighted(), vec![2, 3]);
        assert!(outcome.debug().contains("----/ outcome 01 /----"));
    }

    #[test]
    fn test_empty_restrictor_set_never_satisfies() {
        let it = intersectable(make_track(&[0.0, 1.0], 60));
        let set = RestrictorSet::new("empty", CombinationLogic::Any);
        let outcome = it.satisfies_restrictor_set(&set);
        assert!(!outcome.satisfied);
        assert_eq!(outcome.blame_string(&set), "No restrictors in empty");
    }

    #[test]
    fn test_track_intersection_summaries() {
        let outcome = box_span(&[-20.0, -10.0, -5.0, 5.0, 10.0, 20.0]);
        let ti = outcome.intersection.unwrap();
        assert_eq!(ti.duration(), Duration::minutes(1));
        assert_eq!(ti.altitude_delta(), 0.0);
        assert!((ti.length_km() - 10.0 * 111.2).abs() < 2.0);
        assert_eq!(ti.midpoint().position.latitude, 0.0);
        assert!(ti.to_string().starts_with("[2,3] "));
    }

    #[test]
    fn test_new_rejects_bad_input() {
        assert!(matches!(
            IntersectableTrack::new(Track::default(), &IntersectConfig::default()),
            Err(FlightTrackError::EmptyTrack(_))
        ));
        let config = IntersectConfig { sample_interval: Duration::zero() };
        assert!(matches!(
            IntersectableTrack::new(make_track(&[0.0], 60), &config),
            Err(FlightTrackError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_evaluate_tracks_keeps_order_and_skips_bad_tracks() {
        let set = RestrictorSet::new("origin", CombinationLogic::All).with_restrictor(origin_box());
        let tracks = vec![
            make_track(&[-20.0, -5.0, 5.0, 20.0], 60),
            Track::default(),
            make_track(&[50.0, 60.0], 60),
        ];

        let results = evaluate_tracks(tracks, &set, &IntersectConfig::default());
        assert_eq!(results.len(), 3);
        assert!(results[0].as_ref().unwrap().satisfied);
        assert!(results[1].is_err());
        assert!(!results[2].as_ref().unwrap().satisfied);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_evaluate_tracks_parallel_matches_sequential() {
        let set = RestrictorSet::new("origin", CombinationLogic::All).with_restrictor(origin_box());
        let tracks: Vec<Track> = (0..8)
            .map(|k| make_track(&[-20.0 + k as f64 * 5.0, 0.0 + k as f64 * 5.0], 60))
            .collect();

        let sequential = evaluate_tracks(tracks.clone(), &set, &IntersectConfig::default());
        let parallel = evaluate_tracks_parallel(tracks, &set, &IntersectConfig::default());
        let verdicts = |r: &[Result<RestrictorSetIntersectOutcome>]| -> Vec<bool> {
            r.iter().map(|o| o.as_ref().unwrap().satisfied).collect()
        };
        assert_eq!(verdicts(&sequential), verdicts(&parallel));
    }

    #[test]
    fn test_intersectable_track_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<IntersectableTrack>();
    }
}
