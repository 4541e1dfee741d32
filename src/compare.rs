//! # Track Comparison
//!
//! Decides whether two track fragments belong to the same physical flight.
//!
//! Ingestion receives fragments in batches, from several sources, sometimes
//! late and sometimes overlapping what it already has. [`TrackComparator`]
//! classifies how a new fragment (B) relates to an existing track (A) in time
//! and, when they overlap in time, in space:
//!
//! - B entirely after A: plausible if the gap is at most `max_gap`
//! - B entirely before A: never an *extension*, but a plausible
//!   *contribution* if the gap is at most `prefix_gap_multiplier × max_gap`
//! - B overlapping A in time: plausible if the overlapping stretches of the
//!   two tracks also overlap in space (bounding boxes)
//!
//! Negative verdicts are ordinary `false` results. Every verdict comes with a
//! human-readable trace of how it was reached.

use chrono::{DateTime, Duration, Utc};
use log::debug;

use crate::error::{FlightTrackError, Result};
use crate::{fmt_secs, range_overlap, OverlapOutcome, Track};

/// Configuration for track comparison.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompareConfig {
    /// Largest gap between the end of one track and the start of the next
    /// for them to still be the same flight.
    /// Default: 10 minutes
    #[cfg_attr(feature = "serde", serde(with = "crate::duration_secs"))]
    pub max_gap: Duration,

    /// How much time overlap is tolerated. Reported in traces; overlap is
    /// currently judged by spatial agreement alone.
    /// Default: 1 minute
    #[cfg_attr(feature = "serde", serde(with = "crate::duration_secs"))]
    pub max_overlap: Duration,

    /// Multiplier on `max_gap` for fragments that arrive out of order and
    /// precede the existing track.
    /// Default: 3
    pub prefix_gap_multiplier: i32,

    /// Neighboring points kept on each side when clipping tracks to their
    /// time overlap.
    /// Default: 1
    pub overlap_padding: usize,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            max_gap: Duration::minutes(10),
            max_overlap: Duration::minutes(1),
            prefix_gap_multiplier: 3,
            overlap_padding: 1,
        }
    }
}

impl CompareConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_gap <= Duration::zero() {
            return Err(FlightTrackError::InvalidConfig(format!(
                "max_gap must be positive, got {}",
                fmt_secs(self.max_gap)
            )));
        }
        if self.max_overlap < Duration::zero() {
            return Err(FlightTrackError::InvalidConfig(format!(
                "max_overlap must not be negative, got {}",
                fmt_secs(self.max_overlap)
            )));
        }
        if self.prefix_gap_multiplier < 1 {
            return Err(FlightTrackError::InvalidConfig(format!(
                "prefix_gap_multiplier must be at least 1, got {}",
                self.prefix_gap_multiplier
            )));
        }
        Ok(())
    }

    /// Largest tolerated gap for a fragment that precedes the track.
    pub fn max_prefix_gap(&self) -> Duration {
        self.max_gap * self.prefix_gap_multiplier
    }
}

/// Result of comparing track A with track B. Ephemeral; never persisted.
#[derive(Debug, Clone)]
pub struct CompareOutcome {
    /// How B's time range relates to A's.
    pub time_disposition: OverlapOutcome,

    /// When the time overlap starts. `None` for disjoint tracks.
    pub overlap_start: Option<DateTime<Utc>>,

    /// For overlapping tracks, the length of the overlap. For disjoint
    /// tracks, the signed gap: positive when B comes after A, negative when
    /// B comes before A.
    pub duration: Duration,

    /// A and B clipped (with padding) to the overlap interval.
    pub overlap_a: Option<Track>,
    pub overlap_b: Option<Track>,

    /// How the clipped B relates to the clipped A in space. `None` when the
    /// tracks do not overlap in time.
    pub space_disposition: Option<OverlapOutcome>,
    /// Fraction of the smaller clipped bounding box covered by the overlap.
    pub space_overlap: f64,

    pub log: String,
}

impl CompareOutcome {
    /// True when the tracks overlap in time and their overlapping stretches
    /// also overlap in space.
    pub fn overlaps_in_space(&self) -> bool {
        self.space_disposition.map_or(false, |d| !d.is_disjoint())
    }
}

impl std::fmt::Display for CompareOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "-- time={} ", self.time_disposition)?;
        match self.space_disposition {
            Some(space) => write!(f, "space={} ({:.2})", space, self.space_overlap)?,
            None => f.write_str("space=n/a")?,
        }
        write!(f, "\n{}", self.log)
    }
}

/// Compares tracks using a fixed [`CompareConfig`].
#[derive(Debug, Clone, Default)]
pub struct TrackComparator {
    config: CompareConfig,
}

impl TrackComparator {
    pub fn new(config: CompareConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &CompareConfig {
        &self.config
    }

    /// Classify how `b` relates to `a` in time, and in space where they overlap.
    ///
    /// # Errors
    /// [`FlightTrackError::EmptyTrack`] if either track has no points.
    pub fn compare(&self, a: &Track, b: &Track) -> Result<CompareOutcome> {
        let (a_start, a_end) = a.time_range()?;
        let (b_start, b_end) = b.time_range()?;

        let mut log = format!(
            "A: {}\nB: {}\nA:  {}  ->  {}\nB:  {}  ->  {}\n",
            a, b, a_start, a_end, b_start, b_end
        );

        let time_disposition = range_overlap((a_start, a_end), (b_start, b_end));

        let (overlap_start, duration) = match time_disposition {
            OverlapOutcome::DisjointBefore => {
                let gap = b_end - a_start;
                log.push_str(&format!("B comes entirely before A, by {}\n", fmt_secs(-gap)));
                (None, gap)
            }
            OverlapOutcome::DisjointAfter => {
                let gap = b_start - a_end;
                log.push_str(&format!("B comes entirely after A, by {}\n", fmt_secs(gap)));
                (None, gap)
            }
            OverlapOutcome::StraddlesEnd => {
                log.push_str("B extends into the future, straddling the end of A\n");
                (Some(b_start), a_end - b_start)
            }
            OverlapOutcome::StraddlesStart => {
                log.push_str("B extends into the past, straddling the start of A\n");
                (Some(a_start), b_end - a_start)
            }
            OverlapOutcome::IsContained => {
                log.push_str("B is entirely contained within A\n");
                (Some(b_start), b_end - b_start)
            }
            OverlapOutcome::Contains => {
                log.push_str("B contains A entirely\n");
                (Some(a_start), a_end - a_start)
            }
        };

        let mut outcome = CompareOutcome {
            time_disposition,
            overlap_start,
            duration,
            overlap_a: None,
            overlap_b: None,
            space_disposition: None,
            space_overlap: 0.0,
            log,
        };

        if let Some(start) = overlap_start {
            let end = start + duration;
            let padding = self.config.overlap_padding;
            let overlap_a = a.padded_trim_to_times(start, end, padding);
            let overlap_b = b.padded_trim_to_times(start, end, padding);

            outcome.log.push_str(&format!(
                "Overlap: from {}, for {} (max_overlap {})\n* overlap A: {}\n* overlap B: {}\n",
                start,
                fmt_secs(duration),
                fmt_secs(self.config.max_overlap),
                overlap_a,
                overlap_b
            ));

            if let Some((space, fraction)) = compare_in_space(&overlap_a, &overlap_b) {
                outcome.space_disposition = Some(space);
                outcome.space_overlap = fraction;
                outcome.log.push_str(&format!("* space comparison: {}, {:.3}\n", space, fraction));
            }

            outcome.overlap_a = Some(overlap_a);
            outcome.overlap_b = Some(overlap_b);
        }

        Ok(outcome)
    }

    /// Does `b` more or less continue where `a` left off?
    ///
    /// Returns the verdict plus a trace of how it was reached.
    ///
    /// # Example
    /// ```
    /// use chrono::{Duration, TimeZone, Utc};
    /// use flight_track::{GpsPoint, Track, TrackComparator, Trackpoint};
    ///
    /// let t0 = Utc.with_ymd_and_hms(2016, 1, 1, 21, 0, 0).unwrap();
    /// let point = |secs: i64, lat: f64| {
    ///     Trackpoint::new("ADSB", t0 + Duration::seconds(secs), GpsPoint::new(lat, -122.0), 19000.0)
    /// };
    /// let a = Track::new(vec![point(0, 37.0), point(10, 37.01)]);
    /// let b = Track::new(vec![point(70, 37.07), point(80, 37.08)]);
    ///
    /// let comparator = TrackComparator::default();
    /// let (plausible, _trace) = comparator.plausible_extension(&a, &b).unwrap();
    /// assert!(plausible);
    /// ```
    pub fn plausible_extension(&self, a: &Track, b: &Track) -> Result<(bool, String)> {
        let outcome = self.compare(a, b)?;
        let mut trace = outcome.to_string();

        let plausible = match outcome.time_disposition {
            OverlapOutcome::DisjointBefore => {
                trace.push_str("B precedes A, so cannot extend it\n");
                false
            }
            OverlapOutcome::DisjointAfter => self.gap_within(&outcome, self.config.max_gap, "gap", &mut trace),
            _ => Self::space_agrees(&outcome, &mut trace),
        };

        debug!(
            "plausible_extension: time={} gap/overlap={} -> {}",
            outcome.time_disposition,
            fmt_secs(outcome.duration),
            plausible
        );
        Ok((plausible, trace))
    }

    /// Could `b` be glued onto or into `a`?
    ///
    /// Like [`plausible_extension`](Self::plausible_extension), but tolerates
    /// out-of-order delivery: a fragment entirely before `a` is accepted when
    /// its gap is within `prefix_gap_multiplier × max_gap`.
    pub fn plausible_contribution(&self, a: &Track, b: &Track) -> Result<(bool, String)> {
        let outcome = self.compare(a, b)?;
        let mut trace = outcome.to_string();

        let plausible = match outcome.time_disposition {
            OverlapOutcome::DisjointAfter => {
                self.gap_within(&outcome, self.config.max_gap, "suffix gap", &mut trace)
            }
            OverlapOutcome::DisjointBefore => {
                self.gap_within(&outcome, self.config.max_prefix_gap(), "prefix gap", &mut trace)
            }
            _ => Self::space_agrees(&outcome, &mut trace),
        };

        debug!(
            "plausible_contribution: time={} gap/overlap={} -> {}",
            outcome.time_disposition,
            fmt_secs(outcome.duration),
            plausible
        );
        Ok((plausible, trace))
    }

    fn gap_within(&self, outcome: &CompareOutcome, limit: Duration, what: &str, trace: &mut String) -> bool {
        let gap = outcome.duration.abs();
        if gap <= limit {
            trace.push_str(&format!("{} of {} is within {}, plausible is YES\n", what, fmt_secs(gap), fmt_secs(limit)));
            true
        } else {
            trace.push_str(&format!("{} of {} is too long (>{})\n", what, fmt_secs(gap), fmt_secs(limit)));
            false
        }
    }

    fn space_agrees(outcome: &CompareOutcome, trace: &mut String) -> bool {
        if outcome.overlaps_in_space() {
            trace.push_str("Time and space overlap, plausible is YES\n");
            true
        } else {
            trace.push_str("No space overlap, despite time overlap\n");
            false
        }
    }
}

/// Classify how `b` relates to `a` in space, by bounding box, plus the overlap
/// fraction. `None` if either track is empty.
///
/// Single-point tracks are compared by point equality (both single) or by
/// containment in the other track's bounding box. Only
/// [`OverlapOutcome::is_disjoint`] is meaningful on the result.
pub fn compare_in_space(a: &Track, b: &Track) -> Option<(OverlapOutcome, f64)> {
    let first_a = a.get(0)?;
    let first_b = b.get(0)?;
    let bounds_a = a.full_bounds()?;
    let bounds_b = b.full_bounds()?;

    let outcome = match (a.len(), b.len()) {
        (1, 1) if first_a.position == first_b.position => (OverlapOutcome::IsContained, 1.0),
        (1, 1) => (OverlapOutcome::DisjointAfter, 0.0),
        (1, _) if bounds_b.contains(&first_a.position) => (OverlapOutcome::Contains, 1.0),
        (_, 1) if bounds_a.contains(&first_b.position) => (OverlapOutcome::IsContained, 1.0),
        (1, _) | (_, 1) => (OverlapOutcome::DisjointAfter, 0.0),
        _ => bounds_a.overlaps_with(&bounds_b),
    };
    Some(outcome)
}

// ============================================================================
// Tests
// ============================================================================
