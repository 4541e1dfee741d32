//! Splice two track fragments and check them against an airspace restrictor set.
//!
//! Run with: cargo run --example restrictor_report

use chrono::{Duration, TimeZone, Utc};
use flight_track::{
    evaluate_tracks, AltitudeBand, CombinationLogic, GpsPoint, IntersectConfig, Restrictor,
    RestrictorSet, Track, TrackComparator, Trackpoint,
};

/// A straight descent along the SFO approach, one point every 15 seconds.
fn fragment(source: &str, start_idx: i64, count: i64) -> Track {
    let t0 = Utc.with_ymd_and_hms(2016, 6, 1, 18, 0, 0).unwrap();
    let points = (start_idx..start_idx + count)
        .map(|i| {
            let f = i as f64;
            Trackpoint::new(
                source,
                t0 + Duration::seconds(i * 15),
                GpsPoint::new(37.40 + 0.01 * f, -122.10 - 0.01 * f),
                8000.0 - 150.0 * f,
            )
            .with_velocity(180.0, 315.0, -600.0)
        })
        .collect();
    Track::new(points)
}

fn main() {
    // Two fragments of the same flight, from different feeds
    let mut track = fragment("FA", 0, 20);
    let tail = fragment("ADSB", 20, 20);

    let comparator = TrackComparator::default();
    match comparator.plausible_extension(&track, &tail) {
        Ok((true, reason)) => {
            println!("Splicing fragments: {}", reason);
            track.merge(&tail);
        }
        Ok((false, reason)) => println!("Fragments look like different flights: {}", reason),
        Err(e) => println!("Could not compare fragments: {}", e),
    }
    track.post_process();
    println!("{}\n", track);

    let set = RestrictorSet::new("SFO low approach", CombinationLogic::All)
        .with_user("ops@example.com")
        .with_tag("sfo")
        .with_restrictor(
            Restrictor::square_box("BRIXX", GpsPoint::new(37.52, -122.22), 4.0)
                .and_then(|r| r.with_altitude(AltitudeBand::below(6500.0)))
                .unwrap(),
        )
        .with_restrictor(
            Restrictor::vertical_plane("GATE", GpsPoint::new(37.555, -122.355), GpsPoint::new(37.655, -122.255))
                .unwrap(),
        );
    println!("{}", set);

    let config = IntersectConfig::default();
    let other = fragment("ADSB", 100, 10);
    let results = evaluate_tracks(vec![track, other, Track::default()], &set, &config);

    for (n, result) in results.iter().enumerate() {
        match result {
            Ok(outcome) => {
                println!("Track {}: {}", n, if outcome.satisfied { "SATISFIED" } else { "not satisfied" });
                for (r, o) in set.iter().zip(&outcome.outcomes) {
                    match &o.intersection {
                        Some(ti) => println!("   {:<6} {}", r.name(), ti),
                        None => println!("   {:<6} no intersection", r.name()),
                    }
                }
                if !outcome.satisfied {
                    println!("   {}", outcome.blame_string(&set));
                }
            }
            Err(e) => println!("Track {}: skipped ({})", n, e),
        }
    }
}
