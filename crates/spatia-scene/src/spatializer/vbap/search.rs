//! Speaker pair and triangle search.
//!
//! Triangles are built from every combination of three speakers and then
//! filtered in a fixed order, each stage seeing only the survivors of the one
//! before it:
//!
//! 1. drop non-invertible and thin candidates
//! 2. drop triangles whose corners all share one elevation
//! 3. drop triangles with a same-elevation edge that spans another speaker
//! 4. drop thin triangles again
//! 5. remove edge crossings, keeping the triangle with the shorter edge
//! 6. drop triangles enclosing a speaker that is not one of their corners

use super::triple::{SpeakerTriple, MIN_VOLUME_TO_LENGTH_RATIO};
use crate::speaker::SpeakerLayout;
use spatia_core::{angle_between, Vec3};
use std::f64::consts::{FRAC_PI_2, PI};

const CROSSING_TOLERANCE: f64 = 1e-4;
/// Slack on cap overlap, well above the arc tolerance of a crossing point.
const CAP_MARGIN: f64 = 0.05;
const ELEVATION_TOLERANCE: f64 = 1e-9;

/// Azimuth-sorted adjacent pairs of horizontal speakers, closing the circle.
pub(crate) fn find_pairs(layout: &SpeakerLayout) -> Vec<SpeakerTriple> {
    let directions: Vec<Vec3> = layout.iter().map(|s| s.direction()).collect();
    let mut ring: Vec<(f64, usize)> = layout
        .iter()
        .enumerate()
        .filter(|(_, s)| s.elevation.abs() < ELEVATION_TOLERANCE)
        .map(|(i, _)| (directions[i].y.atan2(directions[i].x), i))
        .collect();
    if ring.len() < 2 {
        return Vec::new();
    }
    ring.sort_by(|a, b| a.0.total_cmp(&b.0));

    let pairs: Vec<SpeakerTriple> = (0..ring.len())
        .filter_map(|k| {
            let a = ring[k].1;
            let b = ring[(k + 1) % ring.len()].1;
            SpeakerTriple::pair(&directions, a, b)
        })
        .collect();
    tracing::debug!(
        speakers = layout.len(),
        horizontal = ring.len(),
        pairs = pairs.len(),
        "vbap pair search"
    );
    pairs
}

/// Triangulate the sphere of speaker directions.
pub(crate) fn find_triplets(layout: &SpeakerLayout) -> Vec<SpeakerTriple> {
    let directions: Vec<Vec3> = layout.iter().map(|s| s.direction()).collect();
    let elevations: Vec<f64> = layout.iter().map(|s| s.elevation).collect();
    let n = directions.len();

    let mut triples = Vec::new();
    for i in 0..n {
        for j in i + 1..n {
            for k in j + 1..n {
                if let Some(t) = SpeakerTriple::triangle(&directions, i, j, k) {
                    triples.push(t);
                }
            }
        }
    }
    let candidates = triples.len();

    remove_flat(&mut triples, &elevations);
    let after_flat = triples.len();

    remove_spanning_edges(&mut triples, &directions, &elevations);
    let after_spanning = triples.len();

    triples.retain(|t| t.volume_to_length_ratio() >= MIN_VOLUME_TO_LENGTH_RATIO);
    let after_thin = triples.len();

    let crossings = remove_crossings(&mut triples);

    let before_enclosing = triples.len();
    remove_enclosing(&mut triples, &directions);

    tracing::debug!(
        speakers = n,
        candidates,
        flat_removed = candidates - after_flat,
        spanning_removed = after_flat - after_spanning,
        thin_removed = after_spanning - after_thin,
        crossings_removed = crossings.removed,
        crossing_checks = crossings.checked,
        enclosing_removed = before_enclosing - triples.len(),
        triplets = triples.len(),
        "vbap triplet search"
    );
    triples
}

#[inline]
fn same_elevation(a: f64, b: f64) -> bool {
    (a - b).abs() < ELEVATION_TOLERANCE
}

fn remove_flat(triples: &mut Vec<SpeakerTriple>, elevations: &[f64]) {
    triples.retain(|t| {
        let s = t.speakers();
        !(same_elevation(elevations[s[0]], elevations[s[1]])
            && same_elevation(elevations[s[0]], elevations[s[2]]))
    });
}

/// A same-elevation edge should not skip over a speaker at that elevation;
/// that speaker belongs in a smaller triangle.
fn remove_spanning_edges(triples: &mut Vec<SpeakerTriple>, directions: &[Vec3], elevations: &[f64]) {
    let flat = |v: &Vec3| Vec3::new(v.x, v.y, 0.0);
    triples.retain(|t| {
        for (a, b, _, _) in t.edges() {
            if !same_elevation(elevations[a], elevations[b]) {
                continue;
            }
            let (va, vb) = (flat(&directions[a]), flat(&directions[b]));
            let span = angle_between(&va, &vb);
            let spans_speaker = (0..directions.len()).any(|s| {
                if s == a || s == b || !same_elevation(elevations[s], elevations[a]) {
                    return false;
                }
                let vs = flat(&directions[s]);
                span > angle_between(&va, &vs) && span > angle_between(&vb, &vs)
            });
            if spans_speaker {
                return false;
            }
        }
        true
    });
}

/// Whether `c` lies on both great-circle arcs `li-lj` and `ln-lm`.
fn on_both_arcs(c: &Vec3, li: &Vec3, lj: &Vec3, ln: &Vec3, lm: &Vec3) -> bool {
    let first = angle_between(c, li) + angle_between(c, lj) - angle_between(li, lj);
    let second = angle_between(c, ln) + angle_between(c, lm) - angle_between(ln, lm);
    first.abs() < CROSSING_TOLERANCE && second.abs() < CROSSING_TOLERANCE
}

/// Which of two triangles to drop because their edges cross, if any.
///
/// Returns `Some(true)` to drop `t1`, `Some(false)` to drop `t2`. Crossing edges
/// of equal length are left alone.
fn crossing_victim(t1: &SpeakerTriple, t2: &SpeakerTriple) -> Option<bool> {
    for (a, b, li, lj) in t1.edges() {
        for (c, d, ln, lm) in t2.edges() {
            if a == c || a == d || b == c || b == d {
                continue;
            }
            let cr = li.cross(&lj).cross(&ln.cross(&lm));
            if cr.norm() < 1e-12 {
                // both edges on one great circle
                continue;
            }
            let cr = cr.normalize();
            if !(on_both_arcs(&cr, &li, &lj, &ln, &lm) || on_both_arcs(&-cr, &li, &lj, &ln, &lm)) {
                continue;
            }
            let len1 = (li - lj).norm();
            let len2 = (ln - lm).norm();
            if len1 > len2 {
                return Some(true);
            } else if len1 < len2 {
                return Some(false);
            }
        }
    }
    None
}

/// Angular cap around a triangle: unit center and the widest corner angle.
fn bounding_cap(t: &SpeakerTriple) -> (Vec3, f64) {
    let sum = t.directions().iter().fold(Vec3::zeros(), |acc, d| acc + d);
    if sum.norm() < 1e-12 {
        return (Vec3::x(), PI);
    }
    let center = sum.normalize();
    let radius = t
        .directions()
        .iter()
        .map(|d| angle_between(&center, d))
        .fold(0.0, f64::max);
    (center, radius)
}

/// Whether two caps may share a point. Caps wider than a hemisphere are not
/// convex and always overlap.
fn caps_overlap(a: &(Vec3, f64), b: &(Vec3, f64)) -> bool {
    if a.1 >= FRAC_PI_2 || b.1 >= FRAC_PI_2 {
        return true;
    }
    angle_between(&a.0, &b.0) <= a.1 + b.1 + CAP_MARGIN
}

/// Outcome of [`remove_crossings`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct CrossingPass {
    pub removed: usize,
    /// Pairs whose edges were compared.
    pub checked: usize,
}

/// Remove triangles whose edges cross a shorter edge of another triangle.
///
/// Each unordered pair is compared at most once, and only while both are
/// still alive, so a single pass leaves no crossings behind.
fn remove_crossings(triples: &mut Vec<SpeakerTriple>) -> CrossingPass {
    let caps: Vec<_> = triples.iter().map(bounding_cap).collect();
    let mut dropped = vec![false; triples.len()];
    let mut pass = CrossingPass::default();

    for i in 0..triples.len() {
        for j in i + 1..triples.len() {
            if dropped[i] {
                break;
            }
            if dropped[j]
                || triples[i].speakers() == triples[j].speakers()
                || !caps_overlap(&caps[i], &caps[j])
            {
                continue;
            }
            pass.checked += 1;
            if let Some(first) = crossing_victim(&triples[i], &triples[j]) {
                dropped[if first { i } else { j }] = true;
                pass.removed += 1;
            }
        }
    }

    if pass.removed > 0 {
        let mut k = 0;
        triples.retain(|_| {
            let keep = !dropped[k];
            k += 1;
            keep
        });
    }
    pass
}

fn remove_enclosing(triples: &mut Vec<SpeakerTriple>, directions: &[Vec3]) {
    for (s, dir) in directions.iter().enumerate() {
        triples.retain(|t| {
            if t.contains(s) {
                return true;
            }
            let g = t.gains(dir);
            !(g[0] > 0.0 && g[1] > 0.0 && g[2] > 0.0)
        });
    }
}
