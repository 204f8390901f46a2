//! Route geometry: polyline precomputation, arc-length sampling, and the
//! clearance test that partitions build slots into buildable and blocked.

use glam::DVec2;
use riverguard_core::{MAP_RENDER_HEIGHT, MAP_RENDER_WIDTH, WORLD_SCALE};

/// One straight piece of a route with its world-unit length cached.
#[derive(Clone, Copy, Debug)]
struct Segment {
    start: DVec2,
    delta: DVec2,
    length: f64,
}

/// A route polyline with per-segment lengths precomputed at load time.
///
/// Waypoints stay in normalized `[0, 1]²` map space; lengths are measured in
/// world units so unit speeds and tower ranges share one coordinate system.
#[derive(Clone, Debug)]
pub(crate) struct RoutePath {
    segments: Vec<Segment>,
    length: f64,
}

impl RoutePath {
    /// Precomputes segment deltas and cumulative length for `waypoints`.
    #[must_use]
    pub(crate) fn from_waypoints(waypoints: &[DVec2]) -> Self {
        let mut segments = Vec::with_capacity(waypoints.len().saturating_sub(1));
        let mut length = 0.0;
        for window in waypoints.windows(2) {
            let delta = window[1] - window[0];
            let segment_length = delta.length() * WORLD_SCALE;
            length += segment_length;
            segments.push(Segment {
                start: window[0],
                delta,
                length: segment_length,
            });
        }
        Self { segments, length }
    }

    /// Total route length in world units.
    #[must_use]
    pub(crate) fn length(&self) -> f64 {
        self.length
    }

    /// Entry point of the route in normalized map space.
    #[must_use]
    pub(crate) fn start(&self) -> DVec2 {
        self.segments
            .first()
            .map_or(DVec2::ZERO, |segment| segment.start)
    }

    /// Samples the route at `distance` world units from its entry point.
    ///
    /// Distances outside `[0, length]` clamp to the nearest endpoint.
    #[must_use]
    pub(crate) fn position_at(&self, distance: f64) -> DVec2 {
        let Some(last) = self.segments.last() else {
            return DVec2::ZERO;
        };
        let mut remaining = distance.max(0.0);
        for segment in &self.segments {
            if remaining <= segment.length && segment.length > 0.0 {
                let t = remaining / segment.length;
                return segment.start + segment.delta * t;
            }
            remaining -= segment.length;
        }
        last.start + last.delta
    }

    /// Minimum distance in render pixels from `point` to this route.
    ///
    /// Clearance is judged on the presentation surface rather than in world
    /// units so slot spacing looks uniform regardless of map aspect.
    #[must_use]
    pub(crate) fn clearance_px(&self, point: DVec2) -> f64 {
        let render = DVec2::new(MAP_RENDER_WIDTH, MAP_RENDER_HEIGHT);
        let target = point * render;
        let mut best = f64::INFINITY;
        for segment in &self.segments {
            let start = segment.start * render;
            let end = (segment.start + segment.delta) * render;
            best = best.min(point_to_segment(target, start, end));
        }
        best
    }
}

fn point_to_segment(point: DVec2, start: DVec2, end: DVec2) -> f64 {
    let span = end - start;
    let span_sq = span.length_squared();
    if span_sq <= f64::EPSILON {
        return point.distance(start);
    }
    let t = ((point - start).dot(span) / span_sq).clamp(0.0, 1.0);
    point.distance(start + span * t)
}
