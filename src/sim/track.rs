//! Closed polyline tracks
//!
//! The player travels along the track by distance. Distances wrap, so any
//! `f32` is a valid position.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    name: String,
    points: Vec<Vec2>,
    /// Distance from `points[0]` to `points[i]`, with the closing segment's end appended
    cumulative: Vec<f32>,
}

impl Track {
    /// At least three points; the last connects back to the first
    pub fn new(name: impl Into<String>, points: Vec<Vec2>) -> Result<Self> {
        if points.len() < 3 {
            return Err(GameError::illegal("a track needs at least 3 points"));
        }
        let track = Self::from_points_unchecked(name, points);
        if track.total_distance() <= f32::EPSILON {
            return Err(GameError::illegal("a track must have a length"));
        }
        Ok(track)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn total_distance(&self) -> f32 {
        self.cumulative[self.points.len()]
    }

    pub fn wrap(&self, distance: f32) -> f32 {
        distance.rem_euclid(self.total_distance())
    }

    /// Segment index and distance into it
    fn segment(&self, distance: f32) -> (usize, f32) {
        let d = self.wrap(distance);
        let index = self
            .cumulative
            .partition_point(|&c| c <= d)
            .saturating_sub(1)
            .min(self.points.len() - 1);
        (index, d - self.cumulative[index])
    }

    fn segment_ends(&self, index: usize) -> (Vec2, Vec2) {
        (self.points[index], self.points[(index + 1) % self.points.len()])
    }

    pub fn point_at(&self, distance: f32) -> Vec2 {
        let (index, along) = self.segment(distance);
        let (a, b) = self.segment_ends(index);
        let length = a.distance(b);
        if length <= f32::EPSILON {
            return a;
        }
        a + (b - a) * (along / length)
    }

    /// Unit direction of travel at `distance`
    pub fn tangent_at(&self, distance: f32) -> Vec2 {
        let (index, _) = self.segment(distance);
        let (a, b) = self.segment_ends(index);
        (b - a).normalize_or_zero()
    }

    /// Track distance of the point on the track nearest to `p`
    pub fn closest_distance(&self, p: Vec2) -> f32 {
        let mut best = (f32::MAX, 0.0);
        for index in 0..self.points.len() {
            let (a, b) = self.segment_ends(index);
            let ab = b - a;
            let length_sq = ab.length_squared();
            let t = if length_sq > 0.0 {
                ((p - a).dot(ab) / length_sq).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let dist_sq = p.distance_squared(a + ab * t);
            if dist_sq < best.0 {
                best = (dist_sq, self.cumulative[index] + t * length_sq.sqrt());
            }
        }
        self.wrap(best.1)
    }

    // === Built-in tracks ===

    /// Square with notched sides
    pub fn kingdom() -> Self {
        Self::from_static(
            "kingdom",
            &[
                (-7.0, -7.0),
                (-2.0, -7.0),
                (-2.0, -5.0),
                (2.0, -5.0),
                (2.0, -7.0),
                (7.0, -7.0),
                (7.0, -2.0),
                (5.0, -2.0),
                (5.0, 2.0),
                (7.0, 2.0),
                (7.0, 7.0),
                (2.0, 7.0),
                (2.0, 5.0),
                (-2.0, 5.0),
                (-2.0, 7.0),
                (-7.0, 7.0),
                (-7.0, 2.0),
                (-5.0, 2.0),
                (-5.0, -2.0),
                (-7.0, -2.0),
            ],
        )
    }

    pub fn weird() -> Self {
        Self::from_static(
            "weird",
            &[
                (-7.0, -6.0),
                (-1.0, -7.0),
                (6.0, -6.0),
                (7.0, -1.0),
                (4.0, 2.0),
                (7.0, 6.0),
                (1.0, 7.0),
                (-3.0, 4.0),
                (-7.0, 6.0),
                (-5.0, 0.0),
            ],
        )
    }

    pub fn circle() -> Self {
        const SEGMENTS: usize = 48;
        const RADIUS: f32 = 6.5;
        let points = (0..SEGMENTS)
            .map(|i| {
                let angle = i as f32 / SEGMENTS as f32 * std::f32::consts::TAU;
                Vec2::new(angle.cos(), angle.sin()) * RADIUS
            })
            .collect();
        Self::from_points_unchecked("circle", points)
    }

    fn from_static(name: &str, points: &[(f32, f32)]) -> Self {
        Self::from_points_unchecked(name, points.iter().map(|&(x, y)| Vec2::new(x, y)).collect())
    }

    /// Built-in shapes are known to be valid
    fn from_points_unchecked(name: impl Into<String>, points: Vec<Vec2>) -> Self {
        let mut cumulative = vec![0.0];
        let mut total = 0.0;
        for (i, p) in points.iter().enumerate() {
            total += p.distance(points[(i + 1) % points.len()]);
            cumulative.push(total);
        }
        Self {
            name: name.into(),
            points,
            cumulative,
        }
    }
}
