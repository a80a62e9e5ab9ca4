//! Quadtree over UV space
//!
//! Hierarchically divides the UV bounds of a mesh into quadrants. A leaf
//! splits into 4 children once it holds more samples than the configured
//! threshold, unless it has reached the depth or size limit. Samples that sit
//! on the same point therefore end up together in one bounded leaf.

use serde::{Deserialize, Serialize};

use crate::foundation::math::{Point2, Vec2};

/// Configuration for quadtree shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuadtreeConfig {
    /// Maximum samples per leaf before subdivision
    pub max_samples_per_node: usize,

    /// Maximum subdivision depth
    pub max_depth: u32,

    /// Minimum node edge length in UV units
    pub min_node_size: f64,
}

impl Default for QuadtreeConfig {
    fn default() -> Self {
        Self {
            max_samples_per_node: 8,
            max_depth: 12,
            min_node_size: 1e-4,
        }
    }
}

/// One UV sample tagged with the vertex it came from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvSample {
    /// Insertion order; lower ids win distance ties
    pub id: usize,
    /// Originating vertex
    pub vertex: usize,
    /// UV coordinate
    pub uv: Point2,
}

/// Axis-aligned rectangle in UV space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvBounds {
    /// Minimum corner
    pub min: Point2,
    /// Maximum corner
    pub max: Point2,
}

impl UvBounds {
    /// Create bounds from two corners
    pub const fn new(min: Point2, max: Point2) -> Self {
        Self { min, max }
    }

    /// Tightest bounds covering `points`, padded to at least `min_extent` per axis
    fn enclosing<'a>(points: impl Iterator<Item = &'a Point2>, min_extent: f64) -> Self {
        let mut min = Point2::new(f64::INFINITY, f64::INFINITY);
        let mut max = Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
        for p in points {
            min = min.inf(p);
            max = max.sup(p);
        }
        if min.x > max.x {
            return Self::new(Point2::origin(), Point2::new(min_extent, min_extent));
        }

        let pad = Vec2::new(
            ((min_extent - (max.x - min.x)) * 0.5).max(0.0),
            ((min_extent - (max.y - min.y)) * 0.5).max(0.0),
        );
        Self::new(min - pad, max + pad)
    }

    /// Center point
    pub fn center(&self) -> Point2 {
        nalgebra::center(&self.min, &self.max)
    }

    /// Longest edge
    pub fn size(&self) -> f64 {
        (self.max.x - self.min.x).max(self.max.y - self.min.y)
    }

    /// Inclusive containment test
    pub fn contains(&self, p: &Point2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Squared distance from `p` to the nearest point of the rectangle
    pub fn distance_squared(&self, p: &Point2) -> f64 {
        let closest = Point2::new(
            p.x.clamp(self.min.x, self.max.x),
            p.y.clamp(self.min.y, self.max.y),
        );
        (closest - p).norm_squared()
    }

    /// Quadrant `index` (bit 0: +U half, bit 1: +V half)
    fn quadrant(&self, index: usize) -> Self {
        let c = self.center();
        let (min_x, max_x) = if index & 1 != 0 { (c.x, self.max.x) } else { (self.min.x, c.x) };
        let (min_y, max_y) = if index & 2 != 0 { (c.y, self.max.y) } else { (self.min.y, c.y) };
        Self::new(Point2::new(min_x, min_y), Point2::new(max_x, max_y))
    }

    /// Quadrant index `p` falls into
    fn quadrant_of(&self, p: &Point2) -> usize {
        let c = self.center();
        usize::from(p.x >= c.x) | (usize::from(p.y >= c.y) << 1)
    }
}

/// Single node in the quadtree hierarchy
#[derive(Debug, Clone)]
pub struct QuadtreeNode {
    /// UV bounds of this node
    pub bounds: UvBounds,
    /// Samples held by this node (leaves only)
    pub samples: Vec<UvSample>,
    /// Four quadrants, `None` for a leaf
    pub children: Option<Box<[QuadtreeNode; 4]>>,
    /// Depth in the tree (0 = root)
    pub depth: u32,
}

impl QuadtreeNode {
    fn new(bounds: UvBounds, depth: u32) -> Self {
        Self {
            bounds,
            samples: Vec::new(),
            children: None,
            depth,
        }
    }

    /// Whether this node has no children
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    fn subdivide(&mut self) {
        let depth = self.depth + 1;
        let b = self.bounds;
        let mut children = Box::new([0, 1, 2, 3].map(|q| QuadtreeNode::new(b.quadrant(q), depth)));

        for sample in std::mem::take(&mut self.samples) {
            children[b.quadrant_of(&sample.uv)].samples.push(sample);
        }
        self.children = Some(children);
    }

    fn insert(&mut self, sample: UvSample, config: &QuadtreeConfig) {
        if self.is_leaf() {
            let should_subdivide = self.samples.len() >= config.max_samples_per_node
                && self.depth < config.max_depth
                && self.bounds.size() > config.min_node_size;
            if !should_subdivide {
                self.samples.push(sample);
                return;
            }
            self.subdivide();
        }

        let quadrant = self.bounds.quadrant_of(&sample.uv);
        if let Some(children) = self.children.as_deref_mut() {
            children[quadrant].insert(sample, config);
        }
    }

    fn nearest<'a>(&'a self, query: &Point2, best: &mut Option<(f64, &'a UvSample)>) {
        if let Some((best_distance, _)) = *best {
            if self.bounds.distance_squared(query) > best_distance {
                return;
            }
        }

        for sample in &self.samples {
            let distance = (sample.uv - query).norm_squared();
            let better = match *best {
                None => true,
                Some((d, current)) => distance < d || (distance == d && sample.id < current.id),
            };
            if better {
                *best = Some((distance, sample));
            }
        }

        if let Some(children) = &self.children {
            let mut order = [0usize, 1, 2, 3];
            order.sort_by(|&a, &b| {
                children[a]
                    .bounds
                    .distance_squared(query)
                    .total_cmp(&children[b].bounds.distance_squared(query))
            });
            for index in order {
                children[index].nearest(query, best);
            }
        }
    }

    fn count(&self) -> usize {
        self.samples.len()
            + self
                .children
                .as_ref()
                .map_or(0, |children| children.iter().map(QuadtreeNode::count).sum())
    }

    fn max_depth(&self) -> u32 {
        self.children.as_ref().map_or(self.depth, |children| {
            children.iter().map(QuadtreeNode::max_depth).max().unwrap_or(self.depth)
        })
    }
}

/// Nearest-sample index over UV space
#[derive(Debug, Clone)]
pub struct UvQuadtree {
    /// Root node covering every sample
    pub root: QuadtreeNode,
    config: QuadtreeConfig,
    len: usize,
}

impl UvQuadtree {
    /// Build a tree holding `samples` as `(vertex, uv)` pairs, ids in iteration order
    pub fn build(samples: &[(usize, Point2)], config: QuadtreeConfig) -> Self {
        let bounds = UvBounds::enclosing(samples.iter().map(|(_, uv)| uv), config.min_node_size);
        let mut root = QuadtreeNode::new(bounds, 0);

        for (id, &(vertex, uv)) in samples.iter().enumerate() {
            root.insert(UvSample { id, vertex, uv }, &config);
        }

        log::trace!(
            "Built UV quadtree: {} samples, depth {}",
            samples.len(),
            root.max_depth()
        );

        Self {
            root,
            config,
            len: samples.len(),
        }
    }

    /// Closest sample to `query`; the earliest inserted wins among equals
    pub fn nearest(&self, query: &Point2) -> Option<&UvSample> {
        let mut best = None;
        self.root.nearest(query, &mut best);
        best.map(|(_, sample)| sample)
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the tree holds no samples
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Samples reachable from the root; equals [`len`](Self::len)
    pub fn sample_count(&self) -> usize {
        self.root.count()
    }

    /// Deepest leaf
    pub fn depth(&self) -> u32 {
        self.root.max_depth()
    }

    /// Configuration the tree was built with
    pub fn config(&self) -> &QuadtreeConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn brute_force(samples: &[(usize, Point2)], query: &Point2) -> usize {
        let mut best = 0;
        for (i, (_, uv)) in samples.iter().enumerate() {
            if (uv - query).norm_squared() < (samples[best].1 - query).norm_squared() {
                best = i;
            }
        }
        best
    }

    #[test]
    fn test_nearest_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(42);
        let samples: Vec<_> = (0..2000)
            .map(|v| (v, Point2::new(rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0))))
            .collect();
        let tree = UvQuadtree::build(&samples, QuadtreeConfig::default());

        assert_eq!(tree.sample_count(), samples.len());
        assert!(tree.depth() > 0);

        for _ in 0..500 {
            let query = Point2::new(rng.gen_range(-0.2..1.2), rng.gen_range(-0.2..1.2));
            let found = tree.nearest(&query).unwrap();
            assert_eq!(found.id, brute_force(&samples, &query));
        }
    }

    #[test]
    fn test_ties_go_to_first_inserted() {
        let samples = vec![
            (7, Point2::new(0.0, 0.0)),
            (3, Point2::new(1.0, 0.0)),
            (9, Point2::new(0.0, 0.0)),
        ];
        let tree = UvQuadtree::build(&samples, QuadtreeConfig::default());

        assert_eq!(tree.nearest(&Point2::new(0.1, 0.0)).unwrap().vertex, 7);
        // Equidistant from both distinct points
        assert_eq!(tree.nearest(&Point2::new(0.5, 0.3)).unwrap().vertex, 7);
    }

    #[test]
    fn test_coincident_samples_stay_bounded() {
        let config = QuadtreeConfig {
            max_samples_per_node: 2,
            max_depth: 5,
            min_node_size: 1e-4,
        };
        let mut samples: Vec<_> = (0..50).map(|v| (v, Point2::new(0.25, 0.25))).collect();
        samples.push((99, Point2::new(1.0, 1.0)));
        let tree = UvQuadtree::build(&samples, config);

        assert!(tree.depth() <= 5);
        assert_eq!(tree.sample_count(), 51);
        assert_eq!(tree.nearest(&Point2::new(0.3, 0.3)).unwrap().vertex, 0);
        assert_eq!(tree.nearest(&Point2::new(0.9, 0.9)).unwrap().vertex, 99);
    }

    #[test]
    fn test_empty_tree() {
        let tree = UvQuadtree::build(&[], QuadtreeConfig::default());
        assert!(tree.is_empty());
        assert!(tree.nearest(&Point2::new(0.5, 0.5)).is_none());
    }

    #[test]
    fn test_single_point_bounds_are_padded() {
        let tree = UvQuadtree::build(&[(0, Point2::new(0.5, 0.5))], QuadtreeConfig::default());
        assert!(tree.root.bounds.size() > 0.0);
        assert!(tree.root.bounds.contains(&Point2::new(0.5, 0.5)));
    }
}
