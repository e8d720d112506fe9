//! Per-channel minimax gain/offset fit.
//!
//! Each camera `i` gets a pair `(gain_i, offset_i)`; one extra slack variable
//! bounds the absolute mismatch of every histogram correspondence. Minimizing
//! the slack yields the L∞-optimal correction with the reference camera
//! pinned to the identity.


use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::channel::Channel;
use crate::error::{Error, Result};
use crate::graph::union_find::UnionFind;
use crate::histogram::{EdgeHistograms, Histogram, RelativeHistogramEdge, BIN_COUNT};
use crate::lp::{Comparison, LpError, LpProblem, LpSolver};

/// Largest deviation of the pinned reference accepted from a solver.
const PIN_TOLERANCE: f64 = 1e-6;

/// Affine intensity correction `v * gain + offset`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GainOffset {
    pub gain: f64,
    pub offset: f64,
}

impl Default for GainOffset {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl GainOffset {
    pub const IDENTITY: GainOffset = GainOffset {
        gain: 1.0,
        offset: 0.0,
    };

    pub fn new(gain: f64, offset: f64) -> Self {
        Self { gain, offset }
    }

    #[inline]
    pub fn apply(self, value: f64) -> f64 {
        value * self.gain + self.offset
    }
}

/// Matches every occupied bin of `h_u` to the bin of `h_v` at the same
/// cumulative fraction.
///
/// For each bin `k` with `h_u[k] > 0` the partner is the smallest `k'` with
/// `C_v[k'] / T_v >= C_u[k] / T_u`, evaluated by integer cross-multiplication.
/// Returns nothing when either histogram is empty.
pub fn quantile_correspondences(h_u: &Histogram, h_v: &Histogram) -> Vec<(u8, u8)> {
    let total_u = h_u.total() as u128;
    let total_v = h_v.total() as u128;
    if total_u == 0 || total_v == 0 {
        return Vec::new();
    }

    let cum_u = h_u.cumulative();
    let cum_v = h_v.cumulative();

    let mut pairs = Vec::new();
    // Both cumulative sequences are non-decreasing, so the partner never moves back.
    let mut k_v = 0usize;
    for k_u in 0..BIN_COUNT {
        if h_u.bins()[k_u] == 0 {
            continue;
        }
        let target = cum_u[k_u] as u128 * total_v;
        while k_v < BIN_COUNT - 1 && (cum_v[k_v] as u128) * total_u < target {
            k_v += 1;
        }
        pairs.push((k_u as u8, k_v as u8));
    }
    pairs
}

/// Lays out the per-channel linear program.
///
/// Variable `2i` is the gain of camera `i`, `2i + 1` its offset, and `2N` the
/// worst-case error. Every group of cameras that no constraint ties to the
/// reference has one camera pinned to the identity as well.
#[derive(Debug, Clone, Copy)]
pub struct ConstraintBuilder {
    camera_count: usize,
    reference: usize,
}

impl ConstraintBuilder {
    /// # Panics
    ///
    /// Panics if `reference >= camera_count`.
    pub fn new(camera_count: usize, reference: usize) -> Self {
        assert!(
            reference < camera_count,
            "reference camera {reference} out of range for {camera_count} cameras"
        );
        Self {
            camera_count,
            reference,
        }
    }

    #[inline]
    pub fn gain_var(&self, camera: usize) -> usize {
        2 * camera
    }

    #[inline]
    pub fn offset_var(&self, camera: usize) -> usize {
        2 * camera + 1
    }

    #[inline]
    pub fn slack_var(&self) -> usize {
        2 * self.camera_count
    }

    #[inline]
    pub fn num_vars(&self) -> usize {
        2 * self.camera_count + 1
    }

    /// Cameras fixed to the identity: the reference first, then the smallest
    /// camera of every group that no edge with non-empty histograms links to it.
    pub fn pinned_cameras(&self, edges: &[RelativeHistogramEdge]) -> Vec<usize> {
        let mut sets = UnionFind::new(self.camera_count);
        for edge in edges {
            if !edge.histogram_a.is_empty() && !edge.histogram_b.is_empty() {
                sets.union(edge.camera_a, edge.camera_b);
            }
        }

        let mut pinned = vec![self.reference];
        for group in sets.groups() {
            if !group.contains(&self.reference) {
                pinned.push(group[0]);
            }
        }
        pinned
    }

    pub fn build(&self, edges: &[RelativeHistogramEdge]) -> LpProblem {
        let mut problem = LpProblem::new(self.num_vars());
        for camera in 0..self.camera_count {
            problem.set_bounds(self.gain_var(camera), 0.0, f64::INFINITY);
        }
        let slack = self.slack_var();
        problem.set_bounds(slack, 0.0, f64::INFINITY);
        problem.set_objective(slack, 1.0);

        for camera in self.pinned_cameras(edges) {
            if camera != self.reference {
                tracing::warn!(
                    camera,
                    "Camera group has no constraints linking it to the reference, pinned to identity"
                );
            }
            problem.add_row(vec![(self.gain_var(camera), 1.0)], Comparison::Eq, 1.0);
            problem.add_row(vec![(self.offset_var(camera), 1.0)], Comparison::Eq, 0.0);
        }

        for edge in edges {
            let anchors = quantile_correspondences(&edge.histogram_a, &edge.histogram_b);
            if anchors.is_empty() {
                tracing::warn!(
                    camera_a = edge.camera_a,
                    camera_b = edge.camera_b,
                    "Edge has an empty histogram, no constraints added"
                );
                continue;
            }

            let (gain_u, offset_u) = (self.gain_var(edge.camera_a), self.offset_var(edge.camera_a));
            let (gain_v, offset_v) = (self.gain_var(edge.camera_b), self.offset_var(edge.camera_b));
            for (k_u, k_v) in anchors {
                let (k_u, k_v) = (k_u as f64, k_v as f64);
                problem.add_row(
                    vec![
                        (gain_u, k_u),
                        (offset_u, 1.0),
                        (gain_v, -k_v),
                        (offset_v, -1.0),
                        (slack, -1.0),
                    ],
                    Comparison::Le,
                    0.0,
                );
                problem.add_row(
                    vec![
                        (gain_u, -k_u),
                        (offset_u, -1.0),
                        (gain_v, k_v),
                        (offset_v, 1.0),
                        (slack, -1.0),
                    ],
                    Comparison::Le,
                    0.0,
                );
            }
        }
        problem
    }
}

/// Fitted corrections of one channel, indexed by camera index.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSolution {
    pub channel: Channel,
    pub cameras: Vec<GainOffset>,
    pub max_error: f64,
}

pub fn solve_channel(
    channel: Channel,
    edges: &[RelativeHistogramEdge],
    camera_count: usize,
    reference: usize,
    solver: &dyn LpSolver,
) -> Result<ChannelSolution> {
    let builder = ConstraintBuilder::new(camera_count, reference);
    let problem = builder.build(edges);
    let lp_error = |source: LpError| Error::LpSolve { channel, source };

    let values = solver.solve(&problem).map_err(lp_error)?;
    if values.len() != builder.num_vars() {
        return Err(lp_error(LpError::SolutionLength {
            expected: builder.num_vars(),
            actual: values.len(),
        }));
    }

    if let Some((index, &value)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(lp_error(LpError::NonFiniteSolution { index, value }));
    }

    let pinned = builder.pinned_cameras(edges);
    for &camera in &pinned {
        let residual = (values[builder.gain_var(camera)] - 1.0)
            .abs()
            .max(values[builder.offset_var(camera)].abs());
        if residual > PIN_TOLERANCE {
            return Err(lp_error(LpError::PinViolated { residual }));
        }
    }

    let cameras = (0..camera_count)
        .map(|camera| {
            if pinned.contains(&camera) {
                GainOffset::IDENTITY
            } else {
                GainOffset::new(
                    values[builder.gain_var(camera)],
                    values[builder.offset_var(camera)],
                )
            }
        })
        .collect();
    let max_error = values[builder.slack_var()];

    tracing::info!(
        %channel,
        rows = problem.rows().len(),
        max_error,
        "Channel solved"
    );

    Ok(ChannelSolution {
        channel,
        cameras,
        max_error,
    })
}

/// Solves red, green and blue concurrently. Returns them in that order.
pub fn solve_channels(
    edges: &EdgeHistograms,
    camera_count: usize,
    reference: usize,
    solver: &dyn LpSolver,
) -> Result<Vec<ChannelSolution>> {
    Channel::ALL
        .par_iter()
        .map(|&channel| {
            solve_channel(
                channel,
                edges.channel(channel),
                camera_count,
                reference,
                solver,
            )
        })
        .collect()
}
