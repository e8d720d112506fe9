//! Backend-neutral linear programs.
//!
//! The solve stage describes its program as an [`LpProblem`] and hands it to
//! any [`LpSolver`]. [`SimplexSolver`] is the bundled implementation.

mod simplex;

pub use simplex::SimplexSolver;

use thiserror::Error;

/// Relation between a row's linear expression and its right-hand side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Le,
    Ge,
    Eq,
}

/// One constraint `sum(coefficient * x[index]) <cmp> rhs`.
#[derive(Debug, Clone, PartialEq)]
pub struct LpRow {
    pub coefficients: Vec<(usize, f64)>,
    pub comparison: Comparison,
    pub rhs: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LpError {
    #[error("Linear program is infeasible")]
    Infeasible,

    #[error("Linear program is unbounded")]
    Unbounded,

    #[error("Variable index {index} out of range for {num_vars} variables")]
    InvalidVariable { index: usize, num_vars: usize },

    #[error("Variable {index} has empty bounds [{lower}, {upper}]")]
    InvalidBounds { index: usize, lower: f64, upper: f64 },

    #[error("Non-finite coefficient in row {row}")]
    NonFiniteCoefficient { row: usize },

    #[error("Solver returned {actual} values for {expected} variables")]
    SolutionLength { expected: usize, actual: usize },

    #[error("Solver returned non-finite value {value} for variable {index}")]
    NonFiniteSolution { index: usize, value: f64 },

    #[error("Solution violates a pinned variable by {residual:e}")]
    PinViolated { residual: f64 },
}

/// Minimization problem over `num_vars` continuous variables.
///
/// Variables start free (unbounded on both sides) with a zero objective.
#[derive(Debug, Clone, PartialEq)]
pub struct LpProblem {
    objective: Vec<f64>,
    bounds: Vec<(f64, f64)>,
    rows: Vec<LpRow>,
}

impl LpProblem {
    pub fn new(num_vars: usize) -> Self {
        Self {
            objective: vec![0.0; num_vars],
            bounds: vec![(f64::NEG_INFINITY, f64::INFINITY); num_vars],
            rows: Vec::new(),
        }
    }

    #[inline]
    pub fn num_vars(&self) -> usize {
        self.objective.len()
    }

    /// # Panics
    ///
    /// Panics if `var` is out of range.
    pub fn set_bounds(&mut self, var: usize, lower: f64, upper: f64) {
        self.bounds[var] = (lower, upper);
    }

    /// # Panics
    ///
    /// Panics if `var` is out of range.
    pub fn set_objective(&mut self, var: usize, coefficient: f64) {
        self.objective[var] = coefficient;
    }

    pub fn add_row(&mut self, coefficients: Vec<(usize, f64)>, comparison: Comparison, rhs: f64) {
        self.rows.push(LpRow {
            coefficients,
            comparison,
            rhs,
        });
    }

    pub fn objective(&self) -> &[f64] {
        &self.objective
    }

    pub fn bounds(&self) -> &[(f64, f64)] {
        &self.bounds
    }

    pub fn rows(&self) -> &[LpRow] {
        &self.rows
    }

    /// Objective value of `values`.
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.objective
            .iter()
            .zip(values)
            .map(|(c, v)| c * v)
            .sum()
    }

    /// Checks indices, bounds and coefficients before handing off to a solver.
    pub fn validate(&self) -> Result<(), LpError> {
        let num_vars = self.num_vars();
        for (index, &(lower, upper)) in self.bounds.iter().enumerate() {
            if lower > upper || lower.is_nan() || upper.is_nan() {
                return Err(LpError::InvalidBounds {
                    index,
                    lower,
                    upper,
                });
            }
        }
        for (row_index, row) in self.rows.iter().enumerate() {
            if !row.rhs.is_finite() {
                return Err(LpError::NonFiniteCoefficient { row: row_index });
            }
            for &(index, coefficient) in &row.coefficients {
                if index >= num_vars {
                    return Err(LpError::InvalidVariable { index, num_vars });
                }
                if !coefficient.is_finite() {
                    return Err(LpError::NonFiniteCoefficient { row: row_index });
                }
            }
        }
        Ok(())
    }
}

/// Solves [`LpProblem`]s. Returns the value of every variable at an optimum.
pub trait LpSolver: Send + Sync {
    fn solve(&self, problem: &LpProblem) -> Result<Vec<f64>, LpError>;
}
