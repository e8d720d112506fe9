use minilp::{ComparisonOp, LinearExpr, OptimizationDirection, Problem};

use super::{Comparison, LpError, LpProblem, LpSolver};

/// Dense simplex solver backed by `minilp`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimplexSolver;

impl LpSolver for SimplexSolver {
    fn solve(&self, problem: &LpProblem) -> Result<Vec<f64>, LpError> {
        problem.validate()?;

        let mut lp = Problem::new(OptimizationDirection::Minimize);
        let vars: Vec<_> = problem
            .objective()
            .iter()
            .zip(problem.bounds())
            .map(|(&c, &bounds)| lp.add_var(c, bounds))
            .collect();

        for row in problem.rows() {
            let mut expr = LinearExpr::empty();
            for &(index, coefficient) in &row.coefficients {
                expr.add(vars[index], coefficient);
            }
            let op = match row.comparison {
                Comparison::Le => ComparisonOp::Le,
                Comparison::Ge => ComparisonOp::Ge,
                Comparison::Eq => ComparisonOp::Eq,
            };
            lp.add_constraint(expr, op, row.rhs);
        }

        let solution = lp.solve().map_err(|err| match err {
            minilp::Error::Infeasible => LpError::Infeasible,
            minilp::Error::Unbounded => LpError::Unbounded,
        })?;

        // minilp can report an unbounded direction as an infinite optimum.
        let values: Vec<f64> = vars.iter().map(|&v| solution[v]).collect();
        if !solution.objective().is_finite() || values.iter().any(|v| !v.is_finite()) {
            return Err(LpError::Unbounded);
        }

        tracing::trace!(
            vars = vars.len(),
            rows = problem.rows().len(),
            objective = solution.objective(),
            "Simplex solved"
        );

        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    #[test]
    fn test_two_variable_minimum() {
        // min x + y  s.t.  x + 2y >= 4, 3x + y >= 6, x, y >= 0
        let mut problem = LpProblem::new(2);
        problem.set_objective(0, 1.0);
        problem.set_objective(1, 1.0);
        problem.set_bounds(0, 0.0, f64::INFINITY);
        problem.set_bounds(1, 0.0, f64::INFINITY);
        problem.add_row(vec![(0, 1.0), (1, 2.0)], Comparison::Ge, 4.0);
        problem.add_row(vec![(0, 3.0), (1, 1.0)], Comparison::Ge, 6.0);

        let x = SimplexSolver.solve(&problem).unwrap();
        assert!((x[0] - 1.6).abs() < EPS, "x = {}", x[0]);
        assert!((x[1] - 1.2).abs() < EPS, "y = {}", x[1]);
        assert!((problem.evaluate(&x) - 2.8).abs() < EPS);
    }

    #[test]
    fn test_equality_and_free_variable() {
        // min t  s.t.  t >= v - 3, t >= 3 - v, v = 5, v free
        let mut problem = LpProblem::new(2);
        problem.set_objective(1, 1.0);
        problem.set_bounds(1, 0.0, f64::INFINITY);
        problem.add_row(vec![(0, 1.0)], Comparison::Eq, 5.0);
        problem.add_row(vec![(0, 1.0), (1, -1.0)], Comparison::Le, 3.0);
        problem.add_row(vec![(0, -1.0), (1, -1.0)], Comparison::Le, -3.0);

        let x = SimplexSolver.solve(&problem).unwrap();
        assert!((x[0] - 5.0).abs() < EPS);
        assert!((x[1] - 2.0).abs() < EPS);
    }

    #[test]
    fn test_infeasible() {
        let mut problem = LpProblem::new(1);
        problem.add_row(vec![(0, 1.0)], Comparison::Ge, 2.0);
        problem.add_row(vec![(0, 1.0)], Comparison::Le, 1.0);

        assert_eq!(SimplexSolver.solve(&problem), Err(LpError::Infeasible));
    }

    #[test]
    fn test_unbounded() {
        let mut problem = LpProblem::new(1);
        problem.set_objective(0, 1.0);
        problem.add_row(vec![(0, 1.0)], Comparison::Le, 10.0);

        assert_eq!(SimplexSolver.solve(&problem), Err(LpError::Unbounded));
    }

    #[test]
    fn test_invalid_variable_rejected() {
        let mut problem = LpProblem::new(2);
        problem.add_row(vec![(2, 1.0)], Comparison::Le, 1.0);

        assert_eq!(
            SimplexSolver.solve(&problem),
            Err(LpError::InvalidVariable {
                index: 2,
                num_vars: 2
            })
        );
    }

    #[test]
    fn test_invalid_bounds_rejected() {
        let mut problem = LpProblem::new(1);
        problem.set_bounds(0, 2.0, 1.0);

        assert!(matches!(
            problem.validate(),
            Err(LpError::InvalidBounds { index: 0, .. })
        ));
    }
}
