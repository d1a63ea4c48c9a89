use microlp::{ComparisonOp, OptimizationDirection, Problem};
use tracing::{debug, warn};

use crate::problem::{ConstraintOp, LpProblem};
use crate::solution::{ConstraintViolation, Solution};

/// Solves an [`LpProblem`] with the `microlp` simplex backend and checks the answer
pub struct Solver {
    /// Tolerance for floating point comparisons, scaled by the row magnitude
    tolerance: f64,
}

impl Default for Solver {
    fn default() -> Self {
        Self { tolerance: 1e-6 }
    }
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Solve the LP problem.
    ///
    /// Structural problems are reported as `Error` without touching the backend.
    /// An optimal point that breaks a constraint or bound by more than the tolerance
    /// is discarded and reported as `Error` with the violations attached.
    pub fn solve(&self, problem: &LpProblem) -> Solution {
        if let Err(e) = problem.validate() {
            warn!(error = %e, "rejecting malformed LP");
            return Solution::error(e.to_string());
        }

        let direction = if problem.objective.minimize {
            OptimizationDirection::Minimize
        } else {
            OptimizationDirection::Maximize
        };
        let mut lp = Problem::new(direction);

        let vars: Vec<microlp::Variable> = problem
            .variables
            .iter()
            .zip(&problem.objective.coefficients)
            .map(|(v, &cost)| lp.add_var(cost, (v.lower, v.upper)))
            .collect();

        for c in &problem.constraints {
            // Each variable appears at most once per row
            let terms: Vec<(microlp::Variable, f64)> = c
                .coefficients
                .iter()
                .zip(&vars)
                .filter(|(coef, _)| **coef != 0.0)
                .map(|(&coef, &var)| (var, coef))
                .collect();
            let op = match c.op {
                ConstraintOp::Le => ComparisonOp::Le,
                ConstraintOp::Ge => ComparisonOp::Ge,
                ConstraintOp::Eq => ComparisonOp::Eq,
            };
            lp.add_constraint(terms, op, c.rhs);
        }

        debug!(
            variables = problem.num_variables(),
            constraints = problem.num_constraints(),
            "invoking LP backend"
        );

        let raw = match lp.solve() {
            Ok(raw) => raw,
            Err(microlp::Error::Infeasible) => return Solution::infeasible(),
            Err(microlp::Error::Unbounded) => return Solution::unbounded(),
            Err(e) => return Solution::error(e.to_string()),
        };

        let values: Vec<f64> = vars.iter().map(|&var| *raw.var_value(var)).collect();
        let objective_value = raw.objective();

        let violations = self.find_violations(problem, &values);
        if !violations.is_empty() {
            warn!(count = violations.len(), "LP backend returned a point outside the feasible region");
            return Solution::unverified(violations);
        }

        let mut solution = Solution::optimal(values, objective_value);
        solution.binding_constraints = self.binding_constraints(problem, &solution.values);
        solution
    }

    fn scaled_tolerance(&self, magnitude: f64) -> f64 {
        self.tolerance * (1.0 + magnitude.abs())
    }

    /// Find which constraints and bounds are violated by a given point
    fn find_violations(&self, problem: &LpProblem, values: &[f64]) -> Vec<ConstraintViolation> {
        let mut violations = Vec::new();

        for c in &problem.constraints {
            let lhs = problem.evaluate(c, values);
            let tol = self.scaled_tolerance(c.rhs.abs().max(lhs.abs()));

            let (is_violated, violation_amount, description) = match c.op {
                ConstraintOp::Le => {
                    if lhs > c.rhs + tol {
                        let amt = lhs - c.rhs;
                        (true, amt, format!("{} exceeds maximum of {:.2} by {:.6}", c.name, c.rhs, amt))
                    } else {
                        (false, 0.0, String::new())
                    }
                }
                ConstraintOp::Ge => {
                    if lhs < c.rhs - tol {
                        let amt = c.rhs - lhs;
                        (true, amt, format!("{} is below minimum of {:.2} by {:.6}", c.name, c.rhs, amt))
                    } else {
                        (false, 0.0, String::new())
                    }
                }
                ConstraintOp::Eq => {
                    let diff = (lhs - c.rhs).abs();
                    if diff > tol {
                        (true, diff, format!("{} requires exactly {:.2} but got {:.6}", c.name, c.rhs, lhs))
                    } else {
                        (false, 0.0, String::new())
                    }
                }
            };

            if is_violated {
                violations.push(ConstraintViolation {
                    constraint: c.name.clone(),
                    required: c.rhs,
                    actual: lhs,
                    violation_amount,
                    description,
                });
            }
        }

        for (v, &value) in problem.variables.iter().zip(values) {
            let tol = self.scaled_tolerance(value);
            if value < v.lower - tol {
                violations.push(ConstraintViolation {
                    constraint: format!("{}_lower", v.name),
                    required: v.lower,
                    actual: value,
                    violation_amount: v.lower - value,
                    description: format!("{} is below its lower bound {:.2}", v.name, v.lower),
                });
            } else if value > v.upper + tol {
                violations.push(ConstraintViolation {
                    constraint: format!("{}_upper", v.name),
                    required: v.upper,
                    actual: value,
                    violation_amount: value - v.upper,
                    description: format!("{} is above its upper bound {:.2}", v.name, v.upper),
                });
            }
        }

        // Sort by violation amount (worst first)
        violations.sort_by(|a, b| b.violation_amount.total_cmp(&a.violation_amount));

        violations
    }

    /// Inequality rows with no slack left. Equality rows are always tight and are not listed.
    fn binding_constraints(&self, problem: &LpProblem, values: &[f64]) -> Vec<String> {
        problem
            .constraints
            .iter()
            .filter(|c| c.op != ConstraintOp::Eq)
            .filter(|c| {
                let lhs = problem.evaluate(c, values);
                (lhs - c.rhs).abs() <= self.scaled_tolerance(c.rhs)
            })
            .map(|c| c.name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::LpProblem;
    use crate::solution::SolutionStatus;

    fn two_vars(y_upper: f64) -> LpProblem {
        let mut problem = LpProblem::new();
        problem.add_variable("x", 0.0, f64::INFINITY);
        problem.add_variable("y", 0.0, y_upper);
        problem
    }

    #[test]
    fn test_simple_maximization() {
        // Maximize: 3x + 2y
        // Subject to:
        //   x + y <= 4
        //   x <= 3
        //   0 <= y <= 3
        // Optimal: x=3, y=1, obj=11
        let mut problem = two_vars(3.0);
        problem.set_objective(vec![3.0, 2.0], false);
        problem.add_constraint("sum", vec![1.0, 1.0], ConstraintOp::Le, 4.0);
        problem.add_constraint("x_max", vec![1.0, 0.0], ConstraintOp::Le, 3.0);

        let solution = Solver::new().solve(&problem);

        println!("Status: {:?}", solution.status);
        println!("Values: {:?}", solution.values);
        println!("Objective: {}", solution.objective_value);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.values[0] - 3.0).abs() < 1e-6, "x = {} (expected 3)", solution.values[0]);
        assert!((solution.values[1] - 1.0).abs() < 1e-6, "y = {} (expected 1)", solution.values[1]);
        assert!((solution.objective_value - 11.0).abs() < 1e-6, "obj = {} (expected 11)", solution.objective_value);
        assert_eq!(solution.binding_constraints, vec!["sum".to_string(), "x_max".to_string()]);
    }

    #[test]
    fn test_minimization_with_ge() {
        // Minimize: 2x + 3y
        // Subject to:
        //   x + y >= 4
        //   x <= 3
        //   0 <= y <= 3
        // Optimal: x=3, y=1, obj=9
        let mut problem = two_vars(3.0);
        problem.set_objective(vec![2.0, 3.0], true);
        problem.add_constraint("sum", vec![1.0, 1.0], ConstraintOp::Ge, 4.0);
        problem.add_constraint("x_max", vec![1.0, 0.0], ConstraintOp::Le, 3.0);

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.values[0] - 3.0).abs() < 1e-6, "x = {} (expected 3)", solution.values[0]);
        assert!((solution.values[1] - 1.0).abs() < 1e-6, "y = {} (expected 1)", solution.values[1]);
        assert!((solution.objective_value - 9.0).abs() < 1e-6, "obj = {} (expected 9)", solution.objective_value);
    }

    #[test]
    fn test_equality_with_fixed_rhs() {
        // Minimize y subject to x - 0.5y = 2, x <= 3 via bound
        let mut problem = LpProblem::new();
        problem.add_variable("x", 0.0, 3.0);
        problem.add_variable("y", 0.0, f64::INFINITY);
        problem.set_objective(vec![0.0, 1.0], true);
        problem.add_constraint("balance", vec![1.0, -0.5], ConstraintOp::Eq, 2.0);

        let solution = Solver::new().solve(&problem);

        assert!(solution.is_optimal());
        assert!((solution.values[0] - 2.0).abs() < 1e-6, "x = {}", solution.values[0]);
        assert!(solution.values[1].abs() < 1e-6, "y = {}", solution.values[1]);
        assert!(solution.binding_constraints.is_empty());
    }

    #[test]
    fn test_infeasible() {
        // x >= 5
        // x <= 3
        let mut problem = LpProblem::new();
        problem.add_variable("x", 0.0, f64::INFINITY);
        problem.set_objective(vec![1.0], true);
        problem.add_constraint("lower", vec![1.0], ConstraintOp::Ge, 5.0);
        problem.add_constraint("upper", vec![1.0], ConstraintOp::Le, 3.0);

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Infeasible);
        assert!(solution.values.is_empty());
    }

    #[test]
    fn test_upper_bound_makes_infeasible() {
        // The bound alone caps x, no explicit row
        let mut problem = LpProblem::new();
        problem.add_variable("x", 0.0, 3.0);
        problem.set_objective(vec![1.0], true);
        problem.add_constraint("lower", vec![1.0], ConstraintOp::Ge, 5.0);

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Infeasible);
    }

    #[test]
    fn test_unbounded() {
        let mut problem = two_vars(f64::INFINITY);
        problem.set_objective(vec![1.0, 1.0], false);
        problem.add_constraint("x_min", vec![1.0, 0.0], ConstraintOp::Ge, 1.0);

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Unbounded);
        assert!(solution.values.is_empty());
    }

    #[test]
    fn test_malformed_problem_is_error() {
        let mut problem = two_vars(1.0);
        problem.add_constraint("short", vec![1.0], ConstraintOp::Le, 1.0);

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Error);
        assert!(solution.message.unwrap_or_default().contains("short"));
    }

    #[test]
    fn test_find_violations_reports_worst_first() {
        let mut problem = two_vars(1.0);
        problem.add_constraint("small", vec![1.0, 0.0], ConstraintOp::Le, 1.0);
        problem.add_constraint("large", vec![0.0, 1.0], ConstraintOp::Ge, 10.0);

        let violations = Solver::new().find_violations(&problem, &[1.5, 2.0]);

        let names: Vec<&str> = violations.iter().map(|v| v.constraint.as_str()).collect();
        assert_eq!(names, vec!["large", "y_upper", "small"]);
    }
}
