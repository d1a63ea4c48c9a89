use std::fmt;

use thiserror::Error;

/// Represents a linear programming problem
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct LpProblem {
    /// Decision variables with their bounds
    pub variables: Vec<Variable>,
    /// Objective function coefficients (costs)
    pub objective: Objective,
    /// Constraints
    pub constraints: Vec<Constraint>,
}

/// A continuous decision variable
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    /// Lower bound (inclusive), `f64::NEG_INFINITY` when unbounded
    #[cfg_attr(feature = "serde", serde(with = "bound::lower"))]
    pub lower: f64,
    /// Upper bound (inclusive), `f64::INFINITY` when unbounded
    #[cfg_attr(feature = "serde", serde(with = "bound::upper"))]
    pub upper: f64,
}

/// Infinite bounds travel as `null`, since JSON has no infinity
#[cfg(feature = "serde")]
mod bound {
    use serde::{Serialize, Serializer};

    fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        let finite = if value.is_infinite() { None } else { Some(*value) };
        finite.serialize(serializer)
    }

    pub mod lower {
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
            super::serialize(value, serializer)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
            Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NEG_INFINITY))
        }
    }

    pub mod upper {
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
            super::serialize(value, serializer)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
            Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    /// Whether to minimize or maximize
    pub minimize: bool,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// Name/label for the constraint (for diagnostics)
    pub name: String,
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    /// Comparison operator
    pub op: ConstraintOp,
    /// Right-hand side value
    pub rhs: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    /// Less than or equal (<=)
    Le,
    /// Greater than or equal (>=)
    Ge,
    /// Equal (=)
    Eq,
}

/// Structural problems detected before the backend is invoked
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProblemError {
    #[error("{name} has {found} coefficients but the problem has {expected} variables")]
    DimensionMismatch { name: String, expected: usize, found: usize },
    #[error("Variable {name} has lower bound {lower} above upper bound {upper}")]
    InvertedBounds { name: String, lower: f64, upper: f64 },
    #[error("Non-finite value in {0}")]
    NonFinite(String),
}

impl LpProblem {
    pub fn new() -> Self {
        Self {
            variables: Vec::new(),
            objective: Objective {
                coefficients: Vec::new(),
                minimize: true,
            },
            constraints: Vec::new(),
        }
    }

    /// Add a variable with the given bounds and return its column index
    pub fn add_variable(&mut self, name: impl Into<String>, lower: f64, upper: f64) -> usize {
        self.variables.push(Variable {
            name: name.into(),
            lower,
            upper,
        });
        self.objective.coefficients.push(0.0);
        self.variables.len() - 1
    }

    pub fn set_objective(&mut self, coefficients: Vec<f64>, minimize: bool) {
        self.objective = Objective { coefficients, minimize };
    }

    pub fn add_constraint(&mut self, name: impl Into<String>, coefficients: Vec<f64>, op: ConstraintOp, rhs: f64) {
        self.constraints.push(Constraint {
            name: name.into(),
            coefficients,
            op,
            rhs,
        });
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.variables.iter().map(|v| v.name.as_str())
    }

    /// Check that every row matches the variable count and all numbers are usable
    pub fn validate(&self) -> Result<(), ProblemError> {
        let n = self.num_variables();

        if self.objective.coefficients.len() != n {
            return Err(ProblemError::DimensionMismatch {
                name: "objective".to_string(),
                expected: n,
                found: self.objective.coefficients.len(),
            });
        }
        if self.objective.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ProblemError::NonFinite("objective".to_string()));
        }

        for v in &self.variables {
            // Infinite upper bounds are allowed, NaN is not
            if v.lower.is_nan() || v.upper.is_nan() || v.lower == f64::INFINITY {
                return Err(ProblemError::NonFinite(v.name.clone()));
            }
            if v.lower > v.upper {
                return Err(ProblemError::InvertedBounds {
                    name: v.name.clone(),
                    lower: v.lower,
                    upper: v.upper,
                });
            }
        }

        for c in &self.constraints {
            if c.coefficients.len() != n {
                return Err(ProblemError::DimensionMismatch {
                    name: c.name.clone(),
                    expected: n,
                    found: c.coefficients.len(),
                });
            }
            if !c.rhs.is_finite() || c.coefficients.iter().any(|x| !x.is_finite()) {
                return Err(ProblemError::NonFinite(c.name.clone()));
            }
        }

        Ok(())
    }

    /// Evaluate the left-hand side of a constraint at the given point
    pub fn evaluate(&self, constraint: &Constraint, values: &[f64]) -> f64 {
        constraint
            .coefficients
            .iter()
            .zip(values)
            .map(|(coef, value)| coef * value)
            .sum()
    }
}

impl Default for LpProblem {
    fn default() -> Self {
        Self::new()
    }
}

/// Writes a linear expression like `x - 0.5 y + 2 z`, skipping zero terms
fn write_expression(f: &mut fmt::Formatter<'_>, coefficients: &[f64], variables: &[Variable]) -> fmt::Result {
    let mut first = true;
    for (coef, var) in coefficients.iter().zip(variables) {
        if *coef == 0.0 {
            continue;
        }
        let sign = if *coef < 0.0 { "-" } else { "+" };
        let magnitude = coef.abs();
        if first {
            if *coef < 0.0 {
                write!(f, "-")?;
            }
        } else {
            write!(f, " {} ", sign)?;
        }
        if magnitude != 1.0 {
            write!(f, "{} ", magnitude)?;
        }
        write!(f, "{}", var.name)?;
        first = false;
    }
    if first {
        write!(f, "0")?;
    }
    Ok(())
}

impl fmt::Display for LpProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", if self.objective.minimize { "minimize" } else { "maximize" })?;
        write!(f, "  ")?;
        write_expression(f, &self.objective.coefficients, &self.variables)?;
        writeln!(f)?;

        writeln!(f, "subject to")?;
        for c in &self.constraints {
            write!(f, "  {}: ", c.name)?;
            write_expression(f, &c.coefficients, &self.variables)?;
            let op = match c.op {
                ConstraintOp::Le => "<=",
                ConstraintOp::Ge => ">=",
                ConstraintOp::Eq => "=",
            };
            writeln!(f, " {} {}", op, c.rhs)?;
        }

        writeln!(f, "bounds")?;
        for v in &self.variables {
            if v.upper.is_finite() {
                writeln!(f, "  {} <= {} <= {}", v.lower, v.name, v.upper)?;
            } else {
                writeln!(f, "  {} >= {}", v.name, v.lower)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_variable_extends_objective() {
        let mut problem = LpProblem::new();
        let x = problem.add_variable("x", 0.0, f64::INFINITY);
        let y = problem.add_variable("y", 0.0, 3.0);

        assert_eq!((x, y), (0, 1));
        assert_eq!(problem.objective.coefficients, vec![0.0, 0.0]);
        assert!(problem.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_short_row() {
        let mut problem = LpProblem::new();
        problem.add_variable("x", 0.0, f64::INFINITY);
        problem.add_variable("y", 0.0, f64::INFINITY);
        problem.add_constraint("short", vec![1.0], ConstraintOp::Le, 4.0);

        assert_eq!(
            problem.validate(),
            Err(ProblemError::DimensionMismatch {
                name: "short".to_string(),
                expected: 2,
                found: 1,
            })
        );
    }

    #[test]
    fn test_validate_rejects_inverted_bounds() {
        let mut problem = LpProblem::new();
        problem.add_variable("x", 5.0, 3.0);

        assert!(matches!(problem.validate(), Err(ProblemError::InvertedBounds { .. })));
    }

    #[test]
    fn test_display_renders_rows_and_bounds() {
        let mut problem = LpProblem::new();
        problem.add_variable("x", 0.0, f64::INFINITY);
        problem.add_variable("y", 0.0, 3.0);
        problem.set_objective(vec![1.0, 0.0], true);
        problem.add_constraint("balance", vec![1.0, -0.5], ConstraintOp::Eq, 2.0);

        let text = problem.to_string();
        println!("{}", text);

        assert!(text.contains("minimize\n  x\n"));
        assert!(text.contains("balance: x - 0.5 y = 2"));
        assert!(text.contains("0 <= y <= 3"));
        assert!(text.contains("x >= 0"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_json_keeps_infinite_bounds() {
        let mut problem = LpProblem::new();
        problem.add_variable("x", 0.0, f64::INFINITY);
        problem.add_variable("y", f64::NEG_INFINITY, 3.0);
        problem.set_objective(vec![1.0, 1.0], true);
        problem.add_constraint("sum", vec![1.0, 1.0], ConstraintOp::Ge, 2.0);

        let json = serde_json::to_string(&problem).unwrap();
        println!("{}", json);
        assert!(json.contains(r#"{"name":"x","lower":0.0,"upper":null}"#));
        assert!(json.contains(r#"{"name":"y","lower":null,"upper":3.0}"#));

        let back: LpProblem = serde_json::from_str(&json).unwrap();
        assert_eq!(back, problem);
        assert_eq!(back.variables[0].upper, f64::INFINITY);
        assert_eq!(back.variables[1].lower, f64::NEG_INFINITY);
    }
}
