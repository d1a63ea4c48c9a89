use thiserror::Error;

use crate::scenario::ScenarioError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    #[error("Invalid scenario: {0}")]
    InvalidScenario(#[from] ScenarioError),
    #[error("No optimal plan exists: {reason}")]
    Infeasible { reason: String },
    #[error("Solver failure: {0}")]
    SolverFailure(String),
}
