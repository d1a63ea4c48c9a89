use std::collections::HashMap;

use manpower_solver::{SolutionStatus, Solver};
use tracing::{info, warn};

use crate::builder::{Family, ManpowerModel, Subject, VarKey};
use crate::error::PlanError;
use crate::scenario::{ObjectiveKind, Scenario, Skill};

/// Solved variable values keyed by (family, skill-or-transition, year).
/// Iteration follows the model's column order, with the year-0 workforce
/// placed ahead of year 1 for each skill.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    entries: Vec<(VarKey, f64)>,
    index: HashMap<VarKey, usize>,
}

impl ResultTable {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    fn push(&mut self, key: VarKey, value: f64) {
        self.index.insert(key, self.entries.len());
        self.entries.push((key, value));
    }

    pub fn get(&self, family: Family, subject: impl Into<Subject>, year: u32) -> Option<f64> {
        self.get_key(&VarKey::new(family, subject, year))
    }

    pub fn get_key(&self, key: &VarKey) -> Option<f64> {
        self.index.get(key).map(|&i| self.entries[i].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (VarKey, f64)> + '_ {
        self.entries.iter().copied()
    }

    /// Entries of one family, in table order
    pub fn family(&self, family: Family) -> impl Iterator<Item = (VarKey, f64)> + '_ {
        self.iter().filter(move |(key, _)| key.family == family)
    }

    /// Sum of a family over all subjects in one year
    pub fn year_total(&self, family: Family, year: u32) -> f64 {
        self.family(family)
            .filter(|(key, _)| key.year == year)
            .map(|(_, value)| value)
            .sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Cost of a plan split by category, whatever objective produced it
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CostBreakdown {
    pub retraining: f64,
    pub redundancy: f64,
    pub short_time: f64,
    pub overmanning: f64,
}

impl CostBreakdown {
    pub fn total(&self) -> f64 {
        self.retraining + self.redundancy + self.short_time + self.overmanning
    }
}

/// An optimal workforce plan
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub objective: ObjectiveKind,
    pub objective_value: f64,
    pub table: ResultTable,
    /// Inequality constraints with no slack at the optimum
    pub binding_constraints: Vec<String>,
}

impl Plan {
    pub fn value(&self, family: Family, subject: impl Into<Subject>, year: u32) -> Option<f64> {
        self.table.get(family, subject, year)
    }

    pub fn total_redundancy(&self) -> f64 {
        self.table.family(Family::RedundantWorkers).map(|(_, v)| v).sum()
    }

    pub fn cost_breakdown(&self, scenario: &Scenario) -> CostBreakdown {
        let mut costs = CostBreakdown::default();
        for (key, value) in self.table.iter() {
            match (key.family, key.subject) {
                (Family::RetrainedWorkers, Subject::Retraining(t)) => {
                    costs.retraining += scenario.retraining_cost[t] * value
                }
                (Family::RedundantWorkers, Subject::Skill(s)) => costs.redundancy += scenario.redundancy_cost[s] * value,
                (Family::ShortTimeWorkers, Subject::Skill(s)) => costs.short_time += scenario.short_time_cost[s] * value,
                (Family::OvermannedWorkers, Subject::Skill(s)) => {
                    costs.overmanning += scenario.overmanning_cost[s] * value
                }
                _ => {}
            }
        }
        costs
    }
}

/// Solve a built model with the default solver settings
pub fn solve(model: &ManpowerModel) -> Result<Plan, PlanError> {
    solve_with(model, &Solver::new())
}

/// Solve a built model. Only an optimal, verified solution produces a plan;
/// every other outcome is an error with no partial values.
pub fn solve_with(model: &ManpowerModel, solver: &Solver) -> Result<Plan, PlanError> {
    let solution = solver.solve(model.problem());

    match solution.status {
        SolutionStatus::Optimal => {}
        SolutionStatus::Infeasible => {
            info!("manpower model is infeasible");
            return Err(PlanError::Infeasible {
                reason: "constraints cannot all be satisfied".to_string(),
            });
        }
        SolutionStatus::Unbounded => {
            info!("manpower model is unbounded");
            return Err(PlanError::Infeasible {
                reason: "objective is unbounded".to_string(),
            });
        }
        SolutionStatus::Error => {
            let message = solution.message.unwrap_or_else(|| "unknown solver error".to_string());
            warn!(%message, "LP solve failed");
            return Err(PlanError::SolverFailure(message));
        }
    }

    let mut table = ResultTable::with_capacity(model.keys().len() + Skill::ALL.len());
    for (column, key) in model.keys().iter().enumerate() {
        if key.family == Family::TotalWorkers && key.year == 1 {
            if let Subject::Skill(skill) = key.subject {
                table.push(VarKey::new(Family::TotalWorkers, skill, 0), model.initial_workforce(skill));
            }
        }
        table.push(*key, solution.values[column]);
    }

    info!(
        objective = ?model.objective(),
        value = solution.objective_value,
        binding = solution.binding_constraints.len(),
        "manpower model solved"
    );

    Ok(Plan {
        objective: model.objective(),
        objective_value: solution.objective_value,
        table,
        binding_constraints: solution.binding_constraints,
    })
}
