use crate::error::PlanError;
use crate::plan::{CostBreakdown, Plan};
use crate::scenario::{ObjectiveKind, Scenario};

/// Outcome status as seen by consumers of a [`Report`]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportStatus {
    Optimal,
    Infeasible,
    Invalid,
    Error,
}

/// One solved value, flattened for tables and charts
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub family: String,
    pub label: String,
    pub year: u32,
    pub value: f64,
}

/// Structured result of one build-and-solve, suitable for serialization
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub status: ReportStatus,
    pub objective: ObjectiveKind,
    pub objective_value: Option<f64>,
    pub rows: Vec<ReportRow>,
    pub costs: Option<CostBreakdown>,
    pub binding_constraints: Vec<String>,
    pub message: Option<String>,
}

impl Report {
    pub fn from_outcome(outcome: &Result<Plan, PlanError>, scenario: &Scenario) -> Self {
        match outcome {
            Ok(plan) => Self {
                status: ReportStatus::Optimal,
                objective: plan.objective,
                objective_value: Some(plan.objective_value),
                rows: plan
                    .table
                    .iter()
                    .map(|(key, value)| ReportRow {
                        family: key.family.name().to_string(),
                        label: key.subject.label().to_string(),
                        year: key.year,
                        value,
                    })
                    .collect(),
                costs: Some(plan.cost_breakdown(scenario)),
                binding_constraints: plan.binding_constraints.clone(),
                message: None,
            },
            Err(err) => Self {
                status: match err {
                    PlanError::InvalidScenario(_) => ReportStatus::Invalid,
                    PlanError::Infeasible { .. } => ReportStatus::Infeasible,
                    PlanError::SolverFailure(_) => ReportStatus::Error,
                },
                objective: scenario.objective,
                objective_value: None,
                rows: Vec::new(),
                costs: None,
                binding_constraints: Vec::new(),
                message: Some(err.to_string()),
            },
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status == ReportStatus::Optimal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimize;

    #[test]
    fn test_report_from_optimal_plan() {
        let scenario = Scenario::default();
        let report = Report::from_outcome(&optimize(&scenario), &scenario);

        assert!(report.is_optimal());
        assert_eq!(report.rows.len(), 63);
        assert_eq!(report.rows[0].family, "TotalWorkers");
        assert_eq!(report.rows[0].label, "Unskilled");
        assert_eq!(report.rows[0].year, 0);
        assert_eq!(report.rows[0].value, 2000.0);
        assert!(report.costs.is_some());
        assert!(report.message.is_none());
    }

    #[test]
    fn test_report_from_invalid_scenario_has_no_rows() {
        let mut scenario = Scenario::default();
        scenario.overmanning_limit = -1.0;
        let report = Report::from_outcome(&optimize(&scenario), &scenario);

        assert_eq!(report.status, ReportStatus::Invalid);
        assert!(report.rows.is_empty());
        assert!(report.objective_value.is_none());
        assert!(report.message.unwrap_or_default().contains("overmanning_limit"));
    }

    #[test]
    fn test_report_from_infeasible_outcome() {
        let scenario = Scenario::default();
        let outcome = Err(PlanError::Infeasible {
            reason: "constraints cannot all be satisfied".to_string(),
        });
        let report = Report::from_outcome(&outcome, &scenario);

        assert_eq!(report.status, ReportStatus::Infeasible);
        assert!(report.costs.is_none());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_report_serializes_status_in_lowercase() {
        let scenario = Scenario::default();
        let outcome = Err(PlanError::SolverFailure("numerical trouble".to_string()));
        let json = serde_json::to_value(Report::from_outcome(&outcome, &scenario)).unwrap();

        assert_eq!(json["status"], "error");
        assert_eq!(json["objective"], "minimize_redundancy");
        assert_eq!(json["message"], "Solver failure: numerical trouble");
    }
}
