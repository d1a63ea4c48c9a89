pub mod builder;
pub mod error;
pub mod plan;
pub mod report;
pub mod scenario;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use builder::{Family, ManpowerModel, Subject, VarKey, build};
pub use error::PlanError;
pub use plan::{CostBreakdown, Plan, ResultTable, solve, solve_with};
pub use report::{Report, ReportRow, ReportStatus};
pub use scenario::{
    Downgrade, ObjectiveKind, PerRetraining, PerSkill, Retraining, RetrainingCapacity, Scenario, ScenarioError, Skill,
    WorkforcePolicy,
};

/// Build a fresh model for the scenario and solve it
pub fn optimize(scenario: &Scenario) -> Result<Plan, PlanError> {
    let model = build(scenario)?;
    solve(&model)
}
