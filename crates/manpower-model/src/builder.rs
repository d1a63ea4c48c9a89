use std::collections::HashMap;
use std::fmt;

use manpower_solver::{ConstraintOp, LpProblem};
use tracing::debug;

use crate::error::PlanError;
use crate::scenario::{Downgrade, ObjectiveKind, PerSkill, Retraining, Scenario, Skill};

/// Decision variable family
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Family {
    TotalWorkers,
    RecruitedWorkers,
    RetrainedWorkers,
    DowngradedWorkers,
    RedundantWorkers,
    ShortTimeWorkers,
    OvermannedWorkers,
}

impl Family {
    pub const ALL: [Family; 7] = [
        Family::TotalWorkers,
        Family::RecruitedWorkers,
        Family::RetrainedWorkers,
        Family::DowngradedWorkers,
        Family::RedundantWorkers,
        Family::ShortTimeWorkers,
        Family::OvermannedWorkers,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Family::TotalWorkers => "TotalWorkers",
            Family::RecruitedWorkers => "RecruitedWorkers",
            Family::RetrainedWorkers => "RetrainedWorkers",
            Family::DowngradedWorkers => "DowngradedWorkers",
            Family::RedundantWorkers => "RedundantWorkers",
            Family::ShortTimeWorkers => "ShortTimeWorkers",
            Family::OvermannedWorkers => "OvermannedWorkers",
        }
    }

    /// The skills or transitions this family is indexed by
    pub fn subjects(&self) -> Vec<Subject> {
        match self {
            Family::RetrainedWorkers => Retraining::ALL.into_iter().map(Subject::Retraining).collect(),
            Family::DowngradedWorkers => Downgrade::ALL.into_iter().map(Subject::Downgrade).collect(),
            _ => Skill::ALL.into_iter().map(Subject::Skill).collect(),
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Second index of a variable: a skill tier or a transition between tiers
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Subject {
    Skill(Skill),
    Retraining(Retraining),
    Downgrade(Downgrade),
}

impl Subject {
    pub fn label(&self) -> &'static str {
        match self {
            Subject::Skill(s) => s.label(),
            Subject::Retraining(t) => t.label(),
            Subject::Downgrade(d) => d.label(),
        }
    }
}

impl From<Skill> for Subject {
    fn from(skill: Skill) -> Self {
        Subject::Skill(skill)
    }
}

impl From<Retraining> for Subject {
    fn from(transition: Retraining) -> Self {
        Subject::Retraining(transition)
    }
}

impl From<Downgrade> for Subject {
    fn from(transition: Downgrade) -> Self {
        Subject::Downgrade(transition)
    }
}

/// Key of one decision variable: (family, skill-or-transition, year)
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarKey {
    pub family: Family,
    pub subject: Subject,
    pub year: u32,
}

impl VarKey {
    pub fn new(family: Family, subject: impl Into<Subject>, year: u32) -> Self {
        Self {
            family,
            subject: subject.into(),
            year,
        }
    }
}

impl fmt::Display for VarKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{},{}]", self.family, self.subject.label(), self.year)
    }
}

/// A fully specified LP for one scenario, plus the mapping from keys to columns.
/// Read-only once built, so `keys` always match the problem's columns.
#[derive(Debug, Clone)]
pub struct ManpowerModel {
    problem: LpProblem,
    objective: ObjectiveKind,
    horizon: u32,
    /// Variable keys in column order
    keys: Vec<VarKey>,
    index: HashMap<VarKey, usize>,
    /// Year-0 headcount; constants, not LP columns
    initial: PerSkill<f64>,
}

impl ManpowerModel {
    pub fn problem(&self) -> &LpProblem {
        &self.problem
    }

    pub fn objective(&self) -> ObjectiveKind {
        self.objective
    }

    pub fn horizon(&self) -> u32 {
        self.horizon
    }

    pub fn keys(&self) -> &[VarKey] {
        &self.keys
    }

    /// Column of a variable, `None` for year-0 workforce and unknown keys
    pub fn column(&self, key: &VarKey) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub fn initial_workforce(&self, skill: Skill) -> f64 {
        self.initial[skill]
    }

    /// Dense coefficient row from (key, coefficient) terms. Every key must be a declared variable.
    fn row(&self, terms: &[(VarKey, f64)]) -> Vec<f64> {
        let mut coefficients = vec![0.0; self.keys.len()];
        for (key, coef) in terms {
            coefficients[self.index[key]] += coef;
        }
        coefficients
    }

    fn add_row(&mut self, name: String, terms: &[(VarKey, f64)], op: ConstraintOp, rhs: f64) {
        let coefficients = self.row(terms);
        self.problem.add_constraint(name, coefficients, op, rhs);
    }
}

/// Build the LP for a scenario. Pure and deterministic: the same scenario always
/// yields the same variables, rows and objective.
pub fn build(scenario: &Scenario) -> Result<ManpowerModel, PlanError> {
    scenario.validate()?;

    let mut model = ManpowerModel {
        problem: LpProblem::new(),
        objective: scenario.objective,
        horizon: scenario.horizon(),
        keys: Vec::new(),
        index: HashMap::new(),
        initial: PerSkill::new(
            scenario.current_strength(Skill::Unskilled),
            scenario.current_strength(Skill::SemiSkilled),
            scenario.current_strength(Skill::Skilled),
        ),
    };

    declare_variables(&mut model, scenario);
    add_balance_constraints(&mut model, scenario);
    add_requirement_constraints(&mut model, scenario);
    add_overmanning_limits(&mut model, scenario);
    add_retraining_rate_limits(&mut model, scenario);

    let coefficients = model
        .keys
        .iter()
        .map(|key| objective_coefficient(scenario, key))
        .collect();
    model.problem.set_objective(coefficients, true);

    debug!(
        horizon = model.horizon,
        variables = model.problem.num_variables(),
        constraints = model.problem.num_constraints(),
        objective = ?model.objective,
        "built manpower model"
    );

    Ok(model)
}

fn declare_variables(model: &mut ManpowerModel, scenario: &Scenario) {
    for family in Family::ALL {
        for subject in family.subjects() {
            for year in scenario.years() {
                let key = VarKey { family, subject, year };
                let column = model.problem.add_variable(key.to_string(), 0.0, upper_bound(scenario, &key));
                model.index.insert(key, column);
                model.keys.push(key);
            }
        }
    }
}

/// Capacities that are enforced as variable bounds
fn upper_bound(scenario: &Scenario, key: &VarKey) -> f64 {
    match (key.family, key.subject) {
        (Family::RecruitedWorkers, Subject::Skill(skill)) => scenario.recruitment_capacity[skill],
        (Family::ShortTimeWorkers, Subject::Skill(_)) => scenario.short_time_limit,
        (Family::RetrainedWorkers, Subject::Retraining(Retraining::UnskilledToSemi)) => {
            scenario.retraining_capacity.unskilled_to_semi
        }
        _ => f64::INFINITY,
    }
}

/// TW[s,y] = existing·TW[s,y-1] + recruits·R + retrainees·T(in) - T(out)
///           + arrival·D(in) - D(out) - X
/// written with every variable on the left; year-0 workforce moves to the rhs.
fn add_balance_constraints(model: &mut ManpowerModel, scenario: &Scenario) {
    let policy = &scenario.policy;

    for year in scenario.years() {
        for skill in Skill::ALL {
            let retained = policy.existing[skill];
            let mut rhs = 0.0;
            let mut terms = vec![(VarKey::new(Family::TotalWorkers, skill, year), 1.0)];

            if year == 1 {
                rhs = retained * model.initial[skill];
            } else {
                terms.push((VarKey::new(Family::TotalWorkers, skill, year - 1), -retained));
            }

            terms.push((VarKey::new(Family::RecruitedWorkers, skill, year), -policy.recruits[skill]));

            for transition in Retraining::ALL {
                let key = VarKey::new(Family::RetrainedWorkers, transition, year);
                if transition.target() == skill {
                    terms.push((key, -policy.retrainees));
                }
                if transition.source() == skill {
                    terms.push((key, 1.0));
                }
            }

            for transition in Downgrade::ALL {
                let key = VarKey::new(Family::DowngradedWorkers, transition, year);
                if transition.target() == skill {
                    terms.push((key, -policy.downgrade_arrival));
                }
                if transition.source() == skill {
                    terms.push((key, 1.0));
                }
            }

            terms.push((VarKey::new(Family::RedundantWorkers, skill, year), 1.0));

            model.add_row(format!("{}_balance_{}", skill, year), &terms, ConstraintOp::Eq, rhs);
        }
    }
}

/// TW[s,y] - O[s,y] - output·ST[s,y] = requirement[s,y]
fn add_requirement_constraints(model: &mut ManpowerModel, scenario: &Scenario) {
    for skill in Skill::ALL {
        for year in scenario.years() {
            let terms = [
                (VarKey::new(Family::TotalWorkers, skill, year), 1.0),
                (VarKey::new(Family::OvermannedWorkers, skill, year), -1.0),
                (
                    VarKey::new(Family::ShortTimeWorkers, skill, year),
                    -scenario.policy.short_time_output,
                ),
            ];
            model.add_row(
                format!("{}_requirement_{}", skill, year),
                &terms,
                ConstraintOp::Eq,
                scenario.requirement(skill, year),
            );
        }
    }
}

/// Sum over skills of O[s,y] <= overmanning_limit
fn add_overmanning_limits(model: &mut ManpowerModel, scenario: &Scenario) {
    for year in scenario.years() {
        let terms: Vec<(VarKey, f64)> = Skill::ALL
            .into_iter()
            .map(|skill| (VarKey::new(Family::OvermannedWorkers, skill, year), 1.0))
            .collect();
        model.add_row(
            format!("overmanning_limit_{}", year),
            &terms,
            ConstraintOp::Le,
            scenario.overmanning_limit,
        );
    }
}

/// T[SemiToSkilled,y] <= rate·TW[Skilled,y]. A rate, so a row rather than a bound.
fn add_retraining_rate_limits(model: &mut ManpowerModel, scenario: &Scenario) {
    let rate = scenario.retraining_capacity.semi_to_skilled;
    for year in scenario.years() {
        let terms = [
            (VarKey::new(Family::RetrainedWorkers, Retraining::SemiToSkilled, year), 1.0),
            (VarKey::new(Family::TotalWorkers, Skill::Skilled, year), -rate),
        ];
        model.add_row(format!("SemiToSkilled_rate_{}", year), &terms, ConstraintOp::Le, 0.0);
    }
}

fn objective_coefficient(scenario: &Scenario, key: &VarKey) -> f64 {
    match scenario.objective {
        ObjectiveKind::MinimizeRedundancy => {
            if key.family == Family::RedundantWorkers {
                1.0
            } else {
                0.0
            }
        }
        ObjectiveKind::MinimizeCost => match (key.family, key.subject) {
            (Family::RetrainedWorkers, Subject::Retraining(t)) => scenario.retraining_cost[t],
            (Family::RedundantWorkers, Subject::Skill(s)) => scenario.redundancy_cost[s],
            (Family::ShortTimeWorkers, Subject::Skill(s)) => scenario.short_time_cost[s],
            (Family::OvermannedWorkers, Subject::Skill(s)) => scenario.overmanning_cost[s],
            _ => 0.0,
        },
    }
}
