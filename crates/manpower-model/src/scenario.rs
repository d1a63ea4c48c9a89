use std::fmt;
use std::ops::{Index, RangeInclusive};

use thiserror::Error;

/// Skill tier, ordered by qualification level
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Skill {
    Unskilled,
    SemiSkilled,
    Skilled,
}

impl Skill {
    pub const ALL: [Skill; 3] = [Skill::Unskilled, Skill::SemiSkilled, Skill::Skilled];

    pub fn label(&self) -> &'static str {
        match self {
            Skill::Unskilled => "Unskilled",
            Skill::SemiSkilled => "SemiSkilled",
            Skill::Skilled => "Skilled",
        }
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Upgrade from a lower tier to the next one up
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Retraining {
    UnskilledToSemi,
    SemiToSkilled,
}

impl Retraining {
    pub const ALL: [Retraining; 2] = [Retraining::UnskilledToSemi, Retraining::SemiToSkilled];

    pub fn source(&self) -> Skill {
        match self {
            Retraining::UnskilledToSemi => Skill::Unskilled,
            Retraining::SemiToSkilled => Skill::SemiSkilled,
        }
    }

    pub fn target(&self) -> Skill {
        match self {
            Retraining::UnskilledToSemi => Skill::SemiSkilled,
            Retraining::SemiToSkilled => Skill::Skilled,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Retraining::UnskilledToSemi => "UnskilledToSemi",
            Retraining::SemiToSkilled => "SemiToSkilled",
        }
    }
}

/// Move from a higher tier to a lower one
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Downgrade {
    SkilledToSemi,
    SkilledToUnskilled,
    SemiToUnskilled,
}

impl Downgrade {
    pub const ALL: [Downgrade; 3] = [
        Downgrade::SkilledToSemi,
        Downgrade::SkilledToUnskilled,
        Downgrade::SemiToUnskilled,
    ];

    pub fn source(&self) -> Skill {
        match self {
            Downgrade::SkilledToSemi | Downgrade::SkilledToUnskilled => Skill::Skilled,
            Downgrade::SemiToUnskilled => Skill::SemiSkilled,
        }
    }

    pub fn target(&self) -> Skill {
        match self {
            Downgrade::SkilledToSemi => Skill::SemiSkilled,
            Downgrade::SkilledToUnskilled | Downgrade::SemiToUnskilled => Skill::Unskilled,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Downgrade::SkilledToSemi => "SkilledToSemi",
            Downgrade::SkilledToUnskilled => "SkilledToUnskilled",
            Downgrade::SemiToUnskilled => "SemiToUnskilled",
        }
    }
}

/// Which linear objective the model minimizes
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ObjectiveKind {
    /// Total redundancies over all skills and years
    #[default]
    MinimizeRedundancy,
    /// Retraining, redundancy, short-time and overmanning cost
    MinimizeCost,
}

/// One value per skill tier
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "PascalCase"))]
#[derive(Debug, Clone, PartialEq)]
pub struct PerSkill<T> {
    pub unskilled: T,
    pub semi_skilled: T,
    pub skilled: T,
}

impl<T> PerSkill<T> {
    pub fn new(unskilled: T, semi_skilled: T, skilled: T) -> Self {
        Self {
            unskilled,
            semi_skilled,
            skilled,
        }
    }

    pub fn get(&self, skill: Skill) -> &T {
        match skill {
            Skill::Unskilled => &self.unskilled,
            Skill::SemiSkilled => &self.semi_skilled,
            Skill::Skilled => &self.skilled,
        }
    }

    pub fn get_mut(&mut self, skill: Skill) -> &mut T {
        match skill {
            Skill::Unskilled => &mut self.unskilled,
            Skill::SemiSkilled => &mut self.semi_skilled,
            Skill::Skilled => &mut self.skilled,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Skill, &T)> {
        Skill::ALL.into_iter().map(move |skill| (skill, self.get(skill)))
    }
}

impl<T: Clone> PerSkill<T> {
    pub fn splat(value: T) -> Self {
        Self::new(value.clone(), value.clone(), value)
    }
}

impl<T> Index<Skill> for PerSkill<T> {
    type Output = T;

    fn index(&self, skill: Skill) -> &T {
        self.get(skill)
    }
}

/// One value per retraining transition
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "PascalCase"))]
#[derive(Debug, Clone, PartialEq)]
pub struct PerRetraining<T> {
    pub unskilled_to_semi: T,
    pub semi_to_skilled: T,
}

impl<T> Index<Retraining> for PerRetraining<T> {
    type Output = T;

    fn index(&self, transition: Retraining) -> &T {
        match transition {
            Retraining::UnskilledToSemi => &self.unskilled_to_semi,
            Retraining::SemiToSkilled => &self.semi_to_skilled,
        }
    }
}

/// Retraining limits. The two transitions are capped differently:
/// `unskilled_to_semi` is a headcount per year, `semi_to_skilled` is a
/// fraction of that year's skilled workforce.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "PascalCase"))]
#[derive(Debug, Clone, PartialEq)]
pub struct RetrainingCapacity {
    pub unskilled_to_semi: f64,
    pub semi_to_skilled: f64,
}

/// Retention multipliers and effectiveness factors used by the balance equations
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct WorkforcePolicy {
    /// Fraction of last year's staff still employed this year
    pub existing: PerSkill<f64>,
    /// Fraction of this year's recruits still employed at year end
    pub recruits: PerSkill<f64>,
    /// Fraction of retrainees that arrive in their new tier
    pub retrainees: f64,
    /// Fraction of downgraded workers that arrive in the lower tier
    pub downgrade_arrival: f64,
    /// Output of one short-time worker relative to a full-time one
    pub short_time_output: f64,
}

impl Default for WorkforcePolicy {
    fn default() -> Self {
        Self {
            existing: PerSkill::new(0.90, 0.95, 0.95),
            recruits: PerSkill::new(0.75, 0.80, 0.90),
            retrainees: 0.95,
            downgrade_arrival: 0.5,
            short_time_output: 0.5,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScenarioError {
    #[error("Planning horizon is empty: requirements must cover year 0 and at least one future year")]
    EmptyHorizon,
    #[error("Requirements for {skill} cover {found} years, expected {expected}")]
    RequirementLength { skill: Skill, expected: usize, found: usize },
    #[error("{field} must be a finite number")]
    NonFinite { field: String },
    #[error("{field} must not be negative (got {value})")]
    Negative { field: String, value: f64 },
    #[error("{field} must lie in [0, 1] (got {value})")]
    OutOfUnitRange { field: String, value: f64 },
}

/// A complete workforce planning scenario
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    /// Required headcount per skill, indexed by year; index 0 is current strength
    pub manpower_requirements: PerSkill<Vec<f64>>,
    pub recruitment_capacity: PerSkill<f64>,
    pub retraining_capacity: RetrainingCapacity,
    pub retraining_cost: PerRetraining<f64>,
    pub redundancy_cost: PerSkill<f64>,
    pub overmanning_cost: PerSkill<f64>,
    /// Total overmanned workers allowed across all skills, per year
    pub overmanning_limit: f64,
    /// Short-time workers allowed per skill, per year
    pub short_time_limit: f64,
    pub short_time_cost: PerSkill<f64>,
    pub policy: WorkforcePolicy,
    pub objective: ObjectiveKind,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            manpower_requirements: PerSkill::new(
                vec![2000.0, 1000.0, 500.0, 0.0],
                vec![1500.0, 1400.0, 2000.0, 2500.0],
                vec![1000.0, 1000.0, 1500.0, 2000.0],
            ),
            recruitment_capacity: PerSkill::new(500.0, 800.0, 500.0),
            retraining_capacity: RetrainingCapacity {
                unskilled_to_semi: 200.0,
                semi_to_skilled: 0.25,
            },
            retraining_cost: PerRetraining {
                unskilled_to_semi: 400.0,
                semi_to_skilled: 500.0,
            },
            redundancy_cost: PerSkill::new(200.0, 500.0, 500.0),
            overmanning_cost: PerSkill::new(1500.0, 2000.0, 3000.0),
            overmanning_limit: 150.0,
            short_time_limit: 50.0,
            short_time_cost: PerSkill::new(500.0, 400.0, 400.0),
            policy: WorkforcePolicy::default(),
            objective: ObjectiveKind::default(),
        }
    }
}

impl Scenario {
    /// Number of future years, H. Zero for a malformed scenario.
    pub fn horizon(&self) -> u32 {
        self.manpower_requirements.skilled.len().saturating_sub(1) as u32
    }

    /// Future years 1..=H
    pub fn years(&self) -> RangeInclusive<u32> {
        1..=self.horizon()
    }

    /// Required headcount for a skill in a year (0 for years past the horizon)
    pub fn requirement(&self, skill: Skill, year: u32) -> f64 {
        self.manpower_requirements[skill]
            .get(year as usize)
            .copied()
            .unwrap_or(0.0)
    }

    /// Current (year 0) strength of a skill
    pub fn current_strength(&self, skill: Skill) -> f64 {
        self.requirement(skill, 0)
    }

    pub fn with_objective(mut self, objective: ObjectiveKind) -> Self {
        self.objective = objective;
        self
    }

    /// Reject malformed or out-of-range input. Nothing is clamped.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        let expected = self.manpower_requirements.skilled.len();
        for (skill, series) in self.manpower_requirements.iter() {
            if series.len() != expected {
                return Err(ScenarioError::RequirementLength {
                    skill,
                    expected,
                    found: series.len(),
                });
            }
        }
        if expected < 2 {
            return Err(ScenarioError::EmptyHorizon);
        }

        for (skill, series) in self.manpower_requirements.iter() {
            for (year, &value) in series.iter().enumerate() {
                non_negative(&format!("manpower_requirements.{}[{}]", skill, year), value)?;
            }
        }

        for skill in Skill::ALL {
            non_negative(&format!("recruitment_capacity.{}", skill), self.recruitment_capacity[skill])?;
            non_negative(&format!("redundancy_cost.{}", skill), self.redundancy_cost[skill])?;
            non_negative(&format!("overmanning_cost.{}", skill), self.overmanning_cost[skill])?;
            non_negative(&format!("short_time_cost.{}", skill), self.short_time_cost[skill])?;
        }
        for transition in Retraining::ALL {
            non_negative(&format!("retraining_cost.{}", transition.label()), self.retraining_cost[transition])?;
        }

        non_negative("retraining_capacity.UnskilledToSemi", self.retraining_capacity.unskilled_to_semi)?;
        unit_range("retraining_capacity.SemiToSkilled", self.retraining_capacity.semi_to_skilled)?;
        non_negative("overmanning_limit", self.overmanning_limit)?;
        non_negative("short_time_limit", self.short_time_limit)?;

        let policy = &self.policy;
        for skill in Skill::ALL {
            unit_range(&format!("policy.existing.{}", skill), policy.existing[skill])?;
            unit_range(&format!("policy.recruits.{}", skill), policy.recruits[skill])?;
        }
        unit_range("policy.retrainees", policy.retrainees)?;
        unit_range("policy.downgrade_arrival", policy.downgrade_arrival)?;
        unit_range("policy.short_time_output", policy.short_time_output)?;

        Ok(())
    }
}

#[cfg(feature = "serde")]
impl Scenario {
    /// Deep-merge partial scenario data onto the defaults and deserialize the result.
    /// Objects merge key by key, so `{"recruitment_capacity": {"Skilled": 650}}` keeps
    /// the other two capacities. Arrays and scalars replace what is there.
    /// Validation is left to the caller.
    pub fn from_overrides(overrides: serde_json::Value) -> Result<Self, serde_json::Error> {
        let mut merged = serde_json::to_value(Self::default())?;
        merge(&mut merged, overrides);
        serde_json::from_value(merged)
    }
}

#[cfg(feature = "serde")]
fn merge(base: &mut serde_json::Value, overlay: serde_json::Value) {
    use serde_json::Value;

    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

fn non_negative(field: &str, value: f64) -> Result<(), ScenarioError> {
    if !value.is_finite() {
        return Err(ScenarioError::NonFinite { field: field.to_string() });
    }
    if value < 0.0 {
        return Err(ScenarioError::Negative {
            field: field.to_string(),
            value,
        });
    }
    Ok(())
}

fn unit_range(field: &str, value: f64) -> Result<(), ScenarioError> {
    if !value.is_finite() {
        return Err(ScenarioError::NonFinite { field: field.to_string() });
    }
    if !(0.0..=1.0).contains(&value) {
        return Err(ScenarioError::OutOfUnitRange {
            field: field.to_string(),
            value,
        });
    }
    Ok(())
}
