mod config;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use manpower_model::{Family, ObjectiveKind, Plan, Report, Scenario, Skill, Subject};
use tracing_subscriber::EnvFilter;

use crate::config::ConfigError;

#[derive(Parser)]
#[command(name = "manpower")]
#[command(about = "Multi-period manpower planning with linear programming", long_about = None)]
struct Cli {
    /// Log model and solver details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build and solve a scenario and print the plan
    Solve {
        /// JSON file with overrides for the built-in scenario
        #[arg(short, long)]
        scenario: Option<PathBuf>,
        /// Objective to minimize (defaults to the scenario's)
        #[arg(short, long)]
        objective: Option<ObjectiveArg>,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = SolveFormat::Table)]
        format: SolveFormat,
    },
    /// Print the linear program built for a scenario
    Model {
        /// JSON file with overrides for the built-in scenario
        #[arg(short, long)]
        scenario: Option<PathBuf>,
        /// Objective to minimize (defaults to the scenario's)
        #[arg(short, long)]
        objective: Option<ObjectiveArg>,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = ModelFormat::Lp)]
        format: ModelFormat,
    },
    /// Check a scenario file for errors
    Check {
        /// The file to check
        file: PathBuf,
    },
    /// Print the built-in scenario as JSON
    Defaults,
}

#[derive(Clone, Copy, ValueEnum)]
enum ObjectiveArg {
    Redundancy,
    Cost,
}

impl From<ObjectiveArg> for ObjectiveKind {
    fn from(arg: ObjectiveArg) -> Self {
        match arg {
            ObjectiveArg::Redundancy => ObjectiveKind::MinimizeRedundancy,
            ObjectiveArg::Cost => ObjectiveKind::MinimizeCost,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SolveFormat {
    Table,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModelFormat {
    Lp,
    Json,
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load(path: Option<&Path>, objective: Option<ObjectiveArg>) -> Scenario {
    let scenario = match config::load_scenario(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading scenario: {}", e);
            std::process::exit(1);
        }
    };
    match objective {
        Some(objective) => scenario.with_objective(objective.into()),
        None => scenario,
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Solve { scenario, objective, format } => {
            let scenario = load(scenario.as_deref(), objective);
            let outcome = manpower_model::optimize(&scenario);

            match format {
                SolveFormat::Json => {
                    let report = Report::from_outcome(&outcome, &scenario);
                    match serde_json::to_string_pretty(&report) {
                        Ok(json) => println!("{}", json),
                        Err(e) => {
                            eprintln!("Error serializing report: {}", e);
                            std::process::exit(1);
                        }
                    }
                    if !report.is_optimal() {
                        std::process::exit(1);
                    }
                }
                SolveFormat::Table => match outcome {
                    Ok(plan) => print_plan(&plan, &scenario),
                    Err(e) => {
                        println!("Status: NO PLAN");
                        eprintln!("{}", e);
                        std::process::exit(1);
                    }
                },
            }
        }
        Commands::Model { scenario, objective, format } => {
            let scenario = load(scenario.as_deref(), objective);
            let model = match manpower_model::build(&scenario) {
                Ok(m) => m,
                Err(e) => {
                    eprintln!("{}", e);
                    std::process::exit(1);
                }
            };

            match format {
                ModelFormat::Lp => print!("{}", model.problem()),
                ModelFormat::Json => match serde_json::to_string_pretty(model.problem()) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        eprintln!("Error serializing model: {}", e);
                        std::process::exit(1);
                    }
                },
            }
        }
        Commands::Check { file } => {
            let checked = config::load_scenario(Some(file.as_path())).and_then(|scenario| {
                scenario.validate().map_err(ConfigError::from)?;
                Ok(scenario)
            });

            let scenario = match checked {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("✗ {} has errors:", file.display());
                    eprintln!("  {}", e);
                    std::process::exit(1);
                }
            };

            match manpower_model::build(&scenario) {
                Ok(model) => {
                    println!("✓ {} is valid", file.display());
                    println!("  {} planning years", model.horizon());
                    println!("  {} variables", model.problem().num_variables());
                    println!("  {} constraints", model.problem().num_constraints());
                    println!("  objective: {:?}", model.objective());
                }
                Err(e) => {
                    eprintln!("✗ {} has errors:", file.display());
                    eprintln!("  {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Defaults => match serde_json::to_string_pretty(&Scenario::default()) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing scenario: {}", e);
                std::process::exit(1);
            }
        },
    }
}

fn display_label(subject: Subject) -> &'static str {
    match subject {
        Subject::Skill(Skill::SemiSkilled) => "Semi-Skilled",
        Subject::Skill(skill) => skill.label(),
        Subject::Retraining(t) => match t {
            manpower_model::Retraining::UnskilledToSemi => "Unskilled → Semi",
            manpower_model::Retraining::SemiToSkilled => "Semi → Skilled",
        },
        Subject::Downgrade(d) => match d {
            manpower_model::Downgrade::SkilledToSemi => "Skilled → Semi",
            manpower_model::Downgrade::SkilledToUnskilled => "Skilled → Unskilled",
            manpower_model::Downgrade::SemiToUnskilled => "Semi → Unskilled",
        },
    }
}

/// One table: a row per year, a column per skill or transition
fn print_table(plan: &Plan, title: &str, families: &[Family], first_year: u32, last_year: u32) {
    let columns: Vec<(Family, Subject)> = families
        .iter()
        .flat_map(|&family| family.subjects().into_iter().map(move |s| (family, s)))
        .collect();

    println!("{}", title);
    print!("  {:8}", "");
    for (_, subject) in &columns {
        print!(" {:>20}", display_label(*subject));
    }
    println!();

    for year in first_year..=last_year {
        let label = if year == 0 { "Current".to_string() } else { format!("Year {}", year) };
        print!("  {:8}", label);
        for &(family, subject) in &columns {
            match plan.value(family, subject, year) {
                Some(v) => print!(" {:>20.2}", v),
                None => print!(" {:>20}", "-"),
            }
        }
        println!();
    }
    println!();
}

fn print_plan(plan: &Plan, scenario: &Scenario) {
    let horizon = scenario.horizon();

    println!("Status: OPTIMAL");
    match plan.objective {
        ObjectiveKind::MinimizeRedundancy => println!("Total redundant workers: {:.2}", plan.objective_value),
        ObjectiveKind::MinimizeCost => println!("Total cost: £{:.2}", plan.objective_value),
    }

    let costs = plan.cost_breakdown(scenario);
    println!(
        "  retraining £{:.2}, redundancy £{:.2}, short-time £{:.2}, overmanning £{:.2}",
        costs.retraining, costs.redundancy, costs.short_time, costs.overmanning
    );
    println!();

    print_table(plan, "Available Workforce", &[Family::TotalWorkers], 0, horizon);
    print_table(plan, "Recruitment Plan", &[Family::RecruitedWorkers], 1, horizon);
    print_table(
        plan,
        "Training & Downgrading Plan",
        &[Family::RetrainedWorkers, Family::DowngradedWorkers],
        1,
        horizon,
    );
    print_table(plan, "Redundancy Plan", &[Family::RedundantWorkers], 1, horizon);
    print_table(plan, "Short-Time Working Plan", &[Family::ShortTimeWorkers], 1, horizon);
    print_table(plan, "Overmanning Plan", &[Family::OvermannedWorkers], 1, horizon);

    if !plan.binding_constraints.is_empty() {
        println!("Binding constraints:");
        for name in &plan.binding_constraints {
            println!("  - {}", name);
        }
    }
}
