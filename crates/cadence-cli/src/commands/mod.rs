pub mod check;
pub mod export;
pub mod run;
pub mod schema;

use std::path::Path;

use cadence_expr::ExprError;
use cadence_sim::{Scenario, SimError, Simulation};
use tracing::info;

/// Ticks run when neither the command line nor the scenario gives a count.
pub const DEFAULT_STEPS: u64 = 24;

/// Load a scenario and register its types, with an optional seed override.
fn load(path: &Path, seed: Option<u64>) -> Result<(Scenario, Simulation), String> {
    let scenario = Scenario::from_path(path).map_err(describe)?;
    info!(path = %path.display(), name = %scenario.name, "scenario loaded");
    let mut config = scenario.config();
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }
    let sim = scenario.build(config).map_err(describe)?;
    Ok((scenario, sim))
}

/// Load, then run for the requested number of ticks.
fn load_and_run(
    path: &Path,
    steps: Option<u64>,
    seed: Option<u64>,
) -> Result<(Scenario, Simulation), String> {
    let (scenario, mut sim) = load(path, seed)?;
    let steps = steps.or(scenario.steps).unwrap_or(DEFAULT_STEPS);
    sim.run(steps).map_err(describe)?;
    Ok((scenario, sim))
}

/// Message for a simulation error. Expression syntax errors are also
/// rendered with their source to stderr.
fn describe(err: SimError) -> String {
    if let SimError::Resolve { field, .. } = &err
        && let SimError::Expr(expr @ ExprError::Syntax { .. }) = err.root_cause()
    {
        eprint!("{}", expr.render(field));
    }
    err.to_string()
}
