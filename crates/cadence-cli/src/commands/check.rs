use std::path::Path;

pub fn run(path: &Path) -> Result<(), String> {
    let (scenario, mut sim) = super::load(path, None)?;
    sim.init().map_err(super::describe)?;

    let state = sim.state();
    let emitters: usize = state.entity_types().iter().map(|t| t.emitters().len()).sum();
    println!("  All checks passed for '{}'.", scenario.name);
    println!(
        "  {} entity types, {} event types, {} emitters, {} seed entities",
        state.entity_types().len(),
        state.event_types().len(),
        emitters,
        state.entity_count()
    );

    Ok(())
}
