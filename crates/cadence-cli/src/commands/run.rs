use std::path::Path;

use colored::Colorize;
use comfy_table::{Cell, ContentArrangement, Table};

use cadence_export::Report;
use cadence_sim::{Event, SimState};

pub fn run(path: &Path, steps: Option<u64>, seed: Option<u64>, verbose: bool) -> Result<(), String> {
    let (scenario, sim) = super::load_and_run(path, steps, seed)?;
    let report = Report::new(scenario.name.as_str(), sim.state());
    let config = sim.config();

    println!(
        "  {} '{}' {}",
        "Scenario".bold(),
        report.name,
        format!(
            "({} steps, seed={}, interval={})",
            report.steps, config.seed, config.tick_interval
        )
        .dimmed()
    );
    println!(
        "  {} entities, {} events, clock at {}",
        report.entity_total(),
        report.event_total(),
        report.timestamp
    );
    println!();

    if verbose {
        println!("  {}", "Event Log".bold().underline());
        println!();
        print_events(sim.state());
        println!();
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Kind".bold()),
        Cell::new("Type".bold()),
        Cell::new("Count".bold()),
    ]);
    for count in &report.entities {
        table.add_row(vec!["entity".to_string(), count.name.clone(), count.count.to_string()]);
    }
    for count in &report.events {
        table.add_row(vec!["event".to_string(), count.name.clone(), count.count.to_string()]);
    }
    println!("{table}");
    println!();

    Ok(())
}

/// Every event across types, by timestamp.
fn print_events(state: &SimState) {
    let mut events: Vec<&Event> = state
        .event_groups()
        .flat_map(|(_, list)| list.iter())
        .collect();
    if events.is_empty() {
        println!("  {}", "(no events)".dimmed());
        return;
    }
    events.sort_by_key(|e| e.timestamp);

    for event in events {
        let fields: Vec<String> = event
            .fields
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        println!(
            "  {} {} {} {}",
            format!("[t={:>8}]", event.timestamp).dimmed(),
            event.id.to_string().cyan(),
            format!("from {}", event.parent).dimmed(),
            fields.join(" ")
        );
    }
}
