use std::path::Path;

use cadence_export::Format;
use tracing::info;

pub fn run(
    path: &Path,
    format: &str,
    output: Option<&Path>,
    steps: Option<u64>,
    seed: Option<u64>,
) -> Result<(), String> {
    let format = format.parse::<Format>().map_err(|e| e.to_string())?;
    let (scenario, sim) = super::load_and_run(path, steps, seed)?;
    let content =
        cadence_export::export(&scenario.name, sim.state(), format).map_err(|e| e.to_string())?;

    if let Some(path) = output {
        std::fs::write(path, &content)
            .map_err(|e| format!("cannot write to {}: {e}", path.display()))?;
        info!(path = %path.display(), %format, bytes = content.len(), "export written");
        println!("  Exported to {}", path.display());
    } else {
        print!("{content}");
        if format == Format::Json {
            println!();
        }
    }

    Ok(())
}
