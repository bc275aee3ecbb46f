use std::path::Path;

pub fn run(path: &Path) -> Result<(), String> {
    let (_, sim) = super::load(path, None)?;
    let ddl = cadence_export::ddl(sim.state()).map_err(|e| e.to_string())?;
    println!("{ddl}");
    Ok(())
}
