//! `termpilot tools`: list built-in tools.

pub fn run() -> anyhow::Result<()> {
    let registry = termpilot_tools::default_registry();

    println!("Built-in tools ({}):", registry.len());
    println!();
    for definition in registry.definitions() {
        println!("  {}", definition.name);
        println!("      {}", definition.description);
    }

    Ok(())
}
