// crates/immunoflux/src/commands/gating.rs

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use comfy_table::Table;
use immunoflux_core::gating::Panel;

#[derive(Args, Debug, Default)]
pub struct GatingArgs {
    /// Population definitions, one `<name>: <marker><expression> ...` per line
    #[arg(long)]
    definitions: Option<PathBuf>,
}

pub fn handle_gating_command(args: GatingArgs) -> Result<()> {
    let parsed;
    let panel = match &args.definitions {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read definitions {}", path.display()))?;
            parsed = Panel::parse(&text);
            &parsed
        }
        None => Panel::default_panel(),
    };

    let mut table = Table::new();
    table.set_header(vec!["Marker", "Populations", "Expression groups"]);
    for (marker, count) in panel.population_count_per_marker() {
        let groups = panel
            .expression_groups_for_marker(&marker)
            .into_iter()
            .map(|(expression, names)| format!("{expression}: {}", names.join(", ")))
            .collect::<Vec<_>>()
            .join("; ");
        table.add_row(vec![marker, count.to_string(), groups]);
    }
    println!("{table}");
    Ok(())
}
