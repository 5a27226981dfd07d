use super::engine;
use crate::args::InfoArgs;
use crate::error::CliError;
use crate::output;
use crate::style::Style;
use crate::ui::Ui;
use keel_core::{EngineConfig, MigrationState};

pub async fn run(args: &InfoArgs, config: EngineConfig) -> Result<(), CliError> {
    let rows = engine(config)?.info().await?;

    if args.json {
        return output::json(&rows);
    }

    let ui = Ui::new(Style::detect());
    for line in ui.header("Info") {
        output::line(line);
    }

    if rows.is_empty() {
        output::line(ui.info_line("no migrations found"));
        return Ok(());
    }

    for line in ui.info_table(&rows) {
        output::line(line);
    }

    let pending = rows
        .iter()
        .filter(|r| r.state == MigrationState::Pending)
        .count();
    output::line(ui.footer());
    output::line(ui.kv("pending", &pending.to_string()));

    Ok(())
}
