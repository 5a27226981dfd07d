use super::engine;
use crate::args::RepairArgs;
use crate::error::CliError;
use crate::output;
use crate::style::Style;
use crate::ui::Ui;
use keel_core::EngineConfig;

pub async fn run(_args: &RepairArgs, config: EngineConfig) -> Result<(), CliError> {
    let report = engine(config)?.repair().await?;

    let ui = Ui::new(Style::detect());
    if report.removed.is_empty() {
        output::line(ui.ok_line("Nothing to repair"));
        return Ok(());
    }

    for version in &report.removed {
        output::line(ui.list_item(version, "removed", None));
    }
    output::line(ui.ok_line(&format!(
        "Removed {} failed record(s); fix the scripts and run migrate",
        report.removed.len()
    )));
    Ok(())
}
