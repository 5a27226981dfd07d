use super::engine;
use crate::args::CleanArgs;
use crate::error::CliError;
use crate::output;
use crate::style::Style;
use crate::ui::Ui;
use keel_core::EngineConfig;

pub async fn run(_args: &CleanArgs, config: EngineConfig) -> Result<(), CliError> {
    let cleaned = engine(config)?.clean().await?;

    let ui = Ui::new(Style::detect());
    for schema in &cleaned {
        output::line(ui.list_item(schema, &ui.style().ok(), Some("dropped and recreated")));
    }
    Ok(())
}
