use super::engine;
use crate::args::BaselineArgs;
use crate::error::CliError;
use crate::output;
use crate::style::Style;
use crate::ui::Ui;
use keel_core::EngineConfig;

pub async fn run(args: &BaselineArgs, config: EngineConfig) -> Result<(), CliError> {
    let outcome = engine(config)?
        .baseline(args.version.clone(), args.description.clone())
        .await?;

    let ui = Ui::new(Style::detect());
    output::line(ui.ok_line(&format!(
        "Baselined at version {} ({})",
        outcome.version, outcome.description
    )));
    Ok(())
}
