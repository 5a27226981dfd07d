use super::engine;
use crate::args::MigrateArgs;
use crate::error::CliError;
use crate::output;
use crate::style::Style;
use crate::ui::Ui;
use keel_core::EngineConfig;

pub async fn run(args: &MigrateArgs, config: EngineConfig) -> Result<(), CliError> {
    let engine = engine(config)?;
    let outcome = engine.migrate().await?;

    if args.json {
        return output::json(&outcome);
    }

    let ui = Ui::new(Style::detect());
    for line in ui.header("Migrate") {
        output::line(line);
    }

    output::line(ui.kv("schema", engine.history().schema()));
    output::line(ui.kv(
        "starting version",
        outcome.initial_version.as_ref().map_or("<none>", |v| v.as_str()),
    ));
    if let Some(baseline) = &outcome.baselined {
        output::line(ui.info_line(&format!("baselined existing schema at version {baseline}")));
    }

    for applied in &outcome.applied {
        let label = format!("{} {}", applied.version, applied.description);
        let suffix = if applied.transactional {
            format!("{} ms", applied.execution_time_ms)
        } else {
            format!("{} ms (no transaction)", applied.execution_time_ms)
        };
        output::line(ui.list_item(&label, &ui.style().ok(), Some(&suffix)));
    }

    output::line(ui.footer());
    let current = outcome
        .current_version
        .as_ref()
        .map_or_else(|| "<none>".to_string(), ToString::to_string);
    let summary = match outcome.applied.len() {
        0 => format!("Schema is up to date at version {current}"),
        n => format!("Applied {n} migration(s); schema now at version {current} ({} ms)", outcome.elapsed_ms),
    };
    output::line(ui.ok_line(&summary));

    Ok(())
}
