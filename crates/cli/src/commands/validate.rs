use super::engine;
use crate::args::ValidateArgs;
use crate::error::CliError;
use crate::output;
use crate::style::Style;
use crate::ui::Ui;
use keel_core::EngineConfig;
use keel_migration::Policy;

pub async fn run(args: &ValidateArgs, config: EngineConfig) -> Result<(), CliError> {
    let policy = if args.permissive {
        Policy::Permissive
    } else {
        Policy::Strict
    };

    let report = engine(config)?.validate(policy).await?;

    if args.json {
        output::json(&report)?;
    } else {
        let ui = Ui::new(Style::detect());
        for line in ui.header("Validate") {
            output::line(line);
        }
        output::line(ui.kv("policy", if args.permissive { "permissive" } else { "strict" }));
        output::line(ui.kv("pending", &report.pending.to_string()));

        for mismatch in &report.errors {
            output::line(ui.fail_line(&mismatch.to_string()));
        }
        for mismatch in &report.warnings {
            output::line(format!("  {}", ui.style().warn_text(&mismatch.to_string())));
        }

        output::line(ui.footer());
        if report.passed() {
            output::line(ui.ok_line("Validation passed"));
        }
    }

    if report.passed() {
        return Ok(());
    }

    Err(CliError::user_error("Validation failed")
        .with_reason(format!("{} mismatch(es) between history and scripts", report.errors.len()))
        .with_meaning("Applied migrations no longer match the scripts on disk.")
        .with_action("Restore the applied scripts, or rerun with --permissive to report only."))
}
