use clap::builder::BoolishValueParser;
use clap::{Args, Parser, Subcommand};
use keel_migration::Version;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "keel", version, about = "Versioned schema migrations for PostgreSQL")]
pub struct Cli {
    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apply every pending migration
    Migrate(MigrateArgs),
    /// Compare applied migrations with the scripts on disk
    Validate(ValidateArgs),
    /// Mark an existing schema as migrated up to a version
    Baseline(BaselineArgs),
    /// Show the state of every migration
    Info(InfoArgs),
    /// Remove failed attempts from the history table
    Repair(RepairArgs),
    /// Drop and recreate the configured schemas
    Clean(CleanArgs),
}

/// Connection and engine options, shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    #[arg(long, env = "DATABASE_URL", global = true)]
    pub url: Option<String>,

    #[arg(long, env = "DATABASE_USERNAME", global = true)]
    pub user: Option<String>,

    #[arg(long, env = "DATABASE_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// First schema holds the history table
    #[arg(long, env = "KEEL_SCHEMAS", global = true, value_delimiter = ',')]
    pub schemas: Vec<String>,

    #[arg(long, env = "KEEL_LOCATIONS", global = true, value_delimiter = ',')]
    pub locations: Vec<PathBuf>,

    #[arg(long, env = "KEEL_TABLE", global = true)]
    pub table: Option<String>,

    #[arg(long, env = "KEEL_LOCK_TIMEOUT_SECS", global = true)]
    pub lock_timeout_secs: Option<u64>,

    #[arg(long, env = "KEEL_INSTALLED_BY", global = true)]
    pub installed_by: Option<String>,

    #[arg(
        long,
        env = "KEEL_OUT_OF_ORDER",
        global = true,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub out_of_order: Option<bool>,

    #[arg(
        long,
        env = "KEEL_VALIDATE_ON_MIGRATE",
        global = true,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub validate_on_migrate: Option<bool>,

    #[arg(
        long,
        env = "KEEL_CLEAN_DISABLED",
        global = true,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub clean_disabled: Option<bool>,

    #[arg(
        long,
        env = "KEEL_BASELINE_ON_MIGRATE",
        global = true,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub baseline_on_migrate: Option<bool>,

    #[arg(long, env = "KEEL_BASELINE_VERSION", global = true)]
    pub baseline_version: Option<Version>,
}

#[derive(Args, Debug, Clone)]
pub struct MigrateArgs {
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    /// Report mismatches as warnings instead of failing
    #[arg(long)]
    pub permissive: bool,

    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct BaselineArgs {
    #[arg(long)]
    pub version: Option<Version>,

    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct InfoArgs {
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct RepairArgs {}

#[derive(Args, Debug, Clone)]
pub struct CleanArgs {}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::{CommandFactory, Parser};

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_global_flags_after_the_subcommand() {
        let cli = Cli::try_parse_from([
            "keel",
            "validate",
            "--permissive",
            "--schemas",
            "billing,public",
            "--out-of-order",
            "--clean-disabled=false",
        ])
        .unwrap();

        assert_eq!(cli.config.schemas, vec!["billing", "public"]);
        assert_eq!(cli.config.out_of_order, Some(true));
        assert_eq!(cli.config.clean_disabled, Some(false));
        assert!(matches!(cli.command, Command::Validate(ref a) if a.permissive && !a.json));
    }

    #[test]
    fn parses_baseline_version() {
        let cli = Cli::try_parse_from(["keel", "baseline", "--version", "1.5"]).unwrap();
        match cli.command {
            Command::Baseline(args) => assert_eq!(args.version.unwrap().as_str(), "1.5"),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn rejects_malformed_versions() {
        assert!(Cli::try_parse_from(["keel", "baseline", "--version", "1.x"]).is_err());
    }
}
