use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::catalog::fish::{FilterValue, ViewMode};

/// Heartopia guide: browse the game catalog and edit its JSON content files.
#[derive(Debug, Parser)]
#[command(name = "heartopia", version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Config file to use instead of ~/.heartopia/config.json
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Base URL or directory holding the category files
    #[arg(long = "data", global = true, value_name = "URL_OR_DIR")]
    pub data_source: Option<String>,

    /// Content host API root
    #[arg(long, global = true, value_name = "URL")]
    pub api_base: Option<String>,

    /// Durable storage file
    #[arg(long, global = true, value_name = "FILE")]
    pub storage: Option<String>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show a category, or the last one viewed
    Browse(BrowseArgs),

    /// Toggle one star tier of a fish on the checklist
    Check {
        name: String,
        #[arg(value_parser = clap::value_parser!(u8).range(1..=5))]
        tier: u8,
    },

    /// Show checklist progress
    Checklist,

    /// Edit content files in the hosted repository
    #[command(subcommand)]
    Admin(AdminCommand),

    /// Reshape pasted or legacy data into category JSON
    #[command(subcommand)]
    Convert(ConvertCommand),

    /// Read or change ~/.heartopia/config.json
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Args)]
pub struct BrowseArgs {
    /// Category key (recetas, insectos, peces, cultivos, flores) or `home`
    pub category: Option<String>,

    #[arg(long, value_name = "VALUE")]
    pub location: Option<FilterValue>,

    #[arg(long, value_name = "VALUE")]
    pub weather: Option<FilterValue>,

    #[arg(long, value_name = "VALUE")]
    pub time: Option<FilterValue>,

    /// `table` or `cards`
    #[arg(long)]
    pub view: Option<ViewMode>,

    #[arg(long, default_value_t = 1)]
    pub page: usize,
}

#[derive(Debug, Args)]
pub struct EditArgs {
    /// Path of the JSON file inside the repository, e.g. data/fish.json
    pub path: String,

    /// Write the edited file back to the repository
    #[arg(long)]
    pub publish: bool,
}

#[derive(Debug, Subcommand)]
pub enum AdminCommand {
    /// Verify and remember repository credentials
    Login {
        #[arg(long, env = "HEARTOPIA_TOKEN", hide_env_values = true)]
        token: String,
        #[arg(long)]
        owner: String,
        #[arg(long)]
        repo: String,
        #[arg(long)]
        branch: Option<String>,
    },

    /// Forget the saved credentials
    Logout,

    /// Show the saved credentials (token redacted)
    Status,

    /// Show one page of a file as a table
    Show {
        path: String,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },

    /// Add an item built from FIELD=VALUE pairs
    Add {
        #[command(flatten)]
        target: EditArgs,
        #[arg(value_name = "FIELD=VALUE")]
        fields: Vec<String>,
    },

    /// Change fields of an existing item
    Edit {
        #[command(flatten)]
        target: EditArgs,
        /// Position in the file, or the row on `--page` when given
        index: usize,
        #[arg(long)]
        page: Option<usize>,
        #[arg(value_name = "FIELD=VALUE")]
        fields: Vec<String>,
    },

    /// Remove an item
    Delete {
        #[command(flatten)]
        target: EditArgs,
        index: usize,
        #[arg(long)]
        page: Option<usize>,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConvertCommand {
    /// Tab-separated rows with a header line
    Sheet {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Source text containing `NAME = [ ... ];`
    Literal {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Add an empty Imagen field to every item lacking one, in place
    AddImage { file: PathBuf },
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    Show,
    /// Keys: dataSource, apiBase, defaultBranch, storagePath
    Set { key: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_browse_filters_parse() {
        let cli = Cli::parse_from([
            "heartopia", "--json", "browse", "peces", "--location", "Río", "--time", "all",
            "--view", "cards",
        ]);
        assert!(cli.global.json);
        let Command::Browse(args) = cli.command else {
            panic!("expected browse");
        };
        assert_eq!(args.location, Some(FilterValue::Only("Río".into())));
        assert_eq!(args.time, Some(FilterValue::All));
        assert_eq!(args.view, Some(ViewMode::Cards));
        assert_eq!(args.page, 1);
    }

    #[test]
    fn test_tier_range_checked() {
        assert!(Cli::try_parse_from(["heartopia", "check", "Trucha", "6"]).is_err());
        assert!(Cli::try_parse_from(["heartopia", "check", "Trucha", "5"]).is_ok());
    }

    #[test]
    fn test_edit_args() {
        let cli = Cli::parse_from([
            "heartopia", "admin", "edit", "data/fish.json", "3", "--page", "2", "Name=Trucha",
            "--publish",
        ]);
        let Command::Admin(AdminCommand::Edit { target, index, page, fields }) = cli.command else {
            panic!("expected admin edit");
        };
        assert_eq!(target.path, "data/fish.json");
        assert!(target.publish);
        assert_eq!((index, page), (3, Some(2)));
        assert_eq!(fields, ["Name=Trucha"]);
    }
}
