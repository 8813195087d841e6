use chronologue_core::OutputFormat;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "chronologue")]
#[command(about = "Chronologue: memory traces to calendar events and back")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Project directory used to locate .chronologue/config.toml (defaults to CWD)
    #[arg(long, global = true)]
    pub cd: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate every trace in a source document
    Validate {
        /// Source JSON document
        file: String,
    },

    /// Consolidate trace documents into calendar files
    Export {
        /// Source JSON document, or a directory of them
        input: String,

        /// Output file (for a file input) or directory (for a directory input)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Print the event block for a single trace
    Encode {
        /// Source JSON document
        file: String,

        /// Trace id to encode
        #[arg(long)]
        id: String,
    },

    /// Decode the events of a calendar file
    Decode {
        /// Calendar (.ics) file
        file: String,
    },

    /// Import calendar files as trace documents
    Import {
        /// Calendar (.ics) file, or a directory of them
        input: String,

        /// Output directory for <stem>.json documents
        #[arg(short, long)]
        output: String,

        /// task_id given to imported traces (defaults to source.import_task_id)
        #[arg(long)]
        task_id: Option<String>,
    },

    /// Render the events of a calendar file as a Markdown table
    Preview {
        /// Calendar (.ics) file
        file: String,

        /// Directory for <stem>_preview.md (prints to stdout when omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Print remote-sync field mappings for valid traces
    SyncFields {
        /// Source JSON document
        file: String,
    },

    /// Print tempo tokens for each event of a calendar file
    Tempo {
        /// Calendar (.ics) file
        file: String,
    },

    /// Show/manage configuration
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Validate the effective configuration
    Validate,
    /// Write a commented template to .chronologue/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "chronologue",
            "export",
            "traces.json",
            "--format",
            "json",
            "--cd",
            "/tmp",
        ])
        .unwrap();
        assert!(matches!(cli.format, OutputFormat::Json));
        assert_eq!(cli.cd.as_deref(), Some("/tmp"));
        assert!(matches!(
            cli.command,
            Commands::Export { ref input, output: None } if input == "traces.json"
        ));
    }

    #[test]
    fn test_preview_output_is_optional() {
        let cli = Cli::try_parse_from(["chronologue", "preview", "cal.ics"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Preview { ref file, output: None } if file == "cal.ics"
        ));
        let cli = Cli::try_parse_from(["chronologue", "preview", "cal.ics", "-o", "md"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Preview { output: Some(ref dir), .. } if dir == "md"
        ));
    }

    #[test]
    fn test_import_requires_output() {
        assert!(Cli::try_parse_from(["chronologue", "import", "cal.ics"]).is_err());
    }
}
