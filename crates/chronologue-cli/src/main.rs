use anyhow::Result;
use clap::Parser;

mod calendar_cmds;
mod cli;
mod config_cmds;
mod export_cmd;
mod project;
mod report;
mod trace_cmds;

use cli::{Cli, Commands, ConfigCommands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing (output to stderr, initialize only once)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init()
        .ok();

    let cli = Cli::parse();
    let output_format = cli.format.clone();
    let cd = cli.cd;

    match cli.command {
        Commands::Validate { file } => {
            let exit_code = trace_cmds::handle_validate(file, cd, output_format)?;
            std::process::exit(exit_code);
        }
        Commands::Export { input, output } => {
            let exit_code = export_cmd::handle_export(input, output, cd, output_format).await?;
            std::process::exit(exit_code);
        }
        Commands::Encode { file, id } => {
            trace_cmds::handle_encode(file, id, cd, output_format)?;
        }
        Commands::Decode { file } => {
            calendar_cmds::handle_decode(file)?;
        }
        Commands::Import {
            input,
            output,
            task_id,
        } => {
            let exit_code =
                calendar_cmds::handle_import(input, output, task_id, cd, output_format)?;
            std::process::exit(exit_code);
        }
        Commands::Preview { file, output } => {
            calendar_cmds::handle_preview(file, output)?;
        }
        Commands::SyncFields { file } => {
            trace_cmds::handle_sync_fields(file, cd)?;
        }
        Commands::Tempo { file } => {
            calendar_cmds::handle_tempo(file, output_format)?;
        }
        Commands::Config { cmd } => match cmd {
            ConfigCommands::Show => {
                config_cmds::handle_config_show(cd, output_format)?;
            }
            ConfigCommands::Validate => {
                config_cmds::handle_config_validate(cd)?;
            }
            ConfigCommands::Init { force } => {
                config_cmds::handle_config_init(cd, force)?;
            }
        },
    }

    Ok(())
}
