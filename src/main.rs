use chronicler::{
    ChroniclerError,
    cli::{Args, Command},
    command,
};
use clap::Parser;

fn initialize_logger(debug: bool) -> Result<(), ChroniclerError> {
    let filter = if debug {
        simplelog::LevelFilter::Debug
    } else {
        simplelog::LevelFilter::Info
    };

    let config = simplelog::ConfigBuilder::new()
        .add_filter_allow_str("chronicler")
        .build();

    simplelog::TermLogger::init(
        filter,
        config,
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    Ok(())
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli_args = Args::parse();

    initialize_logger(cli_args.debug)?;

    match &cli_args.command {
        Command::Release {
            bump,
            no_version_files,
            ..
        } => command::release::execute(&cli_args, *bump, *no_version_files).await?,
        Command::Changelog {
            version,
            write,
            no_merge,
            ..
        } => {
            command::changelog::execute(
                &cli_args,
                version.as_deref(),
                *write,
                *no_merge,
            )
            .await?
        }
        Command::Contributors { version, .. } => {
            command::contributors::execute(&cli_args, version.as_deref()).await?
        }
        Command::Backfill {
            start_version,
            skip_first,
            clear,
            ..
        } => {
            command::backfill::execute(
                &cli_args,
                start_version.as_deref(),
                *skip_first,
                *clear,
            )
            .await?
        }
        Command::Sync {
            version, dry_run, ..
        } => {
            command::sync::execute(&cli_args, version.as_deref(), *dry_run).await?
        }
    }

    Ok(())
}
