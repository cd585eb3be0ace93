use crate::commands::{
    run_apply, run_lgas, run_status, run_validate, ApplyArgs, StatusArgs, ValidateArgs,
};
use amotekun_registration::error::AppError;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "amotekun-registration",
    about = "Fill, check and submit Amotekun Corps registration forms from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show whether the portal is open and how long remains (default command)
    Status(StatusArgs),
    /// List the local government areas accepted on the form
    Lgas,
    /// Check a draft file against the form rules without submitting it
    Validate(ValidateArgs),
    /// Review a draft file, submit it, and save the registration slip
    Apply(ApplyArgs),
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Status(StatusArgs::default()));

    match command {
        Command::Status(args) => run_status(args),
        Command::Lgas => {
            run_lgas();
            Ok(())
        }
        Command::Validate(args) => run_validate(args).await,
        Command::Apply(args) => run_apply(args).await,
    }
}
