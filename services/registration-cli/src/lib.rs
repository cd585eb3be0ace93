mod cli;
mod commands;
mod infra;

use amotekun_registration::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
