mod cli;
mod commands;
mod render;

use comp_engine::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
