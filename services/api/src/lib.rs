mod cli;
mod infra;
mod routes;
mod seed;
mod server;

use rcd_permits::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
