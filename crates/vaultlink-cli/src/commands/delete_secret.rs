//! Delete-secret command

use std::path::Path;

use anyhow::Result;
use tracing::info;

use super::connect;
use crate::cli::ServiceNameArgs;

pub async fn run(args: ServiceNameArgs, config_path: Option<&Path>) -> Result<()> {
    let coordinator = connect(config_path).await?;

    coordinator.delete_secret(&args.name).await?;
    info!("Secrets deleted successfully for {}", args.name);
    Ok(())
}
