//! Deregister command

use std::path::Path;

use anyhow::Result;
use tracing::info;

use super::connect;
use crate::cli::DeregisterArgs;

pub async fn run(args: DeregisterArgs, config_path: Option<&Path>) -> Result<()> {
    let coordinator = connect(config_path).await?;

    coordinator.deregister_service(&args.service_id).await?;
    info!("Service {} deregistered successfully", args.service_id);
    Ok(())
}
