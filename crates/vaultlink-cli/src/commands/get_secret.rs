//! Get-secret command

use std::path::Path;

use anyhow::{bail, Result};

use super::connect;
use crate::cli::ServiceNameArgs;

pub async fn run(args: ServiceNameArgs, config_path: Option<&Path>) -> Result<()> {
    let coordinator = connect(config_path).await?;

    match coordinator.get_secret(&args.name).await {
        Some(bundle) => {
            println!("{}", serde_json::to_string_pretty(&bundle)?);
            Ok(())
        }
        None => bail!("No secrets found for service {}", args.name),
    }
}
