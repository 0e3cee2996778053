//! Resolve command

use std::path::Path;

use anyhow::Result;

use super::connect;
use crate::cli::ServiceNameArgs;

pub async fn run(args: ServiceNameArgs, config_path: Option<&Path>) -> Result<()> {
    let coordinator = connect(config_path).await?;
    let resolution = coordinator.resolve_service(&args.name).await?;

    match &resolution.reference {
        Some(reference) => println!(
            "{}: secrets at {}:{}",
            resolution.name, reference.mount_point, reference.vault_path
        ),
        None => println!("{}: no secrets reference", resolution.name),
    }

    if resolution.instances.is_empty() {
        println!("No healthy instances");
        return Ok(());
    }

    println!("Healthy instances:");
    for instance in &resolution.instances {
        let secrets = if instance.has_secrets_in_vault() { "yes" } else { "no" };
        println!(
            "  - {} {}:{} (secrets in Vault: {})",
            instance.id, instance.address, instance.port, secrets
        );
    }
    Ok(())
}
