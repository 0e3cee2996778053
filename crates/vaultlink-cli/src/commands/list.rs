//! List command

use std::path::Path;

use anyhow::Result;

use super::connect;

pub async fn run(config_path: Option<&Path>) -> Result<()> {
    let coordinator = connect(config_path).await?;

    let services = coordinator.list_services_with_secrets().await;
    if services.is_empty() {
        println!("No services found with secrets in Vault");
        return Ok(());
    }

    println!("Services with secrets in Vault:");
    for service in &services {
        println!("  - {}", service);
    }
    Ok(())
}
