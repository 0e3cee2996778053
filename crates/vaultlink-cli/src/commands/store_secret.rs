//! Store-secret command

use std::path::Path;

use anyhow::Result;
use tracing::info;

use super::{connect, read_secrets};
use crate::cli::StoreSecretArgs;

pub async fn run(args: StoreSecretArgs, config_path: Option<&Path>) -> Result<()> {
    let bundle = read_secrets(&args.source)?;
    let coordinator = connect(config_path).await?;

    coordinator.store_secret(&args.name, &bundle).await?;
    info!("Secrets stored successfully for {}", args.name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::SecretsSource;

    #[tokio::test]
    async fn test_bad_secrets_fail_before_connecting() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("missing.yaml");
        let args = StoreSecretArgs {
            name: "billing".to_string(),
            source: SecretsSource {
                secrets: Some("{not json".to_string()),
                secrets_file: None,
            },
        };

        let err = run(args, Some(config.as_path())).await.unwrap_err();
        assert!(err.to_string().contains("Invalid secrets"));
    }
}
