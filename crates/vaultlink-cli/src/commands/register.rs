//! Register command

use std::path::Path;

use anyhow::Result;
use tracing::info;
use vaultlink_core::ServiceRegistration;

use super::{connect, parse_meta, parse_tags, read_secrets};
use crate::cli::RegisterArgs;

pub async fn run(args: RegisterArgs, config_path: Option<&Path>) -> Result<()> {
    // Bad input fails before any backend is contacted
    let bundle = read_secrets(&args.source)?;
    let service_id = args
        .service_id
        .clone()
        .unwrap_or_else(|| format!("{}-{}", args.name, args.port));

    let mut registration = ServiceRegistration::new(&args.name, service_id, &args.address, args.port)
        .with_tags(parse_tags(args.tags.as_deref()));
    registration.meta = parse_meta(args.meta.as_deref())?;

    let coordinator = connect(config_path).await?;
    coordinator.register_with_secret(registration, &bundle).await?;
    info!("Service {} registered successfully", args.name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::SecretsSource;

    fn args(secrets: &str, meta: Option<&str>) -> RegisterArgs {
        RegisterArgs {
            name: "billing".to_string(),
            address: "10.0.0.5".to_string(),
            port: 9090,
            service_id: None,
            source: SecretsSource {
                secrets: Some(secrets.to_string()),
                secrets_file: None,
            },
            tags: None,
            meta: meta.map(String::from),
        }
    }

    #[tokio::test]
    async fn test_bad_input_fails_before_connecting() {
        // The config path does not exist, so reaching `connect` would fail differently
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("missing.yaml");

        let err = run(args("[1, 2]", None), Some(config.as_path())).await.unwrap_err();
        assert!(err.to_string().contains("Invalid secrets"));

        let err = run(args(r#"{"k": "v"}"#, Some("not json")), Some(config.as_path()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid --meta"));

        let err = run(args(r#"{"k": "v"}"#, None), Some(config.as_path())).await.unwrap_err();
        assert!(err.to_string().contains("Failed to load configuration"));
    }
}
