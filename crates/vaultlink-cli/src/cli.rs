//! CLI argument parsing with clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Vaultlink - service secrets in Vault, references in Consul
#[derive(Parser, Debug)]
#[command(name = "vaultlink")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only report errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to config.yaml (default: ./config.yaml, then the user config dir)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Register a service with secrets
    Register(RegisterArgs),

    /// Print the secrets of a service as JSON
    GetSecret(ServiceNameArgs),

    /// Store secrets for a service
    StoreSecret(StoreSecretArgs),

    /// Delete the secrets of a service
    DeleteSecret(ServiceNameArgs),

    /// List services with secrets in Vault
    List,

    /// Deregister a service instance
    Deregister(DeregisterArgs),

    /// Show healthy instances of a service and where its secrets live
    Resolve(ServiceNameArgs),
}

/// Where a secret bundle comes from
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct SecretsSource {
    /// Secrets as a JSON object
    #[arg(long)]
    pub secrets: Option<String>,

    /// Path to a JSON file holding the secrets object
    #[arg(long)]
    pub secrets_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// Service name
    pub name: String,

    /// Service address
    pub address: String,

    /// Service port
    pub port: u16,

    /// Service ID (default: <name>-<port>)
    #[arg(long)]
    pub service_id: Option<String>,

    #[command(flatten)]
    pub source: SecretsSource,

    /// Comma-separated tags
    #[arg(long)]
    pub tags: Option<String>,

    /// Metadata as a JSON object of strings
    #[arg(long)]
    pub meta: Option<String>,
}

#[derive(Args, Debug)]
pub struct StoreSecretArgs {
    /// Service name
    pub name: String,

    #[command(flatten)]
    pub source: SecretsSource,
}

#[derive(Args, Debug)]
pub struct ServiceNameArgs {
    /// Service name
    pub name: String,
}

#[derive(Args, Debug)]
pub struct DeregisterArgs {
    /// Service ID
    pub service_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_register() {
        let cli = Cli::try_parse_from([
            "vaultlink", "-c", "/etc/vaultlink.yaml", "register", "billing", "10.0.0.5", "9090",
            "--secrets", r#"{"api_key":"x"}"#, "--tags", "v1,prod",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("/etc/vaultlink.yaml")));
        match cli.command {
            Commands::Register(args) => {
                assert_eq!(args.name, "billing");
                assert_eq!(args.port, 9090);
                assert_eq!(args.source.secrets.as_deref(), Some(r#"{"api_key":"x"}"#));
                assert_eq!(args.tags.as_deref(), Some("v1,prod"));
                assert!(args.service_id.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_secrets_sources_are_exclusive() {
        assert!(Cli::try_parse_from([
            "vaultlink", "store-secret", "billing", "--secrets", "{}", "--secrets-file", "s.json",
        ])
        .is_err());
        assert!(Cli::try_parse_from(["vaultlink", "store-secret", "billing"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["vaultlink", "list", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::List));
    }
}
