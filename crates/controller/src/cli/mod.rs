//! # SMVCTL CLI
//!
//! Command-line interface for managing AWS Secrets Manager secret versions
//! and their staging labels.
//!
//! ## Usage
//!
//! ```bash
//! # Create a version and make it current
//! smvctl create --secret-id my-secret --secret-string hunter2 --stage AWSCURRENT
//!
//! # Create from a YAML or JSON manifest
//! smvctl create -f version.yaml
//!
//! # Reconcile the labels of an existing version
//! smvctl stages 'my-secret|EXAMPLE1-90ab-cdef-fedc-ba987EXAMPLE' --stage AWSCURRENT --stage STAGING
//!
//! # Show which version holds AWSCURRENT
//! smvctl current my-secret
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use secret_version_controller::config;
use secret_version_controller::observability::logging::{init_tracing, DEFAULT_LOG_FILTER};
use secret_version_controller::observability::metrics;
use secret_version_controller::provider::aws::AwsSecretVersionStore;
use secret_version_controller::provider::SecretVersionStore;
use secret_version_controller::tags::{self, KeyValueTags};
use secret_version_controller::{
    ResourceId, SecretVersionInput, SecretVersionManager, SecretVersionState,
};
use serde_json::json;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Secret version controller CLI
#[derive(Parser)]
#[command(name = "smvctl")]
#[command(about = "Manage AWS Secrets Manager secret versions and staging labels", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// AWS region (overrides AWS_REGION)
    #[arg(long, global = true)]
    region: Option<String>,

    /// Secrets Manager endpoint override, e.g. LocalStack
    #[arg(long, global = true)]
    endpoint_url: Option<String>,

    /// Print Prometheus metrics to stderr after the command
    #[arg(long, global = true)]
    metrics: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a new secret version and read it back
    Create {
        /// Manifest with secretId, secretString or secretBinary, versionStages
        #[arg(short = 'f', long, conflicts_with_all = ["secret_id", "secret_string", "secret_binary", "stages"])]
        file: Option<PathBuf>,

        /// Secret name or ARN
        #[arg(long)]
        secret_id: Option<String>,

        #[arg(long)]
        secret_string: Option<String>,

        /// Base64-encoded binary value
        #[arg(long)]
        secret_binary: Option<String>,

        /// Staging label for the new version (repeatable)
        #[arg(long = "stage")]
        stages: Vec<String>,

        /// Include the secret value in the output
        #[arg(long)]
        show_value: bool,
    },
    /// Read a version by `<secret_id>|<version_id>`
    Read {
        id: String,

        /// Include the secret value in the output
        #[arg(long)]
        show_value: bool,
    },
    /// Reconcile the staging labels of a version to exactly the given set
    Stages {
        id: String,

        /// Desired staging label (repeatable; none detaches all removable labels)
        #[arg(long = "stage")]
        stages: Vec<String>,
    },
    /// Detach all removable staging labels from a version
    Delete { id: String },
    /// Show the version holding AWSCURRENT
    Current { secret_id: String },
    /// Replace the tags on a secret
    Tags {
        secret_id: String,

        /// Desired tag as key=value (repeatable)
        #[arg(long = "tag", value_parser = parse_tag)]
        tags: Vec<(String, String)>,
    },
}

fn parse_tag(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{raw}'")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing(DEFAULT_LOG_FILTER);
    metrics::register_metrics().context("Failed to register metrics")?;

    let cli = Cli::parse();

    let mut config = config::load_config();
    if let Some(region) = cli.region {
        config.region = region;
    }
    if let Some(endpoint_url) = cli.endpoint_url {
        config.endpoint_url = Some(endpoint_url);
    }

    let store = Arc::new(
        AwsSecretVersionStore::new(&config)
            .await
            .context("Failed to create Secrets Manager client")?,
    );
    let versions: Arc<dyn SecretVersionStore> = Arc::<AwsSecretVersionStore>::clone(&store);
    let manager = SecretVersionManager::new(versions, config.read_retry_policy());

    let result = match cli.command {
        Commands::Create {
            file,
            secret_id,
            secret_string,
            secret_binary,
            stages,
            show_value,
        } => {
            let input = match file {
                Some(path) => load_input(&path)?,
                None => SecretVersionInput {
                    secret_id: secret_id.context("--secret-id or -f is required")?,
                    secret_string,
                    secret_binary,
                    version_stages: (!stages.is_empty()).then_some(stages),
                },
            };
            create_command(&manager, &input, show_value).await
        }
        Commands::Read { id, show_value } => read_command(&manager, &id, show_value).await,
        Commands::Stages { id, stages } => stages_command(&manager, &id, stages).await,
        Commands::Delete { id } => delete_command(&manager, &id).await,
        Commands::Current { secret_id } => current_command(&manager, &secret_id).await,
        Commands::Tags { secret_id, tags } => {
            tags_command(store.as_ref(), &secret_id, tags.into_iter().collect()).await
        }
    };

    if cli.metrics {
        eprintln!("{}", metrics::gather_text()?);
    }
    result
}

fn load_input(path: &Path) -> Result<SecretVersionInput> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    // YAML is a superset of JSON
    serde_yaml::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}

fn render_state(state: &SecretVersionState, show_value: bool) -> Result<serde_json::Value> {
    let mut value = serde_json::to_value(state)?;
    if show_value {
        if let Some(object) = value.as_object_mut() {
            object.insert("secretString".to_string(), json!(state.secret_string()));
            object.insert("secretBinary".to_string(), json!(state.secret_binary()));
        }
    }
    Ok(value)
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn create_command(
    manager: &SecretVersionManager,
    input: &SecretVersionInput,
    show_value: bool,
) -> Result<()> {
    let state = manager.create(input).await?;
    info!("Created {}", state.id);
    print_json(&render_state(&state, show_value)?)
}

async fn read_command(manager: &SecretVersionManager, id: &str, show_value: bool) -> Result<()> {
    let id: ResourceId = id.parse()?;
    match manager.read(&id).await? {
        Some(state) => print_json(&render_state(&state, show_value)?),
        None => bail!("Secret version {id} not found"),
    }
}

async fn stages_command(
    manager: &SecretVersionManager,
    id: &str,
    stages: Vec<String>,
) -> Result<()> {
    let id: ResourceId = id.parse()?;
    let desired: BTreeSet<String> = stages.into_iter().collect();
    match manager.update_stages(&id, &desired).await? {
        Some(state) => print_json(&render_state(&state, false)?),
        None => bail!("Secret version {id} not found"),
    }
}

async fn delete_command(manager: &SecretVersionManager, id: &str) -> Result<()> {
    let id: ResourceId = id.parse()?;
    let outcome = manager.delete(&id).await?;
    print_json(&json!({
        "id": id.to_string(),
        "detached": outcome.detached,
        "retained": outcome.retained,
        "alreadyGone": outcome.already_gone,
    }))
}

async fn current_command(manager: &SecretVersionManager, secret_id: &str) -> Result<()> {
    let holder = manager.find_current(secret_id).await?;
    print_json(&json!({
        "secretId": secret_id,
        "currentVersionId": holder,
    }))
}

async fn tags_command(
    store: &AwsSecretVersionStore,
    secret_id: &str,
    desired: KeyValueTags,
) -> Result<()> {
    let current = tags::list_tags(store, secret_id).await?;
    tags::update_tags(store, secret_id, &current, &desired).await?;
    let after = tags::list_tags(store, secret_id).await?;
    print_json(&json!({
        "secretId": secret_id,
        "tags": after,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_manifest(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("smvctl-{}-{name}", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_parse_tag() {
        assert_eq!(
            parse_tag("team=payments").unwrap(),
            ("team".to_string(), "payments".to_string())
        );
        assert_eq!(
            parse_tag("note=a=b").unwrap(),
            ("note".to_string(), "a=b".to_string())
        );
        assert_eq!(parse_tag("empty=").unwrap(), ("empty".to_string(), String::new()));
    }

    #[test]
    fn test_parse_tag_rejects_malformed() {
        assert!(parse_tag("no-separator").is_err());
        assert!(parse_tag("=value").is_err());
    }

    #[test]
    fn test_load_input_yaml() {
        let path = write_manifest(
            "input.yaml",
            "secretId: app/db\nsecretString: hunter2\nversionStages:\n  - STAGING\n",
        );

        let input = load_input(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(input.secret_id, "app/db");
        assert_eq!(input.secret_string.as_deref(), Some("hunter2"));
        assert!(input.secret_binary.is_none());
        assert_eq!(input.version_stages, Some(vec!["STAGING".to_string()]));
    }

    #[test]
    fn test_load_input_json() {
        let path = write_manifest(
            "input.json",
            r#"{"secretId": "app/db", "secretBinary": "AAECAw=="}"#,
        );

        let input = load_input(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(input.secret_id, "app/db");
        assert_eq!(input.secret_binary.as_deref(), Some("AAECAw=="));
        assert!(input.version_stages.is_none());
    }

    #[test]
    fn test_load_input_missing_file() {
        let path = std::env::temp_dir().join("smvctl-does-not-exist.yaml");
        let err = load_input(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }

    #[test]
    fn test_cli_parses_stages_and_tags() {
        let cli = Cli::try_parse_from([
            "smvctl", "stages", "app/db|v1", "--stage", "AWSCURRENT", "--stage", "STAGING",
        ])
        .unwrap();
        match cli.command {
            Commands::Stages { id, stages } => {
                assert_eq!(id, "app/db|v1");
                assert_eq!(stages, vec!["AWSCURRENT".to_string(), "STAGING".to_string()]);
            }
            _ => panic!("expected stages command"),
        }

        let cli = Cli::try_parse_from(["smvctl", "tags", "app/db", "--tag", "env=prod"]).unwrap();
        assert!(matches!(cli.command, Commands::Tags { ref tags, .. } if tags.len() == 1));
    }
}
