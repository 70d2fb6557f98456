use central_storage_client::{CentralStorageClient, ClientConfig, RequestOverrides};
use central_storage_core::prelude::*;
use clap::{Parser, Subcommand};
use rand::Rng;
use rand::distr::Alphanumeric;
use std::path::PathBuf;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "central-storage")]
#[command(about = "CLI for a Central Storage asset server")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Server URL
    #[arg(short, long, env = "CENTRAL_STORAGE_SERVER", default_value = "http://localhost:8000")]
    server: String,

    /// URL used in links handed out to end users
    #[arg(long, env = "CENTRAL_STORAGE_FRONT")]
    front: Option<String>,

    #[arg(short, long, env = "CENTRAL_STORAGE_KEY", default_value = "")]
    key: String,

    #[arg(long, env = "CENTRAL_STORAGE_SECRET", default_value = "", hide_env_values = true)]
    secret: String,

    /// Asset version added to urls as `_v`
    #[arg(long, env = "CENTRAL_STORAGE_VERSION", default_value = "1")]
    asset_version: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a single file
    Upload {
        path: PathBuf,

        /// Attributes stored with the asset (e.g. "category=avatar")
        #[arg(long = "attr", value_parser = parse_pair)]
        attributes: Vec<(String, String)>,
    },
    /// Upload every file in a directory
    UploadDir {
        #[arg(long)]
        dir: PathBuf,
    },
    /// Delete an asset by key
    Delete {
        key: String,

        #[arg(long = "attr", value_parser = parse_pair)]
        attributes: Vec<(String, String)>,
    },
    /// Print the public url of an asset
    Url {
        key: String,

        /// Query parameters (e.g. "width=200")
        #[arg(long = "param", value_parser = parse_pair)]
        params: Vec<(String, String)>,
    },
    /// Print a signed proxy url for a public resource
    PublicUrl {
        url: String,

        #[arg(long = "param", value_parser = parse_pair)]
        params: Vec<(String, String)>,
    },
    /// Sign parameters with the configured secret
    Sign {
        #[arg(value_parser = parse_pair)]
        params: Vec<(String, String)>,

        /// Fixed salt, for reproducible signatures
        #[arg(long, value_parser = parse_salt)]
        salt: Option<String>,
    },
    /// Check a signature against parameters
    Verify {
        #[arg(long)]
        signature: String,

        #[arg(value_parser = parse_pair)]
        params: Vec<(String, String)>,
    },
    GenerateSecret,
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))
}

fn parse_salt(raw: &str) -> Result<String, String> {
    if raw.contains(':') {
        return Err(format!("salt must not contain ':', got '{raw}'"));
    }
    Ok(raw.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = ClientConfig::new(cli.server, cli.key, cli.secret)
        .with_version(Some(cli.asset_version).filter(|v| !v.is_empty()));
    if let Some(front) = cli.front {
        config = config.with_front(front);
    }
    let client = CentralStorageClient::new(config);
    let overrides = RequestOverrides::default();

    match cli.command {
        Commands::GenerateSecret => {
            let secret: String = rand::rng()
                .sample_iter(&Alphanumeric)
                .take(64)
                .map(char::from)
                .collect();

            println!("🔑 Generated consumer secret:");
            println!("\n    {secret}\n");
            println!("Register it for your key on the server and set it here:");
            println!("set CENTRAL_STORAGE_SECRET=\"{secret}\"");
        }
        Commands::Upload { path, attributes } => {
            let asset = client.store(&path, attributes, &overrides).await?;
            println!("✅ Upload successful! Key: {}", asset.asset_key);
            println!("{}", serde_json::to_string_pretty(&asset)?);
        }
        Commands::UploadDir { dir } => {
            println!("🚀 Uploading files from {dir:?}...");

            let mut count = 0;
            for entry in WalkDir::new(&dir) {
                let entry = entry?;
                if entry.file_type().is_dir() {
                    continue;
                }

                let path = entry.path();
                let relative_path = path
                    .strip_prefix(&dir)?
                    .to_string_lossy()
                    .replace('\\', "/");

                let asset = client
                    .store(path, [("path", relative_path.as_str())], &overrides)
                    .await?;
                println!("{relative_path} -> {}", asset.asset_key);
                count += 1;
            }

            println!("✅ Uploaded {count} files.");
        }
        Commands::Delete { key, attributes } => {
            let success = client
                .delete_asset(&Asset::new(key.clone()), attributes, &overrides)
                .await?;
            if success {
                println!("✅ Deleted {key}");
            } else {
                anyhow::bail!("Server did not delete {key}");
            }
        }
        Commands::Url { key, params } => {
            println!("{}", client.asset_url(&Asset::new(key), params, None));
        }
        Commands::PublicUrl { url, params } => {
            println!("{}", client.public_asset_url(&url, params));
        }
        Commands::Sign { params, salt } => {
            let token = client
                .signer()
                .sign_parameters(params, None, salt.as_deref());
            println!("{token}");
        }
        Commands::Verify { signature, params } => {
            let secret = client.config().secret.as_str();
            if client.signer().is_valid_parameters(params, &signature, secret) {
                println!("✅ Signature is valid");
            } else {
                anyhow::bail!("Signature is not valid");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn pairs_split_on_first_equals() {
        assert_eq!(
            parse_pair("url=https://x.example/?a=b"),
            Ok(("url".to_string(), "https://x.example/?a=b".to_string()))
        );
        assert!(parse_pair("novalue").is_err());
    }

    #[test]
    fn parses_sign_command() {
        let cli = Cli::try_parse_from([
            "central-storage",
            "--secret",
            "s3cr3t",
            "sign",
            "foo=wololo",
            "bar=awlololo",
            "--salt",
            "pepper",
        ])
        .unwrap();

        let Commands::Sign { params, salt } = cli.command else {
            panic!("expected sign command");
        };
        assert_eq!(params.len(), 2);
        assert_eq!(salt.as_deref(), Some("pepper"));
    }

    #[test]
    fn sign_command_refuses_salt_with_separator() {
        let result = Cli::try_parse_from([
            "central-storage",
            "sign",
            "foo=wololo",
            "--salt",
            "pep:per",
        ]);

        assert!(result.is_err());
    }
}
