use crate::services::store::S3Settings;
use anyhow::{Context, Result, anyhow};
use clap::Parser;
use std::env;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub s3: S3Settings,
}

/// One-shot mode that prints the bucket tree instead of serving HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeMode {
    pub depth: usize,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Browser file manager for a single S3 bucket")]
pub struct Args {
    /// Host to bind to (overrides FILE_MANAGER_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides FILE_MANAGER_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Bucket to manage (overrides FILE_MANAGER_BUCKET)
    #[arg(long)]
    pub bucket: Option<String>,

    /// Bucket region (overrides FILE_MANAGER_REGION)
    #[arg(long)]
    pub region: Option<String>,

    /// Custom endpoint for S3-compatible stores (overrides FILE_MANAGER_ENDPOINT)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Print the bucket tree and exit
    #[arg(long)]
    pub tree: bool,

    /// How many folder levels to expand in --tree mode
    #[arg(long, default_value_t = 1, requires = "tree")]
    pub depth: usize,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and the optional
    /// tree mode.
    pub fn from_env_and_args() -> Result<(Self, Option<TreeMode>)> {
        let args = Args::parse();
        Self::resolve(args, |name| env::var(name))
    }

    /// Merge parsed `args` over values read through `lookup`.
    pub fn resolve<F>(args: Args, lookup: F) -> Result<(Self, Option<TreeMode>)>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        let optional = |name: &str| -> Result<Option<String>> {
            match lookup(name) {
                Ok(value) if value.trim().is_empty() => Ok(None),
                Ok(value) => Ok(Some(value)),
                Err(env::VarError::NotPresent) => Ok(None),
                Err(err) => Err(err).with_context(|| format!("reading {}", name)),
            }
        };
        let required = |name: &str, flag: Option<String>| -> Result<String> {
            match flag {
                Some(value) => Ok(value),
                None => optional(name)?
                    .ok_or_else(|| anyhow!("{} must be set", name)),
            }
        };

        // --- Environment fallback ---
        let env_host = optional("FILE_MANAGER_HOST")?.unwrap_or_else(|| "0.0.0.0".into());
        let env_port = match optional("FILE_MANAGER_PORT")? {
            Some(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing FILE_MANAGER_PORT value `{}`", value))?,
            None => 3000,
        };

        // --- Merge ---
        let s3 = S3Settings {
            bucket: required("FILE_MANAGER_BUCKET", args.bucket)?,
            region: required("FILE_MANAGER_REGION", args.region)?,
            access_key_id: required("AWS_ACCESS_KEY", None)?,
            secret_access_key: required("AWS_SECRET_KEY", None)?,
            endpoint: match args.endpoint {
                Some(endpoint) => Some(endpoint),
                None => optional("FILE_MANAGER_ENDPOINT")?,
            },
        };
        let cfg = Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            s3,
        };
        let tree = args.tree.then_some(TreeMode { depth: args.depth });

        Ok((cfg, tree))
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
