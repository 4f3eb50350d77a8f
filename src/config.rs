//! Configuration handling for the application.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::sugarsync::{ClientConfig, Credentials, BASE_URL};

/// Download every file of a SugarSync account into a local directory.
#[derive(Parser, Debug, Clone)]
#[command(name = "sugarsync-dl")]
#[command(about = "A tool to automate downloading all files from your SugarSync account")]
pub struct Config {
    /// SugarSync username / email
    #[arg(short = 'u', long, env = "SUGARSYNC_USER")]
    pub user: String,

    /// SugarSync password
    #[arg(short = 'p', long, env = "SUGARSYNC_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Developer application ID
    #[arg(short = 'a', long, env = "SUGARSYNC_APP_ID")]
    pub app_id: String,

    /// Developer public access key
    #[arg(long, env = "SUGARSYNC_PUBLIC_ACCESS_KEY")]
    pub public_access_key: String,

    /// Developer private access key
    #[arg(long, env = "SUGARSYNC_PRIVATE_ACCESS_KEY", hide_env_values = true)]
    pub private_access_key: String,

    /// Output directory where files will be written to
    #[arg(short = 'o', long)]
    pub output: PathBuf,

    /// Replace local files that already exist instead of skipping them
    #[arg(short = 'r', long, default_value = "false")]
    pub replace: bool,

    /// Write into a fresh `sugardl_<timestamp>` directory under the output directory
    #[arg(long, default_value = "false")]
    pub timestamped: bool,

    /// SugarSync API base URL
    #[arg(long, env = "SUGARSYNC_BASE_URL", default_value = BASE_URL)]
    pub base_url: String,

    /// Per-request timeout in seconds for authentication and listing calls
    #[arg(long, env = "SUGARSYNC_TIMEOUT_SECS", default_value_t = 300)]
    pub timeout_secs: u64,

    /// Per-request timeout in seconds for file downloads
    #[arg(long, env = "SUGARSYNC_DOWNLOAD_TIMEOUT_SECS", default_value_t = 3600)]
    pub download_timeout_secs: u64,

    /// Accept invalid TLS certificates (legacy behaviour, insecure)
    #[arg(long, default_value = "false")]
    pub insecure: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

impl Config {
    /// Static account and developer secrets.
    pub fn credentials(&self) -> Credentials {
        Credentials {
            username: self.user.clone(),
            password: self.password.clone(),
            app_id: self.app_id.clone(),
            public_key: self.public_access_key.clone(),
            private_key: self.private_access_key.clone(),
        }
    }

    /// Transport settings for the API client.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            download_timeout: Duration::from_secs(self.download_timeout_secs),
            accept_invalid_certs: self.insecure,
        }
    }

    /// Directory the mirror is written into.
    pub fn output_dir(&self) -> PathBuf {
        if self.timestamped {
            let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
            self.output.join(format!("sugardl_{}", stamp))
        } else {
            self.output.clone()
        }
    }
}
