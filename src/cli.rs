use crate::models::config::{default_public_key_path, DEFAULT_PORT, DEFAULT_USER};
use crate::models::{ExchangeConfig, ExchangeResult, KeyExchangeError, ReportFormat};
use crate::utils::expand_home;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Distribute an RSA public key to one or many SSH hosts
#[derive(Parser, Debug)]
#[command(name = "ssh-key-exchange")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Distribute an RSA public key to one or many SSH hosts", long_about = None)]
#[command(after_help = "Example: ssh-key-exchange -i 10.20.0.X -r 1-6,8,13-233 -e 5")]
pub struct Cli {
    /// host ip (10.10.0.3) or in conjunction with range (10.20.0.X)
    #[arg(short = 'i', long)]
    pub host: String,

    /// port of ssh host
    #[arg(short = 'P', long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// user of ssh host
    #[arg(short = 'u', long, default_value = DEFAULT_USER)]
    pub user: String,

    /// ssh password (if you do not specify it you will be asked)
    #[arg(short = 'p', long, env = "SSH_KEY_EXCHANGE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// path of id_rsa [default: ~/.ssh/id_rsa]
    #[arg(short = 'a', long = "rsaPrivPath")]
    pub rsa_priv_path: Option<String>,

    /// path of id_rsa.pub [default: <rsaPrivPath>.pub]
    #[arg(short = 'b', long = "rsaPubPath")]
    pub rsa_pub_path: Option<String>,

    /// generate keys, base path is rsaPrivPath
    #[arg(short = 'k', long = "rsaKeyGenerate")]
    pub rsa_key_generate: bool,

    /// range (1-6,8,13-233)
    #[arg(short = 'r', long)]
    pub range: Option<String>,

    /// comma separated list of excluded ip addresses (only in conjunction with range)
    #[arg(short = 'e', long)]
    pub exclude: Option<String>,

    /// seconds to wait for the ssh port to open
    #[arg(short = 't', long, default_value_t = 120)]
    pub timeout: u64,

    /// seconds to wait for an ssh handshake
    #[arg(long, default_value_t = 10)]
    pub connect_timeout: u64,

    /// hosts provisioned at the same time
    #[arg(short = 'j', long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    pub jobs: u16,

    /// print the summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Increase verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Resolve paths and defaults into the run configuration
    pub fn into_config(self) -> ExchangeResult<ExchangeConfig> {
        let private_key_path = match self.rsa_priv_path.as_deref() {
            Some(path) => expand_home(path)?,
            None => default_private_key_path()?,
        };
        let public_key_path = match self.rsa_pub_path.as_deref() {
            Some(path) => expand_home(path)?,
            None => default_public_key_path(&private_key_path),
        };

        Ok(ExchangeConfig {
            host: self.host,
            range: self.range,
            exclude: self.exclude,
            port: self.port,
            user: self.user,
            password: self.password,
            private_key_path,
            public_key_path,
            generate_keys: self.rsa_key_generate,
            probe_ceiling: Duration::from_secs(self.timeout),
            connect_timeout: Duration::from_secs(self.connect_timeout),
            jobs: usize::from(self.jobs),
            report_format: if self.json {
                ReportFormat::Json
            } else {
                ReportFormat::Text
            },
        })
    }

    /// Log filter matching the `-v` count
    pub fn log_directive(&self) -> String {
        let level = match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        format!("warn,ssh_key_exchange_lib={}", level)
    }
}

fn default_private_key_path() -> ExchangeResult<PathBuf> {
    let home = dirs::home_dir().ok_or(KeyExchangeError::HomeDirNotFound)?;
    Ok(home.join(".ssh").join("id_rsa"))
}
