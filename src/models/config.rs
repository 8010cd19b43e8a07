use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 22;
pub const DEFAULT_USER: &str = "root";
pub const DEFAULT_PROBE_CEILING: Duration = Duration::from_secs(120);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// How the final report is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// Run configuration, built once from the command line
#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    /// Host address or template containing `X`
    pub host: String,
    pub range: Option<String>,
    pub exclude: Option<String>,
    pub port: u16,
    pub user: String,
    /// Seeds the password cache; prompted for when absent
    pub password: Option<String>,
    pub private_key_path: PathBuf,
    pub public_key_path: PathBuf,
    pub generate_keys: bool,
    /// How long to keep retrying the TCP probe
    pub probe_ceiling: Duration,
    pub connect_timeout: Duration,
    pub jobs: usize,
    pub report_format: ReportFormat,
}

impl ExchangeConfig {
    /// Config for a single host with default settings and the given key paths
    pub fn new(host: impl Into<String>, private_key_path: impl Into<PathBuf>) -> Self {
        let private_key_path = private_key_path.into();
        let public_key_path = default_public_key_path(&private_key_path);
        Self {
            host: host.into(),
            range: None,
            exclude: None,
            port: DEFAULT_PORT,
            user: DEFAULT_USER.to_string(),
            password: None,
            private_key_path,
            public_key_path,
            generate_keys: false,
            probe_ceiling: DEFAULT_PROBE_CEILING,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            jobs: 1,
            report_format: ReportFormat::Text,
        }
    }
}

/// `<private>.pub`
pub fn default_public_key_path(private_key_path: &std::path::Path) -> PathBuf {
    let mut name = private_key_path.as_os_str().to_os_string();
    name.push(".pub");
    PathBuf::from(name)
}
