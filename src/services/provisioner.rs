use crate::models::{ExchangeConfig, ExchangeResult, KeyExchangeError, Report, Summary};
use crate::services::password::PasswordCache;
use crate::services::ssh_transport::{SshTarget, SshTransport};
use crate::utils::validate_hostname;
use futures::stream::{self, StreamExt};
use std::sync::Arc;

pub const ALREADY_SET_UP: &str = "has already been set up";
pub const KEY_INSTALLED: &str = "public key installed";

/// Drives one host at a time through probe, key check, password fallback,
/// key upload and re-verification.
pub struct Provisioner {
    config: Arc<ExchangeConfig>,
    transport: Arc<dyn SshTransport>,
    passwords: Arc<PasswordCache>,
    public_key: String,
}

impl Provisioner {
    pub fn new(
        config: Arc<ExchangeConfig>,
        transport: Arc<dyn SshTransport>,
        passwords: Arc<PasswordCache>,
        public_key: impl Into<String>,
    ) -> Self {
        Self {
            config,
            transport,
            passwords,
            public_key: public_key.into(),
        }
    }

    /// Provision every host and collect the summaries in input order.
    ///
    /// With `jobs > 1` up to that many hosts are in flight at once; the
    /// report order is unaffected.
    pub async fn run_all(&self, hosts: &[String]) -> Report {
        let jobs = self.config.jobs.max(1);

        let summaries = if jobs == 1 {
            let mut summaries = Vec::with_capacity(hosts.len());
            for host in hosts {
                summaries.push(self.provision(host).await);
            }
            summaries
        } else {
            log::info!("[provision] {} hosts, {} at a time", hosts.len(), jobs);
            stream::iter(hosts)
                .map(|host| self.provision(host))
                .buffered(jobs)
                .collect::<Vec<_>>()
                .await
        };

        Report::new(summaries)
    }

    /// Provision a single host. Never fails: every error ends up in the
    /// returned summary.
    pub async fn provision(&self, host: &str) -> Summary {
        log::info!("[provision] check: {}", host);

        match self.try_provision(host).await {
            Ok(summary) => {
                log::info!("[provision] {}: success={}", host, summary.success);
                summary
            }
            Err(e) => {
                if e.is_expected() {
                    log::info!("[provision] {}: {}", host, e);
                } else {
                    log::warn!("[provision] {}: unexpected failure: {}", host, e);
                }
                Summary::failed(host, e.to_string())
            }
        }
    }

    async fn try_provision(&self, host: &str) -> ExchangeResult<Summary> {
        validate_hostname(host)?;

        let port = self.config.port;
        if !self
            .transport
            .probe_port(host, port, self.config.probe_ceiling)
            .await
        {
            return Err(KeyExchangeError::PortClosed { port });
        }

        let target = SshTarget::new(host, port, self.config.user.as_str());
        let private_key = self.config.private_key_path.as_path();

        if self.transport.check_key_auth(&target, private_key).await? {
            return Ok(Summary::ok(host, Some(ALREADY_SET_UP.to_string())));
        }

        let password = self.passwords.get().await?;
        self.transport
            .transfer_public_key(&target, password, &self.public_key)
            .await?;

        // Key and password both offered by now; a rejection here is final
        if !self.transport.check_key_auth(&target, private_key).await? {
            return Err(KeyExchangeError::AuthExhausted {
                user: target.user,
                host: target.host,
            });
        }
        Ok(Summary::ok(host, Some(KEY_INSTALLED.to_string())))
    }
}
