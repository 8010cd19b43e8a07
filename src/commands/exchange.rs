use crate::models::{ExchangeConfig, ExchangeResult, Report};
use crate::services::{host_range, KeyStore, PasswordCache, PasswordPrompt, Provisioner, SshTransport};
use crate::utils::validate_user;
use std::sync::Arc;

/// Make sure the local keypair exists, resolve the hosts and provision each
/// of them. Errors returned here happened before any host was touched.
pub async fn exchange_keys(
    config: ExchangeConfig,
    key_store: &KeyStore,
    transport: Arc<dyn SshTransport>,
    prompt: Arc<dyn PasswordPrompt>,
) -> ExchangeResult<Report> {
    log::info!(
        "[exchange] Distributing {} to {}@{}",
        config.public_key_path.display(),
        config.user,
        config.host
    );
    validate_user(&config.user)?;

    key_store
        .ensure(
            &config.private_key_path,
            &config.public_key_path,
            config.generate_keys,
        )
        .await?;

    let hosts = host_range::expand(
        &config.host,
        config.range.as_deref(),
        config.exclude.as_deref(),
    )?;
    if hosts.is_empty() {
        log::warn!("[exchange] Host template {} resolved to no hosts", config.host);
    }

    let public_key = key_store.read_public_key(&config.public_key_path).await?;
    let passwords = Arc::new(PasswordCache::new(config.password.clone(), prompt));

    let provisioner = Provisioner::new(Arc::new(config), transport, passwords, public_key);
    let report = provisioner.run_all(&hosts).await;
    log::info!(
        "[exchange] Done: {} of {} hosts succeeded",
        report.entries().iter().filter(|s| s.success).count(),
        report.len()
    );
    Ok(report)
}
