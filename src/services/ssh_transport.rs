use crate::models::{ExchangeResult, KeyExchangeError};
use crate::services::remote_script::RemoteScript;
use async_trait::async_trait;
use russh::client::KeyboardInteractiveAuthResponse;
use russh::keys::key::PublicKey;
use russh::{client, Channel, ChannelMsg, Disconnect};
use russh_keys::PublicKeyBase64;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncRead;
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout, Instant};

/// Upper bound for one TCP connect attempt while probing
const PROBE_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(3);
/// Pause between probe attempts
const PROBE_RETRY_INTERVAL: Duration = Duration::from_secs(1);
/// Keyboard-interactive rounds before giving up
const MAX_KEYBOARD_ROUNDS: usize = 5;

/// Where and as whom to log in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshTarget {
    pub host: String,
    pub port: u16,
    pub user: String,
}

impl SshTarget {
    pub fn new(host: impl Into<String>, port: u16, user: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            user: user.into(),
        }
    }

    fn socket_host(&self) -> &str {
        socket_host(&self.host)
    }
}

/// Host without IPv6 brackets, as the resolver expects it
fn socket_host(host: &str) -> &str {
    host.trim_start_matches('[').trim_end_matches(']')
}

/// Network capabilities the provisioning flow relies on.
///
/// `check_key_auth` returns `Ok(false)` when every offered credential was
/// rejected. Transport and protocol failures are errors.
#[async_trait]
pub trait SshTransport: Send + Sync {
    /// Retry a TCP connect to `host:port` until it succeeds or `ceiling` elapses
    async fn probe_port(&self, host: &str, port: u16, ceiling: Duration) -> bool;

    /// Try to log in with the private key at `private_key`
    async fn check_key_auth(&self, target: &SshTarget, private_key: &Path) -> ExchangeResult<bool>;

    /// Log in with `password` and append `public_key` to the remote
    /// `authorized_keys`
    async fn transfer_public_key(
        &self,
        target: &SshTarget,
        password: &str,
        public_key: &str,
    ) -> ExchangeResult<()>;
}

/// SSH client handler. Host keys are not pinned; they are logged so the
/// operator can compare them.
struct ClientHandler {
    hostname: String,
}

#[async_trait]
impl client::Handler for ClientHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        let server_key_base64 = server_public_key.public_key_base64();
        log::info!(
            "[ssh_transport] {} presented {} key {}...",
            self.hostname,
            server_public_key.name(),
            &server_key_base64[..server_key_base64.len().min(50)]
        );
        Ok(true)
    }
}

/// Output of one remote command
#[derive(Debug, Default)]
struct CommandOutput {
    stdout: String,
    stderr: String,
    exit_status: Option<u32>,
    exit_signal: Option<String>,
}

impl CommandOutput {
    fn log(&self, host: &str) {
        if !self.stdout.trim().is_empty() {
            log::info!("[ssh_transport] {}: {}", host, self.stdout.trim_end());
        }
        if !self.stderr.trim().is_empty() {
            log::warn!("[ssh_transport] {}: {}", host, self.stderr.trim_end());
        }
    }

    fn ensure_success(&self, command: &str) -> ExchangeResult<()> {
        if let Some(signal) = &self.exit_signal {
            return Err(KeyExchangeError::RemoteSignal {
                command: command.to_string(),
                signal: signal.clone(),
            });
        }
        match self.exit_status {
            Some(0) | None => Ok(()),
            Some(status) => Err(KeyExchangeError::RemoteCommand {
                command: command.to_string(),
                status,
            }),
        }
    }
}

/// One connected, not yet authenticated session. Callers must hand it back
/// through [`SshSession::close`] on every path.
struct SshSession {
    handle: client::Handle<ClientHandler>,
    host: String,
}

impl SshSession {
    async fn connect(target: &SshTarget, connect_timeout: Duration) -> ExchangeResult<Self> {
        let config = client::Config {
            inactivity_timeout: Some(Duration::from_secs(30)),
            ..Default::default()
        };
        let handler = ClientHandler {
            hostname: target.host.clone(),
        };

        let connect = client::connect(
            Arc::new(config),
            (target.socket_host(), target.port),
            handler,
        );
        let handle = match timeout(connect_timeout, connect).await {
            Ok(Ok(handle)) => handle,
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => return Err(KeyExchangeError::ConnectionTimeout),
        };

        Ok(Self {
            handle,
            host: target.host.clone(),
        })
    }

    async fn authenticate_key(&mut self, user: &str, private_key: &Path) -> ExchangeResult<bool> {
        let key_content = fs::read_to_string(private_key).await.map_err(|e| {
            KeyExchangeError::IoError {
                message: format!("Failed to read {}: {}", private_key.display(), e),
            }
        })?;
        let key_pair = russh_keys::decode_secret_key(&key_content, None)?;

        Ok(self
            .handle
            .authenticate_publickey(user, Arc::new(key_pair))
            .await?)
    }

    /// Plain password first, then keyboard-interactive answering every
    /// password prompt
    async fn authenticate_password(&mut self, user: &str, password: &str) -> ExchangeResult<bool> {
        if self.handle.authenticate_password(user, password).await? {
            return Ok(true);
        }

        log::debug!(
            "[ssh_transport] password method rejected on {}, trying keyboard-interactive",
            self.host
        );
        let mut response = self
            .handle
            .authenticate_keyboard_interactive_start(user, None::<String>)
            .await?;

        for _ in 0..MAX_KEYBOARD_ROUNDS {
            match response {
                KeyboardInteractiveAuthResponse::Success => return Ok(true),
                KeyboardInteractiveAuthResponse::Failure => return Ok(false),
                KeyboardInteractiveAuthResponse::InfoRequest { prompts, .. } => {
                    let answers = prompts
                        .iter()
                        .map(|p| {
                            if p.prompt.to_lowercase().contains("password") {
                                password.to_string()
                            } else {
                                String::new()
                            }
                        })
                        .collect();
                    response = self
                        .handle
                        .authenticate_keyboard_interactive_respond(answers)
                        .await?;
                }
            }
        }

        Ok(false)
    }

    /// Run `command` and collect its output
    async fn exec(&mut self, command: &str) -> ExchangeResult<CommandOutput> {
        let mut channel = self.handle.channel_open_session().await?;
        channel.exec(true, command).await?;
        Ok(collect_output(&mut channel).await)
    }

    /// Run `command` with `stdin` streamed to it, followed by EOF
    async fn exec_with_stdin<R>(&mut self, command: &str, stdin: R) -> ExchangeResult<CommandOutput>
    where
        R: AsyncRead + Unpin + Send,
    {
        let mut channel = self.handle.channel_open_session().await?;
        channel.exec(true, command).await?;
        channel.data(stdin).await?;
        channel.eof().await?;
        Ok(collect_output(&mut channel).await)
    }

    async fn close(self) {
        if let Err(e) = self
            .handle
            .disconnect(Disconnect::ByApplication, "", "en")
            .await
        {
            log::debug!("[ssh_transport] disconnect from {} failed: {}", self.host, e);
        }
    }
}

/// Drain a channel until the remote side closes it
async fn collect_output(channel: &mut Channel<client::Msg>) -> CommandOutput {
    let mut output = CommandOutput::default();
    while let Some(msg) = channel.wait().await {
        match msg {
            ChannelMsg::Data { ref data } => {
                output.stdout.push_str(&String::from_utf8_lossy(data));
            }
            ChannelMsg::ExtendedData { ref data, .. } => {
                output.stderr.push_str(&String::from_utf8_lossy(data));
            }
            ChannelMsg::ExitStatus { exit_status } => {
                output.exit_status = Some(exit_status);
            }
            ChannelMsg::ExitSignal {
                signal_name,
                error_message,
                ..
            } => {
                log::warn!("[ssh_transport] remote process killed: {:?} {}", signal_name, error_message);
                output.exit_signal = Some(format!("{:?}", signal_name));
            }
            _ => {}
        }
    }
    output
}

/// [`SshTransport`] backed by russh
#[derive(Debug, Clone)]
pub struct RusshTransport {
    connect_timeout: Duration,
}

impl RusshTransport {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }

    async fn key_auth_session(
        session: &mut SshSession,
        target: &SshTarget,
        private_key: &Path,
    ) -> ExchangeResult<bool> {
        if !session.authenticate_key(&target.user, private_key).await? {
            log::warn!(
                "[ssh_transport] Key-Authentication failed (user: {}, host: {})",
                target.user,
                target.host
            );
            return Ok(false);
        }

        // Show which machine answered; failure here does not undo the login
        match session.exec("uname -a").await {
            Ok(output) => output.log(&target.host),
            Err(e) => log::warn!("[ssh_transport] uname on {} failed: {}", target.host, e),
        }
        Ok(true)
    }

    async fn transfer_session(
        session: &mut SshSession,
        target: &SshTarget,
        password: &str,
        public_key: &str,
    ) -> ExchangeResult<()> {
        if !session.authenticate_password(&target.user, password).await? {
            return Err(KeyExchangeError::PasswordRejected {
                user: target.user.clone(),
                host: target.host.clone(),
            });
        }

        let script = RemoteScript::new(&target.user, public_key)?;

        // Local copy is removed when `local` drops, on every path
        let mut local = tempfile::Builder::new()
            .prefix(script.base_name())
            .tempfile()?;
        log::debug!("[ssh_transport] script-path: {}", local.path().display());
        local.write_all(script.content().as_bytes())?;
        local.flush()?;

        let upload = format!("cat > '{}'", script.remote_path());
        let source = fs::File::from_std(local.reopen()?);
        session
            .exec_with_stdin(&upload, source)
            .await?
            .ensure_success(&upload)?;

        let run = script.run_command();
        let output = session.exec(&run).await?;
        output.log(&target.host);
        output.ensure_success(&run)
    }
}

#[async_trait]
impl SshTransport for RusshTransport {
    async fn probe_port(&self, host: &str, port: u16, ceiling: Duration) -> bool {
        let deadline = Instant::now() + ceiling;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let attempt = remaining.min(PROBE_ATTEMPT_TIMEOUT).max(Duration::from_millis(50));

            match timeout(attempt, TcpStream::connect((socket_host(host), port))).await {
                Ok(Ok(_stream)) => return true,
                Ok(Err(e)) => log::debug!("[ssh_transport] {}:{} not reachable: {}", host, port, e),
                Err(_) => log::debug!("[ssh_transport] {}:{} connect timed out", host, port),
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            sleep(remaining.min(PROBE_RETRY_INTERVAL)).await;
        }
    }

    async fn check_key_auth(&self, target: &SshTarget, private_key: &Path) -> ExchangeResult<bool> {
        let mut session = SshSession::connect(target, self.connect_timeout).await?;
        let result = Self::key_auth_session(&mut session, target, private_key).await;
        session.close().await;
        result
    }

    async fn transfer_public_key(
        &self,
        target: &SshTarget,
        password: &str,
        public_key: &str,
    ) -> ExchangeResult<()> {
        let mut session = SshSession::connect(target, self.connect_timeout).await?;
        let result = Self::transfer_session(&mut session, target, password, public_key).await;
        session.close().await;
        result
    }
}
