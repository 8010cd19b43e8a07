pub mod host_range;
pub mod key_store;
pub mod password;
pub mod provisioner;
pub mod remote_script;
pub mod ssh_transport;

pub use key_store::{GeneratedKeyPair, KeyStore};
pub use password::{PasswordCache, PasswordPrompt, TerminalPrompt};
pub use provisioner::Provisioner;
pub use remote_script::RemoteScript;
pub use ssh_transport::{RusshTransport, SshTarget, SshTransport};
