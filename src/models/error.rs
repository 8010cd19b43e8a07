use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug, Deserialize, Clone, PartialEq)]
pub enum KeyExchangeError {
    // Local key errors
    #[error(
        "ssh keys not exists (id_rsa ({private_key}): {private_exists}, id_rsa.pub ({public_key}): {public_exists})"
    )]
    MissingKeys {
        private_key: String,
        private_exists: bool,
        public_key: String,
        public_exists: bool,
    },

    #[error("Invalid key format: {message}")]
    InvalidKeyFormat { message: String },

    // Input errors
    #[error("Invalid range token: '{token}'")]
    RangeParse { token: String },

    #[error("Invalid user name: {user}")]
    InvalidUser { user: String },

    #[error("Host contains invalid characters: {host}")]
    InvalidHost { host: String },

    // Connection errors
    #[error("Port ({port}) is not open.")]
    PortClosed { port: u16 },

    #[error("Connection timeout")]
    ConnectionTimeout,

    #[error("Transport error: {message}")]
    Transport { message: String },

    // Authentication errors
    #[error(
        "public key was transferred but key authentication still fails (user: {user}, host: {host})"
    )]
    AuthExhausted { user: String, host: String },

    #[error("client-authentication failed (user: {user}, host: {host}): check password")]
    PasswordRejected { user: String, host: String },

    #[error("Password prompt failed: {message}")]
    PasswordPrompt { message: String },

    // Remote execution
    #[error("Remote command '{command}' exited with status {status}")]
    RemoteCommand { command: String, status: u32 },

    #[error("Remote command '{command}' was killed by signal {signal}")]
    RemoteSignal { command: String, signal: String },

    // System errors
    #[error("IO error: {message}")]
    IoError { message: String },

    #[error("Home directory not found")]
    HomeDirNotFound,
}

impl From<std::io::Error> for KeyExchangeError {
    fn from(e: std::io::Error) -> Self {
        KeyExchangeError::IoError {
            message: e.to_string(),
        }
    }
}

impl From<ssh_key::Error> for KeyExchangeError {
    fn from(e: ssh_key::Error) -> Self {
        KeyExchangeError::InvalidKeyFormat {
            message: e.to_string(),
        }
    }
}

impl From<russh_keys::Error> for KeyExchangeError {
    fn from(e: russh_keys::Error) -> Self {
        KeyExchangeError::InvalidKeyFormat {
            message: e.to_string(),
        }
    }
}

impl From<russh::Error> for KeyExchangeError {
    fn from(e: russh::Error) -> Self {
        KeyExchangeError::Transport {
            message: e.to_string(),
        }
    }
}

pub type ExchangeResult<T> = Result<T, KeyExchangeError>;

// Serialized as {type, message} in the JSON report
impl serde::Serialize for KeyExchangeError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("KeyExchangeError", 2)?;
        state.serialize_field("type", &self.error_type())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

impl KeyExchangeError {
    pub fn error_type(&self) -> &'static str {
        match self {
            KeyExchangeError::MissingKeys { .. } => "MissingKeys",
            KeyExchangeError::InvalidKeyFormat { .. } => "InvalidKeyFormat",
            KeyExchangeError::RangeParse { .. } => "RangeParse",
            KeyExchangeError::InvalidUser { .. } => "InvalidUser",
            KeyExchangeError::InvalidHost { .. } => "InvalidHost",
            KeyExchangeError::PortClosed { .. } => "PortClosed",
            KeyExchangeError::ConnectionTimeout => "ConnectionTimeout",
            KeyExchangeError::Transport { .. } => "Transport",
            KeyExchangeError::AuthExhausted { .. } => "AuthExhausted",
            KeyExchangeError::PasswordRejected { .. } => "PasswordRejected",
            KeyExchangeError::PasswordPrompt { .. } => "PasswordPrompt",
            KeyExchangeError::RemoteCommand { .. } => "RemoteCommand",
            KeyExchangeError::RemoteSignal { .. } => "RemoteSignal",
            KeyExchangeError::IoError { .. } => "IoError",
            KeyExchangeError::HomeDirNotFound => "HomeDirNotFound",
        }
    }

    /// Policy outcomes a host is allowed to end in. Everything else is logged
    /// as an abnormal condition.
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            KeyExchangeError::PortClosed { .. }
                | KeyExchangeError::AuthExhausted { .. }
                | KeyExchangeError::PasswordRejected { .. }
                | KeyExchangeError::InvalidHost { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_keys_message_names_both_files() {
        let err = KeyExchangeError::MissingKeys {
            private_key: "/home/a/.ssh/id_rsa".to_string(),
            private_exists: true,
            public_key: "/home/a/.ssh/id_rsa.pub".to_string(),
            public_exists: false,
        };
        let message = err.to_string();
        assert!(message.contains("/home/a/.ssh/id_rsa): true"));
        assert!(message.contains("/home/a/.ssh/id_rsa.pub): false"));
    }

    #[test]
    fn test_expected_outcomes() {
        assert!(KeyExchangeError::PortClosed { port: 22 }.is_expected());
        assert!(KeyExchangeError::PasswordRejected {
            user: "root".to_string(),
            host: "h".to_string()
        }
        .is_expected());
        assert!(!KeyExchangeError::ConnectionTimeout.is_expected());
        assert!(!KeyExchangeError::Transport {
            message: "reset".to_string()
        }
        .is_expected());
    }

    #[test]
    fn test_serialize_as_type_and_message() {
        let json = serde_json::to_value(KeyExchangeError::PortClosed { port: 2222 }).unwrap();
        assert_eq!(json["type"], "PortClosed");
        assert_eq!(json["message"], "Port (2222) is not open.");
    }
}
