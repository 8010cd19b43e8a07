use crate::models::{ExchangeResult, KeyExchangeError};

/// Reject hosts that could smuggle extra arguments or shell syntax
pub fn validate_hostname(hostname: &str) -> ExchangeResult<()> {
    if hostname.is_empty() || hostname.len() > 255 {
        return Err(KeyExchangeError::InvalidHost {
            host: hostname.to_string(),
        });
    }

    // Letters, digits, dot, hyphen, underscore, colon and brackets (IPv6)
    let is_valid = hostname.chars().all(|c| {
        c.is_ascii_alphanumeric()
            || c == '.'
            || c == '-'
            || c == '_'
            || c == ':'
            || c == '['
            || c == ']'
    });

    if !is_valid {
        return Err(KeyExchangeError::InvalidHost {
            host: hostname.to_string(),
        });
    }

    Ok(())
}

/// The user name is spliced into `~user` inside the remote script, so only
/// POSIX portable login names are accepted.
pub fn validate_user(user: &str) -> ExchangeResult<()> {
    let mut chars = user.chars();
    let first_ok = matches!(chars.next(), Some(c) if c.is_ascii_alphanumeric() || c == '_');
    let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.');

    if !first_ok || !rest_ok || user.len() > 32 {
        return Err(KeyExchangeError::InvalidUser {
            user: user.to_string(),
        });
    }

    Ok(())
}
