use crate::models::{ExchangeResult, KeyExchangeError};
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

pub const OWNER_ONLY_DIR: u32 = 0o700;
pub const OWNER_ONLY_FILE: u32 = 0o600;

/// Expand a leading `~` to the home directory
pub fn expand_home(path: &str) -> ExchangeResult<PathBuf> {
    if path == "~" {
        return dirs::home_dir().ok_or(KeyExchangeError::HomeDirNotFound);
    }
    if let Some(rest) = path.strip_prefix("~/") {
        let home = dirs::home_dir().ok_or(KeyExchangeError::HomeDirNotFound)?;
        return Ok(home.join(rest));
    }
    Ok(PathBuf::from(path))
}

/// Create `dir` (and missing parents) restricted to the owner. Existing
/// directories are left untouched.
pub async fn create_private_dir(dir: &Path) -> ExchangeResult<()> {
    if dir.as_os_str().is_empty() || dir.exists() {
        return Ok(());
    }

    let mut builder = tokio::fs::DirBuilder::new();
    builder.recursive(true);
    // Applies to every directory created along the way
    #[cfg(unix)]
    builder.mode(OWNER_ONLY_DIR);

    builder
        .create(dir)
        .await
        .map_err(|e| KeyExchangeError::IoError {
            message: format!("Failed to create directory {}: {}", dir.display(), e),
        })
}

/// Write `content` to `path` and restrict it to owner read/write
pub async fn write_private_file(path: &Path, content: &[u8]) -> ExchangeResult<()> {
    tokio::fs::write(path, content)
        .await
        .map_err(|e| KeyExchangeError::IoError {
            message: format!("Failed to write {}: {}", path.display(), e),
        })?;

    #[cfg(unix)]
    {
        let perms = std::fs::Permissions::from_mode(OWNER_ONLY_FILE);
        tokio::fs::set_permissions(path, perms).await?;
    }

    Ok(())
}

/// Permission bits of `path`, `None` off unix
pub fn mode_of(path: &Path) -> ExchangeResult<Option<u32>> {
    #[cfg(unix)]
    {
        let metadata = std::fs::metadata(path).map_err(|e| KeyExchangeError::IoError {
            message: format!("Failed to read file metadata: {}", e),
        })?;
        Ok(Some(metadata.permissions().mode() & 0o777))
    }

    #[cfg(not(unix))]
    {
        let _ = path;
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_expand_home() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(expand_home("~/.ssh/id_rsa").unwrap(), home.join(".ssh/id_rsa"));
        assert_eq!(expand_home("~").unwrap(), home);
        assert_eq!(
            expand_home("/etc/ssh/key").unwrap(),
            PathBuf::from("/etc/ssh/key")
        );
        assert_eq!(expand_home("rel/~x").unwrap(), PathBuf::from("rel/~x"));
    }

    #[tokio::test]
    async fn test_create_private_dir_nested() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("a").join("b");
        create_private_dir(&dir).await.unwrap();
        assert!(dir.is_dir());
        #[cfg(unix)]
        assert_eq!(mode_of(&dir).unwrap(), Some(OWNER_ONLY_DIR));
    }

    #[tokio::test]
    async fn test_write_private_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("secret");
        write_private_file(&file, b"data").await.unwrap();
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "data");
        #[cfg(unix)]
        assert_eq!(mode_of(&file).unwrap(), Some(OWNER_ONLY_FILE));
    }
}
