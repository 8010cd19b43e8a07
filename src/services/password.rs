use crate::models::{ExchangeResult, KeyExchangeError};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Source of a password when none was configured
pub trait PasswordPrompt: Send + Sync {
    fn prompt(&self, label: &str) -> ExchangeResult<String>;
}

/// Masked terminal input
#[derive(Debug, Default, Clone)]
pub struct TerminalPrompt;

impl PasswordPrompt for TerminalPrompt {
    fn prompt(&self, label: &str) -> ExchangeResult<String> {
        dialoguer::Password::new()
            .with_prompt(label)
            .allow_empty_password(true)
            .interact()
            .map_err(|e| KeyExchangeError::PasswordPrompt {
                message: e.to_string(),
            })
    }
}

/// Write-once password shared by every host of a run.
///
/// Seeded from the configuration when a password was given, otherwise the
/// first host that needs it prompts and the answer is reused afterwards.
/// Concurrent first requests wait on the same prompt.
pub struct PasswordCache {
    cell: OnceCell<String>,
    prompt: Arc<dyn PasswordPrompt>,
}

impl PasswordCache {
    pub fn new(initial: Option<String>, prompt: Arc<dyn PasswordPrompt>) -> Self {
        let cell = match initial {
            Some(password) => OnceCell::new_with(Some(password)),
            None => OnceCell::new(),
        };
        Self { cell, prompt }
    }

    pub fn is_set(&self) -> bool {
        self.cell.initialized()
    }

    pub async fn get(&self) -> ExchangeResult<&str> {
        let password = self
            .cell
            .get_or_try_init(|| async {
                let prompt = Arc::clone(&self.prompt);
                log::debug!("[password] No password configured, asking");
                tokio::task::spawn_blocking(move || prompt.prompt("Password"))
                    .await
                    .map_err(|e| KeyExchangeError::PasswordPrompt {
                        message: e.to_string(),
                    })?
            })
            .await?;
        Ok(password.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingPrompt {
        calls: AtomicUsize,
    }

    impl PasswordPrompt for CountingPrompt {
        fn prompt(&self, _label: &str) -> ExchangeResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(20));
            Ok("s3cret".to_string())
        }
    }

    struct FailingPrompt;

    impl PasswordPrompt for FailingPrompt {
        fn prompt(&self, _label: &str) -> ExchangeResult<String> {
            Err(KeyExchangeError::PasswordPrompt {
                message: "not a terminal".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_configured_password_skips_prompt() {
        let prompt = Arc::new(CountingPrompt {
            calls: AtomicUsize::new(0),
        });
        let cache = PasswordCache::new(Some("given".to_string()), prompt.clone());
        assert!(cache.is_set());
        assert_eq!(cache.get().await.unwrap(), "given");
        assert_eq!(prompt.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_requests_prompt_once() {
        let prompt = Arc::new(CountingPrompt {
            calls: AtomicUsize::new(0),
        });
        let cache = Arc::new(PasswordCache::new(None, prompt.clone()));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                cache.get().await.map(|p| p.to_string())
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "s3cret");
        }
        assert_eq!(prompt.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_prompt_is_not_cached() {
        let cache = PasswordCache::new(None, Arc::new(FailingPrompt));
        assert!(cache.get().await.is_err());
        assert!(!cache.is_set());
    }
}
