use crate::models::ExchangeResult;
use crate::utils::validate_user;
use rand::distributions::Alphanumeric;
use rand::Rng;

const SCRIPT_PREFIX: &str = "ssh-script.";
const REMOTE_TMP_DIR: &str = "/tmp";

/// Shell script that appends a public key to a user's `authorized_keys`
/// unless a line containing it is already there, then removes itself.
#[derive(Debug, Clone)]
pub struct RemoteScript {
    base_name: String,
    user: String,
    public_key: String,
}

impl RemoteScript {
    pub fn new(user: &str, public_key: &str) -> ExchangeResult<Self> {
        validate_user(user)?;

        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(8)
            .map(|c| char::from(c).to_ascii_lowercase())
            .collect();

        Ok(Self {
            base_name: format!("{}{}", SCRIPT_PREFIX, suffix),
            user: user.to_string(),
            public_key: public_key.trim().to_string(),
        })
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// Where the script lives on the remote host
    pub fn remote_path(&self) -> String {
        format!("{}/{}", REMOTE_TMP_DIR, self.base_name)
    }

    /// Command that runs the uploaded script
    pub fn run_command(&self) -> String {
        format!("env sh {}", self.remote_path())
    }

    /// Script targeting `~user/.ssh` at [`Self::remote_path`]
    pub fn content(&self) -> String {
        self.render_for(&format!("~{}/.ssh", self.user), &self.remote_path())
    }

    /// Script targeting an arbitrary ssh directory. `ssh_dir` is emitted
    /// verbatim so tilde expansion still happens in the shell.
    pub fn render_for(&self, ssh_dir: &str, script_path: &str) -> String {
        let key = shell_quote(&self.public_key);
        let authorized_keys = format!("{}/authorized_keys", ssh_dir);

        format!(
            r#"mkdir -p {ssh_dir}
chmod 700 {ssh_dir}

# ensure availability of authorized_keys
touch {authorized_keys}
chmod 600 {authorized_keys}

# avoid adding the same key multiple times
if ! grep -qF -- {key} {authorized_keys}; then
  printf '\n%s\n' {key} >> {authorized_keys}
fi

# remove this script
rm -f {script_path}
"#,
            ssh_dir = ssh_dir,
            authorized_keys = authorized_keys,
            key = key,
            script_path = shell_quote(script_path),
        )
    }
}

/// Wrap in single quotes, escaping embedded single quotes
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}
