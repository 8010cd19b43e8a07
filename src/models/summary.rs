use serde::{Deserialize, Serialize};

/// Outcome of provisioning a single host
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub host: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Summary {
    pub fn ok(host: impl Into<String>, message: Option<String>) -> Self {
        Self {
            host: host.into(),
            success: true,
            message,
        }
    }

    pub fn failed(host: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            success: false,
            message: Some(message.into()),
        }
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}\t-> {}",
            self.host,
            if self.success { "OK" } else { "FAILED" }
        )?;
        if let Some(message) = &self.message {
            write!(f, " - {}", message)?;
        }
        Ok(())
    }
}

/// Per-host summaries in resolution order
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Report {
    entries: Vec<Summary>,
}

impl Report {
    pub fn new(entries: Vec<Summary>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[Summary] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn any_success(&self) -> bool {
        self.entries.iter().any(|s| s.success)
    }

    pub fn exit_code(&self) -> u8 {
        if self.any_success() {
            0
        } else {
            1
        }
    }

    pub fn render_text(&self) -> String {
        let title = "Summary";
        let mut out = format!("{}\n{}\n", title, "-".repeat(title.len()));
        for summary in &self.entries {
            out.push_str(&summary.to_string());
            out.push('\n');
        }
        out
    }

    pub fn render_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
