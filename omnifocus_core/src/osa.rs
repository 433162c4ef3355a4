// src/osa.rs
// osascript execution for the OmniJS bridge. macOS only; the script is
// piped over stdin so there is nothing on disk to clean up.

use crate::error::OmniFocusError;

/// Result of running a script through /usr/bin/osascript.
#[derive(Debug, Clone)]
pub struct ScriptResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl ScriptResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

#[cfg(target_os = "macos")]
pub async fn run_applescript(script: &str) -> Result<ScriptResult, OmniFocusError> {
    use std::process::Stdio;
    use tokio::io::AsyncWriteExt;
    use tokio::process::Command;

    let mut cmd = Command::new("/usr/bin/osascript");
    cmd.stdin(Stdio::piped());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    let mut child = cmd
        .spawn()
        .map_err(|e| OmniFocusError::External(format!("Failed to spawn osascript: {}", e)))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(script.as_bytes())
            .await
            .map_err(|e| OmniFocusError::External(format!("Failed to write script: {}", e)))?;
    }

    let output = child
        .wait_with_output()
        .await
        .map_err(|e| OmniFocusError::External(format!("Failed to wait for osascript: {}", e)))?;

    Ok(ScriptResult {
        stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        exit_code: output.status.code().unwrap_or(-1),
    })
}

#[cfg(not(target_os = "macos"))]
pub async fn run_applescript(_script: &str) -> Result<ScriptResult, OmniFocusError> {
    Err(OmniFocusError::External(
        "AppleScript is only available on macOS".to_string(),
    ))
}

/// Run a script and return stdout, or the stderr text as an external error.
pub async fn run_applescript_output(script: &str) -> Result<String, OmniFocusError> {
    let result = run_applescript(script).await?;
    if result.success() {
        Ok(result.stdout)
    } else {
        Err(OmniFocusError::External(format!(
            "AppleScript error: {}",
            result.stderr
        )))
    }
}

/// Escape a string for embedding inside an AppleScript string literal.
pub fn escape_applescript_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Escape a string for embedding inside an OmniJS (JavaScript) string
/// literal. Newlines must be escaped too or the generated script breaks.
pub fn escape_omnijs_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

/// Wrap an OmniJS program in the AppleScript `evaluate javascript` bridge.
/// The OmniJS side is expected to return a JSON string; that string comes
/// back as the AppleScript result on stdout.
pub fn wrap_omnijs(omnijs: &str) -> String {
    format!(
        "tell application \"OmniFocus\"\n\ttell default document\n\t\tevaluate javascript \"{}\"\n\tend tell\nend tell",
        escape_applescript_string(omnijs)
    )
}

/// Evaluate an OmniJS program against OmniFocus and parse the JSON it
/// returns. Script exceptions and malformed output surface as external
/// errors with the host's message kept verbatim.
pub async fn evaluate_omnijs(omnijs: &str) -> Result<serde_json::Value, OmniFocusError> {
    let wrapped = wrap_omnijs(omnijs);
    let output = run_applescript_output(&wrapped).await?;
    serde_json::from_str(&output).map_err(|e| {
        OmniFocusError::External(format!(
            "OmniFocus returned unparseable output: {} ({})",
            output, e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_applescript_quotes_and_backslashes() {
        let input = r#"Say "hi" \ bye"#;
        assert_eq!(escape_applescript_string(input), r#"Say \"hi\" \\ bye"#);
    }

    #[test]
    fn escape_omnijs_handles_newlines() {
        assert_eq!(escape_omnijs_string("a\nb\t\"c\""), "a\\nb\\t\\\"c\\\"");
    }

    #[test]
    fn wrap_omnijs_targets_default_document() {
        let wrapped = wrap_omnijs(r#"JSON.stringify({"ok": true})"#);
        assert!(wrapped.starts_with("tell application \"OmniFocus\""));
        assert!(wrapped.contains("evaluate javascript"));
        // The embedded program must be AppleScript-escaped.
        assert!(wrapped.contains(r#"JSON.stringify({\"ok\": true})"#));
    }
}
