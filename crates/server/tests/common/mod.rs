use anyhow::Context as _;
use serde_json::{Value, json};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt as _, AsyncWriteExt as _, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

pub const TEST_API_KEY: &str = "mp-integration-key-93ab";

pub fn server_command(api_url: &str) -> Command {
    let bin = env!("CARGO_BIN_EXE_magic-patterns-mcp");
    let mut cmd = Command::new(bin);
    cmd.arg("--api-url")
        .arg(api_url)
        .arg("--log-level")
        .arg("debug")
        .env("MAGIC_PATTERNS_API_KEY", TEST_API_KEY)
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    cmd
}

/// Minimal MCP client speaking newline-delimited JSON-RPC to a spawned server.
///
/// Exists only for integration tests.
pub struct StdioSession {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

impl StdioSession {
    pub async fn spawn(api_url: &str) -> anyhow::Result<Self> {
        let mut child = server_command(api_url).spawn().context("spawn server")?;
        let stdin = child.stdin.take().context("child stdin")?;
        let stdout = child.stdout.take().context("child stdout")?;

        let mut session = Self {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
        };

        let init = session
            .request(
                0,
                "initialize",
                json!({
                    "protocolVersion": "2024-11-05",
                    "capabilities": {},
                    "clientInfo": { "name": "magic-patterns-mcp-integration-tests", "version": "0" }
                }),
            )
            .await?;
        anyhow::ensure!(init.get("result").is_some(), "initialize failed: {init}");

        session
            .notify("notifications/initialized", json!({}))
            .await?;
        Ok(session)
    }

    pub async fn notify(&mut self, method: &str, params: Value) -> anyhow::Result<()> {
        self.send(&json!({ "jsonrpc": "2.0", "method": method, "params": params }))
            .await
    }

    /// Send a request and wait for the response with the same id, skipping notifications.
    pub async fn request(&mut self, id: u64, method: &str, params: Value) -> anyhow::Result<Value> {
        self.send(&json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params }))
            .await?;

        tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                let line = self
                    .stdout
                    .next_line()
                    .await
                    .context("read server stdout")?
                    .context("server closed stdout")?;
                let msg: Value = serde_json::from_str(&line)
                    .with_context(|| format!("server wrote non-JSON to stdout: {line}"))?;
                if msg.get("id") == Some(&json!(id)) {
                    return Ok(msg);
                }
            }
        })
        .await
        .context("timeout waiting for response")?
    }

    /// Close stdin and collect everything the server logged.
    pub async fn shutdown(mut self) -> anyhow::Result<String> {
        drop(self.stdin);
        let mut stderr = self.child.stderr.take().context("child stderr")?;
        let status = tokio::time::timeout(Duration::from_secs(10), self.child.wait())
            .await
            .context("server did not exit after stdin closed")??;
        anyhow::ensure!(status.success(), "server exited with {status}");

        let mut logs = String::new();
        tokio::io::AsyncReadExt::read_to_string(&mut stderr, &mut logs).await?;
        Ok(logs)
    }

    async fn send(&mut self, msg: &Value) -> anyhow::Result<()> {
        let mut line = serde_json::to_string(msg)?;
        line.push('\n');
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.flush().await?;
        Ok(())
    }
}
