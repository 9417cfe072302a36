use std::{net::TcpListener as StdListener, path::Path, process::Stdio, time::Duration};

use anyhow::{Context, Result, anyhow};
use message_exchange::exchange::{GOOD_BYE, GREETING};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    process::{Child, ChildStdout, Command},
    time::timeout,
};

const READ_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn server_rejects_reserved_port() -> Result<()> {
    let binary = assert_cmd::cargo::cargo_bin!("message_exchange");

    let output = timeout(
        READ_TIMEOUT,
        Command::new(&binary)
            .args(["server", "--port", "80"])
            .stdout(Stdio::null())
            .output(),
    )
    .await??;

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Port 80 not in range 1024-49151."),
        "unexpected stderr: {stderr}"
    );
    Ok(())
}

#[tokio::test]
async fn cli_conversation_end_to_end() -> Result<()> {
    let binary = assert_cmd::cargo::cargo_bin!("message_exchange");
    let port = free_registered_port()?;

    let (mut server, mut server_stdout) = spawn_server(&binary, port).await?;
    wait_for_line(&mut server_stdout, "server listening on").await?;

    // Keep draining so the server never blocks on a full pipe.
    let server_log_task = tokio::spawn(async move {
        let mut buffer = String::new();
        while matches!(server_stdout.read_line(&mut buffer).await, Ok(n) if n > 0) {
            buffer.clear();
        }
    });

    let mut client = Command::new(&binary)
        .args(["client", "--name", "alice", "--server"])
        .arg(format!("127.0.0.1:{port}"))
        .env("RUST_LOG", "warn")
        .env("NO_COLOR", "1")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .context("failed to spawn client")?;

    let mut stdin = client.stdin.take().context("client stdin missing")?;
    stdin.write_all(b"hi\nlistusers\nlogout\n").await?;
    stdin.flush().await?;
    drop(stdin);

    let output = timeout(READ_TIMEOUT, client.wait_with_output()).await??;
    assert!(output.status.success(), "client exited with {}", output.status);

    let stdout = String::from_utf8(output.stdout)?;
    let lines: Vec<_> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec![
            format!("<server> {GREETING}"),
            "<server> TEXT: 'hi'".to_string(),
            "<server> LISTUSERS requested".to_string(),
            format!("<server> {GOOD_BYE}"),
        ]
    );

    let _ = server.kill().await;
    let _ = server.wait().await;
    let _ = server_log_task.await;
    Ok(())
}

fn free_registered_port() -> Result<u16> {
    for port in 20_000..30_000 {
        if StdListener::bind(("127.0.0.1", port)).is_ok() {
            return Ok(port);
        }
    }
    Err(anyhow!("no free port between 20000 and 30000"))
}

async fn spawn_server(binary: &Path, port: u16) -> Result<(Child, BufReader<ChildStdout>)> {
    let mut child = Command::new(&binary)
        .args(["server", "--port"])
        .arg(port.to_string())
        .env("RUST_LOG", "info")
        .env("NO_COLOR", "1")
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .context("failed to spawn server")?;
    let stdout = child.stdout.take().context("server stdout missing")?;
    Ok((child, BufReader::new(stdout)))
}

async fn wait_for_line(reader: &mut BufReader<ChildStdout>, needle: &str) -> Result<()> {
    let mut line = String::new();
    loop {
        line.clear();
        let bytes = timeout(READ_TIMEOUT, reader.read_line(&mut line))
            .await
            .map_err(|_| anyhow!("timed out waiting for '{needle}'"))??;
        if bytes == 0 {
            return Err(anyhow!("server exited before printing '{needle}'"));
        }
        if line.contains(needle) {
            return Ok(());
        }
    }
}
