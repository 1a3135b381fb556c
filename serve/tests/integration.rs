use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use flate2::read::GzDecoder;

struct TestServer {
    process: Child,
    base: String,
}

impl TestServer {
    fn new(root: &Path, port: u16, extra_args: &[&str]) -> Self {
        let addr = format!("127.0.0.1:{}", port);

        // Start server using the compiled binary (avoids cargo lock issues)
        let bin_path = env!("CARGO_BIN_EXE_serve");

        let process = Command::new(bin_path)
            .arg("-port")
            .arg(&addr)
            .args(extra_args)
            .arg(root)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("Failed to start server");

        Self {
            process,
            base: format!("http://{}", addr),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    fn dump_output(&mut self) {
        if let Some(mut stderr) = self.process.stderr.take() {
            let mut s = String::new();
            stderr.read_to_string(&mut s).unwrap();
            eprintln!("STDERR:\n{}", s);
        }
        if let Some(mut stdout) = self.process.stdout.take() {
            let mut s = String::new();
            stdout.read_to_string(&mut s).unwrap();
            eprintln!("STDOUT:\n{}", s);
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.process.kill();
        let _ = self.process.wait();
    }
}

async fn wait_for_server(server: &mut TestServer) -> bool {
    let client = reqwest::Client::new();
    for _ in 0..50 {
        if let Ok(Some(status)) = server.process.try_wait() {
            eprintln!("Server exited unexpectedly with status: {}", status);
            server.dump_output();
            return false;
        }

        if client.get(server.url("/")).send().await.is_ok() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }

    eprintln!("Timeout waiting for server!");
    let _ = server.process.kill();
    server.dump_output();
    false
}

fn site() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "hello").unwrap();
    std::fs::create_dir(dir.path().join("a")).unwrap();
    std::fs::write(dir.path().join("a").join("b.txt"), "world").unwrap();
    std::fs::write(dir.path().join("empty.txt"), "").unwrap();
    let big = "serve compression test ".repeat(20_000);
    std::fs::write(dir.path().join("big.txt"), big).unwrap();
    dir
}

fn gunzip(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    GzDecoder::new(bytes).read_to_end(&mut out).expect("Failed to decompress");
    out
}

#[tokio::test]
async fn test_static_file_server() {
    let dir = site();
    let mut server = TestServer::new(dir.path(), 19181, &[]);
    assert!(wait_for_server(&mut server).await, "Server failed to start");

    let resp = reqwest::get(server.url("/")).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "hello");

    let resp = reqwest::get(server.url("/index.html")).await.unwrap();
    assert_eq!(resp.text().await.unwrap(), "hello");

    let resp = reqwest::get(server.url("/a/b.txt")).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "world");

    let resp = reqwest::get(server.url("/missing")).await.unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_compression() {
    let dir = site();
    let mut server = TestServer::new(dir.path(), 19182, &["-gzip"]);
    assert!(wait_for_server(&mut server).await, "Server failed to start");

    let client = reqwest::Client::new();

    for (path, file) in [("/", "index.html"), ("/big.txt", "big.txt"), ("/empty.txt", "empty.txt")] {
        let resp = client
            .get(server.url(path))
            .header("Accept-Encoding", "gzip")
            .send()
            .await
            .expect("Failed to send request");

        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers().get("Content-Encoding").unwrap(), "gzip");

        let compressed = resp.bytes().await.expect("Failed to get bytes");
        let expected = std::fs::read(dir.path().join(file)).unwrap();
        assert_eq!(gunzip(&compressed), expected, "{} did not round-trip", path);
    }

    // Without the token the response is not compressed
    let resp = client
        .get(server.url("/a/b.txt"))
        .header("Accept-Encoding", "br")
        .send()
        .await
        .unwrap();
    assert!(resp.headers().get("Content-Encoding").is_none());
    assert_eq!(resp.headers().get("Content-Length").unwrap(), "5");
    assert_eq!(resp.text().await.unwrap(), "world");
}

#[tokio::test]
async fn test_compression_disabled_ignores_accept_encoding() {
    let dir = site();
    let mut server = TestServer::new(dir.path(), 19183, &[]);
    assert!(wait_for_server(&mut server).await, "Server failed to start");

    let resp = reqwest::Client::new()
        .get(server.url("/"))
        .header("Accept-Encoding", "gzip")
        .send()
        .await
        .unwrap();
    assert!(resp.headers().get("Content-Encoding").is_none());
    assert_eq!(resp.text().await.unwrap(), "hello");
}

#[tokio::test]
async fn test_bind_failure_exits_with_error() {
    let dir = site();
    let mut server = TestServer::new(dir.path(), 19184, &[]);
    assert!(wait_for_server(&mut server).await, "Server failed to start");

    let output = Command::new(env!("CARGO_BIN_EXE_serve"))
        .args(["-port", "127.0.0.1:19184"])
        .arg(dir.path())
        .output()
        .expect("Failed to run second server");

    assert!(!output.status.success());
    let logs = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(logs.contains("Failed to bind 127.0.0.1:19184"), "logs: {}", logs);
}

#[test]
fn test_help_exits_cleanly() {
    for flag in ["-h", "-help", "--help"] {
        let output = Command::new(env!("CARGO_BIN_EXE_serve"))
            .arg(flag)
            .output()
            .expect("Failed to run serve");
        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("Usage: serve"), "help output: {}", stdout);
        assert!(stdout.contains("--gzip"));
    }
}

#[tokio::test]
async fn test_log_flag_reports_resolved_paths() {
    let dir = site();
    let mut server = TestServer::new(dir.path(), 19186, &["-log"]);
    assert!(wait_for_server(&mut server).await, "Server failed to start");

    let resp = reqwest::get(server.url("/a/b.txt")).await.unwrap();
    assert_eq!(resp.status(), 200);

    server.process.kill().unwrap();
    server.process.wait().unwrap();
    let mut stdout = String::new();
    server
        .process
        .stdout
        .take()
        .unwrap()
        .read_to_string(&mut stdout)
        .unwrap();

    // wait_for_server requests "/" before anything else
    let root_line = stdout
        .lines()
        .find(|line| line.contains("URL / ->"))
        .unwrap_or_else(|| panic!("no request line for /: {}", stdout));
    assert!(root_line.contains("index.html"), "line: {}", root_line);

    let file_line = stdout
        .lines()
        .find(|line| line.contains("URL /a/b.txt ->"))
        .unwrap_or_else(|| panic!("no request line for /a/b.txt: {}", stdout));
    assert!(file_line.contains("b.txt"), "line: {}", file_line);
}

#[cfg(unix)]
async fn assert_signal_terminates(signal: &str, port: u16) {
    let dir = site();
    let mut server = TestServer::new(dir.path(), port, &[]);
    assert!(wait_for_server(&mut server).await, "Server failed to start");

    let status = Command::new("kill")
        .args([signal, &server.process.id().to_string()])
        .status()
        .expect("Failed to send signal");
    assert!(status.success());

    let mut exit = None;
    for _ in 0..50 {
        if let Ok(Some(status)) = server.process.try_wait() {
            exit = Some(status);
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    let exit = exit.unwrap_or_else(|| panic!("Server did not exit after kill {}", signal));
    assert_eq!(exit.code(), Some(0));

    assert!(reqwest::get(server.url("/")).await.is_err());
}

#[cfg(unix)]
#[tokio::test]
async fn test_interrupt_terminates_process() {
    assert_signal_terminates("-INT", 19185).await;
}

#[cfg(unix)]
#[tokio::test]
async fn test_terminate_signal_terminates_process() {
    assert_signal_terminates("-TERM", 19187).await;
}
