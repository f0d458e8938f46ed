use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_compassd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn compassd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    assert!(
        value.get("ok").and_then(|v| v.as_bool()) == Some(true),
        "{} failed: {}",
        method,
        value
    );
    value
}

fn ask(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    question: &str,
) -> String {
    let resp = request_ok(stdin, reader, id, "helpdesk.ask", json!({ "question": question }));
    resp.pointer("/result/answer")
        .and_then(|v| v.as_str())
        .expect("answer")
        .to_string()
}

#[test]
fn confident_match_returns_the_kb_answer_verbatim() {
    let workspace = temp_dir("compass-helpdesk");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let answer = ask(&mut stdin, &mut reader, "2", "library hours");
    assert_eq!(
        answer,
        "Library is open 8 AM – 10 PM on weekdays and 9 AM – 6 PM on weekends."
    );

    let answer = ask(&mut stdin, &mut reader, "3", "xyz unrelated");
    assert!(answer.ends_with("Tip: Try rephrasing or open a support ticket in the Tickets tab."));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn transcript_is_seeded_with_the_greeting_and_persists() {
    let workspace = temp_dir("compass-helpdesk-history");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let history = request_ok(&mut stdin, &mut reader, "2", "helpdesk.history", json!({}));
    let messages = history
        .pointer("/result/messages")
        .and_then(|v| v.as_array())
        .expect("messages");
    assert_eq!(messages.len(), 1);
    assert_eq!(
        messages[0].get("role").and_then(|v| v.as_str()),
        Some("assistant")
    );

    let _ = ask(&mut stdin, &mut reader, "3", "fee payment deadline");

    // Greeting, the question, and the answer.
    let history = request_ok(&mut stdin, &mut reader, "4", "helpdesk.history", json!({}));
    let messages = history
        .pointer("/result/messages")
        .and_then(|v| v.as_array())
        .expect("messages");
    assert_eq!(messages.len(), 3);
    assert_eq!(
        messages[1].get("role").and_then(|v| v.as_str()),
        Some("user")
    );
    assert_eq!(
        messages[1].get("text").and_then(|v| v.as_str()),
        Some("fee payment deadline")
    );

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
