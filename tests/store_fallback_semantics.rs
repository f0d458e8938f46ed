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

fn task_count(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
) -> usize {
    let listed = request_ok(stdin, reader, id, "tasks.list", json!({}));
    listed
        .pointer("/result/tasks")
        .and_then(|v| v.as_array())
        .map(|a| a.len())
        .expect("tasks array")
}

#[test]
fn corrupt_collection_value_reads_as_empty_not_error() {
    let workspace = temp_dir("compass-fallback");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "tasks.create",
        json!({ "title": "Will be corrupted" }),
    );
    assert_eq!(task_count(&mut stdin, &mut reader, "3"), 1);

    // Corrupt the stored JSON behind the daemon's back.
    let db = rusqlite::Connection::open(workspace.join("compass.sqlite3")).expect("open db");
    db.execute(
        "UPDATE collections SET value = '{not valid json' WHERE key = 'tasks:u_001'",
        [],
    )
    .expect("corrupt value");
    drop(db);

    // The read must not fail; the collection simply reads as empty.
    assert_eq!(task_count(&mut stdin, &mut reader, "4"), 0);

    // And a fresh write replaces the corrupt value outright.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "tasks.create",
        json!({ "title": "Clean again" }),
    );
    assert_eq!(task_count(&mut stdin, &mut reader, "6"), 1);

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn collections_are_namespaced_per_user() {
    let workspace = temp_dir("compass-namespacing");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "notes.create",
        json!({ "userId": "u_a" }),
    );
    let listed = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "notes.list",
        json!({ "userId": "u_b" }),
    );
    assert_eq!(
        listed
            .pointer("/result/notes")
            .and_then(|v| v.as_array())
            .map(|a| a.len()),
        Some(0)
    );

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
