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

#[test]
fn exported_calendar_reimports_with_title_and_minute_intact() {
    let workspace = temp_dir("compass-ics");
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
        "events.create",
        json!({
            "title": "Study Session",
            "start": "2025-01-10T09:00:00Z",
            "location": "Room A-204"
        }),
    );

    let exported = request_ok(&mut stdin, &mut reader, "3", "events.exportIcs", json!({}));
    let ics = exported
        .pointer("/result/ics")
        .and_then(|v| v.as_str())
        .expect("ics text")
        .to_string();
    assert!(ics.starts_with("BEGIN:VCALENDAR"));
    assert!(ics.contains("DTSTART:20250110T090000Z"));
    assert!(ics.contains("DTEND:20250110T100000Z"));
    assert!(ics.contains("SUMMARY:Study Session"));
    assert!(ics.contains("LOCATION:Room A-204"));

    // Import into a different user's calendar and read it back.
    let imported = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "events.importIcs",
        json!({ "userId": "u_other", "ics": ics }),
    );
    assert_eq!(
        imported.pointer("/result/imported").and_then(|v| v.as_u64()),
        Some(1)
    );

    let listed = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "events.list",
        json!({ "userId": "u_other" }),
    );
    let events = listed
        .pointer("/result/events")
        .and_then(|v| v.as_array())
        .expect("events array");
    assert_eq!(events.len(), 1);
    assert_eq!(
        events[0].get("title").and_then(|v| v.as_str()),
        Some("Study Session")
    );
    let start = events[0]
        .get("start")
        .and_then(|v| v.as_str())
        .expect("start");
    assert!(start.starts_with("2025-01-10T09:00"));
    assert_eq!(
        events[0].get("location").and_then(|v| v.as_str()),
        Some("Room A-204")
    );

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn malformed_blocks_are_dropped_and_empty_imports_change_nothing() {
    let workspace = temp_dir("compass-ics-malformed");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    // One complete block, one missing SUMMARY: only the former imports.
    let ics = [
        "BEGIN:VCALENDAR",
        "VERSION:2.0",
        "BEGIN:VEVENT",
        "DTSTART:20250110T090000Z",
        "SUMMARY:Kept",
        "END:VEVENT",
        "BEGIN:VEVENT",
        "DTSTART:20250111T090000Z",
        "END:VEVENT",
        "END:VCALENDAR",
    ]
    .join("\r\n");
    let imported = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "events.importIcs",
        json!({ "ics": ics }),
    );
    assert_eq!(
        imported.pointer("/result/imported").and_then(|v| v.as_u64()),
        Some(1)
    );

    let imported = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "events.importIcs",
        json!({ "ics": "not an ics payload" }),
    );
    assert_eq!(
        imported.pointer("/result/imported").and_then(|v| v.as_u64()),
        Some(0)
    );

    let listed = request_ok(&mut stdin, &mut reader, "4", "events.list", json!({}));
    assert_eq!(
        listed
            .pointer("/result/events")
            .and_then(|v| v.as_array())
            .map(|a| a.len()),
        Some(1)
    );

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
