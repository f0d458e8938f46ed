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
fn generate_offers_three_options_and_saved_timetables_replace_wholesale() {
    let workspace = temp_dir("compass-timetable");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let generated = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "timetable.generate",
        json!({
            "courses": ["Data Structures", "Algorithms", "DBMS"],
            "prefs": { "morning": true }
        }),
    );
    let options = generated
        .pointer("/result/options")
        .and_then(|v| v.as_array())
        .expect("options");
    assert_eq!(options.len(), 3);
    let keys: Vec<&str> = options
        .iter()
        .filter_map(|o| o.get("key").and_then(|v| v.as_str()))
        .collect();
    assert_eq!(keys, vec!["balanced", "morning", "spread"]);
    let balanced = options[0]
        .get("blocks")
        .and_then(|v| v.as_array())
        .expect("blocks");
    assert_eq!(balanced.len(), 3);
    assert_eq!(balanced[0].get("day").and_then(|v| v.as_str()), Some("Mon"));
    assert_eq!(balanced[0].get("time").and_then(|v| v.as_i64()), Some(9));

    // Register the balanced option, then replace it with a single block.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "timetable.set",
        json!({ "blocks": balanced }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "timetable.set",
        json!({ "blocks": [{ "course": "OS", "day": "Fri", "time": 14, "duration": 1 }] }),
    );
    let fetched = request_ok(&mut stdin, &mut reader, "5", "timetable.get", json!({}));
    let blocks = fetched
        .pointer("/result/blocks")
        .and_then(|v| v.as_array())
        .expect("blocks");
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].get("course").and_then(|v| v.as_str()), Some("OS"));

    let semesters = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "timetable.semesters",
        json!({ "year": "Fourth" }),
    );
    assert_eq!(
        semesters.pointer("/result/semesters"),
        Some(&json!(["Sem 7", "Sem 8"]))
    );

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn study_group_suggestions_follow_the_timetable_and_invites_book_the_library() {
    let workspace = temp_dir("compass-studygroups");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    // No timetable and no topic: nobody matches.
    let empty = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "studygroups.suggest",
        json!({}),
    );
    assert_eq!(
        empty
            .pointer("/result/peers")
            .and_then(|v| v.as_array())
            .map(|a| a.len()),
        Some(0)
    );

    // A timetable with DBMS attracts the peer looking for DBMS.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "timetable.set",
        json!({ "blocks": [{ "course": "DBMS", "day": "Mon", "time": 9, "duration": 1 }] }),
    );
    let suggested = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "studygroups.suggest",
        json!({}),
    );
    let peers = suggested
        .pointer("/result/peers")
        .and_then(|v| v.as_array())
        .expect("peers");
    assert_eq!(peers.len(), 1);
    assert_eq!(
        peers[0].get("name").and_then(|v| v.as_str()),
        Some("Samiksha Patel")
    );

    // A topic mentioning OS pulls in the OS-seeking peer too.
    let suggested = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "studygroups.suggest",
        json!({ "topic": "OS scheduling basics" }),
    );
    assert_eq!(
        suggested
            .pointer("/result/peers")
            .and_then(|v| v.as_array())
            .map(|a| a.len()),
        Some(2)
    );

    let invited = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "studygroups.invite",
        json!({ "peerId": "p1", "topic": "DBMS ER Modelling" }),
    );
    assert_eq!(
        invited.pointer("/result/event/title").and_then(|v| v.as_str()),
        Some("Study Group: DBMS ER Modelling with Samiksha Patel")
    );
    assert_eq!(
        invited
            .pointer("/result/event/location")
            .and_then(|v| v.as_str()),
        Some("Library A-204")
    );

    let events = request_ok(&mut stdin, &mut reader, "7", "events.list", json!({}));
    assert_eq!(
        events
            .pointer("/result/events")
            .and_then(|v| v.as_array())
            .map(|a| a.len()),
        Some(1)
    );

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
