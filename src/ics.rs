//! Minimal iCalendar interchange: a VCALENDAR/VEVENT subset covering UID,
//! DTSTAMP, DTSTART, DTEND, SUMMARY and optional LOCATION/DESCRIPTION.

use crate::store::EventItem;
use chrono::{DateTime, Duration, NaiveDateTime, SecondsFormat, Utc};
use std::collections::BTreeMap;

const PRODID: &str = "-//Compass//Calendar//EN";

fn fmt_dt(dt: DateTime<Utc>) -> String {
    dt.format("%Y%m%dT%H%M00Z").to_string()
}

fn parse_stamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y%m%dT%H%M%SZ")
        .ok()
        .map(|n| n.and_utc())
}

/// Events with an unparseable start are omitted rather than emitted broken.
/// A missing end defaults to start + 1 hour.
pub fn to_ics(events: &[EventItem]) -> String {
    let mut lines = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        format!("PRODID:{}", PRODID),
    ];
    for e in events {
        let Some(start) = parse_stamp(&e.start) else {
            continue;
        };
        let end = e
            .end
            .as_deref()
            .and_then(parse_stamp)
            .unwrap_or(start + Duration::hours(1));
        lines.push("BEGIN:VEVENT".to_string());
        lines.push(format!("UID:{}@compass", e.id));
        lines.push(format!("DTSTAMP:{}", fmt_dt(Utc::now())));
        lines.push(format!("DTSTART:{}", fmt_dt(start)));
        lines.push(format!("DTEND:{}", fmt_dt(end)));
        lines.push(format!("SUMMARY:{}", e.title.replace('\n', " ")));
        if let Some(loc) = &e.location {
            lines.push(format!("LOCATION:{}", loc));
        }
        if let Some(desc) = &e.description {
            lines.push(format!("DESCRIPTION:{}", desc.replace('\n', " ")));
        }
        lines.push("END:VEVENT".to_string());
    }
    lines.push("END:VCALENDAR".to_string());
    lines.join("\r\n")
}

/// An imported event before it gets an id assigned.
#[derive(Debug, Clone)]
pub struct ParsedEvent {
    pub title: String,
    pub start: String,
    pub end: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
}

/// Line-oriented parse of VEVENT blocks. Every KEY:value pair inside a block
/// is captured; a block yields an event only when both DTSTART and SUMMARY
/// were present. Malformed blocks are dropped whole.
pub fn parse_ics(text: &str) -> Vec<ParsedEvent> {
    let mut events = Vec::new();
    let mut cur: Option<BTreeMap<String, String>> = None;
    for raw in text.lines() {
        let line = raw.trim();
        if line == "BEGIN:VEVENT" {
            cur = Some(BTreeMap::new());
        } else if line == "END:VEVENT" {
            if let Some(fields) = cur.take() {
                if let (Some(start), Some(summary)) = (fields.get("DTSTART"), fields.get("SUMMARY"))
                {
                    events.push(ParsedEvent {
                        title: summary.clone(),
                        start: normalize_stamp(start),
                        end: fields.get("DTEND").map(|v| normalize_stamp(v)),
                        location: fields.get("LOCATION").cloned(),
                        description: fields.get("DESCRIPTION").cloned(),
                    });
                }
            }
        } else if let Some(fields) = cur.as_mut() {
            if let Some((k, v)) = line.split_once(':') {
                fields.insert(k.to_string(), v.to_string());
            }
        }
    }
    events
}

/// Date-time stamps are normalized to RFC 3339; bare dates pass through.
fn normalize_stamp(raw: &str) -> String {
    if raw.contains('T') {
        parse_stamp(raw)
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_else(|| raw.to_string())
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(title: &str, start: &str) -> EventItem {
        EventItem {
            id: "e1".to_string(),
            title: title.to_string(),
            start: start.to_string(),
            end: None,
            location: None,
            description: None,
        }
    }

    #[test]
    fn roundtrip_preserves_title_and_minute() {
        let text = to_ics(&[event("Study Session", "2025-01-10T09:00:00Z")]);
        let parsed = parse_ics(&text);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].title, "Study Session");
        assert!(parsed[0].start.starts_with("2025-01-10T09:00"));
    }

    #[test]
    fn missing_end_defaults_to_one_hour() {
        let text = to_ics(&[event("Lecture", "2025-01-10T16:30:00Z")]);
        assert!(text.contains("DTSTART:20250110T163000Z"));
        assert!(text.contains("DTEND:20250110T173000Z"));
    }

    #[test]
    fn block_without_summary_is_dropped() {
        let text = "BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nDTSTART:20250110T090000Z\r\nEND:VEVENT\r\nEND:VCALENDAR";
        assert!(parse_ics(text).is_empty());
    }

    #[test]
    fn unrecognized_keys_do_not_break_the_block() {
        let text = [
            "BEGIN:VEVENT",
            "X-CUSTOM:ignored",
            "DTSTART:20250110T090000Z",
            "SUMMARY:Exam",
            "LOCATION:Hall B",
            "END:VEVENT",
        ]
        .join("\n");
        let parsed = parse_ics(&text);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].location.as_deref(), Some("Hall B"));
    }
}
