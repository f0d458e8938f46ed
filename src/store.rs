//! The local record store: every collection is an independently namespaced
//! JSON sequence under a string key, read and written wholesale. Reads fall
//! back to a caller-supplied value on missing or malformed content and never
//! error; writes replace the entire collection.

use crate::db;
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

pub fn read_collection<T: DeserializeOwned>(conn: &Connection, key: &str, fallback: T) -> T {
    match db::kv_get(conn, key) {
        Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or(fallback),
        Ok(None) => fallback,
        Err(e) => {
            tracing::warn!(key, error = %e, "collection read failed, using fallback");
            fallback
        }
    }
}

pub fn write_collection<T: Serialize + ?Sized>(
    conn: &Connection,
    key: &str,
    value: &T,
) -> anyhow::Result<()> {
    db::kv_put(conn, key, &serde_json::to_string(value)?)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dept {
    #[serde(rename = "Computer Science")]
    ComputerScience,
    #[serde(rename = "Electronics & Communication")]
    ElectronicsCommunication,
    #[serde(rename = "Mechanical Engineering")]
    MechanicalEngineering,
}

impl Dept {
    pub fn as_str(self) -> &'static str {
        match self {
            Dept::ComputerScience => "Computer Science",
            Dept::ElectronicsCommunication => "Electronics & Communication",
            Dept::MechanicalEngineering => "Mechanical Engineering",
        }
    }

    pub fn parse(s: &str) -> Option<Dept> {
        match s {
            "Computer Science" => Some(Dept::ComputerScience),
            "Electronics & Communication" => Some(Dept::ElectronicsCommunication),
            "Mechanical Engineering" => Some(Dept::MechanicalEngineering),
            _ => None,
        }
    }
}

impl fmt::Display for Dept {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Year {
    First,
    Second,
    Third,
    Fourth,
}

impl Year {
    pub fn as_str(self) -> &'static str {
        match self {
            Year::First => "First",
            Year::Second => "Second",
            Year::Third => "Third",
            Year::Fourth => "Fourth",
        }
    }

    pub fn parse(s: &str) -> Option<Year> {
        match s {
            "First" => Some(Year::First),
            "Second" => Some(Year::Second),
            "Third" => Some(Year::Third),
            "Fourth" => Some(Year::Fourth),
            _ => None,
        }
    }

    /// The two semesters taught in each year of the program.
    pub fn semesters(self) -> [&'static str; 2] {
        match self {
            Year::First => ["Sem 1", "Sem 2"],
            Year::Second => ["Sem 3", "Sem 4"],
            Year::Third => ["Sem 5", "Sem 6"],
            Year::Fourth => ["Sem 7", "Sem 8"],
        }
    }
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composite key identifying a (department, year, semester) partition of
/// student and attendance data. Distinct tuples map to distinct strings: the
/// separator never occurs in the enumerated domain values.
pub fn scope_key(dept: Dept, year: Year, semester: &str) -> String {
    format!("{}::{}::{}", dept, year, semester)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub roll_no: String,
    pub name: String,
    pub year: Year,
    pub semester: String,
    pub department: Dept,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRow {
    pub roll_no: String,
    pub name: String,
    pub present: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medical_leave: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub scope: String,
    pub date: String,
    pub subject: String,
    pub rows: Vec<AttendanceRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableBlock {
    pub course: String,
    pub day: String,
    pub time: i64,
    pub duration: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: String,
    pub company: String,
    pub title: String,
    pub date: String,
    pub status: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Todo,
    Doing,
    Done,
}

impl TaskStatus {
    /// Step along the todo → doing → done ladder, clamped at both ends.
    pub fn shifted(self, dir: i64) -> TaskStatus {
        const ORDER: [TaskStatus; 3] = [TaskStatus::Todo, TaskStatus::Doing, TaskStatus::Done];
        let idx = ORDER.iter().position(|s| *s == self).unwrap_or(0) as i64;
        let next = (idx + dir).clamp(0, ORDER.len() as i64 - 1);
        ORDER[next as usize]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub title: String,
    pub content: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventItem {
    pub id: String,
    pub title: String,
    pub start: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub resource_id: String,
    pub title: String,
    pub start: String,
    pub end: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketKind {
    Sale,
    Lost,
    Found,
}

impl MarketKind {
    pub fn parse(s: &str) -> Option<MarketKind> {
        match s {
            "sale" => Some(MarketKind::Sale),
            "lost" => Some(MarketKind::Lost),
            "found" => Some(MarketKind::Found),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: MarketKind,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub user_id: String,
    pub date: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    InProgress,
    Resolved,
}

impl TicketStatus {
    pub fn parse(s: &str) -> Option<TicketStatus> {
        match s {
            "open" => Some(TicketStatus::Open),
            "in_progress" => Some(TicketStatus::InProgress),
            "resolved" => Some(TicketStatus::Resolved),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: String,
    pub user_id: String,
    pub category: String,
    pub subject: String,
    pub body: String,
    pub status: TicketStatus,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dept: Option<Dept>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<Year>,
}

impl BroadcastFilter {
    /// A broadcast reaches a reader when every field the sender pinned down
    /// matches; an absent field matches everyone.
    pub fn matches(&self, dept: Option<Dept>, year: Option<Year>) -> bool {
        let dept_ok = match self.dept {
            Some(d) => dept == Some(d),
            None => true,
        };
        let year_ok = match self.year {
            Some(y) => year == Some(y),
            None => true,
        };
        dept_ok && year_ok
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Broadcast {
    pub id: String,
    pub title: String,
    pub body: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<BroadcastFilter>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Faculty,
    Admin,
    Alumni,
}

impl Role {
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "student" => Some(Role::Student),
            "faculty" => Some(Role::Faculty),
            "admin" => Some(Role::Admin),
            "alumni" => Some(Role::Alumni),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<Dept>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<Year>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeEntry {
    pub roll_no: String,
    pub assignment: String,
    pub score: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

// Collection accessors. Each pair is a whole-collection read and a wholesale
// replace; mutations are read-modify-write in the handlers.

pub fn students(conn: &Connection, scope: &str) -> Vec<Student> {
    read_collection(conn, &format!("students:{}", scope), Vec::new())
}

pub fn save_students(conn: &Connection, scope: &str, list: &[Student]) -> anyhow::Result<()> {
    write_collection(conn, &format!("students:{}", scope), list)
}

pub fn attendance(conn: &Connection, scope: &str) -> Vec<AttendanceRecord> {
    read_collection(conn, &format!("attendance:{}", scope), Vec::new())
}

pub fn append_attendance(conn: &Connection, record: AttendanceRecord) -> anyhow::Result<()> {
    let key = format!("attendance:{}", record.scope);
    let mut list: Vec<AttendanceRecord> = read_collection(conn, &key, Vec::new());
    list.push(record);
    write_collection(conn, &key, &list)
}

pub fn timetable(conn: &Connection, user_id: &str) -> Vec<TimetableBlock> {
    read_collection(conn, &format!("timetable:{}", user_id), Vec::new())
}

pub fn save_timetable(
    conn: &Connection,
    user_id: &str,
    blocks: &[TimetableBlock],
) -> anyhow::Result<()> {
    write_collection(conn, &format!("timetable:{}", user_id), blocks)
}

pub fn applications(conn: &Connection, user_id: &str) -> Vec<Application> {
    read_collection(conn, &format!("apps:{}", user_id), Vec::new())
}

/// Returns false (and leaves the collection untouched) when an application
/// with the same id already exists.
pub fn add_application(conn: &Connection, user_id: &str, app: Application) -> anyhow::Result<bool> {
    let key = format!("apps:{}", user_id);
    let mut list: Vec<Application> = read_collection(conn, &key, Vec::new());
    if list.iter().any(|a| a.id == app.id) {
        return Ok(false);
    }
    list.push(app);
    write_collection(conn, &key, &list)?;
    Ok(true)
}

pub fn tasks(conn: &Connection, user_id: &str) -> Vec<Task> {
    read_collection(conn, &format!("tasks:{}", user_id), Vec::new())
}

pub fn save_tasks(conn: &Connection, user_id: &str, list: &[Task]) -> anyhow::Result<()> {
    write_collection(conn, &format!("tasks:{}", user_id), list)
}

pub fn notes(conn: &Connection, user_id: &str) -> Vec<Note> {
    read_collection(conn, &format!("notes:{}", user_id), Vec::new())
}

pub fn save_notes(conn: &Connection, user_id: &str, list: &[Note]) -> anyhow::Result<()> {
    write_collection(conn, &format!("notes:{}", user_id), list)
}

pub fn events(conn: &Connection, user_id: &str) -> Vec<EventItem> {
    read_collection(conn, &format!("events:{}", user_id), Vec::new())
}

pub fn save_events(conn: &Connection, user_id: &str, list: &[EventItem]) -> anyhow::Result<()> {
    write_collection(conn, &format!("events:{}", user_id), list)
}

pub fn bookings(conn: &Connection, resource_id: &str) -> Vec<Booking> {
    read_collection(conn, &format!("bookings:{}", resource_id), Vec::new())
}

pub fn save_bookings(conn: &Connection, resource_id: &str, list: &[Booking]) -> anyhow::Result<()> {
    write_collection(conn, &format!("bookings:{}", resource_id), list)
}

pub fn market(conn: &Connection) -> Vec<MarketItem> {
    read_collection(conn, "market", Vec::new())
}

pub fn save_market(conn: &Connection, list: &[MarketItem]) -> anyhow::Result<()> {
    write_collection(conn, "market", list)
}

pub fn tickets(conn: &Connection) -> Vec<Ticket> {
    read_collection(conn, "tickets", Vec::new())
}

pub fn save_tickets(conn: &Connection, list: &[Ticket]) -> anyhow::Result<()> {
    write_collection(conn, "tickets", list)
}

pub fn broadcasts(conn: &Connection) -> Vec<Broadcast> {
    read_collection(conn, "broadcasts", Vec::new())
}

/// Broadcasts are kept newest first.
pub fn add_broadcast(conn: &Connection, broadcast: Broadcast) -> anyhow::Result<()> {
    let mut list = broadcasts(conn);
    list.insert(0, broadcast);
    write_collection(conn, "broadcasts", &list)
}

fn default_users() -> Vec<User> {
    vec![
        User {
            id: "u_001".to_string(),
            name: "Alex Johnson".to_string(),
            role: Role::Student,
            department: Some(Dept::ComputerScience),
            year: Some(Year::Second),
        },
        User {
            id: "u_002".to_string(),
            name: "Priya Sharma".to_string(),
            role: Role::Faculty,
            department: Some(Dept::ComputerScience),
            year: None,
        },
        User {
            id: "u_003".to_string(),
            name: "Campus Admin".to_string(),
            role: Role::Admin,
            department: None,
            year: None,
        },
    ]
}

/// The user directory is the one collection seeded on first read.
pub fn users(conn: &Connection) -> Vec<User> {
    let seeded = default_users();
    match db::kv_get(conn, "users") {
        Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or(seeded),
        _ => {
            let _ = write_collection(conn, "users", &seeded);
            seeded
        }
    }
}

pub fn save_users(conn: &Connection, list: &[User]) -> anyhow::Result<()> {
    write_collection(conn, "users", list)
}

pub fn grades(conn: &Connection, course_id: &str) -> Vec<GradeEntry> {
    read_collection(conn, &format!("grades:{}", course_id), Vec::new())
}

pub fn save_grades(conn: &Connection, course_id: &str, list: &[GradeEntry]) -> anyhow::Result<()> {
    write_collection(conn, &format!("grades:{}", course_id), list)
}

pub fn helpdesk_history(conn: &Connection, user_id: &str) -> Vec<ChatMessage> {
    read_collection(conn, &format!("helpdesk:{}", user_id), Vec::new())
}

pub fn save_helpdesk_history(
    conn: &Connection,
    user_id: &str,
    list: &[ChatMessage],
) -> anyhow::Result<()> {
    write_collection(conn, &format!("helpdesk:{}", user_id), list)
}

pub fn default_session() -> User {
    User {
        id: "u_001".to_string(),
        name: "Alex Johnson".to_string(),
        role: Role::Student,
        department: Some(Dept::ComputerScience),
        year: Some(Year::Second),
    }
}

pub fn session(conn: &Connection) -> User {
    read_collection(conn, "session", default_session())
}

pub fn save_session(conn: &Connection, user: &User) -> anyhow::Result<()> {
    write_collection(conn, "session", user)
}
