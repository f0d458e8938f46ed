//! Canned helpdesk Q&A: a fixed knowledge base scored by keyword overlap.

pub struct KbEntry {
    pub question: &'static str,
    pub answer: &'static str,
    pub tags: &'static [&'static str],
}

pub const KB: &[KbEntry] = &[
    KbEntry {
        question: "What are the library hours?",
        answer: "Library is open 8 AM – 10 PM on weekdays and 9 AM – 6 PM on weekends.",
        tags: &["library", "hours"],
    },
    KbEntry {
        question: "How to request bonafide certificate?",
        answer: "Visit the Registrar Office page and submit the online request form. Processing takes 2 working days.",
        tags: &["certificate", "registrar"],
    },
    KbEntry {
        question: "Fee payment deadline",
        answer: "Fees for the current semester are due by the 10th of each month during the fee window.",
        tags: &["fees", "deadline"],
    },
    KbEntry {
        question: "Where is Lab C3?",
        answer: "Lab C3 is located in the Engineering Block, 3rd floor.",
        tags: &["lab", "location"],
    },
];

pub const GREETING: &str = "Hi! I'm CampusGPT. Ask me about deadlines, locations, or rules.";

const LOW_CONFIDENCE_TIP: &str =
    "\nTip: Try rephrasing or open a support ticket in the Tickets tab.";

/// Scores each entry: 3 when the question contains the whole query, 1 per tag
/// found in the query, 0.5 per question word found in the query. The best
/// entry's answer is returned; below a score of 1 the low-confidence tip is
/// appended. Ties keep the earlier entry.
pub fn answer(query: &str) -> String {
    let normalized = query.to_lowercase();
    let mut best = &KB[0];
    let mut score = 0.0f64;
    for item in KB {
        let mut s = 0.0f64;
        if item.question.to_lowercase().contains(&normalized) {
            s += 3.0;
        }
        for tag in item.tags {
            if normalized.contains(tag) {
                s += 1.0;
            }
        }
        let overlap = item
            .question
            .split_whitespace()
            .filter(|w| normalized.contains(&w.to_lowercase()))
            .count();
        s += overlap as f64 * 0.5;
        if s > score {
            score = s;
            best = item;
        }
    }
    if score < 1.0 {
        format!("{}{}", best.answer, LOW_CONFIDENCE_TIP)
    } else {
        best.answer.to_string()
    }
}
