//! Timetable candidate generation over a fixed weekday/hour grid.

use crate::store::TimetableBlock;
use serde::{Deserialize, Serialize};

const BASE_TIMES: [i64; 7] = [9, 10, 11, 12, 14, 15, 16];
const DAYS: [&str; 5] = ["Mon", "Tue", "Wed", "Thu", "Fri"];

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Prefs {
    pub morning: bool,
    pub afternoon: bool,
    pub avoid_gaps: bool,
    pub prioritized: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableOption {
    pub key: &'static str,
    pub label: &'static str,
    pub blocks: Vec<TimetableBlock>,
}

/// Three candidate layouts from one course list: the balanced base placement,
/// a morning/afternoon-packed variant, and a day-rotated spread. Courses walk
/// the weekday cycle; the hour picks walk the base grid forward for morning
/// people and backward otherwise.
pub fn generate_options(courses: &[String], prefs: &Prefs) -> Vec<TimetableOption> {
    let slots: Vec<TimetableBlock> = courses
        .iter()
        .enumerate()
        .map(|(idx, course)| {
            let hour_idx = if prefs.morning {
                idx as i64
            } else {
                BASE_TIMES.len() as i64 - 1 - idx as i64
            };
            TimetableBlock {
                course: course.clone(),
                day: DAYS[idx % DAYS.len()].to_string(),
                time: BASE_TIMES[hour_idx.rem_euclid(BASE_TIMES.len() as i64) as usize],
                duration: 1,
            }
        })
        .collect();

    let packed: Vec<TimetableBlock> = slots
        .iter()
        .enumerate()
        .map(|(i, s)| TimetableBlock {
            time: if prefs.morning {
                9 + (i as i64 % 3)
            } else {
                13 + (i as i64 % 3)
            },
            ..s.clone()
        })
        .collect();

    let rotated: Vec<TimetableBlock> = slots
        .iter()
        .enumerate()
        .map(|(i, s)| TimetableBlock {
            day: DAYS[(i + 2) % DAYS.len()].to_string(),
            ..s.clone()
        })
        .collect();

    vec![
        TimetableOption {
            key: "balanced",
            label: "Option 1 (Balanced)",
            blocks: slots,
        },
        TimetableOption {
            key: "morning",
            label: "Option 2 (Morning Focused)",
            blocks: packed,
        },
        TimetableOption {
            key: "spread",
            label: "Option 3 (Spread)",
            blocks: rotated,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn courses(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn balanced_walks_days_and_hours_forward_for_morning() {
        let prefs = Prefs {
            morning: true,
            ..Default::default()
        };
        let opts = generate_options(&courses(&["DS", "Algo", "DBMS"]), &prefs);
        let blocks = &opts[0].blocks;
        assert_eq!(blocks[0].day, "Mon");
        assert_eq!(blocks[0].time, 9);
        assert_eq!(blocks[1].day, "Tue");
        assert_eq!(blocks[1].time, 10);
        assert_eq!(blocks[2].time, 11);
    }

    #[test]
    fn evening_preference_walks_hours_backward() {
        let opts = generate_options(&courses(&["DS", "Algo"]), &Prefs::default());
        assert_eq!(opts[0].blocks[0].time, 16);
        assert_eq!(opts[0].blocks[1].time, 15);
    }

    #[test]
    fn packed_variant_cycles_three_afternoon_hours() {
        let opts = generate_options(&courses(&["A", "B", "C", "D"]), &Prefs::default());
        let times: Vec<i64> = opts[1].blocks.iter().map(|b| b.time).collect();
        assert_eq!(times, vec![13, 14, 15, 13]);
    }

    #[test]
    fn spread_variant_rotates_days_by_two() {
        let opts = generate_options(&courses(&["A", "B"]), &Prefs::default());
        assert_eq!(opts[2].blocks[0].day, "Wed");
        assert_eq!(opts[2].blocks[1].day, "Thu");
    }

    #[test]
    fn long_course_lists_stay_on_the_grid() {
        let many: Vec<String> = (0..12).map(|i| format!("C{}", i)).collect();
        for opt in generate_options(&many, &Prefs::default()) {
            for b in &opt.blocks {
                assert!((9..=16).contains(&b.time));
                assert!(DAYS.contains(&b.day.as_str()));
            }
        }
    }
}
