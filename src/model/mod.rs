pub mod calendar;
pub mod habits;
pub mod notes;
pub mod pomodoro;
pub mod schedule;
pub mod sticky;

use rand::Rng;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_SUFFIX_LEN: usize = 9;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum StoreError {
    #[error("day not found: {0}")]
    DayNotFound(String),
    #[error("task {task} not found in day {day}")]
    TaskNotFound { day: String, task: String },
    #[error("new order for day {0} is not a permutation of its tasks")]
    NotAPermutation(String),
    #[error("template not found: {0}")]
    TemplateNotFound(String),
    #[error("sticky task not found: {0}")]
    StickyNotFound(String),
    #[error("habit not found: {0}")]
    HabitNotFound(String),
    #[error("event not found: {0}")]
    EventNotFound(String),
    #[error("note not found: {0}")]
    NoteNotFound(String),
    #[error("invalid pomodoro settings: {0}")]
    InvalidSettings(String),
}

/// Returns `prefix` followed by a random base36 suffix that `taken` rejects.
pub fn fresh_id<F>(prefix: &str, taken: F) -> String
where
    F: Fn(&str) -> bool,
{
    loop {
        let id = generate_id(prefix);
        if !taken(&id) {
            return id;
        }
    }
}

fn generate_id(prefix: &str) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect();
    format!("{}{}", prefix, suffix)
}

/// Picks the palette entry for the `count`-th item of a collection.
pub fn palette_color(palette: &[&str], count: usize) -> String {
    palette[count % palette.len()].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_id_has_prefix_and_suffix() {
        let id = fresh_id("st-", |_| false);
        assert!(id.starts_with("st-"));
        assert_eq!(id.len(), 3 + ID_SUFFIX_LEN);
        assert!(id[3..]
            .bytes()
            .all(|b| b.is_ascii_digit() || b.is_ascii_lowercase()));
    }

    #[test]
    fn test_fresh_id_skips_taken() {
        let first = fresh_id("id-", |_| false);
        let second = fresh_id("id-", |candidate| candidate == first);
        assert_ne!(first, second);
    }

    #[test]
    fn test_palette_wraps() {
        let palette = ["#111111", "#222222"];
        assert_eq!(palette_color(&palette, 0), "#111111");
        assert_eq!(palette_color(&palette, 3), "#222222");
    }
}
