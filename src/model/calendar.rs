use crate::model::{fresh_id, palette_color, StoreError};
use chrono::{Datelike, Duration as ChronoDuration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type EventId = String;

pub const EVENT_COLORS: [&str; 6] = ["#114b5f", "#6d1a36", "#4a6741", "#7c5295", "#b8860b", "#2d5a7b"];

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    pub id: EventId,
    pub title: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub time: Option<NaiveTime>,
    pub color: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct CalendarEvents {
    #[serde(default)]
    pub events: Vec<CalendarEvent>,
}

impl CalendarEvents {
    pub fn get(&self, id: &str) -> Option<&CalendarEvent> {
        self.events.iter().find(|e| e.id == id)
    }

    pub fn add_event(&mut self, date: NaiveDate, title: impl Into<String>) -> EventId {
        let id = fresh_id("ev-", |candidate| self.get(candidate).is_some());
        self.events.push(CalendarEvent {
            id: id.clone(),
            title: title.into(),
            date,
            time: None,
            color: palette_color(&EVENT_COLORS, self.events.len()),
        });
        id
    }

    /// Edits title, time or color.
    pub fn update_event<F>(&mut self, id: &str, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut CalendarEvent),
    {
        let event = self
            .events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| StoreError::EventNotFound(id.to_string()))?;
        let (event_id, date) = (event.id.clone(), event.date);
        f(event);
        event.id = event_id;
        event.date = date;
        Ok(())
    }

    pub fn delete_event(&mut self, id: &str) -> Result<(), StoreError> {
        let before = self.events.len();
        self.events.retain(|e| e.id != id);
        if self.events.len() == before {
            return Err(StoreError::EventNotFound(id.to_string()));
        }
        Ok(())
    }

    pub fn events_on(&self, date: NaiveDate) -> Vec<&CalendarEvent> {
        let mut found: Vec<_> = self.events.iter().filter(|e| e.date == date).collect();
        found.sort_by_key(|e| e.time);
        found
    }

    /// Events from `today` through `today + days`, by date then time (untimed first).
    pub fn upcoming(&self, today: NaiveDate, days: i64) -> Vec<&CalendarEvent> {
        let until = today + ChronoDuration::days(days);
        let mut found: Vec<_> = self
            .events
            .iter()
            .filter(|e| e.date >= today && e.date <= until)
            .collect();
        found.sort_by_key(|e| (e.date, e.time));
        found
    }

    /// Event count for every day of a month, days without events included.
    pub fn month_days(&self, year: i32, month: u32) -> BTreeMap<NaiveDate, usize> {
        let mut days = BTreeMap::new();
        let Some(mut cursor) = NaiveDate::from_ymd_opt(year, month, 1) else {
            return days;
        };
        while cursor.month() == month {
            days.insert(cursor, 0);
            match cursor.succ_opt() {
                Some(next) => cursor = next,
                None => break,
            }
        }
        for event in &self.events {
            if let Some(count) = days.get_mut(&event.date) {
                *count += 1;
            }
        }
        days
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn time(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    #[test]
    fn test_add_update_delete() {
        let mut cal = CalendarEvents::default();
        let id = cal.add_event(date("2024-06-01"), "Dentist");
        cal.add_event(date("2024-06-01"), "Lunch");
        assert_eq!(cal.events[1].color, EVENT_COLORS[1]);
        cal.update_event(&id, |e| {
            e.title = "Dentist appt".into();
            e.time = Some(time("14:00"));
            e.date = date("1999-01-01");
        })
        .unwrap();
        let event = cal.get(&id).unwrap();
        assert_eq!(event.title, "Dentist appt");
        assert_eq!(event.date, date("2024-06-01"));
        cal.delete_event(&id).unwrap();
        assert_eq!(cal.delete_event(&id), Err(StoreError::EventNotFound(id.clone())));
    }

    #[test]
    fn test_upcoming_sorted_and_bounded() {
        let mut cal = CalendarEvents::default();
        let late = cal.add_event(date("2024-06-03"), "late");
        let early = cal.add_event(date("2024-06-03"), "early");
        let untimed = cal.add_event(date("2024-06-03"), "untimed");
        cal.add_event(date("2024-05-31"), "past");
        cal.add_event(date("2024-06-20"), "far");
        cal.update_event(&late, |e| e.time = Some(time("18:00"))).unwrap();
        cal.update_event(&early, |e| e.time = Some(time("08:30"))).unwrap();

        let ids: Vec<_> = cal
            .upcoming(date("2024-06-01"), 14)
            .into_iter()
            .map(|e| e.id.clone())
            .collect();
        assert_eq!(ids, vec![untimed, early, late]);
    }

    #[test]
    fn test_month_days_counts() {
        let mut cal = CalendarEvents::default();
        cal.add_event(date("2024-02-29"), "leap");
        cal.add_event(date("2024-02-29"), "leap again");
        cal.add_event(date("2024-03-01"), "march");
        let days = cal.month_days(2024, 2);
        assert_eq!(days.len(), 29);
        assert_eq!(days.get(&date("2024-02-29")), Some(&2));
        assert_eq!(days.get(&date("2024-02-01")), Some(&0));
        assert!(cal.month_days(2024, 13).is_empty());
    }
}
