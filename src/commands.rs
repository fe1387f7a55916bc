use crate::cli::{
    DayCommand, EventCommand, HabitCommand, ModeArg, NoteCommand, PomodoroCommand, PriorityArg,
    SettingsArgs, StickyCommand, TaskCommand, TemplateCommand,
};
use crate::config::Config;
use crate::drag::columnar::array_move;
use crate::drag::freeform::clamp_size;
use crate::model::calendar::{CalendarEvent, CalendarEvents};
use crate::model::habits::{best_streak, current_streak, Habit, Habits};
use crate::model::notes::Notes;
use crate::model::pomodoro::{format_clock, Pomodoro, TimerMode};
use crate::model::schedule::{Day, Filter, Priority, Schedule, Task};
use crate::model::sticky::TaskBoard;
use crate::storage::{
    init_project_workspace, load_store, locate_workspace, save_store, Workspace,
};
use crate::ui;
use anyhow::{anyhow, bail, Context, Result};
use chrono::{Datelike, Duration as ChronoDuration, Local, NaiveDate, NaiveTime};
use std::env;
use std::io::{self, Write};
use std::thread;
use std::time::Duration;

const UPCOMING_DAYS: i64 = 14;
const HABIT_WEEK: i64 = 7;

pub fn init() -> Result<()> {
    let workspace = init_project_workspace()?;
    println!("Initialized workspace at {}", workspace.dir.display());
    Ok(())
}

pub fn open() -> Result<(Workspace, Config)> {
    let cwd = env::current_dir()?;
    let workspace = locate_workspace(&cwd)?;
    let config = Config::load(&workspace.dir)?;
    Ok((workspace, config))
}

pub fn show_config(workspace: &Workspace, config: &Config) -> Result<()> {
    println!("# {} ({})", workspace.dir.display(), workspace.scope.label());
    print!("{}", serde_yaml::to_string(config).context("serializing config")?);
    Ok(())
}

pub fn tui(workspace: Workspace, config: Config) -> Result<()> {
    ui::run(workspace, config)
}

pub fn dashboard(workspace: &Workspace, config: &Config) -> Result<()> {
    let today = today();
    let board: TaskBoard = load_store(workspace, config)?;
    let habits: Habits = load_store(workspace, config)?;
    let pomodoro: Pomodoro = load_store(workspace, config)?;
    let calendar: CalendarEvents = load_store(workspace, config)?;
    let notes: Notes = load_store(workspace, config)?;

    println!("{} ({})", today.format("%A, %-d %B %Y"), workspace.scope.label());
    println!(
        "Tasks: {}/{} completed",
        board.completed_count(),
        board.tasks.len()
    );
    for task in board.tasks.iter().filter(|t| !t.completed) {
        println!("  [ ] {}", display_title(&task.title));
    }
    println!("Habits: {}/{} done today", habits.done_on(today), habits.habits.len());
    for habit in &habits.habits {
        println!(
            "  [{}] {} (streak {})",
            if habit.done_on(today) { "x" } else { " " },
            habit.name,
            current_streak(habit, today, config.habits.streak_lookback_days)
        );
    }
    println!(
        "Focus: {} min in {} session(s)",
        pomodoro.focus_minutes_on(today),
        pomodoro.sessions_on(today).count()
    );
    let upcoming = calendar.upcoming(today, UPCOMING_DAYS);
    println!("Upcoming events: {}", upcoming.len());
    for event in upcoming {
        print_event(event, today);
    }
    println!("Notes: {}", notes.notes.len());
    Ok(())
}

pub fn day(workspace: &Workspace, config: &Config, command: DayCommand) -> Result<()> {
    let mut schedule: Schedule = load_store(workspace, config)?;
    match command {
        DayCommand::Add => {
            let id = schedule.add_day(today());
            save_store(workspace, &schedule)?;
            if let Some(day) = schedule.day(&id) {
                println!("Added day {} ({} {})", id, day.title, day.display_date());
            }
        }
        DayCommand::List { today: only_today } => {
            if only_today {
                schedule.set_filter(Filter::Today);
            }
            println!("{}", schedule.title);
            let days = schedule.visible_days(today());
            if days.is_empty() {
                println!("  (no days)");
            }
            for day in days {
                print_day(day);
            }
        }
        DayCommand::Edit {
            day_id,
            title,
            date,
            budget,
        } => {
            let date = date.as_deref().map(parse_date).transpose()?;
            schedule
                .update_day(&day_id, |day| {
                    if let Some(t) = title {
                        day.title = t;
                    }
                    if let Some(d) = date {
                        day.date = d;
                    }
                    if let Some(b) = budget {
                        day.time_budget = b;
                    }
                })
                .with_context(|| format!("editing day {}", day_id))?;
            save_store(workspace, &schedule)?;
            println!("Updated day {}", day_id);
        }
        DayCommand::Delete { day_id } => {
            schedule
                .delete_day(&day_id)
                .with_context(|| format!("deleting day {}", day_id))?;
            save_store(workspace, &schedule)?;
            println!("Deleted day {}", day_id);
        }
        DayCommand::Title { title } => {
            schedule.set_title(title);
            save_store(workspace, &schedule)?;
            println!("Renamed schedule to {}", schedule.title);
        }
        DayCommand::Reset => {
            schedule.reset();
            save_store(workspace, &schedule)?;
            println!("Schedule reset");
        }
    }
    Ok(())
}

pub fn task(workspace: &Workspace, config: &Config, command: TaskCommand) -> Result<()> {
    let mut schedule: Schedule = load_store(workspace, config)?;
    let message = match command {
        TaskCommand::Add {
            day_id,
            title,
            priority,
            labels,
            details,
        } => {
            let id = schedule
                .add_task(&day_id, title)
                .with_context(|| format!("adding task to day {}", day_id))?;
            schedule.update_task(&day_id, &id, |t| {
                t.priority = priority.map(Priority::from).unwrap_or_default();
                t.labels = labels.into_iter().collect();
                t.details = details;
            })?;
            format!("Added task {} to {}", id, day_id)
        }
        TaskCommand::Edit {
            day_id,
            task_id,
            title,
            priority,
            toggle_labels,
            details,
        } => {
            schedule
                .update_task(&day_id, &task_id, |t| {
                    if let Some(title) = title {
                        t.title = title;
                    }
                    if let Some(p) = priority {
                        t.priority = p.into();
                    }
                    if !details.is_empty() {
                        t.details = details;
                    }
                })
                .with_context(|| format!("editing task {}", task_id))?;
            for label in &toggle_labels {
                schedule.toggle_label(&day_id, &task_id, label)?;
            }
            format!("Updated task {}", task_id)
        }
        TaskCommand::Done {
            day_id,
            task_id,
            undo,
        } => {
            schedule
                .toggle_task(&day_id, &task_id, !undo)
                .with_context(|| format!("updating task {}", task_id))?;
            format!("Marked {} {}", task_id, if undo { "not done" } else { "done" })
        }
        TaskCommand::Delete { day_id, task_id } => {
            schedule
                .delete_task(&day_id, &task_id)
                .with_context(|| format!("deleting task {}", task_id))?;
            format!("Deleted task {}", task_id)
        }
        TaskCommand::Move {
            task_id,
            target_day_id,
        } => {
            let source = schedule
                .find_task_day(&task_id)
                .map(str::to_string)
                .ok_or_else(|| anyhow!("task {} not found", task_id))?;
            schedule
                .move_task(&task_id, &source, &target_day_id)
                .with_context(|| format!("moving task {} to {}", task_id, target_day_id))?;
            format!("Moved task {} to {}", task_id, target_day_id)
        }
        TaskCommand::Reorder { day_id, from, to } => {
            let tasks = schedule
                .day(&day_id)
                .map(|d| d.tasks.clone())
                .ok_or_else(|| anyhow!("day {} not found", day_id))?;
            if from == 0 || to == 0 || from > tasks.len() || to > tasks.len() {
                bail!("positions must be between 1 and {}", tasks.len());
            }
            schedule.reorder_tasks(&day_id, array_move(tasks, from - 1, to - 1))?;
            format!("Moved position {} to {} in {}", from, to, day_id)
        }
    };
    save_store(workspace, &schedule)?;
    println!("{}", message);
    Ok(())
}

pub fn template(workspace: &Workspace, config: &Config, command: TemplateCommand) -> Result<()> {
    let mut schedule: Schedule = load_store(workspace, config)?;
    match command {
        TemplateCommand::Save { day_id, name } => {
            let id = schedule
                .save_as_template(&day_id, name)
                .with_context(|| format!("saving template from {}", day_id))?;
            save_store(workspace, &schedule)?;
            println!("Saved template {}", id);
        }
        TemplateCommand::Apply {
            day_id,
            template_id,
        } => {
            let added = schedule.apply_template(&day_id, &template_id)?;
            save_store(workspace, &schedule)?;
            println!("Added {} task(s) to {}", added, day_id);
        }
        TemplateCommand::List => {
            if schedule.templates.is_empty() {
                println!("(no templates)");
            }
            for tpl in &schedule.templates {
                println!("{}: {} ({} tasks)", tpl.id, tpl.name, tpl.tasks.len());
                for t in &tpl.tasks {
                    println!("  - {}", display_title(&t.title));
                }
            }
        }
        TemplateCommand::Delete { template_id } => {
            schedule.delete_template(&template_id)?;
            save_store(workspace, &schedule)?;
            println!("Deleted template {}", template_id);
        }
    }
    Ok(())
}

pub fn sticky(workspace: &Workspace, config: &Config, command: StickyCommand) -> Result<()> {
    let mut board: TaskBoard = load_store(workspace, config)?;
    let message = match command {
        StickyCommand::Add { title } => {
            let id = board.add_task(title, &config.board);
            format!("Added sticky {}", id)
        }
        StickyCommand::List => {
            if board.tasks.is_empty() {
                println!("(empty board)");
            }
            for t in &board.tasks {
                let (w, h) = t.effective_size(&config.board);
                println!(
                    "[{}] {}: {} @ ({}, {}) {}x{} {}",
                    if t.completed { "x" } else { " " },
                    t.id,
                    display_title(&t.title),
                    t.x,
                    t.y,
                    w,
                    h,
                    t.color
                );
            }
            return Ok(());
        }
        StickyCommand::Edit {
            sticky_id,
            title,
            color,
            done,
            undo,
        } => {
            board
                .update_task(&sticky_id, |t| {
                    if let Some(title) = title {
                        t.title = title;
                    }
                    if let Some(c) = color {
                        t.color = c;
                    }
                    if done {
                        t.completed = true;
                    }
                    if undo {
                        t.completed = false;
                    }
                })
                .with_context(|| format!("editing sticky {}", sticky_id))?;
            format!("Updated sticky {}", sticky_id)
        }
        StickyCommand::Move { sticky_id, x, y } => {
            if x < 0 || y < 0 {
                bail!("coordinates must not be negative");
            }
            board.move_task(&sticky_id, x, y)?;
            format!("Moved sticky {} to ({}, {})", sticky_id, x, y)
        }
        StickyCommand::Resize {
            sticky_id,
            width,
            height,
        } => {
            let (w, h) = clamp_size((width, height), (0, 0), &config.board);
            board.resize_task(&sticky_id, w, h)?;
            format!("Resized sticky {} to {}x{}", sticky_id, w, h)
        }
        StickyCommand::Delete { sticky_id } => {
            board.delete_task(&sticky_id)?;
            format!("Deleted sticky {}", sticky_id)
        }
        StickyCommand::ClearCompleted => {
            let removed = board.clear_completed();
            format!("Removed {} completed sticky note(s)", removed)
        }
    };
    save_store(workspace, &board)?;
    println!("{}", message);
    Ok(())
}

pub fn habit(workspace: &Workspace, config: &Config, command: HabitCommand) -> Result<()> {
    let mut habits: Habits = load_store(workspace, config)?;
    let message = match command {
        HabitCommand::Add { name, color } => {
            let id = habits.add_habit(name, color);
            format!("Added habit {}", id)
        }
        HabitCommand::List => {
            let today = today();
            if habits.habits.is_empty() {
                println!("(no habits)");
            }
            for habit in &habits.habits {
                print_habit(habit, today, config.habits.streak_lookback_days);
            }
            return Ok(());
        }
        HabitCommand::Toggle { habit_id, date } => {
            let date = match date {
                Some(raw) => parse_date(&raw)?,
                None => today(),
            };
            let done = habits
                .toggle_completion(&habit_id, date)
                .with_context(|| format!("toggling habit {}", habit_id))?;
            format!(
                "{} {} on {}",
                habit_id,
                if done { "done" } else { "not done" },
                date
            )
        }
        HabitCommand::Edit {
            habit_id,
            name,
            color,
        } => {
            habits.update_habit(&habit_id, |h| {
                if let Some(n) = name {
                    h.name = n;
                }
                if let Some(c) = color {
                    h.color = c;
                }
            })?;
            format!("Updated habit {}", habit_id)
        }
        HabitCommand::Delete { habit_id } => {
            habits.delete_habit(&habit_id)?;
            format!("Deleted habit {}", habit_id)
        }
    };
    save_store(workspace, &habits)?;
    println!("{}", message);
    Ok(())
}

pub fn event(workspace: &Workspace, config: &Config, command: EventCommand) -> Result<()> {
    let mut calendar: CalendarEvents = load_store(workspace, config)?;
    let message = match command {
        EventCommand::Add { date, title, time } => {
            let date = parse_date(&date)?;
            let time = time.as_deref().map(parse_time).transpose()?;
            let id = calendar.add_event(date, title);
            calendar.update_event(&id, |e| e.time = time)?;
            format!("Added event {} on {}", id, date)
        }
        EventCommand::List { month } => {
            let (year, month) = match month {
                Some(raw) => parse_month(&raw)?,
                None => {
                    let t = today();
                    (t.year(), t.month())
                }
            };
            let days = calendar.month_days(year, month);
            if days.is_empty() {
                bail!("invalid month {}-{:02}", year, month);
            }
            let today = today();
            for (date, count) in days {
                if count == 0 {
                    continue;
                }
                for event in calendar.events_on(date) {
                    print_event(event, today);
                }
            }
            return Ok(());
        }
        EventCommand::Upcoming { days } => {
            let today = today();
            let upcoming = calendar.upcoming(today, days);
            if upcoming.is_empty() {
                println!("(nothing in the next {} days)", days);
            }
            for event in upcoming {
                print_event(event, today);
            }
            return Ok(());
        }
        EventCommand::Edit {
            event_id,
            title,
            time,
            clear_time,
            color,
        } => {
            let time = time.as_deref().map(parse_time).transpose()?;
            calendar
                .update_event(&event_id, |e| {
                    if let Some(t) = title {
                        e.title = t;
                    }
                    if time.is_some() {
                        e.time = time;
                    }
                    if clear_time {
                        e.time = None;
                    }
                    if let Some(c) = color {
                        e.color = c;
                    }
                })
                .with_context(|| format!("editing event {}", event_id))?;
            format!("Updated event {}", event_id)
        }
        EventCommand::Delete { event_id } => {
            calendar.delete_event(&event_id)?;
            format!("Deleted event {}", event_id)
        }
    };
    save_store(workspace, &calendar)?;
    println!("{}", message);
    Ok(())
}

pub fn note(workspace: &Workspace, config: &Config, command: NoteCommand) -> Result<()> {
    let mut notes: Notes = load_store(workspace, config)?;
    let message = match command {
        NoteCommand::Add { title, content } => {
            let id = notes.add_note();
            notes.update_note(&id, |n| {
                if let Some(t) = title {
                    n.title = t;
                }
                if let Some(c) = content {
                    n.content = c;
                }
            })?;
            format!("Added note {}", id)
        }
        NoteCommand::List => {
            let active = notes.active_note_id.as_deref();
            for n in &notes.notes {
                println!(
                    "{} {}: {} (updated {})",
                    if Some(n.id.as_str()) == active { "*" } else { " " },
                    n.id,
                    n.title,
                    n.updated_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
                );
            }
            return Ok(());
        }
        NoteCommand::Show { note_id } => {
            let note = match note_id.as_deref() {
                Some(id) => notes.get(id),
                None => notes.active(),
            }
            .ok_or_else(|| anyhow!("no such note"))?;
            println!("# {}\n\n{}", note.title, note.content);
            return Ok(());
        }
        NoteCommand::Edit {
            note_id,
            title,
            content,
        } => {
            notes
                .update_note(&note_id, |n| {
                    if let Some(t) = title {
                        n.title = t;
                    }
                    if let Some(c) = content {
                        n.content = c;
                    }
                })
                .with_context(|| format!("editing note {}", note_id))?;
            format!("Updated note {}", note_id)
        }
        NoteCommand::Select { note_id } => {
            notes.set_active(Some(&note_id))?;
            format!("Active note is now {}", note_id)
        }
        NoteCommand::Delete { note_id } => {
            notes.delete_note(&note_id)?;
            format!("Deleted note {}", note_id)
        }
    };
    save_store(workspace, &notes)?;
    println!("{}", message);
    Ok(())
}

pub fn pomodoro(workspace: &Workspace, config: &Config, command: PomodoroCommand) -> Result<()> {
    let mut pomodoro: Pomodoro = load_store(workspace, config)?;
    let message = match command {
        PomodoroCommand::Status => {
            let s = pomodoro.settings;
            let today = today();
            println!(
                "focus {} min, short break {} min, long break {} min, long break every {} sessions",
                s.focus_minutes, s.short_break_minutes, s.long_break_minutes, s.sessions_before_long
            );
            println!(
                "today: {} min in {} session(s); {} completed overall",
                pomodoro.focus_minutes_on(today),
                pomodoro.sessions_on(today).count(),
                pomodoro.sessions_completed
            );
            return Ok(());
        }
        PomodoroCommand::Run { mode, task } => {
            pomodoro.set_mode(mode.into());
            if let Some(t) = task {
                pomodoro.set_task_title(t);
            }
            run_countdown(&mut pomodoro)?;
            let finished = pomodoro.timer.mode;
            let next = pomodoro.complete_session(Local::now());
            format!("{} finished, next up: {}", finished.label(), next.label())
        }
        PomodoroCommand::Complete { task } => {
            pomodoro.set_mode(TimerMode::Focus);
            if let Some(t) = task {
                pomodoro.set_task_title(t);
            }
            pomodoro.complete_session(Local::now());
            format!("Recorded a {} minute focus session", pomodoro.settings.focus_minutes)
        }
        PomodoroCommand::Settings(args) => {
            apply_settings(&mut pomodoro, args)?;
            "Settings updated".to_string()
        }
        PomodoroCommand::History => {
            if pomodoro.sessions.is_empty() {
                println!("(no sessions)");
            }
            for s in &pomodoro.sessions {
                println!(
                    "{} {} min {}",
                    s.completed_at.format("%Y-%m-%d %H:%M"),
                    s.focus_minutes,
                    s.task_title.as_deref().unwrap_or("")
                );
            }
            return Ok(());
        }
        PomodoroCommand::Clear => {
            pomodoro.clear_history();
            "History cleared".to_string()
        }
    };
    save_store(workspace, &pomodoro)?;
    println!("{}", message);
    Ok(())
}

fn run_countdown(pomodoro: &mut Pomodoro) -> Result<()> {
    let mut out = io::stdout();
    pomodoro.set_running(true);
    tracing::info!(mode = pomodoro.timer.mode.label(), "pomodoro started");
    while pomodoro.timer.time_left > 0 {
        write!(
            out,
            "\r{:>11} {}",
            pomodoro.timer.mode.label(),
            format_clock(pomodoro.timer.time_left)
        )?;
        out.flush()?;
        thread::sleep(Duration::from_secs(1));
        pomodoro.tick();
    }
    pomodoro.set_running(false);
    writeln!(out, "\r{:>11} {}", pomodoro.timer.mode.label(), format_clock(0))?;
    Ok(())
}

fn apply_settings(pomodoro: &mut Pomodoro, args: SettingsArgs) -> Result<()> {
    pomodoro
        .update_settings(|s| {
            if let Some(v) = args.focus {
                s.focus_minutes = v;
            }
            if let Some(v) = args.short_break {
                s.short_break_minutes = v;
            }
            if let Some(v) = args.long_break {
                s.long_break_minutes = v;
            }
            if let Some(v) = args.sessions_before_long {
                s.sessions_before_long = v;
            }
        })
        .context("updating pomodoro settings")?;
    Ok(())
}

impl From<PriorityArg> for Priority {
    fn from(arg: PriorityArg) -> Self {
        match arg {
            PriorityArg::None => Priority::None,
            PriorityArg::Low => Priority::Low,
            PriorityArg::Medium => Priority::Medium,
            PriorityArg::High => Priority::High,
        }
    }
}

impl From<ModeArg> for TimerMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Focus => TimerMode::Focus,
            ModeArg::Short => TimerMode::ShortBreak,
            ModeArg::Long => TimerMode::LongBreak,
        }
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| anyhow!("invalid date (use YYYY-MM-DD): {}", raw))
}

fn parse_time(raw: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map_err(|_| anyhow!("invalid time (use HH:MM): {}", raw))
}

fn parse_month(raw: &str) -> Result<(i32, u32)> {
    let date = NaiveDate::parse_from_str(&format!("{}-01", raw.trim()), "%Y-%m-%d")
        .map_err(|_| anyhow!("invalid month (use YYYY-MM): {}", raw))?;
    Ok((date.year(), date.month()))
}

fn display_title(title: &str) -> &str {
    if title.trim().is_empty() {
        "(untitled)"
    } else {
        title
    }
}

fn print_day(day: &Day) {
    println!(
        "{} {} [{}] {} ({}/{} done)",
        day.id,
        day.title,
        day.display_date(),
        day.time_budget,
        day.completed_count(),
        day.tasks.len()
    );
    if day.tasks.is_empty() {
        println!("  (empty)");
    }
    for task in &day.tasks {
        print_task(task);
    }
}

fn print_task(task: &Task) {
    let mut line = format!(
        "  [{}] {}: {}",
        if task.completed { "x" } else { " " },
        task.id,
        display_title(&task.title)
    );
    if task.priority != Priority::None {
        line.push_str(&format!(" !{}", task.priority.label()));
    }
    if !task.labels.is_empty() {
        let labels: Vec<_> = task.labels.iter().map(|l| format!("#{}", l)).collect();
        line.push_str(&format!(" {}", labels.join(" ")));
    }
    println!("{}", line);
    for detail in &task.details {
        println!("      - {}", detail);
    }
}

fn print_habit(habit: &Habit, today: NaiveDate, lookback: u32) {
    let week: String = (0..HABIT_WEEK)
        .rev()
        .map(|offset| {
            if habit.done_on(today - ChronoDuration::days(offset)) {
                '#'
            } else {
                '.'
            }
        })
        .collect();
    println!(
        "{}: {} [{}] current {} / best {}",
        habit.id,
        habit.name,
        week,
        current_streak(habit, today, lookback),
        best_streak(habit)
    );
}

fn print_event(event: &CalendarEvent, today: NaiveDate) {
    let when = if event.date == today {
        "Today".to_string()
    } else if event.date == today + ChronoDuration::days(1) {
        "Tomorrow".to_string()
    } else {
        event.date.format("%a %-d %b").to_string()
    };
    let time = event
        .time
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_default();
    println!("  {}: {} {} {}", event.id, when, time, event.title);
}
