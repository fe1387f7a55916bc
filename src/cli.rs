use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "planboard",
    version,
    about = "Terminal productivity dashboard: day schedule, sticky board, habits, calendar, notes and pomodoro"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initialize a project workspace in the current directory
    Init,
    /// Show today's summary across every store
    Dashboard,
    /// Print the effective configuration
    Config,
    /// Manage schedule days
    #[command(subcommand)]
    Day(DayCommand),
    /// Manage tasks inside schedule days
    #[command(subcommand)]
    Task(TaskCommand),
    /// Save and apply day templates
    #[command(subcommand)]
    Template(TemplateCommand),
    /// Manage the free-form sticky board
    #[command(subcommand)]
    Sticky(StickyCommand),
    /// Track habits and streaks
    #[command(subcommand)]
    Habit(HabitCommand),
    /// Manage calendar events
    #[command(subcommand)]
    Event(EventCommand),
    /// Write notes
    #[command(subcommand)]
    Note(NoteCommand),
    /// Pomodoro timer and focus history
    #[command(subcommand)]
    Pomodoro(PomodoroCommand),
    /// Launch the interactive TUI
    Tui,
}

#[derive(Subcommand, Debug)]
pub enum DayCommand {
    /// Append a day after the last one (today when empty)
    Add,
    /// List days and their tasks
    List {
        /// Only show today's day
        #[arg(long)]
        today: bool,
    },
    /// Edit a day's title, date or time budget
    Edit {
        day_id: String,
        #[arg(long)]
        title: Option<String>,
        /// Date in YYYY-MM-DD format
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        budget: Option<String>,
    },
    /// Delete a day and all of its tasks
    Delete { day_id: String },
    /// Rename the schedule
    Title { title: String },
    /// Delete every day and template
    Reset,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum PriorityArg {
    None,
    Low,
    Medium,
    High,
}

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    /// Add a task to a day
    Add {
        day_id: String,
        title: String,
        #[arg(long, value_enum)]
        priority: Option<PriorityArg>,
        /// Labels (repeatable)
        #[arg(long = "label", short = 'l')]
        labels: Vec<String>,
        /// Detail lines (repeatable)
        #[arg(long = "detail", short = 'd')]
        details: Vec<String>,
    },
    /// Edit a task
    Edit {
        day_id: String,
        task_id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, value_enum)]
        priority: Option<PriorityArg>,
        /// Toggle a label on or off (repeatable)
        #[arg(long = "toggle-label")]
        toggle_labels: Vec<String>,
        /// Replace detail lines (repeatable)
        #[arg(long = "detail", short = 'd')]
        details: Vec<String>,
    },
    /// Mark a task done (or not done with --undo)
    Done {
        day_id: String,
        task_id: String,
        #[arg(long)]
        undo: bool,
    },
    /// Delete a task
    Delete { day_id: String, task_id: String },
    /// Move a task to the end of another day
    Move { task_id: String, target_day_id: String },
    /// Move a task within its day from one position to another (1-based)
    Reorder { day_id: String, from: usize, to: usize },
}

#[derive(Subcommand, Debug)]
pub enum TemplateCommand {
    /// Save a day's tasks as a template
    Save { day_id: String, name: String },
    /// Append a template's tasks to a day
    Apply { day_id: String, template_id: String },
    /// List templates
    List,
    /// Delete a template
    Delete { template_id: String },
}

#[derive(Subcommand, Debug)]
pub enum StickyCommand {
    /// Add a sticky note
    Add {
        #[arg(default_value = "")]
        title: String,
    },
    /// List sticky notes
    List,
    /// Edit a note's title, color or completion
    Edit {
        sticky_id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        color: Option<String>,
        #[arg(long, conflicts_with = "undo")]
        done: bool,
        #[arg(long)]
        undo: bool,
    },
    /// Place a note at pixel coordinates
    Move { sticky_id: String, x: i32, y: i32 },
    /// Resize a note (clamped to the configured minimum)
    Resize { sticky_id: String, width: i32, height: i32 },
    /// Delete a note
    Delete { sticky_id: String },
    /// Delete every completed note
    ClearCompleted,
}

#[derive(Subcommand, Debug)]
pub enum HabitCommand {
    /// Add a habit
    Add {
        name: String,
        #[arg(long)]
        color: Option<String>,
    },
    /// List habits with the last week and streaks
    List,
    /// Flip a habit's completion for a date (default today)
    Toggle {
        habit_id: String,
        /// Date in YYYY-MM-DD format
        #[arg(long)]
        date: Option<String>,
    },
    /// Rename or recolor a habit
    Edit {
        habit_id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Delete a habit
    Delete { habit_id: String },
}

#[derive(Subcommand, Debug)]
pub enum EventCommand {
    /// Add an event on a date (YYYY-MM-DD)
    Add {
        date: String,
        title: String,
        /// Time in HH:MM format
        #[arg(long)]
        time: Option<String>,
    },
    /// List a month's events (YYYY-MM, default current month)
    List {
        #[arg(long)]
        month: Option<String>,
    },
    /// Events from today onwards
    Upcoming {
        #[arg(long, default_value_t = 14)]
        days: i64,
    },
    /// Edit an event
    Edit {
        event_id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, conflicts_with = "clear_time")]
        time: Option<String>,
        #[arg(long)]
        clear_time: bool,
        #[arg(long)]
        color: Option<String>,
    },
    /// Delete an event
    Delete { event_id: String },
}

#[derive(Subcommand, Debug)]
pub enum NoteCommand {
    /// Create a note and make it active
    Add {
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
    },
    /// List notes, newest first
    List,
    /// Print a note (default the active one)
    Show { note_id: Option<String> },
    /// Edit a note
    Edit {
        note_id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
    },
    /// Make a note active
    Select { note_id: String },
    /// Delete a note
    Delete { note_id: String },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ModeArg {
    Focus,
    Short,
    Long,
}

#[derive(Args, Debug)]
pub struct SettingsArgs {
    #[arg(long)]
    pub focus: Option<u32>,
    #[arg(long)]
    pub short_break: Option<u32>,
    #[arg(long)]
    pub long_break: Option<u32>,
    #[arg(long)]
    pub sessions_before_long: Option<u32>,
}

#[derive(Subcommand, Debug)]
pub enum PomodoroCommand {
    /// Show settings and today's focus time
    Status,
    /// Count a period down in the terminal and record it when it ends
    Run {
        #[arg(long, value_enum, default_value = "focus")]
        mode: ModeArg,
        /// What the focus period is spent on
        #[arg(long)]
        task: Option<String>,
    },
    /// Record a finished focus period without waiting
    Complete {
        #[arg(long)]
        task: Option<String>,
    },
    /// Change durations (minutes)
    Settings(SettingsArgs),
    /// Show recorded focus sessions
    History,
    /// Delete every recorded session
    Clear,
}
