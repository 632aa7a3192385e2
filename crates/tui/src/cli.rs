use std::path::PathBuf;

use clap::{value_parser, Args, Parser, Subcommand};

use crate::capture::TaskInput;
use crate::settings::{Accent, AvatarColor, Background, FontStyle, HeaderMode};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "agenda",
    version,
    about = "A local-first weekly agenda with drag-and-drop planning.",
    after_help = "Examples:\n  agenda                      Launch the TUI (same as `agenda tui`)\n  agenda add Standup at:09:30 on:mon remind:10\n  agenda list --date today --days 7\n  agenda move 01HX... 2024-03-06\n  agenda share join K7QM2P"
)]
pub struct Cli {
    /// Override the data directory (defaults to platform-specific app dir)
    #[arg(long, value_name = "PATH", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Tracing filter directive (e.g. "info", "agenda_core=debug"); RUST_LOG also works
    #[arg(long = "log", value_name = "DIRECTIVE", global = true)]
    pub log_filter: Option<String>,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CliCommand {
    /// Launch the keyboard-first terminal agenda (default command)
    Tui,
    /// Add a task to a day
    Add(AddArgs),
    /// Print the tasks of one or more consecutive days
    List(ListArgs),
    /// Move a task to another day (appended at the end of that day)
    Move(MoveArgs),
    /// Drop a task onto another task's position
    Reorder(ReorderArgs),
    /// Delete one or more tasks by id
    Delete(DeleteArgs),
    /// Find tasks by text, time, or date
    Search(SearchArgs),
    /// Show or change the agenda appearance
    Settings(SettingsArgs),
    /// Show or change the user profile
    Profile(ProfileArgs),
    /// Manage the shared agenda simulation
    Share(ShareArgs),
    /// Sign out into a fresh profile; deletes every task
    Reset,
}

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    /// Task text with optional inline tokens (on:DATE, at:HH:MM, remind:MIN, !private)
    #[arg(value_name = "TEXT", required = true)]
    pub text: Vec<String>,

    /// Day of the task (YYYY-MM-DD, today, tomorrow, +3d, mon); defaults to today
    #[arg(long, value_name = "DATE")]
    pub date: Option<String>,

    /// Time of day (HH:MM, 24h)
    #[arg(long, value_name = "HH:MM")]
    pub time: Option<String>,

    /// Hide the text in shared views
    #[arg(long)]
    pub private: bool,

    /// Remind this many minutes before the task (requires a time)
    #[arg(long = "remind", value_name = "MINUTES", value_parser = value_parser!(u32))]
    pub remind_minutes: Option<u32>,

    /// Reference to a recorded voice note
    #[arg(long = "voice-note", value_name = "REF")]
    pub voice_note: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// First day to print (defaults to today)
    #[arg(long, value_name = "DATE")]
    pub date: Option<String>,

    /// Number of consecutive days to print
    #[arg(long, default_value_t = 1, value_parser = value_parser!(u32).range(1..=366))]
    pub days: u32,
}

#[derive(Args, Debug, Clone)]
pub struct MoveArgs {
    #[arg(value_name = "ID")]
    pub id: String,
    /// Target day
    #[arg(value_name = "DATE")]
    pub date: String,
}

#[derive(Args, Debug, Clone)]
pub struct ReorderArgs {
    /// Task being dragged
    #[arg(value_name = "DRAG_ID")]
    pub drag_id: String,
    /// Task whose position the dragged task takes
    #[arg(value_name = "HOVER_ID")]
    pub hover_id: String,
    /// Day of the hovered task
    #[arg(value_name = "DATE")]
    pub date: String,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    /// One or more task ids to delete (`agenda list` prints them)
    #[arg(value_name = "ID", required = true)]
    pub ids: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    #[arg(value_name = "QUERY", required = true)]
    pub query: Vec<String>,

    /// Maximum number of results
    #[arg(long, default_value_t = 10, value_parser = value_parser!(u32).range(1..))]
    pub limit: u32,
}

#[derive(Args, Debug, Clone, Default)]
pub struct SettingsArgs {
    /// Show the year of the visible date or the custom title in the header
    #[arg(long = "header", value_enum)]
    pub header_mode: Option<HeaderMode>,

    /// Custom agenda title (blank restores the default)
    #[arg(long)]
    pub title: Option<String>,

    #[arg(long, value_enum)]
    pub accent: Option<Accent>,

    #[arg(long, value_enum)]
    pub background: Option<Background>,

    #[arg(long, value_enum)]
    pub font: Option<FontStyle>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ProfileArgs {
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub email: Option<String>,

    #[arg(long = "color", value_enum)]
    pub avatar_color: Option<AvatarColor>,
}

#[derive(Args, Debug, Clone)]
pub struct ShareArgs {
    #[command(subcommand)]
    pub action: ShareAction,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ShareAction {
    /// Start sharing and print the share code
    Start,
    /// Stop sharing and disconnect every collaborator
    Stop,
    /// Join another agenda with its 6-character code
    Join {
        #[arg(value_name = "CODE")]
        code: String,
    },
    /// Disconnect one collaborator by id
    Remove {
        #[arg(value_name = "ID")]
        id: String,
    },
}

impl From<&AddArgs> for TaskInput {
    fn from(args: &AddArgs) -> Self {
        TaskInput {
            text: args.text.clone(),
            date: args.date.clone(),
            time: args.time.clone(),
            private: args.private,
            remind_minutes: args.remind_minutes,
            voice_note: args.voice_note.clone(),
        }
    }
}

impl From<AddArgs> for TaskInput {
    fn from(args: AddArgs) -> Self {
        TaskInput {
            text: args.text,
            date: args.date,
            time: args.time,
            private: args.private,
            remind_minutes: args.remind_minutes,
            voice_note: args.voice_note,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn add_args_convert_into_task_input() {
        let cli = Cli::parse_from([
            "agenda", "add", "Standup", "at:09:30", "--date", "tomorrow", "--remind", "10",
        ]);
        let Some(CliCommand::Add(args)) = cli.command else {
            panic!("expected add command");
        };
        let input = TaskInput::from(args);
        assert_eq!(input.text, vec!["Standup".to_string(), "at:09:30".to_string()]);
        assert_eq!(input.date.as_deref(), Some("tomorrow"));
        assert_eq!(input.remind_minutes, Some(10));
        assert!(!input.private);
    }

    #[test]
    fn global_flags_follow_subcommands() {
        let cli = Cli::parse_from(["agenda", "list", "--data-dir", "/tmp/x", "--log", "debug"]);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/x")));
        assert_eq!(cli.log_filter.as_deref(), Some("debug"));
    }

    #[test]
    fn share_join_takes_code() {
        let cli = Cli::parse_from(["agenda", "share", "join", "abc234"]);
        match cli.command {
            Some(CliCommand::Share(ShareArgs {
                action: ShareAction::Join { code },
            })) => assert_eq!(code, "abc234"),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
