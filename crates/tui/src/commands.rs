use std::fmt;
use std::io::Write;

use anyhow::{anyhow, bail, Result};

use crate::capture::TaskInput;
use crate::cli::{
    AddArgs, CliCommand, DeleteArgs, ListArgs, MoveArgs, ProfileArgs, ReorderArgs, SearchArgs,
    SettingsArgs, ShareAction,
};
use crate::config::AppConfig;
use crate::core::commands as core_commands;
use crate::core::AgendaSession;
use crate::model::{DateKey, DeleteResult, Mutation, Task};
use crate::parser;

pub fn execute<W: Write>(config: &AppConfig, command: CliCommand, mut writer: W) -> Result<()> {
    match command {
        CliCommand::Add(args) => handle_add(config, &args, &mut writer),
        CliCommand::List(args) => handle_list(config, &args, &mut writer),
        CliCommand::Move(args) => handle_move(config, &args, &mut writer),
        CliCommand::Reorder(args) => handle_reorder(config, &args, &mut writer),
        CliCommand::Delete(args) => handle_delete(config, &args, &mut writer),
        CliCommand::Search(args) => handle_search(config, &args, &mut writer),
        CliCommand::Settings(args) => handle_settings(config, &args, &mut writer),
        CliCommand::Profile(args) => handle_profile(config, &args, &mut writer),
        CliCommand::Share(args) => handle_share(config, args.action, &mut writer),
        CliCommand::Reset => handle_reset(config, &mut writer),
        CliCommand::Tui => Err(anyhow!("launch interactive surfaces directly")),
    }
}

fn handle_add<W: Write>(config: &AppConfig, args: &AddArgs, mut writer: W) -> Result<()> {
    let mut session = AgendaSession::open(config)?;
    let today = session.today();
    let draft = parser::parse_capture_on(&TaskInput::from(args), today, today)?;
    let outcome = session.add_task(draft)?;
    writeln!(writer, "Added [{}] {}", outcome.date, outcome.text)?;
    writeln!(writer, "  id: {}", outcome.id)?;
    Ok(())
}

fn handle_list<W: Write>(config: &AppConfig, args: &ListArgs, mut writer: W) -> Result<()> {
    let session = AgendaSession::open(config)?;
    let first = resolve_date(&session, args.date.as_deref())?;
    for offset in 0..args.days {
        let date = first.offset(offset as i64);
        writeln!(writer, "{}", DayHeading(date))?;
        let tasks = session.tasks_on(date);
        if tasks.is_empty() {
            writeln!(writer, "  (no tasks)")?;
        }
        for task in tasks {
            writeln!(writer, "  {}", TaskLine(task))?;
        }
    }
    Ok(())
}

fn handle_move<W: Write>(config: &AppConfig, args: &MoveArgs, mut writer: W) -> Result<()> {
    let mut session = AgendaSession::open(config)?;
    ensure_known(&session, &args.id)?;
    let date = resolve_date(&session, Some(&args.date))?;
    let outcome = session.on_move_task(&args.id, date)?;
    writeln!(writer, "{}", MutationLine(&outcome))?;
    Ok(())
}

fn handle_reorder<W: Write>(config: &AppConfig, args: &ReorderArgs, mut writer: W) -> Result<()> {
    let mut session = AgendaSession::open(config)?;
    ensure_known(&session, &args.drag_id)?;
    ensure_known(&session, &args.hover_id)?;
    let date = resolve_date(&session, Some(&args.date))?;
    let outcome = session.on_reorder_task(&args.drag_id, &args.hover_id, date)?;
    writeln!(writer, "{}", MutationLine(&outcome))?;
    Ok(())
}

fn handle_delete<W: Write>(config: &AppConfig, args: &DeleteArgs, mut writer: W) -> Result<()> {
    let results = core_commands::delete_tasks(config, &args.ids)?;
    let summary = DeleteSummary::from_results(&results);
    summary.write_to(&mut writer)?;
    Ok(())
}

fn handle_search<W: Write>(config: &AppConfig, args: &SearchArgs, mut writer: W) -> Result<()> {
    let session = AgendaSession::open(config)?;
    let query = args.query.join(" ");
    let hits = session.store().search(&query, args.limit as usize);
    if hits.is_empty() {
        writeln!(writer, "No matches for '{}'", query)?;
        return Ok(());
    }
    writeln!(
        writer,
        "{} match{}",
        hits.len(),
        if hits.len() == 1 { "" } else { "es" }
    )?;
    for task in hits {
        writeln!(writer, "  {}  {}", task.date, TaskLine(task))?;
    }
    Ok(())
}

fn handle_settings<W: Write>(config: &AppConfig, args: &SettingsArgs, mut writer: W) -> Result<()> {
    let mut session = AgendaSession::open(config)?;
    let mut settings = session.settings().clone();
    if let Some(mode) = args.header_mode {
        settings.header_mode = mode;
    }
    if let Some(title) = &args.title {
        settings.set_title(title);
    }
    if let Some(accent) = args.accent {
        settings.accent = accent;
    }
    if let Some(background) = args.background {
        settings.background = background;
    }
    if let Some(font) = args.font {
        settings.font = font;
    }
    if settings != *session.settings() {
        session.update_settings(settings)?;
        writeln!(writer, "Saved settings")?;
    }

    let settings = session.settings();
    writeln!(writer, "header:     {}", settings.header_mode)?;
    writeln!(writer, "title:      {}", settings.title)?;
    writeln!(writer, "accent:     {}", settings.accent)?;
    writeln!(writer, "background: {}", settings.background)?;
    writeln!(writer, "font:       {}", settings.font)?;
    writeln!(writer, "shared:     {}", share_label(&session))?;
    Ok(())
}

fn handle_profile<W: Write>(config: &AppConfig, args: &ProfileArgs, mut writer: W) -> Result<()> {
    let mut session = AgendaSession::open(config)?;
    let mut profile = session.profile().clone();
    if let Some(name) = args.name.as_deref().map(str::trim) {
        if name.is_empty() {
            bail!("Profile name cannot be empty");
        }
        profile.name = name.to_string();
    }
    if let Some(email) = &args.email {
        profile.email = email.trim().to_string();
    }
    if let Some(color) = args.avatar_color {
        profile.avatar_color = color;
    }
    if profile != *session.profile() {
        session.update_profile(profile)?;
        writeln!(writer, "Saved profile")?;
    }

    let profile = session.profile();
    writeln!(writer, "[{}] {} <{}>", profile.initials(), profile.name, profile.email)?;
    writeln!(writer, "  id: {}  color: {}", profile.id, profile.avatar_color)?;
    Ok(())
}

fn handle_share<W: Write>(config: &AppConfig, action: ShareAction, mut writer: W) -> Result<()> {
    let mut session = AgendaSession::open(config)?;
    let mut settings = session.settings().clone();
    match action {
        ShareAction::Start => {
            let code = settings.start_sharing().to_string();
            session.update_settings(settings)?;
            writeln!(writer, "Sharing enabled. Code: {}", code)?;
        }
        ShareAction::Stop => {
            settings.stop_sharing();
            session.update_settings(settings)?;
            writeln!(writer, "Sharing stopped")?;
        }
        ShareAction::Join { code } => {
            let collaborator = settings.join(&code)?;
            session.update_settings(settings)?;
            writeln!(
                writer,
                "Joined {} with {}",
                share_label(&session),
                collaborator.name
            )?;
        }
        ShareAction::Remove { id } => {
            let collaborator = settings.remove_collaborator(&id)?;
            session.update_settings(settings)?;
            writeln!(writer, "Disconnected {}", collaborator.name)?;
        }
    }
    for user in &session.settings().connected_users {
        let role = if user.is_owner { " (owner)" } else { "" };
        writeln!(writer, "  {} {}{}", user.id, user.name, role)?;
    }
    Ok(())
}

fn handle_reset<W: Write>(config: &AppConfig, mut writer: W) -> Result<()> {
    let mut session = AgendaSession::open(config)?;
    let removed = session.store().len();
    let profile = session.reset_profile()?;
    writeln!(writer, "Signed out. New profile: {} ({})", profile.name, profile.id)?;
    writeln!(writer, "{}", SummaryLine::deleted(removed))?;
    Ok(())
}

fn resolve_date(session: &AgendaSession, spec: Option<&str>) -> Result<DateKey> {
    match spec {
        Some(spec) => Ok(parser::parse_date_spec(spec, session.today())?),
        None => Ok(session.today()),
    }
}

fn ensure_known(session: &AgendaSession, id: &str) -> Result<()> {
    if session.store().get(id).is_none() {
        bail!("Task not found: {}", id);
    }
    Ok(())
}

fn share_label(session: &AgendaSession) -> String {
    let settings = session.settings();
    match (&settings.share_code, settings.is_shared) {
        (Some(code), true) => format!("{} ({} connected)", code, settings.connected_users.len()),
        _ => String::from("no"),
    }
}

struct DayHeading(DateKey);

impl fmt::Display for DayHeading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.as_naive().format("%a %-d %b %Y"))
    }
}

struct TaskLine<'a>(&'a Task);

impl fmt::Display for TaskLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let task = self.0;
        match task.time {
            Some(time) => write!(f, "{}  ", time)?,
            None => write!(f, "       ")?,
        }
        write!(f, "{}", task.text)?;
        if task.is_private {
            write!(f, " 🔒")?;
        }
        if task.has_reminder() {
            write!(f, " 🔔")?;
        }
        write!(f, "  ({})", task.id)
    }
}

struct MutationLine<'a>(&'a Mutation);

impl fmt::Display for MutationLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Mutation::Moved { id, from, to } => write!(f, "Moved {} from {} to {}", id, from, to),
            Mutation::Reordered {
                id, to, index, ..
            } => write!(f, "Placed {} at position {} on {}", id, index + 1, to),
            Mutation::Unchanged => write!(f, "Nothing changed"),
        }
    }
}

struct DeleteSummary {
    deleted: usize,
    missing: Vec<String>,
}

impl DeleteSummary {
    fn from_results(results: &[DeleteResult]) -> Self {
        let mut deleted = 0usize;
        let mut missing = Vec::new();
        for result in results {
            if result.deleted {
                deleted += 1;
            } else {
                missing.push(result.id.clone());
            }
        }
        Self { deleted, missing }
    }

    fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writeln!(writer, "{}", SummaryLine::deleted(self.deleted))?;
        if !self.missing.is_empty() {
            writeln!(writer, "Not found: {}", self.missing.join(", "))?;
        }
        Ok(())
    }
}

enum SummaryLine {
    Deleted(usize),
    NoneDeleted,
}

impl SummaryLine {
    fn deleted(count: usize) -> Self {
        if count > 0 {
            SummaryLine::Deleted(count)
        } else {
            SummaryLine::NoneDeleted
        }
    }
}

impl fmt::Display for SummaryLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SummaryLine::Deleted(count) => {
                write!(
                    f,
                    "Deleted {} task{}",
                    count,
                    if *count == 1 { "" } else { "s" }
                )
            }
            SummaryLine::NoneDeleted => write!(f, "No tasks deleted"),
        }
    }
}
