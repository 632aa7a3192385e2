use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::{App, ConfirmAction, ConfirmChoice, InputMode};

#[derive(Debug, Clone, Copy)]
pub(crate) enum NormalAction {
    Quit,
    EnterAdd,
    EnterEdit,
    GoTo,
    Search,
    ShowDetails,
    ShowHelp,
    OpenSettings,
    GrabOrDrop,
    Drop,
    CancelDrag,
    LaterDay,
    EarlierDay,
    TogglePrivate,
    ToggleReminder,
    Delete,
    SelectNext,
    SelectPrev,
    NextDay,
    PrevDay,
    PageDown,
    PageUp,
    NextWeek,
    PrevWeek,
    Today,
}

impl NormalAction {
    fn from_event(key: &KeyEvent, dragging: bool) -> Option<Self> {
        if matches!(key.code, KeyCode::Char('c')) && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Some(Self::Quit);
        }

        match key.code {
            KeyCode::Enter if dragging => Some(Self::Drop),
            KeyCode::Esc if dragging => Some(Self::CancelDrag),
            KeyCode::Char('q') => Some(Self::Quit),
            KeyCode::Char('a') => Some(Self::EnterAdd),
            KeyCode::Char('e') => Some(Self::EnterEdit),
            KeyCode::Char('g') => Some(Self::GoTo),
            KeyCode::Char('/') => Some(Self::Search),
            KeyCode::Char('h') | KeyCode::Char('?') => Some(Self::ShowHelp),
            KeyCode::Char('s') => Some(Self::OpenSettings),
            KeyCode::Char('m') | KeyCode::Char(' ') => Some(Self::GrabOrDrop),
            KeyCode::Char('>') => Some(Self::LaterDay),
            KeyCode::Char('<') => Some(Self::EarlierDay),
            KeyCode::Char('p') => Some(Self::TogglePrivate),
            KeyCode::Char('r') => Some(Self::ToggleReminder),
            KeyCode::Char('x') | KeyCode::Delete => Some(Self::Delete),
            KeyCode::Char('j') | KeyCode::Down => Some(Self::SelectNext),
            KeyCode::Char('k') | KeyCode::Up => Some(Self::SelectPrev),
            KeyCode::Char('J') => Some(Self::NextDay),
            KeyCode::Char('K') => Some(Self::PrevDay),
            KeyCode::PageDown => Some(Self::PageDown),
            KeyCode::PageUp => Some(Self::PageUp),
            KeyCode::Char(']') => Some(Self::NextWeek),
            KeyCode::Char('[') => Some(Self::PrevWeek),
            KeyCode::Char('t') => Some(Self::Today),
            KeyCode::Enter => Some(Self::ShowDetails),
            _ => None,
        }
    }
}

impl App {
    pub(crate) fn on_key(&mut self, key: KeyEvent) -> Result<()> {
        match self.input_mode {
            InputMode::Normal => self.handle_normal_mode(key)?,
            InputMode::Add => self.handle_add_mode(key)?,
            InputMode::Edit => self.handle_edit_mode(key)?,
            InputMode::GoTo => self.handle_goto_mode(key),
            InputMode::Search => self.handle_search_mode(key),
            InputMode::Settings => self.handle_settings_mode(key)?,
            InputMode::Title => self.handle_title_mode(key)?,
            InputMode::JoinCode => self.handle_join_mode(key)?,
            InputMode::Inspect => self.handle_inspect_mode(key),
            InputMode::Help => self.handle_help_mode(key),
            InputMode::Confirm => self.handle_confirm_mode(key)?,
            InputMode::Permission => self.handle_permission_mode(key)?,
        }
        self.sync_viewport();
        Ok(())
    }

    fn handle_normal_mode(&mut self, key: KeyEvent) -> Result<()> {
        let dragging = self.session.drag().is_dragging();
        if let Some(action) = NormalAction::from_event(&key, dragging) {
            self.execute_normal_action(action)?;
        }
        Ok(())
    }

    fn execute_normal_action(&mut self, action: NormalAction) -> Result<()> {
        match action {
            NormalAction::Quit => {
                self.should_quit = true;
            }
            NormalAction::EnterAdd => self.begin_add(),
            NormalAction::EnterEdit => self.start_edit_current(),
            NormalAction::GoTo => self.begin_goto(),
            NormalAction::Search => self.begin_search(),
            NormalAction::ShowDetails => self.show_details(),
            NormalAction::ShowHelp => self.show_help_overlay(),
            NormalAction::OpenSettings => self.open_settings(),
            NormalAction::GrabOrDrop => self.grab_or_drop()?,
            NormalAction::Drop => self.drop_dragged()?,
            NormalAction::CancelDrag => self.cancel_drag(),
            NormalAction::LaterDay => self.nudge_task(1)?,
            NormalAction::EarlierDay => self.nudge_task(-1)?,
            NormalAction::TogglePrivate => self.toggle_private()?,
            NormalAction::ToggleReminder => self.toggle_reminder()?,
            NormalAction::Delete => self.prompt_delete(),
            NormalAction::SelectNext => self.move_cursor(1),
            NormalAction::SelectPrev => self.move_cursor(-1),
            NormalAction::NextDay => self.move_to_neighbour_day(true),
            NormalAction::PrevDay => self.move_to_neighbour_day(false),
            NormalAction::PageDown => self.move_cursor(self.viewport_rows as isize),
            NormalAction::PageUp => self.move_cursor(-(self.viewport_rows as isize)),
            NormalAction::NextWeek => self.shift_weeks(1),
            NormalAction::PrevWeek => self.shift_weeks(-1),
            NormalAction::Today => {
                self.go_to_today();
                self.set_status_info("Back to today");
            }
        }
        Ok(())
    }

    /// Shared line editing; returns true when the text changed.
    fn edit_line(&mut self, key: &KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            if matches!(key.code, KeyCode::Char('w')) {
                self.input.delete_word();
                return true;
            }
            return false;
        }
        match key.code {
            KeyCode::Backspace => self.input.backspace(),
            KeyCode::Delete => self.input.delete_char(),
            KeyCode::Char(c) => self.input.insert_char(c),
            KeyCode::Tab => self.input.insert_char('\t'),
            KeyCode::Left => {
                self.input.move_left();
                return false;
            }
            KeyCode::Right => {
                self.input.move_right();
                return false;
            }
            KeyCode::Home => {
                self.input.move_home();
                return false;
            }
            KeyCode::End => {
                self.input.move_end();
                return false;
            }
            _ => return false,
        }
        true
    }

    fn handle_add_mode(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Enter => self.add_task()?,
            KeyCode::Esc => {
                self.input.clear();
                self.input_mode = InputMode::Normal;
                self.status = None;
            }
            _ => {
                self.edit_line(&key);
            }
        }
        Ok(())
    }

    fn handle_edit_mode(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Enter => self.apply_edit()?,
            KeyCode::Esc => self.cancel_edit(),
            _ => {
                self.edit_line(&key);
            }
        }
        Ok(())
    }

    fn handle_goto_mode(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.apply_goto(),
            KeyCode::Esc => {
                self.input.clear();
                self.input_mode = InputMode::Normal;
                self.status = None;
            }
            _ => {
                self.edit_line(&key);
            }
        }
    }

    fn handle_search_mode(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.open_search_result(),
            KeyCode::Esc => {
                self.input.clear();
                self.search_results.clear();
                self.input_mode = InputMode::Normal;
                self.status = None;
            }
            KeyCode::Up => {
                if !self.search_results.is_empty() {
                    if self.search_index == 0 {
                        self.search_index = self.search_results.len() - 1;
                    } else {
                        self.search_index -= 1;
                    }
                }
            }
            KeyCode::Down => {
                if !self.search_results.is_empty() {
                    self.search_index = (self.search_index + 1) % self.search_results.len();
                }
            }
            _ => {
                if self.edit_line(&key) {
                    self.refresh_search();
                }
            }
        }
    }

    fn handle_settings_mode(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('s') => {
                self.input_mode = InputMode::Normal;
                self.status = None;
            }
            KeyCode::Char('j') | KeyCode::Down => self.move_settings_cursor(true),
            KeyCode::Char('k') | KeyCode::Up => self.move_settings_cursor(false),
            KeyCode::Char('l') | KeyCode::Right => self.adjust_setting(true)?,
            KeyCode::Char('h') | KeyCode::Left => self.adjust_setting(false)?,
            KeyCode::Enter | KeyCode::Char(' ') => self.activate_setting()?,
            _ => {}
        }
        Ok(())
    }

    fn handle_title_mode(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Enter => self.apply_title()?,
            KeyCode::Esc => {
                self.input.clear();
                self.input_mode = InputMode::Settings;
            }
            _ => {
                self.edit_line(&key);
            }
        }
        Ok(())
    }

    fn handle_join_mode(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Enter => self.apply_join()?,
            KeyCode::Esc => {
                self.input.clear();
                self.input_mode = InputMode::Settings;
            }
            _ => {
                self.edit_line(&key);
            }
        }
        Ok(())
    }

    fn handle_inspect_mode(&mut self, key: KeyEvent) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Enter) {
            self.inspect_task = None;
            self.input_mode = InputMode::Normal;
            self.status = None;
        }
    }

    fn handle_help_mode(&mut self, key: KeyEvent) {
        if matches!(
            key.code,
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('h') | KeyCode::Char('?')
        ) {
            self.input_mode = InputMode::Normal;
            self.status = None;
        }
    }

    fn handle_confirm_mode(&mut self, key: KeyEvent) -> Result<()> {
        let return_mode = match self.confirm {
            Some(ConfirmAction::ResetProfile) => InputMode::Settings,
            _ => InputMode::Normal,
        };
        match key.code {
            KeyCode::Esc | KeyCode::Char('n') => {
                self.confirm = None;
                self.input_mode = return_mode;
                self.set_status_info("Cancelled");
            }
            KeyCode::Char('y') => {
                self.confirm_choice = ConfirmChoice::Yes;
                self.input_mode = InputMode::Normal;
                self.perform_confirm()?;
            }
            KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::Char(' ') => {
                self.confirm_choice = self.confirm_choice.toggle();
            }
            KeyCode::Enter => {
                if self.confirm_choice == ConfirmChoice::Yes {
                    self.input_mode = InputMode::Normal;
                    self.perform_confirm()?;
                } else {
                    self.confirm = None;
                    self.input_mode = return_mode;
                    self.set_status_info("Cancelled");
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_permission_mode(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                self.input_mode = InputMode::Normal;
                self.resolve_permission(true)?;
            }
            KeyCode::Char('n') | KeyCode::Char('N') => {
                self.input_mode = InputMode::Normal;
                self.resolve_permission(false)?;
            }
            KeyCode::Esc => {
                // The request stays open; a later answer still applies.
                self.input_mode = InputMode::Normal;
                self.set_status_info("Reminder waits for a notification decision");
            }
            _ => {}
        }
        Ok(())
    }
}
