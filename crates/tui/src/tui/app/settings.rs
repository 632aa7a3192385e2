use anyhow::Result;

use crate::core::PermissionState;
use crate::settings::{Accent, AvatarColor, Background, FontStyle, HeaderMode};
use crate::tui::constants::{STATUS_JOIN, STATUS_SETTINGS, STATUS_TITLE};

use super::{App, ConfirmAction, InputMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SettingsItem {
    Header,
    Title,
    Accent,
    Background,
    Font,
    Sharing,
    Join,
    Reminders,
    Avatar,
    Reset,
}

impl SettingsItem {
    pub(crate) const ALL: [SettingsItem; 10] = [
        SettingsItem::Header,
        SettingsItem::Title,
        SettingsItem::Accent,
        SettingsItem::Background,
        SettingsItem::Font,
        SettingsItem::Sharing,
        SettingsItem::Join,
        SettingsItem::Reminders,
        SettingsItem::Avatar,
        SettingsItem::Reset,
    ];

    pub(crate) fn label(&self) -> &'static str {
        match self {
            SettingsItem::Header => "Header",
            SettingsItem::Title => "Title",
            SettingsItem::Accent => "Accent",
            SettingsItem::Background => "Background",
            SettingsItem::Font => "Font",
            SettingsItem::Sharing => "Sharing",
            SettingsItem::Join => "Join agenda",
            SettingsItem::Reminders => "Reminders",
            SettingsItem::Avatar => "Avatar",
            SettingsItem::Reset => "Sign out",
        }
    }
}

/// Neighbour of `current` in `all`, wrapping at both ends.
fn step_enum<T: Copy + PartialEq>(all: &[T], current: T, forward: bool) -> T {
    let len = all.len();
    let index = all.iter().position(|v| *v == current).unwrap_or(0);
    let next = if forward {
        (index + 1) % len
    } else {
        (index + len - 1) % len
    };
    all[next]
}

impl App {
    pub(super) fn open_settings(&mut self) {
        self.settings_index = 0;
        self.input_mode = InputMode::Settings;
        self.set_status_info(STATUS_SETTINGS);
    }

    pub(super) fn selected_setting(&self) -> SettingsItem {
        SettingsItem::ALL[self.settings_index.min(SettingsItem::ALL.len() - 1)]
    }

    pub(super) fn move_settings_cursor(&mut self, forward: bool) {
        let len = SettingsItem::ALL.len();
        self.settings_index = if forward {
            (self.settings_index + 1) % len
        } else {
            (self.settings_index + len - 1) % len
        };
    }

    /// Current value shown next to each item.
    pub(crate) fn setting_value(&self, item: SettingsItem) -> String {
        let settings = self.session.settings();
        match item {
            SettingsItem::Header => settings.header_mode.to_string(),
            SettingsItem::Title => settings.title.clone(),
            SettingsItem::Accent => settings.accent.to_string(),
            SettingsItem::Background => settings.background.to_string(),
            SettingsItem::Font => settings.font.to_string(),
            SettingsItem::Sharing => match &settings.share_code {
                Some(code) if settings.is_shared => format!(
                    "on · code {} · {} connected",
                    code,
                    settings.connected_users.len()
                ),
                _ => String::from("off"),
            },
            SettingsItem::Join => String::from("enter a code"),
            SettingsItem::Reminders => self.session.permission().as_str().to_string(),
            SettingsItem::Avatar => {
                let profile = self.session.profile();
                format!("[{}] {}", profile.initials(), profile.avatar_color)
            }
            SettingsItem::Reset => self.session.profile().name.clone(),
        }
    }

    /// Left/Right on an enumerated preference.
    pub(super) fn adjust_setting(&mut self, forward: bool) -> Result<()> {
        let item = self.selected_setting();
        if item == SettingsItem::Avatar {
            let mut profile = self.session.profile().clone();
            profile.avatar_color = step_enum(AvatarColor::ALL, profile.avatar_color, forward);
            return self.session.update_profile(profile);
        }

        let mut settings = self.session.settings().clone();
        match item {
            SettingsItem::Header => {
                settings.header_mode = step_enum(HeaderMode::ALL, settings.header_mode, forward)
            }
            SettingsItem::Accent => {
                settings.accent = step_enum(Accent::ALL, settings.accent, forward)
            }
            SettingsItem::Background => {
                settings.background = step_enum(Background::ALL, settings.background, forward)
            }
            SettingsItem::Font => settings.font = step_enum(FontStyle::ALL, settings.font, forward),
            _ => return Ok(()),
        }
        self.session.update_settings(settings)
    }

    /// Enter on the selected item.
    pub(super) fn activate_setting(&mut self) -> Result<()> {
        match self.selected_setting() {
            SettingsItem::Title => {
                self.input.set(self.session.settings().title.clone());
                self.input_mode = InputMode::Title;
                self.set_status_info(STATUS_TITLE);
            }
            SettingsItem::Sharing => {
                let mut settings = self.session.settings().clone();
                if settings.is_shared {
                    settings.stop_sharing();
                    self.session.update_settings(settings)?;
                    self.set_status_info("Sharing stopped");
                } else {
                    let code = settings.start_sharing().to_string();
                    self.session.update_settings(settings)?;
                    self.set_status_info(format!("Sharing enabled. Code: {}", code));
                }
            }
            SettingsItem::Join => {
                self.input.clear();
                self.input_mode = InputMode::JoinCode;
                self.set_status_info(STATUS_JOIN);
            }
            SettingsItem::Reminders => {
                let allow = self.session.permission() != PermissionState::Granted;
                self.session.resolve_permission(allow)?;
                self.set_status_info(if allow {
                    "Reminders allowed 🔔"
                } else {
                    "Reminders blocked"
                });
            }
            SettingsItem::Reset => self.prompt_confirm(ConfirmAction::ResetProfile),
            _ => self.adjust_setting(true)?,
        }
        Ok(())
    }

    pub(super) fn apply_title(&mut self) -> Result<()> {
        let mut settings = self.session.settings().clone();
        settings.set_title(self.input.as_str());
        let title = settings.title.clone();
        self.session.update_settings(settings)?;
        self.input.clear();
        self.input_mode = InputMode::Settings;
        self.set_status_info(format!("Title set to '{}'", title));
        Ok(())
    }

    pub(super) fn apply_join(&mut self) -> Result<()> {
        let mut settings = self.session.settings().clone();
        match settings.join(self.input.as_str()) {
            Ok(collaborator) => {
                let connected = settings.connected_users.len();
                self.session.update_settings(settings)?;
                self.input.clear();
                self.input_mode = InputMode::Settings;
                self.set_status_info(format!(
                    "Joined with {} ({} connected)",
                    collaborator.name, connected
                ));
            }
            Err(err) => self.set_status_error(err.to_string()),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn step_enum_wraps_both_ways() {
        assert_eq!(step_enum(HeaderMode::ALL, HeaderMode::Custom, true), HeaderMode::Year);
        assert_eq!(step_enum(Accent::ALL, Accent::Amber, false), Accent::Teal);
        assert_eq!(step_enum(FontStyle::ALL, FontStyle::Kalam, true), FontStyle::Caveat);
    }
}
