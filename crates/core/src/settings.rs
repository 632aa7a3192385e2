use std::fmt;

use anyhow::Result;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use ulid::Ulid;

use crate::database::{Database, PROFILE_KEY, SETTINGS_KEY};
use crate::model::DateKey;

pub const DEFAULT_TITLE: &str = "My Agenda";
pub const SHARE_CODE_LEN: usize = 6;
const SHARE_CODE_ALPHABET: &[u8; 32] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const SIMULATED_NAMES: [&str; 12] = [
    "Ana Garcia",
    "Carlos Lopez",
    "Maria Rodriguez",
    "David Martin",
    "Elena Fernandez",
    "Jorge Perez",
    "Laura Gonzalez",
    "Miguel Torres",
    "Sara Ruiz",
    "Pablo Diaz",
    "Carmen Jimenez",
    "Ruben Morales",
];

macro_rules! labelled_enum {
    ($name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
        #[serde(rename_all = "lowercase")]
        #[clap(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            /// The next value in declaration order, wrapping around.
            pub fn cycle(&self) -> Self {
                let index = Self::ALL.iter().position(|v| v == self).unwrap_or(0);
                Self::ALL[(index + 1) % Self::ALL.len()]
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }
    };
}

labelled_enum!(HeaderMode {
    Year => "year",
    Custom => "custom",
});

labelled_enum!(Accent {
    Amber => "amber",
    Blue => "blue",
    Green => "green",
    Purple => "purple",
    Rose => "rose",
    Slate => "slate",
    Orange => "orange",
    Teal => "teal",
});

labelled_enum!(Background {
    Cream => "cream",
    White => "white",
    Blue => "blue",
    Green => "green",
    Purple => "purple",
    Rose => "rose",
    Amber => "amber",
    Slate => "slate",
});

labelled_enum!(FontStyle {
    Kalam => "kalam",
    Caveat => "caveat",
    Inter => "inter",
});

labelled_enum!(AvatarColor {
    Blue => "blue",
    Green => "green",
    Purple => "purple",
    Pink => "pink",
    Indigo => "indigo",
    Teal => "teal",
    Orange => "orange",
    Red => "red",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collaborator {
    pub id: String,
    pub name: String,
    pub color: AvatarColor,
    pub is_owner: bool,
}

impl Collaborator {
    pub fn owner() -> Self {
        Self {
            id: "owner".into(),
            name: "You".into(),
            color: AvatarColor::Green,
            is_owner: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShareError {
    #[error("Share codes are 6 characters, got '{0}'")]
    InvalidCode(String),
    #[error("Collaborator '{0}' is not connected")]
    UnknownCollaborator(String),
    #[error("The agenda owner cannot be removed")]
    CannotRemoveOwner,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserSettings {
    pub header_mode: HeaderMode,
    pub title: String,
    pub accent: Accent,
    pub background: Background,
    pub font: FontStyle,
    pub is_shared: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_code: Option<String>,
    pub connected_users: Vec<Collaborator>,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            header_mode: HeaderMode::Year,
            title: DEFAULT_TITLE.into(),
            accent: Accent::Amber,
            background: Background::Cream,
            font: FontStyle::Kalam,
            is_shared: false,
            share_code: None,
            connected_users: vec![Collaborator::owner()],
        }
    }
}

impl UserSettings {
    /// Header text: the year of the active date, or the custom title.
    pub fn header_title(&self, active: DateKey) -> String {
        match self.header_mode {
            HeaderMode::Year => active.year().to_string(),
            HeaderMode::Custom => self.title.clone(),
        }
    }

    pub fn set_title(&mut self, title: &str) {
        let trimmed = title.trim();
        self.title = if trimmed.is_empty() {
            DEFAULT_TITLE.into()
        } else {
            trimmed.to_string()
        };
    }

    pub fn start_sharing(&mut self) -> &str {
        let code = generate_share_code(Ulid::new().random());
        info!(code = code.as_str(), "started sharing agenda");
        self.is_shared = true;
        self.share_code.insert(code)
    }

    /// Join another agenda by code, adding a simulated collaborator.
    pub fn join(&mut self, code: &str) -> Result<Collaborator, ShareError> {
        let trimmed = code.trim();
        if trimmed.chars().count() != SHARE_CODE_LEN {
            return Err(ShareError::InvalidCode(code.to_string()));
        }
        let bits = Ulid::new().random();
        let name = SIMULATED_NAMES[(bits % SIMULATED_NAMES.len() as u128) as usize];
        let colors = AvatarColor::ALL;
        let color = colors[((bits >> 8) % colors.len() as u128) as usize];
        let collaborator = Collaborator {
            id: short_random_id(bits),
            name: name.into(),
            color,
            is_owner: false,
        };

        self.is_shared = true;
        self.share_code = Some(trimmed.to_uppercase());
        info!(collaborator = collaborator.name.as_str(), "joined shared agenda");
        self.connected_users.push(collaborator.clone());
        Ok(collaborator)
    }

    /// Stop sharing; only the owner stays connected.
    pub fn stop_sharing(&mut self) {
        self.is_shared = false;
        self.share_code = None;
        self.connected_users.retain(|user| user.is_owner);
        info!("stopped sharing agenda");
    }

    pub fn remove_collaborator(&mut self, id: &str) -> Result<Collaborator, ShareError> {
        let position = self
            .connected_users
            .iter()
            .position(|user| user.id == id)
            .ok_or_else(|| ShareError::UnknownCollaborator(id.to_string()))?;
        if self.connected_users[position].is_owner {
            return Err(ShareError::CannotRemoveOwner);
        }
        Ok(self.connected_users.remove(position))
    }

    /// Forget sharing and the custom title, keeping the visual preferences.
    pub fn reset_account(&mut self) {
        self.title = DEFAULT_TITLE.into();
        self.stop_sharing();
    }

    pub fn load(db: &Database) -> Self {
        match db.get_json(SETTINGS_KEY) {
            Ok(Some(settings)) => settings,
            Ok(None) => Self::default(),
            Err(err) => {
                warn!(error = %err, "stored settings unreadable, using defaults");
                Self::default()
            }
        }
    }

    pub fn save(&self, db: &Database) -> Result<()> {
        db.put_json(SETTINGS_KEY, self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub avatar_color: AvatarColor,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            id: "user-1".into(),
            name: "Demo User".into(),
            email: "user@demo.com".into(),
            avatar_color: AvatarColor::Blue,
        }
    }
}

impl UserProfile {
    /// Profile handed out after a reset.
    pub fn fresh() -> Self {
        Self {
            id: format!("user-{}", short_random_id(Ulid::new().random())),
            name: "New User".into(),
            email: "new@user.com".into(),
            avatar_color: AvatarColor::Green,
        }
    }

    /// Up to two upper-case initials taken from the words of the name.
    pub fn initials(&self) -> String {
        self.name
            .split_whitespace()
            .filter_map(|word| word.chars().next())
            .flat_map(char::to_uppercase)
            .take(2)
            .collect()
    }

    pub fn load(db: &Database) -> Self {
        match db.get_json(PROFILE_KEY) {
            Ok(Some(profile)) => profile,
            Ok(None) => Self::default(),
            Err(err) => {
                warn!(error = %err, "stored profile unreadable, using defaults");
                Self::default()
            }
        }
    }

    pub fn save(&self, db: &Database) -> Result<()> {
        db.put_json(PROFILE_KEY, self)
    }
}

/// Six characters from an alphabet without look-alike glyphs.
pub fn generate_share_code(bits: u128) -> String {
    (0..SHARE_CODE_LEN)
        .map(|i| SHARE_CODE_ALPHABET[((bits >> (i * 5)) & 0x1f) as usize] as char)
        .collect()
}

fn short_random_id(bits: u128) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut value = bits;
    (0..7)
        .map(|_| {
            let digit = DIGITS[(value % 36) as usize] as char;
            value /= 36;
            digit
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn share_code_uses_unambiguous_alphabet() {
        for bits in [0u128, u128::MAX, 0x1234_5678_9abc_def0] {
            let code = generate_share_code(bits);
            assert_eq!(code.len(), SHARE_CODE_LEN);
            assert!(code.bytes().all(|b| SHARE_CODE_ALPHABET.contains(&b)));
            assert!(!code.contains('0') && !code.contains('O') && !code.contains('I'));
        }
    }

    #[test]
    fn start_and_stop_sharing() {
        let mut settings = UserSettings::default();
        let code = settings.start_sharing().to_string();
        assert!(settings.is_shared);
        assert_eq!(settings.share_code.as_deref(), Some(code.as_str()));

        settings.join("abc234").unwrap();
        assert_eq!(settings.connected_users.len(), 2);

        settings.stop_sharing();
        assert!(!settings.is_shared);
        assert_eq!(settings.share_code, None);
        assert_eq!(settings.connected_users, vec![Collaborator::owner()]);
    }

    #[rstest]
    #[case("abc")]
    #[case("abcdefg")]
    #[case("")]
    fn join_requires_six_characters(#[case] code: &str) {
        let mut settings = UserSettings::default();
        assert_eq!(
            settings.join(code).unwrap_err(),
            ShareError::InvalidCode(code.into())
        );
        assert!(!settings.is_shared);
    }

    #[test]
    fn join_uppercases_code() {
        let mut settings = UserSettings::default();
        let joined = settings.join("xk7p2q").unwrap();
        assert!(!joined.is_owner);
        assert_eq!(settings.share_code.as_deref(), Some("XK7P2Q"));
    }

    #[test]
    fn owner_cannot_be_removed() {
        let mut settings = UserSettings::default();
        assert_eq!(
            settings.remove_collaborator("owner").unwrap_err(),
            ShareError::CannotRemoveOwner
        );
        let guest = settings.join("ABCDEF").unwrap().id;
        settings.remove_collaborator(&guest).unwrap();
        assert_eq!(settings.connected_users.len(), 1);
    }

    #[test]
    fn header_title_follows_mode() {
        let mut settings = UserSettings::default();
        let date = DateKey::from_ymd(2025, 1, 2).unwrap();
        assert_eq!(settings.header_title(date), "2025");
        settings.header_mode = HeaderMode::Custom;
        settings.set_title("  Family  ");
        assert_eq!(settings.header_title(date), "Family");
        settings.set_title(" ");
        assert_eq!(settings.header_title(date), DEFAULT_TITLE);
    }

    #[test]
    fn reset_keeps_visual_preferences() {
        let mut settings = UserSettings {
            accent: Accent::Teal,
            background: Background::Slate,
            ..UserSettings::default()
        };
        settings.set_title("Work");
        settings.start_sharing();
        settings.reset_account();
        assert_eq!(settings.accent, Accent::Teal);
        assert_eq!(settings.background, Background::Slate);
        assert_eq!(settings.title, DEFAULT_TITLE);
        assert!(!settings.is_shared);
    }

    #[rstest]
    #[case("Demo User", "DU")]
    #[case("ana maria lopez", "AM")]
    #[case("Prince", "P")]
    #[case("", "")]
    fn initials_from_name(#[case] name: &str, #[case] expected: &str) {
        let profile = UserProfile {
            name: name.into(),
            ..UserProfile::default()
        };
        assert_eq!(profile.initials(), expected);
    }

    #[test]
    fn settings_persist_and_tolerate_partial_documents() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(UserSettings::load(&db), UserSettings::default());

        let mut settings = UserSettings::default();
        settings.accent = Accent::Rose;
        settings.save(&db).unwrap();
        assert_eq!(UserSettings::load(&db), settings);

        db.put(SETTINGS_KEY, r#"{"accent":"blue"}"#).unwrap();
        let partial = UserSettings::load(&db);
        assert_eq!(partial.accent, Accent::Blue);
        assert_eq!(partial.title, DEFAULT_TITLE);
    }

    #[test]
    fn accent_cycles_through_all_values() {
        let mut accent = Accent::Amber;
        for _ in 0..Accent::ALL.len() {
            accent = accent.cycle();
        }
        assert_eq!(accent, Accent::Amber);
    }
}
