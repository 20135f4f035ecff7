use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Deref, DerefMut, RangeInclusive};
use std::str::FromStr;
use strum::{Display, EnumString};

/// Scale of the overall, aesthetic and soundtrack ratings and of the trophy
/// completion percentage.
pub const PERCENT_RANGE: RangeInclusive<f64> = 0.0..=100.0;

/// Scale of the difficulty rating.
pub const DIFFICULTY_RANGE: RangeInclusive<f64> = 0.0..=10.0;

/// An opaque identifier for a game. Unique across the played list and the
/// backlog.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(String);

impl GameId {
    /// A fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for GameId {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            Err("Game id cannot be empty")
        } else {
            Ok(Self(s.to_string()))
        }
    }
}

/// Where a game is in its lifecycle. `NotStarted` is the backlog; every
/// other status means the game has been played.
///
/// Parsing accepts the snake_case name, the English label or the Italian
/// label used by spreadsheet exports, ignoring ASCII case.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(ascii_case_insensitive)]
pub enum GameStatus {
    #[default]
    #[strum(to_string = "Not started", serialize = "not_started", serialize = "Da Iniziare")]
    NotStarted,
    #[strum(
        to_string = "Mastered/Platinum",
        serialize = "mastered_platinum",
        serialize = "Masterato/Platinato"
    )]
    MasteredPlatinum,
    #[serde(rename = "completed_100")]
    #[strum(
        to_string = "Completed (100%)",
        serialize = "completed_100",
        serialize = "Completato (100%)"
    )]
    Completed100,
    #[strum(to_string = "Finished", serialize = "Finito")]
    Finished,
    #[strum(to_string = "Paused", serialize = "In Pausa")]
    Paused,
    #[strum(to_string = "Dropped", serialize = "Droppato")]
    Dropped,
    #[strum(to_string = "In progress", serialize = "in_progress", serialize = "In Corso")]
    InProgress,
    #[strum(
        to_string = "Online/Endless",
        serialize = "endless",
        serialize = "Online/Senza Fine"
    )]
    Endless,
    #[strum(to_string = "Archived", serialize = "Archiviato")]
    Archived,
}

impl GameStatus {
    pub const ALL: [GameStatus; 9] = [
        GameStatus::NotStarted,
        GameStatus::MasteredPlatinum,
        GameStatus::Completed100,
        GameStatus::Finished,
        GameStatus::Paused,
        GameStatus::Dropped,
        GameStatus::InProgress,
        GameStatus::Endless,
        GameStatus::Archived,
    ];

    pub fn is_backlog(self) -> bool {
        self == GameStatus::NotStarted
    }

    /// The list a game with this status belongs to.
    pub fn list(self) -> ListKind {
        if self.is_backlog() {
            ListKind::Backlog
        } else {
            ListKind::Played
        }
    }

    /// The Italian label used by spreadsheet exports. Statuses sort by it.
    pub fn label_it(self) -> &'static str {
        match self {
            GameStatus::NotStarted => "Da Iniziare",
            GameStatus::MasteredPlatinum => "Masterato/Platinato",
            GameStatus::Completed100 => "Completato (100%)",
            GameStatus::Finished => "Finito",
            GameStatus::Paused => "In Pausa",
            GameStatus::Dropped => "Droppato",
            GameStatus::InProgress => "In Corso",
            GameStatus::Endless => "Online/Senza Fine",
            GameStatus::Archived => "Archiviato",
        }
    }
}

/// The two lists a game can live in.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ListKind {
    Played,
    Backlog,
}

/// Every field of a [`Game`]. Used to pick a sort order and to name fields
/// in validation errors.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GameField {
    Id,
    Title,
    Platforms,
    Playtime,
    TotalRating,
    AestheticRating,
    SoundtrackRating,
    Difficulty,
    Status,
    TrophyPercentage,
    Platinum,
    PlatinumDetail,
    Replays,
    FirstPlayed,
    LastFinished,
    CoverImageUrl,
    RawgId,
}

impl GameField {
    /// Human readable name of the field.
    pub fn label(self) -> &'static str {
        match self {
            GameField::Id => "Id",
            GameField::Title => "Title",
            GameField::Platforms => "Platform",
            GameField::Playtime => "Playtime",
            GameField::TotalRating => "Total rating (0-100)",
            GameField::AestheticRating => "Aesthetic rating (0-100)",
            GameField::SoundtrackRating => "Soundtrack rating (0-100)",
            GameField::Difficulty => "Difficulty (0-10)",
            GameField::Status => "Status",
            GameField::TrophyPercentage => "Trophies % (0-100)",
            GameField::Platinum => "Platinum/Mastered",
            GameField::PlatinumDetail => "Platinum details",
            GameField::Replays => "Replays",
            GameField::FirstPlayed => "First played",
            GameField::LastFinished => "Last finished",
            GameField::CoverImageUrl => "Cover image",
            GameField::RawgId => "RAWG id",
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{} is required", .0.label())]
    Required(GameField),

    #[error("{} must be between {} and {}, got {value}", .field.label(), .range.start(), .range.end())]
    OutOfRange {
        field: GameField,
        value: f64,
        range: RangeInclusive<f64>,
    },

    #[error("{} is not a valid URL: {value}", .field.label())]
    InvalidUrl { field: GameField, value: String },
}

/// Everything known about a game except its identifier. This is what a form
/// submission or an imported row produces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameDraft {
    pub title: String,

    /// Platforms the game was played on, in the order given.
    pub platforms: Vec<String>,

    /// Free-text playtime, e.g. "40h" or "~100".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playtime: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_rating: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aesthetic_rating: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soundtrack_rating: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<f64>,

    pub status: GameStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trophy_percentage: Option<f64>,

    /// Whether the game was platinumed or mastered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platinum: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platinum_detail: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replays: Option<u32>,

    /// A date (`YYYY-MM-DD`) or free text such as "Summer 2015".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_played: Option<String>,

    /// A date (`YYYY-MM-DD`) or free text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_finished: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image_url: Option<String>,

    /// Identifier of the game in the RAWG catalog, when the cover came from there.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rawg_id: Option<i64>,
}

impl GameDraft {
    pub fn new(title: impl Into<String>, platforms: Vec<String>, status: GameStatus) -> Self {
        Self {
            title: title.into(),
            platforms,
            status,
            ..Default::default()
        }
    }

    /// Trims text fields, drops blank platforms and turns blank optional
    /// text into `None`.
    pub fn normalized(mut self) -> Self {
        fn text(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        self.title = self.title.trim().to_string();
        self.platforms = self
            .platforms
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        self.playtime = text(self.playtime);
        self.platinum_detail = text(self.platinum_detail);
        self.first_played = text(self.first_played);
        self.last_finished = text(self.last_finished);
        self.cover_image_url = text(self.cover_image_url);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::Required(GameField::Title));
        }
        if self.platforms.iter().all(|p| p.trim().is_empty()) {
            return Err(ValidationError::Required(GameField::Platforms));
        }

        for (field, value, range) in [
            (GameField::TotalRating, self.total_rating, PERCENT_RANGE),
            (GameField::AestheticRating, self.aesthetic_rating, PERCENT_RANGE),
            (GameField::SoundtrackRating, self.soundtrack_rating, PERCENT_RANGE),
            (GameField::Difficulty, self.difficulty, DIFFICULTY_RANGE),
            (GameField::TrophyPercentage, self.trophy_percentage, PERCENT_RANGE),
        ] {
            if let Some(value) = value {
                check_range(field, value, range)?;
            }
        }

        if let Some(cover) = &self.cover_image_url {
            if url::Url::parse(cover).is_err() {
                return Err(ValidationError::InvalidUrl {
                    field: GameField::CoverImageUrl,
                    value: cover.clone(),
                });
            }
        }

        Ok(())
    }

    /// Clears an optional field. Required fields cannot be cleared.
    pub fn clear(&mut self, field: GameField) -> Result<(), ValidationError> {
        match field {
            GameField::Id | GameField::Title | GameField::Platforms | GameField::Status => {
                return Err(ValidationError::Required(field));
            }
            GameField::Playtime => self.playtime = None,
            GameField::TotalRating => self.total_rating = None,
            GameField::AestheticRating => self.aesthetic_rating = None,
            GameField::SoundtrackRating => self.soundtrack_rating = None,
            GameField::Difficulty => self.difficulty = None,
            GameField::TrophyPercentage => self.trophy_percentage = None,
            GameField::Platinum => self.platinum = None,
            GameField::PlatinumDetail => self.platinum_detail = None,
            GameField::Replays => self.replays = None,
            GameField::FirstPlayed => self.first_played = None,
            GameField::LastFinished => self.last_finished = None,
            GameField::CoverImageUrl => self.cover_image_url = None,
            GameField::RawgId => self.rawg_id = None,
        }
        Ok(())
    }

    pub fn into_game(self, id: GameId) -> Game {
        Game { id, draft: self }
    }
}

/// Checks that `value` is a finite number inside `range`.
pub fn check_range(
    field: GameField,
    value: f64,
    range: RangeInclusive<f64>,
) -> Result<f64, ValidationError> {
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(ValidationError::OutOfRange {
            field,
            value,
            range,
        })
    }
}

/// A tracked game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,

    #[serde(flatten)]
    pub draft: GameDraft,
}

impl Game {
    pub fn list(&self) -> ListKind {
        self.draft.status.list()
    }
}

impl Deref for Game {
    type Target = GameDraft;

    fn deref(&self) -> &Self::Target {
        &self.draft
    }
}

impl DerefMut for Game {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.draft
    }
}
