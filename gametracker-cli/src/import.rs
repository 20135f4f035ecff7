//! Turns tab-separated spreadsheet exports into games.
//!
//! Columns are recognised by their (Italian) header. Rows without a title,
//! a platform or a known status are rejected; a malformed optional cell only
//! drops that value and is reported as a warning.
use chrono::{Datelike, NaiveDate};
use gametracker_dto::games::{check_range, DIFFICULTY_RANGE, PERCENT_RANGE};
use gametracker_dto::{Game, GameDraft, GameField, GameId, GameStatus};
use serde::Serialize;
use std::ops::RangeInclusive;
use tracing::{debug, warn};
use tsvary::{Document, Record};

/// Header to field table. Matching ignores surrounding whitespace and
/// case. Several headers may map to the same field; the first column found
/// wins.
pub const TSV_HEADERS: &[(&str, GameField)] = &[
    ("Titolo", GameField::Title),
    ("Piattaforma", GameField::Platforms),
    ("Ore di gioco", GameField::Playtime),
    ("Voto Totale", GameField::TotalRating),
    ("Voto Aesthetic", GameField::AestheticRating),
    ("Voto OST", GameField::SoundtrackRating),
    ("Difficoltà", GameField::Difficulty),
    // Same header after a round trip through a Mac-Roman spreadsheet.
    ("Difficolt√†", GameField::Difficulty),
    ("Difficolta", GameField::Difficulty),
    ("Stato", GameField::Status),
    ("% Trofei", GameField::TrophyPercentage),
    ("Platino/Masterato", GameField::Platinum),
    ("Dettagli Platinato/Masterato", GameField::PlatinumDetail),
    ("Replay completati", GameField::Replays),
    ("Prima volta giocato", GameField::FirstPlayed),
    ("Ultima volta finito", GameField::LastFinished),
    ("Link Copertina", GameField::CoverImageUrl),
    ("ID", GameField::Id),
];

/// Columns that must be present for an import to start.
pub const REQUIRED_FIELDS: [GameField; 3] =
    [GameField::Title, GameField::Platforms, GameField::Status];

/// Earliest and latest year accepted when reading a date.
const YEARS: RangeInclusive<i32> = 1950..=2100;

/// Date layouts recognised in date cells, tried in order.
const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y"];

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error(transparent)]
    Tsv(#[from] tsvary::Error),

    #[error("missing required column {0:?}")]
    MissingColumn(&'static str),
}

/// A row that did not produce a game.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedRow {
    pub line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub reason: String,
}

/// A cell that was ignored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellWarning {
    pub line: usize,
    pub field: GameField,
    pub value: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportBatch {
    pub games: Vec<Game>,
    pub rejected: Vec<RejectedRow>,
    pub warnings: Vec<CellWarning>,
}

fn header_field(header: &str) -> Option<GameField> {
    let header = header.trim().to_lowercase();
    TSV_HEADERS
        .iter()
        .find(|(name, _)| name.to_lowercase() == header)
        .map(|(_, field)| *field)
}

fn header_name(field: GameField) -> &'static str {
    TSV_HEADERS
        .iter()
        .find(|(_, f)| *f == field)
        .map_or("?", |(name, _)| name)
}

/// Maps each known column to its field.
fn columns(doc: &Document) -> Result<Vec<(GameField, usize)>, ImportError> {
    let mut columns: Vec<(GameField, usize)> = Vec::new();
    for (index, header) in doc.headers().iter().enumerate() {
        match header_field(header) {
            Some(field) if columns.iter().any(|(f, _)| *f == field) => {
                warn!(header = %header, %field, "Column maps to a field already read, ignoring");
            }
            Some(field) => columns.push((field, index)),
            None => debug!(header = %header, "Ignoring unknown column"),
        }
    }

    for field in REQUIRED_FIELDS {
        if !columns.iter().any(|(f, _)| *f == field) {
            return Err(ImportError::MissingColumn(header_name(field)));
        }
    }
    Ok(columns)
}

pub fn parse_platforms(cell: &str) -> Vec<String> {
    cell.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// A number with an optional decimal comma and an optional trailing `%`.
pub fn parse_number(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    let cell = cell.strip_suffix('%').unwrap_or(cell).trim();
    cell.replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

pub fn parse_bool(cell: &str) -> Option<bool> {
    match cell.trim().to_lowercase().as_str() {
        "sì" | "si" | "yes" | "y" | "true" | "vero" | "x" | "1" | "✓" | "✔" => Some(true),
        "no" | "n" | "false" | "falso" | "0" | "-" => Some(false),
        _ => None,
    }
}

/// A count such as `2` or `2.0`.
pub fn parse_count(cell: &str) -> Option<u32> {
    let cell = cell.trim();
    cell.parse::<u32>().ok().or_else(|| {
        parse_number(cell)
            .filter(|n| n.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(n))
            .map(|n| n as u32)
    })
}

/// Rewrites recognised dates as `YYYY-MM-DD` and keeps anything else, like
/// "Estate 2015", as written.
pub fn normalize_date(cell: &str) -> String {
    let cell = cell.trim();
    DATE_FORMATS
        .iter()
        .filter_map(|format| NaiveDate::parse_from_str(cell, format).ok())
        .find(|date| YEARS.contains(&date.year()))
        .map_or_else(|| cell.to_string(), |date| date.format("%Y-%m-%d").to_string())
}

struct Row<'a> {
    record: &'a Record,
    warnings: &'a mut Vec<CellWarning>,
}

impl Row<'_> {
    fn warn(&mut self, field: GameField, value: &str, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(line = self.record.line(), %field, value, %reason, "Ignoring cell");
        self.warnings.push(CellWarning {
            line: self.record.line(),
            field,
            value: value.to_string(),
            reason,
        });
    }

    fn number(&mut self, field: GameField, cell: &str, range: RangeInclusive<f64>) -> Option<f64> {
        match parse_number(cell) {
            None => {
                self.warn(field, cell, "not a number");
                None
            }
            Some(n) => match check_range(field, n, range) {
                Ok(n) => Some(n),
                Err(e) => {
                    self.warn(field, cell, e.to_string());
                    None
                }
            },
        }
    }

    fn parse(&mut self, columns: &[(GameField, usize)]) -> Result<Game, RejectedRow> {
        let line = self.record.line();
        let mut draft = GameDraft::default();
        let mut id = None;
        let mut status = None;

        for &(field, column) in columns {
            let Some(cell) = self.record.get(column) else {
                continue;
            };

            match field {
                GameField::Id => id = cell.parse::<GameId>().ok(),
                GameField::Title => draft.title = cell.to_string(),
                GameField::Platforms => draft.platforms = parse_platforms(cell),
                GameField::Playtime => draft.playtime = Some(cell.to_string()),
                GameField::TotalRating => {
                    draft.total_rating = self.number(field, cell, PERCENT_RANGE)
                }
                GameField::AestheticRating => {
                    draft.aesthetic_rating = self.number(field, cell, PERCENT_RANGE)
                }
                GameField::SoundtrackRating => {
                    draft.soundtrack_rating = self.number(field, cell, PERCENT_RANGE)
                }
                GameField::Difficulty => {
                    draft.difficulty = self.number(field, cell, DIFFICULTY_RANGE)
                }
                GameField::TrophyPercentage => {
                    draft.trophy_percentage = self.number(field, cell, PERCENT_RANGE)
                }
                GameField::Status => match cell.parse::<GameStatus>() {
                    Ok(s) => status = Some(s),
                    Err(_) => {
                        return Err(RejectedRow {
                            line,
                            title: None,
                            reason: format!("unknown status {cell:?}"),
                        })
                    }
                },
                GameField::Platinum => {
                    draft.platinum = parse_bool(cell);
                    if draft.platinum.is_none() {
                        self.warn(field, cell, "not a yes/no value");
                    }
                }
                GameField::PlatinumDetail => draft.platinum_detail = Some(cell.to_string()),
                GameField::Replays => {
                    draft.replays = parse_count(cell);
                    if draft.replays.is_none() {
                        self.warn(field, cell, "not a whole number");
                    }
                }
                GameField::FirstPlayed => draft.first_played = Some(normalize_date(cell)),
                GameField::LastFinished => draft.last_finished = Some(normalize_date(cell)),
                GameField::CoverImageUrl => match url::Url::parse(cell) {
                    Ok(_) => draft.cover_image_url = Some(cell.to_string()),
                    Err(e) => self.warn(field, cell, e.to_string()),
                },
                GameField::RawgId => {}
            }
        }

        let reject = |title: &str, reason: String| RejectedRow {
            line,
            title: Some(title.to_string()).filter(|t| !t.is_empty()),
            reason,
        };

        draft.status = status.ok_or_else(|| reject(&draft.title, "missing status".to_string()))?;
        let draft = draft.normalized();
        draft
            .validate()
            .map_err(|e| reject(&draft.title, e.to_string()))?;

        Ok(draft.into_game(id.unwrap_or_else(GameId::generate)))
    }
}

/// Parses a TSV export into games, each with its `ID` column value or a
/// fresh id.
pub fn parse_games(text: &str) -> Result<ImportBatch, ImportError> {
    let doc = Document::parse(text)?;
    let columns = columns(&doc)?;
    let mut batch = ImportBatch::default();

    for record in doc.records() {
        let mut row = Row {
            record,
            warnings: &mut batch.warnings,
        };
        match row.parse(&columns) {
            Ok(game) => batch.games.push(game),
            Err(mut rejected) => {
                if rejected.title.is_none() {
                    rejected.title = columns
                        .iter()
                        .find(|(f, _)| *f == GameField::Title)
                        .and_then(|(_, column)| record.get(*column))
                        .map(str::to_string);
                }
                warn!(line = rejected.line, reason = %rejected.reason, "Rejecting row");
                batch.rejected.push(rejected);
            }
        }
    }

    debug!(
        games = batch.games.len(),
        rejected = batch.rejected.len(),
        warnings = batch.warnings.len(),
        "Parsed TSV"
    );
    Ok(batch)
}
