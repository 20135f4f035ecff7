//! Ordering of games by any of their fields.
//!
//! Fields hold values of different kinds (text, numbers, flags, dates kept
//! as text, platform lists), so every field is first projected onto a
//! [`Value`] and the projections are compared. Absent values sort after
//! present ones when ascending.
use crate::collation::collate;
use crate::games::Game;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use strum::{Display, EnumString};

pub use crate::games::GameField as SortKey;

impl SortKey {
    /// The properties offered to users for sorting, in display order.
    pub const SORTABLE: [SortKey; 14] = [
        SortKey::Title,
        SortKey::Platforms,
        SortKey::Status,
        SortKey::TotalRating,
        SortKey::Playtime,
        SortKey::Difficulty,
        SortKey::TrophyPercentage,
        SortKey::Platinum,
        SortKey::PlatinumDetail,
        SortKey::FirstPlayed,
        SortKey::LastFinished,
        SortKey::AestheticRating,
        SortKey::SoundtrackRating,
        SortKey::Replays,
    ];
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortConfig {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self::ascending(SortKey::Title)
    }
}

impl SortConfig {
    pub fn ascending(key: SortKey) -> Self {
        Self {
            key,
            direction: SortDirection::Asc,
        }
    }

    pub fn descending(key: SortKey) -> Self {
        Self {
            key,
            direction: SortDirection::Desc,
        }
    }

    /// The configuration after the user picks `key`: picking the current key
    /// while ascending switches to descending, anything else sorts ascending
    /// by `key`.
    pub fn toggled(self, key: SortKey) -> Self {
        if self.key == key && self.direction == SortDirection::Asc {
            Self::descending(key)
        } else {
            Self::ascending(key)
        }
    }

    pub fn compare(&self, a: &Game, b: &Game) -> Ordering {
        let ordering = compare(a, b, self.key);
        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// A field value projected for comparison.
#[derive(Debug, PartialEq)]
enum Value<'a> {
    Missing,
    Number(f64),
    Flag(bool),
    Text(&'a str),
    /// Lower-cased text that may hold an ISO date.
    DateText(String),
    /// Text built for the comparison. Never missing.
    Owned(String),
}

fn folded(value: &Option<String>) -> String {
    value.as_deref().unwrap_or_default().to_lowercase()
}

fn project(game: &Game, key: SortKey) -> Value<'_> {
    fn number(value: Option<f64>) -> Value<'static> {
        value.map_or(Value::Missing, Value::Number)
    }

    match key {
        SortKey::Id => Value::Text(game.id.as_str()),
        SortKey::Title => Value::Text(&game.title),
        SortKey::Platforms => Value::Text(game.platforms.first().map_or("", String::as_str)),
        SortKey::Playtime => Value::Owned(folded(&game.playtime)),
        SortKey::TotalRating => number(game.total_rating),
        SortKey::AestheticRating => number(game.aesthetic_rating),
        SortKey::SoundtrackRating => number(game.soundtrack_rating),
        SortKey::Difficulty => number(game.difficulty),
        SortKey::Status => Value::Text(game.status.label_it()),
        SortKey::TrophyPercentage => number(game.trophy_percentage),
        SortKey::Platinum => game.platinum.map_or(Value::Missing, Value::Flag),
        SortKey::PlatinumDetail => Value::Owned(folded(&game.platinum_detail)),
        SortKey::Replays => number(game.replays.map(f64::from)),
        SortKey::FirstPlayed => Value::DateText(folded(&game.first_played)),
        SortKey::LastFinished => Value::DateText(folded(&game.last_finished)),
        SortKey::CoverImageUrl => game
            .cover_image_url
            .as_deref()
            .map_or(Value::Missing, Value::Text),
        SortKey::RawgId => number(game.rawg_id.map(|id| id as f64)),
    }
}

/// `YYYY-MM-DD`, exactly.
fn iso_date(s: &str) -> Option<NaiveDate> {
    let b = s.as_bytes();
    let shaped = b.len() == 10
        && b[4] == b'-'
        && b[7] == b'-'
        && b.iter()
            .enumerate()
            .all(|(i, c)| i == 4 || i == 7 || c.is_ascii_digit());
    if shaped {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
    } else {
        None
    }
}

/// Ascending comparison of two games by `key`.
pub fn compare(a: &Game, b: &Game, key: SortKey) -> Ordering {
    match (project(a, key), project(b, key)) {
        (Value::Missing, Value::Missing) => Ordering::Equal,
        (Value::Missing, _) => Ordering::Greater,
        (_, Value::Missing) => Ordering::Less,
        (Value::Number(x), Value::Number(y)) => x.total_cmp(&y),
        // `true` first.
        (Value::Flag(x), Value::Flag(y)) => y.cmp(&x),
        (Value::Text(x), Value::Text(y)) => collate(x, y),
        (Value::Owned(x), Value::Owned(y)) => collate(&x, &y),
        (Value::DateText(x), Value::DateText(y)) => match (iso_date(&x), iso_date(&y)) {
            (Some(dx), Some(dy)) => dx.cmp(&dy),
            _ => collate(&x, &y),
        },
        // Both sides come from the same key, so the kinds always agree.
        _ => Ordering::Equal,
    }
}

/// A sorted copy of `games`. Games that compare equal keep their order.
pub fn sort_games(games: &[Game], config: &SortConfig) -> Vec<Game> {
    let mut sorted = games.to_vec();
    sorted.sort_by(|a, b| config.compare(a, b));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::{GameDraft, GameStatus};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn game(id: &str, title: &str) -> Game {
        GameDraft::new(title, vec!["PC".to_string()], GameStatus::Finished)
            .into_game(id.parse().unwrap())
    }

    fn ids(games: &[Game]) -> Vec<&str> {
        games.iter().map(|g| g.id.as_str()).collect()
    }

    #[test]
    fn toggling() {
        let config = SortConfig::default();
        assert_eq!(config, SortConfig::ascending(SortKey::Title));

        let config = config.toggled(SortKey::Title);
        assert_eq!(config, SortConfig::descending(SortKey::Title));

        // Desc on the same key goes back to asc.
        let config = config.toggled(SortKey::Title);
        assert_eq!(config, SortConfig::ascending(SortKey::Title));

        let config = config.toggled(SortKey::TotalRating);
        assert_eq!(config, SortConfig::ascending(SortKey::TotalRating));
    }

    #[test]
    fn titles_ignore_case_and_accents() {
        let games = vec![
            game("1", "zelda"),
            game("2", "Ōkami"),
            game("3", "Celeste"),
            game("4", "okami"),
        ];
        let sorted = sort_games(&games, &SortConfig::ascending(SortKey::Title));
        assert_eq!(ids(&sorted), vec!["3", "2", "4", "1"]);
    }

    #[test]
    fn missing_numbers_last_ascending_first_descending() {
        let mut games = vec![game("a", "A"), game("b", "B"), game("c", "C"), game("d", "D")];
        games[0].total_rating = Some(70.0);
        games[2].total_rating = Some(95.5);
        games[3].total_rating = Some(8.0);

        let asc = sort_games(&games, &SortConfig::ascending(SortKey::TotalRating));
        assert_eq!(ids(&asc), vec!["d", "a", "c", "b"]);

        let desc = sort_games(&games, &SortConfig::descending(SortKey::TotalRating));
        assert_eq!(ids(&desc), vec!["b", "c", "a", "d"]);
    }

    #[test]
    fn platinum_true_first() {
        let mut games = vec![game("a", "A"), game("b", "B"), game("c", "C")];
        games[0].platinum = Some(false);
        games[1].platinum = None;
        games[2].platinum = Some(true);

        let sorted = sort_games(&games, &SortConfig::ascending(SortKey::Platinum));
        assert_eq!(ids(&sorted), vec!["c", "a", "b"]);
    }

    #[test]
    fn platforms_by_first_entry() {
        let mut games = vec![game("a", "A"), game("b", "B"), game("c", "C")];
        games[0].platforms = vec!["Switch".into(), "Android".into()];
        games[1].platforms = vec!["PS5".into()];
        games[2].platforms = vec![];

        let sorted = sort_games(&games, &SortConfig::ascending(SortKey::Platforms));
        assert_eq!(ids(&sorted), vec!["c", "b", "a"]);
    }

    #[test]
    fn dates_chronological_text_collated_blank_first() {
        let mut games = vec![
            game("a", "A"),
            game("b", "B"),
            game("c", "C"),
            game("d", "D"),
        ];
        games[0].first_played = Some("2021-03-01".into());
        games[1].first_played = Some("2019-12-24".into());
        games[2].first_played = Some("Estate 2015".into());
        games[3].first_played = None;

        let sorted = sort_games(&games, &SortConfig::ascending(SortKey::FirstPlayed));
        // Blank text is "" rather than missing, and digits sort before letters.
        assert_eq!(ids(&sorted), vec!["d", "b", "a", "c"]);
    }

    #[rstest]
    #[case("2020-02-30", None)]
    #[case("2020-2-3", None)]
    #[case("2020-02-03", NaiveDate::from_ymd_opt(2020, 2, 3))]
    #[case(" 2020-02-03", None)]
    fn iso_dates(#[case] input: &str, #[case] expected: Option<NaiveDate>) {
        assert_eq!(iso_date(input), expected);
    }

    #[test]
    fn free_text_ignores_case() {
        let mut games = vec![game("a", "A"), game("b", "B"), game("c", "C")];
        games[0].playtime = Some("b".into());
        games[1].playtime = Some("A".into());
        games[2].playtime = Some("C".into());

        let sorted = sort_games(&games, &SortConfig::ascending(SortKey::Playtime));
        assert_eq!(ids(&sorted), vec!["b", "a", "c"]);
    }

    #[test]
    fn status_by_italian_label() {
        let games: Vec<Game> = GameStatus::ALL
            .iter()
            .enumerate()
            .map(|(i, status)| {
                let mut g = game(&i.to_string(), "Same");
                g.status = *status;
                g
            })
            .collect();

        let sorted = sort_games(&games, &SortConfig::ascending(SortKey::Status));
        let labels: Vec<&str> = sorted.iter().map(|g| g.status.label_it()).collect();
        assert_eq!(
            labels,
            vec![
                "Archiviato",
                "Completato (100%)",
                "Da Iniziare",
                "Droppato",
                "Finito",
                "In Corso",
                "In Pausa",
                "Masterato/Platinato",
                "Online/Senza Fine",
            ]
        );
    }

    #[test]
    fn ties_keep_insertion_order_both_directions() {
        let games = vec![game("1", "Same"), game("2", "same"), game("3", "SAME")];
        for config in [
            SortConfig::ascending(SortKey::Title),
            SortConfig::descending(SortKey::Title),
        ] {
            assert_eq!(ids(&sort_games(&games, &config)), vec!["1", "2", "3"]);
        }
    }
}
