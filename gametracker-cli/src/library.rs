//! The played list and the backlog, kept consistent with each other.
//!
//! Every game lives in exactly one list, chosen by its status, and ids are
//! unique across both lists. All mutations go through [`Library`] so those
//! rules hold after each call.
use crate::storage::{to_json, Storage, StorageError, BACKLOG_KEY, PLAYED_KEY, VIEW_KEY};
use gametracker_dto::sort::{sort_games, SortConfig, SortKey};
use gametracker_dto::{Game, GameDraft, GameId, ListKind, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    #[error("no game with id {0}")]
    NotFound(GameId),

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("stored games are inconsistent: {0}")]
    Corrupt(String),
}

/// How each list is sorted when shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    #[serde(default)]
    pub played: SortConfig,
    #[serde(default)]
    pub backlog: SortConfig,
}

/// A game that was not imported because its id was already taken.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedGame {
    pub id: GameId,
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportOutcome {
    pub played: usize,
    pub backlog: usize,
    pub skipped: Vec<SkippedGame>,
}

impl ImportOutcome {
    pub fn imported(&self) -> usize {
        self.played + self.backlog
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Library {
    played: Vec<Game>,
    backlog: Vec<Game>,
    view: ViewState,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a library from two stored lists, checking that every game is
    /// in the list its status requires and that no id repeats.
    pub fn from_lists(played: Vec<Game>, backlog: Vec<Game>) -> Result<Self, LibraryError> {
        let mut seen = HashSet::new();
        for (kind, list) in [(ListKind::Played, &played), (ListKind::Backlog, &backlog)] {
            for game in list {
                if game.list() != kind {
                    return Err(LibraryError::Corrupt(format!(
                        "game {} ({:?}) has status {} but is stored in {kind}",
                        game.id, game.title, game.status
                    )));
                }
                if !seen.insert(&game.id) {
                    return Err(LibraryError::Corrupt(format!(
                        "id {} is used more than once",
                        game.id
                    )));
                }
            }
        }

        Ok(Self {
            played,
            backlog,
            view: ViewState::default(),
        })
    }

    pub fn load(storage: &impl Storage) -> Result<Self, LibraryError> {
        let played = storage.load_json(PLAYED_KEY)?.unwrap_or_default();
        let backlog = storage.load_json(BACKLOG_KEY)?.unwrap_or_default();
        let mut library = Self::from_lists(played, backlog)?;
        library.view = storage.load_json(VIEW_KEY)?.unwrap_or_default();

        debug!(
            played = library.played.len(),
            backlog = library.backlog.len(),
            "Library loaded"
        );
        Ok(library)
    }

    pub fn save(&self, storage: &mut impl Storage) -> Result<(), LibraryError> {
        // Both lists are written together so a game moving between them is
        // never stored twice or lost.
        storage.save_all(&[
            (PLAYED_KEY, to_json(PLAYED_KEY, &self.played)?),
            (BACKLOG_KEY, to_json(BACKLOG_KEY, &self.backlog)?),
            (VIEW_KEY, to_json(VIEW_KEY, &self.view)?),
        ])?;
        Ok(())
    }

    pub fn list(&self, kind: ListKind) -> &[Game] {
        match kind {
            ListKind::Played => &self.played,
            ListKind::Backlog => &self.backlog,
        }
    }

    fn list_mut(&mut self, kind: ListKind) -> &mut Vec<Game> {
        match kind {
            ListKind::Played => &mut self.played,
            ListKind::Backlog => &mut self.backlog,
        }
    }

    fn position(&self, id: &GameId) -> Option<(ListKind, usize)> {
        [ListKind::Played, ListKind::Backlog]
            .into_iter()
            .find_map(|kind| {
                self.list(kind)
                    .iter()
                    .position(|g| &g.id == id)
                    .map(|index| (kind, index))
            })
    }

    pub fn get(&self, id: &GameId) -> Option<&Game> {
        self.position(id)
            .map(|(kind, index)| &self.list(kind)[index])
    }

    pub fn len(&self) -> usize {
        self.played.len() + self.backlog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn sort_config(&self, kind: ListKind) -> SortConfig {
        match kind {
            ListKind::Played => self.view.played,
            ListKind::Backlog => self.view.backlog,
        }
    }

    /// The games of `kind`, ordered by that list's sort configuration.
    pub fn sorted(&self, kind: ListKind) -> Vec<Game> {
        sort_games(self.list(kind), &self.sort_config(kind))
    }

    /// Picks `key` as the sort key of `kind`. Picking the current key again
    /// flips an ascending sort to descending.
    pub fn sort_by(&mut self, kind: ListKind, key: SortKey) -> SortConfig {
        let config = match kind {
            ListKind::Played => &mut self.view.played,
            ListKind::Backlog => &mut self.view.backlog,
        };
        *config = config.toggled(key);
        *config
    }

    /// Adds a new game under a fresh id.
    pub fn add(&mut self, draft: GameDraft) -> Result<&Game, LibraryError> {
        let draft = draft.normalized();
        draft.validate()?;

        let game = draft.into_game(GameId::generate());
        let kind = game.list();
        info!(id = %game.id, title = %game.title, list = %kind, "Adding game");

        let list = self.list_mut(kind);
        list.push(game);
        Ok(&list[list.len() - 1])
    }

    /// Replaces the game `id` keeping its id. The game stays where it is
    /// unless its new status moves it to the other list, in which case it is
    /// appended there.
    pub fn update(&mut self, id: &GameId, draft: GameDraft) -> Result<&Game, LibraryError> {
        let (from, index) = self
            .position(id)
            .ok_or_else(|| LibraryError::NotFound(id.clone()))?;
        let draft = draft.normalized();
        draft.validate()?;

        let game = draft.into_game(id.clone());
        let to = game.list();

        if from == to {
            let list = self.list_mut(to);
            list[index] = game;
            Ok(&list[index])
        } else {
            info!(%id, %from, %to, "Moving game");
            self.list_mut(from).remove(index);
            let list = self.list_mut(to);
            list.push(game);
            Ok(&list[list.len() - 1])
        }
    }

    pub fn delete(&mut self, id: &GameId) -> Result<Game, LibraryError> {
        let (kind, index) = self
            .position(id)
            .ok_or_else(|| LibraryError::NotFound(id.clone()))?;
        let game = self.list_mut(kind).remove(index);
        info!(%id, title = %game.title, list = %kind, "Deleted game");
        Ok(game)
    }

    /// Appends imported games to the list matching their status. Games whose
    /// id is already known, in either list or earlier in `games`, are
    /// skipped.
    pub fn import(&mut self, games: Vec<Game>) -> ImportOutcome {
        let mut seen: HashSet<GameId> = self
            .played
            .iter()
            .chain(&self.backlog)
            .map(|g| g.id.clone())
            .collect();
        let mut outcome = ImportOutcome::default();

        for game in games {
            if !seen.insert(game.id.clone()) {
                info!(id = %game.id, title = %game.title, "Game already exists, skipping import");
                outcome.skipped.push(SkippedGame {
                    id: game.id.clone(),
                    title: game.title.clone(),
                });
                continue;
            }

            match game.list() {
                ListKind::Played => outcome.played += 1,
                ListKind::Backlog => outcome.backlog += 1,
            }
            self.list_mut(game.list()).push(game);
        }

        info!(
            played = outcome.played,
            backlog = outcome.backlog,
            skipped = outcome.skipped.len(),
            "Import finished"
        );
        outcome
    }
}
