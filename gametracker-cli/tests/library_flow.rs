use gametracker::import::parse_games;
use gametracker::storage::{BACKLOG_KEY, PLAYED_KEY};
use gametracker::{FileStorage, Library, Storage};
use gametracker_dto::sort::{SortDirection, SortKey};
use gametracker_dto::{GameDraft, GameStatus, ListKind};
use pretty_assertions::assert_eq;

const EXPORT: &str = "\
Titolo\tPiattaforma\tVoto Totale\tStato\tPrima volta giocato\tID
Outer Wilds\tPC\t97\tFinito\t12/06/2020\tow
Elden Ring\tPS5, PC\t95\tMasterato/Platinato\t2022-02-25\ter
Hollow Knight\tSwitch\t\tDa Iniziare\t\thk
Disco Elysium\tPC\t\t\t\tde
Celeste\tSwitch\t91\tIn Corso\tEstate 2019\t
";

fn titles(games: &[gametracker_dto::Game]) -> Vec<&str> {
    games.iter().map(|g| g.title.as_str()).collect()
}

#[test]
fn import_save_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let mut storage = FileStorage::new(dir.path().join("data"));

    let batch = parse_games(EXPORT).unwrap();
    assert_eq!(batch.games.len(), 4);
    assert_eq!(batch.rejected.len(), 1);
    assert_eq!(batch.rejected[0].title.as_deref(), Some("Disco Elysium"));

    let mut library = Library::load(&storage).unwrap();
    assert!(library.is_empty());

    let outcome = library.import(batch.games);
    assert_eq!(outcome.played, 3);
    assert_eq!(outcome.backlog, 1);
    assert!(outcome.skipped.is_empty());
    library.save(&mut storage).unwrap();

    assert!(storage.load(PLAYED_KEY).unwrap().is_some());
    assert!(storage.load(BACKLOG_KEY).unwrap().is_some());

    let reloaded = Library::load(&storage).unwrap();
    assert_eq!(reloaded, library);
    assert_eq!(
        titles(reloaded.list(ListKind::Backlog)),
        vec!["Hollow Knight"]
    );

    let celeste = reloaded
        .list(ListKind::Played)
        .iter()
        .find(|g| g.title == "Celeste")
        .unwrap();
    assert_eq!(celeste.first_played.as_deref(), Some("Estate 2019"));
    let outer_wilds = reloaded.get(&"ow".parse().unwrap()).unwrap();
    assert_eq!(outer_wilds.first_played.as_deref(), Some("2020-06-12"));
}

#[test]
fn importing_twice_skips_known_ids() {
    let mut library = Library::new();
    library.import(parse_games(EXPORT).unwrap().games);
    let before = library.len();

    let outcome = library.import(parse_games(EXPORT).unwrap().games);
    // Celeste has no ID column value and gets a fresh id each time.
    assert_eq!(outcome.imported(), 1);
    assert_eq!(outcome.skipped.len(), 3);
    assert_eq!(library.len(), before + 1);
}

#[test]
fn sort_choice_survives_reload() {
    let dir = tempfile::tempdir().unwrap();
    let mut storage = FileStorage::new(dir.path());

    let mut library = Library::new();
    library.import(parse_games(EXPORT).unwrap().games);

    library.sort_by(ListKind::Played, SortKey::TotalRating);
    let config = library.sort_by(ListKind::Played, SortKey::TotalRating);
    assert_eq!(config.direction, SortDirection::Desc);
    library.save(&mut storage).unwrap();

    let reloaded = Library::load(&storage).unwrap();
    assert_eq!(reloaded.sort_config(ListKind::Played), config);
    assert_eq!(
        titles(&reloaded.sorted(ListKind::Played)),
        vec!["Outer Wilds", "Elden Ring", "Celeste"]
    );
}

#[test]
fn status_change_moves_between_lists_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let mut storage = FileStorage::new(dir.path());

    let mut library = Library::new();
    let id = library
        .add(GameDraft::new(
            "Tunic",
            vec!["PC".into()],
            GameStatus::NotStarted,
        ))
        .unwrap()
        .id
        .clone();
    library.save(&mut storage).unwrap();

    let mut library = Library::load(&storage).unwrap();
    let mut draft = library.get(&id).unwrap().draft.clone();
    draft.status = GameStatus::InProgress;
    library.update(&id, draft).unwrap();
    library.save(&mut storage).unwrap();

    let reloaded = Library::load(&storage).unwrap();
    assert!(reloaded.list(ListKind::Backlog).is_empty());
    assert_eq!(titles(reloaded.list(ListKind::Played)), vec!["Tunic"]);
    assert_eq!(reloaded.get(&id).unwrap().id, id);
}
