use anyhow::{bail, Context, Error};
use clap::{Args, Parser};
use clap_verbosity_flag::Level as VerbosityLevel;
use clap_verbosity_flag::Verbosity;
use gametracker::config::{Config, Overrides};
use gametracker::covers::{fill_cover, needs_cover, rawg_client};
use gametracker::import::{parse_games, CellWarning, RejectedRow};
use gametracker::{FileStorage, ImportOutcome, Library};
use gametracker_dto::sort::{sort_games, SortConfig, SortKey};
use gametracker_dto::{Game, GameDraft, GameField, GameId, GameStatus, ListKind};
use serde::Serialize;
use std::io::{BufRead, Read, Write};
use std::path::PathBuf;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::Subscriber;

#[derive(Debug, Parser)]
#[command(name = "gametracker", version, about)]
struct Opts {
    #[command(subcommand)]
    pub command: Command,

    /// Directory holding the played list and the backlog.
    #[clap(long, global = true, env = "GAMETRACKER_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Configuration file to read instead of the default one.
    #[clap(long, global = true, env = "GAMETRACKER_CONFIG")]
    pub config: Option<PathBuf>,

    /// RAWG API key, used to look up cover art.
    #[clap(long, global = true, env = "RAWG_API_KEY", hide_env_values = true)]
    pub rawg_key: Option<String>,

    /// Output pretty formatted JSON (no colors).
    #[clap(
        long,
        global = true,
        env = "GAMETRACKER_PRETTY",
        hide_env_values = true
    )]
    pub pretty: bool,

    #[command(flatten)]
    pub verbose: Verbosity,
}

#[derive(Debug, Parser)]
enum Command {
    /// List the games of one list, in that list's sort order.
    List(ListOpts),

    /// Pick the sort key of a list. Picking the current key again flips the
    /// direction.
    Sort(SortOpts),

    /// Show a single game.
    Show(GameRef),

    /// Add a game.
    Add(AddOpts),

    /// Edit a game. Changing the status may move it between lists.
    Edit(EditOpts),

    /// Delete a game.
    Delete(DeleteOpts),

    /// Import games from a TSV file.
    Import(ImportOpts),

    /// Look up the cover art of a game on RAWG.
    Cover(CoverOpts),

    /// Search the RAWG catalog.
    Search(SearchOpts),

    /// List the keys games can be sorted by.
    SortKeys,
}

#[derive(Debug, Parser)]
pub struct ListOpts {
    /// Which list to show.
    #[clap(value_enum)]
    list: ListKind,

    /// Sort by this key instead of the saved one. Not saved.
    #[clap(long, value_enum)]
    sort: Option<SortKey>,

    /// Sort descending. Only used with `--sort`.
    #[clap(long, requires = "sort")]
    desc: bool,
}

#[derive(Debug, Parser)]
pub struct SortOpts {
    #[clap(value_enum)]
    list: ListKind,

    #[clap(value_enum)]
    key: SortKey,
}

#[derive(Debug, Parser)]
pub struct GameRef {
    /// The game's id.
    id: GameId,
}

/// Game fields settable from the command line.
#[derive(Debug, Clone, Args)]
pub struct GameFields {
    #[clap(long)]
    title: Option<String>,

    /// A platform. Repeat or separate with commas for several; replaces the
    /// current platforms.
    #[clap(long = "platform", value_delimiter = ',')]
    platforms: Vec<String>,

    /// One of: not_started, mastered_platinum, completed_100, finished, paused,
    /// dropped, in_progress, endless, archived.
    #[clap(long)]
    status: Option<GameStatus>,

    /// Free-text playtime, e.g. "40h".
    #[clap(long)]
    playtime: Option<String>,

    /// 0 to 100.
    #[clap(long)]
    total_rating: Option<f64>,

    /// 0 to 100.
    #[clap(long)]
    aesthetic_rating: Option<f64>,

    /// 0 to 100.
    #[clap(long)]
    soundtrack_rating: Option<f64>,

    /// 0 to 10.
    #[clap(long)]
    difficulty: Option<f64>,

    /// 0 to 100.
    #[clap(long)]
    trophy_percentage: Option<f64>,

    /// Whether the game was platinumed or mastered.
    #[clap(long)]
    platinum: Option<bool>,

    #[clap(long)]
    platinum_detail: Option<String>,

    /// Completed replays.
    #[clap(long)]
    replays: Option<u32>,

    /// A date (YYYY-MM-DD) or free text.
    #[clap(long)]
    first_played: Option<String>,

    /// A date (YYYY-MM-DD) or free text.
    #[clap(long)]
    last_finished: Option<String>,

    #[clap(long)]
    cover_image_url: Option<String>,
}

impl GameFields {
    fn apply(self, draft: &mut GameDraft) {
        let GameFields {
            title,
            platforms,
            status,
            playtime,
            total_rating,
            aesthetic_rating,
            soundtrack_rating,
            difficulty,
            trophy_percentage,
            platinum,
            platinum_detail,
            replays,
            first_played,
            last_finished,
            cover_image_url,
        } = self;

        fn set<T>(target: &mut T, value: Option<T>) {
            if let Some(value) = value {
                *target = value;
            }
        }
        fn set_opt<T>(target: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *target = value;
            }
        }

        set(&mut draft.title, title);
        if !platforms.is_empty() {
            draft.platforms = platforms;
        }
        set(&mut draft.status, status);
        set_opt(&mut draft.playtime, playtime);
        set_opt(&mut draft.total_rating, total_rating);
        set_opt(&mut draft.aesthetic_rating, aesthetic_rating);
        set_opt(&mut draft.soundtrack_rating, soundtrack_rating);
        set_opt(&mut draft.difficulty, difficulty);
        set_opt(&mut draft.trophy_percentage, trophy_percentage);
        set_opt(&mut draft.platinum, platinum);
        set_opt(&mut draft.platinum_detail, platinum_detail);
        set_opt(&mut draft.replays, replays);
        set_opt(&mut draft.first_played, first_played);
        set_opt(&mut draft.last_finished, last_finished);
        if cover_image_url.is_some() {
            // A hand-picked cover no longer comes from the catalog.
            draft.rawg_id = None;
            draft.cover_image_url = cover_image_url;
        }
    }
}

#[derive(Debug, Parser)]
pub struct AddOpts {
    #[clap(flatten)]
    fields: GameFields,

    /// Look up cover art on RAWG when no cover is given.
    #[clap(long)]
    fetch_cover: bool,
}

#[derive(Debug, Parser)]
pub struct EditOpts {
    /// The game's id.
    id: GameId,

    #[clap(flatten)]
    fields: GameFields,

    /// Clear an optional field. Can be repeated.
    #[clap(long, value_enum)]
    unset: Vec<GameField>,

    /// Look up cover art on RAWG when the game has none.
    #[clap(long)]
    fetch_cover: bool,
}

#[derive(Debug, Parser)]
pub struct DeleteOpts {
    /// The game's id.
    id: GameId,

    /// Do not ask for confirmation.
    #[clap(long, short)]
    yes: bool,
}

#[derive(Debug, Parser)]
pub struct ImportOpts {
    /// The TSV file to import, or `-` for standard input.
    file: PathBuf,

    /// Look up cover art on RAWG for imported games without a cover.
    #[clap(long)]
    fetch_covers: bool,
}

#[derive(Debug, Parser)]
pub struct CoverOpts {
    /// The game's id.
    id: GameId,

    /// Replace an existing cover.
    #[clap(long)]
    force: bool,
}

#[derive(Debug, Parser)]
pub struct SearchOpts {
    /// What to search for.
    query: String,

    /// The maximum number of results to return.
    #[clap(long, default_value_t = 10)]
    limit: u32,
}

#[derive(Serialize)]
struct SortedList<'a> {
    list: ListKind,
    sort: SortConfig,
    games: &'a [Game],
}

#[derive(Serialize)]
struct ImportReport {
    #[serde(flatten)]
    outcome: ImportOutcome,
    covers_found: usize,
    rejected: Vec<RejectedRow>,
    warnings: Vec<CellWarning>,
}

#[derive(Serialize)]
struct SortKeyItem {
    key: SortKey,
    label: &'static str,
}

fn output_json<J: Serialize>(value: J, opts: &Opts) -> Result<(), anyhow::Error> {
    println!(
        "{}",
        if opts.pretty {
            serde_json::to_string_pretty(&value)?
        } else {
            serde_json::to_string(&value)?
        }
    );
    Ok(())
}

/// Everything a command needs: the resolved configuration, the storage and
/// the library loaded from it.
struct Session {
    config: Config,
    storage: FileStorage,
    library: Library,
}

impl Session {
    fn open(opts: &Opts) -> Result<Self, anyhow::Error> {
        let config = Config::resolve(Overrides {
            config: opts.config.clone(),
            data_dir: opts.data_dir.clone(),
            rawg_api_key: opts.rawg_key.clone(),
        })?;
        let storage = FileStorage::new(&config.data_dir);
        let library = Library::load(&storage)
            .with_context(|| format!("Loading games from {}", storage.dir().display()))?;

        Ok(Self {
            config,
            storage,
            library,
        })
    }

    fn save(&mut self) -> Result<(), anyhow::Error> {
        self.library.save(&mut self.storage)?;
        Ok(())
    }

    fn game(&self, id: &GameId) -> Result<&Game, anyhow::Error> {
        self.library
            .get(id)
            .ok_or_else(|| Error::msg(format!("No game with id {id}")))
    }

    /// Fills in the cover of `draft` when a RAWG key is configured.
    async fn fetch_cover(&self, draft: &mut GameDraft, force: bool) -> Result<bool, anyhow::Error> {
        match rawg_client(&self.config)? {
            Some(client) => Ok(fill_cover(&client, draft, force).await),
            None => {
                warn!("No RAWG API key configured, not fetching cover art");
                Ok(false)
            }
        }
    }
}

fn confirm(prompt: &str) -> Result<bool, anyhow::Error> {
    eprint!("{prompt} [y/N] ");
    std::io::stderr().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

async fn list(opts: &Opts, list_opts: &ListOpts) -> Result<(), anyhow::Error> {
    let session = Session::open(opts)?;
    let sort = match list_opts.sort {
        Some(key) if list_opts.desc => SortConfig::descending(key),
        Some(key) => SortConfig::ascending(key),
        None => session.library.sort_config(list_opts.list),
    };
    let games = sort_games(session.library.list(list_opts.list), &sort);

    output_json(
        SortedList {
            list: list_opts.list,
            sort,
            games: &games,
        },
        opts,
    )
}

async fn sort(opts: &Opts, SortOpts { list, key }: &SortOpts) -> Result<(), anyhow::Error> {
    let mut session = Session::open(opts)?;
    let sort = session.library.sort_by(*list, *key);
    session.save()?;
    info!(%list, key = %sort.key, direction = %sort.direction, "Sort order saved");

    let games = session.library.sorted(*list);
    output_json(
        SortedList {
            list: *list,
            sort,
            games: &games,
        },
        opts,
    )
}

async fn show(opts: &Opts, GameRef { id }: &GameRef) -> Result<(), anyhow::Error> {
    let session = Session::open(opts)?;
    output_json(session.game(id)?, opts)
}

async fn add(opts: &Opts, add_opts: &AddOpts) -> Result<(), anyhow::Error> {
    let mut session = Session::open(opts)?;
    let AddOpts {
        fields,
        fetch_cover,
    } = add_opts;

    if fields.title.is_none() {
        bail!("--title is required");
    }
    if fields.platforms.is_empty() {
        bail!("at least one --platform is required");
    }
    if fields.status.is_none() {
        bail!("--status is required");
    }

    let mut draft = GameDraft::default();
    fields.clone().apply(&mut draft);
    // Catch mistakes before spending a catalog lookup on them.
    draft = draft.normalized();
    draft.validate()?;

    if *fetch_cover {
        session.fetch_cover(&mut draft, false).await?;
    }

    let game = session.library.add(draft)?.clone();
    session.save()?;
    output_json(game, opts)
}

async fn edit(opts: &Opts, edit_opts: &EditOpts) -> Result<(), anyhow::Error> {
    let mut session = Session::open(opts)?;
    let EditOpts {
        id,
        fields,
        unset,
        fetch_cover,
    } = edit_opts;

    let mut draft = session.game(id)?.draft.clone();
    fields.clone().apply(&mut draft);
    for field in unset {
        draft.clear(*field)?;
    }

    if *fetch_cover {
        session.fetch_cover(&mut draft, false).await?;
    }

    let game = session.library.update(id, draft)?.clone();
    session.save()?;
    output_json(game, opts)
}

async fn delete(opts: &Opts, DeleteOpts { id, yes }: &DeleteOpts) -> Result<(), anyhow::Error> {
    let mut session = Session::open(opts)?;
    let title = session.game(id)?.title.clone();

    if !yes && !confirm(&format!("Delete {title:?}?"))? {
        bail!("Not deleted");
    }

    let game = session.library.delete(id)?;
    session.save()?;
    output_json(game, opts)
}

async fn import(opts: &Opts, import_opts: &ImportOpts) -> Result<(), anyhow::Error> {
    let mut session = Session::open(opts)?;

    let text = if import_opts.file.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        text
    } else {
        std::fs::read_to_string(&import_opts.file)
            .with_context(|| format!("Reading {}", import_opts.file.display()))?
    };

    let mut batch = parse_games(&text)?;

    let mut covers_found = 0;
    if import_opts.fetch_covers {
        match rawg_client(&session.config)? {
            Some(client) => {
                for game in batch.games.iter_mut() {
                    if fill_cover(&client, &mut game.draft, false).await {
                        covers_found += 1;
                    }
                }
            }
            None => warn!("No RAWG API key configured, not fetching cover art"),
        }
    }

    let outcome = session.library.import(batch.games);
    session.save()?;

    output_json(
        ImportReport {
            outcome,
            covers_found,
            rejected: batch.rejected,
            warnings: batch.warnings,
        },
        opts,
    )
}

async fn cover(opts: &Opts, CoverOpts { id, force }: &CoverOpts) -> Result<(), anyhow::Error> {
    let mut session = Session::open(opts)?;
    let mut draft = session.game(id)?.draft.clone();

    if session.config.rawg_api_key.is_none() {
        bail!("A RAWG API key is required; pass --rawg-key or set RAWG_API_KEY");
    }
    if !needs_cover(&draft, *force) {
        bail!(
            "{:?} already has a cover; pass --force to replace it",
            draft.title
        );
    }
    if !session.fetch_cover(&mut draft, *force).await? {
        bail!("No cover found for {:?}", draft.title);
    }

    let game = session.library.update(id, draft)?.clone();
    session.save()?;
    output_json(game, opts)
}

async fn search(opts: &Opts, SearchOpts { query, limit }: &SearchOpts) -> Result<(), anyhow::Error> {
    let config = Config::resolve(Overrides {
        config: opts.config.clone(),
        data_dir: opts.data_dir.clone(),
        rawg_api_key: opts.rawg_key.clone(),
    })?;
    let Some(client) = rawg_client(&config)? else {
        bail!("A RAWG API key is required; pass --rawg-key or set RAWG_API_KEY");
    };

    let response = client.search_games(query, *limit).await?;
    output_json(response, opts)
}

fn sort_keys(opts: &Opts) -> Result<(), anyhow::Error> {
    let keys: Vec<SortKeyItem> = SortKey::SORTABLE
        .iter()
        .map(|&key| SortKeyItem {
            key,
            label: key.label(),
        })
        .collect();
    output_json(keys, opts)
}

#[tokio::main]
async fn main() {
    let opts = Opts::parse();

    // Initialize tracing.
    let subscriber = Subscriber::builder();
    let subscriber = match opts.verbose.log_level() {
        Some(VerbosityLevel::Error) => subscriber.with_max_level(Level::ERROR),
        Some(VerbosityLevel::Warn) => subscriber.with_max_level(Level::WARN),
        Some(VerbosityLevel::Info) => subscriber.with_max_level(Level::INFO),
        Some(VerbosityLevel::Debug) => subscriber.with_max_level(Level::DEBUG),
        Some(VerbosityLevel::Trace) => subscriber.with_max_level(Level::TRACE),
        None => subscriber.with_max_level(LevelFilter::OFF),
    };
    subscriber
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .init();
    debug!(?opts);

    let result = match opts.command {
        Command::List(ref list_opts) => list(&opts, list_opts).await,
        Command::Sort(ref sort_opts) => sort(&opts, sort_opts).await,
        Command::Show(ref game) => show(&opts, game).await,
        Command::Add(ref add_opts) => add(&opts, add_opts).await,
        Command::Edit(ref edit_opts) => edit(&opts, edit_opts).await,
        Command::Delete(ref delete_opts) => delete(&opts, delete_opts).await,
        Command::Import(ref import_opts) => import(&opts, import_opts).await,
        Command::Cover(ref cover_opts) => cover(&opts, cover_opts).await,
        Command::Search(ref search_opts) => search(&opts, search_opts).await,
        Command::SortKeys => sort_keys(&opts),
    };

    match result {
        Ok(()) => {}
        Err(e) => {
            eprintln!("{:#}", e);
            std::process::exit(1);
        }
    }
}
