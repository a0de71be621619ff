use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use itertools::Itertools;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fmt::Write as _,
    io::{self, stdin},
    path::PathBuf,
    sync::{mpsc::Sender, Arc},
    time::Duration,
};
use studytrack::{
    api::{Anonymous, ApiError, BearerToken, HeaderProvider, HttpModuleApi, ModuleApi, SemesterBuckets},
    app::App,
    app_dirs::AppDirs,
    clock::SystemClock,
    config::{Config, ConfigStore, FileConfigStore, Overrides, API_URL_ENV, TOKEN_ENV},
    local_store::FileLocalStore,
    logging::init_file_logger,
    module::ModuleSelectEntry,
    runtime::{CrosstermEventSource, FixedTicker, Runner},
    time_format::format_seconds,
    ui,
    worker::{spawn_worker, ApiCommand},
};

/// terminal study timer for university modules
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Track study time per university module. Start a timer on a module, stop it, and the session is stored by the study backend. Modules are grouped by semester level."
)]
pub struct Cli {
    /// base url of the module backend
    #[clap(long, env = API_URL_ENV)]
    api_url: Option<String>,

    /// bearer token sent with every backend request
    #[clap(long, env = TOKEN_ENV, hide_env_values = true)]
    token: Option<String>,

    /// config file to use instead of the default location
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// log filter written to the log file (error, warn, info, debug, trace)
    #[clap(long)]
    log_level: Option<String>,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// print modules grouped by semester and exit
    List {
        /// include inactive modules
        #[clap(long)]
        all: bool,
    },
    /// print module ids and names and exit
    Modules,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            api_url: self.api_url.clone(),
            token: self.token.clone(),
            log_level: self.log_level.clone(),
        }
    }

    fn config_store(&self) -> FileConfigStore {
        match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        }
    }

    fn load_config(&self) -> Config {
        self.config_store().load().with_overrides(self.overrides())
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = cli.load_config();

    if let Err(e) = init_file_logger(&AppDirs::log_path(), &config.log_level) {
        eprintln!("could not open log file: {e}");
    }
    let api = build_api(&config)?;
    log::info!("using backend {}", api.base_url());
    let api: Arc<dyn ModuleApi> = Arc::new(api);

    match cli.command {
        Some(Command::List { all }) => {
            print!("{}", format_buckets(&fetch_buckets(api.as_ref(), all)?));
            return Ok(());
        }
        Some(Command::Modules) => {
            print!("{}", format_select_data(&api.module_select_data()?));
            return Ok(());
        }
        None => {}
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let store = Arc::new(FileLocalStore::open(AppDirs::local_store_path()));
    log::debug!("local store at {}", store.path().display());
    let mut app = App::new(store, Arc::new(SystemClock));
    app.web_url = config.web_url.clone();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(
        &mut terminal,
        &mut app,
        api,
        Duration::from_millis(config.tick_rate_ms),
    );

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn build_api(config: &Config) -> Result<HttpModuleApi, ApiError> {
    let headers: Arc<dyn HeaderProvider> = match &config.token {
        Some(token) => Arc::new(BearerToken::new(token.clone())),
        None => Arc::new(Anonymous),
    };

    HttpModuleApi::builder(config.api_url.clone())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .headers(headers)
        .build()
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    api: Arc<dyn ModuleApi>,
    tick_rate: Duration,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::new(tick_rate));
    let commands = spawn_worker(api, runner.event_source().sender());

    dispatch(&commands, app.startup_commands());
    terminal.draw(|f| ui::draw(app, f))?;

    while !app.should_quit {
        let event = runner.step();
        dispatch(&commands, app.on_event(event));
        terminal.draw(|f| ui::draw(app, f))?;
    }

    Ok(())
}

fn dispatch(worker: &Sender<ApiCommand>, commands: Vec<ApiCommand>) {
    for command in commands {
        if worker.send(command).is_err() {
            log::error!("api worker stopped, dropping request");
        }
    }
}

fn fetch_buckets(api: &dyn ModuleApi, all: bool) -> Result<SemesterBuckets, ApiError> {
    if !all {
        return api.modules_by_semester();
    }
    Ok(api
        .all_modules()?
        .into_iter()
        .into_group_map_by(|m| m.semester_level)
        .into_iter()
        .collect())
}

fn format_buckets(buckets: &SemesterBuckets) -> String {
    let mut out = String::new();
    for (level, modules) in buckets.iter().rev() {
        let _ = writeln!(out, "Semester {level}");
        for module in modules {
            let inactive = if module.active { "" } else { "  (inactive)" };
            let _ = writeln!(
                out,
                "  {:<32} {}{}",
                module.name,
                format_seconds(module.seconds_learned as i64),
                inactive
            );
        }
    }
    out
}

fn format_select_data(entries: &[ModuleSelectEntry]) -> String {
    entries
        .iter()
        .map(|e| format!("{}\t{}\n", e.id, e.name))
        .collect()
}
