use anyhow::{Context, Result as AnyhowResult};
use clap::Parser;
use crossterm::event::{self, Event, KeyEventKind};
use projtree::app::{App, Outcome, PickerMode};
use projtree::config::{self, Config};
use projtree::project_tree::{
    DownloadSelection, ProjectId, ProjectNode, ProjectTreeSelector, SelectionProps,
    SelectorOptions,
};
use projtree::services::projects::{
    HttpProjectsBackend, InMemoryProjectsBackend, ProjectsBackend, ProjectsManager,
};
use projtree::services::{log_dirs, tracing_setup};
use projtree::ui::ProjectExplorerRenderer;
use ratatui::DefaultTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Pick a project from a lazily loaded project tree
#[derive(Parser, Debug)]
#[command(name = "projtree")]
#[command(about = "Terminal project-tree picker with live filtering", long_about = None)]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Base URL of the projects API (overrides the config file)
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Bearer token for the projects API (overrides the config file)
    #[arg(long, value_name = "TOKEN")]
    token: Option<String>,

    /// Project already linked to the entity being edited (not selectable)
    #[arg(long, value_name = "ID")]
    linked: Option<String>,

    /// Project to show as currently selected
    #[arg(long, value_name = "ID")]
    selected: Option<String>,

    /// Show the creation-date filter input
    #[arg(long)]
    date_filter: bool,

    /// Hide the search input
    #[arg(long)]
    no_search: bool,

    /// Choose sub-projects to download together with this project
    #[arg(long, value_name = "ID")]
    download: Option<String>,

    /// Serve projects from a JSON file shaped like `GET /projects` instead of the API
    #[arg(long, value_name = "PATH")]
    fixture: Option<PathBuf>,

    /// Path to log file (default: $XDG_STATE_HOME/projtree/logs/)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    dump_config: bool,
}

fn load_config(args: &Args) -> AnyhowResult<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => match config::default_config_path() {
            Some(path) => Config::load_or_default(&path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => Config::default(),
        },
    };

    if let Some(url) = &args.api_url {
        config.api.base_url = url.clone();
    }
    if let Some(token) = &args.token {
        config.api.token = Some(token.clone());
    }
    if args.date_filter {
        config.selector.show_date_filter = true;
    }
    if args.no_search {
        config.selector.show_search = false;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn build_backend(args: &Args, config: &Config) -> AnyhowResult<Arc<dyn ProjectsBackend>> {
    match &args.fixture {
        Some(path) => {
            let backend = InMemoryProjectsBackend::from_fixture_file(path)
                .with_context(|| format!("Failed to read fixture {}", path.display()))?;
            tracing::info!("Serving projects from fixture {}", path.display());
            Ok(Arc::new(backend))
        }
        None => {
            let backend = HttpProjectsBackend::from_config(&config.api)
                .with_context(|| format!("Invalid API URL {}", config.api.base_url))?;
            tracing::info!("Using projects API at {}", backend.base_url());
            Ok(Arc::new(backend))
        }
    }
}

fn run(terminal: &mut DefaultTerminal, app: &mut App) -> AnyhowResult<()> {
    app.start();
    loop {
        app.drain_messages();
        terminal.draw(|frame| {
            let area = frame.area();
            ProjectExplorerRenderer::render(app, frame, area);
        })?;

        if app.should_quit() {
            return Ok(());
        }

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }
    }
}

fn main() -> AnyhowResult<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    if args.dump_config {
        let json =
            serde_json::to_string_pretty(&config).context("Failed to serialize config")?;
        println!("{}", json);
        return Ok(());
    }

    let log_file = args.log_file.clone().unwrap_or_else(log_dirs::main_log_path);
    if !tracing_setup::init_global(&log_file) {
        eprintln!("Warning: logging disabled, cannot write {}", log_file.display());
    }
    log_dirs::cleanup_stale_logs();
    tracing::info!("projtree starting");

    let runtime = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;
    let manager = ProjectsManager::new(build_backend(&args, &config)?);

    let on_select = |node: &ProjectNode| {
        tracing::info!("Selected project {} ({})", node.id, node.name);
    };

    let (selector, mode) = match &args.download {
        Some(id) => {
            let id = ProjectId::from(id.as_str());
            let main_project = runtime
                .block_on(manager.get_project(&id))
                .with_context(|| format!("Failed to load project {}", id))?;
            let selector = ProjectTreeSelector::for_project(manager, main_project, on_select);
            (selector, PickerMode::Download(DownloadSelection::new(id)))
        }
        None => {
            let mut selection = SelectionProps::new();
            if let Some(linked) = &args.linked {
                selection = selection.with_linked(linked.as_str());
            }
            if let Some(selected) = &args.selected {
                selection = selection.with_selected(selected.as_str());
            }
            let selector = ProjectTreeSelector::new(manager, on_select)
                .with_options(SelectorOptions::from(&config.selector))
                .with_selection(selection);
            (selector, PickerMode::Single)
        }
    };

    let mut app = App::new(selector, mode, runtime.handle().clone());

    let mut terminal = ratatui::init();
    let result = run(&mut terminal, &mut app);
    ratatui::restore();
    result?;

    let outcome: Outcome = app.outcome();
    tracing::info!("projtree exiting with {:?}", outcome);
    println!(
        "{}",
        serde_json::to_string_pretty(&outcome).context("Failed to serialize result")?
    );

    Ok(())
}
