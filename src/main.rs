use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use crossterm::{
    event::{DisableFocusChange, EnableFocusChange, Event, EventStream, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::{broadcast, mpsc};
use tracing_subscriber::EnvFilter;

use reposync::app::{Action, Config, WatchState};
use reposync::error::SyncError;
use reposync::git::{remote_label, GitRunner, SystemGit};
use reposync::sync::{FocusEvent, SyncHub, SyncStatusController, SyncStatusData};
use reposync::ui::WatchWidget;
use reposync::workspace::{resolve_working_copy, ConfiguredProjects, ProjectDirectory};

#[derive(Parser)]
#[command(name = "reposync", version = env!("BUILD_VERSION"))]
#[command(about = "Show and reconcile the sync state of git working copies")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Refresh once and print the status
    Status {
        #[command(flatten)]
        target: Target,
        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,
        /// Include remote, last commit time and the working tree breakdown
        #[arg(short, long)]
        verbose: bool,
        /// Every project in the config file
        #[arg(long, conflicts_with_all = ["path", "project"])]
        all: bool,
    },
    /// Push the current branch
    Push(Target),
    /// Pull the current branch
    Pull(Target),
    /// Push or pull, whichever the status calls for
    Sync(Target),
    /// Fetch from the remote without merging
    Fetch(Target),
    /// Stage everything and commit it
    Commit {
        #[command(flatten)]
        target: Target,
        #[arg(short, long)]
        message: String,
    },
    /// Live view that refreshes on a timer and on terminal focus
    Watch(Target),
}

#[derive(Args, Clone, Default)]
struct Target {
    /// Working copy (defaults to the current directory)
    path: Option<PathBuf>,
    /// Project id from the [projects] table of the config file
    #[arg(short = 'P', long, conflicts_with = "path")]
    project: Option<String>,
}

impl Target {
    fn resolve(&self, projects: &dyn ProjectDirectory) -> Result<(String, PathBuf)> {
        let path = match (&self.project, &self.path) {
            (Some(id), _) => projects
                .resolve(id)
                .with_context(|| format!("Unknown project '{}'", id))?,
            (None, Some(path)) => path.clone(),
            (None, None) => std::env::current_dir().context("Failed to read current directory")?,
        };
        let path = resolve_working_copy(&path);
        let title = self.project.clone().unwrap_or_else(|| display_name(&path));
        Ok((title, path))
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn init_logging(config: &Config, to_file: bool) {
    let filter = || {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.log.level.directive()))
    };

    let log_file = if to_file {
        Config::ensure_config_dir()
            .ok()
            .and_then(|_| Config::log_path().ok())
            .and_then(|path| {
                std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .ok()
            })
    } else {
        None
    };

    match log_file {
        Some(file) => tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_ansi(false)
            .with_writer(Arc::new(file))
            .init(),
        // No log file in watch mode: stay silent rather than draw over the screen.
        None if to_file => {}
        None => tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_writer(io::stderr)
            .init(),
    }
}

fn build_runner(config: &Config) -> Arc<dyn GitRunner> {
    let mut git = SystemGit::new(&config.sync.git_binary);
    if let Some(timeout) = config.sync.command_timeout() {
        git = git.with_timeout(timeout);
    }
    Arc::new(git)
}

fn controller_for(config: &Config, path: PathBuf) -> SyncStatusController {
    SyncStatusController::builder(path, build_runner(config))
        .remote(config.sync.remote.clone())
        .build()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("warning: {:#}; using defaults", e);
        Config::default()
    });

    let command = cli.command.unwrap_or(Command::Status {
        target: Target::default(),
        json: false,
        verbose: false,
        all: false,
    });
    init_logging(&config, matches!(command, Command::Watch(_)));
    tracing::debug!("reposync {} starting", env!("BUILD_VERSION"));

    let projects = ConfiguredProjects::new(config.projects.clone());

    match command {
        Command::Status {
            target,
            json,
            verbose,
            all,
        } => {
            if all {
                status_all(&config, &projects, json).await
            } else {
                let (title, path) = target.resolve(&projects)?;
                status_one(&config, &title, path, json, verbose).await
            }
        }
        Command::Push(target) => run_action(&config, &projects, &target, Action::Push).await,
        Command::Pull(target) => run_action(&config, &projects, &target, Action::Pull).await,
        Command::Sync(target) => run_action(&config, &projects, &target, Action::Sync).await,
        Command::Fetch(target) => run_action(&config, &projects, &target, Action::Fetch).await,
        Command::Commit { target, message } => {
            let (_, path) = target.resolve(&projects)?;
            let controller = controller_for(&config, path);
            controller.refresh().await;
            controller.commit_all(&message).await?;
            print_line(&controller.state().data);
            Ok(())
        }
        Command::Watch(target) => {
            let (title, path) = target.resolve(&projects)?;
            watch(&config, title, path).await
        }
    }
}

async fn status_one(
    config: &Config,
    title: &str,
    path: PathBuf,
    json: bool,
    verbose: bool,
) -> Result<()> {
    let controller = controller_for(config, path);
    let data = controller.refresh().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    println!("{}: {}", title, data.format_short());
    if verbose {
        if let Some(url) = &data.remote_url {
            println!("  remote:      {}", remote_label(url));
        }
        if let Some(at) = data.last_synced_at {
            println!("  last commit: {}", at.to_rfc3339());
        }
        let tree = controller
            .queries()
            .working_tree_status(controller.path())
            .await;
        if !tree.is_clean() {
            println!("  changes:     {}", tree.format_short());
        }
    }
    Ok(())
}

async fn status_all(config: &Config, projects: &dyn ProjectDirectory, json: bool) -> Result<()> {
    let entries = projects.projects();
    if entries.is_empty() {
        bail!(
            "No projects configured; add a [projects] table to {}",
            Config::config_path()?.display()
        );
    }

    let mut hub = SyncHub::with_remote(build_runner(config), config.sync.remote.clone());
    let tracked: Vec<(String, PathBuf)> = entries
        .into_iter()
        .map(|(id, path)| {
            let controller = hub.controller(&resolve_working_copy(&path));
            (id, controller.path().to_path_buf())
        })
        .collect();

    let rows = by_project(&tracked, hub.refresh_all().await);
    if json {
        let map = rows
            .iter()
            .map(|(id, data)| Ok((id.clone(), serde_json::to_value(data)?)))
            .collect::<Result<serde_json::Map<String, serde_json::Value>, serde_json::Error>>()?;
        println!("{}", serde_json::to_string_pretty(&map)?);
    } else {
        for (id, data) in &rows {
            println!("{:<20} {}", id, data.format_short());
        }
    }
    Ok(())
}

/// One row per project id, in config order. Ids sharing a working copy share
/// its snapshot.
fn by_project(
    tracked: &[(String, PathBuf)],
    results: Vec<(PathBuf, SyncStatusData)>,
) -> Vec<(String, SyncStatusData)> {
    let snapshots: HashMap<PathBuf, SyncStatusData> = results.into_iter().collect();
    tracked
        .iter()
        .filter_map(|(id, path)| snapshots.get(path).map(|data| (id.clone(), data.clone())))
        .collect()
}

async fn run_action(
    config: &Config,
    projects: &dyn ProjectDirectory,
    target: &Target,
    action: Action,
) -> Result<()> {
    let (_, path) = target.resolve(projects)?;
    let controller = controller_for(config, path);
    controller.refresh().await;

    perform(&controller, action).await?;
    print_line(&controller.state().data);
    Ok(())
}

async fn perform(controller: &SyncStatusController, action: Action) -> Result<(), SyncError> {
    match action {
        Action::Refresh => {
            controller.refresh().await;
            Ok(())
        }
        Action::Push => controller.push().await,
        Action::Pull => controller.pull().await,
        Action::Sync => controller.sync().await,
        Action::Fetch => controller.fetch().await,
        Action::Quit => Ok(()),
    }
}

fn print_line(data: &Option<SyncStatusData>) {
    if let Some(data) = data {
        println!("{}", data.format_short());
    }
}

async fn watch(config: &Config, title: String, path: PathBuf) -> Result<()> {
    let controller = controller_for(config, path.clone());
    let mut state_rx = controller.subscribe();

    let (focus_tx, focus_rx) = broadcast::channel::<FocusEvent>(16);
    let focus_rx = config.sync.refresh_on_focus.then_some(focus_rx);
    let subscription = controller.start(config.sync.refresh_interval(), focus_rx);

    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<(Action, Result<(), SyncError>)>();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableFocusChange)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut state = WatchState::new(title, path);
    let mut events = EventStream::new();
    let mut redraw = tokio::time::interval(Duration::from_millis(500));

    let result: Result<()> = async {
        loop {
            state.clear_expired_toast();
            terminal.draw(|frame| WatchWidget::new(&state).render(frame))?;

            tokio::select! {
                _ = redraw.tick() => {}
                changed = state_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    state.apply(state_rx.borrow_and_update().clone());
                }
                Some((action, outcome)) = done_rx.recv() => {
                    state.finish(action, outcome);
                }
                maybe_event = events.next() => {
                    match maybe_event {
                        Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                            match Action::from_key(key) {
                                Some(Action::Quit) => state.should_quit = true,
                                Some(action) => {
                                    if state.begin(action) {
                                        let controller = controller.clone();
                                        let done_tx = done_tx.clone();
                                        tokio::spawn(async move {
                                            let outcome = perform(&controller, action).await;
                                            let _ = done_tx.send((action, outcome));
                                        });
                                    }
                                }
                                None => {}
                            }
                        }
                        Some(Ok(Event::FocusGained)) => {
                            let _ = focus_tx.send(FocusEvent::Gained);
                        }
                        Some(Ok(Event::FocusLost)) => {
                            let _ = focus_tx.send(FocusEvent::Lost);
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            tracing::warn!("terminal event error: {}", e);
                        }
                        None => break,
                    }
                }
            }

            if state.should_quit {
                break;
            }
        }
        Ok(())
    }
    .await;

    subscription.stop();

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableFocusChange,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}
