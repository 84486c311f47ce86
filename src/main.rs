use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use dutydraw::config::Config;
use dutydraw::error::describe;
use dutydraw::ports::{Chime, NoChime, NoShare, ShareChain};
use dutydraw::reveal::SummaryEvent;
use dutydraw::session::{self, Session, SessionError, SessionHandle};
use dutydraw::terminal::{
    self, BellChime, ClipboardCommand, Command, ConsoleShare, FileShare, OutputMode, TerminalPresenter,
};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("draw cycle failed: {0}")]
    Session(#[from] SessionError),
}

#[derive(Parser, Debug)]
#[command(name = "dutydraw", about = "Fair random cleaning-duty draw: 5 numbers out of 24")]
struct Cli {
    /// Seed for a reproducible sequence of draws (overrides DUTYDRAW_SEED).
    #[arg(long)]
    seed: Option<u64>,

    /// Do not ring the terminal bell when the reveal starts.
    #[arg(long, default_value_t = false)]
    no_chime: bool,

    /// Also write shared results to this file (overrides DUTYDRAW_SHARE_FILE).
    #[arg(long)]
    share_file: Option<PathBuf>,

    /// Run this many draws back to back, then exit.
    #[arg(long)]
    rounds: Option<u32>,

    /// One JSON object per line on stdout instead of text.
    #[arg(long, default_value_t = false)]
    json: bool,
}

struct App {
    handle: SessionHandle,
    presenter: Arc<TerminalPresenter<std::io::Stdout>>,
    chime: Arc<dyn Chime>,
    share: ShareChain,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = apply_flags(Config::from_env(), &cli);
    let mode = if cli.json { OutputMode::Json } else { OutputMode::Text };

    let session = match config.seed {
        Some(seed) => {
            info!(seed, "using fixed seed");
            Session::seeded(seed)
        }
        None => Session::from_entropy(),
    };

    let chime: Arc<dyn Chime> =
        if config.chime && mode == OutputMode::Text { Arc::new(BellChime) } else { Arc::new(NoChime) };

    let app = App {
        handle: SessionHandle::new(session),
        presenter: Arc::new(TerminalPresenter::stdout(mode)),
        chime,
        share: share_chain(&config, mode),
    };

    match cli.rounds {
        Some(rounds) => run_rounds(&app, rounds).await,
        None => {
            run_interactive(&app).await;
            Ok(())
        }
    }
}

fn apply_flags(mut config: Config, cli: &Cli) -> Config {
    if let Some(seed) = cli.seed {
        config.seed = Some(seed);
    }
    if cli.no_chime {
        config.chime = false;
    }
    if let Some(path) = &cli.share_file {
        config.share_file = Some(path.clone());
    }
    config
}

fn share_chain(config: &Config, mode: OutputMode) -> ShareChain {
    let mut chain = ShareChain::new().with(NoShare);
    if let Some(path) = &config.share_file {
        chain = chain.with(FileShare::new(path.clone()));
    }
    chain = chain.with(ClipboardCommand::default());
    if mode == OutputMode::Text {
        chain = chain.with(ConsoleShare::stdout());
    }
    chain
}

async fn run_rounds(app: &App, rounds: u32) -> Result<(), CliError> {
    for _ in 0..rounds {
        session::run_cycle(&app.handle, app.presenter.as_ref(), app.chime.as_ref()).await?;
    }
    info!(draws = app.handle.counter(), "rounds finished");
    Ok(())
}

async fn run_interactive(app: &App) {
    app.presenter.welcome();

    let (tx, mut rx) = mpsc::channel::<Command>(16);
    // Detached: a read still pending after `q` ends with the process.
    std::thread::spawn(move || terminal::forward_commands(std::io::stdin().lock(), &tx));
    let mut cycles = JoinSet::new();

    loop {
        tokio::select! {
            cmd = rx.recv() => match cmd {
                Some(Command::Draw) => {
                    let handle = app.handle.clone();
                    let presenter = Arc::clone(&app.presenter);
                    let chime = Arc::clone(&app.chime);
                    cycles.spawn(async move {
                        session::run_cycle(&handle, presenter.as_ref(), chime.as_ref()).await
                    });
                }
                Some(Command::Share) => share(app).await,
                Some(Command::Quit) => break,
                None => {
                    // Input closed: let running cycles finish, then exit.
                    while let Some(joined) = cycles.join_next().await {
                        report(joined);
                    }
                    break;
                }
            },
            Some(joined) = cycles.join_next() => report(joined),
        }
    }

    cycles.shutdown().await;
    info!(draws = app.handle.counter(), "bye");
}

fn report(joined: Result<Result<SummaryEvent, SessionError>, JoinError>) {
    match joined {
        Ok(Ok(summary)) => debug!(ordinal = summary.ordinal, "cycle finished"),
        Ok(Err(SessionError::Busy { phase })) => debug!(?phase, "draw trigger ignored: cycle in progress"),
        Ok(Err(e)) => warn!(error = %describe(&e), "draw cycle failed"),
        Err(e) => error!(error = %e, "draw cycle task failed"),
    }
}

async fn share(app: &App) {
    match session::share_last(&app.handle, &app.share).await {
        Ok(Some(via)) => {
            info!(via, "result shared");
            if let Some(message) = terminal::share_confirmation(via) {
                app.presenter.notice(message);
            }
        }
        Ok(None) => app.presenter.notice("Could not share the result."),
        Err(e) => app.presenter.notice(&e.to_string()),
    }
}
