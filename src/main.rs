use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
};

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{DisableBracketedPaste, EnableBracketedPaste},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::Rect,
    Terminal,
};
use tracing::{info, warn};

use tapline::{
    app::{App, Control},
    app_dirs::AppDirs,
    clock::SystemClock,
    config::{Config, ConfigStore, FileConfigStore},
    engine::Engine,
    logging,
    problems::{load_problems_file, BuiltinProblems, ProblemSource},
    prompt::Problem,
    runtime::{CrosstermEventSource, FixedTicker, Runner},
    store::RecordStore,
    submit::{AttemptSink, BackgroundSink, HttpClient, LocalClient, NullSink, FLUSH_TIMEOUT},
    typing_policy::OverflowPolicy,
};

/// type a prompt exactly, watch your wpm, post the attempt
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal typing trainer: type a problem prompt character for character, watch live wpm and accuracy, and submit the finished attempt to a leaderboard."
)]
pub struct Cli {
    /// name recorded with submitted attempts
    #[clap(short = 'u', long)]
    user: Option<String>,

    /// base url of an attempt server; attempts go to the local store otherwise
    #[clap(long)]
    server: Option<String>,

    /// do not submit finished attempts
    #[clap(long)]
    no_submit: bool,

    /// id of the problem to start with
    #[clap(long)]
    problem: Option<String>,

    /// custom prompt to type instead of a problem
    #[clap(short = 'p', long)]
    prompt: Option<String>,

    /// JSON file with an array of {id, title, text} problems
    #[clap(long)]
    problems_file: Option<PathBuf>,

    /// what happens to keystrokes past the end of the prompt
    #[clap(long, value_enum)]
    overflow: Option<OverflowPolicy>,

    /// print the leaderboard for a problem from the local store and exit
    #[clap(long, value_name = "PROBLEM_ID")]
    leaderboard: Option<String>,

    /// write the effective settings back to the config file
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    /// Layers the flags given on the command line over the stored config.
    fn apply(&self, mut config: Config) -> Config {
        if let Some(user) = &self.user {
            config.user = user.clone();
        }
        if let Some(server) = &self.server {
            config.server_url = Some(server.clone());
        }
        if self.no_submit {
            config.auto_submit = false;
        }
        if let Some(overflow) = self.overflow {
            config.overflow = overflow;
        }
        config
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let config_store = FileConfigStore::new();
    let config = cli.apply(config_store.load());
    if cli.save_config {
        config_store.save(&config)?;
    }

    if let Some(problem_id) = &cli.leaderboard {
        logging::init_stderr_logging();
        return print_leaderboard(&config, problem_id);
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    if let Err(e) = logging::init_file_logging(&AppDirs::log_path()) {
        eprintln!("logging disabled: {e}");
    }

    let problems = load_problems(&cli, &config)?;
    let start = match &cli.problem {
        Some(id) => match problems.iter().position(|p| &p.id == id) {
            Some(idx) => idx,
            None => {
                let mut cmd = Cli::command();
                cmd.error(ErrorKind::InvalidValue, format!("unknown problem: {id}")).exit();
            }
        },
        None => 0,
    };

    let engine = Engine::new(
        &problems[start],
        config.engine_settings(),
        Box::new(SystemClock::new()),
        build_sink(&config)?,
    );
    let mut app = App::new(engine, problems);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableBracketedPaste, LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    let abandoned = app.engine.flush_submissions(FLUSH_TIMEOUT);
    if abandoned > 0 {
        eprintln!("{abandoned} attempt submission(s) did not finish; see the log");
    }

    if let Err(e) = &res {
        warn!(error = %e, "exited with error");
    }
    res
}

fn load_problems(cli: &Cli, config: &Config) -> Result<Vec<Problem>, Box<dyn Error>> {
    if let Some(text) = &cli.prompt {
        return Ok(vec![Problem::new("custom", "Custom prompt", text.clone())]);
    }
    if let Some(path) = &cli.problems_file {
        let problems = load_problems_file(path)?;
        if !problems.is_empty() {
            return Ok(problems);
        }
        warn!(path = %path.display(), "problems file is empty, using built-in problems");
    }
    let path = config.store_path();
    match RecordStore::open(&path) {
        Ok(store) => {
            let stored = ProblemSource::problems(&store);
            if !stored.is_empty() {
                return Ok(stored);
            }
        }
        Err(e) => warn!(
            path = %path.display(),
            error = %e,
            "record store unreadable, using built-in problems"
        ),
    }
    Ok(BuiltinProblems.problems())
}

fn build_sink(config: &Config) -> Result<Box<dyn AttemptSink>, Box<dyn Error>> {
    if !config.auto_submit {
        info!("auto-submit disabled");
        return Ok(Box::new(NullSink));
    }
    match &config.server_url {
        Some(url) => {
            info!(url = %url, "submitting attempts to server");
            Ok(Box::new(BackgroundSink::new(HttpClient::new(url)?)))
        }
        None => {
            let path = config.store_path();
            info!(path = %path.display(), "submitting attempts to local store");
            Ok(Box::new(BackgroundSink::new(LocalClient::new(path))))
        }
    }
}

fn print_leaderboard(config: &Config, problem_id: &str) -> Result<(), Box<dyn Error>> {
    let store = RecordStore::open(config.store_path())?;
    let board = store.leaderboard(problem_id);
    if board.is_empty() {
        println!("no attempts for {problem_id}");
        return Ok(());
    }
    println!("{:>4}  {:<20} {:>5} {:>5}  when", "#", "user", "wpm", "acc");
    for (rank, entry) in board.iter().enumerate() {
        println!(
            "{:>4}  {:<20} {:>5} {:>4}%  {}",
            rank + 1,
            entry.attempt.user,
            entry.attempt.wpm,
            entry.attempt.accuracy,
            entry.created_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let size = terminal.size()?;
    app.resize(Rect::new(0, 0, size.width, size.height));
    app.engine.frame();
    terminal.draw(|f| f.render_widget(&*app, f.area()))?;

    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::frame_rate());

    loop {
        match app.on_event(runner.step()) {
            Control::Quit => break,
            Control::Continue => {}
            Control::Redraw => {
                app.engine.frame();
                terminal.draw(|f| f.render_widget(&*app, f.area()))?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["tapline"]);
        assert_eq!(cli.user, None);
        assert_eq!(cli.server, None);
        assert!(!cli.no_submit);
        assert_eq!(cli.prompt, None);
        assert_eq!(cli.overflow, None);
        assert!(!cli.save_config);
    }

    #[test]
    fn test_cli_prompt() {
        let cli = Cli::parse_from(["tapline", "-p", "hello world"]);
        assert_eq!(cli.prompt.as_deref(), Some("hello world"));
    }

    #[test]
    fn test_cli_overflow() {
        let cli = Cli::parse_from(["tapline", "--overflow", "count"]);
        assert_eq!(cli.overflow, Some(OverflowPolicy::Count));
        assert!(Cli::try_parse_from(["tapline", "--overflow", "wrap"]).is_err());
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from([
            "tapline",
            "--user",
            "ada",
            "--server",
            "http://localhost:3000",
            "--no-submit",
        ]);
        let config = cli.apply(Config::default());
        assert_eq!(config.user, "ada");
        assert_eq!(config.server_url.as_deref(), Some("http://localhost:3000"));
        assert!(!config.auto_submit);
    }

    #[test]
    fn test_cli_without_flags_keeps_config() {
        let stored = Config {
            user: "grace".into(),
            ..Config::default()
        };
        let config = Cli::parse_from(["tapline"]).apply(stored.clone());
        assert_eq!(config, stored);
    }

    #[test]
    fn test_custom_prompt_becomes_single_problem() {
        let cli = Cli::parse_from(["tapline", "-p", "hi"]);
        let problems = load_problems(&cli, &Config::default()).unwrap();
        assert_eq!(problems, vec![Problem::new("custom", "Custom prompt", "hi")]);
    }

    #[test]
    fn test_corrupt_store_falls_back_to_builtin_problems() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        std::fs::write(&path, br#"{"problems":[],"attempts":[{"id":1,"#).unwrap();
        let config = Config {
            store_path: Some(path),
            ..Config::default()
        };

        let problems = load_problems(&Cli::parse_from(["tapline"]), &config).unwrap();
        assert_eq!(problems, BuiltinProblems.problems());
    }

    #[test]
    fn test_store_problems_take_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        let mut store = RecordStore::open(&path).unwrap();
        store
            .add_problem(Problem::new("s1", "Stored", "from the store"))
            .unwrap();
        let config = Config {
            store_path: Some(path),
            ..Config::default()
        };

        let problems = load_problems(&Cli::parse_from(["tapline"]), &config).unwrap();
        assert_eq!(problems, vec![Problem::new("s1", "Stored", "from the store")]);
    }

    #[test]
    fn test_no_submit_uses_null_sink() {
        let config = Config {
            auto_submit: false,
            ..Config::default()
        };
        assert!(build_sink(&config).is_ok());
    }

    #[test]
    fn test_cli_leaderboard_flag() {
        let cli = Cli::parse_from(["tapline", "--leaderboard", "01-pangram"]);
        assert_eq!(cli.leaderboard.as_deref(), Some("01-pangram"));
    }
}
