//! Line-oriented terminal front end.
//!
//! The shell task owns the [`App`]. It multiplexes user input from stdin
//! and background events from the channel, so every state change happens
//! on this one task.

use crate::app::App;
use crate::events::EventReceiver;
use crate::news::{Category, NewsQuery};
use crate::render::{render, render_notice};
use std::io::{self, BufRead, Write};
use std::thread;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Lines buffered between the stdin reader thread and the shell task.
pub const INPUT_CHANNEL_CAPACITY: usize = 16;

pub type InputReceiver = mpsc::Receiver<io::Result<String>>;

pub const HELP: &str = "\
Commands:
  <text>              search for articles matching <text>
  search <text>       same, for queries that start with a command word
  top [category]      top headlines (categories: business, entertainment,
                      general, health, science, sports, technology)
  summary <n>         toggle the AI summary for article <n>
  read <n>            open article <n> in the browser
  list                redraw the article list
  help                show this help
  quit                exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Search(String),
    Top(Option<Category>),
    Summary(usize),
    Read(usize),
    List,
    Help,
    Quit,
}

/// Parse one input line. Anything that is not a command is a search.
pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };

    let number = |what: &str| -> Result<usize, String> {
        rest.parse::<usize>()
            .map_err(|_| format!("usage: {what} <article number>"))
    };

    match word.to_lowercase().as_str() {
        "search" => Ok(Command::Search(rest.to_string())),
        "top" | "headlines" if rest.is_empty() => Ok(Command::Top(None)),
        "top" | "headlines" => rest.parse::<Category>().map(|c| Command::Top(Some(c))),
        "summary" | "sum" => number("summary").map(Command::Summary),
        "read" | "open" => number("read").map(Command::Read),
        "list" | "ls" if rest.is_empty() => Ok(Command::List),
        "help" | "?" if rest.is_empty() => Ok(Command::Help),
        "quit" | "exit" | "q" if rest.is_empty() => Ok(Command::Quit),
        _ => Ok(Command::Search(line.to_string())),
    }
}

/// Remembers the last frame so unchanged state is not reprinted.
#[derive(Debug, Default)]
struct Screen {
    last: String,
}

impl Screen {
    fn refresh(&mut self, app: &mut App, force: bool) {
        let mut stdout = io::stdout().lock();
        let frame = render(app);
        if force || frame != self.last {
            let _ = write!(stdout, "{frame}");
            self.last = frame;
        }
        for notice in app.take_notices() {
            let _ = writeln!(stdout, "{}", render_notice(&notice));
        }
        let _ = write!(stdout, "> ");
        let _ = stdout.flush();
    }
}

fn apply(app: &mut App, command: Command) {
    match command {
        Command::Search(query) => {
            app.submit_search(&query);
        }
        Command::Top(category) => {
            let query = category.map_or(NewsQuery::TopHeadlines, NewsQuery::Category);
            app.fetch(query);
        }
        Command::Summary(n) => {
            if let Some(url) = app.card_url(n) {
                let outcome = app.toggle_summary(&url);
                debug!(n, ?outcome, "Summary toggled");
            }
        }
        Command::Read(n) => {
            if let Some(url) = app.card_url(n) {
                app.open_article(&url);
            }
        }
        Command::List | Command::Help | Command::Quit => {}
    }
}

/// Read stdin on a plain OS thread and forward each line.
///
/// The read cannot be cancelled, so the thread is detached and dies with
/// the process. It also stops at end of input or once the receiver is gone.
pub fn spawn_stdin_reader() -> io::Result<InputReceiver> {
    let (tx, rx) = mpsc::channel(INPUT_CHANNEL_CAPACITY);
    thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let failed = line.is_err();
                if tx.blocking_send(line).is_err() || failed {
                    break;
                }
            }
        })?;
    Ok(rx)
}

/// Run until `quit`, end of input or Ctrl-C, then stop any in-flight fetch.
pub async fn run(
    mut app: App,
    mut events: EventReceiver,
    mut input: InputReceiver,
    initial: Option<NewsQuery>,
) -> io::Result<()> {
    let mut screen = Screen::default();
    let mut outcome = Ok(());

    if let Some(query) = initial {
        app.fetch(query);
    }
    screen.refresh(&mut app, true);

    loop {
        tokio::select! {
            line = input.recv() => {
                let line = match line {
                    Some(Ok(line)) => line,
                    Some(Err(e)) => {
                        warn!(error = %e, "Could not read input");
                        outcome = Err(e);
                        break;
                    }
                    None => {
                        info!("End of input");
                        break;
                    }
                };
                match parse_command(&line) {
                    Ok(Command::Quit) => break,
                    Ok(Command::Help) => {
                        println!("{HELP}");
                        screen.refresh(&mut app, false);
                    }
                    Ok(Command::List) => screen.refresh(&mut app, true),
                    Ok(command) => {
                        apply(&mut app, command);
                        screen.refresh(&mut app, false);
                    }
                    Err(msg) => {
                        println!("[warning] {msg}");
                        screen.refresh(&mut app, false);
                    }
                }
            }
            Some(event) = events.recv() => {
                app.handle_event(event);
                screen.refresh(&mut app, false);
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    app.shutdown().await;
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::SystemOpener;
    use crate::events;
    use crate::fetch::FetchCoordinator;
    use crate::test_support::{FakeSource, TEST_KEY};
    use std::sync::Arc;
    use std::time::Duration;

    fn hanging_app() -> (App, EventReceiver, Arc<FakeSource>) {
        let source = Arc::new(FakeSource::hanging());
        let (tx, rx) = events::channel();
        let fetcher = FetchCoordinator::new(source.clone(), TEST_KEY);
        (App::new(fetcher, None, Arc::new(SystemOpener), tx), rx, source)
    }

    #[test]
    fn test_plain_text_is_search() {
        assert_eq!(parse_command("climate change"), Ok(Command::Search("climate change".into())));
        assert_eq!(parse_command(""), Ok(Command::Search(String::new())));
    }

    #[test]
    fn test_search_prefix() {
        assert_eq!(parse_command("search help"), Ok(Command::Search("help".into())));
    }

    #[test]
    fn test_top() {
        assert_eq!(parse_command("top"), Ok(Command::Top(None)));
        assert_eq!(parse_command("top Science"), Ok(Command::Top(Some(Category::Science))));
        assert!(parse_command("top weather").is_err());
    }

    #[test]
    fn test_numbered_commands() {
        assert_eq!(parse_command("summary 2"), Ok(Command::Summary(2)));
        assert_eq!(parse_command("read 10"), Ok(Command::Read(10)));
        assert!(parse_command("summary two").is_err());
        assert!(parse_command("read").is_err());
    }

    #[test]
    fn test_keywords_with_arguments_are_searches() {
        assert_eq!(parse_command("quit smoking"), Ok(Command::Search("quit smoking".into())));
        assert_eq!(parse_command("quit"), Ok(Command::Quit));
        assert_eq!(parse_command("help"), Ok(Command::Help));
        assert_eq!(parse_command("list"), Ok(Command::List));
    }

    #[tokio::test]
    async fn test_quit_stops_in_flight_fetch_promptly() {
        let (app, events, source) = hanging_app();
        let (tx, input) = mpsc::channel(INPUT_CHANNEL_CAPACITY);
        let shell = tokio::spawn(run(app, events, input, None));

        tx.send(Ok("climate".to_string())).await.unwrap();
        while source.calls() == 0 {
            tokio::task::yield_now().await;
        }
        assert_eq!(source.last_query(), Some(NewsQuery::Search("climate".into())));

        tx.send(Ok("quit".to_string())).await.unwrap();
        let finished = tokio::time::timeout(Duration::from_secs(2), shell).await;
        assert!(matches!(finished, Ok(Ok(Ok(())))));
    }

    #[tokio::test]
    async fn test_closed_input_ends_run() {
        let (app, events, _source) = hanging_app();
        let (tx, input) = mpsc::channel(INPUT_CHANNEL_CAPACITY);
        drop(tx);

        let finished = tokio::time::timeout(
            Duration::from_secs(2),
            run(app, events, input, Some(NewsQuery::TopHeadlines)),
        )
        .await;
        assert!(matches!(finished, Ok(Ok(()))));
    }

    #[tokio::test]
    async fn test_input_error_is_returned_after_shutdown() {
        let (app, events, _source) = hanging_app();
        let (tx, input) = mpsc::channel(INPUT_CHANNEL_CAPACITY);
        tx.send(Err(io::Error::other("tty gone"))).await.unwrap();

        let err = run(app, events, input, None).await.unwrap_err();
        assert_eq!(err.to_string(), "tty gone");
    }
}
