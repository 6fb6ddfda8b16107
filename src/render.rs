//! Plain-text rendering of controller state.
//!
//! Rendering is a pure function of [`App`]; the shell prints the result
//! whenever state changes.

use crate::app::{App, Notice, NoticeLevel, PanelState, View};
use crate::models::Article;
use std::fmt::Write;

pub const WELCOME: &str = "Enter a topic or keyword to search for news articles, or `help` for commands.";

/// Marks error panels so they stand apart from summaries.
pub const ERROR_MARK: &str = "⚠️";

pub fn render(app: &App) -> String {
    let mut out = String::new();
    match app.view() {
        View::Welcome => {
            writeln!(out, "\n{WELCOME}").unwrap();
            if !app.ai_enabled() {
                writeln!(out, "(AI summaries are disabled: no summarization server configured.)").unwrap();
            }
            writeln!(out).unwrap();
        }
        View::Loading { label } => {
            writeln!(out, "\nSearching for '{label}'...\n").unwrap();
        }
        View::Articles => match app.results() {
            Some(results) if !results.is_empty() => {
                for (i, article) in results.articles().iter().enumerate() {
                    render_card(&mut out, i + 1, article, app.panel(&article.url));
                }
            }
            _ => {
                writeln!(out, "\nNo articles found matching your criteria.\n").unwrap();
            }
        },
    }
    out
}

fn render_card(out: &mut String, number: usize, article: &Article, panel: Option<&PanelState>) {
    writeln!(out, "\n[{number}] {}", article.title).unwrap();
    for line in article.blurb().lines() {
        writeln!(out, "    {line}").unwrap();
    }
    writeln!(
        out,
        "    Source: {} | Published: {}",
        article.source_name,
        article.published_display()
    )
    .unwrap();
    writeln!(out, "    {}", article.url).unwrap();

    match panel {
        None => {}
        Some(PanelState::Loading) => {
            writeln!(
                out,
                "    ┃ ⏳ Generating very long AI summary, please wait (this may take a while)..."
            )
            .unwrap();
        }
        Some(PanelState::Ready(text)) => {
            writeln!(out, "    ┃ AI Summary").unwrap();
            for line in text.lines() {
                writeln!(out, "    ┃ {line}").unwrap();
            }
        }
        Some(PanelState::Failed(e)) => {
            writeln!(out, "    ┃ {ERROR_MARK} {e}").unwrap();
        }
    }
}

pub fn render_notice(notice: &Notice) -> String {
    let tag = match notice.level {
        NoticeLevel::Info => "info",
        NoticeLevel::Warning => "warning",
        NoticeLevel::Error => "error",
    };
    format!("[{tag}] {}: {}", notice.title, notice.message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::SystemOpener;
    use crate::events::{self, AppEvent, FetchEvent};
    use crate::fetch::FetchCoordinator;
    use crate::news::NewsQuery;
    use crate::test_support::{FakeSource, TEST_KEY, ok_response, raw_article};
    use std::sync::Arc;

    fn app_with(source: FakeSource) -> (App, events::EventReceiver) {
        let (tx, rx) = events::channel();
        let fetcher = FetchCoordinator::new(Arc::new(source), TEST_KEY);
        (App::new(fetcher, None, Arc::new(SystemOpener), tx), rx)
    }

    #[test]
    fn test_render_welcome() {
        let (tx, _rx) = events::channel();
        let fetcher = FetchCoordinator::new(Arc::new(FakeSource::new(vec![])), TEST_KEY);
        let app = App::new(fetcher, None, Arc::new(SystemOpener), tx);
        assert!(render(&app).contains(WELCOME));
    }

    #[tokio::test]
    async fn test_render_cards() {
        let mut raw = raw_article(Some("Ice shelf"), "https://e.com/ice", None);
        raw.published_at = Some("not a date".to_string());
        let (mut app, mut rx) = app_with(FakeSource::new(vec![Ok(ok_response(vec![
            raw,
            raw_article(Some("Second"), "https://e.com/2", None),
        ]))]));
        app.fetch(NewsQuery::TopHeadlines);
        assert!(render(&app).contains("Searching for 'top headlines'..."));

        while app.is_fetching() {
            let ev = rx.recv().await.unwrap();
            app.handle_event(ev);
        }
        let text = render(&app);
        assert!(text.contains("[1] Ice shelf"));
        assert!(text.contains("[2] Second"));
        assert!(text.contains("Source: Test Wire | Published: N/A"));
        assert!(text.contains("Source: Test Wire | Published: 2025-05-06 14:30"));
    }

    #[tokio::test]
    async fn test_stale_events_do_not_change_render() {
        let (mut app, _rx) = app_with(FakeSource::new(vec![]));
        let before = render(&app);
        app.handle_event(AppEvent::Fetch {
            id: 42,
            event: FetchEvent::Finished,
        });
        assert_eq!(render(&app), before);
    }

    #[test]
    fn test_render_notice() {
        let notice = Notice {
            level: NoticeLevel::Warning,
            title: "Busy",
            message: "Already fetching news. Please wait.".to_string(),
        };
        assert_eq!(render_notice(&notice), "[warning] Busy: Already fetching news. Please wait.");
    }
}
