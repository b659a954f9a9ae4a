use std::io::{self, BufRead, Write};
use std::sync::{mpsc as std_mpsc, Arc};
use std::thread;

use chrono::Local;
use rosterwatch_engine::{
    ApiClient, LeadersCategory, NamesCategory, Notifier, SearchAggregator, SearchEvent,
    SearchHandle, SearchMode, StorageArea, WatchlistEvent, WatchlistStore,
};
use rosterwatch_logging::{rw_debug, rw_info, rw_warn};
use tokio::sync::mpsc;

use super::commands::{parse_command, Command, SearchBox, HELP};
use super::config::{AppConfig, SourceKind};
use super::render::{render_suggestions, render_watchlist};

/// Prints notifications as timestamped toast lines.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str) {
        println!("[{}] {}", Local::now().format("%H:%M:%S"), message);
    }
}

enum Flow {
    Continue(Vec<String>),
    Quit,
}

/// Watchlist plus the two search boxes of one terminal session.
struct Session {
    watchlist: WatchlistStore,
    changes: std_mpsc::Receiver<WatchlistEvent>,
    local: SearchHandle,
    global: SearchHandle,
    /// Flattened suggestions last shown for each box, in `pick` order.
    shown_local: Vec<String>,
    shown_global: Vec<String>,
}

impl Session {
    fn new(mut watchlist: WatchlistStore, aggregator: Arc<SearchAggregator>) -> Self {
        let changes = watchlist.subscribe();
        let local = SearchHandle::spawn(aggregator.clone(), SearchMode::Watchlist);
        let global = SearchHandle::spawn(aggregator, SearchMode::Global);
        local.set_exclusions(watchlist.exclusion_set());
        Self {
            watchlist,
            changes,
            local,
            global,
            shown_local: Vec::new(),
            shown_global: Vec::new(),
        }
    }

    fn shown(&self, search: SearchBox) -> &[String] {
        match search {
            SearchBox::Watchlist => &self.shown_local,
            SearchBox::Global => &self.shown_global,
        }
    }

    fn shown_mut(&mut self, search: SearchBox) -> &mut Vec<String> {
        match search {
            SearchBox::Watchlist => &mut self.shown_local,
            SearchBox::Global => &mut self.shown_global,
        }
    }

    fn handle_command(&mut self, command: Command) -> Flow {
        let lines = match command {
            Command::Add(name) => {
                if self.watchlist.add(&name) {
                    Vec::new()
                } else {
                    vec![format!("{name} is already watched")]
                }
            }
            Command::Remove(name) => {
                if self.watchlist.remove(&name) {
                    Vec::new()
                } else {
                    vec![format!("{name} is not watched")]
                }
            }
            Command::Toggle(name) => {
                self.watchlist.toggle(&name);
                Vec::new()
            }
            Command::Clear => {
                self.watchlist.clear();
                Vec::new()
            }
            Command::List => render_watchlist(self.watchlist.names()),
            Command::Type(text) => {
                self.local.input_changed(text);
                Vec::new()
            }
            Command::Find(text) => {
                self.global.input_changed(text);
                Vec::new()
            }
            Command::Pick(search, index) => match index
                .checked_sub(1)
                .and_then(|slot| self.shown(search).get(slot))
                .cloned()
            {
                Some(name) => {
                    if self.watchlist.add(&name) {
                        Vec::new()
                    } else {
                        vec![format!("{name} is already watched")]
                    }
                }
                None => vec![format!("no suggestion number {index}")],
            },
            Command::Help => HELP.lines().map(str::to_string).collect(),
            Command::Quit => return Flow::Quit,
        };
        self.refresh_exclusions();
        Flow::Continue(lines)
    }

    fn handle_search_event(&mut self, search: SearchBox, event: SearchEvent) -> Vec<String> {
        let label = match search {
            SearchBox::Watchlist => "Suggestions for",
            SearchBox::Global => "Everything matching",
        };
        match event {
            SearchEvent::Dispatched(query) => {
                rw_debug!("{} lookup #{} for {:?}", label, query.seq, query.text);
                Vec::new()
            }
            SearchEvent::Suggestions { query, results } => {
                *self.shown_mut(search) = results
                    .flatten()
                    .into_iter()
                    .map(|(_, name)| name.to_string())
                    .collect();
                let mut lines = vec![format!("{label} \"{}\":", query.text.trim())];
                lines.extend(render_suggestions(&results));
                lines
            }
            SearchEvent::Cleared => {
                self.shown_mut(search).clear();
                Vec::new()
            }
        }
    }

    /// Pushes the current watchlist to the watchlist search after any change.
    fn refresh_exclusions(&mut self) {
        self.watchlist.sync_external();
        let mut changed = false;
        while let Ok(event) = self.changes.try_recv() {
            rw_debug!("Watchlist changed: {:?}", event);
            changed = true;
        }
        if changed {
            self.local.set_exclusions(self.watchlist.exclusion_set());
        }
    }

    async fn shutdown(self) {
        self.local.shutdown().await;
        self.global.shutdown().await;
    }
}

fn build_aggregator(config: &AppConfig, client: Arc<ApiClient>) -> SearchAggregator {
    let mut aggregator = SearchAggregator::new(config.search_settings());
    for category in &config.categories {
        aggregator = match category.source {
            SourceKind::Names => aggregator.with_category(
                category.name.clone(),
                Arc::new(NamesCategory::new(client.clone())),
            ),
            SourceKind::Leaders => aggregator.with_category(
                category.name.clone(),
                Arc::new(LeadersCategory::new(client.clone())),
            ),
        };
    }
    aggregator
}

/// Forwards stdin lines to the event loop. The thread ends at EOF or when
/// the loop stops listening.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn print_lines(lines: &[String]) {
    let mut out = io::stdout().lock();
    for line in lines {
        let _ = writeln!(out, "{line}");
    }
    let _ = out.flush();
}

pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let area = StorageArea::with_directory(&config.storage_dir);
    let watchlist = WatchlistStore::open(area.open_context(), Arc::new(ConsoleNotifier));
    let client = Arc::new(ApiClient::new(config.api_settings())?);
    rw_info!("Using stats API at {}", client.base_url());
    let aggregator = Arc::new(build_aggregator(&config, client));

    let mut session = Session::new(watchlist, aggregator);
    let mut input = spawn_stdin_reader();
    print_lines(&[
        format!("{} watched names. Type `help` for commands.", session.watchlist.len()),
    ]);

    loop {
        tokio::select! {
            line = input.recv() => {
                let Some(line) = line else {
                    rw_info!("Input closed");
                    break;
                };
                match parse_command(&line) {
                    Ok(None) => {}
                    Ok(Some(command)) => match session.handle_command(command) {
                        Flow::Continue(lines) => print_lines(&lines),
                        Flow::Quit => break,
                    },
                    Err(err) => {
                        rw_warn!("Rejected input {:?}: {}", line, err);
                        print_lines(&[err.to_string()]);
                    }
                }
            }
            Some(event) = session.local.recv() => {
                let lines = session.handle_search_event(SearchBox::Watchlist, event);
                print_lines(&lines);
            }
            Some(event) = session.global.recv() => {
                let lines = session.handle_search_event(SearchBox::Global, event);
                print_lines(&lines);
            }
        }
    }

    session.shutdown().await;
    rw_info!("Stopped");
    Ok(())
}
