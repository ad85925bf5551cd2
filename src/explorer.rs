use std::collections::HashSet;
use std::io::{self, IsTerminal};
use std::process::Command;
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use crate::agent::{self, Target};
use crate::hierarchy;
use crate::platform;
use crate::resolver;

mod render;
mod session;
mod tree;

use session::{Session, SubtreeMode, UiEvent};
use tree::TreeRow;

const TICK_INTERVAL: Duration = Duration::from_millis(100);
const STATUS_REVERT: Duration = Duration::from_secs(3);

type Term = Terminal<CrosstermBackend<io::Stdout>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Screen {
    Loading,
    Tree,
    Detail,
}

struct App {
    target: Target,
    session: Arc<Mutex<Session>>,
    tx: mpsc::Sender<UiEvent>,

    screen: Screen,
    spinner: usize,
    load_error: Option<String>,

    rows: Vec<TreeRow>,
    collapsed: HashSet<String>,
    cursor: usize,

    detail_scroll: u16,
    status: Option<(String, Instant)>,
    show_image_pane: bool,

    quit: bool,
}

/// True when the terminal advertises inline image rendering.
fn supports_inline_image() -> bool {
    let term = std::env::var("TERM_PROGRAM").unwrap_or_default();
    term == "ghostty" || term == "xterm-kitty" || std::env::var_os("KITTY_WINDOW_ID").is_some()
}

/// Runs the interactive hierarchy explorer until the user quits.
pub fn run(target: Target) -> Result<()> {
    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        anyhow::bail!("interactive mode requires a terminal (TTY)");
    }

    let mut stdout = io::stdout();
    enable_raw_mode().context("enable raw mode")?;
    execute!(stdout, EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let result = run_session(&mut terminal, target);

    disable_raw_mode().context("disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen).context("leave alternate screen")?;
    terminal.show_cursor().context("show cursor")?;

    result
}

fn run_session(terminal: &mut Term, target: Target) -> Result<()> {
    let (tx, rx) = mpsc::channel();

    let mut app = App {
        target,
        session: Arc::new(Mutex::new(Session::default())),
        tx: tx.clone(),
        screen: Screen::Loading,
        spinner: 0,
        load_error: None,
        rows: Vec::new(),
        collapsed: HashSet::new(),
        cursor: 0,
        detail_scroll: 0,
        status: None,
        show_image_pane: supports_inline_image(),
        quit: false,
    };

    spawn_ticker(tx.clone());
    spawn_snapshot_fetch(&app);

    loop {
        while let Ok(event) = rx.try_recv() {
            app.on_event(event);
        }

        let status_expired = app
            .status
            .as_ref()
            .is_some_and(|(_, since)| since.elapsed() >= STATUS_REVERT);
        if status_expired {
            app.status = None;
        }

        terminal
            .draw(|frame| render::draw(frame, &app))
            .context("draw")?;

        if app.quit {
            return Ok(());
        }

        if event::poll(Duration::from_millis(50)).context("poll")? {
            match event::read().context("read event")? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    app.on_key(key, terminal)?;
                }
                _ => {}
            }
        }
    }
}

fn spawn_ticker(tx: mpsc::Sender<UiEvent>) {
    thread::spawn(move || {
        loop {
            thread::sleep(TICK_INTERVAL);
            if tx.send(UiEvent::Tick).is_err() {
                return;
            }
        }
    });
}

fn spawn_snapshot_fetch(app: &App) {
    let target = app.target.clone();
    let session = Arc::clone(&app.session);
    let tx = app.tx.clone();

    thread::spawn(move || {
        let outcome = match agent::fetch_hierarchy(&target) {
            Ok(snapshot) => {
                let resolved = resolver::resolve_snapshot_names(&snapshot).map(Arc::new);
                let addr_index = hierarchy::address_class_index(&snapshot, resolved.as_deref());
                let mut s = session.lock().expect("session lock");
                s.snapshot = Some(Arc::new(snapshot));
                s.resolved = resolved;
                s.addr_index = addr_index;
                Ok(())
            }
            Err(err) => Err(err.to_string()),
        };
        let _ = tx.send(UiEvent::SnapshotLoaded(outcome));
    });
}

impl App {
    fn on_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::Tick => {
                self.spinner = self.spinner.wrapping_add(1);
            }
            UiEvent::SnapshotLoaded(Ok(())) => {
                self.rebuild_rows();
                self.cursor = 0;
                if self.screen == Screen::Loading {
                    self.screen = Screen::Tree;
                }
            }
            UiEvent::SnapshotLoaded(Err(message)) => {
                self.load_error = Some(message);
            }
            UiEvent::SubtreeDone { error: Some(message) } => {
                self.status = Some((format!("Error: {}", message), Instant::now()));
            }
            UiEvent::SubtreeDone { error: None } => {}
        }
    }

    fn rebuild_rows(&mut self) {
        let s = self.session.lock().expect("session lock");
        let Some(snapshot) = &s.snapshot else {
            self.rows.clear();
            return;
        };
        self.rows = tree::flatten_rows(snapshot, s.resolved.as_deref(), &self.collapsed);
    }

    fn on_key(&mut self, key: KeyEvent, terminal: &mut Term) -> Result<()> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.quit = true;
            return Ok(());
        }
        match self.screen {
            Screen::Loading => {
                if key.code == KeyCode::Char('q') {
                    self.quit = true;
                }
            }
            Screen::Tree => self.on_tree_key(key, terminal)?,
            Screen::Detail => self.on_detail_key(key),
        }
        Ok(())
    }

    fn on_tree_key(&mut self, key: KeyEvent, terminal: &mut Term) -> Result<()> {
        match key.code {
            KeyCode::Char('q') => self.quit = true,
            KeyCode::Up | KeyCode::Char('k') => {
                self.cursor = self.cursor.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if !self.rows.is_empty() {
                    self.cursor = (self.cursor + 1).min(self.rows.len() - 1);
                }
            }
            KeyCode::Right => {
                let address = self
                    .rows
                    .get(self.cursor)
                    .filter(|r| r.has_children && !r.expanded)
                    .map(|r| r.address.clone());
                if let Some(address) = address {
                    self.collapsed.remove(&address);
                    self.rebuild_rows();
                }
            }
            KeyCode::Left => {
                let address = self
                    .rows
                    .get(self.cursor)
                    .filter(|r| r.has_children && r.expanded)
                    .map(|r| r.address.clone());
                if let Some(address) = address {
                    self.collapsed.insert(address);
                    self.rebuild_rows();
                }
            }
            KeyCode::Enter => self.select_current(),
            KeyCode::Char('f') => self.fuzzy_filter(terminal)?,
            _ => {}
        }
        Ok(())
    }

    /// Derives the detail projection for the cursor row synchronously
    /// (no fetch) and switches to the detail screen, resetting any
    /// subtree state cached for the previous node.
    fn select_current(&mut self) {
        let Some(row) = self.rows.get(self.cursor) else {
            return;
        };
        let address = row.address.clone();

        let (snapshot, resolved) = {
            let s = self.session.lock().expect("session lock");
            let Some(snapshot) = s.snapshot.clone() else {
                return;
            };
            (snapshot, s.resolved.clone())
        };

        let Some(node) = snapshot.find_by_address(&address) else {
            return;
        };
        let detail =
            hierarchy::build_detail_with_snapshot(node, &snapshot.classmap, resolved.as_deref());

        self.session
            .lock()
            .expect("session lock")
            .select_detail(detail);
        self.detail_scroll = 0;
        self.screen = Screen::Detail;
    }

    fn fuzzy_filter(&mut self, terminal: &mut Term) -> Result<()> {
        if platform::find_in_path("fzf").is_none() {
            return Ok(());
        }

        let (snapshot, resolved) = {
            let s = self.session.lock().expect("session lock");
            let Some(snapshot) = s.snapshot.clone() else {
                return Ok(());
            };
            (snapshot, s.resolved.clone())
        };
        let lines = tree::filter_lines(&snapshot, resolved.as_deref());
        if lines.is_empty() {
            return Ok(());
        }

        disable_raw_mode().context("disable raw mode")?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen).context("leave alternate screen")?;

        let selected = tree::run_fuzzy_filter(&lines);

        enable_raw_mode().context("enable raw mode")?;
        execute!(terminal.backend_mut(), EnterAlternateScreen).context("enter alternate screen")?;
        terminal.clear().context("clear terminal")?;

        if let Some(address) = selected? {
            tree::expand_ancestors(&snapshot, &address, &mut self.collapsed);
            self.rebuild_rows();
            if let Some(idx) = self.rows.iter().position(|r| r.address == address) {
                self.cursor = idx;
            }
        }
        Ok(())
    }

    fn on_detail_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.quit = true,
            KeyCode::Esc => self.screen = Screen::Tree,
            KeyCode::Down | KeyCode::Char('j') => {
                self.detail_scroll = self.detail_scroll.saturating_add(1);
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.detail_scroll = self.detail_scroll.saturating_sub(1);
            }
            KeyCode::Char('s') => self.subtree_action(),
            KeyCode::Char('o') => self.open_snapshot(),
            _ => {}
        }
    }

    /// First press fetches the subtree asynchronously (one in-flight
    /// fetch at most); once cached, cycles the display mode. A fetch
    /// already in flight makes this a no-op.
    fn subtree_action(&mut self) {
        let address = {
            let mut s = self.session.lock().expect("session lock");
            let Some(detail) = &s.detail else {
                return;
            };
            if !detail.is_hosting_view || s.subtree_fetching {
                return;
            }
            let address = detail.address.clone();
            if s.subtree_raw.is_some() {
                s.subtree_mode = s.subtree_mode.next();
                return;
            }
            s.subtree_fetching = true;
            address
        };

        let target = self.target.clone();
        let session = Arc::clone(&self.session);
        let tx = self.tx.clone();

        thread::spawn(move || {
            let result = agent::fetch_subtree(&target, &address);
            let mut s = session.lock().expect("session lock");
            s.subtree_fetching = false;
            let error = match result {
                Ok(raw) => {
                    // A fetch superseded by navigation is discarded here.
                    let current = s.detail.as_ref().is_some_and(|d| d.address == address);
                    if current {
                        s.subtree_raw = Some(raw);
                        s.subtree_mode = SubtreeMode::Compact;
                    }
                    None
                }
                Err(err) => Some(err.to_string()),
            };
            drop(s);
            let _ = tx.send(UiEvent::SubtreeDone { error });
        });
    }

    fn open_snapshot(&self) {
        let path = {
            let s = self.session.lock().expect("session lock");
            s.detail.as_ref().and_then(|d| d.snapshot.clone())
        };
        let Some(path) = path else {
            return;
        };
        if let Err(err) = Command::new("open").arg(&path).spawn() {
            tracing::debug!(%path, %err, "failed to open snapshot");
        }
    }
}
