use std::{io, thread, time::Duration};

use anyhow::{Context, Result};
use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::{spawn, sync::mpsc};
use tracing::{error, info};

use peloton_core::{
    registry::custom_manager_id,
    scoring::{PointScheme, LEADER_BONUS_PER_DAY},
    AppConfig, Catalog, DataFeed, RefreshOutcome, Registry, Rider, RosterRules, SharePayload,
    StateStore,
};

const TICK_RATE: Duration = Duration::from_millis(250);
const MAX_NAME_LEN: usize = 32;

/// Built-in manager slots offered on the setup screen.
const PRESET_MANAGERS: &[(&str, &str)] = &[
    ("lars", "Lars"),
    ("gustav", "Gustav"),
    ("erik", "Erik"),
    ("johan", "Johan"),
];

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    success: Color,
    warning: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
        }
    }
}

enum AppEvent {
    Input(Event),
    Tick,
    Refreshed(Box<RefreshOutcome>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Setup,
    Main,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Riders,
    MyTeam,
    Leaderboard,
    Settings,
}

impl Tab {
    const ALL: [Tab; 4] = [Tab::Riders, Tab::MyTeam, Tab::Leaderboard, Tab::Settings];

    fn title(self) -> &'static str {
        match self {
            Tab::Riders => "Riders",
            Tab::MyTeam => "My Team",
            Tab::Leaderboard => "Leaderboard",
            Tab::Settings => "Settings",
        }
    }

    fn next(self) -> Tab {
        let index = Tab::ALL.iter().position(|tab| *tab == self).unwrap_or(0);
        Tab::ALL[(index + 1) % Tab::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Browse,
    Search,
    CustomName,
    ShareImport,
    RegistryImport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SortKey {
    PriceDesc,
    PriceAsc,
    Name,
}

impl SortKey {
    fn next(self) -> SortKey {
        match self {
            SortKey::PriceDesc => SortKey::PriceAsc,
            SortKey::PriceAsc => SortKey::Name,
            SortKey::Name => SortKey::PriceDesc,
        }
    }

    fn label(self) -> &'static str {
        match self {
            SortKey::PriceDesc => "price ↓",
            SortKey::PriceAsc => "price ↑",
            SortKey::Name => "name",
        }
    }
}

struct UiState {
    cursor: usize,
    offset: usize,
    list_height: usize,
    setup_cursor: usize,
    search: String,
    input: String,
    sort: SortKey,
    team_filter: Option<String>,
    status: String,
    should_quit: bool,
    show_detail: bool,
    share_text: Option<String>,
    pending_reset: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            cursor: 0,
            offset: 0,
            list_height: 1,
            setup_cursor: 0,
            search: String::new(),
            input: String::new(),
            sort: SortKey::PriceDesc,
            team_filter: None,
            status: "Ready".to_string(),
            should_quit: false,
            show_detail: false,
            share_text: None,
            pending_reset: false,
        }
    }
}

impl UiState {
    fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    fn move_cursor(&mut self, delta: isize, len: usize) {
        if len == 0 {
            self.cursor = 0;
            self.offset = 0;
            return;
        }
        let max = len as isize - 1;
        let mut next = self.cursor as isize + delta;
        if next < 0 {
            next = 0;
        } else if next > max {
            next = max;
        }
        self.cursor = next as usize;
        self.ensure_cursor_visible();
    }

    fn ensure_cursor_visible(&mut self) {
        let height = self.list_height.max(1);
        if self.cursor < self.offset {
            self.offset = self.cursor;
        } else if self.cursor >= self.offset + height {
            self.offset = self.cursor + 1 - height;
        }
    }

    fn reset_list(&mut self) {
        self.cursor = 0;
        self.offset = 0;
    }
}

pub struct PelotonApp {
    config: AppConfig,
    rules: RosterRules,
    feed: DataFeed,
    store: StateStore,
    catalog: Catalog,
    registry: Registry,
    current_manager: Option<String>,
    screen: Screen,
    tab: Tab,
    mode: Mode,
    state: UiState,
    theme: Theme,
    event_tx: Option<mpsc::Sender<AppEvent>>,
    refreshing: bool,
}

impl PelotonApp {
    pub fn new(
        config: AppConfig,
        feed: DataFeed,
        store: StateStore,
        registry: Registry,
        outcome: RefreshOutcome,
    ) -> Self {
        let rules = config.rules();
        let mut state = UiState::default();
        state.set_status(if outcome.from_fallback {
            format!(
                "Could not load rider data; using {} built-in riders",
                outcome.catalog.len()
            )
        } else {
            format!("Loaded {} riders", outcome.catalog.len())
        });

        Self {
            config,
            rules,
            feed,
            store,
            catalog: outcome.catalog,
            registry,
            current_manager: None,
            screen: Screen::Setup,
            tab: Tab::Riders,
            mode: Mode::Browse,
            state,
            theme: Theme::default(),
            event_tx: None,
            refreshing: false,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx.clone());
        self.event_tx = Some(event_tx);

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.state.should_quit {
                break;
            }

            match event_rx.recv().await {
                Some(AppEvent::Input(Event::Key(key))) => self.handle_key(key),
                Some(AppEvent::Input(_)) => {}
                Some(AppEvent::Tick) => {}
                Some(AppEvent::Refreshed(outcome)) => self.finish_refresh(*outcome),
                None => break,
            }

            if self.state.should_quit {
                break;
            }
        }

        self.persist();
        restore_terminal(&mut terminal)?;
        self.event_tx = None;
        Ok(())
    }

    fn persist(&mut self) {
        if let Err(err) = self.store.save(&self.registry) {
            error!("failed to persist registry: {err:#}");
            self.state.set_status(format!("Save failed: {err}"));
        }
    }

    fn current_roster_key(&self) -> Option<&str> {
        self.current_manager.as_deref()
    }

    fn select_manager(&mut self, manager_id: String, display_name: String) {
        self.registry.get_or_create(&manager_id, &display_name);
        self.current_manager = Some(manager_id);
        self.screen = Screen::Main;
        self.tab = Tab::Riders;
        self.state.reset_list();
        self.state.set_status(format!("Welcome, {display_name}!"));
        self.persist();
    }

    fn change_manager(&mut self) {
        self.current_manager = None;
        self.screen = Screen::Setup;
        self.mode = Mode::Browse;
        self.state.input.clear();
        self.state.set_status("Pick a manager");
    }

    // Rider list as currently filtered and sorted.
    fn filtered_riders(&self) -> Vec<Rider> {
        let needle = self.state.search.trim().to_lowercase();
        let mut riders: Vec<Rider> = self
            .catalog
            .riders()
            .iter()
            .filter(|rider| {
                if let Some(team) = &self.state.team_filter {
                    if &rider.team != team {
                        return false;
                    }
                }
                needle.is_empty()
                    || rider.name.to_lowercase().contains(&needle)
                    || rider.team.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();

        match self.state.sort {
            SortKey::PriceDesc => riders.sort_by(|a, b| b.price.cmp(&a.price)),
            SortKey::PriceAsc => riders.sort_by(|a, b| a.price.cmp(&b.price)),
            SortKey::Name => riders.sort_by(|a, b| a.name.cmp(&b.name)),
        }
        riders
    }

    fn toggle_selected_rider(&mut self) {
        let riders = self.filtered_riders();
        let Some(rider) = riders.get(self.state.cursor).cloned() else {
            return;
        };
        let Some(manager_id) = self.current_manager.clone() else {
            return;
        };
        let rules = self.rules;
        let Some(roster) = self.registry.get_mut(&manager_id) else {
            return;
        };

        if roster.contains(rider.id) {
            match roster.remove_rider(rider.id) {
                Ok(removed) => {
                    self.state
                        .set_status(format!("{} removed from your team", removed.name));
                }
                Err(err) => self.state.set_status(err.to_string()),
            }
        } else {
            match roster.add_rider(&rider, &rules) {
                Ok(()) => {
                    self.state
                        .set_status(format!("{} added to your team", rider.name));
                }
                Err(err) => self.state.set_status(err.to_string()),
            }
        }
        self.persist();
    }

    fn remove_from_team(&mut self) {
        let Some(manager_id) = self.current_manager.clone() else {
            return;
        };
        let Some(roster) = self.registry.get_mut(&manager_id) else {
            return;
        };
        let Some(rider) = roster.riders.get(self.state.cursor).cloned() else {
            return;
        };
        match roster.remove_rider(rider.id) {
            Ok(removed) => {
                self.state
                    .set_status(format!("{} removed from your team", removed.name));
            }
            Err(err) => self.state.set_status(err.to_string()),
        }
        let len = self
            .registry
            .get(&manager_id)
            .map(|roster| roster.riders.len())
            .unwrap_or(0);
        if self.state.cursor >= len && len > 0 {
            self.state.cursor = len - 1;
        }
        self.persist();
    }

    fn cycle_team_filter(&mut self) {
        let codes = self.catalog.team_codes();
        self.state.team_filter = match &self.state.team_filter {
            None => codes.first().cloned(),
            Some(current) => {
                let index = codes.iter().position(|code| code == current);
                match index {
                    Some(position) if position + 1 < codes.len() => {
                        Some(codes[position + 1].clone())
                    }
                    _ => None,
                }
            }
        };
        self.state.reset_list();
        match &self.state.team_filter {
            Some(code) => self.state.set_status(format!("Filter: team {code}")),
            None => self.state.set_status("Filter cleared"),
        }
    }

    fn share_current_team(&mut self) {
        let Some(manager_id) = self.current_roster_key() else {
            return;
        };
        let Some(roster) = self.registry.get(manager_id) else {
            return;
        };
        if roster.riders.is_empty() {
            self.state
                .set_status("No team to share; pick some riders first");
            return;
        }
        let encoded = SharePayload::from_roster(roster).encode();
        self.state.share_text = Some(encoded);
    }

    fn import_share_input(&mut self) {
        let encoded = self.state.input.trim().to_string();
        self.state.input.clear();
        self.mode = Mode::Browse;
        if encoded.is_empty() {
            self.state.set_status("Nothing to import");
            return;
        }
        match self.registry.import_shared(&encoded) {
            Ok(roster) => {
                let label = roster.label().to_string();
                self.registry.recompute_scores(&self.catalog);
                self.state.set_status(format!("Loaded shared team from {label}"));
                self.persist();
            }
            Err(err) => self.state.set_status(err.to_string()),
        }
    }

    fn import_registry_input(&mut self) {
        let path = self.state.input.trim().to_string();
        self.state.input.clear();
        self.mode = Mode::Browse;
        if path.is_empty() {
            self.state.set_status("Nothing to import");
            return;
        }
        let blob = match std::fs::read_to_string(&path) {
            Ok(blob) => blob,
            Err(err) => {
                self.state.set_status(format!("Cannot read {path}: {err}"));
                return;
            }
        };
        match self.registry.import_all(&blob) {
            Ok(count) => {
                self.registry.reconcile(&self.catalog);
                self.persist();
                self.change_manager();
                self.state.set_status(format!("Imported {count} teams"));
            }
            Err(err) => self.state.set_status(err.to_string()),
        }
    }

    fn export_registry(&mut self) {
        let path = self.config.data_dir.join(format!(
            "export_{}.json",
            Local::now().format("%Y%m%d%H%M%S")
        ));
        let result = std::fs::create_dir_all(&self.config.data_dir)
            .map_err(anyhow::Error::from)
            .and_then(|_| {
                std::fs::write(&path, self.registry.serialize()).map_err(anyhow::Error::from)
            });
        match result {
            Ok(()) => {
                info!(path = %path.display(), "registry exported");
                self.state
                    .set_status(format!("Exported to {}", path.display()));
            }
            Err(err) => self.state.set_status(format!("Export failed: {err}")),
        }
    }

    fn reset_registry(&mut self) {
        if !self.state.pending_reset {
            self.state.pending_reset = true;
            self.state
                .set_status("This wipes all teams; press x again to confirm");
            return;
        }
        self.state.pending_reset = false;
        self.registry.reset();
        self.persist();
        self.change_manager();
        self.state.set_status("All data has been reset");
    }

    fn start_refresh(&mut self) {
        if self.refreshing {
            self.state.set_status("Refresh already running");
            return;
        }
        let Some(sender) = self.event_tx.clone() else {
            return;
        };
        self.refreshing = true;
        self.state.set_status("Refreshing rider data…");
        let feed = self.feed.clone();
        spawn(async move {
            let outcome = feed.refresh().await;
            let _ = sender.send(AppEvent::Refreshed(Box::new(outcome))).await;
        });
    }

    fn finish_refresh(&mut self, outcome: RefreshOutcome) {
        self.refreshing = false;
        self.catalog = outcome.catalog;
        self.registry.reconcile(&self.catalog);
        self.persist();
        // The visible list may have shrunk; pull the selection back in range.
        self.move_in_list(0);

        let mut status = if outcome.from_fallback {
            format!(
                "Could not load rider data; using {} built-in riders",
                self.catalog.len()
            )
        } else {
            format!("Rider data refreshed ({} riders)", self.catalog.len())
        };
        if let Some(report) = outcome.overlay {
            status.push_str(&format!("; scores updated for {} riders", report.updated));
        }
        self.state.set_status(status);
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.state.should_quit = true;
            return;
        }
        if self.state.share_text.is_some() {
            self.state.share_text = None;
            return;
        }
        if self.state.show_detail {
            self.state.show_detail = false;
            return;
        }
        if key.code != KeyCode::Char('x') {
            self.state.pending_reset = false;
        }

        match self.mode {
            Mode::Search => self.handle_search_key(key),
            Mode::CustomName => self.handle_custom_name_key(key),
            Mode::ShareImport | Mode::RegistryImport => self.handle_import_key(key),
            Mode::Browse => match self.screen {
                Screen::Setup => self.handle_setup_key(key),
                Screen::Main => self.handle_main_key(key),
            },
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.state.search.clear();
                self.mode = Mode::Browse;
                self.state.reset_list();
                self.state.set_status("Search cleared");
            }
            KeyCode::Enter => {
                self.mode = Mode::Browse;
            }
            KeyCode::Backspace => {
                self.state.search.pop();
                self.state.reset_list();
            }
            KeyCode::Char(ch) => {
                self.state.search.push(ch);
                self.state.reset_list();
            }
            _ => {}
        }
    }

    fn handle_custom_name_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.state.input.clear();
                self.mode = Mode::Browse;
            }
            KeyCode::Enter => {
                let name = self.state.input.trim().to_string();
                self.state.input.clear();
                self.mode = Mode::Browse;
                if name.is_empty() {
                    self.state.set_status("Manager name cannot be empty");
                } else {
                    self.select_manager(custom_manager_id(), name);
                }
            }
            KeyCode::Backspace => {
                self.state.input.pop();
            }
            KeyCode::Char(ch) => {
                if self.state.input.len() < MAX_NAME_LEN && !ch.is_control() {
                    self.state.input.push(ch);
                }
            }
            _ => {}
        }
    }

    fn handle_import_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.state.input.clear();
                self.mode = Mode::Browse;
            }
            KeyCode::Enter => match self.mode {
                Mode::ShareImport => self.import_share_input(),
                _ => self.import_registry_input(),
            },
            KeyCode::Backspace => {
                self.state.input.pop();
            }
            KeyCode::Char(ch) => {
                if !ch.is_control() {
                    self.state.input.push(ch);
                }
            }
            _ => {}
        }
    }

    fn handle_setup_key(&mut self, key: KeyEvent) {
        let entries = PRESET_MANAGERS.len() + 1;
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.state.should_quit = true,
            KeyCode::Up | KeyCode::Char('k') => {
                self.state.setup_cursor = self.state.setup_cursor.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.state.setup_cursor + 1 < entries {
                    self.state.setup_cursor += 1;
                }
            }
            KeyCode::Enter => {
                if self.state.setup_cursor < PRESET_MANAGERS.len() {
                    let (id, name) = PRESET_MANAGERS[self.state.setup_cursor];
                    self.select_manager(id.to_string(), name.to_string());
                } else {
                    self.mode = Mode::CustomName;
                    self.state.set_status("Type a manager name, Enter to confirm");
                }
            }
            _ => {}
        }
    }

    fn handle_main_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.state.should_quit = true,
            KeyCode::Tab => {
                self.tab = self.tab.next();
                self.state.reset_list();
            }
            KeyCode::Char('1') => self.switch_tab(Tab::Riders),
            KeyCode::Char('2') => self.switch_tab(Tab::MyTeam),
            KeyCode::Char('3') => self.switch_tab(Tab::Leaderboard),
            KeyCode::Char('4') => self.switch_tab(Tab::Settings),
            KeyCode::Char('m') => self.change_manager(),
            KeyCode::Char('r') => self.start_refresh(),
            KeyCode::Char('e') => self.export_registry(),
            KeyCode::Char('i') => {
                self.mode = Mode::ShareImport;
                self.state
                    .set_status("Paste a share code, Enter to import");
            }
            KeyCode::Char('o') => {
                self.mode = Mode::RegistryImport;
                self.state
                    .set_status("Path to an exported registry file, Enter to load");
            }
            KeyCode::Char('x') => self.reset_registry(),
            KeyCode::Char('c') => self.share_current_team(),
            KeyCode::Up | KeyCode::Char('k') => self.move_in_list(-1),
            KeyCode::Down | KeyCode::Char('j') => self.move_in_list(1),
            KeyCode::PageUp => self.move_in_list(-(self.state.list_height as isize)),
            KeyCode::PageDown => self.move_in_list(self.state.list_height as isize),
            KeyCode::Enter | KeyCode::Char(' ') => match self.tab {
                Tab::Riders => self.toggle_selected_rider(),
                Tab::MyTeam => self.remove_from_team(),
                _ => {}
            },
            KeyCode::Char('d') => {
                if self.tab == Tab::Riders || self.tab == Tab::MyTeam {
                    self.state.show_detail = true;
                }
            }
            KeyCode::Char('/') => {
                if self.tab == Tab::Riders {
                    self.mode = Mode::Search;
                    self.state.set_status("Search riders");
                }
            }
            KeyCode::Char('s') => {
                if self.tab == Tab::Riders {
                    self.state.sort = self.state.sort.next();
                    self.state.reset_list();
                    self.state
                        .set_status(format!("Sorted by {}", self.state.sort.label()));
                }
            }
            KeyCode::Char('f') => {
                if self.tab == Tab::Riders {
                    self.cycle_team_filter();
                }
            }
            _ => {}
        }
    }

    fn switch_tab(&mut self, tab: Tab) {
        self.tab = tab;
        self.state.reset_list();
    }

    fn move_in_list(&mut self, delta: isize) {
        let len = match self.tab {
            Tab::Riders => self.filtered_riders().len(),
            Tab::MyTeam => self
                .current_roster_key()
                .and_then(|id| self.registry.get(id))
                .map(|roster| roster.riders.len())
                .unwrap_or(0),
            Tab::Leaderboard => self.registry.len(),
            Tab::Settings => 0,
        };
        self.state.move_cursor(delta, len);
    }

    fn draw(&mut self, frame: &mut Frame) {
        match self.screen {
            Screen::Setup => self.draw_setup(frame),
            Screen::Main => self.draw_main(frame),
        }
        if self.state.show_detail {
            self.render_detail_popup(frame);
        }
        if let Some(share) = self.state.share_text.clone() {
            self.render_share_popup(frame, &share);
        }
        if self.mode == Mode::CustomName {
            self.render_input_popup(frame, "New manager", "Manager name:");
        }
        if self.mode == Mode::ShareImport {
            self.render_input_popup(frame, "Import shared team", "Share code:");
        }
        if self.mode == Mode::RegistryImport {
            self.render_input_popup(frame, "Import registry", "File path:");
        }
    }

    fn draw_setup(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(3), Constraint::Length(3)])
            .split(area);

        let title = Paragraph::new(Line::from(Span::styled(
            "PELOTON — fantasy tour manager",
            Style::default()
                .fg(self.theme.accent)
                .add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(title, chunks[0]);

        let mut lines: Vec<Line> = PRESET_MANAGERS
            .iter()
            .enumerate()
            .map(|(index, (_, name))| self.menu_line(index, name))
            .collect();
        lines.push(self.menu_line(PRESET_MANAGERS.len(), "Custom name…"));

        let menu = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("Who is managing?"));
        frame.render_widget(menu, centered_rect(40, 10, chunks[1]));

        self.render_status(frame, chunks[2]);
    }

    fn menu_line(&self, index: usize, label: &str) -> Line<'static> {
        if index == self.state.setup_cursor {
            Line::from(Span::styled(
                format!("▶ {label}"),
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            ))
        } else {
            Line::from(Span::styled(
                format!("  {label}"),
                Style::default().fg(self.theme.primary_fg),
            ))
        }
    }

    fn draw_main(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Min(5),
                Constraint::Length(3),
            ])
            .split(area);

        self.render_header(frame, chunks[0]);
        self.render_tabs(frame, chunks[1]);

        self.state.list_height = chunks[2].height.saturating_sub(2) as usize;
        match self.tab {
            Tab::Riders => self.render_riders(frame, chunks[2]),
            Tab::MyTeam => self.render_my_team(frame, chunks[2]),
            Tab::Leaderboard => self.render_leaderboard(frame, chunks[2]),
            Tab::Settings => self.render_settings(frame, chunks[2]),
        }

        self.render_status(frame, chunks[3]);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let line = match self.current_roster_key().and_then(|id| self.registry.get(id)) {
            Some(roster) => Line::from(vec![
                Span::styled(
                    roster.label().to_string(),
                    Style::default()
                        .fg(self.theme.accent)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw("   "),
                Span::raw(format!(
                    "budget left {}",
                    self.rules.remaining(roster)
                )),
                Span::raw("   "),
                Span::raw(format!(
                    "riders {}/{}",
                    roster.riders.len(),
                    self.rules.max_riders
                )),
                Span::raw("   "),
                Span::styled(
                    format!("score {}", roster.score),
                    Style::default().fg(self.theme.success),
                ),
            ]),
            None => Line::from("no manager selected"),
        };
        let header = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(header, area);
    }

    fn render_tabs(&self, frame: &mut Frame, area: Rect) {
        let mut spans = Vec::new();
        for (index, tab) in Tab::ALL.iter().enumerate() {
            if index > 0 {
                spans.push(Span::styled(" │ ", Style::default().fg(self.theme.muted)));
            }
            let style = if *tab == self.tab {
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.muted)
            };
            spans.push(Span::styled(format!("{} {}", index + 1, tab.title()), style));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_riders(&mut self, frame: &mut Frame, area: Rect) {
        let riders = self.filtered_riders();
        let roster = self
            .current_roster_key()
            .and_then(|id| self.registry.get(id));

        let mut title = format!("Riders ({}) — sort: {}", riders.len(), self.state.sort.label());
        if let Some(team) = &self.state.team_filter {
            title.push_str(&format!(" — team: {team}"));
        }
        if !self.state.search.is_empty() {
            title.push_str(&format!(" — search: {}", self.state.search));
        }

        let height = area.height.saturating_sub(2) as usize;
        let start = self.state.offset.min(riders.len());
        let end = (start + height).min(riders.len());
        let lines: Vec<Line> = riders[start..end]
            .iter()
            .enumerate()
            .map(|(row, rider)| {
                let index = start + row;
                let selected = roster.map(|r| r.contains(rider.id)).unwrap_or(false);
                let marker = if selected { "●" } else { " " };
                let badge = if rider.confirmed { "✓" } else { "?" };
                let text = format!(
                    "{marker} {badge} {:<28} {:<4} {:>5}  score {:>4}",
                    truncate(&rider.name, 28),
                    rider.team,
                    rider.price,
                    rider.score
                );
                let mut style = if selected {
                    Style::default().fg(self.theme.success)
                } else if rider.confirmed {
                    Style::default().fg(self.theme.primary_fg)
                } else {
                    Style::default().fg(self.theme.muted)
                };
                if index == self.state.cursor {
                    style = style.add_modifier(Modifier::REVERSED);
                }
                Line::from(Span::styled(text, style))
            })
            .collect();

        let list = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(list, area);
    }

    fn render_my_team(&mut self, frame: &mut Frame, area: Rect) {
        let Some(roster) = self
            .current_roster_key()
            .and_then(|id| self.registry.get(id))
        else {
            frame.render_widget(
                Paragraph::new("No manager selected")
                    .block(Block::default().borders(Borders::ALL).title("My Team")),
                area,
            );
            return;
        };

        let title = format!(
            "My Team — cost {} / {}  score {}",
            roster.total_cost, self.rules.max_budget, roster.score
        );

        let height = area.height.saturating_sub(2) as usize;
        let start = self.state.offset.min(roster.riders.len());
        let end = (start + height).min(roster.riders.len());
        let lines: Vec<Line> = if roster.riders.is_empty() {
            vec![Line::from(
                "No riders selected yet. Pick riders on the Riders tab.",
            )]
        } else {
            roster.riders[start..end]
                .iter()
                .enumerate()
                .map(|(row, rider)| {
                    let index = start + row;
                    let badge = if rider.confirmed { "✓" } else { "?" };
                    let text = format!(
                        "{badge} {:<28} {:<4} {:>5}  stage {:>3}  gc {:>3}  leader {:>3}",
                        truncate(&rider.name, 28),
                        rider.team,
                        rider.price,
                        rider.stats.stage_points,
                        rider.stats.gc_points,
                        rider.stats.leader_bonus
                    );
                    let mut style = Style::default().fg(self.theme.primary_fg);
                    if index == self.state.cursor {
                        style = style.add_modifier(Modifier::REVERSED);
                    }
                    Line::from(Span::styled(text, style))
                })
                .collect()
        };

        let list = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(list, area);
    }

    fn render_leaderboard(&mut self, frame: &mut Frame, area: Rect) {
        let ranked = self.registry.rank();
        let height = area.height.saturating_sub(2) as usize;
        let start = self.state.offset.min(ranked.len());
        let end = (start + height).min(ranked.len());
        let lines: Vec<Line> = if ranked.is_empty() {
            vec![Line::from("No teams yet.")]
        } else {
            ranked[start..end]
                .iter()
                .enumerate()
                .map(|(row, entry)| {
                    let index = start + row;
                    let text = format!(
                        "{:>2}. {:<24} score {:>5}  cost {:>5}  {}",
                        index + 1,
                        truncate(&entry.display_name, 24),
                        entry.score,
                        entry.total_cost,
                        entry.last_updated.with_timezone(&Local).format("%Y-%m-%d")
                    );
                    let mut style = match index {
                        0 => Style::default()
                            .fg(self.theme.warning)
                            .add_modifier(Modifier::BOLD),
                        1 | 2 => Style::default().fg(self.theme.accent),
                        _ => Style::default().fg(self.theme.primary_fg),
                    };
                    if index == self.state.cursor {
                        style = style.add_modifier(Modifier::REVERSED);
                    }
                    Line::from(Span::styled(text, style))
                })
                .collect()
        };

        let list =
            Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Leaderboard"));
        frame.render_widget(list, area);
    }

    fn render_settings(&self, frame: &mut Frame, area: Rect) {
        let overlay = self
            .config
            .overlay_source
            .as_deref()
            .unwrap_or("(none configured)");
        let lines = vec![
            Line::from(format!("Catalog source: {}", self.config.catalog_source)),
            Line::from(format!("Overlay source: {overlay}")),
            Line::from(format!("Data dir:       {}", self.config.data_dir.display())),
            Line::from(format!(
                "Rules:          budget {}, riders {}",
                self.rules.max_budget, self.rules.max_riders
            )),
            Line::from(""),
            Line::from(Span::styled(
                "Keys",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from("  1-4/Tab tabs   ↑↓ move   Enter/Space pick or drop rider"),
            Line::from("  / search   s sort   f team filter   d rider details"),
            Line::from("  c share team   i import share code   e export   o import file   x reset"),
            Line::from("  r refresh data   m change manager   q quit"),
        ];
        let panel =
            Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Settings"));
        frame.render_widget(panel, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let status = Paragraph::new(self.state.status.clone())
            .style(Style::default().fg(self.theme.primary_fg))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(status, area);
    }

    fn detail_rider(&self) -> Option<Rider> {
        match self.tab {
            Tab::Riders => self.filtered_riders().get(self.state.cursor).cloned(),
            Tab::MyTeam => self
                .current_roster_key()
                .and_then(|id| self.registry.get(id))
                .and_then(|roster| roster.riders.get(self.state.cursor))
                .cloned(),
            _ => None,
        }
    }

    fn render_detail_popup(&self, frame: &mut Frame) {
        let Some(rider) = self.detail_rider() else {
            return;
        };
        let area = centered_rect(62, 16, frame.size());
        frame.render_widget(Clear, area);

        let status = if rider.confirmed {
            Span::styled("confirmed starter", Style::default().fg(self.theme.success))
        } else {
            Span::styled(
                "not yet confirmed",
                Style::default().fg(self.theme.warning),
            )
        };
        let lines = vec![
            Line::from(Span::styled(
                rider.name.clone(),
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(vec![
                Span::raw(format!("{} — {} points — ", rider.team, rider.price)),
                status,
            ]),
            Line::from(""),
            Line::from(format!("Total score:   {}", rider.score)),
            Line::from(format!("Stage points:  {}", rider.stats.stage_points)),
            Line::from(format!("GC points:     {}", rider.stats.gc_points)),
            Line::from(format!("Leader bonus:  {}", rider.stats.leader_bonus)),
            Line::from(""),
            Line::from(Span::styled(
                "Point scheme",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(format!(
                "Stage win {} … 10th {}",
                PointScheme::stage_points(1),
                PointScheme::stage_points(10)
            )),
            Line::from(format!(
                "GC win {} … 50th {}",
                PointScheme::gc_points(1),
                PointScheme::gc_points(50)
            )),
            Line::from(format!("Leader jersey {LEADER_BONUS_PER_DAY}/day")),
        ];

        let popup = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Rider"));
        frame.render_widget(popup, area);
    }

    fn render_share_popup(&self, frame: &mut Frame, share: &str) {
        let area = centered_rect(70, 12, frame.size());
        frame.render_widget(Clear, area);
        let lines = vec![
            Line::from("Copy this code and send it to another manager:"),
            Line::from(""),
            Line::from(Span::styled(
                share.to_string(),
                Style::default().fg(self.theme.accent),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "any key to close",
                Style::default().fg(self.theme.muted),
            )),
        ];
        let popup = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Share team"));
        frame.render_widget(popup, area);
    }

    fn render_input_popup(&self, frame: &mut Frame, title: &str, prompt: &str) {
        let area = centered_rect(60, 5, frame.size());
        frame.render_widget(Clear, area);
        let lines = vec![Line::from(vec![
            Span::raw(format!("{prompt} ")),
            Span::styled(
                format!("{}▏", self.state.input),
                Style::default().fg(self.theme.accent),
            ),
        ])];
        let popup = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(title.to_string()));
        frame.render_widget(popup, area);
    }
}

fn truncate(input: &str, max: usize) -> String {
    if input.chars().count() <= max {
        input.to_string()
    } else {
        let mut out: String = input.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width - width) / 2;
    let y = area.y + (area.height - height) / 2;
    Rect::new(x, y, width, height)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use tempfile::tempdir;

    fn test_app(root: &std::path::Path) -> PelotonApp {
        let config = AppConfig::default();
        let feed = DataFeed::new(config.clone());
        let store = StateStore::new(root);
        let outcome = RefreshOutcome {
            catalog: Catalog::builtin(),
            from_fallback: false,
            overlay: None,
        };
        PelotonApp::new(config, feed, store, Registry::new(), outcome)
    }

    #[test]
    fn refresh_to_smaller_catalog_keeps_selection_drawable() {
        let dir = tempdir().expect("tempdir");
        let mut app = test_app(dir.path());
        app.screen = Screen::Main;
        app.state.cursor = 11;
        app.state.offset = 10;
        app.state.list_height = 2;

        let catalog =
            Catalog::from_text("ONE Rider;AAA;100\nTWO Rider;BBB;50\n").expect("catalog");
        app.finish_refresh(RefreshOutcome {
            catalog,
            from_fallback: false,
            overlay: None,
        });

        assert!(app.state.cursor < 2, "cursor clamped to new list");
        assert!(app.state.offset <= app.state.cursor);

        let mut terminal = Terminal::new(TestBackend::new(80, 24)).expect("terminal");
        terminal.draw(|frame| app.draw(frame)).expect("draw");
    }

    #[test]
    fn team_and_leaderboard_panes_window_by_offset() {
        let dir = tempdir().expect("tempdir");
        let mut app = test_app(dir.path());
        app.screen = Screen::Main;
        app.current_manager = Some("alice".to_string());
        let roster = app.registry.get_or_create("alice", "Alice");
        for rider in Catalog::builtin().riders().iter().take(6) {
            roster.riders.push(rider.clone());
        }
        app.state.cursor = 5;
        app.state.offset = 5;

        // Panes shorter than the list still render the cursor row.
        let mut terminal = Terminal::new(TestBackend::new(80, 6)).expect("terminal");
        app.tab = Tab::MyTeam;
        terminal.draw(|frame| app.draw(frame)).expect("draw team");
        app.tab = Tab::Leaderboard;
        terminal
            .draw(|frame| app.draw(frame))
            .expect("draw leaderboard");
    }

    #[test]
    fn tab_cycle_covers_all_tabs() {
        let mut tab = Tab::Riders;
        for _ in 0..Tab::ALL.len() {
            tab = tab.next();
        }
        assert_eq!(tab, Tab::Riders);
    }

    #[test]
    fn truncate_keeps_short_names_intact() {
        assert_eq!(truncate("POGACAR Tadej", 28), "POGACAR Tadej");
        assert_eq!(truncate("ABCDEFGH", 4), "ABC…");
    }
}
