use std::io::{self, IsTerminal};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::widgets::ListState;

use crate::remote::ApiClient;
use crate::view_model::{Model, SessionNavigation};
use crate::worker::Worker;

mod view;

pub fn run(client: ApiClient) -> Result<()> {
    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        anyhow::bail!("TUI requires an interactive terminal (TTY)");
    }

    let mut app = App::new(client)?;

    let mut stdout = io::stdout();
    enable_raw_mode().context("enable raw mode")?;
    execute!(stdout, EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    let res = run_loop(&mut terminal, &mut app);

    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
    terminal.show_cursor().ok();

    res
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Focus {
    Browse,
    Confirm,
}

struct App {
    model: Model,
    client: ApiClient,
    worker: Worker,
    cursor: ListState,
    focus: Focus,
    confirm_buf: String,
    notice: Option<String>,
    quit: bool,
}

impl App {
    fn new(client: ApiClient) -> Result<Self> {
        let model = Model::new(client.config().clone());
        let worker = Worker::spawn(client.clone())?;
        Ok(Self {
            model,
            client,
            worker,
            cursor: ListState::default(),
            focus: Focus::Browse,
            confirm_buf: String::new(),
            notice: None,
            quit: false,
        })
    }

    fn pump(&mut self) -> Result<()> {
        for effect in self.model.drain_effects() {
            self.worker.submit(effect)?;
        }
        while let Some(done) = self.worker.try_recv() {
            self.model.apply(done);
        }
        let len = self.model.repos.with(Vec::len);
        match self.cursor.selected() {
            None if len > 0 => self.cursor.select(Some(0)),
            Some(i) if i >= len => self.cursor.select(len.checked_sub(1)),
            _ => {}
        }
        Ok(())
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = self.model.repos.with(Vec::len);
        if len == 0 {
            return;
        }
        let cur = self.cursor.selected().unwrap_or(0) as isize;
        let next = (cur + delta).clamp(0, len as isize - 1);
        self.cursor.select(Some(next as usize));
    }

    fn select_under_cursor(&mut self) {
        let repo = self
            .cursor
            .selected()
            .and_then(|i| self.model.repos.with(|r| r.get(i).cloned()));
        if repo.is_some() {
            self.model.select_repo(repo);
            self.leave_confirm();
        }
    }

    fn enter_confirm(&mut self) {
        if self.model.selected_repo.with(Option::is_none) {
            self.notice = Some("select a repository first (Enter)".to_string());
            return;
        }
        self.focus = Focus::Confirm;
        self.confirm_buf.clear();
        self.model.set_confirmation(None);
    }

    fn leave_confirm(&mut self) {
        self.focus = Focus::Browse;
        self.confirm_buf.clear();
        self.model.set_confirmation(None);
    }

    fn toggle_session(&mut self) {
        let nav = self.model.toggle_session();
        let res = match &nav {
            SessionNavigation::Login(_) => self.client.login(),
            SessionNavigation::Logout(_) => self.client.logout(),
        };
        match res {
            Ok(()) => {
                self.notice = Some(match nav {
                    SessionNavigation::Login(_) => "logged in".to_string(),
                    SessionNavigation::Logout(_) => "logged out".to_string(),
                });
                self.model.refresh_repos();
                self.model.load_selected_repo_details();
            }
            Err(err) => self.notice = Some(format!("{:#}", err)),
        }
    }
}

fn run_loop(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        app.pump()?;
        terminal.draw(|f| view::draw(f, app)).context("draw")?;
        if app.quit {
            return Ok(());
        }

        if event::poll(Duration::from_millis(50)).context("poll")? {
            match event::read().context("read event")? {
                Event::Key(k) if k.kind == KeyEventKind::Press => handle_key(app, k),
                _ => {}
            }
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.quit = true;
        return;
    }

    match app.focus {
        Focus::Confirm => handle_confirm_key(app, key),
        Focus::Browse => handle_browse_key(app, key),
    }
}

fn handle_browse_key(app: &mut App, key: KeyEvent) {
    app.notice = None;
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit = true,
        KeyCode::Up | KeyCode::Char('k') => app.move_cursor(-1),
        KeyCode::Down | KeyCode::Char('j') => app.move_cursor(1),
        KeyCode::Enter => app.select_under_cursor(),
        KeyCode::Char('d') => app.model.toggle_selected_repo_details(),
        KeyCode::Char('g') => {
            app.model.refresh_repos();
        }
        KeyCode::Char('l') => app.toggle_session(),
        KeyCode::Char('r') => app.enter_confirm(),
        _ => {}
    }
}

fn handle_confirm_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.leave_confirm(),
        KeyCode::Backspace => {
            app.confirm_buf.pop();
            app.model.set_confirmation(Some(app.confirm_buf.clone()));
        }
        KeyCode::Char(c) => {
            app.confirm_buf.push(c);
            app.model.set_confirmation(Some(app.confirm_buf.clone()));
        }
        KeyCode::Enter => {
            if !app.model.reset_enabled.get() {
                app.notice = Some("type the full repository name exactly to confirm".to_string());
                return;
            }
            match app.model.reset() {
                Ok(_) => {
                    app.focus = Focus::Browse;
                    app.confirm_buf.clear();
                    app.notice = Some("reset requested".to_string());
                }
                Err(err) => app.notice = Some(err.to_string()),
            }
        }
        _ => {}
    }
}
