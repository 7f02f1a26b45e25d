use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph, Wrap};

use super::{App, Focus};
use crate::model::BranchState;

fn state_color(state: BranchState) -> Color {
    // Colours follow the css class label so both views agree.
    match state.css_class() {
        "success" => Color::Green,
        "info" => Color::Cyan,
        "danger" => Color::Red,
        _ => Color::Yellow,
    }
}

fn short_sha(sha: Option<&str>) -> String {
    match sha {
        Some(s) => s.chars().take(10).collect(),
        None => "-".to_string(),
    }
}

pub(super) fn draw(f: &mut Frame, app: &mut App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(f.area());

    draw_header(f, app, rows[0]);

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(rows[1]);
    draw_repos(f, app, cols[0]);
    draw_details(f, app, cols[1]);
    draw_confirm(f, app, rows[2]);
    draw_footer(f, app, rows[3]);
}

fn draw_header(f: &mut Frame, app: &App, area: Rect) {
    let session = if app.model.logged_in.get() {
        Span::styled("logged in", Style::default().fg(Color::Green))
    } else {
        Span::styled("logged out", Style::default().fg(Color::Red))
    };
    let line = Line::from(vec![
        Span::styled("forksync ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(app.model.config().base_url.clone()),
        Span::raw("  "),
        session,
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn draw_repos(f: &mut Frame, app: &mut App, area: Rect) {
    let selected = app.model.selected_repo.get();
    let items = app.model.repos.with(|repos| {
        repos
            .iter()
            .map(|r| {
                let marker = if selected.as_ref().is_some_and(|s| s.is_same(r)) {
                    "* "
                } else {
                    "  "
                };
                ListItem::new(format!("{}{}", marker, r.full_name))
            })
            .collect::<Vec<_>>()
    });

    let title = if app.model.ready.get() {
        "repositories"
    } else {
        "repositories (loading)"
    };
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    f.render_stateful_widget(list, area, &mut app.cursor);
}

fn draw_details(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("status");
    let Some(repo) = app.model.selected_repo.get() else {
        f.render_widget(
            Paragraph::new("select a repository with Enter").block(block),
            area,
        );
        return;
    };

    let mut lines = vec![Line::from(Span::styled(
        repo.full_name.clone(),
        Style::default().add_modifier(Modifier::BOLD),
    ))];

    let Some(details) = app.model.selected_repo_details.get() else {
        if app.model.loading_repo_details.get() {
            lines.push(Line::from("loading..."));
        } else {
            lines.push(Line::from("no details (Enter to reload)"));
        }
        f.render_widget(Paragraph::new(lines).block(block), area);
        return;
    };

    if let Some(parent) = details.status.parent_full_name() {
        lines.push(Line::from(format!("parent: {}", parent)));
    } else {
        lines.push(Line::from("parent: (none)"));
    }

    if let Some(s) = app.model.selected_repo_summary.get() {
        lines.push(Line::from(format!(
            "unchanged {}  created {}  deleted {}  reset {}",
            s.unchanged, s.created, s.deleted, s.reset
        )));
    }
    if app.model.selected_repo_in_sync.get() {
        lines.push(Line::from(Span::styled(
            "in sync with parent",
            Style::default().fg(Color::Green),
        )));
    } else if app.model.selected_repo_has_changes.get() {
        lines.push(Line::from(Span::styled(
            "out of sync: reset with r",
            Style::default().fg(Color::Yellow),
        )));
    }

    if app.model.view_selected_repo_details.get() {
        lines.push(Line::from(""));
        for b in &details.branch_list {
            let state = b.state();
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{:<10}", state.label()),
                    Style::default().fg(state_color(state)),
                ),
                Span::raw(format!(
                    "{:<24} {:<10} {:<10}",
                    b.name,
                    short_sha(b.sha.as_deref()),
                    short_sha(b.parent_sha.as_deref())
                )),
            ]));
        }
    } else {
        lines.push(Line::from(format!(
            "{} branches (d to show)",
            details.branch_list.len()
        )));
    }

    f.render_widget(
        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false }),
        area,
    );
}

fn draw_confirm(f: &mut Frame, app: &App, area: Rect) {
    let title = match app.focus {
        Focus::Confirm => "type OWNER/NAME to confirm reset (Enter resets, Esc cancels)",
        Focus::Browse => "reset",
    };
    let style = if app.model.reset_enabled.get() {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let text = match app.focus {
        Focus::Confirm => format!("> {}", app.confirm_buf),
        Focus::Browse => String::new(),
    };
    f.render_widget(
        Paragraph::new(Span::styled(text, style))
            .block(Block::default().borders(Borders::ALL).title(title)),
        area,
    );
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let line = if let Some(err) = app.model.last_error.get() {
        Line::from(Span::styled(err, Style::default().fg(Color::Red)))
    } else if let Some(notice) = &app.notice {
        Line::from(notice.clone())
    } else {
        Line::from("j/k move  Enter select  d branches  r reset  g refresh  l login/logout  q quit")
    };
    f.render_widget(Paragraph::new(line), area);
}
