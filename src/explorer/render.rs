use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

use crate::model::{SwiftUiOutput, ViewNode};
use crate::present;

use super::session::{Session, SubtreeMode};
use super::{App, Screen};

const SPINNER: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

fn label_style() -> Style {
    Style::default().fg(Color::Yellow)
}

pub(super) fn draw(frame: &mut Frame, app: &App) {
    let session = app.session.lock().expect("session lock");
    match app.screen {
        Screen::Loading => draw_loading(frame, app),
        Screen::Tree => draw_tree(frame, app),
        Screen::Detail => draw_detail(frame, app, &session),
    }
}

fn draw_loading(frame: &mut Frame, app: &App) {
    let text = match &app.load_error {
        Some(message) => format!("\n   Error: {}", message),
        None => format!(
            "\n   {} Fetching view hierarchy...",
            SPINNER[app.spinner % SPINNER.len()]
        ),
    };
    frame.render_widget(Paragraph::new(text), frame.area());
}

fn draw_tree(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(frame.area());

    let items: Vec<ListItem> = app
        .rows
        .iter()
        .map(|row| {
            let marker = if row.has_children {
                if row.expanded { "▾ " } else { "▸ " }
            } else {
                "  "
            };
            let mut spans = vec![Span::raw(format!("{}{}", "  ".repeat(row.depth), marker))];
            if let Some(idx) = row.label.find(" ★") {
                let (class, rest) = row.label.split_at(idx);
                spans.push(Span::raw(class.to_string()));
                spans.push(Span::styled(rest.to_string(), Style::default().fg(Color::Cyan)));
            } else {
                spans.push(Span::raw(row.label.clone()));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" View Hierarchy "),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    let mut state = ListState::default();
    state.select((!app.rows.is_empty()).then_some(app.cursor));
    frame.render_stateful_widget(list, chunks[0], &mut state);

    let footer = " ↑↓ navigate  → expand  ← collapse  Enter detail  f filter  q quit";
    frame.render_widget(Paragraph::new(footer), chunks[1]);
}

fn draw_detail(frame: &mut Frame, app: &App, session: &Session) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(frame.area());

    let Some(detail) = &session.detail else {
        frame.render_widget(Paragraph::new("No view selected"), chunks[0]);
        return;
    };

    let body = if app.show_image_pane && detail.snapshot.is_some() {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
            .split(chunks[0]);
        draw_snapshot_pane(frame, cols[1], detail);
        cols[0]
    } else {
        chunks[0]
    };

    let lines = detail_lines(detail, session);
    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" Detail: {} ", detail.class)),
        )
        .scroll((app.detail_scroll, 0));
    frame.render_widget(paragraph, body);

    frame.render_widget(Paragraph::new(detail_footer(app, session, detail)), chunks[1]);
}

fn draw_snapshot_pane(frame: &mut Frame, area: Rect, detail: &ViewNode) {
    let path = detail.snapshot.as_deref().unwrap_or_default();
    let pane = Paragraph::new(vec![
        Line::raw(""),
        Line::raw(path.to_string()),
        Line::raw(""),
        Line::styled("o open in viewer", Style::default().fg(Color::Gray)),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Snapshot (o: open) "),
    );
    frame.render_widget(pane, area);
}

fn detail_footer(app: &App, session: &Session, detail: &ViewNode) -> String {
    if session.subtree_fetching {
        return format!(
            " {} Fetching declarative subtree...",
            SPINNER[app.spinner % SPINNER.len()]
        );
    }
    if let Some((message, _)) = &app.status {
        return format!(" {}", message);
    }

    let mut parts = vec![" Esc back", " j/k scroll"];
    if detail.is_hosting_view {
        parts.push(match session.subtree_mode {
            SubtreeMode::Off => " s swiftui",
            SubtreeMode::Compact => " s swiftui:compact",
            SubtreeMode::Full => " s swiftui:full",
        });
    }
    if detail.snapshot.is_some() {
        parts.push(" o open snapshot");
    }
    parts.push(" q quit");
    parts.join(" ")
}

fn push_field(lines: &mut Vec<Line<'static>>, label: &str, value: String) {
    lines.push(Line::from(vec![
        Span::styled(format!("{:<14}", label), label_style()),
        Span::raw(value),
    ]));
}

/// Key/value detail text, with the cached declarative subtree appended
/// according to the current display mode.
fn detail_lines(detail: &ViewNode, session: &Session) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    push_field(&mut lines, "Class:", detail.class.clone());
    push_field(&mut lines, "Address:", detail.address.clone());

    if let Some(inheritance) = &detail.inheritance {
        push_field(&mut lines, "Inheritance:", inheritance.clone());
    }
    if let Some(frame) = &detail.frame {
        push_field(
            &mut lines,
            "Frame:",
            format!(
                "({:.0}, {:.0}) {:.0}x{:.0}",
                frame.x, frame.y, frame.width, frame.height
            ),
        );
    }
    if let Some(bounds) = &detail.bounds {
        push_field(
            &mut lines,
            "Bounds:",
            format!(
                "({:.0}, {:.0}) {:.0}x{:.0}",
                bounds.x, bounds.y, bounds.width, bounds.height
            ),
        );
    }
    if let Some(position) = &detail.position {
        push_field(
            &mut lines,
            "Position:",
            format!("({:.0}, {:.0})", position.x, position.y),
        );
    }
    if let Some(hidden) = detail.hidden {
        push_field(&mut lines, "Hidden:", hidden.to_string());
    }
    if let Some(margins) = &detail.layout_margins {
        push_field(
            &mut lines,
            "LayoutMargins:",
            format!(
                "top={:.0} left={:.0} bottom={:.0} right={:.0}",
                margins.top, margins.left, margins.bottom, margins.right
            ),
        );
    }
    if let Some(ambiguous) = detail.has_ambiguous_layout {
        push_field(&mut lines, "Ambiguous:", ambiguous.to_string());
    }
    if let Some(layer) = &detail.layer {
        push_field(
            &mut lines,
            "Layer:",
            format!("{} ({})", layer.class, layer.address),
        );
    }
    if detail.is_hosting_view {
        push_field(&mut lines, "HostingView:", "true".to_string());
    }
    if let Some(snapshot) = &detail.snapshot {
        push_field(&mut lines, "Snapshot:", snapshot.clone());
    }
    if let Some(count) = detail.subview_count {
        push_field(&mut lines, "Subviews:", count.to_string());
    }

    if !detail.constraints.is_empty() {
        push_field(&mut lines, "Constraints:", detail.constraints.len().to_string());
        for constraint in &detail.constraints {
            lines.push(Line::raw(format!(
                "  {}",
                present::format_constraint(constraint, &session.addr_index)
            )));
        }
    }

    append_subtree(&mut lines, session);
    lines
}

/// Compact mode renders the box-drawn dump; full mode renders the
/// complete document as highlighted YAML.
fn append_subtree(lines: &mut Vec<Line<'static>>, session: &Session) {
    if session.subtree_mode == SubtreeMode::Off {
        return;
    }
    let Some(raw) = &session.subtree_raw else {
        return;
    };
    let compact = session.subtree_mode == SubtreeMode::Compact;
    let Ok(tree) = crate::swiftui::parse(raw, compact) else {
        return;
    };
    if tree.is_empty() {
        return;
    }

    let mode_label = if compact { "compact" } else { "full" };
    lines.push(Line::raw(""));
    lines.push(Line::styled(
        format!("SwiftUI Tree ({}):", mode_label),
        Style::default().fg(Color::Cyan),
    ));

    if compact {
        for line in present::render_subtree_text(&tree, "").lines() {
            lines.push(Line::raw(line.to_string()));
        }
        return;
    }

    let Ok(yaml) = serde_yaml::to_string(&SwiftUiOutput { tree }) else {
        return;
    };
    for line in yaml.lines() {
        match present::split_yaml_key(line) {
            Some((prefix, key, rest)) => lines.push(Line::from(vec![
                Span::raw(prefix.to_string()),
                Span::styled(key.to_string(), label_style()),
                Span::raw(rest.to_string()),
            ])),
            None => lines.push(Line::raw(line.to_string())),
        }
    }
}
