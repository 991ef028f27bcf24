use crate::display::SlotVisual;

use super::*;

pub(super) fn draw(frame: &mut ratatui::Frame, app: &App) {
    let panes = layout::panes(frame.area());
    draw_header(frame, app, panes.header);
    draw_list(frame, app, panes.list);
    draw_grid(frame, app, panes.grid);
    draw_detail(frame, app, panes.detail);
    draw_status(frame, app, panes.status);
}

fn draw_header(frame: &mut ratatui::Frame, app: &App, area: Rect) {
    let mut spans = vec![
        Span::styled(
            "Rocketbox",
            Style::default().fg(Color::Black).bg(Color::White),
        ),
        Span::raw("  "),
    ];
    match app.session.profile() {
        Some(p) => spans.push(Span::styled(
            p.nickname.clone(),
            Style::default().fg(Color::Green),
        )),
        None => spans.push(Span::styled(
            "(signed out)",
            Style::default().fg(Color::Red),
        )),
    }
    spans.push(Span::raw("  "));
    spans.push(Span::styled(
        app.server.clone(),
        Style::default().fg(Color::Gray),
    ));
    if app.busy() {
        spans.push(Span::styled("  working", Style::default().fg(Color::Cyan)));
    }
    let header = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, area);
}

fn draw_list(frame: &mut ratatui::Frame, app: &App, area: Rect) {
    let mut tabs = Vec::new();
    for origin in Origin::CHESTS {
        let style = if origin == app.tab {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        tabs.push(Span::styled(origin.label(), style));
        tabs.push(Span::raw(" "));
    }
    let inner = render_pane(frame, Line::from(tabs), area);

    let items = app.items();
    if items.is_empty() {
        frame.render_widget(
            Paragraph::new("(empty)").style(Style::default().fg(Color::Gray)),
            inner,
        );
        return;
    }

    let rows: Vec<ListItem> = items
        .iter()
        .map(|rocket| {
            let view = app.lock_view(rocket);
            let mut spans = vec![
                Span::raw(rocket.name.clone()),
                Span::raw("  "),
                Span::styled(view.countdown, Style::default().fg(state_color(view.state))),
            ];
            let who = match rocket.origin {
                Origin::Sent => rocket.receiver.as_deref().map(|r| format!("  to {}", r)),
                _ => rocket.sender.as_deref().map(|s| format!("  from {}", s)),
            };
            if let Some(who) = who {
                spans.push(Span::styled(who, Style::default().fg(Color::DarkGray)));
            }
            if rocket.is_public {
                spans.push(Span::styled(" *", Style::default().fg(Color::Cyan)));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let highlight = if app.focus == Focus::List {
        Style::default().bg(Color::DarkGray)
    } else {
        Style::default().add_modifier(Modifier::UNDERLINED)
    };
    let list = List::new(rows).highlight_style(highlight);
    let mut state = ListState::default();
    state.select(Some(app.selected.min(items.len().saturating_sub(1))));
    frame.render_stateful_widget(list, inner, &mut state);
}

fn draw_grid(frame: &mut ratatui::Frame, app: &App, area: Rect) {
    let mut title = vec![Span::styled("Display", Style::default().fg(Color::Yellow))];
    if let Some(target) = app.dash.drag_target() {
        title.push(Span::styled(
            format!("  drop on {}", target + 1),
            Style::default().fg(Color::Cyan),
        ));
    } else if app.dash.is_dragging() {
        title.push(Span::styled(
            "  dragging",
            Style::default().fg(Color::Cyan),
        ));
    }
    render_pane(frame, Line::from(title), area);

    let grid = app.dash.grid();
    for (i, cell) in layout::grid_cells(area).into_iter().enumerate() {
        let border = match app.dash.slot_visual(i) {
            SlotVisual::Dragging => Style::default().fg(Color::Yellow),
            SlotVisual::DragOver => Style::default().fg(Color::Cyan),
            SlotVisual::Idle if app.focus == Focus::Grid && app.cursor == i => Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            SlotVisual::Idle => Style::default().fg(Color::DarkGray),
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title(format!("{}", i + 1));
        let body = match grid.slot(i) {
            Some(rocket) => Paragraph::new(rocket.name.clone()).wrap(Wrap { trim: true }),
            None => Paragraph::new("·").style(Style::default().fg(Color::DarkGray)),
        };
        frame.render_widget(body.block(block), cell);
    }
}

fn draw_detail(frame: &mut ratatui::Frame, app: &App, area: Rect) {
    let inner = render_pane(
        frame,
        Line::from(Span::styled("Rocket", Style::default().fg(Color::Yellow))),
        area,
    );
    let Some(rocket) = app.focused_rocket() else {
        frame.render_widget(Paragraph::new("nothing selected"), inner);
        return;
    };
    let view = app.lock_view(rocket);

    let mut lines = vec![Line::from(Span::styled(
        rocket.name.clone(),
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    if let Some(sender) = &rocket.sender {
        lines.push(Line::from(format!("from {}", sender)));
    }
    if let Some(receiver) = &rocket.receiver {
        lines.push(Line::from(format!("to {}", receiver)));
    }
    lines.push(Line::from(vec![
        Span::styled(
            view.state.to_string(),
            Style::default().fg(state_color(view.state)),
        ),
        Span::raw("  "),
        Span::raw(view.countdown.clone()),
    ]));
    if !view.hint.is_empty() {
        lines.push(Line::from(Span::styled(
            view.hint.clone(),
            Style::default().fg(Color::Gray),
        )));
    }
    lines.push(Line::from(""));

    match lock::reveal(rocket, &view) {
        None => lines.push(Line::from(Span::styled(
            "content hidden until opened",
            Style::default().fg(Color::Gray),
        ))),
        Some(revealed) => match rocket.detail {
            DetailState::NotLoaded => lines.push(Line::from("press Enter to load")),
            DetailState::Loading => lines.push(Line::from("loading...")),
            DetailState::Failed => lines.push(Line::from(Span::styled(
                "could not load details (Enter to retry)",
                Style::default().fg(Color::Red),
            ))),
            DetailState::Loaded => {
                for l in revealed.content.unwrap_or_default().lines() {
                    lines.push(Line::from(l.to_string()));
                }
                for a in revealed.attachments {
                    lines.push(Line::from(Span::styled(
                        format!("attachment {} ({})", a.original_name, a.id),
                        Style::default().fg(Color::Cyan),
                    )));
                }
            }
        },
    }

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

fn draw_status(frame: &mut ratatui::Frame, app: &App, area: Rect) {
    let mut lines = Vec::new();
    match &app.status {
        Some(status) => {
            let style = match status.kind {
                StatusKind::Info => Style::default().fg(Color::White),
                StatusKind::Error => Style::default().fg(Color::Red),
            };
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{} ", lock::fmt_instant(status.at)),
                    Style::default().fg(Color::Gray),
                ),
                Span::styled(status.text.clone(), style),
            ]));
        }
        None => lines.push(Line::from("")),
    }
    lines.push(Line::from(Span::styled(
        "Tab list  g grid  r refresh  u unlock  v display  Enter detail  space pick/drop  Esc cancel  q quit",
        Style::default().fg(Color::DarkGray),
    )));
    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::TOP).title("Status")),
        area,
    );
}
