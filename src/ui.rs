use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};

use crate::app::{App, InputMode};
use crate::status::{LineKind, StatusLine, StatusRegion};

const BG: Color = Color::Rgb(9, 15, 25);
const PANEL: Color = Color::Rgb(16, 27, 44);
const ACCENT: Color = Color::Rgb(52, 211, 153);
const MUTED: Color = Color::Rgb(140, 156, 178);
const WARN: Color = Color::Rgb(251, 191, 36);
const ERROR: Color = Color::Rgb(248, 113, 113);
const PL_A: Color = Color::Rgb(17, 94, 89);
const PL_B: Color = Color::Rgb(30, 64, 175);
const PL_C: Color = Color::Rgb(55, 48, 163);
const PL_D: Color = Color::Rgb(82, 24, 124);

pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();
    let footer_height = footer_height(app, area.width, area.height / 3);
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(6),
            Constraint::Length(footer_height),
        ])
        .split(area);

    render_header(frame, root[0], app);
    render_body(frame, root[1], app);
    render_footer(frame, root[2], app);

    if app.show_help() {
        render_help_modal(frame, app);
    }
    if let Some(notice) = app.pending_notice() {
        render_notice_modal(frame, notice, app.pending_notice_count());
    }
}

fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let left_line = build_left_header_line(app);
    let right_line = build_right_header_line(app);
    let right_width = spans_width(&right_line.spans) as u16;
    if area.width < 42 || right_width == 0 || right_width >= area.width {
        frame.render_widget(
            Paragraph::new(left_line).style(Style::default().bg(BG).fg(Color::White)),
            area,
        );
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(right_width)])
        .split(area);
    frame.render_widget(
        Paragraph::new(left_line).style(Style::default().bg(BG).fg(Color::White)),
        chunks[0],
    );
    frame.render_widget(
        Paragraph::new(right_line)
            .style(Style::default().bg(BG))
            .alignment(Alignment::Right),
        chunks[1],
    );
}

fn build_left_header_line(app: &App) -> Line<'static> {
    let namespace = if app.selected_namespace().is_empty() {
        "-"
    } else {
        app.selected_namespace()
    };
    let image = if app.image().is_empty() {
        "-"
    } else {
        app.image()
    };

    let mut spans = Vec::new();
    push_powerline_segment(&mut spans, " NSDECK ", Color::Black, ACCENT, PL_A);
    push_powerline_segment(
        &mut spans,
        format!(" 󰒍 {} ", compact_text(&display_server_endpoint(app.server()), 26)),
        Color::White,
        PL_A,
        PL_B,
    );
    push_powerline_segment(
        &mut spans,
        format!(" 󰉖 {} ", compact_text(namespace, 18)),
        Color::White,
        PL_B,
        PL_C,
    );
    push_powerline_segment(
        &mut spans,
        format!(" 󰏗 {} ", compact_text(image, 32)),
        Color::White,
        PL_C,
        BG,
    );
    Line::from(spans)
}

fn build_right_header_line(app: &App) -> Line<'static> {
    let mut spans = Vec::new();
    if app.status_region().is_requesting() {
        spans.push(Span::styled(
            " 󰑓 status ",
            Style::default().fg(Color::Black).bg(ACCENT),
        ));
    }
    if app.busy() {
        spans.push(Span::styled(
            " 󰔟 working ",
            Style::default().fg(Color::Black).bg(WARN),
        ));
    }
    if let Some(checked_at) = app.status_region().checked_at() {
        spans.push(Span::styled(
            format!(" checked {} ", checked_at.format("%H:%M:%S")),
            Style::default().fg(MUTED).bg(BG),
        ));
    }
    Line::from(spans)
}

fn render_body(frame: &mut Frame, area: Rect, app: &mut App) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(28), Constraint::Percentage(72)])
        .split(area);

    render_namespaces(frame, columns[0], app);
    let (width, height) = panel_viewport(columns[1]);
    app.set_status_viewport(width, height);
    render_status(frame, columns[1], app);
}

fn render_namespaces(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .title(format!("Namespaces ({})", app.namespaces().len()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT))
        .style(Style::default().bg(PANEL));

    if app.namespaces().is_empty() {
        let hint = Paragraph::new("No known namespaces. Press c to create one.")
            .wrap(Wrap { trim: true })
            .block(block)
            .style(Style::default().fg(MUTED));
        frame.render_widget(hint, area);
        return;
    }

    let items = app
        .namespaces()
        .iter()
        .map(|name| ListItem::new(name.clone()).style(Style::default().fg(Color::White)))
        .collect::<Vec<_>>();
    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Rgb(24, 36, 58))
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("󰜴 ");

    let mut state = ListState::default();
    state.select(app.selected_namespace_index());
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_status(frame: &mut Frame, area: Rect, app: &App) {
    let region = app.status_region();
    let (title, border) = match region {
        StatusRegion::Idle => ("Status".to_string(), MUTED),
        StatusRegion::Requesting { namespace } => {
            (format!("Status {namespace} (requesting…)"), WARN)
        }
        StatusRegion::Pods { namespace, .. } => (
            format!("Status {namespace} ({} pods)", region.pod_blocks().len()),
            ACCENT,
        ),
        StatusRegion::Error { namespace, .. } => (format!("Status {namespace}"), ERROR),
        StatusRegion::Empty { namespace, .. } => (format!("Status {namespace}"), MUTED),
    };

    let lines = match region {
        StatusRegion::Idle => vec![Line::from(Span::styled(
            "Select a namespace and press s to check its status.",
            Style::default().fg(MUTED),
        ))],
        _ => region.lines().iter().map(styled_status_line).collect(),
    };

    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((app.status_scroll(), 0))
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border))
                .style(Style::default().bg(PANEL)),
        )
        .style(Style::default().fg(Color::White));
    frame.render_widget(paragraph, area);
}

fn styled_status_line(line: &StatusLine) -> Line<'static> {
    let style = match line.kind {
        LineKind::PodTitle => Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        LineKind::Phase => Style::default().fg(phase_color(&line.text)),
        LineKind::Heading => Style::default().fg(MUTED).add_modifier(Modifier::BOLD),
        LineKind::Container => Style::default().fg(Color::White),
        LineKind::Error => Style::default().fg(ERROR),
        LineKind::Blank => Style::default(),
    };
    Line::from(Span::styled(line.text.clone(), style))
}

fn phase_color(phase_line: &str) -> Color {
    let phase = phase_line.trim_start_matches("Phase:").trim();
    match phase {
        "Running" | "Succeeded" => ACCENT,
        "Pending" => WARN,
        "Failed" => ERROR,
        _ => MUTED,
    }
}

/// Message area lines; long messages continue on following rows instead of being cut.
fn message_footer_lines(app: &App) -> Vec<Line<'static>> {
    let mut spans = Vec::new();
    push_powerline_segment(&mut spans, " 󰘳 nrm ", Color::White, PL_A, BG);
    spans.push(Span::styled(
        format!(" {} ", footer_status_icon(app.message())),
        Style::default().fg(ACCENT).bg(BG),
    ));

    let text_style = Style::default().fg(Color::White).bg(BG);
    let mut message_lines = app.message().split('\n');
    spans.push(Span::styled(
        message_lines.next().unwrap_or_default().to_string(),
        text_style,
    ));

    let mut lines = vec![Line::from(spans)];
    lines.extend(message_lines.map(|line| Line::from(Span::styled(line.to_string(), text_style))));
    lines
}

fn footer_height(app: &App, width: u16, max_height: u16) -> u16 {
    if app.mode() != InputMode::Normal {
        return 1;
    }

    let width = width.max(1) as usize;
    let rows = message_footer_lines(app)
        .iter()
        .map(|line| line.width().div_ceil(width).max(1))
        .sum::<usize>();
    (rows as u16).clamp(1, max_height.max(1))
}

fn render_message_footer(frame: &mut Frame, area: Rect, app: &App) {
    frame.render_widget(
        Paragraph::new(message_footer_lines(app))
            .wrap(Wrap { trim: false })
            .style(Style::default().bg(BG)),
        area,
    );
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
    let (label, prompt, prompt_bg) = match app.mode() {
        InputMode::Normal => return render_message_footer(frame, area, app),
        InputMode::CreateNamespace => (" 󰉗 new ", format!("namespace: {}", app.input()), ACCENT),
        InputMode::Image => (" 󰏗 img ", format!("image: {}", app.input()), WARN),
        InputMode::Command => (" 󰘳 cmd ", format!(":{}", app.input()), PL_D),
    };

    let mut spans = Vec::new();
    push_powerline_segment(&mut spans, label, Color::Black, prompt_bg, PL_B);
    push_powerline_segment(&mut spans, format!(" {prompt} "), Color::White, PL_B, BG);

    if app.has_completion_mode() {
        let completions = app.completion_candidates();
        let selected = app
            .completion_index()
            .min(completions.len().saturating_sub(1));
        let available_width = area.width as usize;
        let mut used_width = spans_width(&spans);
        for (index, item) in completions.iter().enumerate() {
            let chunk = format!(" {item}");
            let chunk_width = chunk.chars().count();
            if used_width.saturating_add(chunk_width) > available_width {
                spans.push(Span::styled("…", Style::default().fg(MUTED)));
                break;
            }
            let style = if index == selected {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Rgb(94, 234, 212))
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(MUTED)
            };
            spans.push(Span::styled(chunk, style));
            used_width = used_width.saturating_add(chunk_width);
        }
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(BG)),
        area,
    );
}

fn footer_status_icon(status_text: &str) -> &'static str {
    let lower = status_text.to_ascii_lowercase();
    if lower.contains("fail") || lower.contains("error") || lower.contains("unknown") {
        "󰅚"
    } else if lower.ends_with('…') {
        "󰔟"
    } else {
        "󰄬"
    }
}

fn render_notice_modal(frame: &mut Frame, notice: &str, queued: usize) {
    let area = centered_rect(60, 30, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(notice.to_string()),
        Line::from(""),
        Line::from(Span::styled(
            "Press Enter to continue",
            Style::default().fg(MUTED),
        )),
    ];
    let modal = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .title(if queued > 1 {
                    format!("Notice (1 of {queued})")
                } else {
                    "Notice".to_string()
                })
                .borders(Borders::ALL)
                .border_style(Style::default().fg(WARN))
                .style(Style::default().bg(PANEL)),
        )
        .style(Style::default().fg(Color::White));
    frame.render_widget(modal, area);
}

fn render_help_modal(frame: &mut Frame, app: &App) {
    let area = centered_rect(70, 70, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(format!(
            "nsdeck help  mode:{}  server:{}",
            help_mode_label(app.mode()),
            display_server_endpoint(app.server())
        )),
        Line::from(""),
    ];
    for line in help_lines() {
        lines.push(Line::from(line));
    }

    let modal = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title("Help")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(ACCENT))
                .style(Style::default().bg(PANEL)),
        )
        .style(Style::default().fg(Color::White));
    frame.render_widget(modal, area);
}

fn help_lines() -> [&'static str; 12] {
    [
        "j/k or arrows   select namespace (gg / G first / last)",
        "c               create a namespace",
        "i               edit the image reference",
        "d               deploy the image into the selected namespace",
        "x               destroy the selected namespace",
        "s / r / Enter   check status of the selected namespace",
        "PgUp / PgDn     scroll the status panel (Ctrl+u / Ctrl+d)",
        ":               command line (Tab completes)",
        "?               toggle this help, q quits",
        "",
        "Commands: create <name>  deploy [image]  destroy [ns]  status [ns]",
        "          ns <name>  image <ref>  help  quit",
    ]
}

fn help_mode_label(mode: InputMode) -> &'static str {
    match mode {
        InputMode::Normal => "normal",
        InputMode::CreateNamespace => "create",
        InputMode::Image => "image",
        InputMode::Command => "command",
    }
}

fn push_powerline_segment(
    spans: &mut Vec<Span<'static>>,
    content: impl Into<String>,
    fg: Color,
    bg: Color,
    next_bg: Color,
) {
    spans.push(Span::styled(
        content.into(),
        Style::default().fg(fg).bg(bg).add_modifier(Modifier::BOLD),
    ));
    spans.push(Span::styled("", Style::default().fg(bg).bg(next_bg)));
}

fn spans_width(spans: &[Span<'_>]) -> usize {
    spans.iter().map(|span| span.content.chars().count()).sum()
}

fn panel_viewport(area: Rect) -> (u16, u16) {
    let width = area.width.saturating_sub(2).max(1);
    let height = area.height.saturating_sub(2).max(1);
    (width, height)
}

fn compact_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }

    if max_chars <= 1 {
        return "…".to_string();
    }

    let mut out = value
        .chars()
        .take(max_chars.saturating_sub(1))
        .collect::<String>();
    out.push('…');
    out
}

fn display_server_endpoint(server: &str) -> String {
    let trimmed = server.trim().trim_end_matches('/');
    trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed)
        .to_string()
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
