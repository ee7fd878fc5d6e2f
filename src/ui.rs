pub mod charting;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Axis, Chart, Dataset, GraphType, Paragraph, Widget, Wrap},
};

use crate::{
    app::{App, AppState},
    caret::Viewport,
    engine::Engine,
    session::Verdict,
};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

fn typing_layout(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // title + live stats
            Constraint::Length(1), // padding
            Constraint::Min(0),    // prompt
            Constraint::Length(1), // legend
        ])
        .split(area)
}

/// The region the prompt is flowed into for a terminal of size `area`.
pub fn prompt_area(area: Rect) -> Rect {
    typing_layout(area)[2]
}

/// What a glyph looks like on screen.
fn glyph_symbol(c: char) -> String {
    match c {
        '\n' => "↵".to_owned(),
        '\t' => "→   ".to_owned(),
        c => c.to_string(),
    }
}

fn typed_symbol(c: char) -> String {
    match c {
        ' ' => "·".to_owned(),
        c => glyph_symbol(c),
    }
}

/// Maps a prompt cell to its screen position, or `None` when it is scrolled
/// out of view or past the right edge.
fn screen_cell(prompt_area: Rect, viewport: Viewport, x: u16, y: u16) -> Option<(u16, u16)> {
    if !viewport.contains_row(y) || x >= prompt_area.width {
        return None;
    }
    let row = y - viewport.scroll_top;
    Some((
        prompt_area.x.saturating_add(x),
        prompt_area.y.saturating_add(row),
    ))
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::Typing => render_typing(&self.engine, area, buf),
            AppState::Results => render_results(&self.engine, area, buf),
        }
    }
}

fn render_typing(engine: &Engine, area: Rect, buf: &mut Buffer) {
    // styles
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let green_bold_style = Style::default().patch(bold_style).fg(Color::Green);
    let red_bold_style = Style::default().patch(bold_style).fg(Color::Red);
    let dim_bold_style = Style::default()
        .patch(bold_style)
        .add_modifier(Modifier::DIM);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let chunks = typing_layout(area);
    let live = engine.live_metrics();

    let header = Paragraph::new(Line::from(vec![
        Span::styled(engine.prompt().title().to_string(), bold_style),
        Span::styled(
            format!("   {} wpm   {}% acc", live.wpm, live.accuracy),
            dim_bold_style,
        ),
    ]));
    header.render(chunks[0], buf);

    let prompt_area = chunks[2];
    let geometry = engine.geometry();
    let viewport = engine.viewport();
    let prompt = engine.prompt();
    let verdicts = &engine.state().verdicts;

    for (idx, &expected) in prompt.chars().iter().enumerate() {
        let Some(rect) = geometry.rect(idx) else {
            break;
        };
        let Some((x, y)) = screen_cell(prompt_area, viewport, rect.x, rect.y) else {
            continue;
        };
        let (symbol, style) = match verdicts.get(idx).copied().unwrap_or_default() {
            Verdict::Untyped => (glyph_symbol(expected), dim_bold_style),
            Verdict::Correct(_) => (glyph_symbol(expected), green_bold_style),
            Verdict::Incorrect(typed) => (typed_symbol(typed), red_bold_style),
        };
        buf.set_stringn(x, y, symbol, (prompt_area.width - rect.x) as usize, style);
    }

    let (cx, cy) = engine.caret_position();
    if let Some(pos) = screen_cell(prompt_area, viewport, cx, cy) {
        let caret_style = Style::default().add_modifier(Modifier::UNDERLINED | Modifier::REVERSED);
        if let Some(cell) = buf.cell_mut(pos) {
            cell.set_style(caret_style);
        }
    }

    let legend = Paragraph::new(Span::styled("(esc) reset / (ctrl+c) quit", italic_style));
    legend.render(chunks[3], buf);
}

fn render_results(engine: &Engine, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);
    let magenta_style = Style::default().fg(Color::Magenta);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(1),    // chart
            Constraint::Length(1), // stats
            Constraint::Length(1), // submission note
            Constraint::Length(1), // padding
            Constraint::Length(1), // legend
        ])
        .split(area);

    let Some(attempt) = engine.attempt() else {
        return;
    };
    let duration_secs = attempt.duration_ms as f64 / 1000.0;

    let tuples = engine.trace().as_tuples();
    let (overall_duration, highest_wpm) =
        charting::compute_chart_params(&tuples, duration_secs);

    let datasets = vec![Dataset::default()
        .marker(ratatui::symbols::Marker::Braille)
        .style(magenta_style)
        .graph_type(GraphType::Line)
        .data(&tuples)];

    let chart = Chart::new(datasets)
        .x_axis(
            Axis::default()
                .title("seconds")
                .bounds([0.0, overall_duration])
                .labels(vec![
                    Span::styled("0", bold_style),
                    Span::styled(charting::format_label(overall_duration), bold_style),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("wpm")
                .bounds([0.0, highest_wpm.max(1.0)])
                .labels(vec![
                    Span::styled("0", bold_style),
                    Span::styled(charting::format_label(highest_wpm), bold_style),
                ]),
        );
    chart.render(chunks[0], buf);

    let stats = Paragraph::new(Span::styled(
        format!(
            "{} wpm   {}% acc   {:.1}s",
            attempt.wpm, attempt.accuracy, duration_secs
        ),
        bold_style,
    ))
    .alignment(Alignment::Center);
    stats.render(chunks[1], buf);

    let settings = engine.settings();
    let note = if engine.prompt().is_empty() {
        "empty prompt, nothing to submit".to_string()
    } else if settings.auto_submit {
        format!("submitted as {}", attempt.user)
    } else {
        "auto-submit is off".to_string()
    };
    let note = Paragraph::new(Span::styled(
        note,
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true });
    note.render(chunks[2], buf);

    let legend = Paragraph::new(Span::styled("(r)etry / (n)ew / (esc)ape", italic_style));
    legend.render(chunks[4], buf);
}
