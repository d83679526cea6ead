//! Full-screen rendering of a running session.

use std::io::{self, Stdout};

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
    Terminal,
};

const HORIZONTAL_MARGIN: u16 = 1;

/// What one frame shows.
pub struct SessionView<'a> {
    pub header: &'a str,
    pub text: &'a str,
    /// Peak marker the engine keeps on the draft.
    pub peak_marker: Option<usize>,
    pub status: &'a str,
}

impl SessionView<'_> {
    /// Characters still missing before the peak is passed again.
    fn behind_peak(&self) -> Option<usize> {
        self.peak_marker
            .map(|peak| peak.saturating_sub(self.text.chars().count()))
            .filter(|&gap| gap > 0)
    }
}

impl Widget for &SessionView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let dim_style = Style::default().add_modifier(Modifier::DIM);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(1),
                Constraint::Length(1),
            ])
            .split(area);

        Paragraph::new(Span::styled(self.header, dim_style)).render(chunks[0], buf);

        let mut lines: Vec<Line> = self
            .text
            .split('\n')
            .map(|line| Line::from(line.replace('\t', "    ")))
            .collect();
        if let Some(last) = lines.last_mut() {
            last.spans
                .push(Span::styled("▏", Style::default().fg(Color::Yellow)));
            if let Some(gap) = self.behind_peak() {
                last.spans
                    .push(Span::styled(format!(" {gap} to your peak"), dim_style));
            }
        }

        // Keep the end of the draft in view.
        let body = chunks[2];
        let width = usize::from(body.width.max(1));
        let rows: usize = lines
            .iter()
            .map(|line| line.width().div_ceil(width).max(1))
            .sum();
        let scroll = rows.saturating_sub(usize::from(body.height));

        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((u16::try_from(scroll).unwrap_or(u16::MAX), 0))
            .render(body, buf);

        Paragraph::new(Span::styled(
            self.status,
            Style::default().add_modifier(Modifier::REVERSED),
        ))
        .render(chunks[3], buf);
    }
}

/// Raw-mode alternate screen; restored on drop.
pub struct Screen {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl Screen {
    pub fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(e);
        }
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        terminal.hide_cursor()?;
        Ok(Self { terminal })
    }

    pub fn draw(&mut self, view: &SessionView<'_>) -> io::Result<()> {
        self.terminal.draw(|f| f.render_widget(view, f.area()))?;
        Ok(())
    }
}

impl Drop for Screen {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}
