use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{BarChart, Block, Borders, Cell, Paragraph, Row, Table, Tabs},
    Frame,
};
use udara_core::{Category, Pollutant};

use crate::metrics::CategorySummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Distribution,
    Means,
    Correlation,
}

impl Page {
    pub const ALL: [Page; 3] = [Page::Distribution, Page::Means, Page::Correlation];

    pub fn title(self) -> &'static str {
        match self {
            Page::Distribution => " DISTRIBUTION ",
            Page::Means => " MEANS ",
            Page::Correlation => " CORRELATION ",
        }
    }

    fn position(self) -> usize {
        Page::ALL.iter().position(|p| *p == self).unwrap_or(0)
    }

    pub fn next(self) -> Page {
        Page::ALL[(self.position() + 1) % Page::ALL.len()]
    }

    pub fn prev(self) -> Page {
        Page::ALL[(self.position() + Page::ALL.len() - 1) % Page::ALL.len()]
    }
}

fn category_color(category: Category) -> Color {
    match category {
        Category::Good => Color::Green,
        Category::Moderate => Color::Yellow,
        Category::Unhealthy => Color::LightRed,
        Category::VeryUnhealthy => Color::Red,
    }
}

pub struct TuiAgent {
    pub title: String,
    pub page: Page,
}

impl TuiAgent {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            page: Page::Distribution,
        }
    }

    pub fn draw(&self, f: &mut Frame<'_>, summary: &CategorySummary) {
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints(
                [
                    Constraint::Length(3), // Header
                    Constraint::Length(3), // Page tabs
                    Constraint::Min(8),    // Page body
                    Constraint::Length(3), // Key help
                ]
                .as_ref(),
            )
            .split(f.size());

        let header = Paragraph::new(format!(" Rows: {} | Categories present: {}", summary.rows, summary.counts.len()))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(self.title.as_str())
                    .border_style(Style::default().fg(Color::Cyan)),
            );
        f.render_widget(header, main_chunks[0]);

        let tabs = Tabs::new(Page::ALL.iter().map(|p| p.title()).collect::<Vec<_>>())
            .select(self.page.position())
            .block(Block::default().borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
        f.render_widget(tabs, main_chunks[1]);

        match self.page {
            Page::Distribution => self.draw_distribution(f, summary, main_chunks[2]),
            Page::Means => self.draw_means(f, summary, main_chunks[2]),
            Page::Correlation => self.draw_correlation(f, summary, main_chunks[2]),
        }

        let help = Paragraph::new(" Tab/→ next page | ← previous page | q quit")
            .block(Block::default().borders(Borders::ALL))
            .style(Style::default().fg(Color::DarkGray));
        f.render_widget(help, main_chunks[3]);
    }

    fn draw_distribution(&self, f: &mut Frame<'_>, summary: &CategorySummary, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)].as_ref())
            .split(area);

        let bars: Vec<(&str, u64)> = summary
            .counts
            .iter()
            .map(|(c, n)| (c.localized(), *n as u64))
            .collect();
        let chart = BarChart::default()
            .block(Block::default().title(" ROWS PER CATEGORY ").borders(Borders::ALL))
            .data(bars.as_slice())
            .bar_width(12)
            .bar_gap(2)
            .bar_style(Style::default().fg(Color::Cyan))
            .value_style(Style::default().fg(Color::Black).bg(Color::Cyan));
        f.render_widget(chart, chunks[0]);

        let mut lines = Vec::new();
        for (category, n) in &summary.counts {
            let share = if summary.rows > 0 { *n as f64 / summary.rows as f64 * 100.0 } else { 0.0 };
            lines.push(Line::from(vec![
                Span::styled(format!(" {:<20}", category.localized()), Style::default().fg(category_color(*category))),
                Span::raw(format!("{:>6} ({:.1}%)", n, share)),
            ]));
        }
        let legend = Paragraph::new(lines).block(Block::default().title(" SHARE ").borders(Borders::ALL));
        f.render_widget(legend, chunks[1]);
    }

    fn draw_means(&self, f: &mut Frame<'_>, summary: &CategorySummary, area: Rect) {
        let mut header = vec![Cell::from("CATEGORY")];
        header.extend(Pollutant::ALL.iter().map(|p| Cell::from(p.display_name())));

        let rows: Vec<Row> = summary
            .means
            .iter()
            .map(|(category, mean)| {
                let mut cells = vec![Cell::from(category.localized()).style(Style::default().fg(category_color(*category)))];
                cells.extend(mean.iter().map(|v| Cell::from(format!("{:.2}", v))));
                Row::new(cells)
            })
            .collect();

        let mut widths = vec![Constraint::Percentage(22)];
        widths.extend(std::iter::repeat(Constraint::Percentage(13)).take(Pollutant::ALL.len()));

        let table = Table::new(rows, widths)
            .header(Row::new(header).style(Style::default().add_modifier(Modifier::BOLD)))
            .block(Block::default().title(" MEAN CONCENTRATION PER CATEGORY ").borders(Borders::ALL));
        f.render_widget(table, area);
    }

    fn draw_correlation(&self, f: &mut Frame<'_>, summary: &CategorySummary, area: Rect) {
        let rows: Vec<Row> = Pollutant::ALL
            .iter()
            .map(|p| {
                let (text, style) = match summary.correlations[p.index()] {
                    Some(r) if r >= 0.5 => (format!("{:+.3}", r), Style::default().fg(Color::Red)),
                    Some(r) => (format!("{:+.3}", r), Style::default().fg(Color::Green)),
                    None => ("n/a".to_string(), Style::default().fg(Color::DarkGray)),
                };
                Row::new(vec![Cell::from(p.display_name()), Cell::from(text).style(style)])
            })
            .collect();

        let table = Table::new(rows, [Constraint::Percentage(50), Constraint::Percentage(50)].as_ref())
            .header(Row::new(vec!["POLLUTANT", "PEARSON r VS LABEL"]).style(Style::default().add_modifier(Modifier::BOLD)))
            .block(Block::default().title(" CORRELATION ").borders(Borders::ALL));
        f.render_widget(table, area);
    }
}
