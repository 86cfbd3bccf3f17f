use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, Paragraph},
};

use crate::analysis::RankedIdentity;
use crate::domain::range::DATE_FORMAT;
use crate::terminal::state::{Focus, ReportState};

fn label(text: &str) -> Span<'_> {
    Span::styled(text, Style::default().add_modifier(Modifier::BOLD))
}

pub fn render(f: &mut Frame, state: &mut ReportState) {
    let [header, stats, lists, footer] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(7),
        Constraint::Min(7),
        Constraint::Length(1),
    ])
    .areas(f.area());

    let r = &state.result;
    let period = r
        .range
        .as_ref()
        .map(|range| {
            format!(
                "{} to {}",
                range.start.format(DATE_FORMAT),
                range.end.format(DATE_FORMAT)
            )
        })
        .unwrap_or_default();
    let title = Paragraph::new(Line::from(vec![
        label(" Account "),
        Span::raw(r.account.clone()),
        label("   Period "),
        Span::raw(period),
    ]))
    .block(Block::default().title(" Mail analysis ").borders(Borders::ALL));
    f.render_widget(title, header);

    render_stats(f, state, stats);

    let [left, right] =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(lists);
    let focus = state.focus;
    let senders = ranking_list(
        " Top senders ",
        &state.result.top_senders,
        focus == Focus::Senders,
    );
    f.render_stateful_widget(senders, left, &mut state.senders);
    let recipients = ranking_list(
        " Top recipients ",
        &state.result.top_recipients,
        focus == Focus::Recipients,
    );
    f.render_stateful_widget(recipients, right, &mut state.recipients);

    let hint = Paragraph::new(Line::from(vec![
        label("j/k"),
        Span::raw(" move  "),
        label("Tab"),
        Span::raw(" switch list  "),
        label("q"),
        Span::raw(" quit"),
    ]));
    f.render_widget(hint, footer);
}

fn render_stats(f: &mut Frame, state: &ReportState, area: Rect) {
    let r = &state.result;
    let [counts, gauge] =
        Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)]).areas(area);

    let c = &r.categories;
    let lines = vec![
        Line::from(vec![label("Received      "), Span::raw(r.total_received.to_string())]),
        Line::from(vec![
            label("Replied       "),
            Span::raw(format!("{} ({} same day)", r.replied, r.same_day_replies)),
        ]),
        Line::from(vec![label("Informational "), Span::raw(c.informational.to_string())]),
        Line::from(vec![label("Approval      "), Span::raw(c.needs_approval.to_string())]),
        Line::from(vec![label("Response      "), Span::raw(c.needs_response.to_string())]),
    ];
    f.render_widget(
        Paragraph::new(lines).block(Block::default().title(" Summary ").borders(Borders::ALL)),
        counts,
    );

    let s = &r.read_status;
    let ratio = (s.read_pct / 100.0).clamp(0.0, 1.0);
    let read_gauge = Gauge::default()
        .block(Block::default().title(" Read ").borders(Borders::ALL))
        .gauge_style(Style::default().fg(Color::Green))
        .ratio(ratio)
        .label(format!(
            "{} read {:.1}% / {} unread {:.1}%",
            s.read, s.read_pct, s.unread, s.unread_pct
        ));
    f.render_widget(read_gauge, gauge);
}

fn ranking_list<'a>(title: &'a str, ranked: &'a [RankedIdentity], focused: bool) -> List<'a> {
    let border = if focused { Color::Yellow } else { Color::DarkGray };
    let items: Vec<ListItem> = if ranked.is_empty() {
        vec![ListItem::new(Span::styled(
            "no data",
            Style::default().fg(Color::Gray),
        ))]
    } else {
        ranked
            .iter()
            .enumerate()
            .map(|(i, e)| {
                ListItem::new(Line::from(vec![
                    Span::raw(format!("{}. ", i + 1)),
                    label(&e.identity),
                    Span::styled(format!("  {}", e.count), Style::default().fg(Color::Gray)),
                ]))
            })
            .collect()
    };

    List::new(items)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border)),
        )
        .highlight_symbol("➜ ")
        .highlight_style(Style::default().fg(Color::Green))
}
