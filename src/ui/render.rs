//! Widget mapping: view models in, frame content out.
//!
//! Rendering is immediate-mode; every frame redraws the visible panel
//! from its view model, so a rebuilt chart replaces the previous one
//! instead of stacking.

use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::canvas::{Canvas, Points};
use ratatui::widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph};
use ratatui::Frame;

use crate::charts::{LineSpec, PieSpec, PALETTE};
use crate::ui::app::App;
use crate::view::{Field, LoginViewModel, Panel, ProfileViewModel, NO_SKILL_DATA, NO_XP_DATA};

pub fn draw(f: &mut Frame, app: &App) {
    match app.panel() {
        Panel::Login => draw_login(f, &app.login_view()),
        Panel::Profile => draw_profile(f, &app.profile_view()),
    }
}

pub(crate) fn draw_login(f: &mut Frame, vm: &LoginViewModel) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(9),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(20),
            Constraint::Percentage(60),
            Constraint::Percentage(20),
        ])
        .split(rows[1]);

    let box_area = cols[1];
    let block = Block::default().borders(Borders::ALL).title("Sign in");
    let inner = block.inner(box_area);
    f.render_widget(block, box_area);

    let fields = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(inner);

    let focused = Style::default().fg(Color::Yellow);
    let idle = Style::default().fg(Color::DarkGray);

    let username = Paragraph::new(vm.username.as_str()).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Username")
            .border_style(if vm.focus == Field::Username {
                focused
            } else {
                idle
            }),
    );
    f.render_widget(username, fields[0]);

    let password = Paragraph::new(vm.masked_password.as_str()).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Password")
            .border_style(if vm.focus == Field::Password {
                focused
            } else {
                idle
            }),
    );
    f.render_widget(password, fields[1]);

    if let Some(error) = &vm.error {
        let line = Paragraph::new(error.as_str()).style(Style::default().fg(Color::Red));
        f.render_widget(line, fields[2]);
    }

    let hint = Paragraph::new("Tab: next field  Enter: sign in  Esc: quit")
        .style(Style::default().fg(Color::DarkGray));
    f.render_widget(hint, rows[3]);
}

pub(crate) fn draw_profile(f: &mut Frame, vm: &ProfileViewModel) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(11),
            Constraint::Min(10),
            Constraint::Length(1),
        ])
        .split(f.area());

    let welcome = Paragraph::new(vm.welcome.as_str())
        .style(Style::default().add_modifier(Modifier::BOLD));
    f.render_widget(welcome, rows[0]);

    let mut info_lines: Vec<Line> = vm
        .info_lines
        .iter()
        .map(|line| Line::from(line.as_str()))
        .collect();
    if let Some(error) = &vm.last_load_error {
        info_lines.push(Line::from(Span::styled(
            format!("Last load error: {}", error),
            Style::default().fg(Color::Red),
        )));
    }
    let info = Paragraph::new(Text::from(info_lines))
        .block(Block::default().borders(Borders::ALL).title("Profile"));
    f.render_widget(info, rows[1]);

    let charts = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[2]);
    render_pie(f, charts[0], vm.pie.as_ref());
    render_line(f, charts[1], vm.line.as_ref());

    let hint = Paragraph::new("r: reload  l: logout  q: quit")
        .style(Style::default().fg(Color::DarkGray));
    f.render_widget(hint, rows[3]);
}

fn render_pie(f: &mut Frame, area: Rect, spec: Option<&PieSpec>) {
    let block = Block::default().borders(Borders::ALL).title("Skills");
    let spec = match spec {
        Some(spec) => spec,
        None => {
            let placeholder = Paragraph::new(NO_SKILL_DATA)
                .alignment(Alignment::Center)
                .block(block);
            f.render_widget(placeholder, area);
            return;
        }
    };

    let inner = block.inner(area);
    f.render_widget(block, area);
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(10), Constraint::Length(16)])
        .split(inner);

    // Sample each sector as a point cloud; the canvas has no pie widget.
    let total = spec.total();
    let count = spec.slices.len();
    let mut sectors: Vec<Vec<(f64, f64)>> = Vec::with_capacity(count);
    let mut start = 0.0_f64;
    for slice in &spec.slices {
        let fraction = if total > 0.0 {
            slice.value / total
        } else {
            1.0 / count as f64
        };
        let sweep = fraction * std::f64::consts::TAU;
        let steps = (sweep / 0.02).ceil().max(1.0) as usize;
        let mut points = Vec::new();
        for i in 0..=steps {
            let angle = start + sweep * (i as f64 / steps as f64);
            let mut radius = 0.08_f64;
            while radius <= 1.0 {
                points.push((radius * angle.cos(), radius * angle.sin()));
                radius += 0.04;
            }
        }
        sectors.push(points);
        start += sweep;
    }

    let canvas = Canvas::default()
        .marker(Marker::Braille)
        .x_bounds([-1.2, 1.2])
        .y_bounds([-1.2, 1.2])
        .paint(|ctx| {
            for (slice, points) in spec.slices.iter().zip(&sectors) {
                let (r, g, b) = PALETTE[slice.color_index % PALETTE.len()];
                ctx.draw(&Points {
                    coords: points.as_slice(),
                    color: Color::Rgb(r, g, b),
                });
            }
        });
    f.render_widget(canvas, cols[0]);

    let legend: Vec<Line> = spec
        .slices
        .iter()
        .map(|slice| {
            let (r, g, b) = PALETTE[slice.color_index % PALETTE.len()];
            Line::from(vec![
                Span::styled("■ ", Style::default().fg(Color::Rgb(r, g, b))),
                Span::raw(format!("{}: {}", slice.label, slice.value)),
            ])
        })
        .collect();
    f.render_widget(Paragraph::new(Text::from(legend)), cols[1]);
}

fn render_line(f: &mut Frame, area: Rect, spec: Option<&LineSpec>) {
    let block = Block::default().borders(Borders::ALL).title("XP per Project");
    let spec = match spec {
        Some(spec) => spec,
        None => {
            let placeholder = Paragraph::new(NO_XP_DATA)
                .alignment(Alignment::Center)
                .block(block);
            f.render_widget(placeholder, area);
            return;
        }
    };

    let points: Vec<(f64, f64)> = spec
        .points
        .iter()
        .enumerate()
        .map(|(i, (_, value))| (i as f64, *value))
        .collect();
    let max_y = spec.max_value().max(1.0);
    let max_x = spec.points.len().saturating_sub(1).max(1) as f64;

    let dataset = Dataset::default()
        .name(spec.label)
        .marker(Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Rgb(255, 105, 180)))
        .data(&points);

    let x_labels: Vec<Line> = spec
        .points
        .iter()
        .map(|(label, _)| Line::from(label.as_str()))
        .collect();
    let y_labels = vec![
        Line::from("0"),
        Line::from(format!("{:.0}", max_y / 2.0)),
        Line::from(format!("{:.0}", max_y)),
    ];

    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(Axis::default().bounds([0.0, max_x]).labels(x_labels))
        .y_axis(Axis::default().bounds([0.0, max_y]).labels(y_labels));
    f.render_widget(chart, area);
}
