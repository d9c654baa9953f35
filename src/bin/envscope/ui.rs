//! Terminal view: parameter gauges, voice status and the engine event log.

use std::{collections::VecDeque, time::Duration};

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    DefaultTerminal, Frame,
};

use saavy_automation::{
    graph::{EnvelopeController, EnvelopeParam},
    synth::NodeEvent,
};

/// Keyboard row mapped to voices, one semitone apart
const NOTE_KEYS: [char; 8] = ['a', 's', 'd', 'f', 'g', 'h', 'j', 'k'];
const BASE_NOTE: u8 = 60;
const VELOCITY: u8 = 100;

const EVENT_LOG_LEN: usize = 8;

/// Durations above this fill the gauge
const GAUGE_SECONDS: f64 = 2.0;

pub struct UiApp {
    controller: EnvelopeController,
    sample_rate: f64,
    selected: usize,
    held: [bool; NOTE_KEYS.len()],
    events: VecDeque<String>,
    should_quit: bool,
}

impl UiApp {
    pub fn new(controller: EnvelopeController, sample_rate: f64) -> Self {
        Self {
            controller,
            sample_rate,
            selected: 0,
            held: [false; NOTE_KEYS.len()],
            events: VecDeque::with_capacity(EVENT_LOG_LEN),
            should_quit: false,
        }
    }

    /// Run the UI event loop
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_events();

            terminal.draw(|frame| self.render(frame))?;

            // Non-blocking, ~60fps
            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }

        let _ = self.controller.all_notes_off();
        Ok(())
    }

    fn poll_events(&mut self) {
        let mut incoming = Vec::new();
        self.controller.poll_events(|event| incoming.push(event));
        for event in incoming {
            self.log(describe(&event));
        }
    }

    fn log(&mut self, line: String) {
        if self.events.len() == EVENT_LOG_LEN {
            self.events.pop_front();
        }
        self.events.push_back(line);
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char(' ') => {
                self.held = [false; NOTE_KEYS.len()];
                if self.controller.all_notes_off().is_err() {
                    self.log("command queue full".into());
                }
            }
            KeyCode::Char('b') => {
                let sent = if self.controller.is_started() {
                    self.controller.stop()
                } else {
                    self.controller.start()
                };
                if sent.is_err() {
                    self.log("command queue full".into());
                }
            }
            KeyCode::Up => {
                self.selected = self
                    .selected
                    .checked_sub(1)
                    .unwrap_or(EnvelopeParam::ALL.len() - 1);
            }
            KeyCode::Down => {
                self.selected = (self.selected + 1) % EnvelopeParam::ALL.len();
            }
            KeyCode::Left => self.nudge(-1.0),
            KeyCode::Right => self.nudge(1.0),
            KeyCode::Char(c) => {
                if let Some(index) = NOTE_KEYS.iter().position(|&k| k == c) {
                    self.toggle_note(index);
                }
            }
            _ => {}
        }
    }

    fn toggle_note(&mut self, index: usize) {
        let voice = BASE_NOTE + index as u8;
        let sent = if self.held[index] {
            self.controller.note_off(voice)
        } else {
            self.controller.note_on(voice, VELOCITY)
        };

        match sent {
            Ok(()) => self.held[index] = !self.held[index],
            Err(err) => self.log(err.to_string()),
        }
    }

    fn nudge(&mut self, direction: f64) {
        let param = EnvelopeParam::ALL[self.selected];
        let step = match param {
            EnvelopeParam::Sustain => 0.05,
            _ => 0.02,
        };
        let value = self.controller.value(param) + direction * step;
        self.controller.set(param, value);
    }

    fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Status bar
                Constraint::Length(EnvelopeParam::ALL.len() as u16 * 3), // Parameters
                Constraint::Min(4),    // Event log
                Constraint::Length(1), // Help bar
            ])
            .split(frame.area());

        self.render_status(frame, chunks[0]);
        self.render_params(frame, chunks[1]);
        self.render_events(frame, chunks[2]);

        let help = Paragraph::new(
            " [A-K] Notes  [Space] All off  [B] Bypass  [↑↓] Select  [←→] Adjust  [Q] Quit",
        )
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, chunks[3]);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().title(" envscope ").borders(Borders::ALL);

        let (state, color) = match (self.controller.is_started(), self.controller.is_active()) {
            (false, _) => ("Bypassed", Color::Yellow),
            (true, true) => ("Active", Color::Green),
            (true, false) => ("Idle", Color::DarkGray),
        };
        let held: String = NOTE_KEYS
            .iter()
            .zip(self.held)
            .map(|(&key, down)| if down { key.to_ascii_uppercase() } else { '·' })
            .collect();

        let line = Line::from(vec![
            Span::styled(format!(" {state}  "), Style::default().fg(color)),
            Span::styled(
                format!("Voices: {}  ", self.controller.active_voices()),
                Style::default().fg(Color::White),
            ),
            Span::styled(format!("Keys: {held}  "), Style::default().fg(Color::Cyan)),
            Span::styled(
                format!("Ramp: {:.1}ms  ", self.controller.ramp_time() * 1_000.0),
                Style::default().fg(Color::DarkGray),
            ),
            Span::styled(
                format!("{:.1}kHz", self.sample_rate / 1_000.0),
                Style::default().fg(Color::DarkGray),
            ),
        ]);

        frame.render_widget(Paragraph::new(line).block(block), area);
    }

    fn render_params(&self, frame: &mut Frame, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(EnvelopeParam::ALL.map(|_| Constraint::Length(3)))
            .split(area);

        for (i, (param, row)) in EnvelopeParam::ALL.iter().zip(rows.iter()).enumerate() {
            let value = self.controller.value(*param);
            let (ratio, label) = match param {
                EnvelopeParam::Sustain => (value, format!("{value:.2}")),
                _ => (value / GAUGE_SECONDS, format!("{:.0} ms", value * 1_000.0)),
            };

            let color = if i == self.selected {
                Color::Magenta
            } else {
                Color::Blue
            };
            let gauge = Gauge::default()
                .block(
                    Block::default()
                        .title(format!(" {} ", param.name()))
                        .borders(Borders::ALL),
                )
                .gauge_style(Style::default().fg(color))
                .ratio(ratio.clamp(0.0, 1.0))
                .label(label);
            frame.render_widget(gauge, *row);
        }
    }

    fn render_events(&self, frame: &mut Frame, area: Rect) {
        let lines: Vec<Line> = self
            .events
            .iter()
            .rev()
            .map(|text| Line::from(Span::raw(format!(" {text}"))))
            .collect();

        let log = Paragraph::new(lines).block(Block::default().title(" Events ").borders(Borders::ALL));
        frame.render_widget(log, area);
    }
}

fn describe(event: &NodeEvent) -> String {
    match event {
        NodeEvent::ParameterSettled { id, value } => {
            let name = EnvelopeParam::ALL
                .iter()
                .find(|p| p.id() == *id)
                .map_or("?", |p| p.name());
            format!("{name} settled at {value:.3}")
        }
        NodeEvent::VoiceFinished { voice } => format!("voice {} finished", voice.0),
        NodeEvent::ActivityChanged { active } => {
            if *active {
                "node active".to_string()
            } else {
                "node idle".to_string()
            }
        }
    }
}
