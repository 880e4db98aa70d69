use iced::{
    mouse, time,
    widget::{
        button,
        canvas::{self, Canvas, Frame, Geometry, Path, Stroke},
        column, row, scrollable, text, text_input, Column, Container,
    },
    Alignment, Color, Element, Length, Point, Rectangle, Renderer, Size, Subscription, Task,
    Theme,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use varcore::annotation::{AnnotationSelection, SelectionRole};
use varcore::history::TranscriptEntry;
use varcore::pipeline::{DecisionPanel, ModeFlags, ReviewCommand, SessionState};
use varcore::render::{Badge, DisplayList, DrawCommand, Point as FramePoint, Rgba};
use varcore::rules::Severity;

const BRIDGE_URL: &str = "http://127.0.0.1:9000";
const HEATMAP_BINS: usize = 20;

fn main() -> iced::Result {
    iced::application(Visualizer::boot, Visualizer::update, Visualizer::view)
        .title(application_title)
        .subscription(application_subscription)
        .theme(application_theme)
        .run()
}

fn application_title(state: &Visualizer) -> String {
    match state.payload.as_ref().and_then(|p| p.source.as_ref()) {
        Some(source) => format!("VAR Review - {}", source),
        None => "VAR Review".into(),
    }
}

fn application_subscription(_: &Visualizer) -> Subscription<Message> {
    time::every(Duration::from_millis(250)).map(|_| Message::Tick)
}

fn application_theme(state: &Visualizer) -> Theme {
    if state.dark_mode() {
        Theme::Dark
    } else {
        Theme::Light
    }
}

#[derive(Debug)]
struct Visualizer {
    payload: Option<ViewPayload>,
    transcript_draft: String,
    status: String,
    history: Vec<String>,
}

#[derive(Debug, Clone)]
enum Message {
    Tick,
    PayloadFetched(Result<ViewPayload, String>),
    Send(ReviewCommand),
    OverlayClicked { x: f32, y: f32, width: f32, height: f32 },
    ToggleDarkMode,
    ClearTranscripts,
    TranscriptChanged(String),
    SubmitTranscript,
    Export,
    Posted(Result<String, String>),
}

impl Visualizer {
    fn boot() -> (Self, Task<Message>) {
        (
            Visualizer {
                payload: None,
                transcript_draft: String::new(),
                status: "Waiting for review session...".into(),
                history: Vec::new(),
            },
            Task::perform(fetch_payload(), Message::PayloadFetched),
        )
    }

    fn dark_mode(&self) -> bool {
        self.payload.as_ref().map(|p| p.dark_mode).unwrap_or(true)
    }

    fn modes(&self) -> ModeFlags {
        self.payload.as_ref().map(|p| p.modes).unwrap_or_default()
    }

    fn update(state: &mut Self, message: Message) -> Task<Message> {
        match message {
            Message::Tick => Task::perform(fetch_payload(), Message::PayloadFetched),
            Message::PayloadFetched(Ok(payload)) => {
                state.payload = Some(payload);
                Task::none()
            }
            Message::PayloadFetched(Err(err)) => {
                state.status = format!("Bridge error: {err}");
                Task::none()
            }
            Message::Send(command) => {
                state.push_history(format!("{:?}", command));
                Task::perform(post_json("command", command), Message::Posted)
            }
            Message::OverlayClicked {
                x,
                y,
                width,
                height,
            } => {
                let command = ReviewCommand::Click {
                    x: x as f64,
                    y: y as f64,
                    surface_width: width as f64,
                    surface_height: height as f64,
                };
                Task::perform(post_json("command", command), Message::Posted)
            }
            Message::ToggleDarkMode => {
                let body = serde_json::json!({ "dark_mode": !state.dark_mode() });
                Task::perform(post_json("theme", body), Message::Posted)
            }
            Message::ClearTranscripts => Task::perform(
                post_json("transcripts/clear", serde_json::json!({})),
                Message::Posted,
            ),
            Message::TranscriptChanged(value) => {
                state.transcript_draft = value;
                Task::none()
            }
            Message::SubmitTranscript => {
                let text = state.transcript_draft.trim().to_string();
                if text.is_empty() {
                    return Task::none();
                }
                state.transcript_draft.clear();
                Task::perform(
                    post_json("transcript", serde_json::json!({ "text": text })),
                    Message::Posted,
                )
            }
            Message::Export => Task::perform(
                post_json("export", serde_json::json!({})),
                Message::Posted,
            ),
            Message::Posted(Ok(message)) => {
                state.status = message;
                Task::perform(fetch_payload(), Message::PayloadFetched)
            }
            Message::Posted(Err(err)) => {
                state.status = format!("Request failed: {err}");
                state.push_history(state.status.clone());
                Task::none()
            }
        }
    }

    fn view(state: &Self) -> Element<'_, Message> {
        let modes = state.modes();
        let payload = state.payload.clone().unwrap_or_default();

        let session_info = text(format!(
            "{} | {:.2}s / {:.2}s | {}",
            payload
                .state
                .map(|s| format!("{:?}", s))
                .unwrap_or_else(|| "Disconnected".into()),
            payload.current_time,
            payload.duration,
            if payload.paused { "paused" } else { "playing" }
        ))
        .size(16);

        let overlay = Canvas::new(OverlayCanvas {
            display: payload.display.clone(),
            badges: payload.badges.clone(),
        })
        .width(Length::Fill)
        .height(Length::Fixed(360.0));

        let transport = row![
            button("Start").on_press(Message::Send(ReviewCommand::Start)),
            button("Stop").on_press(Message::Send(ReviewCommand::Stop)),
            button("<< Frame").on_press(Message::Send(ReviewCommand::StepBackward)),
            button("Frame >>").on_press(Message::Send(ReviewCommand::StepForward)),
        ]
        .spacing(8);

        let toggles = row![
            button(text(format!(
                "Offside: {}",
                if modes.offside { "On" } else { "Off" }
            )))
            .on_press(Message::Send(ReviewCommand::SetOffsideMode {
                enabled: !modes.offside,
            })),
            button(text(format!(
                "Goal line: {}",
                if modes.goal_line { "On" } else { "Off" }
            )))
            .on_press(Message::Send(ReviewCommand::SetGoalLineMode {
                enabled: !modes.goal_line,
            })),
            button(if state.dark_mode() {
                "Light mode"
            } else {
                "Dark mode"
            })
            .on_press(Message::ToggleDarkMode),
            button("Export report").on_press(Message::Export),
        ]
        .spacing(8);

        let selection_buttons = [
            SelectionRole::Attacker,
            SelectionRole::Defender,
            SelectionRole::Ball,
        ]
        .into_iter()
        .fold(row![].spacing(8), |row, role| {
            row.push(
                button(text(format!("Select {:?}", role))).on_press_maybe(
                    modes
                        .offside
                        .then_some(Message::Send(ReviewCommand::BeginSelection { role })),
                ),
            )
        });

        let selection_info = column![
            text(payload.selection_status.clone()).size(14),
            text(describe_selection(&payload.selection)).size(12),
        ]
        .spacing(4);

        let video_column = column![
            text("Incident Review").size(26),
            session_info,
            overlay,
            transport,
            toggles,
            selection_buttons,
            selection_info,
            text(&state.status).size(12),
        ]
        .spacing(10)
        .padding(16)
        .width(Length::FillPortion(3));

        let severity_buttons = [Severity::Minor, Severity::Moderate, Severity::Severe]
            .into_iter()
            .fold(row![].spacing(8), |row, severity| {
                row.push(
                    button(text(severity.to_string()))
                        .on_press(Message::Send(ReviewCommand::SetSeverity { severity })),
                )
            });

        let decision = &payload.decision;
        let reasons = decision
            .reasons
            .iter()
            .fold(Column::new().spacing(4), |col, reason| {
                col.push(text(format!("- {}", reason)).size(12))
            });

        let factors = Canvas::new(FactorBars {
            factors: decision
                .factors
                .iter()
                .map(|f| (f.label.clone(), f.value as f32))
                .collect(),
        })
        .width(Length::Fill)
        .height(Length::Fixed(150.0));

        let heatmap = Canvas::new(Heatmap {
            cells: payload.heatmap.clone(),
        })
        .width(Length::Fill)
        .height(Length::Fixed(180.0));

        let transcript_list = if payload.transcripts.is_empty() {
            Column::new().push(text("No commentary recorded").size(12))
        } else {
            payload
                .transcripts
                .iter()
                .rev()
                .fold(Column::new().spacing(4), |col, entry| {
                    col.push(
                        text(format!(
                            "[{}] {}",
                            entry.timestamp.format("%H:%M:%S"),
                            entry.text
                        ))
                        .size(12),
                    )
                })
        };

        let history_list = state
            .history
            .iter()
            .rev()
            .fold(Column::new().spacing(2), |col, entry| {
                col.push(text(entry.clone()).size(11))
            });

        let decision_column = column![
            text("AI Decision").size(26),
            text(format!(
                "{} {}",
                decision.status,
                decision.badge.clone().unwrap_or_default()
            ))
            .size(18),
            text(format!("Confidence: {:.0}%", decision.confidence)).size(14),
            severity_buttons,
            Container::new(reasons).padding(6),
            text(decision.detailed_reasoning.clone()).size(12),
            text("Contributing factors").size(16),
            factors,
            text(format!(
                "Movement heat map ({} samples)",
                payload.movement_samples
            ))
            .size(16),
            heatmap,
            text(payload.speech_status.clone()).size(12),
            text("Commentary").size(16),
            row![
                text_input("Add a note...", &state.transcript_draft)
                    .on_input(Message::TranscriptChanged)
                    .on_submit(Message::SubmitTranscript)
                    .padding(6),
                button("Add").on_press(Message::SubmitTranscript),
                button("Clear").on_press(Message::ClearTranscripts),
            ]
            .spacing(8),
            Container::new(scrollable(transcript_list).height(Length::Fixed(120.0))).padding(6),
            text(format!(
                "Processed {} | skipped {} | errors {} | throttled {} | stale {}",
                payload.metrics.processed,
                payload.metrics.skipped,
                payload.metrics.errors,
                payload.metrics.throttled,
                payload.metrics.stale
            ))
            .size(11),
            Container::new(scrollable(history_list).height(Length::Fixed(80.0))).padding(6),
        ]
        .spacing(10)
        .padding(16)
        .width(Length::FillPortion(2));

        let layout = row![video_column, decision_column]
            .spacing(20)
            .align_y(Alignment::Start)
            .padding(20);

        Container::new(scrollable(layout))
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn push_history(&mut self, entry: String) {
        self.history.push(entry);
        if self.history.len() > 20 {
            self.history.remove(0);
        }
    }
}

fn describe_selection(selection: &AnnotationSelection) -> String {
    let describe = |role: SelectionRole| match selection.get(role) {
        Some(kp) => format!("{:?}: {} ({:.0}, {:.0})", role, kp.name, kp.x, kp.y),
        None => format!("{:?}: auto", role),
    };
    format!(
        "{} | {} | {}",
        describe(SelectionRole::Attacker),
        describe(SelectionRole::Defender),
        describe(SelectionRole::Ball)
    )
}

async fn fetch_payload() -> Result<ViewPayload, String> {
    let response = reqwest::get(format!("{BRIDGE_URL}/payload"))
        .await
        .map_err(|e| e.to_string())?;
    response
        .json::<ViewPayload>()
        .await
        .map_err(|e| e.to_string())
}

async fn post_json<T: Serialize>(path: &'static str, body: T) -> Result<String, String> {
    let client = reqwest::Client::new();
    let response = client
        .post(format!("{BRIDGE_URL}/{path}"))
        .json(&body)
        .send()
        .await
        .map_err(|e| e.to_string())?;
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    if status.is_success() {
        Ok(format!("{path}: {text}"))
    } else {
        Err(format!("{}: {}", status, text))
    }
}

/// Subset of the bridge payload the console draws.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ViewPayload {
    state: Option<SessionState>,
    source: Option<String>,
    current_time: f64,
    duration: f64,
    paused: bool,
    modes: ModeFlags,
    selection: AnnotationSelection,
    selection_status: String,
    display: DisplayList,
    badges: Vec<Badge>,
    decision: DecisionPanel,
    heatmap: Vec<f32>,
    movement_samples: usize,
    transcripts: Vec<TranscriptEntry>,
    dark_mode: bool,
    speech_status: String,
    metrics: Metrics,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
struct Metrics {
    processed: u64,
    skipped: u64,
    errors: u64,
    throttled: u64,
    stale: u64,
}

fn color(rgba: Rgba) -> Color {
    let [r, g, b, a] = rgba.to_f32();
    Color::from_rgba(r, g, b, a)
}

/// Replays the session's display list, scaled to the widget.
#[derive(Clone)]
struct OverlayCanvas {
    display: DisplayList,
    badges: Vec<Badge>,
}

impl OverlayCanvas {
    fn scale(&self, bounds: Size) -> (f32, f32) {
        if self.display.width == 0 || self.display.height == 0 {
            return (1.0, 1.0);
        }
        (
            bounds.width / self.display.width as f32,
            bounds.height / self.display.height as f32,
        )
    }
}

impl canvas::Program<Message> for OverlayCanvas {
    type State = ();

    fn update(
        &self,
        _state: &mut Self::State,
        event: &canvas::Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> Option<canvas::Action<Message>> {
        let canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) = event else {
            return None;
        };
        let position = cursor.position_in(bounds)?;
        Some(
            canvas::Action::publish(Message::OverlayClicked {
                x: position.x,
                y: position.y,
                width: bounds.width,
                height: bounds.height,
            })
            .and_capture(),
        )
    }

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        let (sx, sy) = self.scale(bounds.size());
        let map = |p: &FramePoint| Point::new(p.x as f32 * sx, p.y as f32 * sy);
        let ring_scale = sx.min(sy);

        frame.fill_rectangle(
            Point::ORIGIN,
            bounds.size(),
            Color::from_rgb(0.05, 0.12, 0.05),
        );

        for command in &self.display.commands {
            match command {
                DrawCommand::Clear { .. } => {
                    frame.fill_rectangle(
                        Point::ORIGIN,
                        bounds.size(),
                        Color::from_rgb(0.08, 0.3, 0.1),
                    );
                }
                DrawCommand::Frame {
                    index, timestamp, ..
                } => {
                    frame.fill_text(canvas::Text {
                        content: format!("frame {} @ {:.2}s", index, timestamp),
                        position: Point::new(8.0, 8.0),
                        color: Color::WHITE,
                        size: 14.0.into(),
                        ..canvas::Text::default()
                    });
                }
                DrawCommand::Marker {
                    center,
                    radius,
                    color: c,
                } => {
                    let marker = Path::circle(map(center), *radius as f32 * ring_scale);
                    frame.fill(&marker, color(*c));
                }
                DrawCommand::Ring {
                    center,
                    radius,
                    color: c,
                    width,
                } => {
                    let ring = Path::circle(map(center), *radius as f32 * ring_scale);
                    frame.stroke(
                        &ring,
                        Stroke::default()
                            .with_width(*width as f32)
                            .with_color(color(*c)),
                    );
                }
                DrawCommand::Line {
                    from,
                    to,
                    color: c,
                    width,
                } => {
                    let line = Path::line(map(from), map(to));
                    frame.stroke(
                        &line,
                        Stroke::default()
                            .with_width(*width as f32)
                            .with_color(color(*c)),
                    );
                }
            }
        }

        let mut badge_y = 8.0;
        for badge in self.badges.iter().filter(|b| b.visible) {
            let origin = Point::new(bounds.width - 140.0, badge_y);
            frame.fill_rectangle(origin, Size::new(132.0, 30.0), color(badge.color));
            frame.fill_text(canvas::Text {
                content: badge.text.clone(),
                position: Point::new(origin.x + 10.0, origin.y + 6.0),
                color: Color::WHITE,
                size: 16.0.into(),
                ..canvas::Text::default()
            });
            badge_y += 38.0;
        }

        vec![frame.into_geometry()]
    }
}

/// Horizontal bars for the decision factors, 0-100.
#[derive(Clone)]
struct FactorBars {
    factors: Vec<(String, f32)>,
}

impl canvas::Program<Message> for FactorBars {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        if self.factors.is_empty() {
            return vec![frame.into_geometry()];
        }
        let label_width = 130.0;
        let row_height = bounds.height / self.factors.len() as f32;
        let bar_span = (bounds.width - label_width - 40.0).max(0.0);
        let text_color = theme.palette().text;

        for (i, (label, value)) in self.factors.iter().enumerate() {
            let y = i as f32 * row_height;
            frame.fill_text(canvas::Text {
                content: label.clone(),
                position: Point::new(0.0, y + 4.0),
                color: text_color,
                size: 12.0.into(),
                ..canvas::Text::default()
            });
            let width = bar_span * (value.clamp(0.0, 100.0) / 100.0);
            frame.fill_rectangle(
                Point::new(label_width, y + 4.0),
                Size::new(width, (row_height - 8.0).max(2.0)),
                Color::from_rgb(0.2, 0.6, 0.86),
            );
            frame.fill_text(canvas::Text {
                content: format!("{:.0}%", value),
                position: Point::new(label_width + width + 4.0, y + 4.0),
                color: text_color,
                size: 12.0.into(),
                ..canvas::Text::default()
            });
        }

        vec![frame.into_geometry()]
    }
}

/// Movement density grid, brighter where keypoints were seen more often.
#[derive(Clone)]
struct Heatmap {
    cells: Vec<f32>,
}

impl canvas::Program<Message> for Heatmap {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        frame.fill_rectangle(
            Point::ORIGIN,
            bounds.size(),
            Color::from_rgb(0.02, 0.02, 0.04),
        );
        if self.cells.len() != HEATMAP_BINS * HEATMAP_BINS {
            return vec![frame.into_geometry()];
        }

        let max = self.cells.iter().cloned().fold(0.0, f32::max).max(1.0);
        let cell = Size::new(
            bounds.width / HEATMAP_BINS as f32,
            bounds.height / HEATMAP_BINS as f32,
        );
        for (i, value) in self.cells.iter().enumerate() {
            if *value <= 0.0 {
                continue;
            }
            let intensity = (value / max).clamp(0.0, 1.0);
            let origin = Point::new(
                (i % HEATMAP_BINS) as f32 * cell.width,
                (i / HEATMAP_BINS) as f32 * cell.height,
            );
            frame.fill_rectangle(
                origin,
                cell,
                Color::from_rgba(1.0, 0.3 + 0.5 * (1.0 - intensity), 0.1, 0.25 + 0.75 * intensity),
            );
        }

        vec![frame.into_geometry()]
    }
}
