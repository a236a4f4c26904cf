use std::fs;
use std::io::Write;
use std::path::Path;
use std::rc::Rc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use wheel_stream::OpenMenu;

use crate::bridge::{BridgeCall, BridgeEvent, HostBridge, RecordingBridge, WireBridge};
use crate::cli::Args;
use crate::geometry::WheelLayout;
use crate::menu::MenuController;
use crate::render::{self, RenderFrame};

/// One step of a replay script. Host pushes and user gestures share the
/// same timeline so a session file reads like the event log it produces.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ScriptStep {
    /// Host open push; a missing or `null` payload force-closes the menu.
    Open {
        #[serde(default)]
        payload: Option<OpenMenu>,
    },
    /// Host refresh push replacing the item list in place.
    Refresh { items: Vec<wheel_stream::MenuItem> },
    /// Queue the answer for the next page-transition handshake.
    Ack { ready: bool },
    /// User click on the sector at this visible index.
    ClickSector { index: usize },
    /// User click on the center control.
    ClickCenter,
}

impl ScriptStep {
    fn label(&self) -> &'static str {
        match self {
            ScriptStep::Open { .. } => "open",
            ScriptStep::Refresh { .. } => "refresh",
            ScriptStep::Ack { .. } => "ack",
            ScriptStep::ClickSector { .. } => "click_sector",
            ScriptStep::ClickCenter => "click_center",
        }
    }
}

/// Controller events and the rendered frame captured after one step.
#[derive(Debug, Serialize)]
pub struct StepReport {
    pub step: &'static str,
    pub events: Vec<String>,
    pub frame: Option<RenderFrame>,
}

#[derive(Debug, Serialize)]
pub struct SessionReport {
    pub steps: Vec<StepReport>,
}

pub struct SessionOutcome {
    pub report: SessionReport,
    pub calls: Vec<BridgeCall>,
}

pub fn load_script(path: &Path) -> Result<Vec<ScriptStep>> {
    let raw = fs::read(path)
        .with_context(|| format!("reading replay script {}", path.display()))?;
    let steps: Vec<ScriptStep> =
        serde_json::from_slice(&raw).context("parsing replay script JSON")?;
    Ok(steps)
}

/// Replays a script through a fresh controller, capturing one report entry
/// per step. Outbound traffic optionally tees into `wire_sink` as framed
/// WheelStream bytes.
pub fn run_script<W>(
    steps: Vec<ScriptStep>,
    layout: &WheelLayout,
    wire_sink: Option<W>,
) -> SessionOutcome
where
    W: Write + 'static,
{
    let recording = RecordingBridge::new();
    let bridge: Rc<dyn HostBridge> = match wire_sink {
        Some(sink) => Rc::new(WireBridge::new(sink, Rc::new(recording.clone()))),
        None => Rc::new(recording.clone()),
    };
    let mut menu = MenuController::new(bridge);

    let mut reports = Vec::with_capacity(steps.len());
    for step in steps {
        let label = step.label();
        match step {
            ScriptStep::Open { payload } => menu.handle_event(BridgeEvent::Open(payload)),
            ScriptStep::Refresh { items } => menu.handle_event(BridgeEvent::Refresh(items)),
            ScriptStep::Ack { ready } => recording.push_ack(ready),
            ScriptStep::ClickSector { index } => menu.click_sector(index),
            ScriptStep::ClickCenter => menu.click_center(),
        }
        reports.push(StepReport {
            step: label,
            events: menu.drain_events(),
            frame: menu.snapshot().map(|snapshot| render::render(&snapshot, layout)),
        });
    }

    SessionOutcome {
        report: SessionReport { steps: reports },
        calls: recording.calls(),
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T, what: &str) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("serializing {what} to JSON"))?;
    fs::write(path, json).with_context(|| format!("writing {what} to {}", path.display()))?;
    Ok(())
}

pub fn execute(args: Args) -> Result<()> {
    let Args {
        script,
        frames_json,
        event_log_json,
        wire_capture,
        verbose,
    } = args;

    let steps = load_script(&script)?;
    let step_count = steps.len();
    let layout = WheelLayout::default();

    let wire_sink = match wire_capture.as_ref() {
        Some(path) => Some(
            fs::File::create(path)
                .with_context(|| format!("creating wire capture {}", path.display()))?,
        ),
        None => None,
    };

    let outcome = run_script(steps, &layout, wire_sink);

    if verbose {
        for step in &outcome.report.steps {
            for event in &step.events {
                eprintln!("[wheel_engine] {event}");
            }
        }
    }

    if let Some(path) = frames_json.as_ref() {
        write_json(path, &outcome.report, "session report")?;
    }
    if let Some(path) = event_log_json.as_ref() {
        write_json(path, &outcome.calls, "outbound call log")?;
    }

    eprintln!(
        "[wheel_engine] replayed {step_count} steps ({} outbound calls)",
        outcome.calls.len()
    );
    Ok(())
}
