use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::io::Write;
use std::rc::Rc;

use log::warn;
use serde::Serialize;

use wheel_stream::{
    decode_envelope, decode_open_payload, decode_payload, encode_message, Hello, ItemClicked,
    MenuItem, MessageKind, OpenMenu, ProtocolError, RefreshItems, TransitionAck,
    TransitionRequest,
};

/// Outbound half of the host bridge. Click, back and close are
/// fire-and-forget; `request_transition` blocks until the host answers
/// whether the next page's data is ready. The controller hides the wheel
/// for the duration of that call, so a slow host shows nothing rather
/// than stale sectors.
pub trait HostBridge {
    fn item_clicked(&self, index: usize);
    fn back(&self);
    fn close(&self);
    fn request_transition(&self) -> bool;
}

/// Inbound host events, delivered to the controller in receipt order.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeEvent {
    /// `None` force-closes the menu.
    Open(Option<OpenMenu>),
    Refresh(Vec<MenuItem>),
}

/// Decodes one inbound frame. Frames that do not target the menu
/// controller (handshake, acks) decode to `None`. A malformed `Open` body
/// is treated as "no menu" and a malformed `Refresh` body is dropped;
/// neither surfaces an error to the host.
pub fn decode_event(frame: &[u8]) -> Result<Option<BridgeEvent>, ProtocolError> {
    let (header, payload) = decode_envelope(frame)?;
    match header.kind {
        MessageKind::Open => match decode_open_payload(payload) {
            Ok(body) => Ok(Some(BridgeEvent::Open(body))),
            Err(err) => {
                warn!("discarding malformed open payload: {err}");
                Ok(Some(BridgeEvent::Open(None)))
            }
        },
        MessageKind::Refresh => match decode_payload::<RefreshItems>(payload) {
            Ok(body) => Ok(Some(BridgeEvent::Refresh(body.items))),
            Err(err) => {
                warn!("discarding malformed refresh payload: {err}");
                Ok(None)
            }
        },
        _ => Ok(None),
    }
}

/// One recorded outbound call, in issue order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BridgeCall {
    ItemClicked { index: usize },
    Back,
    Close,
    Transition { ready: bool },
}

/// Bridge that records every outbound call and answers transition
/// requests from a scripted ack queue (default answer: ready).
#[derive(Clone, Default)]
pub struct RecordingBridge {
    calls: Rc<RefCell<Vec<BridgeCall>>>,
    acks: Rc<RefCell<VecDeque<bool>>>,
}

impl RecordingBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_acks<A>(acks: A) -> Self
    where
        A: IntoIterator<Item = bool>,
    {
        let bridge = Self::default();
        bridge.acks.borrow_mut().extend(acks);
        bridge
    }

    pub fn push_ack(&self, ready: bool) {
        self.acks.borrow_mut().push_back(ready);
    }

    pub fn calls(&self) -> Vec<BridgeCall> {
        self.calls.borrow().clone()
    }
}

impl HostBridge for RecordingBridge {
    fn item_clicked(&self, index: usize) {
        self.calls
            .borrow_mut()
            .push(BridgeCall::ItemClicked { index });
    }

    fn back(&self) {
        self.calls.borrow_mut().push(BridgeCall::Back);
    }

    fn close(&self) {
        self.calls.borrow_mut().push(BridgeCall::Close);
    }

    fn request_transition(&self) -> bool {
        let ready = self.acks.borrow_mut().pop_front().unwrap_or(true);
        self.calls
            .borrow_mut()
            .push(BridgeCall::Transition { ready });
        ready
    }
}

/// Bridge that frames the outbound traffic onto a byte sink while
/// delegating the actual calls to an inner bridge. The transition
/// handshake is captured as a request/ack frame pair so the sink holds
/// the full exchange. Write failures are logged and never interrupt the
/// menu.
pub struct WireBridge<W: Write> {
    sink: RefCell<W>,
    seq: Cell<u64>,
    inner: Rc<dyn HostBridge>,
}

impl<W: Write> WireBridge<W> {
    pub fn new(mut sink: W, inner: Rc<dyn HostBridge>) -> Self {
        let hello = Hello::new("wheel_engine", None);
        if let Err(err) = encode_message(MessageKind::Hello, &hello)
            .map_err(anyhow::Error::from)
            .and_then(|frame| sink.write_all(&frame).map_err(anyhow::Error::from))
        {
            warn!("wire capture hello failed: {err}");
        }
        Self {
            sink: RefCell::new(sink),
            seq: Cell::new(0),
            inner,
        }
    }

    fn capture<T: Serialize>(&self, kind: MessageKind, payload: &T) {
        let frame = match encode_message(kind, payload) {
            Ok(frame) => frame,
            Err(err) => {
                warn!("wire capture encode failed: {err}");
                return;
            }
        };
        if let Err(err) = self.sink.borrow_mut().write_all(&frame) {
            warn!("wire capture write failed: {err}");
        }
    }
}

impl<W: Write> HostBridge for WireBridge<W> {
    fn item_clicked(&self, index: usize) {
        self.capture(MessageKind::ItemClicked, &ItemClicked { index });
        self.inner.item_clicked(index);
    }

    fn back(&self) {
        self.capture(MessageKind::Back, &serde_json::json!({}));
        self.inner.back();
    }

    fn close(&self) {
        self.capture(MessageKind::Close, &serde_json::json!({}));
        self.inner.close();
    }

    fn request_transition(&self) -> bool {
        let seq = self.seq.get();
        self.seq.set(seq + 1);
        self.capture(MessageKind::Transition, &TransitionRequest { seq });
        let ready = self.inner.request_transition();
        self.capture(MessageKind::TransitionAck, &TransitionAck { seq, ready });
        ready
    }
}
