use super::{LandmarkSource, SourceEvent};
use crate::error::CortexError;
use crate::pedal_runner::PedalSignal;
use crate::toggles::{GestureFamily, GestureToggles};
use crate::types::{Clock, LandmarkFrame, Point2};
use async_trait::async_trait;
use crossbeam_channel::Sender;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;

/// Frames older than this count as "no face"
const STALE_AFTER: f64 = 0.5;

/// A refined face mesh as JSON runs to roughly 20 KiB
const RECV_BUF: usize = 64 * 1024;

/// One decoded datagram
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Frame {
        source: Option<u32>,
        points: Vec<Point2>,
    },
    NoFace,
    Pedal(PedalSignal),
    Source(u32),
    /// Switch a gesture family on or off
    Mode(GestureFamily, bool),
    Tracking(bool),
}

#[derive(Debug, Deserialize)]
struct JsonFrameMsg {
    #[serde(default)]
    points: Option<Vec<Vec<f64>>>,
    #[serde(default)]
    face: Option<bool>,
    #[serde(default)]
    source: Option<u32>,
}

pub fn udp_addr_from_env() -> Option<String> {
    std::env::var("EYEOS_UDP_ADDR").ok().filter(|s| !s.trim().is_empty())
}

pub fn parse_message(msg: &str) -> Option<Message> {
    let msg = msg.trim();
    if msg.is_empty() {
        return None;
    }

    // JSON: {"source":0,"points":[[x,y],...]} or {"face":false}
    if msg.starts_with('{') {
        let j = serde_json::from_str::<JsonFrameMsg>(msg).ok()?;
        if j.face == Some(false) {
            return Some(Message::NoFace);
        }
        let points = j
            .points?
            .iter()
            .map(|p| match p.as_slice() {
                [x, y, ..] if x.is_finite() && y.is_finite() => Some(Point2::new(*x, *y)),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()?;
        return Some(Message::Frame {
            source: j.source,
            points,
        });
    }

    // k=v tokens: pedal=down | source=1 | face=0 | tracking=off | blink=on
    let (k, v) = msg.split_once('=')?;
    match (k.trim(), v.trim()) {
        ("pedal", "down" | "press" | "1") => Some(Message::Pedal(PedalSignal::Down)),
        ("pedal", "up" | "release" | "0") => Some(Message::Pedal(PedalSignal::Up)),
        ("source" | "camera", n) => n.parse().ok().map(Message::Source),
        ("face", "0" | "false") => Some(Message::NoFace),
        ("tracking", v) => parse_switch(v).map(Message::Tracking),
        (k, v) => Some(Message::Mode(GestureFamily::from_name(k)?, parse_switch(v)?)),
    }
}

fn parse_switch(v: &str) -> Option<bool> {
    match v {
        "on" | "1" | "true" => Some(true),
        "off" | "0" | "false" => Some(false),
        _ => None,
    }
}

#[derive(Debug, Default)]
struct Slot {
    latest: Option<LandmarkFrame>,
    unread: bool,
    source: u32,
    switched: Option<u32>,
}

fn lock(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Receives landmark frames, camera switches and pedal signals over UDP.
///
/// Only the latest frame is kept; the engine never works through a backlog.
/// Frames are stamped with the receive time on the shared [`Clock`].
pub struct UdpSource {
    slot: Arc<Mutex<Slot>>,
    clock: Clock,
    local_addr: SocketAddr,
    task: JoinHandle<()>,
}

impl UdpSource {
    /// Bind the listener. Pedal signals are forwarded to `pedal_tx` and mode
    /// switches applied to `toggles`; either may be left out.
    pub async fn bind(
        addr: &str,
        clock: Clock,
        pedal_tx: Option<Sender<PedalSignal>>,
        toggles: Option<Arc<GestureToggles>>,
    ) -> Result<Self, CortexError> {
        let bind_addr: SocketAddr = addr
            .parse()
            .map_err(|_| CortexError::InvalidAddress(addr.to_string()))?;
        let sock = UdpSocket::bind(bind_addr).await?;
        let local_addr = sock.local_addr()?;
        log::info!("UDP landmark listener bound on {local_addr}");

        let slot = Arc::new(Mutex::new(Slot::default()));
        let storage = Arc::clone(&slot);
        let task = tokio::spawn(async move {
            let mut buf = vec![0u8; RECV_BUF];
            loop {
                let (len, _src) = match sock.recv_from(&mut buf).await {
                    Ok(v) => v,
                    Err(e) => {
                        log::warn!("UDP landmark recv error: {e}");
                        continue;
                    }
                };
                let Ok(text) = std::str::from_utf8(&buf[..len]) else {
                    log::warn!("Dropping non-UTF-8 datagram ({len} bytes)");
                    continue;
                };
                match parse_message(text) {
                    Some(msg) => deliver(msg, &storage, &clock, pedal_tx.as_ref(), toggles.as_deref()),
                    None => log::warn!("Unrecognized landmark message ({len} bytes)"),
                }
            }
        });

        Ok(Self {
            slot,
            clock,
            local_addr,
            task,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

fn deliver(
    msg: Message,
    slot: &Mutex<Slot>,
    clock: &Clock,
    pedal_tx: Option<&Sender<PedalSignal>>,
    toggles: Option<&GestureToggles>,
) {
    match msg {
        Message::Mode(family, on) => match toggles {
            Some(t) => t.set_enabled(family, on),
            None => log::debug!("Ignoring {} switch, no toggles attached", family.as_str()),
        },
        Message::Tracking(on) => match toggles {
            Some(t) => t.set_tracking(on),
            None => log::debug!("Ignoring tracking switch, no toggles attached"),
        },
        Message::Pedal(signal) => match pedal_tx {
            Some(tx) => {
                if tx.send(signal).is_err() {
                    log::warn!("Pedal runner gone, dropping {:?}", signal);
                }
            }
            None => log::debug!("Pedal input not enabled, dropping {:?}", signal),
        },
        Message::Source(id) => {
            let mut s = lock(slot);
            if s.source != id {
                s.source = id;
                s.switched = Some(id);
                s.latest = None;
                s.unread = false;
            }
        }
        Message::NoFace => {
            let mut s = lock(slot);
            s.latest = None;
            s.unread = false;
        }
        Message::Frame { source, points } => {
            let mut s = lock(slot);
            let source = source.unwrap_or(s.source);
            if source != s.source {
                s.source = source;
                s.switched = Some(source);
            }
            s.latest = Some(LandmarkFrame {
                points,
                timestamp: clock.now(),
                source,
            });
            s.unread = true;
        }
    }
}

#[async_trait]
impl LandmarkSource for UdpSource {
    async fn next_event(&mut self) -> Result<SourceEvent, CortexError> {
        if self.task.is_finished() {
            return Ok(SourceEvent::Closed);
        }
        let now = self.clock.now();
        let mut s = lock(&self.slot);
        if let Some(source) = s.switched.take() {
            return Ok(SourceEvent::Switched { source });
        }
        let fresh = s
            .latest
            .as_ref()
            .is_some_and(|f| now - f.timestamp <= STALE_AFTER);
        if !fresh {
            return Ok(SourceEvent::NoFace { timestamp: now });
        }
        if !s.unread {
            return Ok(SourceEvent::Pending);
        }
        s.unread = false;
        Ok(s.latest.clone().map_or(SourceEvent::Pending, SourceEvent::Frame))
    }
}

impl Drop for UdpSource {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_parse_json_frame() {
        let msg = parse_message(r#"{"source":2,"points":[[0.1,0.2],[0.3,0.4,-0.05]]}"#)
            .expect("parse");
        assert_eq!(
            msg,
            Message::Frame {
                source: Some(2),
                points: vec![Point2::new(0.1, 0.2), Point2::new(0.3, 0.4)],
            }
        );
    }

    #[test]
    fn test_parse_no_face_and_kv() {
        assert_eq!(parse_message(r#"{"face":false}"#), Some(Message::NoFace));
        assert_eq!(parse_message("pedal=down"), Some(Message::Pedal(PedalSignal::Down)));
        assert_eq!(parse_message(" pedal=up\n"), Some(Message::Pedal(PedalSignal::Up)));
        assert_eq!(parse_message("source=3"), Some(Message::Source(3)));
        assert_eq!(parse_message("tracking=off"), Some(Message::Tracking(false)));
        assert_eq!(
            parse_message("lip_scroll=on"),
            Some(Message::Mode(GestureFamily::Lip, true))
        );
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(parse_message(""), None);
        assert_eq!(parse_message("{not json"), None);
        assert_eq!(parse_message(r#"{"points":[[0.1]]}"#), None);
        assert_eq!(parse_message("pedal=sideways"), None);
        assert_eq!(parse_message("source=abc"), None);
        assert_eq!(parse_message("blink=maybe"), None);
        assert_eq!(parse_message("teleport=on"), None);
    }

    #[tokio::test]
    async fn test_bind_rejects_bad_address() {
        let err = UdpSource::bind("not-an-addr", Clock::new(), None, None).await;
        assert!(matches!(err, Err(CortexError::InvalidAddress(_))));
    }

    #[tokio::test]
    async fn test_udp_round_trip() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let toggles = Arc::new(GestureToggles::default());
        let mut src = UdpSource::bind(
            "127.0.0.1:0",
            Clock::new(),
            Some(tx),
            Some(Arc::clone(&toggles)),
        )
        .await
        .expect("bind");
        assert!(matches!(
            src.next_event().await.unwrap(),
            SourceEvent::NoFace { .. }
        ));

        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let target = src.local_addr();
        sender
            .send_to(br#"{"points":[[0.5,0.5],[0.6,0.4]]}"#, target)
            .await
            .unwrap();
        sender.send_to(b"pedal=down", target).await.unwrap();
        sender.send_to(b"blink=on", target).await.unwrap();

        let mut frame = None;
        for _ in 0..100 {
            if let SourceEvent::Frame(f) = src.next_event().await.unwrap() {
                frame = Some(f);
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let frame = frame.expect("frame delivered");
        assert_eq!(frame.points.len(), 2);
        assert_eq!(frame.source, 0);
        // Already consumed
        assert_eq!(src.next_event().await.unwrap(), SourceEvent::Pending);

        let signal = rx.recv_timeout(Duration::from_secs(1)).expect("pedal signal");
        assert_eq!(signal, PedalSignal::Down);

        for _ in 0..100 {
            if toggles.is_enabled(GestureFamily::Blink) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(toggles.is_enabled(GestureFamily::Blink));
    }
}
