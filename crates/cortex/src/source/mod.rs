//! Landmark sources feeding the engine loop

use crate::error::CortexError;
use crate::types::LandmarkFrame;
use async_trait::async_trait;
use std::collections::VecDeque;

mod udp;

pub use udp::{parse_message, udp_addr_from_env, Message, UdpSource};

/// What a source has for the engine on one poll
#[derive(Debug, Clone, PartialEq)]
pub enum SourceEvent {
    Frame(LandmarkFrame),
    /// The camera is running but no face was found
    NoFace { timestamp: f64 },
    /// The camera changed; everything downstream must hard-reset
    Switched { source: u32 },
    /// Nothing new since the last poll
    Pending,
    /// The source is gone for good
    Closed,
}

#[async_trait]
pub trait LandmarkSource: Send {
    async fn next_event(&mut self) -> Result<SourceEvent, CortexError>;
}

/// Replays a fixed list of events, then reports `Closed`
#[derive(Debug, Default, Clone)]
pub struct ScriptedSource {
    events: VecDeque<SourceEvent>,
}

impl ScriptedSource {
    pub fn new(events: impl IntoIterator<Item = SourceEvent>) -> Self {
        Self {
            events: events.into_iter().collect(),
        }
    }

    pub fn push(&mut self, event: SourceEvent) {
        self.events.push_back(event);
    }

    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

#[async_trait]
impl LandmarkSource for ScriptedSource {
    async fn next_event(&mut self) -> Result<SourceEvent, CortexError> {
        Ok(self.events.pop_front().unwrap_or(SourceEvent::Closed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_source_drains_then_closes() {
        let mut src = ScriptedSource::new([
            SourceEvent::NoFace { timestamp: 0.0 },
            SourceEvent::Switched { source: 1 },
        ]);
        assert_eq!(
            src.next_event().await.unwrap(),
            SourceEvent::NoFace { timestamp: 0.0 }
        );
        assert_eq!(
            src.next_event().await.unwrap(),
            SourceEvent::Switched { source: 1 }
        );
        assert_eq!(src.next_event().await.unwrap(), SourceEvent::Closed);
        assert_eq!(src.next_event().await.unwrap(), SourceEvent::Closed);
    }
}
