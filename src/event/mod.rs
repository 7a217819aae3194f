// src/event/mod.rs

use crossbeam_channel::{unbounded, Receiver, Sender};
use shakmaty::Color;

use crate::session::{GameResult, PendingPromotion};

/// Notable session transitions, for the UI log and the headless runner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    ThinkingStarted(Color),
    MovePlayed { side: Color, san: String, by_ai: bool },
    PromotionPending(PendingPromotion),
    GameOver(GameResult),
    Restarted,
}

/// Fan-out of [`SessionEvent`]s to every live subscriber.
#[derive(Debug, Default)]
pub struct EventBroker {
    subscribers: Vec<Sender<SessionEvent>>,
}

impl EventBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&mut self, event: SessionEvent) {
        // Subscribers whose receiver was dropped are forgotten.
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscribe(&mut self) -> Receiver<SessionEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_reaches_all_subscribers() {
        let mut broker = EventBroker::new();
        let a = broker.subscribe();
        let b = broker.subscribe();
        broker.publish(SessionEvent::Restarted);
        assert_eq!(a.try_recv().unwrap(), SessionEvent::Restarted);
        assert_eq!(b.try_recv().unwrap(), SessionEvent::Restarted);
    }

    #[test]
    fn test_publish_without_subscribers_is_fine() {
        let mut broker = EventBroker::new();
        broker.publish(SessionEvent::ThinkingStarted(Color::Black));
        let dropped = broker.subscribe();
        drop(dropped);
        broker.publish(SessionEvent::Restarted);
        assert!(broker.subscribers.is_empty());
    }
}
