//! Delayed, cancellable canned replies standing in for a model backend.

use std::time::Duration;

use rand::seq::SliceRandom;
use rand::Rng;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::chat::ConversationId;

pub const CANNED_REPLIES: &[&str] = &[
    "I'd be happy to help you with that! Could you provide more specific details about what you're looking for?",
    "That's an interesting question. Based on current best practices, I'd recommend considering the following approaches...",
    "Great idea! Here are some suggestions to help you get started with this project.",
    "I understand what you're asking. Let me break this down into manageable steps for you.",
    "Thanks for the clarification. Here's how I would approach this problem...",
];

/// A reply whose delay has elapsed.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplyReady {
    pub ticket: u64,
    pub target: ConversationId,
    pub content: String,
}

/// Handle to a scheduled reply.
#[derive(Debug)]
pub struct PendingReply {
    pub ticket: u64,
    pub target: ConversationId,
    task: JoinHandle<()>,
}

impl PendingReply {
    /// Abort the timer. Aborting a finished task does nothing.
    pub fn cancel(self) {
        debug!(ticket = self.ticket, "reply cancelled");
        self.task.abort();
    }
}

pub struct ResponseSimulator {
    min_delay: Duration,
    max_delay: Duration,
    next_ticket: u64,
    tx: UnboundedSender<ReplyReady>,
    rx: UnboundedReceiver<ReplyReady>,
}

impl ResponseSimulator {
    /// Delays are drawn from `[min_delay, max_delay)`; an empty range
    /// always uses `min_delay`.
    pub fn new(min_delay: Duration, max_delay: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            min_delay,
            max_delay,
            next_ticket: 0,
            tx,
            rx,
        }
    }

    /// Schedule one reply for `target`. Must be called from within a tokio
    /// runtime; returns without waiting.
    pub fn schedule(&mut self, target: ConversationId) -> PendingReply {
        self.next_ticket += 1;
        let ticket = self.next_ticket;

        let mut rng = rand::thread_rng();
        let delay = if self.max_delay > self.min_delay {
            rng.gen_range(self.min_delay..self.max_delay)
        } else {
            self.min_delay
        };
        let content = CANNED_REPLIES
            .choose(&mut rng)
            .copied()
            .unwrap_or(CANNED_REPLIES[0])
            .to_string();

        info!(ticket, conversation = %target, delay_ms = delay.as_millis() as u64, "reply scheduled");

        let tx = self.tx.clone();
        let ready = ReplyReady {
            ticket,
            target: target.clone(),
            content,
        };
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // The receiver lives as long as the simulator.
            let _ = tx.send(ready);
        });

        PendingReply {
            ticket,
            target,
            task,
        }
    }

    pub fn try_recv(&mut self) -> Option<ReplyReady> {
        match self.rx.try_recv() {
            Ok(ready) => Some(ready),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }
}
