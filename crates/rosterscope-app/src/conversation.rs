// Bounded question/answer history scoped to one session.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

/// One question and the assistant's answer (or the error shown instead).
#[derive(Debug, Clone, PartialEq)]
pub struct Exchange {
    pub question: String,
    pub answer: String,
    pub failed: bool,
    pub asked_at: DateTime<Utc>,
}

/// Keeps the most recent `limit` exchanges, oldest first.
#[derive(Debug, Clone)]
pub struct Conversation {
    limit: usize,
    exchanges: VecDeque<Exchange>,
}

impl Conversation {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            exchanges: VecDeque::with_capacity(limit),
        }
    }

    pub fn push(&mut self, exchange: Exchange) {
        self.exchanges.push_back(exchange);
        while self.exchanges.len() > self.limit {
            self.exchanges.pop_front();
        }
    }

    pub fn latest(&self) -> Option<&Exchange> {
        self.exchanges.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Exchange> {
        self.exchanges.iter()
    }

    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    pub fn clear(&mut self) {
        self.exchanges.clear();
    }
}
