use std::collections::{HashMap, VecDeque};

use tokio::sync::mpsc;

/// Commands that can suspend a connection until a key receives new data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockingCommand {
    Blpop,
    Xread,
}

/// A connection waiting on a key. The sender is signalled once the key has
/// new data; the waiter then re-checks the store itself.
#[derive(Debug, Clone)]
pub struct Subscriber {
    pub client_address: String,
    pub sender: mpsc::Sender<()>,
}

impl Subscriber {
    pub fn new(client_address: &str) -> (Self, mpsc::Receiver<()>) {
        let (sender, receiver) = mpsc::channel(1);

        (
            Self {
                client_address: client_address.to_string(),
                sender,
            },
            receiver,
        )
    }
}

#[derive(Debug, Default)]
pub struct State {
    subscribers: HashMap<BlockingCommand, HashMap<String, VecDeque<Subscriber>>>, // command -> key -> waiters, oldest first
}

impl State {
    pub fn new() -> Self {
        State {
            subscribers: HashMap::new(),
        }
    }

    pub fn add_subscriber(&mut self, command: BlockingCommand, key: &str, subscriber: Subscriber) {
        self.subscribers
            .entry(command)
            .or_default()
            .entry(key.to_string())
            .or_default()
            .push_back(subscriber);
    }

    /// Puts a subscriber that was woken but found nothing back at the head of
    /// the queue, ahead of waiters that arrived after it.
    pub fn requeue_subscriber(&mut self, command: BlockingCommand, key: &str, subscriber: Subscriber) {
        self.subscribers
            .entry(command)
            .or_default()
            .entry(key.to_string())
            .or_default()
            .push_front(subscriber);
    }

    pub fn remove_subscriber(&mut self, command: BlockingCommand, key: &str, client_address: &str) {
        let Some(keys) = self.subscribers.get_mut(&command) else {
            return;
        };

        if let Some(waiters) = keys.get_mut(key) {
            waiters.retain(|subscriber| subscriber.client_address != client_address);

            if waiters.is_empty() {
                keys.remove(key);
            }
        }
    }

    /// Wakes up to `count` of the longest waiting subscribers on `key`.
    pub fn notify_oldest(&mut self, command: BlockingCommand, key: &str, count: usize) {
        let Some(waiters) = self
            .subscribers
            .get_mut(&command)
            .and_then(|keys| keys.get_mut(key))
        else {
            return;
        };

        let mut notified = 0;

        while notified < count {
            let Some(subscriber) = waiters.pop_front() else {
                break;
            };

            // A closed channel means the waiter already gave up.
            if subscriber.sender.try_send(()).is_ok() || !subscriber.sender.is_closed() {
                notified += 1;
            }
        }
    }

    pub fn notify_all(&mut self, command: BlockingCommand, key: &str) {
        let Some(waiters) = self
            .subscribers
            .get_mut(&command)
            .and_then(|keys| keys.remove(key))
        else {
            return;
        };

        for subscriber in waiters {
            let _ = subscriber.sender.try_send(());
        }
    }

    pub fn waiting_count(&self, command: BlockingCommand, key: &str) -> usize {
        self.subscribers
            .get(&command)
            .and_then(|keys| keys.get(key))
            .map_or(0, VecDeque::len)
    }
}
