use crate::types::EventRecord;
use tokio::sync::broadcast;

/// Fan-out channel for review notifications.
///
/// Publishing never blocks; when nobody is subscribed the record is dropped.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventRecord>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventRecord> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub fn publish(
        &self,
        event: EventRecord,
    ) -> Result<(), broadcast::error::SendError<EventRecord>> {
        self.sender.send(event).map(|_| ())
    }
}

/// Collects every record already queued on `rx` without waiting. Records
/// lost to lag are skipped.
pub fn drain(rx: &mut broadcast::Receiver<EventRecord>) -> Vec<EventRecord> {
    let mut records = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(record) => records.push(record),
            Err(broadcast::error::TryRecvError::Lagged(_)) => {}
            Err(_) => break,
        }
    }
    records
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
