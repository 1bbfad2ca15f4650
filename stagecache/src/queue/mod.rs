//! Message envelopes and the blocking queue shared by producer and consumer
//! stages.

mod message;
mod waiting_queue;

pub use message::Message;
pub use waiting_queue::WaitingQueue;
