mod customer;
mod pacer;

pub use customer::CustomerDriver;
pub use customer::CustomerError;
pub use customer::CustomerEvent;
pub use customer::CustomerOutput;
pub use customer::CustomerReply;
pub use pacer::NoDelay;
pub use pacer::Pacer;
pub use pacer::QueryDelayPacer;
