//! Thread confinement for catalogue writers.
//!
//! All catalogue mutation runs on one confined thread. Callers on other threads hand a
//! unit of work to a [`ConfinedExecutor`] and receive a [`Ticket`] that completes once
//! the confined thread has run it. Callers already on the confined thread, or running
//! without any executor installed, execute inline.

mod confined;
mod panic;
mod spawn;
mod ticket;

pub use confined::{ConfinedExecutor, ConfinedThread, SubmitError, Task, run_confined};
pub use panic::panic_message;
pub use spawn::spawn_named_thread;
pub use ticket::{Ticket, TicketError};
