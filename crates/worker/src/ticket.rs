use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use thiserror::Error;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::oneshot;

/// The task behind a ticket was dropped without producing a value.
///
/// Happens when the confined thread shuts down with the task still queued, or when the
/// task panicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("confined task was dropped before completing")]
pub struct TicketError;

/// Completion handle for work handed to a confined executor.
///
/// Await it from async code, or call [`Ticket::wait`] from a plain thread.
#[derive(Debug)]
pub struct Ticket<T> {
	state: TicketState<T>,
}

#[derive(Debug)]
enum TicketState<T> {
	Ready(Option<T>),
	Pending(oneshot::Receiver<T>),
}

impl<T> Ticket<T> {
	/// A ticket for work that already ran inline.
	pub fn ready(value: T) -> Self {
		Self {
			state: TicketState::Ready(Some(value)),
		}
	}

	/// Creates a ticket together with the sender that completes it.
	pub fn channel() -> (oneshot::Sender<T>, Self) {
		let (tx, rx) = oneshot::channel();
		(
			tx,
			Self {
				state: TicketState::Pending(rx),
			},
		)
	}

	/// Returns true if the work ran inline and the value is available without waiting.
	pub fn is_ready(&self) -> bool {
		matches!(self.state, TicketState::Ready(Some(_)))
	}

	/// Blocks the current thread until the work completes.
	///
	/// This is the intended backpressure point for callers that need the outcome. Safe
	/// to call from a thread driving a tokio runtime: on a multi-threaded runtime the
	/// worker is handed over with `block_in_place`, otherwise the receive happens on a
	/// scoped helper thread.
	pub fn wait(self) -> Result<T, TicketError>
	where
		T: Send,
	{
		let rx = match self.state {
			TicketState::Ready(value) => return value.ok_or(TicketError),
			TicketState::Pending(rx) => rx,
		};
		match Handle::try_current().map(|handle| handle.runtime_flavor()) {
			Err(_) => rx.blocking_recv().map_err(|_| TicketError),
			Ok(RuntimeFlavor::MultiThread) => tokio::task::block_in_place(move || rx.blocking_recv()).map_err(|_| TicketError),
			Ok(_) => std::thread::scope(|scope| scope.spawn(move || rx.blocking_recv()).join())
				.map_err(|_| TicketError)?
				.map_err(|_| TicketError),
		}
	}
}

// The value is never pinned; only the receiver is polled, and it is `Unpin`.
impl<T> Unpin for Ticket<T> {}

impl<T> Future for Ticket<T> {
	type Output = Result<T, TicketError>;

	fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		let this = self.get_mut();
		match &mut this.state {
			TicketState::Ready(value) => Poll::Ready(value.take().ok_or(TicketError)),
			TicketState::Pending(rx) => Pin::new(rx).poll(cx).map_err(|_| TicketError),
		}
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn ready_ticket_yields_its_value() {
		let ticket = Ticket::ready(7);
		assert!(ticket.is_ready());
		assert_eq!(ticket.wait(), Ok(7));
	}

	#[test]
	fn dropped_sender_reports_an_error() {
		let (tx, ticket) = Ticket::<u8>::channel();
		drop(tx);
		assert_eq!(ticket.wait(), Err(TicketError));
	}

	#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
	async fn wait_inside_a_multi_thread_runtime() {
		let (tx, ticket) = Ticket::channel();
		std::thread::spawn(move || {
			let _ = tx.send(3);
		});
		let waited = tokio::spawn(async move { ticket.wait() }).await.unwrap();
		assert_eq!(waited, Ok(3));
	}

	#[tokio::test]
	async fn wait_inside_a_current_thread_runtime() {
		let (tx, ticket) = Ticket::channel();
		std::thread::spawn(move || {
			let _ = tx.send("late");
		});
		assert_eq!(ticket.wait(), Ok("late"));
	}

	#[tokio::test]
	async fn tickets_for_values_that_are_not_unpin() {
		let ticket = Ticket::ready(std::marker::PhantomPinned);
		assert!(ticket.await.is_ok());
	}

	#[tokio::test]
	async fn pending_ticket_can_be_awaited() {
		let (tx, ticket) = Ticket::channel();
		std::thread::spawn(move || {
			let _ = tx.send("done");
		});
		assert_eq!(ticket.await, Ok("done"));
	}
}
