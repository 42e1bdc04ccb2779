use std::panic::{AssertUnwindSafe, catch_unwind};
use std::thread::{JoinHandle, ThreadId};

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::panic::panic_message;
use crate::spawn::spawn_named_thread;
use crate::ticket::Ticket;

/// Unit of work handed to a confined executor.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Submission to a confined executor failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitError {
	#[error("confined executor has shut down")]
	Closed,
}

/// An executor that runs every submitted task on one designated thread.
pub trait ConfinedExecutor: Send + Sync {
	/// Returns true when the calling thread is the confined thread.
	fn is_confined(&self) -> bool;

	/// Queues `task` for execution on the confined thread.
	fn execute(&self, task: Task) -> Result<(), SubmitError>;
}

/// Runs `f` on the confined thread of `executor`.
///
/// Runs inline when no executor is installed or the caller already is the confined
/// thread; the returned ticket is then immediately ready.
pub fn run_confined<E, F, R>(executor: Option<&E>, f: F) -> Result<Ticket<R>, SubmitError>
where
	E: ConfinedExecutor + ?Sized,
	F: FnOnce() -> R + Send + 'static,
	R: Send + 'static,
{
	let Some(executor) = executor.filter(|e| !e.is_confined()) else {
		return Ok(Ticket::ready(f()));
	};

	let (tx, ticket) = Ticket::channel();
	executor.execute(Box::new(move || {
		let _ = tx.send(f());
	}))?;
	Ok(ticket)
}

/// A dedicated OS thread draining a FIFO task queue.
///
/// Tasks run one at a time in submission order. A panicking task is logged and
/// dropped; the thread keeps serving the queue. Dropping the handle closes the queue,
/// lets queued tasks finish, and joins the thread.
pub struct ConfinedThread {
	name: String,
	thread_id: ThreadId,
	tx: Mutex<Option<mpsc::UnboundedSender<Task>>>,
	handle: Mutex<Option<JoinHandle<()>>>,
}

impl ConfinedThread {
	/// Spawns the confined thread.
	pub fn spawn(name: impl Into<String>) -> std::io::Result<Self> {
		let name = name.into();
		let (tx, mut rx) = mpsc::unbounded_channel::<Task>();
		let thread_name = name.clone();
		let handle = spawn_named_thread(name.clone(), move || {
			while let Some(task) = rx.blocking_recv() {
				if let Err(payload) = catch_unwind(AssertUnwindSafe(task)) {
					let message = panic_message(payload.as_ref()).unwrap_or_else(|| "<non-string panic>".to_owned());
					tracing::error!(thread = %thread_name, panic = %message, "worker.confined.task_panicked");
				}
			}
			tracing::debug!(thread = %thread_name, "worker.confined.drained");
		})?;
		let thread_id = handle.thread().id();
		tracing::debug!(thread = %name, "worker.confined.started");

		Ok(Self {
			name,
			thread_id,
			tx: Mutex::new(Some(tx)),
			handle: Mutex::new(Some(handle)),
		})
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn thread_id(&self) -> ThreadId {
		self.thread_id
	}

	/// Closes the queue. Tasks already queued still run; later submissions fail.
	pub fn close(&self) {
		if self.tx.lock().take().is_some() {
			tracing::debug!(thread = %self.name, "worker.confined.closed");
		}
	}

	/// Closes the queue and waits for the thread to drain it.
	///
	/// No-op when called from the confined thread itself.
	pub fn shutdown(&self) {
		self.close();
		if self.is_confined() {
			return;
		}
		let handle = self.handle.lock().take();
		if let Some(handle) = handle
			&& handle.join().is_err()
		{
			tracing::error!(thread = %self.name, "worker.confined.join_failed");
		}
	}
}

impl ConfinedExecutor for ConfinedThread {
	fn is_confined(&self) -> bool {
		std::thread::current().id() == self.thread_id
	}

	fn execute(&self, task: Task) -> Result<(), SubmitError> {
		let guard = self.tx.lock();
		let tx = guard.as_ref().ok_or(SubmitError::Closed)?;
		tx.send(task).map_err(|_| SubmitError::Closed)
	}
}

impl Drop for ConfinedThread {
	fn drop(&mut self) {
		self.shutdown();
	}
}

impl std::fmt::Debug for ConfinedThread {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ConfinedThread")
			.field("name", &self.name)
			.field("thread_id", &self.thread_id)
			.field("closed", &self.tx.lock().is_none())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;
	use std::sync::atomic::{AtomicUsize, Ordering};

	use pretty_assertions::assert_eq;

	use super::*;

	struct Never;

	impl ConfinedExecutor for Never {
		fn is_confined(&self) -> bool {
			false
		}

		fn execute(&self, _task: Task) -> Result<(), SubmitError> {
			Err(SubmitError::Closed)
		}
	}

	#[test]
	fn runs_inline_without_an_executor() {
		let caller = std::thread::current().id();
		let ticket = run_confined::<ConfinedThread, _, _>(None, move || std::thread::current().id() == caller).unwrap();
		assert!(ticket.is_ready());
		assert_eq!(ticket.wait(), Ok(true));
	}

	#[test]
	fn task_runs_on_the_confined_thread() {
		let executor = ConfinedThread::spawn("confined-test").unwrap();
		let expected = executor.thread_id();
		let ticket = run_confined(Some(&executor), || std::thread::current().id()).unwrap();
		assert_eq!(ticket.wait(), Ok(expected));
	}

	#[test]
	fn nested_submission_runs_inline_on_the_confined_thread() {
		let executor = Arc::new(ConfinedThread::spawn("confined-nested").unwrap());
		let inner = Arc::clone(&executor);
		let ticket = run_confined(Some(executor.as_ref()), move || {
			let nested = run_confined(Some(inner.as_ref()), || 5).unwrap();
			nested.is_ready()
		})
		.unwrap();
		assert_eq!(ticket.wait(), Ok(true));
	}

	#[test]
	fn tasks_run_in_submission_order() {
		let executor = ConfinedThread::spawn("confined-order").unwrap();
		let seen = Arc::new(Mutex::new(Vec::new()));
		let tickets: Vec<_> = (0..32)
			.map(|i| {
				let seen = Arc::clone(&seen);
				run_confined(Some(&executor), move || seen.lock().push(i)).unwrap()
			})
			.collect();
		for ticket in tickets {
			ticket.wait().unwrap();
		}
		assert_eq!(*seen.lock(), (0..32).collect::<Vec<_>>());
	}

	#[test]
	fn panicking_task_does_not_stop_the_thread() {
		let executor = ConfinedThread::spawn("confined-panic").unwrap();
		let failed = run_confined(Some(&executor), || -> u8 { panic!("task failure") }).unwrap();
		assert!(failed.wait().is_err());

		let ticket = run_confined(Some(&executor), || 9).unwrap();
		assert_eq!(ticket.wait(), Ok(9));
	}

	#[test]
	fn closed_executor_rejects_submissions() {
		let executor = ConfinedThread::spawn("confined-closed").unwrap();
		executor.close();
		let err = run_confined(Some(&executor), || ()).unwrap_err();
		assert_eq!(err, SubmitError::Closed);
		assert_eq!(run_confined(Some(&Never), || ()).unwrap_err(), SubmitError::Closed);
	}

	#[test]
	fn shutdown_drains_queued_tasks() {
		let executor = ConfinedThread::spawn("confined-drain").unwrap();
		let count = Arc::new(AtomicUsize::new(0));
		for _ in 0..8 {
			let count = Arc::clone(&count);
			let _ = run_confined(Some(&executor), move || {
				count.fetch_add(1, Ordering::SeqCst);
			})
			.unwrap();
		}
		executor.shutdown();
		assert_eq!(count.load(Ordering::SeqCst), 8);
	}

	#[tokio::test(flavor = "multi_thread")]
	async fn ticket_is_awaitable_from_async_code() {
		let executor = ConfinedThread::spawn("confined-async").unwrap();
		let ticket = run_confined(Some(&executor), || "async").unwrap();
		assert_eq!(ticket.await, Ok("async"));
	}
}
