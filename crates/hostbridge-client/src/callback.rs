//! One-shot resolution callbacks.

use serde_json::Value;
use std::fmt;

type SettleFn = Box<dyn FnOnce(Vec<Value>) + Send>;
type ReleaseFn = Box<dyn FnOnce() + Send>;

/// A one-shot function handed to a [`HostCallPrimitive`] and run when the
/// call settles.
///
/// `settle` consumes the callback, so it runs at most once. The release hook
/// runs exactly once: right after settling, or when an unsettled callback is
/// dropped.
///
/// [`HostCallPrimitive`]: crate::HostCallPrimitive
pub struct ResolutionCallback {
	settle: Option<SettleFn>,
	release: Option<ReleaseFn>,
}

impl ResolutionCallback {
	pub fn new<F>(settle: F) -> Self
	where
		F: FnOnce(Vec<Value>) + Send + 'static,
	{
		Self {
			settle: Some(Box::new(settle)),
			release: None,
		}
	}

	/// Attaches a hook that frees engine-side resources held for this call.
	pub fn on_release<F>(mut self, release: F) -> Self
	where
		F: FnOnce() + Send + 'static,
	{
		self.release = Some(Box::new(release));
		self
	}

	/// Delivers the settled values, then releases the callback.
	pub fn settle(mut self, values: Vec<Value>) {
		if let Some(settle) = self.settle.take() {
			settle(values);
		}
		self.run_release();
	}

	fn run_release(&mut self) {
		if let Some(release) = self.release.take() {
			release();
		}
	}
}

impl Drop for ResolutionCallback {
	fn drop(&mut self) {
		// Dropping the settle closure closes its channel, waking the caller.
		self.settle = None;
		self.run_release();
	}
}

impl fmt::Debug for ResolutionCallback {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ResolutionCallback")
			.field("settled", &self.settle.is_none())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;
	use std::sync::Arc;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::sync::mpsc;

	#[rstest]
	fn test_settle_then_release() {
		// Arrange
		let (tx, rx) = mpsc::channel();
		let released = Arc::new(AtomicUsize::new(0));
		let counter = released.clone();
		let order_tx = tx.clone();
		let callback = ResolutionCallback::new(move |values| tx.send(("settle", values.len())).unwrap())
			.on_release(move || {
				counter.fetch_add(1, Ordering::SeqCst);
				order_tx.send(("release", 0)).unwrap();
			});

		// Act
		callback.settle(vec![json!(1)]);

		// Assert
		assert_eq!(rx.recv().unwrap(), ("settle", 1));
		assert_eq!(rx.recv().unwrap(), ("release", 0));
		assert_eq!(released.load(Ordering::SeqCst), 1);
	}

	#[rstest]
	fn test_drop_releases_without_settling() {
		// Arrange
		let settled = Arc::new(AtomicUsize::new(0));
		let released = Arc::new(AtomicUsize::new(0));
		let (s, r) = (settled.clone(), released.clone());
		let callback = ResolutionCallback::new(move |_| {
			s.fetch_add(1, Ordering::SeqCst);
		})
		.on_release(move || {
			r.fetch_add(1, Ordering::SeqCst);
		});

		// Act
		drop(callback);

		// Assert
		assert_eq!(settled.load(Ordering::SeqCst), 0);
		assert_eq!(released.load(Ordering::SeqCst), 1);
	}
}
