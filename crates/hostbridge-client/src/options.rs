use std::time::Duration;

/// Per-call options for [`ClientBridge`](crate::ClientBridge).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallOptions {
	/// Whether settling with no values is a failure.
	pub requires_return: bool,

	/// Upper bound on the wait. `None` blocks until the call settles, which
	/// may be forever if the host never answers.
	pub deadline: Option<Duration>,
}

impl CallOptions {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn requires_return(mut self, requires_return: bool) -> Self {
		self.requires_return = requires_return;
		self
	}

	pub fn deadline(mut self, deadline: Duration) -> Self {
		self.deadline = Some(deadline);
		self
	}
}
