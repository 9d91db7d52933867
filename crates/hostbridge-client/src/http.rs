//! Call primitive that reaches the host router over HTTP.

use hostbridge_envelope::{Envelope, encode_to_value};
use hostbridge_host::CALLBACK_SUFFIX;
use serde_json::Value;
use tokio::runtime::Handle;
use url::Url;

use crate::callback::ResolutionCallback;
use crate::error::{BridgeError, Result};
use crate::primitive::HostCallPrimitive;

/// POSTs the argument array to `<base_url>/<function>.callback`.
///
/// Requests run on the given tokio runtime. The callback receives the decoded
/// response body as its only value, or nothing when the body is empty.
/// Callers of the blocking bridge must not sit on a thread that this runtime
/// needs to drive the request.
#[derive(Debug, Clone)]
pub struct HttpCallPrimitive {
	client: reqwest::Client,
	base_url: Url,
	handle: Handle,
}

impl HttpCallPrimitive {
	/// Creates a primitive for the router mounted at `base_url`,
	/// e.g. `http://127.0.0.1:34115/ipc`.
	pub fn new(base_url: &str, handle: Handle) -> Result<Self> {
		let mut base_url = Url::parse(base_url).map_err(|e| BridgeError::Setup(format!("invalid base url: {}", e)))?;
		if base_url.cannot_be_a_base() {
			return Err(BridgeError::Setup(format!("{} cannot be a base url", base_url)));
		}
		if !base_url.path().ends_with('/') {
			let path = format!("{}/", base_url.path());
			base_url.set_path(&path);
		}
		Ok(Self {
			client: reqwest::Client::new(),
			base_url,
			handle,
		})
	}

	/// Like [`HttpCallPrimitive::new`], using the runtime of the calling context.
	pub fn from_current(base_url: &str) -> Result<Self> {
		let handle = Handle::try_current().map_err(|e| BridgeError::Setup(e.to_string()))?;
		Self::new(base_url, handle)
	}

	pub fn with_client(mut self, client: reqwest::Client) -> Self {
		self.client = client;
		self
	}

	/// URL of the endpoint for `function`.
	///
	/// The name is percent-encoded as a single path segment, so spaces,
	/// non-ASCII characters and `/` survive the trip to the router.
	pub fn endpoint(&self, function: &str) -> Result<Url> {
		let mut url = self.base_url.clone();
		url.path_segments_mut()
			.map_err(|()| BridgeError::Transport(format!("{} cannot be a base url", self.base_url)))?
			.pop_if_empty()
			.push(&format!("{}{}", function, CALLBACK_SUFFIX));
		Ok(url)
	}
}

impl HostCallPrimitive for HttpCallPrimitive {
	fn invoke(&self, function: &str, args: Vec<Value>, callback: ResolutionCallback) -> Result<()> {
		let url = self.endpoint(function)?;
		let request = self.client.post(url).json(&args);

		self.handle.spawn(async move {
			let values = match fetch(request).await {
				Ok(Some(value)) => vec![value],
				Ok(None) => Vec::new(),
				Err(message) => {
					tracing::warn!(target: "hostbridge::client", error = %message, "host call failed");
					match encode_to_value(&Envelope::<Value>::failure(message)) {
						Ok(value) => vec![value],
						Err(_) => return,
					}
				}
			};
			callback.settle(values);
		});
		Ok(())
	}
}

async fn fetch(request: reqwest::RequestBuilder) -> std::result::Result<Option<Value>, String> {
	let response = request.send().await.map_err(|e| format!("error fetching: {}", e))?;
	let body = response
		.bytes()
		.await
		.map_err(|e| format!("error reading response: {}", e))?;
	if body.iter().all(u8::is_ascii_whitespace) {
		return Ok(None);
	}
	serde_json::from_slice(&body)
		.map(Some)
		.map_err(|e| format!("error decoding response: {}", e))
}
