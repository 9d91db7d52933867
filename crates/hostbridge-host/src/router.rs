//! HTTP-style router exposing registered functions at
//! `/<base_path>/<name>.callback`.
//!
//! Every request, including every failure, is answered with an envelope:
//!
//! | Outcome | `StatusPolicy::Uniform` | `StatusPolicy::Classified` |
//! |---------|-------------------------|----------------------------|
//! | success | 200 | 200 |
//! | routing, decoding, type or target failure | 200 | 500 |
//! | path outside the template | 404 | 404 |
//!
//! The request method is not inspected. The function-name segment is
//! percent-decoded before lookup; a segment that decodes to invalid UTF-8 or
//! to a string containing `/` is treated as a path outside the template.

use bytes::Bytes;
use hostbridge_envelope::{Envelope, encode};
use http::header::{CONTENT_TYPE, HeaderValue};
use http::{Request, Response, StatusCode};
use http_body_util::Full;
use percent_encoding::percent_decode_str;
use serde_json::Value;
use std::any::Any;
use std::borrow::Cow;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::error::{IpcError, Result};
use crate::invoker::DynamicInvoker;
use crate::logging::{IpcLogger, LogLevel, LogRecord, default_logger};
use crate::registry::CallRegistry;
use crate::settings::{IpcSettings, StatusPolicy};

/// Suffix every function-name segment must carry.
pub const CALLBACK_SUFFIX: &str = ".callback";

const NOT_FOUND_MESSAGE: &str = "page not found";
const ENCODE_FAILURE_BODY: &str =
	r#"{"data":null,"ok":false,"error":"failed to encode response"}"#;

/// Result of matching a request path against the route template.
#[derive(Debug, PartialEq, Eq)]
pub enum RouteMatch<'a> {
	/// The path does not belong to the IPC route.
	Unmatched,
	/// The path belongs to the route and carries this function-name segment,
	/// still percent-encoded and possibly empty.
	Function(&'a str),
}

/// Routes requests to the [`CallRegistry`] through the [`DynamicInvoker`].
#[derive(Clone)]
pub struct IpcRouter {
	registry: Arc<CallRegistry>,
	invoker: DynamicInvoker,
	prefix: String,
	status_policy: StatusPolicy,
	max_body_bytes: usize,
	logger: Arc<dyn IpcLogger>,
}

impl IpcRouter {
	/// Creates a router with default settings.
	pub fn new(registry: Arc<CallRegistry>) -> Self {
		Self::build(registry, &IpcSettings::default())
	}

	/// Creates a router from validated settings.
	pub fn from_settings(registry: Arc<CallRegistry>, settings: &IpcSettings) -> Result<Self> {
		settings.validate()?;
		Ok(Self::build(registry, settings))
	}

	fn build(registry: Arc<CallRegistry>, settings: &IpcSettings) -> Self {
		Self {
			registry,
			invoker: DynamicInvoker::new(),
			prefix: format!("/{}/", settings.normalized_base_path()),
			status_policy: settings.status_policy,
			max_body_bytes: settings.max_body_bytes,
			logger: default_logger(),
		}
	}

	/// Replaces the logger that receives router events.
	pub fn with_logger(mut self, logger: Arc<dyn IpcLogger>) -> Self {
		self.logger = logger;
		self
	}

	/// The registry calls are looked up in.
	pub fn registry(&self) -> &Arc<CallRegistry> {
		&self.registry
	}

	/// Largest accepted request body in bytes.
	pub fn max_body_bytes(&self) -> usize {
		self.max_body_bytes
	}

	/// Path of the endpoint for `function`, e.g. `/ipc/add.callback`.
	pub fn path_for(&self, function: &str) -> String {
		format!("{}{}{}", self.prefix, function, CALLBACK_SUFFIX)
	}

	/// Matches `path` against `/<base_path>/<segment>`.
	pub fn match_path<'a>(&self, path: &'a str) -> RouteMatch<'a> {
		if path == self.prefix.trim_end_matches('/') {
			return RouteMatch::Function("");
		}
		match path.strip_prefix(self.prefix.as_str()) {
			Some(segment) if !segment.contains('/') => RouteMatch::Function(segment),
			_ => RouteMatch::Unmatched,
		}
	}

	/// Percent-decodes a raw path segment.
	///
	/// Returns `None` when the segment is not valid UTF-8 once decoded or
	/// when it decodes to something containing `/`.
	pub fn decode_segment(raw: &str) -> Option<Cow<'_, str>> {
		let decoded = percent_decode_str(raw).decode_utf8().ok()?;
		if decoded.contains('/') {
			return None;
		}
		Some(decoded)
	}

	/// Validates a function-name segment and strips the suffix.
	pub fn function_name(segment: &str) -> Result<&str> {
		if segment.is_empty() {
			return Err(IpcError::MissingFunctionName);
		}
		let name = segment
			.strip_suffix(CALLBACK_SUFFIX)
			.ok_or_else(|| IpcError::InvalidFunctionName(segment.to_string()))?;
		if name.is_empty() {
			return Err(IpcError::MissingFunctionName);
		}
		Ok(name)
	}

	/// Runs the call described by a function-name segment and a raw body.
	///
	/// This is the synchronous core shared by [`IpcRouter::handle`] and
	/// in-process callers. The target runs on the calling thread.
	pub fn dispatch(&self, segment: &str, body: &[u8]) -> Result<Vec<Value>> {
		let name = Self::function_name(segment)?;
		let function = self
			.registry
			.get(name)
			.ok_or_else(|| IpcError::FunctionNotFound(name.to_string()))?;

		if body.len() > self.max_body_bytes {
			return Err(IpcError::BodyTooLarge {
				limit: self.max_body_bytes,
			});
		}

		let args = if body.iter().all(u8::is_ascii_whitespace) {
			if function.signature().takes_arguments() {
				return Err(IpcError::MissingArguments(name.to_string()));
			}
			Vec::new()
		} else {
			match serde_json::from_slice::<Value>(body) {
				Ok(Value::Array(args)) => args,
				Ok(_) => return Err(IpcError::ArgumentsNotArray),
				Err(e) => return Err(IpcError::DecodeError(e.to_string())),
			}
		};

		self.invoker.invoke(function.target(), args)
	}

	/// Like [`IpcRouter::dispatch`], but a panicking target is reported as
	/// [`IpcError::TargetPanicked`] instead of unwinding into the caller.
	pub fn dispatch_isolated(&self, segment: &str, body: &[u8]) -> Result<Vec<Value>> {
		panic::catch_unwind(AssertUnwindSafe(|| self.dispatch(segment, body)))
			.unwrap_or_else(|payload| Err(IpcError::TargetPanicked(panic_message(payload.as_ref()))))
	}

	/// Answers one request.
	///
	/// The target runs on the blocking thread pool so a slow target only
	/// holds up its own request.
	pub async fn handle(&self, request: Request<Bytes>) -> Response<Full<Bytes>> {
		let path = request.uri().path().to_string();
		let segment = match self.match_path(&path) {
			RouteMatch::Function(raw) => Self::decode_segment(raw).map(Cow::into_owned),
			RouteMatch::Unmatched => None,
		};
		let Some(segment) = segment else {
			self.log(LogLevel::Warning, "404", Some(path));
			return self.not_found();
		};

		let router = self.clone();
		let body = request.into_body();
		let result = tokio::task::spawn_blocking(move || router.dispatch_isolated(&segment, &body))
			.await
			.unwrap_or_else(|e| Err(IpcError::TargetPanicked(e.to_string())));

		self.respond(result)
	}

	/// Converts a dispatch result into an envelope response.
	pub fn respond(&self, result: Result<Vec<Value>>) -> Response<Full<Bytes>> {
		match result {
			Ok(data) => {
				self.log(LogLevel::Debug, "callback called successfully", None);
				envelope_response(StatusCode::OK, &Envelope::success(data))
			}
			Err(error) => {
				let event = if error.is_target_error() {
					"error calling callback"
				} else {
					"request rejected"
				};
				self.log(LogLevel::Warning, event, Some(error.to_string()));
				let status = match self.status_policy {
					StatusPolicy::Uniform => StatusCode::OK,
					StatusPolicy::Classified => StatusCode::INTERNAL_SERVER_ERROR,
				};
				envelope_response(status, &Envelope::<Vec<Value>>::failure(error.to_string()))
			}
		}
	}

	/// The fixed response for paths outside the route template.
	pub fn not_found(&self) -> Response<Full<Bytes>> {
		envelope_response(
			StatusCode::NOT_FOUND,
			&Envelope::<Vec<Value>>::failure(NOT_FOUND_MESSAGE),
		)
	}

	fn log(&self, level: LogLevel, event: &'static str, detail: Option<String>) {
		let mut record = LogRecord::new(level, "router", event);
		record.detail = detail;
		self.logger.log(&record);
	}
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
	if let Some(message) = payload.downcast_ref::<&str>() {
		return (*message).to_string();
	}
	if let Some(message) = payload.downcast_ref::<String>() {
		return message.clone();
	}
	"unknown panic".to_string()
}

fn envelope_response(status: StatusCode, envelope: &Envelope<Vec<Value>>) -> Response<Full<Bytes>> {
	let body = encode(envelope)
		.map(Bytes::from)
		.unwrap_or_else(|_| Bytes::from_static(ENCODE_FAILURE_BODY.as_bytes()));
	let mut response = Response::new(Full::new(body));
	*response.status_mut() = status;
	response
		.headers_mut()
		.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
	response
}
