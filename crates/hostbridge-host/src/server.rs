//! HTTP/1 server that feeds requests to an [`IpcRouter`].

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Incoming};
use hyper::server::conn::http1;
use hyper::service::Service;
use hyper_util::rt::TokioIo;
use std::error::Error as StdError;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};

use crate::error::{IpcError, Result};
use crate::logging::{IpcLogger, LogLevel, LogRecord, default_logger};
use crate::registry::CallRegistry;
use crate::router::{IpcRouter, RouteMatch};
use crate::settings::IpcSettings;

/// Serves an [`IpcRouter`] over HTTP/1.
///
/// Each connection runs on its own task, and each call runs on the blocking
/// pool, so requests never wait on one another.
pub struct IpcServer {
	router: IpcRouter,
	bind_address: SocketAddr,
	logger: Arc<dyn IpcLogger>,
}

impl IpcServer {
	/// Creates a server for `router` that binds the default address.
	pub fn new(router: IpcRouter) -> Self {
		Self {
			router,
			bind_address: IpcSettings::default().bind_address,
			logger: default_logger(),
		}
	}

	/// Creates a server and its router from validated settings.
	pub fn from_settings(registry: Arc<CallRegistry>, settings: &IpcSettings) -> Result<Self> {
		let router = IpcRouter::from_settings(registry, settings)?;
		Ok(Self {
			bind_address: settings.bind_address,
			..Self::new(router)
		})
	}

	/// Replaces the logger that receives server events.
	pub fn with_logger(mut self, logger: Arc<dyn IpcLogger>) -> Self {
		self.logger = logger;
		self
	}

	/// The router requests are handed to.
	pub fn router(&self) -> &IpcRouter {
		&self.router
	}

	/// Address [`IpcServer::run`] binds to.
	pub fn bind_address(&self) -> SocketAddr {
		self.bind_address
	}

	/// Binds the configured address and serves until an accept error occurs.
	pub async fn run(self) -> Result<()> {
		let addr = self.bind_address;
		self.listen(addr).await
	}

	/// Binds `addr` and serves until an accept error occurs.
	///
	/// # Examples
	///
	/// ```no_run
	/// use std::sync::Arc;
	/// use hostbridge_host::{CallRegistry, IpcRouter, IpcServer};
	///
	/// # async fn example() -> hostbridge_host::Result<()> {
	/// let registry = Arc::new(CallRegistry::new());
	/// registry.register("add", |a: i64, b: i64| a + b)?;
	/// let server = IpcServer::new(IpcRouter::new(registry));
	/// server.listen("127.0.0.1:34115".parse().unwrap()).await?;
	/// # Ok(())
	/// # }
	/// ```
	pub async fn listen(self, addr: SocketAddr) -> Result<()> {
		let listener = TcpListener::bind(addr).await?;
		self.serve(listener).await
	}

	/// Serves connections accepted from an already bound listener.
	pub async fn serve(self, listener: TcpListener) -> Result<()> {
		self.serve_with_shutdown(listener, std::future::pending::<()>())
			.await
	}

	/// Serves until `signal` completes.
	///
	/// Connections already accepted keep running to completion on their own
	/// tasks; only accepting stops.
	pub async fn serve_with_shutdown<S>(self, listener: TcpListener, signal: S) -> Result<()>
	where
		S: Future<Output = ()>,
	{
		if let Ok(addr) = listener.local_addr() {
			self.log(LogLevel::Info, "listening", Some(addr.to_string()));
		}
		tokio::pin!(signal);

		loop {
			tokio::select! {
				result = listener.accept() => {
					let (stream, remote_addr) = result?;
					let router = self.router.clone();
					let logger = self.logger.clone();

					tokio::task::spawn(async move {
						if let Err(err) = Self::handle_connection(stream, router).await {
							logger.log(
								&LogRecord::new(LogLevel::Warning, "server", "connection error")
									.with_detail(format!("{}: {}", remote_addr, err)),
							);
						}
					});
				}
				_ = &mut signal => {
					self.log(LogLevel::Info, "shutdown", None);
					break;
				}
			}
		}

		Ok(())
	}

	/// Serves HTTP/1 requests arriving on a single connection.
	pub async fn handle_connection(stream: TcpStream, router: IpcRouter) -> std::result::Result<(), hyper::Error> {
		let io = TokioIo::new(stream);
		http1::Builder::new()
			.serve_connection(io, RouterService { router })
			.await
	}

	fn log(&self, level: LogLevel, event: &'static str, detail: Option<String>) {
		let mut record = LogRecord::new(level, "server", event);
		record.detail = detail;
		self.logger.log(&record);
	}
}

/// Adapts [`IpcRouter`] to hyper's service interface.
struct RouterService {
	router: IpcRouter,
}

impl Service<hyper::Request<Incoming>> for RouterService {
	type Response = hyper::Response<Full<Bytes>>;
	type Error = std::convert::Infallible;
	type Future = Pin<Box<dyn Future<Output = std::result::Result<Self::Response, Self::Error>> + Send + 'static>>;

	fn call(&self, req: hyper::Request<Incoming>) -> Self::Future {
		let router = self.router.clone();

		Box::pin(async move {
			let (parts, body) = req.into_parts();

			let body = match collect_body(body, router.max_body_bytes()).await {
				Ok(body) => body,
				Err(error) => {
					// Unmatched paths still answer 404 regardless of the body.
					if router.match_path(parts.uri.path()) == RouteMatch::Unmatched {
						return Ok(router.not_found());
					}
					return Ok(router.respond(Err(error)));
				}
			};

			Ok(router.handle(hyper::Request::from_parts(parts, body)).await)
		})
	}
}

/// Reads a whole request body, stopping once it grows past `limit` bytes.
async fn collect_body<B>(body: B, limit: usize) -> Result<Bytes>
where
	B: Body,
	B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
	match Limited::new(body, limit).collect().await {
		Ok(collected) => Ok(collected.to_bytes()),
		Err(error) if error.is::<LengthLimitError>() => Err(IpcError::BodyTooLarge { limit }),
		Err(error) => Err(IpcError::BodyRead(error.to_string())),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::logging::MemoryLogger;
	use crate::registry::CallRegistry;
	use hyper::body::Frame;
	use rstest::rstest;
	use std::task::{Context, Poll};
	use tokio::sync::oneshot;

	/// Body that fails on its first frame, like a peer hanging up mid-upload.
	struct BrokenBody;

	impl Body for BrokenBody {
		type Data = Bytes;
		type Error = std::io::Error;

		fn poll_frame(
			self: Pin<&mut Self>,
			_cx: &mut Context<'_>,
		) -> Poll<Option<std::result::Result<Frame<Self::Data>, Self::Error>>> {
			Poll::Ready(Some(Err(std::io::Error::new(
				std::io::ErrorKind::ConnectionReset,
				"connection reset",
			))))
		}
	}

	#[rstest]
	#[tokio::test]
	async fn test_collect_body_within_limit() {
		// Act
		let body = collect_body(Full::new(Bytes::from_static(b"[1,2]")), 8).await.unwrap();

		// Assert
		assert_eq!(body, Bytes::from_static(b"[1,2]"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_collect_body_over_limit() {
		// Act
		let result = collect_body(Full::new(Bytes::from_static(b"[1,2,3,4]")), 4).await;

		// Assert
		assert!(matches!(result, Err(IpcError::BodyTooLarge { limit: 4 })));
	}

	#[rstest]
	#[tokio::test]
	async fn test_collect_body_read_failure_is_not_size_error() {
		// Act
		let result = collect_body(BrokenBody, 1024).await;

		// Assert
		match result {
			Err(IpcError::BodyRead(message)) => assert!(message.contains("connection reset")),
			other => panic!("expected body read error, got {:?}", other),
		}
	}

	#[rstest]
	fn test_from_settings_keeps_bind_address() {
		// Arrange
		let addr: SocketAddr = "127.0.0.1:45999".parse().unwrap();
		let settings = IpcSettings::new().bind_address(addr).base_path("env");

		// Act
		let server = IpcServer::from_settings(Arc::new(CallRegistry::new()), &settings).unwrap();

		// Assert
		assert_eq!(server.bind_address(), addr);
		assert_eq!(server.router().path_for("GetEnv"), "/env/GetEnv.callback");
	}

	#[rstest]
	fn test_from_settings_rejects_invalid_settings() {
		// Arrange
		let settings = IpcSettings::new().max_body_bytes(0);

		// Act
		let result = IpcServer::from_settings(Arc::new(CallRegistry::new()), &settings);

		// Assert
		assert!(matches!(result, Err(IpcError::InvalidSettings(_))));
	}

	#[rstest]
	#[tokio::test]
	async fn test_run_binds_configured_address() {
		// Arrange: occupy a port, then configure the server to bind it
		let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
		let settings = IpcSettings::new().bind_address(taken.local_addr().unwrap());
		let server = IpcServer::from_settings(Arc::new(CallRegistry::new()), &settings)
			.unwrap()
			.with_logger(Arc::new(MemoryLogger::new()));

		// Act
		let result = server.run().await;

		// Assert
		assert!(matches!(result, Err(IpcError::Io(ref e)) if e.kind() == std::io::ErrorKind::AddrInUse));
	}

	#[rstest]
	#[tokio::test]
	async fn test_shutdown_signal_stops_accepting() {
		// Arrange
		let logger = Arc::new(MemoryLogger::new());
		let router = IpcRouter::new(Arc::new(CallRegistry::new()));
		let server = IpcServer::new(router).with_logger(logger.clone());
		let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
		let (tx, rx) = oneshot::channel::<()>();

		// Act
		let handle = tokio::spawn(server.serve_with_shutdown(listener, async move {
			let _ = rx.await;
		}));
		tx.send(()).unwrap();
		let result = handle.await.unwrap();

		// Assert
		assert!(result.is_ok());
		assert_eq!(logger.events(), vec!["listening", "shutdown"]);
	}
}
