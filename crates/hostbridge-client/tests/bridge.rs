//! Client bridge against an in-process host and a real HTTP server.

use hostbridge_client::{BridgeError, CallOptions, ClientBridge, HttpCallPrimitive, LocalCallPrimitive};
use hostbridge_host::{CallRegistry, IpcRouter, IpcServer, NoopLogger};
use rstest::{fixture, rstest};
use serde_json::{Value, json};
use std::sync::Arc;
use std::thread;

fn registry() -> Arc<CallRegistry> {
	let registry = Arc::new(CallRegistry::new());
	registry.register("add", |a: i64, b: i64| a + b).unwrap();
	registry.register("noop", || ()).unwrap();
	registry
		.register("doWork", || -> Result<(), String> { Err("disk is full".to_string()) })
		.unwrap();
	registry
		.register("split", |s: String| -> (String, usize) { (s.to_uppercase(), s.len()) })
		.unwrap();
	registry.register("get value", || 7).unwrap();
	registry.register("größe", || 8).unwrap();
	registry
		.register("explode", || -> i32 { panic!("boom") })
		.unwrap();
	registry
}

fn runtime() -> tokio::runtime::Runtime {
	tokio::runtime::Builder::new_multi_thread()
		.worker_threads(2)
		.enable_all()
		.build()
		.unwrap()
}

fn http_bridge(runtime: &tokio::runtime::Runtime) -> ClientBridge {
	let listener = runtime
		.block_on(tokio::net::TcpListener::bind("127.0.0.1:0"))
		.unwrap();
	let addr = listener.local_addr().unwrap();
	let server = IpcServer::new(IpcRouter::new(registry())).with_logger(Arc::new(NoopLogger));
	runtime.spawn(server.serve(listener));

	let primitive = HttpCallPrimitive::new(&format!("http://{}/ipc", addr), runtime.handle().clone()).unwrap();
	ClientBridge::new(Arc::new(primitive))
}

#[fixture]
fn local() -> ClientBridge {
	ClientBridge::new(Arc::new(LocalCallPrimitive::new(IpcRouter::new(registry()))))
}

#[rstest]
fn test_add(local: ClientBridge) {
	// Act
	let data = local.call("add", (2, 3)).unwrap();

	// Assert
	assert_eq!(data, vec![json!(5)]);
}

#[rstest]
fn test_noop_resolves_empty(local: ClientBridge) {
	// Act
	let envelope = local.call_raw("noop", (), CallOptions::new()).unwrap();

	// Assert
	assert!(envelope.ok);
	assert!(!envelope.is_error());
	assert_eq!(envelope.data, json!([]));
}

#[rstest]
fn test_unknown_function(local: ClientBridge) {
	// Act
	let result = local.call("ghost", ());

	// Assert
	assert_eq!(result, Err(BridgeError::Host("callback not found".to_string())));
}

#[rstest]
fn test_target_error(local: ClientBridge) {
	// Act
	let result = local.call("doWork", ());

	// Assert
	assert_eq!(result.unwrap_err().host_message(), Some("disk is full"));
}

#[rstest]
fn test_type_mismatch(local: ClientBridge) {
	// Act
	let result = local.call("add", ("x", 3));

	// Assert
	assert_eq!(
		result,
		Err(BridgeError::Host(
			"wrong type for arg 0: expected int, got string".to_string()
		))
	);
}

#[rstest]
fn test_multiple_return_values(local: ClientBridge) {
	// Act
	let data = local.call("split", ("abc",)).unwrap();

	// Assert
	assert_eq!(data, vec![json!("ABC"), json!(3)]);
}

#[rstest]
fn test_concurrent_calls_are_independent(local: ClientBridge) {
	// Act
	let handles: Vec<_> = (0..16i64)
		.map(|i| {
			let bridge = local.clone();
			thread::spawn(move || bridge.call_typed::<i64, _>("add", (i, 100)).unwrap())
		})
		.collect();

	// Assert
	for (i, handle) in handles.into_iter().enumerate() {
		assert_eq!(handle.join().unwrap(), i as i64 + 100);
	}
}

#[rstest]
fn test_over_http() {
	// Arrange
	let runtime = runtime();
	let bridge = http_bridge(&runtime);

	// Act
	let sum: i64 = bridge.call_typed("add", (2, 3)).unwrap();
	let noop = bridge.call("noop", ()).unwrap();
	let missing = bridge.call("ghost", ());

	// Assert
	assert_eq!(sum, 5);
	assert_eq!(noop, Vec::<Value>::new());
	assert_eq!(missing, Err(BridgeError::Host("callback not found".to_string())));
}

#[rstest]
#[case("get value", json!(7))]
#[case("größe", json!(8))]
fn test_names_needing_encoding_resolve_on_both_paths(
	local: ClientBridge,
	#[case] function: &str,
	#[case] expected: Value,
) {
	// Arrange
	let runtime = runtime();
	let http = http_bridge(&runtime);

	// Act
	let over_http = http.call(function, ());
	let in_process = local.call(function, ());

	// Assert
	assert_eq!(over_http, Ok(vec![expected.clone()]));
	assert_eq!(in_process, Ok(vec![expected]));
}

#[rstest]
fn test_panicking_target_matches_on_both_paths(local: ClientBridge) {
	// Arrange
	let runtime = runtime();
	let http = http_bridge(&runtime);
	let expected = Err(BridgeError::Host("host function panicked: boom".to_string()));

	// Act
	let over_http = http.call("explode", ());
	let in_process = local.call("explode", ());

	// Assert
	assert_eq!(over_http, expected);
	assert_eq!(in_process, expected);
}

#[rstest]
fn test_http_connection_refused_is_reported() {
	// Arrange: bind then drop to get a port nobody listens on
	let runtime = tokio::runtime::Builder::new_multi_thread()
		.worker_threads(1)
		.enable_all()
		.build()
		.unwrap();
	let addr = std::net::TcpListener::bind("127.0.0.1:0")
		.unwrap()
		.local_addr()
		.unwrap();
	let primitive = HttpCallPrimitive::new(&format!("http://{}/ipc", addr), runtime.handle().clone()).unwrap();
	let bridge = ClientBridge::new(Arc::new(primitive));

	// Act
	let result = bridge.call("add", (1, 2));

	// Assert
	let message = result.unwrap_err().host_message().map(str::to_string).unwrap();
	assert!(message.starts_with("error fetching"));
}
