//! End-to-end tests over a real socket: CRUD through HTTP, then shutdown.
//!
//! # Design
//! Each test starts `TodoServer` on a random port in its own thread and
//! runtime, drives it with blocking ureq calls, and triggers shutdown through
//! a oneshot channel standing in for the interrupt signal. Dropping the
//! runtime at the end of the thread tears down anything the drain abandoned.

use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use todo_core::{
    DocumentStore, Envelope, InMemoryStore, NewTodo, StoreError, Todo, TodoId, TodoPatch,
    TodoRecord,
};
use todo_server::{app, AppState, DrainOutcome, LifecycleState, ServerError, TodoServer};
use tokio::sync::{oneshot, watch};

struct Running {
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    state: watch::Receiver<LifecycleState>,
    finished: JoinHandle<Result<DrainOutcome, ServerError>>,
}

impl Running {
    fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    fn stop(self) -> (Result<DrainOutcome, ServerError>, LifecycleState) {
        let _ = self.shutdown.send(());
        let outcome = self.finished.join().unwrap();
        let state = *self.state.borrow();
        (outcome, state)
    }
}

fn start(store: Arc<dyn DocumentStore>, store_timeout: Duration, grace: Duration) -> Running {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    std_listener.set_nonblocking(true).unwrap();

    let (shutdown, shutdown_rx) = oneshot::channel::<()>();
    let (ready_tx, ready) = std::sync::mpsc::channel();

    let finished = std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async move {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            let router = app(AppState::new(store, store_timeout));
            let server = TodoServer::from_listener(listener, router, grace);
            let addr = server.local_addr().unwrap();
            ready_tx.send((addr, server.subscribe())).unwrap();
            server
                .run_until(async move {
                    let _ = shutdown_rx.await;
                })
                .await
        })
    });

    let (addr, state) = ready.recv().unwrap();
    Running {
        addr,
        shutdown,
        state,
        finished,
    }
}

fn agent() -> ureq::Agent {
    ureq::Agent::config_builder()
        .http_status_as_error(false)
        .timeout_global(Some(Duration::from_secs(10)))
        .build()
        .new_agent()
}

/// Returns the status and body, treating 4xx/5xx as data.
fn send(method: &str, url: &str, body: Option<&str>) -> (u16, String) {
    let agent = agent();
    let mut response = match (method, body) {
        ("GET", _) => agent.get(url).call(),
        ("DELETE", _) => agent.delete(url).call(),
        ("POST", Some(body)) => agent
            .post(url)
            .content_type("application/json")
            .send(body.as_bytes()),
        ("PUT", Some(body)) => agent
            .put(url)
            .content_type("application/json")
            .send(body.as_bytes()),
        (other, _) => panic!("unsupported request: {other}"),
    }
    .expect("HTTP transport error");

    let status = response.status().as_u16();
    let body = response.body_mut().read_to_string().unwrap_or_default();
    (status, body)
}

fn list(server: &Running) -> Vec<Todo> {
    let (status, body) = send("GET", &server.url("/todo/"), None);
    assert_eq!(status, 200);
    let envelope: Envelope<Vec<Todo>> = serde_json::from_str(&body).unwrap();
    envelope.data.unwrap()
}

/// Holds every `find_all` for `delay` before answering.
struct SlowListStore {
    inner: InMemoryStore,
    delay: Duration,
}

#[async_trait]
impl DocumentStore for SlowListStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn find_all(&self) -> Result<Vec<TodoRecord>, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.find_all().await
    }

    async fn insert(&self, todo: NewTodo) -> Result<TodoId, StoreError> {
        self.inner.insert(todo).await
    }

    async fn update_fields(&self, id: TodoId, patch: TodoPatch) -> Result<bool, StoreError> {
        self.inner.update_fields(id, patch).await
    }

    async fn delete_by_id(&self, id: TodoId) -> Result<bool, StoreError> {
        self.inner.delete_by_id(id).await
    }
}

#[test]
fn crud_lifecycle_over_http() {
    let server = start(
        Arc::new(InMemoryStore::new()),
        Duration::from_secs(5),
        Duration::from_secs(5),
    );

    // Step 1: empty list.
    assert!(list(&server).is_empty(), "expected empty list");
    assert_eq!(*server.state.borrow(), LifecycleState::Serving);

    // Step 2: create.
    let (status, body) = send("POST", &server.url("/todo/"), Some(r#"{"title":"buy milk"}"#));
    assert_eq!(status, 201);
    let created: Envelope = serde_json::from_str(&body).unwrap();
    let id = created.todo_id.unwrap();

    // Step 3: list shows it.
    let todos = list(&server);
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0].id, id);
    assert_eq!(todos[0].title, "buy milk");
    assert!(!todos[0].completed);

    // Step 4: update.
    let (status, _) = send(
        "PUT",
        &server.url(&format!("/todo/{id}")),
        Some(r#"{"title":"buy milk","completed":true}"#),
    );
    assert_eq!(status, 200);
    assert!(list(&server)[0].completed);

    // Step 5: invalid vs unknown ids.
    let (status, _) = send("DELETE", &server.url("/todo/not-an-id"), None);
    assert_eq!(status, 400);
    let (status, _) = send(
        "DELETE",
        &server.url(&format!("/todo/{}", TodoId::generate())),
        None,
    );
    assert_eq!(status, 404);

    // Step 6: delete twice.
    let (status, _) = send("DELETE", &server.url(&format!("/todo/{id}")), None);
    assert_eq!(status, 200);
    let (status, _) = send("DELETE", &server.url(&format!("/todo/{id}")), None);
    assert_eq!(status, 404);
    assert!(list(&server).is_empty(), "expected empty list after delete");

    // Step 7: shut down.
    let addr = server.addr;
    let (outcome, state) = server.stop();
    assert_eq!(outcome.unwrap(), DrainOutcome::Completed);
    assert_eq!(state, LifecycleState::Stopped);
    assert!(std::net::TcpStream::connect(addr).is_err(), "listener should be closed");
}

#[test]
fn drain_lets_in_flight_request_finish() {
    let store = SlowListStore {
        inner: InMemoryStore::new(),
        delay: Duration::from_millis(500),
    };
    let server = start(Arc::new(store), Duration::from_secs(5), Duration::from_secs(5));

    let url = server.url("/todo/");
    let in_flight = std::thread::spawn(move || send("GET", &url, None));
    std::thread::sleep(Duration::from_millis(150));

    let (outcome, state) = server.stop();
    assert_eq!(outcome.unwrap(), DrainOutcome::Completed);
    assert_eq!(state, LifecycleState::Stopped);

    let (status, body) = in_flight.join().unwrap();
    assert_eq!(status, 200);
    let envelope: Envelope<Vec<Todo>> = serde_json::from_str(&body).unwrap();
    assert_eq!(envelope.data, Some(Vec::new()));
}

#[test]
fn grace_window_bounds_the_drain() {
    let store = SlowListStore {
        inner: InMemoryStore::new(),
        delay: Duration::from_secs(30),
    };
    let grace = Duration::from_millis(200);
    let server = start(Arc::new(store), Duration::from_secs(60), grace);

    let url = server.url("/todo/");
    // The response never arrives; the connection is dropped with the runtime.
    let _abandoned = std::thread::spawn(move || {
        let agent = agent();
        let _ = agent.get(&url).call();
    });
    std::thread::sleep(Duration::from_millis(150));

    let started = Instant::now();
    let (outcome, state) = server.stop();
    assert_eq!(outcome.unwrap(), DrainOutcome::GraceElapsed);
    assert_eq!(state, LifecycleState::Stopped);
    assert!(
        started.elapsed() < Duration::from_secs(5),
        "drain took {:?}",
        started.elapsed()
    );
}
