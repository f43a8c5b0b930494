#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for integration tests.
//!
//! [`TestApp`] runs the real kernel router and services in-process over the
//! in-memory content store. The upload relay and contact notifier are
//! recording doubles so tests can observe side effects.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, header};
use axum::response::Response;
use http_body_util::BodyExt;
use parking_lot::Mutex;
use serde_json::Value;
use tower::ServiceExt;

use electrolyte_kernel::content::ContactNotifier;
use electrolyte_kernel::file::relay::validate;
use electrolyte_kernel::file::{IncomingFile, RelayError, UploadProfile, UploadRelay};
use electrolyte_kernel::middleware::StaticTokenVerifier;
use electrolyte_kernel::models::{ContactSubmission, StoredImage};
use electrolyte_kernel::routes;
use electrolyte_kernel::state::AppState;
use electrolyte_kernel::store::MemoryContentStore;
use electrolyte_test_utils::{ADMIN_TOKEN, MultipartBody, bearer};

pub const ADMIN_EMAIL: &str = "admin@electrolyte.test";

/// Upload relay that keeps uploads in memory and records purges.
#[derive(Default)]
pub struct RecordingRelay {
    counter: AtomicUsize,
    pub uploads: Mutex<Vec<(String, String)>>,
    pub destroyed: Mutex<Vec<String>>,
    pub fail_destroy: AtomicBool,
}

#[async_trait]
impl UploadRelay for RecordingRelay {
    async fn upload(
        &self,
        profile: &UploadProfile,
        file: IncomingFile,
    ) -> Result<StoredImage, RelayError> {
        validate(profile, &file)?;
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let filename = format!("{}/{n}-{}", profile.folder(), file.filename);
        self.uploads
            .lock()
            .push((profile.name.to_string(), file.filename));
        Ok(StoredImage {
            url: format!("https://cdn.test/{filename}"),
            filename,
        })
    }

    async fn destroy(&self, storage_id: &str) -> anyhow::Result<()> {
        if self.fail_destroy.load(Ordering::SeqCst) {
            anyhow::bail!("storage provider unavailable");
        }
        self.destroyed.lock().push(storage_id.to_string());
        Ok(())
    }
}

/// Contact notifier that records deliveries, or fails on demand.
#[derive(Default)]
pub struct StubNotifier {
    pub fail: AtomicBool,
    pub sent: Mutex<Vec<ContactSubmission>>,
}

#[async_trait]
impl ContactNotifier for StubNotifier {
    async fn notify(&self, submission: &ContactSubmission) -> anyhow::Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("SMTP authentication failed");
        }
        self.sent.lock().push(submission.clone());
        Ok(())
    }
}

/// Test application wrapper using the real kernel routes and services.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub store: Arc<MemoryContentStore>,
    pub relay: Arc<RecordingRelay>,
    pub notifier: Arc<StubNotifier>,
}

impl TestApp {
    /// App with a working notifier.
    pub fn new() -> Self {
        Self::build(true)
    }

    /// App with no mail backend configured.
    pub fn without_email() -> Self {
        Self::build(false)
    }

    fn build(with_email: bool) -> Self {
        let store = Arc::new(MemoryContentStore::new());
        let relay = Arc::new(RecordingRelay::default());
        let notifier = Arc::new(StubNotifier::default());
        let verifier = Arc::new(StaticTokenVerifier::new(ADMIN_TOKEN, ADMIN_EMAIL));

        let state = AppState::from_parts(
            store.clone(),
            verifier,
            relay.clone(),
            with_email.then(|| notifier.clone() as Arc<dyn ContactNotifier>),
        );
        let router = routes::router(state.clone());

        Self {
            router,
            state,
            store,
            relay,
            notifier,
        }
    }

    /// Send a request to the test application.
    pub async fn request(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request")
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.request(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn admin_get(&self, uri: &str) -> Response {
        self.request(
            Request::get(uri)
                .header(header::AUTHORIZATION, bearer(ADMIN_TOKEN))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn admin_delete(&self, uri: &str) -> Response {
        self.request(
            Request::delete(uri)
                .header(header::AUTHORIZATION, bearer(ADMIN_TOKEN))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// Send a JSON body, with the admin credential when `admin` is set.
    pub async fn send_json(&self, method: Method, uri: &str, body: &Value, admin: bool) -> Response {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if admin {
            builder = builder.header(header::AUTHORIZATION, bearer(ADMIN_TOKEN));
        }
        self.request(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    /// Send a multipart form as the admin.
    pub async fn admin_multipart(&self, method: Method, uri: &str, form: MultipartBody) -> Response {
        let (content_type, bytes) = form.finish();
        self.request(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::AUTHORIZATION, bearer(ADMIN_TOKEN))
                .header(header::CONTENT_TYPE, content_type)
                .body(Body::from(bytes))
                .unwrap(),
        )
        .await
    }

    /// Create a blog post through the API and return its JSON.
    pub async fn create_blog(&self, form: MultipartBody) -> Value {
        let response = self.admin_multipart(Method::POST, "/api/blogs", form).await;
        assert_eq!(response.status(), 200, "blog creation failed");
        json_body(response).await
    }

    /// Create a certificate through the API and return its JSON.
    pub async fn create_certificate(&self, form: MultipartBody) -> Value {
        let response = self
            .admin_multipart(Method::POST, "/api/certificates", form)
            .await;
        assert_eq!(response.status(), 200, "certificate creation failed");
        json_body(response).await
    }
}

/// Read a response body as JSON.
pub async fn json_body(response: Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("Response body is not JSON")
}

/// `message` field of an error or acknowledgement body.
pub async fn message(response: Response) -> String {
    json_body(response).await["message"]
        .as_str()
        .unwrap_or_default()
        .to_string()
}
