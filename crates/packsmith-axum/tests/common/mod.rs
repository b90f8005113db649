//! Fakes and helpers shared by route tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use packsmith_assets::AssetCache;
use packsmith_axum::{AxumContext, CorsConfig, create_router};
use packsmith_core::data_url;
use packsmith_core::{
    BlobSource, ChatGenerator, ChatRequest, FetchError, GenerationError, ImageGenerator,
    ImageRequest, ModelGenerator, ModelProgress, ModelRequest, ProgressSink, TrellisArtifacts,
};
use packsmith_db::{CoreFactory, setup_test_database};

pub const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\nfake";
pub const GLB_MAGIC: &[u8] = b"glTF\x02\0\0\0fake";
pub const MODEL_URL: &str = "https://cdn.test/model.glb";

/// Returns one PNG per requested view after `delay`.
pub struct FakeImages {
    pub delay: Duration,
}

#[async_trait]
impl ImageGenerator for FakeImages {
    async fn generate_images(
        &self,
        request: &ImageRequest,
    ) -> Result<Vec<String>, GenerationError> {
        tokio::time::sleep(self.delay).await;
        Ok((0..request.image_count)
            .map(|_| data_url::encode("image/png", PNG_MAGIC))
            .collect())
    }

    async fn edit_image(
        &self,
        _original: &str,
        _mask: &str,
        prompt: &str,
    ) -> Result<Option<String>, GenerationError> {
        if prompt.contains("nothing") {
            return Ok(None);
        }
        Ok(Some(data_url::encode("image/png", PNG_MAGIC)))
    }
}

pub struct EchoChat;

#[async_trait]
impl ChatGenerator for EchoChat {
    async fn generate(&self, request: &ChatRequest) -> Result<Value, GenerationError> {
        Ok(json!({ "text": request.prompt, "task": request.task.as_str() }))
    }
}

pub struct FakeModels;

#[async_trait]
impl ModelGenerator for FakeModels {
    async fn generate_3d(
        &self,
        _request: &ModelRequest,
        progress: &dyn ProgressSink,
    ) -> Result<TrellisArtifacts, GenerationError> {
        progress
            .report(ModelProgress {
                stage: "IN_PROGRESS".into(),
                progress: 60,
                message: "working".into(),
            })
            .await;
        Ok(TrellisArtifacts {
            model_file: Some(MODEL_URL.into()),
            ..TrellisArtifacts::default()
        })
    }
}

/// Serves GLB bytes for model URLs and PNG bytes for anything else.
pub struct FakeSource;

#[async_trait]
impl BlobSource for FakeSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        if url.ends_with(".glb") {
            Ok(GLB_MAGIC.to_vec())
        } else {
            Ok(PNG_MAGIC.to_vec())
        }
    }
}

pub struct TestApp {
    pub router: Router,
    _cache_dir: tempfile::TempDir,
}

pub async fn test_app(image_delay: Duration) -> TestApp {
    let pool = setup_test_database().await.unwrap();
    let core = CoreFactory::build_app_core(
        pool,
        Arc::new(FakeImages { delay: image_delay }),
        Arc::new(EchoChat),
        Arc::new(FakeModels),
    );
    let cache_dir = tempfile::tempdir().unwrap();
    let assets = AssetCache::new(cache_dir.path(), Arc::new(FakeSource));
    let ctx = AxumContext::new(Arc::new(core), Arc::new(assets));
    TestApp {
        router: create_router(ctx, &CorsConfig::AllowAll),
        _cache_dir: cache_dir,
    }
}

pub struct Reply {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl Reply {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

impl TestApp {
    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> Reply {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();
        Reply {
            status,
            content_type,
            body,
        }
    }

    pub async fn get(&self, uri: &str) -> Reply {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> Reply {
        self.send(Method::POST, uri, Some(body)).await
    }

    /// Poll `uri` until `done` holds for its JSON body.
    pub async fn wait_for(&self, uri: &str, done: impl Fn(&Value) -> bool) -> Value {
        for _ in 0..200 {
            let reply = self.get(uri).await;
            if reply.status == StatusCode::OK {
                let body = reply.json();
                if done(&body) {
                    return body;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("timed out waiting on {uri}");
    }
}
