//! Trellis jobs over the fal.ai queue: submit, poll at a fixed interval,
//! fetch the result.

use serde_json::{Value, json};
use tokio::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

use packsmith_core::TrellisArtifacts;
use packsmith_core::ports::{ModelProgress, ModelRequest, ProgressSink};

use crate::config::{FalConfig, TRELLIS_APP, TRELLIS_MULTI_APP};
use crate::error::{FalError, FalResult};
use crate::http::{HttpBackend, ReqwestBackend};
use crate::queue::{
    QUEUED_PROGRESS, QueueState, StatusUpdate, SubmitResponse, model_url, running_progress,
};

pub type DefaultFalClient = FalClient<ReqwestBackend>;

/// fal.ai queue client, generic over its HTTP backend.
pub struct FalClient<B: HttpBackend> {
    pub(crate) backend: B,
    pub(crate) config: FalConfig,
}

impl DefaultFalClient {
    /// Fails with [`FalError::NotConfigured`] when no key is set.
    pub fn new(config: FalConfig) -> FalResult<Self> {
        let backend = ReqwestBackend::new(&config)?;
        info!(target: "packsmith.fal", queue = %config.queue_base, "fal.ai client initialised");
        Ok(Self { backend, config })
    }
}

/// App and argument payload for a request.
pub fn build_arguments(request: &ModelRequest) -> FalResult<(&'static str, Value)> {
    let first = request.images.first().ok_or(FalError::NoImages)?;
    let p = &request.params;
    let mut args = json!({
        "seed": request.seed,
        "texture_size": p.texture_size,
        "mesh_simplify": p.mesh_simplify,
        "ss_sampling_steps": p.ss_sampling_steps,
        "ss_guidance_strength": p.ss_guidance_strength,
        "slat_sampling_steps": p.slat_sampling_steps,
        "slat_guidance_strength": p.slat_guidance_strength,
    });
    if request.use_multi_image && request.images.len() > 1 {
        args["image_urls"] = json!(request.images);
        args["multiimage_algo"] = json!(request.multiimage_algo.as_str());
        Ok((TRELLIS_MULTI_APP, args))
    } else {
        if request.images.len() > 1 {
            warn!(
                target: "packsmith.fal",
                images = request.images.len(),
                "Multiple images provided, using only the first one"
            );
        }
        args["image_url"] = json!(first);
        Ok((TRELLIS_APP, args))
    }
}

/// Owner/name part of an app id; queue request URLs live under it.
fn app_root(app: &str) -> &str {
    let mut slashes = app.match_indices('/').map(|(i, _)| i);
    match (slashes.next(), slashes.next()) {
        (Some(_), Some(second)) => &app[..second],
        _ => app,
    }
}

impl<B: HttpBackend> FalClient<B> {
    #[cfg(test)]
    pub(crate) const fn with_backend(config: FalConfig, backend: B) -> Self {
        Self { backend, config }
    }

    fn queue_url(&self, path: &str) -> FalResult<Url> {
        let base = self.config.queue_base.trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    /// Status and result URLs, from the submit reply or built from the id.
    fn job_urls(&self, app: &str, submitted: &SubmitResponse) -> FalResult<(Url, Url)> {
        let root = app_root(app);
        let id = &submitted.request_id;
        let mut status = match &submitted.status_url {
            Some(url) => Url::parse(url)?,
            None => self.queue_url(&format!("{root}/requests/{id}/status"))?,
        };
        status.query_pairs_mut().append_pair("logs", "1");
        let response = match &submitted.response_url {
            Some(url) => Url::parse(url)?,
            None => self.queue_url(&format!("{root}/requests/{id}"))?,
        };
        Ok((status, response))
    }

    /// Run one Trellis job to completion.
    pub async fn run(
        &self,
        request: &ModelRequest,
        progress: &dyn ProgressSink,
    ) -> FalResult<TrellisArtifacts> {
        let (app, args) = build_arguments(request)?;
        info!(
            target: "packsmith.fal",
            app,
            seed = request.seed,
            texture_size = request.params.texture_size,
            images = request.images.len(),
            "Submitting Trellis job"
        );

        let submitted: SubmitResponse =
            serde_json::from_value(self.backend.post_json(&self.queue_url(app)?, &args).await?)?;
        info!(target: "packsmith.fal", request_id = %submitted.request_id, "Trellis job queued");
        let (status_url, response_url) = self.job_urls(app, &submitted)?;

        self.poll_until_complete(&status_url, progress).await?;

        let result = self.backend.get_json(&response_url).await?;
        let model_file =
            model_url(&result).ok_or_else(|| FalError::MissingOutput(result.to_string()))?;
        info!(target: "packsmith.fal", model_file = %model_file, "Trellis job completed");
        Ok(TrellisArtifacts {
            model_file: Some(model_file),
            ..TrellisArtifacts::default()
        })
    }

    async fn poll_until_complete(
        &self,
        status_url: &Url,
        progress: &dyn ProgressSink,
    ) -> FalResult<()> {
        let started = Instant::now();
        let mut running_polls: u32 = 0;
        loop {
            let update = StatusUpdate::parse(self.backend.get_json(status_url).await?)?;
            for line in &update.logs {
                info!(target: "packsmith.fal", "  Progress: {line}");
            }
            let stage = update.stage().to_string();
            let (pct, message) = match &update.state {
                QueueState::Completed => return Ok(()),
                QueueState::InQueue { position } => (
                    QUEUED_PROGRESS,
                    position.map_or_else(
                        || "Waiting in Trellis queue…".to_string(),
                        |p| format!("Waiting in Trellis queue (position {p})…"),
                    ),
                ),
                QueueState::InProgress => {
                    let pct = running_progress(running_polls);
                    running_polls = running_polls.saturating_add(1);
                    let message = update
                        .logs
                        .last()
                        .cloned()
                        .unwrap_or_else(|| "Generating 3D model…".to_string());
                    (pct, message)
                }
                QueueState::Other(state) => return Err(FalError::JobFailed(state.clone())),
            };
            debug!(target: "packsmith.fal", stage = %stage, progress = pct, "Queue update");
            progress
                .report(ModelProgress {
                    stage,
                    progress: pct,
                    message,
                })
                .await;

            if started.elapsed() >= self.config.timeout {
                return Err(FalError::Timeout(self.config.timeout));
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::FakeBackend;
    use async_trait::async_trait;
    use packsmith_core::ports::MultiImageAlgo;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(String, u8)>>);

    #[async_trait]
    impl ProgressSink for Recorder {
        async fn report(&self, progress: ModelProgress) {
            self.0.lock().unwrap().push((progress.stage, progress.progress));
        }
    }

    fn config() -> FalConfig {
        FalConfig::new()
            .with_api_key("k")
            .with_queue_base("https://queue.test")
            .with_poll_interval(Duration::ZERO)
    }

    fn submitted() -> Value {
        json!({
            "request_id": "req-1",
            "status_url": "https://queue.test/fal-ai/trellis/requests/req-1/status",
            "response_url": "https://queue.test/fal-ai/trellis/requests/req-1"
        })
    }

    #[test]
    fn single_and_multi_arguments() {
        let single = ModelRequest::from_images(vec!["data:a".into(), "data:b".into()]);
        let (app, args) = build_arguments(&single).unwrap();
        assert_eq!(app, "fal-ai/trellis");
        assert_eq!(args["image_url"], "data:a");
        assert_eq!(args["texture_size"], 2048);
        assert!(args.get("image_urls").is_none());

        let multi = ModelRequest {
            use_multi_image: true,
            multiimage_algo: MultiImageAlgo::Multidiffusion,
            ..single
        };
        let (app, args) = build_arguments(&multi).unwrap();
        assert_eq!(app, "fal-ai/trellis/multi");
        assert_eq!(args["image_urls"].as_array().unwrap().len(), 2);
        assert_eq!(args["multiimage_algo"], "multidiffusion");

        assert!(matches!(
            build_arguments(&ModelRequest::from_images(vec![])),
            Err(FalError::NoImages)
        ));
    }

    #[test]
    fn app_root_strips_subpath() {
        assert_eq!(app_root("fal-ai/trellis/multi"), "fal-ai/trellis");
        assert_eq!(app_root("fal-ai/trellis"), "fal-ai/trellis");
    }

    #[tokio::test]
    async fn polls_through_queue_states() {
        let backend = FakeBackend::new()
            .reply("queue.test/fal-ai/trellis", submitted())
            .reply("/status", json!({"status": "IN_QUEUE", "queue_position": 1}))
            .reply("/status", json!({"status": "IN_PROGRESS", "logs": [{"message": "step 1"}]}))
            .reply("/status", json!({"status": "IN_PROGRESS", "logs": []}))
            .reply("/status", json!({"status": "COMPLETED"}))
            .reply("requests/req-1", json!({"model_mesh": {"url": "https://fal.media/m.glb"}}));
        let client = FalClient::with_backend(config(), backend);
        let recorder = Recorder::default();

        let out = client
            .run(&ModelRequest::from_images(vec!["data:a".into()]), &recorder)
            .await
            .unwrap();
        assert_eq!(out.model_file.as_deref(), Some("https://fal.media/m.glb"));

        let seen = recorder.0.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![
                ("IN_QUEUE".to_string(), 50),
                ("IN_PROGRESS".to_string(), 60),
                ("IN_PROGRESS".to_string(), 63)
            ]
        );
        let calls = client.backend.calls.lock().unwrap();
        assert!(calls[1].0.ends_with("/status?logs=1"));
        assert!(calls[0].1.as_ref().unwrap().get("image_url").is_some());
    }

    #[tokio::test]
    async fn builds_urls_when_reply_omits_them() {
        let backend = FakeBackend::new()
            .reply("fal-ai/trellis/multi", json!({"request_id": "r9"}))
            .reply("fal-ai/trellis/requests/r9/status", json!({"status": "COMPLETED"}))
            .reply("fal-ai/trellis/requests/r9", json!({"model_mesh": "https://fal.media/x.glb"}));
        let client = FalClient::with_backend(config(), backend);
        let mut request = ModelRequest::from_images(vec!["a".into(), "b".into()]);
        request.use_multi_image = true;
        let out = client.run(&request, &packsmith_core::ports::NoopProgress).await.unwrap();
        assert_eq!(out.model_file.as_deref(), Some("https://fal.media/x.glb"));
    }

    #[tokio::test]
    async fn missing_mesh_and_timeout_are_errors() {
        let backend = FakeBackend::new()
            .reply("queue.test/fal-ai/trellis", submitted())
            .reply("/status", json!({"status": "COMPLETED"}))
            .reply("requests/req-1", json!({"timings": {}}));
        let client = FalClient::with_backend(config(), backend);
        let err = client
            .run(&ModelRequest::from_images(vec!["a".into()]), &packsmith_core::ports::NoopProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, FalError::MissingOutput(_)));

        let backend = FakeBackend::new()
            .reply("queue.test/fal-ai/trellis", submitted())
            .reply("/status", json!({"status": "IN_QUEUE"}));
        let client = FalClient::with_backend(config().with_timeout(Duration::ZERO), backend);
        let err = client
            .run(&ModelRequest::from_images(vec!["a".into()]), &packsmith_core::ports::NoopProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, FalError::Timeout(_)));
    }
}
