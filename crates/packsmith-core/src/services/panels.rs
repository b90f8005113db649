//! Panel texture generation and packaging session operations.
//!
//! Single-panel and bulk requests are split into a synchronous `begin_*`
//! step (validation plus the in-progress markers) and a `run_*` step that the
//! caller spawns in the background.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::session_store::SessionStore;
use crate::domain::{
    PackageDimensions, PackageType, PackagingState, PackagingStatus, PanelDimensions,
    PanelTexture,
};
use crate::geometry::{
    self, CIRCLE_SEGMENTS, DielineLayout, PackageMesh, PanelFace, build_mesh,
    generate_dieline_with_segments,
};
use crate::ports::{CoreError, ImageGenerator, ImageRequest, ImageWorkflow};
use crate::prompts::{self, PromptError};

const NO_IMAGE_ERROR: &str =
    "Texture generation returned no image - Gemini API may have failed or returned empty result";

/// Request to texture one panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelGenerateRequest {
    pub panel_id: String,
    pub prompt: String,
    pub package_type: PackageType,
    pub panel_dimensions: PanelDimensions,
    pub package_dimensions: PackageDimensions,
    /// User-supplied style reference (data URL).
    #[serde(default)]
    pub reference_mockup: Option<String>,
}

/// Request to texture several panels from one design brief.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkPanelRequest {
    pub prompt: String,
    pub package_type: PackageType,
    pub package_dimensions: PackageDimensions,
    /// Empty means every panel of the package type.
    #[serde(default)]
    pub panel_ids: Vec<String>,
    /// Per-panel sizes; missing entries are derived from the package.
    #[serde(default)]
    pub panels_info: BTreeMap<String, PanelDimensions>,
    #[serde(default)]
    pub reference_mockup: Option<String>,
}

/// Accepted single-panel job, ready to run.
#[derive(Debug, Clone)]
pub struct PanelJob {
    pub panel_id: String,
    pub user_prompt: String,
    pub panel_dimensions: PanelDimensions,
    pub workflow: ImageWorkflow,
    prompt: String,
    references: Vec<String>,
}

/// Accepted bulk job, ready to run.
#[derive(Debug, Clone)]
pub struct BulkJob {
    pub panel_ids: Vec<String>,
    pub workflow: ImageWorkflow,
    prompt: String,
    package_type: PackageType,
    package_dimensions: PackageDimensions,
    panels: Vec<(String, PanelDimensions)>,
    mockup_reference: Option<String>,
    user_mockup: Option<String>,
}

/// Outcome of a bulk run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkOutcome {
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
}

/// Result of looking up a panel texture.
#[derive(Debug, Clone, PartialEq)]
pub enum TextureLookup {
    Ready(PanelTexture),
    /// No texture yet but one is being generated.
    Pending,
    Missing,
}

/// Build the text prompt for one panel.
///
/// Invalid panel sizes are rejected; invalid package sizes fall back to the
/// simple template; a reference image selects the iteration template.
pub fn structured_prompt(
    panel_id: &str,
    panel: PanelDimensions,
    package: PackageDimensions,
    user_prompt: &str,
    has_reference: bool,
) -> Result<String, PromptError> {
    if !panel.is_valid() {
        return Err(PromptError::InvalidPanelDimensions {
            width: panel.width,
            height: panel.height,
        });
    }
    if !package.is_valid() {
        warn!(
            target: "packsmith.packaging",
            panel_id,
            "Invalid package dimensions, using simple prompt"
        );
        return prompts::build_simple_prompt(panel_id, panel, user_prompt);
    }
    if has_reference {
        prompts::build_iteration_prompt(panel_id, panel, user_prompt)
    } else {
        prompts::build_simple_prompt(panel_id, panel, user_prompt)
    }
}

fn check_panel(package_type: PackageType, panel_id: &str) -> Result<PanelFace, CoreError> {
    let face: PanelFace = panel_id.parse().map_err(CoreError::Validation)?;
    if !geometry::panel_faces(package_type).contains(&face) {
        return Err(CoreError::Validation(format!(
            "Panel '{panel_id}' does not exist on a {package_type}"
        )));
    }
    Ok(face)
}

/// Normalise `dims` for the shape, then require every side to be positive.
fn check_dimensions(
    package_type: PackageType,
    dims: PackageDimensions,
) -> Result<PackageDimensions, CoreError> {
    let dims = dims.normalized_for(package_type);
    if dims.is_valid() {
        Ok(dims)
    } else {
        Err(CoreError::Validation(format!(
            "Invalid package dimensions: {}mm × {}mm × {}mm",
            dims.width, dims.height, dims.depth
        )))
    }
}

/// Packaging session operations and texture generation.
#[derive(Clone)]
pub struct PanelService {
    store: SessionStore,
    images: Arc<dyn ImageGenerator>,
}

impl PanelService {
    pub fn new(store: SessionStore, images: Arc<dyn ImageGenerator>) -> Self {
        Self { store, images }
    }

    pub async fn state(&self) -> Result<PackagingState, CoreError> {
        Ok(self.store.packaging().await?)
    }

    pub async fn status(&self) -> Result<PackagingStatus, CoreError> {
        Ok(self.store.packaging().await?.status())
    }

    /// Validate a single-panel request and mark the panel as generating.
    ///
    /// The workflow is `edit` when the panel already has a texture, whose
    /// image then becomes the reference; otherwise the user mockup is used.
    pub async fn begin_panel(&self, request: PanelGenerateRequest) -> Result<PanelJob, CoreError> {
        prompts::validate_user_prompt(&request.prompt)?;
        check_panel(request.package_type, &request.panel_id)?;
        let package_dimensions = request.package_dimensions.normalized_for(request.package_type);
        let prompt = structured_prompt(
            &request.panel_id,
            request.panel_dimensions,
            package_dimensions,
            &request.prompt,
            request.reference_mockup.is_some(),
        )?;

        let panel_id = request.panel_id.clone();
        let (existing, _) = self
            .store
            .update_packaging(|state| {
                state.set_package(request.package_type, package_dimensions);
                let existing = state.panel_texture(&panel_id).map(|t| t.texture_url.clone());
                state.in_progress = true;
                state.generating_panel = Some(panel_id.clone());
                state.last_error = None;
                existing
            })
            .await?;

        let (workflow, references) = match existing {
            Some(old) => (ImageWorkflow::Edit, vec![old]),
            None => (
                ImageWorkflow::Create,
                request.reference_mockup.into_iter().collect(),
            ),
        };
        info!(
            target: "packsmith.packaging",
            panel_id = %request.panel_id,
            %workflow,
            "Panel generation accepted"
        );

        Ok(PanelJob {
            panel_id: request.panel_id,
            user_prompt: request.prompt,
            panel_dimensions: request.panel_dimensions,
            workflow,
            prompt,
            references,
        })
    }

    /// Generate one panel texture and record the result.
    pub async fn run_panel(&self, job: PanelJob) {
        let request = ImageRequest::new(job.prompt.clone(), job.workflow)
            .with_references(job.references.clone())
            .texture();
        let outcome = self.images.generate_images(&request).await;

        let recorded = match outcome {
            Ok(images) => match images.into_iter().next() {
                Some(url) => {
                    let texture = PanelTexture::new(
                        &job.panel_id,
                        url,
                        &job.user_prompt,
                        Some(job.panel_dimensions),
                    );
                    info!(
                        target: "packsmith.packaging",
                        panel_id = %job.panel_id,
                        "Panel texture generated"
                    );
                    self.store
                        .update_packaging(move |state| {
                            state.set_panel_texture(texture);
                            state.in_progress = false;
                            state.generating_panel = None;
                            state.last_error = None;
                        })
                        .await
                }
                None => {
                    error!(
                        target: "packsmith.packaging",
                        panel_id = %job.panel_id,
                        "Texture generation returned no image"
                    );
                    self.store
                        .update_packaging(|state| state.mark_error(NO_IMAGE_ERROR))
                        .await
                }
            },
            Err(e) => {
                let message = format!("{}: {e}", e.kind());
                error!(
                    target: "packsmith.packaging",
                    panel_id = %job.panel_id,
                    error = %message,
                    "Panel generation failed"
                );
                self.store
                    .update_packaging(move |state| state.mark_error(message))
                    .await
            }
        };
        if let Err(e) = recorded {
            warn!(target: "packsmith.packaging", error = %e, "Could not record panel result");
        }
    }

    /// Validate a bulk request and mark its panels as generating.
    ///
    /// Existing textures stay visible until the run finishes.
    pub async fn begin_bulk(&self, request: BulkPanelRequest) -> Result<BulkJob, CoreError> {
        prompts::validate_user_prompt(&request.prompt)?;
        let package_dimensions =
            check_dimensions(request.package_type, request.package_dimensions)?;

        let panel_ids: Vec<String> = if request.panel_ids.is_empty() {
            geometry::panel_faces(request.package_type)
                .iter()
                .map(|f| f.as_str().to_string())
                .collect()
        } else {
            request.panel_ids.clone()
        };
        let mut panels = Vec::with_capacity(panel_ids.len());
        for id in &panel_ids {
            let face = check_panel(request.package_type, id)?;
            let dims = match request.panels_info.get(id) {
                Some(dims) => *dims,
                None => {
                    geometry::panel_dimensions(request.package_type, &package_dimensions, face)
                        .ok_or_else(|| {
                            CoreError::Validation(format!("No dimensions for panel '{id}'"))
                        })?
                }
            };
            panels.push((id.clone(), dims));
        }

        let ids = panel_ids.clone();
        let (first_existing, _) = self
            .store
            .update_packaging(|state| {
                state.set_package(request.package_type, package_dimensions);
                state.bulk_generation_in_progress = true;
                state.generating_panels = ids.clone();
                state.last_error = None;
                ids.iter()
                    .find_map(|id| state.panel_texture(id))
                    .map(|t| t.texture_url.clone())
            })
            .await?;

        let workflow = if first_existing.is_some() {
            ImageWorkflow::Edit
        } else {
            ImageWorkflow::Create
        };
        let mockup_reference = match workflow {
            ImageWorkflow::Edit => first_existing,
            ImageWorkflow::Create => request.reference_mockup.clone(),
        };
        info!(
            target: "packsmith.packaging",
            panels = panel_ids.len(),
            %workflow,
            "Bulk generation accepted"
        );

        Ok(BulkJob {
            panel_ids,
            workflow,
            prompt: request.prompt,
            package_type: request.package_type,
            package_dimensions,
            panels,
            mockup_reference,
            user_mockup: request.reference_mockup,
        })
    }

    /// Render a mockup, texture every panel against it concurrently, then
    /// store all new textures in one write.
    pub async fn run_bulk(&self, job: BulkJob) -> BulkOutcome {
        info!(
            target: "packsmith.packaging",
            workflow = %job.workflow,
            "Phase 1: generating 3D mockup reference"
        );
        let master = self.render_mockup(&job).await;

        info!(
            target: "packsmith.packaging",
            panels = job.panels.len(),
            "Phase 2: generating panels in parallel"
        );
        let results = join_all(
            job.panels
                .iter()
                .map(|(id, dims)| self.bulk_panel(&job, id, *dims, master.as_deref())),
        )
        .await;

        let mut generated = BTreeMap::new();
        let mut outcome = BulkOutcome {
            succeeded: Vec::new(),
            failed: Vec::new(),
        };
        for ((id, dims), url) in job.panels.iter().zip(results) {
            match url {
                Some(url) => {
                    generated.insert(
                        id.clone(),
                        PanelTexture::new(id, url, &job.prompt, Some(*dims)),
                    );
                    outcome.succeeded.push(id.clone());
                }
                None => outcome.failed.push(id.clone()),
            }
        }

        let total = job.panels.len();
        let error_message = (!outcome.failed.is_empty()).then(|| {
            format!(
                "Generated {}/{total} textures. Failed: {} (old textures retained)",
                outcome.succeeded.len(),
                outcome.failed.join(", ")
            )
        });
        match &error_message {
            Some(msg) => error!(
                target: "packsmith.packaging",
                error = %msg,
                "Bulk generation completed with errors"
            ),
            None => info!(target: "packsmith.packaging", total, "Bulk generation completed"),
        }

        let recorded = self
            .store
            .update_packaging(move |state| {
                if !generated.is_empty() {
                    state.atomic_update_textures(generated, false);
                }
                state.bulk_generation_in_progress = false;
                state.generating_panel = None;
                state.generating_panels.clear();
                state.last_error = error_message;
            })
            .await;
        if let Err(e) = recorded {
            warn!(target: "packsmith.packaging", error = %e, "Could not record bulk result");
        }
        outcome
    }

    async fn render_mockup(&self, job: &BulkJob) -> Option<String> {
        let prompt = match job.workflow {
            ImageWorkflow::Edit => {
                prompts::mockup_edit_prompt(&job.package_dimensions, &job.prompt)
            }
            ImageWorkflow::Create => prompts::mockup_create_prompt(
                job.package_type,
                &job.package_dimensions,
                &job.prompt,
            ),
        };
        let request = ImageRequest::new(prompt, job.workflow)
            .with_references(job.mockup_reference.iter().cloned().collect());
        match self.images.generate_images(&request).await {
            Ok(images) if !images.is_empty() => images.into_iter().next(),
            Ok(_) => {
                error!(
                    target: "packsmith.packaging",
                    "Mockup generation returned no image, using user mockup"
                );
                job.user_mockup.clone()
            }
            Err(e) => {
                error!(
                    target: "packsmith.packaging",
                    error = %e,
                    "Mockup generation failed, using user mockup"
                );
                job.user_mockup.clone()
            }
        }
    }

    async fn bulk_panel(
        &self,
        job: &BulkJob,
        panel_id: &str,
        dims: PanelDimensions,
        master: Option<&str>,
    ) -> Option<String> {
        let marked = self
            .store
            .update_packaging(|state| state.generating_panel = Some(panel_id.to_string()))
            .await;
        if let Err(e) = marked {
            warn!(
                target: "packsmith.packaging",
                panel_id,
                error = %e,
                "Could not mark panel as generating"
            );
        }

        let prompt = match structured_prompt(
            panel_id,
            dims,
            job.package_dimensions,
            &job.prompt,
            master.is_some(),
        ) {
            Ok(prompt) => prompt,
            Err(e) => {
                error!(target: "packsmith.packaging", panel_id, error = %e, "Prompt rejected");
                return None;
            }
        };
        let request = ImageRequest::new(prompt, job.workflow)
            .with_references(master.map(str::to_string).into_iter().collect())
            .texture();
        let url = match self.images.generate_images(&request).await {
            Ok(images) => images.into_iter().next(),
            Err(e) => {
                error!(
                    target: "packsmith.packaging",
                    panel_id,
                    error = %e,
                    "Panel generation failed"
                );
                None
            }
        }?;

        let finished = self
            .store
            .update_packaging(|state| state.generating_panels.retain(|p| p != panel_id))
            .await;
        if let Err(e) = finished {
            warn!(
                target: "packsmith.packaging",
                panel_id,
                error = %e,
                "Could not mark panel as finished"
            );
        }
        Some(url)
    }

    /// Texture of a panel on the active shape.
    pub async fn panel_texture(&self, panel_id: &str) -> Result<TextureLookup, CoreError> {
        let state = self.store.packaging().await?;
        if let Some(texture) = state.panel_texture(panel_id) {
            return Ok(TextureLookup::Ready(texture.clone()));
        }
        let single = state.in_progress && state.generating_panel.as_deref() == Some(panel_id);
        let bulk = state.bulk_generation_in_progress
            && state.generating_panels.iter().any(|p| p == panel_id);
        Ok(if single || bulk {
            TextureLookup::Pending
        } else {
            TextureLookup::Missing
        })
    }

    /// Remove a panel texture. Returns whether one existed.
    pub async fn delete_texture(&self, panel_id: &str) -> Result<bool, CoreError> {
        let (removed, _) = self
            .store
            .update_packaging(|state| state.remove_panel_texture(panel_id))
            .await?;
        Ok(removed)
    }

    /// Switch the active shape and set its dimensions.
    pub async fn update_dimensions(
        &self,
        package_type: PackageType,
        dimensions: PackageDimensions,
    ) -> Result<PackagingState, CoreError> {
        let dimensions = check_dimensions(package_type, dimensions)?;
        let (_, state) = self
            .store
            .update_packaging(|state| state.set_package(package_type, dimensions))
            .await?;
        info!(target: "packsmith.packaging", %package_type, ?dimensions, "Updated package");
        Ok(state)
    }

    /// Reset the active shape to defaults.
    pub async fn reset_current_shape(
        &self,
    ) -> Result<(PackageType, PackageDimensions), CoreError> {
        let (dims, state) = self
            .store
            .update_packaging(PackagingState::reset_current_shape)
            .await?;
        info!(
            target: "packsmith.packaging",
            package_type = %state.current_package_type,
            "Reset shape to defaults"
        );
        Ok((state.current_package_type, dims))
    }

    pub async fn clear(&self) -> Result<PackagingState, CoreError> {
        let state = self.store.clear_packaging().await?;
        info!(target: "packsmith.packaging", "Cleared packaging state");
        Ok(state)
    }

    /// Dieline of the active shape.
    pub async fn dieline(&self, segments: Option<usize>) -> Result<DielineLayout, CoreError> {
        let state = self.store.packaging().await?;
        Ok(generate_dieline_with_segments(
            state.current_package_type,
            &state.active_shape().dimensions,
            segments.unwrap_or(CIRCLE_SEGMENTS),
        )?)
    }

    /// 3D panel mesh of the active shape.
    pub async fn mesh(&self, segments: Option<usize>) -> Result<PackageMesh, CoreError> {
        let state = self.store.packaging().await?;
        Ok(build_mesh(
            state.current_package_type,
            &state.active_shape().dimensions,
            segments.unwrap_or(CIRCLE_SEGMENTS),
        )?)
    }
}
