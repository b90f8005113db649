//! Core services - orchestration between ports and domain logic.
//!
//! Services never know which adapters sit behind the ports. Long-running
//! generation is split into a validating `start_*`/`begin_*` call and a
//! `run_*` future the adapter spawns.

mod app_core;
mod artifacts;
mod panels;
mod product_pipeline;
mod session_store;
mod trellis;

pub use app_core::{AppCore, Ports};
pub use artifacts::ArtifactWriter;
pub use panels::{
    BulkJob, BulkOutcome, BulkPanelRequest, PanelGenerateRequest, PanelJob, PanelService,
    TextureLookup, structured_prompt,
};
pub use product_pipeline::{
    CREATE_PROMPT_MIN, EDIT_PROMPT_MIN, MAX_IMAGE_COUNT, PROMPT_MAX, ProductPipeline,
    iteration_artifacts,
};
pub use session_store::SessionStore;
pub use trellis::{TrellisGenerateRequest, TrellisJobStatus, TrellisQuality, TrellisService};
