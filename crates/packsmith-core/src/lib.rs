//! Core of packsmith: session domain, package geometry, prompt building,
//! generator ports and the services that orchestrate them.
//!
//! Adapters (SQLite storage, Gemini, fal.ai, HTTP) live in sibling crates and
//! plug in through the traits in [`ports`].

pub mod config;
pub mod data_url;
pub mod domain;
pub mod geometry;
pub mod ports;
pub mod prompts;
pub mod services;

pub use config::{AppConfig, ConfigError, GeminiSettings, TrellisSettings};
pub use domain::{
    IterationKind, PackageDimensions, PackageType, PackagingState, PackagingStatus,
    PanelDimensions, PanelTexture, ProductIteration, ProductMode, ProductState, ProductStatus,
    ShapeState, TrellisArtifacts,
};
pub use geometry::{
    DielineLayout, GeometryError, PackageMesh, PanelFace, build_mesh, generate_dieline,
};
pub use ports::{
    BlobSource, ChatGenerator, ChatRequest, ChatTask, CoreError, FetchError, GenerationError,
    ImageGenerator, ImageRequest, ImageWorkflow, ModelGenerator, ModelProgress, ModelRequest,
    ProgressSink, RepositoryError, StateRepository,
};
pub use prompts::PromptError;
pub use services::{
    AppCore, ArtifactWriter, BulkPanelRequest, PanelGenerateRequest, PanelService, Ports,
    ProductPipeline, SessionStore, TextureLookup, TrellisGenerateRequest, TrellisJobStatus,
    TrellisService,
};
