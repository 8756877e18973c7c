//! Artifact builders and a memoizing wrapper

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::{error::Result, models::BuildStep};

/// Produces the compiled and packaged outputs stacks depend on
#[async_trait]
pub trait ArtifactBuilder: Send + Sync {
    /// Run a single build step
    async fn build(&self, step: BuildStep) -> Result<()>;

    /// Build and push the web image, returning the image URI
    async fn publish_frontend_image(&self, registry_uri: &str, tag: &str) -> Result<String>;

    async fn build_api(&self) -> Result<()> {
        self.build(BuildStep::Api).await
    }

    async fn build_lambda(&self) -> Result<()> {
        self.build(BuildStep::Lambda).await
    }

    async fn embed_api_spec(&self) -> Result<()> {
        self.build(BuildStep::ApiSpec).await
    }

    async fn generate_dashboards(&self) -> Result<()> {
        self.build(BuildStep::Dashboards).await
    }
}

/// Runs each build step at most once per process.
///
/// Concurrent callers asking for the same step wait on the first one. A failed
/// step is not cached, so a later caller retries it.
pub struct MemoizedBuilder {
    inner: Arc<dyn ArtifactBuilder>,
    steps: [OnceCell<()>; BuildStep::ALL.len()],
    image: OnceCell<String>,
}

impl MemoizedBuilder {
    pub fn new(inner: Arc<dyn ArtifactBuilder>) -> Self {
        Self {
            inner,
            steps: Default::default(),
            image: OnceCell::new(),
        }
    }

    /// Whether `step` already completed in this process
    pub fn is_built(&self, step: BuildStep) -> bool {
        self.steps[step.index()].initialized()
    }
}

#[async_trait]
impl ArtifactBuilder for MemoizedBuilder {
    async fn build(&self, step: BuildStep) -> Result<()> {
        let cell = &self.steps[step.index()];
        if cell.initialized() {
            debug!(step = %step, "already built");
            return Ok(());
        }
        cell.get_or_try_init(|| async {
            info!(step = %step, "building");
            self.inner.build(step).await
        })
        .await?;
        Ok(())
    }

    async fn publish_frontend_image(&self, registry_uri: &str, tag: &str) -> Result<String> {
        let image = self
            .image
            .get_or_try_init(|| async {
                info!(registry = %registry_uri, "publishing web image");
                self.inner.publish_frontend_image(registry_uri, tag).await
            })
            .await?;
        Ok(image.clone())
    }
}
