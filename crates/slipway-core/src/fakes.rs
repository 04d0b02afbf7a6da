//! Builder test doubles (testing only)

use std::path::Path;

use async_trait::async_trait;
use slipway_store::layout::{SCRIPT_FILE, STYLE_FILE};

use crate::builder::Builder;
use crate::domain::error::{Result, SlipwayError};

/// Builder that writes fixed artifact bytes instead of running a bundler.
#[derive(Debug, Clone)]
pub struct FixtureBuilder {
    script: Vec<u8>,
    style: Option<Vec<u8>>,
}

impl FixtureBuilder {
    pub fn new(script: impl Into<Vec<u8>>) -> Self {
        FixtureBuilder {
            script: script.into(),
            style: None,
        }
    }

    pub fn with_style(mut self, style: impl Into<Vec<u8>>) -> Self {
        self.style = Some(style.into());
        self
    }
}

#[async_trait]
impl Builder for FixtureBuilder {
    async fn build(&self, out_dir: &Path) -> Result<()> {
        tokio::fs::create_dir_all(out_dir).await?;
        tokio::fs::write(out_dir.join(SCRIPT_FILE), &self.script).await?;
        if let Some(style) = &self.style {
            tokio::fs::write(out_dir.join(STYLE_FILE), style).await?;
        }
        Ok(())
    }
}

/// Builder that always fails, for exercising abort paths.
#[derive(Debug, Clone, Default)]
pub struct FailingBuilder;

#[async_trait]
impl Builder for FailingBuilder {
    async fn build(&self, _out_dir: &Path) -> Result<()> {
        Err(SlipwayError::ExternalTool {
            tool: "builder".to_string(),
            detail: "simulated build failure".to_string(),
        })
    }
}
