//! Wiring from configuration to a ready controller

use crate::config::UploaderConfig;
use crate::controller::{RunOptions, StepController};
use crate::error::Result;
use crate::ingest::AutoReader;
use crate::profile::{load_profile, SchemaProfile};
use crate::staging::StagingArea;
use crate::warehouse::{DuckDbWarehouse, Warehouse};
use std::sync::Arc;

/// Opened warehouse and staging area for one configuration
#[derive(Clone)]
pub struct Pipeline {
    config: UploaderConfig,
    warehouse: Arc<DuckDbWarehouse>,
    staging: StagingArea,
}

impl Pipeline {
    /// Open the configured warehouse and staging area
    pub fn open(config: UploaderConfig) -> Result<Self> {
        let staging = StagingArea::parse(&config.staging.url, config.credentials.as_deref())?;
        let warehouse = DuckDbWarehouse::open(&config.warehouse.path)?;

        if staging.is_cloud() {
            warehouse.configure_cloud_storage()?;
        }

        tracing::debug!(
            warehouse = %warehouse.location(),
            staging = %staging.uri(&config.staging.prefix),
            "Pipeline opened"
        );

        Ok(Self::from_parts(config, Arc::new(warehouse), staging))
    }

    /// Assemble from already-opened parts
    pub fn from_parts(
        config: UploaderConfig,
        warehouse: Arc<DuckDbWarehouse>,
        staging: StagingArea,
    ) -> Self {
        Self {
            config,
            warehouse,
            staging,
        }
    }

    pub fn config(&self) -> &UploaderConfig {
        &self.config
    }

    pub fn warehouse(&self) -> &DuckDbWarehouse {
        &self.warehouse
    }

    /// Load a profile and qualify its target table with the configured dataset
    pub fn resolve_profile(&self, name: &str) -> Result<SchemaProfile> {
        resolve_profile(&self.config, name)
    }

    /// Controller for a session's profile and options
    pub fn controller(&self, profile: SchemaProfile, options: RunOptions) -> Result<StepController> {
        let controller = StepController::new(
            profile,
            options,
            Arc::new(AutoReader::new()),
            Arc::clone(&self.warehouse) as Arc<dyn Warehouse>,
            self.staging.clone(),
            self.config.staging.prefix.clone(),
        )?;
        Ok(controller.with_parquet_config(self.config.parquet.clone()))
    }
}

/// Load a profile by name or path, qualified against `config`
pub fn resolve_profile(config: &UploaderConfig, name: &str) -> Result<SchemaProfile> {
    let mut profile = load_profile(name)?;
    profile.target_table = config.qualify_table(&profile.target_table);
    Ok(profile)
}
