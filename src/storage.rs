use crate::errors::LoadError;
use crate::loader::{
    COMPANIES_RESOURCE, DEFAULT_DASHBOARD_RESOURCE, DashboardSource, dashboard_resource,
    parse_companies, parse_dashboard,
};
use crate::models::{Company, DashboardPayload};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Names the data directory is allowed to hand out.
pub fn is_data_resource(name: &str) -> bool {
    if name == COMPANIES_RESOURCE || name == DEFAULT_DASHBOARD_RESOURCE {
        return true;
    }
    name.strip_prefix("company_")
        .and_then(|rest| rest.strip_suffix(".json"))
        .is_some_and(|id| !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()))
}

/// Reads the generated JSON files from a directory. A missing file behaves
/// like a static host answering 404.
#[derive(Debug, Clone)]
pub struct FileSource {
    dir: PathBuf,
}

impl FileSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    async fn read(&self, resource: &str) -> Result<Vec<u8>, LoadError> {
        read_resource(&self.dir, resource).await
    }
}

pub async fn read_resource(dir: &Path, resource: &str) -> Result<Vec<u8>, LoadError> {
    let path = dir.join(resource);
    debug!("reading {}", path.display());
    match fs::read(&path).await {
        Ok(bytes) => Ok(bytes),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(LoadError::Fetch {
            resource: resource.to_string(),
            status: 404,
        }),
        Err(err) => Err(LoadError::Transport {
            resource: resource.to_string(),
            message: err.to_string(),
        }),
    }
}

#[async_trait]
impl DashboardSource for FileSource {
    async fn load_companies(&self) -> Result<Vec<Company>, LoadError> {
        let body = self.read(COMPANIES_RESOURCE).await?;
        parse_companies(COMPANIES_RESOURCE, &body)
    }

    async fn load_dashboard(&self, company_id: Option<i64>) -> Result<DashboardPayload, LoadError> {
        let resource = dashboard_resource(company_id);
        let body = self.read(&resource).await?;
        parse_dashboard(&resource, &body)
    }
}
