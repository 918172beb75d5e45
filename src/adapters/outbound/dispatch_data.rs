use crate::common::{DomainError, DomainResult};
use crate::domains::dispatch::aggregate::types::Load;
use crate::domains::dispatch::ports::{DispatchDataSource, FuelStation};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub struct FilesystemDataSource {
    base: PathBuf,
}

impl FilesystemDataSource {
    pub fn new(base: Option<PathBuf>) -> Self {
        let base = base.unwrap_or_else(|| {
            if let Ok(v) = env::var("DISPATCH_DATA_DIR") {
                PathBuf::from(v)
            } else {
                let cwd_default = Path::new("resources/dispatch");
                if cwd_default.exists() {
                    cwd_default.to_path_buf()
                } else {
                    PathBuf::from("/usr/share/linehaul-app/dispatch")
                }
            }
        });
        Self { base }
    }

    fn read_json<T: serde::de::DeserializeOwned>(&self, folder: &str, name: &str) -> DomainResult<T> {
        let mut p = self.base.clone();
        p.push(folder);
        p.push(name);
        let raw = fs::read_to_string(&p)
            .map_err(|e| DomainError::InfrastructureError(format!("{}: {}", p.display(), e)))?;
        serde_json::from_str(&raw).map_err(DomainError::SerializationError)
    }
}

impl DispatchDataSource for FilesystemDataSource {
    fn load_loads(&self, name: &str) -> DomainResult<Vec<Load>> {
        self.read_json("loads", name)
    }

    fn load_fuel_stations(&self, name: &str) -> DomainResult<Vec<FuelStation>> {
        self.read_json("stations", name)
    }
}
