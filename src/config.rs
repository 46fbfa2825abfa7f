//! 静态配置：跟踪的 (镜像, 服务) 列表
//! 来源：services.json，启动时读取一次，运行期不可变

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::utils::{Result, UpdockError};

const DEFAULT_TAG: &str = "latest";
const DEFAULT_LOG_FILE: &str = "updock.log";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackedService {
    /// Docker Hub repository, e.g. "acme/app-backend" or "nginx"
    pub image: String,
    /// Compose service name to restart after a pull
    pub service: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_tag")]
    pub tag: String,
    #[serde(default = "default_log_file")]
    pub log_file: String,
    pub services: Vec<TrackedService>,
}

fn default_tag() -> String {
    DEFAULT_TAG.to_string()
}

fn default_log_file() -> String {
    DEFAULT_LOG_FILE.to_string()
}

impl Config {
    pub fn load(path: &str) -> Result<Config> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| UpdockError::Config(format!("{}: {}", path, e)))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|e| UpdockError::Config(format!("{}: {}", path, e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.services.is_empty() {
            return Err(UpdockError::Config("no services configured".to_string()));
        }

        // 一个镜像只能对应一个服务
        let mut seen = HashSet::new();
        for s in &self.services {
            if !seen.insert(s.image.as_str()) {
                return Err(UpdockError::Config(
                    format!("duplicate image entry: {}", s.image)
                ));
            }
        }

        Ok(())
    }

    pub fn find_service(&self, name: &str) -> Option<&TrackedService> {
        self.services.iter().find(|s| s.service == name)
    }
}

/// Docker Hub 的官方镜像挂在 library/ 命名空间下
pub fn hub_repository(image: &str) -> String {
    if image.contains('/') {
        image.to_string()
    } else {
        format!("library/{}", image)
    }
}
