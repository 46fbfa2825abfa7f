//! Docker Hub 镜像摘要查询
//! 来源：https://hub.docker.com/v2/repositories/<repo>/tags/<tag>

use std::time::Duration;

use crate::config::hub_repository;
use crate::utils::{Result, UpdockError};

const HUB_BASE_URL: &str = "https://hub.docker.com/v2/repositories";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Read-only digest lookup against the registry's tag-metadata endpoint.
///
/// Errors are classified for the orchestrator: `Http` means the registry
/// was unreachable or answered abnormally (retry next cycle), `Parse`
/// means the response shape was unexpected.
pub trait Registry {
    fn digest(&self, image: &str, tag: &str) -> Result<String>;
}

pub struct HubRegistry {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HubRegistry {
    pub fn new() -> Result<HubRegistry> {
        Self::with_endpoint(HUB_BASE_URL, CONNECT_TIMEOUT, REQUEST_TIMEOUT)
    }

    fn with_endpoint(base_url: &str, connect: Duration, total: Duration) -> Result<HubRegistry> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(connect)
            .timeout(total)
            .build()
            .map_err(|e| UpdockError::Http(format!("client init: {}", e)))?;

        Ok(HubRegistry {
            client,
            base_url: base_url.to_string(),
        })
    }
}

impl Registry for HubRegistry {
    fn digest(&self, image: &str, tag: &str) -> Result<String> {
        let url = format!("{}/{}/tags/{}", self.base_url, hub_repository(image), tag);

        let resp = self.client.get(&url)
            .send()
            .map_err(|e| UpdockError::Http(format!("{}: {}", url, e)))?;

        if !resp.status().is_success() {
            return Err(UpdockError::Http(
                format!("{}: HTTP {}", url, resp.status().as_u16())
            ));
        }

        let body = resp.text()
            .map_err(|e| UpdockError::Http(format!("{}: {}", url, e)))?;

        parse_digest(&body)
    }
}

// ── 响应解析 ────────────────────────────────────────────────────────────────

/// Extract the content digest from a tag-metadata response.
///
/// Newer Hub responses carry a top-level "digest"; older ones only list
/// per-architecture digests under "images". We take the first image entry
/// as a fallback, which matches what the registry reports for the tag but
/// can mis-compare under multi-arch manifests.
pub fn parse_digest(body: &str) -> Result<String> {
    let j: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| UpdockError::Parse(format!("tag metadata JSON: {}", e)))?;

    if let Some(d) = j["digest"].as_str() {
        if !d.is_empty() {
            return Ok(d.to_string());
        }
    }

    j["images"].as_array()
        .and_then(|a| a.first())
        .and_then(|img| img["digest"].as_str())
        .filter(|d| !d.is_empty())
        .map(String::from)
        .ok_or_else(|| UpdockError::Parse("no digest field in tag metadata".to_string()))
}
