//! 本地容器运行时：docker inspect / docker pull / compose up -d
//! compose 的调用方式（插件或独立二进制）在启动时探测一次

use std::process::Command;

use crate::utils::{Result, UpdockError};

/// Local runtime operations the orchestrator needs. The compose file on
/// the host is treated as a black box; only the service name is passed.
pub trait ContainerRuntime {
    /// Digest recorded for a local image, or None when the image (or its
    /// repo digest) is absent
    fn local_digest(&self, image: &str, tag: &str) -> Option<String>;

    fn pull(&self, image: &str, tag: &str) -> Result<()>;

    fn restart(&self, service: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeFlavor {
    /// `docker compose` (plugin)
    Plugin,
    /// `docker-compose` (standalone binary)
    Standalone,
}

pub struct DockerRuntime {
    compose: ComposeFlavor,
}

impl DockerRuntime {
    /// Verify the external tools once, up front. `docker` must be present;
    /// the compose flavor is whichever of the two invocations answers.
    pub fn probe() -> Result<DockerRuntime> {
        let docker_ok = Command::new("docker")
            .args(&["version", "--format", "{{.Client.Version}}"])
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false);

        if !docker_ok {
            return Err(UpdockError::MissingDependency(
                "docker not found or daemon not running".to_string()
            ));
        }

        let compose = Self::probe_compose()?;
        Ok(DockerRuntime { compose })
    }

    fn probe_compose() -> Result<ComposeFlavor> {
        let plugin_ok = Command::new("docker")
            .args(&["compose", "version"])
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false);
        if plugin_ok {
            return Ok(ComposeFlavor::Plugin);
        }

        let standalone_ok = Command::new("docker-compose")
            .arg("version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false);
        if standalone_ok {
            return Ok(ComposeFlavor::Standalone);
        }

        Err(UpdockError::MissingDependency(
            "neither `docker compose` nor `docker-compose` is available".to_string()
        ))
    }

    fn compose_command(&self) -> Command {
        match self.compose {
            ComposeFlavor::Plugin => {
                let mut c = Command::new("docker");
                c.arg("compose");
                c
            }
            ComposeFlavor::Standalone => Command::new("docker-compose"),
        }
    }
}

impl ContainerRuntime for DockerRuntime {
    fn local_digest(&self, image: &str, tag: &str) -> Option<String> {
        let reference = format!("{}:{}", image, tag);
        let out = Command::new("docker")
            .args(&["image", "inspect", "--format", "{{json .RepoDigests}}", &reference])
            .output()
            .ok()?;

        // inspect 失败（镜像不存在等）一律视为本地无摘要
        if !out.status.success() {
            return None;
        }

        let digests: Vec<String> = serde_json::from_slice(&out.stdout).ok()?;
        pick_repo_digest(&digests, image)
    }

    fn pull(&self, image: &str, tag: &str) -> Result<()> {
        let reference = format!("{}:{}", image, tag);
        let out = Command::new("docker")
            .args(&["pull", &reference])
            .output()
            .map_err(|e| UpdockError::Docker(format!("docker pull failed: {}", e)))?;

        if !out.status.success() {
            return Err(UpdockError::Docker(format!(
                "docker pull {}: {}",
                reference,
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }
        Ok(())
    }

    fn restart(&self, service: &str) -> Result<()> {
        let mut cmd = self.compose_command();
        let out = cmd
            .args(&["up", "-d", service])
            .output()
            .map_err(|e| UpdockError::Docker(format!("compose up failed: {}", e)))?;

        if !out.status.success() {
            return Err(UpdockError::Docker(format!(
                "compose up -d {}: {}",
                service,
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }
        Ok(())
    }
}

// ── RepoDigests ─────────────────────────────────────────────────────────────

/// RepoDigests entries look like "repo@sha256:...". An image pulled through
/// several repositories lists one entry per repo; prefer the one matching
/// ours, otherwise take the first.
fn pick_repo_digest(entries: &[String], image: &str) -> Option<String> {
    let prefix = format!("{}@", image);
    entries.iter()
        .find(|e| e.starts_with(&prefix))
        .or_else(|| entries.first())
        .and_then(|e| e.split_once('@'))
        .map(|(_, digest)| digest.to_string())
}
