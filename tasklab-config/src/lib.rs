use std::{
    env, fs,
    path::{Path, PathBuf},
    process::Command,
};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthMethod {
    /// `PRIVATE-TOKEN` header, for personal and project access tokens.
    PrivateToken,
    /// `Authorization: Bearer`, for OAuth tokens.
    Bearer,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TasklabConfig {
    pub gitlab_server: Option<String>,
    pub gitlab_token: Option<String>,
    pub project: Option<String>,
    pub auth_method: Option<String>,
    pub insecure: bool,
}

#[derive(Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    general: RawGeneral,
    gitlab_server: Option<String>,
    gitlab_token: Option<String>,
    project: Option<RawProject>,
    auth_method: Option<String>,
    insecure: Option<bool>,
}

#[derive(Default, Deserialize)]
struct RawGeneral {
    gitlab_server: Option<String>,
    gitlab_token: Option<String>,
    project: Option<RawProject>,
    auth_method: Option<String>,
    insecure: Option<bool>,
}

// Numeric project ids are commonly written unquoted in YAML.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawProject {
    Id(u64),
    Path(String),
}

impl TasklabConfig {
    pub fn load_default() -> Result<Self> {
        Self::load_from_path(&default_config_path())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let payload = fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        let raw: RawConfig =
            serde_yaml::from_str(&payload).with_context(|| "invalid YAML config format")?;
        Ok(Self::from_raw(raw))
    }

    pub fn auth_method(&self) -> AuthMethod {
        match self
            .auth_method
            .as_deref()
            .map(|value| value.trim().to_ascii_lowercase())
            .as_deref()
        {
            Some("bearer") | Some("oauth") => AuthMethod::Bearer,
            _ => AuthMethod::PrivateToken,
        }
    }

    pub fn server(&self) -> Result<&str> {
        self.gitlab_server
            .as_deref()
            .ok_or_else(|| anyhow!("gitlab_server not configured"))
    }

    pub fn project(&self) -> Result<&str> {
        self.project
            .as_deref()
            .ok_or_else(|| anyhow!("project not configured"))
    }

    pub fn issue_url(&self, iid: u64) -> Result<String> {
        let server = self.server()?;
        let project = self.project()?;
        Ok(format!("{server}/{project}/-/issues/{iid}"))
    }

    fn from_raw(raw: RawConfig) -> Self {
        let gitlab_server = first_some(raw.general.gitlab_server, raw.gitlab_server)
            .and_then(normalize_gitlab_server);
        let gitlab_token = first_some(raw.general.gitlab_token, raw.gitlab_token)
            .and_then(resolve_gitlab_token);
        let project = first_some(raw.general.project, raw.project).and_then(normalize_project);
        let auth_method = first_some(raw.general.auth_method, raw.auth_method).and_then(non_empty);
        let insecure = raw.general.insecure.or(raw.insecure).unwrap_or(false);

        Self {
            gitlab_server,
            gitlab_token,
            project,
            auth_method,
            insecure,
        }
    }
}

pub fn default_config_path() -> PathBuf {
    if let Some(override_path) = env::var_os("TASKLAB_CONFIG_FILE") {
        return PathBuf::from(override_path);
    }

    let mut base = env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    base.push(".config");
    base.push("tasklab");
    base.push("config.yaml");
    base
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}

fn normalize_gitlab_server(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Some(trimmed.trim_end_matches('/').to_string())
    } else {
        Some(format!("https://{}", trimmed.trim_end_matches('/')))
    }
}

fn normalize_project(value: RawProject) -> Option<String> {
    match value {
        RawProject::Id(id) => Some(id.to_string()),
        RawProject::Path(path) => non_empty(path.trim_matches('/').to_string()),
    }
}

fn first_some<T>(first: Option<T>, second: Option<T>) -> Option<T> {
    first.or(second)
}

fn resolve_gitlab_token(value: String) -> Option<String> {
    resolve_gitlab_token_with(value, fetch_secret_from_manager)
}

fn resolve_gitlab_token_with<F>(value: String, fetch: F) -> Option<String>
where
    F: Fn(&str, &str) -> Option<String>,
{
    let token = non_empty(value)?;
    let Some((provider, key)) = parse_secret_reference(token.as_str()) else {
        return Some(token);
    };
    fetch(provider, key)
}

fn parse_secret_reference(value: &str) -> Option<(&str, &str)> {
    let (provider, key) = value.split_once("::")?;
    if key.trim().is_empty() {
        return None;
    }
    if provider == "pass" || provider == "passage" {
        Some((provider, key.trim()))
    } else {
        None
    }
}

fn fetch_secret_from_manager(provider: &str, key: &str) -> Option<String> {
    let output = Command::new(provider).arg("show").arg(key).output().ok()?;
    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    non_empty(stdout.trim().to_string())
}
