use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::util::is_valid_hub;

/// Credential and identifier bundle for a [`crate::Client`].
///
/// Immutable for the lifetime of a client instance. Populate it directly,
/// or via [`ClientConfig::load`] which merges (in order of precedence):
/// - environment variables `VENA_HUB`, `VENA_API_USER`, `VENA_API_KEY`,
///   `VENA_TEMPLATE_ID`, `VENA_MODEL_ID`, `VENA_URL`
/// - an rc file from `VENA_RC`, `./.venarc`, or `~/.venarc`
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// Regional hub the tenant lives on (e.g. `us1`, `us2`, `ca3`).
    pub hub: String,
    /// API user from the Vena authentication token.
    pub api_user: String,
    /// API key from the Vena authentication token.
    pub api_key: String,
    /// ETL template id targeted by imports and jobs.
    pub template_id: String,
    /// Model id targeted by export and hierarchy queries.
    pub model_id: Option<String>,
    /// Explicit base URL, overriding the hub-derived
    /// `https://{hub}.vena.io/api/public/v1`.
    pub url: Option<String>,
}

impl ClientConfig {
    pub fn new(
        hub: impl Into<String>,
        api_user: impl Into<String>,
        api_key: impl Into<String>,
        template_id: impl Into<String>,
    ) -> Self {
        Self {
            hub: hub.into(),
            api_user: api_user.into(),
            api_key: api_key.into(),
            template_id: template_id.into(),
            model_id: None,
            url: None,
        }
    }

    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Loads configuration from the environment and/or an rc file.
    pub fn load() -> Result<Self> {
        let mut cfg = Self {
            hub: std::env::var("VENA_HUB").unwrap_or_default(),
            api_user: std::env::var("VENA_API_USER").unwrap_or_default(),
            api_key: std::env::var("VENA_API_KEY").unwrap_or_default(),
            template_id: std::env::var("VENA_TEMPLATE_ID").unwrap_or_default(),
            model_id: std::env::var("VENA_MODEL_ID").ok().filter(|v| !v.is_empty()),
            url: std::env::var("VENA_URL").ok().filter(|v| !v.is_empty()),
        };

        let candidates = rc_candidates();
        if cfg.needs_file_values() {
            for rc_path in &candidates {
                if rc_path.exists() {
                    let file = read_rc(rc_path).map_err(|e| {
                        Error::Configuration(format!(
                            "failed to read configuration file {}: {e}",
                            rc_path.display()
                        ))
                    })?;
                    cfg.fill_from(file);
                    break;
                }
            }
        }

        cfg.ensure_present("hub", &candidates)?;
        cfg.ensure_present("api_user", &candidates)?;
        cfg.ensure_present("api_key", &candidates)?;
        cfg.ensure_present("template_id", &candidates)?;
        Ok(cfg)
    }

    /// Checks required fields and hub shape. Called by [`crate::Client::new`].
    pub(crate) fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("api_user", &self.api_user),
            ("api_key", &self.api_key),
            ("template_id", &self.template_id),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Configuration(format!("{name} must not be empty")));
            }
        }

        // An explicit url override skips hub derivation entirely.
        if self.url.is_none() && !is_valid_hub(&self.hub) {
            return Err(Error::Configuration(format!(
                "unrecognized hub {:?} (expected a regional identifier such as us1, us2, ca3)",
                self.hub
            )));
        }

        Ok(())
    }

    fn needs_file_values(&self) -> bool {
        self.hub.is_empty()
            || self.api_user.is_empty()
            || self.api_key.is_empty()
            || self.template_id.is_empty()
            || self.model_id.is_none()
            || self.url.is_none()
    }

    fn fill_from(&mut self, file: RcConfig) {
        if self.hub.is_empty() {
            self.hub = file.hub.unwrap_or_default();
        }
        if self.api_user.is_empty() {
            self.api_user = file.api_user.unwrap_or_default();
        }
        if self.api_key.is_empty() {
            self.api_key = file.api_key.unwrap_or_default();
        }
        if self.template_id.is_empty() {
            self.template_id = file.template_id.unwrap_or_default();
        }
        if self.model_id.is_none() {
            self.model_id = file.model_id;
        }
        if self.url.is_none() {
            self.url = file.url;
        }
    }

    fn ensure_present(&self, field: &str, candidates: &[PathBuf]) -> Result<()> {
        let value = match field {
            "hub" => {
                // hub is only needed when no explicit url is configured
                if self.url.is_some() {
                    return Ok(());
                }
                &self.hub
            }
            "api_user" => &self.api_user,
            "api_key" => &self.api_key,
            _ => &self.template_id,
        };
        if !value.is_empty() {
            return Ok(());
        }

        let env_name = format!("VENA_{}", field.to_uppercase());
        if candidates.is_empty() {
            return Err(Error::Configuration(format!(
                "missing {field} (set {env_name} or create .venarc)"
            )));
        }
        Err(Error::Configuration(format!(
            "missing {field} (set {env_name} or put `{field}:` in one of: {})",
            candidates
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        )))
    }
}

#[derive(Debug, Default)]
struct RcConfig {
    hub: Option<String>,
    api_user: Option<String>,
    api_key: Option<String>,
    template_id: Option<String>,
    model_id: Option<String>,
    url: Option<String>,
}

impl RcConfig {
    fn set(&mut self, key: &str, value: &str) {
        let value = Some(value.to_string());
        match key {
            "hub" => self.hub = value,
            "api_user" => self.api_user = value,
            "api_key" => self.api_key = value,
            "template_id" => self.template_id = value,
            "model_id" => self.model_id = value,
            "url" => self.url = value,
            _ => {}
        }
    }

    fn is_known_key(key: &str) -> bool {
        matches!(
            key,
            "hub" | "api_user" | "api_key" | "template_id" | "model_id" | "url"
        )
    }
}

fn read_rc(path: &Path) -> std::io::Result<RcConfig> {
    let text = std::fs::read_to_string(path)?;
    let mut cfg = RcConfig::default();

    // Support formatting where `api_key:` is on one line and the secret is
    // on the next line.
    let mut pending_key: Option<String> = None;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(pk) = pending_key.take() {
            // Continuation value line (no colon)
            if !line.contains(':') {
                cfg.set(&pk, strip_quotes(line));
                continue;
            }
        }

        if let Some((k, v)) = line.split_once(':') {
            let k = k.trim();
            let v = strip_quotes(v.trim());
            if !RcConfig::is_known_key(k) {
                continue;
            }
            if v.is_empty() {
                pending_key = Some(k.to_string());
            } else {
                cfg.set(k, v);
            }
        }
    }

    Ok(cfg)
}

fn strip_quotes(s: &str) -> &str {
    let s = s.trim();
    if (s.starts_with('"') && s.ends_with('"') && s.len() >= 2)
        || (s.starts_with('\'') && s.ends_with('\'') && s.len() >= 2)
    {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

fn rc_candidates() -> Vec<PathBuf> {
    // Search order:
    // 1) VENA_RC (explicit)
    // 2) ./.venarc (current working directory)
    // 3) ~/.venarc
    if let Ok(p) = std::env::var("VENA_RC") {
        return vec![PathBuf::from(p)];
    }

    let mut v = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        v.push(cwd.join(".venarc"));
    }
    if let Some(home) = dirs::home_dir() {
        v.push(home.join(".venarc"));
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn rc_from(text: &str) -> RcConfig {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        read_rc(file.path()).unwrap()
    }

    #[test]
    fn parses_basic_rc_file() {
        let cfg = rc_from(
            "# Vena credentials\n\
             hub: us1\n\
             api_user: user@example.com\n\
             api_key: \"secret\"\n\
             template_id: tpl-1\n\
             model_id: mdl-9\n",
        );
        assert_eq!(cfg.hub.as_deref(), Some("us1"));
        assert_eq!(cfg.api_user.as_deref(), Some("user@example.com"));
        assert_eq!(cfg.api_key.as_deref(), Some("secret"));
        assert_eq!(cfg.template_id.as_deref(), Some("tpl-1"));
        assert_eq!(cfg.model_id.as_deref(), Some("mdl-9"));
    }

    #[test]
    fn parses_continuation_value_lines() {
        let cfg = rc_from("api_key:\n  'abc123'\nhub: us2\n");
        assert_eq!(cfg.api_key.as_deref(), Some("abc123"));
        assert_eq!(cfg.hub.as_deref(), Some("us2"));
    }

    #[test]
    fn ignores_unknown_keys_and_comments() {
        let cfg = rc_from("# note\nfoo: bar\nhub: ca3\n");
        assert_eq!(cfg.hub.as_deref(), Some("ca3"));
        assert!(cfg.api_user.is_none());
    }

    #[test]
    #[allow(unsafe_code)]
    fn load_prefers_env_over_rc_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            b"hub: us1\n\
              api_user: rc-user\n\
              api_key: rc-key\n\
              template_id: rc-tpl\n\
              model_id: rc-mdl\n",
        )
        .unwrap();

        // Environment mutation is process-global; this is the only test
        // that touches the VENA_* variables.
        unsafe {
            std::env::set_var("VENA_RC", file.path());
            std::env::set_var("VENA_API_USER", "env-user");
            for var in [
                "VENA_HUB",
                "VENA_API_KEY",
                "VENA_TEMPLATE_ID",
                "VENA_MODEL_ID",
                "VENA_URL",
            ] {
                std::env::remove_var(var);
            }
        }

        let cfg = ClientConfig::load().unwrap();

        unsafe {
            std::env::remove_var("VENA_RC");
            std::env::remove_var("VENA_API_USER");
        }

        // env wins where set; rc fills everything else
        assert_eq!(cfg.api_user, "env-user");
        assert_eq!(cfg.hub, "us1");
        assert_eq!(cfg.api_key, "rc-key");
        assert_eq!(cfg.template_id, "rc-tpl");
        assert_eq!(cfg.model_id.as_deref(), Some("rc-mdl"));
        assert!(cfg.url.is_none());
    }

    #[test]
    fn validate_rejects_empty_credentials() {
        let cfg = ClientConfig::new("us1", "", "key", "tpl");
        assert!(matches!(cfg.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn validate_rejects_bad_hub() {
        let cfg = ClientConfig::new("Not A Hub", "u", "k", "tpl");
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("unrecognized hub"));
    }

    #[test]
    fn validate_allows_url_override_without_hub() {
        let cfg = ClientConfig::new("", "u", "k", "tpl").with_url("http://127.0.0.1:9000");
        assert!(cfg.validate().is_ok());
    }
}
