use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use tracing::{debug, info, trace, warn};

/// Key/value configuration loaded from the rc file, with built-in defaults
/// underneath and command-line overrides on top.
#[derive(Debug, Clone)]
pub struct Config {
    map: HashMap<String, String>,
    pub loaded_files: Vec<PathBuf>,
}

impl Config {
    #[tracing::instrument(skip(rc_override))]
    pub fn load(rc_override: Option<&Path>) -> anyhow::Result<Self> {
        let mut cfg = Config {
            map: HashMap::new(),
            loaded_files: vec![],
        };

        cfg.map
            .insert("data.location".to_string(), "~/.chores".to_string());
        cfg.map.insert("page.size".to_string(), "10".to_string());
        cfg.map.insert("color".to_string(), "on".to_string());
        cfg.map
            .insert("default.locale".to_string(), "en".to_string());

        if let Some(path) = resolve_rc_path(rc_override)? {
            info!(rc = %path.display(), "loading rc file");
            cfg.load_file(&path)?;
        } else {
            debug!("no rc file found, using defaults");
        }

        Ok(cfg)
    }

    #[tracing::instrument(skip(self, overrides))]
    pub fn apply_overrides<I>(&mut self, overrides: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in overrides {
            let key = key.strip_prefix("rc.").unwrap_or(&key).to_string();
            debug!(key = %key, value = %value, "applying override");
            self.map.insert(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.map.get(key).map(|value| parse_bool(value))
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        let raw = self.map.get(key)?;
        match raw.trim().parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(key = %key, value = %raw, "not a number, ignoring");
                None
            }
        }
    }

    #[tracing::instrument(skip(self))]
    fn load_file(&mut self, path: &Path) -> anyhow::Result<()> {
        let path = expand_tilde(path);
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        self.loaded_files.push(path.clone());

        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        for (line_num, raw_line) in text.lines().enumerate() {
            let mut line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((before, _)) = line.split_once('#') {
                line = before.trim();
            }
            if line.is_empty() {
                continue;
            }

            if let Some(include) = line.strip_prefix("include ") {
                let include_path = resolve_include_path(&base_dir, include.trim())?;
                if include_path.exists() {
                    self.load_file(&include_path)?;
                } else {
                    warn!(include = %include_path.display(), "include file does not exist, skipping");
                }
                continue;
            }

            let (key, value) = line.split_once('=').ok_or_else(|| {
                anyhow!(
                    "invalid config line {}:{}: {}",
                    path.display(),
                    line_num + 1,
                    raw_line
                )
            })?;

            let key = key.trim().to_string();
            let value = value.trim().to_string();
            trace!(key = %key, value = %value, "loaded config key");
            self.map.insert(key, value);
        }

        Ok(())
    }
}

#[tracing::instrument(skip(cfg, override_dir))]
pub fn resolve_data_dir(cfg: &Config, override_dir: Option<&Path>) -> anyhow::Result<PathBuf> {
    let dir = if let Some(path) = override_dir {
        path.to_path_buf()
    } else if let Some(value) = cfg.get("data.location") {
        expand_tilde(Path::new(&value))
    } else {
        home_dir()?.join(".chores")
    };

    if !dir.exists() {
        info!(dir = %dir.display(), "creating data directory");
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }

    Ok(dir)
}

fn resolve_rc_path(override_path: Option<&Path>) -> anyhow::Result<Option<PathBuf>> {
    if let Some(path) = override_path {
        return Ok(Some(path.to_path_buf()));
    }

    if let Ok(env_path) = std::env::var("CHORESRC") {
        if env_path == "/dev/null" {
            return Ok(None);
        }
        return Ok(Some(PathBuf::from(env_path)));
    }

    let candidate = home_dir()?.join(".choresrc");
    if candidate.exists() {
        return Ok(Some(candidate));
    }

    Ok(None)
}

fn home_dir() -> anyhow::Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| anyhow!("cannot determine home directory"))
}

fn resolve_include_path(base_dir: &Path, include: &str) -> anyhow::Result<PathBuf> {
    if include.trim().is_empty() {
        return Err(anyhow!("include path cannot be empty"));
    }

    let expanded = expand_tilde(Path::new(include));
    if expanded.is_absolute() {
        Ok(expanded)
    } else {
        Ok(base_dir.join(expanded))
    }
}

fn expand_tilde(path: &Path) -> PathBuf {
    let text = path.to_string_lossy();
    if let Some(rest) = text.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    path.to_path_buf()
}

fn parse_bool(s: &str) -> bool {
    matches!(
        s.trim().to_ascii_lowercase().as_str(),
        "1" | "y" | "yes" | "on" | "true"
    )
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::Config;

    #[test]
    fn defaults_are_present() {
        let temp = tempdir().expect("tempdir");
        let rc = temp.path().join("rc");
        fs::write(&rc, "").expect("write rc");

        let cfg = Config::load(Some(&rc)).expect("load");
        assert_eq!(cfg.get("page.size").as_deref(), Some("10"));
        assert_eq!(cfg.get_usize("page.size"), Some(10));
        assert_eq!(cfg.get_bool("color"), Some(true));
        assert_eq!(cfg.get("default.locale").as_deref(), Some("en"));
        assert_eq!(cfg.get("missing.key"), None);
    }

    #[test]
    fn rc_values_and_overrides_take_precedence() {
        let temp = tempdir().expect("tempdir");
        let rc = temp.path().join("rc");
        fs::write(&rc, "page.size = 5\n# comment\ncolor = off\n").expect("write rc");

        let mut cfg = Config::load(Some(&rc)).expect("load");
        assert_eq!(cfg.get_usize("page.size"), Some(5));
        assert_eq!(cfg.get_bool("color"), Some(false));

        cfg.apply_overrides([("rc.page.size".to_string(), "25".to_string())]);
        assert_eq!(cfg.get_usize("page.size"), Some(25));
    }

    #[test]
    fn includes_are_followed() {
        let temp = tempdir().expect("tempdir");
        let extra = temp.path().join("extra");
        fs::write(&extra, "default.locale = vi\n").expect("write extra");
        let rc = temp.path().join("rc");
        fs::write(&rc, "include extra\n").expect("write rc");

        let cfg = Config::load(Some(&rc)).expect("load");
        assert_eq!(cfg.get("default.locale").as_deref(), Some("vi"));
    }

    #[test]
    fn malformed_numbers_fall_back() {
        let temp = tempdir().expect("tempdir");
        let rc = temp.path().join("rc");
        fs::write(&rc, "page.size = lots\n").expect("write rc");
        let cfg = Config::load(Some(&rc)).expect("load");
        assert_eq!(cfg.get_usize("page.size"), None);
    }
}
