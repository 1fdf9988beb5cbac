use crate::cli::CliArgs;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_SERVER: &str = "http://127.0.0.1:5000";

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct ConfigFile {
    #[serde(default)]
    pub server: Option<String>,
    #[serde(default, alias = "timeout", alias = "timeout_s")]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub namespaces: Vec<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(skip)]
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server: String,
    pub timeout: Option<Duration>,
    pub namespaces: Vec<String>,
    pub image: String,
    pub config_source: Option<String>,
}

impl ConfigFile {
    pub fn discover() -> Result<Self> {
        match discover_config_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let mut parsed: ConfigFile = if raw.trim().is_empty() {
            ConfigFile::default()
        } else {
            serde_yaml::from_str(&raw)
                .with_context(|| format!("failed to parse config {}", path.display()))?
        };
        parsed.source = Some(path.display().to_string());
        Ok(parsed)
    }
}

impl Settings {
    pub fn resolve(args: &CliArgs, file: ConfigFile) -> Self {
        let server = args
            .server
            .as_deref()
            .or(file.server.as_deref())
            .map(str::trim)
            .filter(|server| !server.is_empty())
            .unwrap_or(DEFAULT_SERVER)
            .trim_end_matches('/')
            .to_string();

        let timeout = args
            .timeout_secs
            .or(file.timeout_secs)
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        let namespaces = merge_namespaces(
            args.namespaces
                .iter()
                .chain(file.namespaces.iter())
                .map(String::as_str),
        );

        let image = args
            .image
            .clone()
            .or(file.image)
            .map(|image| image.trim().to_string())
            .unwrap_or_default();

        Self {
            server,
            timeout,
            namespaces,
            image,
            config_source: file.source,
        }
    }
}

fn merge_namespaces<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut merged: Vec<String> = Vec::new();
    for value in values.map(str::trim).filter(|value| !value.is_empty()) {
        if !merged.iter().any(|known| known == value) {
            merged.push(value.to_string());
        }
    }
    merged
}

fn discover_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("NSDECK_CONFIG")
        && !path.trim().is_empty()
    {
        return Some(PathBuf::from(path));
    }

    let cwd_candidates = [
        PathBuf::from("nsdeck.yaml"),
        PathBuf::from("nsdeck.yml"),
        PathBuf::from(".nsdeck.yaml"),
    ];
    for candidate in cwd_candidates {
        if candidate.exists() {
            return Some(candidate);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let user_candidates = [
            PathBuf::from(&home).join(".config/nsdeck/config.yaml"),
            PathBuf::from(&home).join(".config/nsdeck/config.yml"),
            PathBuf::from(&home).join(".nsdeck.yaml"),
        ];
        for candidate in user_candidates {
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::{ConfigFile, DEFAULT_SERVER, Settings};
    use crate::cli::CliArgs;
    use clap::Parser;
    use std::io::Write;
    use std::time::Duration;

    fn args(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["nsdeck"];
        argv.extend_from_slice(extra);
        CliArgs::parse_from(argv)
    }

    #[test]
    fn load_reads_all_keys() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "server: http://orchestrator:5000/\ntimeout: 7\nnamespaces: [team-a, team-b]\nimage: nginx:1.25"
        )
        .expect("write config");

        let parsed = ConfigFile::load(file.path()).expect("config loads");
        assert_eq!(parsed.server.as_deref(), Some("http://orchestrator:5000/"));
        assert_eq!(parsed.timeout_secs, Some(7));
        assert_eq!(parsed.namespaces, vec!["team-a", "team-b"]);
        assert_eq!(parsed.image.as_deref(), Some("nginx:1.25"));
        assert!(parsed.source.is_some());
    }

    #[test]
    fn empty_file_yields_defaults() {
        let file = tempfile::NamedTempFile::new().expect("temp file");
        let parsed = ConfigFile::load(file.path()).expect("config loads");
        assert!(parsed.server.is_none());
        assert!(parsed.namespaces.is_empty());
    }

    #[test]
    fn malformed_file_reports_path() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "namespaces: {{ not: [a list").expect("write config");

        let error = ConfigFile::load(file.path()).expect_err("parse must fail");
        assert!(format!("{error:#}").contains("failed to parse config"));
    }

    #[test]
    fn cli_values_win_over_file() {
        let file = ConfigFile {
            server: Some("http://from-file:5000".to_string()),
            timeout_secs: Some(30),
            namespaces: vec!["shared".to_string(), "file-only".to_string()],
            image: Some("busybox".to_string()),
            source: None,
        };
        let args = args(&[
            "--server",
            "http://from-cli:8080/",
            "--timeout-secs",
            "5",
            "-n",
            "cli-only",
            "-n",
            "shared",
            "--image",
            "nginx:1.25",
        ]);

        let settings = Settings::resolve(&args, file);
        assert_eq!(settings.server, "http://from-cli:8080");
        assert_eq!(settings.timeout, Some(Duration::from_secs(5)));
        assert_eq!(settings.namespaces, vec!["cli-only", "shared", "file-only"]);
        assert_eq!(settings.image, "nginx:1.25");
    }

    #[test]
    fn defaults_apply_without_any_source() {
        let settings = Settings::resolve(&args(&[]), ConfigFile::default());
        assert_eq!(settings.server, DEFAULT_SERVER);
        assert_eq!(settings.timeout, None);
        assert!(settings.namespaces.is_empty());
        assert!(settings.image.is_empty());
    }

    #[test]
    fn blank_namespaces_are_dropped() {
        let settings = Settings::resolve(&args(&["-n", "  ", "-n", " web "]), ConfigFile::default());
        assert_eq!(settings.namespaces, vec!["web"]);
    }
}
