//! Batch configuration
//!
//! The original generator kept its job list and output directories as
//! script-level globals; here they are an explicit [`GenConfig`] passed
//! into the pipeline. Defaults reproduce the landing page's six feature
//! images plus the hero background. A TOML manifest can replace the
//! built-in set.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::client::DEFAULT_BASE_URL;
use crate::error::{GenError, Result};
use crate::types::{JobSpec, PollOptions};

/// Accepted credential variables, in precedence order.
pub const ENV_KEYS: [&str; 2] = ["DASHSCOPE_API_KEY", "QWEN_API_KEY"];

/// Negative prompt shared by every default job.
pub const NEGATIVE_PROMPT: &str =
    "blurry, low quality, distorted, watermark, text, logo, ugly, deformed, dull colors";

const HERO_PROMPT: &str = "Wide hero background for digital nomad app, soft gradients, \
     abstract world map, silhouettes of remote workers with laptops, clean minimal, \
     spacious composition, premium tech aesthetic";

/// Read the API key from the environment. First non-empty variable in
/// [`ENV_KEYS`] wins.
pub fn api_key_from_env() -> Result<String> {
    for name in ENV_KEYS {
        if let Ok(value) = std::env::var(name) {
            if !value.is_empty() {
                return Ok(value);
            }
        }
    }
    Err(GenError::MissingApiKey)
}

/// Everything one batch invocation needs.
#[derive(Debug, Clone)]
pub struct GenConfig {
    /// Feature jobs, written to `output_dir` as `<slug>.png`.
    pub jobs: Vec<JobSpec>,
    /// Optional hero job, written to `hero_output_dir`.
    pub hero: Option<JobSpec>,
    pub output_dir: PathBuf,
    pub hero_output_dir: PathBuf,
    pub base_url: String,
    pub poll: PollOptions,
}

impl Default for GenConfig {
    fn default() -> Self {
        Self {
            jobs: Self::default_features(),
            hero: Some(Self::hero_spec()),
            output_dir: PathBuf::from("public/funcs"),
            hero_output_dir: PathBuf::from("public/hero"),
            base_url: DEFAULT_BASE_URL.to_string(),
            poll: PollOptions::default(),
        }
    }
}

impl GenConfig {
    /// The landing page's six feature images.
    pub fn default_features() -> Vec<JobSpec> {
        let features = [
            (
                "discover",
                "Minimalist illustration of a digital nomad exploring global cities, \
                 map pins, warm gradient background, modern flat design",
            ),
            (
                "cowork",
                "Cozy coworking space with large windows, greenery, laptops, \
                 freelancers collaborating, clean and bright style",
            ),
            (
                "community",
                "Community event for digital nomads, people networking, casual vibe, \
                 speech bubble icons, vibrant but soft colors",
            ),
            (
                "planner",
                "AI travel planner dashboard, calendar, route map, checklist, \
                 friendly UI, pastel tones",
            ),
            (
                "chat",
                "Instant messaging interface on mobile, chat bubbles, helpful \
                 assistant, smooth gradients, futuristic yet friendly",
            ),
            (
                "mobile",
                "Digital nomad using phone on the go, dual platforms iOS and Android, \
                 abstract mobile UI, purple to blue gradient",
            ),
        ];

        features
            .into_iter()
            .map(|(slug, prompt)| JobSpec::new(slug, prompt).negative(NEGATIVE_PROMPT))
            .collect()
    }

    /// The hero background job.
    pub fn hero_spec() -> JobSpec {
        JobSpec::new("hero", HERO_PROMPT).negative(NEGATIVE_PROMPT)
    }

    /// Load a config from a TOML job manifest. Fields omitted in the
    /// manifest keep their defaults.
    ///
    /// ```toml
    /// output_dir = "public/funcs"
    ///
    /// [[jobs]]
    /// slug = "discover"
    /// prompt = "a city skyline, flat illustration"
    ///
    /// [hero]
    /// slug = "hero"
    /// prompt = "wide abstract gradient background"
    /// ```
    pub fn from_manifest(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| GenError::Manifest(format!("{}: {}", path.display(), e)))?;
        let manifest: ManifestFile = toml::from_str(&content)
            .map_err(|e| GenError::Manifest(format!("{}: {}", path.display(), e)))?;

        let mut config = GenConfig {
            jobs: manifest.jobs,
            hero: manifest.hero,
            ..GenConfig::default()
        };
        if let Some(dir) = manifest.output_dir {
            config.output_dir = dir;
        }
        if let Some(dir) = manifest.hero_output_dir {
            config.hero_output_dir = dir;
        }
        if let Some(base_url) = manifest.base_url {
            config.base_url = base_url;
        }
        if let Some(attempts) = manifest.max_attempts {
            config.poll.max_attempts = attempts;
        }
        if let Some(ms) = manifest.interval_ms {
            config.poll.interval = Duration::from_millis(ms);
        }
        Ok(config)
    }
}

#[derive(Debug, Default, Deserialize)]
struct ManifestFile {
    #[serde(default)]
    jobs: Vec<JobSpec>,
    #[serde(default)]
    hero: Option<JobSpec>,
    #[serde(default)]
    output_dir: Option<PathBuf>,
    #[serde(default)]
    hero_output_dir: Option<PathBuf>,
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    max_attempts: Option<u32>,
    #[serde(default)]
    interval_ms: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = GenConfig::default();
        assert_eq!(config.jobs.len(), 6);
        assert!(config.hero.is_some());
        assert_eq!(config.output_dir, PathBuf::from("public/funcs"));
        assert_eq!(config.hero_output_dir, PathBuf::from("public/hero"));

        let slugs: Vec<&str> = config.jobs.iter().map(|j| j.slug.as_str()).collect();
        assert_eq!(
            slugs,
            ["discover", "cowork", "community", "planner", "chat", "mobile"]
        );
        assert!(config
            .jobs
            .iter()
            .all(|j| j.negative_prompt.as_deref() == Some(NEGATIVE_PROMPT)));
    }

    #[test]
    fn test_api_key_from_env_precedence() {
        // One test covers all cases sequentially; parallel tests must not
        // race on these process-wide variables.
        std::env::remove_var("DASHSCOPE_API_KEY");
        std::env::remove_var("QWEN_API_KEY");
        assert!(matches!(
            api_key_from_env(),
            Err(GenError::MissingApiKey)
        ));

        std::env::set_var("QWEN_API_KEY", "qwen-key");
        assert_eq!(api_key_from_env().unwrap(), "qwen-key");

        std::env::set_var("DASHSCOPE_API_KEY", "dash-key");
        assert_eq!(api_key_from_env().unwrap(), "dash-key");

        // Empty values are ignored, not taken.
        std::env::set_var("DASHSCOPE_API_KEY", "");
        assert_eq!(api_key_from_env().unwrap(), "qwen-key");

        std::env::remove_var("DASHSCOPE_API_KEY");
        std::env::remove_var("QWEN_API_KEY");
    }

    #[test]
    fn test_manifest_roundtrip() {
        let manifest = r#"
output_dir = "out/features"
hero_output_dir = "out/hero"
max_attempts = 5
interval_ms = 250

[[jobs]]
slug = "discover"
prompt = "a city skyline"
negative_prompt = "blurry"

[[jobs]]
slug = "cowork"
prompt = "a coworking space"
size = "1024*1024"

[hero]
slug = "hero"
prompt = "wide gradient background"
"#;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(manifest.as_bytes()).unwrap();

        let config = GenConfig::from_manifest(&path).unwrap();
        assert_eq!(config.jobs.len(), 2);
        assert_eq!(config.jobs[0].negative_prompt.as_deref(), Some("blurry"));
        assert_eq!(config.jobs[1].size, "1024*1024");
        assert_eq!(config.hero.as_ref().unwrap().slug, "hero");
        assert_eq!(config.output_dir, PathBuf::from("out/features"));
        assert_eq!(config.poll.max_attempts, 5);
        assert_eq!(config.poll.interval, Duration::from_millis(250));
        // Unset fields keep defaults.
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_manifest_missing_file() {
        let err = GenConfig::from_manifest(Path::new("does/not/exist.toml")).unwrap_err();
        assert!(matches!(err, GenError::Manifest(_)));
    }

    #[test]
    fn test_manifest_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "jobs = not-a-list").unwrap();
        let err = GenConfig::from_manifest(&path).unwrap_err();
        assert!(matches!(err, GenError::Manifest(_)));
    }
}
