use std::time::Duration;

use crate::error::AppError;

pub const DEFAULT_MAX_CYCLES: usize = 5;
pub const DEFAULT_SETTLE: Duration = Duration::from_secs(3);
pub const DEFAULT_DOWNLOAD_CONCURRENCY: usize = 8;

/// Which elements feed the text stream and which attributes hold lazy image sources.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub text_tags: Vec<String>,
    /// Tried in order when `<img src>` is missing or blank.
    pub image_fallback_attrs: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            text_tags: ["p", "h1", "h2", "h3", "h4", "h5", "h6", "span", "div"]
                .into_iter()
                .map(String::from)
                .collect(),
            image_fallback_attrs: vec!["data-src".to_string()],
        }
    }
}

/// Scroll-and-snapshot loop settings.
#[derive(Debug, Clone, Copy)]
pub struct LoaderConfig {
    /// Number of trigger/settle/snapshot cycles; zero yields an empty result.
    pub max_cycles: usize,
    /// Fixed wait after each lazy-load trigger.
    pub settle: Duration,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_cycles: DEFAULT_MAX_CYCLES,
            settle: DEFAULT_SETTLE,
        }
    }
}

/// Per-stream merge switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeOptions {
    /// Keep only the first occurrence of each image URL.
    pub unique_images: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct DownloaderConfig {
    pub concurrency: usize,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_DOWNLOAD_CONCURRENCY,
        }
    }
}

/// Everything the harvest pipeline can be tuned with.
#[derive(Debug, Clone, Default)]
pub struct HarvestConfig {
    pub classifier: ClassifierConfig,
    pub loader: LoaderConfig,
    pub merge: MergeOptions,
    pub downloader: DownloaderConfig,
}

impl HarvestConfig {
    /// Read configuration from environment variables, falling back to defaults.
    ///
    /// - `TRAWL_MAX_CYCLES` (defaults to 5)
    /// - `TRAWL_SETTLE_MS` (defaults to 3000)
    /// - `TRAWL_CONCURRENCY` (defaults to 8)
    /// - `TRAWL_UNIQUE_IMAGES` (`true`/`false`, defaults to false)
    /// - `TRAWL_TEXT_TAGS` (comma-separated tag names)
    /// - `TRAWL_IMAGE_FALLBACK_ATTRS` (comma-separated attributes, defaults to `data-src`)
    ///
    /// Only malformed values fail here. Range checks are left to
    /// [`validate`](Self::validate), after command-line overrides are applied.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `var`.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let mut config = Self::default();

        if let Some(cycles) = parse_var::<usize>(&var, "TRAWL_MAX_CYCLES")? {
            config.loader.max_cycles = cycles;
        }
        if let Some(ms) = parse_var::<u64>(&var, "TRAWL_SETTLE_MS")? {
            config.loader.settle = Duration::from_millis(ms);
        }
        if let Some(concurrency) = parse_var::<usize>(&var, "TRAWL_CONCURRENCY")? {
            config.downloader.concurrency = concurrency;
        }
        if let Some(unique) = parse_var::<bool>(&var, "TRAWL_UNIQUE_IMAGES")? {
            config.merge.unique_images = unique;
        }
        if let Some(raw) = var("TRAWL_TEXT_TAGS") {
            config.classifier.text_tags = split_list(&raw);
        }
        if let Some(raw) = var("TRAWL_IMAGE_FALLBACK_ATTRS") {
            config.classifier.image_fallback_attrs = split_list(&raw);
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.downloader.concurrency == 0 {
            return Err(AppError::ConfigError(
                "download concurrency must be at least 1".into(),
            ));
        }
        if self.classifier.text_tags.is_empty() {
            return Err(AppError::ConfigError(
                "at least one text tag is required".into(),
            ));
        }
        Ok(())
    }
}

/// Split a comma-separated list, dropping blank entries.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_var<T: std::str::FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<T>, AppError> {
    match var(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| AppError::ConfigError(format!("Invalid {name} '{raw}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = HarvestConfig::default();
        assert_eq!(config.loader.max_cycles, 5);
        assert_eq!(config.loader.settle, Duration::from_secs(3));
        assert_eq!(config.downloader.concurrency, 8);
        assert!(!config.merge.unique_images);
        assert_eq!(config.classifier.text_tags.len(), 9);
        assert_eq!(config.classifier.image_fallback_attrs, ["data-src"]);
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let mut config = HarvestConfig::default();
        config.downloader.concurrency = 0;
        assert!(matches!(config.validate(), Err(AppError::ConfigError(_))));
    }

    #[test]
    fn split_list_trims_and_drops_blanks() {
        assert_eq!(split_list(" p, h1 ,,div "), ["p", "h1", "div"]);
        assert!(split_list(" , ").is_empty());
    }

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let pairs: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| {
            pairs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
        }
    }

    #[test]
    fn from_vars_reads_every_setting() {
        let config = HarvestConfig::from_vars(vars(&[
            ("TRAWL_MAX_CYCLES", "2"),
            ("TRAWL_SETTLE_MS", "250"),
            ("TRAWL_CONCURRENCY", "3"),
            ("TRAWL_UNIQUE_IMAGES", "true"),
            ("TRAWL_TEXT_TAGS", "p, li"),
            ("TRAWL_IMAGE_FALLBACK_ATTRS", "data-lazy-src, data-src"),
        ]))
        .unwrap();

        assert_eq!(config.loader.max_cycles, 2);
        assert_eq!(config.loader.settle, Duration::from_millis(250));
        assert_eq!(config.downloader.concurrency, 3);
        assert!(config.merge.unique_images);
        assert_eq!(config.classifier.text_tags, ["p", "li"]);
        assert_eq!(
            config.classifier.image_fallback_attrs,
            ["data-lazy-src", "data-src"]
        );
    }

    #[test]
    fn malformed_value_is_config_error() {
        let err = HarvestConfig::from_vars(vars(&[("TRAWL_MAX_CYCLES", "many")])).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }

    #[test]
    fn out_of_range_value_can_be_overridden_before_validation() {
        let mut config = HarvestConfig::from_vars(vars(&[("TRAWL_CONCURRENCY", "0")])).unwrap();
        assert!(config.validate().is_err());

        config.downloader.concurrency = 4;
        assert!(config.validate().is_ok());
    }
}
