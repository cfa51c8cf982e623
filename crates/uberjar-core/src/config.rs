//! Build configuration.
//!
//! A `BuildConfig` is built once per invocation and passed to
//! [`assemble`](crate::assemble::assemble) by reference; the pipeline holds
//! no other configuration state.
//!
//! Configuration is layered: a YAML file (`uberjar.yaml`) and command-line
//! flags are both parsed into `BuildConfigOverrides`, combined with
//! [`BuildConfigOverrides::or`], then resolved into a `BuildConfig`.
//!
//! ```yaml
//! primary: build/libs/app.jar
//! dependencies:
//!   - libs/picocli-4.7.6.jar
//!   - libs/slf4j-api-1.7.25.jar
//! main_class: com.example.Main
//! output: build/libs/app-uber.jar
//! excludes: ["META-INF/*.SF"]
//! ```

use crate::archive::limits::{ReadLimits, ReadLimitsOverrides};
use crate::archive::ArchiveFormat;
use crate::collect::CollectOptions;
use crate::error::{AssemblyError, AssemblyResult};
use crate::manifest::{ManifestSpec, MAIN_CLASS};
use crate::tree::ArtifactRef;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "uberjar.yaml";

/// Partial build configuration. Used for YAML and CLI parsing.
/// Unknown keys cause deserialization to fail (deny_unknown_fields).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfigOverrides {
    /// The build's own archive.
    pub primary: Option<PathBuf>,
    /// Resolved runtime dependencies, in classpath order.
    pub dependencies: Vec<PathBuf>,
    /// Entry-point written as `Main-Class`.
    pub main_class: Option<String>,
    pub output: Option<PathBuf>,
    /// Output container; inferred from `output` when unset.
    pub format: Option<ArchiveFormat>,
    /// Globs of entry paths left out of every input.
    pub excludes: Vec<String>,
    /// Extra manifest attributes.
    pub attributes: BTreeMap<String, String>,
    pub limits: ReadLimitsOverrides,
}

impl BuildConfigOverrides {
    /// Load a YAML configuration file.
    ///
    /// Relative paths inside the file are resolved against the file's directory.
    pub fn load(path: &Path) -> AssemblyResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            AssemblyError::config(format!("failed to read {}: {e}", path.display()))
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Self::from_yaml(&text, base)
            .map_err(|e| AssemblyError::config(format!("{}: {e}", path.display())))
    }

    /// Parse YAML text, resolving relative paths against `base`.
    pub fn from_yaml(text: &str, base: &Path) -> Result<Self, serde_yaml::Error> {
        let parsed: Self = serde_yaml::from_str(text)?;
        Ok(parsed.resolve_paths(base))
    }

    fn resolve_paths(mut self, base: &Path) -> Self {
        let resolve = |p: PathBuf| if p.is_relative() { base.join(p) } else { p };
        self.primary = self.primary.map(resolve);
        self.output = self.output.map(resolve);
        self.dependencies = self.dependencies.into_iter().map(resolve).collect();
        self
    }

    /// Layer `other` on top of `self`.
    ///
    /// Scalars from `other` win where set; dependency and exclude lists
    /// append; attributes from `other` replace same-named ones.
    pub fn or(mut self, other: Self) -> Self {
        self.primary = other.primary.or(self.primary);
        self.main_class = other.main_class.or(self.main_class);
        self.output = other.output.or(self.output);
        self.format = other.format.or(self.format);
        self.dependencies.extend(other.dependencies);
        self.excludes.extend(other.excludes);
        self.attributes.extend(other.attributes);
        self.limits = self.limits.or(other.limits);
        self
    }
}

/// Immutable configuration for one assembly run.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub primary: ArtifactRef,
    pub dependencies: Vec<ArtifactRef>,
    pub manifest: ManifestSpec,
    pub output: PathBuf,
    pub format: ArchiveFormat,
    pub collect: CollectOptions,
}

impl BuildConfig {
    /// Resolve layered overrides into a complete configuration.
    ///
    /// The entry-point is not required here; the stamper reports a missing
    /// one as `MissingEntryPoint`.
    pub fn from_overrides(overrides: BuildConfigOverrides) -> AssemblyResult<Self> {
        let primary = overrides
            .primary
            .ok_or_else(|| AssemblyError::config("no primary artifact configured (primary)"))?;
        let output = overrides
            .output
            .ok_or_else(|| AssemblyError::config("no output path configured (output)"))?;
        let format = overrides
            .format
            .unwrap_or_else(|| ArchiveFormat::for_output(&output));

        let mut manifest = ManifestSpec::new();
        for (name, value) in overrides.attributes {
            manifest.set(name, value);
        }
        if let Some(main_class) = overrides.main_class {
            manifest.set(MAIN_CLASS, main_class);
        }

        let limits = ReadLimits::default().apply(overrides.limits);
        let collect = CollectOptions::new(limits, &overrides.excludes)?;

        Ok(Self {
            primary: ArtifactRef::new(primary),
            dependencies: overrides
                .dependencies
                .into_iter()
                .map(ArtifactRef::new)
                .collect(),
            manifest,
            output,
            format,
            collect,
        })
    }

    /// Load and resolve a YAML configuration file.
    pub fn load(path: &Path) -> AssemblyResult<Self> {
        Self::from_overrides(BuildConfigOverrides::load(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
primary: build/libs/app.jar
dependencies:
  - libs/picocli-4.7.6.jar
  - /opt/m2/slf4j-api-1.7.25.jar
main_class: com.ronreynolds.games.Main
output: build/libs/app-uber.tar.gz
excludes: ["META-INF/*.SF"]
attributes:
  Implementation-Version: 0.0.1-SNAPSHOT
limits:
  max_entries: 1000
"#;

    #[test]
    fn parses_and_resolves_relative_paths() {
        let o = BuildConfigOverrides::from_yaml(YAML, Path::new("/work")).unwrap();
        assert_eq!(o.primary, Some(PathBuf::from("/work/build/libs/app.jar")));
        assert_eq!(
            o.dependencies,
            vec![
                PathBuf::from("/work/libs/picocli-4.7.6.jar"),
                PathBuf::from("/opt/m2/slf4j-api-1.7.25.jar"),
            ]
        );
        assert_eq!(o.limits.max_entries, Some(1000));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = BuildConfigOverrides::from_yaml("duplicates: include\n", Path::new("."));
        assert!(err.is_err());
    }

    #[test]
    fn resolves_into_build_config() {
        let o = BuildConfigOverrides::from_yaml(YAML, Path::new("/work")).unwrap();
        let config = BuildConfig::from_overrides(o).unwrap();
        assert_eq!(config.format, ArchiveFormat::TarGz);
        assert_eq!(config.manifest.main_class(), Some("com.ronreynolds.games.Main"));
        assert_eq!(
            config.manifest.get("Implementation-Version"),
            Some("0.0.1-SNAPSHOT")
        );
        assert_eq!(config.collect.limits().max_entries, 1000);
        assert_eq!(config.collect.exclude_patterns(), ["META-INF/*.SF".to_string()]);
        assert_eq!(config.dependencies.len(), 2);
    }

    #[test]
    fn cli_layer_wins_and_appends() {
        let file = BuildConfigOverrides::from_yaml(YAML, Path::new("/work")).unwrap();
        let cli = BuildConfigOverrides {
            main_class: Some("com.example.Other".into()),
            dependencies: vec![PathBuf::from("/extra.jar")],
            format: Some(ArchiveFormat::Jar),
            ..Default::default()
        };
        let merged = file.or(cli);
        assert_eq!(merged.main_class.as_deref(), Some("com.example.Other"));
        assert_eq!(merged.dependencies.len(), 3);
        assert_eq!(merged.dependencies[2], PathBuf::from("/extra.jar"));
        assert_eq!(merged.format, Some(ArchiveFormat::Jar));
        assert_eq!(
            merged.primary,
            Some(PathBuf::from("/work/build/libs/app.jar"))
        );
    }

    #[test]
    fn primary_and_output_are_required() {
        let err = BuildConfig::from_overrides(BuildConfigOverrides::default()).unwrap_err();
        assert!(matches!(err, AssemblyError::Config { .. }));

        let only_primary = BuildConfigOverrides {
            primary: Some("app.jar".into()),
            ..Default::default()
        };
        let err = BuildConfig::from_overrides(only_primary).unwrap_err();
        assert!(err.to_string().contains("output"));
    }

    #[test]
    fn missing_config_file_is_config_error() {
        let err = BuildConfigOverrides::load(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(matches!(err, AssemblyError::Config { .. }));
    }
}
