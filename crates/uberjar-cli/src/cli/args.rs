use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use uberjar_core::{ArchiveFormat, BuildConfigOverrides};

#[derive(Parser, Debug)]
#[command(
    name = "uberjar",
    version,
    about = "Fold an application archive and its runtime dependencies into one runnable archive"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build an uber-archive
    Build(BuildArgs),
    /// List the entries and entry-point of an archive
    Inspect(InspectArgs),
    Version,
}

#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    /// Build configuration (YAML). Defaults to ./uberjar.yaml when present
    #[arg(long, short = 'c', env = "UBERJAR_CONFIG")]
    pub config: Option<PathBuf>,

    /// The build's own archive
    #[arg(long)]
    pub primary: Option<PathBuf>,

    /// Runtime dependency archive, in classpath order (repeatable, appends)
    #[arg(long = "dep", value_name = "PATH")]
    pub deps: Vec<PathBuf>,

    /// Fully qualified entry-point class written as Main-Class
    #[arg(long)]
    pub main_class: Option<String>,

    /// Output archive path
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Output container (default: from the output extension, else jar)
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,

    /// Glob of entry paths to leave out (repeatable, appends)
    #[arg(long = "exclude", value_name = "GLOB")]
    pub excludes: Vec<String>,

    /// Extra manifest attribute (repeatable)
    #[arg(long = "attribute", value_name = "NAME=VALUE", value_parser = parse_attribute)]
    pub attributes: Vec<(String, String)>,

    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub report: ReportFormat,
}

impl BuildArgs {
    /// Flag values as a configuration layer.
    ///
    /// Command-line paths are taken as given (relative to the working
    /// directory); only config-file paths are rebased.
    pub fn overrides(&self) -> BuildConfigOverrides {
        BuildConfigOverrides {
            primary: self.primary.clone(),
            dependencies: self.deps.clone(),
            main_class: self.main_class.clone(),
            output: self.output.clone(),
            format: self.format.map(ArchiveFormat::from),
            excludes: self.excludes.clone(),
            attributes: self.attributes.iter().cloned().collect(),
            ..Default::default()
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    /// Archive to inspect (jar/zip or tar.gz)
    pub path: PathBuf,

    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub report: ReportFormat,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Jar,
    TarGz,
}

impl From<FormatArg> for ArchiveFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Jar => ArchiveFormat::Jar,
            FormatArg::TarGz => ArchiveFormat::TarGz,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
}

fn parse_attribute(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got {raw:?}"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("attribute name is empty in {raw:?}"));
    }
    Ok((name.to_string(), value.to_string()))
}
