use crate::config::{ConfigError, LintConfig};
use crate::report::OutputFormat;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kuberef")]
#[command(version = crate::VERSION)]
#[command(about = "Check cross-resource references in Kubernetes manifests")]
#[command(
    long_about = "Statically verifies that references between resources in a collection of \
Kubernetes YAML manifests resolve: Service selectors and ports, envFrom and valueFrom \
sources, volume ConfigMaps and PersistentVolumeClaims, Ingress backends, HPA scale \
targets and PodMonitor selectors."
)]
pub struct Cli {
    /// Manifest file or directory to lint. Reads stdin when omitted.
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// ConfigMap names to exempt from existence checks
    #[arg(long, value_name = "NAMES", value_delimiter = ',')]
    pub skip_configmaps: Vec<String>,

    /// Secret names to exempt from existence checks
    #[arg(long, value_name = "NAMES", value_delimiter = ',')]
    pub skip_secrets: Vec<String>,

    /// Service names to exempt from Ingress backend checks
    #[arg(long, value_name = "NAMES", value_delimiter = ',')]
    pub skip_services: Vec<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Plain)]
    pub format: OutputFormat,

    /// Report findings but always exit successfully
    #[arg(long)]
    pub no_fail: bool,

    /// Path to configuration file (default: .kuberef.yaml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    pub fn init_logging(&self) {
        if self.quiet {
            return;
        }

        let level = match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };

        env_logger::Builder::from_default_env()
            .filter_level(level)
            .init();
    }

    /// Resolve the effective config: the config file (explicit or default
    /// location) as the base, with flags adding to it.
    pub fn lint_config(&self) -> Result<LintConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => LintConfig::load_from_file(path)?,
            None => LintConfig::load_from_default()?.unwrap_or_default(),
        };

        config.skip_configmaps.extend(self.skip_configmaps.iter().cloned());
        config.skip_secrets.extend(self.skip_secrets.iter().cloned());
        config.skip_services.extend(self.skip_services.iter().cloned());
        config.no_fail |= self.no_fail;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["kuberef"]);
        assert!(cli.path.is_none());
        assert_eq!(cli.format, OutputFormat::Plain);
        assert!(!cli.no_fail);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_skip_lists_are_comma_delimited() {
        let cli = Cli::parse_from([
            "kuberef",
            "manifests/",
            "--skip-secrets",
            "a,b",
            "--skip-configmaps",
            "c",
        ]);
        assert_eq!(cli.path, Some(PathBuf::from("manifests/")));
        assert_eq!(cli.skip_secrets, vec!["a", "b"]);
        assert_eq!(cli.skip_configmaps, vec!["c"]);
        assert!(cli.skip_services.is_empty());
    }

    #[test]
    fn test_version_flag_uses_crate_version() {
        use clap::CommandFactory;
        assert_eq!(Cli::command().get_version(), Some(crate::VERSION));
    }

    #[test]
    fn test_format_json() {
        let cli = Cli::parse_from(["kuberef", "--format", "json"]);
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn test_flags_extend_config() {
        let cli = Cli::parse_from(["kuberef", "--skip-secrets", "external", "--no-fail"]);
        // No config file given and none in cwd is assumed here; flags
        // alone populate the config.
        let config = cli.lint_config().unwrap();
        assert!(config.skip_secrets.contains("external"));
        assert!(config.no_fail);
    }
}
