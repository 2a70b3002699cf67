//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `PDFTABLES_CONFIG`
//! environment variable. A missing file is not an error: every field has a default.
//!
//! ## Loading Priority
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `PDFTABLES_` override YAML values
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `PDFTABLES_EXTRACTION__JAR=/opt/tabula/tabula.jar` sets the `extraction.jar` field.
//!
//! ## Example
//!
//! ```yaml
//! host: 0.0.0.0
//! port: 5001
//! debug: false
//! uploads:
//!   max_file_size: 52428800
//!   temp_dir: /var/tmp/pdftables
//! extraction:
//!   java: /usr/bin/java
//!   jar: /opt/tabula/tabula-1.0.5-jar-with-dependencies.jar
//!   jvm_args: ["-Djava.awt.headless=true", "-Xmx1g"]
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "PDFTABLES_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Development mode: lowers the default log level to `debug`
    pub debug: bool,
    /// Enable OpenTelemetry OTLP export for distributed tracing
    pub enable_otel_export: bool,
    /// Upload handling
    pub uploads: UploadsConfig,
    /// Table extraction backend
    pub extraction: ExtractionConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadsConfig {
    /// Maximum accepted size of the uploaded PDF, in bytes
    pub max_file_size: u64,
    /// Directory uploads are staged in while extraction runs. Defaults to the system temp dir.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_dir: Option<PathBuf>,
}

/// Settings for the tabula-java extractor.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractionConfig {
    /// Java executable used to run tabula
    pub java: PathBuf,
    /// Path to the tabula-java jar (with dependencies)
    pub jar: PathBuf,
    /// Extra arguments passed to the JVM before `-jar`
    pub jvm_args: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5001,
            debug: false,
            enable_otel_export: false,
            uploads: UploadsConfig::default(),
            extraction: ExtractionConfig::default(),
        }
    }
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            max_file_size: 50 * 1024 * 1024, // 50 MB
            temp_dir: None,
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            java: PathBuf::from("java"),
            jar: PathBuf::from("tabula.jar"),
            jvm_args: vec!["-Djava.awt.headless=true".to_string()],
        }
    }
}

impl Config {
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.port == 0 {
            anyhow::bail!("Config validation: port must be non-zero");
        }

        if self.uploads.max_file_size == 0 {
            anyhow::bail!("Config validation: uploads.max_file_size must be greater than zero");
        }

        if let Some(dir) = &self.uploads.temp_dir
            && !dir.is_dir()
        {
            anyhow::bail!(
                "Config validation: uploads.temp_dir {} does not exist or is not a directory",
                dir.display()
            );
        }

        if self.extraction.jar.as_os_str().is_empty() {
            anyhow::bail!("Config validation: extraction.jar cannot be empty");
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // PDFTABLES_CONFIG names the file itself, it is not a config key
            .merge(Env::prefixed("PDFTABLES_").ignore(&["config"]).split("__"))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn args(config: &str) -> Args {
        Args {
            config: config.to_string(),
            validate: false,
        }
    }

    #[test]
    fn test_defaults_without_config_file() {
        Jail::expect_with(|_jail| {
            let config = Config::load(&args("missing.yaml"))?;

            assert_eq!(config.bind_address(), "127.0.0.1:5001");
            assert!(!config.debug);
            assert_eq!(config.uploads.max_file_size, 50 * 1024 * 1024);
            assert_eq!(config.uploads.temp_dir, None);
            assert_eq!(config.extraction.java, PathBuf::from("java"));
            assert_eq!(config.extraction.jvm_args, vec!["-Djava.awt.headless=true".to_string()]);

            Ok(())
        });
    }

    #[test]
    fn test_yaml_config() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
host: 0.0.0.0
port: 8080
debug: true
uploads:
  max_file_size: 1024
extraction:
  java: /usr/lib/jvm/bin/java
  jar: /opt/tabula.jar
  jvm_args: ["-Xmx256m"]
"#,
            )?;

            let config = Config::load(&args("test.yaml"))?;

            assert_eq!(config.bind_address(), "0.0.0.0:8080");
            assert!(config.debug);
            assert_eq!(config.uploads.max_file_size, 1024);
            assert_eq!(config.extraction.java, PathBuf::from("/usr/lib/jvm/bin/java"));
            assert_eq!(config.extraction.jar, PathBuf::from("/opt/tabula.jar"));
            assert_eq!(config.extraction.jvm_args, vec!["-Xmx256m".to_string()]);

            Ok(())
        });
    }

    #[test]
    fn test_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
port: 8080
extraction:
  jar: /opt/tabula.jar
"#,
            )?;

            jail.set_env("PDFTABLES_PORT", "9090");
            jail.set_env("PDFTABLES_EXTRACTION__JAVA", "/opt/java/bin/java");
            jail.set_env("PDFTABLES_CONFIG", "test.yaml");

            let config = Config::load(&args("test.yaml"))?;

            // Env vars should override
            assert_eq!(config.port, 9090);
            assert_eq!(config.extraction.java, PathBuf::from("/opt/java/bin/java"));

            // YAML values should be preserved
            assert_eq!(config.extraction.jar, PathBuf::from("/opt/tabula.jar"));

            Ok(())
        });
    }

    #[test]
    fn test_unknown_field_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "flavor: lattice\n")?;

            let result = Config::load(&args("test.yaml"));
            assert!(result.is_err());

            Ok(())
        });
    }

    #[test]
    fn test_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());

        let config = Config {
            port: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.uploads.max_file_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.uploads.temp_dir = Some(PathBuf::from("/nonexistent/pdftables/uploads"));
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.extraction.jar = PathBuf::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_temp_dir_must_exist() {
        Jail::expect_with(|jail| {
            let staging = jail.directory().join("staging");
            std::fs::create_dir(&staging).map_err(|e| e.to_string())?;
            jail.create_file("test.yaml", &format!("uploads:\n  temp_dir: {}\n", staging.display()))?;

            let config = Config::load(&args("test.yaml"))?;
            assert_eq!(config.uploads.temp_dir, Some(staging));

            Ok(())
        });
    }
}
