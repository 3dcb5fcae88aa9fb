//! The TOML configuration file.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};
use confique::Config as _;

use crate::prelude::*;


/// Checked in order if neither `--config` nor `JOTTER_CONFIG_PATH` is given.
const DEFAULT_PATHS: &[&str] = &["config.toml", "/etc/jotter/config.toml"];

const CONFIG_PATH_ENV: &str = "JOTTER_CONFIG_PATH";

/// Jotter configuration. Relative paths in it are resolved against the
/// directory containing the file.
#[derive(Debug, confique::Config)]
pub(crate) struct Config {
    #[config(nested)]
    pub(crate) db: crate::db::DbConfig,

    #[config(nested)]
    pub(crate) http: crate::http::HttpConfig,

    #[config(nested)]
    pub(crate) log: crate::logger::LogConfig,
}

impl Config {
    /// Loads the file named by `JOTTER_CONFIG_PATH` or else the first
    /// existing one of `DEFAULT_PATHS`. Also returns the path used.
    pub(crate) fn from_env_or_default_locations() -> Result<(Self, PathBuf)> {
        let path = match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => PathBuf::from(path),
            None => DEFAULT_PATHS.iter()
                .map(PathBuf::from)
                .find(|p| p.exists())
                .ok_or_else(|| anyhow!(
                    "no config file given and none of {} exists",
                    DEFAULT_PATHS.join(", "),
                ))?,
        };

        Self::load_from(&path)
            .with_context(|| format!("failed to load config from '{}'", path.display()))
            .map(|config| (config, path))
    }

    /// Loads and validates the config file at `path`.
    pub(crate) fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = Config::from_file(path)
            .with_context(|| format!("invalid config file '{}'", path.display()))?;

        let dir = path.canonicalize()
            .context("failed to canonicalize config path")?
            .parent()
            .map(Path::to_owned)
            .ok_or_else(|| anyhow!("config file path has no parent"))?;
        config.make_paths_absolute(&dir);
        config.db.validate()?;

        Ok(config)
    }

    fn make_paths_absolute(&mut self, base: &Path) {
        let paths = [self.log.file.as_mut(), self.db.server_cert.as_mut()];
        for path in paths.into_iter().flatten() {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

/// Writes a documented config template with all default values to `path`,
/// or to stdout.
pub(crate) fn write_template(path: Option<&PathBuf>) -> Result<()> {
    let mut options = confique::toml::FormatOptions::default();
    options.general.nested_field_gap = 2;
    let template = confique::toml::template::<Config>(options);

    match path {
        Some(path) => {
            info!("Writing config template to '{}'", path.display());
            fs::write(path, template)
                .with_context(|| format!("failed to write '{}'", path.display()))?;
        }
        None => io::stdout().write_all(template.as_bytes())?,
    }

    Ok(())
}


#[cfg(test)]
mod tests {
    use confique::Config as _;
    use std::path::{Path, PathBuf};

    use crate::db::{StoreKind, TlsMode};
    use super::Config;

    type Partial = <Config as confique::Config>::Layer;

    fn try_parse(src: &str) -> anyhow::Result<Config> {
        let partial = toml::from_str::<Partial>(src)?;
        Ok(Config::builder().preloaded(partial).load()?)
    }

    fn parse(src: &str) -> Config {
        try_parse(src).expect("invalid config")
    }

    #[test]
    fn defaults() {
        let config = parse("");
        assert_eq!(config.db.store, StoreKind::Postgres);
        assert_eq!(config.db.tls_mode, TlsMode::On);
        assert_eq!(config.db.port, 5432);
        assert_eq!(config.http.port, 3080);
        assert_eq!(config.http.address.to_string(), "127.0.0.1");
        assert!(config.log.stdout);
        assert!(!config.log.log_http_headers);
    }

    #[test]
    fn memory_store() {
        let config = parse(r#"
            [db]
            store = "memory"

            [http]
            port = 4000
        "#);
        assert_eq!(config.db.store, StoreKind::Memory);
        assert_eq!(config.http.port, 4000);
    }

    #[test]
    fn unknown_store_is_rejected() {
        assert!(try_parse("[db]\nstore = \"mongo\"").is_err());
        assert!(try_parse("[log]\nfilters.jotter = \"loud\"").is_err());
    }

    #[test]
    fn cert_without_tls_is_rejected() {
        let config = parse(r#"
            [db]
            tls_mode = "off"
            server_cert = "db.pem"
        "#);
        assert!(config.db.validate().is_err());
    }

    #[test]
    fn relative_paths_are_resolved() {
        let mut config = parse(r#"
            [db]
            server_cert = "certs/db.pem"

            [log]
            file = "/var/log/jotter-${cmd}.log"
        "#);
        config.make_paths_absolute(Path::new("/etc/jotter"));
        assert_eq!(config.db.server_cert, Some(PathBuf::from("/etc/jotter/certs/db.pem")));
        assert_eq!(config.log.file, Some(PathBuf::from("/var/log/jotter-${cmd}.log")));
    }
}
