//! Configuration file and its merge with command line options.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use si_descriptor::{SiContext, Standards};

/// File looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "si-inspect.toml";

/// Configuration file format.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub context: ContextSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Deserialize, Default)]
pub struct ContextSection {
    /// Comma separated, e.g. `"MPEG, DVB"`.
    pub standards: Option<String>,
    pub default_pds: Option<u32>,
    pub table_id: Option<u8>,
}

#[derive(Debug, Deserialize, Default)]
pub struct LoggingSection {
    pub level: Option<String>,
}

/// Context options given on the command line.
#[derive(Debug, Default)]
pub struct ContextOverrides {
    pub standards: Option<String>,
    pub pds: Option<u32>,
    pub table_id: Option<u8>,
}

pub fn load_config(path: &Path) -> Result<ConfigFile, Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)?;
    let config: ConfigFile = toml::from_str(&contents)?;
    Ok(config)
}

/// Explicit path, else the default file if present.
pub fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    explicit.map(Path::to_path_buf).or_else(|| {
        let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
        default_path.exists().then_some(default_path)
    })
}

/// Command line takes precedence over the file, the file over defaults.
pub fn build_context(
    cli: &ContextOverrides,
    file: &ContextSection,
) -> Result<SiContext, String> {
    let mut ctx = SiContext::default();

    if let Some(list) = cli.standards.as_deref().or(file.standards.as_deref()) {
        ctx.standards =
            Standards::parse_list(list).ok_or_else(|| format!("invalid standards list: {}", list))?;
    }
    if let Some(pds) = cli.pds.or(file.default_pds) {
        ctx.default_pds = pds;
    }
    ctx.table_id = cli.table_id.or(file.table_id);
    Ok(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_file() {
        let config: ConfigFile = toml::from_str(
            r#"
            [context]
            standards = "DVB, ISDB"
            default_pds = 0x55
            table_id = 0x40

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.context.standards.as_deref(), Some("DVB, ISDB"));
        assert_eq!(config.context.default_pds, Some(0x55));
        assert_eq!(config.context.table_id, Some(0x40));
        assert_eq!(config.logging.level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_empty_config_file() {
        let config: ConfigFile = toml::from_str("").unwrap();
        assert!(config.context.standards.is_none());
        assert!(config.logging.level.is_none());
    }

    #[test]
    fn test_cli_overrides_file() {
        let file = ContextSection {
            standards: Some("ISDB".to_string()),
            default_pds: Some(0x28),
            table_id: Some(0x42),
        };
        let cli = ContextOverrides {
            standards: None,
            pds: Some(0x55),
            table_id: None,
        };
        let ctx = build_context(&cli, &file).unwrap();
        assert_eq!(ctx.standards, Standards::ISDB);
        assert_eq!(ctx.default_pds, 0x55);
        assert_eq!(ctx.table_id, Some(0x42));
    }

    #[test]
    fn test_defaults_and_bad_standards() {
        let ctx = build_context(&ContextOverrides::default(), &ContextSection::default()).unwrap();
        assert_eq!(ctx, SiContext::default());

        let cli = ContextOverrides {
            standards: Some("DVB, DAB".to_string()),
            ..Default::default()
        };
        assert!(build_context(&cli, &ContextSection::default()).is_err());
    }
}
