use std::path::Path;

use anyhow::Context;
use coinmeta_resolver::ResolverConfig;
use coinmeta_store::RpcConfig;
use coinmeta_types::DEFAULT_ADDRESS_PREFIX;
use serde::{Deserialize, Serialize};

/// Settings read from the `--config` file.
///
/// ```toml
/// address_prefix = "txch"
///
/// [rpc]
/// url = "https://localhost:8555"
/// cert_path = "/path/to/private_full_node.crt"
/// key_path = "/path/to/private_full_node.key"
///
/// [resolver]
/// max_depth = 32
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub rpc: RpcConfig,
    pub resolver: ResolverConfig,
    pub address_prefix: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            rpc: RpcConfig::default(),
            resolver: ResolverConfig::default(),
            address_prefix: DEFAULT_ADDRESS_PREFIX.into(),
        }
    }
}

impl CliConfig {
    /// Read `path`, or fall back to defaults when no file is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Command-line flags win over the file.
    pub fn apply_overrides(&mut self, rpc_url: Option<String>, max_depth: Option<usize>) {
        if let Some(url) = rpc_url {
            self.rpc.url = url;
        }
        if let Some(depth) = max_depth {
            self.resolver.max_depth = depth;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_without_file() {
        let c = CliConfig::load(None).unwrap();
        assert_eq!(c, CliConfig::default());
        assert_eq!(c.address_prefix, "xch");
        assert_eq!(c.resolver.max_depth, 64);
        assert_eq!(c.rpc.url, "https://localhost:8555");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "address_prefix = \"txch\"\n\n[resolver]\nmax_depth = 5\n"
        )
        .unwrap();

        let c = CliConfig::load(Some(file.path())).unwrap();
        assert_eq!(c.address_prefix, "txch");
        assert_eq!(c.resolver.max_depth, 5);
        assert_eq!(c.rpc, RpcConfig::default());
    }

    #[test]
    fn rpc_section_is_read() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[rpc]\nurl = \"http://node:8555\"\ncert_path = \"a.crt\"\nkey_path = \"a.key\"\ntimeout_secs = 5\n"
        )
        .unwrap();

        let c = CliConfig::load(Some(file.path())).unwrap();
        assert_eq!(c.rpc.url, "http://node:8555");
        assert_eq!(c.rpc.cert_path.as_deref(), Some(Path::new("a.crt")));
        assert_eq!(c.rpc.timeout_secs, 5);
        assert!(c.rpc.accept_invalid_certs);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = CliConfig::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(err.to_string().contains("reading config"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[resolver]\nmax_depth = \"deep\"").unwrap();
        assert!(CliConfig::load(Some(file.path())).is_err());
    }

    #[test]
    fn flags_override_file() {
        let mut c = CliConfig::default();
        c.apply_overrides(Some("http://other:1".into()), Some(2));
        assert_eq!(c.rpc.url, "http://other:1");
        assert_eq!(c.resolver.max_depth, 2);

        c.apply_overrides(None, None);
        assert_eq!(c.rpc.url, "http://other:1");
    }
}
