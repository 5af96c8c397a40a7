use std::collections::BTreeMap;

use log::*;

/// Fixed first segment of the injection key.
pub const INJECTION_KEY_PREFIX: &str = "username";
pub const DEFAULT_INJECTION_SUFFIX: &str = "cxwen.com";
pub const DEFAULT_INJECTION_TYPE: &str = "label";

pub const INJECTION_TYPE_ENV: &str = "INJECTION_TYPE";
/// Misspelt variable read by earlier deployments, still honoured.
pub const LEGACY_INJECTION_TYPE_ENV: &str = "INJECTIONT_TYPE";
pub const INJECTION_SUFFIX_ENV: &str = "INJECTION_SUFFIX";

pub const DEFAULT_CERT_PATH: &str = "/etc/webhook/certs/cert.pem";
pub const DEFAULT_KEY_PATH: &str = "/etc/webhook/certs/key.pem";
pub const DEFAULT_PORT: u16 = 8443;

/// Metadata field the username can be written into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InjectionTarget {
    Annotation,
    Label,
}

impl InjectionTarget {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "annotation" => Some(InjectionTarget::Annotation),
            "label" => Some(InjectionTarget::Label),
            _ => None,
        }
    }
}

/// Entries to add to the annotations and labels of one object.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Injections {
    pub annotations: BTreeMap<String, String>,
    pub labels: BTreeMap<String, String>,
}

/// Which fields get the username and under which key.
///
/// Built once at startup and shared read-only by every review.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InjectionSpec {
    annotate: bool,
    label: bool,
    key: String,
}

impl InjectionSpec {
    /// `types` is a comma-separated list of `annotation` and `label`; unknown
    /// entries are skipped.
    pub fn new(types: &str, suffix: &str) -> Self {
        let mut spec = Self {
            annotate: false,
            label: false,
            key: format!("{}.{}", INJECTION_KEY_PREFIX, suffix),
        };

        for entry in types.split(',').map(str::trim) {
            match InjectionTarget::parse(entry) {
                Some(InjectionTarget::Annotation) => spec.annotate = true,
                Some(InjectionTarget::Label) => spec.label = true,
                None => warn!("Ignoring unknown injection type '{}'", entry),
            }
        }

        spec
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let types = non_empty(INJECTION_TYPE_ENV)
            .or_else(|| non_empty(LEGACY_INJECTION_TYPE_ENV))
            .unwrap_or_else(|| DEFAULT_INJECTION_TYPE.to_string());
        let suffix = non_empty(INJECTION_SUFFIX_ENV)
            .unwrap_or_else(|| DEFAULT_INJECTION_SUFFIX.to_string());

        Self::new(&types, &suffix)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn injects(&self, target: InjectionTarget) -> bool {
        match target {
            InjectionTarget::Annotation => self.annotate,
            InjectionTarget::Label => self.label,
        }
    }

    /// Per-field entries for `username`; disabled fields get an empty map.
    pub fn injections(&self, username: &str) -> Injections {
        let mut injections = Injections::default();
        if self.annotate {
            injections
                .annotations
                .insert(self.key.clone(), username.to_string());
        }
        if self.label {
            injections
                .labels
                .insert(self.key.clone(), username.to_string());
        }
        injections
    }
}

impl Default for InjectionSpec {
    fn default() -> Self {
        Self::new(DEFAULT_INJECTION_TYPE, DEFAULT_INJECTION_SUFFIX)
    }
}

/// Listener settings for the binary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub cert_path: String,
    pub key_path: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            cert_path: lookup("TLS_CERT_PATH").unwrap_or_else(|| DEFAULT_CERT_PATH.to_string()),
            key_path: lookup("TLS_KEY_PATH").unwrap_or_else(|| DEFAULT_KEY_PATH.to_string()),
            port: lookup("PORT")
                .and_then(|p| p.parse::<u16>().ok())
                .unwrap_or(DEFAULT_PORT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_injection_spec_from_lookup() {
        let test_cases = vec![
            ("defaults", vec![], false, true, "username.cxwen.com"),
            (
                "annotation only",
                vec![("INJECTION_TYPE", "annotation")],
                true,
                false,
                "username.cxwen.com",
            ),
            (
                "both with spaces",
                vec![("INJECTION_TYPE", "annotation, label")],
                true,
                true,
                "username.cxwen.com",
            ),
            (
                "legacy variable",
                vec![("INJECTIONT_TYPE", "annotation,label")],
                true,
                true,
                "username.cxwen.com",
            ),
            (
                "new variable wins over legacy",
                vec![("INJECTION_TYPE", "annotation"), ("INJECTIONT_TYPE", "label")],
                true,
                false,
                "username.cxwen.com",
            ),
            (
                "empty type falls back to label",
                vec![("INJECTION_TYPE", "")],
                false,
                true,
                "username.cxwen.com",
            ),
            (
                "custom suffix",
                vec![("INJECTION_SUFFIX", "example.org")],
                false,
                true,
                "username.example.org",
            ),
            (
                "unknown entries ignored",
                vec![("INJECTION_TYPE", "labels,annotation")],
                true,
                false,
                "username.cxwen.com",
            ),
        ];

        for (name, vars, annotate, label, key) in test_cases {
            let spec = InjectionSpec::from_lookup(lookup_from(&vars));
            assert_eq!(
                spec.injects(InjectionTarget::Annotation),
                annotate,
                "Failed test case: {}",
                name
            );
            assert_eq!(
                spec.injects(InjectionTarget::Label),
                label,
                "Failed test case: {}",
                name
            );
            assert_eq!(spec.key(), key, "Failed test case: {}", name);
        }
    }

    #[test]
    fn test_injections_only_fill_enabled_fields() {
        let spec = InjectionSpec::new("label", "cxwen.com");
        let injections = spec.injections("alice");
        assert!(injections.annotations.is_empty());
        assert_eq!(
            injections.labels.get("username.cxwen.com"),
            Some(&"alice".to_string())
        );

        let spec = InjectionSpec::new("annotation,label", "cxwen.com");
        let injections = spec.injections("bob");
        assert_eq!(injections.annotations, injections.labels);
        assert_eq!(injections.annotations.len(), 1);
    }

    #[test]
    fn test_server_config_from_lookup() {
        let config = ServerConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config.cert_path, DEFAULT_CERT_PATH);
        assert_eq!(config.key_path, DEFAULT_KEY_PATH);
        assert_eq!(config.port, DEFAULT_PORT);

        let config = ServerConfig::from_lookup(lookup_from(&[
            ("TLS_CERT_PATH", "/tmp/tls.crt"),
            ("TLS_KEY_PATH", "/tmp/tls.key"),
            ("PORT", "443"),
        ]));
        assert_eq!(config.cert_path, "/tmp/tls.crt");
        assert_eq!(config.key_path, "/tmp/tls.key");
        assert_eq!(config.port, 443);

        let config = ServerConfig::from_lookup(lookup_from(&[("PORT", "not-a-port")]));
        assert_eq!(config.port, DEFAULT_PORT);
    }
}
