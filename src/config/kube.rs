//! Cluster connection resolution.
//!
//! # Responsibilities
//! - Locate cluster credentials in the ambient environment
//! - Turn the selected kubeconfig context into a `ConnectionConfig`
//!
//! # Lookup Order
//! 1. `--kubeconfig` path
//! 2. `KUBECONFIG` environment variable (first existing entry)
//! 3. In-cluster service account
//! 4. `$HOME/.kube/config`

use std::env;
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::loader::{load_kubeconfig, LoadError};

/// Default mount point of the service account secrets inside a pod.
pub const SERVICE_ACCOUNT_DIR: &str = "/var/run/secrets/kubernetes.io/serviceaccount";

/// Error type for connection resolution.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("{}: no current-context set", path.display())]
    NoCurrentContext { path: PathBuf },

    #[error("{}: context {name:?} not found", path.display())]
    UnknownContext { path: PathBuf, name: String },

    #[error("{}: cluster {name:?} not found", path.display())]
    UnknownCluster { path: PathBuf, name: String },

    #[error("{}: user {name:?} not found", path.display())]
    UnknownUser { path: PathBuf, name: String },

    #[error("failed to read token file {}: {source}", path.display())]
    TokenFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not locate a kubeconfig: pass --kubeconfig, set KUBECONFIG, or run in-cluster")]
    NotFound,
}

/// Where a connection configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Flag(PathBuf),
    KubeconfigEnv(PathBuf),
    InCluster,
    HomeDir(PathBuf),
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Flag(path) => write!(f, "--kubeconfig {}", path.display()),
            ConfigSource::KubeconfigEnv(path) => write!(f, "KUBECONFIG {}", path.display()),
            ConfigSource::InCluster => f.write_str("in-cluster service account"),
            ConfigSource::HomeDir(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Credentials and endpoint needed to reach the managed cluster.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub source: ConfigSource,
    /// API server URL.
    pub server: String,
    /// Namespace of the selected context, if any.
    pub namespace: Option<String>,
    pub ca_file: Option<PathBuf>,
    /// Base64-encoded CA bundle.
    pub ca_data: Option<String>,
    pub insecure_skip_tls_verify: bool,
    pub bearer_token: Option<String>,
    pub client_certificate_file: Option<PathBuf>,
    pub client_certificate_data: Option<String>,
    pub client_key_file: Option<PathBuf>,
    pub client_key_data: Option<String>,
}

impl ConnectionConfig {
    /// A configuration with only a server URL set.
    pub fn new(source: ConfigSource, server: impl Into<String>) -> Self {
        Self {
            source,
            server: server.into(),
            namespace: None,
            ca_file: None,
            ca_data: None,
            insecure_skip_tls_verify: false,
            bearer_token: None,
            client_certificate_file: None,
            client_certificate_data: None,
            client_key_file: None,
            client_key_data: None,
        }
    }
}

// Credentials never reach the logs.
impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |value: &Option<String>| value.as_ref().map(|_| "<redacted>");
        f.debug_struct("ConnectionConfig")
            .field("source", &self.source)
            .field("server", &self.server)
            .field("namespace", &self.namespace)
            .field("ca_file", &self.ca_file)
            .field("ca_data", &redact(&self.ca_data))
            .field("insecure_skip_tls_verify", &self.insecure_skip_tls_verify)
            .field("bearer_token", &redact(&self.bearer_token))
            .field("client_certificate_file", &self.client_certificate_file)
            .field("client_certificate_data", &redact(&self.client_certificate_data))
            .field("client_key_file", &self.client_key_file)
            .field("client_key_data", &redact(&self.client_key_data))
            .finish()
    }
}

/// Resolves how to reach the cluster.
pub trait ConnectionResolver {
    fn resolve(&self) -> Result<ConnectionConfig, ConnectionError>;
}

/// In-cluster service account environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InClusterEnv {
    pub host: String,
    pub port: String,
    /// Directory holding `token` and `ca.crt`.
    pub secrets_dir: PathBuf,
}

impl InClusterEnv {
    /// Read `KUBERNETES_SERVICE_HOST`/`KUBERNETES_SERVICE_PORT`.
    pub fn from_env() -> Option<Self> {
        let host = env::var("KUBERNETES_SERVICE_HOST").ok().filter(|v| !v.is_empty())?;
        let port = env::var("KUBERNETES_SERVICE_PORT").ok().filter(|v| !v.is_empty())?;
        Some(Self {
            host,
            port,
            secrets_dir: PathBuf::from(SERVICE_ACCOUNT_DIR),
        })
    }

    fn server(&self) -> String {
        if self.host.contains(':') {
            format!("https://[{}]:{}", self.host, self.port)
        } else {
            format!("https://{}:{}", self.host, self.port)
        }
    }
}

/// Resolver following the conventional kubeconfig lookup order.
#[derive(Debug, Clone, Default)]
pub struct KubeconfigResolver {
    explicit: Option<PathBuf>,
    kubeconfig_env: Option<OsString>,
    in_cluster: Option<InClusterEnv>,
    home: Option<PathBuf>,
}

impl KubeconfigResolver {
    /// A resolver that only consults `explicit`.
    pub fn new(explicit: Option<PathBuf>) -> Self {
        Self {
            explicit,
            ..Self::default()
        }
    }

    /// A resolver seeded from the process environment.
    pub fn from_env(explicit: Option<PathBuf>) -> Self {
        Self {
            explicit,
            kubeconfig_env: env::var_os("KUBECONFIG"),
            in_cluster: InClusterEnv::from_env(),
            home: dirs::home_dir(),
        }
    }

    pub fn with_kubeconfig_env(mut self, value: impl Into<OsString>) -> Self {
        self.kubeconfig_env = Some(value.into());
        self
    }

    pub fn with_in_cluster(mut self, in_cluster: InClusterEnv) -> Self {
        self.in_cluster = Some(in_cluster);
        self
    }

    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }

    fn resolve_in_cluster(env: &InClusterEnv) -> Result<ConnectionConfig, ConnectionError> {
        let token_path = env.secrets_dir.join("token");
        let token = fs::read_to_string(&token_path).map_err(|source| {
            ConnectionError::TokenFile {
                path: token_path.clone(),
                source,
            }
        })?;

        let ca_path = env.secrets_dir.join("ca.crt");
        let namespace = fs::read_to_string(env.secrets_dir.join("namespace"))
            .ok()
            .map(|ns| ns.trim().to_string())
            .filter(|ns| !ns.is_empty());

        let mut config = ConnectionConfig::new(ConfigSource::InCluster, env.server());
        config.bearer_token = Some(token.trim().to_string());
        config.ca_file = ca_path.is_file().then_some(ca_path);
        config.namespace = namespace;
        Ok(config)
    }
}

impl ConnectionResolver for KubeconfigResolver {
    fn resolve(&self) -> Result<ConnectionConfig, ConnectionError> {
        if let Some(path) = self.explicit.as_ref().filter(|p| !p.as_os_str().is_empty()) {
            return from_kubeconfig(path, ConfigSource::Flag(path.clone()));
        }

        if let Some(list) = &self.kubeconfig_env {
            if let Some(path) = env::split_paths(list).find(|p| p.is_file()) {
                return from_kubeconfig(&path, ConfigSource::KubeconfigEnv(path.clone()));
            }
        }

        if let Some(in_cluster) = &self.in_cluster {
            return Self::resolve_in_cluster(in_cluster);
        }

        if let Some(home) = &self.home {
            let path = home.join(".kube").join("config");
            if path.is_file() {
                return from_kubeconfig(&path, ConfigSource::HomeDir(path.clone()));
            }
        }

        Err(ConnectionError::NotFound)
    }
}

/// Build a connection from the current context of the kubeconfig at `path`.
pub fn from_kubeconfig(path: &Path, source: ConfigSource) -> Result<ConnectionConfig, ConnectionError> {
    let kubeconfig = load_kubeconfig(path)?;

    let context_name = kubeconfig
        .current_context
        .as_deref()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ConnectionError::NoCurrentContext {
            path: path.to_path_buf(),
        })?;
    let context = kubeconfig
        .context(context_name)
        .ok_or_else(|| ConnectionError::UnknownContext {
            path: path.to_path_buf(),
            name: context_name.to_string(),
        })?;
    let cluster = kubeconfig
        .cluster(&context.cluster)
        .ok_or_else(|| ConnectionError::UnknownCluster {
            path: path.to_path_buf(),
            name: context.cluster.clone(),
        })?;
    let user = kubeconfig
        .user(&context.user)
        .ok_or_else(|| ConnectionError::UnknownUser {
            path: path.to_path_buf(),
            name: context.user.clone(),
        })?;

    // Relative file references are relative to the kubeconfig itself.
    let base = path.parent().unwrap_or_else(|| Path::new("."));

    let bearer_token = match (&user.token, &user.token_file) {
        (Some(token), _) => Some(token.clone()),
        (None, Some(file)) => {
            let file = base.join(file);
            let token = fs::read_to_string(&file)
                .map_err(|source| ConnectionError::TokenFile { path: file, source })?;
            Some(token.trim().to_string())
        }
        (None, None) => None,
    };

    let mut config = ConnectionConfig::new(source, cluster.server.clone());
    config.namespace = context.namespace.clone();
    config.ca_file = cluster.certificate_authority.as_ref().map(|ca| base.join(ca));
    config.ca_data = cluster.certificate_authority_data.clone();
    config.insecure_skip_tls_verify = cluster.insecure_skip_tls_verify;
    config.bearer_token = bearer_token;
    config.client_certificate_file = user.client_certificate.as_ref().map(|cert| base.join(cert));
    config.client_certificate_data = user.client_certificate_data.clone();
    config.client_key_file = user.client_key.as_ref().map(|key| base.join(key));
    config.client_key_data = user.client_key_data.clone();
    Ok(config)
}
