//! Call-time backend selection.
//!
//! A [`BackendSelector`] never caches what it resolved: every facade call asks
//! again, so reconfiguring between requests takes effect on the next call.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use super::backend::BackendKind;

/// Environment variable consulted by [`BackendSelector::from_env`].
pub const DB_TYPE_ENV: &str = "DB_TYPE";

type Resolver = dyn Fn() -> Option<String> + Send + Sync;

/// Resolves the active backend from external configuration.
#[derive(Clone)]
pub struct BackendSelector {
    source: Source,
}

#[derive(Clone)]
enum Source {
    Fixed(BackendKind),
    Env(&'static str),
    Shared(Arc<RwLock<BackendKind>>),
    Custom(Arc<Resolver>),
}

impl BackendSelector {
    /// Reads `DB_TYPE` on every call.
    pub fn from_env() -> Self {
        Self::from_env_var(DB_TYPE_ENV)
    }

    /// Reads the named environment variable on every call.
    pub fn from_env_var(name: &'static str) -> Self {
        Self {
            source: Source::Env(name),
        }
    }

    /// Always resolves to `kind`.
    pub fn fixed(kind: BackendKind) -> Self {
        Self {
            source: Source::Fixed(kind),
        }
    }

    /// Resolves through a caller-supplied configuration lookup.
    ///
    /// The closure returns the raw configuration value, which is parsed the
    /// same way as the environment variable.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn() -> Option<String> + Send + Sync + 'static,
    {
        Self {
            source: Source::Custom(Arc::new(f)),
        }
    }

    /// Returns a selector that can be switched at runtime, and its switch.
    pub fn switchable(initial: BackendKind) -> (Self, BackendSwitch) {
        let cell = Arc::new(RwLock::new(initial));
        (
            Self {
                source: Source::Shared(Arc::clone(&cell)),
            },
            BackendSwitch(cell),
        )
    }

    /// Returns the backend to use for this call.
    pub fn resolve(&self) -> BackendKind {
        match &self.source {
            Source::Fixed(kind) => *kind,
            Source::Shared(cell) => *cell.read(),
            Source::Env(name) => parse_or_default(std::env::var(name).ok().as_deref()),
            Source::Custom(f) => parse_or_default(f().as_deref()),
        }
    }
}

impl Default for BackendSelector {
    fn default() -> Self {
        Self::from_env()
    }
}

impl fmt::Debug for BackendSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match &self.source {
            Source::Fixed(kind) => format!("fixed({kind})"),
            Source::Env(name) => format!("env({name})"),
            Source::Shared(cell) => format!("shared({})", *cell.read()),
            Source::Custom(_) => "custom".to_string(),
        };
        f.debug_struct("BackendSelector").field("source", &source).finish()
    }
}

/// Handle that switches a selector created by [`BackendSelector::switchable`].
#[derive(Debug, Clone)]
pub struct BackendSwitch(Arc<RwLock<BackendKind>>);

impl BackendSwitch {
    pub fn set(&self, kind: BackendKind) {
        *self.0.write() = kind;
    }

    pub fn get(&self) -> BackendKind {
        *self.0.read()
    }
}

fn parse_or_default(raw: Option<&str>) -> BackendKind {
    match raw.map(str::parse::<BackendKind>) {
        Some(Ok(kind)) => kind,
        Some(Err(reason)) => {
            debug!(%reason, default = %BackendKind::DEFAULT, "falling back to default backend");
            BackendKind::DEFAULT
        }
        None => BackendKind::DEFAULT,
    }
}
