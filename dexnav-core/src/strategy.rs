//! Fetch strategy selection.
//!
//! Decides which record shape list and detail fetches request, as a pure
//! function of the build mode. Static builds bake their output once, so they
//! favour completeness; runtime builds favour latency on first paint and rely
//! on the progressive loader to upgrade later.

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Environment variable consulted when the build mode is not configured.
pub const BUILD_MODE_ENV: &str = "DEXNAV_BUILD_MODE";

static RESOLVED_MODE: OnceCell<BuildMode> = OnceCell::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildMode {
    Static,
    Runtime,
}

impl BuildMode {
    /// Interpret the raw environment signal. Anything unrecognised is runtime.
    pub fn from_signal(signal: Option<&str>) -> BuildMode {
        match signal.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("static") | Some("export") => BuildMode::Static,
            _ => BuildMode::Runtime,
        }
    }

    /// Resolve the process build mode from the environment, once.
    ///
    /// Later calls return the first answer even if the environment changed.
    pub fn resolve() -> BuildMode {
        *RESOLVED_MODE.get_or_init(|| {
            let signal = std::env::var(BUILD_MODE_ENV).ok();
            BuildMode::from_signal(signal.as_deref())
        })
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildMode::Static => f.write_str("static"),
            BuildMode::Runtime => f.write_str("runtime"),
        }
    }
}

impl FromStr for BuildMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "static" => Ok(BuildMode::Static),
            "runtime" => Ok(BuildMode::Runtime),
            other => Err(format!("unknown build mode '{}'", other)),
        }
    }
}

/// Richness of a fetched record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchShape {
    Partial,
    Full,
}

impl FetchShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchShape::Partial => "partial",
            FetchShape::Full => "full",
        }
    }
}

impl fmt::Display for FetchShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a page view is fetching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchKind {
    List,
    Detail,
}

/// Pick the shape to request for `kind` under `mode`.
pub fn select_shape(kind: FetchKind, mode: BuildMode) -> FetchShape {
    match (mode, kind) {
        (BuildMode::Static, FetchKind::List | FetchKind::Detail) => FetchShape::Full,
        (BuildMode::Runtime, FetchKind::List | FetchKind::Detail) => FetchShape::Partial,
    }
}
