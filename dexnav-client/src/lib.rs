//! dexnav client: progressive detail loading, cache-first history
//! navigation and scroll restoration for the catalog browser.

pub mod config;
pub mod error;
pub mod loader;
pub mod navigation;
pub mod preload;
pub mod rest;
pub mod scroll;
pub mod services;
pub mod telemetry;

pub use config::{ClientConfig, ConfigError};
pub use error::{ClientError, ClientResult};
pub use loader::{DetailView, LoadPhase, ProgressiveLoader};
pub use navigation::{
    IntentSource, ListView, NavigationController, NavigationIntent, Resolution, ViewOrigin,
};
pub use preload::Preloader;
pub use rest::RestCatalogSource;
pub use scroll::ScrollTracker;
pub use services::Services;
