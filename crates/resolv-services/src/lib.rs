//! The finder and downloader services, their config-driven locator wiring,
//! and the generic queue-loop worker harness that hosts them.
//!
//! Each service's `handle` is pure request/response logic with no direct
//! maestro dependency; a matching free function (`file_found`,
//! `file_retrieved`) applies its result back to the maestro. The worker
//! harness (`worker`) is what a caller uses to drive a service from a
//! queue of maestro-derived messages, one handler invocation per message,
//! strictly in arrival order.

mod downloader;
mod finder;
mod locator_config;
mod worker;

pub use downloader::{DownloadedArtifact, Downloader, DownloaderError, file_retrieved};
pub use finder::{file_found, Finder, FinderError, FinderRecord};
pub use locator_config::{get_locator, LocatorConfig};
pub use worker::{ServiceWorker, WorkerPool};
