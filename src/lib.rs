//! Lumenview - image cache and decode scheduling core
//!
//! This library provides the engine underneath the Lumenview desktop image
//! viewer: a byte-bounded LRU cache of decoded images, a priority thread
//! pool for decode and prefetch work, and the SIMD pixel-conversion path
//! used while decoding.
//!
//! # High-Level API
//!
//! Most callers wire everything together through the [`pipeline`] module:
//!
//! ```ignore
//! use std::sync::Arc;
//! use lumenview::cache::ImageCache;
//! use lumenview::decode::ImageDecoder;
//! use lumenview::pipeline::ImagePipeline;
//! use lumenview::pool::{PoolConfig, ThreadPool};
//!
//! let cache = Arc::new(ImageCache::new(512 * 1024 * 1024));
//! let pool = Arc::new(ThreadPool::new(PoolConfig::default()));
//! let pipeline = ImagePipeline::new(cache, pool, Arc::new(ImageDecoder::new()));
//!
//! pipeline.request(&path, |image| upload_to_gpu(&image));
//! pipeline.prefetch_around(&path);
//! ```

pub mod cache;
pub mod config;
pub mod convert;
pub mod decode;
pub mod logging;
pub mod pipeline;
pub mod pool;

/// Version of the Lumenview core library.
///
/// Defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
