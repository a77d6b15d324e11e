//! lp-core: the streaming indicator pipeline core of a backtesting engine.
//!
//! A lazy, bar-synchronous dataflow graph of [`line`] buffers on which
//! technical indicators are composed and evaluated in two equivalent
//! modes — per-bar streaming ([`indicator::tick`]) and whole-history
//! batch ([`indicator::run_once`]) — with bit-identical results. See
//! [`indicators`] for the concrete indicator family and [`pipeline`] for
//! the arena-based driver that ties nodes together into a run.
//!
//! # Layers
//!
//! - [`line`] — a single append-only numeric channel with bar-relative
//!   (`ago`) indexing and NaN-as-"not yet valid" semantics.
//! - [`collection`] — an ordered, optionally-aliased set of lines.
//! - [`feed`] — a [`collection::LineCollection`] fixed to the seven
//!   OHLCV channels.
//! - [`indicator`] — the [`indicator::Indicator`] trait and the two
//!   evaluation-mode drivers.
//! - [`kernel`] — small numeric primitives shared across indicators.
//! - [`indicators`] — the concrete indicator family.
//! - [`pipeline`] — the arena that owns a run's nodes and drives them.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod collection;
pub mod error;
pub mod feed;
pub mod indicator;
pub mod indicators;
pub mod kernel;
pub mod line;
pub mod pipeline;
pub mod types;

pub use collection::LineCollection;
pub use error::{PipelineError, Result};
pub use feed::DataFeed;
pub use indicator::Indicator;
pub use line::{new_line_handle, Line, LineHandle};
pub use pipeline::Pipeline;
pub use types::Float;
