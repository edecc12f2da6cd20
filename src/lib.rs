//! # Standards Catalog
//!
//! Normalizes a multi-sheet workbook of cybersecurity control standards
//! (NIST, ISO/IEC, IEC 62443, ...) into one flat, searchable catalog.
//!
//! Each sheet of the workbook uses its own column layout. The pipeline maps
//! every sheet onto a single [`models::CanonicalRecord`] shape through
//! declared fallback chains, drops empty rows, deduplicates, and derives the
//! section and source filter vocabularies (sections in numeric-aware order).
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌────────────┐   ┌───────────┐   ┌──────────────┐
//! │ Workbook │──▶│ Normalize  │──▶│  Dataset  │──▶│    Store     │
//! │ (OOXML)  │   │ per sheet  │   │ dedup/sort│   │  (immutable) │
//! └──────────┘   └────────────┘   └───────────┘   └──────┬───────┘
//!                                                        │
//!                                     ┌──────────────────┤
//!                                     ▼                  ▼
//!                                ┌──────────┐       ┌──────────┐
//!                                │   CLI    │       │   HTTP   │
//!                                │ (stdcat) │       │  (axum)  │
//!                                └──────────┘       └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! stdcat summary                     # per-sheet ingestion report
//! stdcat filters                     # section / source vocabularies
//! stdcat search "authentication" --source NIST
//! stdcat serve                       # web page + JSON API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Raw sheet and canonical record types |
//! | [`workbook`] | OOXML workbook reading and cell coercion |
//! | [`natsort`] | Numeric-aware string ordering |
//! | [`normalize`] | Per-sheet normalization and fallback chains |
//! | [`dataset`] | Whole-workbook build: dedup and vocabularies |
//! | [`store`] | Immutable catalog and swappable handle |
//! | [`search`] | Text and filter matching, search commands |
//! | [`server`] | HTTP server |
//! | [`summary`] | Ingestion report command |
//! | [`logging`] | `tracing` subscriber setup |

pub mod config;
pub mod dataset;
pub mod logging;
pub mod models;
pub mod natsort;
pub mod normalize;
pub mod search;
pub mod server;
pub mod store;
pub mod summary;
pub mod workbook;
