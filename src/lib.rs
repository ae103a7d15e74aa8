//! # VisaMonk Gateway
//!
//! An authenticated process-RPC gateway for a retrieval-augmented chat
//! assistant.
//!
//! The gateway sits between HTTP clients (the chat widget and the admin
//! panel) and a set of out-of-process workers that do the heavy lifting:
//! web scraping, document ingestion, vector reindexing, chat inference,
//! and speech synthesis. Each worker is a short-lived process driven over
//! a JSON-on-stdio contract; the gateway owns the on-disk pipeline state
//! those workers produce and consume.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────────┐   ┌──────────────┐
//! │  HTTP    │──▶│   Gateway     │──▶│   Workers    │
//! │ clients  │   │ auth + routes │   │ (one process │
//! └──────────┘   └──────┬────────┘   │  per call)   │
//!                       │            └──────┬───────┘
//!                       ▼                   ▼
//!                ┌─────────────────────────────────┐
//!                │  data/   scraped_data/  vector- │
//!                │  + SQLite        store/         │
//!                └─────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! vmgw init                     # create the SQLite store
//! vmgw workers                  # check worker script health
//! vmgw serve                    # start the HTTP gateway
//! vmgw files                    # list uploaded + scraped assets
//! vmgw reindex                  # rebuild the vector index
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`auth`] | Signed bearer-token sessions |
//! | [`worker`] | Process-per-call worker bridge |
//! | [`store`] | On-disk pipeline state (assets, SQLite, index) |
//! | [`fallback`] | Synthetic chat replies for inference outages |
//! | [`server`] | HTTP gateway (public endpoints) |
//! | [`admin`] | HTTP gateway (admin endpoints) |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod admin;
pub mod auth;
pub mod config;
pub mod db;
pub mod fallback;
pub mod migrate;
pub mod models;
pub mod server;
pub mod store;
pub mod worker;
