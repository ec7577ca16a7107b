// src/lib.rs

//! Depth-bounded crawler over a mock site graph.
//!
//! The [`crawl`] module holds the two crawlers (sequential and concurrent)
//! and the pieces they share; [`config`] reads settings and the site graph.

pub mod config;
pub mod crawl;
pub mod error;
