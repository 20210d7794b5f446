#![doc = "boxoffice-sync-core: core pipeline for boxoffice-sync."]

//! This crate holds the sync pipeline, its data model and the storage seam.
//! It has no database driver dependency: the CLI crate supplies the
//! [`contract::DocumentStore`] implementation.
//!
//! # Usage
//! Build a [`config::SyncConfig`], hand it and a store to
//! [`synchronise::SyncEngine::new`], then call `synchronise().await`.

pub mod config;
pub mod contract;
pub mod indexes;
pub mod locate;
pub mod snapshot;
pub mod synchronise;
pub mod transform;
