//! GitHub REST v3 client for repository creation and content writes.
//!
//! Provides an async client over the two endpoints the upload flow needs:
//! `POST /user/repos` and `PUT /repos/{owner}/{repo}/contents/{path}`.

pub mod client;
pub mod types;

pub use client::{Client, Error};
pub use types::{CreateRepository, PutContents, Repository};
