//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod media_asset_repo;

pub use media_asset_repo::MediaAssetRepo;
