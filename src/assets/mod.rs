//! Asset loading: images and OBJ meshes
//!
//! The asset boundary is the only fallible surface of the crate; loaders
//! return errors and leave the renderer untouched on failure.

pub mod image_loader;
pub mod obj_loader;

pub use image_loader::ImageData;
pub use obj_loader::{ObjLoader, ObjOptions};

use thiserror::Error;

/// Errors raised while loading or saving assets
#[derive(Error, Debug)]
pub enum AssetError {
    /// The requested asset does not exist
    #[error("asset not found: {0}")]
    NotFound(String),
    /// Reading or decoding failed
    #[error("failed to load asset: {0}")]
    LoadFailed(String),
    /// The data was read but is not usable
    #[error("invalid asset data: {0}")]
    InvalidData(String),
}
