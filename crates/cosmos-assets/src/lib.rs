//! Best-effort background texture decoding.

pub mod loader;

pub use loader::{AssetLoadError, DecodedTexture, TextureLoader, decode_file};
