//! Asset Manager: the PCM Producer (spec.md §2.1) feeding voices with
//! interleaved PCM, either fully resident or pulled on demand from a
//! decoder.
pub mod asset_manager;
pub mod asset_pkg;
pub mod decoder;
pub mod loader;
pub mod pkg_format;
pub mod sfx;
pub mod sfx_loader;
pub mod streaming_loader;
pub mod util;

pub use asset_manager::{AssetManager, Error};
pub use decoder::{DecodedFormat, PcmDecoder, RawPcmDecoder};
pub use util::AssetError;

#[cfg(feature = "streaming")]
pub use decoder::SymphoniaDecoder;

#[cfg(feature = "streaming")]
pub use streaming_loader::StreamingAsset;
