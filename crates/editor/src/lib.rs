#![deny(unsafe_code)]
//! Editing session for the retouch editor.
//!
//! This crate sits between `retouch-core` (pure pixel operations) and the
//! hosts that drive an editor, such as the `retouch` CLI. It decodes PNG and
//! JPEG bytes into a working image, owns the session lifecycle and encodes
//! the flattened result back to PNG.

pub mod config;
pub mod export;
pub mod loader;
pub mod session;

pub use config::EditorConfig;
pub use export::{encode_png, write_png, DEFAULT_EXPORT_NAME};
pub use loader::{constrain_dimensions, LoadedImage, DEFAULT_MAX_SIDE};
pub use session::{EditorSession, Lifecycle, ResetHook};
