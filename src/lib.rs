//! Decoders for Infinity Engine style game resources.
//!
//! ```no_run
//! use ieres::{FormatRegistry, ParserSettings};
//! use std::fs::File;
//!
//! let registry = FormatRegistry::with_builtin_formats();
//! let mut file = File::open("AR0100.WED").unwrap();
//! let resource = registry.open(&mut file).unwrap();
//! resource
//!     .write_json(&mut std::io::stdout(), &ParserSettings::default())
//!     .unwrap();
//! ```

pub mod err;
pub mod format;
pub mod resref;
pub mod settings;
mod utils;
pub mod wed;

pub use err::{DeserializationError, Error, InvalidMagicLength, Result, SerializationError};
pub use format::{DecodeFn, FormatRegistry, Magic, RegisteredFormat, Resource};
pub use resref::ResRef;
pub use settings::ParserSettings;
pub use utils::ReadSeek;
pub use wed::Wed;

#[cfg(test)]
use std::sync::Once;

#[cfg(test)]
static LOGGER_INIT: Once = Once::new();

// Rust runs the tests concurrently, so unless we synchronize logging access
// it will crash when attempting to run `cargo test` with some logging facilities.
#[cfg(test)]
pub fn ensure_env_logger_initialized() {
    use std::io::Write;

    LOGGER_INIT.call_once(|| {
        let mut builder = env_logger::Builder::from_default_env();
        builder
            .format(|buf, record| writeln!(buf, "[{}] - {}", record.level(), record.args()))
            .init();
    });
}
