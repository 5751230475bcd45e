// Shared helpers: byte sources and text decoding

pub mod encoding;
pub mod io;
