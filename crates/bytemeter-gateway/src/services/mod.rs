//! Demo handlers served behind the metering layer.

pub mod echo;
