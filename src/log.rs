//! Logging interface, contingent on the `defmt` feature
//!
//! Without `defmt`, the macros expand to nothing. Only pass arguments that
//! implement `defmt::Format`.

macro_rules! debug {
    ($($args:tt)*) => {
        #[cfg(feature = "defmt")]
        ::defmt::debug!($($args)*)
    };
}

macro_rules! warn {
    ($($args:tt)*) => {
        #[cfg(feature = "defmt")]
        ::defmt::warn!($($args)*)
    };
}
