//! Bounded numeric wrappers for validated configuration.

use std::fmt;

/// Out-of-range error for bounded numeric wrappers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundsError<T> {
    /// Raw value provided.
    pub value: T,
    /// Inclusive minimum.
    pub min: T,
    /// Inclusive maximum.
    pub max: T,
}

impl<T: fmt::Display> fmt::Display for BoundsError<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "value {} is outside [{}, {}]",
            self.value, self.min, self.max
        )
    }
}

impl<T: fmt::Debug + fmt::Display> std::error::Error for BoundsError<T> {}

macro_rules! bounded_int {
    ($(#[$meta:meta])* $name:ident, $inner:ty) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name<const MIN: $inner, const MAX: $inner>($inner);

        impl<const MIN: $inner, const MAX: $inner> $name<MIN, MAX> {
            /// Create a bounded value or return a bounds error.
            pub const fn try_new(value: $inner) -> Result<Self, BoundsError<$inner>> {
                if value < MIN || value > MAX {
                    Err(BoundsError {
                        value,
                        min: MIN,
                        max: MAX,
                    })
                } else {
                    Ok(Self(value))
                }
            }

            /// Return the wrapped value.
            pub const fn get(self) -> $inner {
                self.0
            }
        }
    };
}

bounded_int!(
    /// Bounded `u32` with const generic limits.
    BoundedU32,
    u32
);
bounded_int!(
    /// Bounded `u64` with const generic limits.
    BoundedU64,
    u64
);
