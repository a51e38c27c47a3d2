//! Numeric quantity newtypes used in result tables.

/// Define a wrapper type for a numeric value with arithmetic and serde support
macro_rules! define_unit {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(
            Clone,
            Copy,
            Debug,
            Default,
            PartialEq,
            PartialOrd,
            serde::Deserialize,
            serde::Serialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub f64);

        impl $name {
            /// Create a new value of this unit type
            pub fn new(value: f64) -> Self {
                Self(value)
            }

            /// The underlying numeric value
            pub fn value(&self) -> f64 {
                self.0
            }

            /// Whether the value is finite
            pub fn is_finite(&self) -> bool {
                self.0.is_finite()
            }
        }

        impl std::ops::Add for $name {
            type Output = Self;

            fn add(self, other: Self) -> Self {
                Self(self.0 + other.0)
            }
        }

        impl std::ops::AddAssign for $name {
            fn add_assign(&mut self, other: Self) {
                self.0 += other.0;
            }
        }

        impl std::ops::Sub for $name {
            type Output = Self;

            fn sub(self, other: Self) -> Self {
                Self(self.0 - other.0)
            }
        }

        impl std::iter::Sum for $name {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                Self(iter.map(|item| item.0).sum())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

define_unit! {
    /// A solved numeric quantity from a result table.
    ///
    /// The table convention decides the measure: capacity variables carry MW,
    /// dispatch and storage-energy variables carry MWh.
    Quantity
}
