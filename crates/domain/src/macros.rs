//! Display/FromStr boilerplate for string-backed enums
//!
//! ```rust
//! use lightspeed_domain::impl_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Mode {
//!     Read,
//!     Write,
//! }
//!
//! impl_status_conversions!(Mode {
//!     Read => "read",
//!     Write => "write",
//! });
//!
//! assert_eq!(Mode::Write.to_string(), "write");
//! assert_eq!("READ".parse::<Mode>().unwrap(), Mode::Read);
//! ```

/// Implements `Display` and case-insensitive `FromStr` from a
/// variant-to-string table. The string side must be lowercase.
#[macro_export]
macro_rules! impl_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl $enum_name {
            /// Canonical string form.
            #[must_use]
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
