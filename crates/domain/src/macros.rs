//! Macro for implementing Display and FromStr for status enums
//!
//! Batch, lead and workflow-stage enums all need the same lowercase string
//! form for logs, CLI arguments and persisted payloads. Parsing is
//! case-insensitive so operator input such as `PROCESSED` is accepted.
//!
//! # Example
//!
//! ```rust
//! use leadflow_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum DispatchState {
//!     Queued,
//!     Delivered,
//! }
//!
//! impl_domain_status_conversions!(DispatchState {
//!     Queued => "queued",
//!     Delivered => "delivered",
//! });
//!
//! assert_eq!(DispatchState::Queued.to_string(), "queued");
//! assert_eq!("DELIVERED".parse::<DispatchState>(), Ok(DispatchState::Delivered));
//! ```

/// Implements `Display` and `FromStr` for a fieldless status enum.
///
/// * `Display` writes the mapped lowercase string.
/// * `FromStr` matches case-insensitively and reports the enum name on
///   failure.
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl ::std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($str),)+
                }
            }
        }

        impl ::std::str::FromStr for $enum_name {
            type Err = ::std::string::String;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($str => ::core::result::Result::Ok(Self::$variant),)+
                    _ => ::core::result::Result::Err(::std::format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Step {
        Upload,
        Process,
        Send,
    }

    impl_domain_status_conversions!(Step {
        Upload => "upload",
        Process => "process",
        Send => "send",
    });

    #[test]
    fn display_uses_mapped_string() {
        assert_eq!(Step::Upload.to_string(), "upload");
        assert_eq!(Step::Process.to_string(), "process");
        assert_eq!(Step::Send.to_string(), "send");
    }

    #[test]
    fn parsing_ignores_case_and_whitespace() {
        assert_eq!(Step::from_str("SEND").unwrap(), Step::Send);
        assert_eq!(Step::from_str(" Process ").unwrap(), Step::Process);
    }

    #[test]
    fn parsing_unknown_value_names_the_enum() {
        let err = Step::from_str("dispatch").unwrap_err();
        assert!(err.contains("Invalid Step: dispatch"));
        assert!(Step::from_str("").is_err());
    }
}
