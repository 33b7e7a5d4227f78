//! `define_port_error!`: error enums for driven ports.
//!
//! Every port error in the report store has the same shape: a `thiserror`
//! enum whose variants carry a message (or nothing) and a matching
//! snake_case constructor. Constructor parameters take `impl Into<T>` for
//! each field, so adapters pass `&str`, `String` or `format!` output alike:
//!
//! ```ignore
//! define_port_error! {
//!     pub enum ReportRepositoryError {
//!         Connection { message: String } => "connection failed: {message}",
//!     }
//! }
//!
//! let err = ReportRepositoryError::connection("pool timed out");
//! ```

macro_rules! define_port_error {
    (@ctor $variant:ident) => {
        ::paste::paste! {
            #[must_use]
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),* }) => {
        ::paste::paste! {
            #[must_use]
            pub fn [<$variant:snake>]($($field: impl Into<$ty>),*) -> Self {
                Self::$variant { $($field: $field.into()),* }
            }
        }
    };

    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:literal
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@ctor $variant $( { $($field : $ty),* } )?);
            )*
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    use rstest::rstest;

    define_port_error! {
        /// Storage failures used to exercise the generated constructors.
        pub enum StoragePortError {
            Offline => "storage offline",
            Rejected { message: String } => "rejected: {message}",
            Partial { message: String, rows: u64 } => "partial: {message} ({rows} rows)",
        }
    }

    #[rstest]
    #[case(StoragePortError::offline(), "storage offline")]
    #[case(StoragePortError::rejected("bad row"), "rejected: bad row")]
    #[case(StoragePortError::rejected(format!("row {}", 4)), "rejected: row 4")]
    #[case(StoragePortError::partial("timeout", 3_u64), "partial: timeout (3 rows)")]
    fn constructors_render_their_messages(
        #[case] error: StoragePortError,
        #[case] expected: &str,
    ) {
        assert_eq!(error.to_string(), expected);
    }

    #[rstest]
    fn constructors_build_the_named_variant() {
        assert_eq!(
            StoragePortError::partial("timeout", 3_u64),
            StoragePortError::Partial {
                message: "timeout".to_owned(),
                rows: 3,
            }
        );
    }
}
