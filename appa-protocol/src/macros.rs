//! Helpers for wire-level enums

/// Declare an enum backed by a raw wire value
///
/// Values outside the known set are kept as `Unknown(raw)` so that a decoded
/// record encodes back to the same bytes.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident: $repr:ty {
            $( $(#[$vmeta:meta])* $variant:ident = $value:literal, )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "defmt", derive(defmt::Format))]
        $vis enum $name {
            $( $(#[$vmeta])* $variant, )*
            /// Value not known to this driver
            Unknown($repr),
        }

        impl $name {
            /// Parse from the raw wire value
            pub fn from_raw(raw: $repr) -> Self {
                match raw {
                    $( $value => $name::$variant, )*
                    other => $name::Unknown(other),
                }
            }

            /// Convert to the raw wire value
            pub fn to_raw(self) -> $repr {
                match self {
                    $( $name::$variant => $value, )*
                    $name::Unknown(raw) => raw,
                }
            }

            /// Returns true for values outside the known set
            pub fn is_unknown(&self) -> bool {
                matches!(self, $name::Unknown(_))
            }
        }
    };
}
