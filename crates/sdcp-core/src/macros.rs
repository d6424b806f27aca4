/// Declares a fieldless enum carried on the wire as an integer code.
///
/// Generates `from_code`/`code` plus serde impls that read and write the
/// bare integer. Exactly one variant must be marked `#[default]`.
///
/// With `else Other` after the repr, codes outside the table decode to
/// `Other(code)` and are written back unchanged. Without it they are rejected.
macro_rules! code_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $repr:ident else $other:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident = $value:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        $vis enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )+
            /// A code this build does not know
            $other($repr),
        }

        impl $name {
            pub fn from_code(code: $repr) -> Self {
                match code {
                    $(x if x == $value => $name::$variant,)+
                    other => $name::$other(other),
                }
            }

            pub fn code(self) -> $repr {
                match self {
                    $($name::$variant => $value,)+
                    $name::$other(code) => code,
                }
            }

            pub fn is_known(self) -> bool {
                !matches!(self, $name::$other(_))
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_u64(self.code() as u64)
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                let raw = <i64 as serde::Deserialize>::deserialize(deserializer)?;
                <$repr>::try_from(raw)
                    .map($name::from_code)
                    .map_err(|_| {
                        serde::de::Error::custom(format!(
                            "{} code out of range: {}",
                            stringify!($name),
                            raw
                        ))
                    })
            }
        }
    };
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $repr:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident = $value:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        #[repr($repr)]
        $vis enum $name {
            $(
                $(#[$vmeta])*
                $variant = $value,
            )+
        }

        impl $name {
            pub fn from_code(code: $repr) -> Option<Self> {
                match code {
                    $(x if x == $value => Some($name::$variant),)+
                    _ => None,
                }
            }

            pub fn code(self) -> $repr {
                self as $repr
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_u64(self.code() as u64)
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                let raw = <i64 as serde::Deserialize>::deserialize(deserializer)?;
                <$repr>::try_from(raw)
                    .ok()
                    .and_then($name::from_code)
                    .ok_or_else(|| {
                        serde::de::Error::custom(format!(
                            "unknown {} code: {}",
                            stringify!($name),
                            raw
                        ))
                    })
            }
        }
    };
}
