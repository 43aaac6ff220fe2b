/// Shared constructors, hex codecs and formatting for fixed-width byte
/// identifiers. `$tag` is the label used by `Debug`.
macro_rules! fixed_bytes_id {
    ($name:ident, $len:expr, $tag:literal) => {
        impl $name {
            /// Wrap raw bytes.
            pub const fn from_raw(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            /// The raw bytes.
            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// Hex-encoded string representation.
            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            /// Short hex representation (first 8 characters).
            pub fn short_hex(&self) -> String {
                hex::encode(&self.0[..4])
            }

            /// Parse from a hex string.
            pub fn from_hex(s: &str) -> Result<Self, $crate::error::TypeError> {
                let bytes = hex::decode(s)
                    .map_err(|e| $crate::error::TypeError::InvalidHex(e.to_string()))?;
                Self::try_from(bytes.as_slice())
            }
        }

        impl TryFrom<&[u8]> for $name {
            type Error = $crate::error::TypeError;

            fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
                let arr: [u8; $len] =
                    bytes
                        .try_into()
                        .map_err(|_| $crate::error::TypeError::InvalidLength {
                            expected: $len,
                            actual: bytes.len(),
                        })?;
                Ok(Self(arr))
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }
        }

        impl From<$name> for [u8; $len] {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($tag, "({})"), self.short_hex())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.to_hex())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::error::TypeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_hex(s)
            }
        }
    };
}
