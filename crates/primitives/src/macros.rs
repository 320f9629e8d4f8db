//! Impl generators for the fixed-size byte buffers in [`crate::buf`].

/// Generates constructors, accessors and conversions for a `struct Name([u8; LEN])`.
macro_rules! impl_buf_core {
    ($name:ident, $len:expr) => {
        impl $name {
            pub const LEN: usize = $len;

            pub const fn new(data: [u8; $len]) -> Self {
                Self(data)
            }

            pub const fn zero() -> Self {
                Self([0; $len])
            }

            pub const fn as_bytes(&self) -> &[u8] {
                self.0.as_slice()
            }

            pub const fn is_zero(&self) -> bool {
                let mut i = 0;
                while i < $len {
                    if self.0[i] != 0 {
                        return false;
                    }
                    i += 1;
                }
                true
            }
        }

        impl ::std::convert::AsRef<[u8; $len]> for $name {
            fn as_ref(&self) -> &[u8; $len] {
                &self.0
            }
        }

        impl ::std::convert::From<[u8; $len]> for $name {
            fn from(data: [u8; $len]) -> Self {
                Self(data)
            }
        }

        impl ::std::convert::From<$name> for [u8; $len] {
            fn from(buf: $name) -> Self {
                buf.0
            }
        }

        impl<'a> ::std::convert::TryFrom<&'a [u8]> for $name {
            type Error = &'a [u8];

            fn try_from(value: &'a [u8]) -> Result<Self, Self::Error> {
                <[u8; $len]>::try_from(value).map(Self).map_err(|_| value)
            }
        }

        impl ::std::default::Default for $name {
            fn default() -> Self {
                Self::zero()
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::buf::BufParseError;

            /// Parses hex text, with or without a `0x` prefix.
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let hex_str = s
                    .strip_prefix("0x")
                    .or_else(|| s.strip_prefix("0X"))
                    .unwrap_or(s);
                let mut array = [0u8; $len];
                ::hex::decode_to_slice(hex_str, &mut array)
                    .map_err(|_| $crate::buf::BufParseError { expected_len: $len })?;
                Ok(Self(array))
            }
        }
    };
}

/// Generates `Debug` (full hex) and `Display` (truncated hex).
macro_rules! impl_buf_fmt {
    ($name:ident, $len:expr) => {
        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(&::hex::encode(self.0))
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                // Only the first and last 3 bytes.
                write!(
                    f,
                    "{}..{}",
                    ::hex::encode(&self.0[..3]),
                    ::hex::encode(&self.0[$len - 3..])
                )
            }
        }
    };
}

macro_rules! impl_buf_borsh {
    ($name:ident, $len:expr) => {
        impl ::borsh::BorshSerialize for $name {
            fn serialize<W: ::std::io::Write>(&self, writer: &mut W) -> ::std::io::Result<()> {
                writer.write_all(&self.0)
            }
        }

        impl ::borsh::BorshDeserialize for $name {
            fn deserialize_reader<R: ::std::io::Read>(reader: &mut R) -> ::std::io::Result<Self> {
                let mut array = [0u8; $len];
                reader.read_exact(&mut array)?;
                Ok(Self(array))
            }
        }
    };
}

macro_rules! impl_buf_arbitrary {
    ($name:ident, $len:expr) => {
        impl<'a> ::arbitrary::Arbitrary<'a> for $name {
            fn arbitrary(u: &mut ::arbitrary::Unstructured<'a>) -> ::arbitrary::Result<Self> {
                let mut array = [0u8; $len];
                u.fill_buffer(&mut array)?;
                Ok(Self(array))
            }
        }
    };
}

/// Hex strings for human-readable formats, raw arrays otherwise.
macro_rules! impl_buf_serde {
    ($name:ident, $len:expr) => {
        impl ::serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: ::serde::Serializer,
            {
                if serializer.is_human_readable() {
                    serializer.serialize_str(&::hex::encode(self.0))
                } else {
                    ::serde::Serialize::serialize(&self.0, serializer)
                }
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                if deserializer.is_human_readable() {
                    let s = <::std::string::String as ::serde::Deserialize>::deserialize(
                        deserializer,
                    )?;
                    s.parse().map_err(::serde::de::Error::custom)
                } else {
                    <[u8; $len] as ::serde::Deserialize>::deserialize(deserializer).map(Self)
                }
            }
        }
    };
}

/// Generates the full set of buffer impls.
macro_rules! impl_buf {
    ($name:ident, $len:expr) => {
        impl_buf_core!($name, $len);
        impl_buf_fmt!($name, $len);
        impl_buf_borsh!($name, $len);
        impl_buf_arbitrary!($name, $len);
        impl_buf_serde!($name, $len);
    };
}
