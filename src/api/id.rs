use juniper::{GraphQLScalar, InputValue, ScalarValue};
use paste::paste;
use static_assertions::const_assert;
use std::fmt;

use crate::db::Key;
use super::err::{ApiError, ApiResult};


/// The `ID` of users, notes and note categories.
///
/// Clients treat it as an opaque string. It is 13 ASCII characters: a two
/// letter prefix naming the collection, then the storage key in 11 base64
/// digits. An ID of one collection therefore never finds anything in another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, GraphQLScalar)]
#[graphql(
    name = "ID",
    description = "Opaque identifier of a user, note or note category",
    parse_token(String),
)]
pub(crate) struct Id {
    /// Collection prefix, e.g. `b"no"` for notes.
    kind: [u8; 2],

    /// Only reachable through [`Self::key_for`], which checks `kind`.
    key: Key,
}


// For each `name = b"xy"`, defines `Id::NAME_KIND` and the constructor
// `Id::name(key)`. Prefixes are checked to be distinct and alphanumeric at
// compile time.
macro_rules! define_kinds {
    ($($name:ident = $val:literal ,)+) => {
        paste!(
            impl Id {
                $(
                    pub(crate) const [<$name:upper _KIND>]: [u8; 2] = *$val;

                    pub(crate) fn $name(key: Key) -> Self {
                        Self {
                            kind: Self:: [<$name:upper _KIND>],
                            key,
                        }
                    }
                )+
            }
        );

        $(
            const_assert!($val[0].is_ascii_alphanumeric());
            const_assert!($val[1].is_ascii_alphanumeric());
        )+

        // Duplicate prefixes give duplicate discriminants.
        #[allow(non_camel_case_types, dead_code)]
        #[repr(u16)]
        enum _KindChecker {
            $( $name = u16::from_ne_bytes(*$val), )+
        }
    };
}

define_kinds![
    user = b"us",
    note = b"no",
    note_category = b"nc",
];


impl Id {
    /// Not alphanumeric, so no parsed ID ever has this kind.
    const INVALID_KIND: [u8; 2] = *b"!!";

    /// Stands in for an unparsable ID argument. Failing in scalar parsing
    /// would reject the whole document, but a malformed ID should only fail
    /// the field using it, via [`Self::checked_key_for`].
    fn invalid() -> Self {
        Self {
            kind: Self::INVALID_KIND,
            key: Key(0),
        }
    }

    /// The key, if this ID belongs to the collection `expected_kind`.
    pub(crate) fn key_for(&self, expected_kind: [u8; 2]) -> Option<Key> {
        (self.kind == expected_kind).then_some(self.key)
    }

    /// Like [`Self::key_for`], but returns an error if the ID was malformed in
    /// the first place. A well-formed ID of another kind still yields `None`.
    pub(crate) fn checked_key_for(&self, expected_kind: [u8; 2]) -> ApiResult<Option<Key>> {
        if self.kind == Self::INVALID_KIND {
            return Err(ApiError::invalid_input("malformed ID"));
        }

        Ok(self.key_for(expected_kind))
    }

    fn to_output<S: ScalarValue>(&self) -> juniper::Value<S> {
        juniper::Value::scalar(self.to_string())
    }

    fn from_input<S: ScalarValue>(input: &InputValue<S>) -> Result<Self, String> {
        input.as_string_value()
            .map(|s| s.parse().unwrap_or_else(|_| Self::invalid()))
            .ok_or_else(|| format!("ID must be a string, got {input}"))
    }
}

impl std::str::FromStr for Id {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let &[a, b, ..] = s.as_bytes() else { return Err("invalid length") };
        if s.len() != 13 {
            return Err("invalid length");
        }
        if !a.is_ascii_alphanumeric() || !b.is_ascii_alphanumeric() {
            return Err("invalid kind");
        }

        // Both prefix bytes are ASCII, so index 2 is a char boundary.
        let key = Key::from_base64(&s[2..]).ok_or("invalid base64")?;
        Ok(Self { kind: [a, b], key })
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut buf = [0; 11];
        let key = self.key.to_base64(&mut buf);
        let kind = std::str::from_utf8(&self.kind).unwrap_or("!!");
        write!(f, "{kind}{key}")
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use super::{Id, Key};

    #[test]
    fn encode_and_parse() {
        #[track_caller]
        fn check(kind: [u8; 2], key: u64, s: &str) {
            let id = Id { kind, key: Key(key) };
            assert_eq!(id.to_string(), s);
            assert_eq!(Id::from_str(s), Ok(id));
        }

        check(Id::NOTE_KIND, 0, "noAAAAAAAAAAA");
        check(Id::NOTE_KIND, 1, "noAAAAAAAAAAB");
        check(Id::NOTE_KIND, 62, "noAAAAAAAAAA-");
        check(Id::USER_KIND, 63, "usAAAAAAAAAA_");
        check(Id::USER_KIND, 64, "usAAAAAAAAABA");
        check(Id::NOTE_CATEGORY_KIND, 65, "ncAAAAAAAAABB");

        check(Id::USER_KIND, u64::MAX - 1, "usP_________-");
        check(Id::USER_KIND, u64::MAX, "usP__________");
    }

    #[test]
    fn parse_errors() {
        // Wrong length
        assert_eq!(Id::from_str(""), Err("invalid length"));
        assert_eq!(Id::from_str("no"), Err("invalid length"));
        assert_eq!(Id::from_str("noAAAAAAAAAAAA"), Err("invalid length"));
        assert_eq!(Id::from_str("5f1d7c6e8a9b0c1d2e3f4a5b"), Err("invalid length"));

        // Invalid characters
        assert_eq!(Id::from_str("!!AAAAAAAAAAA"), Err("invalid kind"));
        assert_eq!(Id::from_str("no0000000000*"), Err("invalid base64"));
        assert_eq!(Id::from_str("no0000000000/"), Err("invalid base64"));

        // Encoded value > u64::MAX
        assert_eq!(Id::from_str("noQAAAAAAAAAA"), Err("invalid base64"));
        assert_eq!(Id::from_str("no___________"), Err("invalid base64"));
    }

    #[test]
    fn kind_is_checked() {
        let id = Id::note(Key(7));
        assert_eq!(id.key_for(Id::NOTE_KIND), Some(Key(7)));
        assert_eq!(id.key_for(Id::USER_KIND), None);
        assert_eq!(id.checked_key_for(Id::USER_KIND).unwrap(), None);
        assert!(Id::invalid().checked_key_for(Id::NOTE_KIND).is_err());
    }
}
