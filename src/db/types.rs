use std::fmt;

use bytes::BytesMut;
use postgres_types::{FromSql, ToSql};

use crate::util::{BASE64_DIGITS, base64_decode};


/// Storage key of a record, unique within its collection. Stored as `bigint`
/// in Postgres, reinterpreting the bits as `i64`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct Key(pub(crate) u64);

impl Key {
    /// Parses the 11 digit base64 form. `None` for other lengths, foreign
    /// characters or values above `u64::MAX`.
    pub(crate) fn from_base64(s: &str) -> Option<Self> {
        if s.len() != 11 {
            return None;
        }

        s.bytes()
            .try_fold(0u64, |acc, digit| {
                acc.checked_mul(64)?.checked_add(base64_decode(digit)? as u64)
            })
            .map(Key)
    }

    /// Writes the key as 11 base64 digits into `out`, most significant first.
    pub(crate) fn to_base64<'a>(&self, out: &'a mut [u8; 11]) -> &'a str {
        let mut n = self.0;
        for digit in out.iter_mut().rev() {
            *digit = BASE64_DIGITS[(n % 64) as usize];
            n /= 64;
        }

        std::str::from_utf8(out).expect("bug: base64 alphabet is ASCII")
    }
}

impl ToSql for Key {
    fn to_sql(
        &self,
        ty: &postgres_types::Type,
        out: &mut BytesMut,
    ) -> Result<postgres_types::IsNull, Box<dyn std::error::Error + Sync + Send>> {
        (self.0 as i64).to_sql(ty, out)
    }

    fn accepts(ty: &postgres_types::Type) -> bool {
        <i64 as ToSql>::accepts(ty)
    }

    postgres_types::to_sql_checked!();
}

impl<'a> FromSql<'a> for Key {
    fn from_sql(
        ty: &postgres_types::Type,
        raw: &'a [u8],
    ) -> Result<Self, Box<dyn std::error::Error + Sync + Send>> {
        i64::from_sql(ty, raw).map(|i| Key(i as u64))
    }

    fn accepts(ty: &postgres_types::Type) -> bool {
        <i64 as FromSql>::accepts(ty)
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = [0; 11];
        write!(f, "Key({} = {})", self.0, self.to_base64(&mut buf))
    }
}


#[cfg(test)]
mod tests {
    use super::Key;

    #[test]
    fn base64_roundtrip_edges() {
        let mut buf = [0; 11];
        for n in [0, 1, 63, 64, 4096, i64::MAX as u64, u64::MAX - 1, u64::MAX] {
            let s = Key(n).to_base64(&mut buf).to_owned();
            assert_eq!(Key::from_base64(&s), Some(Key(n)), "failed for {n} ({s})");
        }
    }

    #[test]
    fn base64_rejects_overflow_and_length() {
        assert_eq!(Key::from_base64("QAAAAAAAAAA"), None);
        assert_eq!(Key::from_base64("___________"), None);
        assert_eq!(Key::from_base64("AAAAAAAAAA"), None);
        assert_eq!(Key::from_base64("AAAAAAAAAAAA"), None);
        assert_eq!(Key::from_base64("AAAAAAAAAA+"), None);
    }
}
