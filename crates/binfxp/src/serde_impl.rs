use serde::{
    de::{self, Unexpected},
    ser::{self, SerializeStruct},
    Deserialize, Deserializer, Serialize, Serializer,
};
use smallstr::SmallString;

use crate::{FixedPoint, OverflowMode, Repr, RoundMode};
use std::{
    fmt::{self, Write},
    marker::PhantomData,
    str::FromStr,
};

const NUMBER_TOKEN: &str = "$serde_json::private::Number";

impl<I, const RANGE: u32, const RESOLUTION: i32, R, O> Serialize
    for FixedPoint<I, RANGE, RESOLUTION, R, O>
where
    I: Repr,
    R: RoundMode,
    O: OverflowMode,
{
    /// Serializes the exact decimal expansion of this value in the same form
    /// used by [serde_json::Number] when the `arbitrary_precision` feature is
    /// turned on, so that JSON carries it as a number without loss.
    ///
    /// [serde_json::Number]: https://docs.rs/serde_json/latest/serde_json/struct.Number.html
    fn serialize<Ser>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error>
    where
        Ser: Serializer,
    {
        let mut string = SmallString::<[u8; 64]>::new();
        write!(&mut string, "{}", self).map_err(<Ser::Error as ser::Error>::custom)?;

        let mut s = serializer.serialize_struct(NUMBER_TOKEN, 1)?;
        s.serialize_field(NUMBER_TOKEN, string.as_str())?;
        s.end()
    }
}

impl<'de, I, const RANGE: u32, const RESOLUTION: i32, R, O> Deserialize<'de>
    for FixedPoint<I, RANGE, RESOLUTION, R, O>
where
    I: Repr,
    R: RoundMode,
    O: OverflowMode,
{
    /// Deserializes from a number, a decimal string, or a number in
    /// `serde_json`'s `arbitrary_precision` form.  Values outside the range
    /// are errors regardless of the overflow mode.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(FixedPointVisitor(PhantomData))
    }
}

struct FixedPointVisitor<T>(PhantomData<T>);

impl<'de, I, const RANGE: u32, const RESOLUTION: i32, R, O> de::Visitor<'de>
    for FixedPointVisitor<FixedPoint<I, RANGE, RESOLUTION, R, O>>
where
    I: Repr,
    R: RoundMode,
    O: OverflowMode,
{
    type Value = FixedPoint<I, RANGE, RESOLUTION, R, O>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(
            formatter,
            "a fixed-point number between {} and {}, inclusive",
            Self::Value::min_value(),
            Self::Value::max_value()
        )
    }

    fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Self::Value::try_from(value).map_err(|_| E::invalid_value(Unexpected::Signed(value), &self))
    }

    fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Self::Value::try_from(value).map_err(|_| E::invalid_value(Unexpected::Unsigned(value), &self))
    }

    fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Self::Value::try_from(value).map_err(|_| E::invalid_value(Unexpected::Float(value), &self))
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Self::Value::from_str(value).map_err(|_| E::invalid_value(Unexpected::Str(value), &self))
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: de::MapAccess<'de>,
    {
        if map.next_key::<NumberKey>()?.is_none() {
            return Err(de::Error::invalid_type(Unexpected::Map, &self));
        }
        map.next_value_seed(NumberString(PhantomData))
    }
}

/// The key of a number in `arbitrary_precision` form.
struct NumberKey;

impl<'de> Deserialize<'de> for NumberKey {
    fn deserialize<D>(deserializer: D) -> Result<NumberKey, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct KeyVisitor;

        impl de::Visitor<'_> for KeyVisitor {
            type Value = ();

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a number token")
            }

            fn visit_str<E>(self, s: &str) -> Result<(), E>
            where
                E: de::Error,
            {
                if s == NUMBER_TOKEN {
                    Ok(())
                } else {
                    Err(de::Error::custom("expected field with custom name"))
                }
            }
        }

        deserializer.deserialize_identifier(KeyVisitor)?;
        Ok(NumberKey)
    }
}

/// The value of a number in `arbitrary_precision` form, a decimal string.
struct NumberString<T>(PhantomData<T>);

impl<'de, I, const RANGE: u32, const RESOLUTION: i32, R, O> de::DeserializeSeed<'de>
    for NumberString<FixedPoint<I, RANGE, RESOLUTION, R, O>>
where
    I: Repr,
    R: RoundMode,
    O: OverflowMode,
{
    type Value = FixedPoint<I, RANGE, RESOLUTION, R, O>;

    fn deserialize<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_str(FixedPointVisitor(PhantomData))
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use crate::{fixed_point, NearestEven, Saturate};

    type F = fixed_point!(10, -8, NearestEven, Saturate);

    #[test]
    fn serialize() {
        let x = F::try_from(-1.25).unwrap();
        assert_eq!(serde_json::to_string(&x).unwrap(), "-1.25");
        assert_eq!(serde_json::to_value(x).unwrap(), json!(-1.25));

        // Exact, however many digits that takes.
        let ulp = F::ulp();
        assert_eq!(serde_json::to_string(&ulp).unwrap(), "0.00390625");
        assert_eq!(serde_json::to_string(&F::try_from(7).unwrap()).unwrap(), "7");
    }

    #[test]
    fn deserialize() {
        let expect = F::try_from(1.5).unwrap();
        assert_eq!(serde_json::from_str::<F>("1.5").unwrap(), expect);
        assert_eq!(serde_json::from_str::<F>("\"1.5\"").unwrap(), expect);
        assert_eq!(
            serde_json::from_str::<F>(r#"{"$serde_json::private::Number": "1.5"}"#).unwrap(),
            expect
        );
        assert_eq!(serde_json::from_str::<F>("123").unwrap(), F::try_from(123).unwrap());
        assert_eq!(serde_json::from_str::<F>("-123").unwrap(), F::try_from(-123).unwrap());

        // Overprecise input rounds.
        assert_eq!(serde_json::from_str::<F>("0.001").unwrap(), F::zero());
        assert_eq!(serde_json::from_str::<F>("0.003").unwrap(), F::ulp());
    }

    #[test]
    fn deserialize_errors() {
        assert!(serde_json::from_str::<F>("1024").is_err());
        assert!(serde_json::from_str::<F>("-1e6").is_err());
        assert!(serde_json::from_str::<F>("\"one\"").is_err());
        assert!(serde_json::from_str::<F>("true").is_err());
        assert!(serde_json::from_str::<F>(r#"{"x": "1.5"}"#).is_err());
    }

    #[test]
    fn round_trip() {
        type Fine = fixed_point!(3, -100, NearestEven);
        let pi = Fine::pi();
        let json = serde_json::to_string(&pi).unwrap();
        assert!(json.starts_with("3.14159265358979323846"));
        assert_eq!(serde_json::from_str::<Fine>(&json).unwrap(), pi);
    }
}
