//! Request decoding.
//!
//! A pipeline's input is one struct fed from three places: the JSON body,
//! the query string and the path parameters. Body fields keep their JSON
//! types. Query and path values arrive as text and are parsed into whatever
//! the target field asks for, so `times: u32` accepts the `4` in
//! `/dog/walk/atlanta/4` while `place: String` keeps `atlanta` as text.
//! When the same name appears twice, path beats query beats body.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::de::value::{MapDeserializer, StringDeserializer};
use serde::de::{self, DeserializeOwned, Deserializer, IntoDeserializer, Visitor};
use serde::forward_to_deserialize_any;
use serde_json::Value;

use crate::error::Error;
use crate::request::Request;

/// Decodes `req` into `I`.
pub(crate) fn decode<I: DeserializeOwned>(req: &Request) -> Result<I, Error> {
    let body = parse_body(req.body())?;

    let mut fields: BTreeMap<String, Field> = BTreeMap::new();
    if let Some(query) = req.query() {
        let pairs: Vec<(String, String)> =
            serde_urlencoded::from_str(query).map_err(|e| Error::Decode(e.to_string()))?;
        fields.extend(pairs.into_iter().map(|(k, v)| (k, Field::Text(v))));
    }
    fields.extend(req.params().iter().map(|(k, v)| (k.clone(), Field::Text(v.clone()))));

    if fields.is_empty() {
        return from_body(body);
    }

    match body {
        None => {}
        Some(Value::Object(map)) => {
            for (k, v) in map {
                fields.entry(k).or_insert(Field::Json(v));
            }
        }
        Some(_) => {
            return Err(Error::Decode(
                "request body must be a JSON object when the route takes parameters".to_owned(),
            ));
        }
    }

    I::deserialize(MapDeserializer::new(fields.into_iter()))
        .map_err(|e: serde_json::Error| Error::Decode(e.to_string()))
}

fn parse_body(body: &[u8]) -> Result<Option<Value>, Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body)
        .map(Some)
        .map_err(|e| Error::Decode(e.to_string()))
}

/// Without parameters the body is the whole input. An absent body reads as
/// `{}` so structs with defaulted fields decode, then as `null` for unit
/// inputs.
fn from_body<I: DeserializeOwned>(body: Option<Value>) -> Result<I, Error> {
    let decoded = match body {
        Some(value) => serde_json::from_value(value),
        None => serde_json::from_value(Value::Object(Default::default()))
            .or_else(|_| serde_json::from_value(Value::Null)),
    };
    decoded.map_err(|e| Error::Decode(e.to_string()))
}

// ── Field deserializer ────────────────────────────────────────────────────────

/// One top-level input field.
enum Field {
    /// Taken from the JSON body, already typed.
    Json(Value),
    /// Taken from the path or the query string, parsed on demand.
    Text(String),
}

impl Field {
    fn parse<T: FromStr>(text: &str, what: &str) -> Result<T, serde_json::Error> {
        text.parse()
            .map_err(|_| de::Error::custom(format!("expected {what}, found `{text}`")))
    }
}

impl<'de> IntoDeserializer<'de, serde_json::Error> for Field {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self {
        self
    }
}

macro_rules! parse_text {
    ($($method:ident => $visit:ident($ty:ty, $what:literal)),* $(,)?) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
                match self {
                    Field::Json(value) => value.$method(visitor),
                    Field::Text(text) => visitor.$visit(Field::parse::<$ty>(&text, $what)?),
                }
            }
        )*
    };
}

impl<'de> Deserializer<'de> for Field {
    type Error = serde_json::Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self {
            Field::Json(value) => value.deserialize_any(visitor),
            Field::Text(text) => visitor.visit_string(text),
        }
    }

    parse_text! {
        deserialize_bool => visit_bool(bool, "a boolean"),
        deserialize_i8 => visit_i64(i64, "an integer"),
        deserialize_i16 => visit_i64(i64, "an integer"),
        deserialize_i32 => visit_i64(i64, "an integer"),
        deserialize_i64 => visit_i64(i64, "an integer"),
        deserialize_u8 => visit_u64(u64, "an unsigned integer"),
        deserialize_u16 => visit_u64(u64, "an unsigned integer"),
        deserialize_u32 => visit_u64(u64, "an unsigned integer"),
        deserialize_u64 => visit_u64(u64, "an unsigned integer"),
        deserialize_f32 => visit_f64(f64, "a number"),
        deserialize_f64 => visit_f64(f64, "a number"),
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self {
            Field::Json(value) => value.deserialize_option(visitor),
            Field::Text(_) => visitor.visit_some(self),
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        match self {
            Field::Json(value) => value.deserialize_newtype_struct(name, visitor),
            Field::Text(_) => visitor.visit_newtype_struct(self),
        }
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        match self {
            Field::Json(value) => value.deserialize_enum(name, variants, visitor),
            Field::Text(text) => {
                let variant: StringDeserializer<serde_json::Error> = text.into_deserializer();
                visitor.visit_enum(variant)
            }
        }
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        match self {
            Field::Json(value) => value.deserialize_struct(name, fields, visitor),
            Field::Text(text) => visitor.visit_string(text),
        }
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self {
            Field::Json(value) => value.deserialize_seq(visitor),
            Field::Text(text) => visitor.visit_string(text),
        }
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self {
            Field::Json(value) => value.deserialize_map(visitor),
            Field::Text(text) => visitor.visit_string(text),
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self {
            Field::Json(value) => value.deserialize_unit(visitor),
            Field::Text(text) => visitor.visit_string(text),
        }
    }

    forward_to_deserialize_any! {
        char str string bytes byte_buf unit_struct tuple tuple_struct identifier ignored_any
    }
}

#[cfg(test)]
mod tests {
    use http::Method;
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Walk {
        place: String,
        times: u32,
        #[serde(default)]
        slow: Option<bool>,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Feed {
        bowls: i32,
    }

    fn with_params(mut req: Request, params: &[(&str, &str)]) -> Request {
        req.params = params.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
        req
    }

    #[test]
    fn path_params_are_typed_by_target() {
        let req = with_params(
            Request::fake(Method::GET, "/dog/walk/123/4", ""),
            &[("place", "123"), ("times", "4")],
        );
        let walk: Walk = decode(&req).unwrap();
        assert_eq!(walk, Walk { place: "123".into(), times: 4, slow: None });
    }

    #[test]
    fn query_fills_optional_fields() {
        let req = with_params(
            Request::fake(Method::GET, "/dog/walk/atlanta/2?slow=true", ""),
            &[("place", "atlanta"), ("times", "2")],
        );
        let walk: Walk = decode(&req).unwrap();
        assert_eq!(walk.slow, Some(true));
    }

    #[test]
    fn body_only() {
        let req = Request::fake(Method::POST, "/dog/feed", r#"{ "bowls" : 2 }"#);
        assert_eq!(decode::<Feed>(&req).unwrap(), Feed { bowls: 2 });
    }

    #[test]
    fn body_merges_with_params() {
        let req = with_params(
            Request::fake(Method::POST, "/dog/walk/atlanta", r#"{"times": 3}"#),
            &[("place", "atlanta")],
        );
        let walk: Walk = decode(&req).unwrap();
        assert_eq!(walk.times, 3);
        assert_eq!(walk.place, "atlanta");
    }

    #[test]
    fn unparsable_param_is_a_decode_error() {
        let req = with_params(
            Request::fake(Method::GET, "/dog/walk/atlanta/many", ""),
            &[("place", "atlanta"), ("times", "many")],
        );
        let err = decode::<Walk>(&req).unwrap_err();
        assert!(matches!(err, Error::Decode(_)), "{err}");
    }

    #[test]
    fn malformed_json_is_a_decode_error() {
        let req = Request::fake(Method::POST, "/dog/feed", "{bowls");
        assert!(matches!(decode::<Feed>(&req), Err(Error::Decode(_))));
    }

    #[test]
    fn empty_body_decodes_unit_and_defaults() {
        #[derive(Deserialize)]
        struct Nothing {}

        let req = Request::fake(Method::GET, "/healthz", "");
        decode::<()>(&req).unwrap();
        decode::<Nothing>(&req).unwrap();
    }
}
