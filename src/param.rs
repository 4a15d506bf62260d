//! Request parameter values and their wire encoding.
//!
//! Parameters are stored as [`Param`] values in insertion order. Before a
//! request goes out, top-level falsy values are dropped (see
//! [`Param::is_falsy`]) and the rest are flattened into `key=value` pairs
//! following the bracket convention used by the API for list and map
//! fields (`tags[0]=a&tags[1]=b`, `filter[type]=x`).

use indexmap::IndexMap;

/// An ordered map of parameter names to values.
pub type Parameters = IndexMap<String, Param>;

/// A single parameter value.
///
/// `Option<T>` converts to [`Param::Null`] when `None`, which is how optional
/// endpoint arguments are left unset.
///
/// # Examples
///
/// ```
/// use deviantart::Param;
///
/// assert_eq!(Param::from(Some(10)), Param::Int(10));
/// assert_eq!(Param::from(None::<&str>), Param::Null);
/// assert_eq!(Param::from(vec!["a", "b"]).to_string(), "[a, b]");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    /// No value; always dropped.
    Null,
    /// A boolean, sent as `1` or `0`.
    Bool(bool),
    /// An integer.
    Int(i64),
    /// A floating point number.
    Float(f64),
    /// A string.
    Str(String),
    /// An ordered list, sent as `key[0]`, `key[1]`, ...
    List(Vec<Param>),
    /// An ordered map, sent as `key[sub]`.
    Map(IndexMap<String, Param>),
}

impl Param {
    /// Returns `true` if this value counts as unset.
    ///
    /// `Null`, `false`, `0`, `0.0`, `""`, `"0"` and empty collections are all
    /// falsy. A parameter set to `0` or `false` is therefore never sent.
    pub fn is_falsy(&self) -> bool {
        match self {
            Param::Null => true,
            Param::Bool(b) => !b,
            Param::Int(i) => *i == 0,
            Param::Float(f) => *f == 0.0,
            Param::Str(s) => s.is_empty() || s == "0",
            Param::List(items) => items.is_empty(),
            Param::Map(map) => map.is_empty(),
        }
    }

    /// Returns the wire text of a scalar value.
    ///
    /// Returns `None` for `Null`, lists and maps.
    pub fn as_wire(&self) -> Option<String> {
        match self {
            Param::Null | Param::List(_) | Param::Map(_) => None,
            Param::Bool(true) => Some("1".to_string()),
            Param::Bool(false) => Some("0".to_string()),
            Param::Int(i) => Some(i.to_string()),
            Param::Float(f) => Some(f.to_string()),
            Param::Str(s) => Some(s.clone()),
        }
    }
}

impl std::fmt::Display for Param {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Param::Null => write!(f, "null"),
            Param::Bool(b) => write!(f, "{}", b),
            Param::Int(i) => write!(f, "{}", i),
            Param::Float(x) => write!(f, "{}", x),
            Param::Str(s) => write!(f, "{}", s),
            Param::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Param::Map(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Param {
                fn from(value: $t) -> Self {
                    Param::Int(i64::from(value))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Param {
    fn from(value: u64) -> Self {
        i64::try_from(value)
            .map(Param::Int)
            .unwrap_or_else(|_| Param::Str(value.to_string()))
    }
}

impl From<usize> for Param {
    fn from(value: usize) -> Self {
        i64::try_from(value)
            .map(Param::Int)
            .unwrap_or_else(|_| Param::Str(value.to_string()))
    }
}

impl From<bool> for Param {
    fn from(value: bool) -> Self {
        Param::Bool(value)
    }
}

impl From<f32> for Param {
    fn from(value: f32) -> Self {
        Param::Float(f64::from(value))
    }
}

impl From<f64> for Param {
    fn from(value: f64) -> Self {
        Param::Float(value)
    }
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Param::Str(value.to_string())
    }
}

impl From<String> for Param {
    fn from(value: String) -> Self {
        Param::Str(value)
    }
}

impl From<&String> for Param {
    fn from(value: &String) -> Self {
        Param::Str(value.clone())
    }
}

impl<T: Into<Param>> From<Option<T>> for Param {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Param::Null)
    }
}

impl<T: Into<Param>> From<Vec<T>> for Param {
    fn from(values: Vec<T>) -> Self {
        Param::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Clone + Into<Param>> From<&[T]> for Param {
    fn from(values: &[T]) -> Self {
        Param::List(values.iter().cloned().map(Into::into).collect())
    }
}

impl<K: Into<String>, T: Into<Param>> From<IndexMap<K, T>> for Param {
    fn from(values: IndexMap<K, T>) -> Self {
        Param::Map(
            values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<serde_json::Value> for Param {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => Param::Null,
            Value::Bool(b) => Param::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Param::Int(i),
                None => n
                    .as_f64()
                    .map(Param::Float)
                    .unwrap_or_else(|| Param::Str(n.to_string())),
            },
            Value::String(s) => Param::Str(s),
            Value::Array(items) => Param::List(items.into_iter().map(Param::from).collect()),
            Value::Object(map) => {
                Param::Map(map.into_iter().map(|(k, v)| (k, Param::from(v))).collect())
            }
        }
    }
}

/// Drops every top-level parameter whose value is falsy.
///
/// Nested values are kept as they are.
pub(crate) fn filter_falsy(parameters: &Parameters) -> Parameters {
    parameters
        .iter()
        .filter(|(_, value)| !value.is_falsy())
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Flattens parameters into ordered `(field, value)` pairs.
///
/// Lists become `key[0]`, `key[1]`; maps become `key[sub]`, recursively.
/// Nested `Null` values produce no field.
pub(crate) fn flatten(parameters: &Parameters) -> Vec<(String, String)> {
    let mut fields = Vec::new();
    for (key, value) in parameters {
        flatten_into(key.clone(), value, &mut fields);
    }
    fields
}

fn flatten_into(name: String, value: &Param, fields: &mut Vec<(String, String)>) {
    match value {
        Param::Null => {}
        Param::List(items) => {
            for (index, item) in items.iter().enumerate() {
                flatten_into(format!("{}[{}]", name, index), item, fields);
            }
        }
        Param::Map(map) => {
            for (key, item) in map {
                flatten_into(format!("{}[{}]", name, key), item, fields);
            }
        }
        scalar => {
            if let Some(text) = scalar.as_wire() {
                fields.push((name, text));
            }
        }
    }
}

/// Percent-encodes parameters as `application/x-www-form-urlencoded`.
///
/// The same encoding is used for GET query strings and urlencoded bodies.
pub(crate) fn encode_form(parameters: &Parameters) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(flatten(parameters))
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: Vec<(&str, Param)>) -> Parameters {
        pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn test_falsy_values() {
        assert!(Param::Null.is_falsy());
        assert!(Param::Bool(false).is_falsy());
        assert!(Param::Int(0).is_falsy());
        assert!(Param::Float(0.0).is_falsy());
        assert!(Param::from("").is_falsy());
        assert!(Param::from("0").is_falsy());
        assert!(Param::List(vec![]).is_falsy());
        assert!(Param::Map(IndexMap::new()).is_falsy());

        assert!(!Param::Bool(true).is_falsy());
        assert!(!Param::Int(-1).is_falsy());
        assert!(!Param::from("false").is_falsy());
        assert!(!Param::from(vec![Param::Null]).is_falsy());
    }

    #[test]
    fn test_filter_keeps_order_of_remaining_keys() {
        let parameters = params(vec![
            ("offset", Param::Int(0)),
            ("username", Param::from("alice")),
            ("mature_content", Param::Bool(false)),
            ("limit", Param::Int(24)),
            ("cursor", Param::from(None::<String>)),
        ]);

        let filtered = filter_falsy(&parameters);
        let keys: Vec<&str> = filtered.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["username", "limit"]);
    }

    #[test]
    fn test_flatten_lists_and_maps() {
        let mut filter = IndexMap::new();
        filter.insert("type", Param::from("deviation"));
        filter.insert("skip", Param::Null);

        let parameters = params(vec![
            ("tags", Param::from(vec!["cat", "dog"])),
            ("filter", Param::from(filter)),
            ("is_dirty", Param::Bool(true)),
            ("nested", Param::from(vec![Param::Bool(false), Param::Int(0)])),
        ]);

        assert_eq!(
            flatten(&parameters),
            vec![
                ("tags[0]".to_string(), "cat".to_string()),
                ("tags[1]".to_string(), "dog".to_string()),
                ("filter[type]".to_string(), "deviation".to_string()),
                ("is_dirty".to_string(), "1".to_string()),
                ("nested[0]".to_string(), "0".to_string()),
                ("nested[1]".to_string(), "0".to_string()),
            ]
        );
    }

    #[test]
    fn test_encode_form_percent_encodes() {
        let parameters = params(vec![
            ("q", Param::from("blue sky & sea")),
            ("tags", Param::from(vec!["a/b"])),
        ]);

        assert_eq!(
            encode_form(&parameters),
            "q=blue+sky+%26+sea&tags%5B0%5D=a%2Fb"
        );
    }

    #[test]
    fn test_from_json_value() {
        let value = serde_json::json!({"a": [1, "x"], "b": null, "c": 1.5});
        let expected = {
            let mut map = IndexMap::new();
            map.insert("a".to_string(), Param::List(vec![Param::Int(1), Param::from("x")]));
            map.insert("b".to_string(), Param::Null);
            map.insert("c".to_string(), Param::Float(1.5));
            Param::Map(map)
        };
        let converted = Param::from(value);
        match (&converted, &expected) {
            (Param::Map(got), Param::Map(want)) => {
                for (key, value) in want {
                    assert_eq!(got.get(key), Some(value));
                }
                assert_eq!(got.len(), want.len());
            }
            _ => panic!("Expected map, got {:?}", converted),
        }
    }

    #[test]
    fn test_large_unsigned_falls_back_to_string() {
        assert_eq!(Param::from(u64::MAX), Param::Str(u64::MAX.to_string()));
        assert_eq!(Param::from(7usize), Param::Int(7));
    }
}
