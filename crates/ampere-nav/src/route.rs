use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::errors::NavigationError;

/// Parameter bag handed to a destination screen. Forwarded verbatim.
#[derive(Clone, Debug, Default, PartialEq, Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct RouteParams(Map<String, Value>);

impl RouteParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Decode the bag into a typed parameter struct.
    pub fn decode<D: DeserializeOwned>(&self) -> Result<D, serde_json::Error> {
        serde_json::from_value(Value::Object(self.0.clone()))
    }

    pub fn encode<D: Destination>(destination: &D) -> Result<Self, NavigationError> {
        match serde_json::to_value(destination) {
            Ok(Value::Object(map)) => Ok(Self(map)),
            // unit structs serialize to null
            Ok(Value::Null) => Ok(Self::default()),
            Ok(_) => Err(NavigationError::ParamsNotObject {
                destination: D::NAME,
            }),
            Err(source) => Err(NavigationError::ParamsEncode {
                destination: D::NAME,
                source,
            }),
        }
    }
}

impl From<Map<String, Value>> for RouteParams {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for RouteParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

/// A screen reachable by name whose parameters have a fixed shape.
///
/// ```
/// use ampere_nav::Destination;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// #[serde(rename_all = "camelCase")]
/// struct StationDetails {
///     station_id: String,
/// }
///
/// impl Destination for StationDetails {
///     const NAME: &'static str = "STATION_DETAILS";
/// }
/// ```
pub trait Destination: Serialize + DeserializeOwned {
    const NAME: &'static str;
}

/// One entry of the navigation stack. Immutable once created.
#[derive(Clone, Debug, PartialEq, Serialize, serde::Deserialize)]
pub struct Route {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    params: Option<RouteParams>,
}

impl Route {
    pub fn new(name: impl Into<String>, params: Option<RouteParams>) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, None)
    }

    pub fn to<D: Destination>(destination: &D) -> Result<Self, NavigationError> {
        Ok(Self::new(D::NAME, Some(RouteParams::encode(destination)?)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> Option<&RouteParams> {
        self.params.as_ref()
    }

    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    /// Typed params for `D`. `None` when this route is another destination
    /// or the params do not fit `D`.
    pub fn params_as<D: Destination>(&self) -> Option<D> {
        if self.name != D::NAME {
            return None;
        }
        let empty = RouteParams::default();
        let params = self.params.as_ref().unwrap_or(&empty);
        match params.decode() {
            Ok(decoded) => Some(decoded),
            // unit destinations decode from null
            Err(_) if params.is_empty() => serde_json::from_value(Value::Null).ok(),
            Err(_) => None,
        }
    }
}
