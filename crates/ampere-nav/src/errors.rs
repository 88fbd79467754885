use thiserror::Error;

#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("route params for '{destination}' must serialize to a JSON object")]
    ParamsNotObject { destination: &'static str },
    #[error("route params for '{destination}' failed to serialize: {source}")]
    ParamsEncode {
        destination: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum BridgeError {
    #[error("no navigator is mounted")]
    Unmounted,
}
