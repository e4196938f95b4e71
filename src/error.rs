use crate::{num::PriceError, types::EventKind};

/// Error raised while normalizing or rendering an event.
///
/// Unrecognized event kinds are not errors, they are rendered by the
/// fallback renderer.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// A field the event kind requires is absent.
    #[error("malformed payload: missing {field}")]
    MalformedPayload { field: &'static str },

    /// Payload JSON does not match the shape of its kind.
    #[error("malformed {kind} payload: {source}")]
    Decode {
        kind: EventKind,
        #[source]
        source: serde_json::Error,
    },

    /// A price field is present but not a valid amount or rate.
    #[error("malformed payload: {0}")]
    Price(#[from] PriceError),

    /// Renderer invoked with an event of another kind.
    #[error("renderer for {expected} invoked with {actual} event")]
    KindMismatch {
        expected: EventKind,
        actual: EventKind,
    },
}

pub type Result<T> = std::result::Result<T, RenderError>;
