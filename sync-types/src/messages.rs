//! Protocol messages for monto-sync.
//!
//! These are the payloads carried as `params` inside an [`Envelope`].

use serde::{Deserialize, Serialize};

use crate::{Envelope, MontoError, Product, RangePair, SourceUri};

/// All messages the client acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// A full product snapshot
    PublishProduct(PublishProduct),
    /// Anything else on the channel (other notifications, requests, responses)
    Ignored {
        /// Method name, if the message had one
        method: Option<String>,
    },
}

impl Message {
    /// Decode a JSON-RPC message body.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MontoError> {
        let envelope = Envelope::from_bytes(bytes)?;
        if !envelope.is_notification() {
            return Ok(Self::Ignored {
                method: envelope.method,
            });
        }
        match envelope.method.as_deref() {
            Some(PublishProduct::METHOD) => {
                let params = envelope.params.ok_or_else(|| MontoError::MissingParams {
                    method: PublishProduct::METHOD.to_string(),
                })?;
                let payload: PublishProduct =
                    serde_json::from_value(params).map_err(MontoError::Deserialization)?;
                Ok(Self::PublishProduct(payload))
            }
            _ => Ok(Self::Ignored {
                method: envelope.method,
            }),
        }
    }

    /// Encode as a JSON-RPC notification body.
    ///
    /// `Ignored` has no wire form of its own and encodes as an empty-params
    /// notification with its method.
    pub fn to_bytes(&self) -> Result<Vec<u8>, MontoError> {
        let envelope = match self {
            Self::PublishProduct(payload) => Envelope::notification(
                PublishProduct::METHOD,
                serde_json::to_value(payload).map_err(MontoError::Serialization)?,
            ),
            Self::Ignored { method } => Envelope::notification(
                method.as_deref().unwrap_or_default(),
                serde_json::Value::Null,
            ),
        };
        envelope.to_bytes()
    }
}

/// Payload of the `monto/publishProduct` notification.
///
/// Offsets are unsigned, so a negative offset fails deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishProduct {
    /// Source document identifier
    pub uri: String,
    /// Product kind
    pub name: String,
    /// Display language of `content`
    pub language: String,
    /// Full product text
    pub content: String,
    /// Source/product correspondence table
    pub range_map: Vec<RangePair>,
}

impl PublishProduct {
    /// JSON-RPC method name.
    pub const METHOD: &'static str = "monto/publishProduct";

    /// Validate the payload and turn it into a [`Product`].
    pub fn into_product(self) -> Result<Product, MontoError> {
        let source = SourceUri::parse(&self.uri)?;
        Product::new(
            source,
            self.name,
            self.language,
            self.content,
            self.range_map,
        )
    }
}

impl From<&Product> for PublishProduct {
    fn from(product: &Product) -> Self {
        Self {
            uri: product.source.to_string(),
            name: product.name.clone(),
            language: product.language.clone(),
            content: product.content.clone(),
            range_map: product.range_map.clone(),
        }
    }
}
