//! Avro wire codecs for the signing topics.

use apache_avro::{Schema, from_avro_datum, to_avro_datum, types::Value};
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::{
    bus::BusTopics,
    signing::messages::{
        RequestUuid, SignedOrder, SignedOrderStatus, SigningOrder, SigningOrderRequest,
        SigningOrderResult,
    },
};

/// Schema of the signing request topic.
pub const SIGNING_ORDER_REQUEST_SCHEMA: &str = r#"{
    "namespace": "brave.payments",
    "type": "record",
    "doc": "Top level request containing the data to be processed, as well as any top level metadata for this message.",
    "name": "signingOrderRequestSchema",
    "fields": [
        {"name": "request_id", "type": "string"},
        {
            "name": "data",
            "type": {
                "type": "array",
                "items": {
                    "namespace": "brave.payments",
                    "type": "record",
                    "name": "SigningOrder",
                    "fields": [
                        {"name": "associated_data", "type": "bytes", "doc": "contains METADATA"},
                        {"name": "blinded_tokens", "type": {"type": "array", "items": "string"}},
                        {"name": "issuer_type", "type": "string"},
                        {"name": "issuer_cohort", "type": "int"}
                    ]
                }
            }
        }
    ]
}"#;

/// Schema of the signing result topic.
pub const SIGNING_ORDER_RESULT_SCHEMA: &str = r#"{
    "namespace": "brave.payments",
    "type": "record",
    "doc": "Top level request containing the data to be processed, as well as any top level metadata for this message.",
    "name": "signingOrderResultSchema",
    "fields": [
        {"name": "request_id", "type": "string"},
        {
            "name": "data",
            "type": {
                "type": "array",
                "items": {
                    "namespace": "brave.payments",
                    "type": "record",
                    "name": "SignedOrder",
                    "fields": [
                        {"name": "signed_tokens", "type": {"type": "array", "items": "string"}},
                        {"name": "public_key", "type": "string"},
                        {"name": "proof", "type": "string"},
                        {"name": "status", "type": {
                            "name": "SigningResultStatus",
                            "type": "enum",
                            "symbols": ["ok", "invalid_issuer", "error"]
                        }},
                        {"name": "associated_data", "type": "bytes", "doc": "contains METADATA"},
                        {"name": "valid_to", "type": ["null", "string"], "default": null},
                        {"name": "valid_from", "type": ["null", "string"], "default": null},
                        {"name": "blinded_tokens", "type": {"type": "array", "items": "string"}, "default": []}
                    ]
                }
            }
        }
    ]
}"#;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("no codec registered for topic {0:?}")]
    MissingCodec(String),

    #[error("topic {topic:?} carries {actual:?} messages, not {expected:?}")]
    WrongSchema {
        topic: String,
        expected: MessageKind,
        actual: MessageKind,
    },

    #[error("avro error")]
    Avro(#[from] apache_avro::Error),

    #[error("unexpected value for field {0}")]
    InvalidField(&'static str),
}

/// Which message a topic carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    SigningOrderRequest,
    SigningOrderResult,
}

impl MessageKind {
    fn schema_source(self) -> &'static str {
        match self {
            Self::SigningOrderRequest => SIGNING_ORDER_REQUEST_SCHEMA,
            Self::SigningOrderResult => SIGNING_ORDER_RESULT_SCHEMA,
        }
    }
}

#[derive(Debug)]
struct TopicCodec {
    kind: MessageKind,
    schema: Schema,
}

/// Topic to schema registry. Encoding or decoding on a topic without a
/// registered codec is a configuration error.
#[derive(Debug, Default)]
pub struct CodecRegistry {
    codecs: FxHashMap<String, TopicCodec>,
}

impl CodecRegistry {
    /// Register the codec for `kind` on `topic`.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema fails to parse.
    pub fn register(&mut self, topic: &str, kind: MessageKind) -> Result<(), CodecError> {
        let schema = Schema::parse_str(kind.schema_source())?;

        self.codecs
            .insert(topic.to_string(), TopicCodec { kind, schema });

        Ok(())
    }

    /// Registry with both signing topics registered.
    ///
    /// # Errors
    ///
    /// Returns an error if a schema fails to parse.
    pub fn for_topics(topics: &BusTopics) -> Result<Self, CodecError> {
        let mut registry = Self::default();

        registry.register(&topics.signing_requests, MessageKind::SigningOrderRequest)?;
        registry.register(&topics.signing_results, MessageKind::SigningOrderResult)?;

        Ok(registry)
    }

    fn codec(&self, topic: &str, expected: MessageKind) -> Result<&TopicCodec, CodecError> {
        let codec = self
            .codecs
            .get(topic)
            .ok_or_else(|| CodecError::MissingCodec(topic.to_string()))?;

        if codec.kind != expected {
            return Err(CodecError::WrongSchema {
                topic: topic.to_string(),
                expected,
                actual: codec.kind,
            });
        }

        Ok(codec)
    }

    /// Encode a signing request for `topic`.
    ///
    /// # Errors
    ///
    /// Returns an error if no request codec is registered for the topic or
    /// the message does not fit the schema.
    pub fn encode_request(
        &self,
        topic: &str,
        request: &SigningOrderRequest,
    ) -> Result<Vec<u8>, CodecError> {
        let codec = self.codec(topic, MessageKind::SigningOrderRequest)?;

        Ok(to_avro_datum(&codec.schema, request_to_value(request))?)
    }

    /// Decode a signing request read from `topic`.
    ///
    /// # Errors
    ///
    /// Returns an error if no request codec is registered for the topic or
    /// the payload does not match the schema.
    pub fn decode_request(
        &self,
        topic: &str,
        payload: &[u8],
    ) -> Result<SigningOrderRequest, CodecError> {
        let codec = self.codec(topic, MessageKind::SigningOrderRequest)?;
        let value = from_avro_datum(&codec.schema, &mut &payload[..], None)?;

        request_from_value(value)
    }

    /// Encode a signing result for `topic`.
    ///
    /// # Errors
    ///
    /// Returns an error if no result codec is registered for the topic or
    /// the message does not fit the schema.
    pub fn encode_result(
        &self,
        topic: &str,
        result: &SigningOrderResult,
    ) -> Result<Vec<u8>, CodecError> {
        let codec = self.codec(topic, MessageKind::SigningOrderResult)?;

        Ok(to_avro_datum(&codec.schema, result_to_value(result))?)
    }

    /// Decode a signing result read from `topic`.
    ///
    /// # Errors
    ///
    /// Returns an error if no result codec is registered for the topic or
    /// the payload does not match the schema.
    pub fn decode_result(
        &self,
        topic: &str,
        payload: &[u8],
    ) -> Result<SigningOrderResult, CodecError> {
        let codec = self.codec(topic, MessageKind::SigningOrderResult)?;
        let value = from_avro_datum(&codec.schema, &mut &payload[..], None)?;

        result_from_value(value)
    }
}

fn strings(values: &[String]) -> Value {
    Value::Array(values.iter().cloned().map(Value::String).collect())
}

fn optional_string(value: Option<&String>) -> Value {
    match value {
        Some(value) => Value::Union(1, Box::new(Value::String(value.clone()))),
        None => Value::Union(0, Box::new(Value::Null)),
    }
}

fn request_to_value(request: &SigningOrderRequest) -> Value {
    let data = request
        .data
        .iter()
        .map(|order| {
            Value::Record(vec![
                (
                    "associated_data".to_string(),
                    Value::Bytes(order.associated_data.clone()),
                ),
                ("blinded_tokens".to_string(), strings(&order.blinded_tokens)),
                (
                    "issuer_type".to_string(),
                    Value::String(order.issuer_type.clone()),
                ),
                (
                    "issuer_cohort".to_string(),
                    Value::Int(i32::from(order.issuer_cohort)),
                ),
            ])
        })
        .collect();

    Value::Record(vec![
        (
            "request_id".to_string(),
            Value::String(request.request_id.to_string()),
        ),
        ("data".to_string(), Value::Array(data)),
    ])
}

fn result_to_value(result: &SigningOrderResult) -> Value {
    let data = result
        .data
        .iter()
        .map(|order| {
            Value::Record(vec![
                ("signed_tokens".to_string(), strings(&order.signed_tokens)),
                (
                    "public_key".to_string(),
                    Value::String(order.public_key.clone()),
                ),
                ("proof".to_string(), Value::String(order.proof.clone())),
                (
                    "status".to_string(),
                    Value::Enum(order.status.index(), order.status.as_str().to_string()),
                ),
                (
                    "associated_data".to_string(),
                    Value::Bytes(order.associated_data.clone()),
                ),
                ("valid_to".to_string(), optional_string(order.valid_to.as_ref())),
                (
                    "valid_from".to_string(),
                    optional_string(order.valid_from.as_ref()),
                ),
                ("blinded_tokens".to_string(), strings(&order.blinded_tokens)),
            ])
        })
        .collect();

    Value::Record(vec![
        (
            "request_id".to_string(),
            Value::String(result.request_id.clone()),
        ),
        ("data".to_string(), Value::Array(data)),
    ])
}

/// Decoded record fields, taken by name.
struct Fields(Vec<(String, Value)>);

impl Fields {
    fn from_value(value: Value, field: &'static str) -> Result<Self, CodecError> {
        match value {
            Value::Record(fields) => Ok(Self(fields)),
            _ => Err(CodecError::InvalidField(field)),
        }
    }

    fn take(&mut self, name: &'static str) -> Result<Value, CodecError> {
        let index = self
            .0
            .iter()
            .position(|(key, _)| key == name)
            .ok_or(CodecError::InvalidField(name))?;

        Ok(self.0.swap_remove(index).1)
    }

    fn string(&mut self, name: &'static str) -> Result<String, CodecError> {
        match self.take(name)? {
            Value::String(value) => Ok(value),
            _ => Err(CodecError::InvalidField(name)),
        }
    }

    fn bytes(&mut self, name: &'static str) -> Result<Vec<u8>, CodecError> {
        match self.take(name)? {
            Value::Bytes(value) => Ok(value),
            _ => Err(CodecError::InvalidField(name)),
        }
    }

    fn int(&mut self, name: &'static str) -> Result<i32, CodecError> {
        match self.take(name)? {
            Value::Int(value) => Ok(value),
            _ => Err(CodecError::InvalidField(name)),
        }
    }

    fn optional_string(&mut self, name: &'static str) -> Result<Option<String>, CodecError> {
        let value = match self.take(name)? {
            Value::Union(_, inner) => *inner,
            other => other,
        };

        match value {
            Value::Null => Ok(None),
            Value::String(value) => Ok(Some(value)),
            _ => Err(CodecError::InvalidField(name)),
        }
    }

    fn strings(&mut self, name: &'static str) -> Result<Vec<String>, CodecError> {
        match self.take(name)? {
            Value::Array(values) => values
                .into_iter()
                .map(|value| match value {
                    Value::String(value) => Ok(value),
                    _ => Err(CodecError::InvalidField(name)),
                })
                .collect(),
            _ => Err(CodecError::InvalidField(name)),
        }
    }

    fn records(&mut self, name: &'static str) -> Result<Vec<Self>, CodecError> {
        match self.take(name)? {
            Value::Array(values) => values
                .into_iter()
                .map(|value| Self::from_value(value, name))
                .collect(),
            _ => Err(CodecError::InvalidField(name)),
        }
    }
}

fn request_from_value(value: Value) -> Result<SigningOrderRequest, CodecError> {
    let mut fields = Fields::from_value(value, "request")?;

    let request_id = fields
        .string("request_id")?
        .parse::<RequestUuid>()
        .map_err(|_uuid| CodecError::InvalidField("request_id"))?;

    let data = fields
        .records("data")?
        .into_iter()
        .map(|mut order| {
            Ok(SigningOrder {
                associated_data: order.bytes("associated_data")?,
                blinded_tokens: order.strings("blinded_tokens")?,
                issuer_type: order.string("issuer_type")?,
                issuer_cohort: i16::try_from(order.int("issuer_cohort")?)
                    .map_err(|_range| CodecError::InvalidField("issuer_cohort"))?,
            })
        })
        .collect::<Result<Vec<_>, CodecError>>()?;

    Ok(SigningOrderRequest { request_id, data })
}

fn result_from_value(value: Value) -> Result<SigningOrderResult, CodecError> {
    let mut fields = Fields::from_value(value, "result")?;

    let request_id = fields.string("request_id")?;

    let data = fields
        .records("data")?
        .into_iter()
        .map(|mut order| {
            let status = match order.take("status")? {
                Value::Enum(_, symbol) => symbol
                    .parse::<SignedOrderStatus>()
                    .map_err(|_symbol| CodecError::InvalidField("status"))?,
                _ => return Err(CodecError::InvalidField("status")),
            };

            Ok(SignedOrder {
                signed_tokens: order.strings("signed_tokens")?,
                public_key: order.string("public_key")?,
                proof: order.string("proof")?,
                status,
                associated_data: order.bytes("associated_data")?,
                valid_to: order.optional_string("valid_to")?,
                valid_from: order.optional_string("valid_from")?,
                blinded_tokens: order.strings("blinded_tokens")?,
            })
        })
        .collect::<Result<Vec<_>, CodecError>>()?;

    Ok(SigningOrderResult { request_id, data })
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn topics() -> BusTopics {
        BusTopics {
            signing_requests: "requests".to_string(),
            signing_results: "results".to_string(),
            dead_letters: None,
            consumer_group: "group".to_string(),
        }
    }

    #[test]
    fn request_survives_the_wire() -> TestResult {
        let registry = CodecRegistry::for_topics(&topics())?;
        let request = SigningOrderRequest {
            request_id: RequestUuid::new(),
            data: vec![SigningOrder {
                associated_data: b"{\"a\":1}".to_vec(),
                blinded_tokens: vec!["b1".to_string(), "b2".to_string()],
                issuer_type: "brave.com?sku=vpn".to_string(),
                issuer_cohort: 1,
            }],
        };

        let payload = registry.encode_request("requests", &request)?;

        assert_eq!(registry.decode_request("requests", &payload)?, request);

        Ok(())
    }

    #[test]
    fn result_preserves_mixed_statuses_and_optional_bounds() -> TestResult {
        let registry = CodecRegistry::for_topics(&topics())?;
        let result = SigningOrderResult {
            request_id: RequestUuid::new().to_string(),
            data: vec![
                SignedOrder {
                    signed_tokens: vec!["s1".to_string()],
                    public_key: "pk".to_string(),
                    proof: "proof".to_string(),
                    status: SignedOrderStatus::Ok,
                    associated_data: b"ad".to_vec(),
                    valid_to: Some("2021-01-21T00:00:00Z".to_string()),
                    valid_from: Some("2021-01-20T00:00:00Z".to_string()),
                    blinded_tokens: vec!["b1".to_string()],
                },
                SignedOrder {
                    signed_tokens: Vec::new(),
                    public_key: String::new(),
                    proof: String::new(),
                    status: SignedOrderStatus::Error,
                    associated_data: b"ad".to_vec(),
                    valid_to: None,
                    valid_from: None,
                    blinded_tokens: Vec::new(),
                },
            ],
        };

        let payload = registry.encode_result("results", &result)?;

        assert_eq!(registry.decode_result("results", &payload)?, result);

        Ok(())
    }

    #[test]
    fn unknown_topic_is_missing_codec() {
        let registry = CodecRegistry::default();

        let result = registry.decode_result("results", &[]);

        assert!(
            matches!(result, Err(CodecError::MissingCodec(ref topic)) if topic == "results"),
            "expected MissingCodec, got {result:?}"
        );
    }

    #[test]
    fn topic_kind_mismatch_is_rejected() -> TestResult {
        let registry = CodecRegistry::for_topics(&topics())?;

        let result = registry.decode_result("requests", &[]);

        assert!(
            matches!(result, Err(CodecError::WrongSchema { .. })),
            "expected WrongSchema, got {result:?}"
        );

        Ok(())
    }
}
