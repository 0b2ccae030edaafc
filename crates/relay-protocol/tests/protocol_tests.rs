//! Protocol layer tests — envelope wire format, welcome frame, errors.

#[cfg(test)]
mod tests {
    use relay_protocol::*;
    use serde_json::json;

    // ─────────────────────────────────────────────────────────────────────
    // Envelope
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn unknown_fields_are_ignored() {
        let text = json!({
            "Userid": "peer-1",
            "Message": "hello",
            "timestamp": 1700000000,
            "extra": { "nested": true }
        })
        .to_string();
        let env = Envelope::parse(&text).unwrap().unwrap();
        assert_eq!(env, Envelope::new("peer-1", "hello"));
    }

    #[test]
    fn payload_is_kept_verbatim() {
        // A JSON document inside the payload string stays a string.
        let inner = r#"{"kind":"chat","body":"hi there"}"#;
        let text = json!({ "Userid": "b", "Message": inner }).to_string();
        let env = Envelope::parse(&text).unwrap().unwrap();
        assert_eq!(env.payload(), Some(inner));
    }

    #[test]
    fn missing_payload_still_parses() {
        let env = Envelope::parse(r#"{"Userid":"b"}"#).unwrap().unwrap();
        assert_eq!(env.recipient(), Some("b"));
        assert_eq!(env.payload(), None);
    }

    #[test]
    fn field_names_are_case_sensitive() {
        let env = Envelope::parse(r#"{"userid":"b","message":"hi"}"#).unwrap().unwrap();
        assert_eq!(env.recipient(), None);
        assert_eq!(env.payload(), None);
    }

    #[test]
    fn object_payload_is_forwarded_as_json_text() {
        let env = Envelope::parse(r#"{"Userid":"b","Message":{"a":1}}"#).unwrap().unwrap();
        assert_eq!(env.payload(), Some(r#"{"a":1}"#));
    }

    #[test]
    fn envelope_serializes_with_wire_names() {
        let value = serde_json::to_value(Envelope::new("b", "hi")).unwrap();
        assert_eq!(value, json!({ "Userid": "b", "Message": "hi" }));
    }

    #[test]
    fn plain_text_is_malformed() {
        let err = Envelope::parse("not json").unwrap_err();
        assert!(matches!(err, RelayError::MalformedEnvelope(_)));
    }

    #[test]
    fn array_is_not_an_envelope() {
        let err = Envelope::parse(r#"["b","hi"]"#).unwrap_err();
        assert!(matches!(err, RelayError::NotAnObject("array")));
    }

    // ─────────────────────────────────────────────────────────────────────
    // Welcome
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn welcome_wire_shape() {
        let value: serde_json::Value = serde_json::from_str(&Welcome::new("abc").to_json()).unwrap();
        assert_eq!(value, json!({ "type": "connected", "clientId": "abc" }));
    }

    #[test]
    fn welcome_roundtrips_through_client_parse() {
        let parsed: Welcome = serde_json::from_str(&Welcome::new("abc").to_json()).unwrap();
        assert_eq!(parsed.kind, Welcome::KIND);
        assert_eq!(parsed.client_id, "abc");
    }
}
