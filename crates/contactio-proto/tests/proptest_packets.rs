//! Property-based tests for frame and packet parsing.
//!
//! 1. Parsing never panics on arbitrary input
//! 2. Events built from arbitrary names and conversation ids survive the
//!    full Engine.IO + Socket.IO envelope

use contactio_proto::{ClientEvent, EnginePacket, Packet};
use proptest::prelude::*;

fn conversation_id_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9_:\\-]{1,40}").expect("valid regex")
}

proptest! {
    #[test]
    fn engine_parse_never_panics(frame in ".{0,200}") {
        let _ = EnginePacket::parse(&frame);
    }

    #[test]
    fn packet_parse_never_panics(raw in "[0-9/,\\[\\]{}\":a-z ]{0,120}") {
        let _ = Packet::parse(&raw);
    }

    #[test]
    fn subscribe_survives_envelope(id in conversation_id_strategy(), subscribe in any::<bool>()) {
        let event = if subscribe {
            ClientEvent::SubscribeConversation(id.clone().into())
        } else {
            ClientEvent::UnsubscribeConversation(id.clone().into())
        };
        let frame = EnginePacket::Message(event.to_packet().encode()).encode();

        let body = match EnginePacket::parse(&frame).unwrap() {
            EnginePacket::Message(body) => body,
            other => panic!("expected message, got {:?}", other),
        };
        let packet = Packet::parse(&body).unwrap();
        prop_assert_eq!(ClientEvent::from_packet(&packet), Some(event));
    }
}
