use proptest::prelude::*;

use ptn_types::{
    Address, Asset, ConfigPayload, DataPayload, Hash, Input, Message, OutPoint, Output,
    PaymentPayload, SignatureEntry, SignaturePayload, Timestamp, Transaction,
};

fn arb_outpoint() -> impl Strategy<Value = OutPoint> {
    (prop::array::uniform32(0u8..), 0u32..8, 0u32..8)
        .prop_map(|(h, m, o)| OutPoint::new(Hash::new(h), m, o))
}

fn arb_payment() -> impl Strategy<Value = Message> {
    (
        prop::collection::vec((arb_outpoint(), prop::collection::vec(any::<u8>(), 0..64)), 0..4),
        prop::collection::vec((0u64..1_000_000, prop::array::uniform20(0u8..)), 0..4),
    )
        .prop_map(|(ins, outs)| {
            let inputs = ins
                .into_iter()
                .map(|(op, script)| Input::new(op, script))
                .collect();
            let outputs = outs
                .into_iter()
                .map(|(v, owner)| Output::new(v, &Address::new(owner), Asset::ptn()))
                .collect();
            Message::Payment(PaymentPayload::new(inputs, outputs))
        })
}

fn arb_message() -> impl Strategy<Value = Message> {
    prop_oneof![
        arb_payment(),
        (prop::collection::vec(any::<u8>(), 1..64), prop::collection::vec(any::<u8>(), 0..16))
            .prop_map(|(main, extra)| Message::Data(DataPayload {
                main_data: main,
                extra_data: extra,
            })),
        ("[a-z]{1,12}", prop::collection::vec(any::<u8>(), 0..32)).prop_map(|(key, value)| {
            Message::Config(ConfigPayload { key, value })
        }),
        prop::collection::vec(
            (prop::collection::vec(any::<u8>(), 33..34), prop::collection::vec(any::<u8>(), 65..66)),
            0..3
        )
        .prop_map(|entries| Message::Signature(SignaturePayload {
            signatures: entries
                .into_iter()
                .map(|(pub_key, signature)| SignatureEntry { pub_key, signature })
                .collect(),
        })),
    ]
}

proptest! {
    /// Hash roundtrip: new -> as_bytes produces identical bytes.
    #[test]
    fn hash_roundtrip(bytes in prop::array::uniform32(0u8..)) {
        let hash = Hash::new(bytes);
        prop_assert_eq!(hash.as_bytes(), &bytes);
    }

    /// Hash::is_zero is true only for all-zero bytes.
    #[test]
    fn hash_is_zero_correct(bytes in prop::array::uniform32(0u8..)) {
        let hash = Hash::new(bytes);
        prop_assert_eq!(hash.is_zero(), bytes == [0u8; 32]);
    }

    /// Address string form roundtrip.
    #[test]
    fn address_string_roundtrip(bytes in prop::array::uniform20(0u8..)) {
        let addr = Address::new(bytes);
        let parsed = Address::from_str_form(&addr.to_string()).unwrap();
        prop_assert_eq!(parsed, addr);
    }

    /// Timestamp ordering matches integer ordering.
    #[test]
    fn timestamp_ordering(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        prop_assert_eq!(Timestamp::new(a) <= Timestamp::new(b), a <= b);
    }

    /// Transaction hashing is a pure function of the message list.
    #[test]
    fn tx_hash_deterministic(msgs in prop::collection::vec(arb_message(), 0..5)) {
        let a = Transaction::new(msgs.clone());
        let b = Transaction::new(msgs);
        prop_assert_eq!(a.hash(), b.hash());
        prop_assert_eq!(a.request_hash(), b.request_hash());
        prop_assert_eq!(a.signing_hash(), b.signing_hash());
    }

    /// Appending a signature message never changes the request hash.
    #[test]
    fn request_hash_ignores_signatures(msgs in prop::collection::vec(arb_message(), 0..5)) {
        let base = Transaction::new(msgs);
        let mut extended = base.clone();
        extended.add_message(Message::Signature(SignaturePayload {
            signatures: vec![SignatureEntry { pub_key: vec![2; 33], signature: vec![9; 65] }],
        }));
        prop_assert_eq!(base.request_hash(), extended.request_hash());
        prop_assert_eq!(base.signing_hash(), extended.signing_hash());
    }

    /// Size equals the canonical encoding length and distinct messages
    /// change the hash.
    #[test]
    fn size_matches_encoding(msgs in prop::collection::vec(arb_message(), 0..5)) {
        let tx = Transaction::new(msgs);
        prop_assert_eq!(tx.size(), tx.encode().len());
    }

    /// serde roundtrip preserves identity.
    #[test]
    fn tx_serde_roundtrip(msgs in prop::collection::vec(arb_message(), 0..4)) {
        let tx = Transaction::new(msgs);
        let json = serde_json::to_string(&tx).unwrap();
        let back: Transaction = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back.hash(), tx.hash());
    }
}
