//! Cross-serde integration tests
//!
//! These exercise the serde family through the environment as a whole:
//! round-trips across every key type and boundary value, byte-order
//! properties of the time suffix, and property-based round-trips.

use proptest::prelude::*;
use std::sync::Arc;
use tempokv_core::{KeyPrefix, Tag, TemporalKey, Timestamp, Val};
use tempokv_store::{
    create_key_serde, ByteBufferPool, Env, KeySchema, KeyType, TemporalKeySerde,
    TemporalPrecision,
};

fn build(key_type: KeyType) -> Box<dyn TemporalKeySerde> {
    create_key_serde(&KeySchema::new(key_type), ByteBufferPool::new(), None).unwrap()
}

fn roundtrip(serde: &dyn TemporalKeySerde, env: &Env, key: &TemporalKey) -> TemporalKey {
    let bytes = env
        .write(|txn| serde.write(txn, key).map(|b| b.to_vec()))
        .unwrap();
    env.read(|txn| serde.read(txn, &bytes)).unwrap()
}

// ============================================================================
// Boundary-value round-trips
// ============================================================================

#[test]
fn test_boundary_values_roundtrip_per_key_type() {
    let t = Timestamp::from_millis(1_700_000_000_000);
    let cases: Vec<(KeyType, Vec<Val>)> = vec![
        (KeyType::Boolean, vec![Val::Bool(false), Val::Bool(true)]),
        (KeyType::Byte, vec![Val::Byte(i8::MIN), Val::Byte(0), Val::Byte(i8::MAX)]),
        (KeyType::Short, vec![Val::Short(i16::MIN), Val::Short(i16::MAX)]),
        (KeyType::Int, vec![Val::Int(i32::MIN), Val::Int(i32::MAX)]),
        (KeyType::Long, vec![Val::Long(i64::MIN), Val::Long(0), Val::Long(i64::MAX)]),
        (
            KeyType::Float,
            vec![
                Val::Float(0.0),
                Val::Float(-0.0),
                Val::Float(f32::NAN),
                Val::Float(f32::MIN),
                Val::Float(f32::MAX),
            ],
        ),
        (
            KeyType::Double,
            vec![
                Val::Double(f64::NEG_INFINITY),
                Val::Double(f64::NAN),
                Val::Double(f64::MAX),
            ],
        ),
        (
            KeyType::String,
            vec![
                Val::String(String::new()),
                Val::String("a".to_string()),
                Val::String("x".repeat(503)), // exactly at the default limit
            ],
        ),
        (
            KeyType::UidLookup,
            vec![Val::String(String::new()), Val::String("interned".to_string())],
        ),
        (
            KeyType::HashLookup,
            vec![Val::Long(0), Val::String("hashed".to_string())],
        ),
        (
            KeyType::Variable,
            vec![
                Val::String(String::new()),
                Val::String("x".repeat(39)),  // last direct size
                Val::String("x".repeat(40)),  // first uid-interned size
                Val::String("x".repeat(510)), // last uid-interned size
                Val::String("x".repeat(511)), // first hash-interned size
            ],
        ),
    ];

    for (key_type, vals) in cases {
        let serde = build(key_type);
        let env = Env::new();
        for val in vals {
            let key = TemporalKey::new(KeyPrefix::Value(val), t);
            let decoded = roundtrip(serde.as_ref(), &env, &key);
            assert_eq!(decoded, key, "roundtrip failed for {:?}", key_type);
        }
    }
}

#[test]
fn test_tags_boundary_roundtrips() {
    let serde = build(KeyType::Tags);
    let env = Env::new();
    let t = Timestamp::from_millis(500);
    for tags in [
        vec![],
        vec![Tag::new("a", "")],
        vec![Tag::new("", "empty name")],
        vec![
            Tag::new("host", "srv1"),
            Tag::new("region", "eu"),
            Tag::new("zone", Val::Long(3)),
        ],
    ] {
        let key = TemporalKey::new(KeyPrefix::tags(tags), t);
        assert_eq!(roundtrip(serde.as_ref(), &env, &key), key);
    }
}

// ============================================================================
// Time-suffix ordering
// ============================================================================

#[test]
fn test_encoded_keys_order_by_time_for_fixed_prefix() {
    for key_type in [
        KeyType::Long,
        KeyType::String,
        KeyType::UidLookup,
        KeyType::Variable,
        KeyType::Tags,
    ] {
        let serde = build(key_type);
        let env = Env::new();
        let prefix = match key_type {
            KeyType::Long => KeyPrefix::Value(Val::Long(42)),
            KeyType::Tags => KeyPrefix::tags(vec![Tag::new("host", "srv1")]),
            _ => KeyPrefix::Value(Val::String("prefix".to_string())),
        };

        let times = [1_000u64, 2_000, 30_000, 400_000];
        let encoded: Vec<Vec<u8>> = env.write(|txn| {
            times
                .iter()
                .map(|millis| {
                    let key =
                        TemporalKey::new(prefix.clone(), Timestamp::from_millis(*millis));
                    serde.write(txn, &key).unwrap().to_vec()
                })
                .collect()
        });

        for window in encoded.windows(2) {
            assert!(
                window[0] < window[1],
                "byte order broke chronological order for {:?}",
                key_type
            );
        }
    }
}

#[test]
fn test_second_precision_orders_too() {
    let schema = KeySchema::new(KeyType::String).with_precision(TemporalPrecision::Second);
    let serde = create_key_serde(&schema, ByteBufferPool::new(), None).unwrap();
    let env = Env::new();
    let earlier = TemporalKey::of("p", Timestamp::from_secs(100));
    let later = TemporalKey::of("p", Timestamp::from_secs(200));
    let (a, b) = env.write(|txn| {
        (
            serde.write(txn, &earlier).unwrap().to_vec(),
            serde.write(txn, &later).unwrap().to_vec(),
        )
    });
    assert!(a < b);
}

// ============================================================================
// Idempotent interning across transactions
// ============================================================================

#[test]
fn test_identical_prefix_encodes_identically_across_txns() {
    for key_type in [KeyType::UidLookup, KeyType::HashLookup, KeyType::Variable] {
        let serde = build(key_type);
        let env = Env::new();
        let key = TemporalKey::of("x".repeat(60).as_str(), Timestamp::from_millis(9));
        let first = env
            .write(|txn| serde.write(txn, &key).map(|b| b.to_vec()))
            .unwrap();
        let second = env
            .write(|txn| serde.write(txn, &key).map(|b| b.to_vec()))
            .unwrap();
        assert_eq!(first, second, "encoding drifted for {:?}", key_type);
    }
}

#[test]
fn test_random_tag_permutations_encode_identically() {
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    let serde = build(KeyType::Tags);
    let env = Env::new();
    let mut rng = rand::rngs::StdRng::seed_from_u64(7);
    let tags = vec![
        Tag::new("alpha", "1"),
        Tag::new("beta", "2"),
        Tag::new("gamma", Val::Long(3)),
        Tag::new("delta", Val::Bool(true)),
        Tag::new("epsilon", Val::Double(0.5)),
    ];

    let canonical = env.write(|txn| {
        let key = TemporalKey::new(KeyPrefix::tags(tags.clone()), Timestamp::from_millis(9));
        serde.write(txn, &key).unwrap().to_vec()
    });

    for _ in 0..20 {
        let mut shuffled = tags.clone();
        shuffled.shuffle(&mut rng);
        let key = TemporalKey::new(KeyPrefix::tags(shuffled), Timestamp::from_millis(9));
        let bytes = env.write(|txn| serde.write(txn, &key).unwrap().to_vec());
        assert_eq!(bytes, canonical);
    }
}

// ============================================================================
// Property-based round-trips
// ============================================================================

fn arb_val() -> impl Strategy<Value = Val> {
    prop_oneof![
        any::<bool>().prop_map(Val::Bool),
        any::<i8>().prop_map(Val::Byte),
        any::<i16>().prop_map(Val::Short),
        any::<i32>().prop_map(Val::Int),
        any::<i64>().prop_map(Val::Long),
        any::<f32>().prop_map(Val::Float),
        any::<f64>().prop_map(Val::Double),
        ".{0,120}".prop_map(Val::String),
        any::<u64>().prop_map(|m| Val::Date(Timestamp::from_micros(m))),
    ]
}

fn arb_tags() -> impl Strategy<Value = Vec<Tag>> {
    prop::collection::btree_map("[a-z]{1,12}", arb_val(), 0..6).prop_map(|m| {
        m.into_iter()
            .map(|(name, value)| Tag { name, value })
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_variable_serde_roundtrips(val in arb_val(), millis in 0u64..4_000_000_000_000) {
        let serde = build(KeyType::Variable);
        let env = Env::new();
        let key = TemporalKey::new(KeyPrefix::Value(val), Timestamp::from_millis(millis));
        prop_assert_eq!(roundtrip(serde.as_ref(), &env, &key), key);
    }

    #[test]
    fn prop_uid_serde_roundtrips(val in arb_val(), millis in 0u64..4_000_000_000_000) {
        let serde = build(KeyType::UidLookup);
        let env = Env::new();
        let key = TemporalKey::new(KeyPrefix::Value(val), Timestamp::from_millis(millis));
        prop_assert_eq!(roundtrip(serde.as_ref(), &env, &key), key);
    }

    #[test]
    fn prop_tags_serde_roundtrips(tags in arb_tags(), millis in 0u64..4_000_000_000_000) {
        let serde = build(KeyType::Tags);
        let env = Env::new();
        let key = TemporalKey::new(KeyPrefix::tags(tags), Timestamp::from_millis(millis));
        prop_assert_eq!(roundtrip(serde.as_ref(), &env, &key), key);
    }

    #[test]
    fn prop_tag_permutation_encodes_identically(tags in arb_tags(), millis in 0u64..1_000_000_000) {
        let serde = build(KeyType::Tags);
        let env = Env::new();
        let mut reversed = tags.clone();
        reversed.reverse();
        let a = TemporalKey::new(KeyPrefix::tags(tags), Timestamp::from_millis(millis));
        let b = TemporalKey::new(KeyPrefix::tags(reversed), Timestamp::from_millis(millis));
        let (bytes_a, bytes_b) = env.write(|txn| {
            (
                serde.write(txn, &a).unwrap().to_vec(),
                serde.write(txn, &b).unwrap().to_vec(),
            )
        });
        prop_assert_eq!(bytes_a, bytes_b);
    }
}
