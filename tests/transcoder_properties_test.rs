//! Property tests: an answer that repeats an encoded value decodes back to it.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use aiface::prelude::*;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use proptest::prelude::*;

fn assert_echo<T>(value: T)
where
    T: Transcodable + Clone + PartialEq + std::fmt::Debug,
{
    let transcoder = Transcoder::new();
    let ty = T::semantic_type();
    let text = transcoder
        .encode(&ty, &value.clone().into_value())
        .unwrap_or_else(|e| panic!("encode {value:?}: {e}"));
    let decoded = transcoder
        .decode_result(&text, &ty)
        .unwrap_or_else(|e| panic!("decode `{text}` as {ty}: {e}"));
    assert_eq!(T::from_value(decoded).unwrap(), value, "via `{text}`");
}

ai_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Shade {
        Light,
        Dark,
        HighContrast,
    }
}

ai_object! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct Entry {
        pub label: String,
        pub score: Option<f64>,
        pub due: NaiveDate,
        pub flags: Vec<bool>,
        pub shade: Shade,
    }
}

#[derive(Debug)]
struct HexRule;

impl TranscodingRule for HexRule {
    fn type_name(&self) -> &str {
        "Hex"
    }

    fn describe(&self) -> String {
        "a hexadecimal number prefixed with 0x".to_string()
    }

    fn encode(&self, value: &Value) -> Result<String, String> {
        match value {
            Value::UInt(n) => Ok(format!("{n:#x}")),
            other => Err(format!("expected an unsigned integer, got {}", other.kind_name())),
        }
    }

    fn decode(&self, text: &str) -> Result<Value, DecodeError> {
        let start = text
            .find("0x")
            .ok_or_else(|| DecodeError::no_match("Hex", text))?;
        let digits: String = text[start + 2..]
            .chars()
            .take_while(char::is_ascii_hexdigit)
            .collect();
        u64::from_str_radix(&digits, 16)
            .map(Value::UInt)
            .map_err(|e| DecodeError::type_mismatch("Hex", e.to_string()))
    }
}

/// Every date from 0000-01-01 through 9999-12-31.
fn any_date() -> impl Strategy<Value = NaiveDate> {
    (-365i32..=3_652_059).prop_map(|days| {
        NaiveDate::from_num_days_from_ce_opt(days).expect("day within the four digit years")
    })
}

fn any_time() -> impl Strategy<Value = NaiveTime> {
    (0u32..86_400, 0u32..1_000_000_000).prop_map(|(secs, nanos)| {
        NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos).expect("time of day")
    })
}

fn any_date_time() -> impl Strategy<Value = NaiveDateTime> {
    (any_date(), any_time()).prop_map(|(d, t)| d.and_time(t))
}

fn any_shade() -> impl Strategy<Value = Shade> {
    prop_oneof![Just(Shade::Light), Just(Shade::Dark), Just(Shade::HighContrast)]
}

fn any_entry() -> impl Strategy<Value = Entry> {
    (
        "[a-zA-Z0-9 ,=:{}\\[\\]\"-]{0,16}",
        prop::option::of(-1e9f64..1e9),
        any_date(),
        prop::collection::vec(any::<bool>(), 0..4),
        any_shade(),
    )
        .prop_map(|(label, score, due, flags, shade)| Entry {
            label,
            score,
            due,
            flags,
            shade,
        })
}

proptest! {
    #[test]
    fn integers_echo(a in any::<i64>(), b in any::<u16>(), c in any::<i8>()) {
        assert_echo(a);
        assert_echo(b);
        assert_echo(c);
    }

    #[test]
    fn floats_echo(
        wide in any::<f64>().prop_filter("NaN never equals itself", |f| !f.is_nan()),
        narrow in any::<f32>().prop_filter("NaN never equals itself", |f| !f.is_nan()),
    ) {
        assert_echo(wide);
        assert_echo(narrow);
    }

    #[test]
    fn bools_and_chars_echo(b in any::<bool>(), c in any::<char>()) {
        assert_echo(b);
        assert_echo(c);
    }

    #[test]
    fn strings_echo(s in "[a-zA-Z0-9 ,=:{}\\[\\]\"\\\\-]{0,24}") {
        assert_echo(s);
    }

    #[test]
    fn dates_and_times_echo(date in any_date(), time in any_time(), dt in any_date_time()) {
        assert_echo(date);
        assert_echo(time);
        assert_echo(dt);
    }

    #[test]
    fn timestamps_echo(dt in any_date_time()) {
        assert_echo::<DateTime<Utc>>(dt.and_utc());
    }

    #[test]
    fn durations_echo(secs in 0u64..=u32::MAX as u64, nanos in 0u32..1_000_000_000) {
        assert_echo(Duration::new(secs, nanos));
    }

    #[test]
    fn enums_echo(shade in any_shade()) {
        assert_echo(shade);
    }

    #[test]
    fn lists_echo(items in prop::collection::vec(any::<i32>(), 0..12)) {
        assert_echo(items);
    }

    #[test]
    fn sets_echo(items in prop::collection::btree_set(any::<i32>(), 0..12)) {
        assert_echo::<BTreeSet<i32>>(items);
    }

    #[test]
    fn optional_lists_echo(items in prop::collection::vec(prop::option::of(any::<u32>()), 0..8)) {
        assert_echo(items);
    }

    #[test]
    fn maps_echo(map in prop::collection::btree_map("[a-z][a-z ]{0,7}", any::<bool>(), 0..6)) {
        assert_echo::<BTreeMap<String, bool>>(map);
    }

    #[test]
    fn nested_string_lists_echo(
        rows in prop::collection::vec(prop::collection::vec("[a-z, \\]]{0,6}", 0..4), 0..4)
    ) {
        assert_echo(rows);
    }

    #[test]
    fn objects_echo(entries in prop::collection::vec(any_entry(), 0..4)) {
        assert_echo(entries);
    }

    #[test]
    fn custom_rules_echo(values in prop::collection::vec(any::<u64>(), 0..6)) {
        let transcoder = Transcoder::new().with_rule(HexRule);
        let hex = SemanticType::custom("Hex");
        for n in &values {
            let text = transcoder.encode(&hex, &Value::UInt(*n)).unwrap();
            prop_assert_eq!(transcoder.decode_result(&text, &hex).unwrap(), Value::UInt(*n));
        }

        let list = SemanticType::list(hex);
        let value = Value::List(values.into_iter().map(Value::UInt).collect());
        let text = transcoder.encode(&list, &value).unwrap();
        prop_assert_eq!(transcoder.decode_result(&text, &list).unwrap(), value);
    }

    #[test]
    fn years_beyond_four_digits_are_rejected(year in prop_oneof![-262_000i32..0, 10_000i32..262_000]) {
        let date = NaiveDate::from_ymd_opt(year, 6, 15).unwrap();
        let err = Transcoder::new()
            .encode_parameter("when", &SemanticType::Date, &Value::Date(date))
            .unwrap_err();
        prop_assert!(matches!(err, ProxyError::InvalidArgument { .. }), "{:?}", err);
    }
}
