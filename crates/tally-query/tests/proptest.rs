//! Property-based tests for the query language using proptest.

use proptest::prelude::*;
use serde_json::{json, Value as Json};
use tally_query::{evaluate_query, Matcher, Op, Query};

// ============================================================================
// Test helpers
// ============================================================================

fn record_strategy() -> impl Strategy<Value = Json> {
    (
        prop_oneof![Just("US"), Just("KE"), Just("UG"), Just("CA")],
        0i64..500,
        prop_oneof![Just("ios"), Just("android"), Just("web")],
    )
        .prop_map(|(country, count, platform)| {
            json!({"country": country, "events_count": count, "platform": platform})
        })
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Eq),
        Just(Op::Ne),
        Just(Op::Gt),
        Just(Op::Gte),
        Just(Op::Lt),
        Just(Op::Lte),
    ]
}

// ============================================================================
// Property tests
// ============================================================================

proptest! {
    /// Blank queries match every record.
    #[test]
    fn blank_query_matches_all(r in record_strategy(), ws in "[ \t]{0,5}") {
        prop_assert!(evaluate_query(&r, &ws));
    }

    /// Numeric conditions agree with direct integer comparison.
    #[test]
    fn numeric_condition_agrees_with_direct(
        r in record_strategy(),
        op in op_strategy(),
        threshold in 0i64..500,
    ) {
        let count = r["events_count"].as_i64().unwrap();
        let expected = match op {
            Op::Eq => count == threshold,
            Op::Ne => count != threshold,
            Op::Gt => count > threshold,
            Op::Gte => count >= threshold,
            Op::Lt => count < threshold,
            Op::Lte => count <= threshold,
        };
        let text = format!("events_count {} {}", op, threshold);
        prop_assert_eq!(evaluate_query(&r, &text), expected);
    }

    /// `a and b` is the conjunction, `a or b` the disjunction.
    #[test]
    fn two_term_chains(r in record_strategy(), threshold in 0i64..500) {
        let a = "country == 'US'";
        let b = format!("events_count > {}", threshold);
        let va = evaluate_query(&r, a);
        let vb = evaluate_query(&r, &b);
        prop_assert_eq!(evaluate_query(&r, &format!("{} and {}", a, b)), va && vb);
        prop_assert_eq!(evaluate_query(&r, &format!("{} or {}", a, b)), va || vb);
    }

    /// Three-term chains fold left to right.
    #[test]
    fn three_term_chains_fold_left(
        r in record_strategy(),
        t in 0i64..500,
        first_and in any::<bool>(),
        second_and in any::<bool>(),
    ) {
        let a = "platform == 'ios'";
        let b = "country != 'KE'";
        let c = format!("events_count <= {}", t);
        let (va, vb, vc) = (
            evaluate_query(&r, a),
            evaluate_query(&r, b),
            evaluate_query(&r, &c),
        );
        let l1 = if first_and { "and" } else { "or" };
        let l2 = if second_and { "and" } else { "or" };
        let ab = if first_and { va && vb } else { va || vb };
        let expected = if second_and { ab && vc } else { ab || vc };
        let text = format!("{} {} {} {} {}", a, l1, b, l2, c);
        prop_assert_eq!(evaluate_query(&r, &text), expected);
    }

    /// A compiled matcher agrees with one-shot evaluation.
    #[test]
    fn matcher_agrees_with_evaluate(r in record_strategy(), text in "[a-z_ =<>!'0-9]{0,30}") {
        prop_assert_eq!(Matcher::compile(&text).matches(&r), evaluate_query(&r, &text));
    }

    /// Rendering a built query and parsing it back gives the same query.
    #[test]
    fn display_round_trip(threshold in 0i64..10_000, country in "[A-Z]{2}") {
        let q = Query::new()
            .and("country", Op::Eq, country.as_str())
            .or("events_count", Op::Gt, threshold);
        let parsed = Query::parse(&q.to_string()).unwrap();
        prop_assert_eq!(parsed, q);
    }

    /// Filtering never grows the collection.
    #[test]
    fn filter_never_grows(rows in prop::collection::vec(record_strategy(), 0..40), t in 0i64..500) {
        let q = Query::parse(&format!("events_count >= {}", t)).unwrap();
        let hits = q.filter(&rows);
        prop_assert!(hits.len() <= rows.len());
        prop_assert_eq!(hits.len(), q.count(&rows));
    }
}
