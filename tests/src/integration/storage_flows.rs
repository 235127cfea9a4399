//! # Storage Flows
//!
//! Key-value state across separate calls, rollback on trap, usage
//! accounting and view restrictions.

#[cfg(test)]
mod tests {
    use crate::fixtures::{call_from_alice, funded_host, kv_store, KV_ACCOUNT};
    use contract_runtime::prelude::*;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn deployed() -> (InMemoryHost, PromiseScheduler) {
        let host = funded_host(&[KV_ACCOUNT]);
        let mut scheduler = PromiseScheduler::new(&host);
        scheduler.deploy(KV_ACCOUNT, kv_store());
        (host, scheduler)
    }

    fn call(
        host: &mut InMemoryHost,
        scheduler: &mut PromiseScheduler,
        method: &str,
        input: &str,
    ) -> CallReport {
        let context = call_from_alice(KV_ACCOUNT).with_input(input.as_bytes().to_vec());
        scheduler.call(host, context, method)
    }

    fn text(report: &CallReport) -> String {
        match &report.outcome {
            PromiseOutcome::Successful(bytes) => String::from_utf8_lossy(bytes).into_owned(),
            other => panic!("call did not succeed: {other:?}"),
        }
    }

    // =============================================================================
    // PERSISTENCE
    // =============================================================================

    #[test]
    fn test_values_survive_across_calls() {
        let (mut host, mut scheduler) = deployed();

        call(&mut host, &mut scheduler, "set", "color=blue");
        let report = call(&mut host, &mut scheduler, "get", "color");

        assert_eq!(text(&report), "blue");
        assert_eq!(scheduler.stats().commits, 2);
    }

    #[test]
    fn test_overwrite_returns_previous_value() {
        let (mut host, mut scheduler) = deployed();

        let first = call(&mut host, &mut scheduler, "set", "color=blue");
        assert_eq!(text(&first), "");
        assert!(first.all_logs().is_empty());

        let second = call(&mut host, &mut scheduler, "set", "color=green");
        assert_eq!(text(&second), "blue");
        assert_eq!(second.all_logs(), vec!["replaced blue".to_string()]);
    }

    #[test]
    fn test_remove_then_get_is_empty() {
        let (mut host, mut scheduler) = deployed();

        call(&mut host, &mut scheduler, "set", "color=blue");
        call(&mut host, &mut scheduler, "remove", "color");
        let report = call(&mut host, &mut scheduler, "get", "color");

        assert_eq!(text(&report), "");
        assert_eq!(host.storage_value(&KV_ACCOUNT.into(), b"color"), None);
    }

    #[test]
    fn test_trapped_call_leaves_storage_untouched() {
        let (mut host, mut scheduler) = deployed();

        call(&mut host, &mut scheduler, "set", "color=blue");
        let failed = call(&mut host, &mut scheduler, "set_then_fail", "color=red");

        assert_eq!(failed.outcome, PromiseOutcome::Failed);
        assert_eq!(
            failed.entry.trap(),
            Some(&Trap::Panic("changed my mind".to_string()))
        );
        assert_eq!(
            host.storage_value(&KV_ACCOUNT.into(), b"color"),
            Some(&b"blue"[..])
        );
        assert_eq!(scheduler.stats().contract_panics, 1);
    }

    #[test]
    fn test_malformed_input_panics() {
        let (mut host, mut scheduler) = deployed();
        let report = call(&mut host, &mut scheduler, "set", "no separator");
        assert!(report.entry.trap().is_some_and(Trap::is_contract_panic));
    }

    // =============================================================================
    // ACCOUNTING & VIEW CALLS
    // =============================================================================

    #[test]
    fn test_storage_usage_counts_record_overhead() {
        let (mut host, mut scheduler) = deployed();
        let overhead = host.config().storage_record_overhead;

        call(&mut host, &mut scheduler, "set", "ab=cde");
        call(&mut host, &mut scheduler, "set", "f=g");
        let report = call(&mut host, &mut scheduler, "usage", "");

        assert_eq!(text(&report), (5 + 2 + 2 * overhead).to_string());
        assert_eq!(
            report.entry.effects().map(|e| e.storage_usage),
            Some(7 + 2 * overhead)
        );
    }

    #[test]
    fn test_view_call_reads_but_cannot_write() {
        let (mut host, mut scheduler) = deployed();
        call(&mut host, &mut scheduler, "set", "color=blue");

        let read = scheduler.call(
            &mut host,
            call_from_alice(KV_ACCOUNT).with_input(b"color".to_vec()).view(),
            "get",
        );
        assert_eq!(text(&read), "blue");

        let write = scheduler.call(
            &mut host,
            call_from_alice(KV_ACCOUNT)
                .with_input(b"color=red".to_vec())
                .view(),
            "set",
        );
        assert_eq!(
            write.entry.trap(),
            Some(&Trap::ProhibitedInView {
                call: "storage_write"
            })
        );
        assert_eq!(
            host.storage_value(&KV_ACCOUNT.into(), b"color"),
            Some(&b"blue"[..])
        );
    }

    // =============================================================================
    // PROPERTIES
    // =============================================================================

    #[derive(Debug, Clone)]
    enum Op {
        Write(u8, Vec<u8>),
        Remove(u8),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..6, proptest::collection::vec(any::<u8>(), 0..16))
                .prop_map(|(k, v)| Op::Write(k, v)),
            (0u8..6).prop_map(Op::Remove),
        ]
    }

    proptest! {
        #[test]
        fn test_storage_matches_model(ops in proptest::collection::vec(op(), 1..40)) {
            let mut host = funded_host(&[KV_ACCOUNT]);
            let mut runner = InvocationRunner::new();
            let mut model: BTreeMap<Vec<u8>, Vec<u8>> = BTreeMap::new();

            for op in &ops {
                let expected_evicted = match op {
                    Op::Write(k, v) => model.insert(vec![*k], v.clone()),
                    Op::Remove(k) => model.remove(&vec![*k]),
                };
                let op = op.clone();
                let outcome = runner.invoke(&mut host, call_from_alice(KV_ACCOUNT), "op", move |env| {
                    let evicted = match &op {
                        Op::Write(k, v) => env.storage_write_raw(&[*k], v)?,
                        Op::Remove(k) => env.storage_remove_raw(&[*k])?,
                    };
                    let fetched = env.storage_get_evicted_raw()?;
                    env.require(evicted == fetched.is_some(), "eviction flag mismatch")?;
                    env.value_return_raw(&fetched.unwrap_or_default())
                });
                let returned = outcome.effects().map(|e| e.return_data.clone());
                prop_assert_eq!(
                    returned,
                    Some(ReturnData::Value(expected_evicted.unwrap_or_default()))
                );
            }

            for key in 0u8..6 {
                prop_assert_eq!(
                    host.storage_value(&KV_ACCOUNT.into(), &[key]),
                    model.get(&vec![key]).map(Vec::as_slice)
                );
            }
        }
    }
}
