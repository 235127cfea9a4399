//! # Promise Flows
//!
//! Cross-contract calls end to end:
//!
//! 1. **Callbacks**: a `then` receipt sees the result of the call it follows
//! 2. **Value movement**: transfers, deposit reservation, staking
//! 3. **Account lifecycle**: create, add keys, delete keys, delete account
//! 4. **Gas**: unused gas handed to weighted calls

#[cfg(test)]
mod tests {
    use crate::fixtures::{
        call_from_alice, echo, funded_host, kv_store, relay, INITIAL_BALANCE, KV_ACCOUNT,
    };
    use contract_runtime::adapters::AccessKey;
    use contract_runtime::prelude::*;

    fn key(byte: u8) -> PublicKey {
        PublicKey::new(CurveType::Ed25519, vec![byte; 32]).unwrap()
    }

    fn text(outcome: &PromiseOutcome) -> String {
        match outcome {
            PromiseOutcome::Successful(bytes) => String::from_utf8_lossy(bytes).into_owned(),
            other => panic!("not successful: {other:?}"),
        }
    }

    // =============================================================================
    // CALLBACKS
    // =============================================================================

    fn reader() -> MethodTable<InMemoryHost> {
        MethodTable::new("reader")
            .method("read_remote", |env| {
                let key = env.input_raw()?;
                let gas = Gas::from_tgas(20);
                let p = env.promise_create(&KV_ACCOUNT.into(), "get", &key, Amount::ZERO, gas)?;
                let q = env.promise_then(p, &"reader.test".into(), "on_read", b"", Amount::ZERO, gas)?;
                env.promise_return(q)
            })
            .method("on_read", |env| {
                let count = env.promise_results_count()?;
                env.require(count == 1, "expected one result")?;
                let caller = env.predecessor_account_id()?;
                env.log_str(&format!("called back by {caller}"))?;
                let value = env.promise_result_text(0)?;
                env.value_return(&format!("got {value}"))
            })
    }

    #[test]
    fn test_callback_reads_remote_value() {
        let mut host = funded_host(&[KV_ACCOUNT, "reader.test"]);
        let mut scheduler = PromiseScheduler::new(&host);
        scheduler.deploy(KV_ACCOUNT, kv_store());
        scheduler.deploy("reader.test", reader());

        scheduler.call(
            &mut host,
            call_from_alice(KV_ACCOUNT).with_input(b"color=blue".to_vec()),
            "set",
        );
        let report = scheduler.call(
            &mut host,
            call_from_alice("reader.test").with_input(b"color".to_vec()),
            "read_remote",
        );

        assert_eq!(text(&report.outcome), "got blue");
        let on_read = report.receipt_calling("on_read").unwrap();
        assert_eq!(on_read.wave, 1);
        assert_eq!(on_read.observed, vec![PromiseOutcome::Successful(b"blue".to_vec())]);
        assert_eq!(on_read.logs, vec!["called back by reader.test".to_string()]);
    }

    #[test]
    fn test_callback_on_failed_call_can_inspect_status() {
        let mut host = funded_host(&[KV_ACCOUNT, "reader.test"]);
        let mut scheduler = PromiseScheduler::new(&host);
        scheduler.deploy(KV_ACCOUNT, kv_store());
        scheduler.deploy(
            "reader.test",
            MethodTable::new("reader")
                .method("start", |env| {
                    let gas = Gas::from_tgas(20);
                    let ok = env.promise_create(&KV_ACCOUNT.into(), "get", b"x", Amount::ZERO, gas)?;
                    let bad = env.promise_create(&KV_ACCOUNT.into(), "set", b"broken", Amount::ZERO, gas)?;
                    let both = env.promise_and(&[ok, bad])?;
                    let done = env.promise_then(both, &"reader.test".into(), "settle", b"", Amount::ZERO, gas)?;
                    env.promise_return(done)
                })
                .method("settle", |env| {
                    let first = env.promise_result(0)?.status();
                    let second = env.promise_result(1)?.status();
                    env.value_return(&format!("{first:?}/{second:?}"))
                }),
        );

        let report = scheduler.call(&mut host, call_from_alice("reader.test"), "start");

        assert_eq!(text(&report.outcome), "Successful/Failed");
        let failed_set = report.receipt_calling("set").unwrap();
        assert!(matches!(
            failed_set.failure,
            Some(ActionError::FunctionCallFailed(Trap::Panic(_)))
        ));
    }

    #[test]
    fn test_returned_promise_becomes_call_value() {
        let mut host = funded_host(&["relay.test", "echo.test"]);
        let mut scheduler = PromiseScheduler::new(&host);
        scheduler.deploy("relay.test", relay("echo.test"));
        scheduler.deploy("echo.test", echo("> "));

        let report = scheduler.call(
            &mut host,
            call_from_alice("relay.test").with_input(b"hi".to_vec()),
            "relay",
        );

        assert_eq!(text(&report.outcome), "> hi");
        assert_eq!(report.receipts.len(), 1);
        assert_eq!(
            report.entry.effects().map(|e| e.return_data.clone()),
            Some(ReturnData::Promise(PromiseIndex::from_raw(0)))
        );

        let graph = &report.entry.effects().unwrap().promises;
        let json: serde_json::Value = serde_json::from_str(&graph.to_json().unwrap()).unwrap();
        assert_eq!(json["promises"][0]["kind"]["receiver_id"], "echo.test");
        assert_eq!(json["promises"][0]["kind"]["actions"][0]["kind"], "function_call");
        assert_eq!(json["promises"][0]["kind"]["actions"][0]["method_name"], "echo");
    }

    #[test]
    fn test_call_to_account_without_contract_fails_receipt() {
        let mut host = funded_host(&["relay.test", "empty.test"]);
        let mut scheduler = PromiseScheduler::new(&host);
        scheduler.deploy("relay.test", relay("empty.test"));

        let report = scheduler.call(&mut host, call_from_alice("relay.test"), "relay");

        assert_eq!(report.outcome, PromiseOutcome::Failed);
        assert_eq!(
            report.receipts[0].failure,
            Some(ActionError::NoContractCode("empty.test".to_string()))
        );
    }

    // =============================================================================
    // VALUE MOVEMENT
    // =============================================================================

    fn bank() -> MethodTable<InMemoryHost> {
        MethodTable::new("bank")
            .method("pay", |env| {
                let amount: u128 = env
                    .input()?
                    .parse()
                    .map_err(|_| Trap::InvalidValue("amount".to_string()))?;
                let idx = env.promise_batch_create(&"alice.test".into())?;
                env.batch(idx).transfer(Amount::new(amount))?;
                let left = env.account_balance()?;
                env.value_return(&left.to_string())
            })
            .method("stake", |env| {
                let idx = env.promise_batch_create(&"bank.test".into())?;
                env.batch(idx).stake(Amount::new(500), &key(9))?;
                Ok(())
            })
            .method("stake_of", |env| {
                let stake = env.validator_stake(&"bank.test".into())?;
                let total = env.validator_total_stake()?;
                env.value_return(&format!("{stake}/{total}"))
            })
    }

    #[test]
    fn test_transfer_moves_balance() {
        let mut host = funded_host(&["bank.test", "alice.test"]);
        let mut scheduler = PromiseScheduler::new(&host);
        scheduler.deploy("bank.test", bank());

        let report = scheduler.call(
            &mut host,
            call_from_alice("bank.test").with_input(b"250".to_vec()),
            "pay",
        );

        assert_eq!(text(&report.outcome), (INITIAL_BALANCE - 250).to_string());
        assert_eq!(
            host.world().balance(&"alice.test".into()),
            Amount::new(INITIAL_BALANCE + 250)
        );
        assert_eq!(
            host.world().balance(&"bank.test".into()),
            Amount::new(INITIAL_BALANCE - 250)
        );
    }

    #[test]
    fn test_attached_deposit_is_credited_before_the_call() {
        let mut host = funded_host(&["bank.test", "alice.test"]);
        let mut scheduler = PromiseScheduler::new(&host);
        scheduler.deploy("bank.test", bank());

        let report = scheduler.call(
            &mut host,
            call_from_alice("bank.test")
                .with_deposit(Amount::new(INITIAL_BALANCE))
                .with_input((INITIAL_BALANCE * 2).to_string().into_bytes()),
            "pay",
        );

        assert_eq!(text(&report.outcome), "0");
        assert_eq!(host.world().balance(&"bank.test".into()), Amount::ZERO);
    }

    #[test]
    fn test_overspending_traps() {
        let mut host = funded_host(&["bank.test", "alice.test"]);
        let mut scheduler = PromiseScheduler::new(&host);
        scheduler.deploy("bank.test", bank());

        let report = scheduler.call(
            &mut host,
            call_from_alice("bank.test").with_input((INITIAL_BALANCE + 1).to_string().into_bytes()),
            "pay",
        );

        assert_eq!(
            report.entry.trap(),
            Some(&Trap::BalanceExceeded {
                needed: INITIAL_BALANCE + 1,
                available: INITIAL_BALANCE
            })
        );
        assert!(report.receipts.is_empty());
        assert_eq!(
            host.world().balance(&"alice.test".into()),
            Amount::new(INITIAL_BALANCE)
        );
    }

    #[test]
    fn test_stake_locks_balance_and_registers_validator() {
        let mut host = funded_host(&["bank.test"]);
        let mut scheduler = PromiseScheduler::new(&host);
        scheduler.deploy("bank.test", bank());

        scheduler.call(&mut host, call_from_alice("bank.test"), "stake");

        let account = host.world().account(&"bank.test".into()).unwrap();
        assert_eq!(account.locked, Amount::new(500));
        assert_eq!(account.balance, Amount::new(INITIAL_BALANCE - 500));

        let report = scheduler.call(&mut host, call_from_alice("bank.test").view(), "stake_of");
        assert_eq!(text(&report.outcome), "500/500");
    }

    // =============================================================================
    // ACCOUNT LIFECYCLE
    // =============================================================================

    fn factory() -> MethodTable<InMemoryHost> {
        MethodTable::new("factory")
            .method("open", |env| {
                let idx = env.promise_batch_create(&"sub.factory.test".into())?;
                env.batch(idx)
                    .create_account()?
                    .transfer(Amount::new(300))?
                    .add_full_access_key(&key(1), 0)?
                    .add_function_call_key(
                        &key(2),
                        1,
                        Some(Amount::new(50)),
                        &KV_ACCOUNT.into(),
                        &["get", "set"],
                    )?;
                Ok(())
            })
            .method("rotate", |env| {
                let idx = env.promise_batch_create(&"sub.factory.test".into())?;
                env.batch(idx).delete_key(&key(1))?;
                Ok(())
            })
            .method("close", |env| {
                let idx = env.promise_batch_create(&"sub.factory.test".into())?;
                env.batch(idx).delete_account(&"factory.test".into())?;
                Ok(())
            })
    }

    #[test]
    fn test_account_lifecycle() {
        let mut host = funded_host(&["factory.test"]);
        let mut scheduler = PromiseScheduler::new(&host);
        scheduler.deploy("factory.test", factory());
        let sub = AccountId::from("sub.factory.test");

        let opened = scheduler.call(&mut host, call_from_alice("factory.test"), "open");
        assert_eq!(opened.receipts[0].failure, None);
        let account = host.world().account(&sub).unwrap();
        assert_eq!(account.balance, Amount::new(300));
        assert_eq!(account.access_keys.get(&key(1)), Some(&AccessKey::FullAccess { nonce: 0 }));
        assert_eq!(
            account.access_keys.get(&key(2)),
            Some(&AccessKey::FunctionCall {
                nonce: 1,
                allowance: Some(Amount::new(50)),
                receiver_id: KV_ACCOUNT.into(),
                method_names: vec!["get".to_string(), "set".to_string()],
            })
        );

        scheduler.call(&mut host, call_from_alice("factory.test"), "rotate");
        let account = host.world().account(&sub).unwrap();
        assert!(!account.access_keys.contains_key(&key(1)));
        assert_eq!(account.access_keys.len(), 1);

        // Opening again fails: the account exists, and nothing is half-applied
        let reopened = scheduler.call(&mut host, call_from_alice("factory.test"), "open");
        assert_eq!(
            reopened.receipts[0].failure,
            Some(ActionError::AccountAlreadyExists(sub.to_string()))
        );
        assert_eq!(host.world().balance(&sub), Amount::new(300));
        assert_eq!(
            host.world().balance(&"factory.test".into()),
            Amount::new(INITIAL_BALANCE - 300)
        );

        scheduler.call(&mut host, call_from_alice("factory.test"), "close");
        assert!(!host.world().contains(&sub));
        assert_eq!(
            host.world().balance(&"factory.test".into()),
            Amount::new(INITIAL_BALANCE)
        );
    }

    // =============================================================================
    // GAS
    // =============================================================================

    #[test]
    fn test_unused_gas_goes_to_weighted_call() {
        let mut host = funded_host(&["spawner.test", "worker.test"]);
        let mut scheduler = PromiseScheduler::new(&host);
        scheduler.deploy(
            "spawner.test",
            MethodTable::new("spawner").method("spawn", |env| {
                let idx = env.promise_batch_create(&"worker.test".into())?;
                env.batch(idx).function_call_weight(
                    "work",
                    b"",
                    Amount::ZERO,
                    Gas::from_tgas(5),
                    GasWeight(1),
                )?;
                Ok(())
            }),
        );
        scheduler.deploy(
            "worker.test",
            MethodTable::new("worker").method("work", |env| {
                let prepaid = env.prepaid_gas()?;
                env.value_return(&prepaid.as_u64().to_string())
            }),
        );

        let report = scheduler.call(&mut host, call_from_alice("spawner.test"), "spawn");

        assert_eq!(report.entry.gas_used(), Gas::from_tgas(300));
        let work = report.receipt_calling("work").unwrap();
        let worker_prepaid: u64 = text(&work.outcome).parse().unwrap();
        assert!(worker_prepaid > Gas::from_tgas(5).as_u64());
        assert!(worker_prepaid < Gas::from_tgas(300).as_u64());
    }
}
