//! # Signing and Broadcast Flows
//!
//! `ConnectKit` as the `SigningApi`: connector signatures, gas, chain
//! responses and the metrics recorded around each call.

#[cfg(test)]
mod tests {
    use ck_04_signing_pipeline::{PipelineError, SignAndBroadcast, SigningApi};
    use connect_telemetry::{BROADCASTS, SEQUENCE_FALLBACKS};
    use shared_crypto::{derive_address, new_user_salt, TxTypedData};
    use shared_types::{AccountType, Addr, ChainId, Hash256, Signature, Username};

    use crate::integration::fixtures::{transfer, Fixture, FACTORY, MARGIN, SPOT};

    #[tokio::test]
    async fn test_wallet_signs_typed_data_over_sign_bytes() {
        let fixture = Fixture::new();
        let test = fixture.kit(None);
        test.connect(&test.wallet_uid, "dev-1").await;

        let outcome = test
            .kit
            .sign_and_broadcast(SignAndBroadcast::new(transfer(10)))
            .await
            .unwrap();

        let Signature::Eip712(eip712) = &outcome.tx.credential.signature else {
            panic!("expected an EIP-712 credential");
        };
        let typed: TxTypedData = serde_json::from_slice(&eip712.typed_data.0).unwrap();
        assert_eq!(typed.message.sign_bytes, format!("0x{}", hex::encode(outcome.sign_bytes.as_bytes())));
        assert_eq!(typed.message.sequence, 4);
        assert_eq!(typed.message.sender, SPOT);

        assert_eq!(outcome.tx.credential.key_hash, fixture.wallet.key_hash());
        assert_eq!(outcome.tx.data.key_hash, fixture.wallet.key_hash());
        assert_eq!(outcome.tx.data.username, Username::new("alice"));
        assert_eq!(fixture.dev1.broadcasts(), vec![outcome.tx.clone()]);
    }

    #[tokio::test]
    async fn test_passkey_gas_from_simulation() {
        let fixture = Fixture::new();
        let test = fixture.kit(None);
        test.connect(&test.passkey_uid, "dev-1").await;
        fixture.dev1.state.lock().simulate_gas_used = 200_000;

        let outcome = test
            .kit
            .sign_and_broadcast(SignAndBroadcast::new(transfer(10)))
            .await
            .unwrap();

        assert!(matches!(outcome.tx.credential.signature, Signature::Passkey(_)));
        // round((200_000 + 750_000) * 1.3)
        assert_eq!(outcome.tx.gas_limit, 1_235_000);
        assert_eq!(
            test.kit
                .estimate_gas(&ChainId::new("dev-1"), SPOT, transfer(10))
                .await
                .unwrap(),
            1_235_000
        );
    }

    #[tokio::test]
    async fn test_active_account_is_the_sender() {
        let fixture = Fixture::new();
        let test = fixture.kit(None);
        test.connect(&test.passkey_uid, "dev-1").await;
        test.kit.store().switch_account(&test.passkey_uid, &MARGIN).unwrap();

        let outcome = test
            .kit
            .sign_and_broadcast(SignAndBroadcast::new(transfer(1)).with_gas_limit(50_000))
            .await
            .unwrap();

        assert_eq!(outcome.tx.sender, MARGIN);
        assert_eq!(outcome.tx.gas_limit, 50_000);
        // MARGIN has never sent anything.
        assert_eq!(outcome.tx.data.sequence, 0);
        assert!(outcome.sequence_fallback);
    }

    #[tokio::test]
    async fn test_sequence_fallback_is_counted() {
        let fixture = Fixture::new();
        let test = fixture.kit(None);
        test.connect(&test.passkey_uid, "dev-1").await;
        fixture.dev1.state.lock().fail_sequence = true;
        let before = SEQUENCE_FALLBACKS.get();

        let outcome = test
            .kit
            .sign_and_broadcast(SignAndBroadcast::new(transfer(1)))
            .await
            .unwrap();

        assert_eq!(outcome.tx.data.sequence, 0);
        assert!(SEQUENCE_FALLBACKS.get() >= before + 1.0);
    }

    #[tokio::test]
    async fn test_rejected_broadcast_surfaces_node_log() {
        let fixture = Fixture::new();
        let test = fixture.kit(None);
        test.connect(&test.passkey_uid, "dev-1").await;
        fixture.dev1.set_broadcast_result(5, "bank", "insufficient funds");
        let rejected = BROADCASTS.with_label_values(&["rejected"]);
        let before = rejected.get();

        let err = test
            .kit
            .sign_and_broadcast(SignAndBroadcast::new(transfer(1_000_000)))
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "failed to broadcast tx! codespace: bank, code: 5, log: insufficient funds"
        );
        assert!(rejected.get() >= before + 1.0);
    }

    #[tokio::test]
    async fn test_unproven_connection_cannot_sign() {
        let fixture = Fixture::new();
        let test = fixture.kit(None);
        test.kit
            .store()
            .connect(
                &test.wallet_uid,
                ck_02_connectors::ConnectParameters::new("alice", "dev-1"),
            )
            .await
            .unwrap();
        let calls_before = fixture.dev1.calls().len();

        let err = test
            .kit
            .sign_and_broadcast(SignAndBroadcast::new(transfer(1)))
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::NotAuthorized));
        assert_eq!(fixture.dev1.calls().len(), calls_before);
    }

    #[test]
    fn test_predicted_address_matches_derivation() {
        let fixture = Fixture::new();
        let test = fixture.kit(None);
        let key_hash = fixture.authenticator.key_hash();

        let predicted = test
            .kit
            .predict_account_address(&ChainId::new("dev-2"), &Username::new("bob"), &key_hash, AccountType::Spot)
            .unwrap();

        let salt = new_user_salt("bob", &key_hash, AccountType::Spot).unwrap();
        assert_eq!(predicted, derive_address(&FACTORY, &Hash256([0xc0; 32]), &salt));
        assert_ne!(predicted, Addr([0; 20]));
    }
}
