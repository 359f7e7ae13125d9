//! # Connection Lifecycle Flows
//!
//! Connector ceremonies folded by the store inside a running kit.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ck_02_connectors::{
        ConnectParameters, ConnectorError, Eip1193Provider, Eip6963ProviderDetail, Eip6963ProviderInfo,
        WalletConnector,
    };
    use ck_03_config_store::StoreError;
    use ck_04_signing_pipeline::{PipelineError, SignAndBroadcast, SigningApi};
    use connect_telemetry::FOLDED_EVENTS;
    use parking_lot::Mutex;
    use shared_types::{ChainId, ConnectionStatus, Hash256};

    use crate::integration::fixtures::{transfer, Fixture, SPOT, USERNAME};

    #[tokio::test]
    async fn test_observers_see_connecting_then_connected() {
        let fixture = Fixture::new();
        let test = fixture.kit(None);
        let store = test.kit.store();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        store.subscribe(move |current, _previous| sink.lock().push(current.status));

        test.connect(&test.wallet_uid, "dev-1").await;

        let seen = seen.lock().clone();
        let connecting = seen.iter().position(|s| *s == ConnectionStatus::Connecting);
        let connected = seen.iter().position(|s| *s == ConnectionStatus::Connected);
        assert!(connecting.is_some());
        assert!(connecting < connected);
        assert_eq!(store.status(), ConnectionStatus::Connected);
    }

    #[tokio::test]
    async fn test_folded_events_are_counted() {
        let fixture = Fixture::new();
        let test = fixture.kit(None);
        let applied = FOLDED_EVENTS.with_label_values(&["connect", "applied"]);
        let before = applied.get();

        test.connect(&test.passkey_uid, "dev-1").await;

        assert!(applied.get() >= before + 1.0);
    }

    #[tokio::test]
    async fn test_failed_ceremony_keeps_store_disconnected() {
        let fixture = Fixture::new();
        let test = fixture.kit(None);
        let store = test.kit.store();

        let err = store
            .connect(
                &test.passkey_uid,
                ConnectParameters::new(USERNAME, "dev-1").with_key_hash(Hash256([3; 32])),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Connector(ConnectorError::NotAuthorized)));
        assert_eq!(store.status(), ConnectionStatus::Disconnected);
        assert!(store.state().connections.is_empty());
    }

    #[tokio::test]
    async fn test_one_connector_per_chain_signs_on_its_own_chain() {
        let fixture = Fixture::new();
        let test = fixture.kit(None);
        test.kit.start().await.unwrap();

        tokio::join!(
            test.connect(&test.wallet_uid, "dev-1"),
            test.connect(&test.passkey_uid, "dev-2"),
        );

        let state = test.kit.store().state();
        assert_eq!(state.connections.len(), 2);
        state.check_invariants().unwrap();

        test.kit
            .sign_and_broadcast(SignAndBroadcast::new(transfer(1)).with_uid(test.passkey_uid.clone()))
            .await
            .unwrap();
        assert_eq!(fixture.dev2.broadcasts().len(), 1);
        assert!(fixture.dev1.broadcasts().is_empty());

        test.kit.shutdown().await;
    }

    #[tokio::test]
    async fn test_switch_chain_then_sign_on_new_chain() {
        let fixture = Fixture::new();
        let test = fixture.kit(None);
        let store = test.kit.store();
        test.connect(&test.wallet_uid, "dev-1").await;

        let dev2 = ChainId::new("dev-2");
        store
            .connector(&test.wallet_uid)
            .unwrap()
            .switch_chain(&dev2)
            .await
            .unwrap();
        store.process_events();
        store.set_chain_id(dev2.clone()).unwrap();

        let outcome = test
            .kit
            .sign_and_broadcast(SignAndBroadcast::new(transfer(2)))
            .await
            .unwrap();
        assert_eq!(outcome.chain_id, dev2);
        assert_eq!(outcome.tx.sender, SPOT);
        assert_eq!(fixture.dev2.broadcasts().len(), 1);
    }

    #[tokio::test]
    async fn test_disconnect_ends_signing() {
        let fixture = Fixture::new();
        let test = fixture.kit(None);
        let store = test.kit.store();
        test.connect(&test.wallet_uid, "dev-1").await;

        store.disconnect(&test.wallet_uid).await.unwrap();
        assert_eq!(store.status(), ConnectionStatus::Disconnected);

        let err = test
            .kit
            .sign_and_broadcast(SignAndBroadcast::new(transfer(3)))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::NoConnectionForChain(_)));
    }

    #[tokio::test]
    async fn test_discovered_provider_connects() {
        let fixture = Fixture::new();
        let test = fixture.kit(None);
        let store = test.kit.store();

        let info = Eip6963ProviderInfo {
            uuid: "7f0e1c2a".to_string(),
            name: "Rabby".to_string(),
            icon: "data:image/svg+xml,".to_string(),
            rdns: "io.rabby".to_string(),
        };
        let connector = store
            .add_discovered_provider(Eip6963ProviderDetail::new(
                info,
                fixture.wallet.clone() as Arc<dyn Eip1193Provider>,
            ))
            .unwrap();

        test.connect(connector.uid(), "dev-1").await;
        assert!(connector.is_authorized());
        assert_eq!(
            store.connection_for_chain(&ChainId::new("dev-1")).unwrap().uid(),
            connector.uid()
        );
    }
}
