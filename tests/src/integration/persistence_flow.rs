//! # Persistence Flows
//!
//! Sessions written through to file storage, rehydrated by a fresh kit and
//! revalidated against the chain.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ck_01_chain_client::{ChainConfig, ClientCache, MockChain};
    use ck_03_config_store::{FileStorage, PersistedEnvelope, Storage, DEFAULT_STORAGE_KEY, SCHEMA_VERSION};
    use connect_runtime::cli::{execute, Command};
    use shared_types::{ChainId, ConnectionStatus};

    use crate::integration::fixtures::{Fixture, FACTORY, MARGIN};

    fn stored_envelope(dir: &std::path::Path, key: &str) -> PersistedEnvelope {
        let raw = FileStorage::new(dir).unwrap().get_item(key).unwrap().unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    #[tokio::test]
    async fn test_session_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = Fixture::new();

        let key = {
            let test = fixture.kit(Some(dir.path()));
            test.kit.start().await.unwrap();
            test.connect(&test.wallet_uid, "dev-1").await;
            test.kit.store().switch_account(&test.wallet_uid, &MARGIN).unwrap();
            test.kit.shutdown().await;
            test.kit.config().store.storage_key.clone()
        };

        let envelope = stored_envelope(dir.path(), &key);
        assert_eq!(envelope.version, SCHEMA_VERSION);
        assert_eq!(envelope.state["status"], "connected");

        let test = fixture.kit(Some(dir.path()));
        assert_eq!(test.kit.store().status(), ConnectionStatus::Reconnecting);
        assert_eq!(test.kit.store().pending_sessions().len(), 1);

        let reconnected = test.kit.start().await.unwrap();
        assert_eq!(reconnected, vec![test.wallet_uid.clone()]);
        assert_eq!(test.kit.store().status(), ConnectionStatus::Connected);

        let connection = test.kit.store().connection(&test.wallet_uid).unwrap();
        assert_eq!(connection.key_hash, Some(fixture.wallet.key_hash()));
        assert_eq!(connection.account().unwrap().address, MARGIN);
        test.kit.shutdown().await;
    }

    #[tokio::test]
    async fn test_revoked_key_drops_session() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = Fixture::new();

        {
            let test = fixture.kit(Some(dir.path()));
            test.connect(&test.passkey_uid, "dev-1").await;
        }

        // Same chains, but alice's keys are gone.
        let clients = ClientCache::new()
            .with_chain(
                ChainConfig::for_testing("dev-1"),
                Arc::new(MockChain::new("dev-1", FACTORY)),
            )
            .with_chain(
                ChainConfig::for_testing("dev-2"),
                Arc::new(MockChain::new("dev-2", FACTORY)),
            );
        let test = fixture.kit_with_clients(Some(dir.path()), clients);
        assert_eq!(test.kit.store().status(), ConnectionStatus::Reconnecting);

        let reconnected = test.kit.start().await.unwrap();
        assert!(reconnected.is_empty());
        assert_eq!(test.kit.store().status(), ConnectionStatus::Disconnected);
        assert!(test.kit.store().state().connections.is_empty());
        test.kit.shutdown().await;
    }

    #[tokio::test]
    async fn test_chain_id_survives_without_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = Fixture::new();

        {
            let test = fixture.kit(Some(dir.path()));
            test.kit.store().set_chain_id(ChainId::new("dev-2")).unwrap();
        }

        let test = fixture.kit(Some(dir.path()));
        assert_eq!(test.kit.store().chain_id(), ChainId::new("dev-2"));
        assert_eq!(test.kit.store().status(), ConnectionStatus::Disconnected);
    }

    #[tokio::test]
    async fn test_inspect_store_reads_kit_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = Fixture::new();
        let test = fixture.kit(Some(dir.path()));
        test.connect(&test.passkey_uid, "dev-1").await;

        let key = test.kit.config().store.storage_key.clone();
        let out = execute(Command::InspectStore {
            dir: dir.path().to_path_buf(),
            key,
        })
        .await
        .unwrap();
        assert!(out.contains("\"status\": \"connected\""));
        assert!(out.contains("\"version\": 1"));

        let missing = execute(Command::InspectStore {
            dir: dir.path().to_path_buf(),
            key: DEFAULT_STORAGE_KEY.to_string(),
        })
        .await
        .unwrap();
        assert!(missing.starts_with("no persisted state"));
    }
}
