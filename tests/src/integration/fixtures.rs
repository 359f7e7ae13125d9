//! Shared fixtures: two mock chains, a browser wallet and a passkey, all
//! registered for the user `alice`.

use std::path::Path;
use std::sync::Arc;

use ck_01_chain_client::{ChainConfig, ClientCache, Key, MockChain};
use ck_02_connectors::{
    ConnectParameters, ConnectorSpec, Eip1193Provider, MockAuthenticator, MockEip1193Wallet, WebAuthnAuthenticator,
};
use connect_runtime::{ConnectKit, KitConfig};
use shared_types::{AccountType, Addr, Binary, Coins, Message, Uid};

pub const FACTORY: Addr = Addr([0xfa; 20]);
pub const SPOT: Addr = Addr([0x10; 20]);
pub const MARGIN: Addr = Addr([0x11; 20]);
pub const RECIPIENT: Addr = Addr([0x22; 20]);
pub const USERNAME: &str = "alice";

pub struct Fixture {
    pub dev1: Arc<MockChain>,
    pub dev2: Arc<MockChain>,
    pub wallet: Arc<MockEip1193Wallet>,
    pub authenticator: Arc<MockAuthenticator>,
}

impl Fixture {
    pub fn new() -> Self {
        let wallet = Arc::new(MockEip1193Wallet::new(&[7; 32]).expect("wallet key"));
        let authenticator =
            Arc::new(MockAuthenticator::new(&[9; 32], b"credential-1".to_vec()).expect("authenticator key"));
        let fixture = Self {
            dev1: Arc::new(MockChain::new("dev-1", FACTORY)),
            dev2: Arc::new(MockChain::new("dev-2", FACTORY)),
            wallet,
            authenticator,
        };
        fixture.register_user(&fixture.dev1);
        fixture.register_user(&fixture.dev2);
        fixture.dev1.set_sequence(SPOT, 4);
        fixture
    }

    /// Register alice's keys and accounts on `chain`.
    pub fn register_user(&self, chain: &MockChain) {
        chain.register_key(USERNAME, self.wallet.key_hash(), Key::Secp256k1(Binary(self.wallet.public_key())));
        chain.register_key(
            USERNAME,
            self.authenticator.key_hash(),
            Key::Secp256r1(Binary(self.authenticator.public_key())),
        );
        chain.register_account(USERNAME, SPOT, 0, AccountType::Spot);
        chain.register_account(USERNAME, MARGIN, 1, AccountType::Margin);
    }

    pub fn clients(&self) -> ClientCache {
        ClientCache::new()
            .with_chain(ChainConfig::for_testing("dev-1"), self.dev1.clone())
            .with_chain(ChainConfig::for_testing("dev-2"), self.dev2.clone())
    }

    pub fn config(&self, storage_dir: Option<&Path>) -> KitConfig {
        let mut config = KitConfig::for_testing(&["dev-1", "dev-2"]);
        config.storage.dir = storage_dir.map(Path::to_path_buf);
        config
    }

    /// A kit with the wallet and the passkey registered.
    pub fn kit(&self, storage_dir: Option<&Path>) -> TestKit {
        self.kit_with_clients(storage_dir, self.clients())
    }

    pub fn kit_with_clients(&self, storage_dir: Option<&Path>, clients: ClientCache) -> TestKit {
        let kit = ConnectKit::with_clients(self.config(storage_dir), clients).expect("kit");
        let wallet_uid = kit
            .setup_connector(ConnectorSpec::eip1193(
                "metamask",
                "MetaMask",
                Some(self.wallet.clone() as Arc<dyn Eip1193Provider>),
            ))
            .uid()
            .clone();
        let passkey_uid = kit
            .setup_connector(ConnectorSpec::passkey(
                self.authenticator.clone() as Arc<dyn WebAuthnAuthenticator>
            ))
            .uid()
            .clone();
        TestKit {
            kit,
            wallet_uid,
            passkey_uid,
        }
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

pub struct TestKit {
    pub kit: ConnectKit,
    pub wallet_uid: Uid,
    pub passkey_uid: Uid,
}

impl TestKit {
    /// Connect with a proving ceremony on `chain_id`.
    pub async fn connect(&self, uid: &Uid, chain_id: &str) {
        self.kit
            .store()
            .connect(uid, ConnectParameters::new(USERNAME, chain_id).with_challenge("prove"))
            .await
            .expect("connect");
    }
}

pub fn transfer(amount: u128) -> Vec<Message> {
    vec![Message::transfer(RECIPIENT, Coins::one("uusdc", amount))]
}
