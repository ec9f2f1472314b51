use deposit_dapp::{BalanceSnapshot, DappConfigBuilder, DappError, DepositDapp, Outcome};
use serde_json::{Value, json};
use wiremock::matchers::{body_string_contains, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CONTRACT: &str = "0x5fbdb2315678afecb367f032d93f642f64180aa3";
const ACCOUNT: &str = "0xabcdabcdabcdabcdabcdabcdabcdabcdabcdabcd";
const TX_HASH: &str = "0x1111111111111111111111111111111111111111111111111111111111111111";
const SEPOLIA_HEX: &str = "0xaa36a7";

fn rpc_result(result: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "jsonrpc": "2.0",
        "result": result,
        "id": 1
    }))
}

fn rpc_error(code: i64, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "jsonrpc": "2.0",
        "error": { "code": code, "message": message },
        "id": 1
    }))
}

/// One ether as an ABI-encoded uint256.
fn one_ether_word() -> String {
    format!("0x{:0>64}", "de0b6b3a7640000")
}

/// Wallet account + chain id mocks.
async fn setup_wallet_mocks(mock_server: &MockServer, chain_hex: &str) {
    Mock::given(method("POST"))
        .and(body_string_contains("eth_requestAccounts"))
        .respond_with(rpc_result(json!([ACCOUNT])))
        .mount(mock_server)
        .await;

    Mock::given(method("POST"))
        .and(body_string_contains("eth_chainId"))
        .respond_with(rpc_result(json!(chain_hex)))
        .mount(mock_server)
        .await;
}

/// Contract balance 1.0 ETH, wallet balance 2.0 ETH.
async fn setup_balance_mocks(mock_server: &MockServer, expected_reads: u64) {
    Mock::given(method("POST"))
        .and(body_string_contains("eth_call"))
        .respond_with(rpc_result(json!(one_ether_word())))
        .expect(expected_reads)
        .mount(mock_server)
        .await;

    Mock::given(method("POST"))
        .and(body_string_contains("eth_getBalance"))
        .respond_with(rpc_result(json!("0x1bc16d674ec80000")))
        .expect(expected_reads)
        .mount(mock_server)
        .await;
}

async fn setup_receipt_mock(mock_server: &MockServer, status: &str) {
    Mock::given(method("POST"))
        .and(body_string_contains("eth_getTransactionReceipt"))
        .respond_with(rpc_result(json!({
            "transactionHash": TX_HASH,
            "blockNumber": "0x10",
            "status": status
        })))
        .mount(mock_server)
        .await;
}

fn dapp_for(mock_server: &MockServer) -> DepositDapp {
    let config = DappConfigBuilder::new()
        .with_rpc(mock_server.uri())
        .with_wallet(mock_server.uri())
        .contract_address(CONTRACT)
        .with_poll_interval_ms(20)
        .without_session_file()
        .build()
        .expect("Failed to build config");
    DepositDapp::from_config(config).expect("Failed to create dapp")
}

#[tokio::test]
async fn test_connect_reads_and_formats_balances() {
    let mock_server = MockServer::start().await;
    setup_wallet_mocks(&mock_server, SEPOLIA_HEX).await;
    setup_balance_mocks(&mock_server, 1).await;

    let dapp = dapp_for(&mock_server);
    let address = dapp.connect().await.unwrap();
    assert_eq!(address.to_string().to_lowercase(), ACCOUNT);

    let view = dapp.view().unwrap();
    assert!(view.is_connected());
    assert_eq!(view.contract_balance.as_deref(), Some("1"));
    assert_eq!(view.wallet_balance.as_deref(), Some("2.000000"));

    dapp.disconnect().await.unwrap();
    let view = dapp.view().unwrap();
    assert!(!view.is_connected());
    assert_eq!(view.contract_balance, None);
    assert_eq!(view.wallet_balance, None);
    assert_eq!(dapp.balances().unwrap(), BalanceSnapshot::default());
}

#[tokio::test]
async fn test_connect_rejects_wrong_chain() {
    let mock_server = MockServer::start().await;
    setup_wallet_mocks(&mock_server, "0x1").await;

    let dapp = dapp_for(&mock_server);
    let result = dapp.connect().await;

    assert!(matches!(
        result,
        Err(DappError::ChainMismatch {
            expected: 11_155_111,
            actual: 1
        })
    ));
    assert!(dapp.account().is_none());
}

#[tokio::test]
async fn test_deposit_confirms_and_refreshes_balances() {
    let mock_server = MockServer::start().await;
    setup_wallet_mocks(&mock_server, SEPOLIA_HEX).await;
    // One read on connect, one after confirmation.
    setup_balance_mocks(&mock_server, 2).await;
    setup_receipt_mock(&mock_server, "0x1").await;

    // 0.05 ETH attached as value, deposit() selector as data.
    Mock::given(method("POST"))
        .and(body_string_contains("eth_sendTransaction"))
        .and(body_string_contains("0xb1a2bc2ec50000"))
        .and(body_string_contains("0xd0e30db0"))
        .respond_with(rpc_result(json!(TX_HASH)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dapp = dapp_for(&mock_server);
    dapp.connect().await.unwrap();
    dapp.set_deposit_amount("0.05").unwrap();

    let resolution = dapp.deposit().await.unwrap();

    assert_eq!(resolution.outcome, Outcome::Confirmed { block_number: 16 });
    assert_eq!(resolution.handle.unwrap().to_string(), TX_HASH);
    assert_eq!(dapp.status().unwrap(), "Successfully deposited 0.05 ETH");

    let view = dapp.view().unwrap();
    assert_eq!(view.deposit_amount, "");
    assert!(view.active.is_none());
    assert!(view.can_owner_withdraw);
}

#[tokio::test]
async fn test_wallet_rejection_is_shown_verbatim() {
    let mock_server = MockServer::start().await;
    setup_wallet_mocks(&mock_server, SEPOLIA_HEX).await;
    setup_balance_mocks(&mock_server, 1).await;

    Mock::given(method("POST"))
        .and(body_string_contains("eth_sendTransaction"))
        .respond_with(rpc_error(-32000, "insufficient funds"))
        .mount(&mock_server)
        .await;

    let dapp = dapp_for(&mock_server);
    dapp.connect().await.unwrap();
    dapp.set_withdraw_amount("0.02").unwrap();

    let resolution = dapp.withdraw().await.unwrap();

    assert!(!resolution.is_success());
    assert_eq!(dapp.status().unwrap(), "insufficient funds");
    assert_eq!(dapp.view().unwrap().withdraw_amount, "0.02");
}

#[tokio::test]
async fn test_reverted_receipt_fails_action() {
    let mock_server = MockServer::start().await;
    setup_wallet_mocks(&mock_server, SEPOLIA_HEX).await;
    setup_balance_mocks(&mock_server, 1).await;
    setup_receipt_mock(&mock_server, "0x0").await;

    Mock::given(method("POST"))
        .and(body_string_contains("eth_sendTransaction"))
        .respond_with(rpc_result(json!(TX_HASH)))
        .mount(&mock_server)
        .await;

    let dapp = dapp_for(&mock_server);
    dapp.connect().await.unwrap();

    let resolution = dapp.owner_withdraw().await.unwrap();

    assert!(!resolution.is_success());
    assert!(!resolution.refresh_balances);
    let status = dapp.status().unwrap();
    assert!(status.contains("reverted in block 16"), "{status}");
}

#[tokio::test]
async fn test_stalled_receipt_times_out() {
    let mock_server = MockServer::start().await;
    setup_wallet_mocks(&mock_server, SEPOLIA_HEX).await;
    setup_balance_mocks(&mock_server, 1).await;

    Mock::given(method("POST"))
        .and(body_string_contains("eth_sendTransaction"))
        .respond_with(rpc_result(json!(TX_HASH)))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("eth_getTransactionReceipt"))
        .respond_with(rpc_result(Value::Null))
        .mount(&mock_server)
        .await;

    let config = DappConfigBuilder::new()
        .with_rpc(mock_server.uri())
        .with_wallet(mock_server.uri())
        .contract_address(CONTRACT)
        .with_poll_interval_ms(50)
        .with_confirmation_timeout(1)
        .without_session_file()
        .build()
        .unwrap();
    let dapp = DepositDapp::from_config(config).unwrap();
    dapp.connect().await.unwrap();
    dapp.set_deposit_amount("0.1").unwrap();

    let resolution = dapp.deposit().await.unwrap();

    assert!(!resolution.is_success());
    assert!(
        dapp.status()
            .unwrap()
            .starts_with("Timed out waiting for confirmation")
    );
    let view = dapp.view().unwrap();
    assert_eq!(view.deposit_amount, "0.1");
    assert!(view.active.is_none());
}

#[tokio::test]
async fn test_session_is_restored_from_file() {
    let mock_server = MockServer::start().await;
    setup_wallet_mocks(&mock_server, SEPOLIA_HEX).await;
    setup_balance_mocks(&mock_server, 2).await;

    let dir = tempfile::TempDir::new().unwrap();
    let session_file = dir.path().join("session.json");
    let config = DappConfigBuilder::new()
        .with_rpc(mock_server.uri())
        .with_wallet(mock_server.uri())
        .contract_address(CONTRACT)
        .with_session_file(&session_file)
        .build()
        .unwrap();

    let first = DepositDapp::from_config(config.clone()).unwrap();
    let address = first.connect().await.unwrap();
    assert!(session_file.exists());

    let second = DepositDapp::from_config(config).unwrap();
    assert_eq!(second.restore_session().await.unwrap(), Some(address));
    assert_eq!(second.view().unwrap().contract_balance.as_deref(), Some("1"));
}
