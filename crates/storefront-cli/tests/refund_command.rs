use std::fs;

use predicates::str::contains;
use tempfile::TempDir;

const TENANT: &str = "tenant-a";
const RETURN_ID: &str = "6f1c2b1e-0d3a-4c55-9a53-2f6b8f0e1a01";
const ORDER_ID: &str = "6f1c2b1e-0d3a-4c55-9a53-2f6b8f0e1a02";
const ORDER_ITEM_ID: &str = "6f1c2b1e-0d3a-4c55-9a53-2f6b8f0e1a03";
const PRODUCT_ID: &str = "6f1c2b1e-0d3a-4c55-9a53-2f6b8f0e1a04";
const CUSTOMER_ID: &str = "6f1c2b1e-0d3a-4c55-9a53-2f6b8f0e1a05";
const RETURN_ITEM_ID: &str = "6f1c2b1e-0d3a-4c55-9a53-2f6b8f0e1a06";

/// One return of two units of a product with five in stock.
fn create_fixture(status: &str) -> TempDir {
    let dir = TempDir::new().expect("create temp dir");

    let fixture = serde_json::json!({
        "returns": [{
            "id": RETURN_ID,
            "tenant_id": TENANT,
            "return_number": "RET-1001",
            "order_id": ORDER_ID,
            "customer_id": CUSTOMER_ID,
            "status": status,
            "refund_method": "original_payment"
        }],
        "return_items": [{
            "id": RETURN_ITEM_ID,
            "tenant_id": TENANT,
            "return_id": RETURN_ID,
            "order_item_id": ORDER_ITEM_ID,
            "quantity": 2
        }],
        "order_items": [{
            "id": ORDER_ITEM_ID,
            "tenant_id": TENANT,
            "order_id": ORDER_ID,
            "product_id": PRODUCT_ID,
            "quantity": 2
        }],
        "products": [{
            "id": PRODUCT_ID,
            "tenant_id": TENANT,
            "name": "Ceramic mug",
            "quantity": 5
        }]
    });
    fs::write(
        dir.path().join("seed.json"),
        serde_json::to_string_pretty(&fixture).expect("serialize fixture"),
    )
    .expect("write seed.json");

    dir
}

fn refund_cmd(dir: &TempDir, tenant: &str) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("storefront");
    cmd.env_remove("RUST_LOG")
        .arg("--fixture")
        .arg(dir.path().join("seed.json"))
        .arg("refund")
        .arg("--tenant")
        .arg(tenant)
        .arg("--return-id")
        .arg(RETURN_ID)
        .arg("--amount")
        .arg("12.50");
    cmd
}

mod success {
    use super::*;

    #[test]
    fn refund_prints_outcome_and_restocks() {
        let dir = create_fixture("received");

        refund_cmd(&dir, TENANT)
            .assert()
            .success()
            .stdout(contains("\"success\": true"))
            .stdout(contains("\"status\": \"refunded\""))
            .stdout(contains("\"refund_amount\": \"12.50\""))
            .stderr(contains("quantity=7"));
    }

    #[test]
    fn store_credit_refund_reports_credit_id() {
        let dir = create_fixture("approved");

        refund_cmd(&dir, TENANT)
            .arg("--method")
            .arg("store-credit")
            .assert()
            .success()
            .stdout(contains("\"refund_method\": \"store_credit\""))
            .stdout(contains("\"store_credit_id\""))
            .stderr(contains("balance=12.50"));
    }

    #[test]
    fn no_restore_inventory_leaves_stock_alone() {
        let dir = create_fixture("received");

        refund_cmd(&dir, TENANT)
            .arg("--no-restore-inventory")
            .assert()
            .success()
            .stdout(contains("\"restored_inventory\": []"))
            .stderr(contains("quantity=5"));
    }

    #[test]
    fn transactional_refund_commits() {
        let dir = create_fixture("received");

        refund_cmd(&dir, TENANT)
            .arg("--transactional")
            .arg("--notes")
            .arg("damaged in transit")
            .assert()
            .success()
            .stdout(contains("\"success\": true"))
            .stderr(contains("status=refunded"));
    }

    #[test]
    fn refund_event_is_logged() {
        let dir = create_fixture("received");

        refund_cmd(&dir, TENANT)
            .assert()
            .success()
            .stderr(contains("return.refund_processed"));
    }
}

mod failure {
    use super::*;

    #[test]
    fn non_refundable_status_fails_with_reason() {
        let dir = create_fixture("requested");

        refund_cmd(&dir, TENANT)
            .assert()
            .failure()
            .stdout(contains("\"success\": false"))
            .stdout(contains("Cannot process refund for return with status"))
            .stderr(contains("quantity=5"));
    }

    #[test]
    fn other_tenant_cannot_see_return() {
        let dir = create_fixture("received");

        refund_cmd(&dir, "tenant-b")
            .assert()
            .failure()
            .stdout(contains("\"success\": false"))
            .stdout(contains("not found"));
    }

    #[test]
    fn config_restricts_refundable_statuses() {
        let dir = create_fixture("received");
        fs::write(
            dir.path().join("refund.toml"),
            "[refund]\nrefundable_statuses = [\"approved\"]\n",
        )
        .expect("write refund.toml");

        refund_cmd(&dir, TENANT)
            .arg("--config")
            .arg(dir.path().join("refund.toml"))
            .assert()
            .failure()
            .stdout(contains("Return must be approved"));
    }

    #[test]
    fn missing_fixture_reports_cause() {
        let dir = TempDir::new().expect("create temp dir");

        refund_cmd(&dir, TENANT)
            .assert()
            .failure()
            .stderr(contains("error: failed to read fixture"))
            .stderr(contains("caused by:"));
    }

    #[test]
    fn malformed_fixture_reports_parse_error() {
        let dir = TempDir::new().expect("create temp dir");
        fs::write(dir.path().join("seed.json"), "{ not json").expect("write seed.json");

        refund_cmd(&dir, TENANT)
            .assert()
            .failure()
            .stderr(contains("failed to parse fixture"));
    }

    #[test]
    fn missing_config_file_reports_error() {
        let dir = create_fixture("received");

        refund_cmd(&dir, TENANT)
            .arg("--config")
            .arg(dir.path().join("absent.toml"))
            .assert()
            .failure()
            .stderr(contains("failed to load configuration"));
    }

    #[test]
    fn over_precise_amount_is_rejected() {
        let dir = create_fixture("received");

        assert_cmd::cargo::cargo_bin_cmd!("storefront")
            .arg("--fixture")
            .arg(dir.path().join("seed.json"))
            .arg("refund")
            .arg("--tenant")
            .arg(TENANT)
            .arg("--return-id")
            .arg(RETURN_ID)
            .arg("--amount")
            .arg("12.505")
            .assert()
            .failure()
            .stderr(contains("more than two decimal places"));
    }
}

mod bundled_fixture {
    use std::path::PathBuf;

    use super::*;

    fn fixture_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../.github/test-fixtures/refund")
    }

    #[test]
    fn bundled_fixture_refunds_and_skips_custom_line() {
        let fixtures = fixture_dir();

        assert_cmd::cargo::cargo_bin_cmd!("storefront")
            .env_remove("RUST_LOG")
            .arg("--fixture")
            .arg(fixtures.join("seed.json"))
            .arg("--config")
            .arg(fixtures.join("refund.toml"))
            .arg("refund")
            .arg("--tenant")
            .arg("acme")
            .arg("--return-id")
            .arg("0b7e3f52-5c1a-4f0e-8d7b-1a2b3c4d5e01")
            .arg("--amount")
            .arg("30")
            .assert()
            .success()
            .stdout(contains("\"refund_amount\": \"30.00\""))
            .stderr(contains("quantity=7"));
    }

    #[test]
    fn bundled_fixture_keeps_tenants_apart() {
        let fixtures = fixture_dir();

        assert_cmd::cargo::cargo_bin_cmd!("storefront")
            .arg("--fixture")
            .arg(fixtures.join("seed.json"))
            .arg("refund")
            .arg("--tenant")
            .arg("acme")
            .arg("--return-id")
            .arg("0b7e3f52-5c1a-4f0e-8d7b-1a2b3c4d5e02")
            .arg("--amount")
            .arg("5.00")
            .assert()
            .failure()
            .stdout(contains("not found"));
    }
}
