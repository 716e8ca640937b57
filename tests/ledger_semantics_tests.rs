//! Tests for the in-memory ledger's token semantics: get-or-create
//! idempotency, delegate allowance accounting, revocation, and burn
//! supply accounting.

use mintflow::ledger::{
    Address, InMemoryLedger, LedgerError, LedgerOps, RejectionReason, SigningIdentity,
};

struct Fixture {
    ledger: InMemoryLedger,
    payer: SigningIdentity,
    delegate: SigningIdentity,
    receiver: SigningIdentity,
    mint: Address,
    owner_account: Address,
    receiver_account: Address,
}

/// Mint at 2 decimals with 10000 base units on the owner account and a
/// 5000 base-unit delegate allowance.
async fn funded_fixture() -> Fixture {
    let ledger = InMemoryLedger::new();
    let payer = SigningIdentity::generate();
    let delegate = SigningIdentity::generate();
    let receiver = SigningIdentity::generate();

    let mint = ledger
        .create_mint(&payer, payer.address(), payer.address(), 2)
        .await
        .expect("create mint");
    let (owner_account, existed) = ledger
        .get_or_create_token_account(&payer, &mint, payer.address())
        .await
        .expect("owner account");
    assert!(!existed);
    let (receiver_account, _) = ledger
        .get_or_create_token_account(&payer, &mint, receiver.address())
        .await
        .expect("receiver account");
    ledger
        .mint_to(&payer, &mint, &owner_account, &payer, 10_000)
        .await
        .expect("mint supply");
    ledger
        .approve_delegate(&payer, &owner_account, delegate.address(), &payer, 5_000)
        .await
        .expect("approve delegate");

    Fixture {
        ledger,
        payer,
        delegate,
        receiver,
        mint,
        owner_account,
        receiver_account,
    }
}

#[tokio::test]
async fn get_or_create_is_idempotent_per_mint_and_owner() {
    let f = funded_fixture().await;

    let (again, existed) = f
        .ledger
        .get_or_create_token_account(&f.payer, &f.mint, f.payer.address())
        .await
        .expect("repeat get-or-create");
    assert!(existed, "second call must report the account existed");
    assert_eq!(again, f.owner_account, "same (mint, owner) -> same address");

    // A different owner on the same mint gets a different account.
    let (other, existed) = f
        .ledger
        .get_or_create_token_account(&f.payer, &f.mint, f.receiver.address())
        .await
        .expect("receiver get-or-create");
    assert!(existed);
    assert_eq!(other, f.receiver_account);
    assert_ne!(other, f.owner_account);
}

#[tokio::test]
async fn delegate_transfer_is_capped_by_allowance_not_balance() {
    let f = funded_fixture().await;

    // Balance (10000) covers it; allowance (5000) does not.
    let err = f
        .ledger
        .transfer(
            &f.payer,
            &f.owner_account,
            &f.receiver_account,
            &f.delegate,
            6_000,
        )
        .await
        .expect_err("transfer beyond allowance must fail");
    assert_eq!(
        err,
        LedgerError::Rejected(RejectionReason::InsufficientAllowance {
            remaining: 5_000,
            required: 6_000,
        })
    );

    // Within the allowance it settles and draws the allowance down.
    f.ledger
        .transfer(
            &f.payer,
            &f.owner_account,
            &f.receiver_account,
            &f.delegate,
            3_000,
        )
        .await
        .expect("transfer within allowance");
    let owner = f
        .ledger
        .token_account_info(&f.owner_account)
        .await
        .expect("owner info");
    assert_eq!(owner.balance, 7_000);
    let delegation = owner.delegation.expect("delegation still active");
    assert_eq!(delegation.allowance, 2_000);
}

#[tokio::test]
async fn revoked_delegate_cannot_transfer() {
    let f = funded_fixture().await;

    f.ledger
        .revoke_delegate(&f.payer, &f.owner_account, &f.payer)
        .await
        .expect("revoke");

    let err = f
        .ledger
        .transfer(
            &f.payer,
            &f.owner_account,
            &f.receiver_account,
            &f.delegate,
            1_000,
        )
        .await
        .expect_err("former delegate must be rejected");
    assert_eq!(
        err,
        LedgerError::Rejected(RejectionReason::NoActiveDelegate {
            account: f.owner_account.clone(),
        })
    );

    // The owner can still move funds directly.
    f.ledger
        .transfer(
            &f.payer,
            &f.owner_account,
            &f.receiver_account,
            &f.payer,
            1_000,
        )
        .await
        .expect("owner transfer after revoke");
}

#[tokio::test]
async fn a_new_approval_replaces_the_prior_delegate() {
    let f = funded_fixture().await;
    let successor = SigningIdentity::generate();

    f.ledger
        .approve_delegate(&f.payer, &f.owner_account, successor.address(), &f.payer, 1_000)
        .await
        .expect("replace delegation");

    // The displaced delegate no longer has authority.
    let err = f
        .ledger
        .transfer(
            &f.payer,
            &f.owner_account,
            &f.receiver_account,
            &f.delegate,
            500,
        )
        .await
        .expect_err("displaced delegate must be rejected");
    assert!(matches!(
        err,
        LedgerError::Rejected(RejectionReason::BadAuthority { .. })
    ));

    // The successor operates under the new allowance.
    f.ledger
        .transfer(
            &f.payer,
            &f.owner_account,
            &f.receiver_account,
            &successor,
            1_000,
        )
        .await
        .expect("successor transfer");
}

#[tokio::test]
async fn burn_reduces_supply_by_exactly_the_burned_amount() {
    let f = funded_fixture().await;

    let before = f.ledger.mint_info(&f.mint).await.expect("mint info");
    assert_eq!(before.supply, 10_000);

    f.ledger
        .burn(&f.payer, &f.owner_account, &f.mint, &f.payer, 2_500)
        .await
        .expect("burn");

    let after = f.ledger.mint_info(&f.mint).await.expect("mint info");
    assert_eq!(after.supply, 7_500);
    let owner = f
        .ledger
        .token_account_info(&f.owner_account)
        .await
        .expect("owner info");
    assert_eq!(owner.balance, 7_500);
}

#[tokio::test]
async fn burn_beyond_balance_is_rejected() {
    let f = funded_fixture().await;

    let err = f
        .ledger
        .burn(&f.payer, &f.owner_account, &f.mint, &f.payer, 10_001)
        .await
        .expect_err("overdrawn burn must fail");
    assert_eq!(
        err,
        LedgerError::Rejected(RejectionReason::InsufficientFunds {
            balance: 10_000,
            required: 10_001,
        })
    );

    // Nothing changed.
    let info = f.ledger.mint_info(&f.mint).await.expect("mint info");
    assert_eq!(info.supply, 10_000);
}

#[tokio::test]
async fn operations_on_unknown_accounts_and_mints_are_rejected() {
    let ledger = InMemoryLedger::new();
    let payer = SigningIdentity::generate();
    let ghost = Address::new("00".repeat(20));

    let err = ledger
        .get_or_create_token_account(&payer, &ghost, payer.address())
        .await
        .expect_err("unknown mint");
    assert_eq!(
        err,
        LedgerError::Rejected(RejectionReason::UnknownMint(ghost.clone()))
    );

    let err = ledger
        .token_account_info(&ghost)
        .await
        .expect_err("unknown account");
    assert_eq!(
        err,
        LedgerError::Rejected(RejectionReason::UnknownAccount(ghost))
    );
}

#[tokio::test]
async fn only_the_mint_authority_may_mint() {
    let f = funded_fixture().await;
    let intruder = SigningIdentity::generate();

    let err = f
        .ledger
        .mint_to(&f.payer, &f.mint, &f.owner_account, &intruder, 1)
        .await
        .expect_err("non-authority mint must fail");
    assert!(matches!(
        err,
        LedgerError::Rejected(RejectionReason::BadAuthority { .. })
    ));
}
