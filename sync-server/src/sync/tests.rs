//! Engine scenario tests
//!
//! Exercise the full reconciliation flow on `MemStore` plus a recording
//! commerce mock: booking → order + draft, duplicate deliveries,
//! cancellation, payment recompute, admin operations.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use shared::models::{
    AdjustmentCreate, DEFAULT_COMMISSION_RATE, ManualOrderCreate, OrderStatus, ProviderUpdate,
    StylistProvider, SyncSettings, TierInput,
};

use crate::commerce::{
    CatalogProduct, CommerceApi, CommerceError, DraftSaleRequest, PaidSaleEvent,
};
use crate::store::{MemStore, SyncStore};

use super::{SyncEngine, SyncError, SyncOutcome};

// ========================================================================
// Harness
// ========================================================================

#[derive(Default)]
struct MockCommerce {
    products: Mutex<Vec<CatalogProduct>>,
    drafts: Mutex<Vec<DraftSaleRequest>>,
    deleted_drafts: Mutex<Vec<String>>,
    counter: Mutex<u64>,
    fail_drafts: bool,
}

impl MockCommerce {
    fn failing_drafts() -> Self {
        Self {
            fail_drafts: true,
            ..Default::default()
        }
    }

    fn next_id(&self, prefix: &str) -> String {
        let mut counter = self.counter.lock().unwrap();
        *counter += 1;
        format!("{prefix}-{counter}")
    }

    fn drafts(&self) -> Vec<DraftSaleRequest> {
        self.drafts.lock().unwrap().clone()
    }

    fn deleted_drafts(&self) -> Vec<String> {
        self.deleted_drafts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommerceApi for MockCommerce {
    async fn search_products(&self, title: &str) -> Result<Vec<CatalogProduct>, CommerceError> {
        let wanted = title.to_lowercase();
        Ok(self
            .products
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.title.to_lowercase().contains(&wanted))
            .cloned()
            .collect())
    }

    async fn create_product(
        &self,
        title: &str,
        price: f64,
    ) -> Result<CatalogProduct, CommerceError> {
        let product = CatalogProduct {
            id: self.next_id("prod"),
            title: title.to_string(),
            price,
            tags: vec!["service".to_string()],
            variant_id: Some(self.next_id("var")),
        };
        self.products.lock().unwrap().push(product.clone());
        Ok(product)
    }

    async fn create_draft_sale(&self, draft: &DraftSaleRequest) -> Result<String, CommerceError> {
        if self.fail_drafts {
            return Err(CommerceError::Http("connection refused".to_string()));
        }
        self.drafts.lock().unwrap().push(draft.clone());
        Ok(self.next_id("draft"))
    }

    async fn delete_draft_sale(&self, draft_sale_id: &str) -> Result<(), CommerceError> {
        self.deleted_drafts
            .lock()
            .unwrap()
            .push(draft_sale_id.to_string());
        Ok(())
    }
}

fn harness() -> (SyncEngine, Arc<MemStore>, Arc<MockCommerce>) {
    harness_with(MemStore::new(), MockCommerce::default())
}

fn harness_with(
    store: MemStore,
    commerce: MockCommerce,
) -> (SyncEngine, Arc<MemStore>, Arc<MockCommerce>) {
    let store = Arc::new(store);
    let commerce = Arc::new(commerce);
    let engine = SyncEngine::new(store.clone(), commerce.clone());
    (engine, store, commerce)
}

const APPOINTMENT_AT: &str = "2024-03-04T10:30:00Z";

fn booking(appointment_id: &str, provider: &str, price: &str) -> serde_json::Value {
    json!({
        "appointmentId": appointment_id,
        "customerId": "c9",
        "customerEmail": "kim@example.com",
        "Appointment": {
            "ServiceProviderId": provider,
            "AppointmentDateTime": APPOINTMENT_AT,
            "Services": [{"Price": price, "Name": "Color"}],
        },
    })
}

async fn seed_provider(store: &MemStore, external_id: &str, name: &str) -> StylistProvider {
    let provider = StylistProvider {
        id: format!("prov-{external_id}"),
        external_scheduling_id: external_id.to_string(),
        external_staff_id: None,
        name: name.to_string(),
        role: None,
        commission_rate: DEFAULT_COMMISSION_RATE,
        hourly_rate: 0.0,
        enabled: true,
        pin_hash: None,
        created_at: 0,
    };
    store.create_provider(&provider).await.unwrap();
    provider
}

// ========================================================================
// Booking events
// ========================================================================

#[tokio::test]
async fn booking_for_unknown_provider_creates_everything() {
    let (engine, store, commerce) = harness();

    let outcome = engine
        .handle_appointment_event(&booking("apt-1", "p1", "80"))
        .await
        .unwrap();
    let SyncOutcome::Created { order_id } = outcome else {
        panic!("expected Created, got {outcome:?}");
    };

    // Provider auto-provisioned with the default flat rate
    let provider = store
        .find_provider_by_external_id("p1")
        .await
        .unwrap()
        .expect("provider should be created");
    assert_eq!(provider.commission_rate, DEFAULT_COMMISSION_RATE);
    assert!(provider.enabled);

    let order = store.find_order(&order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Draft);
    assert_eq!(order.total_amount, 80.0);
    assert_eq!(order.commission_amount, 32.0);
    assert_eq!(order.services, vec!["Color"]);
    assert!(order.draft_sale_id.is_some());
    assert!(!order.is_manual);

    // Draft carries the default tag plus the stylist tag
    let drafts = commerce.drafts();
    assert_eq!(drafts.len(), 1);
    assert!(drafts[0].tags.contains(&"appointment".to_string()));
    assert!(drafts[0].tags.iter().any(|t| t.starts_with("stylist:")));
    assert_eq!(drafts[0].line_items[0].title, "Color");
}

#[tokio::test]
async fn second_booking_for_same_appointment_is_an_update() {
    let (engine, store, _) = harness();

    let first = engine
        .handle_appointment_event(&booking("apt-1", "p1", "80"))
        .await
        .unwrap();
    let SyncOutcome::Created { order_id } = first else {
        panic!("expected Created");
    };

    let second = engine
        .handle_appointment_event(&booking("apt-1", "p1", "95"))
        .await
        .unwrap();
    assert_eq!(
        second,
        SyncOutcome::Updated {
            order_id: order_id.clone()
        }
    );

    // Exactly one order, with the patched amount and commission
    let orders = store.list_orders(None, None).await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].total_amount, 95.0);
    assert_eq!(orders[0].commission_amount, 38.0);
}

#[tokio::test]
async fn sync_toggles_stop_processing_without_side_effects() {
    let settings = SyncSettings {
        sync_on_booked: false,
        ..Default::default()
    };
    let (engine, store, commerce) = harness_with(
        MemStore::with_settings(settings),
        MockCommerce::default(),
    );

    let outcome = engine
        .handle_appointment_event(&booking("apt-1", "p1", "80"))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        SyncOutcome::Skipped {
            reason: "sync on booking is disabled".to_string()
        }
    );
    assert!(store.list_orders(None, None).await.unwrap().is_empty());
    assert!(commerce.drafts().is_empty());

    // Update toggle is independent of the booking toggle
    let settings = SyncSettings {
        sync_on_updated: false,
        ..Default::default()
    };
    let (engine, _, _) = harness_with(MemStore::with_settings(settings), MockCommerce::default());
    engine
        .handle_appointment_event(&booking("apt-2", "p1", "80"))
        .await
        .unwrap();
    let outcome = engine
        .handle_appointment_event(&booking("apt-2", "p1", "90"))
        .await
        .unwrap();
    assert!(matches!(outcome, SyncOutcome::Skipped { .. }));
}

#[tokio::test]
async fn blocked_time_is_skipped() {
    let (engine, store, _) = harness();

    let raw = json!({
        "appointmentId": "apt-1",
        "serviceProviderId": "p1",
        "ServiceTitle": "Lunch Break",
    });
    let outcome = engine.handle_appointment_event(&raw).await.unwrap();
    assert!(matches!(outcome, SyncOutcome::Skipped { ref reason } if reason.contains("blocked")));
    assert!(store.list_orders(None, None).await.unwrap().is_empty());

    // Same title with a customer attached is a real appointment
    let raw = json!({
        "appointmentId": "apt-2",
        "serviceProviderId": "p1",
        "customerId": "c1",
        "ServiceTitle": "Lunch Break",
    });
    let outcome = engine.handle_appointment_event(&raw).await.unwrap();
    assert!(matches!(outcome, SyncOutcome::Created { .. }));
}

#[tokio::test]
async fn placeholder_service_without_customer_is_skipped() {
    let (engine, _, _) = harness();
    let raw = json!({
        "appointmentId": "apt-1",
        "serviceProviderId": "p1",
        "ServiceTitle": "Service",
    });
    let outcome = engine.handle_appointment_event(&raw).await.unwrap();
    assert!(matches!(outcome, SyncOutcome::Skipped { ref reason } if reason.contains("no customer")));
}

#[tokio::test]
async fn events_without_a_provider_are_always_skipped() {
    let (engine, _, _) = harness();
    let raw = json!({"appointmentId": "apt-1", "customerId": "c1", "ServiceTitle": "Haircut"});
    let outcome = engine.handle_appointment_event(&raw).await.unwrap();
    assert!(matches!(outcome, SyncOutcome::Skipped { ref reason } if reason.contains("provider")));
}

#[tokio::test]
async fn disabled_providers_skip_synchronization() {
    let (engine, store, _) = harness();
    let provider = seed_provider(&store, "p1", "Dana R.").await;
    store
        .update_provider(
            &provider.id,
            &ProviderUpdate {
                enabled: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let outcome = engine
        .handle_appointment_event(&booking("apt-1", "p1", "80"))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        SyncOutcome::Skipped {
            reason: "provider 'Dana R.' is disabled".to_string()
        }
    );
    assert!(store.list_orders(None, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn commerce_failure_still_creates_the_local_order() {
    let (engine, store, _) = harness_with(MemStore::new(), MockCommerce::failing_drafts());

    let outcome = engine
        .handle_appointment_event(&booking("apt-1", "p1", "80"))
        .await
        .unwrap();
    let SyncOutcome::Created { order_id } = outcome else {
        panic!("expected Created");
    };

    let order = store.find_order(&order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Draft);
    assert!(order.draft_sale_id.is_none());
}

// ========================================================================
// Cancellation events
// ========================================================================

#[tokio::test]
async fn cancellation_voids_but_preserves_the_order() {
    let (engine, store, commerce) = harness();

    let SyncOutcome::Created { order_id } = engine
        .handle_appointment_event(&booking("apt-1", "p1", "80"))
        .await
        .unwrap()
    else {
        panic!("expected Created");
    };
    let draft_id = store
        .find_order(&order_id)
        .await
        .unwrap()
        .unwrap()
        .draft_sale_id
        .unwrap();

    let cancel = json!({"eventType": "AppointmentCancelled", "appointmentId": "apt-1"});
    let outcome = engine.handle_appointment_event(&cancel).await.unwrap();
    assert_eq!(
        outcome,
        SyncOutcome::Canceled {
            order_id: order_id.clone()
        }
    );

    // Row retained, draft reference cleared, external draft deleted
    let order = store
        .find_order_by_appointment("apt-1")
        .await
        .unwrap()
        .expect("canceled order must remain fetchable");
    assert_eq!(order.status, OrderStatus::Canceled);
    assert!(order.draft_sale_id.is_none());
    assert!(order.voided_at.is_some());
    assert_eq!(commerce.deleted_drafts(), vec![draft_id]);

    // Repeating the cancellation is a no-op success
    let again = engine.handle_appointment_event(&cancel).await.unwrap();
    assert_eq!(again, SyncOutcome::Canceled { order_id });
    assert_eq!(commerce.deleted_drafts().len(), 1);
}

#[tokio::test]
async fn deletion_events_mark_the_order_deleted() {
    let (engine, store, _) = harness();
    engine
        .handle_appointment_event(&booking("apt-1", "p1", "80"))
        .await
        .unwrap();

    let raw = json!({"eventType": "AppointmentDeleted", "appointmentId": "apt-1"});
    let outcome = engine.handle_appointment_event(&raw).await.unwrap();
    assert!(matches!(outcome, SyncOutcome::Deleted { .. }));

    let order = store
        .find_order_by_appointment("apt-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.status, OrderStatus::Deleted);
}

#[tokio::test]
async fn cancellation_without_a_matching_order_is_reported() {
    let (engine, _, _) = harness();
    let raw = json!({"eventType": "cancel", "appointmentId": "apt-404"});
    let outcome = engine.handle_appointment_event(&raw).await.unwrap();
    assert_eq!(outcome, SyncOutcome::NothingToCancel);
}

#[tokio::test]
async fn cancellation_without_an_appointment_id_is_rejected() {
    let (engine, _, _) = harness();
    let raw = json!({"eventType": "cancel"});
    let err = engine.handle_appointment_event(&raw).await.unwrap_err();
    assert!(matches!(err, SyncError::Validation(_)));
}

// ========================================================================
// Payment events
// ========================================================================

fn paid_sale(sale_id: &str, total: f64, tip: f64, email: &str) -> PaidSaleEvent {
    PaidSaleEvent {
        sale_id: sale_id.to_string(),
        total_amount: total,
        tip_amount: tip,
        line_titles: vec!["Color".to_string()],
        source: Some("shop_draft_order".to_string()),
        customer_email: Some(email.to_string()),
        staff_id: None,
    }
}

#[tokio::test]
async fn payment_recomputes_commission_at_the_new_tier() {
    let (engine, store, _) = harness();
    let provider = seed_provider(&store, "p1", "Dana R.").await;
    store
        .replace_tiers(
            &provider.id,
            &[TierInput {
                tier_level: 1,
                sales_threshold: 150.0,
                commission_rate: 50.0,
            }],
        )
        .await
        .unwrap();

    // First booking: period sales (excluding itself) are 0 → flat 40%
    let SyncOutcome::Created { order_id } = engine
        .handle_appointment_event(&booking("apt-1", "p1", "100"))
        .await
        .unwrap()
    else {
        panic!("expected Created");
    };
    let order = store.find_order(&order_id).await.unwrap().unwrap();
    assert_eq!(order.commission_amount, 40.0);

    // A second appointment lands in the same period and lifts the
    // provider's period sales past the 150 threshold
    let other = json!({
        "appointmentId": "apt-2",
        "customerId": "c2",
        "Appointment": {
            "ServiceProviderId": "p1",
            "AppointmentDateTime": APPOINTMENT_AT,
            "Services": [{"Price": "200", "Name": "Balayage"}],
        },
    });
    engine.handle_appointment_event(&other).await.unwrap();

    // Payment at the amended total must use the 50% tier: 75, not 60
    let outcome = engine
        .handle_sale_event(&paid_sale("sale-9", 150.0, 20.0, "kim@example.com"))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        SyncOutcome::Paid {
            order_id: order_id.clone()
        }
    );

    let order = store.find_order(&order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Paid);
    assert_eq!(order.total_amount, 150.0);
    assert_eq!(order.tip_amount, 20.0);
    assert_eq!(order.commission_amount, 75.0);
    assert_eq!(order.paid_sale_id.as_deref(), Some("sale-9"));
    assert!(order.paid_at.is_some());
}

#[tokio::test]
async fn payment_matches_by_stored_sale_id_first() {
    let (engine, _store, _) = harness();
    let SyncOutcome::Created { order_id } = engine
        .handle_appointment_event(&booking("apt-1", "p1", "80"))
        .await
        .unwrap()
    else {
        panic!("expected Created");
    };

    engine
        .handle_sale_event(&paid_sale("sale-1", 80.0, 0.0, "kim@example.com"))
        .await
        .unwrap();

    // Redelivery of the same sale matches by paid-sale id even though the
    // order is no longer in draft
    let outcome = engine
        .handle_sale_event(&paid_sale("sale-1", 80.0, 0.0, "kim@example.com"))
        .await
        .unwrap();
    assert_eq!(outcome, SyncOutcome::Paid { order_id });
}

#[tokio::test]
async fn ambiguous_payments_match_nothing() {
    let (engine, store, _) = harness();
    engine
        .handle_appointment_event(&booking("apt-1", "p1", "80"))
        .await
        .unwrap();
    engine
        .handle_appointment_event(&booking("apt-2", "p1", "80"))
        .await
        .unwrap();

    // Two drafts share the email and the total — no action taken
    let outcome = engine
        .handle_sale_event(&paid_sale("sale-1", 80.0, 0.0, "kim@example.com"))
        .await
        .unwrap();
    assert_eq!(outcome, SyncOutcome::NoMatch);
    for order in store.list_orders(None, None).await.unwrap() {
        assert_eq!(order.status, OrderStatus::Draft);
    }
}

#[tokio::test]
async fn drafts_are_disambiguated_by_total() {
    let (engine, store, _) = harness();
    engine
        .handle_appointment_event(&booking("apt-1", "p1", "80"))
        .await
        .unwrap();
    engine
        .handle_appointment_event(&booking("apt-2", "p1", "120"))
        .await
        .unwrap();

    let outcome = engine
        .handle_sale_event(&paid_sale("sale-1", 120.0, 0.0, "kim@example.com"))
        .await
        .unwrap();
    let SyncOutcome::Paid { order_id } = outcome else {
        panic!("expected Paid");
    };
    let order = store.find_order(&order_id).await.unwrap().unwrap();
    assert_eq!(order.appointment_id.as_deref(), Some("apt-2"));
}

#[tokio::test]
async fn non_draft_sources_do_not_match_by_email() {
    let (engine, _, _) = harness();
    engine
        .handle_appointment_event(&booking("apt-1", "p1", "80"))
        .await
        .unwrap();

    let mut sale = paid_sale("sale-1", 80.0, 0.0, "kim@example.com");
    sale.source = Some("pos".to_string());
    let outcome = engine.handle_sale_event(&sale).await.unwrap();
    assert_eq!(outcome, SyncOutcome::NoMatch);
}

// ========================================================================
// Admin operations
// ========================================================================

#[tokio::test]
async fn manual_orders_require_customer_and_amount() {
    let (engine, store, _) = harness();
    let provider = seed_provider(&store, "p1", "Dana R.").await;

    let missing_name = ManualOrderCreate {
        provider_id: provider.id.clone(),
        customer_name: "  ".to_string(),
        customer_email: None,
        services: vec![],
        total_amount: 50.0,
        tip_amount: 0.0,
        appointment_at: None,
    };
    assert!(matches!(
        engine.create_manual_order(&missing_name).await,
        Err(SyncError::Validation(_))
    ));

    let missing_amount = ManualOrderCreate {
        provider_id: provider.id.clone(),
        customer_name: "Kim".to_string(),
        customer_email: None,
        services: vec![],
        total_amount: 0.0,
        tip_amount: 0.0,
        appointment_at: None,
    };
    assert!(matches!(
        engine.create_manual_order(&missing_amount).await,
        Err(SyncError::Validation(_))
    ));

    let valid = ManualOrderCreate {
        provider_id: provider.id.clone(),
        customer_name: "Kim".to_string(),
        customer_email: None,
        services: vec!["Color".to_string()],
        total_amount: 50.0,
        tip_amount: 5.0,
        appointment_at: None,
    };
    let order = engine.create_manual_order(&valid).await.unwrap();
    assert!(order.is_manual);
    assert!(order.appointment_id.is_none());
    assert_eq!(order.commission_amount, 20.0);
}

#[tokio::test]
async fn first_event_with_a_business_id_caches_it() {
    let (engine, store, _) = harness();
    let raw = json!({
        "appointmentId": "apt-1",
        "customerId": "c9",
        "businessId": "biz-1",
        "Appointment": {
            "ServiceProviderId": "p1",
            "Services": [{"Price": "80", "Name": "Color"}],
        },
    });
    engine.handle_appointment_event(&raw).await.unwrap();
    let settings = store.get_settings().await.unwrap();
    assert_eq!(settings.business_id.as_deref(), Some("biz-1"));
}

#[tokio::test]
async fn checkout_moves_drafts_forward_only() {
    let (engine, store, _) = harness();
    let SyncOutcome::Created { order_id } = engine
        .handle_appointment_event(&booking("apt-1", "p1", "80"))
        .await
        .unwrap()
    else {
        panic!("expected Created");
    };

    let order = engine.begin_checkout(&order_id).await.unwrap();
    assert_eq!(order.status, OrderStatus::PendingCheckout);

    // Repeats are no-ops
    let again = engine.begin_checkout(&order_id).await.unwrap();
    assert_eq!(again.status, OrderStatus::PendingCheckout);

    // Email matching only considers draft orders
    let outcome = engine
        .handle_sale_event(&paid_sale("sale-1", 80.0, 0.0, "kim@example.com"))
        .await
        .unwrap();
    assert_eq!(outcome, SyncOutcome::NoMatch);

    // Voiding from checkout is allowed; a voided order cannot re-enter
    engine.void_order(&order_id, None).await.unwrap();
    assert!(matches!(
        engine.begin_checkout(&order_id).await,
        Err(SyncError::InvalidTransition(_))
    ));
    let order = store.find_order(&order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Canceled);
}

#[tokio::test]
async fn restore_returns_voided_orders_to_draft() {
    let (engine, store, _) = harness();
    let SyncOutcome::Created { order_id } = engine
        .handle_appointment_event(&booking("apt-1", "p1", "80"))
        .await
        .unwrap()
    else {
        panic!("expected Created");
    };

    // Restoring an active order is an invalid transition
    assert!(matches!(
        engine.restore_order(&order_id).await,
        Err(SyncError::InvalidTransition(_))
    ));

    engine.void_order(&order_id, Some("walk-out")).await.unwrap();
    let order = store.find_order(&order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Canceled);
    assert_eq!(order.void_reason.as_deref(), Some("walk-out"));

    let restored = engine.restore_order(&order_id).await.unwrap();
    assert_eq!(restored.status, OrderStatus::Draft);
    assert!(restored.voided_at.is_none());
    assert!(restored.void_reason.is_none());
}

#[tokio::test]
async fn commission_adjustments_are_ledgered() {
    let (engine, store, _) = harness();
    let SyncOutcome::Created { order_id } = engine
        .handle_appointment_event(&booking("apt-1", "p1", "80"))
        .await
        .unwrap()
    else {
        panic!("expected Created");
    };

    let adjusted = engine
        .adjust_commission(
            &order_id,
            &AdjustmentCreate {
                delta: -2.0,
                reason: "product cost share".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(adjusted.commission_amount, 30.0);

    let ledger = store.adjustments();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].order_id, order_id);
    assert_eq!(ledger[0].delta, -2.0);

    // A reason is mandatory
    assert!(matches!(
        engine
            .adjust_commission(
                &order_id,
                &AdjustmentCreate {
                    delta: 1.0,
                    reason: "".to_string()
                }
            )
            .await,
        Err(SyncError::Validation(_))
    ));
}

#[tokio::test]
async fn date_correction_reprices_against_the_new_period() {
    let (engine, store, _) = harness();
    let provider = seed_provider(&store, "p1", "Dana R.").await;
    store
        .replace_tiers(
            &provider.id,
            &[TierInput {
                tier_level: 1,
                sales_threshold: 150.0,
                commission_rate: 50.0,
            }],
        )
        .await
        .unwrap();

    // Two orders in the original period
    let SyncOutcome::Created { order_id } = engine
        .handle_appointment_event(&booking("apt-1", "p1", "100"))
        .await
        .unwrap()
    else {
        panic!("expected Created");
    };
    engine
        .handle_appointment_event(&booking("apt-2", "p1", "200"))
        .await
        .unwrap();

    // Moving apt-1 far into an empty period drops it below the tier
    let original = store.find_order(&order_id).await.unwrap().unwrap();
    let far_future = original.appointment_at + 10 * 14 * 86_400_000;
    let moved = engine
        .set_appointment_date(&order_id, far_future)
        .await
        .unwrap();
    assert_eq!(moved.appointment_at, far_future);
    assert_eq!(moved.commission_amount, 40.0); // flat rate, empty period

    // Moving it back re-applies the tier (period sales 200 ≥ 150 → 50%)
    let back = engine
        .set_appointment_date(&order_id, original.appointment_at)
        .await
        .unwrap();
    assert_eq!(back.commission_amount, 50.0);
}
