use std::sync::Arc;

use backoffice_sales::domain::aggregates::AdjustmentType;
use backoffice_sales::domain::services::{FixedPaymentResolver, PaymentOutcome};
use backoffice_sales::dto::{CreateSaleRequest, GenerateSaleRequest, SaleItemRequest, UpdateSaleRequest, UpdateSaleStatusRequest};
use backoffice_sales::infrastructure::InMemoryStore;
use backoffice_sales::{PaymentStatus, Product, SaleDefaults, SaleStatus, SalesError, SalesService};
use rand::{rngs::StdRng, SeedableRng};
use rust_decimal_macros::dec;
use serde_json::json;

async fn setup() -> (Arc<InMemoryStore>, SalesService) {
    let store = Arc::new(InMemoryStore::new());
    store
        .insert_product(Product::new("buzo", "Buzo Oversize", dec!(100.00)).with_options(json!([
            { "name": "Talle y color", "values": ["S:Rojo", "L:Azul"] }
        ])))
        .await;
    store.insert_product(Product::new("gorra", "Gorra", dec!(50.00))).await;
    let service = SalesService::new(store.clone(), store.clone(), SaleDefaults::default());
    (store, service)
}

fn request(items: Vec<SaleItemRequest>) -> GenerateSaleRequest {
    GenerateSaleRequest { items, customer_email: Some("ana@mail.com".into()), ..Default::default() }
}

#[tokio::test]
async fn test_generate_persists_sale_and_history() {
    let (store, service) = setup().await;
    let req = request(vec![SaleItemRequest::new("buzo", 2).with_attribute("Talle y color", "S|Rojo"), SaleItemRequest::new("gorra", 1)]);
    let mut rng = StdRng::seed_from_u64(11);
    let sale = service.generate_with(&req, Some("admin"), &mut FixedPaymentResolver(PaymentOutcome::Approved), &mut rng).await.unwrap();

    assert_eq!(sale.total, dec!(250.00));
    assert_eq!(sale.status, SaleStatus::Sent);
    assert_eq!(sale.payment_status, PaymentStatus::Paid);
    assert!(sale.tracking_number.is_some());
    assert_eq!(sale.items[0].product_label, "Buzo Oversize | Talle y color: S / Rojo");

    let record = service.find(&sale.id).await.unwrap();
    assert_eq!(record.sale.items.len(), 2);
    assert_eq!(record.histories.len(), 1);
    assert_eq!(record.histories[0].note, "Generada desde panel (pago APPROVED)");
    assert_eq!(record.histories[0].changed_by, "admin");
    assert_eq!(store.sale_count().await, 1);
}

#[tokio::test]
async fn test_unknown_product_persists_nothing() {
    let (store, service) = setup().await;
    let req = request(vec![SaleItemRequest::new("gorra", 1), SaleItemRequest::new("zapatilla", 1)]);
    let err = service.generate(&req, None).await.unwrap_err();
    assert!(matches!(err, SalesError::ProductNotFound(ref id) if id == "zapatilla"));
    assert_eq!(store.sale_count().await, 0);
}

#[tokio::test]
async fn test_invalid_combination_persists_nothing() {
    let (store, service) = setup().await;
    let req = request(vec![SaleItemRequest::new("buzo", 1).with_attribute("Talle y color", "S|Azul")]);
    let err = service.generate(&req, None).await.unwrap_err();
    assert!(matches!(err, SalesError::InvalidAttribute { .. }));
    assert_eq!(store.sale_count().await, 0);
}

#[tokio::test]
async fn test_request_validation() {
    let (_, service) = setup().await;
    let err = service.generate(&GenerateSaleRequest::default(), None).await.unwrap_err();
    assert!(matches!(err, SalesError::NoItems));

    let req = GenerateSaleRequest { customer_email: Some("nope".into()), ..request(vec![SaleItemRequest::new("gorra", 1)]) };
    assert!(matches!(service.generate(&req, None).await, Err(SalesError::Validation(_))));
}

#[tokio::test]
async fn test_item_fields_are_validated_before_lookup() {
    let (store, service) = setup().await;
    for item in [SaleItemRequest::new("", 1), SaleItemRequest::new("gorra", 3_000_000_000)] {
        let err = service.generate(&request(vec![item]), None).await.unwrap_err();
        assert!(matches!(err, SalesError::Validation(_)), "unexpected error: {err:?}");
    }
    let req = GenerateSaleRequest {
        adjustment_type: Some(AdjustmentType::Discount),
        adjustment_percent: Some(dec!(12.345)),
        ..request(vec![SaleItemRequest::new("gorra", 1)])
    };
    assert!(matches!(service.generate(&req, None).await, Err(SalesError::Validation(_))));
    assert_eq!(store.sale_count().await, 0);
}

fn manual_sale() -> CreateSaleRequest {
    CreateSaleRequest {
        customer_name: "Marta Díaz".into(),
        customer_email: "marta@mail.com".into(),
        total: dec!(1200.50),
        status: SaleStatus::Completed,
        payment_status: PaymentStatus::Paid,
        payment_method: "Transferencia".into(),
        shipping_address: "Calle 9".into(),
        tracking_number: None,
        notes: None,
    }
}

#[tokio::test]
async fn test_manual_sale_create_and_update() {
    let (_, service) = setup().await;
    let sale = service.create(manual_sale(), Some("caja")).await.unwrap();
    assert!(sale.items.is_empty());
    assert_eq!(sale.subtotal, dec!(1200.50));

    let changes = UpdateSaleRequest { payment_status: Some(PaymentStatus::Failed), ..Default::default() };
    let updated = service.update(&sale.id, changes, None).await.unwrap();
    assert_eq!(updated.payment_status, PaymentStatus::Failed);
    assert_eq!(updated.customer_name, "Marta Díaz");

    let record = service.find(&sale.id).await.unwrap();
    assert_eq!(record.sale.payment_status, PaymentStatus::Failed);
    let notes: Vec<&str> = record.histories.iter().map(|h| h.note.as_str()).collect();
    assert_eq!(notes, ["Venta actualizada desde el panel.", "Venta creada"]);
    assert_eq!(record.histories[1].changed_by, "caja");

    let invalid = CreateSaleRequest { customer_email: "marta".into(), ..manual_sale() };
    assert!(matches!(service.create(invalid, None).await, Err(SalesError::Validation(_))));
}

#[tokio::test]
async fn test_update_keeps_generated_items() {
    let (_, service) = setup().await;
    let req = request(vec![SaleItemRequest::new("gorra", 1), SaleItemRequest::new("gorra", 2)]);
    let mut rng = StdRng::seed_from_u64(5);
    let sale = service.generate_with(&req, None, &mut FixedPaymentResolver(PaymentOutcome::Approved), &mut rng).await.unwrap();

    let changes = UpdateSaleRequest { customer_name: Some("Ana María".into()), notes: Some("Cambio de titular".into()), ..Default::default() };
    service.update(&sale.id, changes, Some("admin")).await.unwrap();

    let record = service.find(&sale.id).await.unwrap();
    assert_eq!(record.sale.items.len(), 2);
    assert_eq!(record.sale.customer_name, "Ana María");
    assert_eq!(record.histories[0].note, "Cambio de titular");
    assert!(matches!(service.update("missing", UpdateSaleRequest::default(), None).await, Err(SalesError::SaleNotFound(_))));
}

#[tokio::test]
async fn test_delete_sale() {
    let (store, service) = setup().await;
    let sale = service.create(manual_sale(), None).await.unwrap();
    service.delete(&sale.id).await.unwrap();
    assert_eq!(store.sale_count().await, 0);
    assert!(store.history_for(&sale.id).await.is_empty());
    assert!(matches!(service.delete(&sale.id).await, Err(SalesError::SaleNotFound(_))));
}

#[tokio::test]
async fn test_declined_then_status_update_appends_history() {
    let (_, service) = setup().await;
    let req = request(vec![SaleItemRequest::new("gorra", 1)]);
    let mut rng = StdRng::seed_from_u64(2);
    let sale = service.generate_with(&req, None, &mut FixedPaymentResolver(PaymentOutcome::Declined), &mut rng).await.unwrap();
    assert_eq!(sale.status, SaleStatus::Cancelled);
    assert!(sale.tracking_number.is_none());

    let updated = service
        .update_status(&sale.id, UpdateSaleStatusRequest { status: SaleStatus::Preparing, note: None }, None)
        .await
        .unwrap();
    assert_eq!(updated.status, SaleStatus::Preparing);

    let record = service.find(&sale.id).await.unwrap();
    assert_eq!(record.sale.status, SaleStatus::Preparing);
    assert_eq!(record.histories.len(), 2);
    assert_eq!(record.histories[0].note, "Cambio de estado a PREPARING");
}

#[tokio::test]
async fn test_list_and_search() {
    let (_, service) = setup().await;
    let mut rng = StdRng::seed_from_u64(4);
    let mut resolver = FixedPaymentResolver(PaymentOutcome::Pending);
    let first = GenerateSaleRequest { customer_name: Some("Ana Pérez".into()), ..request(vec![SaleItemRequest::new("gorra", 1)]) };
    let second = GenerateSaleRequest { customer_name: Some("Luis Gómez".into()), ..request(vec![SaleItemRequest::new("gorra", 2)]) };
    service.generate_with(&first, None, &mut resolver, &mut rng).await.unwrap();
    service.generate_with(&second, None, &mut resolver, &mut rng).await.unwrap();

    let all = service.list(None).await.unwrap();
    assert_eq!(all.len(), 2);
    assert!(all.iter().all(|s| s.items.is_empty()));

    let found = service.list(Some("luis")).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].customer_name, "Luis Gómez");
    assert_eq!(service.list(Some("   ")).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_unknown_sale() {
    let (_, service) = setup().await;
    assert!(matches!(service.find("missing").await, Err(SalesError::SaleNotFound(_))));
    let req = UpdateSaleStatusRequest { status: SaleStatus::Completed, note: None };
    assert!(matches!(service.update_status("missing", req, None).await, Err(SalesError::SaleNotFound(_))));
}
