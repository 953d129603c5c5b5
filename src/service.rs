//! Sales application service
//!
//! Glues the pure generation pipeline to its collaborators: one batched
//! product lookup, one atomic persist, then best-effort event publication.

use std::sync::Arc;

use chrono::Utc;
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{debug, info, warn};
use validator::Validate;

use crate::domain::aggregates::{ManualSale, Sale};
use crate::domain::events::{DomainEvent, SaleEvent};
use crate::domain::services::{generate_sale, requested_product_ids, PaymentResolver, RandomPaymentResolver, SaleDefaults, SaleDraft};
use crate::dto::{CreateSaleRequest, GenerateSaleRequest, UpdateSaleRequest, UpdateSaleStatusRequest};
use crate::repository::{ProductCatalog, SaleRecord, SaleStore};
use crate::{Result, SalesError};

pub struct SalesService {
    catalog: Arc<dyn ProductCatalog>,
    store: Arc<dyn SaleStore>,
    events: Option<async_nats::Client>,
    defaults: SaleDefaults,
}

impl SalesService {
    pub fn new(catalog: Arc<dyn ProductCatalog>, store: Arc<dyn SaleStore>, defaults: SaleDefaults) -> Self {
        Self { catalog, store, events: None, defaults }
    }

    pub fn with_events(mut self, client: async_nats::Client) -> Self {
        self.events = Some(client);
        self
    }

    /// Generates a sale with a randomly simulated payment when the request asks for one.
    pub async fn generate(&self, request: &GenerateSaleRequest, changed_by: Option<&str>) -> Result<Sale> {
        let mut resolver = RandomPaymentResolver::new(StdRng::from_entropy());
        let mut rng = StdRng::from_entropy();
        self.generate_with(request, changed_by, &mut resolver, &mut rng).await
    }

    pub async fn generate_with<P, R>(&self, request: &GenerateSaleRequest, changed_by: Option<&str>, resolver: &mut P, rng: &mut R) -> Result<Sale>
    where
        P: PaymentResolver + Send + ?Sized,
        R: Rng + Send + ?Sized,
    {
        request.validate()?;
        let draft = SaleDraft::from(request);
        if draft.items.is_empty() { return Err(SalesError::NoItems); }

        let ids = requested_product_ids(&draft.items);
        debug!(products = ids.len(), items = draft.items.len(), "resolving sale items");
        let products = self.catalog.lookup_products(&ids).await?;

        let mut generated = generate_sale(&draft, &products, resolver, rng, &self.defaults, changed_by, Utc::now()).map_err(|e| {
            warn!(error = %e, "sale generation rejected");
            e
        })?;
        let events = generated.sale.take_events();
        self.store.persist_sale(&generated.sale, &generated.history).await?;
        let sale = generated.sale;
        info!(
            sale_id = %sale.id,
            order_number = %sale.order_number,
            outcome = %generated.outcome,
            adjustment = %generated.totals.adjustment_type(),
            total = %sale.total,
            "sale generated"
        );
        self.publish(events).await;
        Ok(sale)
    }

    /// Records a sale entered by hand, without line items.
    pub async fn create(&self, request: CreateSaleRequest, changed_by: Option<&str>) -> Result<Sale> {
        request.validate()?;
        let mut rng = StdRng::from_entropy();
        let (mut sale, history) = Sale::record(ManualSale::from(request), &mut rng, changed_by, Utc::now());
        self.store.persist_sale(&sale, &history).await?;
        info!(sale_id = %sale.id, order_number = %sale.order_number, total = %sale.total, "sale created");
        let events = sale.take_events();
        self.publish(events).await;
        Ok(sale)
    }

    pub async fn find(&self, id: &str) -> Result<SaleRecord> {
        self.store.find_sale(id).await?.ok_or_else(|| SalesError::SaleNotFound(id.to_string()))
    }

    pub async fn list(&self, search: Option<&str>) -> Result<Vec<Sale>> {
        let search = search.map(str::trim).filter(|s| !s.is_empty());
        self.store.list_sales(search).await
    }

    pub async fn update(&self, id: &str, request: UpdateSaleRequest, changed_by: Option<&str>) -> Result<Sale> {
        request.validate()?;
        let SaleRecord { mut sale, .. } = self.find(id).await?;
        let history = sale.apply_changes(request.into(), changed_by, Utc::now());
        self.store.update_sale(&sale, &history).await?;
        info!(sale_id = %sale.id, status = %sale.status, "sale updated");
        let events = sale.take_events();
        self.publish(events).await;
        Ok(sale)
    }

    pub async fn update_status(&self, id: &str, request: UpdateSaleStatusRequest, changed_by: Option<&str>) -> Result<Sale> {
        let SaleRecord { mut sale, .. } = self.find(id).await?;
        let history = sale.change_status(request.status, request.note, changed_by, Utc::now());
        self.store.update_sale(&sale, &history).await?;
        info!(sale_id = %sale.id, status = %sale.status, "sale status changed");
        let events = sale.take_events();
        self.publish(events).await;
        Ok(sale)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        if !self.store.delete_sale(id).await? { return Err(SalesError::SaleNotFound(id.to_string())); }
        info!(sale_id = %id, "sale deleted");
        self.publish(vec![DomainEvent::Sale(SaleEvent::Deleted { sale_id: id.to_string() })]).await;
        Ok(())
    }

    async fn publish(&self, events: Vec<DomainEvent>) {
        let Some(client) = &self.events else { return };
        for event in events {
            let payload = match serde_json::to_vec(&event) {
                Ok(payload) => payload,
                Err(e) => { warn!(error = %e, "failed to encode event"); continue; }
            };
            if let Err(e) = client.publish(event.subject().to_string(), payload.into()).await {
                warn!(error = %e, subject = event.subject(), "failed to publish event");
            }
        }
    }
}
