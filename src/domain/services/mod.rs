//! Domain services: item resolution, totals, payment simulation and sale generation
pub mod generator;
pub mod payment;
pub mod resolver;
pub mod totals;

pub use generator::{audit_note, generate_sale, GeneratedSale, SaleDefaults, SaleDraft};
pub use payment::{FixedPaymentResolver, PaymentOutcome, PaymentResolver, PaymentSimulation, RandomPaymentResolver};
pub use resolver::{requested_product_ids, resolve_items, ItemRequest};
pub use totals::{compute_totals, AppliedAdjustment, OrderTotals};
