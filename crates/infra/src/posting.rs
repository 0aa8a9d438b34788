//! Stock posting pipeline.
//!
//! ```text
//! PostMovement
//!   ↓
//! 1. Look up the item (code, then name), reject non-stock items
//!   ↓
//! 2. Resolve the warehouse (explicit, or the resolution chain)
//!   ↓
//! 3. Under the stream lock: read the head, compute the next entry,
//!    append with an expected version (retry on conflict)
//!   ↓
//! 4. Publish `EntryPosted`
//!   ↓
//! 5. Confirm (settings rules + store), publish the outcome
//! ```
//!
//! A stored entry is never rolled back. A confirmation failure leaves a draft
//! and is reported in [`PostingOutcome`], not as an error.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use farmstock_core::{CompanyName, ExpectedVersion, WarehouseName};
use farmstock_events::{EventBus, EventEnvelope};
use farmstock_inventory::{
    ConfirmationFailed, EntryConfirmationFailed, EntryConfirmed, EntryPosted, Item, LedgerEntry,
    Movement, PostingContext, RatePolicy, ResolutionSource, ResolvedLocation, StockCatalog,
    StockError, StockLedgerEvent, StreamKey, VoucherRef, WarehouseResolver, ensure_available,
    ensure_stock_item, fiscal_year_for, latest_selling_rate, next_entry, validate_movement,
};

use crate::config::StockSettings;
use crate::ledger_store::{LedgerStore, LedgerStoreError};
use crate::locks::KeyedLocks;

/// Request to post one quantity movement.
#[derive(Debug, Clone, PartialEq)]
pub struct PostMovement {
    /// Item code or item name.
    pub item: String,
    /// Signed quantity in the item's stock unit.
    pub qty: Decimal,
    pub voucher: VoucherRef,
    /// Explicit target warehouse; resolved when absent.
    pub warehouse: Option<WarehouseName>,
    /// Owning-unit hint for resolution.
    pub company: Option<CompanyName>,
    /// Defaults to now.
    pub posting_at: Option<DateTime<Utc>>,
    /// Unit the caller measured in. A mismatch is logged, never converted.
    pub uom: Option<String>,
    /// Reject an issue that would take the balance below zero.
    pub require_available: bool,
}

impl PostMovement {
    pub fn new(item: impl Into<String>, qty: Decimal, voucher: VoucherRef) -> Self {
        Self {
            item: item.into(),
            qty,
            voucher,
            warehouse: None,
            company: None,
            posting_at: None,
            uom: None,
            require_available: false,
        }
    }

    pub fn in_warehouse(mut self, warehouse: Option<WarehouseName>) -> Self {
        self.warehouse = warehouse;
        self
    }

    pub fn for_company(mut self, company: Option<CompanyName>) -> Self {
        self.company = company;
        self
    }

    pub fn at(mut self, posting_at: DateTime<Utc>) -> Self {
        self.posting_at = Some(posting_at);
        self
    }

    pub fn with_uom(mut self, uom: Option<String>) -> Self {
        self.uom = uom;
        self
    }

    pub fn require_available(mut self) -> Self {
        self.require_available = true;
        self
    }
}

/// What happened to a posting that got as far as storing an entry.
#[derive(Debug, Clone, PartialEq)]
pub struct PostingOutcome {
    pub entry: LedgerEntry,
    /// `None` when the caller named the warehouse.
    pub resolved_by: Option<ResolutionSource>,
    pub confirmed: bool,
    pub confirmation_error: Option<ConfirmationFailed>,
}

impl PostingOutcome {
    pub fn entry_id(&self) -> farmstock_core::LedgerEntryId {
        self.entry.id
    }
}

/// Anything that can post movements. Farm call sites depend on this seam.
pub trait MovementPoster: Send + Sync {
    fn post_movement(&self, request: PostMovement) -> Result<PostingOutcome, StockError>;
}

/// Posts movements against a catalog and ledger store, publishing events to `B`.
pub struct StockPostingService<C, L, B> {
    catalog: C,
    ledger: L,
    bus: B,
    settings: StockSettings,
    locks: KeyedLocks<StreamKey>,
}

impl<C, L, B> StockPostingService<C, L, B>
where
    C: StockCatalog,
    L: LedgerStore,
    B: EventBus<EventEnvelope<StockLedgerEvent>>,
{
    pub fn new(catalog: C, ledger: L, bus: B, settings: StockSettings) -> Self {
        Self {
            catalog,
            ledger,
            bus,
            settings,
            locks: KeyedLocks::new(),
        }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn settings(&self) -> &StockSettings {
        &self.settings
    }

    /// Look up an item by code, then by name.
    pub fn find_item(&self, identifier: &str) -> Result<Item, StockError> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(StockError::validation("item identifier is required"));
        }
        self.catalog
            .find_item(identifier)
            .ok_or_else(|| StockError::ItemNotFound(identifier.to_string()))
    }

    /// Resolve the warehouse an item would be posted to.
    pub fn resolve_location(
        &self,
        item_identifier: &str,
        owning_unit_hint: Option<&CompanyName>,
    ) -> Result<ResolvedLocation, StockError> {
        let item = self.find_item(item_identifier)?;
        let resolver = WarehouseResolver::new(&self.catalog, &self.settings.defaults);
        Ok(resolver.resolve_location(&item, owning_unit_hint)?)
    }

    /// Quantity on hand, failing unless at least `required` units are there.
    pub fn check_availability(
        &self,
        item_identifier: &str,
        warehouse: Option<WarehouseName>,
        company: Option<&CompanyName>,
        required: Decimal,
    ) -> Result<Decimal, StockError> {
        let item = self.find_item(item_identifier)?;
        let (warehouse, _, _) = self.locate(&item, warehouse, company)?;
        let key = StreamKey::new(item.code.clone(), warehouse);
        let latest = self.ledger.latest(&key)?;
        ensure_available(&key.item_code, &key.warehouse, latest.as_ref(), required)
    }

    pub fn post(&self, request: PostMovement) -> Result<PostingOutcome, StockError> {
        if request.qty.is_zero() {
            return Err(StockError::validation("quantity is required and must be non-zero"));
        }

        let item = self.find_item(&request.item)?;
        ensure_stock_item(&item)?;
        if item.uom_differs(request.uom.as_deref()) {
            warn!(
                item = %item.code,
                stock_uom = %item.stock_uom,
                given_uom = ?request.uom,
                "unit differs from the item's stock unit; quantity posted unconverted"
            );
        }

        let (warehouse, company, resolved_by) =
            self.locate(&item, request.warehouse, request.company.as_ref())?;

        let posting_at = request.posting_at.unwrap_or_else(Utc::now);
        let movement = Movement {
            item_code: item.code.clone(),
            warehouse,
            qty: request.qty,
            voucher: request.voucher,
            posting_at,
        };
        validate_movement(&item, &movement)?;

        let ctx = self.posting_context(&item, company, posting_at.date_naive());
        let key = StreamKey::new(movement.item_code.clone(), movement.warehouse.clone());

        let entry = self.locks.with_lock(&key, || {
            self.append_with_retry(&item, &movement, &ctx, &key, request.require_available)
        })?;

        info!(
            entry_id = %entry.id,
            stream = %key,
            qty = %entry.actual_qty,
            balance = %entry.qty_after_transaction,
            voucher_type = %entry.voucher.voucher_type,
            voucher_no = %entry.voucher.voucher_no,
            "stock ledger entry stored"
        );
        self.publish(
            StockLedgerEvent::EntryPosted(EntryPosted {
                entry: entry.clone(),
            }),
            &entry,
        );

        let (entry, confirmation_error) = self.confirm(entry);
        Ok(PostingOutcome {
            confirmed: confirmation_error.is_none(),
            entry,
            resolved_by,
            confirmation_error,
        })
    }

    /// Target warehouse and company for a posting.
    fn locate(
        &self,
        item: &Item,
        explicit: Option<WarehouseName>,
        hint: Option<&CompanyName>,
    ) -> Result<(WarehouseName, Option<CompanyName>, Option<ResolutionSource>), StockError> {
        let resolver = WarehouseResolver::new(&self.catalog, &self.settings.defaults);

        match explicit {
            Some(name) => {
                let warehouse = self.catalog.warehouse(&name).ok_or_else(|| {
                    StockError::validation(format!("warehouse {name} does not exist"))
                })?;
                let company = match hint {
                    Some(hint) => Some(hint.clone()),
                    None => warehouse
                        .company
                        .clone()
                        .or_else(|| resolver.target_company(item, None)),
                };
                if !warehouse.accepts(company.as_ref()) {
                    return Err(StockError::validation(format!(
                        "warehouse {name} belongs to {} not {}",
                        warehouse.company.as_ref().map(|c| c.as_str()).unwrap_or("-"),
                        company.as_ref().map(|c| c.as_str()).unwrap_or("-"),
                    )));
                }
                Ok((warehouse.name, company, None))
            }
            None => {
                let resolved = resolver.resolve_location(item, hint)?;
                Ok((resolved.warehouse, resolved.company, Some(resolved.source)))
            }
        }
    }

    fn posting_context(
        &self,
        item: &Item,
        company: Option<CompanyName>,
        posting_date: NaiveDate,
    ) -> PostingContext {
        let years = self.catalog.fiscal_years();
        let fiscal_year = fiscal_year_for(&years, posting_date).map(|fy| fy.name.clone());

        let selling_rate = match self.settings.rate_policy {
            RatePolicy::SellingPrice => latest_selling_rate(&self.catalog.item_prices(&item.code)),
            RatePolicy::CarryForward => None,
        };

        PostingContext {
            company,
            fiscal_year,
            rate_policy: self.settings.rate_policy,
            selling_rate,
        }
    }

    /// Must be called with the stream lock held.
    fn append_with_retry(
        &self,
        item: &Item,
        movement: &Movement,
        ctx: &PostingContext,
        key: &StreamKey,
        require_available: bool,
    ) -> Result<LedgerEntry, StockError> {
        let mut attempt = 0;
        loop {
            let latest = self.ledger.latest(key)?;
            if require_available && movement.qty < Decimal::ZERO {
                ensure_available(&key.item_code, &key.warehouse, latest.as_ref(), -movement.qty)?;
            }

            let entry = next_entry(item, movement, latest.as_ref(), ctx)?;
            let expected = ExpectedVersion::from_observed(latest.as_ref().map(|e| e.sequence));

            match self.ledger.append(entry, expected) {
                Ok(stored) => return Ok(stored),
                Err(LedgerStoreError::Concurrency(msg))
                    if attempt < self.settings.max_append_retries =>
                {
                    attempt += 1;
                    debug!(stream = %key, attempt, %msg, "stream moved during append; retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    fn confirm(&self, entry: LedgerEntry) -> (LedgerEntry, Option<ConfirmationFailed>) {
        let result = self.settings.confirmation.check(&entry).and_then(|()| {
            self.ledger
                .mark_submitted(entry.id)
                .map_err(|e| ConfirmationFailed::Store(e.to_string()))
        });

        match result {
            Ok(submitted) => {
                self.publish(
                    StockLedgerEvent::EntryConfirmed(EntryConfirmed {
                        entry_id: submitted.id,
                        stream: submitted.stream_key(),
                        occurred_at: Utc::now(),
                    }),
                    &submitted,
                );
                (submitted, None)
            }
            Err(reason) => {
                error!(
                    entry_id = %entry.id,
                    stream = %entry.stream_key(),
                    %reason,
                    "ledger entry left as draft; needs manual reconciliation"
                );
                self.publish(
                    StockLedgerEvent::ConfirmationFailed(EntryConfirmationFailed {
                        entry_id: entry.id,
                        stream: entry.stream_key(),
                        reason: reason.to_string(),
                        occurred_at: Utc::now(),
                    }),
                    &entry,
                );
                (entry, Some(reason))
            }
        }
    }

    fn publish(&self, event: StockLedgerEvent, entry: &LedgerEntry) {
        let event_type = farmstock_events::Event::event_type(&event);
        if let Err(err) = self.bus.publish(event.into_envelope(entry)) {
            warn!(entry_id = %entry.id, event_type, ?err, "failed to publish ledger event");
        }
    }
}

impl<C, L, B> MovementPoster for StockPostingService<C, L, B>
where
    C: StockCatalog,
    L: LedgerStore,
    B: EventBus<EventEnvelope<StockLedgerEvent>>,
{
    fn post_movement(&self, request: PostMovement) -> Result<PostingOutcome, StockError> {
        self.post(request)
    }
}
