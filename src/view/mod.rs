//! Interaction state of the inventory table.
//!
//! `TableView` turns sync results into user-facing state: the add dialog,
//! row selection and the transient status notice. Every failure ends up as a
//! notice; the mirror is left as the store last confirmed it.

use chrono::{DateTime, Duration, Utc};
use tracing::{error, warn};

use crate::{
    commands::{products::BatchDeleteReport, products::UpdateOutcome, suppliers::HydrationReport},
    errors::ServiceError,
    models::{AddProductForm, Product, ProductField, ProductId, SupplierId},
    notifications::{
        Notice, PRODUCTS_DELETED, PRODUCT_CREATED, PRODUCT_CREATE_FAILED, PRODUCT_DELETE_FAILED,
        PRODUCT_UPDATE_FAILED,
    },
    selection::{ClickTarget, Selection},
    services::InventorySyncService,
};

pub mod table;

pub use table::{build_cards, SupplierCard, SupplierRow};

const DEFAULT_AUTO_HIDE_MS: i64 = 3000;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AddDialog {
    #[default]
    Closed,
    Open {
        supplier_id: SupplierId,
    },
}

pub struct TableView {
    sync: InventorySyncService,
    selection: Selection,
    dialog: AddDialog,
    notice: Option<Notice>,
    auto_hide: Duration,
}

impl TableView {
    pub fn new(sync: InventorySyncService, auto_hide: std::time::Duration) -> Self {
        Self {
            sync,
            selection: Selection::new(),
            dialog: AddDialog::Closed,
            notice: None,
            auto_hide: Duration::from_std(auto_hide)
                .unwrap_or_else(|_| Duration::milliseconds(DEFAULT_AUTO_HIDE_MS)),
        }
    }

    pub fn sync(&self) -> &InventorySyncService {
        &self.sync
    }

    /// Hydrates the mirror. Selection from a previous load is discarded.
    pub async fn load(&mut self) -> Result<HydrationReport, ServiceError> {
        self.selection.clear();
        self.sync.hydrate().await.map_err(|e| {
            error!("Error fetching suppliers: {}", e);
            e
        })
    }

    pub fn dialog(&self) -> &AddDialog {
        &self.dialog
    }

    pub fn open_add_dialog(&mut self, supplier_id: SupplierId) {
        self.dialog = AddDialog::Open { supplier_id };
    }

    pub fn close_add_dialog(&mut self) {
        self.dialog = AddDialog::Closed;
    }

    /// Submits the add dialog. The dialog closes whatever the outcome.
    pub async fn submit_add_form(&mut self, form: AddProductForm) -> Result<Product, ServiceError> {
        let supplier_id = match std::mem::take(&mut self.dialog) {
            AddDialog::Open { supplier_id } => supplier_id,
            AddDialog::Closed => {
                return Err(ServiceError::Validation("add dialog is not open".to_string()))
            }
        };

        let result = self.sync.create_product(supplier_id, form).await;
        self.notice = Some(match &result {
            Ok(_) => Notice::success(PRODUCT_CREATED),
            Err(e) => {
                error!("Error creating product: {}", e);
                Notice::error(PRODUCT_CREATE_FAILED)
            }
        });
        result
    }

    /// Commits the text of an inline input for one product field.
    pub async fn commit_edit(
        &mut self,
        product_id: ProductId,
        field: ProductField,
        raw: &str,
    ) -> Result<UpdateOutcome, ServiceError> {
        let result = self
            .sync
            .update_field_from_input(product_id, field, raw)
            .await;
        match &result {
            Ok(UpdateOutcome::Updated(_)) => self.notice = Some(Notice::field_updated(field)),
            Ok(UpdateOutcome::Unchanged) => {}
            Err(ServiceError::EditInProgress) => {
                warn!(%field, "edit ignored while another update is in flight");
            }
            Err(ServiceError::Validation(message)) => {
                self.notice = Some(Notice::error(message.clone()))
            }
            // Nothing reached the store, so the error itself says what to fix.
            Err(e) if e.is_local() => self.notice = Some(Notice::error(e.to_string())),
            Err(e) => {
                error!("Error updating product: {}", e);
                self.notice = Some(Notice::error(PRODUCT_UPDATE_FAILED));
            }
        }
        result
    }

    /// Inline inputs are disabled on every row while an update is in flight.
    pub fn inputs_disabled(&self) -> bool {
        self.sync.is_editing()
    }

    pub fn click_row(
        &mut self,
        supplier_id: &SupplierId,
        product_id: &ProductId,
        target: ClickTarget,
    ) -> Option<bool> {
        self.selection.click(supplier_id, product_id, target)
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Deletes everything selected, across suppliers, one product at a time.
    ///
    /// Deleted products leave the selection. The failed product and anything
    /// after it stay selected.
    pub async fn delete_selected(&mut self) -> Result<BatchDeleteReport, ServiceError> {
        if self.selection.is_empty() {
            return Ok(BatchDeleteReport::default());
        }

        let result = self.sync.delete_products(self.selection.batch()).await;
        match &result {
            Ok(report) => {
                self.selection.prune(&report.deleted);
                self.notice = Some(if report.is_complete() {
                    Notice::success(PRODUCTS_DELETED)
                } else {
                    Notice::error(PRODUCT_DELETE_FAILED)
                });
            }
            Err(e) => {
                error!("Error deleting products: {}", e);
                self.notice = Some(Notice::error(PRODUCT_DELETE_FAILED));
            }
        }
        result
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Hides the notice once it has been visible for the auto-hide period.
    /// Returns true when a notice was hidden.
    pub fn expire_notice(&mut self, now: DateTime<Utc>) -> bool {
        match &self.notice {
            Some(notice) if notice.is_expired(self.auto_hide, now) => {
                self.notice = None;
                true
            }
            _ => false,
        }
    }

    pub async fn cards(&self) -> Vec<SupplierCard> {
        build_cards(&self.sync.snapshot().await, &self.selection)
    }
}
