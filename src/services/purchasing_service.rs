// src/services/purchasing_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{PageQuery, Paginated},
    },
    db::{InventoryRepository, PurchasingRepository, VendorRepository},
    models::{
        inventory::LedgerDirection,
        notifications::NotificationKind,
        purchasing::{CreatePurchaseOrderPayload, PurchaseOrder, PurchaseOrderFilter, PurchaseOrderStatus},
    },
    services::notification_service::NotificationService,
};

#[derive(Clone)]
pub struct PurchasingService {
    purchasing_repo: PurchasingRepository,
    inventory_repo: InventoryRepository,
    vendor_repo: VendorRepository,
    notifications: NotificationService,
    pool: PgPool,
}

impl PurchasingService {
    pub fn new(
        purchasing_repo: PurchasingRepository,
        inventory_repo: InventoryRepository,
        vendor_repo: VendorRepository,
        notifications: NotificationService,
        pool: PgPool,
    ) -> Self {
        Self {
            purchasing_repo,
            inventory_repo,
            vendor_repo,
            notifications,
            pool,
        }
    }

    pub async fn create(
        &self,
        tenant_id: Uuid,
        payload: &CreatePurchaseOrderPayload,
    ) -> Result<PurchaseOrder, AppError> {
        let mut tx = self.pool.begin().await?;

        if !self.inventory_repo.sku_exists(&mut *tx, tenant_id, payload.sku_id).await? {
            return Err(AppError::BadRequest("SKU inválido para esta empresa.".into()));
        }
        if let Some(vendor_id) = payload.vendor_id {
            if !self.vendor_repo.exists(&mut *tx, tenant_id, vendor_id).await? {
                return Err(AppError::BadRequest("Fornecedor inválido para esta empresa.".into()));
            }
        }

        let order = self.purchasing_repo.create(&mut *tx, tenant_id, payload).await?;
        tx.commit().await?;
        Ok(order)
    }

    pub async fn list(
        &self,
        tenant_id: Uuid,
        filter: &PurchaseOrderFilter,
        query: &PageQuery,
    ) -> Result<Paginated<PurchaseOrder>, AppError> {
        let mut tx = self.pool.begin().await?;
        let rows = self
            .purchasing_repo
            .list(&mut *tx, tenant_id, filter.status, query.page_size(), query.offset())
            .await?;
        let total = self.purchasing_repo.count(&mut *tx, tenant_id, filter.status).await?;
        tx.commit().await?;
        Ok(Paginated::new(rows, total, query))
    }

    pub async fn get(&self, tenant_id: Uuid, id: Uuid) -> Result<PurchaseOrder, AppError> {
        self.purchasing_repo
            .find(&self.pool, tenant_id, id)
            .await?
            .ok_or_else(|| AppError::not_found("Pedido de compra"))
    }

    /// OPEN -> RECEIVED, lançando a entrada no estoque na mesma transação.
    pub async fn receive(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        id: Uuid,
        bin_id: Uuid,
    ) -> Result<PurchaseOrder, AppError> {
        let mut tx = self.pool.begin().await?;

        let order = self
            .purchasing_repo
            .find_for_update(&mut *tx, tenant_id, id)
            .await?
            .ok_or_else(|| AppError::not_found("Pedido de compra"))?;
        ensure_transition(order.status, PurchaseOrderStatus::Received)?;

        if self.inventory_repo.find_bin(&mut *tx, tenant_id, bin_id).await?.is_none() {
            return Err(AppError::BadRequest("Posição inválida para esta empresa.".into()));
        }

        let reference = format!("PO-{}", order.id);
        self.inventory_repo
            .insert_ledger_entry(
                &mut *tx,
                tenant_id,
                order.sku_id,
                bin_id,
                LedgerDirection::In,
                order.quantity,
                Some(&reference),
                Some(user_id),
            )
            .await?;

        let order = self
            .purchasing_repo
            .set_status(&mut *tx, tenant_id, order.id, PurchaseOrderStatus::Received)
            .await?;

        tx.commit().await?;

        tracing::info!(%tenant_id, po_id = %order.id, quantity = %order.quantity, "Pedido de compra recebido");

        self.notifications
            .notify_quietly(
                tenant_id,
                user_id,
                NotificationKind::Purchasing,
                "Pedido de compra recebido",
                &format!("{} unidade(s) lançadas no estoque.", order.quantity),
            )
            .await;

        Ok(order)
    }

    pub async fn cancel(&self, tenant_id: Uuid, user_id: Uuid, id: Uuid) -> Result<PurchaseOrder, AppError> {
        let mut tx = self.pool.begin().await?;

        let order = self
            .purchasing_repo
            .find_for_update(&mut *tx, tenant_id, id)
            .await?
            .ok_or_else(|| AppError::not_found("Pedido de compra"))?;
        ensure_transition(order.status, PurchaseOrderStatus::Cancelled)?;

        let order = self
            .purchasing_repo
            .set_status(&mut *tx, tenant_id, order.id, PurchaseOrderStatus::Cancelled)
            .await?;
        tx.commit().await?;

        self.notifications
            .notify_quietly(
                tenant_id,
                user_id,
                NotificationKind::Purchasing,
                "Pedido de compra cancelado",
                &format!("O pedido {} foi cancelado.", order.id),
            )
            .await;

        Ok(order)
    }
}

fn ensure_transition(from: PurchaseOrderStatus, to: PurchaseOrderStatus) -> Result<(), AppError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "Não é possível mudar um pedido de {:?} para {:?}.",
            from, to
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn received_orders_cannot_be_cancelled() {
        let err = ensure_transition(PurchaseOrderStatus::Received, PurchaseOrderStatus::Cancelled).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert!(ensure_transition(PurchaseOrderStatus::Open, PurchaseOrderStatus::Received).is_ok());
    }
}
