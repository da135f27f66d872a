// src/services/work_order_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{PageQuery, Paginated},
    },
    db::{CrmRepository, UserRepository, WorkOrderRepository},
    models::{
        notifications::NotificationKind,
        work_orders::{CreateWorkOrderPayload, UpdateWorkOrderPayload, WorkOrder, WorkOrderFilter, WorkOrderStatus},
    },
    services::notification_service::NotificationService,
};

#[derive(Clone)]
pub struct WorkOrderService {
    work_order_repo: WorkOrderRepository,
    crm_repo: CrmRepository,
    user_repo: UserRepository,
    notifications: NotificationService,
    pool: PgPool,
}

impl WorkOrderService {
    pub fn new(
        work_order_repo: WorkOrderRepository,
        crm_repo: CrmRepository,
        user_repo: UserRepository,
        notifications: NotificationService,
        pool: PgPool,
    ) -> Self {
        Self {
            work_order_repo,
            crm_repo,
            user_repo,
            notifications,
            pool,
        }
    }

    pub async fn create(&self, tenant_id: Uuid, payload: &CreateWorkOrderPayload) -> Result<WorkOrder, AppError> {
        self.check_references(tenant_id, payload.account_id, payload.assigned_to).await?;

        let work_order = self.work_order_repo.create(&self.pool, tenant_id, payload).await?;

        if let Some(assignee) = work_order.assigned_to {
            self.notify_assignee(tenant_id, assignee, &work_order).await;
        }
        Ok(work_order)
    }

    pub async fn list(
        &self,
        tenant_id: Uuid,
        filter: &WorkOrderFilter,
        query: &PageQuery,
    ) -> Result<Paginated<WorkOrder>, AppError> {
        let search = query.search_pattern();
        let mut tx = self.pool.begin().await?;
        let rows = self
            .work_order_repo
            .list(&mut *tx, tenant_id, filter, search.as_deref(), query.page_size(), query.offset())
            .await?;
        let total = self
            .work_order_repo
            .count(&mut *tx, tenant_id, filter, search.as_deref())
            .await?;
        tx.commit().await?;
        Ok(Paginated::new(rows, total, query))
    }

    pub async fn get(&self, tenant_id: Uuid, id: Uuid) -> Result<WorkOrder, AppError> {
        self.work_order_repo
            .find(&self.pool, tenant_id, id)
            .await?
            .ok_or_else(|| AppError::not_found("Ordem de serviço"))
    }

    pub async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        payload: &UpdateWorkOrderPayload,
    ) -> Result<WorkOrder, AppError> {
        self.check_references(tenant_id, payload.account_id, payload.assigned_to).await?;

        let before = self.get(tenant_id, id).await?;
        let work_order = self
            .work_order_repo
            .update(&self.pool, tenant_id, id, payload)
            .await?
            .ok_or_else(|| AppError::not_found("Ordem de serviço"))?;

        // Só avisa quando o responsável mudou.
        if let Some(assignee) = work_order.assigned_to {
            if before.assigned_to != Some(assignee) {
                self.notify_assignee(tenant_id, assignee, &work_order).await;
            }
        }
        Ok(work_order)
    }

    pub async fn change_status(&self, tenant_id: Uuid, id: Uuid, next: WorkOrderStatus) -> Result<WorkOrder, AppError> {
        let mut tx = self.pool.begin().await?;

        let current = self
            .work_order_repo
            .find_for_update(&mut *tx, tenant_id, id)
            .await?
            .ok_or_else(|| AppError::not_found("Ordem de serviço"))?;

        if !current.status.can_transition_to(next) {
            return Err(AppError::BadRequest(format!(
                "Transição inválida: {:?} -> {:?}.",
                current.status, next
            )));
        }

        let work_order = self.work_order_repo.set_status(&mut *tx, tenant_id, id, next).await?;
        tx.commit().await?;

        tracing::info!(%tenant_id, work_order_id = %id, from = ?current.status, to = ?next, "Status da OS alterado");
        Ok(work_order)
    }

    pub async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let affected = self.work_order_repo.delete(&self.pool, tenant_id, id).await?;
        if affected == 0 {
            return Err(AppError::not_found("Ordem de serviço"));
        }
        Ok(())
    }

    async fn check_references(
        &self,
        tenant_id: Uuid,
        account_id: Option<Uuid>,
        assigned_to: Option<Uuid>,
    ) -> Result<(), AppError> {
        if let Some(account_id) = account_id {
            if !self.crm_repo.account_exists(&self.pool, tenant_id, account_id).await? {
                return Err(AppError::BadRequest("Conta inválida para esta empresa.".into()));
            }
        }
        if let Some(user_id) = assigned_to {
            if self.user_repo.find_in_tenant(&self.pool, tenant_id, user_id).await?.is_none() {
                return Err(AppError::BadRequest("Técnico inválido para esta empresa.".into()));
            }
        }
        Ok(())
    }

    async fn notify_assignee(&self, tenant_id: Uuid, assignee: Uuid, work_order: &WorkOrder) {
        self.notifications
            .notify_quietly(
                tenant_id,
                assignee,
                NotificationKind::WorkOrder,
                "Nova ordem de serviço atribuída",
                &work_order.title,
            )
            .await;
    }
}
