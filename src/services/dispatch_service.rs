// src/services/dispatch_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{DispatchRepository, UserRepository, WorkOrderRepository},
    models::{
        dispatch::{
            validate_window, CreateDispatchSlotPayload, DispatchFilter, DispatchSlot, DispatchStatus,
            UpdateDispatchSlotPayload,
        },
        notifications::NotificationKind,
    },
    services::notification_service::NotificationService,
};

#[derive(Clone)]
pub struct DispatchService {
    dispatch_repo: DispatchRepository,
    work_order_repo: WorkOrderRepository,
    user_repo: UserRepository,
    notifications: NotificationService,
    pool: PgPool,
}

impl DispatchService {
    pub fn new(
        dispatch_repo: DispatchRepository,
        work_order_repo: WorkOrderRepository,
        user_repo: UserRepository,
        notifications: NotificationService,
        pool: PgPool,
    ) -> Self {
        Self {
            dispatch_repo,
            work_order_repo,
            user_repo,
            notifications,
            pool,
        }
    }

    pub async fn create(&self, tenant_id: Uuid, payload: &CreateDispatchSlotPayload) -> Result<DispatchSlot, AppError> {
        if !self.work_order_repo.exists(&self.pool, tenant_id, payload.work_order_id).await? {
            return Err(AppError::BadRequest("Ordem de serviço inválida para esta empresa.".into()));
        }
        self.check_technician(tenant_id, payload.technician_id).await?;

        let slot = self.dispatch_repo.create(&self.pool, tenant_id, payload).await?;

        if let Some(technician) = slot.technician_id {
            self.notify_technician(tenant_id, technician, &slot).await;
        }
        Ok(slot)
    }

    pub async fn list(&self, tenant_id: Uuid, filter: &DispatchFilter) -> Result<Vec<DispatchSlot>, AppError> {
        self.dispatch_repo.list(&self.pool, tenant_id, filter).await
    }

    pub async fn get(&self, tenant_id: Uuid, id: Uuid) -> Result<DispatchSlot, AppError> {
        self.dispatch_repo
            .find(&self.pool, tenant_id, id)
            .await?
            .ok_or_else(|| AppError::not_found("Agendamento"))
    }

    pub async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        payload: &UpdateDispatchSlotPayload,
    ) -> Result<DispatchSlot, AppError> {
        let current = self.get(tenant_id, id).await?;
        self.check_technician(tenant_id, payload.technician_id).await?;

        // A janela resultante (parcial + atual) precisa continuar válida.
        let starts_at = payload.starts_at.unwrap_or(current.starts_at);
        let ends_at = payload.ends_at.unwrap_or(current.ends_at);
        validate_window(starts_at, ends_at).map_err(|e| {
            AppError::BadRequest(
                e.message
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "Janela inválida.".to_string()),
            )
        })?;

        let slot = self
            .dispatch_repo
            .update(
                &self.pool,
                tenant_id,
                id,
                payload.technician_id,
                starts_at,
                ends_at,
                payload.notes.as_deref(),
            )
            .await?
            .ok_or_else(|| AppError::not_found("Agendamento"))?;

        if let Some(technician) = slot.technician_id {
            if current.technician_id != Some(technician) {
                self.notify_technician(tenant_id, technician, &slot).await;
            }
        }
        Ok(slot)
    }

    pub async fn change_status(&self, tenant_id: Uuid, id: Uuid, next: DispatchStatus) -> Result<DispatchSlot, AppError> {
        let current = self.get(tenant_id, id).await?;
        if is_closed(current.status) {
            return Err(AppError::BadRequest(format!(
                "O agendamento já está {:?} e não pode mudar.",
                current.status
            )));
        }

        self.dispatch_repo
            .set_status(&self.pool, tenant_id, id, next)
            .await?
            .ok_or_else(|| AppError::not_found("Agendamento"))
    }

    pub async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let affected = self.dispatch_repo.delete(&self.pool, tenant_id, id).await?;
        if affected == 0 {
            return Err(AppError::not_found("Agendamento"));
        }
        Ok(())
    }

    async fn check_technician(&self, tenant_id: Uuid, technician_id: Option<Uuid>) -> Result<(), AppError> {
        if let Some(user_id) = technician_id {
            if self.user_repo.find_in_tenant(&self.pool, tenant_id, user_id).await?.is_none() {
                return Err(AppError::BadRequest("Técnico inválido para esta empresa.".into()));
            }
        }
        Ok(())
    }

    async fn notify_technician(&self, tenant_id: Uuid, technician: Uuid, slot: &DispatchSlot) {
        let body = format!(
            "Visita agendada de {} a {}.",
            slot.starts_at.format("%d/%m/%Y %H:%M"),
            slot.ends_at.format("%H:%M")
        );
        self.notifications
            .notify_quietly(tenant_id, technician, NotificationKind::Dispatch, "Novo agendamento", &body)
            .await;
    }
}

fn is_closed(status: DispatchStatus) -> bool {
    matches!(status, DispatchStatus::Completed | DispatchStatus::Cancelled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completed_and_cancelled_slots_are_closed() {
        assert!(is_closed(DispatchStatus::Completed));
        assert!(is_closed(DispatchStatus::Cancelled));
        assert!(!is_closed(DispatchStatus::EnRoute));
        assert!(!is_closed(DispatchStatus::Scheduled));
    }
}
