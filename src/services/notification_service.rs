// src/services/notification_service.rs

use std::{collections::HashMap, sync::Arc};

use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{PageQuery, Paginated},
    },
    db::NotificationRepository,
    models::notifications::{
        Delivery, MarkedRead, Notification, NotificationFilter, NotificationKind, NotificationPreference,
        UpdatePreferencePayload,
    },
};

const CHANNEL_CAPACITY: usize = 32;

/// Canais em memória, um por usuário conectado.
#[derive(Clone, Default)]
pub struct NotificationHub {
    channels: Arc<RwLock<Channels>>,
}

impl NotificationHub {
    pub async fn subscribe(&self, user_id: Uuid) -> broadcast::Receiver<Notification> {
        let mut channels = self.channels.write().await;
        channels
            .entry(user_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// `true` quando ao menos um cliente conectado recebeu.
    pub async fn push(&self, notification: &Notification) -> bool {
        let user_id = notification.user_id;
        {
            let channels = self.channels.read().await;
            match channels.get(&user_id) {
                Some(tx) if tx.receiver_count() > 0 => return tx.send(notification.clone()).is_ok(),
                None => return false,
                Some(_) => {}
            }
        }
        // Ninguém ouvindo na leitura: revalida sob a trava de escrita.
        let mut channels = self.channels.write().await;
        deliver_or_discard(&mut channels, notification)
    }
}

type Channels = HashMap<Uuid, broadcast::Sender<Notification>>;

/// Entrega se alguém assinou depois da leitura; senão descarta o canal.
fn deliver_or_discard(channels: &mut Channels, notification: &Notification) -> bool {
    let user_id = notification.user_id;
    if let Some(tx) = channels.get(&user_id) {
        if tx.receiver_count() > 0 {
            return tx.send(notification.clone()).is_ok();
        }
    }
    channels.remove(&user_id);
    false
}

/// Envio por e-mail (apenas registra no log).
#[derive(Clone, Default)]
pub struct EmailSender;

impl EmailSender {
    pub fn send(&self, notification: &Notification) {
        tracing::info!(user_id = %notification.user_id, title = %notification.title, "[email] notificação enviada");
    }
}

/// Envio por SMS (apenas registra no log).
#[derive(Clone, Default)]
pub struct SmsSender;

impl SmsSender {
    pub fn send(&self, notification: &Notification) {
        tracing::info!(user_id = %notification.user_id, title = %notification.title, "[sms] notificação enviada");
    }
}

#[derive(Clone)]
pub struct NotificationService {
    repo: NotificationRepository,
    hub: NotificationHub,
    email: EmailSender,
    sms: SmsSender,
}

impl NotificationService {
    pub fn new(repo: NotificationRepository, hub: NotificationHub) -> Self {
        Self {
            repo,
            hub,
            email: EmailSender,
            sms: SmsSender,
        }
    }

    /// Grava, tenta o push e aciona os canais externos conforme a preferência.
    /// Sem retry: quem não estava conectado lê depois pela listagem.
    pub async fn notify(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        kind: NotificationKind,
        title: &str,
        body: &str,
    ) -> Result<Delivery, AppError> {
        let notification = self.repo.insert(tenant_id, user_id, kind, title, body).await?;
        let pref = self.repo.find_preference(user_id).await?.unwrap_or_default();

        let pushed = if pref.in_app { self.hub.push(&notification).await } else { false };
        if pref.email {
            self.email.send(&notification);
        }
        if pref.sms {
            self.sms.send(&notification);
        }

        Ok(Delivery { notification, pushed })
    }

    /// Variante "dispara e esquece" usada pelos outros serviços.
    pub async fn notify_quietly(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        kind: NotificationKind,
        title: &str,
        body: &str,
    ) -> Option<Delivery> {
        match self.notify(tenant_id, user_id, kind, title, body).await {
            Ok(delivery) => Some(delivery),
            Err(e) => {
                tracing::warn!(%tenant_id, %user_id, "Falha ao notificar: {}", e);
                None
            }
        }
    }

    pub async fn list(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        filter: &NotificationFilter,
        query: &PageQuery,
    ) -> Result<Paginated<Notification>, AppError> {
        let (rows, total) = self
            .repo
            .list_for_user(tenant_id, user_id, filter.unread_only, query.page_size(), query.offset())
            .await?;
        Ok(Paginated::new(rows, total, query))
    }

    pub async fn mark_read(&self, tenant_id: Uuid, user_id: Uuid, id: Uuid) -> Result<Notification, AppError> {
        self.repo
            .mark_read(tenant_id, user_id, id)
            .await?
            .ok_or_else(|| AppError::not_found("Notificação"))
    }

    pub async fn mark_all_read(&self, tenant_id: Uuid, user_id: Uuid) -> Result<MarkedRead, AppError> {
        let updated = self.repo.mark_all_read(tenant_id, user_id).await?;
        Ok(MarkedRead { updated })
    }

    pub async fn preferences(&self, user_id: Uuid) -> Result<NotificationPreference, AppError> {
        Ok(self.repo.find_preference(user_id).await?.unwrap_or_default())
    }

    pub async fn update_preferences(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        payload: &UpdatePreferencePayload,
    ) -> Result<NotificationPreference, AppError> {
        let current = self.preferences(user_id).await?;
        self.repo.upsert_preference(tenant_id, user_id, current.merge(payload)).await
    }

    pub async fn subscribe(&self, user_id: Uuid) -> broadcast::Receiver<Notification> {
        self.hub.subscribe(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn notification(user_id: Uuid) -> Notification {
        Notification {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            user_id,
            kind: NotificationKind::Dispatch,
            title: "Nova visita".into(),
            body: "Você foi escalado.".into(),
            read_at: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn push_without_subscriber_reports_false() {
        let hub = NotificationHub::default();
        assert!(!hub.push(&notification(Uuid::new_v4())).await);
    }

    #[tokio::test]
    async fn subscriber_receives_its_own_notifications() {
        let hub = NotificationHub::default();
        let user = Uuid::new_v4();
        let mut rx = hub.subscribe(user).await;

        let sent = notification(user);
        assert!(hub.push(&sent).await);
        assert_eq!(rx.recv().await.unwrap().id, sent.id);

        // Outro usuário não recebe nada.
        assert!(!hub.push(&notification(Uuid::new_v4())).await);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn late_subscriber_keeps_the_channel() {
        let hub = NotificationHub::default();
        let user = Uuid::new_v4();
        // Assinou entre a leitura sem ouvintes e a trava de escrita.
        let mut rx = hub.subscribe(user).await;

        let sent = notification(user);
        let mut channels = hub.channels.write().await;
        assert!(deliver_or_discard(&mut channels, &sent));
        assert!(channels.contains_key(&user));
        drop(channels);

        assert_eq!(rx.recv().await.unwrap().id, sent.id);
    }

    #[tokio::test]
    async fn idle_channel_is_discarded_under_the_write_lock() {
        let hub = NotificationHub::default();
        let user = Uuid::new_v4();
        drop(hub.subscribe(user).await);

        let mut channels = hub.channels.write().await;
        assert!(!deliver_or_discard(&mut channels, &notification(user)));
        assert!(channels.is_empty());
    }

    #[tokio::test]
    async fn dropped_subscriber_channel_is_discarded() {
        let hub = NotificationHub::default();
        let user = Uuid::new_v4();
        drop(hub.subscribe(user).await);

        assert!(!hub.push(&notification(user)).await);
        assert!(hub.channels.read().await.is_empty());
    }
}
