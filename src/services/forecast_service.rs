// src/services/forecast_service.rs

use std::{collections::HashMap, time::Duration};

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::InventoryRepository,
    models::inventory::{DemandSample, Forecast, LedgerDirection},
};

/// Movimentos mais recentes considerados por SKU.
pub const SAMPLE_SIZE: i64 = 30;
/// Janela de histórico, em dias.
pub const WINDOW_DAYS: i32 = 60;
/// Divisor fixo da demanda média diária.
pub const DEMAND_DIVISOR: i64 = 30;
pub const LEAD_TIME_DAYS: i32 = 7;
/// 1.65
pub const SAFETY_FACTOR: Decimal = Decimal::from_parts(165, 0, 0, false, 2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForecastFigures {
    pub avg_daily_demand: Decimal,
    pub reorder_point: Decimal,
    pub suggested_order_qty: Decimal,
}

/// Heurística de ponto de pedido: só as saídas (OUT) contam como demanda.
pub fn compute_forecast<'a, I>(samples: I) -> ForecastFigures
where
    I: IntoIterator<Item = &'a DemandSample>,
{
    let out_sum: Decimal = samples
        .into_iter()
        .filter(|s| s.direction == LedgerDirection::Out)
        .map(|s| s.quantity)
        .sum();

    let avg_daily_demand = out_sum / Decimal::from(DEMAND_DIVISOR);
    let reorder_point = avg_daily_demand * Decimal::from(LEAD_TIME_DAYS) * SAFETY_FACTOR;

    ForecastFigures {
        avg_daily_demand: avg_daily_demand.round_dp(4),
        reorder_point: reorder_point.round_dp(4),
        suggested_order_qty: reorder_point.ceil(),
    }
}

#[derive(Clone)]
pub struct ForecastService {
    inventory_repo: InventoryRepository,
    pool: PgPool,
}

impl ForecastService {
    pub fn new(inventory_repo: InventoryRepository, pool: PgPool) -> Self {
        Self { inventory_repo, pool }
    }

    /// Recalcula a previsão de todos os SKUs do tenant (inclusive os sem demanda).
    pub async fn run_for_tenant(&self, tenant_id: Uuid) -> Result<Vec<Forecast>, AppError> {
        let mut tx = self.pool.begin().await?;

        let sku_ids = self.inventory_repo.list_sku_ids(&mut *tx, tenant_id).await?;
        let samples = self
            .inventory_repo
            .recent_demand_samples(&mut *tx, tenant_id, WINDOW_DAYS, SAMPLE_SIZE)
            .await?;

        let mut by_sku: HashMap<Uuid, Vec<DemandSample>> = HashMap::new();
        for sample in samples {
            by_sku.entry(sample.sku_id).or_default().push(sample);
        }

        let mut forecasts = Vec::with_capacity(sku_ids.len());
        for sku_id in sku_ids {
            let figures = compute_forecast(by_sku.get(&sku_id).into_iter().flatten());
            let forecast = self
                .inventory_repo
                .upsert_forecast(
                    &mut *tx,
                    tenant_id,
                    sku_id,
                    figures.avg_daily_demand,
                    LEAD_TIME_DAYS,
                    SAFETY_FACTOR,
                    figures.reorder_point,
                    figures.suggested_order_qty,
                )
                .await?;
            forecasts.push(forecast);
        }

        tx.commit().await?;

        tracing::info!(%tenant_id, skus = forecasts.len(), "Previsão de demanda recalculada");
        Ok(forecasts)
    }

    /// Roda para cada tenant ativo com SKUs. A falha de um tenant não interrompe os demais.
    pub async fn run_all_tenants(&self) -> Result<usize, AppError> {
        let tenants = self.inventory_repo.tenants_with_skus().await?;
        let mut ok = 0;
        for tenant_id in tenants {
            match self.run_for_tenant(tenant_id).await {
                Ok(_) => ok += 1,
                Err(e) => tracing::error!(%tenant_id, "Falha ao recalcular previsão: {}", e),
            }
        }
        Ok(ok)
    }

    pub async fn list_forecasts(&self, tenant_id: Uuid) -> Result<Vec<Forecast>, AppError> {
        self.inventory_repo.list_forecasts(&self.pool, tenant_id).await
    }

    /// Laço do agendador. Roda até o processo terminar.
    pub async fn run_scheduler(self, every: Duration) {
        let mut ticker = tokio::time::interval(every);
        // O primeiro tick é imediato; pulamos para não disputar com o boot.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match self.run_all_tenants().await {
                Ok(count) => tracing::info!(tenants = count, "Job de previsão concluído"),
                Err(e) => tracing::error!("Job de previsão falhou: {}", e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample(direction: LedgerDirection, quantity: Decimal) -> DemandSample {
        DemandSample {
            sku_id: Uuid::nil(),
            direction,
            quantity,
        }
    }

    #[test]
    fn safety_factor_is_one_point_six_five() {
        assert_eq!(SAFETY_FACTOR, dec!(1.65));
    }

    #[test]
    fn no_demand_yields_zero_forecast() {
        let figures = compute_forecast(&Vec::<DemandSample>::new());
        assert_eq!(figures.avg_daily_demand, Decimal::ZERO);
        assert_eq!(figures.reorder_point, Decimal::ZERO);
        assert_eq!(figures.suggested_order_qty, Decimal::ZERO);
    }

    #[test]
    fn only_outbound_rows_count_as_demand() {
        let rows = vec![
            sample(LedgerDirection::In, dec!(100)),
            sample(LedgerDirection::Out, dec!(20)),
            sample(LedgerDirection::Out, dec!(10)),
        ];
        let figures = compute_forecast(&rows);
        assert_eq!(figures.avg_daily_demand, dec!(1));
        assert_eq!(figures.reorder_point, dec!(11.55));
        assert_eq!(figures.suggested_order_qty, dec!(12));
    }

    #[test]
    fn suggested_quantity_rounds_up() {
        let rows = vec![sample(LedgerDirection::Out, dec!(60))];
        let figures = compute_forecast(&rows);
        assert_eq!(figures.avg_daily_demand, dec!(2));
        assert_eq!(figures.reorder_point, dec!(23.1));
        assert_eq!(figures.suggested_order_qty, dec!(24));
    }
}
