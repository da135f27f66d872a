// src/services/document_service.rs

use genpdf::{elements, style, Element};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::EstimatorRepository,
    models::estimator::{Proposal, ProposalLineItem},
};

const FONT_FAMILY: &str = "Roboto";

fn money(value: Decimal) -> String {
    format!("$ {:.2}", value.round_dp(2))
}

fn pdf_error(e: impl std::fmt::Display) -> AppError {
    AppError::InternalServerError(anyhow::anyhow!("Falha ao gerar PDF: {}", e))
}

#[derive(Clone)]
pub struct DocumentService {
    repo: EstimatorRepository,
    fonts_dir: String,
    pool: PgPool,
}

impl DocumentService {
    pub fn new(repo: EstimatorRepository, fonts_dir: String, pool: PgPool) -> Self {
        Self { repo, fonts_dir, pool }
    }

    pub async fn proposal_pdf(&self, tenant_id: Uuid, proposal_id: Uuid) -> Result<Vec<u8>, AppError> {
        // 1. Busca os Dados
        let mut tx = self.pool.begin().await?;
        let proposal = self
            .repo
            .find_proposal(&mut *tx, tenant_id, proposal_id)
            .await?
            .ok_or_else(|| AppError::not_found("Proposta"))?;
        let items = self.repo.proposal_lines(&mut *tx, tenant_id, proposal.id).await?;
        tx.commit().await?;

        // 2. Renderiza fora do runtime (genpdf é síncrono)
        let fonts_dir = self.fonts_dir.clone();
        tokio::task::spawn_blocking(move || render_proposal(&fonts_dir, &proposal, &items))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de PDF: {}", e))?
    }
}

fn render_proposal(fonts_dir: &str, proposal: &Proposal, items: &[ProposalLineItem]) -> Result<Vec<u8>, AppError> {
    let font_family = genpdf::fonts::from_files(fonts_dir, FONT_FAMILY, None).map_err(|e| {
        AppError::InternalServerError(anyhow::anyhow!(
            "Fonte {} não encontrada em {}: {}",
            FONT_FAMILY,
            fonts_dir,
            e
        ))
    })?;

    let mut doc = genpdf::Document::new(font_family);
    doc.set_title(format!("Proposta - {}", proposal.title));
    let mut decorator = genpdf::SimplePageDecorator::new();
    decorator.set_margins(10);
    doc.set_page_decorator(decorator);

    // --- CABEÇALHO ---
    doc.push(elements::Paragraph::new("PROPOSTA COMERCIAL").styled(style::Style::new().bold().with_font_size(18)));
    doc.push(elements::Paragraph::new(proposal.title.clone()).styled(style::Style::new().bold().with_font_size(14)));
    doc.push(elements::Paragraph::new(format!("Data: {}", proposal.created_at.format("%d/%m/%Y"))));
    doc.push(elements::Paragraph::new(format!("Status: {:?}", proposal.status)));
    doc.push(elements::Break::new(2));

    // --- TABELA DE ITENS ---
    // Pesos das colunas: Descrição (4), Qtd (1), Unitário (2), Total (2)
    let mut table = elements::TableLayout::new(vec![4, 1, 2, 2]);
    table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

    let bold = style::Style::new().bold();
    table
        .row()
        .element(elements::Paragraph::new("Descrição").styled(bold))
        .element(elements::Paragraph::new("Qtd").styled(bold))
        .element(elements::Paragraph::new("Unitário").styled(bold))
        .element(elements::Paragraph::new("Total").styled(bold))
        .push()
        .map_err(pdf_error)?;

    for item in items {
        table
            .row()
            .element(elements::Paragraph::new(item.description.clone()))
            .element(elements::Paragraph::new(format!("{}", item.quantity.normalize())))
            .element(elements::Paragraph::new(money(item.unit_price)))
            .element(elements::Paragraph::new(money(item.line_total)))
            .push()
            .map_err(pdf_error)?;
    }

    doc.push(table);
    doc.push(elements::Break::new(2));

    // --- TOTAIS ---
    let mut subtotal = elements::Paragraph::new(format!("Subtotal: {}", money(proposal.subtotal)));
    subtotal.set_alignment(genpdf::Alignment::Right);
    doc.push(subtotal);

    let mut tax = elements::Paragraph::new(format!("Impostos ({}%)", proposal.tax_rate.normalize()));
    tax.set_alignment(genpdf::Alignment::Right);
    doc.push(tax);

    let mut total = elements::Paragraph::new(format!("TOTAL: {}", money(proposal.total)));
    total.set_alignment(genpdf::Alignment::Right);
    doc.push(total.styled(style::Style::new().bold().with_font_size(12)));

    // 3. Renderiza para Buffer (Memória)
    let mut buffer = Vec::new();
    doc.render(&mut buffer).map_err(pdf_error)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn money_always_has_two_places() {
        assert_eq!(money(dec!(12.5)), "$ 12.50");
        assert_eq!(money(dec!(3119.375)), "$ 3119.38");
    }

    #[test]
    fn missing_fonts_are_an_internal_error() {
        let dir = tempfile::tempdir().unwrap();
        let proposal = Proposal {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            account_id: None,
            estimate_id: None,
            title: "Tune-up".into(),
            status: crate::models::estimator::ProposalStatus::Draft,
            subtotal: dec!(100),
            tax_rate: dec!(0),
            total: dec!(100),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        let err = render_proposal(dir.path().to_str().unwrap(), &proposal, &[]).unwrap_err();
        assert!(matches!(err, AppError::InternalServerError(_)));
    }
}
