//! Shared rendering for selection rows and parameter form fields.

use ratatui::text::{Line, Span};

use stratdesk_core::forms::FieldKind;

use crate::app::{Catalog, FieldRow, SelectionPanel};
use crate::theme;

const RANGE_PARTS: [&str; 3] = ["min", "max", "step"];

/// One line per navigable row, with cursor and edit highlighting.
pub fn selection_lines(sel: &SelectionPanel, catalog: &Catalog) -> Vec<Line<'static>> {
    sel.rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let active = i == sel.cursor;
            let editing = active && sel.edit.is_some();

            let label = match row {
                FieldRow::Param(idx) => sel
                    .form
                    .fields
                    .get(*idx)
                    .map(|f| f.name.clone())
                    .unwrap_or_default(),
                other => other.label().to_string(),
            };

            let value = if editing {
                let edit = sel.edit.as_ref().unwrap();
                if matches!(row, FieldRow::Param(idx)
                    if matches!(sel.form.fields.get(*idx).map(|f| &f.kind), Some(FieldKind::Range { .. })))
                {
                    format!("{}: {}▌", RANGE_PARTS[edit.part.min(2) as usize], edit.buffer)
                } else {
                    format!("{}▌", edit.buffer)
                }
            } else {
                row_value(sel, catalog, *row)
            };

            let style = if editing {
                theme::editing()
            } else if active {
                theme::selected()
            } else {
                theme::text()
            };

            Line::from(vec![
                Span::styled(format!("{label:>18}: "), theme::muted()),
                Span::styled(value, style),
            ])
        })
        .collect()
}

fn row_value(sel: &SelectionPanel, catalog: &Catalog, row: FieldRow) -> String {
    match row {
        FieldRow::Exchange => sel.ctx.exchange.clone(),
        FieldRow::Symbol => {
            if sel.ctx.symbol.is_empty() {
                "(none)".into()
            } else {
                sel.ctx.symbol.clone()
            }
        }
        FieldRow::Timeframe => sel.ctx.timeframe.ui_token().into(),
        FieldRow::Strategy => catalog
            .strategy(sel.ctx.strategy_id.as_deref())
            .map(|s| s.name.clone())
            .unwrap_or_else(|| "(raw chart)".into()),
        FieldRow::StartDate => sel.ctx.start_date.format("%Y-%m-%d").to_string(),
        FieldRow::EndDate => sel.ctx.end_date.format("%Y-%m-%d").to_string(),
        FieldRow::Capital => format!("{:.0}", sel.ctx.initial_capital),
        FieldRow::Metric => sel.ctx.metric_to_optimize.clone(),
        FieldRow::Param(idx) => sel
            .form
            .fields
            .get(idx)
            .map(|f| f.display_value())
            .unwrap_or_default(),
    }
}
