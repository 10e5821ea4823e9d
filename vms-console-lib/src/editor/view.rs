use std::fmt::Write;

use crate::locale::{LocaleTable, MessageKey};
use crate::types::{MappingRuleSet, Transformation};

const HEADERS: [&str; 5] = ["#", "소스 필드", "대상 필드", "변환 유형", "매개변수"];

fn parameters_cell(transformation: &Transformation) -> String {
    if transformation.parameters.is_empty() {
        return "-".to_string();
    }
    transformation
        .parameters
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Renders the channel-ID line and the transformation table of a rule set as plain text.
/// Missing rules render their empty-state messages instead of an empty table.
pub fn render_rules(rules: &MappingRuleSet, locale: &LocaleTable) -> String {
    let mut out = String::new();

    let channel_id_line = match &rules.channel_id_transformation {
        Some(rule) if !rule.source_field.is_empty() => {
            locale.format(MessageKey::ChannelIdSource, &[("field", rule.source_field.as_str())])
        }
        _ => locale.text(MessageKey::NoChannelIdTransformation).to_string(),
    };
    let _ = writeln!(out, "{}", channel_id_line);
    let _ = writeln!(out);

    if rules.transformations.is_empty() {
        let _ = writeln!(out, "{}", locale.text(MessageKey::NoTransformations));
        return out;
    }

    let rows: Vec<[String; 5]> = rules
        .transformations
        .iter()
        .enumerate()
        .map(|(index, t)| {
            [
                index.to_string(),
                t.source_field.clone(),
                t.target_field.clone(),
                t.transformation_type.as_str().to_string(),
                parameters_cell(t),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_row = |cells: &[String]| {
        cells
            .iter()
            .zip(widths.iter())
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let header: Vec<String> = HEADERS.iter().map(|h| h.to_string()).collect();
    let _ = writeln!(out, "{}", format_row(&header));
    for row in &rows {
        let _ = writeln!(out, "{}", format_row(row));
    }
    out
}
