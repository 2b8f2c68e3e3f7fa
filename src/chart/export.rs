use csv::Writer;

use super::records::ChartRecord;
use crate::error::ExportError;

const BASE_HEADERS: [&str; 4] = ["Idade", "Patrimonio", "Total_Poupado", "Fase"];
const SCENARIO_HEADERS: [&str; 3] = ["Cenario_Pessimista", "Cenario_Neutro", "Cenario_Otimista"];

pub fn sanitize_csv_value(value: &str) -> String {
    match value.chars().next() {
        Some('=' | '+' | '-' | '@') => format!("'{value}"),
        _ => value.to_string(),
    }
}

fn amount(value: f64) -> String {
    sanitize_csv_value(&format!("{value:.2}"))
}

/// Renders chart records as CSV. Scenario columns appear when the first
/// record carries Monte Carlo data.
pub fn export_csv(records: &[ChartRecord]) -> Result<String, ExportError> {
    let with_scenarios = records
        .first()
        .is_some_and(|record| record.monte_carlo.is_some());

    let mut writer = Writer::from_writer(Vec::new());

    let mut headers: Vec<&str> = BASE_HEADERS.to_vec();
    if with_scenarios {
        headers.extend(SCENARIO_HEADERS);
    }
    writer.write_record(headers.iter().map(|h| sanitize_csv_value(h)))?;

    for record in records {
        let mut row = vec![
            sanitize_csv_value(&record.age.to_string()),
            amount(record.patrimonio),
            amount(record.poupanca),
            sanitize_csv_value(record.fase.label()),
        ];
        if with_scenarios {
            match &record.monte_carlo {
                Some(mc) => {
                    row.push(amount(mc.pessimistic));
                    row.push(amount(mc.median));
                    row.push(amount(mc.optimistic));
                }
                None => row.extend([String::new(), String::new(), String::new()]),
            }
        }
        writer.write_record(&row)?;
    }

    let bytes = writer.into_inner().map_err(|err| err.into_error())?;
    Ok(String::from_utf8(bytes)?)
}
