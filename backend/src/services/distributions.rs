//! Per-batch box plots for the chart endpoints.

use crate::api::{BoxPlotData, BoxPlotStatistic};
use crate::models::{GroupField, KeyPart, Parameter, RecordSet};
use crate::services::statistics::compute_box_plot;

/// Box-plot statistics of `parameter` for every batch, in first-seen batch order.
///
/// Batches without a single value for the parameter are omitted.
pub fn compute_box_plot_data(records: &RecordSet, parameter: Parameter) -> BoxPlotData {
    let groups = records.group_by(&[GroupField::Batch]);

    let data: Vec<BoxPlotStatistic> = groups
        .iter()
        .filter_map(|(key, rows)| {
            let batch = match key.parts().first() {
                Some(KeyPart::Text(batch)) => batch.as_str(),
                _ => return None,
            };
            let values: Vec<f64> = rows.iter().filter_map(|r| r.value(parameter)).collect();
            compute_box_plot(&values, batch)
        })
        .collect();

    BoxPlotData { parameter, data }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MeasurementRow, ParameterValues};

    fn row(batch: &str, pce: f64, ff: Option<f64>) -> MeasurementRow {
        let mut values = ParameterValues::default();
        if let Some(ff) = ff {
            values.set(Parameter::Ff, ff);
        }
        MeasurementRow {
            row_index: 0,
            batch_id: batch.to_string(),
            sheet_id: "S1".to_string(),
            device_id: Some("D1".to_string()),
            pixel_id: "1".to_string(),
            scan_direction: None,
            pce,
            values,
            date: None,
        }
    }

    #[test]
    fn test_box_plot_per_batch_in_first_seen_order() {
        let records = RecordSet::from_rows(vec![
            row("B2", 10.0, None),
            row("B1", 20.0, None),
            row("B2", 14.0, None),
        ]);
        let data = compute_box_plot_data(&records, Parameter::Pce);

        assert_eq!(data.parameter, Parameter::Pce);
        let batches: Vec<&str> = data.data.iter().map(|s| s.batch.as_str()).collect();
        assert_eq!(batches, vec!["B2", "B1"]);
        assert_eq!(data.data[0].count, 2);
        assert_eq!(data.data[0].median, 12.0);
        assert_eq!(data.data[1].std, 0.0);
    }

    #[test]
    fn test_batch_without_values_is_omitted() {
        let records = RecordSet::from_rows(vec![
            row("B1", 10.0, Some(80.0)),
            row("B2", 11.0, None),
        ]);
        let data = compute_box_plot_data(&records, Parameter::Ff);
        assert_eq!(data.data.len(), 1);
        assert_eq!(data.data[0].batch, "B1");
    }

    #[test]
    fn test_empty_record_set() {
        let data = compute_box_plot_data(&RecordSet::default(), Parameter::Pce);
        assert!(data.data.is_empty());
    }
}
