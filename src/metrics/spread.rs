use log::warn;

use crate::series::{inner_join, AlignedTable, DerivedSeries, InstrumentKey, TimeSeries};

/// Pointwise `implied - realized` on the dates both series share.
///
/// This is an inner join: a date missing from either side is dropped, nothing is
/// forward-filled. Both inputs are normally already aligned tables' columns.
pub fn implied_realized_spread(implied: &TimeSeries, realized: &TimeSeries) -> DerivedSeries {
    TimeSeries::from_sorted(
        inner_join(implied, realized)
            .into_iter()
            .map(|(date, iv, rv)| (date, iv - rv))
            .collect(),
    )
}

/// Column-wise spread of two tables.
///
/// The result covers the keys present in both tables (in `implied`'s order) and the
/// dates present in both tables, so it stays free of missing cells.
pub fn spread_table(implied: &AlignedTable, realized: &AlignedTable) -> AlignedTable {
    let mut rows_implied = Vec::new();
    let mut rows_realized = Vec::new();
    let mut dates = Vec::new();

    let (di, dr) = (implied.dates(), realized.dates());
    let (mut i, mut j) = (0, 0);
    while i < di.len() && j < dr.len() {
        if di[i] == dr[j] {
            dates.push(di[i]);
            rows_implied.push(i);
            rows_realized.push(j);
            i += 1;
            j += 1;
        } else if di[i] < dr[j] {
            i += 1;
        } else {
            j += 1;
        }
    }

    let mut keys: Vec<InstrumentKey> = Vec::new();
    let mut columns: Vec<Vec<f64>> = Vec::new();
    for key in implied.keys() {
        let (Some(iv), Some(rv)) = (
            implied.column_values(key.as_str()),
            realized.column_values(key.as_str()),
        ) else {
            warn!("spread: {} has no realized vol column, skipping", key);
            continue;
        };
        keys.push(key.clone());
        columns.push(
            rows_implied
                .iter()
                .zip(&rows_realized)
                .map(|(&a, &b)| iv[a] - rv[b])
                .collect(),
        );
    }

    AlignedTable::from_parts(keys, dates, columns)
}
