use anyhow::Result;
use concat_string::concat_string;
use scraper::Html;

use crate::{
    crawler::table::{
        find_table, project, tbody_rows, thead_cells, Column, HeaderRule, ResultSet,
    },
    logging,
    util::http,
};

pub const HOST: &str = "www.cse.com.bd";

/// Canonical schema of the merged CSE endpoint; the synthetic `SL` serial is
/// prepended by the row mapper.
const MERGED_COLUMNS: [Column; 4] = [
    Column {
        name: "STOCK CODE",
        rule: HeaderRule::Contains("STOCK CODE"),
    },
    Column {
        name: "HIGH",
        rule: HeaderRule::Exact("HIGH"),
    },
    Column {
        name: "LOW",
        rule: HeaderRule::Exact("LOW"),
    },
    Column {
        name: "CP",
        rule: HeaderRule::AnyOf(&["CP", "LTP"]),
    },
];

/// Fetches the CSE bond price page and returns its `TABLE_2` table with the
/// source's own headers. `Ok(None)` when the table is absent.
pub async fn bonds() -> Result<Option<ResultSet>> {
    let url = concat_string!("https://", HOST, "/market/bond_current_price");
    let html = http::get(&url, None).await?;

    Ok(extract_table(&html, "table#TABLE_2"))
}

/// Fetches the CSE current market price page and returns its `dataTable`
/// table with the source's own headers. `Ok(None)` when the table is absent.
pub async fn current_price() -> Result<Option<ResultSet>> {
    let url = concat_string!("https://", HOST, "/market/current_price");
    let html = http::get(&url, None).await?;

    Ok(extract_table(&html, "table#dataTable"))
}

/// Combines the current-price and bond tables into one canonical schema
/// `{SL, STOCK CODE, HIGH, LOW, CP}`, renumbering serials continuously.
///
/// The two sources are fetched concurrently and merged as typed values. A
/// source that fails or has no table contributes nothing; the merge is
/// not-found only when no source contributes any row.
pub async fn merged() -> Result<Option<ResultSet>> {
    let (current, bond) = tokio::join!(current_price(), bonds());

    let mut sources = Vec::with_capacity(2);
    for (label, fetched) in [("current price", current), ("bonds", bond)] {
        match fetched {
            Ok(Some(result_set)) => sources.push(result_set),
            Ok(None) => {
                logging::info_file_async(format!("CSE {} table not found, skipping", label));
            }
            Err(why) => {
                logging::error_file_async(format!(
                    "Failed to fetch CSE {} because {:?}",
                    label, why
                ));
            }
        }
    }

    Ok(merge(&sources))
}

fn extract_table(html: &str, css_selector: &str) -> Option<ResultSet> {
    let document = Html::parse_document(html);
    let table = match find_table(&document, css_selector) {
        Ok(Some(table)) => table,
        _ => return None,
    };

    Some(ResultSet {
        headers: thead_cells(&table),
        rows: tbody_rows(&table),
    })
}

/// Projects every source onto the canonical merged schema. `None` when the
/// sources yield zero rows in total.
fn merge(sources: &[ResultSet]) -> Option<ResultSet> {
    let mut serial = 1;
    let mut rows = Vec::new();

    for source in sources {
        rows.extend(project(source, &MERGED_COLUMNS, &mut serial));
    }

    if rows.is_empty() {
        return None;
    }

    let mut headers = Vec::with_capacity(MERGED_COLUMNS.len() + 1);
    headers.push("SL".to_string());
    headers.extend(MERGED_COLUMNS.iter().map(|c| c.name.to_string()));

    Some(ResultSet { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    const BOND_PAGE: &str = r#"<html><body>
        <table id="TABLE_2">
            <thead><tr>
                <th>SL</th><th>Stock Code</th><th>Day's Range</th>
                <th>High</th><th>Low</th><th>LTP</th>
            </tr></thead>
            <tbody>
                <tr><td>1</td><td>BOND1</td><td>100-101</td><td>101</td><td>100</td><td>100.5</td></tr>
                <tr><td>2</td><td>BOND2</td><td>99-100</td><td>100</td><td>99</td><td>99.5</td></tr>
            </tbody>
        </table>
    </body></html>"#;

    const PRICE_PAGE: &str = r#"<html><body>
        <table id="dataTable">
            <thead><tr>
                <th>SL</th><th>Stock Code</th><th>Open</th>
                <th>High</th><th>Low</th><th>CP</th>
            </tr></thead>
            <tbody>
                <tr><td>1</td><td>AAA</td><td>10.1</td><td>10.5</td><td>9.8</td><td>10.0</td></tr>
            </tbody>
        </table>
    </body></html>"#;

    #[test]
    fn test_extract_table() {
        let result = extract_table(BOND_PAGE, "table#TABLE_2").unwrap();
        assert_eq!(
            result.headers,
            strings(&["SL", "Stock Code", "Day's Range", "High", "Low", "LTP"])
        );
        assert_eq!(result.rows.len(), 2);
        assert_eq!(
            result.rows[0],
            strings(&["1", "BOND1", "100-101", "101", "100", "100.5"])
        );
    }

    #[test]
    fn test_extract_table_absent() {
        assert!(extract_table(BOND_PAGE, "table#dataTable").is_none());
        assert!(extract_table("<html></html>", "table#TABLE_2").is_none());
    }

    #[test]
    fn test_merge_reprojects_both_sources() {
        let price = extract_table(PRICE_PAGE, "table#dataTable").unwrap();
        let bond = extract_table(BOND_PAGE, "table#TABLE_2").unwrap();

        let merged = merge(&[price, bond]).unwrap();
        assert_eq!(
            merged.headers,
            strings(&["SL", "STOCK CODE", "HIGH", "LOW", "CP"])
        );
        assert_eq!(merged.rows.len(), 3);
        // CP on the price page, LTP on the bond page, one canonical column.
        assert_eq!(merged.rows[0], strings(&["1", "AAA", "10.5", "9.8", "10.0"]));
        assert_eq!(
            merged.rows[1],
            strings(&["2", "BOND1", "101", "100", "100.5"])
        );
        assert_eq!(
            merged.rows[2],
            strings(&["3", "BOND2", "100", "99", "99.5"])
        );

        for row in &merged.rows {
            assert_eq!(row.len(), merged.headers.len());
        }
    }

    #[test]
    fn test_merge_with_one_empty_source() {
        let price = extract_table(PRICE_PAGE, "table#dataTable").unwrap();
        let empty = ResultSet {
            headers: strings(&["SL", "Stock Code", "High", "Low", "LTP"]),
            rows: vec![],
        };

        let merged = merge(&[empty, price]).unwrap();
        assert_eq!(merged.rows, vec![strings(&["1", "AAA", "10.5", "9.8", "10.0"])]);
    }

    #[test]
    fn test_merge_with_no_rows_is_not_found() {
        assert!(merge(&[]).is_none());

        let empty = ResultSet {
            headers: strings(&["SL", "Stock Code"]),
            rows: vec![],
        };
        assert!(merge(&[empty.clone(), empty]).is_none());
    }

    #[test]
    fn test_merge_tolerates_missing_stock_code_column() {
        // A source without a stock-code column still contributes rows; the
        // unresolved column becomes an empty cell.
        let source = ResultSet {
            headers: strings(&["High", "Low", "CP"]),
            rows: vec![strings(&["10", "9", "9.5"])],
        };

        let merged = merge(&[source]).unwrap();
        assert_eq!(merged.rows[0], strings(&["1", "", "10", "9", "9.5"]));
    }

    #[tokio::test]
    #[ignore]
    async fn test_merged() {
        match merged().await {
            Ok(Some(result)) => {
                assert_eq!(
                    result.headers,
                    strings(&["SL", "STOCK CODE", "HIGH", "LOW", "CP"])
                );
            }
            Ok(None) => {
                logging::info_file_async("No CSE data found".to_string());
            }
            Err(why) => {
                logging::error_file_async(format!("Failed to fetch because {:?}", why));
            }
        }
    }
}
