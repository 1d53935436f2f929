//! Relevance ordering for search candidates.

use std::cmp::Ordering;

use crate::StockRecord;

/// Match quality of a record against a query, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MatchTier {
    ExactTicker,
    TickerPrefix,
    ExactName,
    NamePrefix,
    TickerContains,
    NameContains,
    NoMatch,
}

impl MatchTier {
    /// Classify `record` against an already lower-cased query.
    pub fn classify(record: &StockRecord, query_lower: &str) -> Self {
        let ticker = record.ticker.to_lowercase();
        let name = record.name.to_lowercase();

        if ticker == query_lower {
            Self::ExactTicker
        } else if ticker.starts_with(query_lower) {
            Self::TickerPrefix
        } else if name == query_lower {
            Self::ExactName
        } else if name.starts_with(query_lower) {
            Self::NamePrefix
        } else if ticker.contains(query_lower) {
            Self::TickerContains
        } else if name.contains(query_lower) {
            Self::NameContains
        } else {
            Self::NoMatch
        }
    }
}

/// Order `candidates` by relevance to `query`.
///
/// Ties on tier prefer common stock, then ascending ticker. Records that do not
/// match at all are kept at the end.
pub fn rank(candidates: Vec<StockRecord>, query: &str) -> Vec<StockRecord> {
    let query_lower = query.trim().to_lowercase();

    let mut keyed = candidates
        .into_iter()
        .map(|record| {
            let tier = MatchTier::classify(&record, &query_lower);
            let ticker_lower = record.ticker.to_lowercase();
            (tier, !record.is_common_stock(), ticker_lower, record)
        })
        .collect::<Vec<_>>();

    keyed.sort_by(|left, right| {
        left.0
            .cmp(&right.0)
            .then(left.1.cmp(&right.1))
            .then_with(|| left.2.cmp(&right.2))
            .then_with(|| compare_tickers(&left.3, &right.3))
    });

    keyed.into_iter().map(|(_, _, _, record)| record).collect()
}

fn compare_tickers(left: &StockRecord, right: &StockRecord) -> Ordering {
    left.ticker.cmp(&right.ticker)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ticker: &str, name: &str, ticker_type: &str) -> StockRecord {
        StockRecord {
            ticker: ticker.to_owned(),
            name: name.to_owned(),
            market: String::from("stocks"),
            locale: String::from("us"),
            primary_exchange: String::from("XNAS"),
            ticker_type: ticker_type.to_owned(),
            active: true,
            currency_name: String::from("usd"),
            cik: None,
            composite_figi: None,
            share_class_figi: None,
            last_updated_utc: None,
        }
    }

    fn tickers(records: &[StockRecord]) -> Vec<&str> {
        records.iter().map(|r| r.ticker.as_str()).collect()
    }

    #[test]
    fn exact_then_prefix_then_contains() {
        let ranked = rank(
            vec![
                record("MAAPL", "", "CS"),
                record("AAPLW", "", "CS"),
                record("AAPL", "", "CS"),
            ],
            "AAPL",
        );
        assert_eq!(tickers(&ranked), vec!["AAPL", "AAPLW", "MAAPL"]);
    }

    #[test]
    fn full_tier_order_is_respected() {
        let ranked = rank(
            vec![
                record("ZZZ", "Nothing related", "CS"),
                record("XAPP", "Something", "CS"),
                record("QQQ", "Big apple holdings", "CS"),
                record("APPL", "Ticker prefix", "CS"),
                record("APP", "Exact ticker", "CS"),
                record("BBB", "App", "CS"),
                record("CCC", "Apple Inc.", "CS"),
            ],
            "app",
        );

        assert_eq!(
            tickers(&ranked),
            vec!["APP", "APPL", "BBB", "CCC", "XAPP", "QQQ", "ZZZ"]
        );
    }

    #[test]
    fn common_stock_wins_ties_then_ticker_order() {
        let ranked = rank(
            vec![
                record("MSFTW", "Microsoft warrant", "WARRANT"),
                record("MSFTB", "Microsoft B", "CS"),
                record("MSFTA", "Microsoft A", "CS"),
            ],
            "msft",
        );

        assert_eq!(tickers(&ranked), vec!["MSFTA", "MSFTB", "MSFTW"]);
    }

    #[test]
    fn ranking_is_case_insensitive_and_deterministic() {
        let input = vec![
            record("nvda", "nvidia", "CS"),
            record("NVDL", "leveraged nvda", "ETF"),
        ];
        let first = rank(input.clone(), "NVD");
        let second = rank(input, "nvd");
        assert_eq!(first, second);
        assert_eq!(tickers(&first), vec!["nvda", "NVDL"]);
    }
}
