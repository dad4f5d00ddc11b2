//! Pipeline KPI aggregation over a snapshot of quotes.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::quote::{Quote, QuoteStatus};
use crate::pipeline::registry::lookup;

pub const DEFAULT_EXPIRING_SOON_DAYS: u32 = 7;

/// Tunables for KPI aggregation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Window after `now` in which an open quote counts as expiring soon.
    /// The lower edge is exclusive and the upper edge inclusive.
    pub expiring_soon_days: u32,
    /// Clamp `win_probability` overrides into 0..=100 before weighting.
    pub clamp_win_probability: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self { expiring_soon_days: DEFAULT_EXPIRING_SOON_DAYS, clamp_win_probability: true }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineKpis {
    pub total_value: Decimal,
    pub weighted_value: Decimal,
    pub expiring_soon: usize,
    pub count: usize,
    /// Whole percentage of completed quotes that were accepted.
    pub conversion_rate: u32,
    pub accepted_count: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StatusBucket {
    pub status: QuoteStatus,
    pub label: &'static str,
    pub count: usize,
    pub value: Decimal,
}

#[derive(Clone, Debug, Default)]
pub struct PipelineAggregator {
    settings: PipelineSettings,
}

impl PipelineAggregator {
    pub fn new(settings: PipelineSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> PipelineSettings {
        self.settings
    }

    /// Conversion weight in [0, 1] for a quote: the explicit override when
    /// present, otherwise the registry default for its status.
    pub fn effective_probability(&self, quote: &Quote) -> Decimal {
        match quote.win_probability {
            Some(pct) => {
                let pct = if self.settings.clamp_win_probability {
                    pct.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
                } else {
                    pct
                };
                pct / Decimal::ONE_HUNDRED
            }
            None => lookup(quote.status).default_probability,
        }
    }

    pub fn is_expiring_soon(&self, quote: &Quote, now: DateTime<Utc>) -> bool {
        let horizon = now + Duration::days(i64::from(self.settings.expiring_soon_days));
        quote.valid_until > now && quote.valid_until <= horizon
    }

    pub fn compute(&self, quotes: &[Quote], now: DateTime<Utc>) -> PipelineKpis {
        let mut kpis = PipelineKpis::default();
        let mut completed = 0u64;

        for quote in quotes {
            if quote.status.is_terminal() {
                completed += 1;
                if quote.status == QuoteStatus::Accepted {
                    kpis.accepted_count += 1;
                }
                continue;
            }

            kpis.count += 1;
            // Saturating so oversized snapshots cannot abort aggregation.
            kpis.total_value = kpis.total_value.saturating_add(quote.amount);
            let weighted = quote.amount.saturating_mul(self.effective_probability(quote));
            kpis.weighted_value = kpis.weighted_value.saturating_add(weighted);
            if self.is_expiring_soon(quote, now) {
                kpis.expiring_soon += 1;
            }
        }

        kpis.conversion_rate = conversion_rate(kpis.accepted_count as u64, completed);
        kpis
    }
}

/// KPIs with the default seven-day window and clamped overrides.
pub fn compute_kpis(quotes: &[Quote], now: DateTime<Utc>) -> PipelineKpis {
    PipelineAggregator::default().compute(quotes, now)
}

/// Count and summed amount per status, in lifecycle order. Statuses without
/// quotes are included with zero values.
pub fn status_breakdown(quotes: &[Quote]) -> Vec<StatusBucket> {
    QuoteStatus::ALL
        .into_iter()
        .map(|status| {
            let (count, value) = quotes
                .iter()
                .filter(|quote| quote.status == status)
                .fold((0usize, Decimal::ZERO), |(count, value), quote| {
                    (count + 1, value.saturating_add(quote.amount))
                });
            StatusBucket { status, label: lookup(status).label, count, value }
        })
        .collect()
}

// Integer rounding, half away from zero.
fn conversion_rate(accepted: u64, completed: u64) -> u32 {
    if completed == 0 {
        return 0;
    }
    ((200 * accepted + completed) / (2 * completed)) as u32
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use rust_decimal::Decimal;

    use super::{
        compute_kpis, conversion_rate, status_breakdown, PipelineAggregator, PipelineKpis,
        PipelineSettings,
    };
    use crate::domain::quote::{Quote, QuoteId, QuoteStatus};

    fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).single().expect("valid date")
    }

    fn quote(id: &str, status: QuoteStatus, amount: i64) -> Quote {
        let created = at(2023, 12, 1);
        Quote {
            id: QuoteId(id.to_string()),
            number: id.to_string(),
            client_name: "Installatiebedrijf Jansen".to_string(),
            title: "Badkamer".to_string(),
            status,
            amount: Decimal::new(amount, 0),
            win_probability: None,
            valid_until: at(2024, 3, 1),
            created_at: created,
            updated_at: created,
            archived: false,
        }
    }

    fn with_probability(mut quote: Quote, pct: i64) -> Quote {
        quote.win_probability = Some(Decimal::new(pct, 0));
        quote
    }

    fn valid_until(mut quote: Quote, when: DateTime<Utc>) -> Quote {
        quote.valid_until = when;
        quote
    }

    #[test]
    fn empty_snapshot_yields_all_zero_kpis() {
        let kpis = compute_kpis(&[], at(2024, 1, 1));
        assert_eq!(kpis, PipelineKpis::default());
        assert_eq!(kpis.total_value, Decimal::ZERO);
        assert_eq!(kpis.conversion_rate, 0);
    }

    #[test]
    fn mixed_pipeline_scenario() {
        let quotes = vec![
            quote("a", QuoteStatus::Sent, 1000),
            with_probability(quote("b", QuoteStatus::Negotiating, 2000), 90),
            quote("c", QuoteStatus::Accepted, 500),
        ];

        let kpis = compute_kpis(&quotes, at(2024, 1, 1));

        assert_eq!(kpis.total_value, Decimal::new(3000, 0));
        assert_eq!(kpis.weighted_value, Decimal::new(2100, 0));
        assert_eq!(kpis.count, 2);
        assert_eq!(kpis.accepted_count, 1);
        assert_eq!(kpis.conversion_rate, 100);
        assert_eq!(kpis.expiring_soon, 0);
    }

    #[test]
    fn weighted_value_sums_active_quotes_only() {
        let quotes = vec![
            quote("concept", QuoteStatus::Concept, 400),
            quote("viewed", QuoteStatus::Viewed, 1200),
            with_probability(quote("sent", QuoteStatus::Sent, 800), 25),
            with_probability(quote("lost", QuoteStatus::Lost, 9000), 80),
            quote("expired", QuoteStatus::Expired, 700),
        ];
        let aggregator = PipelineAggregator::default();

        let expected: Decimal = quotes
            .iter()
            .filter(|quote| quote.is_active())
            .map(|quote| quote.amount * aggregator.effective_probability(quote))
            .sum();
        let kpis = aggregator.compute(&quotes, at(2024, 1, 1));

        // 400 * 0.10 + 1200 * 0.50 + 800 * 0.25
        assert_eq!(expected, Decimal::new(840, 0));
        assert_eq!(kpis.weighted_value, expected);
        assert_eq!(kpis.total_value, Decimal::new(2400, 0));
        assert_eq!(kpis.count, 3);
    }

    #[test]
    fn override_beats_status_default_even_when_zero() {
        let aggregator = PipelineAggregator::default();
        let quote = with_probability(quote("q", QuoteStatus::Negotiating, 100), 0);
        assert_eq!(aggregator.effective_probability(&quote), Decimal::ZERO);
    }

    #[test]
    fn oversized_amounts_saturate_instead_of_overflowing() {
        let huge = Decimal::from_i128_with_scale(50_000_000_000_000_000_000_000_000_000, 0);
        let mut first = quote("a", QuoteStatus::Sent, 0);
        first.amount = huge;
        let mut second = quote("b", QuoteStatus::Sent, 0);
        second.amount = huge;
        let quotes = vec![first, second];

        let kpis = compute_kpis(&quotes, at(2024, 1, 1));

        assert_eq!(kpis.count, 2);
        assert_eq!(kpis.total_value, Decimal::MAX);
        assert!(kpis.weighted_value > Decimal::ZERO);
        assert!(kpis.weighted_value <= Decimal::MAX);

        let sent = &status_breakdown(&quotes)[1];
        assert_eq!(sent.count, 2);
        assert_eq!(sent.value, Decimal::MAX);
    }

    #[test]
    fn no_completed_quotes_means_zero_conversion() {
        let quotes = vec![quote("a", QuoteStatus::Sent, 100), quote("b", QuoteStatus::Viewed, 50)];
        let kpis = compute_kpis(&quotes, at(2024, 1, 1));
        assert_eq!(kpis.conversion_rate, 0);
        assert_eq!(kpis.accepted_count, 0);
    }

    #[test]
    fn conversion_rate_rounds_half_away_from_zero() {
        assert_eq!(conversion_rate(2, 3), 67);
        assert_eq!(conversion_rate(1, 3), 33);
        assert_eq!(conversion_rate(1, 8), 13);
        assert_eq!(conversion_rate(0, 4), 0);
        assert_eq!(conversion_rate(4, 4), 100);
    }

    #[test]
    fn expiring_window_excludes_now_and_includes_day_seven() {
        let now = at(2024, 1, 1);
        let quotes = vec![
            valid_until(quote("today", QuoteStatus::Sent, 100), at(2024, 1, 1)),
            valid_until(quote("soon", QuoteStatus::Sent, 100), at(2024, 1, 5)),
            valid_until(quote("later", QuoteStatus::Sent, 100), at(2024, 1, 10)),
            valid_until(quote("edge", QuoteStatus::Viewed, 100), now + Duration::days(7)),
            valid_until(
                quote("past-edge", QuoteStatus::Viewed, 100),
                now + Duration::days(7) + Duration::seconds(1),
            ),
            valid_until(quote("done", QuoteStatus::Accepted, 100), at(2024, 1, 3)),
        ];

        let kpis = compute_kpis(&quotes, now);

        assert_eq!(kpis.expiring_soon, 2, "only `soon` and `edge` are inside the window");
    }

    #[test]
    fn expiring_window_follows_settings() {
        let now = at(2024, 1, 1);
        let aggregator = PipelineAggregator::new(PipelineSettings {
            expiring_soon_days: 14,
            ..PipelineSettings::default()
        });
        let quote = valid_until(quote("later", QuoteStatus::Sent, 100), at(2024, 1, 10));

        assert!(aggregator.is_expiring_soon(&quote, now));
        assert_eq!(aggregator.settings().expiring_soon_days, 14);
    }

    #[test]
    fn out_of_range_override_is_clamped_unless_disabled() {
        let quote = with_probability(quote("q", QuoteStatus::Sent, 1000), 150);

        let clamped = PipelineAggregator::default();
        assert_eq!(clamped.effective_probability(&quote), Decimal::ONE);

        let raw = PipelineAggregator::new(PipelineSettings {
            clamp_win_probability: false,
            ..PipelineSettings::default()
        });
        assert_eq!(raw.effective_probability(&quote), Decimal::new(15, 1));
    }

    #[test]
    fn breakdown_covers_every_status() {
        let quotes = vec![
            quote("a", QuoteStatus::Sent, 100),
            quote("b", QuoteStatus::Sent, 250),
            quote("c", QuoteStatus::Lost, 75),
        ];

        let buckets = status_breakdown(&quotes);

        assert_eq!(buckets.len(), QuoteStatus::ALL.len());
        let sent = buckets
            .iter()
            .find(|bucket| bucket.status == QuoteStatus::Sent)
            .expect("sent bucket present");
        assert_eq!(sent.count, 2);
        assert_eq!(sent.value, Decimal::new(350, 0));
        assert_eq!(sent.label, "Verzonden");
        let concept = &buckets[0];
        assert_eq!(concept.count, 0);
        assert_eq!(concept.value, Decimal::ZERO);
    }
}
