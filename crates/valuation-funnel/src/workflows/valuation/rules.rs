/// Revenue tier: representative revenue and the base EBITDA multiple range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevenueBand {
    pub token: &'static str,
    pub midpoint: f64,
    pub multiple_low: f64,
    pub multiple_high: f64,
}

/// EBITDA margin tier expressed as a fraction of revenue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarginBand {
    pub token: &'static str,
    pub rate: f64,
}

/// Shift applied to the multiple range, in multiple points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adjustment {
    pub low: f64,
    pub high: f64,
}

impl Adjustment {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }
}

/// One optional answer that nudges the multiple up or down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdjusterRule {
    /// Answer key read from the answer set.
    pub id: &'static str,
    pub name: &'static str,
    /// Relative importance shown next to the factor. Not part of the math.
    pub weight: f64,
    pub adjustments: &'static [(&'static str, Adjustment)],
    pub premium_label: &'static str,
    pub neutral_label: &'static str,
    pub discount_label: &'static str,
}

impl AdjusterRule {
    pub fn adjustment(&self, token: &str) -> Option<Adjustment> {
        self.adjustments
            .iter()
            .find(|(candidate, _)| *candidate == token)
            .map(|(_, adjustment)| *adjustment)
    }
}

/// Lookup tables driving the valuation engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringRules {
    pub revenue_bands: &'static [RevenueBand],
    pub margin_bands: &'static [MarginBand],
    pub adjusters: &'static [AdjusterRule],
}

impl ScoringRules {
    pub const fn standard() -> Self {
        Self {
            revenue_bands: REVENUE_BANDS,
            margin_bands: MARGIN_BANDS,
            adjusters: ADJUSTERS,
        }
    }

    pub fn revenue_band(&self, token: &str) -> Option<&RevenueBand> {
        self.revenue_bands.iter().find(|band| band.token == token)
    }

    pub fn margin_rate(&self, token: &str) -> Option<f64> {
        self.margin_bands
            .iter()
            .find(|band| band.token == token)
            .map(|band| band.rate)
    }
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self::standard()
    }
}

pub const REVENUE_RANGE_KEY: &str = "revenue_range";
pub const EBITDA_MARGIN_KEY: &str = "ebitda_margin";
pub const CLIENT_CONCENTRATION_KEY: &str = "top_client_concentration";

/// Concentration answers that warrant a risk callout on the results screen.
pub const CONCENTRATION_RISK_TOKENS: &[&str] = &["25_40", "40_60", "over_60"];

const REVENUE_BANDS: &[RevenueBand] = &[
    RevenueBand {
        token: "under_1m",
        midpoint: 500_000.0,
        multiple_low: 3.0,
        multiple_high: 4.0,
    },
    RevenueBand {
        token: "1m_3m",
        midpoint: 2_000_000.0,
        multiple_low: 3.5,
        multiple_high: 4.5,
    },
    RevenueBand {
        token: "3m_7m",
        midpoint: 5_000_000.0,
        multiple_low: 4.0,
        multiple_high: 5.5,
    },
    RevenueBand {
        token: "7m_15m",
        midpoint: 11_000_000.0,
        multiple_low: 4.5,
        multiple_high: 6.0,
    },
    RevenueBand {
        token: "15m_30m",
        midpoint: 22_500_000.0,
        multiple_low: 5.0,
        multiple_high: 6.5,
    },
    RevenueBand {
        token: "30m_plus",
        midpoint: 45_000_000.0,
        multiple_low: 5.5,
        multiple_high: 7.0,
    },
];

const MARGIN_BANDS: &[MarginBand] = &[
    MarginBand {
        token: "under_5",
        rate: 0.03,
    },
    MarginBand {
        token: "5_10",
        rate: 0.075,
    },
    MarginBand {
        token: "10_15",
        rate: 0.125,
    },
    MarginBand {
        token: "15_20",
        rate: 0.175,
    },
    MarginBand {
        token: "20_plus",
        rate: 0.225,
    },
];

const REVENUE_GROWTH: &[(&str, Adjustment)] = &[
    ("growing_fast", Adjustment::new(0.5, 1.0)),
    ("growing_moderate", Adjustment::new(0.25, 0.5)),
    ("flat", Adjustment::new(0.0, 0.0)),
    ("declining", Adjustment::new(-1.5, -0.5)),
];

const CLIENT_CONCENTRATION: &[(&str, Adjustment)] = &[
    ("under_10", Adjustment::new(0.5, 0.5)),
    ("10_25", Adjustment::new(0.0, 0.0)),
    ("25_40", Adjustment::new(-0.5, -0.5)),
    ("40_60", Adjustment::new(-1.0, -1.0)),
    ("over_60", Adjustment::new(-2.0, -2.0)),
];

const CONTRACT_REVENUE: &[(&str, Adjustment)] = &[
    ("mostly_contracted", Adjustment::new(0.5, 0.5)),
    ("majority_contracted", Adjustment::new(0.25, 0.25)),
    ("mix", Adjustment::new(0.0, 0.0)),
    ("transactional", Adjustment::new(-0.25, -0.25)),
];

const MANAGEMENT_INDEPENDENCE: &[(&str, Adjustment)] = &[
    ("hands_off", Adjustment::new(0.5, 1.0)),
    ("mostly_delegated", Adjustment::new(0.25, 0.5)),
    ("moderate", Adjustment::new(0.0, 0.0)),
    ("heavily_involved", Adjustment::new(-1.0, -0.5)),
];

const LEASE_TERMS: &[(&str, Adjustment)] = &[
    ("own", Adjustment::new(0.25, 0.25)),
    ("long_lease", Adjustment::new(0.25, 0.25)),
    ("mid_lease", Adjustment::new(0.0, 0.0)),
    ("short_lease", Adjustment::new(-0.25, -0.25)),
];

const ADJUSTERS: &[AdjusterRule] = &[
    AdjusterRule {
        id: "revenue_trend",
        name: "Revenue Growth",
        weight: 0.08,
        adjustments: REVENUE_GROWTH,
        premium_label: "Strong revenue growth adds buyer confidence",
        neutral_label: "Flat revenue is typical for stable 3PLs",
        discount_label: "Declining revenue reduces buyer interest",
    },
    AdjusterRule {
        id: CLIENT_CONCENTRATION_KEY,
        name: "Client Concentration",
        weight: 0.08,
        adjustments: CLIENT_CONCENTRATION,
        premium_label: "Well-diversified client base reduces risk",
        neutral_label: "Moderate client concentration",
        discount_label: "High client concentration is a significant risk",
    },
    AdjusterRule {
        id: "recurring_revenue_pct",
        name: "Contract Revenue",
        weight: 0.06,
        adjustments: CONTRACT_REVENUE,
        premium_label: "High contracted revenue signals predictability",
        neutral_label: "Mixed revenue model",
        discount_label: "Mostly transactional revenue adds uncertainty",
    },
    AdjusterRule {
        id: "mgmt_independence",
        name: "Management Independence",
        weight: 0.05,
        adjustments: MANAGEMENT_INDEPENDENCE,
        premium_label: "Business runs without the owner, a big plus for buyers",
        neutral_label: "Owner is moderately involved",
        discount_label: "Owner-dependent operations concern buyers",
    },
    AdjusterRule {
        id: "lease_terms",
        name: "Lease Terms",
        weight: 0.03,
        adjustments: LEASE_TERMS,
        premium_label: "Strong lease position or property ownership",
        neutral_label: "Standard lease terms",
        discount_label: "Short lease creates transition risk",
    },
];
