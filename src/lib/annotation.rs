use crate::config::EstimatorConfig;
use crate::render::ChartStyle;
use serde::Serialize;

pub const X_LABEL: &str = "Arithmetic difference between B and A [percentage points]";

/// Display strings handed to a rendering sink alongside the chart data
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Annotations {
    pub title: String,
    pub subtitle: String,
    pub caption: Option<String>,
    pub x_label: String,
    pub y_label: String,
}

impl Annotations {
    pub fn new(style: ChartStyle, config: &EstimatorConfig, win_probability: f64) -> Self {
        let title = format!(
            "The probability that B has a higher conversion than A is around {}%.",
            rounded_percent(win_probability)
        );
        let (subtitle, caption, y_label) = match style {
            ChartStyle::Histogram => (
                format!(
                    "The posterior distribution is based on {} numerical simulations. \
                     The test sample has {} total users.",
                    config.sample_count,
                    config.total_users()
                ),
                None,
                "Number of simulations",
            ),
            ChartStyle::Density => (
                format!(
                    "The posterior distribution is based on {} numerical simulations. \
                     The test sample has {} total users.",
                    group_thousands(config.sample_count as u64),
                    group_thousands(config.total_users())
                ),
                Some(inputs_caption(config)),
                "Density",
            ),
            ChartStyle::SmoothedDensity => (
                format!(
                    "The posterior distribution is based on {} numerical simulations, \
                     with the density estimated through Scott's method for Gaussian smoothing. \
                     The test sample has {} total users.",
                    group_thousands(config.sample_count as u64),
                    group_thousands(config.total_users())
                ),
                Some(inputs_caption(config)),
                "Density estimate",
            ),
        };
        Self {
            title,
            subtitle,
            caption,
            x_label: X_LABEL.to_string(),
            y_label: y_label.to_string(),
        }
    }
}

fn inputs_caption(config: &EstimatorConfig) -> String {
    format!(
        "Inputs: page A: {} conversions, {} users; page B: {} conversions, {} users.",
        group_thousands(config.trial_a.successes),
        group_thousands(config.trial_a.total),
        group_thousands(config.trial_b.successes),
        group_thousands(config.trial_b.total)
    )
}

/// Probability as a whole percentage, ties rounded to even
pub fn rounded_percent(probability: f64) -> i64 {
    (probability * 100.0).round_ties_even() as i64
}

/// Decimal digits with a comma between groups of three, `50000` -> `50,000`
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}
