use crate::annotation::Annotations;
use crate::estimator::PosteriorDifference;
use crate::histogram::Histogram;
use crate::kde::DensityGrid;
use anyhow::{Context, Result, bail};
use log::debug;
use serde::Serialize;
use std::io::Write;
use std::{fmt, str::FromStr};
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

pub const NEGATIVE_FILL: &str = "#800000";
pub const NON_NEGATIVE_FILL: &str = "#008080";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, EnumIter)]
#[serde(rename_all = "snake_case")]
pub enum ChartStyle {
    /// Unit-bin histogram of the difference sample
    Histogram,
    /// Raw difference sample, smoothed by the renderer
    Density,
    /// Sign-tagged Gaussian KDE grid
    SmoothedDensity,
}

impl fmt::Display for ChartStyle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ChartStyle::Histogram => write!(f, "histogram"),
            ChartStyle::Density => write!(f, "density"),
            ChartStyle::SmoothedDensity => write!(f, "smoothed_density"),
        }
    }
}

impl FromStr for ChartStyle {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "histogram" => Ok(ChartStyle::Histogram),
            "density" => Ok(ChartStyle::Density),
            "smoothed_density" => Ok(ChartStyle::SmoothedDensity),
            _ => bail!("Invalid chart style: {}", s),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ChartSeries<'a> {
    Histogram(&'a Histogram),
    Samples(&'a [f64]),
    DensityGrid(&'a DensityGrid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SignFill {
    pub negative: &'static str,
    pub non_negative: &'static str,
}

/// Everything a renderer needs to draw one chart
#[derive(Debug, Clone, Serialize)]
pub struct ChartPayload<'a> {
    pub style: ChartStyle,
    pub win_probability: f64,
    pub annotations: Annotations,
    pub series: ChartSeries<'a>,
    pub fill: Option<SignFill>,
    /// Dotted vertical line drawn at this x
    pub reference_line: Option<f64>,
}

impl<'a> ChartPayload<'a> {
    pub fn new(style: ChartStyle, result: &'a PosteriorDifference) -> Result<Self> {
        let (series, fill, reference_line) = match style {
            ChartStyle::Histogram => {
                let histogram = result
                    .histogram
                    .as_ref()
                    .context("Histogram chart requested but no histogram was computed")?;
                (ChartSeries::Histogram(histogram), None, None)
            }
            ChartStyle::Density => (ChartSeries::Samples(&result.difference), None, None),
            ChartStyle::SmoothedDensity => {
                let grid = result
                    .density
                    .grid()
                    .context("Smoothed density chart requested but no density grid is available")?;
                let fill = SignFill {
                    negative: NEGATIVE_FILL,
                    non_negative: NON_NEGATIVE_FILL,
                };
                (ChartSeries::DensityGrid(grid), Some(fill), Some(0.0))
            }
        };
        Ok(Self {
            style,
            win_probability: result.win_probability,
            annotations: Annotations::new(style, &result.config, result.win_probability),
            series,
            fill,
            reference_line,
        })
    }
}

/// Payloads for every chart style whose data is present in `result`
pub fn available_payloads(result: &PosteriorDifference) -> Vec<ChartPayload<'_>> {
    ChartStyle::iter()
        .filter_map(|style| match ChartPayload::new(style, result) {
            Ok(payload) => Some(payload),
            Err(e) => {
                debug!("Skipping {} chart: {}", style, e);
                None
            }
        })
        .collect()
}

/// Receives chart payloads, drawing is up to the implementation
pub trait RenderSink {
    fn render(&mut self, payload: &ChartPayload<'_>) -> Result<()>;
}

/// Writes each payload as one line of JSON
pub struct JsonSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RenderSink for JsonSink<W> {
    fn render(&mut self, payload: &ChartPayload<'_>) -> Result<()> {
        serde_json::to_writer(&mut self.writer, payload)
            .with_context(|| format!("Error serialising {} chart", payload.style))?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}
