use plotters::prelude::*;
use plotters::style::FontTransform;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
pub mod config;
pub mod db;
pub mod error;
pub mod logger;
pub mod plot;

use crate::db::CategoryCountSource;
use crate::error::{Result, TrendError};

pub const VERSION: Option<&str> = option_env!("CARGO_PKG_VERSION");

pub const DEFAULT_DB_NAME: &str = "buzz.sqlite";
pub const NO_DATA_MESSAGE: &str = "No data found in the database.";

/// Time bucket size used to group the messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interval {
    Day,
    Week,
    Month,
}

impl Interval {
    pub const VALUES: [&'static str; 3] = ["day", "week", "month"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Day => "day",
            Interval::Week => "week",
            Interval::Month => "month",
        }
    }

    /// strftime pattern producing the period label of a timestamp;
    /// weeks are Monday-first weeks of the year, as in SQLite's %W
    pub fn sqlite_format(&self) -> &'static str {
        match self {
            Interval::Day => "%Y-%m-%d",
            Interval::Week => "%Y-W%W",
            Interval::Month => "%Y-%m",
        }
    }
}

impl Default for Interval {
    fn default() -> Self {
        Interval::Day
    }
}

impl std::str::FromStr for Interval {
    type Err = TrendError;

    fn from_str(s: &str) -> Result<Interval> {
        match s.trim().to_lowercase().as_str() {
            "day" => Ok(Interval::Day),
            "week" => Ok(Interval::Week),
            "month" => Ok(Interval::Month),
            _ => Err(TrendError::InvalidInterval(s.to_string())),
        }
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Defaults of the command, kept out of the pipeline functions
/// so that they can run without the CLI
#[derive(Debug, Clone, PartialEq)]
pub struct TrendConfig {
    pub db_name: String,
    pub interval: Interval,
}

impl Default for TrendConfig {
    fn default() -> Self {
        TrendConfig {
            db_name: DEFAULT_DB_NAME.to_string(),
            interval: Interval::default(),
        }
    }
}

/// One row of the data access query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCount {
    pub period: String,
    pub category: String,
    pub count: u64,
}

impl CategoryCount {
    pub fn new(period: &str, category: &str, count: u64) -> CategoryCount {
        CategoryCount {
            period: period.to_string(),
            category: category.to_string(),
            count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendPoint {
    pub period: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySeries {
    pub category: String,
    pub points: Vec<TrendPoint>,
}

/// The per category time series, in the order the categories were first seen.
/// Also keeps the shared period axis in the order the periods were first seen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryTrends {
    series: Vec<CategorySeries>,
    series_index: HashMap<String, usize>,
    periods: Vec<String>,
    period_index: HashMap<String, usize>,
}

impl CategoryTrends {
    pub fn new() -> CategoryTrends {
        CategoryTrends::default()
    }

    /// appends the point to the series of its category, creating it if needed
    pub fn push(&mut self, row: CategoryCount) {
        if !self.period_index.contains_key(&row.period) {
            self.period_index
                .insert(row.period.clone(), self.periods.len());
            self.periods.push(row.period.clone());
        }
        let idx = match self.series_index.get(&row.category) {
            Some(&i) => i,
            None => {
                let i = self.series.len();
                self.series_index.insert(row.category.clone(), i);
                self.series.push(CategorySeries {
                    category: row.category,
                    points: Vec::new(),
                });
                i
            }
        };
        self.series[idx].points.push(TrendPoint {
            period: row.period,
            count: row.count,
        });
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn get(&self, category: &str) -> Option<&[TrendPoint]> {
        self.series_index
            .get(category)
            .map(|&i| &self.series[i].points[..])
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.series.iter().map(|s| s.category.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CategorySeries> {
        self.series.iter()
    }

    pub fn periods(&self) -> &[String] {
        &self.periods[..]
    }

    pub fn max_count(&self) -> Option<u64> {
        self.series
            .iter()
            .flat_map(|s| s.points.iter().map(|p| p.count))
            .max()
    }

    /// plots all the series to svg, sharing the period axis
    pub fn plot_svg(&self, interval: Interval, fout: &Path, size: (u32, u32)) -> Result<()> {
        if self.is_empty() {
            return Err(TrendError::Plot("no category series to plot".to_string()));
        }
        let nperiods = self.periods.len();
        let ymax = self.max_count().unwrap_or(0);
        let ytop = ymax + ymax / 10 + 1;
        let root = SVGBackend::new(fout, size).into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(
                format!("Category Frequency Over Time ({})", interval),
                ("sans-serif", 32),
            )
            .margin(20)
            .x_label_area_size(140)
            .y_label_area_size(100)
            .build_cartesian_2d((0..nperiods).into_segmented(), 0u64..ytop)?;

        let periods = &self.periods;
        let xfmt = |x: &SegmentValue<usize>| match x {
            SegmentValue::Exact(i) | SegmentValue::CenterOf(i) => {
                periods.get(*i).cloned().unwrap_or_default()
            }
            SegmentValue::Last => String::new(),
        };
        chart
            .configure_mesh()
            .disable_x_mesh()
            .light_line_style(&TRANSPARENT)
            .bold_line_style(RGBColor(150, 150, 150).stroke_width(1))
            .set_all_tick_mark_size(2)
            .x_labels(nperiods)
            .x_label_style(
                ("sans-serif", 16)
                    .into_font()
                    .transform(FontTransform::Rotate90),
            )
            .y_label_style(("sans-serif", 18))
            .x_label_formatter(&xfmt)
            .x_desc("Time Period")
            .y_desc("Message Count")
            .draw()?;

        for (idx, series) in self.series.iter().enumerate() {
            let color = Palette99::pick(idx).mix(1.0);
            let coords: Vec<(SegmentValue<usize>, u64)> = series
                .points
                .iter()
                .filter_map(|p| {
                    self.period_index
                        .get(&p.period)
                        .map(|&i| (SegmentValue::CenterOf(i), p.count))
                })
                .collect();
            chart
                .draw_series(LineSeries::new(coords.clone(), color.stroke_width(2)))?
                .label(series.category.as_str())
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                });
            chart.draw_series(
                coords
                    .into_iter()
                    .map(|c| Circle::new(c, 4, color.filled())),
            )?;
        }

        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .label_font(("sans-serif", 18))
            .draw()?;
        root.present()?;
        Ok(())
    }
}

/// Groups the rows by category, keeping the arrival order within each category
pub fn aggregate_by_category<I>(rows: I) -> CategoryTrends
where
    I: IntoIterator<Item = CategoryCount>,
{
    rows.into_iter().fold(CategoryTrends::new(), |mut trends, row| {
        trends.push(row);
        trends
    })
}

/// Draws the aggregated trends somewhere
pub trait TrendRenderer {
    fn render(&self, trends: &CategoryTrends, interval: Interval) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct SvgRenderer {
    pub fout: PathBuf,
    pub size: (u32, u32),
    /// open the written chart in the system viewer
    pub show: bool,
}

impl SvgRenderer {
    pub fn new(fout: PathBuf) -> SvgRenderer {
        SvgRenderer {
            fout,
            size: (1600, 900),
            show: false,
        }
    }

    pub fn with_show(mut self, show: bool) -> SvgRenderer {
        self.show = show;
        self
    }
}

impl TrendRenderer for SvgRenderer {
    fn render(&self, trends: &CategoryTrends, interval: Interval) -> Result<()> {
        trends.plot_svg(interval, &self.fout, self.size)?;
        tracing::info!("chart written to {}", self.fout.display());
        if self.show {
            opener::open(&self.fout)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendOutcome {
    NoData,
    Rendered { categories: usize },
}

/// Queries the counts, groups them by category and renders them once.
/// An empty query result is reported to `out` and nothing is rendered.
pub fn plot_category_trends<S, R, W>(
    source: &S,
    renderer: &R,
    interval: Interval,
    out: &mut W,
) -> Result<TrendOutcome>
where
    S: CategoryCountSource + ?Sized,
    R: TrendRenderer + ?Sized,
    W: Write + ?Sized,
{
    let rows = source.category_counts(interval)?;
    let trends = aggregate_by_category(rows);
    if trends.is_empty() {
        writeln!(out, "{}", NO_DATA_MESSAGE)?;
        tracing::warn!("no {} buckets returned, skipping the chart", interval);
        return Ok(TrendOutcome::NoData);
    }
    tracing::debug!(
        "plotting {} categories over {} periods",
        trends.len(),
        trends.periods().len()
    );
    renderer.render(&trends, interval)?;
    Ok(TrendOutcome::Rendered {
        categories: trends.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashSet;

    struct FixedSource(Vec<CategoryCount>);

    impl CategoryCountSource for FixedSource {
        fn category_counts(&self, _interval: Interval) -> Result<Vec<CategoryCount>> {
            Ok(self.0.clone())
        }
    }

    struct FailingSource;

    impl CategoryCountSource for FailingSource {
        fn category_counts(&self, _interval: Interval) -> Result<Vec<CategoryCount>> {
            Err(TrendError::Database(rusqlite::Error::InvalidQuery))
        }
    }

    #[derive(Default)]
    struct RecordingRenderer {
        calls: RefCell<Vec<(CategoryTrends, Interval)>>,
    }

    impl TrendRenderer for RecordingRenderer {
        fn render(&self, trends: &CategoryTrends, interval: Interval) -> Result<()> {
            self.calls.borrow_mut().push((trends.clone(), interval));
            Ok(())
        }
    }

    fn points(v: &[(&str, u64)]) -> Vec<TrendPoint> {
        v.iter()
            .map(|&(period, count)| TrendPoint {
                period: period.to_string(),
                count,
            })
            .collect()
    }

    fn mixed_rows() -> Vec<CategoryCount> {
        vec![
            CategoryCount::new("2024-01", "news", 5),
            CategoryCount::new("2024-01", "sports", 2),
            CategoryCount::new("2024-02", "news", 7),
        ]
    }

    #[test]
    fn groups_rows_by_category() {
        let trends = aggregate_by_category(mixed_rows());
        assert_eq!(trends.len(), 2);
        assert_eq!(
            trends.get("news").unwrap(),
            &points(&[("2024-01", 5), ("2024-02", 7)])[..]
        );
        assert_eq!(trends.get("sports").unwrap(), &points(&[("2024-01", 2)])[..]);
        assert_eq!(trends.categories().collect::<Vec<_>>(), vec!["news", "sports"]);
        assert_eq!(trends.periods(), &["2024-01".to_string(), "2024-02".to_string()]);
    }

    #[test]
    fn empty_rows_give_empty_trends() {
        let trends = aggregate_by_category(Vec::new());
        assert!(trends.is_empty());
        assert_eq!(trends.len(), 0);
        assert!(trends.periods().is_empty());
        assert_eq!(trends.max_count(), None);
    }

    #[test]
    fn categories_match_distinct_input_and_keep_order() {
        let rows = vec![
            CategoryCount::new("d1", "a", 1),
            CategoryCount::new("d1", "b", 2),
            CategoryCount::new("d2", "c", 3),
            CategoryCount::new("d2", "a", 4),
            CategoryCount::new("d3", "b", 5),
            CategoryCount::new("d3", "a", 6),
            CategoryCount::new("d4", "a", 0),
        ];
        let distinct: HashSet<&str> = rows.iter().map(|r| r.category.as_str()).collect();
        let trends = aggregate_by_category(rows.clone());
        assert_eq!(trends.len(), distinct.len());
        assert_eq!(trends.categories().collect::<HashSet<_>>(), distinct);
        for category in distinct {
            let expected: Vec<TrendPoint> = rows
                .iter()
                .filter(|r| r.category == category)
                .map(|r| TrendPoint {
                    period: r.period.clone(),
                    count: r.count,
                })
                .collect();
            assert_eq!(trends.get(category).unwrap(), &expected[..]);
        }
        assert_eq!(trends.max_count(), Some(6));
    }

    #[test]
    fn period_axis_follows_arrival_order() {
        let rows = vec![
            CategoryCount::new("2024-W03", "x", 1),
            CategoryCount::new("2024-W01", "y", 1),
            CategoryCount::new("2024-W03", "y", 1),
        ];
        let trends = aggregate_by_category(rows);
        assert_eq!(
            trends.periods(),
            &["2024-W03".to_string(), "2024-W01".to_string()]
        );
    }

    #[test]
    fn renders_once_with_aggregated_series() {
        let source = FixedSource(vec![CategoryCount::new("2024-01", "tech", 1)]);
        let renderer = RecordingRenderer::default();
        let mut out = Vec::<u8>::new();
        let outcome = plot_category_trends(&source, &renderer, Interval::Month, &mut out).unwrap();
        assert!(out.is_empty());
        assert_eq!(outcome, TrendOutcome::Rendered { categories: 1 });
        let calls = renderer.calls.borrow();
        assert_eq!(calls.len(), 1);
        let (trends, interval) = &calls[0];
        assert_eq!(*interval, Interval::Month);
        assert_eq!(trends.len(), 1);
        assert_eq!(trends.get("tech").unwrap(), &points(&[("2024-01", 1)])[..]);
    }

    #[test]
    fn no_data_skips_renderer() {
        let renderer = RecordingRenderer::default();
        let mut out = Vec::<u8>::new();
        let outcome =
            plot_category_trends(&FixedSource(Vec::new()), &renderer, Interval::Day, &mut out)
                .unwrap();
        assert_eq!(outcome, TrendOutcome::NoData);
        assert_eq!(String::from_utf8(out).unwrap(), "No data found in the database.\n");
        assert!(renderer.calls.borrow().is_empty());
    }

    #[test]
    fn source_errors_propagate() {
        let renderer = RecordingRenderer::default();
        let res = plot_category_trends(&FailingSource, &renderer, Interval::Week, &mut Vec::<u8>::new());
        assert!(matches!(res, Err(TrendError::Database(_))));
        assert!(renderer.calls.borrow().is_empty());
    }

    #[test]
    fn plotting_empty_trends_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let fout = dir.path().join("empty.svg");
        let res = CategoryTrends::new().plot_svg(Interval::Day, &fout, (800, 600));
        assert!(matches!(res, Err(TrendError::Plot(_))));
        assert!(!fout.exists());
    }

    #[test]
    fn unwritable_svg_surfaces_plot_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let renderer = SvgRenderer::new(dir.path().join("missing").join("chart.svg"));
        assert!(!renderer.show);
        let trends = aggregate_by_category(vec![CategoryCount::new("2024-01", "tech", 1)]);
        let res = renderer.render(&trends, Interval::Day);
        assert!(matches!(res, Err(TrendError::Plot(_))));
    }

    #[test]
    fn single_row_draws_one_marker() {
        let dir = tempfile::tempdir().expect("tempdir");
        let fout = dir.path().join("tech.svg");
        let trends = aggregate_by_category(vec![CategoryCount::new("2024-01", "tech", 1)]);
        SvgRenderer::new(fout.clone())
            .render(&trends, Interval::Month)
            .unwrap();
        let svg = std::fs::read_to_string(&fout).unwrap();
        assert!(svg.contains("Category Frequency Over Time (month)"));
        assert!(svg.contains("2024-01"));
        assert!(svg.contains("tech"));
        assert_eq!(svg.matches("<circle").count(), 1);
    }

    #[test]
    fn interval_parsing() {
        assert_eq!("day".parse::<Interval>().unwrap(), Interval::Day);
        assert_eq!("Week".parse::<Interval>().unwrap(), Interval::Week);
        assert_eq!(" month ".parse::<Interval>().unwrap(), Interval::Month);
        assert!(matches!(
            "year".parse::<Interval>(),
            Err(TrendError::InvalidInterval(_))
        ));
        for v in Interval::VALUES.iter() {
            assert_eq!(v.parse::<Interval>().unwrap().to_string(), *v);
        }
    }

    #[test]
    fn default_config() {
        let cfg = TrendConfig::default();
        assert_eq!(cfg.db_name, "buzz.sqlite");
        assert_eq!(cfg.interval, Interval::Day);
    }
}
