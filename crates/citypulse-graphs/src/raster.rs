//! Rasterization of surfaces onto any plotters backend

use citypulse_common::time::{from_chart_x, to_chart_x};
use citypulse_common::{format_axis_label, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;

use crate::style::{marker_radius, ChartStyle, FontConfig};
use crate::surfaces::{MapSurface, TrendSurface};

/// Half-width in seconds given to an x axis that spans a single instant
const SINGLE_INSTANT_PAD_SECS: f64 = 1800.0;

/// Fraction of the y range at which event labels sit
const EVENT_LABEL_HEIGHT: f64 = 0.95;

fn font(config: &FontConfig) -> FontDesc<'_> {
    (config.family.as_str(), config.size).into_font()
}

/// X extent of the trend panel in chart units, covering lines, cursor and markers
pub fn trend_x_range(trend: &TrendSurface) -> (f64, f64) {
    let xs = trend
        .lines()
        .iter()
        .flat_map(|l| l.points.iter().map(|(t, _)| to_chart_x(t)))
        .chain(trend.cursor().into_iter().map(|t| to_chart_x(&t)))
        .chain(trend.markers().iter().map(|m| to_chart_x(&m.at)));

    let (lo, hi) = xs.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| (lo.min(x), hi.max(x)));
    if !lo.is_finite() {
        return (0.0, 1.0);
    }
    if hi - lo < f64::EPSILON {
        return (lo - SINGLE_INSTANT_PAD_SECS, hi + SINGLE_INSTANT_PAD_SECS);
    }
    (lo, hi)
}

/// Top of the trend panel's y axis
pub fn trend_y_top(trend: &TrendSurface) -> f64 {
    (trend.max_count() as f64 * 1.05).max(1.0)
}

/// Height at which event labels are drawn
pub fn event_label_y(trend: &TrendSurface) -> f64 {
    trend.max_count() as f64 * EVENT_LABEL_HEIGHT
}

/// Draw the trend panel: lines with legend, event markers and cursor
pub fn draw_trend<DB>(
    area: &DrawingArea<DB, Shift>,
    trend: &TrendSurface,
    style: &ChartStyle,
    caption: Option<&str>,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let (x_min, x_max) = trend_x_range(trend);
    let y_top = trend_y_top(trend);

    let mut builder = ChartBuilder::on(area);
    builder
        .margin(style.margin)
        .x_label_area_size(40)
        .y_label_area_size(60);
    if let Some(caption) = caption {
        builder.caption(caption, font(&style.title_font));
    }
    let mut chart = builder.build_cartesian_2d(x_min..x_max, 0f64..y_top)?;

    let tick_label = |x: &f64| from_chart_x(*x).map(|t| format_axis_label(&t)).unwrap_or_default();
    chart
        .configure_mesh()
        .x_labels(6)
        .x_label_formatter(&tick_label)
        .y_desc(trend.y_label())
        .label_style(font(&style.label_font))
        .axis_desc_style(font(&style.axis_font))
        .draw()?;

    for (index, line) in trend.lines().iter().enumerate() {
        let color = style.color_scheme.color_for(index);
        chart
            .draw_series(LineSeries::new(
                line.points.iter().map(|(t, c)| (to_chart_x(t), *c as f64)),
                color.stroke_width(2),
            ))?
            .label(line.name.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 16, y)], color.stroke_width(2)));
    }

    let label_y = event_label_y(trend);
    for marker in trend.markers() {
        let x = to_chart_x(&marker.at);
        chart.draw_series(DashedLineSeries::new(
            vec![(x, 0.0), (x, y_top)],
            6,
            4,
            BLACK.stroke_width(1),
        ))?;
        chart.draw_series(std::iter::once(Text::new(
            marker.label.clone(),
            (x, label_y),
            font(&style.label_font).color(&BLACK),
        )))?;
    }

    if let Some(cursor) = trend.cursor() {
        let x = to_chart_x(&cursor);
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(x, 0.0), (x, y_top)],
            BLACK.stroke_width(1),
        )))?;
    }

    if !trend.lines().is_empty() {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .label_font(font(&style.label_font))
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }

    Ok(())
}

/// Draw the map panel: boundary, anchors with labels, activity markers and caption
pub fn draw_map<DB>(area: &DrawingArea<DB, Shift>, map: &MapSurface, style: &ChartStyle) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let bounds = map.bounds();

    let mut builder = ChartBuilder::on(area);
    builder
        .margin(style.margin)
        .x_label_area_size(30)
        .y_label_area_size(40);
    if !map.caption().is_empty() {
        builder.caption(map.caption(), font(&style.axis_font));
    }
    let mut chart = builder.build_cartesian_2d(bounds.min_lon..bounds.max_lon, bounds.min_lat..bounds.max_lat)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .label_style(font(&style.label_font))
        .draw()?;

    let land = style.land();
    let border = style.border();
    chart.draw_series(
        map.boundary()
            .rings()
            .iter()
            .map(|ring| Polygon::new(ring.clone(), land.filled())),
    )?;
    chart.draw_series(
        map.boundary()
            .rings()
            .iter()
            .map(|ring| PathElement::new(ring.clone(), border.stroke_width(1))),
    )?;

    chart.draw_series(
        map.anchors()
            .iter()
            .map(|a| Circle::new((a.longitude, a.latitude), 3, BLACK.filled())),
    )?;
    chart.draw_series(map.anchors().iter().map(|a| {
        Text::new(
            a.name.clone(),
            (a.longitude + 0.1, a.latitude + 0.1),
            font(&style.label_font).color(&BLACK),
        )
    }))?;

    let activity = style.activity().mix(style.activity_opacity);
    chart.draw_series(
        map.anchors()
            .iter()
            .zip(map.activity_sizes())
            .map(|(a, size)| Circle::new((a.longitude, a.latitude), marker_radius(*size), activity.filled())),
    )?;

    Ok(())
}

/// Draw a full figure: title on top, trend panel above the map panel
pub fn draw_figure<DB>(
    root: &DrawingArea<DB, Shift>,
    title: &str,
    trend: &TrendSurface,
    map: &MapSurface,
    style: &ChartStyle,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&style.background())?;
    let body = root.titled(title, font(&style.title_font))?;
    let (_, height) = body.dim_in_pixel();
    let (upper, lower) = body.split_vertically(style.trend_panel_height(height));

    draw_trend(&upper, trend, style, None)?;
    draw_map(&lower, map, style)
}
