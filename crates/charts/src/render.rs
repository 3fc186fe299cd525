//! PNG chart rendering.
//!
//! Each chart draws into an RGB buffer through the plotters bitmap backend
//! and is encoded to PNG with `image::save_buffer`.

use crate::dataset::StudentDataset;
use crate::errors::ChartError;
use mathperf_model::ClassifierModel;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::error::Error;
use std::path::Path;
use tracing::info;

const DARK: RGBColor = RGBColor(44, 62, 80);
const RED: RGBColor = RGBColor(231, 76, 60);
const BLUE: RGBColor = RGBColor(52, 152, 219);
const GREEN: RGBColor = RGBColor(39, 174, 96);
const PURPLE: RGBColor = RGBColor(155, 89, 182);
const TEAL: RGBColor = RGBColor(22, 160, 133);
const ORANGE: RGBColor = RGBColor(243, 156, 18);

const BIN_WIDTH: f64 = 5.0;

/// Render all four charts into `out_dir`.
pub fn render_all(
    dataset: &StudentDataset,
    model: &ClassifierModel,
    out_dir: &Path,
) -> Result<(), ChartError> {
    std::fs::create_dir_all(out_dir)?;
    feature_importance(model, &out_dir.join("feature_importance.png"))?;
    class_distribution(dataset, &out_dir.join("class_distribution.png"))?;
    performance_by_features(dataset, &out_dir.join("performance_by_features.png"))?;
    score_distribution(dataset, &out_dir.join("score_distribution.png"))?;
    Ok(())
}

/// Horizontal bars of feature importances, sorted descending.
pub fn feature_importance(model: &ClassifierModel, path: &Path) -> Result<(), ChartError> {
    const SIZE: (u32, u32) = (1000, 600);
    let mut buf = vec![0u8; rgb_len(SIZE)];
    draw_feature_importance(model, &mut buf, SIZE)
        .map_err(|e| ChartError::Render(e.to_string()))?;
    save_png(path, &buf, SIZE)
}

fn draw_feature_importance(
    model: &ClassifierModel,
    buf: &mut [u8],
    size: (u32, u32),
) -> Result<(), Box<dyn Error>> {
    let root = BitMapBackend::with_buffer(buf, size).into_drawing_area();
    root.fill(&WHITE)?;

    let mut pairs: Vec<(String, f64)> = model
        .feature_names
        .iter()
        .cloned()
        .zip(model.feature_importances.iter().copied())
        .collect();
    pairs.sort_by(|a, b| b.1.total_cmp(&a.1));

    let x_max = pairs.first().map(|p| p.1).unwrap_or(0.0).max(1e-3) * 1.1;
    let count = pairs.len();

    let mut chart = ChartBuilder::on(&root)
        .caption("Tingkat Kepentingan Fitur dalam Model", ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(200)
        .build_cartesian_2d(0f64..x_max, 0f64..count as f64)?;

    chart
        .configure_mesh()
        .x_desc("Tingkat Kepentingan")
        .disable_y_mesh()
        .y_labels(count)
        .y_label_formatter(&|y| {
            // Bar i occupies [i, i+1); highest importance on top.
            let slot = count as f64 - 1.0 - y.floor();
            pairs
                .get(slot as usize)
                .map(|(name, _)| name.clone())
                .unwrap_or_default()
        })
        .draw()?;

    chart.draw_series(pairs.iter().enumerate().map(|(i, (_, importance))| {
        let y = count as f64 - 1.0 - i as f64;
        Rectangle::new([(0.0, y + 0.15), (*importance, y + 0.85)], DARK.filled())
    }))?;

    root.present()?;
    Ok(())
}

/// Vertical bars of high/low class counts.
pub fn class_distribution(dataset: &StudentDataset, path: &Path) -> Result<(), ChartError> {
    const SIZE: (u32, u32) = (1400, 500);
    let mut buf = vec![0u8; rgb_len(SIZE)];
    draw_class_distribution(dataset, &mut buf, SIZE)
        .map_err(|e| ChartError::Render(e.to_string()))?;
    save_png(path, &buf, SIZE)
}

fn draw_class_distribution(
    dataset: &StudentDataset,
    buf: &mut [u8],
    size: (u32, u32),
) -> Result<(), Box<dyn Error>> {
    let root = BitMapBackend::with_buffer(buf, size).into_drawing_area();
    root.fill(&WHITE)?;

    let (low, high) = dataset.class_counts();
    let y_max = (low.max(high).max(1) as f64) * 1.15;

    let mut chart = ChartBuilder::on(&root)
        .caption("Distribusi Performansi Matematika", ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..2f64, 0f64..y_max)?;

    chart
        .configure_mesh()
        .y_desc("Jumlah Mahasiswa")
        .disable_x_mesh()
        .x_labels(2)
        .x_label_formatter(&|x| {
            if *x < 1.0 {
                "Performansi Tinggi (≥70)".to_string()
            } else {
                "Performansi Rendah (<70)".to_string()
            }
        })
        .draw()?;

    let bars = [(0.0f64, high as f64, GREEN), (1.0f64, low as f64, RED)];
    chart.draw_series(
        bars.iter().map(|(x, value, color)| {
            Rectangle::new([(*x + 0.2, 0.0), (*x + 0.8, *value)], color.filled())
        }),
    )?;

    root.present()?;
    Ok(())
}

/// 2x2 grid of high-performance shares by categorical field. Lunch is not
/// broken out, matching the original report.
pub fn performance_by_features(dataset: &StudentDataset, path: &Path) -> Result<(), ChartError> {
    const SIZE: (u32, u32) = (1400, 1000);
    let mut buf = vec![0u8; rgb_len(SIZE)];
    draw_performance_by_features(dataset, &mut buf, SIZE)
        .map_err(|e| ChartError::Render(e.to_string()))?;
    save_png(path, &buf, SIZE)
}

fn draw_performance_by_features(
    dataset: &StudentDataset,
    buf: &mut [u8],
    size: (u32, u32),
) -> Result<(), Box<dyn Error>> {
    let root = BitMapBackend::with_buffer(buf, size).into_drawing_area();
    root.fill(&WHITE)?;

    let panels = [
        (
            "Performansi berdasarkan Jenis Kelamin",
            dataset.high_share_by(|row| &row.gender),
            BLUE,
        ),
        (
            "Performansi berdasarkan Kelompok Etnis",
            dataset.high_share_by(|row| &row.ethnicity),
            PURPLE,
        ),
        (
            "Performansi berdasarkan Pendidikan Orang Tua",
            dataset.high_share_by(|row| &row.parental_education),
            TEAL,
        ),
        (
            "Performansi berdasarkan Persiapan Ujian",
            dataset.high_share_by(|row| &row.test_preparation),
            ORANGE,
        ),
    ];

    let areas = root.split_evenly((2, 2));
    for (area, (title, data, color)) in areas.iter().zip(&panels) {
        draw_share_panel(area, title, data, *color)?;
    }

    root.present()?;
    Ok(())
}

/// 1x3 histograms of math, reading, and writing scores with a mean marker.
pub fn score_distribution(dataset: &StudentDataset, path: &Path) -> Result<(), ChartError> {
    const SIZE: (u32, u32) = (1600, 500);
    let mut buf = vec![0u8; rgb_len(SIZE)];
    draw_score_distribution(dataset, &mut buf, SIZE)
        .map_err(|e| ChartError::Render(e.to_string()))?;
    save_png(path, &buf, SIZE)
}

fn draw_score_distribution(
    dataset: &StudentDataset,
    buf: &mut [u8],
    size: (u32, u32),
) -> Result<(), Box<dyn Error>> {
    let root = BitMapBackend::with_buffer(buf, size).into_drawing_area();
    root.fill(&WHITE)?;

    let columns: [(&str, Vec<f64>, RGBColor); 3] = [
        (
            "Distribusi Nilai Matematika",
            dataset.rows.iter().map(|r| r.math_score).collect(),
            RED,
        ),
        (
            "Distribusi Nilai Membaca",
            dataset.rows.iter().map(|r| r.reading_score).collect(),
            BLUE,
        ),
        (
            "Distribusi Nilai Menulis",
            dataset.rows.iter().map(|r| r.writing_score).collect(),
            GREEN,
        ),
    ];

    let areas = root.split_evenly((1, 3));
    for (area, (title, scores, color)) in areas.iter().zip(&columns) {
        draw_histogram_panel(area, title, scores, *color)?;
    }

    root.present()?;
    Ok(())
}

fn draw_share_panel<'a>(
    area: &DrawingArea<BitMapBackend<'a>, Shift>,
    title: &str,
    data: &[(String, f64)],
    color: RGBColor,
) -> Result<(), Box<dyn Error>> {
    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 18))
        .margin(15)
        .x_label_area_size(60)
        .y_label_area_size(50)
        .build_cartesian_2d(0f64..data.len().max(1) as f64, 0f64..100f64)?;

    chart
        .configure_mesh()
        .y_desc("Persentase Performansi Tinggi (%)")
        .disable_x_mesh()
        .x_labels(data.len().max(1))
        .x_label_formatter(&|x| {
            data.get(x.floor() as usize)
                .map(|(label, _)| label.clone())
                .unwrap_or_default()
        })
        .draw()?;

    chart.draw_series(data.iter().enumerate().map(|(i, (_, share))| {
        Rectangle::new(
            [(i as f64 + 0.15, 0.0), (i as f64 + 0.85, *share)],
            color.filled(),
        )
    }))?;

    Ok(())
}

fn draw_histogram_panel<'a>(
    area: &DrawingArea<BitMapBackend<'a>, Shift>,
    title: &str,
    scores: &[f64],
    color: RGBColor,
) -> Result<(), Box<dyn Error>> {
    let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !min.is_finite() || !max.is_finite() {
        return Ok(());
    }

    let start = (min / BIN_WIDTH).floor() * BIN_WIDTH;
    let end = ((max / BIN_WIDTH).floor() + 1.0) * BIN_WIDTH;
    let bins = ((end - start) / BIN_WIDTH).round() as usize;

    let mut counts = vec![0usize; bins];
    for score in scores {
        let bin = (((score - start) / BIN_WIDTH) as usize).min(bins - 1);
        counts[bin] += 1;
    }

    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
    let y_max = counts.iter().copied().max().unwrap_or(1).max(1) as f64 * 1.15;

    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 18))
        .margin(15)
        .x_label_area_size(35)
        .y_label_area_size(45)
        .build_cartesian_2d(start..end, 0f64..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Nilai")
        .y_desc("Frekuensi")
        .draw()?;

    chart.draw_series(counts.iter().enumerate().map(|(i, count)| {
        let x0 = start + i as f64 * BIN_WIDTH;
        Rectangle::new(
            [(x0 + 0.25, 0.0), (x0 + BIN_WIDTH - 0.25, *count as f64)],
            color.mix(0.7).filled(),
        )
    }))?;

    // Mean marker
    chart.draw_series(LineSeries::new(
        vec![(mean, 0.0), (mean, y_max)],
        color.stroke_width(2),
    ))?;

    Ok(())
}

fn rgb_len(size: (u32, u32)) -> usize {
    (size.0 * size.1 * 3) as usize
}

fn save_png(path: &Path, buf: &[u8], size: (u32, u32)) -> Result<(), ChartError> {
    image::save_buffer(path, buf, size.0, size.1, image::ColorType::Rgb8)
        .map_err(|e| ChartError::Render(e.to_string()))?;
    info!("chart saved: {}", path.display());
    Ok(())
}
