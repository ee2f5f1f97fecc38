//! Static lookup tables: default hyperparameters and published checkpoints.

use crate::model::{Architecture, Metric};
use std::ops::RangeInclusive;

pub const QUALITIES: RangeInclusive<u8> = 1..=8;

type QualityTable = [(u8, (usize, usize)); 8];

const BMSHJ2018_CFGS: QualityTable = [
    (1, (128, 192)),
    (2, (128, 192)),
    (3, (128, 192)),
    (4, (128, 192)),
    (5, (128, 192)),
    (6, (192, 320)),
    (7, (192, 320)),
    (8, (192, 320)),
];

const MBT2018_CFGS: QualityTable = [
    (1, (192, 192)),
    (2, (192, 192)),
    (3, (192, 192)),
    (4, (192, 192)),
    (5, (192, 192)),
    (6, (192, 320)),
    (7, (192, 320)),
    (8, (192, 320)),
];

static CFGS: [(Architecture, &QualityTable); 4] = [
    (Architecture::Bmshj2018Factorized, &BMSHJ2018_CFGS),
    (Architecture::Bmshj2018Hyperprior, &BMSHJ2018_CFGS),
    (Architecture::Mbt2018Mean, &BMSHJ2018_CFGS),
    (Architecture::Mbt2018, &MBT2018_CFGS),
];

type UrlTable = &'static [(Metric, &'static [(u8, &'static str)])];

static MODEL_URLS: [(Architecture, UrlTable); 4] = [
    (
        Architecture::Bmshj2018Factorized,
        &[(
            Metric::Mse,
            &[
                (1, "bmshj2018-factorized-prior-1-446d5c7f.pth.tar"),
                (2, "bmshj2018-factorized-prior-2-87279a02.pth.tar"),
                (3, "bmshj2018-factorized-prior-3-5c6f152b.pth.tar"),
                (4, "bmshj2018-factorized-prior-4-1ed4405a.pth.tar"),
                (5, "bmshj2018-factorized-prior-5-866ba797.pth.tar"),
                (6, "bmshj2018-factorized-prior-6-9b02ea3a.pth.tar"),
                (7, "bmshj2018-factorized-prior-7-6dfd6734.pth.tar"),
                (8, "bmshj2018-factorized-prior-8-5232faa3.pth.tar"),
            ],
        )],
    ),
    (Architecture::Bmshj2018Hyperprior, &[(Metric::Mse, &[])]),
    (Architecture::Mbt2018Mean, &[(Metric::Mse, &[])]),
    (Architecture::Mbt2018, &[(Metric::Mse, &[])]),
];

/// Default `(N, M)` channel widths for `quality`, if the quality is defined.
pub fn cfg(architecture: Architecture, quality: u8) -> Option<(usize, usize)> {
    CFGS.iter()
        .find(|(arch, _)| *arch == architecture)
        .and_then(|(_, table)| table.iter().find(|(q, _)| *q == quality))
        .map(|(_, widths)| *widths)
}

pub fn qualities(architecture: Architecture) -> Vec<u8> {
    CFGS.iter()
        .find(|(arch, _)| *arch == architecture)
        .map(|(_, table)| table.iter().map(|(q, _)| *q).collect())
        .unwrap_or_default()
}

/// Metrics with an entry in the URL table, populated or not.
pub fn metrics(architecture: Architecture) -> Vec<Metric> {
    url_table(architecture)
        .map(|table| table.iter().map(|(metric, _)| *metric).collect())
        .unwrap_or_default()
}

/// File name of the published checkpoint, relative to the root URL.
pub fn pretrained_filename(
    architecture: Architecture,
    metric: Metric,
    quality: u8,
) -> Option<&'static str> {
    url_table(architecture)?
        .iter()
        .find(|(m, _)| *m == metric)?
        .1
        .iter()
        .find(|(q, _)| *q == quality)
        .map(|(_, file)| *file)
}

pub fn pretrained_url(
    root_url: &str,
    architecture: Architecture,
    metric: Metric,
    quality: u8,
) -> Option<String> {
    pretrained_filename(architecture, metric, quality)
        .map(|file| format!("{}/{}", root_url.trim_end_matches('/'), file))
}

/// Qualities with a published checkpoint for `metric`.
pub fn pretrained_qualities(architecture: Architecture, metric: Metric) -> Vec<u8> {
    QUALITIES
        .filter(|q| pretrained_filename(architecture, metric, *q).is_some())
        .collect()
}

fn url_table(architecture: Architecture) -> Option<UrlTable> {
    MODEL_URLS
        .iter()
        .find(|(arch, _)| *arch == architecture)
        .map(|(_, table)| *table)
}
