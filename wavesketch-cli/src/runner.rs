use std::error::Error;
use std::sync::{mpsc, Arc};

use clap::ArgMatches;
use log::{error, info};
use serde::Serialize;
use wavesketch_lib::envelope::fit_points_per_second;
use wavesketch_lib::{
    AmplitudeSeries, FileSource, OperationSettings, SampleOperation, ThreadExecutor,
};

#[derive(Serialize)]
struct TrackReport<'a> {
    index: usize,
    #[serde(flatten)]
    series: &'a AmplitudeSeries,
}

#[derive(Serialize)]
struct EnvelopeReport<'a> {
    points_per_second: f64,
    tracks: Vec<TrackReport<'a>>,
}

pub fn run(args: &ArgMatches) -> Result<i32, Box<dyn Error>> {
    let Some(file_path) = args.get_one::<String>("INPUT") else {
        error!("no input file given");
        return Ok(-1);
    };
    let settings = resolve_settings(args, file_path)?;
    info!(
        "extracting {} at {} points per second",
        file_path, settings.points_per_second
    );

    let progress = if args.get_flag("progress") {
        Some(Box::new(|snapshot: &[AmplitudeSeries]| {
            let points: usize = snapshot.iter().map(AmplitudeSeries::len).sum();
            info!("progress: {} point(s) across {} track(s)", points, snapshot.len());
        }) as wavesketch_lib::operation::ProgressCallback)
    } else {
        None
    };

    let (tx, rx) = mpsc::channel();
    let points_per_second = settings.points_per_second;
    let operation = SampleOperation::new(settings, Arc::new(ThreadExecutor));
    operation.start(
        FileSource::new(file_path),
        progress,
        Box::new(move |result| {
            let _ = tx.send(result);
        }),
    )?;

    let series = rx.recv()??;

    let tracks = match args.get_one::<usize>("track") {
        Some(&index) => match series.get(index) {
            Some(track) => vec![TrackReport {
                index,
                series: track,
            }],
            None => {
                error!(
                    "track {} out of range ({} track(s) found)",
                    index,
                    series.len()
                );
                return Ok(-1);
            }
        },
        None => series
            .iter()
            .enumerate()
            .map(|(index, track)| TrackReport {
                index,
                series: track,
            })
            .collect(),
    };

    let report = EnvelopeReport {
        points_per_second,
        tracks,
    };
    let json = if args.get_flag("pretty") {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{}", json);

    Ok(0)
}

/// Merge the settings file with explicit flags; flags win.
fn resolve_settings(
    args: &ArgMatches,
    file_path: &str,
) -> Result<OperationSettings, Box<dyn Error>> {
    let mut settings = match args.get_one::<String>("settings") {
        Some(path) => OperationSettings::from_json(&std::fs::read_to_string(path)?)?,
        None => OperationSettings::default(),
    };

    if let Some(&points_per_second) = args.get_one::<f64>("points-per-second") {
        settings.set_points_per_second(points_per_second);
    } else if let (Some(&min_points_per_second), Some(&min_points)) = (
        args.get_one::<f64>("min-points-per-second"),
        args.get_one::<f64>("min-points"),
    ) {
        let duration = FileSource::probe_duration(file_path)?.unwrap_or(0.0);
        settings.set_points_per_second(fit_points_per_second(
            duration,
            min_points_per_second,
            min_points,
        ));
    }

    if let Some(&iterations) = args.get_one::<usize>("progress-interval") {
        settings.set_progress_interval(iterations);
    }

    Ok(settings)
}
